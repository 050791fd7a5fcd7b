use chrono::{DateTime, Utc};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols;
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{
    Axis, Block, Borders, Cell, Chart, Clear, Dataset, GraphType, List, ListItem, ListState,
    Paragraph, Row, Table, TableState, Wrap,
};

use crate::app::{App, InputMode, Screen};
use crate::format::{
    compact_text, format_event_time, format_node_usage, format_pod_uptime,
    format_usage, memory_mib, parse_timestamp,
};
use crate::locale::Messages;
use crate::model::{AlertRule, Event, MetricPoint, MetricsQuery, Node, Page, PageKind, Pod, PodPhase};
use crate::store::NamespaceLoad;
use crate::view::ViewData;

const BG: Color = Color::Rgb(9, 15, 25);
const PANEL: Color = Color::Rgb(16, 27, 44);
const ACCENT: Color = Color::Rgb(52, 211, 153);
const MUTED: Color = Color::Rgb(140, 156, 178);
const WARN: Color = Color::Rgb(251, 191, 36);
const ERROR: Color = Color::Rgb(248, 113, 113);
const INFO: Color = Color::Rgb(96, 165, 250);
const PL_A: Color = Color::Rgb(17, 94, 89);
const PL_B: Color = Color::Rgb(30, 64, 175);
const PL_C: Color = Color::Rgb(55, 48, 163);
const SIDEBAR_WIDTH: u16 = 26;

pub fn render(frame: &mut Frame, app: &App) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(6),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, root[0], app);
    render_body(frame, root[1], app);
    render_footer(frame, root[2], app);

    if app.show_help() {
        render_help_modal(frame, app);
    }
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let messages = app.messages();
    let mut spans = Vec::new();
    push_powerline_segment(
        &mut spans,
        format!(" {} ", messages.t("app.title")),
        Color::Black,
        ACCENT,
        PL_A,
    );
    push_powerline_segment(
        &mut spans,
        format!(" {} ", app.locale().tag().to_ascii_uppercase()),
        Color::White,
        PL_A,
        PL_B,
    );
    push_powerline_segment(
        &mut spans,
        format!(
            " ns {} ",
            compact_text(app.session().namespaces.selected(), 20)
        ),
        Color::White,
        PL_B,
        PL_C,
    );
    push_powerline_segment(
        &mut spans,
        format!(" {} ", compact_text(&app.current_path(), 36)),
        Color::White,
        PL_C,
        BG,
    );

    spans.push(Span::raw(" "));
    for (index, kind) in PageKind::ALL.iter().enumerate() {
        let label = format!(" {} {} ", index + 1, messages.t(kind.title_key()));
        let style = if app.active_kind() == Some(*kind) {
            Style::default()
                .fg(Color::Black)
                .bg(ACCENT)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(MUTED).bg(BG)
        };
        spans.push(Span::styled(label, style));
    }

    let left = Line::from(spans);
    let right = app
        .view()
        .refreshed_at()
        .map(|at| {
            messages.t_with(
                "common.updated",
                &[("time", at.format("%H:%M:%S").to_string().as_str())],
            )
        })
        .unwrap_or_default();
    let right_width = right.chars().count() as u16 + 1;
    if right.is_empty() || right_width >= area.width / 2 {
        frame.render_widget(
            Paragraph::new(left).style(Style::default().bg(BG).fg(Color::White)),
            area,
        );
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(right_width)])
        .split(area);
    frame.render_widget(
        Paragraph::new(left).style(Style::default().bg(BG).fg(Color::White)),
        chunks[0],
    );
    frame.render_widget(
        Paragraph::new(right)
            .style(Style::default().bg(BG).fg(MUTED))
            .alignment(Alignment::Right),
        chunks[1],
    );
}

fn render_body(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(20)])
        .split(area);

    render_sidebar(frame, chunks[0], app);
    match app.screen() {
        Screen::NotFound { path } => render_not_found(frame, chunks[1], app.messages(), path),
        Screen::Page(page) => render_page(frame, chunks[1], app, page),
    }
}

fn render_sidebar(frame: &mut Frame, area: Rect, app: &App) {
    let messages = app.messages();
    let namespaces = &app.session().namespaces;
    let watched = &app.session().watched;

    let items = namespaces
        .namespaces()
        .iter()
        .map(|namespace| {
            let marker = if watched.contains(namespace) { "★ " } else { "  " };
            ListItem::new(Line::from(vec![
                Span::styled(marker, Style::default().fg(WARN)),
                Span::styled(
                    compact_text(namespace, SIDEBAR_WIDTH.saturating_sub(7) as usize),
                    Style::default().fg(Color::White),
                ),
            ]))
        })
        .collect::<Vec<_>>();

    let title = match namespaces.load_state() {
        NamespaceLoad::Uninitialized => format!(
            "{} ({})",
            messages.t("sidebar.namespaces"),
            messages.t("common.loading")
        ),
        NamespaceLoad::Loaded => format!(
            "{} ({})",
            messages.t("sidebar.namespaces"),
            namespaces.namespaces().len()
        ),
    };
    let list = List::new(items)
        .block(
            Block::default()
                .title(title)
                .title_bottom(Line::from(messages.t("sidebar.watched")).style(Style::default().fg(MUTED)))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(MUTED))
                .style(Style::default().bg(PANEL)),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Rgb(24, 36, 58))
                .fg(ACCENT)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▶");

    let mut state = ListState::default().with_selected(namespaces.position());
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_not_found(frame: &mut Frame, area: Rect, messages: &Messages, path: &str) {
    let panel = Paragraph::new(messages.t_with("notFound.message", &[("path", path)]))
        .wrap(Wrap { trim: false })
        .block(panel_block(messages.t("notFound.title"), WARN))
        .style(Style::default().fg(WARN));
    frame.render_widget(panel, area);
}

fn render_page(frame: &mut Frame, area: Rect, app: &App, page: &Page) {
    let messages = app.messages();
    let view = app.view();

    if page == &Page::Alerts && app.alerts_namespace().is_none() {
        let panel = Paragraph::new(messages.t("alerts.noWatched"))
            .wrap(Wrap { trim: false })
            .block(panel_block(messages.t("alerts.title"), MUTED))
            .style(Style::default().fg(MUTED));
        frame.render_widget(panel, area);
        return;
    }

    let Some(data) = view.data() else {
        let (text, color) = match view.error() {
            Some(error) if !view.loading() => (
                messages.t_with("common.error", &[("message", error)]),
                ERROR,
            ),
            _ if page.is_metrics() => (messages.t("metrics.loading"), MUTED),
            _ => (messages.t("common.loading"), MUTED),
        };
        let panel = Paragraph::new(text)
            .wrap(Wrap { trim: false })
            .block(panel_block(page_title(app, page), color))
            .style(Style::default().fg(color));
        frame.render_widget(panel, area);
        return;
    };

    let area = match view.error() {
        Some(error) => {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(1), Constraint::Min(3)])
                .split(area);
            frame.render_widget(
                Paragraph::new(messages.t_with("common.error", &[("message", error)]))
                    .style(Style::default().fg(ERROR).bg(BG)),
                chunks[0],
            );
            chunks[1]
        }
        None => area,
    };

    let title = page_title(app, page);
    match data {
        ViewData::Nodes(nodes) => render_nodes(frame, area, app, &title, nodes),
        ViewData::Pods(pods) => render_pods(frame, area, app, &title, pods),
        ViewData::Events(events) => render_events(frame, area, app, &title, events),
        ViewData::Alerts(rules) => render_alerts(frame, area, app, &title, rules),
        ViewData::Metrics { series, query } => {
            let cpu = chart_points(&series.cpu_usage, query, |value| value);
            let memory = chart_points(&series.memory_usage, query, memory_mib);
            render_metrics(frame, area, app, &title, query, &cpu, &memory);
        }
    }
}

fn page_title(app: &App, page: &Page) -> String {
    let messages = app.messages();
    match page {
        Page::NodeMetrics { node } => messages.t_with("metrics.nodeTitle", &[("name", node.as_str())]),
        Page::PodMetrics { pod } => messages.t_with("metrics.podTitle", &[("name", pod.as_str())]),
        Page::Alerts => match app.alerts_namespace() {
            Some(namespace) => messages.t_with("alerts.target", &[("namespace", namespace)]),
            None => messages.t("alerts.title"),
        },
        Page::Events => format!(
            "{}  {}",
            messages.t("events.title"),
            messages.t_with("events.filter", &[("filter", app.event_filter().label())])
        ),
        Page::Nodes | Page::Pods => messages.t(page.kind().title_key()),
    }
}

fn render_nodes(frame: &mut Frame, area: Rect, app: &App, title: &str, nodes: &[Node]) {
    let messages = app.messages();
    let headers = [
        messages.t("common.name"),
        messages.t("common.status"),
        messages.t("common.roles"),
        messages.t("common.cpuUsage"),
        messages.t("common.memoryUsage"),
    ];
    let rows = nodes
        .iter()
        .map(|node| {
            let (status, color) = if node.is_ready() {
                (messages.t("common.ready"), ACCENT)
            } else {
                (messages.t("common.notReady"), ERROR)
            };
            Row::new(vec![
                Cell::from(node.name.clone()).style(Style::default().fg(Color::White)),
                Cell::from(status).style(Style::default().fg(color)),
                Cell::from(node.roles.join(", ")).style(Style::default().fg(Color::White)),
                Cell::from(format_node_usage(
                    &node.cpu_usage,
                    &node.cpu_capacity,
                    &node.cpu_usage_percentage,
                )),
                Cell::from(format_node_usage(
                    &node.memory_usage,
                    &node.memory_capacity,
                    &node.memory_usage_percentage,
                )),
            ])
        })
        .collect::<Vec<_>>();

    let widths = [
        Constraint::Percentage(24),
        Constraint::Percentage(12),
        Constraint::Percentage(16),
        Constraint::Percentage(24),
        Constraint::Percentage(24),
    ];
    render_table(frame, area, app, title, &headers, rows, &widths);
}

fn render_pods(frame: &mut Frame, area: Rect, app: &App, title: &str, pods: &[Pod]) {
    let messages = app.messages();
    let now = Utc::now();
    let headers = [
        messages.t("pods.podName"),
        messages.t("common.namespace"),
        messages.t("pods.node"),
        messages.t("common.status"),
        messages.t("common.cpuUsage"),
        messages.t("common.memoryUsage"),
        messages.t("pods.uptime"),
        messages.t("pods.restartCount"),
    ];
    let rows = pods
        .iter()
        .map(|pod| {
            Row::new(vec![
                Cell::from(pod.pod_name.clone()).style(Style::default().fg(Color::White)),
                Cell::from(pod.namespace.clone()),
                Cell::from(pod.node_name.clone()),
                Cell::from(pod.status.clone())
                    .style(Style::default().fg(pod_phase_color(PodPhase::parse(&pod.status)))),
                Cell::from(format_usage(
                    pod.cpu_usage,
                    pod.cpu_usage_limit,
                    pod.cpu_usage_request,
                    pod.cpu_usage_percent,
                )),
                Cell::from(format_usage(
                    pod.memory_usage,
                    pod.memory_usage_limit,
                    pod.memory_usage_request,
                    pod.memory_usage_percent,
                )),
                Cell::from(format_pod_uptime(&pod.start_time, now)),
                Cell::from(pod.restart_count.to_string()),
            ])
        })
        .collect::<Vec<_>>();

    let widths = [
        Constraint::Percentage(18),
        Constraint::Percentage(10),
        Constraint::Percentage(12),
        Constraint::Percentage(9),
        Constraint::Percentage(16),
        Constraint::Percentage(16),
        Constraint::Percentage(12),
        Constraint::Percentage(7),
    ];
    render_table(frame, area, app, title, &headers, rows, &widths);
}

fn render_events(frame: &mut Frame, area: Rect, app: &App, title: &str, events: &[Event]) {
    let messages = app.messages();
    let headers = [
        messages.t("common.name"),
        messages.t("events.reason"),
        messages.t("events.message"),
        messages.t("events.type"),
        messages.t("events.object"),
        messages.t("events.firstSeen"),
        messages.t("events.lastSeen"),
        messages.t("events.count"),
    ];
    let rows = events
        .iter()
        .map(|event| {
            Row::new(vec![
                Cell::from(event.name.clone()).style(Style::default().fg(Color::White)),
                Cell::from(event.reason.clone()),
                Cell::from(compact_text(&event.message, 80)),
                Cell::from(event.event_type.clone())
                    .style(Style::default().fg(event_type_color(&event.event_type))),
                Cell::from(event.involved_object.clone()),
                Cell::from(format_event_time(&event.first_timestamp)),
                Cell::from(format_event_time(&event.last_timestamp)),
                Cell::from(event.count.to_string()),
            ])
        })
        .collect::<Vec<_>>();

    let widths = [
        Constraint::Percentage(14),
        Constraint::Percentage(10),
        Constraint::Percentage(26),
        Constraint::Percentage(7),
        Constraint::Percentage(13),
        Constraint::Percentage(12),
        Constraint::Percentage(12),
        Constraint::Percentage(6),
    ];
    render_table(frame, area, app, title, &headers, rows, &widths);
}

fn render_alerts(frame: &mut Frame, area: Rect, app: &App, title: &str, rules: &[AlertRule]) {
    let messages = app.messages();
    if rules.is_empty() {
        let panel = Paragraph::new(messages.t("alerts.none"))
            .block(panel_block(title.to_string(), MUTED))
            .style(Style::default().fg(MUTED));
        frame.render_widget(panel, area);
        return;
    }

    let headers = [
        messages.t("alerts.id"),
        messages.t("alerts.chatId"),
        messages.t("alerts.thread"),
        messages.t("alerts.type"),
        messages.t("common.namespace"),
        messages.t("alerts.created"),
    ];
    let rows = rules
        .iter()
        .map(|rule| {
            Row::new(vec![
                Cell::from(rule.id.to_string()),
                Cell::from(rule.chat_id.clone()).style(Style::default().fg(Color::White)),
                Cell::from(
                    rule.thread_id
                        .map(|thread| thread.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                ),
                Cell::from(rule.alert_type.to_string()),
                Cell::from(rule.namespace.clone()),
                Cell::from(format_event_time(&rule.created_at)),
            ])
        })
        .collect::<Vec<_>>();

    let widths = [
        Constraint::Percentage(8),
        Constraint::Percentage(22),
        Constraint::Percentage(12),
        Constraint::Percentage(14),
        Constraint::Percentage(20),
        Constraint::Percentage(24),
    ];
    render_table(frame, area, app, title, &headers, rows, &widths);
}

fn render_table(
    frame: &mut Frame,
    area: Rect,
    app: &App,
    title: &str,
    headers: &[String],
    rows: Vec<Row<'static>>,
    widths: &[Constraint],
) {
    let header_row = Row::new(headers.iter().map(|header| {
        Cell::from(header.clone()).style(Style::default().add_modifier(Modifier::BOLD))
    }))
    .height(1)
    .style(Style::default().fg(ACCENT));

    let title = if app.view().loading() {
        format!("{title} ({}) …", rows.len())
    } else {
        format!("{title} ({})", rows.len())
    };

    let table = Table::new(rows, widths.to_vec())
        .header(header_row)
        .block(panel_block(title, ACCENT))
        .column_spacing(1)
        .style(Style::default().fg(MUTED))
        .row_highlight_style(
            Style::default()
                .bg(Color::Rgb(24, 36, 58))
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(app.selected_index());
    frame.render_stateful_widget(table, area, &mut state);
}

fn render_metrics(
    frame: &mut Frame,
    area: Rect,
    app: &App,
    title: &str,
    query: &MetricsQuery,
    cpu: &[(f64, f64)],
    memory: &[(f64, f64)],
) {
    let messages = app.messages();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Percentage(50),
            Constraint::Percentage(50),
        ])
        .split(area);

    let window = app.metrics_window();
    let mode = if window.auto_step() {
        messages.t("metrics.auto")
    } else {
        messages.t("metrics.manual")
    };
    let info = Line::from(vec![
        Span::styled(
            messages.t_with("metrics.window", &[("window", window.window().label().as_str())]),
            Style::default().fg(Color::White),
        ),
        Span::raw("   "),
        Span::styled(
            messages.t_with("metrics.step", &[("step", query.step.as_str())]),
            Style::default().fg(Color::White),
        ),
        Span::styled(format!(" ({mode})"), Style::default().fg(MUTED)),
    ]);
    frame.render_widget(
        Paragraph::new(info).block(panel_block(title.to_string(), ACCENT)),
        chunks[0],
    );

    render_series_chart(frame, chunks[1], messages, &messages.t("metrics.cpu"), query, cpu, INFO);
    render_series_chart(
        frame,
        chunks[2],
        messages,
        &messages.t("metrics.memory"),
        query,
        memory,
        ACCENT,
    );
}

fn render_series_chart(
    frame: &mut Frame,
    area: Rect,
    messages: &Messages,
    title: &str,
    query: &MetricsQuery,
    points: &[(f64, f64)],
    color: Color,
) {
    if points.is_empty() {
        let panel = Paragraph::new(messages.t("metrics.empty"))
            .block(panel_block(title.to_string(), MUTED))
            .style(Style::default().fg(MUTED));
        frame.render_widget(panel, area);
        return;
    }

    let x_max = ((query.end - query.start).num_seconds() as f64).max(1.0);
    let y_max = points
        .iter()
        .map(|(_, value)| *value)
        .fold(0.0f64, f64::max)
        .max(0.01)
        * 1.2;

    let datasets = vec![
        Dataset::default()
            .name(title.to_string())
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(color))
            .data(points),
    ];

    let x_axis = Axis::default()
        .style(Style::default().fg(MUTED))
        .bounds([0.0, x_max])
        .labels(vec![
            Span::raw(local_time_label(query.start)),
            Span::raw(local_time_label(query.end)),
        ]);
    let y_axis = Axis::default()
        .style(Style::default().fg(MUTED))
        .bounds([0.0, y_max])
        .labels(vec![
            Span::raw("0"),
            Span::raw(format!("{:.2}", y_max / 2.0)),
            Span::raw(format!("{y_max:.2}")),
        ]);

    let chart = Chart::new(datasets)
        .block(panel_block(title.to_string(), MUTED))
        .x_axis(x_axis)
        .y_axis(y_axis);
    frame.render_widget(chart, area);
}

fn chart_points(
    points: &[MetricPoint],
    query: &MetricsQuery,
    scale: impl Fn(f64) -> f64,
) -> Vec<(f64, f64)> {
    points
        .iter()
        .filter_map(|point| {
            let at = parse_timestamp(&point.timestamp)?;
            let offset = (at - query.start).num_milliseconds() as f64 / 1000.0;
            Some((offset, scale(point.value)))
        })
        .collect()
}

fn local_time_label(at: DateTime<Utc>) -> String {
    at.with_timezone(&chrono::Local)
        .format("%H:%M")
        .to_string()
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
    if app.mode() == InputMode::Command {
        let mut spans = Vec::new();
        push_powerline_segment(&mut spans, " cmd ", Color::Black, ACCENT, PL_B);
        push_powerline_segment(
            &mut spans,
            format!(" :{} ", app.input()),
            Color::White,
            PL_B,
            BG,
        );
        frame.render_widget(
            Paragraph::new(Line::from(spans)).style(Style::default().bg(BG)),
            area,
        );
        return;
    }

    let status = app.status();
    let status_bg = if status_is_error(status) { ERROR } else { PL_B };
    let mut spans = Vec::new();
    push_powerline_segment(&mut spans, " nrm ", Color::White, PL_A, status_bg);
    push_powerline_segment(
        &mut spans,
        format!(
            " {} ",
            compact_text(status, area.width.saturating_sub(40).max(20) as usize)
        ),
        Color::White,
        status_bg,
        BG,
    );

    let glance = footer_glance(app);
    let glance_width = glance.chars().count() as u16;
    if glance_width == 0 || glance_width + 28 >= area.width {
        frame.render_widget(
            Paragraph::new(Line::from(spans)).style(Style::default().bg(BG)),
            area,
        );
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(glance_width)])
        .split(area);
    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(BG)),
        chunks[0],
    );
    frame.render_widget(
        Paragraph::new(glance)
            .style(Style::default().bg(BG).fg(MUTED))
            .alignment(Alignment::Right),
        chunks[1],
    );
}

fn footer_glance(app: &App) -> String {
    let watched = app.session().watched.namespaces().len();
    let base = format!("★{watched}  ? help ");
    match app.screen() {
        Screen::Page(page) if page.is_metrics() => {
            let window = app.metrics_window();
            let step = if window.auto_step() { "auto" } else { "manual" };
            format!("{}  step:{step}  {base}", window.window().label())
        }
        Screen::Page(Page::Events) => format!("type:{}  {base}", app.event_filter().label()),
        _ => base,
    }
}

fn status_is_error(status: &str) -> bool {
    let lowered = status.to_ascii_lowercase();
    lowered.contains("failed") || lowered.contains("unknown") || lowered.contains("invalid")
}

fn render_help_modal(frame: &mut Frame, app: &App) {
    let area = centered_rect(72, 76, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(format!(
            "kmon help  path:{}  ns:{}",
            app.current_path(),
            app.session().namespaces.selected()
        )),
        Line::from(""),
    ];
    for line in HELP_LINES {
        lines.push(Line::from(*line));
    }

    let modal = Paragraph::new(Text::from(lines))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(ACCENT))
                .style(Style::default().bg(PANEL)),
        )
        .style(Style::default().fg(Color::White));

    frame.render_widget(modal, area);
}

const HELP_LINES: &[&str] = &[
    "Keys",
    "  1-4 / Left Right     switch page (nodes, pods, events, alerts)",
    "  j k / g G            move selection",
    "  [ ]                  previous / next namespace",
    "  w                    watch or unwatch the selected namespace",
    "  t                    cycle event type filter",
    "  Enter / Esc          open metrics for the selected row / go back",
    "  a                    toggle auto step on metrics pages",
    "  r                    refresh now",
    "  L                    switch language",
    "  :  ?  q              command mode, help, quit",
    "",
    "Commands",
    "  :ns <name>                    select namespace",
    "  :open <path>                  open a route such as /ru/pods/web-0/metrics",
    "  :range <dur> | <start> <end>  metrics window (15m, 6h, RFC 3339 bounds)",
    "  :step <dur> | auto            metrics step",
    "  :type all|normal|warning      event type filter",
    "  :watch [ns]                   toggle a watched namespace",
    "  :alert ns <name>              show alerts of a watched namespace",
    "  :alert add chat=<id> token=<t> [thread=<n>] [type=all|warning|normal]",
    "  :alert rm [<id>]              delete a rule (selected rule when no id)",
    "  :lang en|ru  :refresh  :quit",
];

fn panel_block(title: String, border: Color) -> Block<'static> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .style(Style::default().bg(PANEL))
}

fn pod_phase_color(phase: PodPhase) -> Color {
    match phase {
        PodPhase::Running => ACCENT,
        PodPhase::Pending => WARN,
        PodPhase::Succeeded => INFO,
        PodPhase::Failed => ERROR,
        PodPhase::Unknown | PodPhase::Other => MUTED,
    }
}

fn event_type_color(event_type: &str) -> Color {
    match event_type {
        "Normal" => ACCENT,
        "Warning" => WARN,
        _ => MUTED,
    }
}

fn push_powerline_segment(
    spans: &mut Vec<Span<'static>>,
    content: impl Into<String>,
    fg: Color,
    bg: Color,
    next_bg: Color,
) {
    spans.push(Span::styled(
        content.into(),
        Style::default().fg(fg).bg(bg).add_modifier(Modifier::BOLD),
    ));
    spans.push(Span::styled("\u{e0b0}", Style::default().fg(bg).bg(next_bg)));
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::locale::Locale;
    use crate::poll::PollUpdate;
    use chrono::TimeZone;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn screen_text(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 30)).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn chart_points_offset_from_window_start() {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let query = MetricsQuery {
            start,
            end: start + chrono::TimeDelta::minutes(15),
            step: "15s".to_string(),
        };
        let points = vec![
            MetricPoint {
                timestamp: "2024-06-01T12:01:00Z".to_string(),
                value: 2.0 * 1024.0 * 1024.0,
            },
            MetricPoint {
                timestamp: "garbage".to_string(),
                value: 1.0,
            },
        ];
        assert_eq!(chart_points(&points, &query, memory_mib), vec![(60.0, 2.0)]);
    }

    #[test]
    fn status_colors_follow_phase_and_type() {
        assert_eq!(pod_phase_color(PodPhase::Running), ACCENT);
        assert_eq!(pod_phase_color(PodPhase::parse("Failed")), ERROR);
        assert_eq!(event_type_color("Warning"), WARN);
        assert_eq!(event_type_color("Other"), MUTED);
    }

    #[test]
    fn loading_then_table_render() {
        let mut app = App::new(&Settings::default(), Messages::load(Locale::En).unwrap());
        let plan = app.fetch_plan().unwrap();
        assert!(screen_text(&app).contains("Loading..."));

        app.apply_update(PollUpdate {
            generation: plan.generation,
            result: Ok(ViewData::Nodes(vec![Node {
                name: "worker-1".to_string(),
                status: "Ready".to_string(),
                ..Node::default()
            }])),
        });
        let text = screen_text(&app);
        assert!(text.contains("worker-1"));
        assert!(text.contains("Ready"));
    }

    #[test]
    fn error_renders_with_localized_template() {
        let mut app = App::new(&Settings::default(), Messages::load(Locale::Ru).unwrap());
        app.navigate("/ru/pods");
        let plan = app.fetch_plan().unwrap();
        app.apply_update(PollUpdate {
            generation: plan.generation,
            result: Err("Failed to fetch pods".to_string()),
        });
        assert!(screen_text(&app).contains("Failed to fetch pods"));
    }

    #[test]
    fn not_found_page_renders_path() {
        let mut app = App::new(&Settings::default(), Messages::load(Locale::En).unwrap());
        app.navigate("/fr/pods");
        assert!(screen_text(&app).contains("No page matches /fr/pods"));
    }
}
