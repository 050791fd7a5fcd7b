use crate::config::Settings;
use crate::dispatch::BackendOutcome;
use crate::format::parse_duration_token;
use crate::gateway::GatewayResult;
use crate::input::Action;
use crate::locale::{Locale, Messages, RouteOutcome, localized_path, resolve_path};
use crate::model::{AlertType, EventTypeFilter, NewAlertRule, Page, PageKind};
use crate::poll::{Generation, PollUpdate};
use crate::store::{Session, WatchChange};
use crate::view::{FetchRequest, MetricsWindow, TimeWindow, ViewData, ViewState};
use chrono::{DateTime, Local, Utc};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum InputMode {
    Normal,
    Command,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    None,
    ToggleWatch {
        namespace: String,
        change: WatchChange,
    },
    CreateAlert(NewAlertRule),
    DeleteAlert { id: i64 },
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Screen {
    Page(Page),
    NotFound { path: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPlan {
    pub generation: Generation,
    pub request: FetchRequest,
    pub period: Option<Duration>,
}

pub struct App {
    running: bool,
    mode: InputMode,
    input: String,
    status: String,
    show_help: bool,
    session: Session,
    messages: Messages,
    screen: Screen,
    view: ViewState,
    active: Option<(Generation, FetchRequest)>,
    last_generation: Generation,
    refresh_requested: bool,
    event_filter: EventTypeFilter,
    metrics_window: MetricsWindow,
    alerts_namespace: Option<String>,
    selected: usize,
    events_limit: u32,
    metrics_refresh: Duration,
    list_refresh: Option<Duration>,
}

impl App {
    pub fn new(settings: &Settings, messages: Messages) -> Self {
        Self {
            running: true,
            mode: InputMode::Normal,
            input: String::new(),
            status: "Ready".to_string(),
            show_help: false,
            session: Session::default(),
            messages,
            screen: Screen::Page(Page::Nodes),
            view: ViewState::default(),
            active: None,
            last_generation: 0,
            refresh_requested: false,
            event_filter: EventTypeFilter::default(),
            metrics_window: MetricsWindow::new(TimeWindow::Relative(settings.metrics_window)),
            alerts_namespace: None,
            selected: 0,
            events_limit: settings.events_limit,
            metrics_refresh: settings.metrics_refresh,
            list_refresh: settings.list_refresh,
        }
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn messages(&self) -> &Messages {
        &self.messages
    }

    pub fn locale(&self) -> Locale {
        self.messages.locale()
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn event_filter(&self) -> EventTypeFilter {
        self.event_filter
    }

    pub fn metrics_window(&self) -> &MetricsWindow {
        &self.metrics_window
    }

    pub fn selected_index(&self) -> Option<usize> {
        (self.row_count() > 0).then_some(self.selected)
    }

    pub fn active_kind(&self) -> Option<PageKind> {
        match &self.screen {
            Screen::Page(page) => Some(page.kind()),
            Screen::NotFound { .. } => None,
        }
    }

    pub fn current_path(&self) -> String {
        match &self.screen {
            Screen::Page(page) => localized_path(self.locale(), page),
            Screen::NotFound { path } => path.clone(),
        }
    }

    pub fn alerts_namespace(&self) -> Option<&str> {
        let watched = &self.session.watched;
        self.alerts_namespace
            .as_deref()
            .filter(|namespace| watched.contains(namespace))
            .or_else(|| watched.namespaces().first().map(String::as_str))
    }

    pub fn navigate(&mut self, path: &str) {
        let mut outcome = resolve_path(path);
        if let RouteOutcome::Redirect(target) = &outcome {
            debug!(from = path, to = %target, "route redirected");
            outcome = resolve_path(target);
        }

        match outcome {
            RouteOutcome::Render { locale, page } => {
                self.set_locale(locale);
                self.set_page(page);
            }
            RouteOutcome::NotFound { path } => {
                self.status = format!("No page matches {path}");
                self.screen = Screen::NotFound { path };
                self.selected = 0;
            }
            RouteOutcome::Redirect(target) => {
                self.status = format!("Redirect loop at {target}");
                self.screen = Screen::NotFound { path: target };
            }
        }
    }

    pub fn fetch_plan(&mut self) -> Option<FetchPlan> {
        let Some(request) = self.desired_request() else {
            if self.active.take().is_some() {
                self.view = ViewState::default();
            }
            return None;
        };

        let same_target = self
            .active
            .as_ref()
            .is_some_and(|(_, previous)| previous == &request);
        if !same_target || self.refresh_requested {
            self.last_generation += 1;
            let generation = self.last_generation;
            self.view.begin(generation, same_target);
            if !same_target {
                self.selected = 0;
            }
            self.refresh_requested = false;
            debug!(generation, ?request, "fetch issued");
            self.active = Some((generation, request));
        }

        let (generation, request) = self.active.clone()?;
        let period = if request.is_metrics() {
            Some(self.metrics_refresh)
        } else {
            self.list_refresh
        };
        Some(FetchPlan {
            generation,
            request,
            period,
        })
    }

    pub fn apply_update(&mut self, update: PollUpdate<ViewData>) -> bool {
        let generation = update.generation;
        let applied = self.view.apply(update, Local::now());
        if applied {
            self.clamp_selection();
        } else {
            debug!(generation, current = self.view.generation(), "stale result dropped");
        }
        applied
    }

    pub fn apply_outcome(&mut self, outcome: BackendOutcome) {
        match outcome {
            BackendOutcome::Namespaces { result, preferred } => {
                self.session.namespaces.apply_fetch(result);
                if let Some(namespace) = preferred {
                    self.session.namespaces.select(namespace);
                }
                self.status = format!("Namespace: {}", self.session.namespaces.selected());
            }
            BackendOutcome::Watched(Ok(namespaces)) => self.session.watched.replace(namespaces),
            BackendOutcome::Watched(Err(error)) => {
                warn!("watched namespaces unavailable: {error}");
            }
            BackendOutcome::WatchToggled {
                namespace,
                change,
                result,
            } => {
                let result = self.session.watched.apply(&namespace, change, result);
                self.report_watch_result(&namespace, result);
            }
            BackendOutcome::AlertChanged { action, result } => {
                self.report_alert_change(action, result);
            }
        }
    }

    fn report_watch_result(&mut self, namespace: &str, result: GatewayResult<WatchChange>) {
        self.status = match result {
            Ok(WatchChange::Added) => format!("Watching '{namespace}'"),
            Ok(WatchChange::Removed) => format!("Stopped watching '{namespace}'"),
            Err(error) => format!("Watch toggle failed: {error}"),
        };
    }

    fn report_alert_change(&mut self, action: &str, result: GatewayResult<()>) {
        match result {
            Ok(()) => {
                self.status = format!("Alert rule {action}");
                self.refresh_requested = true;
            }
            Err(error) => {
                self.status = format!("Alert rule not {action}: {error}");
            }
        }
    }

    pub fn apply_action(&mut self, action: Action) -> AppCommand {
        if self.show_help && !matches!(action, Action::ToggleHelp) {
            self.show_help = false;
        }

        match action {
            Action::Quit => {
                self.running = false;
                self.status = "Exit requested".to_string();
                AppCommand::None
            }
            Action::NextPage => self.switch_page_by_offset(1),
            Action::PrevPage => self.switch_page_by_offset(-1),
            Action::SwitchPage(index) => {
                if let Some(kind) = PageKind::ALL.get(usize::from(index).saturating_sub(1)) {
                    self.set_page(Page::from_kind(*kind));
                }
                AppCommand::None
            }
            Action::Down => {
                self.move_selection(1);
                AppCommand::None
            }
            Action::Up => {
                self.move_selection(-1);
                AppCommand::None
            }
            Action::Top => {
                self.selected = 0;
                AppCommand::None
            }
            Action::Bottom => {
                self.selected = self.row_count().saturating_sub(1);
                AppCommand::None
            }
            Action::NextNamespace => self.select_namespace_by_offset(1),
            Action::PrevNamespace => self.select_namespace_by_offset(-1),
            Action::ToggleWatch => {
                let namespace = self.session.namespaces.selected().to_string();
                self.watch_command(namespace)
            }
            Action::CycleEventFilter => {
                self.event_filter = self.event_filter.next();
                self.status = format!("Event type: {}", self.event_filter.label());
                AppCommand::None
            }
            Action::OpenSelected => {
                self.open_selected_metrics();
                AppCommand::None
            }
            Action::Back => {
                let parent = match &self.screen {
                    Screen::Page(page) if page.is_metrics() => Some(Page::from_kind(page.kind())),
                    Screen::NotFound { .. } => Some(Page::Nodes),
                    Screen::Page(_) => None,
                };
                if let Some(page) = parent {
                    self.set_page(page);
                }
                AppCommand::None
            }
            Action::Refresh => {
                self.refresh_requested = true;
                self.status = "Refreshing".to_string();
                AppCommand::None
            }
            Action::SwitchLocale => {
                self.set_locale(self.locale().toggled());
                self.status = format!("Language: {}", self.locale());
                AppCommand::None
            }
            Action::ToggleAutoStep => {
                let enabled = !self.metrics_window.auto_step();
                self.metrics_window.set_auto_step(enabled);
                self.status = if enabled {
                    "Auto step enabled".to_string()
                } else {
                    "Auto step disabled".to_string()
                };
                AppCommand::None
            }
            Action::ToggleHelp => {
                self.show_help = !self.show_help;
                AppCommand::None
            }
            Action::StartCommand => {
                self.mode = InputMode::Command;
                self.input.clear();
                self.status = "Command mode".to_string();
                AppCommand::None
            }
            Action::SubmitInput => self.submit_input(),
            Action::CancelInput => {
                self.mode = InputMode::Normal;
                self.input.clear();
                self.status = "Cancelled".to_string();
                AppCommand::None
            }
            Action::Backspace => {
                self.input.pop();
                AppCommand::None
            }
            Action::InputChar(c) => {
                self.input.push(c);
                AppCommand::None
            }
        }
    }

    fn desired_request(&self) -> Option<FetchRequest> {
        let Screen::Page(page) = &self.screen else {
            return None;
        };
        let namespace = self.session.namespaces.selected().to_string();

        let request = match page {
            Page::Nodes => FetchRequest::Nodes,
            Page::Pods => FetchRequest::Pods { namespace },
            Page::Events => FetchRequest::Events {
                namespace,
                limit: self.events_limit,
                filter: self.event_filter,
            },
            Page::NodeMetrics { node } => FetchRequest::NodeMetrics {
                node: node.clone(),
                window: self.metrics_window.clone(),
            },
            Page::PodMetrics { pod } => FetchRequest::PodMetrics {
                namespace,
                pod: pod.clone(),
                window: self.metrics_window.clone(),
            },
            Page::Alerts => FetchRequest::Alerts {
                namespace: self.alerts_namespace()?.to_string(),
            },
        };
        Some(request)
    }

    fn watch_command(&mut self, namespace: String) -> AppCommand {
        let change = self.session.watched.planned_change(&namespace);
        self.status = match change {
            WatchChange::Added => format!("Watching '{namespace}' …"),
            WatchChange::Removed => format!("Unwatching '{namespace}' …"),
        };
        AppCommand::ToggleWatch { namespace, change }
    }

    fn set_page(&mut self, page: Page) {
        debug!(path = %localized_path(self.locale(), &page), "page opened");
        self.screen = Screen::Page(page);
        self.selected = 0;
    }

    fn set_locale(&mut self, locale: Locale) {
        if locale == self.locale() {
            return;
        }
        match Messages::load(locale) {
            Ok(messages) => self.messages = messages,
            Err(error) => self.status = format!("Language switch failed: {error:#}"),
        }
    }

    fn switch_page_by_offset(&mut self, delta: isize) -> AppCommand {
        let len = PageKind::ALL.len() as isize;
        let current = self
            .active_kind()
            .and_then(|kind| PageKind::ALL.iter().position(|candidate| *candidate == kind))
            .unwrap_or(0) as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        self.set_page(Page::from_kind(PageKind::ALL[next]));
        AppCommand::None
    }

    fn select_namespace_by_offset(&mut self, delta: isize) -> AppCommand {
        if self.session.namespaces.select_offset(delta) {
            self.status = format!("Namespace: {}", self.session.namespaces.selected());
        }
        AppCommand::None
    }

    fn row_count(&self) -> usize {
        match self.view.data() {
            Some(ViewData::Nodes(nodes)) => nodes.len(),
            Some(ViewData::Pods(pods)) => pods.len(),
            Some(ViewData::Events(events)) => events.len(),
            Some(ViewData::Alerts(alerts)) => alerts.len(),
            Some(ViewData::Metrics { .. }) | None => 0,
        }
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.row_count();
        if len == 0 {
            self.selected = 0;
            return;
        }

        let max_index = len.saturating_sub(1) as isize;
        let current = self.selected.min(max_index as usize) as isize;
        self.selected = (current + delta).clamp(0, max_index) as usize;
    }

    fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.row_count().saturating_sub(1));
    }

    fn open_selected_metrics(&mut self) {
        let target = match self.view.data() {
            Some(ViewData::Nodes(nodes)) if self.active_kind() == Some(PageKind::Nodes) => nodes
                .get(self.selected)
                .map(|node| Page::NodeMetrics {
                    node: node.name.clone(),
                }),
            Some(ViewData::Pods(pods)) if self.active_kind() == Some(PageKind::Pods) => pods
                .get(self.selected)
                .map(|pod| Page::PodMetrics {
                    pod: pod.pod_name.clone(),
                }),
            _ => None,
        };

        match target {
            Some(page) if Some(&page) != self.current_page() => self.set_page(page),
            Some(_) => {}
            None => self.status = "Nothing to open".to_string(),
        }
    }

    fn current_page(&self) -> Option<&Page> {
        match &self.screen {
            Screen::Page(page) => Some(page),
            Screen::NotFound { .. } => None,
        }
    }

    fn selected_alert_id(&self) -> Option<i64> {
        match self.view.data() {
            Some(ViewData::Alerts(alerts)) => alerts.get(self.selected).map(|rule| rule.id),
            _ => None,
        }
    }

    fn submit_input(&mut self) -> AppCommand {
        let line = self.input.trim().to_string();
        self.mode = InputMode::Normal;
        self.input.clear();
        self.execute_command_line(&line)
    }

    fn execute_command_line(&mut self, line: &str) -> AppCommand {
        let line = line.strip_prefix(':').unwrap_or(line).trim();
        if line.is_empty() {
            self.status = "No command entered".to_string();
            return AppCommand::None;
        }

        let parts = line.split_whitespace().collect::<Vec<_>>();
        let (command, args) = (parts[0].to_ascii_lowercase(), &parts[1..]);

        match command.as_str() {
            "q" | "quit" | "exit" => {
                self.running = false;
                self.status = "Exit requested".to_string();
                AppCommand::None
            }
            "refresh" | "reload" | "r" => {
                self.refresh_requested = true;
                self.status = "Refreshing".to_string();
                AppCommand::None
            }
            "help" => {
                self.show_help = true;
                AppCommand::None
            }
            "ns" | "namespace" => {
                let Some(namespace) = args.first() else {
                    let known = self.session.namespaces.namespaces();
                    self.status = if known.is_empty() {
                        "No namespaces loaded".to_string()
                    } else {
                        format!("Namespaces: {}", known.join(", "))
                    };
                    return AppCommand::None;
                };
                self.session.namespaces.select(*namespace);
                self.status = format!("Namespace: {namespace}");
                AppCommand::None
            }
            "open" | "go" => {
                let Some(path) = args.first() else {
                    self.status = "Usage: :open <path>".to_string();
                    return AppCommand::None;
                };
                self.navigate(path);
                AppCommand::None
            }
            "range" | "window" => {
                self.apply_range(args);
                AppCommand::None
            }
            "step" => {
                match args.first() {
                    Some(token) if token.eq_ignore_ascii_case("auto") => {
                        self.metrics_window.set_auto_step(true);
                        self.status = "Auto step enabled".to_string();
                    }
                    Some(token) => match self.metrics_window.set_step(token) {
                        Ok(()) => self.status = format!("Step: {token}"),
                        Err(error) => self.status = error,
                    },
                    None => self.status = "Usage: :step <duration>|auto".to_string(),
                }
                AppCommand::None
            }
            "type" | "filter" => {
                match EventTypeFilter::from_token(args.first().copied().unwrap_or_default()) {
                    Some(filter) => {
                        self.event_filter = filter;
                        self.status = format!("Event type: {}", filter.label());
                    }
                    None => self.status = "Usage: :type all|normal|warning".to_string(),
                }
                AppCommand::None
            }
            "watch" => {
                let namespace = args
                    .first()
                    .map(|namespace| namespace.to_string())
                    .unwrap_or_else(|| self.session.namespaces.selected().to_string());
                self.watch_command(namespace)
            }
            "alert" | "alerts" => self.execute_alert_command(args),
            "lang" | "language" => {
                match args.first().and_then(|tag| Locale::from_tag(tag)) {
                    Some(locale) => {
                        self.set_locale(locale);
                        self.status = format!("Language: {locale}");
                    }
                    None => self.status = "Usage: :lang en|ru".to_string(),
                }
                AppCommand::None
            }
            _ => {
                self.status = format!("Unknown command '{command}'");
                AppCommand::None
            }
        }
    }

    fn apply_range(&mut self, args: &[&str]) {
        let window = match args {
            [span] => parse_duration_token(span).map(TimeWindow::Relative),
            [start, end] => match (parse_instant(start), parse_instant(end)) {
                (Some(start), Some(end)) => TimeWindow::absolute(start, end),
                _ => None,
            },
            _ => None,
        };

        match window {
            Some(window) => {
                self.metrics_window.set_window(window);
                self.status = format!("Window: {}", window.label());
            }
            None => {
                self.status =
                    "Usage: :range <duration> | <start> <end> (RFC 3339, start <= end)".to_string();
            }
        }
    }

    fn execute_alert_command(&mut self, args: &[&str]) -> AppCommand {
        match args {
            ["ns", namespace] | ["namespace", namespace] => {
                if self.session.watched.contains(namespace) {
                    self.alerts_namespace = Some(namespace.to_string());
                    self.status = format!("Alert namespace: {namespace}");
                } else {
                    self.status = format!("Namespace '{namespace}' is not watched");
                }
                AppCommand::None
            }
            ["add", fields @ ..] => {
                let Some(namespace) = self.alerts_namespace().map(str::to_string) else {
                    self.status = "No watched namespaces; watch one with :watch".to_string();
                    return AppCommand::None;
                };
                match parse_alert_rule(fields, namespace) {
                    Ok(rule) => {
                        self.status = format!("Creating alert rule for '{}'", rule.namespace);
                        AppCommand::CreateAlert(rule)
                    }
                    Err(error) => {
                        self.status = error;
                        AppCommand::None
                    }
                }
            }
            ["rm"] | ["delete"] => match self.selected_alert_id() {
                Some(id) => {
                    self.status = format!("Deleting alert rule {id}");
                    AppCommand::DeleteAlert { id }
                }
                None => {
                    self.status = "Usage: :alert rm <id>".to_string();
                    AppCommand::None
                }
            },
            ["rm", id] | ["delete", id] => match id.parse::<i64>() {
                Ok(id) => {
                    self.status = format!("Deleting alert rule {id}");
                    AppCommand::DeleteAlert { id }
                }
                Err(_) => {
                    self.status = format!("Invalid alert id '{id}'");
                    AppCommand::None
                }
            },
            _ => {
                self.status =
                    "Usage: :alert ns <name> | add chat=<id> token=<t> [thread=<n>] [type=all|warning|normal] | rm <id>"
                        .to_string();
                AppCommand::None
            }
        }
    }
}

fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|instant| instant.with_timezone(&Utc))
}

fn parse_alert_rule(fields: &[&str], namespace: String) -> Result<NewAlertRule, String> {
    let mut chat_id = None;
    let mut bot_token = None;
    let mut thread_id = None;
    let mut alert_type = AlertType::default();

    for field in fields {
        let Some((key, value)) = field.split_once('=') else {
            return Err(format!("Expected key=value, got '{field}'"));
        };
        match key {
            "chat" | "chat_id" => chat_id = Some(value.to_string()),
            "token" | "bot_token" => bot_token = Some(value.to_string()),
            "thread" | "thread_id" => {
                let parsed = value
                    .parse::<i64>()
                    .map_err(|_| format!("Thread id must be a number, got '{value}'"))?;
                thread_id = Some(parsed);
            }
            "type" => {
                alert_type = AlertType::from_token(value)
                    .ok_or_else(|| format!("Alert type must be all, warning or normal, got '{value}'"))?;
            }
            _ => return Err(format!("Unknown alert field '{key}'")),
        }
    }

    let chat_id = chat_id
        .filter(|value| !value.is_empty())
        .ok_or_else(|| "Alert rule needs chat=<id>".to_string())?;
    let bot_token = bot_token
        .filter(|value| !value.is_empty())
        .ok_or_else(|| "Alert rule needs token=<bot token>".to_string())?;

    Ok(NewAlertRule {
        bot_token,
        chat_id,
        thread_id,
        alert_type,
        namespace,
    })
}

#[cfg(test)]
mod tests {
    use super::{App, AppCommand, Screen};
    use crate::config::Settings;
    use crate::dispatch::BackendOutcome;
    use crate::gateway::GatewayError;
    use crate::input::Action;
    use crate::locale::{Locale, Messages};
    use crate::model::{
        AlertRule, AlertType, EventTypeFilter, MetricPoint, MetricSeries, MetricsQuery, Node, Page,
        Pod,
    };
    use crate::poll::PollUpdate;
    use crate::store::WatchChange;
    use crate::view::{FetchRequest, ViewData};
    use chrono::Utc;
    use std::time::Duration;

    fn app() -> App {
        App::new(&Settings::default(), Messages::load(Locale::En).unwrap())
    }

    fn run_command(app: &mut App, line: &str) -> AppCommand {
        app.apply_action(Action::StartCommand);
        for c in line.chars() {
            app.apply_action(Action::InputChar(c));
        }
        app.apply_action(Action::SubmitInput)
    }

    fn pods(names: &[&str]) -> ViewData {
        ViewData::Pods(
            names
                .iter()
                .map(|name| Pod {
                    pod_name: name.to_string(),
                    ..Pod::default()
                })
                .collect(),
        )
    }

    fn nodes(names: &[&str]) -> ViewData {
        ViewData::Nodes(
            names
                .iter()
                .map(|name| Node {
                    name: name.to_string(),
                    ..Node::default()
                })
                .collect(),
        )
    }

    fn metrics(value: f64) -> ViewData {
        let mut series = MetricSeries::default();
        series.cpu_usage.push(MetricPoint {
            timestamp: "2024-01-01T00:00:00Z".to_string(),
            value,
        });
        ViewData::Metrics {
            series,
            query: MetricsQuery {
                start: Utc::now(),
                end: Utc::now(),
                step: "15s".to_string(),
            },
        }
    }

    #[test]
    fn nodes_page_is_planned_once() {
        let mut app = app();
        let plan = app.fetch_plan().unwrap();
        assert_eq!(plan.request, FetchRequest::Nodes);
        assert_eq!(plan.period, None);
        assert!(app.view().loading());

        let again = app.fetch_plan().unwrap();
        assert_eq!(again.generation, plan.generation);
    }

    #[test]
    fn namespace_switch_refetches_pods_and_discards_prior_results() {
        let mut app = app();
        app.session
            .namespaces
            .apply_fetch(Ok(vec!["default".to_string(), "kube-system".to_string()]));
        app.navigate("/en/pods");

        let first = app.fetch_plan().unwrap();
        assert_eq!(
            first.request,
            FetchRequest::Pods {
                namespace: "default".to_string()
            }
        );
        assert!(app.apply_update(PollUpdate {
            generation: first.generation,
            result: Ok(pods(&["web-0"])),
        }));

        app.apply_action(Action::NextNamespace);
        let second = app.fetch_plan().unwrap();
        assert_eq!(
            second.request,
            FetchRequest::Pods {
                namespace: "kube-system".to_string()
            }
        );
        assert_ne!(second.generation, first.generation);
        assert!(app.view().data().is_none());

        assert!(!app.apply_update(PollUpdate {
            generation: first.generation,
            result: Ok(pods(&["web-0"])),
        }));
        assert!(app.view().data().is_none());
    }

    #[test]
    fn late_metrics_for_previous_target_never_overwrite_current() {
        let mut app = app();
        app.navigate("/en/nodes/a/metrics");
        let plan_a = app.fetch_plan().unwrap();
        assert_eq!(plan_a.period, Some(Duration::from_secs(30)));

        app.navigate("/en/nodes/b/metrics");
        let plan_b = app.fetch_plan().unwrap();
        assert!(matches!(
            plan_b.request,
            FetchRequest::NodeMetrics { ref node, .. } if node == "b"
        ));

        assert!(app.apply_update(PollUpdate {
            generation: plan_b.generation,
            result: Ok(metrics(2.0)),
        }));
        assert!(!app.apply_update(PollUpdate {
            generation: plan_a.generation,
            result: Ok(metrics(1.0)),
        }));
        match app.view().data() {
            Some(ViewData::Metrics { series, .. }) => assert_eq!(series.cpu_usage[0].value, 2.0),
            other => panic!("unexpected view data: {other:?}"),
        }
    }

    #[test]
    fn refresh_keeps_data_for_same_target() {
        let mut app = app();
        let first = app.fetch_plan().unwrap();
        app.apply_update(PollUpdate {
            generation: first.generation,
            result: Ok(nodes(&["worker-1"])),
        });

        app.apply_action(Action::Refresh);
        let second = app.fetch_plan().unwrap();
        assert_eq!(second.generation, first.generation + 1);
        assert_eq!(app.view().data(), Some(&nodes(&["worker-1"])));

        app.apply_update(PollUpdate {
            generation: second.generation,
            result: Err("Failed to fetch nodes".to_string()),
        });
        assert_eq!(app.view().data(), Some(&nodes(&["worker-1"])));
        assert_eq!(app.view().error(), Some("Failed to fetch nodes"));
    }

    #[test]
    fn namespace_round_trip_issues_identical_requests() {
        let mut app = app();
        app.navigate("/en/events");
        run_command(&mut app, "ns ns1");
        let first = app.fetch_plan().unwrap().request;
        run_command(&mut app, "ns ns2");
        app.fetch_plan();
        run_command(&mut app, "ns ns1");
        assert_eq!(app.fetch_plan().unwrap().request, first);
    }

    #[test]
    fn language_switch_keeps_page() {
        let mut app = app();
        app.navigate("/pods");
        assert_eq!(app.current_path(), "/en/pods");

        app.apply_action(Action::SwitchLocale);
        assert_eq!(app.locale(), Locale::Ru);
        assert_eq!(app.current_path(), "/ru/pods");

        run_command(&mut app, "lang en");
        assert_eq!(app.current_path(), "/en/pods");
    }

    #[test]
    fn unsupported_locale_shows_not_found_without_fetching() {
        let mut app = app();
        app.fetch_plan();
        app.navigate("/fr/pods");
        assert!(matches!(app.screen(), Screen::NotFound { .. }));
        assert!(app.fetch_plan().is_none());

        app.apply_action(Action::Back);
        assert_eq!(app.screen(), &Screen::Page(Page::Nodes));
    }

    #[test]
    fn enter_opens_node_metrics_and_esc_returns() {
        let mut app = app();
        let plan = app.fetch_plan().unwrap();
        app.apply_update(PollUpdate {
            generation: plan.generation,
            result: Ok(nodes(&["worker-1", "worker-2"])),
        });

        app.apply_action(Action::Down);
        app.apply_action(Action::OpenSelected);
        assert_eq!(app.current_path(), "/en/nodes/worker-2/metrics");

        app.apply_action(Action::Back);
        assert_eq!(app.current_path(), "/en");
    }

    #[test]
    fn event_type_filter_changes_request() {
        let mut app = app();
        app.navigate("/en/events");
        let first = app.fetch_plan().unwrap();

        run_command(&mut app, "type warning");
        assert_eq!(app.event_filter(), EventTypeFilter::Warning);
        let second = app.fetch_plan().unwrap();
        assert_ne!(first.generation, second.generation);
        assert!(matches!(
            second.request,
            FetchRequest::Events { filter: EventTypeFilter::Warning, limit: 100, .. }
        ));
    }

    #[test]
    fn step_and_range_commands_edit_metrics_window() {
        let mut app = app();
        run_command(&mut app, "step 30s");
        assert!(!app.metrics_window().auto_step());

        run_command(&mut app, "range 6h");
        assert!(!app.metrics_window().auto_step());
        assert_eq!(app.status(), "Window: last 6h");

        run_command(&mut app, "step auto");
        assert!(app.metrics_window().auto_step());

        run_command(&mut app, "range 2024-06-02T00:00:00Z 2024-06-01T00:00:00Z");
        assert!(app.status().starts_with("Usage: :range"));
    }

    #[test]
    fn watch_command_targets_selected_or_named_namespace() {
        let mut app = app();
        app.session.watched.replace(vec!["prod".to_string()]);
        assert_eq!(
            app.apply_action(Action::ToggleWatch),
            AppCommand::ToggleWatch {
                namespace: "default".to_string(),
                change: WatchChange::Added,
            }
        );
        assert_eq!(
            run_command(&mut app, "watch prod"),
            AppCommand::ToggleWatch {
                namespace: "prod".to_string(),
                change: WatchChange::Removed,
            }
        );
    }

    #[test]
    fn watch_outcome_mirrors_only_successful_toggles() {
        let mut app = app();
        app.apply_outcome(BackendOutcome::WatchToggled {
            namespace: "dev".to_string(),
            change: WatchChange::Added,
            result: Err(GatewayError::Status("Failed to add watched namespace".to_string())),
        });
        assert!(!app.session().watched.contains("dev"));
        assert_eq!(
            app.status(),
            "Watch toggle failed: Failed to add watched namespace"
        );

        app.apply_outcome(BackendOutcome::WatchToggled {
            namespace: "dev".to_string(),
            change: WatchChange::Added,
            result: Ok(()),
        });
        assert!(app.session().watched.contains("dev"));
        assert_eq!(app.status(), "Watching 'dev'");
    }

    #[test]
    fn bootstrap_outcomes_seed_session_and_honor_preferred_namespace() {
        let mut app = app();
        app.navigate("/en/pods");
        let first = app.fetch_plan().unwrap();

        app.apply_outcome(BackendOutcome::Namespaces {
            result: Ok(vec!["default".to_string(), "kube-system".to_string()]),
            preferred: Some("kube-system".to_string()),
        });
        app.apply_outcome(BackendOutcome::Watched(Ok(vec!["prod".to_string()])));

        assert_eq!(app.session().namespaces.selected(), "kube-system");
        assert!(app.session().watched.contains("prod"));
        let second = app.fetch_plan().unwrap();
        assert_ne!(second.generation, first.generation);
        assert_eq!(
            second.request,
            FetchRequest::Pods {
                namespace: "kube-system".to_string()
            }
        );

        app.apply_outcome(BackendOutcome::Watched(Err(GatewayError::Transport(
            "backend is unreachable".to_string(),
        ))));
        assert!(app.session().watched.contains("prod"));
    }

    #[test]
    fn alerts_page_needs_a_watched_namespace() {
        let mut app = app();
        app.navigate("/en/alerts");
        assert!(app.fetch_plan().is_none());
        assert_eq!(
            run_command(&mut app, "alert add chat=1 token=t"),
            AppCommand::None
        );

        app.session
            .watched
            .replace(vec!["prod".to_string(), "dev".to_string()]);
        assert_eq!(
            app.fetch_plan().unwrap().request,
            FetchRequest::Alerts {
                namespace: "prod".to_string()
            }
        );

        run_command(&mut app, "alert ns dev");
        assert_eq!(app.alerts_namespace(), Some("dev"));
        run_command(&mut app, "alert ns other");
        assert_eq!(app.alerts_namespace(), Some("dev"));
    }

    #[test]
    fn alert_add_builds_rule_for_alerts_namespace() {
        let mut app = app();
        app.session.watched.replace(vec!["prod".to_string()]);

        let command = run_command(&mut app, "alert add chat=-100 token=abc thread=7 type=warning");
        match command {
            AppCommand::CreateAlert(rule) => {
                assert_eq!(rule.chat_id, "-100");
                assert_eq!(rule.bot_token, "abc");
                assert_eq!(rule.thread_id, Some(7));
                assert_eq!(rule.alert_type, AlertType::Warning);
                assert_eq!(rule.namespace, "prod");
            }
            other => panic!("unexpected command: {other:?}"),
        }

        assert_eq!(
            run_command(&mut app, "alert add chat=1 token=t thread=x"),
            AppCommand::None
        );
        assert_eq!(run_command(&mut app, "alert add token=t"), AppCommand::None);
    }

    #[test]
    fn alert_rm_uses_id_or_selected_rule() {
        let mut app = app();
        assert_eq!(
            run_command(&mut app, "alert rm 12"),
            AppCommand::DeleteAlert { id: 12 }
        );

        app.session.watched.replace(vec!["prod".to_string()]);
        app.navigate("/en/alerts");
        let plan = app.fetch_plan().unwrap();
        app.apply_update(PollUpdate {
            generation: plan.generation,
            result: Ok(ViewData::Alerts(vec![AlertRule {
                id: 5,
                chat_id: "1".to_string(),
                thread_id: None,
                alert_type: AlertType::All,
                namespace: "prod".to_string(),
                created_at: String::new(),
            }])),
        });
        assert_eq!(
            run_command(&mut app, "alert rm"),
            AppCommand::DeleteAlert { id: 5 }
        );
    }

    #[test]
    fn successful_alert_change_refetches_list() {
        let mut app = app();
        app.session.watched.replace(vec!["prod".to_string()]);
        app.navigate("/en/alerts");
        let before = app.fetch_plan().unwrap().generation;

        app.apply_outcome(BackendOutcome::AlertChanged {
            action: "created",
            result: Err(GatewayError::Status("Failed to create alert".to_string())),
        });
        assert_eq!(app.fetch_plan().unwrap().generation, before);
        assert_eq!(
            app.status(),
            "Alert rule not created: Failed to create alert"
        );

        app.apply_outcome(BackendOutcome::AlertChanged {
            action: "created",
            result: Ok(()),
        });
        assert_eq!(app.fetch_plan().unwrap().generation, before + 1);
    }

    #[test]
    fn page_keys_cycle_top_level_pages() {
        let mut app = app();
        app.apply_action(Action::PrevPage);
        assert_eq!(app.screen(), &Screen::Page(Page::Alerts));
        app.apply_action(Action::NextPage);
        assert_eq!(app.screen(), &Screen::Page(Page::Nodes));
        app.apply_action(Action::SwitchPage(3));
        assert_eq!(app.screen(), &Screen::Page(Page::Events));
    }

    #[test]
    fn selection_is_clamped_to_rows() {
        let mut app = app();
        app.navigate("/en/pods");
        let plan = app.fetch_plan().unwrap();
        app.apply_update(PollUpdate {
            generation: plan.generation,
            result: Ok(pods(&["a", "b", "c"])),
        });
        app.apply_action(Action::Bottom);
        assert_eq!(app.selected_index(), Some(2));
        app.apply_action(Action::Down);
        assert_eq!(app.selected_index(), Some(2));

        app.apply_action(Action::Refresh);
        let plan = app.fetch_plan().unwrap();
        app.apply_update(PollUpdate {
            generation: plan.generation,
            result: Ok(pods(&["a"])),
        });
        assert_eq!(app.selected_index(), Some(0));
    }

    #[test]
    fn quit_stops_app() {
        let mut app = app();
        app.apply_action(Action::Quit);
        assert!(!app.running());
    }
}
