mod app;
mod cli;
mod config;
mod dispatch;
mod format;
mod gateway;
mod input;
mod locale;
mod model;
mod poll;
mod store;
mod ui;
mod view;

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use cli::CliArgs;
use config::Settings;
use crossterm::event::{
    Event, EventStream, KeyEventKind, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
    supports_keyboard_enhancement,
};
use dispatch::BackendOutcome;
use futures::StreamExt;
use gateway::BackendGateway;
use locale::{Locale, Messages};
use poll::{PollTask, PollUpdate};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::fs::OpenOptions;
use std::io::{self, Stdout};
use std::path::Path;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tokio::time::{Duration, MissedTickBehavior, interval};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use view::{ViewData, fetch_view_data};

type TuiTerminal = Terminal<CrosstermBackend<Stdout>>;
const REDRAW_PERIOD: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(&args.log_filter, args.log_file.as_deref())?;

    let settings = Settings::load(&args)?;
    info!(
        backend = %settings.backend_base_url,
        config = settings.source.as_deref().unwrap_or("-"),
        "starting kmon"
    );
    let gateway = BackendGateway::new(&settings.backend_base_url, settings.request_timeout)?;

    let mut app = App::new(&settings, Messages::load(Locale::default())?);
    app.navigate(&args.route);

    run(&mut app, &gateway, args.namespace.as_deref()).await
}

fn init_tracing(level_filter: &str, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_new(level_filter)
        .or_else(|_| EnvFilter::try_new("info"))
        .context("failed to initialize tracing filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact();

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            let _ = builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
        None => {
            let _ = builder.with_writer(std::io::sink).try_init();
        }
    }

    Ok(())
}

async fn run(
    app: &mut App,
    gateway: &BackendGateway,
    namespace_override: Option<&str>,
) -> Result<()> {
    let (mut terminal, keyboard_enhanced) = init_terminal()?;
    let run_result = run_loop(&mut terminal, app, gateway, namespace_override).await;
    let restore_result = restore_terminal(&mut terminal, keyboard_enhanced);

    match (run_result, restore_result) {
        (Err(run_error), Err(restore_error)) => Err(anyhow::anyhow!(
            "{run_error:#}\nterminal restore error: {restore_error:#}"
        )),
        (Err(error), _) => Err(error),
        (_, Err(error)) => Err(error),
        (Ok(()), Ok(())) => Ok(()),
    }
}

fn init_terminal() -> Result<(TuiTerminal, bool)> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    let keyboard_enhanced = matches!(supports_keyboard_enhancement(), Ok(true));
    if keyboard_enhanced {
        execute!(
            stdout,
            EnterAlternateScreen,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )
        .context("failed to enter alternate screen with keyboard enhancement")?;
    } else {
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;
    terminal.clear().context("failed to clear terminal")?;
    Ok((terminal, keyboard_enhanced))
}

fn restore_terminal(terminal: &mut TuiTerminal, keyboard_enhanced: bool) -> Result<()> {
    if keyboard_enhanced {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)
            .context("failed to pop keyboard enhancement flags")?;
    }
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

async fn run_loop(
    terminal: &mut TuiTerminal,
    app: &mut App,
    gateway: &BackendGateway,
    namespace_override: Option<&str>,
) -> Result<()> {
    app.set_status(format!("Connecting to {}", gateway.base_url()));

    let mut reader = EventStream::new();
    let mut ticker = interval(REDRAW_PERIOD);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let (poll_tx, mut poll_rx) = mpsc::unbounded_channel::<PollUpdate<ViewData>>();
    let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel::<BackendOutcome>();
    let mut poll_task: Option<PollTask> = None;

    dispatch::spawn_bootstrap(gateway, namespace_override.map(str::to_string), &outcome_tx);

    loop {
        sync_poll_task(app, gateway, &mut poll_task, &poll_tx);
        terminal
            .draw(|frame| ui::render(frame, app))
            .context("failed to render terminal frame")?;

        if !app.running() {
            break;
        }

        tokio::select! {
            maybe_event = reader.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        if let Some(action) = input::map_key(app.mode(), key) {
                            debug!("action={action:?}");
                            let command = app.apply_action(action);
                            dispatch::spawn_command(gateway, command, &outcome_tx);
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(error)) => {
                        app.set_status(format!("terminal event error: {error}"));
                    }
                    None => {
                        app.set_status("terminal event stream closed");
                        break;
                    }
                }
            }
            maybe_update = poll_rx.recv() => {
                if let Some(update) = maybe_update {
                    app.apply_update(update);
                }
            }
            maybe_outcome = outcome_rx.recv() => {
                if let Some(outcome) = maybe_outcome {
                    app.apply_outcome(outcome);
                }
            }
            _ = ticker.tick() => {}
        }
    }

    Ok(())
}

/// Keeps exactly one poll task alive for the current fetch plan. Replacing
/// the task drops the previous one, which cancels it.
fn sync_poll_task(
    app: &mut App,
    gateway: &BackendGateway,
    slot: &mut Option<PollTask>,
    tx: &mpsc::UnboundedSender<PollUpdate<ViewData>>,
) {
    let Some(plan) = app.fetch_plan() else {
        if slot.take().is_some() {
            debug!("poll task stopped");
        }
        return;
    };

    if slot
        .as_ref()
        .is_some_and(|task| task.generation() == plan.generation)
    {
        return;
    }

    let gateway = gateway.clone();
    let request = plan.request;
    *slot = Some(PollTask::spawn(
        plan.generation,
        plan.period,
        tx.clone(),
        move || {
            let gateway = gateway.clone();
            let request = request.clone();
            async move { fetch_view_data(&gateway, &request).await }
        },
    ));
}
