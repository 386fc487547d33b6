// src/main.rs

use clap::Parser;
use crossterm::event::{self, Event};
use ollama_remote_panel::{
    app::AppState,
    drafts::DraftStore,
    error::{AppError, Result},
    events::AppEvent,
    handlers,
    panel::{CallStatus, Intent, Panel},
    remote_api::RemoteClient,
    settings::{Cli, Command, ConfigAction, Settings},
    tasks,
    tui::TerminalGuard,
    ui,
};
use ratatui::{backend::Backend, Terminal};
use std::{fs::File, process::ExitCode, sync::Mutex, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(&cli)?;

    let settings = Settings::resolve(&cli)?;
    info!(url = %settings.base_url, "connecting to panel daemon");
    let client = RemoteClient::with_timeout(
        settings.base_url.clone(),
        settings.token.clone(),
        settings.timeout,
    )?;
    let drafts = match &settings.state_file {
        Some(path) => DraftStore::open(path),
        None => DraftStore::in_memory(),
    };
    let mut panel = Panel::new(client, drafts, AppState::new());

    if let Some(command) = cli.command {
        return run_headless(&mut panel, command).await;
    }

    let mut terminal = TerminalGuard::init()?;
    let res = run_app(&mut *terminal, &mut panel).await;
    drop(terminal);

    if let Err(err) = res {
        error!("TUI error: {err}");
        eprintln!("Error running app: {err}");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Subcommands log to stderr. The TUI owns the screen, so it only logs when
/// a log file is given.
fn init_logging(cli: &Cli) -> Result<()> {
    let default_level = if cli.command.is_some() { "warn" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if cli.command.is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else if let Some(path) = &cli.log_file {
        let file = File::create(path)?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    }
    Ok(())
}

async fn run_headless(panel: &mut Panel, command: Command) -> Result<ExitCode> {
    let show_config = matches!(
        command,
        Command::Config {
            action: ConfigAction::Show
        }
    );
    let intent = command.into_intent();

    let status = panel.execute(intent).await;
    let state = panel.state();

    if show_config && status != CallStatus::Failed {
        let snapshot = state.config.clone().unwrap_or_default();
        println!("{}", serde_json::to_string_pretty(&snapshot).map_err(AppError::Serialization)?);
    } else {
        println!("{}", state.output);
    }

    Ok(match status {
        CallStatus::Failed => ExitCode::FAILURE,
        CallStatus::Succeeded { exit_code } => {
            ExitCode::from(u8::try_from(exit_code.unwrap_or(0)).unwrap_or(1))
        }
        CallStatus::Discarded => ExitCode::SUCCESS,
    })
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, panel: &mut Panel) -> Result<()> {
    // Channel for completions coming back from spawned calls
    let (tx, mut rx) = mpsc::channel::<AppEvent>(32);

    tasks::spawn_call(panel.begin(Intent::LoadConfig), tx.clone());

    loop {
        panel.state_mut().expire_notice(Instant::now());
        terminal.draw(|f| ui::draw(f, panel))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if handlers::handle_key_event(key, panel, &tx) {
                    return Ok(());
                }
            }
        }

        loop {
            match rx.try_recv() {
                Ok(AppEvent::CallCompleted(completion)) => {
                    panel.finish(completion);
                }
                Err(mpsc::error::TryRecvError::Empty) => break,
                // The loop holds `tx`, so this is unreachable while running.
                Err(mpsc::error::TryRecvError::Disconnected) => break,
            }
        }
    }
}
