//! Peiban TUI - a terminal client for the Peiban check-in journal.
//!
//! Daily check-ins, a photo journal and a profile, behind a phone or
//! WeChat login. The session is restored from the stored token at startup.

mod app;
mod ui;
mod utils;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::{App, AppState};
use peiban_core::api::ApiClient;
use peiban_core::auth::{storage, SessionState, SessionStore};
use peiban_core::Config;
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

const LOG_FILE_PREFIX: &str = "peiban.log";

/// Initialize the tracing subscriber for logging.
///
/// The terminal belongs to the UI, so logs go to a daily file in the state
/// directory. Use RUST_LOG to control the level (e.g., RUST_LOG=debug).
fn init_tracing(config: &Config) -> Result<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let log_dir = config.log_dir()?;
    std::fs::create_dir_all(&log_dir)?;
    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();

    Ok(guard)
}

/// Session store for the one-shot CLI commands.
fn build_session(config: &Config) -> Result<SessionStore> {
    let api = ApiClient::from_config(config)?;
    let token_storage = storage::from_config(config)?;
    Ok(SessionStore::new(Arc::new(api), token_storage))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = Config::load()?;
    let _log_guard = init_tracing(&config)?;

    // Check for CLI commands
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1] == "--logout" {
        return logout_command(&config);
    }
    if args.len() > 1 && args[1] == "--whoami" {
        return whoami_command(&config).await;
    }

    info!("Peiban TUI starting");

    // Create app before touching the terminal so config errors print normally
    let mut app = App::new(config)?;
    app.start_restore();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("Peiban TUI shutting down");
    Ok(())
}

/// Forget the stored session token
fn logout_command(config: &Config) -> Result<()> {
    let session = build_session(config)?;
    session.logout();
    println!("Logged out.");
    Ok(())
}

/// Restore the stored session and print who it belongs to
async fn whoami_command(config: &Config) -> Result<()> {
    let session = build_session(config)?;
    match session.restore().await {
        SessionState::Authenticated => {
            let snapshot = session.snapshot();
            if let Some(user) = snapshot.user() {
                println!("{} (id {})", user.display_name(), user.id);
                if let Some(phone) = user.phone.as_deref() {
                    println!("Phone: {}", utils::format_phone(phone));
                }
            }
        }
        _ => println!("Not logged in."),
    }
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Apply finished background work and re-run the route guard
        app.tick();

        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                // Handle input
                if handle_input(app, key).await? {
                    return Ok(());
                }
            }
        }

        // Check if we should quit
        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}
