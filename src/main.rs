//! kokcall - emergency room finder
//!
//! Terminal client: sign in, fill in a health profile, then search for an
//! emergency room and request a connection. Records are kept as JSON files
//! in the configured data directory.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{Duration, Instant};

use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

use kokcall::application::App;
use kokcall::infrastructure::{Config, JsonFileStore, RecordStore, StaticHospitalSource};
use kokcall::presentation::{InputHandler, render_ui};

/// Longest the loop waits for input when no timer is pending.
const IDLE_POLL: Duration = Duration::from_millis(250);

#[derive(Debug, Parser)]
#[command(name = "kokcall", version, about = "Find an available emergency room")]
struct Cli {
    /// Configuration file (defaults to ~/.config/kokcall/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the stored session and account records
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Clear stored records before starting
    #[arg(long)]
    reset: bool,
}

/// Entry point for the kokcall terminal client.
///
/// Loads configuration, starts file logging, sets up the terminal and runs
/// the event loop until the user quits.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the log file cannot be
/// opened, or terminal setup fails.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    let _guard = init_tracing(&config)?;
    tracing::info!(data_dir = %config.data_dir.display(), "starting kokcall");

    let store = Rc::new(JsonFileStore::new(config.data_dir.clone()));
    if cli.reset {
        store.clear()?;
        tracing::info!("stored records cleared");
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, store, Box::new(StaticHospitalSource));
    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = %err, "event loop failed");
        println!("{err:?}");
    }

    Ok(())
}

/// Sends log output to a file so it never lands on the alternate screen.
fn init_tracing(config: &Config) -> Result<WorkerGuard, Box<dyn std::error::Error>> {
    fs::create_dir_all(&config.log_dir)?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix("kokcall.log")
        .build(&config.log_dir)?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("KOKCALL_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(guard)
}

/// Main application event loop.
///
/// Redraws, waits for input no longer than the nearest timer deadline, then
/// fires whatever timers came due.
///
/// # Arguments
///
/// * `terminal` - Terminal interface for rendering
/// * `app` - Mutable reference to application state
///
/// # Errors
///
/// Returns an IO error if terminal operations fail.
fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    while !app.should_quit {
        let frame = terminal.draw(|f| render_ui(f, app))?;
        app.viewport_width = frame.area.width;
        app.viewport_height = frame.area.height;

        let timeout = app
            .next_deadline_in(Instant::now())
            .map_or(IDLE_POLL, |due| due.min(IDLE_POLL));
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    InputHandler::handle_key_event(app, key.code, key.modifiers);
                }
                Event::Mouse(mouse) => InputHandler::handle_mouse_event(app, mouse),
                Event::Resize(width, height) => {
                    app.viewport_width = width;
                    app.viewport_height = height;
                }
                _ => {}
            }
        }
        app.tick(Instant::now());
    }
    Ok(())
}
