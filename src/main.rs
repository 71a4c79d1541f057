mod app;
mod config;
mod domain;
mod input;
mod persistence;
mod sync;
mod ticker;
mod ui;

use anyhow::{Context, Result};
use app::AppState;
use clap::{Parser, Subcommand};
use config::{load_config, save_config, Config};
use crossterm::{
    event::{
        self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture, Event,
        KeyEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use domain::derive_views;
use persistence::{config_file, ensure_data_dir, init_local_dir, log_file};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Mutex;
use std::time::Instant;
use sync::{FileSync, MemorySync, SyncAdapter, User};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ticklist")]
#[command(about = "A swipeable terminal task list with undo", long_about = None)]
struct Cli {
    /// Keep tasks in memory only; nothing is written to disk
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a local .ticklist directory in the current directory
    Init,
    /// Sign in with an e-mail address
    Login {
        email: String,
    },
    /// Forget the signed-in account
    Logout,
    /// Print active and completed tasks
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Init) => {
            let dir = init_local_dir()?;
            save_config(config_file(&dir), &Config::default())?;
            println!("Initialized ticklist directory: {}", dir.display());
            println!();
            println!("Run 'ticklist login <email>' to sign in, then 'ticklist' to start.");
            Ok(())
        }
        Some(Commands::Login { email }) => {
            let dir = ensure_data_dir()?;
            let user = sync::sign_in(&dir, &email)?;
            println!("Signed in as {}", user.email);
            Ok(())
        }
        Some(Commands::Logout) => {
            let dir = ensure_data_dir()?;
            if sync::sign_out(&dir)? {
                println!("Signed out. Your tasks stay in {}", dir.display());
            } else {
                println!("Not signed in.");
            }
            Ok(())
        }
        Some(Commands::List) => {
            let dir = ensure_data_dir()?;
            print_tasks(&dir)
        }
        None => run_tui(cli.ephemeral),
    }
}

/// Send tracing output to a file; the terminal belongs to the UI
fn init_logging(dir: &Path) -> Result<()> {
    let path = log_file(dir);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}

fn print_tasks(dir: &Path) -> Result<()> {
    let mut backend = FileSync::open(dir)?;
    let Some(user) = backend.current_user() else {
        anyhow::bail!("Not signed in. Run 'ticklist login <email>' first.");
    };
    let tasks = backend.query().context("Failed to load tasks")?;
    let views = derive_views(&tasks);

    if views.is_empty() {
        println!("No tasks for {}", user.email);
        return Ok(());
    }

    println!("To do ({}) · {}", views.active.len(), user.email);
    for task in &views.active {
        println!("  ○ {}", task.title);
    }
    println!();
    println!("Done ({})", views.completed.len());
    for task in &views.completed {
        println!("  ✓ {}", task.title);
    }
    Ok(())
}

fn run_tui(ephemeral: bool) -> Result<()> {
    let dir = ensure_data_dir()?;
    init_logging(&dir)?;

    let config = load_config(config_file(&dir)).unwrap_or_else(|err| {
        error!(error = %err, "ignoring unreadable config");
        Config::default()
    });

    let backend: Box<dyn SyncAdapter> = if ephemeral {
        info!("starting ephemeral session");
        Box::new(MemorySync::signed_in(User::guest()))
    } else {
        info!(dir = %dir.display(), "starting session");
        Box::new(FileSync::open(&dir)?)
    };

    let mut app = AppState::new(backend, &config);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, &config);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableFocusChange
    )?;
    terminal.show_cursor()?;

    if let Err(err) = &result {
        error!(error = %err, "event loop failed");
        eprintln!("Error: {}", err);
    }
    info!("session ended");

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
    config: &Config,
) -> Result<()> {
    let tick_rate = ticker::tick_duration(config.tick_ms);

    loop {
        terminal.draw(|f| ui::render(f, app))?;

        // Wake early for a pending swipe deadline
        let now = Instant::now();
        let timeout = app
            .gestures
            .next_deadline()
            .map(|deadline| deadline.saturating_duration_since(now).min(tick_rate))
            .unwrap_or(tick_rate);

        if event::poll(timeout)? {
            match event::read()? {
                // Only process key press events (ignore key release)
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if input::handle_key(app, key)? {
                        return Ok(());
                    }
                }
                Event::Mouse(mouse) => input::handle_mouse(app, mouse, Instant::now()),
                Event::FocusLost => {
                    app.cancel_press();
                    app.blur_editing_except(None);
                }
                _ => {}
            }
        }

        app.tick(Instant::now());
    }
}
