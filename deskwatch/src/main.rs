//! deskwatch - workstation activity tracker
//!
//! Records activity events, window-focus intervals, and derived working
//! sessions for the local user.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Database: $XDG_DATA_HOME/deskwatch/data.db (~/.local/share/deskwatch/data.db)
//! - Config: $XDG_CONFIG_HOME/deskwatch/config.toml (~/.config/deskwatch/config.toml)
//! - Logs: $XDG_STATE_HOME/deskwatch/ (~/.local/state/deskwatch/)

mod signal;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use deskwatch_core::probe::SystemProbe;
use deskwatch_core::{Config, Database, Probe, ShutdownCoordinator, TrackerRunner};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "deskwatch")]
#[command(about = "Workstation activity tracker")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the tracker in the foreground
    Run {
        /// Stop on its own after this many seconds
        #[arg(long)]
        duration_secs: Option<u64>,
    },

    /// Show the open session, open intervals, and recent events
    Status {
        /// Number of recent events to show
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Print the effective configuration
    Config,
}

fn main() -> Result<()> {
    let args = Args::parse();

    Config::ensure_xdg_env();
    let config = Config::load().context("failed to load configuration")?;

    match args.command {
        Command::Run { duration_secs } => cmd_run(&config, duration_secs),
        Command::Status { limit } => cmd_status(&config, limit),
        Command::Config => cmd_config(&config),
    }
}

fn cmd_run(config: &Config, duration_secs: Option<u64>) -> Result<()> {
    let _log_guard =
        deskwatch_core::logging::init(&config.logging).context("failed to initialize logging")?;

    let db_path = config.database_path();
    tracing::info!(path = %db_path.display(), "opening database");
    let db = Database::open(&db_path).context("failed to open database")?;
    db.migrate().context("failed to run database migrations")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let coordinator = ShutdownCoordinator::new();
    let probe: Arc<dyn Probe> = Arc::new(SystemProbe::new());
    let mut runner = TrackerRunner::new(Arc::new(db), probe, &config.tracker, coordinator.clone());

    // The tracker loop is synchronous; it blocks a worker thread while the
    // signal listeners run on the async side.
    runtime.block_on(async {
        signal::spawn_listeners(&coordinator);
        let duration = duration_secs.map(Duration::from_secs);
        tokio::task::spawn_blocking(move || runner.run(duration))
            .await
            .context("tracker thread panicked")
    })?;

    Ok(())
}

fn cmd_status(config: &Config, limit: usize) -> Result<()> {
    let db_path = config.database_path();
    if !db_path.exists() {
        println!("No database at {} yet.", db_path.display());
        println!("Start tracking with: deskwatch run");
        return Ok(());
    }

    let db = Database::open(&db_path).context("failed to open database")?;
    db.migrate().context("failed to run database migrations")?;
    let username = config.tracker.username();

    println!("deskwatch status for {username}");
    println!();

    match db.find_open_session(&username)? {
        Some(session) => println!("Open session since {}", session.start_time.to_rfc3339()),
        None => println!("No open session"),
    }

    let intervals = db.find_open_intervals(&username)?;
    for interval in &intervals {
        println!(
            "Focused window: {} (since {})",
            interval.window_title,
            interval.start_time.to_rfc3339()
        );
    }

    let events = db.recent_activity(&username, limit)?;
    if !events.is_empty() {
        println!();
        println!("Recent events:");
        for event in events {
            println!("  {}  {}", event.timestamp.to_rfc3339(), event.kind);
        }
    }

    Ok(())
}

fn cmd_config(config: &Config) -> Result<()> {
    println!("# {}", Config::config_path().display());
    let rendered = toml::to_string_pretty(config).context("failed to render configuration")?;
    print!("{rendered}");
    Ok(())
}
