use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use timetrack_cli::commands::{delete, edit, link, report, start, status, stop, watch};
use timetrack_cli::{Cli, Commands, Config, DesktopNotifier};
use timetrack_core::entry::now;
use timetrack_core::{AlertMonitor, Timer};
use timetrack_db::Database;

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = Database::open(&config.database_path).with_context(|| {
        format!("failed to open database {}", config.database_path.display())
    })?;
    Ok((db, config))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config_path = cli.config.as_deref();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match command {
        Commands::Start(args) => {
            let (db, _config) = open_database(config_path)?;
            let directory = std::env::current_dir().context("failed to read current directory")?;
            let mut timer = Timer::new(db);
            let entry = start::run(&mut out, &mut timer, args, &directory, now())?;
            if let Some(threshold) = entry.expected_duration {
                watch::spawn_detached(entry.id, threshold, config_path)?;
            }
        }
        Commands::Stop => {
            let (db, _config) = open_database(config_path)?;
            stop::stop(&mut out, &mut Timer::new(db), now())?;
        }
        Commands::Pause => {
            let (db, _config) = open_database(config_path)?;
            stop::pause(&mut out, &mut Timer::new(db), now())?;
        }
        Commands::Resume => {
            let (db, _config) = open_database(config_path)?;
            stop::resume(&mut out, &mut Timer::new(db), now())?;
        }
        Commands::Status => {
            let (db, _config) = open_database(config_path)?;
            status::run(&mut out, &Timer::new(db), now())?;
        }
        Commands::Link { project } => {
            let (db, _config) = open_database(config_path)?;
            let directory = std::env::current_dir().context("failed to read current directory")?;
            link::link(&mut out, &mut Timer::new(db), project, &directory, now())?;
        }
        Commands::Mappings => {
            let (db, _config) = open_database(config_path)?;
            link::list(&mut out, &db)?;
        }
        Commands::Report(args) => {
            let (db, _config) = open_database(config_path)?;
            report::run(&mut out, &db, args, now().date_naive())?;
        }
        Commands::Edit(args) => {
            let (db, _config) = open_database(config_path)?;
            let mut input = io::stdin().lock();
            edit::run(&mut input, &mut out, &mut Timer::new(db), args)?;
        }
        Commands::Delete { id, force } => {
            let (db, _config) = open_database(config_path)?;
            let mut input = io::stdin().lock();
            delete::run(&mut input, &mut out, &mut Timer::new(db), *id, *force)?;
        }
        Commands::Watch { id, threshold } => {
            let (db, config) = open_database(config_path)?;
            let poll = Duration::from_secs(config.alert_poll_secs);
            watch::run(&db, &DesktopNotifier, AlertMonitor::new(*id, *threshold), poll)?;
        }
    }

    out.flush()?;
    Ok(())
}
