//! humble-logistics service.
//!
//! Moves cargo between warehouses on a scalable virtual clock.  One thread
//! runs the minute scheduler; the main thread runs a line-based admin
//! console on stdin.
//!
//! # Quick Start
//!
//! ```bash
//! # Write a default config file and create the database
//! humble-logistics init
//!
//! # Run at one virtual minute per real second, journaling to ./journal
//! humble-logistics run --scale 60 --journal ./journal
//! ```

mod admin;
mod config;

#[cfg(test)]
mod tests;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use hl_core::VirtualClock;
use hl_journal::{CsvJournal, JournalError, JournalObserver};
use hl_sim::{NoopObserver, SchedulerBuilder};
use hl_store::SqliteStore;
use tracing::{info, warn};

use crate::admin::{Admin, HELP, admin_loop};
use crate::config::{DEFAULT_CONFIG_FILE, LogisticsConfig};

/// humble-logistics - warehouse transport simulation on a virtual clock.
#[derive(Parser)]
#[command(name = "humble-logistics")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file (if missing) and create the database.
    Init {
        /// Overwrite an existing config file.
        #[arg(long)]
        force: bool,
    },

    /// Start the scheduler and the admin console.
    Run {
        /// Database file (overrides `[database]`).
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Initial clock scale (overrides `[clock] scale`).
        #[arg(short, long)]
        scale: Option<f64>,

        /// Journal directory (overrides `[journal] dir`).
        #[arg(short, long)]
        journal: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { force } => init(&cli.config, force),
        Commands::Run { database, scale, journal } => {
            let mut config = LogisticsConfig::load_or_default(&cli.config)?;
            if let Some(scale) = scale {
                config.clock.scale = scale;
            }
            if journal.is_some() {
                config.journal.dir = journal;
            }
            config.validate()?;
            let db_path = database.unwrap_or_else(|| config.database.path());
            run(&config, &db_path)
        }
    }
}

fn init(config_path: &Path, force: bool) -> Result<()> {
    let config = if config_path.exists() && !force {
        info!(path = %config_path.display(), "keeping existing config");
        LogisticsConfig::load(config_path)?
    } else {
        let config = LogisticsConfig::default();
        config.save(config_path)?;
        info!(path = %config_path.display(), "wrote default config");
        config
    };

    let db_path = config.database.path();
    if let Some(dir) = db_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    SqliteStore::open(&db_path).with_context(|| format!("opening {}", db_path.display()))?;
    info!(path = %db_path.display(), "database ready");
    Ok(())
}

fn run(config: &LogisticsConfig, db_path: &Path) -> Result<()> {
    if !db_path.exists() {
        return Err(anyhow!(
            "no database at {}; run `humble-logistics init` first",
            db_path.display()
        ));
    }

    let clock = Arc::new(match config.clock.start_unix_secs {
        Some(start) => VirtualClock::starting_at(start),
        None => VirtualClock::new(),
    });
    clock.set_scale(config.clock.scale);

    // Each thread gets its own connection; SQLite serialises the writers.
    let open = || SqliteStore::open(db_path).with_context(|| format!("opening {}", db_path.display()));
    let mut scheduler = SchedulerBuilder::new(open()?, Arc::clone(&clock))
        .config(config.scheduler.to_scheduler_config()?)
        .build()?;
    let mut admin = Admin::new(open()?, Arc::clone(&clock));

    let journal = match &config.journal.dir {
        Some(dir) => Some(
            CsvJournal::open(dir).with_context(|| format!("opening journal {}", dir.display()))?,
        ),
        None => None,
    };

    let stop = Arc::new(AtomicBool::new(false));
    let handle = {
        let stop = Arc::clone(&stop);
        thread::Builder::new()
            .name("scheduler".into())
            .spawn(move || -> Option<JournalError> {
                match journal {
                    Some(writer) => {
                        let mut observer = JournalObserver::new(writer);
                        scheduler.run_until(&stop, &mut observer);
                        observer.finish();
                        observer.take_error()
                    }
                    None => {
                        scheduler.run_until(&stop, &mut NoopObserver);
                        None
                    }
                }
            })
            .context("spawning scheduler thread")?
    };

    println!("{HELP}");
    let console = admin_loop(&mut admin, io::stdin().lock(), io::stdout());

    info!("stopping scheduler");
    stop.store(true, Ordering::Relaxed);
    let journal_error = handle.join().map_err(|_| anyhow!("scheduler thread panicked"))?;
    if let Some(e) = journal_error {
        warn!(error = %e, "journal incomplete");
    }
    console.context("reading admin console")?;
    Ok(())
}
