//! natter - a comment thread in your terminal
//!
//! Browse, vote on, reply to, edit and delete comments. The thread is kept
//! in a local SQLite database between runs.

mod adapters;
mod app;
mod config;
mod domain;
mod keymap;
mod logging;
mod persistence;
mod ports;
mod store;
mod ui;

#[cfg(test)]
mod test_support;

use adapters::{CrosstermTerminal, MemoryStateStore, SqliteStateStore, SystemClock};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::Config;
use persistence::Persistence;
use ports::StateStore;
use std::path::PathBuf;
use std::sync::Arc;
use store::Store;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "natter")]
#[command(about = "A comment thread in your terminal")]
#[command(version)]
struct Args {
    /// Config file (default: <config dir>/natter/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database file (default: <data dir>/natter/state.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Keep everything in memory; nothing is saved
    #[arg(long, global = true)]
    ephemeral: bool,

    /// Discard the saved thread and start from the sample one
    #[arg(long, global = true)]
    reset: bool,

    /// Log file for the TUI (default: <data dir>/natter/natter.log)
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the thread to stdout
    List {
        /// Wrap width
        #[arg(long, default_value_t = 80)]
        width: usize,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;

    let log_target = logging::target_for(
        args.command.is_none(),
        args.log_file.clone().or_else(logging::default_log_path),
    );
    if let Err(e) = logging::init(log_target) {
        eprintln!("Warning: Could not initialize logging: {:#}", e);
    }

    let persistence = open_persistence(&args, &config).map(|store| Persistence::new(store, config.slot.clone()));

    if args.reset {
        if let Some(persistence) = &persistence {
            persistence.clear().context("Failed to reset saved thread")?;
            info!(slot = persistence.slot(), "cleared saved thread");
        }
    }

    let mut store = Store::load(Arc::new(SystemClock), persistence);

    match args.command {
        Some(Command::List { width }) => {
            print!("{}", ui::plain::list(&mut store, width));
            Ok(())
        }
        None => {
            let mut app = app::App::new(store, config.refresh_interval());
            let mut terminal = CrosstermTerminal::new()?;
            app.run(&mut terminal)
        }
    }
}

/// Pick the slot storage. A database that cannot be opened downgrades to
/// a session without persistence rather than refusing to start.
fn open_persistence(args: &Args, config: &Config) -> Option<Arc<dyn StateStore>> {
    if args.ephemeral {
        return Some(Arc::new(MemoryStateStore::new()));
    }

    let path = match args.db.clone().or_else(|| config.db_path.clone()) {
        Some(path) => path,
        None => match SqliteStateStore::default_path() {
            Ok(path) => path,
            Err(e) => {
                warn!(error = %e, "no data directory; changes will not be saved");
                return None;
            }
        },
    };

    match SqliteStateStore::open(&path) {
        Ok(store) => Some(Arc::new(store)),
        Err(e) => {
            warn!(error = %e, path = %path.display(), "could not open database; changes will not be saved");
            eprintln!("Warning: Could not open {}: {:#}. Changes will not be saved.", path.display(), e);
            None
        }
    }
}
