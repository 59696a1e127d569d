//! Tracing setup. The filter comes from `NATTER_LOG` (default `natter=info`).
//! The TUI owns the terminal, so it logs to a file or not at all; `natter list`
//! logs to stderr.

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, PartialEq, Eq)]
pub enum LogTarget {
    File(PathBuf),
    Stderr,
    Off,
}

/// Default log file in the user's data directory.
pub fn default_log_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("natter").join("natter.log"))
}

/// Where to log. The TUI never writes to stderr, even without a log file.
pub fn target_for(tui: bool, log_file: Option<PathBuf>) -> LogTarget {
    match (tui, log_file) {
        (false, _) => LogTarget::Stderr,
        (true, Some(path)) => LogTarget::File(path),
        (true, None) => LogTarget::Off,
    }
}

pub fn init(target: LogTarget) -> Result<()> {
    let filter = EnvFilter::try_from_env("NATTER_LOG").unwrap_or_else(|_| EnvFilter::new("natter=info"));
    let registry = tracing_subscriber::registry().with(filter);

    match target {
        LogTarget::File(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).context("Failed to create log directory")?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            registry
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .try_init()
                .context("Failed to install tracing subscriber")?;
        }
        LogTarget::Stderr => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .try_init()
                .context("Failed to install tracing subscriber")?;
        }
        LogTarget::Off => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tui_without_log_file_stays_off_stderr() {
        assert_eq!(target_for(true, None), LogTarget::Off);
        assert_eq!(
            target_for(true, Some(PathBuf::from("/tmp/natter.log"))),
            LogTarget::File(PathBuf::from("/tmp/natter.log"))
        );
        assert_eq!(target_for(false, None), LogTarget::Stderr);
        assert_eq!(target_for(false, Some(PathBuf::from("ignored.log"))), LogTarget::Stderr);
    }

    #[test]
    fn off_installs_nothing() {
        assert!(init(LogTarget::Off).is_ok());
    }
}
