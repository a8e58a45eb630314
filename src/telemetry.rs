//! Telemetry and logging infrastructure
//!
//! - Console logging (human-readable, verbose mode only)
//! - JSON file logging, rolled daily (for analysis)
//!
//! `RUST_LOG` overrides the default filter.

use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

/// File name prefix for the rolling JSON log
pub const LOG_FILE_PREFIX: &str = "overseer.log";

/// Filter used when `RUST_LOG` is unset
fn default_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug,hyper=warn,reqwest=warn,h2=warn,rustls=warn,html5ever=warn")
        } else {
            EnvFilter::new("info,hyper=warn,reqwest=warn,h2=warn,rustls=warn,html5ever=warn")
        }
    })
}

/// Installed logging stack; keep alive for the life of the process so the
/// file writer flushes
pub struct Telemetry {
    session_id: Uuid,
    log_dir: PathBuf,
    _file_guard: WorkerGuard,
}

impl Telemetry {
    /// Install the global subscriber. A second call keeps the first
    /// subscriber but still returns a working guard.
    pub fn init(log_dir: &Path, verbose: bool) -> anyhow::Result<Self> {
        std::fs::create_dir_all(log_dir)?;

        let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
        let (non_blocking, file_guard) = tracing_appender::non_blocking(file_appender);

        if verbose {
            tracing_subscriber::registry()
                .with(default_filter(verbose))
                .with(fmt::layer().with_target(false).compact())
                .with(fmt::layer().json().with_writer(non_blocking))
                .try_init()
                .ok();
        } else {
            // Console stays clean for the REPL
            tracing_subscriber::registry()
                .with(default_filter(verbose))
                .with(fmt::layer().json().with_writer(non_blocking))
                .try_init()
                .ok();
        }

        let session_id = Uuid::new_v4();
        tracing::info!(
            session_id = %session_id,
            log_dir = %log_dir.display(),
            verbose,
            "Telemetry initialized"
        );

        Ok(Self {
            session_id,
            log_dir: log_dir.to_path_buf(),
            _file_guard: file_guard,
        })
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }
}

impl std::fmt::Debug for Telemetry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Telemetry")
            .field("session_id", &self.session_id)
            .field("log_dir", &self.log_dir)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_log_dir() {
        let temp = TempDir::new().unwrap();
        let log_dir = temp.path().join("logs").join("nested");

        let telemetry = Telemetry::init(&log_dir, false).unwrap();
        assert!(log_dir.is_dir());
        assert_eq!(telemetry.log_dir(), log_dir.as_path());

        // Re-initialising does not fail
        let again = Telemetry::init(&log_dir, true).unwrap();
        assert_ne!(again.session_id(), telemetry.session_id());
    }
}
