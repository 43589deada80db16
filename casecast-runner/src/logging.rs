//! Logging setup.
//!
//! Installs a global tracing subscriber that writes formatted events to
//! stderr. The filter comes from `CASECAST_LOG` (standard `EnvFilter`
//! directives), defaulting to `info`.

use std::sync::OnceLock;

use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

/// Environment variable holding the filter directives.
pub const LOG_ENV: &str = "CASECAST_LOG";
const DEFAULT_FILTER: &str = "info";

/// Outcome of the one install attempt: `true` when our subscriber is the
/// global default.
static INSTALLED: OnceLock<bool> = OnceLock::new();

/// Errors that may occur while initializing logging.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// Another global subscriber was installed first.
    #[error("Failed to install global tracing subscriber: another subscriber is already set")]
    SetGlobal,
}

/// Initialize tracing to stderr.
///
/// Only the first call installs; concurrent and later calls wait for it and
/// report the same outcome. Failures are returned so callers can carry on
/// without logging.
pub fn init() -> Result<(), LoggingError> {
    let installed = *INSTALLED.get_or_init(|| {
        let subscriber = Registry::default()
            .with(build_env_filter())
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr));
        let ok = tracing::subscriber::set_global_default(subscriber).is_ok();
        if ok {
            tracing::debug!(filter_env = LOG_ENV, "logging initialized");
        }
        ok
    });

    if installed {
        Ok(())
    } else {
        Err(LoggingError::SetGlobal)
    }
}

fn build_env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let first = init().is_ok();
        assert_eq!(init().is_ok(), first);
    }

    #[test]
    fn concurrent_init_calls_agree() {
        let results: Vec<bool> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8).map(|_| s.spawn(|| init().is_ok())).collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(results.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(INSTALLED.get().copied(), Some(results[0]));
    }

    #[test]
    fn default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }
}
