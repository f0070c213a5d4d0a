//! Logging setup.
//!
//! Diagnostics go to stderr through `tracing`, leaving stdout to the report.

use tracing_subscriber::EnvFilter;

/// Default filter directive for the given verbosity flags.
///
/// A live report redraws itself by moving the cursor over the lines it
/// printed, so progress logs on the same terminal are kept quiet unless asked
/// for with `--verbose`.
fn default_directive(verbose: bool, quiet: bool, live: bool) -> &'static str {
    if verbose {
        "debug"
    } else if quiet || live {
        "warn"
    } else {
        "info"
    }
}

/// Install the global subscriber. `RUST_LOG` takes precedence over the flags.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(
    verbose: bool,
    quiet: bool,
    live: bool,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet, live)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
}

/// Route logs through the test harness' captured output. Safe to call from
/// every test.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(false, false, false), "info");
        assert_eq!(default_directive(true, false, false), "debug");
        assert_eq!(default_directive(false, true, false), "warn");
    }

    #[test]
    fn test_live_report_quiets_progress_logs() {
        assert_eq!(default_directive(false, false, true), "warn");
        assert_eq!(default_directive(true, false, true), "debug");
    }

    #[test]
    fn test_init_test_logging_is_idempotent() {
        init_test_logging();
        init_test_logging();
        tracing::debug!("still logging");
    }
}
