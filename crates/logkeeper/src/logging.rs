//! Logging setup.
//!
//! Diagnostics go to stderr so that `--format json` output on stdout stays
//! machine readable. Skipped log sheets are reported at `warn`, which the
//! default verbosity shows.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// How much the binary logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only.
    Quiet,
    /// Progress and skipped sheets.
    #[default]
    Normal,
    /// Per-sheet and per-merge detail.
    Verbose,
    /// Everything.
    Trace,
}

impl Verbosity {
    /// Verbosity from the `-q` flag and the `-v` count. Quiet wins.
    #[must_use]
    pub fn from_flags(verbose: u8, quiet: bool) -> Self {
        match (quiet, verbose) {
            (true, _) => Self::Quiet,
            (false, 0) => Self::Normal,
            (false, 1) => Self::Verbose,
            (false, _) => Self::Trace,
        }
    }

    /// Most detailed level logged.
    #[must_use]
    pub fn level(self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    /// Filter directive applied when `RUST_LOG` is unset.
    #[must_use]
    pub fn directive(self) -> String {
        format!("{}={}", env!("CARGO_CRATE_NAME"), self.level())
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` overrides `verbosity`. Calling this more than once is
/// harmless; only the first call installs anything.
///
/// ```no_run
/// use logkeeper::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::from_flags(1, false));
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.directive()));

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(layer)
        .try_init();
}

/// Warnings only, captured by the test harness.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}
