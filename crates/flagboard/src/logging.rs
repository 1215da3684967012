//! Logging setup for flagboard.
//!
//! Installs a `tracing` subscriber whose level comes from the CLI verbosity
//! flags unless `RUST_LOG` says otherwise.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Verbosity level for logging output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only.
    Quiet,
    /// Info and above.
    #[default]
    Normal,
    /// Debug and above.
    Verbose,
    /// Everything.
    Trace,
}

impl Verbosity {
    /// Map verbosity to a tracing level.
    #[must_use]
    pub fn level(self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    /// Filter directives used when `RUST_LOG` is unset.
    ///
    /// Request traces from `tower_http` are emitted at debug, so they only
    /// show up from `-v` on.
    #[must_use]
    pub fn default_directives(self) -> String {
        let level = self.level();
        format!("flagboard={level},tower_http={level}")
    }
}

/// Initialize the logging system.
///
/// Call once at startup; later calls are ignored.
///
/// # Examples
///
/// ```no_run
/// use flagboard::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::Verbose);
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.default_directives()));

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_thread_ids(false));

    // A subscriber may already be installed (tests, embedding); keep it.
    let _ = subscriber.try_init();
}
