//! Structured logging via the tracing crate
//!
//! Output format is chosen by the `LOG_FORMAT` environment variable
//! (`json`, `pretty`, or `compact`; defaults to `json`), the level by
//! `LOG_LEVEL` (defaults to `INFO`). A `RUST_LOG` directive string, when
//! set, replaces the computed filter entirely.

use std::env;
use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer};

/// Log output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
    Compact,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

impl LogFormat {
    fn layer<S>(self) -> Box<dyn Layer<S> + Send + Sync>
    where
        S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    {
        match self {
            LogFormat::Json => fmt::layer().json().boxed(),
            LogFormat::Pretty => fmt::layer().pretty().with_ansi(true).boxed(),
            LogFormat::Compact => fmt::layer()
                .compact()
                .with_ansi(true)
                .with_target(false)
                .boxed(),
        }
    }
}

fn noise_filter(level: Level) -> EnvFilter {
    // Reduce noise from HTTP and runtime internals
    let directives = format!("{level},hyper=warn,tokio=warn,reqwest=warn");
    EnvFilter::new(directives)
}

/// Initialize logging with manual configuration
pub fn init_logging(level: Level, format: LogFormat) {
    let filter = match env::var("RUST_LOG") {
        Ok(rust_log) => EnvFilter::new(rust_log),
        Err(_) => noise_filter(level),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(format.layer())
        .init();
}

/// Initialize logging from `LOG_LEVEL` and `LOG_FORMAT`, falling back to
/// INFO-level JSON when either is unset or unrecognized.
pub fn init_default_logging() {
    let level = env::var("LOG_LEVEL")
        .ok()
        .and_then(|s| Level::from_str(&s).ok())
        .unwrap_or(Level::INFO);

    let format = env::var("LOG_FORMAT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_default();

    init_logging(level, format);
}
