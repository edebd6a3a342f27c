//! # Observability
//!
//! Process-wide `tracing` subscriber setup. Engine decisions are emitted as
//! structured events (`upload accepted`, `access denied`, ...) and rendered
//! either as human-readable lines or as JSON, filtered by `RUST_LOG`
//! (default `info`).

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Output format of log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }
}

#[derive(Debug, Error)]
#[error("Failed to install log subscriber: {0}")]
pub struct ObservabilityError(String);

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(format: LogFormat) -> Result<(), ObservabilityError> {
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter());

    let result = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().flatten_event(true).try_init(),
    };

    result.map_err(|e| ObservabilityError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_flag() {
        assert_eq!(LogFormat::from_json_flag(true), LogFormat::Json);
        assert_eq!(LogFormat::from_json_flag(false), LogFormat::Text);
        assert_eq!(LogFormat::default(), LogFormat::Text);
    }

    #[test]
    fn test_second_init_fails() {
        // Whichever call installs first, the other must report an error
        let first = init_logging(LogFormat::Text);
        let second = init_logging(LogFormat::Json);
        assert!(first.is_err() || second.is_err());
    }
}
