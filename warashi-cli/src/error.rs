//! CLI error type.

use thiserror::Error;
use warashi::config::ConfigError;
use warashi::perf::PerfError;

/// Errors reported to the operator.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Config(String),

    #[error(transparent)]
    ConfigFile(#[from] ConfigError),

    #[error(transparent)]
    Perf(#[from] PerfError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perf_error_passes_message_through() {
        let err: CliError = PerfError::GroupIndexOutOfRange { index: 9, max: 3 }.into();
        assert_eq!(err.to_string(), "Group index out of range. Max = 3");
    }

    #[test]
    fn test_unknown_key_message() {
        let err: CliError = ConfigError::UnknownKey("ticket.size".into()).into();
        assert_eq!(err.to_string(), "Unknown configuration key 'ticket.size'");
    }
}
