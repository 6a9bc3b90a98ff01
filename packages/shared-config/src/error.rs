//! Configuration errors

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    /// The variable is set but does not parse
    #[error("invalid {name} value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("{name} must be at least {min}, got {actual}")]
    BelowMinimum {
        name: &'static str,
        min: String,
        actual: String,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
