//! Configuration errors.

use thiserror::Error;

/// Invalid console configuration, from either the environment or CLI flags.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A flag that takes a value was given without one.
    #[error("missing value for {flag}")]
    MissingValue { flag: String },

    /// A value could not be parsed.
    #[error("invalid value '{value}' for {name}")]
    InvalidValue { name: String, value: String },

    /// An unrecognized CLI argument.
    #[error("unknown argument '{0}'")]
    UnknownArgument(String),

    /// The host is empty or contains a scheme/path.
    #[error("invalid host '{0}': expected host[:port]")]
    InvalidHost(String),
}
