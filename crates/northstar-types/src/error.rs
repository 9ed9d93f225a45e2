//! Configuration error type.

/// Errors raised while loading or resolving configuration.
///
/// A missing credential is always fatal to the request that needs it; it is
/// never treated as a transient fault.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing Twilio credentials: {}", .0.join(", "))]
    MissingCredentials(Vec<&'static str>),

    #[error("failed to read {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("failed to parse configuration: {0}")]
    Parse(String),

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
