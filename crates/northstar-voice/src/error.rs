//! Error type for voice operations.

use northstar_types::ConfigError;

/// Errors that can occur while issuing tokens or placing calls.
///
/// The variants follow the three failure classes callers care about:
/// configuration (a credential is missing), validation (the request is
/// malformed) and upstream (the vendor rejected the request or could not be
/// reached).
#[derive(Debug, thiserror::Error)]
pub enum VoiceError {
    /// A required credential or setting is absent.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The caller sent an incomplete or malformed request.
    #[error("{0}")]
    Validation(String),

    /// The vendor answered with a non-success status.
    #[error("{service} error: {body}")]
    Upstream {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// Transport failure talking to the vendor.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON encoding or decoding failed.
    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// An access token failed to decode or verify.
    #[error("invalid access token: {0}")]
    InvalidToken(String),
}

impl VoiceError {
    /// Whether the error was caused by the caller rather than the server or
    /// the vendor.
    pub fn is_client_error(&self) -> bool {
        matches!(self, VoiceError::Validation(_))
    }
}

/// Convenience alias for voice results.
pub type VoiceResult<T> = Result<T, VoiceError>;
