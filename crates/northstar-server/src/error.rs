//! HTTP error mapping.

use std::net::SocketAddr;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use northstar_voice::VoiceError;
use serde::Serialize;

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// An error a handler hands back to the client.
#[derive(Debug)]
pub enum ApiError {
    /// Missing or wrong bearer key.
    Unauthorized,
    /// The request body could not be decoded.
    BadRequest(String),
    Voice(VoiceError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Voice(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Voice(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Unauthorized => "invalid or missing API key".to_string(),
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::Voice(e) => e.to_string(),
        }
    }
}

impl From<VoiceError> for ApiError {
    fn from(e: VoiceError) -> Self {
        ApiError::Voice(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error = self.message();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %error, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %error, "request rejected");
        }
        (status, Json(ErrorBody { error })).into_response()
    }
}

/// Errors that stop the server itself.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP server error: {0}")]
    Serve(#[source] std::io::Error),
}
