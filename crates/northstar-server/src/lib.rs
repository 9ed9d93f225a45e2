//! HTTP API for the NorthStar IVR demo.
//!
//! Exposes the softphone token endpoint, the two call-placing endpoints and
//! the TwiML webhooks the vendor fetches. Every route answers CORS preflight
//! with a permissive policy so the browser frontend can call it from any
//! origin.

pub mod auth;
pub mod error;
pub mod handlers;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderName, Method};
use axum::routing::{get, post};
use axum::Router;
use northstar_voice::VoiceService;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

pub use error::{ApiError, ServerError};

/// Shared state for HTTP handlers.
pub struct AppState {
    pub service: VoiceService,
    /// Bearer key guarding the JSON endpoints. `None` disables the check.
    pub api_key: Option<String>,
}

impl AppState {
    pub fn new(service: VoiceService, api_key: Option<String>) -> Self {
        Self {
            service,
            api_key: api_key.filter(|k| !k.is_empty()),
        }
    }
}

/// Permissive CORS policy applied to every route.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("authorization"),
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
        ])
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(handlers::health))
        .route("/api/token", get(handlers::token))
        .route("/api/make-call", post(handlers::make_call))
        .route("/api/test-ivr-flow", post(handlers::test_ivr_flow))
        .route("/api/voice", get(handlers::voice).post(handlers::voice))
        .route(
            "/api/ivr/answer",
            get(handlers::ivr_answer).post(handlers::ivr_answer),
        )
        .route("/api/ivr/handle-input", post(handlers::ivr_handle_input))
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the API on `addr` until `shutdown` resolves.
pub async fn serve<F>(
    addr: SocketAddr,
    state: Arc<AppState>,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let auth_enabled = state.api_key.is_some();
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    info!(addr = %addr, auth_enabled, "starting NorthStar API server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ServerError::Serve)?;

    info!("server stopped");
    Ok(())
}
