//! Route handlers.
//!
//! JSON endpoints check the bearer key, decode their body by hand so a
//! malformed payload maps to the standard `{error}` shape, and delegate to
//! [`VoiceService`](northstar_voice::VoiceService). TwiML webhooks are
//! fetched by the vendor and never require the key.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::FormRejection;
use axum::extract::{Form, State};
use axum::http::{header, HeaderMap};
use axum::response::IntoResponse;
use axum::Json;
use northstar_voice::ivr;
use northstar_voice::{CallAck, IssuedToken};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use crate::auth::check_auth;
use crate::error::ApiError;
use crate::AppState;

const TWIML_CONTENT_TYPE: &str = "text/xml";

#[derive(Debug, Default, Deserialize)]
pub struct MakeCallBody {
    pub to: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TriggerBody {
    pub to: Option<String>,
    /// `None` when the field is absent, `Some(None)` when it is `null`.
    #[serde(rename = "flowType", default, deserialize_with = "present")]
    pub flow_type: Option<Option<String>>,
}

/// Deserialize a field that is present in the input, keeping `null` apart
/// from an absent field (which falls back to `default`).
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Fields the vendor posts back from a `<Gather>`.
#[derive(Debug, Default, Deserialize)]
pub struct GatherCallback {
    #[serde(rename = "Digits")]
    pub digits: Option<String>,
    #[serde(rename = "SpeechResult")]
    pub speech_result: Option<String>,
}

/// Decode a JSON body. An empty body decodes as the default value.
fn parse_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {e}")))
}

fn twiml(document: String) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, TWIML_CONTENT_TYPE)], document)
}

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn token(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<IssuedToken>, ApiError> {
    check_auth(&state, &headers)?;
    Ok(Json(state.service.issue_token()?))
}

pub async fn make_call(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<CallAck>, ApiError> {
    check_auth(&state, &headers)?;
    let body: MakeCallBody = parse_body(&body)?;
    let ack = state.service.initiate_call(body.to.as_deref()).await?;
    Ok(Json(ack))
}

pub async fn test_ivr_flow(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<CallAck>, ApiError> {
    check_auth(&state, &headers)?;
    let body: TriggerBody = parse_body(&body)?;
    let ack = state
        .service
        .trigger_scenario(
            body.to.as_deref(),
            body.flow_type.as_ref().map(Option::as_deref),
        )
        .await?;
    Ok(Json(ack))
}

pub async fn voice(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    twiml(state.service.inbound_document())
}

pub async fn ivr_answer() -> impl IntoResponse {
    twiml(ivr::answer_document())
}

pub async fn ivr_handle_input(
    input: Result<Form<GatherCallback>, FormRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Form(input) = input.map_err(|e| {
        ApiError::BadRequest(format!("Invalid form body: {}", e.body_text()))
    })?;
    Ok(twiml(ivr::handle_input_document(
        input.digits.as_deref(),
        input.speech_result.as_deref(),
    )))
}
