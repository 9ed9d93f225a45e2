//! Shared fixtures for router tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use northstar_server::{router, AppState};
use northstar_types::{TwilioCredentials, TwilioSettings};
use northstar_voice::{TwilioClient, VoiceService};
use tower::ServiceExt;
use wiremock::MockServer;

pub const API_KEY: &str = "test-api-key";

pub fn credentials() -> TwilioCredentials {
    TwilioCredentials {
        account_sid: Some("ACtest".into()),
        api_key_sid: Some("SKtest".into()),
        api_key_secret: Some("secret".into()),
        auth_token: Some("tok".into()),
        from_number: None,
        twiml_app_sid: None,
    }
}

/// Router whose vendor calls go to `vendor`.
pub fn app(vendor: &MockServer, credentials: TwilioCredentials, api_key: Option<&str>) -> Router {
    let client = TwilioClient::with_client(reqwest::Client::new(), &vendor.uri(), &vendor.uri());
    let service = VoiceService::new(credentials, TwilioSettings::default(), Arc::new(client));
    router(Arc::new(AppState::new(service, api_key.map(str::to_string))))
}

pub fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request")
}

pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("response json")
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.clone()).expect("utf-8 body")
    }
}

pub async fn send(app: Router, request: Request<Body>) -> TestResponse {
    let response = app.oneshot(request).await.expect("router response");
    let status = response.status();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response bytes")
        .to_vec();
    TestResponse {
        status,
        content_type,
        body,
    }
}
