mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use northstar_types::{TwilioCredentials, DEFAULT_FLOW_SID};
use northstar_voice::token::verify;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{app, credentials, get, post_json, send, API_KEY};

const CALLS_PATH: &str = "/2010-04-01/Accounts/ACtest/Calls.json";

fn executions_path() -> String {
    format!("/v2/Flows/{DEFAULT_FLOW_SID}/Executions")
}

/// Mount a Calls mock that must never be hit.
async fn forbid_calls(vendor: &MockServer) {
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(vendor)
        .await;
}

#[tokio::test]
async fn health_reports_ok() {
    let vendor = MockServer::start().await;
    let resp = send(app(&vendor, credentials(), None), get("/healthz")).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json(), serde_json::json!({"status": "ok"}));
}

// ------------------------------------------------------------------
// Token
// ------------------------------------------------------------------

#[tokio::test]
async fn token_is_signed_for_softphone_identity() {
    let vendor = MockServer::start().await;
    let resp = send(app(&vendor, credentials(), None), get("/api/token")).await;
    assert_eq!(resp.status, StatusCode::OK);

    let body = resp.json();
    assert_eq!(body["identity"], "user_browser");
    let token = body["token"].as_str().expect("token string");
    let claims = verify(token, "secret").expect("token verifies");
    assert_eq!(claims.iss, "SKtest");
    assert_eq!(claims.sub, "ACtest");
    assert_eq!(claims.grants.identity, "user_browser");
    assert!(claims.jti.starts_with("SKtest-"));
}

#[tokio::test]
async fn token_without_credentials_is_server_error() {
    let vendor = MockServer::start().await;
    let resp = send(
        app(&vendor, TwilioCredentials::default(), None),
        get("/api/token"),
    )
    .await;
    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    let error = resp.json()["error"].as_str().unwrap_or_default().to_string();
    assert!(error.starts_with("Missing Twilio credentials"), "got: {error}");
}

// ------------------------------------------------------------------
// Call initiation
// ------------------------------------------------------------------

#[tokio::test]
async fn make_call_without_to_is_rejected_before_vendor() {
    let vendor = MockServer::start().await;
    forbid_calls(&vendor).await;

    for body in ["{}", r#"{"to":""}"#, ""] {
        let resp = send(
            app(&vendor, credentials(), None),
            post_json("/api/make-call", body),
        )
        .await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST, "body {body:?}");
        assert_eq!(resp.json()["error"], "Missing \"to\" phone number");
    }
}

#[tokio::test]
async fn make_call_malformed_json_is_bad_request() {
    let vendor = MockServer::start().await;
    forbid_calls(&vendor).await;

    let resp = send(
        app(&vendor, credentials(), None),
        post_json("/api/make-call", "{\"to\":"),
    )
    .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(!resp.json()["error"].as_str().unwrap_or_default().is_empty());
}

#[tokio::test]
async fn make_call_relays_vendor_ack() {
    let vendor = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CALLS_PATH))
        .and(header("Authorization", "Basic QUN0ZXN0OnRvaw=="))
        .and(body_string_contains("To=%2B15550001234"))
        .and(body_string_contains("From=%2B18885799021"))
        .and(body_string_contains("Url=http%3A%2F%2Fdemo.twilio.com%2Fdocs%2Fvoice.xml"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "sid": "CA42",
            "status": "queued",
            "direction": "outbound-api"
        })))
        .expect(1)
        .mount(&vendor)
        .await;

    let resp = send(
        app(&vendor, credentials(), None),
        post_json("/api/make-call", r#"{"to":"+15550001234"}"#),
    )
    .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json(), serde_json::json!({"sid": "CA42", "status": "queued"}));
}

#[tokio::test]
async fn make_call_sends_destination_as_given() {
    let vendor = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CALLS_PATH))
        .and(body_string_contains("To=+%2B15550001234+&"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "sid": "CA2",
            "status": "queued"
        })))
        .expect(1)
        .mount(&vendor)
        .await;

    let resp = send(
        app(&vendor, credentials(), None),
        post_json("/api/make-call", r#"{"to":" +15550001234 "}"#),
    )
    .await;
    assert_eq!(resp.status, StatusCode::OK);
}

#[tokio::test]
async fn make_call_vendor_rejection_is_server_error() {
    let vendor = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CALLS_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_string("Invalid 'To' Phone Number"))
        .mount(&vendor)
        .await;

    let resp = send(
        app(&vendor, credentials(), None),
        post_json("/api/make-call", r#"{"to":"+1"}"#),
    )
    .await;
    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        resp.json()["error"],
        "Twilio API error: Invalid 'To' Phone Number"
    );
}

#[tokio::test]
async fn make_call_without_auth_token_is_server_error() {
    let vendor = MockServer::start().await;
    forbid_calls(&vendor).await;

    let mut creds = credentials();
    creds.auth_token = None;
    let resp = send(
        app(&vendor, creds, None),
        post_json("/api/make-call", r#"{"to":"+15550001234"}"#),
    )
    .await;
    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(resp.json()["error"]
        .as_str()
        .unwrap_or_default()
        .contains("TWILIO_AUTH_TOKEN"));
}

// ------------------------------------------------------------------
// Scenario trigger
// ------------------------------------------------------------------

#[tokio::test]
async fn trigger_without_to_is_rejected_before_vendor() {
    let vendor = MockServer::start().await;
    forbid_calls(&vendor).await;

    let resp = send(
        app(&vendor, credentials(), None),
        post_json("/api/test-ivr-flow", r#"{"flowType":"pin"}"#),
    )
    .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert!(!resp.json()["error"].as_str().unwrap_or_default().is_empty());
}

#[tokio::test]
async fn client_destination_posts_inline_twiml() {
    let vendor = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CALLS_PATH))
        .and(body_string_contains("To=client%3Auser_browser"))
        .and(body_string_contains("Twiml="))
        .and(body_string_contains("Spoofing+suspected"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "sid": "CA7",
            "status": "queued"
        })))
        .expect(1)
        .mount(&vendor)
        .await;
    Mock::given(method("POST"))
        .and(path(executions_path()))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&vendor)
        .await;

    let resp = send(
        app(&vendor, credentials(), None),
        post_json(
            "/api/test-ivr-flow",
            r#"{"to":"client:user_browser","flowType":"trustid_routing"}"#,
        ),
    )
    .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["sid"], "CA7");
}

#[tokio::test]
async fn phone_destination_starts_studio_execution() {
    let vendor = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(executions_path()))
        .and(body_string_contains("To=%2B15550001234"))
        .and(body_string_contains(
            "Parameters=%7B%22flow_type%22%3A%22mfa%22%7D",
        ))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "sid": "FN9",
            "status": "active"
        })))
        .expect(1)
        .mount(&vendor)
        .await;
    Mock::given(method("POST"))
        .and(path(CALLS_PATH))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&vendor)
        .await;

    let resp = send(
        app(&vendor, credentials(), None),
        post_json(
            "/api/test-ivr-flow",
            r#"{"to":"+15550001234","flowType":"mfa"}"#,
        ),
    )
    .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json(), serde_json::json!({"sid": "FN9", "status": "active"}));
}

#[tokio::test]
async fn phone_destination_defaults_to_kba() {
    let vendor = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(executions_path()))
        .and(body_string_contains(
            "Parameters=%7B%22flow_type%22%3A%22kba%22%7D",
        ))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "sid": "FN1",
            "status": "active"
        })))
        .expect(1)
        .mount(&vendor)
        .await;

    let resp = send(
        app(&vendor, credentials(), None),
        post_json("/api/test-ivr-flow", r#"{"to":"+15550001234"}"#),
    )
    .await;
    assert_eq!(resp.status, StatusCode::OK);
}

#[tokio::test]
async fn empty_or_null_flow_type_plays_fallback_to_client() {
    for flow_type in [r#""""#, "null"] {
        let vendor = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CALLS_PATH))
            .and(body_string_contains("To=client%3Auser_browser"))
            .and(body_string_contains("Welcome+to+the+IVR+Demo"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "sid": "CA8",
                "status": "queued"
            })))
            .expect(1)
            .mount(&vendor)
            .await;

        let body = format!(r#"{{"to":"client:user_browser","flowType":{flow_type}}}"#);
        let resp = send(
            app(&vendor, credentials(), None),
            post_json("/api/test-ivr-flow", &body),
        )
        .await;
        assert_eq!(resp.status, StatusCode::OK, "flowType {flow_type}");
    }
}

#[tokio::test]
async fn empty_or_null_flow_type_is_forwarded_to_studio() {
    let cases = [
        (r#""""#, "Parameters=%7B%22flow_type%22%3A%22%22%7D"),
        ("null", "Parameters=%7B%22flow_type%22%3Anull%7D"),
    ];
    for (flow_type, parameters) in cases {
        let vendor = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(executions_path()))
            .and(body_string_contains(parameters))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "sid": "FN2",
                "status": "active"
            })))
            .expect(1)
            .mount(&vendor)
            .await;

        let body = format!(r#"{{"to":"+15550001234","flowType":{flow_type}}}"#);
        let resp = send(
            app(&vendor, credentials(), None),
            post_json("/api/test-ivr-flow", &body),
        )
        .await;
        assert_eq!(resp.status, StatusCode::OK, "flowType {flow_type}");
    }
}

#[tokio::test]
async fn studio_rejection_is_server_error() {
    let vendor = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(executions_path()))
        .respond_with(ResponseTemplate::new(404).set_body_string("flow not found"))
        .mount(&vendor)
        .await;

    let resp = send(
        app(&vendor, credentials(), None),
        post_json("/api/test-ivr-flow", r#"{"to":"+15550001234","flowType":"otp"}"#),
    )
    .await;
    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.json()["error"], "Twilio Studio API error: flow not found");
}

// ------------------------------------------------------------------
// TwiML webhooks
// ------------------------------------------------------------------

#[tokio::test]
async fn inbound_webhook_dials_softphone_on_get_and_post() {
    let vendor = MockServer::start().await;
    for request in [
        get("/api/voice"),
        Request::post("/api/voice")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from("CallSid=CA1&From=%2B15550001234"))
            .unwrap(),
    ] {
        let resp = send(app(&vendor, credentials(), Some(API_KEY)), request).await;
        assert_eq!(resp.status, StatusCode::OK);
        assert_eq!(resp.content_type.as_deref(), Some("text/xml"));
        let xml = resp.text();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<Dial>\n    <Client>user_browser</Client>\n  </Dial>"));
    }
}

#[tokio::test]
async fn inbound_webhook_needs_no_credentials() {
    let vendor = MockServer::start().await;
    let resp = send(
        app(&vendor, TwilioCredentials::default(), None),
        get("/api/voice"),
    )
    .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.text().contains("<Client>user_browser</Client>"));
}

#[tokio::test]
async fn answer_menu_is_served() {
    let vendor = MockServer::start().await;
    let resp = send(app(&vendor, credentials(), None), get("/api/ivr/answer")).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.content_type.as_deref(), Some("text/xml"));
    let xml = resp.text();
    assert!(xml.contains("action=\"/api/ivr/handle-input\""));
    assert!(xml.contains("<Redirect>/api/ivr/answer</Redirect>"));
}

#[tokio::test]
async fn handle_input_routes_digits_and_speech() {
    let vendor = MockServer::start().await;
    let cases = [
        ("Digits=1", "<Dial>15555551234</Dial>"),
        ("Digits=2", "<Dial>15555555678</Dial>"),
        ("SpeechResult=I+need+support", "<Dial>15555555678</Dial>"),
        ("Digits=7", "<Redirect>/api/ivr/answer</Redirect>"),
        ("", "Sorry, I didn't catch that."),
    ];
    for (form, expected) in cases {
        let request = Request::post("/api/ivr/handle-input")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(form))
            .unwrap();
        let resp = send(app(&vendor, credentials(), None), request).await;
        assert_eq!(resp.status, StatusCode::OK, "form {form:?}");
        assert!(resp.text().contains(expected), "form {form:?}: {}", resp.text());
    }
}

#[tokio::test]
async fn handle_input_non_form_body_is_bad_request() {
    let vendor = MockServer::start().await;
    let request = Request::post("/api/ivr/handle-input")
        .header("content-type", "text/plain")
        .body(Body::from("Digits=1"))
        .unwrap();
    let resp = send(app(&vendor, credentials(), None), request).await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.content_type.as_deref(), Some("application/json"));
    let error = resp.json()["error"].as_str().unwrap_or_default().to_string();
    assert!(error.starts_with("Invalid form body"), "{error}");
}

// ------------------------------------------------------------------
// CORS
// ------------------------------------------------------------------

#[tokio::test]
async fn options_on_every_route_is_permissive_preflight() {
    let vendor = MockServer::start().await;
    for uri in [
        "/healthz",
        "/api/token",
        "/api/make-call",
        "/api/test-ivr-flow",
        "/api/voice",
        "/api/ivr/answer",
        "/api/ivr/handle-input",
    ] {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri(uri)
            .header("origin", "https://demo.example.com")
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap();
        let response = tower::ServiceExt::oneshot(
            app(&vendor, credentials(), Some(API_KEY)),
            request,
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        let headers = response.headers();
        assert_eq!(headers["access-control-allow-origin"], "*", "{uri}");

        let methods = headers["access-control-allow-methods"]
            .to_str()
            .unwrap()
            .to_ascii_uppercase();
        for m in ["GET", "POST", "PUT", "DELETE", "OPTIONS"] {
            assert!(methods.contains(m), "{uri}: {methods}");
        }

        let allowed = headers["access-control-allow-headers"]
            .to_str()
            .unwrap()
            .to_ascii_lowercase();
        for h in ["content-type", "authorization", "x-client-info", "apikey"] {
            assert!(allowed.contains(h), "{uri}: {allowed}");
        }

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(body.is_empty(), "{uri}");
    }
}

#[tokio::test]
async fn regular_responses_carry_allow_origin() {
    let vendor = MockServer::start().await;
    let request = Request::get("/healthz")
        .header("origin", "https://demo.example.com")
        .body(Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(app(&vendor, credentials(), None), request)
        .await
        .unwrap();
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
}

// ------------------------------------------------------------------
// Bearer auth
// ------------------------------------------------------------------

#[tokio::test]
async fn configured_key_guards_json_endpoints() {
    let vendor = MockServer::start().await;
    forbid_calls(&vendor).await;

    let missing = send(app(&vendor, credentials(), Some(API_KEY)), get("/api/token")).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
    assert!(missing.json()["error"].is_string());

    let wrong = Request::get("/api/token")
        .header("authorization", "Bearer nope")
        .body(Body::empty())
        .unwrap();
    let wrong = send(app(&vendor, credentials(), Some(API_KEY)), wrong).await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    let call = send(
        app(&vendor, credentials(), Some(API_KEY)),
        post_json("/api/make-call", r#"{"to":"+15550001234"}"#),
    )
    .await;
    assert_eq!(call.status, StatusCode::UNAUTHORIZED);

    let trigger = send(
        app(&vendor, credentials(), Some(API_KEY)),
        post_json("/api/test-ivr-flow", r#"{"to":"+15550001234"}"#),
    )
    .await;
    assert_eq!(trigger.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn correct_key_is_accepted() {
    let vendor = MockServer::start().await;
    let request = Request::get("/api/token")
        .header("authorization", format!("Bearer {API_KEY}"))
        .body(Body::empty())
        .unwrap();
    let resp = send(app(&vendor, credentials(), Some(API_KEY)), request).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["identity"], "user_browser");
}

#[tokio::test]
async fn empty_key_disables_auth() {
    let vendor = MockServer::start().await;
    let resp = send(app(&vendor, credentials(), Some("")), get("/api/token")).await;
    assert_eq!(resp.status, StatusCode::OK);
}
