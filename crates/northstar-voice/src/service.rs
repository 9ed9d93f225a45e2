//! Handler logic shared by the HTTP server and the CLI.
//!
//! [`VoiceService`] owns the credentials and settings loaded at startup and
//! a [`TelephonyApi`] implementation. It holds no mutable state, so one
//! instance is shared by every request.

use std::sync::Arc;

use chrono::Utc;
use northstar_types::{TwilioCredentials, TwilioSettings};

use crate::ivr;
use crate::scenario::{self, DEFAULT_SCENARIO_KEY};
use crate::token::{self, IssuedToken};
use crate::twilio::{CallAck, CallInstructions, CallRequest, FlowExecutionRequest, TelephonyApi};
use crate::{VoiceError, VoiceResult, CLIENT_IDENTITY};

const MISSING_TO: &str = "Missing \"to\" phone number";
const CLIENT_MARKER: &str = "client:";

/// Where an outbound demo call goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// A softphone client; holds the full `to` string as sent.
    Client(String),
    /// A PSTN number.
    Phone(String),
}

impl Destination {
    /// Classify a `to` value. A missing or empty value is a validation
    /// error; anything else is kept exactly as sent.
    pub fn parse(to: Option<&str>) -> VoiceResult<Self> {
        let to = to
            .filter(|t| !t.is_empty())
            .ok_or_else(|| VoiceError::Validation(MISSING_TO.to_string()))?;

        if to.contains(CLIENT_MARKER) {
            Ok(Destination::Client(to.to_string()))
        } else {
            Ok(Destination::Phone(to.to_string()))
        }
    }

    /// The `To` value sent to the vendor.
    pub fn as_str(&self) -> &str {
        match self {
            Destination::Client(to) | Destination::Phone(to) => to,
        }
    }
}

/// Token issuing, call placement and TwiML generation.
pub struct VoiceService {
    credentials: TwilioCredentials,
    settings: TwilioSettings,
    api: Arc<dyn TelephonyApi>,
}

impl VoiceService {
    pub fn new(
        credentials: TwilioCredentials,
        settings: TwilioSettings,
        api: Arc<dyn TelephonyApi>,
    ) -> Self {
        Self {
            credentials,
            settings,
            api,
        }
    }

    pub fn credentials(&self) -> &TwilioCredentials {
        &self.credentials
    }

    pub fn settings(&self) -> &TwilioSettings {
        &self.settings
    }

    /// Caller ID for outbound calls: environment first, then configuration.
    pub fn from_number(&self) -> &str {
        self.credentials
            .from_number
            .as_deref()
            .unwrap_or(&self.settings.from_number)
    }

    /// Issue a softphone access token valid from now.
    pub fn issue_token(&self) -> VoiceResult<IssuedToken> {
        self.issue_token_at(Utc::now().timestamp())
    }

    /// Issue a softphone access token valid from `issued_at` (unix seconds).
    pub fn issue_token_at(&self, issued_at: i64) -> VoiceResult<IssuedToken> {
        let signing = self.credentials.token_signing()?;
        let issued = token::issue(
            signing,
            CLIENT_IDENTITY,
            self.credentials.twiml_app_sid.as_deref(),
            issued_at,
        )?;
        tracing::info!(identity = %issued.identity, "issued access token");
        Ok(issued)
    }

    /// Place a call that plays the vendor's demo document.
    pub async fn initiate_call(&self, to: Option<&str>) -> VoiceResult<CallAck> {
        let destination = Destination::parse(to)?;
        let auth = self.credentials.rest_auth()?;

        let request = CallRequest {
            to: destination.as_str().to_string(),
            from: self.from_number().to_string(),
            instructions: CallInstructions::Url(self.settings.demo_callback_url.clone()),
        };
        let ack = self.api.create_call(auth, &request).await?;
        tracing::info!(
            to = %request.to,
            sid = ack.sid.as_deref().unwrap_or("-"),
            "call initiated"
        );
        Ok(ack)
    }

    /// Start a scripted demo scenario.
    ///
    /// Softphone destinations get the scenario TwiML inline. Phone
    /// destinations start the Studio flow with the key as a parameter.
    ///
    /// `flow_type` is `None` when the caller named no scenario, which selects
    /// the default, and `Some(None)` when it was sent as `null`. Any other
    /// key, empty or unknown, is forwarded as given; inline calls render the
    /// fallback greeting for keys that name no scenario.
    pub async fn trigger_scenario(
        &self,
        to: Option<&str>,
        flow_type: Option<Option<&str>>,
    ) -> VoiceResult<CallAck> {
        let destination = Destination::parse(to)?;
        let auth = self.credentials.rest_auth()?;
        let key = flow_type.unwrap_or(Some(DEFAULT_SCENARIO_KEY));
        let from = self.from_number().to_string();

        let ack = match destination {
            Destination::Client(to) => {
                tracing::info!(to = %to, scenario = ?key, "triggering inline scenario");
                let document = match key {
                    Some(key) => scenario::document_for_key(key),
                    None => scenario::fallback_document(),
                };
                let request = CallRequest {
                    to,
                    from,
                    instructions: CallInstructions::Twiml(document),
                };
                self.api.create_call(auth, &request).await?
            }
            Destination::Phone(to) => {
                tracing::info!(
                    to = %to,
                    scenario = ?key,
                    flow_sid = %self.settings.flow_sid,
                    "triggering studio flow"
                );
                let request = FlowExecutionRequest {
                    flow_sid: self.settings.flow_sid.clone(),
                    to,
                    from,
                    parameters: serde_json::json!({ "flow_type": key }),
                };
                self.api.create_flow_execution(auth, &request).await?
            }
        };
        Ok(ack)
    }

    /// TwiML for inbound calls: connect to the softphone.
    pub fn inbound_document(&self) -> String {
        ivr::inbound_document(CLIENT_IDENTITY)
    }
}
