//! Twilio REST API integration.
//!
//! [`TelephonyApi`] is the seam between the service layer and the vendor.
//! [`TwilioClient`] implements it over reqwest: form-encoded POSTs with HTTP
//! basic auth to the Calls resource and to Studio flow executions. Requests
//! are sent once; there is no retry.

use std::time::Duration;

use async_trait::async_trait;
use northstar_types::{RestCredentials, TwilioSettings};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{VoiceError, VoiceResult};

const CALLS_SERVICE: &str = "Twilio API";
const STUDIO_SERVICE: &str = "Twilio Studio API";

/// What the vendor does once the call connects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallInstructions {
    /// Fetch TwiML from this URL.
    Url(String),
    /// Execute this TwiML document.
    Twiml(String),
}

/// An outbound call to originate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    pub to: String,
    pub from: String,
    pub instructions: CallInstructions,
}

impl CallRequest {
    /// Form fields for the Calls resource.
    pub fn form(&self) -> Vec<(&'static str, &str)> {
        let instructions = match &self.instructions {
            CallInstructions::Url(url) => ("Url", url.as_str()),
            CallInstructions::Twiml(twiml) => ("Twiml", twiml.as_str()),
        };
        vec![("To", self.to.as_str()), ("From", self.from.as_str()), instructions]
    }
}

/// A Studio flow execution to start.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowExecutionRequest {
    pub flow_sid: String,
    pub to: String,
    pub from: String,
    /// Passed to the flow as `trigger.call.parameters`.
    pub parameters: serde_json::Value,
}

impl FlowExecutionRequest {
    /// Form fields for the Executions resource.
    pub fn form(&self) -> VoiceResult<Vec<(&'static str, String)>> {
        Ok(vec![
            ("To", self.to.clone()),
            ("From", self.from.clone()),
            ("Parameters", serde_json::to_string(&self.parameters)?),
        ])
    }
}

/// The vendor's acknowledgement, relayed to the caller verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallAck {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Operations the service layer needs from the telephony vendor.
#[async_trait]
pub trait TelephonyApi: Send + Sync {
    /// Originate an outbound call.
    async fn create_call(
        &self,
        auth: RestCredentials<'_>,
        request: &CallRequest,
    ) -> VoiceResult<CallAck>;

    /// Start a Studio flow execution.
    async fn create_flow_execution(
        &self,
        auth: RestCredentials<'_>,
        request: &FlowExecutionRequest,
    ) -> VoiceResult<CallAck>;
}

/// reqwest-backed [`TelephonyApi`].
#[derive(Debug, Clone)]
pub struct TwilioClient {
    client: Client,
    api_base_url: String,
    studio_base_url: String,
}

impl TwilioClient {
    /// Build a client from configuration.
    pub fn from_settings(settings: &TwilioSettings) -> VoiceResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;
        Ok(Self::with_client(
            client,
            &settings.api_base_url,
            &settings.studio_base_url,
        ))
    }

    /// Build from an existing reqwest client and explicit base URLs.
    pub fn with_client(client: Client, api_base_url: &str, studio_base_url: &str) -> Self {
        Self {
            client,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            studio_base_url: studio_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Calls resource URL for `account_sid`.
    pub fn calls_url(&self, account_sid: &str) -> String {
        format!(
            "{}/2010-04-01/Accounts/{account_sid}/Calls.json",
            self.api_base_url
        )
    }

    /// Executions resource URL for `flow_sid`.
    pub fn executions_url(&self, flow_sid: &str) -> String {
        format!("{}/v2/Flows/{flow_sid}/Executions", self.studio_base_url)
    }

    async fn post_form<T: Serialize + ?Sized>(
        &self,
        service: &'static str,
        url: &str,
        auth: RestCredentials<'_>,
        form: &T,
    ) -> VoiceResult<CallAck> {
        let response = self
            .client
            .post(url)
            .basic_auth(auth.account_sid, Some(auth.auth_token))
            .form(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable>".to_string());
            tracing::warn!(service, status = status.as_u16(), "vendor rejected request");
            return Err(VoiceError::Upstream {
                service,
                status: status.as_u16(),
                body,
            });
        }

        let ack: CallAck = response.json().await?;
        Ok(ack)
    }
}

#[async_trait]
impl TelephonyApi for TwilioClient {
    async fn create_call(
        &self,
        auth: RestCredentials<'_>,
        request: &CallRequest,
    ) -> VoiceResult<CallAck> {
        let url = self.calls_url(auth.account_sid);
        tracing::debug!(
            to = %request.to,
            inline_twiml = matches!(request.instructions, CallInstructions::Twiml(_)),
            "creating call"
        );
        self.post_form(CALLS_SERVICE, &url, auth, &request.form()).await
    }

    async fn create_flow_execution(
        &self,
        auth: RestCredentials<'_>,
        request: &FlowExecutionRequest,
    ) -> VoiceResult<CallAck> {
        let url = self.executions_url(&request.flow_sid);
        tracing::debug!(to = %request.to, flow_sid = %request.flow_sid, "starting flow execution");
        self.post_form(STUDIO_SERVICE, &url, auth, &request.form()?).await
    }
}
