//! Twilio credential set sourced from environment variables.
//!
//! Credentials are read once at startup into an immutable
//! [`TwilioCredentials`] value and handed to the service layer. Each
//! operation asks for the subset it needs ([`token_signing`] or
//! [`rest_auth`]) and gets a [`ConfigError::MissingCredentials`] naming the
//! absent variables otherwise.
//!
//! [`token_signing`]: TwilioCredentials::token_signing
//! [`rest_auth`]: TwilioCredentials::rest_auth

use std::fmt;

use crate::ConfigError;

pub const ENV_ACCOUNT_SID: &str = "TWILIO_ACCOUNT_SID";
pub const ENV_API_KEY_SID: &str = "TWILIO_API_KEY_SID";
pub const ENV_API_KEY_SECRET: &str = "TWILIO_API_KEY_SECRET";
pub const ENV_AUTH_TOKEN: &str = "TWILIO_AUTH_TOKEN";
pub const ENV_FROM_NUMBER: &str = "TWILIO_FROM_NUMBER";
/// Legacy name used by the browser bundle's build environment.
pub const ENV_FROM_NUMBER_LEGACY: &str = "VITE_TWILIO_FROM_NUMBER";
pub const ENV_TWIML_APP_SID: &str = "TWILIO_TWIML_APP_SID";

/// The full Twilio credential set. Every field is optional here; presence
/// is checked per operation.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct TwilioCredentials {
    pub account_sid: Option<String>,
    pub api_key_sid: Option<String>,
    pub api_key_secret: Option<String>,
    pub auth_token: Option<String>,
    /// Caller ID override.
    pub from_number: Option<String>,
    /// TwiML application SID enabling outgoing calls from the softphone.
    pub twiml_app_sid: Option<String>,
}

/// Borrowed credentials needed to sign a client access token.
#[derive(Clone, Copy)]
pub struct TokenSigningCredentials<'a> {
    pub account_sid: &'a str,
    pub api_key_sid: &'a str,
    pub api_key_secret: &'a str,
}

/// Borrowed credentials for HTTP basic auth against the REST API.
#[derive(Clone, Copy)]
pub struct RestCredentials<'a> {
    pub account_sid: &'a str,
    pub auth_token: &'a str,
}

impl TwilioCredentials {
    /// Read credentials from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read credentials through an arbitrary lookup function.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            account_sid: get(ENV_ACCOUNT_SID),
            api_key_sid: get(ENV_API_KEY_SID),
            api_key_secret: get(ENV_API_KEY_SECRET),
            auth_token: get(ENV_AUTH_TOKEN),
            from_number: get(ENV_FROM_NUMBER).or_else(|| get(ENV_FROM_NUMBER_LEGACY)),
            twiml_app_sid: get(ENV_TWIML_APP_SID),
        }
    }

    /// Credentials for signing access tokens.
    pub fn token_signing(&self) -> Result<TokenSigningCredentials<'_>, ConfigError> {
        match (&self.account_sid, &self.api_key_sid, &self.api_key_secret) {
            (Some(account_sid), Some(api_key_sid), Some(api_key_secret)) => {
                Ok(TokenSigningCredentials {
                    account_sid,
                    api_key_sid,
                    api_key_secret,
                })
            }
            _ => Err(ConfigError::MissingCredentials(missing(&[
                (ENV_ACCOUNT_SID, &self.account_sid),
                (ENV_API_KEY_SID, &self.api_key_sid),
                (ENV_API_KEY_SECRET, &self.api_key_secret),
            ]))),
        }
    }

    /// Credentials for authenticated REST calls.
    pub fn rest_auth(&self) -> Result<RestCredentials<'_>, ConfigError> {
        match (&self.account_sid, &self.auth_token) {
            (Some(account_sid), Some(auth_token)) => Ok(RestCredentials {
                account_sid,
                auth_token,
            }),
            _ => Err(ConfigError::MissingCredentials(missing(&[
                (ENV_ACCOUNT_SID, &self.account_sid),
                (ENV_AUTH_TOKEN, &self.auth_token),
            ]))),
        }
    }
}

fn missing(fields: &[(&'static str, &Option<String>)]) -> Vec<&'static str> {
    fields
        .iter()
        .filter(|(_, v)| v.is_none())
        .map(|(name, _)| *name)
        .collect()
}

fn redact(value: &Option<String>) -> &'static str {
    if value.is_some() {
        "<set>"
    } else {
        "<unset>"
    }
}

impl fmt::Debug for TwilioCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwilioCredentials")
            .field("account_sid", &self.account_sid)
            .field("api_key_sid", &self.api_key_sid)
            .field("api_key_secret", &redact(&self.api_key_secret))
            .field("auth_token", &redact(&self.auth_token))
            .field("from_number", &self.from_number)
            .field("twiml_app_sid", &self.twiml_app_sid)
            .finish()
    }
}

impl fmt::Debug for TokenSigningCredentials<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSigningCredentials")
            .field("account_sid", &self.account_sid)
            .field("api_key_sid", &self.api_key_sid)
            .field("api_key_secret", &"<set>")
            .finish()
    }
}

impl fmt::Debug for RestCredentials<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestCredentials")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"<set>")
            .finish()
    }
}
