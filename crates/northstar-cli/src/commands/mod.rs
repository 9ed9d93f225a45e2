//! CLI command implementations for the `northstar` binary.

pub mod call;
pub mod scenarios;
pub mod serve;
pub mod token;
pub mod twiml;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use northstar_types::{NorthstarConfig, TwilioCredentials};
use northstar_voice::{TwilioClient, VoiceService};

/// Load configuration from `path`, `./northstar.toml`, or built-in defaults.
pub fn load_config(path: Option<&Path>) -> Result<NorthstarConfig> {
    NorthstarConfig::load_or_default(path).context("failed to load configuration")
}

/// Build the voice service from configuration and the process environment.
pub fn build_service(config: &NorthstarConfig) -> Result<VoiceService> {
    let credentials = TwilioCredentials::from_env();
    tracing::debug!(?credentials, "loaded Twilio credentials");

    let client =
        TwilioClient::from_settings(&config.twilio).context("failed to build Twilio client")?;
    Ok(VoiceService::new(
        credentials,
        config.twilio.clone(),
        Arc::new(client),
    ))
}

/// Single-threaded runtime for one-shot commands.
fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")
}
