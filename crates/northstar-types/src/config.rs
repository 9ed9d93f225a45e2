//! Deploy-time configuration loaded from `northstar.toml`.
//!
//! Only non-secret settings live here. Account SIDs, API keys and auth
//! tokens are sourced from the environment by
//! [`TwilioCredentials`](crate::TwilioCredentials) and are rejected if they
//! show up in a config file.

use std::net::SocketAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::ConfigError;

/// Default config file name looked up in the working directory.
pub const CONFIG_FILENAME: &str = "northstar.toml";

/// Caller ID used when neither the environment nor the config file set one.
pub const DEFAULT_FROM_NUMBER: &str = "+18885799021";

/// Pre-provisioned Studio flow that drives scenario calls to phone numbers.
pub const DEFAULT_FLOW_SID: &str = "FWfbc7b7f41a22199aab7261079d59c701";

/// Twilio REST API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://api.twilio.com";

/// Twilio Studio API base URL.
pub const DEFAULT_STUDIO_BASE_URL: &str = "https://studio.twilio.com";

/// Static TwiML document fetched by plain outbound demo calls.
pub const DEFAULT_DEMO_CALLBACK_URL: &str = "http://demo.twilio.com/docs/voice.xml";

/// Default HTTP listen address.
pub const DEFAULT_LISTEN: &str = "127.0.0.1:3001";

/// Maximum config file size in bytes.
const MAX_CONFIG_FILE_SIZE: u64 = 64 * 1024;

/// Keys that must never be stored in the config file.
const SECRET_KEYS: &[&str] = &["auth_token", "api_key_secret", "api_key"];

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NorthstarConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub twilio: TwilioSettings,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. `"0.0.0.0:3001"`.
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

/// Non-secret Twilio settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TwilioSettings {
    /// Caller ID for outbound calls. Overridden by `TWILIO_FROM_NUMBER`.
    #[serde(default = "default_from_number")]
    pub from_number: String,
    /// Studio flow SID used for phone-number scenario calls.
    #[serde(default = "default_flow_sid")]
    pub flow_sid: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_studio_base_url")]
    pub studio_base_url: String,
    /// Callback URL Twilio fetches for plain outbound calls.
    #[serde(default = "default_demo_callback_url")]
    pub demo_callback_url: String,
    /// Transport timeout for vendor requests, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for TwilioSettings {
    fn default() -> Self {
        Self {
            from_number: default_from_number(),
            flow_sid: default_flow_sid(),
            api_base_url: default_api_base_url(),
            studio_base_url: default_studio_base_url(),
            demo_callback_url: default_demo_callback_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_listen() -> String {
    DEFAULT_LISTEN.to_string()
}

fn default_from_number() -> String {
    DEFAULT_FROM_NUMBER.to_string()
}

fn default_flow_sid() -> String {
    DEFAULT_FLOW_SID.to_string()
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_studio_base_url() -> String {
    DEFAULT_STUDIO_BASE_URL.to_string()
}

fn default_demo_callback_url() -> String {
    DEFAULT_DEMO_CALLBACK_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl NorthstarConfig {
    /// Parse a configuration from a TOML string.
    ///
    /// Rejects files that carry secrets in the `[twilio]` table.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let raw: toml::Value =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        if let Some(twilio) = raw.get("twilio").and_then(|t| t.as_table()) {
            if let Some(key) = SECRET_KEYS.iter().find(|k| twilio.contains_key(**k)) {
                return Err(ConfigError::Invalid {
                    field: "twilio",
                    reason: format!(
                        "`{key}` must come from the environment, not the config file"
                    ),
                });
            }
        }

        let config: Self = raw
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load from `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let read_err = |reason: String| ConfigError::Read {
            path: path.display().to_string(),
            reason,
        };

        let meta = std::fs::metadata(path).map_err(|e| read_err(e.to_string()))?;
        if meta.len() > MAX_CONFIG_FILE_SIZE {
            return Err(read_err(format!(
                "file is {} bytes, limit is {MAX_CONFIG_FILE_SIZE}",
                meta.len()
            )));
        }

        let content = std::fs::read_to_string(path).map_err(|e| read_err(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Load from `path` when given, else from `./northstar.toml` if it
    /// exists, else fall back to built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let local = Path::new(CONFIG_FILENAME);
                if local.exists() {
                    Self::load(local)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Check addresses and URLs are well formed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.listen_addr()?;

        for (field, value) in [
            ("twilio.api_base_url", &self.twilio.api_base_url),
            ("twilio.studio_base_url", &self.twilio.studio_base_url),
            ("twilio.demo_callback_url", &self.twilio.demo_callback_url),
        ] {
            let url = Url::parse(value).map_err(|e| ConfigError::Invalid {
                field,
                reason: format!("{value:?}: {e}"),
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("unsupported scheme {:?}", url.scheme()),
                });
            }
        }

        if self.twilio.flow_sid.is_empty() {
            return Err(ConfigError::Invalid {
                field: "twilio.flow_sid",
                reason: "must not be empty".into(),
            });
        }
        if self.twilio.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "twilio.request_timeout_secs",
                reason: "must be greater than zero".into(),
            });
        }

        Ok(())
    }
}

impl ServerConfig {
    /// Parse the listen address.
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.listen.parse().map_err(|e| ConfigError::Invalid {
            field: "server.listen",
            reason: format!("{:?}: {e}", self.listen),
        })
    }
}
