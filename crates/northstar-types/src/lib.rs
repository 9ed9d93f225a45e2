//! Core types shared across the NorthStar IVR demo crates.
//!
//! Defines the deploy-time configuration file format, the environment-sourced
//! Twilio credential set, and the configuration error type.

pub mod config;
pub mod credentials;
pub mod error;

pub use config::{
    NorthstarConfig, ServerConfig, TwilioSettings, CONFIG_FILENAME, DEFAULT_API_BASE_URL,
    DEFAULT_DEMO_CALLBACK_URL, DEFAULT_FLOW_SID, DEFAULT_FROM_NUMBER, DEFAULT_LISTEN,
    DEFAULT_STUDIO_BASE_URL,
};
pub use credentials::{RestCredentials, TokenSigningCredentials, TwilioCredentials};
pub use error::ConfigError;
