//! Voice building blocks for the NorthStar IVR demo.
//!
//! Everything that touches the telephony vendor lives here:
//!
//! - [`token`]: HS256 client access tokens for the browser softphone
//! - [`twiml`]: TwiML verb model and XML rendering
//! - [`scenario`]: the eight scripted authentication demos
//! - [`ivr`]: inbound call router and the sales/support answer menu
//! - [`twilio`]: [`TelephonyApi`] seam and its reqwest-backed implementation
//! - [`service`]: [`VoiceService`], the handler logic the HTTP layer calls
//!
//! # Security
//!
//! - Secrets come from the environment only and are never logged.
//! - Token signatures are verified in constant time.
//! - All TwiML text and attributes are XML-escaped.

pub mod error;
pub mod ivr;
pub mod scenario;
pub mod service;
pub mod token;
pub mod twilio;
pub mod twiml;

pub use error::{VoiceError, VoiceResult};
pub use scenario::{Scenario, DEFAULT_SCENARIO_KEY};
pub use service::{Destination, VoiceService};
pub use token::{AccessTokenClaims, IssuedToken};
pub use twilio::{
    CallAck, CallInstructions, CallRequest, FlowExecutionRequest, TelephonyApi, TwilioClient,
};
pub use twiml::{DialTarget, Gather, TwimlVerb};

/// The single softphone identity every token and inbound dial targets.
pub const CLIENT_IDENTITY: &str = "user_browser";
