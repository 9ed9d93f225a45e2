//! Scripted authentication demo scenarios.
//!
//! Each [`Scenario`] maps to a linear prompt, collect, redirect-on-silence
//! script. The gather `action` URLs point at demo endpoints that this
//! backend does not serve; a real call that reaches that step fails upstream.
//! Unknown keys fall back to a generic greeting.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::twiml::{render_twiml, Gather, TwimlVerb};

/// Scenario used when the request does not name one.
pub const DEFAULT_SCENARIO_KEY: &str = "kba";

/// Where every scenario script redirects when the caller gives no input.
pub const NO_INPUT_REDIRECT: &str = "/api/voice";

/// Hold music for the fraud-routing scenario.
pub const HOLD_MUSIC_URL: &str =
    "http://com.twilio.sounds.music.s3.amazonaws.com/MARKOVICHAMP-Borghestral.mp3";

const TRUST_ANALYZING: &str = "Trust I.D. Analyzing Call Signal...";
const FALLBACK_PROMPT: &str = "Welcome to the IVR Demo. Please select a scenario.";

/// The closed set of demo scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    /// Knowledge-based authentication: account ID entry.
    Kba,
    /// Four digit PIN entry.
    Pin,
    /// Out-of-band one-time code.
    Otp,
    /// Spoken passphrase for voice biometrics.
    Voice,
    /// PIN followed by a second factor.
    Mfa,
    /// Trusted device, shortened ID&V.
    TrustidShort,
    /// Trusted device, expanded self-service menu.
    TrustidSelfservice,
    /// High-risk caller routed to a fraud specialist.
    TrustidRouting,
}

impl Scenario {
    pub const ALL: [Scenario; 8] = [
        Scenario::Kba,
        Scenario::Pin,
        Scenario::Otp,
        Scenario::Voice,
        Scenario::Mfa,
        Scenario::TrustidShort,
        Scenario::TrustidSelfservice,
        Scenario::TrustidRouting,
    ];

    /// Wire key, as sent in `flowType`.
    pub fn key(self) -> &'static str {
        match self {
            Scenario::Kba => "kba",
            Scenario::Pin => "pin",
            Scenario::Otp => "otp",
            Scenario::Voice => "voice",
            Scenario::Mfa => "mfa",
            Scenario::TrustidShort => "trustid_short",
            Scenario::TrustidSelfservice => "trustid_selfservice",
            Scenario::TrustidRouting => "trustid_routing",
        }
    }

    /// Parse a wire key. Exact, case-sensitive match.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.key() == key)
    }

    /// Short human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Scenario::Kba => "Basic KBA Auth",
            Scenario::Pin => "PIN Authentication",
            Scenario::Otp => "ID + OTP",
            Scenario::Voice => "Voice Biometrics",
            Scenario::Mfa => "Full MFA",
            Scenario::TrustidShort => "TrustID: Shortened ID&V",
            Scenario::TrustidSelfservice => "TrustID: Expanded Self-Service",
            Scenario::TrustidRouting => "TrustID: Risk-Based Routing",
        }
    }

    /// The script's verbs.
    pub fn verbs(self) -> Vec<TwimlVerb> {
        match self {
            Scenario::Kba => vec![
                Gather::new("/api/demo/kba-zip")
                    .num_digits(4)
                    .prompt(TwimlVerb::say(
                        "Welcome to Basic KBA Auth. Please enter your 4 digit Account ID.",
                    ))
                    .into(),
                TwimlVerb::redirect(NO_INPUT_REDIRECT),
            ],
            Scenario::Pin => vec![
                Gather::new("/api/demo/pin-check")
                    .num_digits(4)
                    .prompt(TwimlVerb::say(
                        "Welcome to PIN Authentication. Please enter your 4 digit PIN. Try 1 2 3 4.",
                    ))
                    .into(),
                TwimlVerb::redirect(NO_INPUT_REDIRECT),
            ],
            Scenario::Otp => vec![
                TwimlVerb::say("Welcome to ID plus OTP. We are sending a code to your device."),
                TwimlVerb::pause(2),
                Gather::new("/api/demo/auth-success")
                    .num_digits(6)
                    .prompt(TwimlVerb::say(
                        "Please enter the 6 digit code you just received. Try 1 2 3 4 5 6.",
                    ))
                    .into(),
                TwimlVerb::redirect(NO_INPUT_REDIRECT),
            ],
            Scenario::Voice => vec![
                Gather::new("/api/demo/voice-analyze")
                    .input("speech")
                    .timeout(4)
                    .prompt(TwimlVerb::say(
                        "Welcome to Voice Biometrics. Please say: My Voice is My Password.",
                    ))
                    .into(),
                TwimlVerb::redirect(NO_INPUT_REDIRECT),
            ],
            Scenario::Mfa => vec![
                Gather::new("/api/demo/mfa-step2")
                    .num_digits(4)
                    .prompt(TwimlVerb::say(
                        "Welcome to Full MFA. Step 1: Please enter your 4 digit PIN.",
                    ))
                    .into(),
                TwimlVerb::redirect(NO_INPUT_REDIRECT),
            ],
            Scenario::TrustidShort => vec![
                TwimlVerb::say(TRUST_ANALYZING),
                TwimlVerb::pause(1),
                TwimlVerb::say("Trust Score is Green. Device Verified."),
                Gather::new("/api/demo/auth-success")
                    .num_digits(4)
                    .prompt(TwimlVerb::say(
                        "Welcome back John. We recognized your trusted device. simply enter the last 4 digits of your account I.D. to proceed.",
                    ))
                    .into(),
                TwimlVerb::redirect(NO_INPUT_REDIRECT),
            ],
            Scenario::TrustidSelfservice => vec![
                TwimlVerb::say(TRUST_ANALYZING),
                TwimlVerb::pause(1),
                TwimlVerb::say("Trust Score is Green. Identity Assumed."),
                Gather::new("/api/demo/auth-success")
                    .num_digits(1)
                    .prompt(TwimlVerb::say(
                        "Because you are calling from a verified device, we have unlocked your Premium Menu. Press 1 for Limit Increases. Press 2 for Wire Transfers.",
                    ))
                    .into(),
                TwimlVerb::redirect(NO_INPUT_REDIRECT),
            ],
            Scenario::TrustidRouting => vec![
                TwimlVerb::say(TRUST_ANALYZING),
                TwimlVerb::pause(1),
                TwimlVerb::say("Warning. Trust Score is Red. Spoofing suspected."),
                TwimlVerb::pause(1),
                TwimlVerb::say(
                    "For your security, we are routing this call to a Fraud Prevention Specialist for manual identity verification. Please hold.",
                ),
                TwimlVerb::play(HOLD_MUSIC_URL),
            ],
        }
    }

    /// Rendered TwiML document.
    pub fn document(self) -> String {
        render_twiml(&self.verbs())
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Verbs for keys that name no scenario.
pub fn fallback_verbs() -> Vec<TwimlVerb> {
    vec![TwimlVerb::say(FALLBACK_PROMPT)]
}

/// Render the document for a raw scenario key, falling back to the generic
/// greeting for unknown keys.
pub fn document_for_key(key: &str) -> String {
    match Scenario::from_key(key) {
        Some(scenario) => scenario.document(),
        None => fallback_document(),
    }
}

/// The generic greeting document.
pub fn fallback_document() -> String {
    render_twiml(&fallback_verbs())
}
