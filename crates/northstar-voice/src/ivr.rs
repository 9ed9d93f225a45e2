//! Inbound call handling.
//!
//! [`inbound_document`] is the webhook answer for inbound legs: it always
//! connects the call to the softphone. The answer menu ([`answer_document`]
//! and [`handle_input_document`]) is a small sales/support IVR that accepts
//! either a key press or a spoken department name.

use crate::twiml::{render_twiml, Gather, TwimlVerb};

/// Route serving [`answer_document`].
pub const ANSWER_PATH: &str = "/api/ivr/answer";

/// Route serving [`handle_input_document`].
pub const HANDLE_INPUT_PATH: &str = "/api/ivr/handle-input";

const MENU_PROMPT: &str = "Hello, how can we direct your call? Press 1 for sales, or say sales. \
                           To reach support, press 2 or say support.";
const NO_MATCH_PROMPT: &str = "Sorry, I didn't catch that.";

/// TwiML connecting the call to the softphone `identity`.
pub fn inbound_document(identity: &str) -> String {
    render_twiml(&[TwimlVerb::dial_client(identity)])
}

/// Department reachable from the answer menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Department {
    Sales,
    Support,
}

impl Department {
    pub fn label(self) -> &'static str {
        match self {
            Department::Sales => "Sales",
            Department::Support => "Support",
        }
    }

    /// Number the call is forwarded to.
    pub fn number(self) -> &'static str {
        match self {
            Department::Sales => "15555551234",
            Department::Support => "15555555678",
        }
    }
}

/// Pick a department from gathered input.
///
/// Digits win over speech; a digit other than 1 or 2 falls through to the
/// speech result. Speech matching is case-insensitive substring matching.
pub fn route_input(digits: Option<&str>, speech: Option<&str>) -> Option<Department> {
    match digits.unwrap_or_default() {
        "1" => return Some(Department::Sales),
        "2" => return Some(Department::Support),
        _ => {}
    }

    let speech = speech.unwrap_or_default().to_lowercase();
    if speech.contains("sales") {
        Some(Department::Sales)
    } else if speech.contains("support") {
        Some(Department::Support)
    } else {
        None
    }
}

/// The menu: one gather for a key press or speech, looping on silence.
pub fn answer_document() -> String {
    render_twiml(&[
        Gather::new(HANDLE_INPUT_PATH)
            .input("dtmf speech")
            .num_digits(1)
            .timeout(5)
            .language("en")
            .prompt(TwimlVerb::say_with_voice(MENU_PROMPT, "alice"))
            .into(),
        TwimlVerb::redirect(ANSWER_PATH),
    ])
}

/// Answer to the menu's gather callback.
pub fn handle_input_document(digits: Option<&str>, speech: Option<&str>) -> String {
    let verbs = match route_input(digits, speech) {
        Some(dept) => {
            tracing::info!(department = dept.label(), "ivr input routed");
            vec![
                TwimlVerb::say(format!("Connecting you to {}.", dept.label())),
                TwimlVerb::dial_number(dept.number()),
            ]
        }
        None => {
            tracing::debug!("ivr input did not match a department");
            vec![
                TwimlVerb::say(NO_MATCH_PROMPT),
                TwimlVerb::redirect(ANSWER_PATH),
            ]
        }
    };
    render_twiml(&verbs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbound_dials_the_softphone() {
        assert_eq!(
            inbound_document("user_browser"),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <Response>\n\
             \x20 <Dial>\n\
             \x20   <Client>user_browser</Client>\n\
             \x20 </Dial>\n\
             </Response>"
        );
    }

    #[test]
    fn digits_route_first() {
        assert_eq!(route_input(Some("1"), None), Some(Department::Sales));
        assert_eq!(route_input(Some("2"), None), Some(Department::Support));
        assert_eq!(
            route_input(Some("1"), Some("support please")),
            Some(Department::Sales)
        );
    }

    #[test]
    fn speech_routes_when_digits_do_not_match() {
        assert_eq!(route_input(None, Some("Sales")), Some(Department::Sales));
        assert_eq!(
            route_input(Some("9"), Some("I need SUPPORT")),
            Some(Department::Support)
        );
        assert_eq!(route_input(Some(""), Some("sales and support")), Some(Department::Sales));
    }

    #[test]
    fn nothing_matches() {
        assert_eq!(route_input(None, None), None);
        assert_eq!(route_input(Some("7"), Some("billing")), None);
    }

    #[test]
    fn answer_menu_gathers_dtmf_and_speech() {
        let xml = answer_document();
        assert!(xml.contains(
            "<Gather input=\"dtmf speech\" numDigits=\"1\" action=\"/api/ivr/handle-input\" \
             method=\"POST\" timeout=\"5\" language=\"en\">"
        ));
        assert!(xml.contains("<Say voice=\"alice\">Hello, how can we direct your call?"));
        assert!(xml.contains("<Redirect>/api/ivr/answer</Redirect>"));
    }

    #[test]
    fn matched_input_dials_department() {
        let xml = handle_input_document(Some("2"), None);
        assert!(xml.contains("<Say>Connecting you to Support.</Say>"));
        assert!(xml.contains("<Dial>15555555678</Dial>"));
        assert!(!xml.contains("<Redirect"));

        let xml = handle_input_document(None, Some("sales"));
        assert!(xml.contains("<Say>Connecting you to Sales.</Say>"));
        assert!(xml.contains("<Dial>15555551234</Dial>"));
    }

    #[test]
    fn unmatched_input_loops_back() {
        let xml = handle_input_document(Some("5"), Some("hmm"));
        assert!(xml.contains("<Say>Sorry, I didn't catch that.</Say>"));
        assert!(xml.contains("<Redirect>/api/ivr/answer</Redirect>"));
        assert!(!xml.contains("<Dial"));
    }
}
