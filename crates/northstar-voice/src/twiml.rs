//! TwiML generation.
//!
//! Call-control documents are built from [`TwimlVerb`] values and rendered
//! with [`render_twiml`]. Text content and attribute values are XML-escaped,
//! so prompt text can never inject markup.

/// Who a `<Dial>` connects to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialTarget {
    /// A registered softphone client identity.
    Client(String),
    /// A phone number.
    Number(String),
}

/// A `<Gather>` collecting DTMF digits and/or speech.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gather {
    /// Input type: `"dtmf"`, `"speech"` or `"dtmf speech"`. Vendor default
    /// (`dtmf`) when unset.
    pub input: Option<String>,
    pub num_digits: Option<u32>,
    /// URL the vendor posts the collected input to.
    pub action: String,
    pub method: String,
    /// Seconds to wait for input.
    pub timeout: Option<u32>,
    pub language: Option<String>,
    /// Verbs played while waiting for input.
    pub prompts: Vec<TwimlVerb>,
}

impl Gather {
    /// A gather posting to `action`.
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            input: None,
            num_digits: None,
            action: action.into(),
            method: "POST".to_string(),
            timeout: None,
            language: None,
            prompts: Vec::new(),
        }
    }

    pub fn input(mut self, input: impl Into<String>) -> Self {
        self.input = Some(input.into());
        self
    }

    pub fn num_digits(mut self, n: u32) -> Self {
        self.num_digits = Some(n);
        self
    }

    pub fn timeout(mut self, seconds: u32) -> Self {
        self.timeout = Some(seconds);
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn prompt(mut self, verb: TwimlVerb) -> Self {
        self.prompts.push(verb);
        self
    }
}

/// A TwiML verb.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TwimlVerb {
    /// Speak text using text-to-speech.
    Say {
        text: String,
        /// TTS voice name (e.g., "alice").
        voice: Option<String>,
        language: Option<String>,
    },
    Gather(Gather),
    /// Pause for a number of seconds.
    Pause { length: u32 },
    /// Play an audio file.
    Play { url: String },
    /// Continue the call with the document at `url`.
    Redirect { url: String },
    Dial { target: DialTarget },
}

impl TwimlVerb {
    /// `<Say>` with the vendor's default voice.
    pub fn say(text: impl Into<String>) -> Self {
        TwimlVerb::Say {
            text: text.into(),
            voice: None,
            language: None,
        }
    }

    /// `<Say>` with an explicit voice.
    pub fn say_with_voice(text: impl Into<String>, voice: impl Into<String>) -> Self {
        TwimlVerb::Say {
            text: text.into(),
            voice: Some(voice.into()),
            language: None,
        }
    }

    pub fn pause(length: u32) -> Self {
        TwimlVerb::Pause { length }
    }

    pub fn play(url: impl Into<String>) -> Self {
        TwimlVerb::Play { url: url.into() }
    }

    pub fn redirect(url: impl Into<String>) -> Self {
        TwimlVerb::Redirect { url: url.into() }
    }

    pub fn dial_client(identity: impl Into<String>) -> Self {
        TwimlVerb::Dial {
            target: DialTarget::Client(identity.into()),
        }
    }

    pub fn dial_number(number: impl Into<String>) -> Self {
        TwimlVerb::Dial {
            target: DialTarget::Number(number.into()),
        }
    }
}

impl From<Gather> for TwimlVerb {
    fn from(gather: Gather) -> Self {
        TwimlVerb::Gather(gather)
    }
}

/// Render a sequence of verbs into a complete TwiML document.
pub fn render_twiml(verbs: &[TwimlVerb]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Response>\n");
    for verb in verbs {
        render_verb(&mut xml, verb, 1);
    }
    xml.push_str("</Response>");
    xml
}

fn render_verb(xml: &mut String, verb: &TwimlVerb, depth: usize) {
    let indent = "  ".repeat(depth);
    match verb {
        TwimlVerb::Say {
            text,
            voice,
            language,
        } => {
            xml.push_str(&indent);
            xml.push_str("<Say");
            push_attr(xml, "voice", voice.as_deref());
            push_attr(xml, "language", language.as_deref());
            xml.push('>');
            xml.push_str(&escape_text(text));
            xml.push_str("</Say>\n");
        }
        TwimlVerb::Gather(gather) => {
            let num_digits = gather.num_digits.map(|n| n.to_string());
            let timeout = gather.timeout.map(|n| n.to_string());

            xml.push_str(&indent);
            xml.push_str("<Gather");
            push_attr(xml, "input", gather.input.as_deref());
            push_attr(xml, "numDigits", num_digits.as_deref());
            push_attr(xml, "action", Some(gather.action.as_str()));
            push_attr(xml, "method", Some(gather.method.as_str()));
            push_attr(xml, "timeout", timeout.as_deref());
            push_attr(xml, "language", gather.language.as_deref());

            if gather.prompts.is_empty() {
                xml.push_str("/>\n");
            } else {
                xml.push_str(">\n");
                for prompt in &gather.prompts {
                    render_verb(xml, prompt, depth + 1);
                }
                xml.push_str(&indent);
                xml.push_str("</Gather>\n");
            }
        }
        TwimlVerb::Pause { length } => {
            xml.push_str(&format!("{indent}<Pause length=\"{length}\"/>\n"));
        }
        TwimlVerb::Play { url } => {
            xml.push_str(&format!("{indent}<Play>{}</Play>\n", escape_text(url)));
        }
        TwimlVerb::Redirect { url } => {
            xml.push_str(&format!("{indent}<Redirect>{}</Redirect>\n", escape_text(url)));
        }
        TwimlVerb::Dial { target } => match target {
            DialTarget::Client(identity) => {
                xml.push_str(&format!("{indent}<Dial>\n"));
                xml.push_str(&format!(
                    "{indent}  <Client>{}</Client>\n",
                    escape_text(identity)
                ));
                xml.push_str(&format!("{indent}</Dial>\n"));
            }
            DialTarget::Number(number) => {
                xml.push_str(&format!("{indent}<Dial>{}</Dial>\n", escape_text(number)));
            }
        },
    }
}

fn push_attr(xml: &mut String, name: &str, value: Option<&str>) {
    if let Some(value) = value {
        xml.push(' ');
        xml.push_str(name);
        xml.push_str("=\"");
        xml.push_str(&escape_attr(value));
        xml.push('"');
    }
}

/// Escape `&`, `<` and `>` in element text.
fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape text for use inside a double-quoted attribute.
fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}
