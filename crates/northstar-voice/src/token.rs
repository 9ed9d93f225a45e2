//! Client access tokens for the browser softphone.
//!
//! Tokens use Twilio's access token layout: a JWT with the
//! `twilio-fpa;v=1` content type, signed HS256 with the API key secret.
//! The grant allows inbound voice to a single identity, and outbound voice
//! through a TwiML application when one is configured.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use northstar_types::TokenSigningCredentials;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::{VoiceError, VoiceResult};

/// Token lifetime in seconds.
pub const TOKEN_TTL_SECS: i64 = 3600;

const CONTENT_TYPE: &str = "twilio-fpa;v=1";
const ALGORITHM: &str = "HS256";

type HmacSha256 = Hmac<Sha256>;

/// JOSE header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHeader {
    pub cty: String,
    pub typ: String,
    pub alg: String,
}

impl Default for TokenHeader {
    fn default() -> Self {
        Self {
            cty: CONTENT_TYPE.to_string(),
            typ: "JWT".to_string(),
            alg: ALGORITHM.to_string(),
        }
    }
}

/// Token payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// `<api key sid>-<issue time>`.
    pub jti: String,
    /// API key SID.
    pub iss: String,
    /// Account SID.
    pub sub: String,
    /// Expiry, unix seconds.
    pub exp: i64,
    pub grants: Grants,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grants {
    pub identity: String,
    pub voice: VoiceGrant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceGrant {
    pub incoming: IncomingGrant,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outgoing: Option<OutgoingGrant>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingGrant {
    pub allow: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingGrant {
    pub application_sid: String,
}

/// What the token endpoint hands back to the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedToken {
    pub token: String,
    pub identity: String,
}

impl AccessTokenClaims {
    /// Build the claims for a token issued at `issued_at` (unix seconds).
    pub fn new(
        creds: TokenSigningCredentials<'_>,
        identity: &str,
        outgoing_application_sid: Option<&str>,
        issued_at: i64,
    ) -> Self {
        Self {
            jti: format!("{}-{issued_at}", creds.api_key_sid),
            iss: creds.api_key_sid.to_string(),
            sub: creds.account_sid.to_string(),
            exp: issued_at + TOKEN_TTL_SECS,
            grants: Grants {
                identity: identity.to_string(),
                voice: VoiceGrant {
                    incoming: IncomingGrant { allow: true },
                    outgoing: outgoing_application_sid.map(|sid| OutgoingGrant {
                        application_sid: sid.to_string(),
                    }),
                },
            },
        }
    }
}

/// Sign `claims` with the API key secret and return the compact token.
pub fn sign(claims: &AccessTokenClaims, secret: &str) -> VoiceResult<String> {
    let header = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&TokenHeader::default())?);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);
    let signing_input = format!("{header}.{payload}");

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| VoiceError::InvalidToken(format!("bad signing key: {e}")))?;
    mac.update(signing_input.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{signing_input}.{signature}"))
}

/// Issue a token for `identity` at `issued_at`.
pub fn issue(
    creds: TokenSigningCredentials<'_>,
    identity: &str,
    outgoing_application_sid: Option<&str>,
    issued_at: i64,
) -> VoiceResult<IssuedToken> {
    let claims = AccessTokenClaims::new(creds, identity, outgoing_application_sid, issued_at);
    let token = sign(&claims, creds.api_key_secret)?;
    Ok(IssuedToken {
        token,
        identity: identity.to_string(),
    })
}

/// Verify a token's signature and return its claims.
///
/// Checks structure, header algorithm and the HMAC (constant time). Expiry
/// is not enforced here; callers compare `exp` themselves.
pub fn verify(token: &str, secret: &str) -> VoiceResult<AccessTokenClaims> {
    let mut parts = token.split('.');
    let (Some(header_b64), Some(payload_b64), Some(sig_b64), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(VoiceError::InvalidToken(
            "expected three dot-separated segments".into(),
        ));
    };

    let header: TokenHeader = decode_segment(header_b64, "header")?;
    if header.alg != ALGORITHM {
        return Err(VoiceError::InvalidToken(format!(
            "unsupported algorithm {:?}",
            header.alg
        )));
    }

    let signature = URL_SAFE_NO_PAD
        .decode(sig_b64)
        .map_err(|e| VoiceError::InvalidToken(format!("signature is not base64url: {e}")))?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| VoiceError::InvalidToken(format!("bad signing key: {e}")))?;
    mac.update(header_b64.as_bytes());
    mac.update(b".");
    mac.update(payload_b64.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| VoiceError::InvalidToken("signature mismatch".into()))?;

    decode_segment(payload_b64, "payload")
}

fn decode_segment<T: serde::de::DeserializeOwned>(segment: &str, what: &str) -> VoiceResult<T> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| VoiceError::InvalidToken(format!("{what} is not base64url: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| VoiceError::InvalidToken(format!("{what} is not valid JSON: {e}")))
}
