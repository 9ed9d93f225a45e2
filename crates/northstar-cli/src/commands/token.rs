use std::path::Path;

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use northstar_voice::token::verify;

use super::{build_service, load_config};

/// Run the `northstar token` command.
///
/// Prints `{token, identity}` as the HTTP endpoint returns it. With
/// `decode`, the token is verified against the configured secret and its
/// claims are printed as well.
pub fn run(config_path: Option<&Path>, decode: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let service = build_service(&config)?;

    let issued = service.issue_token().context("failed to issue token")?;
    println!("{}", serde_json::to_string_pretty(&issued)?);

    if decode {
        let signing = service.credentials().token_signing()?;
        let claims = verify(&issued.token, signing.api_key_secret)?;
        println!("{}", serde_json::to_string_pretty(&claims)?);
        if let Some(expires) = Utc.timestamp_opt(claims.exp, 0).single() {
            println!("expires: {}", expires.to_rfc3339());
        }
    }
    Ok(())
}
