//! `northstar twiml` prints the documents the webhooks serve.

use anyhow::Result;
use northstar_voice::{ivr, scenario, CLIENT_IDENTITY};

pub fn scenario(key: &str) -> Result<()> {
    if scenario::Scenario::from_key(key).is_none() {
        tracing::warn!(key, "unknown scenario key, printing fallback");
    }
    println!("{}", scenario::document_for_key(key));
    Ok(())
}

pub fn inbound() -> Result<()> {
    println!("{}", ivr::inbound_document(CLIENT_IDENTITY));
    Ok(())
}

pub fn answer() -> Result<()> {
    println!("{}", ivr::answer_document());
    Ok(())
}

pub fn handle_input(digits: Option<&str>, speech: Option<&str>) -> Result<()> {
    println!("{}", ivr::handle_input_document(digits, speech));
    Ok(())
}
