use std::path::Path;

use anyhow::{Context, Result};
use northstar_voice::CallAck;

use super::{build_service, load_config, runtime};

/// Run the `northstar call` command.
pub fn run(config_path: Option<&Path>, to: &str) -> Result<()> {
    let config = load_config(config_path)?;
    let service = build_service(&config)?;

    let ack = runtime()?
        .block_on(service.initiate_call(Some(to)))
        .context("call failed")?;
    print_ack(&ack)
}

/// Run the `northstar trigger` command.
pub fn trigger(config_path: Option<&Path>, to: &str, flow_type: Option<&str>) -> Result<()> {
    let config = load_config(config_path)?;
    let service = build_service(&config)?;

    let ack = runtime()?
        .block_on(service.trigger_scenario(Some(to), flow_type.map(Some)))
        .context("scenario trigger failed")?;
    print_ack(&ack)
}

fn print_ack(ack: &CallAck) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(ack)?);
    Ok(())
}
