use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use northstar_server::AppState;
use tracing::{info, warn};

use super::{build_service, load_config};

/// Run the `northstar serve` command.
///
/// Serves until Ctrl-C, then drains in-flight requests.
pub fn run(
    config_path: Option<&Path>,
    listen: Option<String>,
    api_key: Option<String>,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(listen) = listen {
        config.server.listen = listen;
    }
    let addr = config.server.listen_addr()?;

    let service = build_service(&config)?;
    if service.credentials().account_sid.is_none() {
        warn!("TWILIO_ACCOUNT_SID is not set; token and call endpoints will fail");
    }
    let state = Arc::new(AppState::new(service, api_key));

    let rt = tokio::runtime::Runtime::new().context("failed to create tokio runtime")?;
    rt.block_on(northstar_server::serve(addr, state, shutdown_signal()))
        .context("server failed")
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => {
            warn!(error = %e, "cannot listen for Ctrl-C; serving until killed");
            std::future::pending::<()>().await;
        }
    }
}
