//! Serve command handler.

use super::{CmdResult, Store};
use parley::config::ParleyConfig;

/// Serve command. Blocks until Ctrl-C.
#[cfg(feature = "http")]
pub fn cmd_serve(
    store: Store,
    config: &ParleyConfig,
    host: Option<String>,
    port: Option<u16>,
) -> CmdResult {
    use parley::http::{AppState, resolve_addr, serve};
    use std::sync::Arc;

    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    let state = AppState::new(Arc::new(store), config.seed.to_message());
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let addr = resolve_addr(&host, port).await?;
        serve(addr, state).await
    })?;
    Ok(())
}

/// Serve command (feature not enabled).
#[cfg(not(feature = "http"))]
pub fn cmd_serve(
    _store: Store,
    _config: &ParleyConfig,
    _host: Option<String>,
    _port: Option<u16>,
) -> CmdResult {
    Err(Box::new(parley::Error::FeatureNotEnabled("http".to_string())))
}
