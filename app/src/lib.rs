//! Route quote server application library

use std::path::Path;

use anyhow::Context;
use router_api::AppState;
use router_core::RouterConfig;

/// Install the global subscriber. `RUST_LOG` adds to the defaults.
pub fn init_tracing() {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in ["router=debug", "finder=info", "info"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Config from `path`, or the defaults without one.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<RouterConfig> {
    match path {
        Some(path) => RouterConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(RouterConfig::default()),
    }
}

/// Run the quote server until shutdown
pub async fn run(config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    tracing::info!(
        strategy = ?config.strategy,
        port = config.api_port,
        "Starting route quote server"
    );

    let state = AppState::new(config).context("building route engine")?;
    router_api::start_server(state)
        .await
        .context("quote server failed")?;
    Ok(())
}
