//! Thin binary entrypoint over the `notify-engine` library crate.

use notify_engine::{Engine, EngineConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = EngineConfig::from_env()?;
    let engine = Engine::start(config).await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");

    engine.shutdown().await;
    Ok(())
}
