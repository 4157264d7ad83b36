//! Binary entrypoint for the FLIX API server.
use std::error::Error;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use flix_api::{run, AppState, Metrics};
use flix_core::{ChainReader, InMemoryChain};
use flix_generator::{GeneratorConfig, TemplateBuilder};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // FLIX_ADDR overrides the listen address
    let addr = std::env::var("FLIX_ADDR").unwrap_or_else(|_| "0.0.0.0:8788".to_string());
    let config = match std::env::var("FLIX_CONFIG") {
        Ok(path) => GeneratorConfig::load(path)?,
        Err(_) => GeneratorConfig::default(),
    };

    let mut builder = TemplateBuilder::from_config(config);
    if let Ok(path) = std::env::var("FLIX_CHAIN_SNAPSHOT") {
        let chain = InMemoryChain::from_yaml(&std::fs::read_to_string(&path)?)?;
        tracing::info!(network = %chain.network, height = chain.height, "loaded chain snapshot from {}", path);
        let network = chain.network.clone();
        let reader: Arc<dyn ChainReader> = Arc::new(chain);
        builder = builder.with_reader(network, reader);
    }

    let state = Arc::new(AppState {
        builder,
        metrics: Metrics::new()?,
    });
    run(&addr, state).await?;
    Ok(())
}
