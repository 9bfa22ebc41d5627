//! `logrelay` host process.
//!
//! Loads settings, connects the Redis source and the Elasticsearch sink, and
//! runs the supervisor until every listener stops or a termination signal
//! arrives. Exits with `1` on any error.

use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use logrelay::{ElasticSink, RedisSource, Settings, Supervisor};

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    match run().await {
        Ok(()) => {
            tracing::info!("relay stopped");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "relay failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load_from_env()?;
    let bindings = settings.bindings()?;
    let cfg = settings.runtime();

    let source = RedisSource::connect(&settings.redis, cfg.inbox_capacity_clamped()).await?;
    let sink = ElasticSink::from_settings(&settings.elastic)?;
    tracing::info!(
        elastic = %settings.elastic.base_url(),
        listeners = bindings.len(),
        "starting relay"
    );

    let sup = Supervisor::builder(cfg, Arc::new(source), Arc::new(sink)).build();
    sup.run_until_signal(bindings).await?;
    Ok(())
}
