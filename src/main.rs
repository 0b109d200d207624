use anyhow::Context;
use clap::Parser;
use helm_s3_reindex::{pipeline, Cli, Config, S3Store};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Exits with usage on missing required options
    let config = Config::from(Cli::parse());

    let store = S3Store::connect(&config).await;
    pipeline::run(&store, &config)
        .await
        .with_context(|| format!("restoring s3://{}/{}", config.bucket, config.index_key()))?;

    Ok(())
}
