//! cnt-ingest - News Translation Ingest
//!
//! Fetches one batch of CryptoPanic posts, translates the configured text
//! fields, merges the result into the JSON snapshot and exits. Runs are
//! expected to be scheduled externally and must not overlap.
//!
//! All settings come from `CNT_*` environment variables (see `--help`).

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cnt_ingest::{build_pipeline, Args, IngestConfig};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cnt_ingest=info,cnt_common=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting cnt-ingest {}", env!("CARGO_PKG_VERSION"));

    // Step 1: Resolve configuration before touching the network
    let toml_config = cnt_common::config::load_optional_config(args.config_file.as_deref())
        .context("Failed to load config file")?;
    let config = IngestConfig::resolve(&args, &toml_config).map_err(|e| {
        error!("{}", e);
        e
    })?;

    info!(
        snapshot = %config.snapshot_path.display(),
        layout = %config.snapshot_layout,
        target_lang = %config.target_lang,
        retention_days = config.retention_days,
        "Configuration resolved"
    );

    // Step 2: Build and run the pipeline
    let pipeline = build_pipeline(&config).context("Failed to initialize pipeline")?;
    let report = pipeline.run().await.context("Ingest run failed")?;

    report.log_summary();
    Ok(())
}
