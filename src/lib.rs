pub mod config;
pub mod storage;
pub mod transcription;
pub mod web;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use config::ServiceConfig;
use web::context::TranscriptionContext;
use web::lifecycle;
use web::staging::StagingArea;

// Setup logging: debug in dev builds, info in release, RUST_LOG overrides
pub fn setup_logging() {
    let default_level = if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        // Filter out noisy logs
        .filter_module("aws_config", log::LevelFilter::Warn)
        .filter_module("aws_smithy_runtime", log::LevelFilter::Warn)
        .filter_module("aws_smithy_runtime_api", log::LevelFilter::Warn)
        .filter_module("hyper", log::LevelFilter::Warn)
        .filter_module("rustls", log::LevelFilter::Warn)
        .filter_module("warp", log::LevelFilter::Info)
        .init();
}

/// Load configuration, connect to AWS and serve until Ctrl-C
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let app_version = env!("CARGO_PKG_VERSION");
    log::info!("[Startup] medscribe-relay {} starting", app_version);

    let config = ServiceConfig::from_env()?;
    log::info!("[Startup] Configuration loaded: {:?}", config);

    let staging = Arc::new(StagingArea::new(
        &config.staging_dir,
        config.max_upload_bytes,
    )?);
    log::info!(
        "[Startup] Staging uploads in {:?} (limit {} bytes)",
        staging.dir(),
        staging.max_bytes()
    );
    let ctx = Arc::new(TranscriptionContext::from_config(&config).await);

    let mut handle = lifecycle::start(config.socket_addr(), ctx, staging)?;

    tokio::signal::ctrl_c().await?;
    log::info!("[Startup] Ctrl-C received, shutting down");

    handle.stop();
    handle.wait().await;

    log::info!("[Startup] Stopped");
    Ok(())
}
