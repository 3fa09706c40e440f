//! Solar API service.
//!
//! Serves rendered solar layer overlays and panel layouts over HTTP.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use solar_api::build_router;
use solar_api::solar_client::DEFAULT_BASE_URL;
use solar_api::state::{AppState, Settings};

#[derive(Parser, Debug)]
#[command(name = "solar-api")]
#[command(about = "Solar layer overlay and panel layout server")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:8090", env = "SOLAR_LISTEN_ADDR")]
    listen: String,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Solar API key, also attached to imagery downloads
    #[arg(long, env = "SOLAR_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Solar API base URL
    #[arg(long, default_value = DEFAULT_BASE_URL, env = "SOLAR_API_BASE_URL")]
    solar_api_url: String,

    /// Layer style file
    #[arg(long, default_value = "config/layers.yaml", env = "SOLAR_STYLES")]
    styles: PathBuf,

    /// Upstream request timeout in seconds
    #[arg(long, default_value_t = 60, env = "SOLAR_REQUEST_TIMEOUT_SECS")]
    request_timeout_secs: u64,

    /// Number of tokio worker threads (default: number of CPU cores)
    #[arg(long, env = "SOLAR_WORKER_THREADS")]
    worker_threads: Option<usize>,
}

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(threads) = args.worker_threads {
        runtime_builder.worker_threads(threads);
    }

    let runtime = runtime_builder.build()?;
    runtime.block_on(run_server(args))
}

async fn run_server(args: Args) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .json()
        .init();

    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;
    info!("Prometheus metrics exporter initialized");

    let settings = Settings {
        api_key: args.api_key.clone(),
        solar_api_base_url: args.solar_api_url.clone(),
        styles_path: args.styles.clone(),
        request_timeout: Duration::from_secs(args.request_timeout_secs),
        ..Settings::default()
    };
    let state = Arc::new(AppState::from_settings(&settings)?);

    let app = build_router(state, prometheus_handle);

    let addr: SocketAddr = args.listen.parse()?;
    info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
