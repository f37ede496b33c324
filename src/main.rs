use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use globe_latency::{
    adapter::{LatencyAdapter, ProxyClient},
    api::{create_router, AppState},
    config::{api_key_from_env, Args, FileConfig},
    latency::LatencySimulator,
    radar::{HttpUpstream, RadarProxy},
    scheduler::Scheduler,
    state::LiveData,
    store::ViewStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    let args = Args::parse();
    init_tracing(&args.log_filter());

    info!("Starting globe-latency");

    let config = FileConfig::load_or_default(args.config.as_deref()).await?;
    if let Some(path) = &args.config {
        info!("Loaded config from {}", path);
    }

    let api_key = api_key_from_env();
    if api_key.is_none() {
        warn!("No radar API key configured - serving mock data only");
    }

    let upstream = HttpUpstream::new(config.radar.request_timeout)
        .context("Failed to build upstream HTTP client")?;
    let proxy = Arc::new(RadarProxy::new(api_key, &config.radar, Arc::new(upstream)));
    let has_api_key = proxy.has_api_key();

    // The proxy may walk every endpoint before answering
    let adapter_timeout = config.radar.request_timeout * (config.radar.endpoints.len() as u32 + 1);
    let source = ProxyClient::new(args.proxy_url(), adapter_timeout)
        .context("Failed to build proxy HTTP client")?;
    info!("Adapter polling {}", source.url());
    let adapter = Arc::new(LatencyAdapter::new(Arc::new(source), has_api_key));

    let live = Arc::new(LiveData::new(has_api_key));
    let mut scheduler = Scheduler::start(
        live.clone(),
        LatencySimulator::from_registry(),
        adapter,
        &config.intervals,
    );

    let state = AppState {
        live,
        view: ViewStore::default(),
        proxy,
    };
    let app = create_router(state).layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("Failed to bind {}", args.bind))?;
    info!("API server listening on {}", args.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    scheduler.shutdown();
    info!("Shut down");
    Ok(())
}

fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_env() {
    // cwd + parents
    let _ = dotenv();

    // Also the crate dir, for runs from elsewhere via --manifest-path
    let manifest_env = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    if manifest_env.exists() {
        let _ = dotenv::from_path(&manifest_env);
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
}
