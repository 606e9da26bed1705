//! Intel Radar ingestion service: binary entrypoint.
//! Loads settings, opens the store, starts the ingest scheduler and serves the API.

use std::time::Duration;

use anyhow::Context;
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use intel_radar::config::Settings;
use intel_radar::ingest::config::load_profile_default;
use intel_radar::ingest::scheduler::{spawn_scheduler, IngestSchedulerCfg};
use intel_radar::metrics::Metrics;

/// Compact logs by default, JSON when LOG_FORMAT=json.
/// `try_init` because the runtime may already have installed a subscriber.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("intel_radar=info,ingest=info,warn"));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    let _ = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let settings = Settings::from_env()?;
    let profile = load_profile_default().context("loading ingest profile")?;
    tracing::info!(?settings, query = %profile.query, "starting intel radar");
    if settings.api_key.is_none() {
        tracing::info!("PERIGON_API_KEY is not configured; ingest cycles will be skipped");
    }

    // Recorder first, so the first scheduled cycle is already measured.
    let metrics = Metrics::init()?;
    let state = intel_radar::build_state(&settings, profile)?;

    if settings.interval_secs > 0 {
        let cfg = IngestSchedulerCfg {
            interval: Duration::from_secs(settings.interval_secs),
        };
        spawn_scheduler(cfg, state.runner.clone(), state.history.clone());
    } else {
        tracing::info!("in-process scheduler disabled (INGEST_INTERVAL_SECS=0)");
    }

    let router = intel_radar::router(state).merge(metrics.router());

    Ok(router.into())
}
