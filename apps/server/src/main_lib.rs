use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use nexus_core::cache::MemoryCache;
use nexus_core::service::build_registry;
use nexus_core::{EngineConfig, RiskGraphService, RiskGraphServiceTrait};
use nexus_registry::HttpRouteProbe;
use nexus_storage_sqlite::{SqliteRecordStore, SqliteSearchHistory};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub struct AppState {
    pub risk_graph_service: Arc<dyn RiskGraphServiceTrait>,
}

impl AppState {
    pub fn new(risk_graph_service: Arc<dyn RiskGraphServiceTrait>) -> Arc<Self> {
        Arc::new(Self { risk_graph_service })
    }
}

/// Text or JSON output by `NEXUS_LOG_FORMAT`, filtered by `RUST_LOG`.
///
/// `init` also installs the `log` bridge, so records from the engine crates
/// land in the same subscriber.
pub fn init_tracing() {
    let log_format = std::env::var("NEXUS_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

fn load_engine_config(config: &Config) -> anyhow::Result<EngineConfig> {
    match &config.engine_config {
        Some(path) => {
            tracing::info!("Loading engine configuration from {}", path.display());
            Ok(EngineConfig::load(path)?)
        }
        None => {
            tracing::info!("NEXUS_CONFIG not set, using default engine configuration");
            Ok(EngineConfig::default())
        }
    }
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let engine_config = load_engine_config(config)?;

    let store = SqliteRecordStore::open(&config.db_path)?;
    let history = SqliteSearchHistory::new(store.pool());
    tracing::info!("Record store and search history in use: {}", config.db_path);

    let registry = Arc::new(build_registry(&engine_config)?);
    // the direct route can be retired too, so health checks always run
    let interval = Duration::from_secs(engine_config.egress.probe_interval_secs.max(1));
    registry.egress().clone().spawn_health_probe(
        Arc::new(HttpRouteProbe::new(engine_config.egress.probe_url.clone())),
        interval,
    );
    tracing::info!(
        "Egress health probe every {}s against {}",
        interval.as_secs(),
        engine_config.egress.probe_url
    );

    let cache = Arc::new(MemoryCache::new());
    Arc::clone(&cache).spawn_purge(engine_config.cache.purge_interval());

    let service = RiskGraphService::new(&engine_config, registry, cache, Arc::new(store))
        .with_history(Arc::new(history));
    Ok(AppState::new(Arc::new(service)))
}
