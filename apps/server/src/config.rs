use std::{net::SocketAddr, path::PathBuf, time::Duration};

use anyhow::Context;

pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: String,
    /// JSON engine configuration. Defaults apply when unset.
    pub engine_config: Option<PathBuf>,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let listen_addr: SocketAddr = std::env::var("NEXUS_LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .context("Invalid NEXUS_LISTEN_ADDR")?;
        let db_path = std::env::var("NEXUS_DB_PATH").unwrap_or_else(|_| "./db/nexus.db".into());
        let engine_config = std::env::var("NEXUS_CONFIG")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);
        let cors_allow = std::env::var("NEXUS_CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|_| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        // Longer than the default graph deadline so the engine's own timeout answers first.
        let timeout_ms: u64 = std::env::var("NEXUS_REQUEST_TIMEOUT_MS")
            .unwrap_or_else(|_| "60000".into())
            .parse()
            .unwrap_or(60000);
        Ok(Self {
            listen_addr,
            db_path,
            engine_config,
            cors_allow,
            request_timeout: Duration::from_millis(timeout_ms),
        })
    }
}
