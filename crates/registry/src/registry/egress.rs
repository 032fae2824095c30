//! Egress rotation pool.
//!
//! Live acquisition calls go out through one of several routes (a direct
//! connection or configured proxies). Routes are picked round-robin, skipping
//! retired ones. A route is retired after a run of consecutive failures
//! attributed to it and comes back only when a health probe succeeds.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::errors::ResolutionError;

/// Default consecutive failures before a route is retired.
const DEFAULT_FAILURE_THRESHOLD: u32 = 3;

/// Timeout for a single health probe request.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors building the pool.
#[derive(Error, Debug)]
pub enum EgressError {
    #[error("Invalid proxy '{proxy}': {message}")]
    InvalidProxy { proxy: String, message: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

/// One outbound network path.
#[derive(Debug)]
pub struct Route {
    index: usize,
    id: String,
    client: Client,
}

impl Route {
    /// Stable route name for logs and health reports (never the proxy credentials).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// HTTP client bound to this route.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[derive(Debug, Default)]
struct RouteState {
    healthy: bool,
    consecutive_failures: u32,
    successes: u64,
    failures: u64,
}

/// Snapshot of one route for introspection.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteHealth {
    pub id: String,
    pub healthy: bool,
    pub consecutive_failures: u32,
    pub successes: u64,
    pub failures: u64,
}

/// Lightweight reachability check used to restore retired routes.
#[async_trait]
pub trait RouteProbe: Send + Sync {
    async fn probe(&self, route: &Route) -> bool;
}

/// Probe that issues a GET to a fixed URL through the route.
///
/// Any HTTP response counts as success: the route delivered the request.
pub struct HttpRouteProbe {
    url: String,
}

impl HttpRouteProbe {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl RouteProbe for HttpRouteProbe {
    async fn probe(&self, route: &Route) -> bool {
        match route
            .client()
            .get(&self.url)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => {
                debug!(
                    "Egress probe via '{}' answered {}",
                    route.id(),
                    response.status()
                );
                true
            }
            Err(e) => {
                debug!("Egress probe via '{}' failed: {}", route.id(), e);
                false
            }
        }
    }
}

/// Round-robin pool of outbound routes with health tracking.
pub struct EgressPool {
    routes: Vec<Arc<Route>>,
    states: Vec<Mutex<RouteState>>,
    cursor: AtomicUsize,
    failure_threshold: u32,
}

impl EgressPool {
    /// Build a pool from proxy URLs. An empty list yields one direct route.
    pub fn new(proxies: &[String], failure_threshold: u32) -> Result<Self, EgressError> {
        let mut routes = Vec::new();

        if proxies.is_empty() {
            let client = Client::builder()
                .build()
                .map_err(|e| EgressError::Client(e.to_string()))?;
            routes.push(Route {
                index: 0,
                id: "direct".to_string(),
                client,
            });
        }

        for (index, proxy) in proxies.iter().enumerate() {
            let proxy_config =
                reqwest::Proxy::all(proxy.as_str()).map_err(|e| EgressError::InvalidProxy {
                    proxy: proxy.clone(),
                    message: e.to_string(),
                })?;
            let client = Client::builder()
                .proxy(proxy_config)
                .build()
                .map_err(|e| EgressError::Client(e.to_string()))?;
            routes.push(Route {
                index,
                id: format!("proxy-{}", index + 1),
                client,
            });
        }

        Ok(Self::from_routes(routes, failure_threshold))
    }

    /// Pool with a single direct route and default threshold.
    pub fn direct() -> Result<Self, EgressError> {
        Self::new(&[], DEFAULT_FAILURE_THRESHOLD)
    }

    fn from_routes(routes: Vec<Route>, failure_threshold: u32) -> Self {
        let states = routes
            .iter()
            .map(|_| {
                Mutex::new(RouteState {
                    healthy: true,
                    ..Default::default()
                })
            })
            .collect();

        Self {
            routes: routes.into_iter().map(Arc::new).collect(),
            states,
            cursor: AtomicUsize::new(0),
            failure_threshold: failure_threshold.max(1),
        }
    }

    fn lock_state(&self, index: usize) -> Option<MutexGuard<'_, RouteState>> {
        self.states.get(index).map(|state| {
            state.lock().unwrap_or_else(|poisoned| {
                warn!("Egress route mutex was poisoned, recovering");
                poisoned.into_inner()
            })
        })
    }

    /// Number of configured routes, healthy or not.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Pick the next healthy route, round-robin.
    ///
    /// Fails fast with `NoRouteAvailable` when every route is retired.
    pub fn next_route(&self) -> Result<Arc<Route>, ResolutionError> {
        let count = self.routes.len();
        if count == 0 {
            return Err(ResolutionError::NoRouteAvailable);
        }

        let start = self.cursor.fetch_add(1, Ordering::Relaxed);
        for offset in 0..count {
            let index = (start + offset) % count;
            let healthy = self.lock_state(index).map(|s| s.healthy).unwrap_or(false);
            if healthy {
                return Ok(Arc::clone(&self.routes[index]));
            }
        }

        warn!("Egress pool: all {} routes are retired", count);
        Err(ResolutionError::NoRouteAvailable)
    }

    /// Record a completed call through `route`.
    pub fn mark_success(&self, route: &Route) {
        if let Some(mut state) = self.lock_state(route.index) {
            state.consecutive_failures = 0;
            state.successes += 1;
        }
    }

    /// Record a failure attributed to `route`; retires it at the threshold.
    pub fn mark_failure(&self, route: &Route) {
        if let Some(mut state) = self.lock_state(route.index) {
            state.consecutive_failures += 1;
            state.failures += 1;
            if state.healthy && state.consecutive_failures >= self.failure_threshold {
                state.healthy = false;
                info!(
                    "Egress pool: retiring route '{}' after {} consecutive failures",
                    route.id, state.consecutive_failures
                );
            } else {
                debug!(
                    "Egress pool: failure on route '{}' ({}/{})",
                    route.id, state.consecutive_failures, self.failure_threshold
                );
            }
        }
    }

    fn restore(&self, route: &Route) {
        if let Some(mut state) = self.lock_state(route.index) {
            if !state.healthy {
                info!("Egress pool: restoring route '{}'", route.id);
            }
            state.healthy = true;
            state.consecutive_failures = 0;
        }
    }

    /// Probe every retired route once, restoring those that answer.
    ///
    /// Returns the number of restored routes.
    pub async fn probe_unhealthy(&self, probe: &dyn RouteProbe) -> usize {
        let retired: Vec<Arc<Route>> = self
            .routes
            .iter()
            .filter(|route| {
                self.lock_state(route.index)
                    .map(|s| !s.healthy)
                    .unwrap_or(false)
            })
            .cloned()
            .collect();

        let mut restored = 0;
        for route in retired {
            if probe.probe(&route).await {
                self.restore(&route);
                restored += 1;
            }
        }
        restored
    }

    /// Run `probe_unhealthy` periodically on the tokio runtime.
    pub fn spawn_health_probe(
        self: Arc<Self>,
        probe: Arc<dyn RouteProbe>,
        interval: Duration,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let restored = self.probe_unhealthy(probe.as_ref()).await;
                if restored > 0 {
                    debug!("Egress pool: health probe restored {} routes", restored);
                }
            }
        })
    }

    /// Route table for health reports.
    pub fn snapshot(&self) -> Vec<RouteHealth> {
        self.routes
            .iter()
            .filter_map(|route| {
                self.lock_state(route.index).map(|state| RouteHealth {
                    id: route.id.clone(),
                    healthy: state.healthy,
                    consecutive_failures: state.consecutive_failures,
                    successes: state.successes,
                    failures: state.failures,
                })
            })
            .collect()
    }

    /// Mark every route healthy and clear counters.
    pub fn reset(&self) {
        for route in &self.routes {
            if let Some(mut state) = self.lock_state(route.index) {
                *state = RouteState {
                    healthy: true,
                    ..Default::default()
                };
            }
        }
        info!("Egress pool: all routes reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    fn pool(size: usize, threshold: u32) -> EgressPool {
        let proxies: Vec<String> = (0..size)
            .map(|i| format!("http://127.0.0.1:{}", 18080 + i))
            .collect();
        EgressPool::new(&proxies, threshold).unwrap()
    }

    struct FixedProbe {
        answer: AtomicBool,
    }

    #[async_trait]
    impl RouteProbe for FixedProbe {
        async fn probe(&self, _route: &Route) -> bool {
            self.answer.load(Ordering::SeqCst)
        }
    }

    #[test]
    fn test_empty_proxy_list_is_direct() {
        let pool = EgressPool::direct().unwrap();
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.next_route().unwrap().id(), "direct");
    }

    #[test]
    fn test_invalid_proxy_rejected() {
        let result = EgressPool::new(&["not a url".to_string()], 3);
        assert!(matches!(result, Err(EgressError::InvalidProxy { .. })));
    }

    #[test]
    fn test_round_robin() {
        let pool = pool(3, 3);
        let ids: Vec<String> = (0..6)
            .map(|_| pool.next_route().unwrap().id().to_string())
            .collect();
        assert_eq!(
            ids,
            vec!["proxy-1", "proxy-2", "proxy-3", "proxy-1", "proxy-2", "proxy-3"]
        );
    }

    #[test]
    fn test_route_retired_after_consecutive_failures() {
        let pool = pool(2, 2);
        let first = pool.next_route().unwrap();

        pool.mark_failure(&first);
        pool.mark_success(&first);
        pool.mark_failure(&first);
        assert!(pool.snapshot()[0].healthy);

        pool.mark_failure(&first);
        assert!(!pool.snapshot()[0].healthy);

        // Only the second route is selected now
        for _ in 0..4 {
            assert_eq!(pool.next_route().unwrap().id(), "proxy-2");
        }
    }

    #[test]
    fn test_all_retired_fails_fast() {
        let pool = pool(1, 1);
        let route = pool.next_route().unwrap();
        pool.mark_failure(&route);

        assert_eq!(
            pool.next_route().unwrap_err(),
            ResolutionError::NoRouteAvailable
        );
    }

    #[tokio::test]
    async fn test_probe_restores_retired_routes() {
        let pool = pool(2, 1);
        let route = pool.next_route().unwrap();
        pool.mark_failure(&route);

        let probe = FixedProbe {
            answer: AtomicBool::new(false),
        };
        assert_eq!(pool.probe_unhealthy(&probe).await, 0);
        assert!(!pool.snapshot()[0].healthy);

        probe.answer.store(true, Ordering::SeqCst);
        assert_eq!(pool.probe_unhealthy(&probe).await, 1);

        let table = pool.snapshot();
        assert!(table[0].healthy);
        assert_eq!(table[0].consecutive_failures, 0);
        assert_eq!(table[0].failures, 1);
    }

    #[test]
    fn test_reset_restores_everything() {
        let pool = pool(2, 1);
        for _ in 0..2 {
            let route = pool.next_route().unwrap();
            pool.mark_failure(&route);
        }
        assert!(pool.next_route().is_err());

        pool.reset();
        assert!(pool.next_route().is_ok());
        assert!(pool.snapshot().iter().all(|r| r.failures == 0));
    }
}
