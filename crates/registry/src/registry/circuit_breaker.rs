//! Per-provider circuit breaker for fault tolerance.
//!
//! Implements the circuit breaker pattern so a degraded registry cannot
//! exhaust callers' latency budget. The circuit has three states:
//!
//! - **Closed**: Normal operation, calls pass through and failures are counted
//!   in a sliding window.
//! - **Open**: The provider is failing, calls short-circuit without I/O.
//! - **HalfOpen**: The cool-down elapsed; exactly one probe call is in flight.
//!
//! A failed probe reopens the circuit with a longer cool-down (up to a cap).
//! State is in-memory and lives until an explicit reset or process restart.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;

/// Default number of failures in the window before opening the circuit.
const DEFAULT_FAILURE_THRESHOLD: u32 = 5;

/// Default sliding window for counting failures.
const DEFAULT_FAILURE_WINDOW: Duration = Duration::from_secs(60);

/// Default time to wait before letting a probe through.
const DEFAULT_COOLDOWN: Duration = Duration::from_secs(60);

/// Default upper bound for the grown cool-down.
const DEFAULT_MAX_COOLDOWN: Duration = Duration::from_secs(600);

/// Default time after which an unreported probe is considered abandoned.
const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Circuit breaker state.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub enum CircuitState {
    /// Normal operation - calls are allowed.
    Closed,
    /// Provider is failing - calls are blocked.
    Open,
    /// Testing recovery - a single probe is allowed.
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "Closed"),
            Self::Open => write!(f, "Open"),
            Self::HalfOpen => write!(f, "HalfOpen"),
        }
    }
}

/// What the breaker allowed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CallPermit {
    /// Circuit is closed.
    Granted,
    /// This call is the single Half-Open trial. Its outcome must be reported
    /// with `record_success`/`record_failure`, or handed back with `release`.
    Probe,
}

/// Circuit breaker configuration.
#[derive(Clone, Debug)]
pub struct CircuitBreakerConfig {
    /// Number of failures inside `failure_window` that opens the circuit.
    pub failure_threshold: u32,
    /// Sliding window for counting failures.
    pub failure_window: Duration,
    /// Initial Open -> HalfOpen wait.
    pub cooldown: Duration,
    /// Factor applied to the cool-down after each failed probe.
    pub backoff_multiplier: f64,
    /// Cap for the grown cool-down.
    pub max_cooldown: Duration,
    /// A probe that never reports back frees its slot after this long.
    pub probe_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            failure_window: DEFAULT_FAILURE_WINDOW,
            cooldown: DEFAULT_COOLDOWN,
            backoff_multiplier: 2.0,
            max_cooldown: DEFAULT_MAX_COOLDOWN,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }
}

/// Internal circuit state for a single provider.
#[derive(Debug)]
struct Circuit {
    state: CircuitState,
    /// Timestamps of failures still inside the window.
    window: VecDeque<Instant>,
    consecutive_failures: u32,
    /// Cool-down that applies to the current (or next) Open period.
    cooldown: Duration,
    opened_at: Option<Instant>,
    probe_started: Option<Instant>,
    last_state_change: Option<DateTime<Utc>>,
}

impl Circuit {
    fn new(cooldown: Duration) -> Self {
        Self {
            state: CircuitState::Closed,
            window: VecDeque::new(),
            consecutive_failures: 0,
            cooldown,
            opened_at: None,
            probe_started: None,
            last_state_change: None,
        }
    }

    fn transition(&mut self, state: CircuitState) {
        self.state = state;
        self.last_state_change = Some(Utc::now());
    }

    fn prune(&mut self, now: Instant, window: Duration) {
        while let Some(oldest) = self.window.front() {
            if now.duration_since(*oldest) > window {
                self.window.pop_front();
            } else {
                break;
            }
        }
    }

    fn remaining_cooldown(&self, now: Instant) -> Duration {
        self.opened_at
            .map(|opened| self.cooldown.saturating_sub(now.duration_since(opened)))
            .unwrap_or(Duration::ZERO)
    }
}

/// Per-provider circuit breaker.
///
/// Each provider owns its own lock so that providers never contend with each
/// other; the outer map is only written when a provider is first seen.
pub struct CircuitBreaker {
    circuits: RwLock<HashMap<String, Arc<Mutex<Circuit>>>>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    /// Create a new circuit breaker with default settings.
    pub fn new() -> Self {
        Self::with_config(CircuitBreakerConfig::default())
    }

    /// Create a circuit breaker with custom configuration.
    pub fn with_config(config: CircuitBreakerConfig) -> Self {
        Self {
            circuits: RwLock::new(HashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Get (or create) the circuit for a provider.
    fn circuit(&self, provider: &str) -> Arc<Mutex<Circuit>> {
        {
            let circuits = self.circuits.read().unwrap_or_else(|poisoned| {
                warn!("Circuit breaker map lock was poisoned, recovering");
                poisoned.into_inner()
            });
            if let Some(circuit) = circuits.get(provider) {
                return Arc::clone(circuit);
            }
        }

        let mut circuits = self.circuits.write().unwrap_or_else(|poisoned| {
            warn!("Circuit breaker map lock was poisoned, recovering");
            poisoned.into_inner()
        });
        Arc::clone(
            circuits
                .entry(provider.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(Circuit::new(self.config.cooldown)))),
        )
    }

    /// Lock a circuit, recovering from poison if necessary.
    ///
    /// The worst case after recovery is slightly incorrect circuit state,
    /// which is better than panicking.
    fn lock(circuit: &Mutex<Circuit>) -> MutexGuard<'_, Circuit> {
        circuit.lock().unwrap_or_else(|poisoned| {
            warn!("Circuit breaker mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Ask whether a call to `provider` may proceed.
    ///
    /// Returns the time left before a call could be allowed when the circuit
    /// is Open, or when a Half-Open probe is already in flight.
    ///
    /// This method also handles the Open -> HalfOpen transition once the
    /// cool-down has elapsed.
    pub fn try_acquire(&self, provider: &str) -> Result<CallPermit, Duration> {
        let circuit = self.circuit(provider);
        let mut circuit = Self::lock(&circuit);
        let now = Instant::now();

        match circuit.state {
            CircuitState::Closed => Ok(CallPermit::Granted),
            CircuitState::Open => {
                let remaining = circuit.remaining_cooldown(now);
                if remaining > Duration::ZERO {
                    return Err(remaining);
                }
                info!(
                    "Circuit breaker: transitioning '{}' from Open to HalfOpen",
                    provider
                );
                circuit.transition(CircuitState::HalfOpen);
                circuit.probe_started = Some(now);
                Ok(CallPermit::Probe)
            }
            CircuitState::HalfOpen => match circuit.probe_started {
                Some(started) if now.duration_since(started) < self.config.probe_timeout => {
                    debug!(
                        "Circuit breaker: probe already in flight for '{}'",
                        provider
                    );
                    Err(self.config.probe_timeout - now.duration_since(started))
                }
                _ => {
                    debug!("Circuit breaker: starting probe for '{}'", provider);
                    circuit.probe_started = Some(now);
                    Ok(CallPermit::Probe)
                }
            },
        }
    }

    /// Hand back a probe slot without an outcome (the call never reached the
    /// provider, e.g. it was rate limited or had no egress route).
    pub fn release(&self, provider: &str) {
        let circuit = self.circuit(provider);
        let mut circuit = Self::lock(&circuit);
        if circuit.state == CircuitState::HalfOpen {
            circuit.probe_started = None;
        }
    }

    /// Record a successful call for a provider.
    ///
    /// In Closed state: clears the failure window.
    /// In HalfOpen state: closes the circuit and restores the base cool-down.
    pub fn record_success(&self, provider: &str) {
        let circuit = self.circuit(provider);
        let mut circuit = Self::lock(&circuit);

        match circuit.state {
            CircuitState::Closed => {
                circuit.window.clear();
                circuit.consecutive_failures = 0;
                debug!(
                    "Circuit breaker: success for '{}', failure count reset",
                    provider
                );
            }
            CircuitState::HalfOpen => {
                info!(
                    "Circuit breaker: closing circuit for '{}' after successful probe",
                    provider
                );
                circuit.transition(CircuitState::Closed);
                circuit.window.clear();
                circuit.consecutive_failures = 0;
                circuit.cooldown = self.config.cooldown;
                circuit.opened_at = None;
                circuit.probe_started = None;
            }
            CircuitState::Open => {
                // A call granted before the circuit opened finished late
                debug!(
                    "Circuit breaker: late success for '{}' in Open state",
                    provider
                );
            }
        }
    }

    /// Record a failed call for a provider.
    ///
    /// Opens the circuit when the failures inside the window reach the
    /// threshold. In HalfOpen state, the failed probe reopens the circuit with
    /// a grown cool-down.
    pub fn record_failure(&self, provider: &str) {
        let circuit = self.circuit(provider);
        let mut circuit = Self::lock(&circuit);
        let now = Instant::now();

        circuit.consecutive_failures = circuit.consecutive_failures.saturating_add(1);
        circuit.window.push_back(now);
        circuit.prune(now, self.config.failure_window);

        match circuit.state {
            CircuitState::Closed => {
                let failures = circuit.window.len() as u32;
                if failures >= self.config.failure_threshold {
                    info!(
                        "Circuit breaker: opening circuit for '{}' after {} failures",
                        provider, failures
                    );
                    circuit.transition(CircuitState::Open);
                    circuit.opened_at = Some(now);
                } else {
                    debug!(
                        "Circuit breaker: failure for '{}' ({}/{})",
                        provider, failures, self.config.failure_threshold
                    );
                }
            }
            CircuitState::HalfOpen => {
                let grown = circuit.cooldown.mul_f64(self.config.backoff_multiplier.max(1.0));
                circuit.cooldown = grown.min(self.config.max_cooldown);
                info!(
                    "Circuit breaker: reopening circuit for '{}' after failed probe, cool-down {:?}",
                    provider, circuit.cooldown
                );
                circuit.transition(CircuitState::Open);
                circuit.opened_at = Some(now);
                circuit.probe_started = None;
            }
            CircuitState::Open => {
                debug!(
                    "Circuit breaker: additional failure for '{}' (already open)",
                    provider
                );
            }
        }
    }

    /// Get the current state for a provider.
    pub fn state(&self, provider: &str) -> CircuitState {
        self.snapshot(provider)
            .map(|m| m.state)
            .unwrap_or(CircuitState::Closed)
    }

    /// Get the consecutive failure count for a provider.
    pub fn failure_count(&self, provider: &str) -> u32 {
        self.snapshot(provider)
            .map(|m| m.consecutive_failures)
            .unwrap_or(0)
    }

    /// Reset the circuit for a provider to Closed state.
    pub fn reset(&self, provider: &str) {
        let circuits = self.circuits.read().unwrap_or_else(|poisoned| {
            warn!("Circuit breaker map lock was poisoned, recovering");
            poisoned.into_inner()
        });
        if let Some(circuit) = circuits.get(provider) {
            info!(
                "Circuit breaker: manually resetting circuit for '{}'",
                provider
            );
            let mut circuit = Self::lock(circuit);
            *circuit = Circuit::new(self.config.cooldown);
            circuit.last_state_change = Some(Utc::now());
        }
    }

    /// Reset all circuits to their initial state.
    pub fn reset_all(&self) {
        let mut circuits = self.circuits.write().unwrap_or_else(|poisoned| {
            warn!("Circuit breaker map lock was poisoned, recovering");
            poisoned.into_inner()
        });
        circuits.clear();
        info!("Circuit breaker: all circuits reset");
    }

    fn snapshot(&self, provider: &str) -> Option<CircuitMetrics> {
        let circuits = self.circuits.read().unwrap_or_else(|poisoned| {
            warn!("Circuit breaker map lock was poisoned, recovering");
            poisoned.into_inner()
        });
        circuits
            .get(provider)
            .map(|circuit| Self::metrics_of(provider, &Self::lock(circuit)))
    }

    fn metrics_of(provider: &str, circuit: &Circuit) -> CircuitMetrics {
        let retry_after = match circuit.state {
            CircuitState::Open => Some(circuit.remaining_cooldown(Instant::now())),
            _ => None,
        };
        CircuitMetrics {
            provider: provider.to_string(),
            state: circuit.state,
            consecutive_failures: circuit.consecutive_failures,
            window_failures: circuit.window.len() as u32,
            cooldown: circuit.cooldown,
            retry_after,
            last_state_change: circuit.last_state_change,
        }
    }

    /// Metrics for one provider, with defaults for a provider never called.
    pub fn metrics_for(&self, provider: &str) -> CircuitMetrics {
        self.snapshot(provider).unwrap_or_else(|| {
            Self::metrics_of(provider, &Circuit::new(self.config.cooldown))
        })
    }

    /// Get metrics for all tracked providers.
    pub fn metrics(&self) -> Vec<CircuitMetrics> {
        let circuits = self.circuits.read().unwrap_or_else(|poisoned| {
            warn!("Circuit breaker map lock was poisoned, recovering");
            poisoned.into_inner()
        });

        circuits
            .iter()
            .map(|(provider, circuit)| Self::metrics_of(provider, &Self::lock(circuit)))
            .collect()
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}

/// Metrics for a single circuit.
#[derive(Clone, Debug)]
pub struct CircuitMetrics {
    pub provider: String,
    pub state: CircuitState,
    pub consecutive_failures: u32,
    /// Failures still inside the sliding window.
    pub window_failures: u32,
    /// Cool-down that applies to the current or next Open period.
    pub cooldown: Duration,
    /// Remaining cool-down while Open.
    pub retry_after: Option<Duration>,
    pub last_state_change: Option<DateTime<Utc>>,
}
