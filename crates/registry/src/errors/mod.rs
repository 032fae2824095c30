//! Error types and retry classification for the registry crate.
//!
//! This module provides:
//! - [`ProviderError`]: The adapter contract error, returned by a single provider call
//! - [`ResolutionError`]: The caller-facing taxonomy for a whole resolution
//! - [`RetryClass`]: Classification for determining retry behavior

mod retry;

pub use retry::RetryClass;

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Why a provider was reported unavailable.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableCause {
    /// The upstream answered with a server error.
    Upstream,
    /// The request never completed (connect/proxy/IO failure).
    Transport,
    /// The adapter-level timeout elapsed.
    Timeout,
}

/// Errors a provider adapter may return for one fetch.
///
/// Adapters never retry internally; the registry records the outcome in the
/// circuit breaker and egress pool and hands the error to the caller.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum ProviderError {
    /// The provider confirmed the entity does not exist.
    #[error("Entity not found: {provider} - {identifier}")]
    NotFound {
        /// The provider that answered
        provider: String,
        /// The identifier key that was looked up
        identifier: String,
    },

    /// The upstream rate limited the request (HTTP 429).
    #[error("Rate limited by upstream: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
    },

    /// Transient failure reaching or using the provider.
    #[error("Provider unavailable: {provider} - {message}")]
    Unavailable {
        /// The provider that failed
        provider: String,
        /// Where the failure happened
        cause: UnavailableCause,
        /// Human-readable detail
        message: String,
    },

    /// The provider answered with something that violates its contract.
    #[error("Malformed response: {provider} - {message}")]
    MalformedResponse {
        /// The provider that answered
        provider: String,
        /// Description of the violation
        message: String,
    },
}

impl ProviderError {
    pub(crate) fn unavailable(
        provider: &str,
        cause: UnavailableCause,
        message: impl Into<String>,
    ) -> Self {
        Self::Unavailable {
            provider: provider.to_string(),
            cause,
            message: message.into(),
        }
    }

    pub(crate) fn malformed(provider: &str, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            provider: provider.to_string(),
            message: message.into(),
        }
    }

    /// The provider this error came from.
    pub fn provider(&self) -> &str {
        match self {
            Self::NotFound { provider, .. }
            | Self::RateLimited { provider }
            | Self::Unavailable { provider, .. }
            | Self::MalformedResponse { provider, .. } => provider,
        }
    }

    /// Whether this outcome should be recorded as a circuit breaker failure.
    ///
    /// A confirmed `NotFound` is a healthy answer from the provider.
    pub fn counts_as_provider_failure(&self) -> bool {
        !matches!(self, Self::NotFound { .. })
    }

    /// Whether the failure is attributable to the egress route rather than the provider.
    ///
    /// Only a request that never reached the upstream counts. A slow answer
    /// is the provider's fault and must not retire a route other providers share.
    pub fn is_route_fault(&self) -> bool {
        matches!(
            self,
            Self::Unavailable {
                cause: UnavailableCause::Transport,
                ..
            }
        )
    }
}

/// Which layer of the layered timeouts expired.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutStage {
    /// The whole single-entity resolution, including queueing behind a duplicate.
    Resolve,
    /// The whole multi-entity graph traversal.
    Graph,
}

impl fmt::Display for TimeoutStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolve => write!(f, "resolve"),
            Self::Graph => write!(f, "graph"),
        }
    }
}

/// Errors surfaced to callers of the resolution engine.
///
/// `Clone` so a single in-flight acquisition can notify every waiter with
/// the same outcome.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum ResolutionError {
    /// No adapter accepted the query. No I/O was attempted.
    #[error("Unrecognized identifier: {0}")]
    UnrecognizedIdentifier(String),

    /// A caller tier, a provider's outbound budget, or the upstream itself rejected the call.
    #[error("Rate limited: {scope}")]
    RateLimited {
        /// What was exhausted, e.g. `tier:free` or `provider:SK_RPO`
        scope: String,
        /// Suggested wait before retrying
        retry_after: Duration,
    },

    /// The provider's circuit is open; the call was short-circuited.
    #[error("Circuit open: {provider}")]
    CircuitOpen {
        /// The provider with an open circuit
        provider: String,
        /// Time left in the current cool-down
        retry_after: Duration,
    },

    /// The provider confirmed the entity does not exist.
    #[error("Entity not found: {identifier}")]
    NotFound {
        /// The identifier key that was looked up
        identifier: String,
    },

    /// Transient provider failure.
    #[error("Provider unavailable: {provider} - {message}")]
    Unavailable {
        /// The provider that failed
        provider: String,
        /// Human-readable detail
        message: String,
    },

    /// Every egress route is currently retired.
    #[error("No egress route available")]
    NoRouteAvailable,

    /// Provider contract violation. Never coerced into a partial record.
    #[error("Malformed response from {provider}: {message}")]
    MalformedResponse {
        /// The provider that answered
        provider: String,
        /// Description of the violation
        message: String,
    },

    /// A pipeline- or graph-level timeout expired.
    #[error("Timed out during {stage}")]
    Timeout {
        /// Which layer expired
        stage: TimeoutStage,
    },
}

impl ResolutionError {
    /// Returns the retry classification for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use nexus_registry::errors::{ResolutionError, RetryClass};
    ///
    /// let error = ResolutionError::NoRouteAvailable;
    /// assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    ///
    /// let error = ResolutionError::UnrecognizedIdentifier("???".to_string());
    /// assert_eq!(error.retry_class(), RetryClass::Never);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::UnrecognizedIdentifier(_)
            | Self::NotFound { .. }
            | Self::MalformedResponse { .. } => RetryClass::Never,

            Self::RateLimited { .. }
            | Self::Unavailable { .. }
            | Self::NoRouteAvailable
            | Self::Timeout { .. } => RetryClass::WithBackoff,

            Self::CircuitOpen { .. } => RetryClass::CircuitOpen,
        }
    }

    /// Stable snake_case name of the variant, for logs and search history.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnrecognizedIdentifier(_) => "unrecognized_identifier",
            Self::RateLimited { .. } => "rate_limited",
            Self::CircuitOpen { .. } => "circuit_open",
            Self::NotFound { .. } => "not_found",
            Self::Unavailable { .. } => "unavailable",
            Self::NoRouteAvailable => "no_route_available",
            Self::MalformedResponse { .. } => "malformed_response",
            Self::Timeout { .. } => "timeout",
        }
    }

    /// Suggested wait before retrying, when the error carries one.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } | Self::CircuitOpen { retry_after, .. } => {
                Some(*retry_after)
            }
            _ => None,
        }
    }
}

/// Upstream 429s carry no hint; callers are told to wait a minute.
const UPSTREAM_RETRY_AFTER: Duration = Duration::from_secs(60);

impl From<ProviderError> for ResolutionError {
    fn from(error: ProviderError) -> Self {
        match error {
            ProviderError::NotFound { identifier, .. } => Self::NotFound { identifier },
            ProviderError::RateLimited { provider } => Self::RateLimited {
                scope: format!("upstream:{}", provider),
                retry_after: UPSTREAM_RETRY_AFTER,
            },
            ProviderError::Unavailable {
                provider, message, ..
            } => Self::Unavailable { provider, message },
            ProviderError::MalformedResponse { provider, message } => {
                Self::MalformedResponse { provider, message }
            }
        }
    }
}
