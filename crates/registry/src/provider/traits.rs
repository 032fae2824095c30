//! Registry provider trait definitions.
//!
//! This module defines the `RegistryProvider` trait that every national
//! registry adapter implements.

use std::time::Duration;

use async_trait::async_trait;

use crate::errors::ProviderError;
use crate::models::{Country, Identifier};
use crate::registry::Route;

use super::capabilities::{ProviderCapabilities, RateLimit};
use super::raw::RawRecord;

/// Default per-call timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default upper bound for a response body.
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 2 * 1024 * 1024;

/// Trait for business-registry providers.
///
/// Implement this trait to add support for a new national source. The
/// router uses `classify` to pick an adapter for a raw query; the registry
/// wraps `fetch` with circuit breaking, outbound rate limiting, egress
/// selection and the adapter's own timeout.
///
/// Adapters must not retry internally.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use nexus_registry::provider::{ProviderCapabilities, RateLimit, RegistryProvider};
///
/// struct AtRegister;
///
/// #[async_trait]
/// impl RegistryProvider for AtRegister {
///     fn id(&self) -> &'static str {
///         "AT_FIRMENBUCH"
///     }
///
///     fn classify(&self, raw: &str) -> Option<Identifier> {
///         // structural check only, no I/O
///     }
///
///     // ... capabilities, rate_limit, fetch
/// }
/// ```
#[async_trait]
pub trait RegistryProvider: Send + Sync {
    /// Unique identifier for this provider.
    ///
    /// A constant string like "SK_RPO" or "CZ_ARES". Used for logging,
    /// circuit breaker tracking and health reports.
    fn id(&self) -> &'static str;

    /// Jurisdiction this provider answers for.
    fn country(&self) -> Country;

    /// Classification priority. Lower values are tried first. Default is 50.
    fn priority(&self) -> u8 {
        50
    }

    /// Describes what this provider can do.
    fn capabilities(&self) -> ProviderCapabilities;

    /// Outbound limits the registry should respect for this provider.
    fn rate_limit(&self) -> RateLimit {
        RateLimit::default()
    }

    /// Per-call timeout.
    fn timeout(&self) -> Duration {
        DEFAULT_TIMEOUT
    }

    /// Largest response body the adapter accepts.
    fn max_response_bytes(&self) -> usize {
        DEFAULT_MAX_RESPONSE_BYTES
    }

    /// Parse a raw query into this provider's identifier, if its shape fits.
    ///
    /// Purely structural: digit counts, prefixes, checksums. Never does I/O.
    fn classify(&self, raw: &str) -> Option<Identifier>;

    /// Whether `raw` has a shape this provider accepts.
    fn validate(&self, raw: &str) -> bool {
        self.classify(raw).is_some()
    }

    /// Fetch the raw record for one entity through the given egress route.
    async fn fetch(&self, identifier: &Identifier, route: &Route)
        -> Result<RawRecord, ProviderError>;
}
