//! Nexus Registry Crate
//!
//! Business-registry access for the Nexus resolution engine: identifier
//! routing, national registry adapters, normalization into one canonical
//! record schema, and the per-provider resilience controls that guard live
//! acquisition.
//!
//! # Architecture
//!
//! ```text
//! raw query ──> CountryRouter ──> (adapter, Identifier)
//!                                        │
//!                                        v
//!                              ProviderRegistry::acquire
//!                 ┌──────────────────────┼──────────────────────┐
//!                 v                      v                      v
//!          CircuitBreaker          RateLimiter             EgressPool
//!                 └──────────────────────┼──────────────────────┘
//!                                        v
//!                          RegistryProvider::fetch (RawRecord)
//!                                        │
//!                                        v
//!                            normalizer::normalize (CanonicalRecord)
//! ```
//!
//! # Adapters
//!
//! | Id        | Country | Identifier                        |
//! |-----------|---------|-----------------------------------|
//! | `SK_RPO`  | SK      | IČO (8 digits)                    |
//! | `CZ_ARES` | CZ      | IČO (mod-11 checked), legal name  |
//! | `PL_KRS`  | PL      | KRS number (10 digits, leading 0) |
//! | `PL_WL`   | PL      | NIP (checksummed)                 |
//! | `HU_NAV`  | HU      | adószám                           |

pub mod errors;
pub mod models;
pub mod normalizer;
pub mod provider;
pub mod registry;
pub mod router;

pub use errors::{ProviderError, ResolutionError, RetryClass, TimeoutStage, UnavailableCause};
pub use models::{
    Address, Associate, AssociateRole, CanonicalRecord, Country, EntityStatus, Identifier,
    IdentifierKind, Money, Party, TaxFlags,
};
pub use provider::cz_ares::CzAresProvider;
pub use provider::debt_register::DebtRegister;
pub use provider::hu_nav::HuNavProvider;
pub use provider::pl_ceidg::PlCeidgProvider;
pub use provider::pl_krs::PlKrsProvider;
pub use provider::pl_white_list::PlWhiteListProvider;
pub use provider::sk_rpo::SkRpoProvider;
pub use provider::{ProviderCapabilities, RateLimit, RawPayload, RawRecord, RegistryProvider};
pub use registry::{
    BucketStats, CircuitBreaker, CircuitBreakerConfig, CircuitState, EgressError, EgressPool, HttpRouteProbe,
    ProviderHealth, ProviderRegistry, RateLimitConfig, RateLimiter, RegistryHealth, Route,
    RouteHealth, RouteProbe,
};
pub use router::CountryRouter;
