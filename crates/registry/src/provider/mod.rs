//! Business-registry provider abstractions and implementations.
//!
//! This module contains:
//! - The `RegistryProvider` trait that all adapters implement
//! - Provider capabilities and outbound rate limits
//! - Raw (pre-normalization) record shapes
//! - Concrete adapters (SK RPO, CZ ARES, PL KRS, PL White List, PL CEIDG,
//!   HU NAV) and the SK/CZ debtor lists
//!
//! # Architecture
//!
//! Adapters only know how to recognise an identifier's shape and fetch one
//! raw record. They do not retry, cache or normalize; the registry owns
//! resilience and the normalizer owns the canonical schema.

mod capabilities;
pub(crate) mod http;
mod raw;
mod traits;

pub mod cz_ares;
pub mod debt_register;
pub mod hu_nav;
pub mod pl_ceidg;
pub mod pl_krs;
pub mod pl_white_list;
pub mod sk_rpo;

pub use capabilities::{ProviderCapabilities, RateLimit};
pub use raw::{RawPayload, RawRecord};
pub use traits::{RegistryProvider, DEFAULT_MAX_RESPONSE_BYTES, DEFAULT_TIMEOUT};
