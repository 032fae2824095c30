//! Provider capabilities and outbound rate limits.

use serde::Serialize;

use crate::models::IdentifierKind;

/// Describes the capabilities of a registry provider.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCapabilities {
    /// Identifier kinds this provider can look up.
    pub identifier_kinds: &'static [IdentifierKind],

    /// Whether records include statutory bodies and owners.
    pub supports_associates: bool,

    /// Whether the provider consults a tax debtor list.
    pub supports_debts: bool,
}

/// Outbound rate limit for a provider.
///
/// Controls how aggressively we call a registry to avoid getting blocked.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimit {
    /// Steady-state requests allowed per minute.
    pub requests_per_minute: u32,

    /// Calls that may be made back to back.
    pub burst: u32,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            requests_per_minute: 60,
            burst: 10,
        }
    }
}
