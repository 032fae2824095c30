//! Polish provider: Biała Lista (wl-api.mf.gov.pl).
//!
//! Looks taxpayers up by NIP. Answers VAT status and representatives, which
//! is enough for a canonical record when no KRS number is known.

pub mod models;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use crate::errors::ProviderError;
use crate::models::{Country, Identifier, IdentifierKind};
use crate::provider::http::{send_json, CallLimits};
use crate::provider::raw::{RawPayload, RawRecord};
use crate::provider::{ProviderCapabilities, RateLimit, RegistryProvider};
use crate::registry::Route;
use crate::router::validators;

use models::WlResponse;

pub const PROVIDER_ID: &str = "PL_WL";
const BASE_URL: &str = "https://wl-api.mf.gov.pl";

/// Polish White List provider.
pub struct PlWhiteListProvider {
    base_url: String,
}

impl PlWhiteListProvider {
    pub fn new() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
        }
    }

    /// Override the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Default for PlWhiteListProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RegistryProvider for PlWhiteListProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn country(&self) -> Country {
        Country::Pl
    }

    fn priority(&self) -> u8 {
        21
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            identifier_kinds: &[IdentifierKind::TaxNumber],
            supports_associates: true,
            supports_debts: false,
        }
    }

    fn rate_limit(&self) -> RateLimit {
        // The search pool allows 100 queries a day per IP
        RateLimit {
            requests_per_minute: 10,
            burst: 5,
        }
    }

    fn classify(&self, raw: &str) -> Option<Identifier> {
        validators::digits(raw, 10)
            .filter(|nip| validators::pl_nip_checksum(nip))
            .map(|nip| Identifier::new(Country::Pl, IdentifierKind::TaxNumber, nip))
    }

    async fn fetch(
        &self,
        identifier: &Identifier,
        route: &Route,
    ) -> Result<RawRecord, ProviderError> {
        let url = format!(
            "{}/api/search/nip/{}",
            self.base_url.trim_end_matches('/'),
            identifier.value
        );
        let today = Utc::now().format("%Y-%m-%d").to_string();
        debug!(provider = PROVIDER_ID, route = route.id(), nip = %identifier.value, "White List lookup");

        let limits = CallLimits {
            provider: PROVIDER_ID,
            timeout: self.timeout(),
            max_bytes: self.max_response_bytes(),
        };
        let response: Option<WlResponse> = send_json(
            route.client().get(url).query(&[("date", today.as_str())]),
            limits,
        )
        .await?;

        let subject = response
            .and_then(|r| r.result.subject)
            .ok_or_else(|| ProviderError::NotFound {
                provider: PROVIDER_ID.to_string(),
                identifier: identifier.key(),
            })?;

        Ok(RawRecord {
            identifier: identifier.clone(),
            provider: PROVIDER_ID,
            fetched_at: Utc::now(),
            payload: RawPayload::PlWhiteList(Box::new(subject)),
            debts: None,
        })
    }
}
