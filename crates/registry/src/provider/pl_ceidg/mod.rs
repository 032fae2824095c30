//! Polish provider: CEIDG (dane.biznes.gov.pl).
//!
//! Sole traders are not in KRS and many are missing from the VAT white
//! list, so this adapter answers NIP lookups the white list does not know.
//! The API needs a bearer token.

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

use models::CeidgResponse;

pub const PROVIDER_ID: &str = "PL_CEIDG";
const BASE_URL: &str = "https://dane.biznes.gov.pl/api/ceidg/v2";

/// Polish CEIDG provider.
pub struct PlCeidgProvider {
    base_url: String,
    api_token: String,
}

impl PlCeidgProvider {
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            api_token: api_token.into(),
        }
    }

    /// Override the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl RegistryProvider for PlCeidgProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn country(&self) -> Country {
        Country::Pl
    }

    fn priority(&self) -> u8 {
        22
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            identifier_kinds: &[IdentifierKind::TaxNumber],
            supports_associates: true,
            supports_debts: false,
        }
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit {
            requests_per_minute: 50,
            burst: 10,
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
        let url = format!("{}/firmy", self.base_url.trim_end_matches('/'));
        debug!(provider = PROVIDER_ID, route = route.id(), nip = %identifier.value, "CEIDG lookup");

        let limits = CallLimits {
            provider: PROVIDER_ID,
            timeout: self.timeout(),
            max_bytes: self.max_response_bytes(),
        };
        let request = route
            .client()
            .get(url)
            .bearer_auth(&self.api_token)
            .query(&[("nip", identifier.value.as_str())]);
        let firms = send_json::<CeidgResponse>(request, limits)
            .await?
            .map(|r| r.firmy)
            .unwrap_or_default();

        // one NIP may carry earlier, deregistered entries; prefer the live one
        let firm = firms
            .iter()
            .find(|f| f.is_active())
            .or_else(|| firms.first())
            .cloned()
            .ok_or_else(|| ProviderError::NotFound {
                provider: PROVIDER_ID.to_string(),
                identifier: identifier.key(),
            })?;

        Ok(RawRecord {
            identifier: identifier.clone(),
            provider: PROVIDER_ID,
            fetched_at: Utc::now(),
            payload: RawPayload::PlCeidg(Box::new(firm)),
            debts: None,
        })
    }
}
