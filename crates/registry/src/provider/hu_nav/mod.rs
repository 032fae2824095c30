//! Hungarian provider: NAV taxpayer query.
//!
//! NAV's own interface is signed XML; the engine talks to a JSON gateway that
//! fronts it (`GET {base}/taxpayers/{first 8 digits}`).

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

use models::NavTaxpayerResponse;

pub const PROVIDER_ID: &str = "HU_NAV";
const BASE_URL: &str = "http://localhost:8091/nav";

/// Hungarian NAV provider.
pub struct HuNavProvider {
    base_url: String,
}

impl HuNavProvider {
    pub fn new() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
        }
    }

    /// Override the gateway base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Default for HuNavProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RegistryProvider for HuNavProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn country(&self) -> Country {
        Country::Hu
    }

    fn priority(&self) -> u8 {
        10
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
            requests_per_minute: 60,
            burst: 10,
        }
    }

    fn classify(&self, raw: &str) -> Option<Identifier> {
        validators::hu_tax_number(raw)
            .map(|number| Identifier::new(Country::Hu, IdentifierKind::TaxNumber, number))
    }

    async fn fetch(
        &self,
        identifier: &Identifier,
        route: &Route,
    ) -> Result<RawRecord, ProviderError> {
        let taxpayer_id = identifier.value.get(..8).unwrap_or(&identifier.value);
        let url = format!(
            "{}/taxpayers/{}",
            self.base_url.trim_end_matches('/'),
            taxpayer_id
        );
        debug!(provider = PROVIDER_ID, route = route.id(), taxpayer_id, "NAV lookup");

        let limits = CallLimits {
            provider: PROVIDER_ID,
            timeout: self.timeout(),
            max_bytes: self.max_response_bytes(),
        };
        let response = send_json::<NavTaxpayerResponse>(route.client().get(url), limits)
            .await?
            .filter(|r| r.taxpayer_data.is_some())
            .ok_or_else(|| ProviderError::NotFound {
                provider: PROVIDER_ID.to_string(),
                identifier: identifier.key(),
            })?;

        Ok(RawRecord {
            identifier: identifier.clone(),
            provider: PROVIDER_ID,
            fetched_at: Utc::now(),
            payload: RawPayload::HuNav(Box::new(response)),
            debts: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_adoszam() {
        let provider = HuNavProvider::new();
        let identifier = provider.classify("10773381-2-44").unwrap();

        assert_eq!(identifier.country, Country::Hu);
        assert_eq!(identifier.kind, IdentifierKind::TaxNumber);
        assert_eq!(identifier.value, "10773381244");
    }

    #[test]
    fn test_rejects_eight_digit_ico() {
        assert!(!HuNavProvider::new().validate("88888888"));
    }
}
