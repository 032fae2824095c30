//! Polish provider: KRS open API (api-krs.ms.gov.pl).
//!
//! Register of entrepreneurs (`rejestr=P`) current extract by KRS number.

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

use models::KrsResponse;

pub const PROVIDER_ID: &str = "PL_KRS";
const BASE_URL: &str = "https://api-krs.ms.gov.pl/api/krs";

/// Polish KRS provider.
pub struct PlKrsProvider {
    base_url: String,
}

impl PlKrsProvider {
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

impl Default for PlKrsProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RegistryProvider for PlKrsProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn country(&self) -> Country {
        Country::Pl
    }

    fn priority(&self) -> u8 {
        20
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            identifier_kinds: &[IdentifierKind::RegistrationNumber],
            supports_associates: true,
            supports_debts: false,
        }
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit {
            requests_per_minute: 30,
            burst: 5,
        }
    }

    fn classify(&self, raw: &str) -> Option<Identifier> {
        validators::digits(raw, 10)
            .filter(|krs| validators::pl_krs_shape(krs))
            .map(|krs| Identifier::registration(Country::Pl, krs))
    }

    async fn fetch(
        &self,
        identifier: &Identifier,
        route: &Route,
    ) -> Result<RawRecord, ProviderError> {
        let url = format!(
            "{}/OdpisAktualny/{}",
            self.base_url.trim_end_matches('/'),
            identifier.value
        );
        debug!(provider = PROVIDER_ID, route = route.id(), krs = %identifier.value, "KRS lookup");

        let request = route
            .client()
            .get(url)
            .query(&[("rejestr", "P"), ("format", "json")]);
        let limits = CallLimits {
            provider: PROVIDER_ID,
            timeout: self.timeout(),
            max_bytes: self.max_response_bytes(),
        };
        let response = send_json::<KrsResponse>(request, limits)
            .await?
            .ok_or_else(|| ProviderError::NotFound {
                provider: PROVIDER_ID.to_string(),
                identifier: identifier.key(),
            })?;

        Ok(RawRecord {
            identifier: identifier.clone(),
            provider: PROVIDER_ID,
            fetched_at: Utc::now(),
            payload: RawPayload::PlKrs(Box::new(response.odpis)),
            debts: None,
        })
    }
}
