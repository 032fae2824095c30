//! Slovak provider: Register právnických osôb (RPO) of the Statistical Office.
//!
//! Looks entities up by IČO through the public RPO API and, when a debtor
//! list is configured, attaches listed tax arrears from Finančná správa SR.

pub mod models;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, warn};

use crate::errors::ProviderError;
use crate::models::{Country, Identifier, IdentifierKind};
use crate::provider::debt_register::DebtRegister;
use crate::provider::http::{send_json, CallLimits};
use crate::provider::raw::{RawPayload, RawRecord};
use crate::provider::{ProviderCapabilities, RateLimit, RegistryProvider};
use crate::registry::Route;
use crate::router::validators;

use models::RpoSearchResponse;

pub const PROVIDER_ID: &str = "SK_RPO";
const BASE_URL: &str = "https://api.statistics.sk/rpo/v1";

/// Slovak RPO provider.
pub struct SkRpoProvider {
    base_url: String,
    debts: Option<DebtRegister>,
}

impl SkRpoProvider {
    pub fn new() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            debts: None,
        }
    }

    /// Override the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Consult the Slovak debtor list after each lookup.
    pub fn with_debt_register(mut self, debts: DebtRegister) -> Self {
        self.debts = Some(debts);
        self
    }

    fn limits(&self) -> CallLimits {
        CallLimits {
            provider: PROVIDER_ID,
            timeout: self.timeout(),
            max_bytes: self.max_response_bytes(),
        }
    }
}

impl Default for SkRpoProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RegistryProvider for SkRpoProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn country(&self) -> Country {
        Country::Sk
    }

    fn priority(&self) -> u8 {
        40
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            identifier_kinds: &[IdentifierKind::RegistrationNumber],
            supports_associates: true,
            supports_debts: self.debts.is_some(),
        }
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit {
            requests_per_minute: 60,
            burst: 10,
        }
    }

    fn classify(&self, raw: &str) -> Option<Identifier> {
        validators::digits(raw, 8).map(|ico| Identifier::registration(Country::Sk, ico))
    }

    async fn fetch(
        &self,
        identifier: &Identifier,
        route: &Route,
    ) -> Result<RawRecord, ProviderError> {
        let url = format!("{}/search", self.base_url.trim_end_matches('/'));
        debug!(provider = PROVIDER_ID, route = route.id(), ico = %identifier.value, "RPO lookup");

        let request = route
            .client()
            .get(url)
            .query(&[("identifier", identifier.value.as_str())]);
        let response: Option<RpoSearchResponse> = send_json(request, self.limits()).await?;

        let entity = response
            .and_then(|r| r.results.into_iter().next())
            .ok_or_else(|| ProviderError::NotFound {
                provider: PROVIDER_ID.to_string(),
                identifier: identifier.key(),
            })?;

        let debts = match &self.debts {
            Some(register) => match register.lookup(&identifier.value, route).await {
                Ok(report) => Some(report),
                Err(e) => {
                    warn!(provider = PROVIDER_ID, error = %e, "debtor list lookup failed");
                    None
                }
            },
            None => None,
        };

        Ok(RawRecord {
            identifier: identifier.clone(),
            provider: PROVIDER_ID,
            fetched_at: Utc::now(),
            payload: RawPayload::SkRpo(Box::new(entity)),
            debts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_eight_digits() {
        let provider = SkRpoProvider::new();
        let identifier = provider.classify("888 888 88").unwrap();

        assert_eq!(identifier.country, Country::Sk);
        assert_eq!(identifier.kind, IdentifierKind::RegistrationNumber);
        assert_eq!(identifier.value, "88888888");
    }

    #[test]
    fn test_rejects_other_shapes() {
        let provider = SkRpoProvider::new();
        assert!(!provider.validate("1234567"));
        assert!(!provider.validate("Firma s.r.o."));
        assert!(!provider.validate("0000019193"));
    }

    #[test]
    fn test_debt_capability_follows_configuration() {
        assert!(!SkRpoProvider::new().capabilities().supports_debts);
        let provider =
            SkRpoProvider::new().with_debt_register(DebtRegister::slovak("http://localhost:9"));
        assert!(provider.capabilities().supports_debts);
    }
}
