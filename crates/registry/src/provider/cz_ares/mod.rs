//! Czech provider: ARES.
//!
//! Supports lookup by IČO (basic record plus the commercial-register extract
//! for statutory bodies and partners) and by legal name through the ARES
//! search endpoint, taking the first hit.

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

use models::{AresSearchRequest, AresSearchResponse, AresSubject, AresVrResponse};

pub const PROVIDER_ID: &str = "CZ_ARES";
const BASE_URL: &str = "https://ares.gov.cz/ekonomicke-subjekty-v-be/rest";

/// Czech ARES provider.
pub struct CzAresProvider {
    base_url: String,
    debts: Option<DebtRegister>,
}

impl CzAresProvider {
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

    /// Consult the Czech debtor list after each lookup.
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

    fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    async fn subject_by_ico(
        &self,
        ico: &str,
        route: &Route,
    ) -> Result<Option<AresSubject>, ProviderError> {
        let url = format!("{}/ekonomicke-subjekty/{}", self.base(), ico);
        send_json(route.client().get(url), self.limits()).await
    }

    async fn subject_by_name(
        &self,
        name: &str,
        route: &Route,
    ) -> Result<Option<AresSubject>, ProviderError> {
        let url = format!("{}/ekonomicke-subjekty/vyhledat", self.base());
        let body = AresSearchRequest {
            obchodni_jmeno: name,
            pocet: 1,
        };
        let response: Option<AresSearchResponse> =
            send_json(route.client().post(url).json(&body), self.limits()).await?;

        Ok(response.and_then(|r| r.ekonomicke_subjekty.into_iter().next()))
    }
}

impl Default for CzAresProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RegistryProvider for CzAresProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn country(&self) -> Country {
        Country::Cz
    }

    fn priority(&self) -> u8 {
        30
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            identifier_kinds: &[IdentifierKind::RegistrationNumber, IdentifierKind::NameQuery],
            supports_associates: true,
            supports_debts: self.debts.is_some(),
        }
    }

    fn rate_limit(&self) -> RateLimit {
        // ARES allows 500 requests per minute per client
        RateLimit {
            requests_per_minute: 300,
            burst: 20,
        }
    }

    fn classify(&self, raw: &str) -> Option<Identifier> {
        if let Some(ico) = validators::digits(raw, 8) {
            return validators::cz_ico_checksum(&ico)
                .then(|| Identifier::registration(Country::Cz, ico));
        }
        validators::name_query(raw)
            .map(|name| Identifier::new(Country::Cz, IdentifierKind::NameQuery, name))
    }

    async fn fetch(
        &self,
        identifier: &Identifier,
        route: &Route,
    ) -> Result<RawRecord, ProviderError> {
        debug!(provider = PROVIDER_ID, route = route.id(), query = %identifier.value, "ARES lookup");

        let subject = match identifier.kind {
            IdentifierKind::NameQuery => self.subject_by_name(&identifier.value, route).await?,
            _ => self.subject_by_ico(&identifier.value, route).await?,
        }
        .ok_or_else(|| ProviderError::NotFound {
            provider: PROVIDER_ID.to_string(),
            identifier: identifier.key(),
        })?;

        let ico = subject
            .ico
            .clone()
            .ok_or_else(|| ProviderError::malformed(PROVIDER_ID, "subject without ico"))?;

        // Commercial register extract; entities outside the register answer 404
        let register_url = format!("{}/ekonomicke-subjekty-vr/{}", self.base(), ico);
        let register: Option<AresVrResponse> =
            send_json(route.client().get(register_url), self.limits()).await?;
        let register = register
            .and_then(|r| r.zaznamy.into_iter().next())
            .map(Box::new);

        let debts = match &self.debts {
            Some(debt_register) => match debt_register.lookup(&ico, route).await {
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
            payload: RawPayload::CzAres {
                subject: Box::new(subject),
                register,
            },
            debts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_ico_requires_checksum() {
        let provider = CzAresProvider::new();

        let identifier = provider.classify("255 96 641").unwrap();
        assert_eq!(identifier, Identifier::registration(Country::Cz, "25596641"));

        assert!(provider.classify("88888888").is_none());
    }

    #[test]
    fn test_classify_name_query() {
        let provider = CzAresProvider::new();
        let identifier = provider.classify("Seznam.cz  a.s.").unwrap();

        assert_eq!(identifier.kind, IdentifierKind::NameQuery);
        assert_eq!(identifier.value, "seznam.cz a.s.");
    }

    #[test]
    fn test_rejects_short_or_numeric_noise() {
        let provider = CzAresProvider::new();
        assert!(!provider.validate("ab"));
        assert!(!provider.validate("123"));
    }
}
