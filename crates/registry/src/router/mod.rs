//! Country routing for raw queries.
//!
//! The router turns a raw query string into a typed [`Identifier`] and the
//! adapter that answers for it. Classification is purely structural (digit
//! counts, prefixes, checksums) and never touches the network or a store,
//! so malformed input is rejected before the pipeline sees it.
//!
//! A query may carry an explicit country prefix (`SK:88888888`). Without
//! one, adapters are asked in priority order; the first whose validator
//! accepts the string wins.

pub mod validators;

use std::sync::Arc;

use log::debug;

use crate::errors::ResolutionError;
use crate::models::{Country, Identifier};
use crate::provider::RegistryProvider;

/// Classifies raw queries and picks the adapter that owns them.
#[derive(Clone)]
pub struct CountryRouter {
    providers: Vec<Arc<dyn RegistryProvider>>,
}

impl CountryRouter {
    /// Create a router over the given adapters, ordered by priority.
    pub fn new(mut providers: Vec<Arc<dyn RegistryProvider>>) -> Self {
        providers.sort_by_key(|p| p.priority());
        Self { providers }
    }

    /// Adapters in classification order.
    pub fn providers(&self) -> &[Arc<dyn RegistryProvider>] {
        &self.providers
    }

    /// Classify a raw query.
    pub fn route(
        &self,
        raw: &str,
    ) -> Result<(Arc<dyn RegistryProvider>, Identifier), ResolutionError> {
        let unrecognized = || ResolutionError::UnrecognizedIdentifier(raw.trim().to_string());

        let (country, query) = split_prefix(raw).ok_or_else(unrecognized)?;
        if query.is_empty() {
            return Err(unrecognized());
        }

        self.providers
            .iter()
            .filter(|p| country.map_or(true, |c| p.country() == c))
            .find_map(|p| p.classify(query).map(|identifier| (Arc::clone(p), identifier)))
            .map(|(provider, identifier)| {
                debug!("Routed '{}' to {} as {}", query, provider.id(), identifier.key());
                (provider, identifier)
            })
            .ok_or_else(unrecognized)
    }

    /// Adapter that owns an already-typed identifier.
    ///
    /// Used when the graph follows a company associate, whose identifier
    /// was produced by a normalizer rather than parsed from user input.
    pub fn provider_for(&self, identifier: &Identifier) -> Option<Arc<dyn RegistryProvider>> {
        self.providers_for(identifier).into_iter().next()
    }

    /// Every adapter that can answer for `identifier`, in priority order.
    pub fn providers_for(&self, identifier: &Identifier) -> Vec<Arc<dyn RegistryProvider>> {
        self.providers
            .iter()
            .filter(|p| p.country() == identifier.country)
            .filter(|p| p.capabilities().identifier_kinds.contains(&identifier.kind))
            .cloned()
            .collect()
    }

    /// Whether any adapter accepts the query. No I/O.
    pub fn validate(&self, raw: &str) -> bool {
        self.route(raw).is_ok()
    }
}

/// Split an optional `CC:` prefix off a query.
///
/// Returns `None` when a two-letter prefix names a country the engine does
/// not know. Anything else before a colon is left as part of the query.
fn split_prefix(raw: &str) -> Option<(Option<Country>, &str)> {
    let raw = raw.trim();
    match raw.split_once(':') {
        Some((prefix, rest))
            if prefix.len() == 2 && prefix.chars().all(|c| c.is_ascii_alphabetic()) =>
        {
            Country::from_code(prefix).map(|country| (Some(country), rest.trim()))
        }
        _ => Some((None, raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IdentifierKind;
    use crate::provider::cz_ares::CzAresProvider;
    use crate::provider::hu_nav::HuNavProvider;
    use crate::provider::pl_ceidg::PlCeidgProvider;
    use crate::provider::pl_krs::PlKrsProvider;
    use crate::provider::pl_white_list::PlWhiteListProvider;
    use crate::provider::sk_rpo::SkRpoProvider;

    fn router() -> CountryRouter {
        CountryRouter::new(vec![
            Arc::new(SkRpoProvider::new()),
            Arc::new(CzAresProvider::new()),
            Arc::new(PlKrsProvider::new()),
            Arc::new(PlWhiteListProvider::new()),
            Arc::new(HuNavProvider::new()),
        ])
    }

    fn routed(raw: &str) -> (&'static str, Identifier) {
        let (provider, identifier) = router().route(raw).unwrap();
        (provider.id(), identifier)
    }

    #[test]
    fn test_orders_by_priority() {
        let ids: Vec<_> = router().providers().iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec!["HU_NAV", "PL_KRS", "PL_WL", "CZ_ARES", "SK_RPO"]);
    }

    #[test]
    fn test_eight_digits_split_on_czech_checksum() {
        assert_eq!(routed("25596641").0, "CZ_ARES");
        assert_eq!(routed("88888888").0, "SK_RPO");
    }

    #[test]
    fn test_polish_numbers() {
        let (provider, identifier) = routed("0000019193");
        assert_eq!(provider, "PL_KRS");
        assert_eq!(identifier.kind, IdentifierKind::RegistrationNumber);

        let (provider, identifier) = routed("526-025-02-74");
        assert_eq!(provider, "PL_WL");
        assert_eq!(identifier.kind, IdentifierKind::TaxNumber);
    }

    #[test]
    fn test_hungarian_tax_number() {
        let (provider, identifier) = routed("10773381-2-44");
        assert_eq!(provider, "HU_NAV");
        assert_eq!(identifier.value, "10773381244");
    }

    #[test]
    fn test_prefix_restricts_country() {
        // Passes the Czech checksum but the prefix forces Slovakia
        let (provider, identifier) = routed("SK:25596641");
        assert_eq!(provider, "SK_RPO");
        assert_eq!(identifier, Identifier::registration(Country::Sk, "25596641"));

        let (provider, _) = routed("cz: Alfa Logistika");
        assert_eq!(provider, "CZ_ARES");
    }

    #[test]
    fn test_free_text_is_a_czech_name_query() {
        let (provider, identifier) = routed("Alfa Logistika s.r.o.");
        assert_eq!(provider, "CZ_ARES");
        assert_eq!(identifier.kind, IdentifierKind::NameQuery);
    }

    #[test]
    fn test_rejects_unrecognized() {
        let router = router();
        for raw in ["", "   ", "12", "123456789", "XX:88888888", "HU:88888888", "SK:"] {
            assert!(
                matches!(
                    router.route(raw),
                    Err(ResolutionError::UnrecognizedIdentifier(_))
                ),
                "expected {raw:?} to be rejected"
            );
        }
    }

    #[test]
    fn test_provider_for_typed_identifier() {
        let router = router();
        let sk = Identifier::registration(Country::Sk, "77777777");
        assert_eq!(router.provider_for(&sk).unwrap().id(), "SK_RPO");

        let nip = Identifier::new(Country::Pl, IdentifierKind::TaxNumber, "5260250274");
        assert_eq!(router.provider_for(&nip).unwrap().id(), "PL_WL");

        let hu_reg = Identifier::registration(Country::Hu, "0109123456");
        assert!(router.provider_for(&hu_reg).is_none());
    }

    #[test]
    fn test_sole_trader_register_follows_white_list() {
        let mut providers = router().providers().to_vec();
        providers.push(Arc::new(PlCeidgProvider::new("token")));
        let router = CountryRouter::new(providers);

        assert_eq!(router.route("5260250274").unwrap().0.id(), "PL_WL");
        let nip = Identifier::new(Country::Pl, IdentifierKind::TaxNumber, "5260250274");
        let ids: Vec<_> = router.providers_for(&nip).iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec!["PL_WL", "PL_CEIDG"]);
    }
}
