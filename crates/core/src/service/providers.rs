//! Provider wiring from configuration.

use std::sync::Arc;

use log::{debug, info};

use nexus_registry::{
    CircuitBreaker, CzAresProvider, DebtRegister, EgressPool, HuNavProvider, PlCeidgProvider,
    PlKrsProvider, PlWhiteListProvider, ProviderRegistry, RegistryProvider, SkRpoProvider,
};

use crate::config::EngineConfig;
use crate::errors::{Error, Result};

/// Debtor list ids. They are only consulted when a base URL is configured.
pub const SK_DEBTS: &str = "SK_DEBTS";
pub const CZ_DEBTS: &str = "CZ_DEBTS";

/// The enabled adapters, with base URL overrides applied.
pub fn build_providers(config: &EngineConfig) -> Vec<Arc<dyn RegistryProvider>> {
    let debt_url = |id: &str| {
        let settings = config.provider(id);
        settings.base_url.filter(|_| settings.enabled)
    };

    let mut providers: Vec<Arc<dyn RegistryProvider>> = Vec::new();

    let sk = config.provider("SK_RPO");
    if sk.enabled {
        let mut provider = SkRpoProvider::new();
        if let Some(url) = sk.base_url {
            provider = provider.with_base_url(url);
        }
        if let Some(url) = debt_url(SK_DEBTS) {
            provider = provider.with_debt_register(DebtRegister::slovak(url));
        }
        providers.push(Arc::new(provider));
    }

    let cz = config.provider("CZ_ARES");
    if cz.enabled {
        let mut provider = CzAresProvider::new();
        if let Some(url) = cz.base_url {
            provider = provider.with_base_url(url);
        }
        if let Some(url) = debt_url(CZ_DEBTS) {
            provider = provider.with_debt_register(DebtRegister::czech(url));
        }
        providers.push(Arc::new(provider));
    }

    let krs = config.provider("PL_KRS");
    if krs.enabled {
        let mut provider = PlKrsProvider::new();
        if let Some(url) = krs.base_url {
            provider = provider.with_base_url(url);
        }
        providers.push(Arc::new(provider));
    }

    let white_list = config.provider("PL_WL");
    if white_list.enabled {
        let mut provider = PlWhiteListProvider::new();
        if let Some(url) = white_list.base_url {
            provider = provider.with_base_url(url);
        }
        providers.push(Arc::new(provider));
    }

    let ceidg = config.provider("PL_CEIDG");
    match ceidg.api_token.filter(|_| ceidg.enabled) {
        Some(token) => {
            let mut provider = PlCeidgProvider::new(token);
            if let Some(url) = ceidg.base_url {
                provider = provider.with_base_url(url);
            }
            providers.push(Arc::new(provider));
        }
        None => debug!("PL_CEIDG has no api_token, sole traders resolve via the White List only"),
    }

    let nav = config.provider("HU_NAV");
    if nav.enabled {
        let mut provider = HuNavProvider::new();
        if let Some(url) = nav.base_url {
            provider = provider.with_base_url(url);
        }
        providers.push(Arc::new(provider));
    }

    providers
}

/// Registry over the enabled adapters, with the configured breaker and egress routes.
pub fn build_registry(config: &EngineConfig) -> Result<ProviderRegistry> {
    let egress = EgressPool::new(&config.egress.proxies, config.egress.failure_threshold)
        .map_err(|e| Error::InvalidConfigValue(e.to_string()))?;
    let providers = build_providers(config);
    info!(
        "Registry configured with {} providers over {} egress routes",
        providers.len(),
        egress.len()
    );

    Ok(ProviderRegistry::new(
        providers,
        CircuitBreaker::with_config(config.breaker.to_config()),
        Arc::new(egress),
    ))
}
