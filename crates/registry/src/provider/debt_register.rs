//! Tax-authority debtor lists (Finančná správa SR, Finanční správa ČR).
//!
//! The debtor lists are published as files, not APIs; the engine expects
//! them behind a JSON gateway answering `GET {base}/{ico}` with
//! `{"debts": [...]}`, and 404 for taxpayers with no listed debt.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::errors::ProviderError;
use crate::models::{Country, Money};
use crate::registry::Route;

use super::http::{send_json, CallLimits};

const DEBT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);
const DEBT_MAX_RESPONSE_BYTES: usize = 256 * 1024;

/// One listed arrear.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtEntry {
    pub amount: Decimal,
    pub currency: Option<String>,
    pub creditor: Option<String>,
    pub debt_type: Option<String>,
    pub status: Option<String>,
}

impl DebtEntry {
    /// Settled entries stay on some lists with a closing status.
    fn is_active(&self) -> bool {
        let Some(status) = &self.status else {
            return true;
        };
        let status = status.to_lowercase();
        !["uhraden", "ukon", "splacen", "paid", "closed"]
            .iter()
            .any(|prefix| status.starts_with(prefix))
    }
}

/// Debtor list answer for one taxpayer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DebtReport {
    #[serde(default)]
    pub debts: Vec<DebtEntry>,
}

impl DebtReport {
    /// Sum of active debts in the country's currency (zero when none are
    /// listed). Entries in a foreign currency are skipped.
    pub fn total(&self, country: Country) -> Money {
        let currency = country.default_currency();
        let amount: Decimal = self
            .debts
            .iter()
            .filter(|entry| entry.is_active())
            .filter(|entry| {
                entry
                    .currency
                    .as_deref()
                    .map_or(true, |c| c.eq_ignore_ascii_case(currency))
            })
            .map(|entry| entry.amount)
            .sum();

        Money {
            amount,
            currency: currency.to_string(),
        }
    }
}

/// Client for one country's debtor list.
#[derive(Debug, Clone)]
pub struct DebtRegister {
    id: &'static str,
    base_url: String,
}

impl DebtRegister {
    pub fn slovak(base_url: impl Into<String>) -> Self {
        Self {
            id: "SK_DEBTS",
            base_url: base_url.into(),
        }
    }

    pub fn czech(base_url: impl Into<String>) -> Self {
        Self {
            id: "CZ_DEBTS",
            base_url: base_url.into(),
        }
    }

    pub fn id(&self) -> &'static str {
        self.id
    }

    /// Look up listed debts for an IČO.
    pub async fn lookup(&self, ico: &str, route: &Route) -> Result<DebtReport, ProviderError> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), ico);
        let limits = CallLimits {
            provider: self.id,
            timeout: DEBT_LOOKUP_TIMEOUT,
            max_bytes: DEBT_MAX_RESPONSE_BYTES,
        };

        Ok(send_json::<DebtReport>(route.client().get(url), limits)
            .await?
            .unwrap_or_default())
    }
}
