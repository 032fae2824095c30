use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Country, Identifier};

/// Lifecycle status of a registered entity.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityStatus {
    Active,
    Liquidation,
    Dissolved,
}

impl EntityStatus {
    /// Whether the entity is winding down or gone.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Liquidation | Self::Dissolved)
    }
}

/// A registered office address.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    /// Single-line, whitespace-collapsed rendering
    pub text: String,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub country: Country,
}

/// How an associate relates to the company.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociateRole {
    Manager,
    Owner,
    BoardMember,
    Procurator,
    Liquidator,
    Other,
}

impl AssociateRole {
    /// Owners hold shares; every other role is a management function.
    pub fn is_ownership(&self) -> bool {
        matches!(self, Self::Owner)
    }
}

/// Who an associate is.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Party {
    /// A natural person. `person_id` is a normalized, country-scoped key.
    Person {
        person_id: String,
        country: Option<Country>,
    },
    /// A legal entity that can itself be resolved.
    Company { identifier: Identifier },
}

/// A manager, owner or other person/entity attached to a company.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Associate {
    pub name: String,
    pub role: AssociateRole,
    pub share_pct: Option<Decimal>,
    pub party: Party,
}

/// An amount in a currency.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Money {
    pub amount: Decimal,
    pub currency: String,
}

/// Tax-authority facts. `None` means the source did not say.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxFlags {
    pub vat_registered: Option<bool>,
    pub debt_amount: Option<Money>,
}

/// The normalized output of one provider call for one entity.
///
/// Immutable: a re-fetch produces a new record with a fresh `fetched_at`
/// that replaces the previous one in cache and store.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalRecord {
    pub identifier: Identifier,
    pub legal_name: String,
    pub country: Country,
    pub status: EntityStatus,
    pub registered_address: Option<Address>,
    pub associates: Vec<Associate>,
    pub tax_flags: TaxFlags,
    pub legal_form: Option<String>,
    pub founded_on: Option<NaiveDate>,
    pub terminated_on: Option<NaiveDate>,
    pub source_provider: String,
    pub fetched_at: DateTime<Utc>,
}

impl CanonicalRecord {
    /// Company associates, i.e. the entities graph traversal can follow.
    pub fn company_associates(&self) -> impl Iterator<Item = (&Associate, &Identifier)> {
        self.associates.iter().filter_map(|associate| match &associate.party {
            Party::Company { identifier } => Some((associate, identifier)),
            Party::Person { .. } => None,
        })
    }

    /// Outstanding tax debt, if any was reported above zero.
    pub fn outstanding_debt(&self) -> Option<&Money> {
        self.tax_flags
            .debt_amount
            .as_ref()
            .filter(|money| money.amount > Decimal::ZERO)
    }
}
