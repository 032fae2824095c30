use std::fmt;

use serde::{Deserialize, Serialize};

use super::Country;

/// What an identifier's value denotes.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdentifierKind {
    /// Company register number (IČO, KRS).
    RegistrationNumber,
    /// Tax authority number (NIP, adószám).
    TaxNumber,
    /// Free-text legal name search.
    NameQuery,
}

impl IdentifierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RegistrationNumber => "registration-number",
            Self::TaxNumber => "tax-number",
            Self::NameQuery => "name-query",
        }
    }
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed entity identifier.
///
/// `value` always holds the normalized form (digits only for numbers,
/// lowercased and whitespace-collapsed for name queries), so two spellings of
/// the same identifier compare equal. Immutable once parsed.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Identifier {
    pub country: Country,
    pub kind: IdentifierKind,
    pub value: String,
}

impl Identifier {
    pub fn new(country: Country, kind: IdentifierKind, value: impl Into<String>) -> Self {
        Self {
            country,
            kind,
            value: value.into(),
        }
    }

    /// Registration number shorthand.
    pub fn registration(country: Country, value: impl Into<String>) -> Self {
        Self::new(country, IdentifierKind::RegistrationNumber, value)
    }

    /// Globally unique key (country + kind + value), used for cache and store entries.
    pub fn key(&self) -> String {
        format!("{}:{}:{}", self.country, self.kind, self.value)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.country, self.value)
    }
}
