use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Registry jurisdictions the engine can resolve against.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Country {
    #[serde(rename = "SK")]
    Sk,
    #[serde(rename = "CZ")]
    Cz,
    #[serde(rename = "PL")]
    Pl,
    #[serde(rename = "HU")]
    Hu,
}

impl Country {
    pub const ALL: [Country; 4] = [Country::Sk, Country::Cz, Country::Pl, Country::Hu];

    /// ISO 3166-1 alpha-2 code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Sk => "SK",
            Self::Cz => "CZ",
            Self::Pl => "PL",
            Self::Hu => "HU",
        }
    }

    /// Parse an alpha-2 code, case-insensitively.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|country| country.code().eq_ignore_ascii_case(code.trim()))
    }

    /// Parse a country as registries print it: a code, or a local/English name.
    pub fn from_name_or_code(value: &str) -> Option<Self> {
        if let Some(country) = Self::from_code(value) {
            return Some(country);
        }
        let lowered = value.trim().to_lowercase();
        match lowered.as_str() {
            "slovensko" | "slovenská republika" | "slovakia" | "slovak republic" => Some(Self::Sk),
            "česko" | "česká republika" | "czechia" | "czech republic" => Some(Self::Cz),
            "polska" | "poland" | "rzeczpospolita polska" => Some(Self::Pl),
            "magyarország" | "hungary" => Some(Self::Hu),
            _ => None,
        }
    }

    /// Currency debts are reported in when a register omits it.
    pub fn default_currency(&self) -> &'static str {
        match self {
            Self::Sk => "EUR",
            Self::Cz => "CZK",
            Self::Pl => "PLN",
            Self::Hu => "HUF",
        }
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Country {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| format!("unknown country code: {}", s))
    }
}
