//! Deterministic node ids.
//!
//! Ids are derived from the normalized content that makes two records the
//! same real-world thing, so the same company reached along two paths (or in
//! two builds) lands on one node.

use sha2::{Digest, Sha256};

use nexus_registry::{Address, Identifier};

/// Hex characters of the digest kept in an id.
const ID_HEX_LEN: usize = 16;

fn hashed(kind: &str, parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update(b"|");
    }
    let digest = hex::encode(hasher.finalize());
    format!("{}:{}", kind, &digest[..ID_HEX_LEN])
}

fn normalize_text(value: &str) -> String {
    value
        .split_whitespace()
        .map(|word| word.trim_matches(','))
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub fn company_id(identifier: &Identifier) -> String {
    hashed("company", &[&identifier.key()])
}

/// `person_key` is the normalizer's country-scoped person id.
pub fn person_id(person_key: &str) -> String {
    hashed("person", &[person_key])
}

pub fn address_id(address: &Address) -> String {
    hashed(
        "address",
        &[address.country.code(), &normalize_text(&address.text)],
    )
}

/// One debt node per company: the reported total.
pub fn debt_id(company: &Identifier) -> String {
    hashed("debt", &[&company.key()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_registry::{Country, IdentifierKind};

    fn address(text: &str) -> Address {
        Address {
            text: text.to_string(),
            postal_code: None,
            city: None,
            country: Country::Sk,
        }
    }

    #[test]
    fn test_ids_are_stable_and_prefixed() {
        let id = Identifier::registration(Country::Sk, "88888888");
        assert_eq!(company_id(&id), company_id(&id.clone()));
        assert!(company_id(&id).starts_with("company:"));
        assert_eq!(company_id(&id).len(), "company:".len() + ID_HEX_LEN);
    }

    #[test]
    fn test_identifier_kind_distinguishes_companies() {
        let krs = Identifier::registration(Country::Pl, "0000019193");
        let nip = Identifier::new(Country::Pl, IdentifierKind::TaxNumber, "0000019193");
        assert_ne!(company_id(&krs), company_id(&nip));
    }

    #[test]
    fn test_address_spelling_differences_collapse() {
        assert_eq!(
            address_id(&address("Hlavná 1,  Bratislava")),
            address_id(&address("HLAVNÁ 1, BRATISLAVA"))
        );
        assert_ne!(
            address_id(&address("Hlavná 1, Bratislava")),
            address_id(&address("Hlavná 2, Bratislava"))
        );
    }

    #[test]
    fn test_kinds_never_collide() {
        let id = Identifier::registration(Country::Sk, "88888888");
        assert_ne!(company_id(&id), debt_id(&id));
    }
}
