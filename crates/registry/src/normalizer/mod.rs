//! Mapping from provider payloads to the canonical record schema.
//!
//! One pure function per provider shape. Optional source fields that are
//! missing become `None`; a missing legal name (or, for name searches, a
//! missing registration number) makes the whole answer a
//! `MalformedResponse`. Nothing here does I/O.

mod cz;
mod hu;
mod pl;
mod sk;

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::errors::ProviderError;
use crate::models::{
    AssociateRole, CanonicalRecord, Country, EntityStatus, Identifier, IdentifierKind,
};
use crate::provider::{RawPayload, RawRecord};
use crate::router::validators;

/// Normalize one raw provider answer.
pub fn normalize(raw: RawRecord) -> Result<CanonicalRecord, ProviderError> {
    let RawRecord {
        identifier,
        provider,
        fetched_at,
        payload,
        debts,
    } = raw;

    let mut record = match payload {
        RawPayload::SkRpo(entity) => sk::normalize(&identifier, provider, &entity)?,
        RawPayload::CzAres { subject, register } => {
            cz::normalize(&identifier, provider, &subject, register.as_deref())?
        }
        RawPayload::PlKrs(extract) => pl::normalize_krs(&identifier, provider, &extract)?,
        RawPayload::PlWhiteList(subject) => {
            pl::normalize_white_list(&identifier, provider, &subject)?
        }
        RawPayload::PlCeidg(firm) => pl::normalize_ceidg(&identifier, provider, &firm)?,
        RawPayload::HuNav(response) => hu::normalize(&identifier, provider, &response)?,
        RawPayload::Canonical(record) => {
            let mut record = *record;
            record.legal_name = require_name(provider, Some(&record.legal_name))?;
            record.source_provider = provider.to_string();
            record
        }
    };

    record.fetched_at = fetched_at;
    if let Some(report) = debts {
        record.tax_flags.debt_amount = Some(report.total(record.country));
    }
    Ok(record)
}

/// Trim and collapse whitespace; empty strings become `None`.
pub(crate) fn clean_text(value: Option<&str>) -> Option<String> {
    let collapsed = value?.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}

/// Join the non-empty parts with a separator.
pub(crate) fn join_parts<'a>(
    parts: impl IntoIterator<Item = Option<&'a str>>,
    sep: &str,
) -> Option<String> {
    let parts: Vec<String> = parts.into_iter().filter_map(clean_text).collect();
    (!parts.is_empty()).then(|| parts.join(sep))
}

/// Country-scoped key for a natural person: `sk:jan novak`.
pub(crate) fn person_id(country: Country, name: &str) -> String {
    let normalized = name
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| c == ',' || c == '.'))
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    format!("{}:{}", country.code().to_lowercase(), normalized)
}

/// Legal-name suffixes registries append while a company is being wound up.
const LIQUIDATION_MARKERS: [&str; 7] = [
    "v likvidácii",
    "v likvidaci",
    "w likwidacji",
    "felszámolás alatt",
    "végelszámolás alatt",
    " f.a.",
    " v.a.",
];

pub(crate) fn name_signals_liquidation(name: &str) -> bool {
    let lowered = name.to_lowercase();
    LIQUIDATION_MARKERS.iter().any(|m| lowered.contains(m))
}

/// Combine the signals every source offers into one status.
pub(crate) fn derive_status(
    legal_name: &str,
    terminated: bool,
    in_liquidation: bool,
) -> EntityStatus {
    if terminated {
        EntityStatus::Dissolved
    } else if in_liquidation || name_signals_liquidation(legal_name) {
        EntityStatus::Liquidation
    } else {
        EntityStatus::Active
    }
}

/// ISO dates (optionally with a time part) or `DD.MM.YYYY`.
pub(crate) fn parse_date(value: Option<&str>) -> Option<NaiveDate> {
    let value = value?.trim();
    let iso = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(iso, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%d.%m.%Y"))
        .ok()
}

/// Share percentage from `50`, `50 %`, `33,33` or a fraction like `1/3`.
pub(crate) fn parse_share(value: &str) -> Option<Decimal> {
    let cleaned = value.trim().trim_end_matches('%').trim().replace(',', ".");
    if let Some((numerator, denominator)) = cleaned.split_once('/') {
        let numerator = Decimal::from_str(numerator.trim()).ok()?;
        let denominator = Decimal::from_str(denominator.trim()).ok()?;
        if denominator.is_zero() {
            return None;
        }
        return Some((numerator / denominator * Decimal::ONE_HUNDRED).round_dp(2));
    }
    Decimal::from_str(&cleaned).ok()
}

/// Map a local-language function title onto a role.
pub(crate) fn role_from_title(title: Option<&str>) -> AssociateRole {
    let Some(title) = title else {
        return AssociateRole::Other;
    };
    let title = title.to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| title.contains(n));

    if has(&["likvid", "likwid", "felszámoló", "végelszámoló", "liquidator"]) {
        AssociateRole::Liquidator
    } else if has(&["prokur", "procurator"]) {
        AssociateRole::Procurator
    } else if has(&["konate", "jednatel", "prezes", "ügyvezet", "managing", "director"]) {
        AssociateRole::Manager
    } else if has(&["predstavenst", "představenst", "zarząd", "dozor", "igazgatóság", "board"]) {
        AssociateRole::BoardMember
    } else if has(&["spoločník", "společník", "wspólnik", "akcionár", "akcionář", "owner", "tulajdonos"]) {
        AssociateRole::Owner
    } else {
        AssociateRole::Other
    }
}

/// Identifier for a legal-person associate, when its number is resolvable.
pub(crate) fn company_identifier(country: Country, number: Option<&str>) -> Option<Identifier> {
    let number = number?;
    match country {
        Country::Sk | Country::Cz => validators::digits(number, 8)
            .map(|ico| Identifier::registration(country, ico)),
        Country::Pl => validators::digits(number, 10)
            .filter(|krs| validators::pl_krs_shape(krs))
            .map(|krs| Identifier::registration(country, krs)),
        Country::Hu => validators::hu_tax_number(number)
            .map(|tax| Identifier::new(country, IdentifierKind::TaxNumber, tax)),
    }
}

pub(crate) fn require_name(
    provider: &str,
    name: Option<&str>,
) -> Result<String, ProviderError> {
    clean_text(name).ok_or_else(|| ProviderError::malformed(provider, "missing legal name"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text(Some("  ACME \n s.r.o. ")), Some("ACME s.r.o.".to_string()));
        assert_eq!(clean_text(Some("   ")), None);
        assert_eq!(clean_text(None), None);
    }

    #[test]
    fn test_person_id_is_stable_across_spellings() {
        assert_eq!(
            person_id(Country::Sk, "Ján  Novák,"),
            person_id(Country::Sk, "JÁN NOVÁK")
        );
        assert_ne!(
            person_id(Country::Sk, "Ján Novák"),
            person_id(Country::Cz, "Ján Novák")
        );
    }

    #[test]
    fn test_status_derivation() {
        assert_eq!(
            derive_status("Alfa s.r.o. v likvidácii", false, false),
            EntityStatus::Liquidation
        );
        assert_eq!(derive_status("Alfa s.r.o.", true, true), EntityStatus::Dissolved);
        assert_eq!(derive_status("Beta Kft. f.a.", false, false), EntityStatus::Liquidation);
        assert_eq!(derive_status("Gamma sp. z o.o.", false, false), EntityStatus::Active);
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2005, 2, 1);
        assert_eq!(parse_date(Some("2005-02-01")), expected);
        assert_eq!(parse_date(Some("2005-02-01T00:00:00")), expected);
        assert_eq!(parse_date(Some("01.02.2005")), expected);
        assert_eq!(parse_date(Some("yesterday")), None);
    }

    #[test]
    fn test_parse_share() {
        assert_eq!(parse_share("50"), Some(dec!(50)));
        assert_eq!(parse_share("33,5 %"), Some(dec!(33.5)));
        assert_eq!(parse_share("1/4"), Some(dec!(25)));
        assert_eq!(parse_share("1/0"), None);
        assert_eq!(parse_share("n/a"), None);
    }

    #[test]
    fn test_role_from_title() {
        assert_eq!(role_from_title(Some("Konateľ")), AssociateRole::Manager);
        assert_eq!(role_from_title(Some("PREZES ZARZĄDU")), AssociateRole::Manager);
        assert_eq!(role_from_title(Some("Członek zarządu")), AssociateRole::BoardMember);
        assert_eq!(role_from_title(Some("Likvidátor")), AssociateRole::Liquidator);
        assert_eq!(role_from_title(Some("prokurista")), AssociateRole::Procurator);
        assert_eq!(role_from_title(Some("Spoločník")), AssociateRole::Owner);
        assert_eq!(role_from_title(None), AssociateRole::Other);
    }

    #[test]
    fn test_company_identifier_per_country() {
        assert_eq!(
            company_identifier(Country::Sk, Some("777 777 77")),
            Some(Identifier::registration(Country::Sk, "77777777"))
        );
        assert_eq!(
            company_identifier(Country::Pl, Some("0000123456")),
            Some(Identifier::registration(Country::Pl, "0000123456"))
        );
        assert_eq!(company_identifier(Country::Pl, Some("5260250274")), None);
        assert_eq!(
            company_identifier(Country::Hu, Some("10773381-2-44")).map(|i| i.kind),
            Some(IdentifierKind::TaxNumber)
        );
        assert_eq!(company_identifier(Country::Cz, None), None);
    }

    fn sk_raw(debts: Option<crate::provider::debt_register::DebtReport>) -> RawRecord {
        let entity = serde_json::from_value(serde_json::json!({
            "fullNames": [{"value": "Dlžník s.r.o."}]
        }))
        .unwrap();
        RawRecord {
            identifier: Identifier::registration(Country::Sk, "88888888"),
            provider: "SK_RPO",
            fetched_at: chrono::Utc::now(),
            payload: RawPayload::SkRpo(Box::new(entity)),
            debts,
        }
    }

    #[test]
    fn test_normalize_attaches_debts_and_fetch_time() {
        let report = serde_json::from_value(serde_json::json!({
            "debts": [{"amount": 25000, "currency": "EUR"}]
        }))
        .unwrap();
        let raw = sk_raw(Some(report));
        let fetched_at = raw.fetched_at;

        let record = normalize(raw).unwrap();
        assert_eq!(record.fetched_at, fetched_at);
        assert_eq!(record.source_provider, "SK_RPO");
        let debt = record.tax_flags.debt_amount.unwrap();
        assert_eq!(debt.amount, dec!(25000));
        assert_eq!(debt.currency, "EUR");

        // Debtor list not consulted: the field stays unknown
        assert!(normalize(sk_raw(None)).unwrap().tax_flags.debt_amount.is_none());
    }

    #[test]
    fn test_canonical_payload_still_requires_a_name() {
        let mut raw = sk_raw(None);
        let mut record = normalize(sk_raw(None)).unwrap();
        record.legal_name = "  ".to_string();
        raw.payload = RawPayload::Canonical(Box::new(record));

        assert!(matches!(
            normalize(raw),
            Err(ProviderError::MalformedResponse { .. })
        ));
    }
}
