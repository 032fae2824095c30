use chrono::Utc;
use rust_decimal::Decimal;

use crate::errors::ProviderError;
use crate::models::{
    Address, Associate, AssociateRole, CanonicalRecord, Country, Identifier, Party, TaxFlags,
};
use crate::provider::sk_rpo::models::{current, RpoAddress, RpoEntity, RpoStakeholder};

use super::{
    clean_text, company_identifier, derive_status, join_parts, parse_date, person_id,
    require_name, role_from_title,
};

pub(super) fn normalize(
    identifier: &Identifier,
    provider: &str,
    entity: &RpoEntity,
) -> Result<CanonicalRecord, ProviderError> {
    let legal_name = require_name(
        provider,
        current(&entity.full_names, |v| v.valid_to.as_ref()).map(|v| v.value.as_str()),
    )?;

    let terminated_on = parse_date(entity.termination.as_deref());
    let in_liquidation = current(&entity.legal_statuses, |v| v.valid_to.as_ref())
        .map(|s| s.value.value.to_lowercase().contains("likvid"))
        .unwrap_or(false);
    let status = derive_status(&legal_name, terminated_on.is_some(), in_liquidation);

    let registered_address = current(&entity.addresses, |a| a.valid_to.as_ref())
        .and_then(|a| address(a, Country::Sk));

    let mut associates: Vec<Associate> = entity
        .statutory_bodies
        .iter()
        .filter(|s| s.valid_to.is_none())
        .filter_map(|s| associate(s, None))
        .collect();
    associates.extend(
        entity
            .stakeholders
            .iter()
            .filter(|s| s.valid_to.is_none())
            .filter_map(|s| associate(s, Some(AssociateRole::Owner))),
    );

    Ok(CanonicalRecord {
        identifier: identifier.clone(),
        legal_name,
        country: Country::Sk,
        status,
        registered_address,
        associates,
        tax_flags: TaxFlags::default(),
        legal_form: current(&entity.legal_forms, |v| v.valid_to.as_ref())
            .and_then(|f| clean_text(Some(&f.value.value))),
        founded_on: parse_date(entity.establishment.as_deref()),
        terminated_on,
        source_provider: provider.to_string(),
        fetched_at: Utc::now(),
    })
}

fn address(address: &RpoAddress, fallback: Country) -> Option<Address> {
    let number = address
        .building_number
        .clone()
        .or_else(|| address.reg_number.map(|n| n.to_string()));
    let street = join_parts([address.street.as_deref(), number.as_deref()], " ");
    let postal_code = address.postal_codes.first().and_then(|p| clean_text(Some(p)));
    let city = address.municipality.as_ref().and_then(|m| clean_text(Some(&m.value)));
    let locality = join_parts([postal_code.as_deref(), city.as_deref()], " ");

    let text = join_parts([street.as_deref(), locality.as_deref()], ", ")?;
    let country = address
        .country
        .as_ref()
        .and_then(|c| Country::from_name_or_code(&c.value))
        .unwrap_or(fallback);

    Some(Address {
        text,
        postal_code,
        city,
        country,
    })
}

fn associate(stakeholder: &RpoStakeholder, role: Option<AssociateRole>) -> Option<Associate> {
    let role = role.unwrap_or_else(|| {
        role_from_title(stakeholder.stakeholder_type.as_ref().map(|t| t.value.as_str()))
    });
    let share_pct = stakeholder
        .share_pct
        .and_then(|p| Decimal::try_from(p).ok())
        .map(|p| p.round_dp(2));
    let residence = stakeholder
        .address
        .as_ref()
        .and_then(|a| a.country.as_ref())
        .and_then(|c| Country::from_name_or_code(&c.value));

    if let Some(number) = stakeholder.identifier.as_deref() {
        let name = clean_text(stakeholder.full_name.as_deref())?;
        let country = residence.unwrap_or(Country::Sk);
        let identifier = company_identifier(country, Some(number))?;
        return Some(Associate {
            name,
            role,
            share_pct,
            party: Party::Company { identifier },
        });
    }

    let person = stakeholder.person_name.as_ref();
    let name = person
        .and_then(|p| clean_text(p.formated_name.as_deref()))
        .or_else(|| {
            person.and_then(|p| {
                let given = p.given_names.join(" ");
                let family = p.family_names.join(" ");
                join_parts([Some(given.as_str()), Some(family.as_str())], " ")
            })
        })
        .or_else(|| clean_text(stakeholder.full_name.as_deref()))?;

    Some(Associate {
        party: Party::Person {
            person_id: person_id(Country::Sk, &name),
            country: residence,
        },
        name,
        role,
        share_pct,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntityStatus;
    use crate::provider::sk_rpo::models::RpoSearchResponse;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn entity(value: serde_json::Value) -> RpoEntity {
        let response: RpoSearchResponse =
            serde_json::from_value(json!({ "results": [value] })).unwrap();
        response.results.into_iter().next().unwrap()
    }

    fn fixture() -> RpoEntity {
        entity(json!({
            "identifiers": [{"value": "88888888"}],
            "fullNames": [
                {"value": "Stará Firma s.r.o.", "validTo": "2019-12-31"},
                {"value": "Test Firma s.r.o."}
            ],
            "addresses": [{
                "street": "Hlavná",
                "buildingNumber": "1",
                "postalCodes": ["81101"],
                "municipality": {"value": "Bratislava"},
                "country": {"value": "Slovenská republika"}
            }],
            "legalForms": [{"value": {"value": "Spoločnosť s ručením obmedzeným"}}],
            "establishment": "2015-03-01",
            "statutoryBodies": [
                {"personName": {"formatedName": "Ján Novák"}, "stakeholderType": {"value": "konateľ"}},
                {"personName": {"formatedName": "Peter Starý"}, "stakeholderType": {"value": "konateľ"}, "validTo": "2020-01-01"}
            ],
            "stakeholders": [
                {"fullName": "Sestra s.r.o.", "identifier": "77777777", "sharePct": 60.0},
                {"fullName": "Holding CZ a.s.", "identifier": "12345678", "sharePct": 40.0,
                 "address": {"country": {"value": "Česká republika"}}}
            ]
        }))
    }

    #[test]
    fn test_normalizes_full_record() {
        let identifier = Identifier::registration(Country::Sk, "88888888");
        let record = normalize(&identifier, "SK_RPO", &fixture()).unwrap();

        assert_eq!(record.legal_name, "Test Firma s.r.o.");
        assert_eq!(record.status, EntityStatus::Active);
        assert_eq!(
            record.registered_address.as_ref().map(|a| a.text.as_str()),
            Some("Hlavná 1, 81101 Bratislava")
        );
        assert_eq!(record.founded_on, chrono::NaiveDate::from_ymd_opt(2015, 3, 1));
        assert_eq!(record.legal_form.as_deref(), Some("Spoločnosť s ručením obmedzeným"));

        // Historic statutory body is dropped
        assert_eq!(record.associates.len(), 3);
        assert_eq!(record.associates[0].role, AssociateRole::Manager);

        let owners: Vec<_> = record.company_associates().collect();
        assert_eq!(owners.len(), 2);
        assert_eq!(owners[0].1, &Identifier::registration(Country::Sk, "77777777"));
        assert_eq!(owners[1].1, &Identifier::registration(Country::Cz, "12345678"));
        assert_eq!(owners[1].0.share_pct, Some(dec!(40)));
    }

    #[test]
    fn test_missing_optional_fields_become_none() {
        let identifier = Identifier::registration(Country::Sk, "11111111");
        let record = normalize(
            &identifier,
            "SK_RPO",
            &entity(json!({"fullNames": [{"value": "Holá Firma s.r.o."}]})),
        )
        .unwrap();

        assert!(record.registered_address.is_none());
        assert!(record.associates.is_empty());
        assert!(record.tax_flags.debt_amount.is_none());
        assert!(record.legal_form.is_none());
    }

    #[test]
    fn test_missing_name_is_malformed() {
        let identifier = Identifier::registration(Country::Sk, "11111111");
        let result = normalize(&identifier, "SK_RPO", &entity(json!({"fullNames": []})));
        assert!(matches!(result, Err(ProviderError::MalformedResponse { .. })));
    }

    #[test]
    fn test_termination_means_dissolved() {
        let identifier = Identifier::registration(Country::Sk, "11111111");
        let record = normalize(
            &identifier,
            "SK_RPO",
            &entity(json!({
                "fullNames": [{"value": "Koniec s.r.o."}],
                "termination": "2022-06-30"
            })),
        )
        .unwrap();
        assert_eq!(record.status, EntityStatus::Dissolved);
    }
}
