use chrono::Utc;

use crate::errors::ProviderError;
use crate::models::{Address, Associate, CanonicalRecord, Country, Identifier, Party, TaxFlags};
use crate::provider::hu_nav::models::{NavAddress, NavTaxpayerResponse};

use super::{clean_text, derive_status, join_parts, person_id, require_name, role_from_title};

pub(super) fn normalize(
    identifier: &Identifier,
    provider: &str,
    response: &NavTaxpayerResponse,
) -> Result<CanonicalRecord, ProviderError> {
    let data = response
        .taxpayer_data
        .as_ref()
        .ok_or_else(|| ProviderError::malformed(provider, "missing taxpayer data"))?;
    let legal_name = require_name(
        provider,
        data.taxpayer_name
            .as_deref()
            .or(data.taxpayer_short_name.as_deref()),
    )?;

    // A suspended or deleted tax number is the only lifecycle signal NAV gives
    let invalid = response.taxpayer_validity == Some(false);

    let registered_address = data
        .taxpayer_address_list
        .iter()
        .find(|item| item.taxpayer_address_type.as_deref() == Some("HQ"))
        .or_else(|| data.taxpayer_address_list.first())
        .and_then(|item| item.taxpayer_address.as_ref())
        .and_then(address);

    let associates = response
        .executives
        .iter()
        .filter_map(|executive| {
            let name = clean_text(Some(&executive.name))?;
            Some(Associate {
                party: Party::Person {
                    person_id: person_id(Country::Hu, &name),
                    country: None,
                },
                name,
                role: role_from_title(executive.role.as_deref()),
                share_pct: None,
            })
        })
        .collect();

    Ok(CanonicalRecord {
        identifier: identifier.clone(),
        status: derive_status(&legal_name, invalid, false),
        legal_name,
        country: Country::Hu,
        registered_address,
        associates,
        tax_flags: TaxFlags {
            vat_registered: response.taxpayer_validity,
            debt_amount: None,
        },
        legal_form: clean_text(data.incorporation.as_deref()),
        founded_on: None,
        terminated_on: None,
        source_provider: provider.to_string(),
        fetched_at: Utc::now(),
    })
}

fn address(nav: &NavAddress) -> Option<Address> {
    let street = join_parts(
        [
            nav.street_name.as_deref(),
            nav.public_place_category.as_deref(),
            nav.number.as_deref(),
        ],
        " ",
    );
    let postal_code = clean_text(nav.postal_code.as_deref());
    let city = clean_text(nav.city.as_deref());
    let locality = join_parts([postal_code.as_deref(), city.as_deref()], " ");

    Some(Address {
        text: join_parts([locality.as_deref(), street.as_deref()], ", ")?,
        country: nav
            .country_code
            .as_deref()
            .and_then(Country::from_code)
            .unwrap_or(Country::Hu),
        postal_code,
        city,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AssociateRole, EntityStatus, IdentifierKind};
    use serde_json::json;

    fn response(validity: bool) -> NavTaxpayerResponse {
        serde_json::from_value(json!({
            "taxpayerValidity": validity,
            "taxpayerData": {
                "taxpayerName": "EPSILON KERESKEDELMI KORLÁTOLT FELELŐSSÉGŰ TÁRSASÁG",
                "taxpayerShortName": "EPSILON KFT.",
                "incorporation": "ORGANIZATION",
                "taxNumberDetail": {"taxpayerId": "10773381", "vatCode": "2", "countyCode": "44"},
                "taxpayerAddressList": [
                    {"taxpayerAddressType": "SITE", "taxpayerAddress": {"city": "DEBRECEN"}},
                    {
                        "taxpayerAddressType": "HQ",
                        "taxpayerAddress": {
                            "countryCode": "HU",
                            "postalCode": "1138",
                            "city": "BUDAPEST",
                            "streetName": "VÁCI",
                            "publicPlaceCategory": "ÚT",
                            "number": "76"
                        }
                    }
                ]
            },
            "executives": [{"name": "Kovács Péter", "role": "ügyvezető"}]
        }))
        .unwrap()
    }

    #[test]
    fn test_normalizes_taxpayer() {
        let identifier = Identifier::new(Country::Hu, IdentifierKind::TaxNumber, "10773381244");
        let record = normalize(&identifier, "HU_NAV", &response(true)).unwrap();

        assert_eq!(record.status, EntityStatus::Active);
        assert_eq!(record.tax_flags.vat_registered, Some(true));
        assert_eq!(
            record.registered_address.as_ref().map(|a| a.text.as_str()),
            Some("1138 BUDAPEST, VÁCI ÚT 76")
        );
        assert_eq!(record.associates.len(), 1);
        assert_eq!(record.associates[0].role, AssociateRole::Manager);
    }

    #[test]
    fn test_invalid_tax_number_is_dissolved() {
        let identifier = Identifier::new(Country::Hu, IdentifierKind::TaxNumber, "10773381244");
        let record = normalize(&identifier, "HU_NAV", &response(false)).unwrap();

        assert_eq!(record.status, EntityStatus::Dissolved);
        assert_eq!(record.tax_flags.vat_registered, Some(false));
    }

    #[test]
    fn test_missing_taxpayer_data_is_malformed() {
        let identifier = Identifier::new(Country::Hu, IdentifierKind::TaxNumber, "10773381244");
        let empty: NavTaxpayerResponse = serde_json::from_value(json!({})).unwrap();
        assert!(normalize(&identifier, "HU_NAV", &empty).is_err());
    }
}
