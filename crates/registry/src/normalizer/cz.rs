use chrono::Utc;
use rust_decimal::Decimal;
use tracing::debug;

use crate::errors::ProviderError;
use crate::models::{
    Address, Associate, AssociateRole, CanonicalRecord, Country, Identifier, IdentifierKind,
    Party, TaxFlags,
};
use crate::provider::cz_ares::models::{
    AresAddress, AresMember, AresPartner, AresSubject, AresVrRecord,
};
use crate::router::validators;

use super::{
    clean_text, company_identifier, derive_status, join_parts, parse_date, parse_share,
    person_id, require_name, role_from_title,
};

pub(super) fn normalize(
    identifier: &Identifier,
    provider: &str,
    subject: &AresSubject,
    register: Option<&AresVrRecord>,
) -> Result<CanonicalRecord, ProviderError> {
    let legal_name = require_name(provider, subject.obchodni_jmeno.as_deref())?;

    // Name searches resolve to the registration number ARES found
    let identifier = match identifier.kind {
        IdentifierKind::NameQuery => subject
            .ico
            .as_deref()
            .and_then(|ico| validators::digits(ico, 8))
            .map(|ico| Identifier::registration(Country::Cz, ico))
            .ok_or_else(|| ProviderError::malformed(provider, "name match without ico"))?,
        _ => identifier.clone(),
    };

    let registrations = subject.seznam_registraci.as_ref();
    let register_state = |state: Option<&String>| state.map(|s| s.to_uppercase());
    let vr_state = registrations.and_then(|r| register_state(r.stav_zdroje_vr.as_ref()));
    let vat_state = registrations.and_then(|r| register_state(r.stav_zdroje_dph.as_ref()));

    let terminated_on = parse_date(subject.datum_zaniku.as_deref());
    let terminated = terminated_on.is_some() || vr_state.as_deref() == Some("ZANIKLY");
    let in_liquidation = register.is_some_and(|r| r.likvidace.is_some());

    let associates = register.map(associates).unwrap_or_default();

    Ok(CanonicalRecord {
        identifier,
        status: derive_status(&legal_name, terminated, in_liquidation),
        legal_name,
        country: Country::Cz,
        registered_address: subject.sidlo.as_ref().and_then(address),
        associates,
        tax_flags: TaxFlags {
            vat_registered: vat_state.map(|s| s == "AKTIVNI"),
            debt_amount: None,
        },
        legal_form: clean_text(subject.pravni_forma.as_deref()),
        founded_on: parse_date(subject.datum_vzniku.as_deref()),
        terminated_on,
        source_provider: provider.to_string(),
        fetched_at: Utc::now(),
    })
}

fn address(sidlo: &AresAddress) -> Option<Address> {
    let postal_code = sidlo.psc.map(|psc| psc.to_string());
    let city = clean_text(sidlo.nazev_obce.as_deref());
    let text = clean_text(sidlo.textova_adresa.as_deref())
        .or_else(|| join_parts([postal_code.as_deref(), city.as_deref()], " "))?;
    let country = sidlo
        .kod_statu
        .as_deref()
        .and_then(Country::from_name_or_code)
        .unwrap_or(Country::Cz);

    Some(Address {
        text,
        postal_code,
        city,
        country,
    })
}

fn associates(register: &AresVrRecord) -> Vec<Associate> {
    let members = register
        .statutarni_organy
        .iter()
        .flat_map(|body| body.clenove_organu.iter())
        .filter(|m| m.datum_vymazu.is_none())
        .filter_map(|m| {
            let title = m
                .clenstvi
                .as_ref()
                .and_then(|c| c.funkce.as_ref())
                .and_then(|f| f.nazev.as_deref());
            member(m, role_from_title(title), None)
        });

    let partners = register
        .spolecnici
        .iter()
        .flat_map(|group| group.spolecnik.iter())
        .filter(|p| p.datum_vymazu.is_none())
        .filter_map(partner);

    members.chain(partners).collect()
}

fn partner(partner: &AresPartner) -> Option<Associate> {
    let share_pct = partner
        .podil
        .iter()
        .filter_map(|p| p.velikost_podilu.as_ref())
        .find_map(|size| {
            let value = size.hodnota.as_deref()?;
            match size.typ_obnos.as_deref() {
                Some("ZLOMEK") if !value.contains('/') => None,
                _ => parse_share(value),
            }
        });
    member(partner.osoba.as_ref()?, AssociateRole::Owner, share_pct)
}

fn member(
    member: &AresMember,
    role: AssociateRole,
    share_pct: Option<Decimal>,
) -> Option<Associate> {
    if let Some(legal) = &member.pravnicka_osoba {
        let name = clean_text(legal.obchodni_jmeno.as_deref())?;
        let country = legal
            .sidlo
            .as_ref()
            .and_then(|s| s.kod_statu.as_deref())
            .and_then(Country::from_name_or_code)
            .unwrap_or(Country::Cz);
        let Some(identifier) = company_identifier(country, legal.ico.as_deref()) else {
            debug!(name = %name, "skipping legal-person associate without ico");
            return None;
        };
        return Some(Associate {
            name,
            role,
            share_pct,
            party: Party::Company { identifier },
        });
    }

    let person = member.fyzicka_osoba.as_ref()?;
    let name = join_parts(
        [
            person.titul_pred_jmenem.as_deref(),
            person.jmeno.as_deref(),
            person.prijmeni.as_deref(),
        ],
        " ",
    )?;
    let key = join_parts([person.jmeno.as_deref(), person.prijmeni.as_deref()], " ")
        .unwrap_or_else(|| name.clone());

    Some(Associate {
        party: Party::Person {
            person_id: person_id(Country::Cz, &key),
            country: person
                .statni_obcanstvi
                .as_deref()
                .and_then(Country::from_name_or_code),
        },
        name,
        role,
        share_pct,
    })
}
