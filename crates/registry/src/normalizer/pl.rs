use chrono::Utc;
use tracing::debug;

use crate::errors::ProviderError;
use crate::models::{
    Address, Associate, AssociateRole, CanonicalRecord, Country, Identifier, IdentifierKind,
    Party, TaxFlags,
};
use crate::provider::pl_ceidg::models::{CeidgAddress, CeidgFirm};
use crate::provider::pl_krs::models::{KrsAddress, KrsExtract, KrsGivenNames, KrsSurname};
use crate::provider::pl_white_list::models::{WlPerson, WlSubject};
use crate::router::validators;

use super::{
    clean_text, company_identifier, derive_status, join_parts, parse_date, person_id,
    require_name, role_from_title,
};

pub(super) fn normalize_krs(
    identifier: &Identifier,
    provider: &str,
    extract: &KrsExtract,
) -> Result<CanonicalRecord, ProviderError> {
    let section1 = &extract.dane.dzial1;
    let legal_name = require_name(provider, section1.dane_podmiotu.nazwa.as_deref())?;

    let terminated_on = parse_date(
        extract
            .naglowek_a
            .data_wykreslenia_z_rejestru_przedsiebiorcow
            .as_deref(),
    );
    let section6 = extract.dane.dzial6.as_ref();
    let dissolved = section6.is_some_and(|s| s.rozwiazanie.is_some());
    let in_liquidation = section6.is_some_and(|s| s.likwidacja.is_some());

    let mut associates: Vec<Associate> = extract
        .dane
        .dzial2
        .as_ref()
        .and_then(|s| s.reprezentacja.as_ref())
        .map(|r| {
            r.sklad
                .iter()
                .filter_map(|member| {
                    let name = krs_person_name(member.imiona.as_ref(), member.nazwisko.as_ref())?;
                    Some(person(name, role_from_title(member.funkcja_w_organie.as_deref())))
                })
                .collect()
        })
        .unwrap_or_default();

    for partner in &section1.wspolnicy_spzoo {
        if let Some(name) = clean_text(partner.nazwa.as_deref()) {
            let krs = partner.identyfikator.as_ref().and_then(|i| i.krs.as_deref());
            match company_identifier(Country::Pl, krs) {
                Some(identifier) => associates.push(Associate {
                    name,
                    role: AssociateRole::Owner,
                    share_pct: None,
                    party: Party::Company { identifier },
                }),
                None => debug!(name = %name, "skipping legal-person shareholder without krs"),
            }
        } else if let Some(name) =
            krs_person_name(partner.imiona.as_ref(), partner.nazwisko.as_ref())
        {
            associates.push(person(name, AssociateRole::Owner));
        }
    }

    Ok(CanonicalRecord {
        identifier: identifier.clone(),
        status: derive_status(
            &legal_name,
            terminated_on.is_some() || dissolved,
            in_liquidation,
        ),
        legal_name,
        country: Country::Pl,
        registered_address: section1
            .siedziba_i_adres
            .as_ref()
            .and_then(|s| s.adres.as_ref())
            .and_then(krs_address),
        associates,
        tax_flags: TaxFlags::default(),
        legal_form: clean_text(section1.dane_podmiotu.forma_prawna.as_deref()),
        founded_on: parse_date(extract.naglowek_a.data_rejestracji_w_krs.as_deref()),
        terminated_on,
        source_provider: provider.to_string(),
        fetched_at: Utc::now(),
    })
}

pub(super) fn normalize_white_list(
    identifier: &Identifier,
    provider: &str,
    subject: &WlSubject,
) -> Result<CanonicalRecord, ProviderError> {
    let legal_name = require_name(provider, subject.name.as_deref())?;
    let terminated_on = parse_date(subject.removal_date.as_deref());

    let representatives = subject
        .representatives
        .iter()
        .filter_map(|p| white_list_associate(p, AssociateRole::Manager));
    let clerks = subject
        .authorized_clerks
        .iter()
        .filter_map(|p| white_list_associate(p, AssociateRole::Procurator));
    let partners = subject
        .partners
        .iter()
        .filter_map(|p| white_list_associate(p, AssociateRole::Owner));

    let address = subject
        .residence_address
        .as_deref()
        .or(subject.working_address.as_deref());

    Ok(CanonicalRecord {
        identifier: identifier.clone(),
        status: derive_status(&legal_name, terminated_on.is_some(), false),
        legal_name,
        country: Country::Pl,
        registered_address: address.and_then(white_list_address),
        associates: representatives.chain(clerks).chain(partners).collect(),
        tax_flags: TaxFlags {
            vat_registered: subject
                .status_vat
                .as_deref()
                .map(|s| s.eq_ignore_ascii_case("Czynny")),
            debt_amount: None,
        },
        legal_form: None,
        founded_on: parse_date(subject.registration_legal_date.as_deref()),
        terminated_on,
        source_provider: provider.to_string(),
        fetched_at: Utc::now(),
    })
}

/// Statuses under which a CEIDG entry no longer trades.
const CEIDG_CLOSED: [&str; 2] = ["WYKRESLONY", "ZAKONCZONY"];

pub(super) fn normalize_ceidg(
    identifier: &Identifier,
    provider: &str,
    firm: &CeidgFirm,
) -> Result<CanonicalRecord, ProviderError> {
    let legal_name = require_name(provider, firm.nazwa.as_deref())?;
    let terminated_on = parse_date(firm.data_zakonczenia.as_deref());
    let closed = firm
        .status
        .as_deref()
        .is_some_and(|s| CEIDG_CLOSED.iter().any(|c| s.eq_ignore_ascii_case(c)));

    // the trader is the business; the owner is its only associate
    let associates = firm
        .wlasciciel
        .as_ref()
        .and_then(|owner| join_parts([owner.imie.as_deref(), owner.nazwisko.as_deref()], " "))
        .map(|name| vec![person(name, AssociateRole::Owner)])
        .unwrap_or_default();

    Ok(CanonicalRecord {
        identifier: identifier.clone(),
        status: derive_status(&legal_name, closed || terminated_on.is_some(), false),
        legal_name,
        country: Country::Pl,
        registered_address: firm.adres_dzialalnosci.as_ref().and_then(ceidg_address),
        associates,
        tax_flags: TaxFlags::default(),
        legal_form: Some("jednoosobowa działalność gospodarcza".to_string()),
        founded_on: parse_date(firm.data_rozpoczecia.as_deref()),
        terminated_on,
        source_provider: provider.to_string(),
        fetched_at: Utc::now(),
    })
}

fn ceidg_address(adres: &CeidgAddress) -> Option<Address> {
    let number = match (adres.budynek.as_deref(), adres.lokal.as_deref()) {
        (Some(house), Some(flat)) => Some(format!("{house}/{flat}")),
        (house, _) => house.map(str::to_string),
    };
    let street = join_parts([adres.ulica.as_deref(), number.as_deref()], " ");
    let postal_code = clean_text(adres.kod.as_deref());
    let city = clean_text(adres.miasto.as_deref());
    let locality = join_parts([postal_code.as_deref(), city.as_deref()], " ");

    Some(Address {
        text: join_parts([street.as_deref(), locality.as_deref()], ", ")?,
        country: adres
            .kraj
            .as_deref()
            .and_then(Country::from_name_or_code)
            .unwrap_or(Country::Pl),
        postal_code,
        city,
    })
}

fn person(name: String, role: AssociateRole) -> Associate {
    Associate {
        party: Party::Person {
            person_id: person_id(Country::Pl, &name),
            country: None,
        },
        name,
        role,
        share_pct: None,
    }
}

fn krs_person_name(given: Option<&KrsGivenNames>, surname: Option<&KrsSurname>) -> Option<String> {
    let surname = surname.and_then(|s| {
        let parts = [s.nazwisko_i_czlon.as_deref(), s.nazwisko_ii_czlon.as_deref()];
        join_parts(parts, "-")
    });
    join_parts(
        [given.and_then(|g| g.imie.as_deref()), surname.as_deref()],
        " ",
    )
}

fn krs_address(adres: &KrsAddress) -> Option<Address> {
    let number = match (adres.nr_domu.as_deref(), adres.nr_lokalu.as_deref()) {
        (Some(house), Some(flat)) => Some(format!("{house}/{flat}")),
        (house, _) => house.map(str::to_string),
    };
    let street = join_parts([adres.ulica.as_deref(), number.as_deref()], " ");
    let postal_code = clean_text(adres.kod_pocztowy.as_deref());
    let city = clean_text(adres.miejscowosc.as_deref());
    let locality = join_parts([postal_code.as_deref(), city.as_deref()], " ");

    Some(Address {
        text: join_parts([street.as_deref(), locality.as_deref()], ", ")?,
        country: adres
            .kraj
            .as_deref()
            .and_then(Country::from_name_or_code)
            .unwrap_or(Country::Pl),
        postal_code,
        city,
    })
}

/// White List addresses are single strings: `ULICA 1, 00-001 MIASTO`.
fn white_list_address(raw: &str) -> Option<Address> {
    let text = clean_text(Some(raw))?;
    let locality = text.rsplit(',').next().map(str::trim).unwrap_or_default();
    let (postal_code, city) = match locality.split_once(' ') {
        Some((code, city)) if is_postal_code(code) => {
            (Some(code.to_string()), clean_text(Some(city)))
        }
        _ => (None, None),
    };

    Some(Address {
        text,
        postal_code,
        city,
        country: Country::Pl,
    })
}

fn is_postal_code(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 6
        && bytes[2] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 2 || b.is_ascii_digit())
}

fn white_list_associate(entry: &WlPerson, role: AssociateRole) -> Option<Associate> {
    if let Some(name) = clean_text(entry.company_name.as_deref()) {
        let identifier = entry
            .nip
            .as_deref()
            .and_then(|nip| validators::digits(nip, 10))
            .filter(|nip| validators::pl_nip_checksum(nip))
            .map(|nip| Identifier::new(Country::Pl, IdentifierKind::TaxNumber, nip));
        let Some(identifier) = identifier else {
            debug!(name = %name, "skipping legal-person associate without nip");
            return None;
        };
        return Some(Associate {
            name,
            role,
            share_pct: None,
            party: Party::Company { identifier },
        });
    }

    let name = join_parts([entry.first_name.as_deref(), entry.last_name.as_deref()], " ")?;
    Some(person(name, role))
}
