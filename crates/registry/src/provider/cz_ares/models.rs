//! ARES (Administrativní registr ekonomických subjektů) response models.

use serde::{Deserialize, Serialize};

/// Basic subject record (`GET /ekonomicke-subjekty/{ico}`)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AresSubject {
    pub ico: Option<String>,
    pub obchodni_jmeno: Option<String>,
    pub sidlo: Option<AresAddress>,
    pub pravni_forma: Option<String>,
    pub datum_vzniku: Option<String>,
    pub datum_zaniku: Option<String>,
    pub dic: Option<String>,
    pub seznam_registraci: Option<AresRegistrations>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AresAddress {
    pub textova_adresa: Option<String>,
    pub psc: Option<u32>,
    pub nazev_obce: Option<String>,
    pub kod_statu: Option<String>,
}

/// Source-register states (`AKTIVNI`, `ZANIKLY`, `NEEXISTUJICI`, ...)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AresRegistrations {
    pub stav_zdroje_vr: Option<String>,
    pub stav_zdroje_res: Option<String>,
    pub stav_zdroje_dph: Option<String>,
}

/// Name search request (`POST /ekonomicke-subjekty/vyhledat`)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AresSearchRequest<'a> {
    pub obchodni_jmeno: &'a str,
    pub pocet: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AresSearchResponse {
    #[serde(default)]
    pub pocet_celkem: u32,
    #[serde(default)]
    pub ekonomicke_subjekty: Vec<AresSubject>,
}

/// Commercial register detail (`GET /ekonomicke-subjekty-vr/{ico}`)
#[derive(Debug, Clone, Deserialize)]
pub struct AresVrResponse {
    #[serde(default)]
    pub zaznamy: Vec<AresVrRecord>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AresVrRecord {
    #[serde(default)]
    pub statutarni_organy: Vec<AresBody>,
    #[serde(default)]
    pub spolecnici: Vec<AresPartnerGroup>,
    /// Present while the company is in liquidation
    #[serde(default)]
    pub likvidace: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AresBody {
    #[serde(default)]
    pub clenove_organu: Vec<AresMember>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AresMember {
    pub fyzicka_osoba: Option<AresPerson>,
    pub pravnicka_osoba: Option<AresLegalPerson>,
    pub clenstvi: Option<AresMembership>,
    pub datum_vymazu: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AresMembership {
    pub funkce: Option<AresFunction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AresFunction {
    pub nazev: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AresPerson {
    pub jmeno: Option<String>,
    pub prijmeni: Option<String>,
    pub titul_pred_jmenem: Option<String>,
    pub statni_obcanstvi: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AresLegalPerson {
    pub ico: Option<String>,
    pub obchodni_jmeno: Option<String>,
    pub sidlo: Option<AresAddress>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AresPartnerGroup {
    #[serde(default)]
    pub spolecnik: Vec<AresPartner>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AresPartner {
    pub osoba: Option<AresMember>,
    #[serde(default)]
    pub podil: Vec<AresShare>,
    pub datum_vymazu: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AresShare {
    pub velikost_podilu: Option<AresShareSize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AresShareSize {
    /// `PROCENTA` or `ZLOMEK`
    pub typ_obnos: Option<String>,
    pub hodnota: Option<String>,
}
