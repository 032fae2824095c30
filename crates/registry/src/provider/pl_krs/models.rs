//! KRS (Krajowy Rejestr Sądowy) current-extract models.
//!
//! Only the sections the normalizer reads are modelled.

use serde::Deserialize;

/// `GET /api/krs/OdpisAktualny/{krs}` response
#[derive(Debug, Clone, Deserialize)]
pub struct KrsResponse {
    pub odpis: KrsExtract,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KrsExtract {
    pub naglowek_a: KrsHeader,
    pub dane: KrsData,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KrsHeader {
    #[serde(rename = "numerKRS")]
    pub numer_krs: Option<String>,
    /// `DD.MM.YYYY`
    #[serde(rename = "dataRejestracjiWKRS")]
    pub data_rejestracji_w_krs: Option<String>,
    pub data_wykreslenia_z_rejestru_przedsiebiorcow: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KrsData {
    pub dzial1: KrsSection1,
    pub dzial2: Option<KrsSection2>,
    pub dzial6: Option<KrsSection6>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KrsSection1 {
    pub dane_podmiotu: KrsEntity,
    pub siedziba_i_adres: Option<KrsSeat>,
    #[serde(default)]
    pub wspolnicy_spzoo: Vec<KrsPartner>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KrsEntity {
    pub forma_prawna: Option<String>,
    pub nazwa: Option<String>,
    pub identyfikatory: Option<KrsIdentifiers>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KrsIdentifiers {
    pub nip: Option<String>,
    pub regon: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KrsSeat {
    pub adres: Option<KrsAddress>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KrsAddress {
    pub ulica: Option<String>,
    pub nr_domu: Option<String>,
    pub nr_lokalu: Option<String>,
    pub miejscowosc: Option<String>,
    pub kod_pocztowy: Option<String>,
    pub kraj: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KrsSurname {
    pub nazwisko_i_czlon: Option<String>,
    #[serde(rename = "nazwiskoIICzlon")]
    pub nazwisko_ii_czlon: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KrsGivenNames {
    pub imie: Option<String>,
}

/// Shareholder of a limited liability company; legal persons carry `nazwa`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KrsPartner {
    pub nazwisko: Option<KrsSurname>,
    pub imiona: Option<KrsGivenNames>,
    pub nazwa: Option<String>,
    pub identyfikator: Option<KrsPartnerId>,
    pub posiadane_udzialy: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KrsPartnerId {
    pub krs: Option<String>,
    pub regon: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KrsSection2 {
    pub reprezentacja: Option<KrsRepresentation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KrsRepresentation {
    #[serde(default)]
    pub sklad: Vec<KrsBoardMember>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KrsBoardMember {
    pub nazwisko: Option<KrsSurname>,
    pub imiona: Option<KrsGivenNames>,
    pub funkcja_w_organie: Option<String>,
}

/// Liquidation, bankruptcy and dissolution section
#[derive(Debug, Clone, Deserialize)]
pub struct KrsSection6 {
    pub likwidacja: Option<serde_json::Value>,
    pub rozwiazanie: Option<serde_json::Value>,
}
