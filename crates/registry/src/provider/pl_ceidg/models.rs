//! CEIDG (sole-trader register) API v2 response models.

use serde::Deserialize;

/// `GET /firmy?nip=` response
#[derive(Debug, Clone, Deserialize)]
pub struct CeidgResponse {
    #[serde(default)]
    pub firmy: Vec<CeidgFirm>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CeidgFirm {
    pub id: Option<String>,
    pub nazwa: Option<String>,
    /// `AKTYWNY`, `ZAWIESZONY`, `WYKRESLONY`, `OCZEKUJE_NA_ROZPOCZECIE_DZIALALNOSCI`
    pub status: Option<String>,
    pub data_rozpoczecia: Option<String>,
    pub data_zakonczenia: Option<String>,
    pub adres_dzialalnosci: Option<CeidgAddress>,
    pub wlasciciel: Option<CeidgOwner>,
}

impl CeidgFirm {
    pub fn is_active(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("AKTYWNY"))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CeidgAddress {
    pub ulica: Option<String>,
    pub budynek: Option<String>,
    pub lokal: Option<String>,
    pub miasto: Option<String>,
    pub kod: Option<String>,
    pub kraj: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CeidgOwner {
    pub imie: Option<String>,
    pub nazwisko: Option<String>,
    pub nip: Option<String>,
    pub regon: Option<String>,
}
