//! Biała Lista (VAT taxpayer white list) response models.

use serde::Deserialize;

/// `GET /api/search/nip/{nip}?date=` response
#[derive(Debug, Clone, Deserialize)]
pub struct WlResponse {
    pub result: WlResult,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WlResult {
    pub subject: Option<WlSubject>,
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WlSubject {
    pub name: Option<String>,
    pub nip: Option<String>,
    /// `Czynny`, `Zwolniony` or `Niezarejestrowany`
    pub status_vat: Option<String>,
    pub regon: Option<String>,
    pub krs: Option<String>,
    pub residence_address: Option<String>,
    pub working_address: Option<String>,
    #[serde(default)]
    pub representatives: Vec<WlPerson>,
    #[serde(default)]
    pub authorized_clerks: Vec<WlPerson>,
    #[serde(default)]
    pub partners: Vec<WlPerson>,
    pub registration_legal_date: Option<String>,
    pub removal_date: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WlPerson {
    pub company_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub nip: Option<String>,
}
