//! Slovak Register of Legal Entities (RPO) response models.
//!
//! Most RPO attributes are historised: every value comes with validity dates
//! and the current value is the one without `validTo`.

use serde::Deserialize;

/// `GET /rpo/v1/search?identifier=` response
#[derive(Debug, Clone, Deserialize)]
pub struct RpoSearchResponse {
    #[serde(default)]
    pub results: Vec<RpoEntity>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpoEntity {
    #[serde(default)]
    pub identifiers: Vec<RpoValue>,
    #[serde(default)]
    pub full_names: Vec<RpoValue>,
    #[serde(default)]
    pub addresses: Vec<RpoAddress>,
    #[serde(default)]
    pub legal_forms: Vec<RpoCodedValue>,
    pub establishment: Option<String>,
    pub termination: Option<String>,
    #[serde(default)]
    pub statutory_bodies: Vec<RpoStakeholder>,
    #[serde(default)]
    pub stakeholders: Vec<RpoStakeholder>,
    #[serde(default)]
    pub legal_statuses: Vec<RpoCodedValue>,
}

/// A historised plain value
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpoValue {
    pub value: String,
    pub valid_to: Option<String>,
}

/// Codelist entry
#[derive(Debug, Clone, Deserialize)]
pub struct RpoCode {
    pub value: String,
}

/// A historised codelist value
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpoCodedValue {
    pub value: RpoCode,
    pub valid_to: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpoAddress {
    pub street: Option<String>,
    pub reg_number: Option<u64>,
    pub building_number: Option<String>,
    #[serde(default)]
    pub postal_codes: Vec<String>,
    pub municipality: Option<RpoCode>,
    pub country: Option<RpoCode>,
    pub valid_to: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpoPersonName {
    pub formated_name: Option<String>,
    #[serde(default)]
    pub given_names: Vec<String>,
    #[serde(default)]
    pub family_names: Vec<String>,
}

/// A statutory body member or shareholder
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpoStakeholder {
    pub person_name: Option<RpoPersonName>,
    pub full_name: Option<String>,
    /// IČO when the stakeholder is itself a legal entity
    pub identifier: Option<String>,
    pub stakeholder_type: Option<RpoCode>,
    pub address: Option<RpoAddress>,
    pub share_pct: Option<f64>,
    pub valid_to: Option<String>,
}

/// Current value of a historised list
pub(crate) fn current<T, F>(values: &[T], valid_to: F) -> Option<&T>
where
    F: Fn(&T) -> Option<&String>,
{
    values
        .iter()
        .find(|v| valid_to(*v).is_none())
        .or_else(|| values.last())
}
