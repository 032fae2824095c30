//! NAV taxpayer query models.
//!
//! Field names follow the NAV Online Számla `QueryTaxpayer` response, as
//! served in JSON by the NAV gateway.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavTaxpayerResponse {
    /// `false` when the tax number exists but is suspended or deleted
    pub taxpayer_validity: Option<bool>,
    pub taxpayer_data: Option<NavTaxpayerData>,
    /// Company executives, when the gateway enriches from the company register
    #[serde(default)]
    pub executives: Vec<NavExecutive>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavTaxpayerData {
    pub taxpayer_name: Option<String>,
    pub taxpayer_short_name: Option<String>,
    /// `ORGANIZATION`, `SELF_EMPLOYED`, ...
    pub incorporation: Option<String>,
    pub vat_group_membership: Option<String>,
    pub tax_number_detail: Option<NavTaxNumberDetail>,
    #[serde(default)]
    pub taxpayer_address_list: Vec<NavAddressItem>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavTaxNumberDetail {
    pub taxpayer_id: Option<String>,
    pub vat_code: Option<String>,
    pub county_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavAddressItem {
    /// `HQ`, `SITE` or `BRANCH`
    pub taxpayer_address_type: Option<String>,
    pub taxpayer_address: Option<NavAddress>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavAddress {
    pub country_code: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub street_name: Option<String>,
    pub public_place_category: Option<String>,
    pub number: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavExecutive {
    pub name: String,
    pub role: Option<String>,
}
