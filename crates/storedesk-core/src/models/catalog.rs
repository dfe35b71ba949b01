use serde::{Deserialize, Serialize};

use super::default_status;

/// Storefront information page (menu entries, banners, footer links).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct StoreInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub code: String,
    #[serde(default)]
    pub parent_code: Option<String>,
    pub name: String,
    #[serde(default)]
    pub sort: i32,
    #[serde(default = "default_status")]
    pub status: i32,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub file_key: Option<String>,
    #[serde(default)]
    pub media_id: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default = "default_status")]
    pub status: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_status")]
    pub status: i32,
    #[serde(default)]
    pub is_show: bool,
}
