use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;

/// Account record behind the `profile` resource.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: SmolStr,
    #[serde(default)]
    pub username: Option<SmolStr>,
    #[serde(default)]
    pub is_admin: Option<bool>,
    #[serde(default)]
    pub registered: Option<bool>,
    #[serde(default)]
    pub profile: Option<ProfileDetails>,
    #[serde(default)]
    pub created_date: Option<SmolStr>,
    #[serde(default)]
    pub updated_date: Option<SmolStr>,
    #[serde(flatten)]
    pub extra_data: BTreeMap<SmolStr, Value>,
}

/// Public-facing profile page settings.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDetails {
    #[serde(default)]
    pub id: Option<SmolStr>,
    #[serde(default)]
    pub name: Option<SmolStr>,
    #[serde(default, rename = "vanityURL")]
    pub vanity_url: Option<SmolStr>,
    #[serde(default)]
    pub about: Option<SmolStr>,
    #[serde(default)]
    pub website: Option<SmolStr>,
    #[serde(default)]
    pub email_verified: Option<bool>,
    #[serde(default)]
    pub pfp: Option<SmolStr>,
    #[serde(default)]
    pub banner: Option<SmolStr>,
    #[serde(flatten)]
    pub extra_data: BTreeMap<SmolStr, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailResponse {
    #[serde(default)]
    pub email: Option<SmolStr>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserRole {
    #[serde(default)]
    pub id: Option<SmolStr>,
    #[serde(default)]
    pub name: Option<SmolStr>,
    #[serde(flatten)]
    pub extra_data: BTreeMap<SmolStr, Value>,
}
