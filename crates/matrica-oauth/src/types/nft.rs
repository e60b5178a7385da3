use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Nft {
    pub id: SmolStr,
    #[serde(default)]
    pub name: Option<SmolStr>,
    #[serde(default)]
    pub image: Option<SmolStr>,
    #[serde(default)]
    pub status: Option<SmolStr>,
    #[serde(default)]
    pub network_symbol: Option<SmolStr>,
    /// Wallet address holding the item
    #[serde(default)]
    pub owner_id: Option<SmolStr>,
    #[serde(default)]
    pub collection: Option<NftCollection>,
    #[serde(default)]
    pub is_compressed: Option<bool>,
    #[serde(default)]
    pub inscription_number: Option<i64>,
    #[serde(flatten)]
    pub extra_data: BTreeMap<SmolStr, Value>,
}

/// Collection reference: a bare name on v1, an object on v2.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum NftCollection {
    Info(CollectionInfo),
    Name(SmolStr),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CollectionInfo {
    pub id: SmolStr,
    #[serde(default)]
    pub name: Option<SmolStr>,
    #[serde(flatten)]
    pub extra_data: BTreeMap<SmolStr, Value>,
}
