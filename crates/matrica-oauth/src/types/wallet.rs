use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum NetworkSymbol {
    #[serde(rename = "SOL")]
    Sol,
    #[serde(rename = "ETH")]
    Eth,
    #[serde(rename = "BTC")]
    Btc,
    #[serde(rename = "MATIC")]
    Matic,
    #[serde(other)]
    Unknown,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum WalletStatus {
    Healthy,
    Unhealthy,
    #[serde(other)]
    Unknown,
}

/// Wallet linked to the user. `id` is the on-chain address.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserWallet {
    pub id: SmolStr,
    #[serde(default)]
    pub index: Option<i64>,
    #[serde(default)]
    pub network_symbol: Option<NetworkSymbol>,
    #[serde(default)]
    pub status: Option<WalletStatus>,
    #[serde(default)]
    pub created_date: Option<SmolStr>,
    #[serde(default)]
    pub updated_date: Option<SmolStr>,
    #[serde(flatten)]
    pub extra_data: BTreeMap<SmolStr, Value>,
}

/// Fungible token balance held in one of the user's wallets.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WalletToken {
    #[serde(default)]
    pub wallet_id: Option<SmolStr>,
    #[serde(default)]
    pub token_id: Option<SmolStr>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(flatten)]
    pub extra_data: BTreeMap<SmolStr, Value>,
}
