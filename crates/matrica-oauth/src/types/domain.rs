use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;

/// Name-service domain owned by one of the user's wallets.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    /// Full domain, e.g. `alice.sol`
    pub key: SmolStr,
    #[serde(default)]
    pub name: Option<SmolStr>,
    #[serde(default)]
    pub extension: Option<SmolStr>,
    /// v1 owner address
    #[serde(default)]
    pub owner: Option<SmolStr>,
    /// v2 owner wallet
    #[serde(default)]
    pub owner_wallet: Option<OwnerWallet>,
    #[serde(flatten)]
    pub extra_data: BTreeMap<SmolStr, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OwnerWallet {
    pub id: SmolStr,
    #[serde(default)]
    pub network_symbol: Option<SmolStr>,
}

impl Domain {
    /// Owning wallet address, whichever API version produced the record.
    pub fn owner_address(&self) -> Option<&str> {
        self.owner_wallet
            .as_ref()
            .map(|w| w.id.as_str())
            .or(self.owner.as_deref())
    }
}
