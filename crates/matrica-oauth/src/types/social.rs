use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::{SmolStr, format_smolstr};

use crate::error::OAuthError;

/// Social networks a user can link.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SocialPlatform {
    Twitter,
    Discord,
    Telegram,
}

impl SocialPlatform {
    pub const ALL: [SocialPlatform; 3] = [
        SocialPlatform::Twitter,
        SocialPlatform::Discord,
        SocialPlatform::Telegram,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SocialPlatform::Twitter => "twitter",
            SocialPlatform::Discord => "discord",
            SocialPlatform::Telegram => "telegram",
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            SocialPlatform::Twitter => "/twitter",
            SocialPlatform::Discord => "/discord",
            SocialPlatform::Telegram => "/telegram",
        }
    }
}

impl fmt::Display for SocialPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SocialPlatform {
    type Err = OAuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| OAuthError::config(format_smolstr!("unknown social platform: {s}")))
    }
}

/// Linked social account.
///
/// v1 returns the full credential record (`username`, `platform`), v2 a
/// summary (`externalName`, `name`). Both decode into this type.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SocialAccount {
    #[serde(default)]
    pub external_id: Option<SmolStr>,
    #[serde(default)]
    pub external_name: Option<SmolStr>,
    #[serde(default)]
    pub username: Option<SmolStr>,
    #[serde(default)]
    pub platform: Option<SocialPlatform>,
    #[serde(default)]
    pub name: Option<SmolStr>,
    #[serde(flatten)]
    pub extra_data: BTreeMap<SmolStr, Value>,
}

impl SocialAccount {
    pub fn display_name(&self) -> Option<&str> {
        self.external_name.as_deref().or(self.username.as_deref())
    }
}
