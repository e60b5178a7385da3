//! API-version strategy.
//!
//! The user API exists in two generations. V1 answers every resource with the
//! raw payload and has no pagination. V2 lives under `/v2/user`, wraps most
//! payloads in a single-field envelope, and pages list endpoints through
//! `Pagination-*` response headers. One [`Session`](crate::session::Session)
//! serves both by consulting [`ApiVersion::shape`] per resource.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::OAuthError;
use crate::types::SocialPlatform;

/// Version of the user API a client targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiVersion {
    V1,
    #[default]
    V2,
}

impl ApiVersion {
    pub fn as_str(self) -> &'static str {
        match self {
            ApiVersion::V1 => "v1",
            ApiVersion::V2 => "v2",
        }
    }

    /// Path appended to the API host for user resources.
    pub fn user_path(self) -> &'static str {
        match self {
            ApiVersion::V1 => "/user",
            ApiVersion::V2 => "/v2/user",
        }
    }

    /// Whether list endpoints report pagination metadata.
    pub fn paginates(self) -> bool {
        matches!(self, ApiVersion::V2)
    }

    /// How `resource` is answered under this version, or `None` if the version
    /// does not serve it at all.
    pub fn shape(self, resource: Resource) -> Option<ResponseShape> {
        use ResponseShape::*;
        match (self, resource) {
            (_, Resource::Email) => Some(Raw),
            (ApiVersion::V1, Resource::Roles) => None,
            (ApiVersion::V1, Resource::Domains) => Some(Envelope("domains")),
            (ApiVersion::V1, _) => Some(Raw),
            (ApiVersion::V2, Resource::Nfts | Resource::Tokens | Resource::Domains) => {
                Some(Paginated)
            }
            (ApiVersion::V2, resource) => Some(Envelope(resource.name())),
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiVersion {
    type Err = OAuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v1" | "1" | "legacy" => Ok(ApiVersion::V1),
            "v2" | "2" => Ok(ApiVersion::V2),
            other => Err(OAuthError::config(smol_str::format_smolstr!(
                "unknown api version: {other}"
            ))),
        }
    }
}

/// Protected user resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Profile,
    Wallets,
    Nfts,
    Tokens,
    Social(SocialPlatform),
    Domains,
    Email,
    Roles,
}

impl Resource {
    /// Name of the resource, doubling as its envelope field.
    pub fn name(self) -> &'static str {
        match self {
            Resource::Profile => "profile",
            Resource::Wallets => "wallets",
            Resource::Nfts => "nfts",
            Resource::Tokens => "tokens",
            Resource::Social(platform) => platform.as_str(),
            Resource::Domains => "domains",
            Resource::Email => "email",
            Resource::Roles => "roles",
        }
    }

    /// Path below the user base URL.
    pub fn path(self) -> &'static str {
        match self {
            Resource::Profile => "/profile",
            Resource::Wallets => "/wallets",
            Resource::Nfts => "/nfts",
            Resource::Tokens => "/tokens",
            Resource::Social(platform) => platform.path(),
            Resource::Domains => "/domains",
            Resource::Email => "/email",
            Resource::Roles => "/roles",
        }
    }
}

/// Response body layout of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// Body is the payload itself
    Raw,
    /// Body is `{ "<field>": payload }`
    Envelope(&'static str),
    /// Body is a list; counts come from `Pagination-*` headers
    Paginated,
}
