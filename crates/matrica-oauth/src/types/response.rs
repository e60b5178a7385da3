use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Error body returned by the token and resource endpoints.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct OAuthErrorResponse {
    pub error: Option<SmolStr>,
    pub error_description: Option<SmolStr>,
}

/// Authorization redirect plus the PKCE verifier the caller must keep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub url: String,
    pub code_verifier: SmolStr,
}

/// Authorization redirect whose verifier is parked in a state store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAuthorization {
    pub url: String,
    pub state: SmolStr,
}

/// Paging metadata read from `Pagination-*` response headers.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pagination {
    pub count: u64,
    pub skip: u64,
    pub take: u64,
}

/// One page of a list resource.
///
/// `pagination` is `None` when the API version does not page the resource.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Option<Pagination>,
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether the server reports items beyond this page.
    pub fn has_more(&self) -> bool {
        self.pagination
            .is_some_and(|p| p.skip.saturating_add(self.items.len() as u64) < p.count)
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}
