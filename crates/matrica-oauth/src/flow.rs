//! Redirect round-trip helpers.
//!
//! [`AuthClient::authorization_url`] leaves correlating the callback with its
//! verifier to the caller. These helpers do that through an application-owned
//! [`SessionStore`], keyed by a random `state` value.

use std::time::Duration;

use matrica_common::HttpClient;
use matrica_common::session::SessionStore;
use smol_str::SmolStr;

use crate::client::AuthClient;
use crate::error::{OAuthError, Result};
use crate::pkce::{generate_pkce, generate_state};
use crate::session::Session;
use crate::types::{CallbackParams, PendingAuthorization};

/// How long a parked verifier stays valid.
pub const DEFAULT_STATE_TTL: Duration = Duration::from_secs(600);

impl<T> AuthClient<T>
where
    T: HttpClient + Send + Sync,
{
    /// Build an authorization URL carrying a fresh `state` and park the
    /// verifier under it.
    pub async fn start_authorization<S>(&self, store: &S, scope: &str) -> Result<PendingAuthorization>
    where
        S: SessionStore<SmolStr, SmolStr> + ?Sized,
    {
        self.start_authorization_with_ttl(store, scope, DEFAULT_STATE_TTL)
            .await
    }

    pub async fn start_authorization_with_ttl<S>(
        &self,
        store: &S,
        scope: &str,
        ttl: Duration,
    ) -> Result<PendingAuthorization>
    where
        S: SessionStore<SmolStr, SmolStr> + ?Sized,
    {
        let (challenge, verifier) = generate_pkce();
        let state = generate_state();
        let url = self.build_authorization_url(scope, &challenge, Some(&state))?;
        store.set(state.clone(), verifier, Some(ttl)).await?;
        Ok(PendingAuthorization { url, state })
    }

    /// Resolve a callback: consume the verifier parked under its `state`, then
    /// exchange the code. Of concurrent callbacks carrying the same `state`,
    /// only one reaches the token endpoint.
    ///
    /// A missing, unknown or expired state fails without any network call.
    pub async fn complete_authorization<S>(
        &self,
        store: &S,
        params: CallbackParams,
    ) -> Result<Session<T>>
    where
        S: SessionStore<SmolStr, SmolStr> + ?Sized,
    {
        let Some(state) = params.state else {
            return Err(OAuthError::unknown_state().with_context("missing state parameter"));
        };
        // consumed before the exchange
        let Some(verifier) = store.take(&state).await? else {
            #[cfg(feature = "tracing")]
            tracing::warn!("callback with unknown authorization state");
            return Err(OAuthError::unknown_state());
        };
        self.create_session(&params.code, &verifier).await
    }
}
