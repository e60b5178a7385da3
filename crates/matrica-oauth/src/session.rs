use chrono::{TimeDelta, Utc};
use http::Response;
use matrica_common::HttpClient;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use smol_str::SmolStr;
use tokio::sync::{Mutex, RwLock};

use crate::EXPIRY_SKEW_SECS;
use crate::api::{ApiVersion, Resource, ResponseShape};
use crate::client::AuthClient;
use crate::error::{OAuthError, Result};
use crate::request::{bearer_request, call, decode_json, pagination_from_headers, refresh};
use crate::types::{
    Domain, DomainQuery, EmailResponse, Nft, NftQuery, Page, SocialAccount, SocialPlatform,
    TokenQuery, TokenSet, UserProfile, UserRole, UserWallet, WalletToken,
};

/// Authenticated user session.
///
/// Owns the current [`TokenSet`] and refreshes it on demand. Every accessor
/// goes through [`Session::access_token`], so an expiring token is renewed
/// before the request is sent.
///
/// Implicit refreshes are single-flight: tasks that find the token expiring
/// while another task is refreshing wait for that refresh and reuse its result.
pub struct Session<T> {
    client: AuthClient<T>,
    tokens: RwLock<Option<TokenSet>>,
    refresh_lock: Mutex<()>,
}

/// Result of [`Session::overview`]. Each field settles independently.
#[derive(Debug)]
pub struct UserOverview {
    pub profile: Result<Option<UserProfile>>,
    pub wallets: Result<Vec<UserWallet>>,
    pub twitter: Result<Option<SocialAccount>>,
    pub discord: Result<Option<SocialAccount>>,
    pub telegram: Result<Option<SocialAccount>>,
    pub email: Result<EmailResponse>,
}

fn skew() -> TimeDelta {
    TimeDelta::seconds(EXPIRY_SKEW_SECS)
}

impl<T> Session<T>
where
    T: HttpClient + Send + Sync,
{
    pub fn new(client: &AuthClient<T>, tokens: Option<TokenSet>) -> Self {
        Self {
            client: client.clone(),
            tokens: RwLock::new(tokens),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn client(&self) -> &AuthClient<T> {
        &self.client
    }

    pub fn api_version(&self) -> ApiVersion {
        self.client.config().api_version
    }

    /// Snapshot of the held tokens.
    pub async fn tokens(&self) -> Option<TokenSet> {
        self.tokens.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.tokens.read().await.is_some()
    }

    /// Replace the held tokens. Expiry is computed from the set as given.
    pub async fn set_tokens(&self, tokens: impl Into<TokenSet>) {
        *self.tokens.write().await = Some(tokens.into());
    }

    /// Current access token, refreshed first if it is within the expiry skew.
    pub async fn access_token(&self) -> Result<SmolStr> {
        let stale = match self.tokens.read().await.as_ref() {
            None => return Err(OAuthError::no_tokens()),
            Some(t) if !t.is_expiring(Utc::now(), skew()) => return Ok(t.access_token.clone()),
            Some(t) => t.access_token.clone(),
        };

        let _flight = self.refresh_lock.lock().await;
        match self.tokens.read().await.as_ref() {
            None => return Err(OAuthError::no_tokens()),
            // refreshed by whoever held the lock before us
            Some(t) if t.access_token != stale || !t.is_expiring(Utc::now(), skew()) => {
                return Ok(t.access_token.clone());
            }
            Some(_) => {}
        }
        #[cfg(feature = "tracing")]
        tracing::debug!("access token expiring, refreshing");
        Ok(self.refresh_locked().await?.access_token)
    }

    /// Exchange the refresh token for a new token pair.
    ///
    /// On failure the previously held tokens stay in place.
    pub async fn refresh(&self) -> Result<TokenSet> {
        let _flight = self.refresh_lock.lock().await;
        self.refresh_locked().await
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip_all))]
    async fn refresh_locked(&self) -> Result<TokenSet> {
        let refresh_token = self
            .tokens
            .read()
            .await
            .as_ref()
            .and_then(|t| t.refresh_token.clone())
            .ok_or_else(OAuthError::no_refresh_token)?;

        match refresh(&self.client.inner, &refresh_token).await {
            Ok(fresh) => {
                *self.tokens.write().await = Some(fresh.clone());
                #[cfg(feature = "tracing")]
                tracing::info!(expires_in = fresh.expires_in, "tokens refreshed");
                Ok(fresh)
            }
            Err(e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %e, code = e.code(), "token refresh failed");
                Err(e)
            }
        }
    }

    /// `GET` a path below the user base URL and decode the raw JSON body.
    pub async fn get<O>(&self, path: &str) -> Result<O>
    where
        O: DeserializeOwned,
    {
        self.fetch(path, String::new(), |r| decode_json(r.body(), path))
            .await
    }

    /// Like [`get`](Self::get) with a form-encoded query string.
    pub async fn get_with_query<O, Q>(&self, path: &str, query: &Q) -> Result<O>
    where
        O: DeserializeOwned,
        Q: Serialize,
    {
        let query = encode_query(query)?;
        self.fetch(path, query, |r| decode_json(r.body(), path)).await
    }

    /// `GET` a list path, reading paging metadata from the response headers.
    pub async fn get_paginated<O, Q>(&self, path: &str, query: &Q) -> Result<Page<O>>
    where
        O: DeserializeOwned,
        Q: Serialize,
    {
        let query = encode_query(query)?;
        self.fetch(path, query, |r| {
            let items: Option<Vec<O>> = decode_json(r.body(), path)?;
            Ok(Page {
                items: items.unwrap_or_default(),
                pagination: Some(pagination_from_headers(r.headers())),
            })
        })
        .await
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip(self, query, parse)))]
    async fn fetch<O, P>(&self, path: &str, query: String, parse: P) -> Result<O>
    where
        P: Fn(&Response<Vec<u8>>) -> Result<O>,
    {
        let token = self.access_token().await?;
        let inner = &self.client.inner;
        let url = format!("{}{}{}", inner.endpoints.user, path, query);
        let fallback = format!("Failed to fetch {path}");
        call(inner, path, &fallback, || bearer_request(&url, &token), parse).await
    }

    fn shape_of(&self, resource: Resource) -> Result<ResponseShape> {
        let version = self.api_version();
        version
            .shape(resource)
            .ok_or_else(|| OAuthError::unsupported(resource.name(), version.as_str()))
    }

    async fn fetch_resource<O>(&self, resource: Resource) -> Result<Option<O>>
    where
        O: DeserializeOwned,
    {
        let shape = self.shape_of(resource)?;
        self.fetch(resource.path(), String::new(), |r| {
            decode_shaped(shape, r.body(), resource.name())
        })
        .await
    }

    async fn fetch_list<O, Q>(&self, resource: Resource, query: &Q) -> Result<Page<O>>
    where
        O: DeserializeOwned,
        Q: Serialize,
    {
        let shape = self.shape_of(resource)?;
        let query = encode_query(query)?;
        self.fetch(resource.path(), query, |r| {
            let items: Option<Vec<O>> = decode_shaped(shape, r.body(), resource.name())?;
            let pagination =
                (shape == ResponseShape::Paginated).then(|| pagination_from_headers(r.headers()));
            Ok(Page {
                items: items.unwrap_or_default(),
                pagination,
            })
        })
        .await
    }

    pub async fn profile(&self) -> Result<Option<UserProfile>> {
        self.fetch_resource(Resource::Profile).await
    }

    pub async fn wallets(&self) -> Result<Vec<UserWallet>> {
        Ok(self
            .fetch_resource(Resource::Wallets)
            .await?
            .unwrap_or_default())
    }

    pub async fn nfts(&self, query: &NftQuery) -> Result<Page<Nft>> {
        self.fetch_list(Resource::Nfts, query).await
    }

    /// Fungible token balances across the user's wallets.
    pub async fn tokens_held(&self, query: &TokenQuery) -> Result<Page<WalletToken>> {
        self.fetch_list(Resource::Tokens, query).await
    }

    pub async fn social(&self, platform: SocialPlatform) -> Result<Option<SocialAccount>> {
        self.fetch_resource(Resource::Social(platform)).await
    }

    pub async fn twitter(&self) -> Result<Option<SocialAccount>> {
        self.social(SocialPlatform::Twitter).await
    }

    pub async fn discord(&self) -> Result<Option<SocialAccount>> {
        self.social(SocialPlatform::Discord).await
    }

    pub async fn telegram(&self) -> Result<Option<SocialAccount>> {
        self.social(SocialPlatform::Telegram).await
    }

    pub async fn domains(&self, query: &DomainQuery) -> Result<Page<Domain>> {
        self.fetch_list(Resource::Domains, query).await
    }

    pub async fn email(&self) -> Result<EmailResponse> {
        Ok(self
            .fetch_resource(Resource::Email)
            .await?
            .unwrap_or_default())
    }

    /// Roles granted to the user. Not served by [`ApiVersion::V1`].
    pub async fn roles(&self) -> Result<Vec<UserRole>> {
        Ok(self
            .fetch_resource(Resource::Roles)
            .await?
            .unwrap_or_default())
    }

    /// Fetch profile, wallets, linked socials and email concurrently.
    ///
    /// A failing resource does not abort the others.
    pub async fn overview(&self) -> UserOverview {
        let (profile, wallets, twitter, discord, telegram, email) = tokio::join!(
            self.profile(),
            self.wallets(),
            self.twitter(),
            self.discord(),
            self.telegram(),
            self.email(),
        );
        UserOverview {
            profile,
            wallets,
            twitter,
            discord,
            telegram,
            email,
        }
    }
}

fn encode_query<Q: Serialize>(query: &Q) -> Result<String> {
    let encoded = serde_html_form::to_string(query)?;
    if encoded.is_empty() {
        Ok(encoded)
    } else {
        Ok(format!("?{encoded}"))
    }
}

/// Decode a body according to its shape. A missing or `null` envelope field
/// decodes to `None`.
fn decode_shaped<O>(shape: ResponseShape, body: &[u8], what: &str) -> Result<Option<O>>
where
    O: DeserializeOwned,
{
    match shape {
        ResponseShape::Envelope(field) => {
            let mut value: Value = decode_json(body, what)?;
            match value.get_mut(field).map(Value::take) {
                None | Some(Value::Null) => Ok(None),
                Some(inner) => serde_json::from_value(inner)
                    .map(Some)
                    .map_err(|e| OAuthError::decode(what, e)),
            }
        }
        ResponseShape::Raw | ResponseShape::Paginated => decode_json(body, what),
    }
}
