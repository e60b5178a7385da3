use std::sync::Arc;

use matrica_common::HttpClient;
use url::Url;

use crate::config::{ClientConfig, Endpoints};
use crate::error::{OAuthError, Result};
use crate::pkce::generate_pkce;
use crate::request::exchange_code;
use crate::retry::RetryPolicy;
use crate::session::Session;
use crate::types::{
    AuthorizationCodeChallengeMethod, AuthorizationRequest, AuthorizationRequestParameters,
    AuthorizationResponseType, TokenSet,
};

/// Default scope requested by [`AuthClient::authorization_url`] callers that
/// have no particular needs.
pub const DEFAULT_SCOPE: &str = "profile";

/// Shared state between a client and the sessions it creates.
#[derive(Clone)]
pub(crate) struct ClientInner<T> {
    pub(crate) http: T,
    pub(crate) config: ClientConfig,
    pub(crate) endpoints: Endpoints,
    pub(crate) retry: RetryPolicy,
}

/// OAuth client for one application registration.
///
/// Holds configuration and the HTTP transport, builds authorization URLs and
/// turns authorization codes into [`Session`]s. Cheap to clone.
pub struct AuthClient<T> {
    pub(crate) inner: Arc<ClientInner<T>>,
}

impl<T> Clone for AuthClient<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

#[cfg(all(feature = "reqwest-client", not(target_arch = "wasm32")))]
impl AuthClient<reqwest::Client> {
    /// Validate `config` and build a client backed by `reqwest`.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| {
                OAuthError::new(
                    crate::error::OAuthErrorKind::Config("failed to build HTTP client".into()),
                    Some(Box::new(e)),
                )
            })?;
        Self::with_http_client(config, http)
    }
}

impl<T> AuthClient<T>
where
    T: HttpClient + Send + Sync,
{
    /// Validate `config` and build a client on top of any [`HttpClient`].
    pub fn with_http_client(config: ClientConfig, http: T) -> Result<Self> {
        config.validate()?;
        let endpoints = config.endpoints();
        let retry = RetryPolicy::from_config(&config);
        #[cfg(feature = "tracing")]
        tracing::debug!(
            environment = %config.environment,
            api_version = %config.api_version,
            max_retries = config.max_retries,
            "oauth client configured"
        );
        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                config,
                endpoints,
                retry,
            }),
        })
    }

    /// Replace the backoff tuning derived from the configuration.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self
    where
        T: Clone,
    {
        Arc::make_mut(&mut self.inner).retry = retry;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.inner.endpoints
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.inner.retry
    }

    pub fn http_client(&self) -> &T {
        &self.inner.http
    }

    /// Build the redirect URL for `scope` with a fresh PKCE pair.
    ///
    /// The returned verifier must be kept by the caller and handed back to
    /// [`create_session`](Self::create_session) with the authorization code.
    pub fn authorization_url(&self, scope: &str) -> Result<AuthorizationRequest> {
        let (challenge, code_verifier) = generate_pkce();
        let url = self.build_authorization_url(scope, &challenge, None)?;
        Ok(AuthorizationRequest { url, code_verifier })
    }

    pub(crate) fn build_authorization_url(
        &self,
        scope: &str,
        code_challenge: &str,
        state: Option<&str>,
    ) -> Result<String> {
        let config = &self.inner.config;
        let query = serde_html_form::to_string(AuthorizationRequestParameters {
            response_type: AuthorizationResponseType::Code,
            client_id: &config.client_id,
            redirect_uri: &config.redirect_uri,
            scope,
            code_challenge,
            code_challenge_method: AuthorizationCodeChallengeMethod::S256,
            state,
        })?;
        let mut url = Url::parse(&self.inner.endpoints.frontend).map_err(|e| {
            OAuthError::new(
                crate::error::OAuthErrorKind::Config("invalid authorization endpoint".into()),
                Some(Box::new(e)),
            )
        })?;
        url.set_query(Some(&query));
        Ok(url.into())
    }

    /// Exchange an authorization code for tokens and open a session.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip_all))]
    pub async fn create_session(&self, code: &str, code_verifier: &str) -> Result<Session<T>> {
        let tokens = exchange_code(&self.inner, code, code_verifier).await?;
        #[cfg(feature = "tracing")]
        tracing::info!(
            expires_in = tokens.expires_in,
            has_refresh_token = tokens.refresh_token.is_some(),
            "authorization code exchanged"
        );
        Ok(Session::new(self, Some(tokens)))
    }

    /// Adopt tokens obtained elsewhere, e.g. restored from storage.
    pub fn create_session_from_tokens(&self, tokens: impl Into<TokenSet>) -> Session<T> {
        Session::new(self, Some(tokens.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;
    use crate::types::TokenResponse;

    struct NoNetwork;

    impl HttpClient for NoNetwork {
        type Error = std::io::Error;
        fn send_http(
            &self,
            _request: http::Request<Vec<u8>>,
        ) -> impl core::future::Future<
            Output = core::result::Result<http::Response<Vec<u8>>, Self::Error>,
        > + Send {
            async { Err(std::io::Error::other("network disabled")) }
        }
    }

    fn dev_client() -> AuthClient<NoNetwork> {
        let config = ClientConfig::new()
            .client_id("c1")
            .redirect_uri("http://localhost/cb")
            .environment(Environment::Development)
            .build();
        AuthClient::with_http_client(config, NoNetwork).unwrap()
    }

    #[test]
    fn invalid_config_is_rejected_before_any_request() {
        let config = ClientConfig::new().client_id("").redirect_uri("x").build();
        let err = AuthClient::with_http_client(config, NoNetwork).err().unwrap();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn authorization_url_query() {
        let client = dev_client();
        let request = client.authorization_url("profile email").unwrap();
        let url = Url::parse(&request.url).unwrap();
        assert_eq!(url.origin().ascii_serialization(), "https://dev.matrica.io");
        assert_eq!(url.path(), "/oauth2");

        let query = url.query().unwrap();
        assert!(query.starts_with("response_type=code&"));
        assert!(query.contains("client_id=c1"));
        assert!(query.contains("redirect_uri=http%3A%2F%2Flocalhost%2Fcb"));
        assert!(query.contains("scope=profile+email"));
        assert!(query.contains("code_challenge_method=S256"));
        assert!(!query.contains("state="));

        let challenge = url
            .query_pairs()
            .find(|(k, _)| k == "code_challenge")
            .map(|(_, v)| v.into_owned())
            .unwrap();
        assert_eq!(challenge.len(), 43);
        assert_eq!(challenge, crate::pkce::code_challenge(&request.code_verifier));
    }

    #[test]
    fn each_url_gets_its_own_verifier() {
        let client = dev_client();
        let a = client.authorization_url(DEFAULT_SCOPE).unwrap();
        let b = client.authorization_url(DEFAULT_SCOPE).unwrap();
        assert_ne!(a.code_verifier, b.code_verifier);
    }

    #[tokio::test]
    async fn adopted_tokens_need_no_network() {
        let client = dev_client();
        let session = client.create_session_from_tokens(TokenResponse {
            access_token: "at".into(),
            token_type: "Bearer".into(),
            refresh_token: None,
            expires_in: Some(3600),
            scope: None,
        });
        assert!(session.is_authenticated().await);
        assert_eq!(session.access_token().await.unwrap(), "at");
    }
}
