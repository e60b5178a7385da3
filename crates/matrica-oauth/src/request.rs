use std::time::Duration;

use chrono::Utc;
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderMap, Method, Request, Response, StatusCode};
use matrica_common::{HttpClient, TransportError};
use serde::Serialize;
use smol_str::SmolStr;

use crate::client::ClientInner;
use crate::error::{OAuthError, Result};
use crate::retry::with_retry;
use crate::types::{
    OAuthErrorResponse, Pagination, RefreshRequestParameters, TokenGrantType,
    TokenRequestParameters, TokenResponse, TokenSet,
};

pub const PAGINATION_COUNT: &str = "Pagination-Count";
pub const PAGINATION_SKIP: &str = "Pagination-Skip";
pub const PAGINATION_TAKE: &str = "Pagination-Take";

/// Calls made against the token endpoint.
pub enum OAuthRequest<'a> {
    Token(TokenRequestParameters<'a>),
    Refresh(RefreshRequestParameters<'a>),
}

impl OAuthRequest<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            OAuthRequest::Token(_) => "token",
            OAuthRequest::Refresh(_) => "refresh",
        }
    }

    /// Description used when the provider sends no `error_description`.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            OAuthRequest::Token(_) => "Failed to exchange code for tokens",
            OAuthRequest::Refresh(_) => "Failed to refresh token",
        }
    }
}

#[derive(Serialize)]
pub struct RequestPayload<'a, T>
where
    T: Serialize,
{
    #[serde(flatten)]
    parameters: T,
    client_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    client_secret: Option<&'a str>,
}

fn build_oauth_req_body<S>(client_id: &str, client_secret: Option<&str>, parameters: S) -> Result<String>
where
    S: Serialize,
{
    Ok(serde_html_form::to_string(RequestPayload {
        parameters,
        client_id,
        client_secret,
    })?)
}

pub(crate) async fn exchange_code<T>(
    inner: &ClientInner<T>,
    code: &str,
    verifier: &str,
) -> Result<TokenSet>
where
    T: HttpClient + Send + Sync,
{
    let request = OAuthRequest::Token(TokenRequestParameters {
        grant_type: TokenGrantType::AuthorizationCode,
        code,
        redirect_uri: &inner.config.redirect_uri,
        code_verifier: verifier,
    });
    oauth_request(inner, request).await
}

pub(crate) async fn refresh<T>(inner: &ClientInner<T>, refresh_token: &str) -> Result<TokenSet>
where
    T: HttpClient + Send + Sync,
{
    let request = OAuthRequest::Refresh(RefreshRequestParameters {
        grant_type: TokenGrantType::RefreshToken,
        refresh_token,
    });
    oauth_request(inner, request).await
}

#[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip_all, fields(request = request.name())))]
async fn oauth_request<T>(inner: &ClientInner<T>, request: OAuthRequest<'_>) -> Result<TokenSet>
where
    T: HttpClient + Send + Sync,
{
    let config = &inner.config;
    let secret = config.client_secret.as_deref();
    let body = match &request {
        OAuthRequest::Token(params) => build_oauth_req_body(&config.client_id, secret, params)?,
        OAuthRequest::Refresh(params) => build_oauth_req_body(&config.client_id, secret, params)?,
    };
    let url = inner.endpoints.token.as_str();
    let body = body.as_str();

    let response: TokenResponse = call(
        inner,
        request.name(),
        request.fallback_message(),
        move || {
            Ok(Request::builder()
                .method(Method::POST)
                .uri(url)
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .header(ACCEPT, "application/json")
                .body(body.as_bytes().to_vec())?)
        },
        |response| decode_json(response.body(), "token response"),
    )
    .await?;

    Ok(TokenSet::from_response(response, Utc::now()))
}

/// Authenticated `GET` against a user resource URL.
pub(crate) fn bearer_request(url: &str, access_token: &str) -> Result<Request<Vec<u8>>> {
    Ok(Request::builder()
        .method(Method::GET)
        .uri(url)
        .header(AUTHORIZATION, format!("Bearer {access_token}"))
        .header(CONTENT_TYPE, "application/json")
        .header(ACCEPT, "application/json")
        .body(Vec::new())?)
}

/// Send the request built by `build`, retrying per the client's policy.
///
/// A 2xx response goes through `parse`; anything else becomes a provider
/// error with `fallback` as its description when the body has none.
pub(crate) async fn call<T, O, B, P>(
    inner: &ClientInner<T>,
    operation: &str,
    fallback: &str,
    build: B,
    parse: P,
) -> Result<O>
where
    T: HttpClient + Send + Sync,
    B: Fn() -> Result<Request<Vec<u8>>>,
    P: Fn(&Response<Vec<u8>>) -> Result<O>,
{
    let build = &build;
    let parse = &parse;
    with_retry(&inner.retry, operation, move || async move {
        let response = execute(&inner.http, inner.config.timeout, build()?).await?;
        if response.status().is_success() {
            parse(&response)
        } else {
            Err(error_from_response(response.status(), response.body(), fallback))
        }
    })
    .await
}

/// Issue one request bounded by `timeout`.
pub(crate) async fn execute<T>(
    http: &T,
    timeout: Duration,
    request: Request<Vec<u8>>,
) -> Result<Response<Vec<u8>>>
where
    T: HttpClient,
{
    match tokio::time::timeout(timeout, http.send_http(request)).await {
        Ok(Ok(response)) => Ok(response),
        Ok(Err(e)) => Err(OAuthError::transport(TransportError::other(e))),
        Err(_) => Err(OAuthError::transport(TransportError::Timeout)),
    }
}

/// Map a non-2xx response to a provider error.
///
/// The body's `error` and `error_description` are used when it parses as an
/// OAuth error object; an empty or non-JSON body yields `fallback` with no code.
/// Either way the result is terminal.
pub(crate) fn error_from_response(status: StatusCode, body: &[u8], fallback: &str) -> OAuthError {
    let err: OAuthErrorResponse = serde_json::from_slice(body).unwrap_or_default();
    let description = err
        .error_description
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| SmolStr::new(fallback));
    #[cfg(feature = "tracing")]
    tracing::warn!(
        status = status.as_u16(),
        code = err.error.as_deref(),
        %description,
        "provider rejected request"
    );
    OAuthError::provider(status, err.error, description)
}

pub(crate) fn decode_json<O>(body: &[u8], what: &str) -> Result<O>
where
    O: serde::de::DeserializeOwned,
{
    serde_json::from_slice(body).map_err(|e| OAuthError::decode(what, e))
}

/// Read `Pagination-*` headers. Missing or unparsable values read as zero.
pub fn pagination_from_headers(headers: &HeaderMap) -> Pagination {
    let read = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(0)
    };
    Pagination {
        count: read(PAGINATION_COUNT),
        skip: read(PAGINATION_SKIP),
        take: read(PAGINATION_TAKE),
    }
}
