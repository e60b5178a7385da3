#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use matrica_oauth::HttpClient;
use matrica_oauth::api::ApiVersion;
use matrica_oauth::client::AuthClient;
use matrica_oauth::config::{ClientConfig, Environment};
use matrica_oauth::retry::RetryPolicy;
use matrica_oauth::types::{TokenResponse, TokenSet};
use serde_json::Value;
use tokio::sync::Mutex;

pub const TOKEN_URL: &str = "https://api.matrica.io/oauth2/token";
pub const V1_USER: &str = "https://api.matrica.io/oauth2/user";
pub const V2_USER: &str = "https://api.matrica.io/oauth2/v2/user";

pub enum Reply {
    Response(http::Response<Vec<u8>>),
    /// Connection-level failure
    Fail(&'static str),
    /// Never answers
    Hang,
}

#[derive(Clone, Default)]
pub struct MockClient {
    queue: Arc<Mutex<VecDeque<Reply>>>,
    routes: Arc<Mutex<Vec<(String, u16, String)>>>,
    log: Arc<Mutex<Vec<http::Request<Vec<u8>>>>>,
}

pub fn response(status: u16, body: &str, headers: &[(&str, &str)]) -> http::Response<Vec<u8>> {
    let mut builder = http::Response::builder()
        .status(status)
        .header(http::header::CONTENT_TYPE, "application/json");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(body.as_bytes().to_vec()).unwrap()
}

impl MockClient {
    pub async fn push(&self, reply: Reply) {
        self.queue.lock().await.push_back(reply);
    }

    pub async fn push_json(&self, status: u16, body: Value) {
        self.push(Reply::Response(response(status, &body.to_string(), &[])))
            .await;
    }

    pub async fn push_raw(&self, status: u16, body: &str) {
        self.push(Reply::Response(response(status, body, &[]))).await;
    }

    pub async fn push_with_headers(&self, status: u16, body: Value, headers: &[(&str, &str)]) {
        self.push(Reply::Response(response(status, &body.to_string(), headers)))
            .await;
    }

    pub async fn push_failure(&self) {
        self.push(Reply::Fail("connection refused")).await;
    }

    /// Answer every request whose path ends with `suffix`, without consuming.
    pub async fn route(&self, suffix: &str, status: u16, body: &str) {
        self.routes
            .lock()
            .await
            .push((suffix.to_string(), status, body.to_string()));
    }

    pub async fn request_count(&self) -> usize {
        self.log.lock().await.len()
    }

    pub async fn uris(&self) -> Vec<String> {
        self.log
            .lock()
            .await
            .iter()
            .map(|r| r.uri().to_string())
            .collect()
    }

    pub async fn bodies(&self) -> Vec<String> {
        self.log
            .lock()
            .await
            .iter()
            .map(|r| String::from_utf8(r.body().clone()).unwrap())
            .collect()
    }

    pub async fn header(&self, index: usize, name: &str) -> Option<String> {
        self.log.lock().await[index]
            .headers()
            .get(name)
            .map(|v| v.to_str().unwrap().to_string())
    }

    pub async fn token_requests(&self) -> usize {
        self.uris().await.iter().filter(|u| *u == TOKEN_URL).count()
    }
}

impl HttpClient for MockClient {
    type Error = std::io::Error;

    fn send_http(
        &self,
        request: http::Request<Vec<u8>>,
    ) -> impl core::future::Future<
        Output = core::result::Result<http::Response<Vec<u8>>, Self::Error>,
    > + Send {
        let log = self.log.clone();
        let queue = self.queue.clone();
        let routes = self.routes.clone();
        async move {
            let path = request.uri().path().to_string();
            log.lock().await.push(request);
            let routed = routes
                .lock()
                .await
                .iter()
                .find(|(suffix, _, _)| path.ends_with(suffix.as_str()))
                .map(|(_, status, body)| response(*status, body, &[]));
            if let Some(resp) = routed {
                return Ok(resp);
            }
            let reply = queue.lock().await.pop_front().expect("no queued response");
            match reply {
                Reply::Response(resp) => Ok(resp),
                Reply::Fail(msg) => Err(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    msg,
                )),
                Reply::Hang => std::future::pending().await,
            }
        }
    }
}

pub fn config(version: ApiVersion) -> ClientConfig {
    ClientConfig::new()
        .client_id("c1")
        .redirect_uri("http://localhost/cb")
        .environment(Environment::Production)
        .api_version(version)
        .build()
}

/// Client with deterministic backoff (1s, 2s, 4s...).
pub fn client_with(mock: &MockClient, config: ClientConfig) -> AuthClient<MockClient> {
    let retries = config.max_retries;
    AuthClient::with_http_client(config, mock.clone())
        .unwrap()
        .with_retry_policy(RetryPolicy::new(retries).with_jitter(Duration::ZERO))
}

pub fn client(mock: &MockClient, version: ApiVersion) -> AuthClient<MockClient> {
    client_with(mock, config(version))
}

pub fn token_json(access: &str, refresh: Option<&str>, expires_in: i64) -> Value {
    let mut body = serde_json::json!({
        "access_token": access,
        "token_type": "Bearer",
        "expires_in": expires_in,
        "scope": "profile"
    });
    if let Some(refresh) = refresh {
        body["refresh_token"] = Value::from(refresh);
    }
    body
}

fn token_response(access: &str, refresh: Option<&str>) -> TokenResponse {
    TokenResponse {
        access_token: access.into(),
        token_type: "Bearer".into(),
        refresh_token: refresh.map(Into::into),
        expires_in: Some(3600),
        scope: None,
    }
}

/// Tokens issued now, valid for an hour.
pub fn fresh_tokens(access: &str, refresh: Option<&str>) -> TokenSet {
    TokenSet::from_response(token_response(access, refresh), Utc::now())
}

/// Tokens issued two hours ago with a one hour lifetime.
pub fn expired_tokens(access: &str, refresh: Option<&str>) -> TokenSet {
    TokenSet::from_response(
        token_response(access, refresh),
        Utc::now() - TimeDelta::hours(2),
    )
}
