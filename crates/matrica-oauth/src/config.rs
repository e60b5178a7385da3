use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use smol_str::{SmolStr, format_smolstr};

use crate::api::ApiVersion;
use crate::error::{OAuthError, Result};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);
pub const DEFAULT_MAX_RETRIES: u32 = 3;

const PRODUCTION_FRONTEND: &str = "https://matrica.io/oauth2";
const PRODUCTION_API: &str = "https://api.matrica.io/oauth2";
const DEVELOPMENT_FRONTEND: &str = "https://dev.matrica.io/oauth2";
const DEVELOPMENT_API: &str = "https://api-dev.matrica.io/oauth2";

/// Deployment the client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    #[default]
    Production,
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }

    fn hosts(self) -> (&'static str, &'static str) {
        match self {
            Environment::Production => (PRODUCTION_FRONTEND, PRODUCTION_API),
            Environment::Development | Environment::Staging => {
                (DEVELOPMENT_FRONTEND, DEVELOPMENT_API)
            }
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = OAuthError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(OAuthError::config(format_smolstr!(
                "unknown environment: {other}"
            ))),
        }
    }
}

/// Resolved endpoint set for an environment and API version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Browser-facing authorization page
    pub frontend: SmolStr,
    /// Token endpoint (code exchange and refresh)
    pub token: SmolStr,
    /// Base URL for user resources
    pub user: SmolStr,
}

impl Endpoints {
    pub fn resolve(environment: Environment, version: ApiVersion) -> Self {
        let (frontend, api) = environment.hosts();
        Self {
            frontend: SmolStr::new_static(frontend),
            token: format_smolstr!("{api}/token"),
            user: format_smolstr!("{api}{}", version.user_path()),
        }
    }
}

/// Client configuration. Immutable once handed to an
/// [`AuthClient`](crate::client::AuthClient).
///
/// ```
/// use matrica_oauth::config::{ClientConfig, Environment};
///
/// let config = ClientConfig::new()
///     .client_id("c1")
///     .redirect_uri("http://localhost/cb")
///     .environment(Environment::Development)
///     .build();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, bon::Builder)]
#[builder(start_fn = new)]
pub struct ClientConfig {
    #[builder(into)]
    pub client_id: SmolStr,
    #[builder(into)]
    pub redirect_uri: SmolStr,
    /// Present for confidential clients only
    #[builder(into)]
    pub client_secret: Option<SmolStr>,
    #[builder(default)]
    pub environment: Environment,
    /// Upper bound on every outbound request
    #[builder(default = DEFAULT_TIMEOUT)]
    pub timeout: Duration,
    /// Retries after the first attempt, for retryable failures only
    #[builder(default = DEFAULT_MAX_RETRIES)]
    pub max_retries: u32,
    #[builder(default)]
    pub api_version: ApiVersion,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("environment", &self.environment)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("api_version", &self.api_version)
            .finish()
    }
}

impl ClientConfig {
    /// Check the configuration invariants.
    pub fn validate(&self) -> Result<()> {
        if self.client_id.is_empty() {
            return Err(OAuthError::config("client_id is required"));
        }
        if self.redirect_uri.is_empty() {
            return Err(OAuthError::config("redirect_uri is required"));
        }
        if self.timeout.is_zero() {
            return Err(OAuthError::config("timeout must be a positive number"));
        }
        Ok(())
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints::resolve(self.environment, self.api_version)
    }

    /// Load configuration from `MATRICA_*` environment variables.
    ///
    /// Reads `MATRICA_CLIENT_ID`, `MATRICA_REDIRECT_URI`,
    /// `MATRICA_CLIENT_SECRET`, `MATRICA_ENVIRONMENT`, `MATRICA_TIMEOUT_MS`,
    /// `MATRICA_MAX_RETRIES` and `MATRICA_API_VERSION`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let timeout = match var("MATRICA_TIMEOUT_MS") {
            Some(raw) => Duration::from_millis(raw.trim().parse::<u64>().map_err(|_| {
                OAuthError::config("timeout must be a positive number")
                    .with_context(format_smolstr!("MATRICA_TIMEOUT_MS={raw}"))
            })?),
            None => DEFAULT_TIMEOUT,
        };
        let max_retries = match var("MATRICA_MAX_RETRIES") {
            Some(raw) => raw.trim().parse::<u32>().map_err(|_| {
                OAuthError::config("max_retries must be a non-negative integer")
                    .with_context(format_smolstr!("MATRICA_MAX_RETRIES={raw}"))
            })?,
            None => DEFAULT_MAX_RETRIES,
        };
        let environment = var("MATRICA_ENVIRONMENT")
            .map(|raw| raw.parse::<Environment>())
            .transpose()?
            .unwrap_or_default();
        let api_version = var("MATRICA_API_VERSION")
            .map(|raw| raw.parse::<ApiVersion>())
            .transpose()?
            .unwrap_or_default();

        let config = ClientConfig::new()
            .client_id(var("MATRICA_CLIENT_ID").unwrap_or_default())
            .redirect_uri(var("MATRICA_REDIRECT_URI").unwrap_or_default())
            .maybe_client_secret(var("MATRICA_CLIENT_SECRET"))
            .environment(environment)
            .timeout(timeout)
            .max_retries(max_retries)
            .api_version(api_version)
            .build();
        config.validate()?;
        Ok(config)
    }
}
