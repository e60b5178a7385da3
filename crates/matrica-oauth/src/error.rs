use http::StatusCode;
use matrica_common::{TransportError, session::SessionStoreError};
use smol_str::SmolStr;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error returned by every client and session operation.
///
/// Network, provider and session-state failures all surface through this one
/// type so callers can branch on [`OAuthError::code`] without depending on
/// transport details.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
#[error("{kind}")]
pub struct OAuthError {
    #[diagnostic_source]
    kind: OAuthErrorKind,
    #[source]
    source: Option<BoxError>,
    #[help]
    help: Option<SmolStr>,
    context: Option<SmolStr>,
}

/// Error categories for OAuth operations
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum OAuthErrorKind {
    /// Invalid client configuration
    #[error("{0}")]
    #[diagnostic(
        code(matrica_oauth::config),
        help("client_id and redirect_uri are required and the timeout must be non-zero")
    )]
    Config(SmolStr),

    /// Non-2xx response carrying a provider error body
    #[error("{description}")]
    #[diagnostic(
        code(matrica_oauth::provider),
        help("the provider rejected the request; inspect `code()` for the OAuth error code")
    )]
    Provider {
        status: StatusCode,
        code: Option<SmolStr>,
        description: SmolStr,
    },

    /// Network failure after all retries were spent
    #[error("network request failed")]
    #[diagnostic(code(matrica_oauth::transport))]
    Transport,

    /// Response body could not be decoded
    #[error("malformed response: {0}")]
    #[diagnostic(
        code(matrica_oauth::decode),
        help("the server answered with a body that is not the expected JSON")
    )]
    Decode(SmolStr),

    /// Session holds no tokens
    #[error("No tokens available. User needs to authenticate.")]
    #[diagnostic(code(matrica_oauth::no_tokens))]
    NoTokens,

    /// Session holds no refresh token
    #[error("No refresh token available")]
    #[diagnostic(
        code(matrica_oauth::no_refresh_token),
        help("restart the authorization flow to obtain a new token pair")
    )]
    NoRefreshToken,

    /// Callback carried a missing or unknown `state`
    #[error("unknown or expired authorization state")]
    #[diagnostic(code(matrica_oauth::unknown_state))]
    UnknownState,

    /// Endpoint not offered by the configured API version
    #[error("{resource} is not available in API {version}")]
    #[diagnostic(code(matrica_oauth::unsupported))]
    Unsupported {
        resource: SmolStr,
        version: SmolStr,
    },

    /// Form, query or request construction error
    #[error("failed to encode request")]
    #[diagnostic(code(matrica_oauth::encode))]
    Encode,

    /// Authorization state store error
    #[error("storage error")]
    #[diagnostic(code(matrica_oauth::storage))]
    Storage,
}

impl OAuthError {
    /// Create a new error with the given kind and optional source
    pub fn new(kind: OAuthErrorKind, source: Option<BoxError>) -> Self {
        Self {
            kind,
            source,
            help: None,
            context: None,
        }
    }

    /// Get the error kind
    pub fn kind(&self) -> &OAuthErrorKind {
        &self.kind
    }

    /// Get the source error if present
    pub fn source_err(&self) -> Option<&BoxError> {
        self.source.as_ref()
    }

    /// Get the context string if present
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Machine-readable error code.
    ///
    /// Provider errors carry the provider's own `error` value (or `API_ERROR`
    /// when it sent none); every other kind maps to a fixed code.
    pub fn code(&self) -> &str {
        match &self.kind {
            OAuthErrorKind::Config(_) => "CONFIG_ERROR",
            OAuthErrorKind::Provider { code, .. } => code.as_deref().unwrap_or("API_ERROR"),
            OAuthErrorKind::Transport => "NETWORK_ERROR",
            OAuthErrorKind::Decode(_) => "DECODE_ERROR",
            OAuthErrorKind::NoTokens | OAuthErrorKind::NoRefreshToken => "AUTHENTICATION_ERROR",
            OAuthErrorKind::UnknownState => "INVALID_STATE",
            OAuthErrorKind::Unsupported { .. } => "UNSUPPORTED_ENDPOINT",
            OAuthErrorKind::Encode => "ENCODE_ERROR",
            OAuthErrorKind::Storage => "STORAGE_ERROR",
        }
    }

    /// HTTP status of a provider error.
    pub fn status(&self) -> Option<StatusCode> {
        match &self.kind {
            OAuthErrorKind::Provider { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Provider-supplied description, if this is a provider error.
    pub fn description(&self) -> Option<&str> {
        match &self.kind {
            OAuthErrorKind::Provider { description, .. } => Some(description),
            _ => None,
        }
    }

    /// Whether the retry policy may attempt the failed call again.
    ///
    /// Only transport and decode failures qualify. Anything the provider
    /// answered with an error body is terminal.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            OAuthErrorKind::Transport | OAuthErrorKind::Decode(_)
        )
    }

    /// Final form of a retryable failure once retries are spent.
    ///
    /// Malformed responses are reported as network failures, with the decode
    /// error kept as the source.
    pub(crate) fn exhausted(self) -> Self {
        if !matches!(self.kind, OAuthErrorKind::Decode(_)) {
            return self;
        }
        let context = self.context.clone();
        let mut err = Self::new(OAuthErrorKind::Transport, Some(Box::new(self)));
        err.context = context;
        err
    }

    /// True for failures that require the user to authenticate again.
    pub fn is_session_error(&self) -> bool {
        matches!(
            self.kind,
            OAuthErrorKind::NoTokens | OAuthErrorKind::NoRefreshToken | OAuthErrorKind::UnknownState
        )
    }

    /// Add help text to this error
    pub fn with_help(mut self, help: impl Into<SmolStr>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Add context to this error
    pub fn with_context(mut self, context: impl Into<SmolStr>) -> Self {
        self.context = Some(context.into());
        self
    }

    // Constructors for each kind

    /// Create a configuration error
    pub fn config(message: impl Into<SmolStr>) -> Self {
        Self::new(OAuthErrorKind::Config(message.into()), None)
    }

    /// Create a provider error
    pub fn provider(
        status: StatusCode,
        code: Option<SmolStr>,
        description: impl Into<SmolStr>,
    ) -> Self {
        Self::new(
            OAuthErrorKind::Provider {
                status,
                code,
                description: description.into(),
            },
            None,
        )
    }

    /// Create a transport error
    pub fn transport(source: TransportError) -> Self {
        Self::new(OAuthErrorKind::Transport, Some(Box::new(source)))
    }

    /// Create a decode error
    pub fn decode(
        what: impl Into<SmolStr>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::new(OAuthErrorKind::Decode(what.into()), Some(Box::new(source)))
    }

    /// Create a missing-tokens error
    pub fn no_tokens() -> Self {
        Self::new(OAuthErrorKind::NoTokens, None)
    }

    /// Create a missing-refresh-token error
    pub fn no_refresh_token() -> Self {
        Self::new(OAuthErrorKind::NoRefreshToken, None)
    }

    /// Create an unknown-state error
    pub fn unknown_state() -> Self {
        Self::new(OAuthErrorKind::UnknownState, None)
    }

    /// Create an unsupported-endpoint error
    pub fn unsupported(resource: impl Into<SmolStr>, version: impl Into<SmolStr>) -> Self {
        Self::new(
            OAuthErrorKind::Unsupported {
                resource: resource.into(),
                version: version.into(),
            },
            None,
        )
    }
}

// From impls for common error types

impl From<TransportError> for OAuthError {
    fn from(e: TransportError) -> Self {
        Self::transport(e)
    }
}

impl From<serde_html_form::ser::Error> for OAuthError {
    fn from(e: serde_html_form::ser::Error) -> Self {
        let msg = smol_str::format_smolstr!("{:?}", e);
        Self::new(OAuthErrorKind::Encode, Some(Box::new(e)))
            .with_context(msg)
            .with_help("check request parameters are serializable")
    }
}

impl From<http::Error> for OAuthError {
    fn from(e: http::Error) -> Self {
        let msg = smol_str::format_smolstr!("{:?}", e);
        Self::new(OAuthErrorKind::Encode, Some(Box::new(e)))
            .with_context(msg)
            .with_help("check the configured endpoints are valid URIs")
    }
}

impl From<SessionStoreError> for OAuthError {
    fn from(e: SessionStoreError) -> Self {
        let msg = smol_str::format_smolstr!("{:?}", e);
        Self::new(OAuthErrorKind::Storage, Some(Box::new(e)))
            .with_context(msg)
            .with_help("verify the authorization state store is reachable")
    }
}

pub type Result<T> = core::result::Result<T, OAuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_surfaces_description_and_code() {
        let err = OAuthError::provider(
            StatusCode::BAD_REQUEST,
            Some("invalid_grant".into()),
            "Invalid refresh token",
        );
        assert_eq!(err.to_string(), "Invalid refresh token");
        assert_eq!(err.code(), "invalid_grant");
        assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
        assert!(!err.is_retryable());
    }

    #[test]
    fn provider_error_without_code_uses_api_error() {
        let err = OAuthError::provider(StatusCode::NOT_FOUND, None, "Failed to fetch /profile");
        assert_eq!(err.code(), "API_ERROR");
    }

    #[test]
    fn session_errors_share_authentication_code() {
        assert_eq!(OAuthError::no_tokens().code(), "AUTHENTICATION_ERROR");
        assert_eq!(OAuthError::no_refresh_token().code(), "AUTHENTICATION_ERROR");
        assert_eq!(
            OAuthError::no_refresh_token().to_string(),
            "No refresh token available"
        );
        assert!(OAuthError::no_tokens().is_session_error());
        assert!(!OAuthError::no_tokens().is_retryable());
    }

    #[test]
    fn transport_errors_are_retryable() {
        let err = OAuthError::from(TransportError::Timeout);
        assert!(err.is_retryable());
        assert_eq!(err.code(), "NETWORK_ERROR");
        assert!(err.source_err().is_some());
    }

    #[test]
    fn config_error_message() {
        let err = OAuthError::config("client_id is required");
        assert_eq!(err.to_string(), "client_id is required");
        assert_eq!(err.code(), "CONFIG_ERROR");
        assert!(!err.is_retryable());
    }

    #[test]
    fn exhausted_decode_error_becomes_network_error() {
        let source = serde_json::from_slice::<u32>(b"<html>").unwrap_err();
        let err = OAuthError::decode("token response", source)
            .with_context("Failed to exchange code for tokens")
            .exhausted();
        assert_eq!(err.code(), "NETWORK_ERROR");
        assert_eq!(err.context(), Some("Failed to exchange code for tokens"));
        assert!(err.source_err().is_some());

        let provider = OAuthError::provider(StatusCode::BAD_REQUEST, None, "x").exhausted();
        assert_eq!(provider.code(), "API_ERROR");
    }
}
