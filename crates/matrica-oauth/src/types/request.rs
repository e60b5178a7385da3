use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationResponseType {
    Code,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationCodeChallengeMethod {
    S256,
}

#[derive(Serialize)]
pub struct AuthorizationRequestParameters<'a> {
    // https://datatracker.ietf.org/doc/html/rfc6749#section-4.1.1
    pub response_type: AuthorizationResponseType,
    pub client_id: &'a str,
    pub redirect_uri: &'a str,
    pub scope: &'a str,
    // https://datatracker.ietf.org/doc/html/rfc7636#section-4.3
    pub code_challenge: &'a str,
    pub code_challenge_method: AuthorizationCodeChallengeMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<&'a str>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenGrantType {
    AuthorizationCode,
    RefreshToken,
}

#[derive(Serialize)]
pub struct TokenRequestParameters<'a> {
    // https://datatracker.ietf.org/doc/html/rfc6749#section-4.1.3
    pub grant_type: TokenGrantType,
    pub code: &'a str,
    pub redirect_uri: &'a str,
    // https://datatracker.ietf.org/doc/html/rfc7636#section-4.5
    pub code_verifier: &'a str,
}

#[derive(Serialize)]
pub struct RefreshRequestParameters<'a> {
    // https://datatracker.ietf.org/doc/html/rfc6749#section-6
    pub grant_type: TokenGrantType,
    pub refresh_token: &'a str,
}

/// Query parameters the provider appends to the redirect URI.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CallbackParams {
    pub code: SmolStr,
    pub state: Option<SmolStr>,
}
