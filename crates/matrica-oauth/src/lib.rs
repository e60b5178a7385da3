//! OAuth 2.0 authorization code + PKCE client for the Matrica user API.
//!
//! An [`AuthClient`](client::AuthClient) builds authorization URLs and
//! exchanges codes for tokens. The resulting [`Session`](session::Session)
//! keeps the token pair fresh and exposes one accessor per user resource.
//!
//! ```no_run
//! # async fn run() -> matrica_oauth::error::Result<()> {
//! use matrica_oauth::client::AuthClient;
//! use matrica_oauth::config::ClientConfig;
//!
//! let client = AuthClient::new(
//!     ClientConfig::new()
//!         .client_id("my-client")
//!         .redirect_uri("http://localhost:3000/callback")
//!         .build(),
//! )?;
//! let request = client.authorization_url("profile wallets")?;
//! // send the user to request.url, keep request.code_verifier
//! # let code = "";
//! let session = client.create_session(code, &request.code_verifier).await?;
//! let wallets = session.wallets().await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod flow;
pub mod pkce;
pub mod request;
pub mod retry;
pub mod session;
pub mod types;

pub use matrica_common::session::{MemorySessionStore, SessionStore};
pub use matrica_common::{HttpClient, TransportError};

/// Seconds before expiry at which an access token is treated as expired.
pub const EXPIRY_SKEW_SECS: i64 = 60;
