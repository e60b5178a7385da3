//! Common plumbing for the matrica OAuth client: the HTTP transport
//! abstraction, transport errors, and pluggable key-value storage.

#![warn(missing_docs)]
pub use smol_str;

pub mod error;
/// HTTP client abstraction used by matrica crates.
pub mod http_client;
/// Generic expiring storage traits and utilities.
pub mod session;

pub use error::TransportError;
pub use http_client::HttpClient;
