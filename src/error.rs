//! Error types shared across the token issuer, the messaging service layer
//! and configuration loading.

use thiserror::Error;

/// Failures while parsing keys or minting token requests.
#[derive(Error, Debug, Clone)]
pub enum TokenError {
    /// The API key is not in `keyName:keySecret` form
    #[error("Invalid API key: {0}")]
    InvalidKey(String),

    /// No API key could be found in the environment or the keyring
    #[error("No API key configured (set {0})")]
    MissingKey(String),

    /// The client identity is empty, a wildcard or malformed
    #[error("Invalid client id: {0}")]
    InvalidClientId(String),

    /// The capability is not a JSON object of resource -> operations
    #[error("Invalid capability: {0}")]
    InvalidCapability(String),

    /// The system clock is before the Unix epoch
    #[error("System clock error: {0}")]
    Clock(String),

    /// Signing failed
    #[error("Signing failed: {0}")]
    Signing(String),
}

impl TokenError {
    /// Machine-readable code used in HTTP error bodies.
    pub fn code(&self) -> u32 {
        match self {
            TokenError::InvalidKey(_) => 40101,
            TokenError::MissingKey(_) => 40102,
            TokenError::InvalidClientId(_) => 40012,
            TokenError::InvalidCapability(_) => 40000,
            TokenError::Clock(_) => 50001,
            TokenError::Signing(_) => 50002,
        }
    }
}

/// Failures reported by the messaging service or on the way to it.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Credential could not be obtained
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Credential was rejected by the service
    #[error("Credential rejected: {0}")]
    CredentialRejected(String),

    /// Operation on a connection that was already closed
    #[error("Connection {0} is closed")]
    ConnectionClosed(String),

    /// Channel name failed validation
    #[error("Invalid channel: {0}")]
    InvalidChannel(String),

    /// Message failed validation
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// HTTP errors while talking to an auth URL
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Token issuing errors from an in-process issuer
    #[error("Token error: {0}")]
    Token(#[from] TokenError),
}

/// Failures while loading or saving configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
