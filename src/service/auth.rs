//! Credential acquisition for messaging-service clients.

use std::sync::Arc;
use std::time::Duration;

use crate::config::DEFAULT_AUTH_URL;
use crate::error::ServiceError;
use crate::token::{ApiKey, IssueToken, TokenIssuer, TokenParams, TokenRequest};

/// Where a client obtains the credential it connects with.
#[derive(Clone)]
pub enum CredentialSource {
    /// Ask a token issuer endpoint over HTTP
    AuthUrl { url: String, client: reqwest::Client },
    /// Mint locally from a server-side key
    Issuer {
        issuer: Arc<dyn IssueToken>,
        params: TokenParams,
    },
}

impl CredentialSource {
    pub fn auth_url(url: impl Into<String>) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(CredentialSource::AuthUrl {
            url: url.into(),
            client,
        })
    }

    pub fn issuer(issuer: Arc<dyn IssueToken>, params: TokenParams) -> Self {
        CredentialSource::Issuer { issuer, params }
    }

    /// Pick a source for the desktop client: an explicit auth URL wins, then a
    /// local key, then the default issuer address.
    pub fn resolve(auth_url: Option<&str>, api_key: Option<ApiKey>) -> Result<Self, ServiceError> {
        match (auth_url, api_key) {
            (Some(url), _) => Self::auth_url(url),
            (None, Some(key)) => Ok(Self::issuer(
                Arc::new(TokenIssuer::new(key)),
                TokenParams::default(),
            )),
            (None, None) => Self::auth_url(DEFAULT_AUTH_URL),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            CredentialSource::AuthUrl { url, .. } => format!("auth URL {}", url),
            CredentialSource::Issuer { params, .. } => {
                format!("in-process issuer ({})", params.client_id)
            }
        }
    }

    /// Obtain a fresh credential.
    pub async fn fetch(&self) -> Result<TokenRequest, ServiceError> {
        match self {
            CredentialSource::AuthUrl { url, client } => {
                let response = client
                    .get(url)
                    .send()
                    .await?
                    .error_for_status()
                    .map_err(|e| ServiceError::Auth(format!("token endpoint: {}", e)))?;
                let request = response.json::<TokenRequest>().await?;
                tracing::debug!(client_id = %request.client_id, "fetched credential from {}", url);
                Ok(request)
            }
            CredentialSource::Issuer { issuer, params } => {
                Ok(issuer.create_token_request(params)?)
            }
        }
    }
}
