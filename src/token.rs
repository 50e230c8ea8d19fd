//! Token request minting.
//!
//! A token request is a signed, time-boxed credential that a messaging-service
//! client exchanges for an access token. It is computed locally from the
//! server-side API key, so issuing one never needs a network round trip.
//!
//! The signature covers `keyName`, `ttl`, `capability`, `clientId`,
//! `timestamp` and `nonce`, each followed by a newline, HMAC-SHA256'd with the
//! key secret and base64 encoded.

use base64::Engine as _;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::TokenError;
use crate::validation;

type HmacSha256 = Hmac<Sha256>;

/// Default credential lifetime: one hour
pub const DEFAULT_TTL_MS: u64 = 60 * 60 * 1000;

/// Fixed identity tokens are bound to unless configured otherwise
pub const DEFAULT_CLIENT_ID: &str = "chat-demo-client";

/// Server-side API key, `keyName:keySecret`.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey {
    name: String,
    secret: String,
}

impl ApiKey {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn secret(&self) -> &str {
        &self.secret
    }
}

impl FromStr for ApiKey {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, secret) = validation::validate_api_key(s.trim()).map_err(TokenError::InvalidKey)?;
        Ok(Self {
            name: name.to_string(),
            secret: secret.to_string(),
        })
    }
}

// Never print the secret
impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKey")
            .field("name", &self.name)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Resource -> allowed operations, e.g. `{"*":["*"]}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Capability(BTreeMap<String, Vec<String>>);

impl Default for Capability {
    fn default() -> Self {
        let mut map = BTreeMap::new();
        map.insert("*".to_string(), vec!["*".to_string()]);
        Capability(map)
    }
}

impl Capability {
    /// Compact JSON with sorted resources and operations.
    pub fn to_json(&self) -> String {
        let sorted: BTreeMap<&String, Vec<&String>> = self
            .0
            .iter()
            .map(|(resource, ops)| {
                let mut ops: Vec<&String> = ops.iter().collect();
                ops.sort();
                ops.dedup();
                (resource, ops)
            })
            .collect();
        // A map of strings to string lists always serializes
        serde_json::to_string(&sorted).unwrap_or_else(|_| "{}".to_string())
    }
}

impl FromStr for Capability {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let map: BTreeMap<String, Vec<String>> =
            serde_json::from_str(s).map_err(|e| TokenError::InvalidCapability(e.to_string()))?;
        if map.is_empty() {
            return Err(TokenError::InvalidCapability(
                "capability must name at least one resource".into(),
            ));
        }
        if map.values().any(|ops| ops.is_empty()) {
            return Err(TokenError::InvalidCapability(
                "every resource needs at least one operation".into(),
            ));
        }
        Ok(Capability(map))
    }
}

/// Parameters of a single token request
#[derive(Clone, Debug)]
pub struct TokenParams {
    pub client_id: String,
    pub ttl_ms: u64,
    pub capability: Capability,
}

impl Default for TokenParams {
    fn default() -> Self {
        Self {
            client_id: DEFAULT_CLIENT_ID.to_string(),
            ttl_ms: DEFAULT_TTL_MS,
            capability: Capability::default(),
        }
    }
}

/// Signed token request, serialized the way messaging-service clients expect.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest {
    pub key_name: String,
    pub ttl: u64,
    /// JSON-encoded capability
    pub capability: String,
    pub client_id: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
    pub nonce: String,
    pub mac: String,
}

impl TokenRequest {
    /// Text covered by the mac.
    pub fn sign_text(&self) -> String {
        format!(
            "{}\n{}\n{}\n{}\n{}\n{}\n",
            self.key_name, self.ttl, self.capability, self.client_id, self.timestamp, self.nonce
        )
    }

    /// Whether the mac matches `key`.
    pub fn verify(&self, key: &ApiKey) -> bool {
        if key.name() != self.key_name {
            return false;
        }
        let Ok(expected) = base64::engine::general_purpose::STANDARD.decode(&self.mac) else {
            return false;
        };
        let Ok(mut mac) = HmacSha256::new_from_slice(key.secret().as_bytes()) else {
            return false;
        };
        mac.update(self.sign_text().as_bytes());
        mac.verify_slice(&expected).is_ok()
    }

    /// Epoch milliseconds after which the credential is no longer valid.
    pub fn expires_at_ms(&self) -> u64 {
        self.timestamp.saturating_add(self.ttl)
    }

    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at_ms()
    }
}

/// Anything that can mint token requests.
pub trait IssueToken: Send + Sync {
    fn create_token_request(&self, params: &TokenParams) -> Result<TokenRequest, TokenError>;
}

/// Issues token requests signed with a statically configured key.
#[derive(Clone, Debug)]
pub struct TokenIssuer {
    key: ApiKey,
    defaults: TokenParams,
}

impl TokenIssuer {
    pub fn new(key: ApiKey) -> Self {
        Self {
            key,
            defaults: TokenParams::default(),
        }
    }

    pub fn with_defaults(key: ApiKey, defaults: TokenParams) -> Self {
        Self { key, defaults }
    }

    /// Mint a token request with the configured defaults.
    pub fn issue(&self) -> Result<TokenRequest, TokenError> {
        self.create_token_request(&self.defaults)
    }

    fn sign(&self, text: &str) -> Result<String, TokenError> {
        let mut mac = HmacSha256::new_from_slice(self.key.secret().as_bytes())
            .map_err(|e| TokenError::Signing(e.to_string()))?;
        mac.update(text.as_bytes());
        Ok(base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
    }
}

impl IssueToken for TokenIssuer {
    fn create_token_request(&self, params: &TokenParams) -> Result<TokenRequest, TokenError> {
        validation::validate_client_id(&params.client_id).map_err(TokenError::InvalidClientId)?;

        let mut request = TokenRequest {
            key_name: self.key.name().to_string(),
            ttl: params.ttl_ms,
            capability: params.capability.to_json(),
            client_id: params.client_id.clone(),
            timestamp: now_ms()?,
            nonce: new_nonce(),
            mac: String::new(),
        };
        request.mac = self.sign(&request.sign_text())?;

        tracing::debug!(
            key_name = %request.key_name,
            client_id = %request.client_id,
            ttl = request.ttl,
            "issued token request"
        );
        Ok(request)
    }
}

/// Issuer used when no usable key is configured. Every request fails with
/// the error found at startup, so the endpoint answers instead of refusing
/// to start.
#[derive(Clone, Debug)]
pub struct KeylessIssuer {
    reason: TokenError,
}

impl KeylessIssuer {
    pub fn new(reason: TokenError) -> Self {
        Self { reason }
    }
}

impl IssueToken for KeylessIssuer {
    fn create_token_request(&self, _: &TokenParams) -> Result<TokenRequest, TokenError> {
        Err(self.reason.clone())
    }
}

/// Current time in epoch milliseconds
pub fn now_ms() -> Result<u64, TokenError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .map_err(|e| TokenError::Clock(e.to_string()))
}

fn new_nonce() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
pub(crate) fn test_key() -> ApiKey {
    "app123.key456:c2VjcmV0LXNlY3JldA".parse().expect("valid test key")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_parsing() {
        let key: ApiKey = "app.key:secret".parse().unwrap();
        assert_eq!(key.name(), "app.key");
        assert_eq!(key.secret(), "secret");

        assert!(matches!(
            "missing-secret".parse::<ApiKey>(),
            Err(TokenError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_api_key_debug_redacts_secret() {
        let key: ApiKey = "app.key:topsecret".parse().unwrap();
        let printed = format!("{:?}", key);
        assert!(printed.contains("app.key"));
        assert!(!printed.contains("topsecret"));
    }

    #[test]
    fn test_default_capability_json() {
        assert_eq!(Capability::default().to_json(), r#"{"*":["*"]}"#);
    }

    #[test]
    fn test_capability_json_is_sorted() {
        let cap: Capability = r#"{"b":["subscribe","publish"],"a":["publish"]}"#.parse().unwrap();
        assert_eq!(
            cap.to_json(),
            r#"{"a":["publish"],"b":["publish","subscribe"]}"#
        );
    }

    #[test]
    fn test_capability_rejects_empty() {
        assert!("{}".parse::<Capability>().is_err());
        assert!(r#"{"chat":[]}"#.parse::<Capability>().is_err());
        assert!("not json".parse::<Capability>().is_err());
    }

    #[test]
    fn test_sign_text_layout() {
        let request = TokenRequest {
            key_name: "app.key".into(),
            ttl: 1000,
            capability: r#"{"*":["*"]}"#.into(),
            client_id: "alice".into(),
            timestamp: 1_700_000_000_000,
            nonce: "abcdef0123456789".into(),
            mac: String::new(),
        };
        assert_eq!(
            request.sign_text(),
            "app.key\n1000\n{\"*\":[\"*\"]}\nalice\n1700000000000\nabcdef0123456789\n"
        );
    }

    #[test]
    fn test_issued_request_verifies() {
        let issuer = TokenIssuer::new(test_key());
        let request = issuer.issue().unwrap();

        assert_eq!(request.key_name, "app123.key456");
        assert_eq!(request.client_id, DEFAULT_CLIENT_ID);
        assert_eq!(request.ttl, DEFAULT_TTL_MS);
        assert!(request.nonce.len() >= 16);
        assert!(request.verify(&test_key()));
    }

    #[test]
    fn test_tampered_request_fails_verification() {
        let issuer = TokenIssuer::new(test_key());
        let mut request = issuer.issue().unwrap();
        request.client_id = "mallory".into();
        assert!(!request.verify(&test_key()));

        let other_key: ApiKey = "app123.key456:different".parse().unwrap();
        let request = issuer.issue().unwrap();
        assert!(!request.verify(&other_key));
    }

    #[test]
    fn test_nonces_are_unique() {
        let issuer = TokenIssuer::new(test_key());
        let a = issuer.issue().unwrap();
        let b = issuer.issue().unwrap();
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.mac, b.mac);
    }

    #[test]
    fn test_expiry() {
        let issuer = TokenIssuer::with_defaults(
            test_key(),
            TokenParams {
                ttl_ms: 500,
                ..TokenParams::default()
            },
        );
        let request = issuer.issue().unwrap();
        assert!(!request.is_expired_at(request.timestamp));
        assert!(request.is_expired_at(request.timestamp + 500));
    }

    #[test]
    fn test_wildcard_client_id_rejected() {
        let issuer = TokenIssuer::new(test_key());
        let params = TokenParams {
            client_id: "*".into(),
            ..TokenParams::default()
        };
        assert!(issuer.create_token_request(&params).is_err());
    }

    #[test]
    fn test_serializes_camel_case() {
        let request = TokenIssuer::new(test_key()).issue().unwrap();
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("keyName").is_some());
        assert!(json.get("clientId").is_some());
        assert!(json["ttl"].is_u64());
        assert!(json["timestamp"].is_u64());
    }

    #[test]
    fn test_keyless_issuer_repeats_startup_error() {
        let issuer = KeylessIssuer::new(TokenError::MissingKey("ABLY_API_KEY_ROOT".into()));
        for _ in 0..2 {
            assert!(matches!(
                issuer.create_token_request(&TokenParams::default()),
                Err(TokenError::MissingKey(ref env)) if env == "ABLY_API_KEY_ROOT"
            ));
        }
    }
}
