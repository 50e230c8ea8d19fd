//! In-process messaging service.
//!
//! Every connection made through the same `LocalHub` shares one subscription
//! table, so publishes fan out to all subscribers of a channel, the publisher
//! included.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{Channel, CredentialSource, MessageListener, Realtime, RealtimeClient};
use crate::buffer::{ChatMessage, OutboundMessage};
use crate::error::ServiceError;
use crate::token::{self, ApiKey, TokenRequest};
use crate::validation;

struct Subscription {
    connection_id: String,
    listener: MessageListener,
}

#[derive(Default)]
struct HubState {
    open_connections: HashSet<String>,
    subscriptions: HashMap<String, Vec<Subscription>>,
    message_serial: u64,
}

struct HubInner {
    /// When set, credentials must carry a mac made with this key
    key: Option<ApiKey>,
    state: Mutex<HubState>,
}

#[derive(Clone)]
pub struct LocalHub {
    inner: Arc<HubInner>,
}

impl Default for LocalHub {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalHub {
    /// Hub accepting any unexpired credential
    pub fn new() -> Self {
        Self {
            inner: Arc::new(HubInner {
                key: None,
                state: Mutex::new(HubState::default()),
            }),
        }
    }

    /// Hub that also verifies each credential's signature
    pub fn with_key(key: ApiKey) -> Self {
        Self {
            inner: Arc::new(HubInner {
                key: Some(key),
                state: Mutex::new(HubState::default()),
            }),
        }
    }

    /// Hub for a desktop client using `source`. Signatures are checked only
    /// when credentials are minted in-process with `key`; a remote issuer may
    /// sign with a key this process does not hold.
    pub fn for_source(source: &CredentialSource, key: Option<ApiKey>) -> Self {
        match (source, key) {
            (CredentialSource::Issuer { .. }, Some(key)) => Self::with_key(key),
            _ => Self::new(),
        }
    }

    fn state(&self) -> MutexGuard<'_, HubState> {
        // Listeners run outside the lock, so a poisoned guard still holds consistent data
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Listeners currently registered on `channel`
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.state()
            .subscriptions
            .get(channel)
            .map_or(0, |subs| subs.len())
    }

    pub fn connection_count(&self) -> usize {
        self.state().open_connections.len()
    }

    fn check_credential(&self, credential: &TokenRequest) -> Result<(), ServiceError> {
        let now = token::now_ms()?;
        if credential.is_expired_at(now) {
            return Err(ServiceError::CredentialRejected(format!(
                "token request expired at {}",
                credential.expires_at_ms()
            )));
        }
        if let Some(key) = &self.inner.key {
            if !credential.verify(key) {
                return Err(ServiceError::CredentialRejected(
                    "token request signature does not match".into(),
                ));
            }
        }
        Ok(())
    }

    fn is_open(&self, connection_id: &str) -> bool {
        self.state().open_connections.contains(connection_id)
    }
}

#[async_trait]
impl Realtime for LocalHub {
    async fn connect(&self, credential: &TokenRequest) -> Result<Box<dyn RealtimeClient>, ServiceError> {
        self.check_credential(credential)?;

        let connection_id = uuid::Uuid::new_v4().simple().to_string()[..12].to_string();
        self.state().open_connections.insert(connection_id.clone());

        tracing::info!(
            connection_id = %connection_id,
            client_id = %credential.client_id,
            "connection opened"
        );

        Ok(Box::new(LocalClient {
            hub: self.clone(),
            connection_id,
            client_id: credential.client_id.clone(),
        }))
    }
}

struct LocalClient {
    hub: LocalHub,
    connection_id: String,
    client_id: String,
}

#[async_trait]
impl RealtimeClient for LocalClient {
    fn connection_id(&self) -> &str {
        &self.connection_id
    }

    fn client_id(&self) -> &str {
        &self.client_id
    }

    fn channel(&self, name: &str) -> Result<Arc<dyn Channel>, ServiceError> {
        validation::validate_channel_name(name).map_err(ServiceError::InvalidChannel)?;
        Ok(Arc::new(LocalChannel {
            hub: self.hub.clone(),
            name: name.to_string(),
            connection_id: self.connection_id.clone(),
            client_id: self.client_id.clone(),
        }))
    }

    async fn close(&self) {
        let mut state = self.hub.state();
        state.open_connections.remove(&self.connection_id);
        for subs in state.subscriptions.values_mut() {
            subs.retain(|s| s.connection_id != self.connection_id);
        }
        state.subscriptions.retain(|_, subs| !subs.is_empty());
        tracing::info!(connection_id = %self.connection_id, "connection closed");
    }
}

struct LocalChannel {
    hub: LocalHub,
    name: String,
    connection_id: String,
    client_id: String,
}

impl LocalChannel {
    fn ensure_open(&self) -> Result<(), ServiceError> {
        if self.hub.is_open(&self.connection_id) {
            Ok(())
        } else {
            Err(ServiceError::ConnectionClosed(self.connection_id.clone()))
        }
    }
}

#[async_trait]
impl Channel for LocalChannel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn subscribe(&self, listener: MessageListener) -> Result<(), ServiceError> {
        self.ensure_open()?;
        self.hub
            .state()
            .subscriptions
            .entry(self.name.clone())
            .or_default()
            .push(Subscription {
                connection_id: self.connection_id.clone(),
                listener,
            });
        tracing::debug!(channel = %self.name, connection_id = %self.connection_id, "subscribed");
        Ok(())
    }

    async fn unsubscribe(&self) -> Result<(), ServiceError> {
        let mut state = self.hub.state();
        if let Some(subs) = state.subscriptions.get_mut(&self.name) {
            subs.retain(|s| s.connection_id != self.connection_id);
            if subs.is_empty() {
                state.subscriptions.remove(&self.name);
            }
        }
        tracing::debug!(channel = %self.name, connection_id = %self.connection_id, "unsubscribed");
        Ok(())
    }

    async fn publish(&self, message: OutboundMessage) -> Result<(), ServiceError> {
        self.ensure_open()?;
        validation::validate_message(&message.data).map_err(ServiceError::InvalidMessage)?;

        let (delivered, listeners) = {
            let mut state = self.hub.state();
            state.message_serial += 1;
            let delivered = ChatMessage {
                id: format!("{}:{}", self.connection_id, state.message_serial),
                name: message.name,
                data: message.data,
                connection_id: self.connection_id.clone(),
                client_id: self.client_id.clone(),
                timestamp: Utc::now(),
            };
            let listeners: Vec<MessageListener> = state
                .subscriptions
                .get(&self.name)
                .map(|subs| subs.iter().map(|s| s.listener.clone()).collect())
                .unwrap_or_default();
            (delivered, listeners)
        };

        // Invoke outside the lock so listeners may call back into the hub
        for listener in listeners {
            listener(delivered.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{test_key, IssueToken, TokenIssuer, TokenParams};

    fn collector() -> (MessageListener, Arc<Mutex<Vec<ChatMessage>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let listener: MessageListener = Arc::new(move |msg| sink.lock().unwrap().push(msg));
        (listener, seen)
    }

    fn credential() -> TokenRequest {
        TokenIssuer::new(test_key()).issue().unwrap()
    }

    #[tokio::test]
    async fn test_connections_get_unique_ids() {
        let hub = LocalHub::new();
        let a = hub.connect(&credential()).await.unwrap();
        let b = hub.connect(&credential()).await.unwrap();
        assert_ne!(a.connection_id(), b.connection_id());
        assert_eq!(a.client_id(), "chat-demo-client");
        assert_eq!(hub.connection_count(), 2);
    }

    #[tokio::test]
    async fn test_publish_reaches_every_subscriber_including_sender() {
        let hub = LocalHub::new();
        let alice = hub.connect(&credential()).await.unwrap();
        let bob = hub.connect(&credential()).await.unwrap();

        let (alice_listener, alice_seen) = collector();
        let (bob_listener, bob_seen) = collector();
        alice.channel("chat-demo").unwrap().subscribe(alice_listener).await.unwrap();
        bob.channel("chat-demo").unwrap().subscribe(bob_listener).await.unwrap();

        alice
            .channel("chat-demo")
            .unwrap()
            .publish(OutboundMessage::chat("hello"))
            .await
            .unwrap();

        for seen in [&alice_seen, &bob_seen] {
            let seen = seen.lock().unwrap();
            assert_eq!(seen.len(), 1);
            assert_eq!(seen[0].data, "hello");
            assert_eq!(seen[0].connection_id, alice.connection_id());
        }
    }

    #[tokio::test]
    async fn test_channels_are_isolated() {
        let hub = LocalHub::new();
        let client = hub.connect(&credential()).await.unwrap();
        let (listener, seen) = collector();
        client.channel("room-a").unwrap().subscribe(listener).await.unwrap();
        client
            .channel("room-b")
            .unwrap()
            .publish(OutboundMessage::chat("elsewhere"))
            .await
            .unwrap();
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let hub = LocalHub::new();
        let client = hub.connect(&credential()).await.unwrap();
        let channel = client.channel("chat-demo").unwrap();
        let (listener, seen) = collector();

        channel.subscribe(listener).await.unwrap();
        assert_eq!(hub.subscriber_count("chat-demo"), 1);
        channel.unsubscribe().await.unwrap();
        assert_eq!(hub.subscriber_count("chat-demo"), 0);

        channel.publish(OutboundMessage::chat("anyone?")).await.unwrap();
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unsubscribe_leaves_other_connections() {
        let hub = LocalHub::new();
        let a = hub.connect(&credential()).await.unwrap();
        let b = hub.connect(&credential()).await.unwrap();
        let (la, _) = collector();
        let (lb, _) = collector();
        a.channel("chat-demo").unwrap().subscribe(la).await.unwrap();
        b.channel("chat-demo").unwrap().subscribe(lb).await.unwrap();

        a.channel("chat-demo").unwrap().unsubscribe().await.unwrap();
        assert_eq!(hub.subscriber_count("chat-demo"), 1);
    }

    #[tokio::test]
    async fn test_expired_credential_rejected() {
        let issuer = TokenIssuer::new(test_key());
        let mut request = issuer
            .create_token_request(&TokenParams {
                ttl_ms: 1,
                ..TokenParams::default()
            })
            .unwrap();
        request.timestamp = 0;

        let hub = LocalHub::new();
        assert!(matches!(
            hub.connect(&request).await,
            Err(ServiceError::CredentialRejected(_))
        ));
    }

    #[tokio::test]
    async fn test_keyed_hub_verifies_signature() {
        let hub = LocalHub::with_key(test_key());
        assert!(hub.connect(&credential()).await.is_ok());

        let mut forged = credential();
        forged.client_id = "someone-else".into();
        assert!(matches!(
            hub.connect(&forged).await,
            Err(ServiceError::CredentialRejected(_))
        ));
    }

    #[tokio::test]
    async fn test_closed_connection_cannot_publish() {
        let hub = LocalHub::new();
        let client = hub.connect(&credential()).await.unwrap();
        let channel = client.channel("chat-demo").unwrap();
        let (listener, _) = collector();
        channel.subscribe(listener).await.unwrap();

        client.close().await;
        assert_eq!(hub.subscriber_count("chat-demo"), 0);
        assert!(matches!(
            channel.publish(OutboundMessage::chat("late")).await,
            Err(ServiceError::ConnectionClosed(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_blank_messages_and_bad_channels() {
        let hub = LocalHub::new();
        let client = hub.connect(&credential()).await.unwrap();
        assert!(matches!(
            client.channel(""),
            Err(ServiceError::InvalidChannel(_))
        ));
        let channel = client.channel("chat-demo").unwrap();
        assert!(matches!(
            channel.publish(OutboundMessage::chat("   ")).await,
            Err(ServiceError::InvalidMessage(_))
        ));
    }

    #[tokio::test]
    async fn test_hub_verifies_only_in_process_credentials() {
        let foreign_key: ApiKey = "other.key:b3RoZXItc2VjcmV0".parse().unwrap();
        let foreign = TokenIssuer::new(foreign_key).issue().unwrap();

        // Remote issuer: its key is unknown here, so signatures are not checked
        let remote = CredentialSource::auth_url("http://issuer.test/api/createTokenRequest").unwrap();
        let hub = LocalHub::for_source(&remote, Some(test_key()));
        assert!(hub.connect(&foreign).await.is_ok());

        // In-process issuer: the hub shares its key and rejects anything else
        let local = CredentialSource::resolve(None, Some(test_key())).unwrap();
        let hub = LocalHub::for_source(&local, Some(test_key()));
        assert!(matches!(
            hub.connect(&foreign).await,
            Err(ServiceError::CredentialRejected(_))
        ));
        assert!(hub.connect(&credential()).await.is_ok());
    }
}
