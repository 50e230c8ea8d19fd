/// Messaging-service capability interface
///
/// The hosted pub/sub service is reached only through these traits:
/// - `Realtime`: connect with a credential
/// - `RealtimeClient`: one live connection, hands out channels
/// - `Channel`: subscribe / unsubscribe / publish on a named topic
///
/// `LocalHub` is the in-process implementation; `CredentialSource` decides
/// where credentials come from.
mod auth;
mod local;

pub use auth::CredentialSource;
pub use local::LocalHub;

use async_trait::async_trait;
use std::sync::Arc;

use crate::buffer::{ChatMessage, OutboundMessage};
use crate::error::ServiceError;
use crate::token::TokenRequest;

/// Callback invoked for every message delivered on a subscribed channel
pub type MessageListener = Arc<dyn Fn(ChatMessage) + Send + Sync>;

#[async_trait]
pub trait Realtime: Send + Sync {
    /// Open a connection authenticated by `credential`.
    async fn connect(&self, credential: &TokenRequest) -> Result<Box<dyn RealtimeClient>, ServiceError>;
}

#[async_trait]
pub trait RealtimeClient: Send + Sync {
    /// Identifier the service assigned to this connection
    fn connection_id(&self) -> &str;

    /// Identity bound to the credential this connection used
    fn client_id(&self) -> &str;

    /// Handle to a named channel on this connection
    fn channel(&self, name: &str) -> Result<Arc<dyn Channel>, ServiceError>;

    /// Close the connection, dropping all of its subscriptions
    async fn close(&self);
}

#[async_trait]
pub trait Channel: Send + Sync {
    fn name(&self) -> &str;

    /// Register a listener for every message on this channel.
    async fn subscribe(&self, listener: MessageListener) -> Result<(), ServiceError>;

    /// Remove every listener this connection registered on the channel.
    async fn unsubscribe(&self) -> Result<(), ServiceError>;

    async fn publish(&self, message: OutboundMessage) -> Result<(), ServiceError>;
}
