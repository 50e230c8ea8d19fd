//! Session bookkeeping for the backend loop.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ServiceError;
use crate::protocol::SessionId;
use crate::service::{Channel, CredentialSource, Realtime, RealtimeClient};

/// One live connection and the channel handles it has handed out
pub struct Session {
    pub client: Box<dyn RealtimeClient>,
    channels: HashMap<String, Arc<dyn Channel>>,
}

impl Session {
    pub fn new(client: Box<dyn RealtimeClient>) -> Self {
        Self {
            client,
            channels: HashMap::new(),
        }
    }

    /// Channel handle, created on first use
    pub fn channel(&mut self, name: &str) -> Result<Arc<dyn Channel>, ServiceError> {
        if let Some(channel) = self.channels.get(name) {
            return Ok(channel.clone());
        }
        let channel = self.client.channel(name)?;
        self.channels.insert(name.to_string(), channel.clone());
        Ok(channel)
    }
}

/// Everything the backend loop owns
pub struct BackendState {
    pub service: Arc<dyn Realtime>,
    pub credentials: CredentialSource,
    pub sessions: HashMap<SessionId, Session>,
}

impl BackendState {
    pub fn new(service: Arc<dyn Realtime>, credentials: CredentialSource) -> Self {
        Self {
            service,
            credentials,
            sessions: HashMap::new(),
        }
    }
}
