use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Maximum messages kept in the on-screen history
pub const MAX_HISTORY_MESSAGES: usize = 200;

/// Event name used for chat messages on the channel
pub const CHAT_EVENT_NAME: &str = "chat-message";

/// A message as delivered by the messaging service
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    /// Event name the message was published under
    pub name: String,
    /// Payload text
    pub data: String,
    /// Connection that published the message
    pub connection_id: String,
    /// Identity bound to the publishing connection's credential
    pub client_id: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Local time formatted for display
    pub fn display_time(&self) -> String {
        self.timestamp
            .with_timezone(&chrono::Local)
            .format("%H:%M:%S")
            .to_string()
    }
}

/// A message on its way to the service
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub name: String,
    pub data: String,
}

impl OutboundMessage {
    pub fn chat(text: impl Into<String>) -> Self {
        Self {
            name: CHAT_EVENT_NAME.to_string(),
            data: text.into(),
        }
    }
}

/// Who wrote a message, relative to the local connection
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Author {
    Me,
    Other,
}

impl Author {
    /// Attribute a message by comparing connection ids.
    pub fn of(message: &ChatMessage, own_connection_id: Option<&str>) -> Self {
        match own_connection_id {
            Some(own) if message.connection_id == own => Author::Me,
            _ => Author::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Author::Me => "me",
            Author::Other => "other",
        }
    }
}

/// Bounded, ordered history of received messages.
///
/// Holds at most `capacity` entries; when a new message arrives at capacity
/// the oldest one is dropped.
#[derive(Clone, Debug)]
pub struct MessageHistory {
    messages: VecDeque<ChatMessage>,
    capacity: usize,
}

impl Default for MessageHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageHistory {
    pub fn new() -> Self {
        Self::with_capacity(MAX_HISTORY_MESSAGES)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            messages: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Append a message, evicting the oldest entries beyond capacity.
    /// Returns the evicted message, if any.
    pub fn push(&mut self, msg: ChatMessage) -> Option<ChatMessage> {
        let evicted = if self.messages.len() >= self.capacity {
            self.messages.pop_front()
        } else {
            None
        };
        self.messages.push_back(msg);
        evicted
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }

    pub fn latest(&self) -> Option<&ChatMessage> {
        self.messages.back()
    }
}

#[cfg(test)]
pub(crate) fn test_message(n: usize, connection_id: &str) -> ChatMessage {
    ChatMessage {
        id: format!("msg-{}", n),
        name: CHAT_EVENT_NAME.into(),
        data: format!("message {}", n),
        connection_id: connection_id.into(),
        client_id: "tester".into(),
        timestamp: Utc::now(),
    }
}
