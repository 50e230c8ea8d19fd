use crate::buffer::ChatMessage;

/// Identifies one chat widget's connection inside the app
pub type SessionId = u32;

/// Actions sent from the UI to the Backend
#[derive(Debug, Clone)]
pub enum BackendAction {
    /// Fetch a credential and open a connection for this session
    Connect(SessionId),
    /// Register the session's listener on a channel
    Subscribe { session: SessionId, channel: String },
    /// Remove the session's listeners from a channel
    Unsubscribe { session: SessionId, channel: String },
    /// Publish chat text on a channel
    Publish {
        session: SessionId,
        channel: String,
        text: String,
    },
    /// Close the session's connection
    Disconnect(SessionId),
    /// Close everything and stop the backend loop
    Shutdown,
}

/// Events sent from the Backend to the UI
#[derive(Debug, Clone)]
pub enum GuiEvent {
    /// Connection established
    Connected {
        session: SessionId,
        connection_id: String,
        client_id: String,
    },
    /// Connection closed
    Disconnected(SessionId),
    /// Listener registered
    Subscribed { session: SessionId, channel: String },
    /// Listener removed
    Unsubscribed { session: SessionId, channel: String },
    /// A message arrived on a subscribed channel
    MessageReceived {
        session: SessionId,
        message: ChatMessage,
    },
    /// A recoverable failure to surface in the UI
    Error { session: SessionId, message: String },
}

impl GuiEvent {
    pub fn session(&self) -> SessionId {
        match self {
            GuiEvent::Connected { session, .. }
            | GuiEvent::Subscribed { session, .. }
            | GuiEvent::Unsubscribed { session, .. }
            | GuiEvent::MessageReceived { session, .. }
            | GuiEvent::Error { session, .. } => *session,
            GuiEvent::Disconnected(session) => *session,
        }
    }
}
