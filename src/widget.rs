//! Chat widget state, separated from rendering.
//!
//! A `ChatWidget` owns the on-screen history and the composer for one
//! connection. It talks to its channel only through `ChannelHandle`, so the
//! subscribe/unsubscribe pairing and the submit rules can be exercised without
//! a backend.

use crossbeam_channel::Sender;
use std::time::{Duration, Instant};

use crate::buffer::{Author, ChatMessage, MessageHistory};
use crate::input_state::InputState;
use crate::protocol::{BackendAction, SessionId};

/// How long a transient error stays visible
pub const ERROR_DISPLAY_SECS: u64 = 4;

/// The operations a widget needs from its channel.
pub trait ChannelHandle {
    fn subscribe(&self);
    fn unsubscribe(&self);
    fn publish(&self, text: &str);
}

/// Channel handle that forwards to the backend thread
#[derive(Clone, Debug)]
pub struct BackendChannel {
    pub session: SessionId,
    pub channel: String,
    action_tx: Sender<BackendAction>,
}

impl BackendChannel {
    pub fn new(session: SessionId, channel: impl Into<String>, action_tx: Sender<BackendAction>) -> Self {
        Self {
            session,
            channel: channel.into(),
            action_tx,
        }
    }

    fn send(&self, action: BackendAction) {
        if self.action_tx.send(action).is_err() {
            tracing::warn!(session = self.session, "backend is gone, action dropped");
        }
    }
}

impl ChannelHandle for BackendChannel {
    fn subscribe(&self) {
        self.send(BackendAction::Subscribe {
            session: self.session,
            channel: self.channel.clone(),
        });
    }

    fn unsubscribe(&self) {
        self.send(BackendAction::Unsubscribe {
            session: self.session,
            channel: self.channel.clone(),
        });
    }

    fn publish(&self, text: &str) {
        self.send(BackendAction::Publish {
            session: self.session,
            channel: self.channel.clone(),
            text: text.to_string(),
        });
    }
}

pub struct ChatWidget<C: ChannelHandle> {
    channel: C,
    pub history: MessageHistory,
    pub input: InputState,
    connection_id: Option<String>,
    client_id: Option<String>,
    mounted: bool,
    /// Set when a message arrives; the renderer scrolls to the newest entry and clears it
    pub scroll_to_latest: bool,
    error: Option<(String, Instant)>,
}

impl<C: ChannelHandle> ChatWidget<C> {
    pub fn new(channel: C) -> Self {
        Self {
            channel,
            history: MessageHistory::new(),
            input: InputState::new(),
            connection_id: None,
            client_id: None,
            mounted: false,
            scroll_to_latest: false,
            error: None,
        }
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Register the message listener. No-op while already mounted.
    pub fn mount(&mut self) {
        if self.mounted {
            return;
        }
        self.channel.subscribe();
        self.mounted = true;
    }

    /// Deregister the listener registered by `mount`.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.channel.unsubscribe();
        self.mounted = false;
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn set_connection(&mut self, connection_id: impl Into<String>, client_id: impl Into<String>) {
        self.connection_id = Some(connection_id.into());
        self.client_id = Some(client_id.into());
    }

    pub fn clear_connection(&mut self) {
        self.connection_id = None;
        self.client_id = None;
        self.mounted = false;
    }

    pub fn connection_id(&self) -> Option<&str> {
        self.connection_id.as_deref()
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    pub fn is_connected(&self) -> bool {
        self.connection_id.is_some()
    }

    /// Append an incoming message and ask for a scroll to it.
    pub fn on_message(&mut self, message: ChatMessage) {
        self.history.push(message);
        self.scroll_to_latest = true;
    }

    /// Whether the Send button is enabled: true exactly when `submit` would publish
    pub fn can_send(&self) -> bool {
        self.input.validated().is_ok()
    }

    /// Publish the composed text and clear the input.
    /// Returns whether anything was published. Non-blank text that fails
    /// validation stays in the input and is reported as an error.
    pub fn submit(&mut self) -> bool {
        match self.input.take_message() {
            Ok(text) => {
                self.channel.publish(&text);
                true
            }
            Err(e) => {
                if !self.input.is_empty() {
                    self.show_error(e);
                }
                false
            }
        }
    }

    /// Attribution is recomputed on every call; nothing is stored per message.
    pub fn author_of(&self, message: &ChatMessage) -> Author {
        Author::of(message, self.connection_id.as_deref())
    }

    pub fn show_error(&mut self, message: impl Into<String>) {
        self.error = Some((message.into(), Instant::now()));
    }

    /// The current error, if it has not expired yet
    pub fn error(&self) -> Option<&str> {
        self.error
            .as_ref()
            .filter(|(_, at)| at.elapsed() < Duration::from_secs(ERROR_DISPLAY_SECS))
            .map(|(msg, _)| msg.as_str())
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }
}

impl<C: ChannelHandle> Drop for ChatWidget<C> {
    fn drop(&mut self) {
        self.unmount();
    }
}
