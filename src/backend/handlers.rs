//! Backend action handling
//!
//! Every failure here is reported as `GuiEvent::Error` for the session it
//! belongs to; nothing stops the loop except `BackendAction::Shutdown`.

use crossbeam_channel::Sender;
use std::sync::Arc;

use super::state::{BackendState, Session};
use crate::buffer::OutboundMessage;
use crate::error::ServiceError;
use crate::protocol::{BackendAction, GuiEvent, SessionId};
use crate::service::MessageListener;

/// Handle one action. Returns `false` when the loop should stop.
pub async fn handle_backend_action(
    action: BackendAction,
    state: &mut BackendState,
    event_tx: &Sender<GuiEvent>,
) -> bool {
    tracing::debug!(?action, "backend action");

    let (session, result) = match action {
        BackendAction::Connect(session) => (session, connect(state, session, event_tx).await),
        BackendAction::Subscribe { session, channel } => {
            (session, subscribe(state, session, &channel, event_tx).await)
        }
        BackendAction::Unsubscribe { session, channel } => {
            (session, unsubscribe(state, session, &channel, event_tx).await)
        }
        BackendAction::Publish {
            session,
            channel,
            text,
        } => (session, publish(state, session, &channel, text).await),
        BackendAction::Disconnect(session) => {
            disconnect(state, session, event_tx).await;
            (session, Ok(()))
        }
        BackendAction::Shutdown => {
            let sessions: Vec<SessionId> = state.sessions.keys().copied().collect();
            for session in sessions {
                disconnect(state, session, event_tx).await;
            }
            return false;
        }
    };

    if let Err(e) = result {
        tracing::warn!(session, "backend action failed: {}", e);
        let _ = event_tx.send(GuiEvent::Error {
            session,
            message: e.to_string(),
        });
    }
    true
}

async fn connect(
    state: &mut BackendState,
    session: SessionId,
    event_tx: &Sender<GuiEvent>,
) -> Result<(), ServiceError> {
    if let Some(existing) = state.sessions.get(&session) {
        // Already connected: repeat the announcement
        let _ = event_tx.send(GuiEvent::Connected {
            session,
            connection_id: existing.client.connection_id().to_string(),
            client_id: existing.client.client_id().to_string(),
        });
        return Ok(());
    }

    let credential = state.credentials.fetch().await?;
    let client = state.service.connect(&credential).await?;

    let _ = event_tx.send(GuiEvent::Connected {
        session,
        connection_id: client.connection_id().to_string(),
        client_id: client.client_id().to_string(),
    });
    state.sessions.insert(session, Session::new(client));
    Ok(())
}

fn session_mut(state: &mut BackendState, session: SessionId) -> Result<&mut Session, ServiceError> {
    state
        .sessions
        .get_mut(&session)
        .ok_or_else(|| ServiceError::ConnectionClosed(format!("session {}", session)))
}

async fn subscribe(
    state: &mut BackendState,
    session: SessionId,
    channel_name: &str,
    event_tx: &Sender<GuiEvent>,
) -> Result<(), ServiceError> {
    let channel = session_mut(state, session)?.channel(channel_name)?;

    let tx = event_tx.clone();
    let listener: MessageListener = Arc::new(move |message| {
        let _ = tx.send(GuiEvent::MessageReceived { session, message });
    });
    channel.subscribe(listener).await?;

    let _ = event_tx.send(GuiEvent::Subscribed {
        session,
        channel: channel.name().to_string(),
    });
    Ok(())
}

async fn unsubscribe(
    state: &mut BackendState,
    session: SessionId,
    channel_name: &str,
    event_tx: &Sender<GuiEvent>,
) -> Result<(), ServiceError> {
    let channel = session_mut(state, session)?.channel(channel_name)?;
    channel.unsubscribe().await?;

    let _ = event_tx.send(GuiEvent::Unsubscribed {
        session,
        channel: channel.name().to_string(),
    });
    Ok(())
}

async fn publish(
    state: &mut BackendState,
    session: SessionId,
    channel_name: &str,
    text: String,
) -> Result<(), ServiceError> {
    let channel = session_mut(state, session)?.channel(channel_name)?;
    channel.publish(OutboundMessage::chat(text)).await
}

async fn disconnect(state: &mut BackendState, session: SessionId, event_tx: &Sender<GuiEvent>) {
    if let Some(removed) = state.sessions.remove(&session) {
        removed.client.close().await;
    }
    let _ = event_tx.send(GuiEvent::Disconnected(session));
}
