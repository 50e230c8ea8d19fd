//! Backend main event loop.

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio::runtime::Runtime;

use super::handlers;
use super::state::BackendState;
use crate::protocol::{BackendAction, GuiEvent};
use crate::service::{CredentialSource, Realtime};

/// How long the loop idles when no actions are queued
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Run the backend event loop on a tokio runtime until `Shutdown` or until
/// the UI drops its sender.
pub fn run_backend(
    service: Arc<dyn Realtime>,
    credentials: CredentialSource,
    action_rx: Receiver<BackendAction>,
    event_tx: Sender<GuiEvent>,
) {
    let rt = match Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create Tokio runtime: {}", e);
            return;
        }
    };

    rt.block_on(async move {
        tracing::info!("Backend started, credentials from {}", credentials.describe());
        let mut state = BackendState::new(service, credentials);

        'outer: loop {
            // Drain everything the UI queued since the last pass
            loop {
                match action_rx.try_recv() {
                    Ok(action) => {
                        if !handlers::handle_backend_action(action, &mut state, &event_tx).await {
                            break 'outer;
                        }
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        handlers::handle_backend_action(BackendAction::Shutdown, &mut state, &event_tx)
                            .await;
                        break 'outer;
                    }
                }
            }

            tokio::time::sleep(POLL_INTERVAL).await;
        }

        tracing::info!("Backend stopped");
    });
}

/// Spawn `run_backend` on its own thread.
pub fn spawn_backend(
    service: Arc<dyn Realtime>,
    credentials: CredentialSource,
    action_rx: Receiver<BackendAction>,
    event_tx: Sender<GuiEvent>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        run_backend(service, credentials, action_rx, event_tx);
    })
}
