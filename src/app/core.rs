//! Core ChatApp struct definition and initialization

use crossbeam_channel::{unbounded, Receiver, Sender};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::backend::spawn_backend;
use crate::config::{save_settings_to, settings_path, Settings};
use crate::logging::TranscriptLogger;
use crate::protocol::{BackendAction, GuiEvent, SessionId};
use crate::service::{CredentialSource, Realtime};
use crate::ui;
use crate::widget::{BackendChannel, ChatWidget};

pub struct ChatApp {
    // Channels for backend communication
    pub action_tx: Sender<BackendAction>,
    pub event_rx: Receiver<GuiEvent>,
    backend: Option<JoinHandle<()>>,

    /// One widget per client connection, oldest first
    pub widgets: Vec<ChatWidget<BackendChannel>>,
    next_session: SessionId,

    pub settings: Settings,
    /// Where settings are written on exit; `None` disables persistence
    settings_path: Option<PathBuf>,
    pub theme: ui::ChatTheme,
    /// Shown in the toolbar
    pub credentials_label: String,
    pub(super) transcript: Option<TranscriptLogger>,
}

impl ChatApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        settings: Settings,
        service: Arc<dyn Realtime>,
        credentials: CredentialSource,
    ) -> Self {
        let (action_tx, action_rx) = unbounded::<BackendAction>();
        let (event_tx, event_rx) = unbounded::<GuiEvent>();

        let credentials_label = credentials.describe();
        let backend = spawn_backend(service, credentials, action_rx, event_tx);

        let mut app = Self::with_channels(settings, action_tx, event_rx, credentials_label);
        app.backend = Some(backend);
        app.settings_path = settings_path();

        if app.settings.log_transcripts {
            match TranscriptLogger::new() {
                Ok(logger) => {
                    tracing::info!("Writing transcripts to {}", logger.log_dir().display());
                    app.transcript = Some(logger);
                }
                Err(e) => tracing::warn!("Transcripts disabled: {}", e),
            }
        }

        ui::apply_app_style(&cc.egui_ctx, &app.theme);
        app.add_client();
        app
    }

    /// App wired to already-created backend channels. No window, no clients
    /// and no settings persistence.
    pub fn with_channels(
        settings: Settings,
        action_tx: Sender<BackendAction>,
        event_rx: Receiver<GuiEvent>,
        credentials_label: String,
    ) -> Self {
        let theme = ui::ChatTheme::from_name(&settings.theme);
        Self {
            action_tx,
            event_rx,
            backend: None,
            widgets: Vec::new(),
            next_session: 1,
            settings,
            settings_path: None,
            theme,
            credentials_label,
            transcript: None,
        }
    }

    /// Open a new client connection with its own widget. The widget mounts
    /// once the backend reports the connection.
    pub fn add_client(&mut self) -> SessionId {
        let session = self.next_session;
        self.next_session += 1;

        let channel = BackendChannel::new(session, self.settings.channel.clone(), self.action_tx.clone());
        self.widgets.push(ChatWidget::new(channel));
        if self.action_tx.send(BackendAction::Connect(session)).is_err() {
            tracing::warn!(session, "backend is gone, cannot connect");
        }
        session
    }

    /// Unmount and drop the widget for `session`, then close its connection.
    pub fn close_client(&mut self, session: SessionId) {
        if let Some(index) = self.widget_index(session) {
            // Dropping the widget sends the matching unsubscribe
            self.widgets.remove(index);
        }
        let _ = self.action_tx.send(BackendAction::Disconnect(session));
    }

    pub(super) fn widget_index(&self, session: SessionId) -> Option<usize> {
        self.widgets.iter().position(|w| w.channel().session == session)
    }

    pub fn widget(&self, session: SessionId) -> Option<&ChatWidget<BackendChannel>> {
        self.widget_index(session).map(|i| &self.widgets[i])
    }

    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
        self.settings.theme = self.theme.name.to_string();
    }

    fn save(&self) {
        let Some(path) = &self.settings_path else {
            return;
        };
        if let Err(e) = save_settings_to(&self.settings, path) {
            tracing::warn!("Failed to save settings: {}", e);
        }
    }
}

impl Drop for ChatApp {
    fn drop(&mut self) {
        self.save();
        // Unsubscribe every widget before the backend goes away
        self.widgets.clear();
        let _ = self.action_tx.send(BackendAction::Shutdown);
        if let Some(handle) = self.backend.take() {
            if handle.join().is_err() {
                tracing::warn!("Backend thread panicked");
            }
        }
    }
}
