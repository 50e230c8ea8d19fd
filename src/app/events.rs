//! Event processing from backend

use super::ChatApp;
use crate::logging::LogEntry;
use crate::protocol::{BackendAction, GuiEvent};

impl ChatApp {
    pub fn process_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            self.process_single_event(event);
        }
    }

    fn process_single_event(&mut self, event: GuiEvent) {
        let session = event.session();
        let Some(index) = self.widget_index(session) else {
            // The client was closed while the event was in flight
            if matches!(event, GuiEvent::Connected { .. }) {
                let _ = self.action_tx.send(BackendAction::Disconnect(session));
            }
            return;
        };

        match event {
            GuiEvent::Connected {
                connection_id,
                client_id,
                ..
            } => {
                tracing::info!(session, %connection_id, %client_id, "connected");
                let widget = &mut self.widgets[index];
                widget.set_connection(connection_id, client_id);
                widget.mount();
            }
            GuiEvent::Subscribed { channel, .. } => {
                tracing::debug!(session, %channel, "subscribed");
            }
            GuiEvent::Unsubscribed { channel, .. } => {
                tracing::debug!(session, %channel, "unsubscribed");
            }
            GuiEvent::MessageReceived { message, .. } => {
                // Every widget sees the same traffic; the oldest one writes the transcript
                if index == 0 {
                    if let Some(logger) = &self.transcript {
                        logger.log(LogEntry {
                            channel: self.settings.channel.clone(),
                            timestamp: message.display_time(),
                            client_id: message.client_id.clone(),
                            message: message.data.clone(),
                        });
                    }
                }
                self.widgets[index].on_message(message);
            }
            GuiEvent::Error { message, .. } => {
                self.widgets[index].show_error(message);
            }
            GuiEvent::Disconnected(_) => {
                tracing::info!(session, "disconnected");
                self.widgets[index].clear_connection();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{test_message, Author};
    use crate::config::Settings;
    use crossbeam_channel::{unbounded, Receiver, Sender};

    fn app() -> (ChatApp, Sender<GuiEvent>, Receiver<BackendAction>) {
        let (action_tx, action_rx) = unbounded();
        let (event_tx, event_rx) = unbounded();
        let app = ChatApp::with_channels(Settings::default(), action_tx, event_rx, "test".into());
        (app, event_tx, action_rx)
    }

    fn drain(rx: &Receiver<BackendAction>) -> Vec<BackendAction> {
        rx.try_iter().collect()
    }

    #[test]
    fn test_connected_mounts_widget() {
        let (mut app, events, actions) = app();
        let session = app.add_client();
        assert!(matches!(&drain(&actions)[..], [BackendAction::Connect(s)] if *s == session));

        events
            .send(GuiEvent::Connected {
                session,
                connection_id: "conn-1".into(),
                client_id: "chat-demo-client".into(),
            })
            .unwrap();
        app.process_events();

        let widget = app.widget(session).unwrap();
        assert!(widget.is_mounted());
        assert_eq!(widget.connection_id(), Some("conn-1"));
        assert!(matches!(
            &drain(&actions)[..],
            [BackendAction::Subscribe { session: s, channel }] if *s == session && channel == "chat-demo"
        ));
    }

    #[test]
    fn test_messages_are_routed_by_session() {
        let (mut app, events, _actions) = app();
        let first = app.add_client();
        let second = app.add_client();
        for (session, conn) in [(first, "conn-1"), (second, "conn-2")] {
            events
                .send(GuiEvent::Connected {
                    session,
                    connection_id: conn.into(),
                    client_id: "chat-demo-client".into(),
                })
                .unwrap();
        }
        for session in [first, second] {
            events
                .send(GuiEvent::MessageReceived {
                    session,
                    message: test_message(1, "conn-1"),
                })
                .unwrap();
        }
        app.process_events();

        let a = app.widget(first).unwrap();
        let b = app.widget(second).unwrap();
        assert_eq!(a.history.len(), 1);
        assert_eq!(b.history.len(), 1);
        assert_eq!(a.author_of(a.history.latest().unwrap()), Author::Me);
        assert_eq!(b.author_of(b.history.latest().unwrap()), Author::Other);
    }

    #[test]
    fn test_error_and_disconnect() {
        let (mut app, events, _actions) = app();
        let session = app.add_client();
        events
            .send(GuiEvent::Connected {
                session,
                connection_id: "conn-1".into(),
                client_id: "c".into(),
            })
            .unwrap();
        events
            .send(GuiEvent::Error {
                session,
                message: "publish failed".into(),
            })
            .unwrap();
        events.send(GuiEvent::Disconnected(session)).unwrap();
        app.process_events();

        let widget = app.widget(session).unwrap();
        assert_eq!(widget.error(), Some("publish failed"));
        assert!(!widget.is_connected());
        assert!(!widget.is_mounted());
    }

    #[test]
    fn test_close_client_unsubscribes_then_disconnects() {
        let (mut app, events, actions) = app();
        let session = app.add_client();
        events
            .send(GuiEvent::Connected {
                session,
                connection_id: "conn-1".into(),
                client_id: "c".into(),
            })
            .unwrap();
        app.process_events();
        drain(&actions);

        app.close_client(session);
        assert!(app.widget(session).is_none());
        let sent = drain(&actions);
        assert!(matches!(sent[0], BackendAction::Unsubscribe { session: s, .. } if s == session));
        assert!(matches!(sent[1], BackendAction::Disconnect(s) if s == session));
    }

    #[test]
    fn test_late_connect_for_closed_client_is_disconnected() {
        let (mut app, events, actions) = app();
        let session = app.add_client();
        app.close_client(session);
        drain(&actions);

        events
            .send(GuiEvent::Connected {
                session,
                connection_id: "conn-1".into(),
                client_id: "c".into(),
            })
            .unwrap();
        app.process_events();
        assert!(matches!(&drain(&actions)[..], [BackendAction::Disconnect(s)] if *s == session));
    }

    #[test]
    fn test_drop_sends_shutdown() {
        let (mut app, _events, actions) = app();
        app.add_client();
        drop(app);
        assert!(matches!(drain(&actions).last(), Some(BackendAction::Shutdown)));
    }

    #[test]
    fn test_toggle_theme_updates_settings() {
        let (mut app, _events, _actions) = app();
        assert_eq!(app.settings.theme, "dark");
        app.toggle_theme();
        assert_eq!(app.settings.theme, "light");
        assert!(!app.theme.dark_mode);
    }
}
