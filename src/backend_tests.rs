//! Backend loop tests against the in-process hub

use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::backend::spawn_backend;
use crate::error::TokenError;
use crate::protocol::{BackendAction, GuiEvent, SessionId};
use crate::service::{CredentialSource, LocalHub};
use crate::token::{test_key, KeylessIssuer, TokenIssuer, TokenParams};

const TIMEOUT: Duration = Duration::from_secs(5);

struct Harness {
    hub: LocalHub,
    actions: Sender<BackendAction>,
    events: Receiver<GuiEvent>,
    handle: JoinHandle<()>,
}

fn start() -> Harness {
    let hub = LocalHub::with_key(test_key());
    let credentials = CredentialSource::issuer(Arc::new(TokenIssuer::new(test_key())), TokenParams::default());
    start_with(hub, credentials)
}

fn start_with(hub: LocalHub, credentials: CredentialSource) -> Harness {
    let (action_tx, action_rx) = unbounded::<BackendAction>();
    let (event_tx, event_rx) = unbounded::<GuiEvent>();
    let handle = spawn_backend(Arc::new(hub.clone()), credentials, action_rx, event_tx);
    Harness {
        hub,
        actions: action_tx,
        events: event_rx,
        handle,
    }
}

impl Harness {
    fn send(&self, action: BackendAction) {
        self.actions.send(action).unwrap();
    }

    fn next_event(&self) -> GuiEvent {
        self.events.recv_timeout(TIMEOUT).expect("backend event")
    }

    fn connect(&self, session: SessionId) -> String {
        self.send(BackendAction::Connect(session));
        match self.next_event() {
            GuiEvent::Connected {
                session: s,
                connection_id,
                ..
            } if s == session => connection_id,
            other => panic!("expected Connected, got {:?}", other),
        }
    }

    fn subscribe(&self, session: SessionId) {
        self.send(BackendAction::Subscribe {
            session,
            channel: "chat-demo".into(),
        });
        assert!(matches!(
            self.next_event(),
            GuiEvent::Subscribed { session: s, ref channel } if s == session && channel == "chat-demo"
        ));
    }

    fn publish(&self, session: SessionId, text: &str) {
        self.send(BackendAction::Publish {
            session,
            channel: "chat-demo".into(),
            text: text.into(),
        });
    }

    fn shutdown(self) {
        self.send(BackendAction::Shutdown);
        self.handle.join().unwrap();
    }
}

#[test]
fn test_connect_reports_identity() {
    let h = start();
    h.send(BackendAction::Connect(1));
    match h.next_event() {
        GuiEvent::Connected {
            session,
            connection_id,
            client_id,
        } => {
            assert_eq!(session, 1);
            assert!(!connection_id.is_empty());
            assert_eq!(client_id, "chat-demo-client");
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(h.hub.connection_count(), 1);
    h.shutdown();
}

#[test]
fn test_publish_is_echoed_to_publisher() {
    let h = start();
    let connection_id = h.connect(1);
    h.subscribe(1);
    h.publish(1, "hello");

    match h.next_event() {
        GuiEvent::MessageReceived { session, message } => {
            assert_eq!(session, 1);
            assert_eq!(message.data, "hello");
            assert_eq!(message.connection_id, connection_id);
        }
        other => panic!("unexpected {:?}", other),
    }
    h.shutdown();
}

#[test]
fn test_two_sessions_see_each_other() {
    let h = start();
    let first = h.connect(1);
    let second = h.connect(2);
    assert_ne!(first, second);
    h.subscribe(1);
    h.subscribe(2);

    h.publish(2, "from two");
    let mut seen = Vec::new();
    for _ in 0..2 {
        if let GuiEvent::MessageReceived { session, message } = h.next_event() {
            assert_eq!(message.connection_id, second);
            seen.push(session);
        }
    }
    seen.sort();
    assert_eq!(seen, vec![1, 2]);
    h.shutdown();
}

#[test]
fn test_unsubscribe_stops_delivery() {
    let h = start();
    h.connect(1);
    h.subscribe(1);
    h.send(BackendAction::Unsubscribe {
        session: 1,
        channel: "chat-demo".into(),
    });
    assert!(matches!(
        h.next_event(),
        GuiEvent::Unsubscribed { session: 1, ref channel } if channel == "chat-demo"
    ));
    assert_eq!(h.hub.subscriber_count("chat-demo"), 0);

    h.publish(1, "nobody listens");
    assert!(h.events.recv_timeout(Duration::from_millis(200)).is_err());
    h.shutdown();
}

#[test]
fn test_unknown_session_reports_error() {
    let h = start();
    h.publish(42, "hello");
    assert!(matches!(h.next_event(), GuiEvent::Error { session: 42, .. }));

    // The loop keeps running after a failure
    h.connect(1);
    h.shutdown();
}

#[test]
fn test_failed_credential_reports_error() {
    let credentials = CredentialSource::issuer(
        Arc::new(KeylessIssuer::new(TokenError::MissingKey("ABLY_API_KEY_ROOT".into()))),
        TokenParams::default(),
    );
    let h = start_with(LocalHub::new(), credentials);
    h.send(BackendAction::Connect(1));
    match h.next_event() {
        GuiEvent::Error { session, message } => {
            assert_eq!(session, 1);
            assert!(message.contains("ABLY_API_KEY_ROOT"));
        }
        other => panic!("unexpected {:?}", other),
    }
    h.shutdown();
}

#[test]
fn test_invalid_channel_reports_error() {
    let h = start();
    h.connect(1);
    h.send(BackendAction::Subscribe {
        session: 1,
        channel: "  ".into(),
    });
    assert!(matches!(h.next_event(), GuiEvent::Error { session: 1, .. }));
    h.shutdown();
}

#[test]
fn test_disconnect_closes_connection() {
    let h = start();
    h.connect(1);
    h.subscribe(1);
    h.send(BackendAction::Disconnect(1));
    assert!(matches!(h.next_event(), GuiEvent::Disconnected(1)));
    assert_eq!(h.hub.connection_count(), 0);
    assert_eq!(h.hub.subscriber_count("chat-demo"), 0);
    h.shutdown();
}

#[test]
fn test_dropping_sender_stops_backend() {
    let h = start();
    h.connect(1);
    let Harness {
        hub,
        actions,
        events,
        handle,
    } = h;
    drop(actions);
    handle.join().unwrap();
    assert!(matches!(events.recv_timeout(TIMEOUT), Ok(GuiEvent::Disconnected(1))));
    assert_eq!(hub.connection_count(), 0);
}
