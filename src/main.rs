//! Pubsub Chat - desktop demo of the chat widget
//!
//! Architecture:
//! - Main thread: runs the egui UI
//! - Backend thread: runs a Tokio runtime that talks to the messaging service
//! - Communication via crossbeam channels (lock-free, sync-safe)

use eframe::egui;
use std::sync::Arc;

use pubsub_chat::app::ChatApp;
use pubsub_chat::config::{load_api_key, load_settings};
use pubsub_chat::logging::init_tracing;
use pubsub_chat::service::{CredentialSource, LocalHub, Realtime};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing("pubsub_chat=info");

    let settings = load_settings().unwrap_or_default();

    let api_key = match load_api_key() {
        Ok(key) => Some(key),
        Err(e) => {
            tracing::info!("{}; using token issuer URL", e);
            None
        }
    };
    let credentials = CredentialSource::resolve(settings.auth_url.as_deref(), api_key.clone())?;
    let service: Arc<dyn Realtime> = Arc::new(LocalHub::for_source(&credentials, api_key));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 600.0])
            .with_min_inner_size([400.0, 300.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Pubsub Chat",
        options,
        Box::new(move |cc| Ok(Box::new(ChatApp::new(cc, settings, service, credentials)))),
    )?;
    Ok(())
}
