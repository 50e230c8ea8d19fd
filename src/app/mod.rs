//! Desktop application built around `ChatWidget`
//!
//! - `core`: ChatApp struct, client lifecycle and settings persistence
//! - `events`: routing backend events to the widget that owns the session
//! - `update`: eframe update loop

pub mod core;
pub mod events;
pub mod update;

pub use core::ChatApp;
