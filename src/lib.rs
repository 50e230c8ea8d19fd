//! Pubsub Chat library.
//!
//! A token issuer endpoint plus a chat widget for a hosted publish/subscribe
//! messaging service. This module re-exports the core components for the two
//! binaries and for testing.

pub mod app;
pub mod backend;
pub mod buffer;
pub mod config;
pub mod error;
pub mod input_state;
pub mod logging;
pub mod protocol;
pub mod server;
pub mod service;
pub mod token;
pub mod ui;
pub mod validation;
pub mod widget;

#[cfg(test)]
mod backend_tests;
