//! egui rendering for the chat window.
//!
//! - `toolbar`: channel name, new-client button, theme toggle
//! - `panel`: one chat panel per client connection
//! - `messages`: history list with mine/other bubbles
//! - `composer`: message input and Send button
//! - `theme`: colors and global style

pub mod composer;
pub mod messages;
pub mod panel;
pub mod theme;
pub mod toolbar;

pub use panel::{render_chat_panel, PanelAction};
pub use theme::{apply_app_style, ChatTheme};
pub use toolbar::{render_toolbar, ToolbarAction};
