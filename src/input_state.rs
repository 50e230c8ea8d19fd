//! Composer state for the chat input form.

use crate::validation;

/// Text being typed and whether the input box should grab focus.
#[derive(Default, Debug, Clone)]
pub struct InputState {
    /// Current message being composed
    pub message_input: String,

    /// Set after a send so the next frame re-focuses the text area
    pub request_focus: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whitespace-only input cannot be sent
    pub fn is_empty(&self) -> bool {
        self.message_input.trim().is_empty()
    }

    /// The text that would be sent, or why it cannot be
    pub fn validated(&self) -> Result<String, String> {
        let text = validation::sanitize_message(&self.message_input);
        validation::validate_message(&text)?;
        Ok(text)
    }

    /// Take the composed text for sending, clearing the input.
    /// On error the input is left untouched.
    pub fn take_message(&mut self) -> Result<String, String> {
        let text = self.validated()?;
        self.message_input.clear();
        self.request_focus = true;
        Ok(text)
    }

    /// Esc clears the input
    pub fn clear(&mut self) {
        self.message_input.clear();
    }
}
