//! Message composer at the bottom of each chat panel

use eframe::egui;

use crate::ui::theme::ChatTheme;
use crate::widget::{ChannelHandle, ChatWidget};

/// Render the composer. Enter sends, Shift+Enter inserts a newline, Esc clears.
pub fn render_composer<C: ChannelHandle>(
    ui: &mut egui::Ui,
    id_salt: impl std::hash::Hash,
    widget: &mut ChatWidget<C>,
    theme: &ChatTheme,
) {
    let id = ui.make_persistent_id(id_salt);
    let has_focus = ui.memory(|m| m.has_focus(id));

    // Consume a plain Enter before the text edit sees it, otherwise it becomes a newline
    let enter_pressed = has_focus
        && ui.input_mut(|i| {
            !i.modifiers.shift && i.consume_key(egui::Modifiers::NONE, egui::Key::Enter)
        });
    if has_focus && ui.input(|i| i.key_pressed(egui::Key::Escape)) {
        widget.input.clear();
    }

    let mut send_clicked = false;
    ui.horizontal(|ui| {
        let button_width = 64.0;
        egui::Frame::new()
            .fill(theme.surface[2])
            .corner_radius(6.0)
            .stroke(egui::Stroke::new(
                1.0,
                if has_focus { theme.accent } else { theme.border_medium },
            ))
            .inner_margin(egui::Margin::symmetric(10, 8))
            .show(ui, |ui| {
                let response = ui.add(
                    egui::TextEdit::multiline(&mut widget.input.message_input)
                        .id(id)
                        .desired_rows(1)
                        .desired_width(ui.available_width() - button_width - 16.0)
                        .frame(false)
                        .hint_text("Type a message... (Enter to send)"),
                );
                if widget.input.request_focus {
                    response.request_focus();
                    widget.input.request_focus = false;
                }
            });

        send_clicked = ui
            .add_enabled(
                widget.can_send(),
                egui::Button::new("Send").min_size(egui::vec2(button_width, 0.0)),
            )
            .clicked();
    });

    if enter_pressed || send_clicked {
        widget.submit();
    }
}
