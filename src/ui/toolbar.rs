//! Top toolbar and the connection status indicator.

use eframe::egui::{self, Color32, RichText, Stroke};

use crate::ui::theme::ChatTheme;

/// Actions that the toolbar can request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarAction {
    /// Open another client connection with its own chat panel
    NewClient,
    ToggleTheme,
}

/// Render the top toolbar.
/// Returns Some(ToolbarAction) if an action was requested.
pub fn render_toolbar(
    ui: &mut egui::Ui,
    channel: &str,
    credentials: &str,
    theme: &ChatTheme,
) -> Option<ToolbarAction> {
    let mut action = None;

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;
        ui.spacing_mut().button_padding = egui::vec2(8.0, 4.0);

        ui.label(RichText::new(format!("# {}", channel)).strong().color(theme.text_primary));
        ui.separator();

        if ui.button("➕ New client").clicked() {
            action = Some(ToolbarAction::NewClient);
        }

        let theme_label = if theme.dark_mode { "☀ Light" } else { "🌙 Dark" };
        if ui.button(theme_label).clicked() {
            action = Some(ToolbarAction::ToggleTheme);
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.label(
                RichText::new(format!("auth: {}", credentials))
                    .color(theme.text_secondary)
                    .small(),
            );
        });
    });

    action
}

/// Green glowing dot when connected, gray ring otherwise
pub fn status_dot(ui: &mut egui::Ui, connected: bool, theme: &ChatTheme) {
    let (rect, _) = ui.allocate_exact_size(egui::vec2(10.0, 10.0), egui::Sense::hover());
    let center = rect.center();
    if connected {
        ui.painter().circle_filled(center, 6.0, theme.success.linear_multiply(0.2));
        ui.painter().circle_filled(center, 4.0, theme.success);
    } else {
        ui.painter()
            .circle_stroke(center, 4.0, Stroke::new(1.5, Color32::from_rgb(100, 100, 100)));
    }
}
