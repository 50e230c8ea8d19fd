//! One chat panel: header, error banner, history and composer.

use eframe::egui::{self, RichText};

use crate::protocol::SessionId;
use crate::ui::composer::render_composer;
use crate::ui::messages::render_history;
use crate::ui::theme::ChatTheme;
use crate::ui::toolbar::status_dot;
use crate::widget::{ChannelHandle, ChatWidget};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    /// Close this client and drop its connection
    Close,
}

pub fn render_chat_panel<C: ChannelHandle>(
    ui: &mut egui::Ui,
    session: SessionId,
    widget: &mut ChatWidget<C>,
    theme: &ChatTheme,
    closable: bool,
) -> Option<PanelAction> {
    let mut action = None;

    egui::TopBottomPanel::top(egui::Id::new(("chat_header", session)))
        .frame(
            egui::Frame::new()
                .fill(theme.surface[1])
                .inner_margin(egui::Margin::symmetric(10, 6)),
        )
        .show_inside(ui, |ui| {
            ui.horizontal(|ui| {
                status_dot(ui, widget.is_connected(), theme);
                match widget.client_id() {
                    Some(client_id) => {
                        ui.label(RichText::new(client_id).strong().color(theme.text_primary));
                    }
                    None => {
                        ui.label(RichText::new("Connecting...").italics().color(theme.text_muted));
                    }
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if closable && ui.small_button("✖").on_hover_text("Close client").clicked() {
                        action = Some(PanelAction::Close);
                    }
                    if let Some(connection_id) = widget.connection_id() {
                        ui.label(RichText::new(connection_id).small().color(theme.text_muted));
                    }
                });
            });

            let mut dismissed = false;
            if let Some(error) = widget.error() {
                egui::Frame::new()
                    .fill(theme.error.linear_multiply(0.2))
                    .corner_radius(4.0)
                    .inner_margin(egui::Margin::symmetric(8, 4))
                    .show(ui, |ui| {
                        ui.horizontal(|ui| {
                            ui.colored_label(theme.error, error);
                            if ui.small_button("Dismiss").clicked() {
                                dismissed = true;
                            }
                        });
                    });
            }
            if dismissed {
                widget.dismiss_error();
            }
        });

    egui::TopBottomPanel::bottom(egui::Id::new(("chat_composer", session)))
        .frame(
            egui::Frame::new()
                .fill(theme.surface[1])
                .inner_margin(egui::Margin::symmetric(12, 10))
                .stroke(egui::Stroke::new(1.0, theme.border_medium)),
        )
        .show_inside(ui, |ui| {
            render_composer(ui, ("composer", session), widget, theme);
        });

    egui::CentralPanel::default()
        .frame(
            egui::Frame::new()
                .fill(theme.surface[2])
                .inner_margin(egui::Margin::symmetric(10, 8)),
        )
        .show_inside(ui, |ui| {
            render_history(ui, session, widget, theme);
        });

    action
}
