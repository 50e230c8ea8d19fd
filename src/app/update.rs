//! Main update loop

use eframe::egui;
use std::time::Duration;

use super::ChatApp;
use crate::protocol::SessionId;
use crate::ui::{self, PanelAction, ToolbarAction};

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_events();

        // Ctrl+N: new client
        if ctx.input(|i| i.modifiers.ctrl && i.key_pressed(egui::Key::N)) {
            self.add_client();
        }

        // Keep polling the backend and expire error banners
        ctx.request_repaint_after(Duration::from_millis(100));

        let theme = self.theme.clone();

        let toolbar_action = egui::TopBottomPanel::top("toolbar")
            .frame(
                egui::Frame::new()
                    .fill(theme.surface[1])
                    .inner_margin(egui::Margin::symmetric(12, 8))
                    .stroke(egui::Stroke::new(1.0, theme.border_subtle)),
            )
            .show(ctx, |ui| {
                ui::render_toolbar(ui, &self.settings.channel, &self.credentials_label, &theme)
            })
            .inner;

        match toolbar_action {
            Some(ToolbarAction::NewClient) => {
                self.add_client();
            }
            Some(ToolbarAction::ToggleTheme) => {
                self.toggle_theme();
                ui::apply_app_style(ctx, &self.theme);
            }
            None => {}
        }

        let mut closed: Vec<SessionId> = Vec::new();
        let closable = self.widgets.len() > 1;
        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(theme.surface[0]))
            .show(ctx, |ui| {
                if self.widgets.is_empty() {
                    ui.centered_and_justified(|ui| {
                        ui.label("No clients. Use \"New client\" to open one.");
                    });
                    return;
                }
                let count = self.widgets.len();
                ui.columns(count, |columns| {
                    for (column, widget) in columns.iter_mut().zip(self.widgets.iter_mut()) {
                        let session = widget.channel().session;
                        if ui::render_chat_panel(column, session, widget, &theme, closable)
                            == Some(PanelAction::Close)
                        {
                            closed.push(session);
                        }
                    }
                });
            });

        for session in closed {
            self.close_client(session);
        }
    }
}
