//! Message list rendering.

use eframe::egui::{self, Align, Layout, RichText};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::buffer::{Author, ChatMessage};
use crate::protocol::SessionId;
use crate::ui::theme::{self, ChatTheme};
use crate::widget::{ChannelHandle, ChatWidget};

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://[^\s]+").expect("URL regex pattern is valid"));

/// Piece of message text, either plain or a link
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Segment<'a> {
    Text(&'a str),
    Link(&'a str),
}

/// Split message text around URLs so links can be rendered clickable.
pub(crate) fn split_links(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut last = 0;
    for m in URL_RE.find_iter(text) {
        if m.start() > last {
            segments.push(Segment::Text(&text[last..m.start()]));
        }
        segments.push(Segment::Link(m.as_str()));
        last = m.end();
    }
    if last < text.len() {
        segments.push(Segment::Text(&text[last..]));
    }
    segments
}

/// Scroll state is per session so side-by-side panels never share it
pub(crate) fn history_id_salt(session: SessionId) -> (&'static str, SessionId) {
    ("history", session)
}

/// Render the history of `widget`, oldest first, and scroll to the newest
/// entry when one arrived since the last frame.
pub fn render_history<C: ChannelHandle>(
    ui: &mut egui::Ui,
    session: SessionId,
    widget: &mut ChatWidget<C>,
    theme: &ChatTheme,
) {
    egui::ScrollArea::vertical()
        .id_salt(history_id_salt(session))
        .auto_shrink([false; 2])
        .stick_to_bottom(true)
        .show(ui, |ui| {
            if widget.history.is_empty() {
                ui.add_space(8.0);
                ui.vertical_centered(|ui| {
                    ui.label(RichText::new("No messages yet").color(theme.text_muted).italics());
                });
            }

            for message in widget.history.iter() {
                let author = widget.author_of(message);
                render_message(ui, message, author, theme);
            }

            // Anchor below the last message
            let (_, anchor) = ui.allocate_exact_size(egui::vec2(0.0, 0.0), egui::Sense::hover());
            if widget.scroll_to_latest {
                anchor.scroll_to_me(Some(Align::BOTTOM));
                widget.scroll_to_latest = false;
            }
        });
}

fn render_message(ui: &mut egui::Ui, message: &ChatMessage, author: Author, theme: &ChatTheme) {
    let mine = author == Author::Me;
    let layout = if mine {
        Layout::top_down(Align::Max)
    } else {
        Layout::top_down(Align::Min)
    };
    let max_width = ui.available_width() * 0.75;

    ui.with_layout(layout, |ui| {
        ui.horizontal(|ui| {
            if !mine {
                ui.label(
                    RichText::new(&message.client_id)
                        .color(theme::client_color(&message.client_id))
                        .strong()
                        .small(),
                );
            }
            ui.label(
                RichText::new(message.display_time())
                    .color(theme.text_muted)
                    .small(),
            );
        });

        let (fill, text_color) = if mine {
            (theme.bubble_mine, theme.text_on_accent)
        } else {
            (theme.surface[3], theme.text_primary)
        };

        egui::Frame::new()
            .fill(fill)
            .corner_radius(8.0)
            .inner_margin(egui::Margin::symmetric(10, 6))
            .show(ui, |ui| {
                ui.set_max_width(max_width);
                ui.horizontal_wrapped(|ui| {
                    ui.spacing_mut().item_spacing.x = 0.0;
                    for segment in split_links(&message.data) {
                        match segment {
                            Segment::Text(text) => {
                                ui.label(RichText::new(text).color(text_color));
                            }
                            Segment::Link(url) => {
                                ui.hyperlink_to(RichText::new(url).color(theme.info).underline(), url);
                            }
                        }
                    }
                });
            });
        ui.add_space(4.0);
    });
}
