//! Color themes and global styling for the chat window.
//!
//! # Surfaces
//!
//! - `surface[0]`: window background
//! - `surface[1]`: toolbar and composer panels
//! - `surface[2]`: message list background
//! - `surface[3]`: bubbles for messages from other connections
//!
//! Messages sent by this connection use `bubble_mine`, everything else uses
//! `surface[3]`. Client ids are colored with [`client_color`].

use eframe::egui::{self, Color32, FontFamily, FontId, TextStyle};
use std::collections::BTreeMap;

/// Name stored in settings for the dark theme
pub const THEME_DARK: &str = "dark";
/// Name stored in settings for the light theme
pub const THEME_LIGHT: &str = "light";

#[derive(Clone, Debug)]
pub struct ChatTheme {
    pub name: &'static str,
    pub dark_mode: bool,
    pub surface: [Color32; 4],
    pub accent: Color32,
    pub bubble_mine: Color32,
    pub text_on_accent: Color32,
    pub success: Color32,
    pub error: Color32,
    pub info: Color32,
    pub text_primary: Color32,
    pub text_secondary: Color32,
    pub text_muted: Color32,
    pub border_subtle: Color32,
    pub border_medium: Color32,
}

impl ChatTheme {
    pub fn dark() -> Self {
        Self {
            name: THEME_DARK,
            dark_mode: true,
            surface: [
                Color32::from_rgb(10, 10, 15),
                Color32::from_rgb(19, 19, 26),
                Color32::from_rgb(28, 28, 38),
                Color32::from_rgb(46, 46, 62),
            ],
            accent: Color32::from_rgb(88, 101, 242),
            bubble_mine: Color32::from_rgb(71, 82, 196),
            text_on_accent: Color32::WHITE,
            success: Color32::from_rgb(67, 181, 129),
            error: Color32::from_rgb(240, 71, 71),
            info: Color32::from_rgb(0, 175, 244),
            text_primary: Color32::WHITE,
            text_secondary: Color32::from_rgb(185, 187, 190),
            text_muted: Color32::from_rgb(114, 118, 125),
            border_subtle: Color32::from_rgb(32, 34, 37),
            border_medium: Color32::from_rgb(47, 49, 54),
        }
    }

    pub fn light() -> Self {
        Self {
            name: THEME_LIGHT,
            dark_mode: false,
            surface: [
                Color32::from_rgb(255, 255, 255),
                Color32::from_rgb(246, 246, 247),
                Color32::from_rgb(242, 243, 245),
                Color32::from_rgb(227, 229, 232),
            ],
            accent: Color32::from_rgb(88, 101, 242),
            bubble_mine: Color32::from_rgb(88, 101, 242),
            text_on_accent: Color32::WHITE,
            success: Color32::from_rgb(59, 165, 93),
            error: Color32::from_rgb(237, 66, 69),
            info: Color32::from_rgb(0, 120, 212),
            text_primary: Color32::from_rgb(6, 6, 7),
            text_secondary: Color32::from_rgb(79, 86, 96),
            text_muted: Color32::from_rgb(116, 127, 141),
            border_subtle: Color32::from_rgb(235, 237, 239),
            border_medium: Color32::from_rgb(220, 221, 222),
        }
    }

    /// Look up a theme by its settings name. Unknown names fall back to dark.
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case(THEME_LIGHT) {
            Self::light()
        } else {
            Self::dark()
        }
    }

    pub fn toggled(&self) -> Self {
        if self.dark_mode {
            Self::light()
        } else {
            Self::dark()
        }
    }
}

pub fn configure_text_styles() -> BTreeMap<TextStyle, FontId> {
    use FontFamily::{Monospace, Proportional};

    [
        (TextStyle::Small, FontId::new(10.0, Proportional)),
        (TextStyle::Body, FontId::new(14.0, Proportional)),
        (TextStyle::Button, FontId::new(13.0, Proportional)),
        (TextStyle::Heading, FontId::new(16.0, Proportional)),
        (TextStyle::Monospace, FontId::new(13.0, Monospace)),
    ]
    .into()
}

/// Apply visuals, spacing and text styles for `theme` to the whole context.
pub fn apply_app_style(ctx: &egui::Context, theme: &ChatTheme) {
    let mut style = (*ctx.style()).clone();
    style.visuals = if theme.dark_mode {
        egui::Visuals::dark()
    } else {
        egui::Visuals::light()
    };
    style.text_styles = configure_text_styles();

    style.spacing.item_spacing = egui::vec2(8.0, 6.0);
    style.spacing.window_margin = egui::Margin::same(12);
    style.spacing.button_padding = egui::vec2(10.0, 5.0);

    let widgets = &mut style.visuals.widgets;
    widgets.inactive.corner_radius = egui::CornerRadius::same(6);
    widgets.inactive.bg_stroke = egui::Stroke::NONE;
    widgets.hovered.corner_radius = egui::CornerRadius::same(6);
    widgets.hovered.bg_stroke = egui::Stroke::NONE;
    widgets.active.bg_fill = theme.accent;
    widgets.active.weak_bg_fill = theme.accent;
    widgets.active.corner_radius = egui::CornerRadius::same(6);

    style.visuals.panel_fill = theme.surface[0];
    style.visuals.extreme_bg_color = theme.surface[2];
    style.visuals.hyperlink_color = theme.info;
    style.visuals.selection.bg_fill = theme.accent.linear_multiply(0.4);

    ctx.set_style(style);
}

const CLIENT_COLORS: [Color32; 12] = [
    Color32::from_rgb(231, 76, 60),
    Color32::from_rgb(46, 204, 113),
    Color32::from_rgb(52, 152, 219),
    Color32::from_rgb(155, 89, 182),
    Color32::from_rgb(241, 196, 15),
    Color32::from_rgb(230, 126, 34),
    Color32::from_rgb(26, 188, 156),
    Color32::from_rgb(236, 100, 166),
    Color32::from_rgb(41, 128, 185),
    Color32::from_rgb(39, 174, 96),
    Color32::from_rgb(243, 156, 18),
    Color32::from_rgb(192, 57, 43),
];

/// Stable color for a client id (FNV-1a over the bytes)
pub fn client_color(client_id: &str) -> Color32 {
    let mut hash: u64 = 1469598103934665603u64;
    for b in client_id.as_bytes() {
        hash ^= *b as u64;
        hash = hash.wrapping_mul(1099511628211u64);
    }
    CLIENT_COLORS[(hash as usize) % CLIENT_COLORS.len()]
}
