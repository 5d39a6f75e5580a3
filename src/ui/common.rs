//! # UI Common Components and Utilities
//!
//! Shared palette, frame helpers, the font setup and the [`UiAction`] type the
//! sections use to report what the user did.
//!
//! Sections never talk to the MQTT task themselves. They render from the
//! [`ControlPanel`](crate::control::ControlPanel) and push [`UiAction`]s; the
//! top-level UI turns those into commands once per frame.

use eframe::egui::{
    self, Button, Color32, FontData, FontDefinitions, FontFamily, Frame, Response, RichText,
    Stroke, Ui, Vec2,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::mqtt::topics::ControlCommand;

/// Something the user asked for during this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    Connect,
    Disconnect,
    ClearLog,
    Send(ControlCommand),
}

/// Dark palette of the control screen.
///
/// ## Color Hierarchy
/// - **Background Colors**: EXTREME_BG → INNER_BG → MAIN_BG (darkest to lightest)
/// - **Status Colors**: ACTIVE for connected, ALERT_RED for disconnect
/// - **Button Colors**: ACCENT for stations, SKY for the direction pad,
///   HIGHLIGHT for auxiliary buttons, STOP for anything that stops the device
pub struct UiColors;

impl UiColors {
    pub const MAIN_BG: Color32 = Color32::from_rgb(30, 30, 30);
    pub const INNER_BG: Color32 = Color32::from_rgb(25, 25, 25);
    pub const EXTREME_BG: Color32 = Color32::from_rgb(20, 20, 20);
    pub const BORDER: Color32 = Color32::from_rgb(60, 60, 60);
    pub const TEXT: Color32 = Color32::from_rgb(225, 225, 225);
    pub const DARK_TEXT: Color32 = Color32::from_rgb(20, 20, 20);
    pub const MUTED_TEXT: Color32 = Color32::from_rgb(130, 130, 130);

    pub const ACTIVE: Color32 = Color32::from_rgb(50, 200, 20);

    pub const ACCENT: Color32 = Color32::from_rgb(244, 208, 111);
    pub const HIGHLIGHT: Color32 = Color32::from_rgb(170, 170, 190);
    pub const SKY: Color32 = Color32::from_rgb(135, 206, 235);
    pub const STOP: Color32 = Color32::from_rgb(255, 182, 193);
    pub const ALERT_RED: Color32 = Color32::from_rgb(255, 107, 107);
}

/// Bordered card used for every section.
pub fn section_frame() -> Frame {
    Frame::new()
        .stroke(Stroke::new(2.0, UiColors::BORDER))
        .fill(UiColors::INNER_BG)
        .inner_margin(12)
        .outer_margin(4)
}

/// Filled button with bold text, sized to the given cell.
pub fn control_button(
    ui: &mut Ui,
    label: &str,
    fill: Color32,
    text_color: Color32,
    size: Vec2,
    enabled: bool,
) -> Response {
    let fill = if enabled { fill } else { fill.gamma_multiply(0.5) };
    let button = Button::new(RichText::new(label).strong().color(text_color))
        .fill(fill)
        .stroke(Stroke::new(2.0, UiColors::BORDER));
    ui.add_enabled_ui(enabled, |ui| ui.add_sized(size, button))
        .inner
}

/// Row of equally wide buttons. Returns the index of the clicked one.
pub fn button_row(
    ui: &mut Ui,
    buttons: &[(&str, Color32)],
    height: f32,
    enabled: bool,
) -> Option<usize> {
    let mut clicked = None;
    ui.columns(buttons.len(), |cols| {
        for (idx, (col, (label, fill))) in cols.iter_mut().zip(buttons).enumerate() {
            let size = Vec2::new(col.available_width(), height);
            if control_button(col, label, *fill, UiColors::DARK_TEXT, size, enabled).clicked() {
                clicked = Some(idx);
            }
        }
    });
    clicked
}

/// Registers the first readable font from `paths` as fallback for both font
/// families so that CJK labels and payloads render.
pub fn install_fallback_font(ctx: &egui::Context, paths: &[PathBuf]) -> bool {
    for path in paths {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!("Font {} not usable: {}", path.display(), e);
                continue;
            }
        };

        let mut fonts = FontDefinitions::default();
        fonts
            .font_data
            .insert("cjk_fallback".to_owned(), Arc::new(FontData::from_owned(bytes)));
        for family in [FontFamily::Proportional, FontFamily::Monospace] {
            fonts
                .families
                .entry(family)
                .or_default()
                .push("cjk_fallback".to_owned());
        }
        ctx.set_fonts(fonts);
        info!("Using {} as fallback font", path.display());
        return true;
    }

    warn!("No CJK font found, Chinese labels may not render");
    false
}
