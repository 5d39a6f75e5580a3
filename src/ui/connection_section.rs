use eframe::egui::{self, Label, RichText, ScrollArea, TextEdit, Ui, Vec2};

use super::common::{control_button, section_frame, UiAction, UiColors};
use crate::control::ControlPanel;

const LABEL_WIDTH: f32 = 80.0;
const LOG_HEIGHT: f32 = 150.0;

/// Broker fields, connect / disconnect buttons and the status line.
pub fn render_connection(ui: &mut Ui, panel: &mut ControlPanel, actions: &mut Vec<UiAction>) {
    let connected = panel.is_connected();

    section_frame().show(ui, |ui| {
        ui.set_width(ui.available_width());

        broker_field(ui, "Broker IP:", &mut panel.broker_host, "192.168.0.141", connected);
        broker_field(ui, "WS Port:", &mut panel.broker_port, "8083", connected);
        ui.add_space(8.0);

        ui.columns(2, |cols| {
            let size = Vec2::new(cols[0].available_width(), 40.0);
            if control_button(
                &mut cols[0],
                "Connect",
                UiColors::ACTIVE,
                UiColors::DARK_TEXT,
                size,
                !connected,
            )
            .clicked()
            {
                actions.push(UiAction::Connect);
            }
            if control_button(
                &mut cols[1],
                "Disconnect",
                UiColors::ALERT_RED,
                UiColors::DARK_TEXT,
                size,
                connected,
            )
            .clicked()
            {
                actions.push(UiAction::Disconnect);
            }
        });
        ui.add_space(8.0);

        ui.horizontal(|ui| {
            ui.label(RichText::new("Status:").strong());
            let status = RichText::new(panel.status().to_string());
            if connected {
                ui.label(status.strong().color(UiColors::ACTIVE));
            } else {
                ui.label(status);
            }
        });
    });
}

fn broker_field(ui: &mut Ui, label: &str, value: &mut String, hint: &str, locked: bool) {
    ui.horizontal(|ui| {
        ui.add_sized(
            [LABEL_WIDTH, 20.0],
            Label::new(RichText::new(label).strong()),
        );
        ui.add_enabled(
            !locked,
            TextEdit::singleline(value)
                .hint_text(hint)
                .desired_width(f32::INFINITY),
        );
    });
}

/// Connection log with the clear button.
pub fn render_log(ui: &mut Ui, panel: &ControlPanel, actions: &mut Vec<UiAction>) {
    section_frame().show(ui, |ui| {
        ui.set_width(ui.available_width());

        ui.horizontal(|ui| {
            ui.label(RichText::new("Connection Log").strong());
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.small_button("Clear").clicked() {
                    actions.push(UiAction::ClearLog);
                }
            });
        });
        ui.add_space(4.0);

        egui::Frame::new()
            .fill(UiColors::EXTREME_BG)
            .inner_margin(4)
            .show(ui, |ui| {
                ScrollArea::vertical()
                    .id_salt("connection_log")
                    .max_height(LOG_HEIGHT)
                    .stick_to_bottom(true)
                    .auto_shrink([false, true])
                    .show(ui, |ui| {
                        if panel.log().is_empty() {
                            ui.label(
                                RichText::new("Press Connect to start...")
                                    .italics()
                                    .color(UiColors::MUTED_TEXT),
                            );
                        }
                        for line in panel.log().lines() {
                            ui.label(RichText::new(line).monospace());
                        }
                    });
            });
    });
}
