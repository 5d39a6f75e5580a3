use eframe::egui::{Color32, Label, ProgressBar, RichText, Ui};

use super::common::{section_frame, UiColors};
use crate::control::ControlPanel;
use crate::mqtt::topics::{LevelId, LEVEL_MAX};

const LABEL_WIDTH: f32 = 80.0;

/// Readouts reported by the device.
pub fn render_data(ui: &mut Ui, panel: &ControlPanel) {
    section_frame().show(ui, |ui| {
        ui.set_width(ui.available_width());

        readout(ui, "LOADCELL:", panel.loadcell());
        ui.separator();
        readout(ui, "Param 2:", panel.value2());
        ui.separator();
        if !panel.system_state().is_empty() {
            readout(ui, "State:", panel.system_state());
            ui.separator();
        }
        level_bar(ui, "Param 3:", panel.level(LevelId::Three), UiColors::ALERT_RED);
        ui.separator();
        level_bar(ui, "Param 4:", panel.level(LevelId::Four), UiColors::SKY);
    });
}

fn readout(ui: &mut Ui, label: &str, value: &str) {
    ui.horizontal(|ui| {
        ui.add_sized([LABEL_WIDTH, 20.0], Label::new(RichText::new(label).strong()));
        ui.label(value);
    });
}

fn level_bar(ui: &mut Ui, label: &str, level: u8, fill: Color32) {
    ui.horizontal(|ui| {
        ui.add_sized([LABEL_WIDTH, 20.0], Label::new(RichText::new(label).strong()));
        let bar_width = (ui.available_width() - 48.0).max(40.0);
        ui.add(
            ProgressBar::new(f32::from(level) / f32::from(LEVEL_MAX))
                .fill(fill)
                .desired_width(bar_width)
                .desired_height(24.0),
        );
        ui.label(RichText::new(level.to_string()).strong());
    });
}
