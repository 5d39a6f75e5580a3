use eframe::egui::{Checkbox, Color32, Ui, Vec2};

use super::common::{button_row, control_button, section_frame, UiAction, UiColors};
use crate::control::ControlPanel;
use crate::mqtt::topics::{ActionButton, ControlCommand, Direction, Station, SwitchId};

const BUTTON_HEIGHT: f32 = 48.0;

/// Numbered buttons and the two device switches.
pub fn render_switches(ui: &mut Ui, panel: &mut ControlPanel, actions: &mut Vec<UiAction>) {
    let connected = panel.is_connected();

    section_frame().show(ui, |ui| {
        ui.set_width(ui.available_width());
        ui.columns(4, |cols| {
            // The numbered buttons have no command bound on the device yet.
            for (col, label) in cols.iter_mut().zip(["1", "2"]) {
                col.vertical_centered(|ui| {
                    control_button(
                        ui,
                        label,
                        UiColors::HIGHLIGHT,
                        UiColors::DARK_TEXT,
                        Vec2::splat(56.0),
                        true,
                    );
                });
            }

            for (col, (id, label)) in cols[2..]
                .iter_mut()
                .zip([(SwitchId::One, "Switch 1"), (SwitchId::Two, "Switch 2")])
            {
                col.vertical_centered(|ui| {
                    ui.label(label);
                    let mut on = panel.switch(id);
                    let response = ui.add_enabled(connected, Checkbox::without_text(&mut on));
                    if response.changed() {
                        if let Some(command) = panel.set_switch(id, on) {
                            actions.push(UiAction::Send(command));
                        }
                    }
                });
            }
        });
    });
}

/// Two rows of station buttons; the last one stops playback.
pub fn render_stations(ui: &mut Ui, panel: &ControlPanel, actions: &mut Vec<UiAction>) {
    let connected = panel.is_connected();

    for row in Station::ALL.chunks(3) {
        let buttons: Vec<(&str, _)> = row
            .iter()
            .map(|station| {
                let fill = if *station == Station::Stop {
                    UiColors::STOP
                } else {
                    UiColors::ACCENT
                };
                (station.label(), fill)
            })
            .collect();

        if let Some(idx) = button_row(ui, &buttons, BUTTON_HEIGHT, connected) {
            if let Some(command) = panel.press(ControlCommand::Play(row[idx])) {
                actions.push(UiAction::Send(command));
            }
        }
        ui.add_space(8.0);
    }
}

/// 3x3 pad: motion in the cross, auxiliary buttons in the corners.
pub fn render_direction_pad(ui: &mut Ui, panel: &ControlPanel, actions: &mut Vec<UiAction>) {
    let connected = panel.is_connected();

    let pad = [
        [
            ControlCommand::Action(ActionButton::A),
            ControlCommand::Move(Direction::Up),
            ControlCommand::Action(ActionButton::B),
        ],
        [
            ControlCommand::Move(Direction::Left),
            ControlCommand::Move(Direction::Stop),
            ControlCommand::Move(Direction::Right),
        ],
        [
            ControlCommand::Action(ActionButton::C),
            ControlCommand::Move(Direction::Down),
            ControlCommand::Action(ActionButton::Intercom),
        ],
    ];

    for row in pad {
        let buttons: Vec<(&str, _)> = row.iter().map(|command| pad_button(*command)).collect();
        if let Some(idx) = button_row(ui, &buttons, BUTTON_HEIGHT, connected) {
            if let Some(command) = panel.press(row[idx]) {
                actions.push(UiAction::Send(command));
            }
        }
        ui.add_space(8.0);
    }
}

fn pad_button(command: ControlCommand) -> (&'static str, Color32) {
    match command {
        ControlCommand::Move(Direction::Stop) => (Direction::Stop.payload(), UiColors::STOP),
        ControlCommand::Move(direction) => (direction.payload(), UiColors::SKY),
        ControlCommand::Action(ActionButton::Intercom) => {
            (ActionButton::Intercom.payload(), UiColors::ACTIVE)
        }
        ControlCommand::Action(button) => (button.payload(), UiColors::HIGHLIGHT),
        ControlCommand::Play(station) => (station.label(), UiColors::ACCENT),
        ControlCommand::Switch(..) => ("", UiColors::HIGHLIGHT),
    }
}
