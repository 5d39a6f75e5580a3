//! # Control Panel State
//!
//! Everything the control screen shows or edits, kept apart from rendering so
//! the behavior can be exercised without a window. The UI feeds
//! [`MqttEvent`]s in, reads the state back each frame, and turns user actions
//! into [`ControlCommand`]s through the gated methods here.
//!
//! Controls that publish are only live while a broker connection is up; while
//! disconnected the gated methods return `None` and the widgets are rendered
//! disabled.

pub mod log;

use thiserror::Error;
use tracing::debug;

use crate::mqtt::config::BrokerSettings;
use crate::mqtt::message_manager::MQTTMessage;
use crate::mqtt::mqtt_handler::{ConnectionState, MqttCommand, MqttEvent};
use crate::mqtt::topics::{ControlCommand, DeviceUpdate, LevelId, SwitchId};

use self::log::ConnectionLog;

/// Shown in the readouts until the device reports a value.
pub const PLACEHOLDER_READING: &str = "XXX 單位";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControlError {
    #[error("Broker IP is empty")]
    EmptyHost,

    #[error("Invalid WS port: {0}")]
    InvalidPort(String),
}

/// Dialogs the UI has to raise in response to an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alert {
    NotConnected,
    ConnectError(String),
}

impl Alert {
    pub fn title(&self) -> &'static str {
        match self {
            Alert::NotConnected => "Not connected",
            Alert::ConnectError(_) => "Connection error",
        }
    }

    pub fn body(&self) -> String {
        match self {
            Alert::NotConnected => "Please connect to the MQTT broker first".to_string(),
            Alert::ConnectError(e) => format!("Unable to connect to MQTT broker: {}", e),
        }
    }
}

pub struct ControlPanel {
    /// Text field contents, editable while disconnected
    pub broker_host: String,
    pub broker_port: String,
    settings: BrokerSettings,
    status: ConnectionState,
    log: ConnectionLog,
    switch1: bool,
    switch2: bool,
    loadcell: String,
    value2: String,
    system_state: String,
    level3: u8,
    level4: u8,
}

impl ControlPanel {
    pub fn new(settings: BrokerSettings, log_capacity: usize) -> Self {
        Self {
            broker_host: settings.host.clone(),
            broker_port: settings.ws_port.to_string(),
            settings,
            status: ConnectionState::Disconnected,
            log: ConnectionLog::new(log_capacity),
            switch1: false,
            switch2: false,
            loadcell: PLACEHOLDER_READING.to_string(),
            value2: PLACEHOLDER_READING.to_string(),
            system_state: String::new(),
            level3: 0,
            level4: 0,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.status.is_connected()
    }

    pub fn status(&self) -> &ConnectionState {
        &self.status
    }

    pub fn log(&self) -> &ConnectionLog {
        &self.log
    }

    pub fn switch(&self, id: SwitchId) -> bool {
        match id {
            SwitchId::One => self.switch1,
            SwitchId::Two => self.switch2,
        }
    }

    pub fn level(&self, id: LevelId) -> u8 {
        match id {
            LevelId::Three => self.level3,
            LevelId::Four => self.level4,
        }
    }

    pub fn loadcell(&self) -> &str {
        &self.loadcell
    }

    pub fn value2(&self) -> &str {
        &self.value2
    }

    pub fn system_state(&self) -> &str {
        &self.system_state
    }

    /// Broker settings for a connect request, built from the text fields.
    pub fn connect_request(&self) -> Result<BrokerSettings, ControlError> {
        let host = self.broker_host.trim();
        if host.is_empty() {
            return Err(ControlError::EmptyHost);
        }
        let port = self
            .broker_port
            .trim()
            .parse::<u16>()
            .ok()
            .filter(|p| *p != 0)
            .ok_or_else(|| ControlError::InvalidPort(self.broker_port.clone()))?;

        Ok(BrokerSettings {
            host: host.to_string(),
            ws_port: port,
            ..self.settings.clone()
        })
    }

    /// Applies an event from the MQTT task. Returns an alert if the user has
    /// to be told.
    pub fn apply_event(&mut self, event: MqttEvent) -> Option<Alert> {
        match event {
            MqttEvent::Status(state) => {
                self.status = state;
                None
            }
            MqttEvent::Log(line) => {
                self.log.push(&line);
                None
            }
            MqttEvent::Message(msg) => {
                self.apply_message(&msg);
                None
            }
            MqttEvent::NotConnected => Some(Alert::NotConnected),
            MqttEvent::ConnectFailed(e) => Some(Alert::ConnectError(e)),
        }
    }

    pub fn apply_message(&mut self, msg: &MQTTMessage) {
        self.log.push(&format!("Received: {}", msg.render()));

        let Some(update) = DeviceUpdate::parse(&msg.topic, &msg.content) else {
            debug!("No state bound to topic {}", msg.topic);
            return;
        };
        match update {
            DeviceUpdate::SystemState(text) => self.system_state = text,
            DeviceUpdate::LoadCell(text) => self.loadcell = text,
            DeviceUpdate::Value2(text) => self.value2 = text,
            DeviceUpdate::Level(LevelId::Three, value) => self.level3 = value,
            DeviceUpdate::Level(LevelId::Four, value) => self.level4 = value,
            DeviceUpdate::Switch(SwitchId::One, on) => self.switch1 = on,
            DeviceUpdate::Switch(SwitchId::Two, on) => self.switch2 = on,
        }
    }

    /// Flips a switch locally and returns the command announcing it.
    pub fn set_switch(&mut self, id: SwitchId, on: bool) -> Option<ControlCommand> {
        if !self.is_connected() {
            return None;
        }
        match id {
            SwitchId::One => self.switch1 = on,
            SwitchId::Two => self.switch2 = on,
        }
        Some(ControlCommand::Switch(id, on))
    }

    pub fn press(&self, command: ControlCommand) -> Option<ControlCommand> {
        self.is_connected().then_some(command)
    }

    /// Publish request for a command, resolved against the configured topics.
    pub fn publish(&self, command: ControlCommand) -> MqttCommand {
        let (topic, payload) = command.to_publish(&self.settings.action_topic);
        MqttCommand::Publish { topic, payload }
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
        self.log.push("Log cleared");
    }

    /// Adds a line that did not come from the MQTT task.
    pub fn note(&mut self, line: &str) {
        self.log.push(line);
    }

    /// Keeps the settings used for future connects in sync with a request.
    pub fn adopt_settings(&mut self, settings: BrokerSettings) {
        self.settings = settings;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mqtt::mqtt_handler::TransportKind;
    use crate::mqtt::topics::{Direction, Station, LOADCELL, SLIDER_VALUE1, SWITCH2};

    fn connected_panel() -> ControlPanel {
        let mut panel = ControlPanel::new(BrokerSettings::default(), 10);
        panel.apply_event(MqttEvent::Status(ConnectionState::Connected(
            TransportKind::WebSocket,
        )));
        panel
    }

    #[test]
    fn starts_with_placeholders() {
        let panel = ControlPanel::new(BrokerSettings::default(), 10);
        assert_eq!(panel.loadcell(), PLACEHOLDER_READING);
        assert_eq!(panel.value2(), PLACEHOLDER_READING);
        assert_eq!(panel.level(LevelId::Three), 0);
        assert_eq!(panel.broker_host, "192.168.0.141");
        assert_eq!(panel.broker_port, "8083");
        assert!(!panel.is_connected());
    }

    #[test]
    fn controls_are_inert_while_disconnected() {
        let mut panel = ControlPanel::new(BrokerSettings::default(), 10);
        assert_eq!(panel.set_switch(SwitchId::One, true), None);
        assert!(!panel.switch(SwitchId::One));
        assert_eq!(panel.press(ControlCommand::Move(Direction::Up)), None);
    }

    #[test]
    fn switch_change_is_optimistic_and_published() {
        let mut panel = connected_panel();
        let command = panel.set_switch(SwitchId::Two, true).unwrap();
        assert!(panel.switch(SwitchId::Two));
        assert_eq!(
            panel.publish(command),
            MqttCommand::Publish {
                topic: SWITCH2.to_string(),
                payload: "on".to_string()
            }
        );
    }

    #[test]
    fn incoming_messages_update_readouts_and_log() {
        let mut panel = connected_panel();
        panel.apply_event(MqttEvent::Message(MQTTMessage::from_topic(
            LOADCELL.to_string(),
            "3.2 kg".to_string(),
        )));
        panel.apply_event(MqttEvent::Message(MQTTMessage::from_topic(
            SLIDER_VALUE1.to_string(),
            "140".to_string(),
        )));
        panel.apply_event(MqttEvent::Message(MQTTMessage::from_topic(
            SWITCH2.to_string(),
            "true".to_string(),
        )));

        assert_eq!(panel.loadcell(), "3.2 kg");
        assert_eq!(panel.level(LevelId::Three), 100);
        assert!(panel.switch(SwitchId::Two));
        assert_eq!(panel.log().len(), 3);
        assert!(panel
            .log()
            .lines()
            .next()
            .unwrap()
            .ends_with("Received: RadioRingCon77/LOADCELL = 3.2 kg"));
    }

    #[test]
    fn unknown_topics_are_logged_only() {
        let mut panel = connected_panel();
        panel.apply_message(&MQTTMessage::from_topic(
            "RadioRingCon77/other".to_string(),
            "x".to_string(),
        ));
        assert_eq!(panel.log().len(), 1);
        assert_eq!(panel.loadcell(), PLACEHOLDER_READING);
    }

    #[test]
    fn events_raise_alerts() {
        let mut panel = ControlPanel::new(BrokerSettings::default(), 10);
        assert_eq!(
            panel.apply_event(MqttEvent::NotConnected),
            Some(Alert::NotConnected)
        );
        assert_eq!(
            panel.apply_event(MqttEvent::ConnectFailed("bad".into())),
            Some(Alert::ConnectError("bad".into()))
        );
        assert_eq!(panel.apply_event(MqttEvent::Log("x".into())), None);
    }

    #[test]
    fn connect_request_validates_fields() {
        let mut panel = ControlPanel::new(BrokerSettings::default(), 10);
        panel.broker_host = " 10.1.1.7 ".to_string();
        panel.broker_port = "9001".to_string();
        let settings = panel.connect_request().unwrap();
        assert_eq!(settings.host, "10.1.1.7");
        assert_eq!(settings.ws_port, 9001);
        assert_eq!(settings.tcp_port, 1883);

        panel.broker_port = "70000".to_string();
        assert_eq!(
            panel.connect_request(),
            Err(ControlError::InvalidPort("70000".to_string()))
        );

        panel.broker_host = String::new();
        assert_eq!(panel.connect_request(), Err(ControlError::EmptyHost));
    }

    #[test]
    fn clearing_the_log_leaves_a_marker() {
        let mut panel = connected_panel();
        panel.note("one");
        panel.note("two");
        panel.clear_log();
        assert_eq!(panel.log().len(), 1);
        assert!(panel.log().lines().next().unwrap().ends_with("Log cleared"));
    }

    #[test]
    fn station_buttons_publish_to_playmusic() {
        let panel = connected_panel();
        let command = panel.press(ControlCommand::Play(Station::Classical)).unwrap();
        assert_eq!(
            panel.publish(command),
            MqttCommand::Publish {
                topic: "RadioRingCon77/playmusic".to_string(),
                payload: "古典音樂".to_string()
            }
        );
    }
}
