//! Topic table of the RadioRingCon77 device and the mapping between topics,
//! payloads and typed control-panel values.

use std::fmt;

pub const TOPIC_PREFIX: &str = "RadioRingCon77";

pub const SYSTEM_STATE: &str = "RadioRingCon77/system_state";
pub const LOADCELL: &str = "RadioRingCon77/LOADCELL";
pub const VALUE2: &str = "RadioRingCon77/value2";
pub const SLIDER_VALUE1: &str = "RadioRingCon77/slider_value1";
pub const SLIDER_VALUE2: &str = "RadioRingCon77/slider_value2";
pub const SWITCH1: &str = "RadioRingCon77/switch1";
pub const SWITCH2: &str = "RadioRingCon77/switch2";
pub const PLAY_MUSIC: &str = "RadioRingCon77/playmusic";
pub const MOTION: &str = "RadioRingCon77/mpu6050/angleXYZ";

/// State topics subscribed right after every successful connect, in order.
pub const STATE_TOPICS: [&str; 7] = [
    SYSTEM_STATE,
    LOADCELL,
    VALUE2,
    SLIDER_VALUE1,
    SLIDER_VALUE2,
    SWITCH1,
    SWITCH2,
];

/// Upper bound of the level bars fed by `slider_value1` / `slider_value2`.
pub const LEVEL_MAX: u8 = 100;

/// Which of the two device switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwitchId {
    One,
    Two,
}

impl SwitchId {
    pub fn topic(self) -> &'static str {
        match self {
            SwitchId::One => SWITCH1,
            SwitchId::Two => SWITCH2,
        }
    }
}

/// Which of the two level bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LevelId {
    Three,
    Four,
}

/// Audio sources selectable on the device. Payloads are what the firmware
/// matches on and must not be translated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Station {
    Classical,
    Taichung,
    City,
    Food,
    NewHakka,
    Stop,
}

impl Station {
    pub const ALL: [Station; 6] = [
        Station::Classical,
        Station::Taichung,
        Station::City,
        Station::Food,
        Station::NewHakka,
        Station::Stop,
    ];

    pub fn payload(self) -> &'static str {
        match self {
            Station::Classical => "古典音樂",
            Station::Taichung => "台中廣播",
            Station::City => "城市廣播",
            Station::Food => "美食廣播",
            Station::NewHakka => "新客家廣播",
            Station::Stop => "stop",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Station::Stop => "停止",
            other => other.payload(),
        }
    }
}

/// Direction pad commands sent to the motion topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    Stop,
}

impl Direction {
    pub fn payload(self) -> &'static str {
        match self {
            Direction::Up => "Up",
            Direction::Down => "Down",
            Direction::Left => "Left",
            Direction::Right => "Right",
            Direction::Stop => "stop",
        }
    }
}

/// Auxiliary buttons sharing the configurable action topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionButton {
    A,
    B,
    C,
    Intercom,
}

impl ActionButton {
    pub fn payload(self) -> &'static str {
        match self {
            ActionButton::A => "A",
            ActionButton::B => "B",
            ActionButton::C => "C",
            ActionButton::Intercom => "對講機",
        }
    }
}

/// A user action that results in exactly one QoS 0 publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Switch(SwitchId, bool),
    Play(Station),
    Move(Direction),
    Action(ActionButton),
}

impl ControlCommand {
    /// Resolves the command to `(topic, payload)`.
    pub fn to_publish(self, action_topic: &str) -> (String, String) {
        let (topic, payload) = match self {
            ControlCommand::Switch(id, on) => (id.topic(), if on { "on" } else { "off" }),
            ControlCommand::Play(station) => (PLAY_MUSIC, station.payload()),
            ControlCommand::Move(direction) => (MOTION, direction.payload()),
            ControlCommand::Action(button) => (action_topic, button.payload()),
        };
        (topic.to_string(), payload.to_string())
    }
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ControlCommand::Switch(id, on) => write!(f, "switch {:?} {}", id, on),
            ControlCommand::Play(station) => write!(f, "play {}", station.payload()),
            ControlCommand::Move(direction) => write!(f, "move {}", direction.payload()),
            ControlCommand::Action(button) => write!(f, "action {}", button.payload()),
        }
    }
}

/// State change carried by an incoming message on a subscribed topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceUpdate {
    SystemState(String),
    LoadCell(String),
    Value2(String),
    Level(LevelId, u8),
    Switch(SwitchId, bool),
}

impl DeviceUpdate {
    /// Maps an incoming message to a state change. Unknown topics yield `None`.
    pub fn parse(topic: &str, payload: &str) -> Option<Self> {
        let update = match topic {
            SYSTEM_STATE => DeviceUpdate::SystemState(payload.to_string()),
            LOADCELL => DeviceUpdate::LoadCell(payload.to_string()),
            VALUE2 => DeviceUpdate::Value2(payload.to_string()),
            SLIDER_VALUE1 => DeviceUpdate::Level(LevelId::Three, parse_level(payload)),
            SLIDER_VALUE2 => DeviceUpdate::Level(LevelId::Four, parse_level(payload)),
            SWITCH1 => DeviceUpdate::Switch(SwitchId::One, parse_switch(payload)),
            SWITCH2 => DeviceUpdate::Switch(SwitchId::Two, parse_switch(payload)),
            _ => return None,
        };
        Some(update)
    }
}

/// Only the exact strings `on`, `1` and `true` switch on.
pub fn parse_switch(payload: &str) -> bool {
    matches!(payload, "on" | "1" | "true")
}

/// Lenient integer parse clamped to `0..=LEVEL_MAX`.
///
/// Leading whitespace and an optional sign are accepted, then as many digits
/// as follow; trailing garbage is ignored (`"42%"` is 42, `"12.9"` is 12).
/// A payload without leading digits reads as 0.
pub fn parse_level(payload: &str) -> u8 {
    let trimmed = payload.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let mut value: i64 = 0;
    for b in digits.bytes().take_while(u8::is_ascii_digit) {
        value = value.saturating_mul(10).saturating_add(i64::from(b - b'0'));
    }
    if negative {
        value = -value;
    }

    value.clamp(0, i64::from(LEVEL_MAX)) as u8
}

/// MQTT forbids wildcards in publish topics.
pub fn is_publishable(topic: &str) -> bool {
    !topic.is_empty() && !topic.contains(|c: char| c == '#' || c == '+')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_parsing_is_lenient_and_clamped() {
        assert_eq!(parse_level("42"), 42);
        assert_eq!(parse_level("  7"), 7);
        assert_eq!(parse_level("+15"), 15);
        assert_eq!(parse_level("12.9"), 12);
        assert_eq!(parse_level("42%"), 42);
        assert_eq!(parse_level("250"), 100);
        assert_eq!(parse_level("-5"), 0);
        assert_eq!(parse_level("abc"), 0);
        assert_eq!(parse_level(""), 0);
        assert_eq!(parse_level("99999999999999999999999"), 100);
    }

    #[test]
    fn switch_accepts_only_exact_truthy_strings() {
        for on in ["on", "1", "true"] {
            assert!(parse_switch(on), "{on} should switch on");
        }
        for off in ["off", "0", "false", "ON", "True", " on", ""] {
            assert!(!parse_switch(off), "{off} should switch off");
        }
    }

    #[test]
    fn incoming_messages_map_to_updates() {
        assert_eq!(
            DeviceUpdate::parse(LOADCELL, "12.5 kg"),
            Some(DeviceUpdate::LoadCell("12.5 kg".into()))
        );
        assert_eq!(
            DeviceUpdate::parse(SLIDER_VALUE2, "130"),
            Some(DeviceUpdate::Level(LevelId::Four, 100))
        );
        assert_eq!(
            DeviceUpdate::parse(SWITCH1, "1"),
            Some(DeviceUpdate::Switch(SwitchId::One, true))
        );
        assert_eq!(
            DeviceUpdate::parse(SYSTEM_STATE, "idle"),
            Some(DeviceUpdate::SystemState("idle".into()))
        );
        assert_eq!(DeviceUpdate::parse(PLAY_MUSIC, "stop"), None);
    }

    #[test]
    fn commands_resolve_to_device_topics() {
        let action_topic = "RadioRingCon77/action";
        assert_eq!(
            ControlCommand::Switch(SwitchId::Two, false).to_publish(action_topic),
            (SWITCH2.to_string(), "off".to_string())
        );
        assert_eq!(
            ControlCommand::Play(Station::NewHakka).to_publish(action_topic),
            (PLAY_MUSIC.to_string(), "新客家廣播".to_string())
        );
        assert_eq!(
            ControlCommand::Move(Direction::Stop).to_publish(action_topic),
            (MOTION.to_string(), "stop".to_string())
        );
        assert_eq!(
            ControlCommand::Action(ActionButton::Intercom).to_publish(action_topic),
            (action_topic.to_string(), "對講機".to_string())
        );
    }

    #[test]
    fn wildcard_topics_are_not_publishable() {
        assert!(is_publishable(MOTION));
        assert!(!is_publishable("RadioRingCon77/#"));
        assert!(!is_publishable("RadioRingCon77/+/x"));
        assert!(!is_publishable(""));
    }
}
