//! # MQTT Integration Module
//!
//! Connects the control panel to the RadioRingCon77 device through an MQTT
//! broker. The protocol itself is handled by `rumqttc`; this module decides
//! where to connect, what to subscribe to and how device topics map to
//! control-panel values.
//!
//! ## Module Architecture
//!
//! ```text
//! mqtt/
//! ├── config.rs           - Broker settings, endpoints, client options
//! ├── error.rs            - Error type of the module
//! ├── message_manager.rs  - Received message representation
//! ├── mqtt_handler.rs     - Connection task (connect, fallback, reconnect)
//! └── topics.rs           - Device topic table and payload mapping
//! ```
//!
//! ## Channel Architecture
//!
//! The UI never owns the client. It sends [`mqtt_handler::MqttCommand`]s to a
//! tokio task and drains [`mqtt_handler::MqttEvent`]s once per frame:
//!
//! ```text
//! UI --MqttCommand--> MqttHandle task --rumqttc--> Broker
//! UI <--MqttEvent---- MqttHandle task <--rumqttc-- Broker
//! ```
//!
//! ## Transports
//!
//! A connection is first attempted over WebSocket (`ws://host:ws_port`). When
//! that fails with a WebSocket error or a refused socket the task retries over
//! plain TCP on `tcp_port`. All traffic is QoS 0.

pub mod config;
pub mod error;
pub mod message_manager;
pub mod mqtt_handler;
pub mod topics;
