//! Error types of the MQTT module

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MqttError {
    /// Broker address or ports cannot be used
    #[error("Invalid broker: {0}")]
    InvalidBroker(String),

    /// Publish requested without an established connection
    #[error("Not connected to a broker")]
    NotConnected,

    /// Topic cannot be published to
    #[error("Invalid publish topic: {0}")]
    InvalidTopic(String),

    /// Request rejected by the client library
    #[error("Client error: {0}")]
    Client(#[from] rumqttc::ClientError),
}
