use rumqttc::{MqttOptions, NetworkOptions, Transport};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use super::error::MqttError;
use super::topics::TOPIC_PREFIX;

/// Broker address and connection tuning, stored in the `[broker]` table of
/// the configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerSettings {
    pub host: String,
    /// WebSocket port, tried first
    pub ws_port: u16,
    /// Plain TCP port, used when the WebSocket connection fails
    pub tcp_port: u16,
    /// Appended to the WebSocket URL, e.g. `/mqtt`
    pub ws_path: String,
    /// 0 disables keep-alive pings
    pub keep_alive_secs: u64,
    /// Must be at least 1
    pub connect_timeout_secs: u64,
    pub reconnect_period_secs: u64,
    pub clean_session: bool,
    pub client_id_prefix: String,
    /// Topic for the A / B / C / intercom buttons
    pub action_topic: String,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            host: "192.168.0.141".to_string(),
            ws_port: 8083,
            tcp_port: 1883,
            ws_path: String::new(),
            keep_alive_secs: 60,
            connect_timeout_secs: 10,
            reconnect_period_secs: 5,
            clean_session: true,
            client_id_prefix: "ringcon".to_string(),
            action_topic: format!("{}/action", TOPIC_PREFIX),
        }
    }
}

impl BrokerSettings {
    pub fn validate(&self) -> Result<(), MqttError> {
        if self.host.trim().is_empty() {
            return Err(MqttError::InvalidBroker("broker host is empty".to_string()));
        }
        if self.host.contains(char::is_whitespace) {
            return Err(MqttError::InvalidBroker(format!(
                "broker host '{}' contains whitespace",
                self.host
            )));
        }
        if self.ws_port == 0 || self.tcp_port == 0 {
            return Err(MqttError::InvalidBroker("port must not be 0".to_string()));
        }
        if self.connect_timeout_secs == 0 {
            return Err(MqttError::InvalidBroker(
                "connect timeout must be at least 1s".to_string(),
            ));
        }
        Ok(())
    }

    pub fn websocket_endpoint(&self) -> Endpoint {
        let path = match self.ws_path.as_str() {
            "" => String::new(),
            p if p.starts_with('/') => p.to_string(),
            p => format!("/{}", p),
        };
        Endpoint::WebSocket {
            url: format!("ws://{}:{}{}", self.host, self.ws_port, path),
            port: self.ws_port,
        }
    }

    pub fn tcp_endpoint(&self) -> Endpoint {
        Endpoint::Tcp {
            host: self.host.clone(),
            port: self.tcp_port,
        }
    }

    pub fn reconnect_period(&self) -> Duration {
        Duration::from_secs(self.reconnect_period_secs)
    }
}

/// Where and how to reach the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    WebSocket { url: String, port: u16 },
    Tcp { host: String, port: u16 },
}

impl Endpoint {
    /// Fresh client id for one connection attempt.
    pub fn client_id(&self, prefix: &str) -> String {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        match self {
            Endpoint::WebSocket { .. } => format!("{}_{}", prefix, &suffix[..12]),
            Endpoint::Tcp { .. } => format!("{}_tcp_{}", prefix, &suffix[..12]),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Endpoint::WebSocket { url, .. } => write!(f, "{}", url),
            Endpoint::Tcp { host, port } => write!(f, "mqtt://{}:{}", host, port),
        }
    }
}

/// Builds the client options for one connection attempt.
pub fn mqtt_options(endpoint: &Endpoint, settings: &BrokerSettings) -> MqttOptions {
    let client_id = endpoint.client_id(&settings.client_id_prefix);
    let mut options = match endpoint {
        Endpoint::WebSocket { url, port } => {
            let mut options = MqttOptions::new(client_id, url.clone(), *port);
            options.set_transport(Transport::Ws);
            options
        }
        Endpoint::Tcp { host, port } => {
            let mut options = MqttOptions::new(client_id, host.clone(), *port);
            options.set_transport(Transport::Tcp);
            options
        }
    };
    options
        .set_keep_alive(Duration::from_secs(settings.keep_alive_secs))
        .set_clean_session(settings.clean_session);
    options
}

pub fn network_options(settings: &BrokerSettings) -> NetworkOptions {
    let mut network_options = NetworkOptions::new();
    network_options.set_connection_timeout(settings.connect_timeout_secs);
    network_options
}

/// Human readable summary of the options, written to the connection log.
pub fn describe_options(options: &MqttOptions, settings: &BrokerSettings) -> String {
    format!(
        "clientId={} clean={} connectTimeout={}s reconnectPeriod={}s keepalive={}s protocol=MQTT 3.1.1",
        options.client_id(),
        options.clean_session(),
        settings.connect_timeout_secs,
        settings.reconnect_period_secs,
        options.keep_alive().as_secs(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn websocket_url_is_built_from_host_port_and_path() {
        let mut settings = BrokerSettings::default();
        assert_eq!(
            settings.websocket_endpoint(),
            Endpoint::WebSocket {
                url: "ws://192.168.0.141:8083".to_string(),
                port: 8083
            }
        );

        settings.ws_path = "mqtt".to_string();
        assert_eq!(
            settings.websocket_endpoint().to_string(),
            "ws://192.168.0.141:8083/mqtt"
        );
        assert_eq!(settings.tcp_endpoint().to_string(), "mqtt://192.168.0.141:1883");
    }

    #[test]
    fn client_ids_are_unique_and_tagged_by_transport() {
        let settings = BrokerSettings::default();
        let ws = settings.websocket_endpoint();
        let tcp = settings.tcp_endpoint();

        let first = ws.client_id("ringcon");
        let second = ws.client_id("ringcon");
        assert!(first.starts_with("ringcon_"));
        assert_ne!(first, second);
        assert!(tcp.client_id("ringcon").starts_with("ringcon_tcp_"));
    }

    #[test]
    fn invalid_brokers_are_rejected() {
        let mut settings = BrokerSettings::default();
        assert!(settings.validate().is_ok());

        settings.host = "  ".to_string();
        assert!(matches!(settings.validate(), Err(MqttError::InvalidBroker(_))));

        settings.host = "10.0.0.1".to_string();
        settings.ws_port = 0;
        assert!(settings.validate().is_err());

        settings.ws_port = 8083;
        settings.connect_timeout_secs = 0;
        assert!(matches!(settings.validate(), Err(MqttError::InvalidBroker(_))));
    }

    #[test]
    fn keep_alive_is_passed_through_unchanged() {
        let mut settings = BrokerSettings::default();
        settings.keep_alive_secs = 0;
        let options = mqtt_options(&settings.tcp_endpoint(), &settings);
        assert_eq!(options.keep_alive(), Duration::ZERO);

        settings.keep_alive_secs = 2;
        let options = mqtt_options(&settings.websocket_endpoint(), &settings);
        assert_eq!(options.keep_alive(), Duration::from_secs(2));
    }

    #[test]
    fn options_carry_session_settings() {
        let settings = BrokerSettings::default();
        let options = mqtt_options(&settings.tcp_endpoint(), &settings);
        assert_eq!(options.keep_alive(), Duration::from_secs(60));
        assert!(options.clean_session());
        assert_eq!(options.broker_address(), ("192.168.0.141".to_string(), 1883));
    }
}
