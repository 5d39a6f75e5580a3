//! Background task owning the MQTT client.
//!
//! The UI talks to the task through [`MqttCommand`]s and receives
//! [`MqttEvent`]s back. The task keeps at most one link to the broker. A link
//! starts on the WebSocket endpoint and moves to plain TCP when the WebSocket
//! connection fails or is refused. After other network errors the link waits
//! for the reconnect period and lets rumqttc reconnect on the next poll.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::io;
use std::time::Duration;

use rumqttc::{
    AsyncClient, ConnectReturnCode, ConnectionError, Event, EventLoop, Outgoing, Packet, QoS,
    SubscribeReasonCode,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::config::{self, BrokerSettings, Endpoint};
use super::error::MqttError;
use super::message_manager::MQTTMessage;
use super::topics::{is_publishable, STATE_TOPICS};

/// Capacity of the request queue between `AsyncClient` and `EventLoop`.
const REQUEST_CAPACITY: usize = 32;
/// Upper bound for flushing the DISCONNECT packet when a link is closed.
const CLOSE_FLUSH_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportKind {
    WebSocket,
    Tcp,
}

impl From<&Endpoint> for TransportKind {
    fn from(endpoint: &Endpoint) -> Self {
        match endpoint {
            Endpoint::WebSocket { .. } => TransportKind::WebSocket,
            Endpoint::Tcp { .. } => TransportKind::Tcp,
        }
    }
}

#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected(TransportKind),
    Offline,
    Reconnecting,
    /// `transport` is `None` when the failure happened before any transport
    /// was chosen, e.g. on invalid broker settings.
    Failed {
        transport: Option<TransportKind>,
        message: String,
    },
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected(_))
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "Disconnected"),
            ConnectionState::Connecting => write!(f, "Connecting..."),
            ConnectionState::Connected(TransportKind::WebSocket) => write!(f, "Connected"),
            ConnectionState::Connected(TransportKind::Tcp) => write!(f, "Connected (TCP)"),
            ConnectionState::Offline => write!(f, "Offline"),
            ConnectionState::Reconnecting => write!(f, "Reconnecting..."),
            ConnectionState::Failed {
                transport: Some(TransportKind::Tcp),
                message,
            } => write!(f, "TCP Error: {}", message),
            ConnectionState::Failed { message, .. } => write!(f, "Error: {}", message),
        }
    }
}

/// Requests from the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum MqttCommand {
    Connect(BrokerSettings),
    Disconnect,
    Publish { topic: String, payload: String },
    Shutdown,
}

/// Notifications for the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum MqttEvent {
    Status(ConnectionState),
    Log(String),
    Message(MQTTMessage),
    /// A publish was requested while no connection was up
    NotConnected,
    /// A connect request could not even be started
    ConnectFailed(String),
}

/// Handle to the spawned MQTT task.
pub struct MqttHandle {
    commands: mpsc::Sender<MqttCommand>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl MqttHandle {
    /// Spawns the MQTT task on the current tokio runtime.
    pub fn spawn(events: mpsc::UnboundedSender<MqttEvent>) -> Self {
        let (commands, command_rx) = mpsc::channel(64);
        let cancel = CancellationToken::new();

        let handler = MqttHandler {
            reporter: Reporter {
                events,
                state: ConnectionState::Disconnected,
            },
            commands: command_rx,
            cancel: cancel.clone(),
            link: None,
        };

        info!("Spawning MQTT handle task");
        let task = tokio::spawn(async move {
            handler.run().await;
            info!("MQTT handle task finished");
        });

        Self {
            commands,
            cancel,
            task,
        }
    }

    pub fn sender(&self) -> mpsc::Sender<MqttCommand> {
        self.commands.clone()
    }

    /// Asks the task to close its connection and stop.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub async fn join(self) {
        if let Err(e) = self.task.await {
            error!("MQTT task panicked or was aborted: {}", e);
        }
    }
}

/// Emits events and tracks the last reported state. Emitting never waits on
/// the receiver.
struct Reporter {
    events: mpsc::UnboundedSender<MqttEvent>,
    state: ConnectionState,
}

impl Reporter {
    fn emit(&self, event: MqttEvent) {
        if self.events.send(event).is_err() {
            debug!("Event receiver dropped, discarding MQTT event");
        }
    }

    fn log(&self, line: impl Into<String>) {
        let line = line.into();
        info!("{}", line);
        self.emit(MqttEvent::Log(line));
    }

    fn set_state(&mut self, state: ConnectionState) {
        if self.state != state {
            debug!("MQTT state {:?} -> {:?}", self.state, state);
        }
        self.state = state.clone();
        self.emit(MqttEvent::Status(state));
    }
}

/// One client/event-loop pair bound to an endpoint.
struct Link {
    client: AsyncClient,
    eventloop: EventLoop,
    endpoint: Endpoint,
    settings: BrokerSettings,
    /// CONNACK received and no error since
    online: bool,
    /// Set while waiting out the reconnect period
    retry_at: Option<Instant>,
    /// Topics handed to the client, waiting for their packet id
    queued_subscriptions: VecDeque<String>,
    /// Packet id to topic, waiting for SUBACK
    inflight_subscriptions: HashMap<u16, String>,
}

impl Link {
    fn open(endpoint: Endpoint, settings: BrokerSettings) -> (Self, String) {
        let options = config::mqtt_options(&endpoint, &settings);
        let description = config::describe_options(&options, &settings);
        let (client, mut eventloop) = AsyncClient::new(options, REQUEST_CAPACITY);
        eventloop.set_network_options(config::network_options(&settings));

        let link = Link {
            client,
            eventloop,
            endpoint,
            settings,
            online: false,
            retry_at: None,
            queued_subscriptions: VecDeque::new(),
            inflight_subscriptions: HashMap::new(),
        };
        (link, description)
    }

    fn transport(&self) -> TransportKind {
        TransportKind::from(&self.endpoint)
    }

    fn reset_subscriptions(&mut self) {
        self.queued_subscriptions.clear();
        self.inflight_subscriptions.clear();
    }
}

/// What woke the task up.
enum Wake {
    Cancelled,
    Command(Option<MqttCommand>),
    Network(Result<Event, ConnectionError>),
    RetryDue,
}

struct MqttHandler {
    reporter: Reporter,
    commands: mpsc::Receiver<MqttCommand>,
    cancel: CancellationToken,
    link: Option<Link>,
}

impl MqttHandler {
    async fn run(mut self) {
        info!("MQTT handle task started");
        loop {
            let wake = match self.link.as_mut() {
                None => tokio::select! {
                    _ = self.cancel.cancelled() => Wake::Cancelled,
                    command = self.commands.recv() => Wake::Command(command),
                },
                Some(link) => match link.retry_at {
                    Some(deadline) => tokio::select! {
                        _ = self.cancel.cancelled() => Wake::Cancelled,
                        command = self.commands.recv() => Wake::Command(command),
                        _ = tokio::time::sleep_until(deadline) => Wake::RetryDue,
                    },
                    None => tokio::select! {
                        _ = self.cancel.cancelled() => Wake::Cancelled,
                        command = self.commands.recv() => Wake::Command(command),
                        event = link.eventloop.poll() => Wake::Network(event),
                    },
                },
            };

            match wake {
                Wake::Cancelled | Wake::Command(None) | Wake::Command(Some(MqttCommand::Shutdown)) => {
                    break
                }
                Wake::Command(Some(command)) => self.handle_command(command).await,
                Wake::Network(Ok(event)) => self.handle_event(event),
                Wake::Network(Err(e)) => self.handle_connection_error(e),
                Wake::RetryDue => {
                    if let Some(link) = self.link.as_mut() {
                        link.retry_at = None;
                        link.reset_subscriptions();
                    }
                    self.reporter.log("Reconnecting...");
                    self.reporter.set_state(ConnectionState::Reconnecting);
                }
            }
        }

        if self.link.is_some() {
            self.reporter.log("Cleaning up MQTT connection");
            self.close_link().await;
        }
    }

    async fn handle_command(&mut self, command: MqttCommand) {
        match command {
            MqttCommand::Connect(settings) => self.connect(settings).await,
            MqttCommand::Disconnect => {
                if self.link.is_some() {
                    self.reporter.log("Disconnecting...");
                    self.close_link().await;
                    self.reporter.set_state(ConnectionState::Disconnected);
                }
            }
            MqttCommand::Publish { topic, payload } => self.publish(topic, payload),
            MqttCommand::Shutdown => {}
        }
    }

    async fn connect(&mut self, settings: BrokerSettings) {
        self.reporter.log(format!(
            "Trying to connect to MQTT broker: {}:{}",
            settings.host, settings.ws_port
        ));

        if let Err(e) = settings.validate() {
            self.reporter.log(format!("Connection error: {}", e));
            self.reporter.set_state(ConnectionState::Failed {
                transport: None,
                message: e.to_string(),
            });
            self.reporter.emit(MqttEvent::ConnectFailed(e.to_string()));
            return;
        }

        self.reporter.set_state(ConnectionState::Connecting);

        if self.link.is_some() {
            self.reporter.log("Closing existing connection");
            self.close_link().await;
        }

        let endpoint = settings.websocket_endpoint();
        self.reporter.log(format!("Using WebSocket URL: {}", endpoint));
        self.open(endpoint, settings);
    }

    fn open(&mut self, endpoint: Endpoint, settings: BrokerSettings) {
        let (link, description) = Link::open(endpoint, settings);
        self.reporter.log(format!("Connection options: {}", description));
        self.link = Some(link);
    }

    fn fall_back_to_tcp(&mut self) {
        let Some(link) = self.link.take() else {
            return;
        };
        let settings = link.settings.clone();
        drop(link);

        self.reporter
            .log(format!("Trying TCP connection (port {})", settings.tcp_port));
        let endpoint = settings.tcp_endpoint();
        self.reporter.log(format!("Using TCP URL: {}", endpoint));
        self.open(endpoint, settings);
    }

    fn publish(&mut self, topic: String, payload: String) {
        let online = self.link.as_ref().is_some_and(|link| link.online);
        if !online {
            self.reporter.emit(MqttEvent::NotConnected);
            self.reporter
                .log(format!("{}, cannot send message", MqttError::NotConnected));
            return;
        }

        if !is_publishable(&topic) {
            let e = MqttError::InvalidTopic(topic.clone());
            warn!("{}", e);
            self.reporter.log(format!("Send failed {}: {}", topic, e));
            return;
        }

        let result = self.link.as_ref().map(|link| {
            link.client.try_publish(
                topic.clone(),
                QoS::AtMostOnce,
                false,
                payload.clone().into_bytes(),
            )
        });
        match result {
            Some(Ok(())) => self.reporter.log(format!("Sent: {} = {}", topic, payload)),
            Some(Err(e)) => self
                .reporter
                .log(format!("Send failed {}: {}", topic, MqttError::from(e))),
            None => self.reporter.emit(MqttEvent::NotConnected),
        }
    }

    fn handle_event(&mut self, event: Event) {
        let Some(link) = self.link.as_mut() else {
            return;
        };

        match event {
            Event::Incoming(Packet::ConnAck(ack)) => {
                if ack.code != ConnectReturnCode::Success {
                    let message = format!("connection refused: {:?}", ack.code);
                    let transport = link.transport();
                    self.reporter.log(format!("MQTT error: {}", message));
                    self.reporter.set_state(ConnectionState::Failed {
                        transport: Some(transport),
                        message,
                    });
                    return;
                }

                link.online = true;
                link.reset_subscriptions();
                let transport = link.transport();
                match transport {
                    TransportKind::WebSocket => self.reporter.log("MQTT connected"),
                    TransportKind::Tcp => self.reporter.log("TCP connected"),
                }
                self.reporter.set_state(ConnectionState::Connected(transport));

                for topic in STATE_TOPICS {
                    match link.client.try_subscribe(topic, QoS::AtMostOnce) {
                        Ok(()) => link.queued_subscriptions.push_back(topic.to_string()),
                        Err(e) => self
                            .reporter
                            .log(format!("Subscribe failed {}: {}", topic, e)),
                    }
                }
            }
            Event::Outgoing(Outgoing::Subscribe(pkid)) => {
                if let Some(topic) = link.queued_subscriptions.pop_front() {
                    link.inflight_subscriptions.insert(pkid, topic);
                }
            }
            Event::Incoming(Packet::SubAck(ack)) => {
                let Some(topic) = link.inflight_subscriptions.remove(&ack.pkid) else {
                    debug!("SUBACK for unknown packet id {}", ack.pkid);
                    return;
                };
                if ack
                    .return_codes
                    .iter()
                    .any(|code| matches!(code, SubscribeReasonCode::Failure))
                {
                    self.reporter
                        .log(format!("Subscribe failed {}: rejected by broker", topic));
                } else {
                    self.reporter.log(format!("Subscribed: {}", topic));
                }
            }
            Event::Incoming(Packet::Publish(publish)) => {
                let msg = MQTTMessage::from_publish(&publish);
                debug!("Incoming message {}", msg);
                self.reporter.emit(MqttEvent::Message(msg));
            }
            other => debug!("MQTT event: {:?}", other),
        }
    }

    fn handle_connection_error(&mut self, e: ConnectionError) {
        let Some(link) = self.link.as_mut() else {
            return;
        };
        let transport = link.transport();
        let was_online = link.online;
        link.online = false;
        link.reset_subscriptions();

        let message = e.to_string();
        match transport {
            TransportKind::WebSocket => self.reporter.log(format!("MQTT error: {}", message)),
            TransportKind::Tcp => self.reporter.log(format!("TCP error: {}", message)),
        }
        self.reporter.set_state(ConnectionState::Failed {
            transport: Some(transport),
            message,
        });

        if transport == TransportKind::WebSocket && should_fall_back(&e) {
            self.reporter.log("WebSocket connection failed, trying TCP...");
            self.fall_back_to_tcp();
            return;
        }

        if was_online {
            self.reporter.log("MQTT connection closed");
            self.reporter.set_state(ConnectionState::Offline);
        }

        if let Some(link) = self.link.as_mut() {
            link.retry_at = Some(Instant::now() + link.settings.reconnect_period());
        }
    }

    /// Sends DISCONNECT and gives the event loop a short window to flush it.
    async fn close_link(&mut self) {
        let Some(mut link) = self.link.take() else {
            return;
        };
        if !link.online {
            return;
        }
        if let Err(e) = link.client.try_disconnect() {
            warn!("Failed to queue disconnect: {}", e);
            return;
        }

        let flush = async {
            loop {
                match link.eventloop.poll().await {
                    Ok(Event::Outgoing(Outgoing::Disconnect)) => break,
                    Ok(_) => continue,
                    Err(e) => {
                        debug!("Event loop ended while closing: {}", e);
                        break;
                    }
                }
            }
        };
        if tokio::time::timeout(CLOSE_FLUSH_TIMEOUT, flush).await.is_err() {
            warn!("Timed out flushing DISCONNECT to {}", link.endpoint);
        }
    }
}

/// WebSocket failures and refused sockets move the link to TCP. A broker
/// that answers but refuses the session does not.
fn should_fall_back(error: &ConnectionError) -> bool {
    match error {
        ConnectionError::Io(io) => io.kind() == io::ErrorKind::ConnectionRefused,
        ConnectionError::ConnectionRefused(_) | ConnectionError::NetworkTimeout => false,
        other => {
            let text = other.to_string().to_lowercase();
            text.contains("websocket") || text.contains("connection refused")
        }
    }
}
