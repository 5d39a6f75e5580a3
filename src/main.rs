pub mod config;
pub mod control;
pub mod mqtt;
pub mod ui;

use crate::config::AppConfig;
use crate::mqtt::mqtt_handler::MqttHandle;
use crate::ui::RingConUI;
use color_eyre::{eyre::eyre, Result};
use eframe::egui;
use tokio::sync::mpsc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let config = match AppConfig::load().await {
        Ok(config) => config,
        Err(e) => {
            warn!("Falling back to default configuration: {}", e);
            AppConfig::default()
        }
    };
    info!(
        "Broker preset {}:{} (TCP fallback {})",
        config.broker.host, config.broker.ws_port, config.broker.tcp_port
    );

    let (mqtt_ui_tx, mqtt_ui_rx) = mpsc::unbounded_channel();
    let mqtt_handle = MqttHandle::spawn(mqtt_ui_tx);
    let commands = mqtt_handle.sender();

    info!("Starting UI");
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("RadioRingCon77 MQTT Control")
            .with_inner_size([420.0, 900.0]),
        ..Default::default()
    };

    let ui_result = eframe::run_native(
        "RadioRingCon77 MQTT Control",
        native_options,
        Box::new(|cc| Ok(Box::new(RingConUI::new(cc, config, commands, mqtt_ui_rx)))),
    );

    info!("UI closed, shutting down MQTT task");
    mqtt_handle.shutdown();
    mqtt_handle.join().await;

    ui_result.map_err(|e| eyre!("UI terminated with error: {}", e))
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
