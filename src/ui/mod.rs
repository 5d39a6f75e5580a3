//! # RadioRingCon77 Control Screen
//!
//! A single scrollable page, top to bottom:
//!
//! - **Connection**: broker address, connect / disconnect, status line
//! - **Connection log**: the newest log lines with a clear button
//! - **Switches**: numbered buttons and the two device switches
//! - **Stations**: audio source buttons
//! - **Direction pad**: motion commands and auxiliary buttons
//! - **Data**: readouts and level bars fed by the device
//!
//! ## Frame Processing
//!
//! Every frame first drains the MQTT event channel into the
//! [`ControlPanel`], then renders the sections. Sections collect
//! [`UiAction`]s which are dispatched after rendering, so no section ever
//! holds the command sender. A repaint is requested periodically so incoming
//! values show up without user input.

pub mod common;
pub mod connection_section;
pub mod control_section;
pub mod data_section;

use eframe::egui::{self, Id, Modal, RichText, ScrollArea};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::control::{Alert, ControlPanel};
use crate::mqtt::mqtt_handler::{MqttCommand, MqttEvent};

use self::common::{install_fallback_font, UiAction, UiColors};

/// Upper bound of events applied per frame, keeps a message burst from
/// stalling rendering.
const MAX_EVENTS_PER_FRAME: usize = 256;

pub struct RingConUI {
    panel: ControlPanel,
    config: AppConfig,
    commands: mpsc::Sender<MqttCommand>,
    events: mpsc::UnboundedReceiver<MqttEvent>,
    alert: Option<Alert>,
    repaint_interval: Duration,
}

impl RingConUI {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        config: AppConfig,
        commands: mpsc::Sender<MqttCommand>,
        events: mpsc::UnboundedReceiver<MqttEvent>,
    ) -> Self {
        cc.egui_ctx.set_theme(egui::Theme::Dark);
        install_fallback_font(&cc.egui_ctx, &config.ui.font_paths);

        RingConUI {
            panel: ControlPanel::new(config.broker.clone(), config.ui.log_capacity),
            repaint_interval: Duration::from_millis(config.ui.repaint_interval_ms),
            config,
            commands,
            events,
            alert: None,
        }
    }

    fn drain_events(&mut self) {
        for _ in 0..MAX_EVENTS_PER_FRAME {
            match self.events.try_recv() {
                Ok(event) => {
                    if let Some(alert) = self.panel.apply_event(event) {
                        self.alert = Some(alert);
                    }
                }
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    warn!("MQTT event channel closed");
                    break;
                }
            }
        }
    }

    fn dispatch(&mut self, action: UiAction) {
        debug!("UI action {:?}", action);
        match action {
            UiAction::Connect => match self.panel.connect_request() {
                Ok(settings) => {
                    if self.config.remember_broker(&settings.host, settings.ws_port) {
                        self.config.save_in_background();
                    }
                    self.panel.adopt_settings(settings.clone());
                    self.send(MqttCommand::Connect(settings));
                }
                Err(e) => {
                    self.panel.note(&format!("Connection error: {}", e));
                    self.alert = Some(Alert::ConnectError(e.to_string()));
                }
            },
            UiAction::Disconnect => self.send(MqttCommand::Disconnect),
            UiAction::ClearLog => self.panel.clear_log(),
            UiAction::Send(command) => {
                info!("Sending {}", command);
                let request = self.panel.publish(command);
                self.send(request);
            }
        }
    }

    fn send(&mut self, command: MqttCommand) {
        if let Err(e) = self.commands.try_send(command) {
            error!("Failed to hand command to MQTT task: {}", e);
            self.panel.note(&format!("Internal error: {}", e));
        }
    }

    fn show_alert(&mut self, ctx: &egui::Context) {
        let Some(alert) = self.alert.as_ref() else {
            return;
        };

        let response = Modal::new(Id::new("alert")).show(ctx, |ui| {
            ui.set_width(260.0);
            ui.heading(alert.title());
            ui.label(alert.body());
            ui.separator();
            ui.button("OK").clicked()
        });
        if response.inner || response.should_close() {
            self.alert = None;
        }
    }
}

impl eframe::App for RingConUI {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();
        ctx.request_repaint_after(self.repaint_interval);

        let mut actions = Vec::new();

        egui::CentralPanel::default()
            .frame(egui::Frame::new().fill(UiColors::MAIN_BG).inner_margin(8))
            .show(ctx, |ui| {
                ScrollArea::vertical()
                    .id_salt("control_page")
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        ui.label(RichText::new("MQTT Control").heading().color(UiColors::TEXT));
                        ui.add_space(4.0);

                        connection_section::render_connection(ui, &mut self.panel, &mut actions);
                        connection_section::render_log(ui, &self.panel, &mut actions);
                        control_section::render_switches(ui, &mut self.panel, &mut actions);
                        ui.add_space(4.0);
                        control_section::render_stations(ui, &self.panel, &mut actions);
                        control_section::render_direction_pad(ui, &self.panel, &mut actions);
                        data_section::render_data(ui, &self.panel);
                        ui.add_space(20.0);
                    });
            });

        for action in actions {
            self.dispatch(action);
        }

        self.show_alert(ctx);
    }
}
