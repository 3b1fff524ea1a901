//! Heart rate client facade.
//!
//! [`HeartRateClient`] owns the radio, the adapter state, the discovery
//! session and the GATT session, and republishes what happens as a
//! [`ClientSnapshot`] on a watch channel. Inbound radio events and facade
//! commands are applied one at a time by [`HeartRateClient::run`].

use futures::future::OptionFuture;
use log::{debug, error, info, trace};
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use crate::Error;
use crate::Result;
use crate::api::central::Radio;
use crate::api::central_event::{CentralEvent, CentralState};
use crate::api::peripheral::PeripheralHandle;
use crate::config::ClientConfig;
use crate::error::DecodeError;
use crate::gatt::adapter::Adapter;
use crate::gatt::decoder::{HeartRateReading, SensorLocation};
use crate::gatt::discovery::DiscoverySession;
use crate::gatt::registry::KnownCharacteristic;
use crate::gatt::session::{GattSession, GattState, SessionNotice};

/// What an observer sees of the client.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSnapshot {
    /// Advisory, human readable.
    pub status: String,
    pub adapter_state: CentralState,
    pub connection: GattState,
    pub peripheral: Option<PeripheralHandle>,
    pub heart_rate: Option<HeartRateReading>,
    pub body_sensor_location: Option<SensorLocation>,
    /// Set when the last location read could not be decoded.
    pub location_error: Option<DecodeError>,
}

impl Default for ClientSnapshot {
    fn default() -> Self {
        ClientSnapshot {
            status: "Inited".to_string(),
            adapter_state: CentralState::Unknown,
            connection: GattState::Disconnected,
            peripheral: None,
            heart_rate: None,
            body_sensor_location: None,
            location_error: None,
        }
    }
}

impl ClientSnapshot {
    /// Last heart rate, 0 before the first notification.
    pub fn heart_rate_bpm(&self) -> u16 {
        self.heart_rate.map_or(0, |reading| reading.bpm)
    }

    pub fn body_sensor_location_label(&self) -> String {
        match (&self.location_error, self.body_sensor_location) {
            (Some(_), _) => "Error".to_string(),
            (None, Some(location)) => location.to_string(),
            (None, None) => "Unknown".to_string(),
        }
    }
}

/// Operations other tasks can queue for the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    StartScanning,
    RegisterHeartRateMeasurement,
    ReadBodySensorLocation,
    WriteHeartRateControlPoint(Vec<u8>),
    Disconnect,
}

pub struct HeartRateClient<R: Radio> {
    config: ClientConfig,
    radio: R,
    adapter: Adapter,
    discovery: DiscoverySession,
    session: GattSession,
    snapshot: ClientSnapshot,
    snapshot_tx: watch::Sender<ClientSnapshot>,
}

impl<R: Radio> HeartRateClient<R> {
    pub fn new(radio: R, config: ClientConfig) -> Self {
        let snapshot = ClientSnapshot::default();
        let (snapshot_tx, _) = watch::channel(snapshot.clone());
        HeartRateClient {
            session: GattSession::new(&config),
            config,
            radio,
            adapter: Adapter::new(),
            discovery: DiscoverySession::new(),
            snapshot,
            snapshot_tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ClientSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn snapshot(&self) -> &ClientSnapshot {
        &self.snapshot
    }

    pub fn session(&self) -> &GattSession {
        &self.session
    }

    pub fn discovery(&self) -> &DiscoverySession {
        &self.discovery
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    /// Scan for the configured service; the first match is connected.
    /// Does nothing while the radio is not powered on.
    pub async fn start_scanning(&mut self) -> Result<()> {
        let started = self
            .discovery
            .start(&self.adapter, &self.radio, self.config.service_filter)
            .await;
        if permissive("start scanning", started)? {
            self.set_status("Scanning for peripherals".to_string());
        }
        Ok(())
    }

    /// Enable heart rate notifications, if the characteristic is known.
    pub async fn register_heart_rate_measurement(&mut self) -> Result<()> {
        let subscribed = self.session.subscribe_measurement(&self.radio).await;
        permissive("register heart rate measurement", subscribed).map(drop)
    }

    /// Request a body sensor location read, if the characteristic is known.
    pub async fn read_body_sensor_location(&mut self) -> Result<()> {
        let read = self.session.read_location(&self.radio).await;
        permissive("read body sensor location", read).map(drop)
    }

    /// Write a command to the control point, if the characteristic is known.
    pub async fn write_heart_rate_control_point(&mut self, command: &[u8]) -> Result<()> {
        let written = self.session.write_control_point(&self.radio, command).await;
        permissive("write heart rate control point", written).map(drop)
    }

    pub async fn disconnect(&mut self) -> Result<()> {
        let requested = self.session.disconnect(&self.radio).await;
        permissive("disconnect", requested).map(drop)
    }

    pub async fn handle_command(&mut self, command: ClientCommand) -> Result<()> {
        trace!("command {:?}", command);
        match command {
            ClientCommand::StartScanning => self.start_scanning().await,
            ClientCommand::RegisterHeartRateMeasurement => {
                self.register_heart_rate_measurement().await
            }
            ClientCommand::ReadBodySensorLocation => self.read_body_sensor_location().await,
            ClientCommand::WriteHeartRateControlPoint(command) => {
                self.write_heart_rate_control_point(&command).await
            }
            ClientCommand::Disconnect => self.disconnect().await,
        }
    }

    /// Apply one radio event.
    pub async fn handle_event(&mut self, event: CentralEvent) -> Result<()> {
        trace!("event {:?}", event);
        let notice = match event {
            CentralEvent::StateUpdate { state } => {
                self.adapter.update(state);
                if !state.is_powered_on() {
                    self.discovery.reset();
                }
                self.set_status(state.description().to_string());
                None
            }
            CentralEvent::DeviceDiscovered {
                peripheral,
                services,
                rssi,
            } => {
                if !self.session.is_disconnected() {
                    debug!("ignoring {} while {}", peripheral, self.session.state());
                    return Ok(());
                }
                let selected = self
                    .discovery
                    .on_advertisement(&self.adapter, &self.radio, &peripheral, &services)
                    .await?;
                if let Some(selected) = selected {
                    info!("discovered {} (rssi {})", selected, rssi);
                    self.set_status(format!("Discovered peripheral: {}", selected));
                    self.session.on_connect(selected);
                }
                None
            }
            CentralEvent::DeviceConnected { peripheral } => {
                let notice = self.session.on_connected(&self.radio, &peripheral).await?;
                if notice.is_some() {
                    self.discovery.on_connected(&self.radio).await?;
                }
                notice
            }
            CentralEvent::DeviceConnectionFailed { peripheral, error } => {
                self.session.on_connect_failed(&peripheral, error)
            }
            CentralEvent::ServicesDiscovered {
                peripheral,
                services,
            } => {
                self.session
                    .on_services_discovered(&self.radio, &peripheral, &services)
                    .await?
            }
            CentralEvent::ServiceDiscoveryFailed { peripheral, error } => {
                self.session.on_service_discovery_failed(&peripheral, error)
            }
            CentralEvent::CharacteristicsDiscovered {
                service,
                characteristics,
            } => self
                .session
                .on_characteristics_discovered(&service, characteristics),
            CentralEvent::CharacteristicDiscoveryFailed { service, error } => self
                .session
                .on_characteristic_discovery_failed(&service, error),
            CentralEvent::ValueUpdated {
                characteristic,
                value,
            } => self.session.on_value_updated(&characteristic, &value),
            CentralEvent::ValueUpdateFailed {
                characteristic,
                error,
            } => self.session.on_value_update_failed(&characteristic, error),
            CentralEvent::WriteComplete {
                characteristic,
                error,
            } => self.session.on_write_complete(&characteristic, error),
            CentralEvent::DeviceDisconnected { peripheral, error } => {
                self.session.on_disconnected(&peripheral, error)
            }
        };

        if let Some(notice) = notice {
            self.apply(notice);
        } else {
            self.publish();
        }
        Ok(())
    }

    /// Give up on a connect or discovery phase that ran past its deadline.
    pub async fn handle_deadline(&mut self, now: Instant) -> Result<()> {
        if let Some(notice) = self.session.on_timeout(&self.radio, now).await? {
            self.apply(notice);
        }
        Ok(())
    }

    /// Consume events and commands until the radio event stream closes.
    pub async fn run(
        mut self,
        mut events: Receiver<CentralEvent>,
        mut commands: Receiver<ClientCommand>,
    ) {
        let mut commands_open = true;
        loop {
            let deadline: OptionFuture<_> = self.session.deadline().map(time::sleep_until).into();
            let result = tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event).await,
                    None => break,
                },
                command = commands.recv(), if commands_open => match command {
                    Some(command) => self.handle_command(command).await,
                    None => {
                        commands_open = false;
                        Ok(())
                    }
                },
                Some(()) = deadline => self.handle_deadline(Instant::now()).await,
            };
            if let Err(error) = result {
                error!("{}", error);
                self.set_status(format!("Error: {}", error));
            }
        }
        info!("radio event stream closed, client stopped");
    }

    fn apply(&mut self, notice: SessionNotice) {
        match notice {
            SessionNotice::Connected(peripheral) => {
                self.snapshot.status = format!("Connected peripheral: {}", peripheral);
            }
            SessionNotice::ConnectFailed { peripheral, error } => {
                self.discovery.reset();
                self.snapshot.status = format!(
                    "Failed to connect peripheral: {} ({})",
                    peripheral,
                    error.as_deref().unwrap_or("unknown error")
                );
            }
            SessionNotice::ServicesDiscovered(services) => {
                self.snapshot.status = format!("Discovered services: {:?}", services);
            }
            SessionNotice::CharacteristicsDiscovered {
                characteristics, ..
            } => {
                self.snapshot.status = format!("Discovered Characteristics: {:?}", characteristics);
            }
            SessionNotice::HeartRate(reading) => {
                self.snapshot.heart_rate = Some(reading);
            }
            SessionNotice::Location(location) => {
                self.snapshot.body_sensor_location = Some(location);
                self.snapshot.location_error = None;
            }
            SessionNotice::DecodeFailed {
                characteristic,
                error,
            } => {
                if characteristic == KnownCharacteristic::BodySensorLocation {
                    self.snapshot.location_error = Some(error.clone());
                }
                self.snapshot.status = format!("Could not decode {}: {}", characteristic, error);
            }
            SessionNotice::WriteAcknowledged => {
                self.snapshot.status = "Heart rate control point written".to_string();
            }
            SessionNotice::TransportFailed { operation, message } => {
                self.snapshot.status = Error::transport(operation, message).to_string();
            }
            SessionNotice::Disconnected { peripheral, error } => {
                self.discovery.reset();
                self.snapshot.status = match error {
                    Some(error) => format!("Disconnected peripheral: {} ({})", peripheral, error),
                    None => format!("Disconnected peripheral: {}", peripheral),
                };
            }
            SessionNotice::TimedOut(phase) => {
                self.discovery.reset();
                self.snapshot.status = Error::Timeout(phase).to_string();
            }
        }
        self.publish();
    }

    fn set_status(&mut self, status: String) {
        self.snapshot.status = status;
        self.publish();
    }

    fn publish(&mut self) {
        self.snapshot.adapter_state = self.adapter.state();
        self.snapshot.connection = self.session.state();
        self.snapshot.peripheral = self.session.peripheral().cloned();
        self.snapshot_tx.send_replace(self.snapshot.clone());
    }
}

impl<R: Radio + 'static> HeartRateClient<R> {
    /// Run the client on its own task.
    pub fn spawn(self, events: Receiver<CentralEvent>) -> (ClientHandle, JoinHandle<()>) {
        let (commands_tx, commands_rx) = mpsc::channel(self.config.event_buffer);
        let handle = ClientHandle {
            commands: commands_tx,
            snapshot: self.subscribe(),
        };
        let task = tokio::spawn(self.run(events, commands_rx));
        (handle, task)
    }
}

/// Unavailable characteristics or radio are not failures: the request is
/// skipped and the caller may retry later. Returns whether it went out.
fn permissive(operation: &str, result: Result<()>) -> Result<bool> {
    match result {
        Ok(()) => Ok(true),
        Err(error) if error.is_unavailable() => {
            debug!("{} skipped: {}", operation, error);
            Ok(false)
        }
        Err(error) => Err(error),
    }
}

/// Cloneable access to a spawned client.
#[derive(Clone, Debug)]
pub struct ClientHandle {
    commands: Sender<ClientCommand>,
    snapshot: watch::Receiver<ClientSnapshot>,
}

impl ClientHandle {
    pub async fn send(&self, command: ClientCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| Error::ChannelClosed)
    }

    pub async fn start_scanning(&self) -> Result<()> {
        self.send(ClientCommand::StartScanning).await
    }

    pub async fn register_heart_rate_measurement(&self) -> Result<()> {
        self.send(ClientCommand::RegisterHeartRateMeasurement).await
    }

    pub async fn read_body_sensor_location(&self) -> Result<()> {
        self.send(ClientCommand::ReadBodySensorLocation).await
    }

    pub async fn write_heart_rate_control_point(&self, command: &[u8]) -> Result<()> {
        self.send(ClientCommand::WriteHeartRateControlPoint(command.to_vec()))
            .await
    }

    pub async fn disconnect(&self) -> Result<()> {
        self.send(ClientCommand::Disconnect).await
    }

    pub fn snapshot(&self) -> ClientSnapshot {
        self.snapshot.borrow().clone()
    }

    /// A receiver of every published snapshot.
    pub fn watch(&self) -> watch::Receiver<ClientSnapshot> {
        self.snapshot.clone()
    }

    /// Wait until a snapshot satisfies `predicate`.
    pub async fn wait_for(
        &self,
        mut predicate: impl FnMut(&ClientSnapshot) -> bool,
    ) -> Result<ClientSnapshot> {
        let mut snapshot = self.snapshot.clone();
        let found = snapshot
            .wait_for(|current| predicate(current))
            .await
            .map_err(|_| Error::ChannelClosed)?;
        Ok(found.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::mpsc::error::TryRecvError;
    use uuid::Uuid;

    use super::*;
    use crate::api::central::{ChannelRadio, RadioRequest};
    use crate::api::characteristic::{Characteristic, CharacteristicProperty};
    use crate::api::peripheral::PeripheralId;
    use crate::api::service::Service;
    use crate::gatt::discovery::DiscoveryState;
    use crate::gatt::registry::{UUID_BODY_SENSOR_LOCATION, UUID_HEART_RATE_SERVICE};

    fn monitor() -> PeripheralHandle {
        PeripheralHandle::new(PeripheralId::new(Uuid::from_u128(0x42)), "Polar H10")
    }

    fn client(config: ClientConfig) -> (HeartRateClient<ChannelRadio>, Receiver<RadioRequest>) {
        let (radio, requests) = ChannelRadio::channel(16);
        (HeartRateClient::new(radio, config), requests)
    }

    async fn powered_on(client: &mut HeartRateClient<ChannelRadio>) {
        client
            .handle_event(CentralEvent::StateUpdate {
                state: CentralState::PoweredOn,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn operations_before_connection_are_no_ops() {
        let (mut client, mut requests) = client(ClientConfig::default());

        client.read_body_sensor_location().await.unwrap();
        client.register_heart_rate_measurement().await.unwrap();
        client.write_heart_rate_control_point(&[0xC9]).await.unwrap();
        client.disconnect().await.unwrap();

        assert_eq!(client.snapshot(), &ClientSnapshot::default());
        assert_eq!(requests.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test]
    async fn scanning_needs_a_powered_radio() {
        let (mut client, mut requests) = client(ClientConfig::default());
        client
            .handle_event(CentralEvent::StateUpdate {
                state: CentralState::PoweredOff,
            })
            .await
            .unwrap();
        client.start_scanning().await.unwrap();

        assert_eq!(requests.try_recv(), Err(TryRecvError::Empty));
        assert_eq!(client.snapshot().status, "Bluetooth is currently powered off.");
        assert_eq!(client.snapshot().adapter_state, CentralState::PoweredOff);
    }

    #[tokio::test]
    async fn discovery_milestones_update_status() {
        let (mut client, mut requests) = client(ClientConfig::default());
        let mut observer = client.subscribe();
        powered_on(&mut client).await;
        client.start_scanning().await.unwrap();
        client
            .handle_event(CentralEvent::DeviceDiscovered {
                peripheral: monitor(),
                services: vec![UUID_HEART_RATE_SERVICE],
                rssi: -58,
            })
            .await
            .unwrap();

        assert!(observer.has_changed().unwrap());
        let seen = observer.borrow_and_update().clone();
        assert_eq!(seen.status, format!("Discovered peripheral: {}", monitor()));
        assert_eq!(seen.connection, GattState::Connecting);

        client
            .handle_event(CentralEvent::DeviceConnected {
                peripheral: monitor().id,
            })
            .await
            .unwrap();
        assert_eq!(
            client.snapshot().status,
            format!("Connected peripheral: {}", monitor())
        );

        let issued: Vec<_> = std::iter::from_fn(|| requests.try_recv().ok()).collect();
        assert_eq!(
            issued[1..],
            [
                RadioRequest::ConnectDevice {
                    peripheral: monitor().id
                },
                RadioRequest::DiscoverServices {
                    peripheral: monitor().id
                },
                RadioRequest::StopScanning,
            ]
        );
    }

    #[tokio::test]
    async fn empty_location_shows_error() {
        let (mut client, mut requests) = client(ClientConfig::default());
        powered_on(&mut client).await;
        client.start_scanning().await.unwrap();
        for event in [
            CentralEvent::DeviceDiscovered {
                peripheral: monitor(),
                services: vec![UUID_HEART_RATE_SERVICE],
                rssi: -40,
            },
            CentralEvent::DeviceConnected {
                peripheral: monitor().id,
            },
            CentralEvent::ServicesDiscovered {
                peripheral: monitor().id,
                services: vec![Service::new(1, UUID_HEART_RATE_SERVICE)],
            },
        ] {
            client.handle_event(event).await.unwrap();
        }
        let service = loop {
            if let Some(RadioRequest::DiscoverCharacteristics { service }) = requests.recv().await {
                break service;
            }
        };
        client
            .handle_event(CentralEvent::CharacteristicsDiscovered {
                service,
                characteristics: vec![Characteristic::new(
                    5,
                    UUID_BODY_SENSOR_LOCATION,
                    vec![CharacteristicProperty::Read],
                )],
            })
            .await
            .unwrap();
        assert_eq!(
            client.snapshot().status,
            format!("Discovered Characteristics: {:?}", [UUID_BODY_SENSOR_LOCATION])
        );
        client.read_body_sensor_location().await.unwrap();
        let Some(RadioRequest::ReadValue { characteristic }) = requests.recv().await else {
            panic!("expected a read request");
        };

        client
            .handle_event(CentralEvent::ValueUpdated {
                characteristic: characteristic.clone(),
                value: vec![],
            })
            .await
            .unwrap();
        assert_eq!(client.snapshot().body_sensor_location_label(), "Error");

        client
            .handle_event(CentralEvent::ValueUpdated {
                characteristic,
                value: vec![5],
            })
            .await
            .unwrap();
        assert_eq!(client.snapshot().body_sensor_location_label(), "Ear Lobe");
    }

    #[tokio::test]
    async fn stalled_connect_times_out() {
        let config = ClientConfig::default().with_connect_timeout(Duration::from_millis(20));
        let (mut client, _requests) = client(config);
        powered_on(&mut client).await;
        client.start_scanning().await.unwrap();
        client
            .handle_event(CentralEvent::DeviceDiscovered {
                peripheral: monitor(),
                services: vec![UUID_HEART_RATE_SERVICE],
                rssi: -70,
            })
            .await
            .unwrap();

        let deadline = client.session().deadline().unwrap();
        client.handle_deadline(deadline).await.unwrap();

        assert_eq!(client.snapshot().connection, GattState::Disconnected);
        assert_eq!(client.snapshot().status, "timed out while connecting");
        assert_eq!(client.snapshot().peripheral, None);
    }

    #[tokio::test]
    async fn advertisement_after_power_loss_does_not_connect() {
        let (mut client, mut requests) = client(ClientConfig::default());
        powered_on(&mut client).await;
        client.start_scanning().await.unwrap();
        assert!(matches!(
            requests.try_recv(),
            Ok(RadioRequest::StartScanning { .. })
        ));

        client
            .handle_event(CentralEvent::StateUpdate {
                state: CentralState::PoweredOff,
            })
            .await
            .unwrap();
        assert_eq!(client.discovery().state(), &DiscoveryState::Idle);

        client
            .handle_event(CentralEvent::DeviceDiscovered {
                peripheral: monitor(),
                services: vec![UUID_HEART_RATE_SERVICE],
                rssi: -50,
            })
            .await
            .unwrap();

        assert_eq!(requests.try_recv(), Err(TryRecvError::Empty));
        assert_eq!(client.snapshot().connection, GattState::Disconnected);
        assert_eq!(client.snapshot().peripheral, None);
        assert_eq!(client.discovery().state(), &DiscoveryState::Idle);
    }

    #[tokio::test]
    async fn refused_connection_resets_discovery() {
        let (mut client, _requests) = client(ClientConfig::default());
        powered_on(&mut client).await;
        client.start_scanning().await.unwrap();
        client
            .handle_event(CentralEvent::DeviceDiscovered {
                peripheral: monitor(),
                services: vec![UUID_HEART_RATE_SERVICE],
                rssi: -61,
            })
            .await
            .unwrap();

        client
            .handle_event(CentralEvent::DeviceConnectionFailed {
                peripheral: monitor().id,
                error: Some("refused".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(
            client.snapshot().status,
            format!("Failed to connect peripheral: {} (refused)", monitor())
        );
        assert_eq!(client.snapshot().connection, GattState::Disconnected);
        assert_eq!(client.snapshot().peripheral, None);
        assert_eq!(client.discovery().state(), &DiscoveryState::Idle);
        assert_eq!(client.session().deadline(), None);
    }

    #[tokio::test]
    async fn service_discovery_failure_is_shown() {
        let (mut client, _requests) = client(ClientConfig::default());
        powered_on(&mut client).await;
        client.start_scanning().await.unwrap();
        for event in [
            CentralEvent::DeviceDiscovered {
                peripheral: monitor(),
                services: vec![UUID_HEART_RATE_SERVICE],
                rssi: -45,
            },
            CentralEvent::DeviceConnected {
                peripheral: monitor().id,
            },
            CentralEvent::ServiceDiscoveryFailed {
                peripheral: monitor().id,
                error: "gatt error".to_string(),
            },
        ] {
            client.handle_event(event).await.unwrap();
        }

        assert_eq!(client.snapshot().status, "discover services failed: gatt error");
        assert_eq!(client.snapshot().connection, GattState::Connected);
        assert_eq!(client.snapshot().peripheral, Some(monitor()));
    }

    #[tokio::test]
    async fn run_loop_abandons_silent_discovery() {
        let (radio, mut requests) = ChannelRadio::channel(16);
        let config = ClientConfig::default().with_discovery_timeout(Duration::from_millis(20));
        let (events, events_rx) = mpsc::channel(16);
        let (handle, task) = HeartRateClient::new(radio, config).spawn(events_rx);

        events
            .send(CentralEvent::StateUpdate {
                state: CentralState::PoweredOn,
            })
            .await
            .unwrap();
        handle
            .wait_for(|snapshot| snapshot.adapter_state.is_powered_on())
            .await
            .unwrap();
        handle.start_scanning().await.unwrap();
        assert!(matches!(
            requests.recv().await,
            Some(RadioRequest::StartScanning { .. })
        ));

        events
            .send(CentralEvent::DeviceDiscovered {
                peripheral: monitor(),
                services: vec![UUID_HEART_RATE_SERVICE],
                rssi: -55,
            })
            .await
            .unwrap();
        assert!(matches!(
            requests.recv().await,
            Some(RadioRequest::ConnectDevice { .. })
        ));
        // The peripheral never answers service discovery.
        events
            .send(CentralEvent::DeviceConnected {
                peripheral: monitor().id,
            })
            .await
            .unwrap();

        let seen = time::timeout(
            Duration::from_secs(2),
            handle.wait_for(|snapshot| snapshot.status == "timed out while discovering"),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(seen.connection, GattState::Disconnected);
        let issued: Vec<_> = std::iter::from_fn(|| requests.try_recv().ok()).collect();
        assert_eq!(
            issued.last(),
            Some(&RadioRequest::DisconnectDevice {
                peripheral: monitor().id
            })
        );

        task.abort();
    }

    #[test]
    fn snapshot_labels_default() {
        let snapshot = ClientSnapshot::default();
        assert_eq!(snapshot.status, "Inited");
        assert_eq!(snapshot.heart_rate_bpm(), 0);
        assert_eq!(snapshot.body_sensor_location_label(), "Unknown");
    }
}
