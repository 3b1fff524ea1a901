//! Per-connection GATT state machine.
//!
//! ```text
//! Disconnected -> Connecting -> Connected
//!   -> ServicesDiscovered -> CharacteristicsDiscovered -> Ready
//! any state -> Disconnected
//! ```
//!
//! Every handle the session hands out carries the current connection
//! [`Epoch`]. Ending a connection bumps the epoch, so events that arrive late
//! for an earlier connection are recognised and dropped.

use std::fmt;
use std::time::Duration;

use log::{debug, error, info, trace, warn};
use tokio::time::Instant;
use uuid::Uuid;

use crate::Error;
use crate::Result;
use crate::api::central::Radio;
use crate::api::characteristic::{Characteristic, CharacteristicHandle, CharacteristicWriteType};
use crate::api::peripheral::{Epoch, PeripheralHandle, PeripheralId};
use crate::api::service::{Service, ServiceHandle};
use crate::config::ClientConfig;
use crate::error::{DecodeError, TimeoutPhase};
use crate::gatt::decoder::{self, HeartRateReading, SensorLocation};
use crate::gatt::registry::{self, KnownCharacteristic};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GattState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    ServicesDiscovered,
    CharacteristicsDiscovered,
    Ready,
}

impl fmt::Display for GattState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GattState::Disconnected => "disconnected",
            GattState::Connecting => "connecting",
            GattState::Connected => "connected",
            GattState::ServicesDiscovered => "services discovered",
            GattState::CharacteristicsDiscovered => "characteristics discovered",
            GattState::Ready => "ready",
        };
        f.write_str(name)
    }
}

/// Something observable happened on the session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionNotice {
    Connected(PeripheralHandle),
    ConnectFailed {
        peripheral: PeripheralHandle,
        error: Option<String>,
    },
    ServicesDiscovered(Vec<Uuid>),
    CharacteristicsDiscovered {
        characteristics: Vec<Uuid>,
        ready: bool,
    },
    HeartRate(HeartRateReading),
    Location(SensorLocation),
    DecodeFailed {
        characteristic: KnownCharacteristic,
        error: DecodeError,
    },
    WriteAcknowledged,
    TransportFailed {
        operation: &'static str,
        message: String,
    },
    Disconnected {
        peripheral: PeripheralHandle,
        error: Option<String>,
    },
    TimedOut(TimeoutPhase),
}

#[derive(Debug)]
pub struct GattSession {
    state: GattState,
    epoch: Epoch,
    peripheral: Option<PeripheralHandle>,
    /// Heart Rate services still waiting for their characteristics.
    pending_services: Vec<ServiceHandle>,
    measurement: Option<CharacteristicHandle>,
    location: Option<CharacteristicHandle>,
    control_point: Option<CharacteristicHandle>,
    latest_reading: Option<HeartRateReading>,
    latest_location: Option<SensorLocation>,
    deadline: Option<(Instant, TimeoutPhase)>,
    connect_timeout: Duration,
    discovery_timeout: Duration,
}

impl Default for GattSession {
    fn default() -> Self {
        GattSession::new(&ClientConfig::default())
    }
}

impl GattSession {
    pub fn new(config: &ClientConfig) -> Self {
        GattSession {
            state: GattState::Disconnected,
            epoch: Epoch::default(),
            peripheral: None,
            pending_services: Vec::new(),
            measurement: None,
            location: None,
            control_point: None,
            latest_reading: None,
            latest_location: None,
            deadline: None,
            connect_timeout: config.connect_timeout,
            discovery_timeout: config.discovery_timeout,
        }
    }

    pub fn state(&self) -> GattState {
        self.state
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn peripheral(&self) -> Option<&PeripheralHandle> {
        self.peripheral.as_ref()
    }

    pub fn latest_reading(&self) -> Option<HeartRateReading> {
        self.latest_reading
    }

    pub fn latest_location(&self) -> Option<SensorLocation> {
        self.latest_location
    }

    pub fn is_disconnected(&self) -> bool {
        self.state == GattState::Disconnected
    }

    /// Stored handle for a profile characteristic, if discovered.
    pub fn characteristic(&self, role: KnownCharacteristic) -> Option<&CharacteristicHandle> {
        match role {
            KnownCharacteristic::HeartRateMeasurement => self.measurement.as_ref(),
            KnownCharacteristic::BodySensorLocation => self.location.as_ref(),
            KnownCharacteristic::HeartRateControlPoint => self.control_point.as_ref(),
            KnownCharacteristic::HeartRateService => None,
        }
    }

    /// When the current connect or discovery phase gives up.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline.map(|(at, _)| at)
    }

    /// A connect request for `peripheral` was issued. Returns `false` and
    /// leaves the session untouched when a connection is already in progress.
    pub fn on_connect(&mut self, peripheral: PeripheralHandle) -> bool {
        if self.state != GattState::Disconnected {
            warn!("connect to {} rejected, session is {}", peripheral, self.state);
            return false;
        }
        self.epoch = self.epoch.next();
        info!("connecting to {} (epoch {})", peripheral, self.epoch.value());
        self.peripheral = Some(peripheral);
        self.state = GattState::Connecting;
        self.arm(self.connect_timeout, TimeoutPhase::Connecting);
        true
    }

    pub async fn on_connected<R: Radio + ?Sized>(
        &mut self,
        radio: &R,
        peripheral: &PeripheralId,
    ) -> Result<Option<SessionNotice>> {
        let expected = self.state == GattState::Connecting && self.is_current(peripheral);
        if !expected {
            warn!(
                "unexpected connection to {} while {}, disconnecting it",
                peripheral, self.state
            );
            radio.disconnect(peripheral).await?;
            return Ok(None);
        }

        let Some(handle) = self.peripheral.clone() else {
            return Ok(None);
        };
        info!("connected to {}", handle);
        self.state = GattState::Connected;
        self.arm(self.discovery_timeout, TimeoutPhase::Discovering);
        radio.discover_services(peripheral).await?;
        Ok(Some(SessionNotice::Connected(handle)))
    }

    pub fn on_connect_failed(
        &mut self,
        peripheral: &PeripheralId,
        error: Option<String>,
    ) -> Option<SessionNotice> {
        if self.state != GattState::Connecting || !self.is_current(peripheral) {
            debug!("ignoring connect failure for {}", peripheral);
            return None;
        }
        let handle = self.invalidate()?;
        error!("failed to connect to {}: {:?}", handle, error);
        Some(SessionNotice::ConnectFailed {
            peripheral: handle,
            error,
        })
    }

    /// Request characteristics for every Heart Rate service; everything else
    /// is dropped.
    pub async fn on_services_discovered<R: Radio + ?Sized>(
        &mut self,
        radio: &R,
        peripheral: &PeripheralId,
        services: &[Service],
    ) -> Result<Option<SessionNotice>> {
        if self.state != GattState::Connected || !self.is_current(peripheral) {
            warn!("discarding stale service discovery for {}", peripheral);
            return Ok(None);
        }

        trace!("services {:?}", services);
        self.state = GattState::ServicesDiscovered;
        for service in services {
            if registry::resolve(&service.uuid) != Some(KnownCharacteristic::HeartRateService) {
                continue;
            }
            let handle = ServiceHandle::new(service, *peripheral, self.epoch);
            radio.discover_characteristics(&handle).await?;
            self.pending_services.push(handle);
        }
        if self.pending_services.is_empty() {
            warn!("{} has no heart rate service", peripheral);
            self.deadline = None;
        }

        Ok(Some(SessionNotice::ServicesDiscovered(
            services.iter().map(|service| service.uuid).collect(),
        )))
    }

    pub fn on_service_discovery_failed(
        &mut self,
        peripheral: &PeripheralId,
        message: String,
    ) -> Option<SessionNotice> {
        if self.state != GattState::Connected || !self.is_current(peripheral) {
            return None;
        }
        error!("service discovery failed on {}: {}", peripheral, message);
        self.deadline = None;
        Some(SessionNotice::TransportFailed {
            operation: "discover services",
            message,
        })
    }

    pub fn on_characteristics_discovered(
        &mut self,
        service: &ServiceHandle,
        characteristics: Vec<Characteristic>,
    ) -> Option<SessionNotice> {
        if !self.take_pending(service) {
            warn!("discarding stale characteristic discovery for {}", service.uuid);
            return None;
        }

        let uuids: Vec<Uuid> = characteristics.iter().map(|c| c.uuid).collect();
        for characteristic in characteristics {
            let Some(role) = registry::resolve(&characteristic.uuid) else {
                continue;
            };
            let handle = CharacteristicHandle::new(characteristic, service.uuid, self.epoch);
            let slot = match role {
                KnownCharacteristic::HeartRateMeasurement => &mut self.measurement,
                KnownCharacteristic::BodySensorLocation => &mut self.location,
                KnownCharacteristic::HeartRateControlPoint => &mut self.control_point,
                KnownCharacteristic::HeartRateService => continue,
            };
            debug!("found {} characteristic", role);
            *slot = Some(handle);
        }

        let ready = self.finish_discovery_step();
        Some(SessionNotice::CharacteristicsDiscovered {
            characteristics: uuids,
            ready,
        })
    }

    pub fn on_characteristic_discovery_failed(
        &mut self,
        service: &ServiceHandle,
        message: String,
    ) -> Option<SessionNotice> {
        if !self.take_pending(service) {
            return None;
        }
        error!("characteristic discovery failed on {}: {}", service.uuid, message);
        self.finish_discovery_step();
        Some(SessionNotice::TransportFailed {
            operation: "discover characteristics",
            message,
        })
    }

    pub async fn subscribe_measurement<R: Radio + ?Sized>(&self, radio: &R) -> Result<()> {
        let handle = self.usable(
            KnownCharacteristic::HeartRateMeasurement,
            CharacteristicHandle::is_notifiable,
        )?;
        radio.set_notify(handle, true).await
    }

    pub async fn read_location<R: Radio + ?Sized>(&self, radio: &R) -> Result<()> {
        let handle = self.usable(
            KnownCharacteristic::BodySensorLocation,
            CharacteristicHandle::is_readable,
        )?;
        radio.read_value(handle).await
    }

    pub async fn write_control_point<R: Radio + ?Sized>(
        &self,
        radio: &R,
        command: &[u8],
    ) -> Result<()> {
        let handle = self.usable(
            KnownCharacteristic::HeartRateControlPoint,
            CharacteristicHandle::is_writable,
        )?;
        radio
            .write_value(handle, command, CharacteristicWriteType::WriteWithResponse)
            .await
    }

    /// Ask the radio to drop the link. The session itself only changes on
    /// the disconnect event.
    pub async fn disconnect<R: Radio + ?Sized>(&self, radio: &R) -> Result<()> {
        let peripheral = self.peripheral.as_ref().ok_or(Error::NotConnected)?;
        radio.disconnect(&peripheral.id).await
    }

    pub fn on_value_updated(
        &mut self,
        characteristic: &CharacteristicHandle,
        value: &[u8],
    ) -> Option<SessionNotice> {
        if !self.is_live(characteristic) {
            warn!(
                "discarding value for stale characteristic {} (epoch {})",
                characteristic.uuid,
                characteristic.epoch.value()
            );
            return None;
        }

        match registry::resolve(&characteristic.uuid) {
            Some(KnownCharacteristic::HeartRateMeasurement) => match decode_measurement(value) {
                Ok(reading) => {
                    trace!("heart rate {} bpm", reading.bpm);
                    self.latest_reading = Some(reading);
                    Some(SessionNotice::HeartRate(reading))
                }
                Err(error) => Some(self.decode_failed(
                    KnownCharacteristic::HeartRateMeasurement,
                    error,
                    value,
                )),
            },
            Some(KnownCharacteristic::BodySensorLocation) => {
                match decoder::decode_body_sensor_location(value) {
                    Ok(location) => {
                        debug!("body sensor location {}", location);
                        self.latest_location = Some(location);
                        Some(SessionNotice::Location(location))
                    }
                    Err(error) => Some(self.decode_failed(
                        KnownCharacteristic::BodySensorLocation,
                        error,
                        value,
                    )),
                }
            }
            _ => {
                info!("characteristic {} not handled", characteristic.uuid);
                None
            }
        }
    }

    pub fn on_value_update_failed(
        &mut self,
        characteristic: &CharacteristicHandle,
        message: String,
    ) -> Option<SessionNotice> {
        if !self.is_live(characteristic) {
            return None;
        }
        error!("reading {} failed: {}", characteristic.uuid, message);
        Some(SessionNotice::TransportFailed {
            operation: "read",
            message,
        })
    }

    pub fn on_write_complete(
        &mut self,
        characteristic: &CharacteristicHandle,
        error: Option<String>,
    ) -> Option<SessionNotice> {
        if !self.is_live(characteristic) {
            return None;
        }
        match error {
            None => {
                debug!("write to {} acknowledged", characteristic.uuid);
                Some(SessionNotice::WriteAcknowledged)
            }
            Some(message) => {
                error!("writing {} failed: {}", characteristic.uuid, message);
                Some(SessionNotice::TransportFailed {
                    operation: "write",
                    message,
                })
            }
        }
    }

    /// Idempotent: a disconnect for anything but the current peripheral is
    /// ignored.
    pub fn on_disconnected(
        &mut self,
        peripheral: &PeripheralId,
        error: Option<String>,
    ) -> Option<SessionNotice> {
        if !self.is_current(peripheral) {
            debug!("ignoring disconnect of {}", peripheral);
            return None;
        }
        let handle = self.invalidate()?;
        info!("disconnected from {}: {:?}", handle, error);
        Some(SessionNotice::Disconnected {
            peripheral: handle,
            error,
        })
    }

    /// Abandon the connection if the current phase is past its deadline.
    pub async fn on_timeout<R: Radio + ?Sized>(
        &mut self,
        radio: &R,
        now: Instant,
    ) -> Result<Option<SessionNotice>> {
        let Some((at, phase)) = self.deadline else {
            return Ok(None);
        };
        if now < at {
            return Ok(None);
        }
        let Some(handle) = self.invalidate() else {
            return Ok(None);
        };
        warn!("timed out while {} with {}", phase, handle);
        radio.disconnect(&handle.id).await?;
        Ok(Some(SessionNotice::TimedOut(phase)))
    }

    fn is_current(&self, peripheral: &PeripheralId) -> bool {
        self.peripheral
            .as_ref()
            .is_some_and(|handle| &handle.id == peripheral)
    }

    fn is_live(&self, characteristic: &CharacteristicHandle) -> bool {
        self.state != GattState::Disconnected && characteristic.epoch == self.epoch
    }

    fn take_pending(&mut self, service: &ServiceHandle) -> bool {
        if service.epoch != self.epoch {
            return false;
        }
        match self.pending_services.iter().position(|pending| pending == service) {
            Some(index) => {
                self.pending_services.remove(index);
                true
            }
            None => false,
        }
    }

    /// Returns `true` once no service is waiting for characteristics and at
    /// least one profile characteristic is stored.
    fn finish_discovery_step(&mut self) -> bool {
        if !self.pending_services.is_empty() {
            self.state = GattState::CharacteristicsDiscovered;
            return false;
        }
        self.deadline = None;
        let any_stored =
            self.measurement.is_some() || self.location.is_some() || self.control_point.is_some();
        if any_stored {
            self.state = GattState::Ready;
            info!("session ready (epoch {})", self.epoch.value());
        } else {
            warn!("no heart rate characteristics found");
            self.state = GattState::ServicesDiscovered;
        }
        any_stored
    }

    fn usable(
        &self,
        role: KnownCharacteristic,
        capable: fn(&CharacteristicHandle) -> bool,
    ) -> Result<&CharacteristicHandle> {
        if self.state == GattState::Disconnected {
            return Err(Error::NotConnected);
        }
        let handle = self
            .characteristic(role)
            .filter(|handle| capable(handle))
            .ok_or(Error::CharacteristicUnavailable(role))?;
        if handle.epoch != self.epoch {
            return Err(Error::InvalidHandle);
        }
        Ok(handle)
    }

    fn decode_failed(
        &self,
        characteristic: KnownCharacteristic,
        error: DecodeError,
        value: &[u8],
    ) -> SessionNotice {
        warn!("could not decode {} from {:02x?}: {}", characteristic, value, error);
        SessionNotice::DecodeFailed {
            characteristic,
            error,
        }
    }

    fn arm(&mut self, timeout: Duration, phase: TimeoutPhase) {
        self.deadline = Some((Instant::now() + timeout, phase));
    }

    /// Drop every handle and move to a fresh epoch.
    fn invalidate(&mut self) -> Option<PeripheralHandle> {
        self.state = GattState::Disconnected;
        self.epoch = self.epoch.next();
        self.pending_services.clear();
        self.measurement = None;
        self.location = None;
        self.control_point = None;
        self.deadline = None;
        self.peripheral.take()
    }
}

#[cfg(not(feature = "sig-heart-rate"))]
fn decode_measurement(value: &[u8]) -> std::result::Result<HeartRateReading, DecodeError> {
    decoder::decode_heart_rate(value)
}

#[cfg(feature = "sig-heart-rate")]
fn decode_measurement(value: &[u8]) -> std::result::Result<HeartRateReading, DecodeError> {
    let measurement = decoder::decode_heart_rate_measurement(value)?;
    Ok(HeartRateReading {
        bpm: measurement.bpm,
        timestamp: Instant::now(),
    })
}
