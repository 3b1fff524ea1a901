use std::fmt;

use uuid::Uuid;

use crate::api::characteristic::{Characteristic, CharacteristicHandle};
use crate::api::peripheral::{PeripheralHandle, PeripheralId};
use crate::api::service::{Service, ServiceHandle};

/// Everything the radio stack reports back to the central.
///
/// Events are delivered on one ordered stream and consumed by a single
/// owner. Handles passed back here are the ones the central handed out in
/// its requests.
#[derive(Debug, Clone)]
pub enum CentralEvent {
    StateUpdate {
        state: CentralState,
    },
    DeviceDiscovered {
        peripheral: PeripheralHandle,
        services: Vec<Uuid>,
        rssi: i16,
    },
    DeviceConnected {
        peripheral: PeripheralId,
    },
    DeviceConnectionFailed {
        peripheral: PeripheralId,
        error: Option<String>,
    },
    ServicesDiscovered {
        peripheral: PeripheralId,
        services: Vec<Service>,
    },
    ServiceDiscoveryFailed {
        peripheral: PeripheralId,
        error: String,
    },
    CharacteristicsDiscovered {
        service: ServiceHandle,
        characteristics: Vec<Characteristic>,
    },
    CharacteristicDiscoveryFailed {
        service: ServiceHandle,
        error: String,
    },
    ValueUpdated {
        characteristic: CharacteristicHandle,
        value: Vec<u8>,
    },
    ValueUpdateFailed {
        characteristic: CharacteristicHandle,
        error: String,
    },
    WriteComplete {
        characteristic: CharacteristicHandle,
        error: Option<String>,
    },
    DeviceDisconnected {
        peripheral: PeripheralId,
        error: Option<String>,
    },
}

/// Power and availability of the local radio.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum CentralState {
    #[default]
    Unknown = 0,
    PoweredOn = 1,
    PoweredOff = 2,
    Resetting = 3,
    Unauthorized = 4,
    Unsupported = 5,
}

impl CentralState {
    pub fn is_powered_on(self) -> bool {
        self == CentralState::PoweredOn
    }

    /// Human readable description, shown as the client status.
    pub fn description(self) -> &'static str {
        match self {
            CentralState::PoweredOff => "Bluetooth is currently powered off.",
            CentralState::PoweredOn => "Bluetooth is currently powered on and available to use.",
            CentralState::Resetting => {
                "The connection with the system service was momentarily lost."
            }
            CentralState::Unauthorized => {
                "The application isn't authorized to use the Bluetooth low energy role."
            }
            CentralState::Unknown => "State is unknown.",
            CentralState::Unsupported => {
                "This device doesn't support the Bluetooth low energy central or client role."
            }
        }
    }
}

impl fmt::Display for CentralState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}
