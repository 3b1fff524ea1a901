//! Well-known Heart Rate profile UUIDs.

use std::fmt;

use uuid::Uuid;

// https://www.bluetooth.com/specifications/assigned-numbers/
pub const UUID_HEART_RATE_SERVICE: Uuid = from_u16(0x180D);
pub const UUID_HEART_RATE_MEASUREMENT: Uuid = from_u16(0x2A37);
pub const UUID_BODY_SENSOR_LOCATION: Uuid = from_u16(0x2A38);
pub const UUID_HEART_RATE_CONTROL_POINT: Uuid = from_u16(0x2A39);

const BLUETOOTH_BASE_UUID: u128 = 0x00000000_0000_1000_8000_00805f9b34fb;

/// Expands a 16-bit assigned number onto the Bluetooth base UUID.
pub const fn from_u16(short: u16) -> Uuid {
    Uuid::from_u128(BLUETOOTH_BASE_UUID | ((short as u128) << 96))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownCharacteristic {
    HeartRateService,
    HeartRateMeasurement,
    BodySensorLocation,
    HeartRateControlPoint,
}

impl KnownCharacteristic {
    pub fn uuid(self) -> Uuid {
        match self {
            KnownCharacteristic::HeartRateService => UUID_HEART_RATE_SERVICE,
            KnownCharacteristic::HeartRateMeasurement => UUID_HEART_RATE_MEASUREMENT,
            KnownCharacteristic::BodySensorLocation => UUID_BODY_SENSOR_LOCATION,
            KnownCharacteristic::HeartRateControlPoint => UUID_HEART_RATE_CONTROL_POINT,
        }
    }
}

impl fmt::Display for KnownCharacteristic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KnownCharacteristic::HeartRateService => "Heart Rate Service",
            KnownCharacteristic::HeartRateMeasurement => "Heart Rate Measurement",
            KnownCharacteristic::BodySensorLocation => "Body Sensor Location",
            KnownCharacteristic::HeartRateControlPoint => "Heart Rate Control Point",
        };
        f.write_str(name)
    }
}

/// Unknown UUIDs resolve to `None`; callers ignore them.
pub fn resolve(uuid: &Uuid) -> Option<KnownCharacteristic> {
    match *uuid {
        UUID_HEART_RATE_SERVICE => Some(KnownCharacteristic::HeartRateService),
        UUID_HEART_RATE_MEASUREMENT => Some(KnownCharacteristic::HeartRateMeasurement),
        UUID_BODY_SENSOR_LOCATION => Some(KnownCharacteristic::BodySensorLocation),
        UUID_HEART_RATE_CONTROL_POINT => Some(KnownCharacteristic::HeartRateControlPoint),
        _ => None,
    }
}
