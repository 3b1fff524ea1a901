//! Decoding of Heart Rate profile characteristic values.
//!
//! The default heart-rate path reads the first two bytes as a big-endian
//! `u16`, which is what the paired sensors actually send. The flags-based
//! encoding from the Heart Rate Service profile is available behind the
//! `sig-heart-rate` feature.

use std::fmt;

use tokio::time::Instant;

use crate::error::DecodeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartRateReading {
    pub bpm: u16,
    /// When the notification was received.
    pub timestamp: Instant,
}

/// Decode a heart rate notification, stamped with the current instant.
pub fn decode_heart_rate(bytes: &[u8]) -> Result<HeartRateReading, DecodeError> {
    decode_heart_rate_at(bytes, Instant::now())
}

pub fn decode_heart_rate_at(
    bytes: &[u8],
    timestamp: Instant,
) -> Result<HeartRateReading, DecodeError> {
    match bytes {
        [hi, lo, ..] => Ok(HeartRateReading {
            bpm: u16::from_be_bytes([*hi, *lo]),
            timestamp,
        }),
        _ => Err(DecodeError::TooShort {
            expected: 2,
            actual: bytes.len(),
        }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorLocation {
    Other,
    Chest,
    Wrist,
    Finger,
    Hand,
    EarLobe,
    Foot,
    /// Values 7..=255.
    Reserved(u8),
}

impl From<u8> for SensorLocation {
    fn from(value: u8) -> Self {
        match value {
            0 => SensorLocation::Other,
            1 => SensorLocation::Chest,
            2 => SensorLocation::Wrist,
            3 => SensorLocation::Finger,
            4 => SensorLocation::Hand,
            5 => SensorLocation::EarLobe,
            6 => SensorLocation::Foot,
            reserved => SensorLocation::Reserved(reserved),
        }
    }
}

impl fmt::Display for SensorLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SensorLocation::Other => "Other",
            SensorLocation::Chest => "Chest",
            SensorLocation::Wrist => "Wrist",
            SensorLocation::Finger => "Finger",
            SensorLocation::Hand => "Hand",
            SensorLocation::EarLobe => "Ear Lobe",
            SensorLocation::Foot => "Foot",
            SensorLocation::Reserved(_) => "Reserved for future use",
        };
        f.write_str(name)
    }
}

/// Only the first byte is significant. An empty read is
/// [`DecodeError::Empty`], never `Reserved`.
pub fn decode_body_sensor_location(bytes: &[u8]) -> Result<SensorLocation, DecodeError> {
    bytes
        .first()
        .map(|byte| SensorLocation::from(*byte))
        .ok_or(DecodeError::Empty)
}

#[cfg(feature = "sig-heart-rate")]
pub use sig::{HeartRateMeasurement, decode_heart_rate_measurement};

#[cfg(feature = "sig-heart-rate")]
mod sig {
    use crate::error::DecodeError;

    const FLAG_RATE_U16: u8 = 1 << 0;
    const FLAG_CONTACT_DETECTED: u8 = 1 << 1;
    const FLAG_CONTACT_SUPPORTED: u8 = 1 << 2;
    const FLAG_ENERGY_EXPENDED: u8 = 1 << 3;
    const FLAG_RR_INTERVAL: u8 = 1 << 4;

    /// A Heart Rate Measurement decoded per the Heart Rate Service profile.
    #[derive(Debug, Clone, PartialEq, Eq, Default)]
    pub struct HeartRateMeasurement {
        pub bpm: u16,
        /// `None` when the sensor does not support contact detection.
        pub sensor_contact: Option<bool>,
        /// Kilojoules.
        pub energy_expended: Option<u16>,
        /// In units of 1/1024 s.
        pub rr_intervals: Vec<u16>,
    }

    pub fn decode_heart_rate_measurement(
        bytes: &[u8],
    ) -> Result<HeartRateMeasurement, DecodeError> {
        let (&flags, mut rest) = bytes.split_first().ok_or(DecodeError::TooShort {
            expected: 2,
            actual: 0,
        })?;

        let bpm = if flags & FLAG_RATE_U16 != 0 {
            take_u16(&mut rest).ok_or(DecodeError::TooShort {
                expected: 3,
                actual: bytes.len(),
            })?
        } else {
            let (&value, tail) = rest.split_first().ok_or(DecodeError::TooShort {
                expected: 2,
                actual: bytes.len(),
            })?;
            rest = tail;
            u16::from(value)
        };

        let sensor_contact =
            (flags & FLAG_CONTACT_SUPPORTED != 0).then_some(flags & FLAG_CONTACT_DETECTED != 0);

        let energy_expended = if flags & FLAG_ENERGY_EXPENDED != 0 {
            Some(take_u16(&mut rest).ok_or(DecodeError::Malformed("truncated energy expended"))?)
        } else {
            None
        };

        let mut rr_intervals = Vec::new();
        if flags & FLAG_RR_INTERVAL != 0 {
            if rest.len() % 2 != 0 {
                return Err(DecodeError::Malformed("odd RR interval length"));
            }
            while let Some(rr) = take_u16(&mut rest) {
                rr_intervals.push(rr);
            }
        }

        Ok(HeartRateMeasurement {
            bpm,
            sensor_contact,
            energy_expended,
            rr_intervals,
        })
    }

    fn take_u16(bytes: &mut &[u8]) -> Option<u16> {
        let slice: &[u8] = *bytes;
        match slice {
            [lo, hi, tail @ ..] => {
                *bytes = tail;
                let (lo, hi) = (*lo, *hi);
                Some(u16::from_le_bytes([lo, hi]))
            }
            _ => None,
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn eight_bit_rate() {
            let measurement = decode_heart_rate_measurement(&[0x00, 72]).unwrap();
            assert_eq!(measurement.bpm, 72);
            assert_eq!(measurement.sensor_contact, None);
        }

        #[test]
        fn sixteen_bit_rate_with_extras() {
            // u16 rate, contact supported + detected, energy, two RR intervals
            let bytes = [0x1F, 0x2C, 0x01, 0x10, 0x00, 0x00, 0x04, 0x02, 0x04];
            let measurement = decode_heart_rate_measurement(&bytes).unwrap();
            assert_eq!(measurement.bpm, 300);
            assert_eq!(measurement.sensor_contact, Some(true));
            assert_eq!(measurement.energy_expended, Some(16));
            assert_eq!(measurement.rr_intervals, vec![1024, 1026]);
        }

        #[test]
        fn truncated_payloads() {
            assert!(decode_heart_rate_measurement(&[]).is_err());
            assert!(decode_heart_rate_measurement(&[0x01, 0x2C]).is_err());
            assert_eq!(
                decode_heart_rate_measurement(&[0x10, 60, 0x01]),
                Err(DecodeError::Malformed("odd RR interval length"))
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heart_rate_is_big_endian() {
        for bytes in [[0x00, 0x4B], [0x01, 0x00], [0xFF, 0xFF], [0x12, 0x34]] {
            let reading = decode_heart_rate(&bytes).unwrap();
            assert_eq!(reading.bpm, (u16::from(bytes[0]) << 8) | u16::from(bytes[1]));
        }
    }

    #[test]
    fn heart_rate_ignores_trailing_bytes() {
        assert_eq!(decode_heart_rate(&[0x00, 0x50, 0xAA]).unwrap().bpm, 80);
    }

    #[test]
    fn heart_rate_too_short() {
        assert_eq!(
            decode_heart_rate(&[]),
            Err(DecodeError::TooShort {
                expected: 2,
                actual: 0
            })
        );
        assert_eq!(
            decode_heart_rate(&[0x4B]),
            Err(DecodeError::TooShort {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn body_sensor_location_table() {
        let expected = [
            SensorLocation::Other,
            SensorLocation::Chest,
            SensorLocation::Wrist,
            SensorLocation::Finger,
            SensorLocation::Hand,
            SensorLocation::EarLobe,
            SensorLocation::Foot,
        ];
        for (byte, location) in expected.into_iter().enumerate() {
            assert_eq!(decode_body_sensor_location(&[byte as u8]), Ok(location));
        }
    }

    #[test]
    fn body_sensor_location_reserved_range() {
        for byte in 7..=u8::MAX {
            assert_eq!(
                decode_body_sensor_location(&[byte]),
                Ok(SensorLocation::Reserved(byte))
            );
        }
        assert_eq!(SensorLocation::Reserved(9).to_string(), "Reserved for future use");
    }

    #[test]
    fn body_sensor_location_empty() {
        assert_eq!(decode_body_sensor_location(&[]), Err(DecodeError::Empty));
    }
}
