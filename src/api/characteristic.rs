use uuid::Uuid;

use crate::api::peripheral::Epoch;

/// A characteristic as reported by the radio stack during discovery.
#[derive(Debug, Ord, Eq, PartialEq, PartialOrd, Clone)]
pub struct Characteristic {
    /// Attribute handle assigned by the radio stack.
    pub id: u64,
    pub uuid: Uuid,
    pub properties: Vec<CharacteristicProperty>,
}

impl Characteristic {
    pub fn new(id: u64, uuid: Uuid, properties: Vec<CharacteristicProperty>) -> Self {
        Characteristic {
            id,
            uuid,
            properties,
        }
    }
}

impl Default for Characteristic {
    fn default() -> Self {
        Characteristic {
            id: 0,
            uuid: Uuid::nil(),
            properties: vec![
                CharacteristicProperty::Read,
                CharacteristicProperty::Write,
                CharacteristicProperty::Notify,
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialOrd, Ord, Eq, PartialEq, Hash)]
pub enum CharacteristicProperty {
    Broadcast,
    Read,
    WriteWithoutResponse,
    Write,
    AuthenticatedSignedWrites,
    Notify,
    NotifyEncryptionRequired,
    Indicate,
    IndicateEncryptionRequired,
    ExtendedProperties,
}

#[derive(Debug, Clone, Copy, PartialOrd, Ord, Eq, PartialEq)]
pub enum CharacteristicWriteType {
    WriteWithoutResponse,
    WriteWithResponse,
}

/// A characteristic owned by a GATT session.
///
/// Handles are stamped with the connection [`Epoch`] they were discovered in.
/// Once that connection ends the handle is stale, and any event that still
/// refers to it is discarded by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacteristicHandle {
    pub id: u64,
    pub uuid: Uuid,
    /// UUID of the parent service.
    pub service: Uuid,
    pub properties: Vec<CharacteristicProperty>,
    pub epoch: Epoch,
}

impl CharacteristicHandle {
    pub fn new(characteristic: Characteristic, service: Uuid, epoch: Epoch) -> Self {
        CharacteristicHandle {
            id: characteristic.id,
            uuid: characteristic.uuid,
            service,
            properties: characteristic.properties,
            epoch,
        }
    }

    fn has(&self, property: CharacteristicProperty) -> bool {
        self.properties.contains(&property)
    }

    pub fn is_readable(&self) -> bool {
        self.has(CharacteristicProperty::Read)
    }

    pub fn is_writable(&self) -> bool {
        self.has(CharacteristicProperty::Write)
            || self.has(CharacteristicProperty::WriteWithoutResponse)
    }

    pub fn is_notifiable(&self) -> bool {
        self.has(CharacteristicProperty::Notify) || self.has(CharacteristicProperty::Indicate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capabilities_follow_properties() {
        let handle = CharacteristicHandle::new(
            Characteristic::new(7, Uuid::nil(), vec![CharacteristicProperty::Indicate]),
            Uuid::nil(),
            Epoch::default(),
        );
        assert!(handle.is_notifiable());
        assert!(!handle.is_readable());
        assert!(!handle.is_writable());

        let default =
            CharacteristicHandle::new(Characteristic::default(), Uuid::nil(), Epoch::default());
        assert!(default.is_readable() && default.is_writable() && default.is_notifiable());
    }
}
