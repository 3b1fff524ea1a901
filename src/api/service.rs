use uuid::Uuid;

use crate::api::peripheral::{Epoch, PeripheralId};

/// A GATT service as reported by the radio stack.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Service {
    /// Attribute handle assigned by the radio stack.
    pub id: u64,
    pub uuid: Uuid,
    pub primary: bool,
}

impl Service {
    pub fn new(id: u64, uuid: Uuid) -> Self {
        Service {
            id,
            uuid,
            primary: true,
        }
    }
}

/// A service owned by a GATT session, valid for one connection epoch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceHandle {
    pub id: u64,
    pub uuid: Uuid,
    pub peripheral: PeripheralId,
    pub epoch: Epoch,
}

impl ServiceHandle {
    pub fn new(service: &Service, peripheral: PeripheralId, epoch: Epoch) -> Self {
        ServiceHandle {
            id: service.id,
            uuid: service.uuid,
            peripheral,
            epoch,
        }
    }
}
