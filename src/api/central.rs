use async_trait::async_trait;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::{self, Receiver, Sender};
use uuid::Uuid;

use crate::Error;
use crate::Result;
use crate::api::characteristic::{CharacteristicHandle, CharacteristicWriteType};
use crate::api::peripheral::PeripheralId;
use crate::api::service::ServiceHandle;

/// Outbound half of the radio stack.
///
/// Every call is fire-and-observe: `Ok` only means the request was accepted.
/// Its outcome arrives later as a [`CentralEvent`](crate::api::central_event::CentralEvent).
#[async_trait]
pub trait Radio: Send + Sync {
    async fn start_scan(&self, filter: ScanFilter) -> Result<()>;

    async fn stop_scan(&self) -> Result<()>;

    async fn connect(&self, peripheral: &PeripheralId) -> Result<()>;

    async fn disconnect(&self, peripheral: &PeripheralId) -> Result<()>;

    async fn discover_services(&self, peripheral: &PeripheralId) -> Result<()>;

    async fn discover_characteristics(&self, service: &ServiceHandle) -> Result<()>;

    // enable or disable notifications
    async fn set_notify(&self, characteristic: &CharacteristicHandle, enabled: bool) -> Result<()>;

    async fn read_value(&self, characteristic: &CharacteristicHandle) -> Result<()>;

    async fn write_value(
        &self,
        characteristic: &CharacteristicHandle,
        data: &[u8],
        write_type: CharacteristicWriteType,
    ) -> Result<()>;
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ScanFilter {
    pub services: Vec<Uuid>,
}

impl ScanFilter {
    pub fn service(uuid: Uuid) -> Self {
        ScanFilter {
            services: vec![uuid],
        }
    }

    /// An empty filter matches every advertisement.
    pub fn matches(&self, advertised: &[Uuid]) -> bool {
        self.services.is_empty() || self.services.iter().any(|uuid| advertised.contains(uuid))
    }
}

/// A request for the radio stack, as queued by [`ChannelRadio`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RadioRequest {
    StartScanning {
        filter: ScanFilter,
    },
    StopScanning,
    ConnectDevice {
        peripheral: PeripheralId,
    },
    DisconnectDevice {
        peripheral: PeripheralId,
    },
    DiscoverServices {
        peripheral: PeripheralId,
    },
    DiscoverCharacteristics {
        service: ServiceHandle,
    },
    SetNotify {
        characteristic: CharacteristicHandle,
        enabled: bool,
    },
    ReadValue {
        characteristic: CharacteristicHandle,
    },
    WriteValue {
        characteristic: CharacteristicHandle,
        data: Vec<u8>,
        write_type: CharacteristicWriteType,
    },
}

/// A [`Radio`] that forwards every request over an mpsc channel.
///
/// The receiving end belongs to whatever drives the real radio (a platform
/// backend thread, or a test asserting on what was sent).
#[derive(Clone, Debug)]
pub struct ChannelRadio {
    manager_tx: Sender<RadioRequest>,
}

impl ChannelRadio {
    pub fn new(manager_tx: Sender<RadioRequest>) -> Self {
        ChannelRadio { manager_tx }
    }

    pub fn channel(buffer: usize) -> (Self, Receiver<RadioRequest>) {
        let (manager_tx, manager_rx) = mpsc::channel(buffer);
        (ChannelRadio::new(manager_tx), manager_rx)
    }

    /// Never waits. A full request queue is a transport error.
    fn send(&self, request: RadioRequest) -> Result<()> {
        log::trace!("radio request {:?}", request);
        self.manager_tx.try_send(request).map_err(|error| match error {
            TrySendError::Full(request) => {
                Error::transport("radio request", format!("queue full, dropped {:?}", request))
            }
            TrySendError::Closed(_) => Error::ChannelClosed,
        })
    }
}

#[async_trait]
impl Radio for ChannelRadio {
    async fn start_scan(&self, filter: ScanFilter) -> Result<()> {
        self.send(RadioRequest::StartScanning { filter })
    }

    async fn stop_scan(&self) -> Result<()> {
        self.send(RadioRequest::StopScanning)
    }

    async fn connect(&self, peripheral: &PeripheralId) -> Result<()> {
        self.send(RadioRequest::ConnectDevice {
            peripheral: *peripheral,
        })
    }

    async fn disconnect(&self, peripheral: &PeripheralId) -> Result<()> {
        self.send(RadioRequest::DisconnectDevice {
            peripheral: *peripheral,
        })
    }

    async fn discover_services(&self, peripheral: &PeripheralId) -> Result<()> {
        self.send(RadioRequest::DiscoverServices {
            peripheral: *peripheral,
        })
    }

    async fn discover_characteristics(&self, service: &ServiceHandle) -> Result<()> {
        self.send(RadioRequest::DiscoverCharacteristics {
            service: service.clone(),
        })
    }

    async fn set_notify(&self, characteristic: &CharacteristicHandle, enabled: bool) -> Result<()> {
        self.send(RadioRequest::SetNotify {
            characteristic: characteristic.clone(),
            enabled,
        })
    }

    async fn read_value(&self, characteristic: &CharacteristicHandle) -> Result<()> {
        self.send(RadioRequest::ReadValue {
            characteristic: characteristic.clone(),
        })
    }

    async fn write_value(
        &self,
        characteristic: &CharacteristicHandle,
        data: &[u8],
        write_type: CharacteristicWriteType,
    ) -> Result<()> {
        self.send(RadioRequest::WriteValue {
            characteristic: characteristic.clone(),
            data: data.to_vec(),
            write_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_matches_everything() {
        assert!(ScanFilter::default().matches(&[]));
        let filter = ScanFilter::service(Uuid::from_u128(1));
        assert!(filter.matches(&[Uuid::from_u128(2), Uuid::from_u128(1)]));
        assert!(!filter.matches(&[Uuid::from_u128(2)]));
    }

    #[tokio::test]
    async fn requests_are_forwarded_in_order() {
        let (radio, mut requests) = ChannelRadio::channel(4);
        let peripheral = PeripheralId::new(Uuid::from_u128(9));
        radio.connect(&peripheral).await.unwrap();
        radio.stop_scan().await.unwrap();

        assert_eq!(
            requests.recv().await,
            Some(RadioRequest::ConnectDevice { peripheral })
        );
        assert_eq!(requests.recv().await, Some(RadioRequest::StopScanning));
    }

    #[tokio::test]
    async fn full_queue_fails_without_waiting() {
        let (radio, mut requests) = ChannelRadio::channel(1);
        radio.stop_scan().await.unwrap();

        let result = radio.stop_scan().await;
        assert!(matches!(
            result,
            Err(Error::Transport {
                operation: "radio request",
                ..
            })
        ));
        assert_eq!(requests.recv().await, Some(RadioRequest::StopScanning));
    }

    #[tokio::test]
    async fn closed_channel_is_reported() {
        let (radio, requests) = ChannelRadio::channel(1);
        drop(requests);
        assert!(matches!(radio.stop_scan().await, Err(Error::ChannelClosed)));
    }
}
