//! Drives the client against an in-process pretend heart rate monitor.
//!
//! `RUST_LOG=hrcentral=debug cargo run --example heart_rate_monitor`

use std::time::Duration;

use hrcentral::api::central::{ChannelRadio, RadioRequest};
use hrcentral::api::central_event::{CentralEvent, CentralState};
use hrcentral::api::characteristic::{Characteristic, CharacteristicProperty};
use hrcentral::api::peripheral::{PeripheralHandle, PeripheralId};
use hrcentral::api::service::Service;
use hrcentral::config::{CONTROL_POINT_COMMAND_C9, EVENT_BUFFER};
use hrcentral::gatt::registry::{
    UUID_BODY_SENSOR_LOCATION, UUID_HEART_RATE_CONTROL_POINT, UUID_HEART_RATE_MEASUREMENT,
    UUID_HEART_RATE_SERVICE,
};
use hrcentral::gatt::session::GattState;
use hrcentral::{ClientConfig, HeartRateClient};
use log::LevelFilter;
use tokio::sync::mpsc::{self, Receiver, Sender};
use uuid::Uuid;

#[tokio::main]
async fn main() -> hrcentral::Result<()> {
    pretty_env_logger::formatted_builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let (radio, requests) = ChannelRadio::channel(EVENT_BUFFER);
    let (events_tx, events_rx) = mpsc::channel::<CentralEvent>(EVENT_BUFFER);
    tokio::spawn(pretend_monitor(requests, events_tx.clone()));

    let (client, _task) = HeartRateClient::new(radio, ClientConfig::default()).spawn(events_rx);
    let mut snapshots = client.watch();
    tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {
            let snapshot = snapshots.borrow_and_update().clone();
            log::info!(
                "{} | {} bpm | {}",
                snapshot.status,
                snapshot.heart_rate_bpm(),
                snapshot.body_sensor_location_label()
            );
        }
    });

    events_tx
        .send(CentralEvent::StateUpdate {
            state: CentralState::PoweredOn,
        })
        .await
        .map_err(|_| hrcentral::Error::ChannelClosed)?;
    client
        .wait_for(|snapshot| snapshot.adapter_state.is_powered_on())
        .await?;

    client.start_scanning().await?;
    client
        .wait_for(|snapshot| snapshot.connection == GattState::Ready)
        .await?;

    client.register_heart_rate_measurement().await?;
    client.read_body_sensor_location().await?;
    client
        .write_heart_rate_control_point(&CONTROL_POINT_COMMAND_C9)
        .await?;

    tokio::time::sleep(Duration::from_secs(3)).await;
    client.disconnect().await?;
    client
        .wait_for(|snapshot| snapshot.connection == GattState::Disconnected)
        .await?;
    Ok(())
}

/// Replies to radio requests and pushes a heart rate every 500 ms once
/// notifications are enabled.
async fn pretend_monitor(mut requests: Receiver<RadioRequest>, events: Sender<CentralEvent>) {
    let monitor =
        PeripheralHandle::new(PeripheralId::new(Uuid::from_u128(0xC0FFEE)), "Pretend HRM");
    while let Some(request) = requests.recv().await {
        let event = match request {
            RadioRequest::StartScanning { .. } => CentralEvent::DeviceDiscovered {
                peripheral: monitor.clone(),
                services: vec![UUID_HEART_RATE_SERVICE],
                rssi: -48,
            },
            RadioRequest::ConnectDevice { peripheral } => {
                CentralEvent::DeviceConnected { peripheral }
            }
            RadioRequest::DiscoverServices { peripheral } => CentralEvent::ServicesDiscovered {
                peripheral,
                services: vec![Service::new(1, UUID_HEART_RATE_SERVICE)],
            },
            RadioRequest::DiscoverCharacteristics { service } => {
                CentralEvent::CharacteristicsDiscovered {
                    service,
                    characteristics: vec![
                        Characteristic::new(
                            2,
                            UUID_HEART_RATE_MEASUREMENT,
                            vec![CharacteristicProperty::Notify],
                        ),
                        Characteristic::new(
                            4,
                            UUID_BODY_SENSOR_LOCATION,
                            vec![CharacteristicProperty::Read],
                        ),
                        Characteristic::new(
                            6,
                            UUID_HEART_RATE_CONTROL_POINT,
                            vec![CharacteristicProperty::Write],
                        ),
                    ],
                }
            }
            RadioRequest::SetNotify {
                characteristic,
                enabled: true,
            } => {
                let events = events.clone();
                tokio::spawn(async move {
                    for bpm in (60u16..).step_by(3).take(6) {
                        let value = bpm.to_be_bytes().to_vec();
                        let update = CentralEvent::ValueUpdated {
                            characteristic: characteristic.clone(),
                            value,
                        };
                        if events.send(update).await.is_err() {
                            break;
                        }
                        tokio::time::sleep(Duration::from_millis(500)).await;
                    }
                });
                continue;
            }
            RadioRequest::ReadValue { characteristic } => CentralEvent::ValueUpdated {
                characteristic,
                value: vec![1],
            },
            RadioRequest::WriteValue { characteristic, .. } => CentralEvent::WriteComplete {
                characteristic,
                error: None,
            },
            RadioRequest::DisconnectDevice { peripheral } => CentralEvent::DeviceDisconnected {
                peripheral,
                error: None,
            },
            RadioRequest::StopScanning | RadioRequest::SetNotify { .. } => continue,
        };
        if events.send(event).await.is_err() {
            break;
        }
    }
}
