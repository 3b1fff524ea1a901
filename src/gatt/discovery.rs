//! Scanning and selection of the peripheral to connect to.
//!
//! Single-candidate policy: the first advertisement that carries the filter
//! service wins and a connect request goes out right away. Later
//! advertisements are ignored until the next [`DiscoverySession::start`].

use log::{debug, info};
use uuid::Uuid;

use crate::Result;
use crate::api::central::{Radio, ScanFilter};
use crate::api::peripheral::PeripheralHandle;
use crate::gatt::adapter::Adapter;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DiscoveryState {
    #[default]
    Idle,
    Scanning(ScanFilter),
    Found(PeripheralHandle),
}

#[derive(Debug, Default)]
pub struct DiscoverySession {
    state: DiscoveryState,
}

impl DiscoverySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DiscoveryState {
        &self.state
    }

    /// Begin (or restart) scanning for peripherals advertising `service`.
    ///
    /// Safe to call mid-scan; any previously found peripheral is forgotten.
    pub async fn start<R: Radio + ?Sized>(
        &mut self,
        adapter: &Adapter,
        radio: &R,
        service: Uuid,
    ) -> Result<()> {
        adapter.ensure_powered_on()?;
        let filter = ScanFilter::service(service);
        radio.start_scan(filter.clone()).await?;
        info!("scanning for service {}", service);
        self.state = DiscoveryState::Scanning(filter);
        Ok(())
    }

    /// Handle an advertisement. Returns the selected peripheral when this
    /// advertisement is the first match, after its connect request was sent.
    pub async fn on_advertisement<R: Radio + ?Sized>(
        &mut self,
        adapter: &Adapter,
        radio: &R,
        peripheral: &PeripheralHandle,
        services: &[Uuid],
    ) -> Result<Option<PeripheralHandle>> {
        if let Err(error) = adapter.ensure_powered_on() {
            debug!("ignoring advertisement from {}: {}", peripheral, error);
            return Ok(None);
        }
        let DiscoveryState::Scanning(filter) = &self.state else {
            debug!("ignoring advertisement from {} while not scanning", peripheral);
            return Ok(None);
        };
        if filter.services.is_empty() || !filter.matches(services) {
            debug!("{} does not advertise {:?}", peripheral, filter.services);
            return Ok(None);
        }

        radio.connect(&peripheral.id).await?;
        info!("selected {}, connecting", peripheral);
        self.state = DiscoveryState::Found(peripheral.clone());
        Ok(Some(peripheral.clone()))
    }

    /// A connection was established; scanning is no longer needed.
    pub async fn on_connected<R: Radio + ?Sized>(&mut self, radio: &R) -> Result<()> {
        match self.state {
            DiscoveryState::Idle => Ok(()),
            _ => radio.stop_scan().await,
        }
    }

    /// Forget the selected peripheral.
    pub fn reset(&mut self) {
        self.state = DiscoveryState::Idle;
    }
}
