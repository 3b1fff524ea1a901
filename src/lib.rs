//! Central-role client for Bluetooth LE heart rate monitors.
//!
//! The radio itself stays outside this crate. Requests leave through the
//! [`Radio`](api::central::Radio) trait and results come back as
//! [`CentralEvent`](api::central_event::CentralEvent)s, which a
//! [`HeartRateClient`] applies in order.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod gatt;

pub use client::{ClientCommand, ClientHandle, ClientSnapshot, HeartRateClient};
pub use config::ClientConfig;
pub use error::{DecodeError, Error, Result};
