//! Heart Rate profile client core.
//!
//! Leaf first: [`registry`] names the profile UUIDs, [`decoder`] turns raw
//! values into readings, [`adapter`] tracks radio power, [`discovery`] picks
//! a peripheral and [`session`] drives one GATT connection.

pub mod adapter;
pub mod decoder;
pub mod discovery;
pub mod registry;
pub mod session;
