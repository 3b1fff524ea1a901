//! Client configuration and the constants it defaults to.

use std::time::Duration;

use uuid::Uuid;

use crate::gatt::registry::UUID_HEART_RATE_SERVICE;

/// How long a connect request may stay unanswered.
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// How long service and characteristic discovery may take once connected.
pub const DISCOVERY_TIMEOUT_SECS: u64 = 10;

/// Capacity of the event, request and command channels.
pub const EVENT_BUFFER: usize = 256;

/// Control point command written by the "Write 0xC9" action.
pub const CONTROL_POINT_COMMAND_C9: [u8; 1] = [0xC9];

/// Two byte control point command written by the "Write 0xBEEF" action.
pub const CONTROL_POINT_COMMAND_BEEF: [u8; 2] = [0xBE, 0xEF];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Service an advertisement must carry to be selected.
    pub service_filter: Uuid,
    pub connect_timeout: Duration,
    pub discovery_timeout: Duration,
    pub event_buffer: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            service_filter: UUID_HEART_RATE_SERVICE,
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            discovery_timeout: Duration::from_secs(DISCOVERY_TIMEOUT_SECS),
            event_buffer: EVENT_BUFFER,
        }
    }
}

impl ClientConfig {
    pub fn with_service_filter(mut self, service: Uuid) -> Self {
        self.service_filter = service;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_discovery_timeout(mut self, timeout: Duration) -> Self {
        self.discovery_timeout = timeout;
        self
    }

    pub fn with_event_buffer(mut self, event_buffer: usize) -> Self {
        self.event_buffer = event_buffer.max(1);
        self
    }
}
