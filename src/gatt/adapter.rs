use log::info;

use crate::Error;
use crate::Result;
use crate::api::central_event::CentralState;

/// Last power state reported by the radio stack. Read-only to the core.
#[derive(Debug, Default, Clone)]
pub struct Adapter {
    state: CentralState,
}

impl Adapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CentralState {
        self.state
    }

    /// Record a transition. Returns `true` if the state changed.
    pub fn update(&mut self, state: CentralState) -> bool {
        if self.state == state {
            return false;
        }
        info!("adapter state {:?} -> {:?}", self.state, state);
        self.state = state;
        true
    }

    pub fn ensure_powered_on(&self) -> Result<()> {
        if self.state.is_powered_on() {
            Ok(())
        } else {
            Err(Error::RadioUnavailable(self.state))
        }
    }
}
