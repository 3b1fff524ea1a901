use std::fmt;

use uuid::Uuid;

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct PeripheralId(Uuid);

impl PeripheralId {
    pub fn new(uuid: Uuid) -> Self {
        PeripheralId(uuid)
    }

    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for PeripheralId {
    fn from(uuid: Uuid) -> Self {
        PeripheralId(uuid)
    }
}

impl fmt::Display for PeripheralId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A device seen while scanning: its identity and advertised name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PeripheralHandle {
    pub id: PeripheralId,
    pub name: String,
}

impl PeripheralHandle {
    pub fn new(id: PeripheralId, name: impl Into<String>) -> Self {
        PeripheralHandle {
            id,
            name: name.into(),
        }
    }
}

impl fmt::Display for PeripheralHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Connection generation counter.
///
/// Bumped whenever a connection starts or ends; handles from an older epoch
/// are stale.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Epoch(u64);

impl Epoch {
    pub fn next(self) -> Self {
        Epoch(self.0.wrapping_add(1))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}
