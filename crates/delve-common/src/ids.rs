//! ID types for agents and level objects.

use serde::{Deserialize, Serialize};

/// Agent handle. The owner of the agent list picks the raw values; the AI
/// only uses them to derive a stagger slot and a per-agent random seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(u64);

impl AgentId {
    /// Wraps a raw value.
    #[must_use]
    pub const fn from_raw(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Index of a decoration prop in a generated world's prop list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropId(u32);

impl PropId {
    /// Creates a prop ID from a raw value.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns the ID as a list index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}
