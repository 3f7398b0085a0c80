//! Ledger operating mode.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The two operating modes of a ledger. Toggled only by `PAUSER` holders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperatingMode {
    /// Transfers are permitted. Initial mode.
    #[default]
    Active,
    /// Peer-to-peer transfers are blocked.
    Paused,
}

impl OperatingMode {
    #[must_use]
    pub fn is_paused(self) -> bool {
        self == Self::Paused
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Paused => write!(f, "PAUSED"),
        }
    }
}
