//! Capabilities gating privileged operations.
//!
//! Each [`Role`] has a stable 32-byte [`RoleId`]: the admin role is all
//! zeroes, every other role is the SHA-256 of its `<NAME>_ROLE` label.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::FlewpayError;

/// A named capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Grants and revokes every role.
    Admin,
    /// May increase supply.
    Minter,
    /// May toggle the ledger's operating mode.
    Pauser,
    /// May liquidate merchant balances to the company wallet.
    Liquidator,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Minter, Role::Pauser, Role::Liquidator];

    /// Label hashed into the role identifier.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Admin => "DEFAULT_ADMIN_ROLE",
            Self::Minter => "MINTER_ROLE",
            Self::Pauser => "PAUSER_ROLE",
            Self::Liquidator => "LIQUIDATOR_ROLE",
        }
    }

    #[must_use]
    pub fn id(self) -> RoleId {
        match self {
            Self::Admin => RoleId([0u8; 32]),
            _ => RoleId(Sha256::digest(self.label().as_bytes()).into()),
        }
    }

    /// Reverse lookup of [`Role::id`].
    #[must_use]
    pub fn from_id(id: &RoleId) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.id() == *id)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Admin => write!(f, "ADMIN"),
            Self::Minter => write!(f, "MINTER"),
            Self::Pauser => write!(f, "PAUSER"),
            Self::Liquidator => write!(f, "LIQUIDATOR"),
        }
    }
}

impl FromStr for Role {
    type Err = FlewpayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|role| role.to_string() == upper || role.label() == upper)
            .ok_or_else(|| FlewpayError::Configuration(format!("unknown role {s:?}")))
    }
}

/// 32-byte role identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleId(pub [u8; 32]);

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}
