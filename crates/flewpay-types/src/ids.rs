//! Identifiers used throughout FlewPay.
//!
//! Accounts (external wallets and deployed components alike) are 20-byte
//! addresses rendered as `0x`-prefixed hex. Liquidations use UUIDv7 for
//! time-ordered sorting.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{FlewpayError, constants};

// ---------------------------------------------------------------------------
// AccountId
// ---------------------------------------------------------------------------

/// Identity key of an account: a wallet or a deployed component.
///
/// The all-zero address means "not set".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(pub [u8; constants::ADDRESS_LEN]);

impl AccountId {
    /// The unset address.
    pub const ZERO: Self = Self([0u8; constants::ADDRESS_LEN]);

    #[must_use]
    pub fn from_bytes(bytes: [u8; constants::ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; constants::ADDRESS_LEN] {
        &self.0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Deterministic address of a component deployed by `deployer`.
    ///
    /// The same `(deployer, nonce)` pair always yields the same address, so
    /// a deployment can be replayed and its addresses read back.
    #[must_use]
    pub fn derive_component(deployer: AccountId, nonce: u64) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(constants::COMPONENT_ADDRESS_DOMAIN);
        hasher.update(deployer.0);
        hasher.update(nonce.to_le_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; constants::ADDRESS_LEN];
        bytes.copy_from_slice(&hash[hash.len() - constants::ADDRESS_LEN..]);
        Self(bytes)
    }

    #[must_use]
    pub fn short(&self) -> String {
        format!("0x{}", hex::encode(&self.0[..4]))
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl AccountId {
    /// A random, non-zero address.
    #[must_use]
    pub fn random() -> Self {
        loop {
            let candidate = Self(rand::random::<[u8; constants::ADDRESS_LEN]>());
            if !candidate.is_zero() {
                return candidate;
            }
        }
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for AccountId {
    type Err = FlewpayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        let raw = hex::decode(digits).map_err(|e| FlewpayError::InvalidAddress {
            input: s.to_string(),
            reason: e.to_string(),
        })?;
        let bytes: [u8; constants::ADDRESS_LEN] =
            raw.try_into().map_err(|raw: Vec<u8>| FlewpayError::InvalidAddress {
                input: s.to_string(),
                reason: format!(
                    "expected {} bytes, got {}",
                    constants::ADDRESS_LEN,
                    raw.len()
                ),
            })?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for AccountId {
    type Error = FlewpayError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AccountId> for String {
    fn from(value: AccountId) -> Self {
        value.to_string()
    }
}

// ---------------------------------------------------------------------------
// LiquidationId
// ---------------------------------------------------------------------------

/// Unique identifier for a settled liquidation. Uses UUIDv7 for time-ordered sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct LiquidationId(pub Uuid);

impl LiquidationId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for LiquidationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LiquidationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "liq:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_prefixed_hex() {
        let id = AccountId([0xab; constants::ADDRESS_LEN]);
        let s = id.to_string();
        assert!(s.starts_with("0x"));
        assert_eq!(s.len(), 2 + 2 * constants::ADDRESS_LEN);
    }

    #[test]
    fn parse_roundtrips_display() {
        let id = AccountId::random();
        let back: AccountId = id.to_string().parse().unwrap();
        assert_eq!(id, back);
    }

    #[test]
    fn parse_accepts_checksummed_case() {
        let id: AccountId = "0x397AF893D1923ba982034f81b05aA60650dA97cC".parse().unwrap();
        assert_eq!(id.0[0], 0x39);
        assert_eq!(id.0[19], 0xcc);
    }

    #[test]
    fn parse_rejects_wrong_length() {
        let err = "0x1234".parse::<AccountId>().unwrap_err();
        assert!(matches!(err, FlewpayError::InvalidAddress { .. }));
    }

    #[test]
    fn parse_rejects_non_hex() {
        assert!("0xzz".parse::<AccountId>().is_err());
    }

    #[test]
    fn zero_address() {
        assert!(AccountId::ZERO.is_zero());
        assert!(!AccountId::random().is_zero());
    }

    #[test]
    fn derived_addresses_are_deterministic() {
        let deployer = AccountId([7u8; constants::ADDRESS_LEN]);
        let a = AccountId::derive_component(deployer, 0);
        let b = AccountId::derive_component(deployer, 0);
        let c = AccountId::derive_component(deployer, 1);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, deployer);
    }

    #[test]
    fn liquidation_id_ordering() {
        let a = LiquidationId::new();
        let b = LiquidationId::new();
        assert!(a < b);
    }

    #[test]
    fn serde_uses_hex_string() {
        let id = AccountId([1u8; constants::ADDRESS_LEN]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        let back: AccountId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
