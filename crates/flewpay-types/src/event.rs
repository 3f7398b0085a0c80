//! Audit log records.
//!
//! Every committed mutation appends exactly one [`LedgerEvent`] to the
//! emitting component's log. Nothing is written for an aborted operation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, LiquidationId, Role, TokenAmount};

/// Typed notification emitted by a component on successful commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum LedgerEvent {
    TokensMinted {
        to: AccountId,
        amount: TokenAmount,
    },
    TokensBurned {
        from: AccountId,
        amount: TokenAmount,
    },
    TokensPaused {
        account: AccountId,
    },
    TokensUnpaused {
        account: AccountId,
    },
    RoleGranted {
        role: Role,
        account: AccountId,
        sender: AccountId,
    },
    RoleRevoked {
        role: Role,
        account: AccountId,
        sender: AccountId,
    },
    Transfer {
        from: AccountId,
        to: AccountId,
        amount: TokenAmount,
    },
    Approval {
        owner: AccountId,
        spender: AccountId,
        amount: TokenAmount,
    },
    BridgeDeposited {
        depositor: AccountId,
        amount: TokenAmount,
    },
    LiquidationSettled {
        liquidation_id: LiquidationId,
        merchant: AccountId,
        company_wallet: AccountId,
        amount: TokenAmount,
    },
}

impl LedgerEvent {
    /// Event name as it appears in the audit log.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::TokensMinted { .. } => "TokensMinted",
            Self::TokensBurned { .. } => "TokensBurned",
            Self::TokensPaused { .. } => "TokensPaused",
            Self::TokensUnpaused { .. } => "TokensUnpaused",
            Self::RoleGranted { .. } => "RoleGranted",
            Self::RoleRevoked { .. } => "RoleRevoked",
            Self::Transfer { .. } => "Transfer",
            Self::Approval { .. } => "Approval",
            Self::BridgeDeposited { .. } => "BridgeDeposited",
            Self::LiquidationSettled { .. } => "LiquidationSettled",
        }
    }
}

/// A log entry: the event plus its position in the emitter's log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Zero-based, gap-free position in the emitter's log.
    pub sequence: u64,
    /// Address of the component that emitted the event.
    pub emitter: AccountId,
    pub event: LedgerEvent,
    pub recorded_at: DateTime<Utc>,
}
