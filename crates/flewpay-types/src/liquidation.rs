//! Settlement model: liquidation requests and their records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, LiquidationId, TokenAmount};

/// A request to liquidate part of a merchant's balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementRequest {
    pub merchant: AccountId,
    pub amount: TokenAmount,
}

impl SettlementRequest {
    #[must_use]
    pub fn new(merchant: AccountId, amount: TokenAmount) -> Self {
        Self { merchant, amount }
    }
}

/// The effect of one committed liquidation.
///
/// `amount` never exceeded the merchant's balance at the time of the call,
/// and the move left total supply unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidationRecord {
    pub id: LiquidationId,
    pub merchant: AccountId,
    pub company_wallet: AccountId,
    pub amount: TokenAmount,
    /// The account that initiated the liquidation.
    pub settled_by: AccountId,
    pub settled_at: DateTime<Utc>,
}
