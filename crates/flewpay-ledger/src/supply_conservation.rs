//! Supply conservation invariant checker.
//!
//! Invariant checked on demand:
//! ```text
//! Σ(minted) - Σ(burned) == total_supply == Σ(balances)
//! ```
//!
//! Transfers and liquidations move balance between accounts and never touch
//! either tally. Lifetime tallies may exceed `u128::MAX` (mint the cap, burn
//! it, mint again), so each one carries a count of whole `2^128` wraps.

use flewpay_types::{FlewpayError, Result, TokenAmount};

/// Lifetime total in base units: `carries * 2^128 + low`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    low: u128,
    carries: u64,
}

impl Tally {
    fn accumulate(&mut self, amount: u128) {
        let (low, carried) = self.low.overflowing_add(amount);
        self.low = low;
        if carried {
            self.carries = self.carries.wrapping_add(1);
        }
    }

    /// The total as an amount, or `None` once it has passed `u128::MAX`.
    #[must_use]
    pub fn as_amount(self) -> Option<TokenAmount> {
        (self.carries == 0).then(|| TokenAmount::from_base_units(self.low))
    }

    /// Number of times the total has wrapped past `u128::MAX`.
    #[must_use]
    pub fn carries(self) -> u64 {
        self.carries
    }

    /// `self - other` if the result fits an amount.
    fn checked_sub(self, other: Self) -> Option<u128> {
        let (low, borrow) = self.low.overflowing_sub(other.low);
        let high = self
            .carries
            .checked_sub(other.carries)?
            .checked_sub(u64::from(borrow))?;
        (high == 0).then_some(low)
    }
}

impl std::fmt::Display for Tally {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.carries == 0 {
            write!(f, "{}", TokenAmount::from_base_units(self.low))
        } else {
            write!(f, "{} base units + {} x 2^128", self.low, self.carries)
        }
    }
}

/// Cumulative mint/burn tally of one ledger since deployment.
#[derive(Debug, Clone, Default)]
pub struct SupplyConservation {
    minted: Tally,
    burned: Tally,
}

impl SupplyConservation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_mint(&mut self, amount: TokenAmount) {
        self.minted.accumulate(amount.base_units());
    }

    pub fn record_burn(&mut self, amount: TokenAmount) {
        self.burned.accumulate(amount.base_units());
    }

    /// Total ever minted.
    #[must_use]
    pub fn total_minted(&self) -> Tally {
        self.minted
    }

    /// Total ever burned.
    #[must_use]
    pub fn total_burned(&self) -> Tally {
        self.burned
    }

    /// `minted - burned`, or `None` if more was burned than minted or the
    /// difference does not fit an amount.
    #[must_use]
    pub fn expected_supply(&self) -> Option<TokenAmount> {
        self.minted
            .checked_sub(self.burned)
            .map(TokenAmount::from_base_units)
    }

    /// Check `total_supply == sum(balances)` without consulting the tallies.
    ///
    /// # Errors
    /// Returns [`FlewpayError::SupplyInvariantViolation`] if they disagree or
    /// the sum overflows.
    pub fn verify_balances(
        total_supply: TokenAmount,
        sum_of_balances: Option<TokenAmount>,
    ) -> Result<()> {
        match sum_of_balances {
            Some(sum) if sum == total_supply => Ok(()),
            Some(sum) => Err(FlewpayError::SupplyInvariantViolation {
                reason: format!("sum of balances {sum} != total supply {total_supply}"),
            }),
            None => Err(FlewpayError::SupplyInvariantViolation {
                reason: "sum of balances overflows".into(),
            }),
        }
    }

    /// Cross-check the tally against the ledger's recorded supply and the
    /// sum of its balances.
    ///
    /// # Errors
    /// Returns [`FlewpayError::SupplyInvariantViolation`] if any of the three
    /// disagree.
    pub fn verify(&self, total_supply: TokenAmount, sum_of_balances: Option<TokenAmount>) -> Result<()> {
        let Some(expected) = self.expected_supply() else {
            return Err(FlewpayError::SupplyInvariantViolation {
                reason: format!(
                    "minted {} - burned {} is not a valid supply",
                    self.minted, self.burned
                ),
            });
        };
        if total_supply != expected {
            return Err(FlewpayError::SupplyInvariantViolation {
                reason: format!(
                    "total supply {total_supply} != expected {expected} (minted={}, burned={})",
                    self.minted, self.burned,
                ),
            });
        }
        Self::verify_balances(total_supply, sum_of_balances)
    }
}
