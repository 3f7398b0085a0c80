//! Staged `transfer_from` sequences.
//!
//! A [`StagedTransfers`] collects the moves one spender wants to make and
//! tracks only the balances and allowances those moves touch. Nothing is
//! written to the ledger until [`TokenLedger::commit_staged`] applies the
//! whole sequence, so a batch either lands in full or not at all.
//!
//! ```text
//! ledger.stage_transfers(spender) → staged.transfer_from(..)*
//!        → ledger.commit_staged(staged)
//! ```

use std::collections::HashMap;

use flewpay_types::{AccountId, FlewpayError, Result, TokenAmount};

use crate::TokenLedger;

/// Moves validated against a ledger but not yet applied to it.
#[derive(Debug, Clone)]
pub struct StagedTransfers {
    pub(crate) ledger: AccountId,
    pub(crate) spender: AccountId,
    /// Post-move balances of touched accounts.
    pub(crate) balances: HashMap<AccountId, TokenAmount>,
    /// Remaining allowance of `spender`, keyed by owner.
    pub(crate) allowances: HashMap<AccountId, TokenAmount>,
    pub(crate) moves: Vec<(AccountId, AccountId, TokenAmount)>,
}

impl StagedTransfers {
    pub(crate) fn new(ledger: AccountId, spender: AccountId) -> Self {
        Self {
            ledger,
            spender,
            balances: HashMap::new(),
            allowances: HashMap::new(),
            moves: Vec::new(),
        }
    }

    #[must_use]
    pub fn spender(&self) -> AccountId {
        self.spender
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// `account`'s balance as if every staged move had been applied.
    #[must_use]
    pub fn balance_of(&self, ledger: &TokenLedger, account: AccountId) -> TokenAmount {
        self.balances
            .get(&account)
            .copied()
            .unwrap_or_else(|| ledger.balance_of(account))
    }

    /// The spender's allowance over `owner` after every staged move.
    #[must_use]
    pub fn allowance(&self, ledger: &TokenLedger, owner: AccountId) -> TokenAmount {
        self.allowances
            .get(&owner)
            .copied()
            .unwrap_or_else(|| ledger.allowance(owner, self.spender))
    }

    /// Stage one `transfer_from` by the spender. Checks match
    /// [`TokenLedger::transfer_from`] and run in the same order.
    ///
    /// # Errors
    /// - `ConfigurationError` if `ledger` is not the one staged against
    /// - `InsufficientBalance` if `amount` exceeds `from`'s staged balance
    /// - `ZeroAddress` if `to` is the zero address
    /// - `Overflow` if `to`'s balance would overflow
    /// - `InsufficientAllowance` if the staged allowance is below `amount`
    pub fn transfer_from(
        &mut self,
        ledger: &TokenLedger,
        from: AccountId,
        to: AccountId,
        amount: TokenAmount,
    ) -> Result<()> {
        if ledger.address() != self.ledger {
            return Err(FlewpayError::ConfigurationError {
                component: "StagedTransfers",
                reason: format!(
                    "staged against {} but given ledger {}",
                    self.ledger,
                    ledger.address()
                ),
            });
        }
        let available = self.balance_of(ledger, from);
        let from_balance = available
            .checked_sub(amount)
            .ok_or(FlewpayError::InsufficientBalance {
                account: from,
                needed: amount,
                available,
            })?;
        if to.is_zero() {
            return Err(FlewpayError::ZeroAddress { param: "recipient" });
        }
        let to_balance = if from == to {
            available
        } else {
            self.balance_of(ledger, to)
                .checked_add(amount)
                .ok_or(FlewpayError::Overflow)?
        };
        let allowed = self.allowance(ledger, from);
        let remaining = if allowed == TokenAmount::MAX {
            allowed
        } else {
            allowed
                .checked_sub(amount)
                .ok_or(FlewpayError::InsufficientAllowance {
                    owner: from,
                    spender: self.spender,
                    needed: amount,
                    available: allowed,
                })?
        };

        if from != to {
            self.balances.insert(from, from_balance);
            self.balances.insert(to, to_balance);
        }
        self.allowances.insert(from, remaining);
        self.moves.push((from, to, amount));
        Ok(())
    }
}
