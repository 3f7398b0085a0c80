//! External asset collaborator.
//!
//! The bridge only needs three things from the asset it takes custody of:
//! read a balance, pull funds a depositor approved, and push funds back.
//! [`InMemoryAsset`] implements that surface in-process, with an optional
//! transfer fee and a failure switch so the bridge's crediting rules can be
//! exercised against a misbehaving asset.

use std::collections::HashMap;

use flewpay_types::{AccountId, FlewpayError, Result, TokenAmount};

/// Basis-point denominator for transfer fees.
const BPS_DENOMINATOR: u128 = 10_000;

/// Transfer-in surface of an asset held by the bridge.
pub trait ExternalAsset {
    /// Address the asset is deployed at.
    fn address(&self) -> AccountId;

    fn balance_of(&self, account: AccountId) -> TokenAmount;

    /// Move `amount` from `from` to `to`, consuming `spender`'s allowance.
    ///
    /// # Errors
    /// Returns `TransferFailed` if the movement did not complete.
    fn transfer_from(
        &mut self,
        spender: AccountId,
        from: AccountId,
        to: AccountId,
        amount: TokenAmount,
    ) -> Result<()>;

    /// Move `amount` from `from` to `to`.
    ///
    /// # Errors
    /// Returns `TransferFailed` if the movement did not complete.
    fn transfer(&mut self, from: AccountId, to: AccountId, amount: TokenAmount) -> Result<()>;

    /// What `to` would receive if `amount` left `from`, without moving
    /// anything. Assets without transfer fees deliver the full amount.
    fn quote_transfer(&self, _from: AccountId, _to: AccountId, amount: TokenAmount) -> TokenAmount {
        amount
    }
}

/// In-process fungible asset with allowances.
#[derive(Debug, Clone)]
pub struct InMemoryAsset {
    address: AccountId,
    symbol: String,
    balances: HashMap<AccountId, TokenAmount>,
    allowances: HashMap<(AccountId, AccountId), TokenAmount>,
    /// Taken from every transfer and destroyed. 0..=10_000.
    fee_bps: u32,
    fail_transfers: bool,
}

impl InMemoryAsset {
    #[must_use]
    pub fn new(address: AccountId, symbol: impl Into<String>) -> Self {
        Self {
            address,
            symbol: symbol.into(),
            balances: HashMap::new(),
            allowances: HashMap::new(),
            fee_bps: 0,
            fail_transfers: false,
        }
    }

    /// Charge `fee_bps` basis points on every transfer. Capped at 100%.
    #[must_use]
    pub fn with_transfer_fee(mut self, fee_bps: u32) -> Self {
        self.fee_bps = fee_bps.min(10_000);
        self
    }

    /// Make every subsequent transfer fail.
    pub fn set_fail_transfers(&mut self, fail: bool) {
        self.fail_transfers = fail;
    }

    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Faucet: credit `amount` to `account` out of thin air.
    ///
    /// # Errors
    /// Returns `Overflow` if the balance would exceed the representable maximum.
    pub fn mint_to(&mut self, account: AccountId, amount: TokenAmount) -> Result<()> {
        let balance = self
            .balance_of(account)
            .checked_add(amount)
            .ok_or(FlewpayError::Overflow)?;
        self.balances.insert(account, balance);
        tracing::debug!(asset = %self.symbol, to = %account, amount = %amount, "Asset minted");
        Ok(())
    }

    pub fn approve(&mut self, owner: AccountId, spender: AccountId, amount: TokenAmount) {
        self.allowances.insert((owner, spender), amount);
    }

    #[must_use]
    pub fn allowance(&self, owner: AccountId, spender: AccountId) -> TokenAmount {
        self.allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default()
    }

    fn fee_on(&self, amount: TokenAmount) -> TokenAmount {
        let units = amount.base_units();
        let bps = u128::from(self.fee_bps);
        TokenAmount::from_base_units(
            units / BPS_DENOMINATOR * bps + units % BPS_DENOMINATOR * bps / BPS_DENOMINATOR,
        )
    }

    fn move_funds(&mut self, from: AccountId, to: AccountId, amount: TokenAmount) -> Result<()> {
        if self.fail_transfers {
            return Err(FlewpayError::TransferFailed {
                reason: format!("{} transfer reverted", self.symbol),
            });
        }
        let available = self.balance_of(from);
        let from_balance = available
            .checked_sub(amount)
            .ok_or_else(|| FlewpayError::TransferFailed {
                reason: format!(
                    "{} transfer amount {amount} exceeds balance {available}",
                    self.symbol
                ),
            })?;
        let received = amount
            .checked_sub(self.fee_on(amount))
            .ok_or(FlewpayError::Overflow)?;
        let to_base = if from == to {
            from_balance
        } else {
            self.balance_of(to)
        };
        let to_balance = to_base.checked_add(received).ok_or(FlewpayError::Overflow)?;
        self.balances.insert(from, from_balance);
        self.balances.insert(to, to_balance);
        Ok(())
    }
}

impl ExternalAsset for InMemoryAsset {
    fn address(&self) -> AccountId {
        self.address
    }

    fn balance_of(&self, account: AccountId) -> TokenAmount {
        self.balances.get(&account).copied().unwrap_or_default()
    }

    fn transfer_from(
        &mut self,
        spender: AccountId,
        from: AccountId,
        to: AccountId,
        amount: TokenAmount,
    ) -> Result<()> {
        let allowed = self.allowance(from, spender);
        let remaining = allowed
            .checked_sub(amount)
            .ok_or_else(|| FlewpayError::TransferFailed {
                reason: format!(
                    "{} allowance {allowed} of {spender} over {from} is below {amount}",
                    self.symbol
                ),
            })?;
        self.move_funds(from, to, amount)?;
        self.allowances.insert((from, spender), remaining);
        Ok(())
    }

    fn transfer(&mut self, from: AccountId, to: AccountId, amount: TokenAmount) -> Result<()> {
        self.move_funds(from, to, amount)
    }

    fn quote_transfer(&self, _from: AccountId, _to: AccountId, amount: TokenAmount) -> TokenAmount {
        amount.checked_sub(self.fee_on(amount)).unwrap_or_default()
    }
}
