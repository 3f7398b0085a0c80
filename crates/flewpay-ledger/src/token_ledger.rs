//! The value ledger of one deployed FlewPay token.
//!
//! `TokenLedger` is the single owner of balances, total supply and operating
//! mode. Every entry point validates fully before its first write, so a
//! failed call leaves the ledger byte-for-byte unchanged, and appends
//! exactly one record to the audit log after it commits.
//!
//! Components that move value (the custody bridge, the settlement engine)
//! receive `&mut TokenLedger` for the duration of a call. That exclusive
//! borrow is the ledger's mutual-exclusion boundary.

use std::collections::HashMap;

use flewpay_types::{
    AccountId, FlewpayError, LedgerConfig, LedgerEvent, OperatingMode, Result, Role, TokenAmount,
    constants,
};

use crate::{AccessControlRegistry, EventLog, StagedTransfers, SupplyConservation};

/// Balances, supply, mode and roles of one token.
#[derive(Debug, Clone)]
pub struct TokenLedger {
    address: AccountId,
    config: LedgerConfig,
    /// Non-zero balances only.
    balances: HashMap<AccountId, TokenAmount>,
    /// (owner, spender) → remaining allowance. Zero entries are dropped.
    allowances: HashMap<(AccountId, AccountId), TokenAmount>,
    total_supply: TokenAmount,
    mode: OperatingMode,
    access: AccessControlRegistry,
    supply: SupplyConservation,
    events: EventLog,
}

impl TokenLedger {
    /// Deploy a ledger at `address`.
    ///
    /// `initial_owner` receives `ADMIN`, `MINTER` and `PAUSER`; total supply
    /// starts at zero and the mode at `Active`.
    ///
    /// # Errors
    /// Returns `ZeroAddress` if `initial_owner` is the zero address.
    pub fn new(address: AccountId, initial_owner: AccountId, config: LedgerConfig) -> Result<Self> {
        if initial_owner.is_zero() {
            return Err(FlewpayError::ZeroAddress {
                param: "initial_owner",
            });
        }
        let (access, grants) = AccessControlRegistry::with_initial_roles(
            initial_owner,
            &[Role::Admin, Role::Minter, Role::Pauser],
        );
        let mut events = EventLog::new(address);
        for event in grants {
            events.append(event);
        }
        tracing::info!(
            ledger = %address,
            owner = %initial_owner,
            symbol = %config.symbol,
            pause_policy = ?config.pause_policy,
            "Token ledger deployed"
        );
        Ok(Self {
            address,
            config,
            balances: HashMap::new(),
            allowances: HashMap::new(),
            total_supply: TokenAmount::ZERO,
            mode: OperatingMode::Active,
            access,
            supply: SupplyConservation::new(),
            events,
        })
    }

    // ── Reads ──────────────────────────────────────────────────────────

    #[must_use]
    pub fn address(&self) -> AccountId {
        self.address
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.config.name
    }

    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.config.symbol
    }

    #[must_use]
    pub fn decimals(&self) -> u32 {
        constants::TOKEN_DECIMALS
    }

    #[must_use]
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    #[must_use]
    pub fn total_supply(&self) -> TokenAmount {
        self.total_supply
    }

    #[must_use]
    pub fn balance_of(&self, account: AccountId) -> TokenAmount {
        self.balances.get(&account).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn allowance(&self, owner: AccountId, spender: AccountId) -> TokenAmount {
        self.allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn mode(&self) -> OperatingMode {
        self.mode
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.mode.is_paused()
    }

    #[must_use]
    pub fn has_role(&self, role: Role, account: AccountId) -> bool {
        self.access.has_role(role, account)
    }

    #[must_use]
    pub fn access(&self) -> &AccessControlRegistry {
        &self.access
    }

    #[must_use]
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    #[must_use]
    pub fn supply_audit(&self) -> &SupplyConservation {
        &self.supply
    }

    /// Number of accounts holding a non-zero balance.
    #[must_use]
    pub fn holder_count(&self) -> usize {
        self.balances.len()
    }

    /// Check `minted - burned == total_supply == sum(balances)`.
    ///
    /// # Errors
    /// Returns `SupplyInvariantViolation` if any pair disagrees.
    pub fn verify_supply(&self) -> Result<()> {
        let sum = TokenAmount::checked_sum(self.balances.values().copied());
        self.supply.verify(self.total_supply, sum)
    }

    // ── Roles ──────────────────────────────────────────────────────────

    /// Grant `role` to `account`. Caller must hold `ADMIN`.
    ///
    /// # Errors
    /// Returns `Unauthorized` if `caller` lacks `ADMIN`.
    pub fn grant_role(&mut self, caller: AccountId, role: Role, account: AccountId) -> Result<()> {
        if let Some(event) = self.access.grant_role(caller, role, account)? {
            self.events.append(event);
        }
        Ok(())
    }

    /// Revoke `role` from `account`. Caller must hold `ADMIN`.
    ///
    /// # Errors
    /// Returns `Unauthorized` if `caller` lacks `ADMIN`.
    pub fn revoke_role(&mut self, caller: AccountId, role: Role, account: AccountId) -> Result<()> {
        if let Some(event) = self.access.revoke_role(caller, role, account)? {
            self.events.append(event);
        }
        Ok(())
    }

    /// Drop one of `caller`'s own roles.
    ///
    /// # Errors
    /// Returns `RenounceForOther` if `caller != account`.
    pub fn renounce_role(
        &mut self,
        caller: AccountId,
        role: Role,
        account: AccountId,
    ) -> Result<()> {
        if let Some(event) = self.access.renounce_role(caller, role, account)? {
            self.events.append(event);
        }
        Ok(())
    }

    // ── Supply ─────────────────────────────────────────────────────────

    /// Run every check `mint` performs without writing anything.
    ///
    /// The custody bridge calls this before pulling external funds so a
    /// mint that is bound to fail never locks an asset.
    ///
    /// # Errors
    /// `Unauthorized`, `InvalidAmount`, `OperationBlocked`, `ZeroAddress`
    /// or `Overflow`, in that order of precedence.
    pub fn validate_mint(&self, caller: AccountId, to: AccountId, amount: TokenAmount) -> Result<()> {
        self.access.ensure_role(Role::Minter, caller)?;
        if amount.is_zero() {
            return Err(FlewpayError::InvalidAmount {
                reason: "mint amount must be greater than zero".into(),
            });
        }
        if self.config.pause_policy.blocks_supply_changes() {
            self.ensure_active("mint")?;
        }
        if to.is_zero() {
            return Err(FlewpayError::ZeroAddress { param: "recipient" });
        }
        self.total_supply
            .checked_add(amount)
            .ok_or(FlewpayError::Overflow)?;
        Ok(())
    }

    /// Create `amount` new tokens in `to`'s balance. Caller must hold `MINTER`.
    ///
    /// # Errors
    /// See [`Self::validate_mint`].
    pub fn mint(&mut self, caller: AccountId, to: AccountId, amount: TokenAmount) -> Result<()> {
        self.validate_mint(caller, to, amount)?;
        let total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(FlewpayError::Overflow)?;
        // Bounded by total_supply, which did not overflow.
        let balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(FlewpayError::Overflow)?;

        self.total_supply = total_supply;
        self.set_balance(to, balance);
        self.supply.record_mint(amount);
        self.events.append(LedgerEvent::TokensMinted { to, amount });

        tracing::debug!(minter = %caller, to = %to, amount = %amount, "Tokens minted");
        self.debug_check_supply();
        Ok(())
    }

    /// Destroy `amount` of `caller`'s own tokens.
    ///
    /// # Errors
    /// - `OperationBlocked` if paused under `AllBalanceMutations`
    /// - `InsufficientBalance` if `amount` exceeds the caller's balance
    pub fn burn(&mut self, caller: AccountId, amount: TokenAmount) -> Result<()> {
        if self.config.pause_policy.blocks_supply_changes() {
            self.ensure_active("burn")?;
        }
        let available = self.balance_of(caller);
        let balance = available
            .checked_sub(amount)
            .ok_or(FlewpayError::InsufficientBalance {
                account: caller,
                needed: amount,
                available,
            })?;
        let total_supply = self
            .total_supply
            .checked_sub(amount)
            .ok_or_else(|| FlewpayError::Internal("burn exceeds total supply".into()))?;

        self.total_supply = total_supply;
        self.set_balance(caller, balance);
        self.supply.record_burn(amount);
        self.events.append(LedgerEvent::TokensBurned {
            from: caller,
            amount,
        });

        tracing::debug!(from = %caller, amount = %amount, "Tokens burned");
        self.debug_check_supply();
        Ok(())
    }

    // ── Movement ───────────────────────────────────────────────────────

    /// Move `amount` from `caller` to `to`.
    ///
    /// # Errors
    /// - `OperationBlocked` while paused
    /// - `InsufficientBalance` if `amount` exceeds the caller's balance
    /// - `ZeroAddress` if `to` is the zero address
    pub fn transfer(&mut self, caller: AccountId, to: AccountId, amount: TokenAmount) -> Result<()> {
        self.ensure_active("transfer")?;
        let (from_balance, to_balance) = self.plan_move(caller, to, amount)?;
        self.commit_move(caller, to, amount, from_balance, to_balance);
        Ok(())
    }

    /// Set `spender`'s allowance over `owner`'s balance to `amount`.
    ///
    /// Allowed while paused: it moves no value.
    ///
    /// # Errors
    /// Returns `ZeroAddress` if `spender` is the zero address.
    pub fn approve(
        &mut self,
        owner: AccountId,
        spender: AccountId,
        amount: TokenAmount,
    ) -> Result<()> {
        if spender.is_zero() {
            return Err(FlewpayError::ZeroAddress { param: "spender" });
        }
        if amount.is_zero() {
            self.allowances.remove(&(owner, spender));
        } else {
            self.allowances.insert((owner, spender), amount);
        }
        self.events.append(LedgerEvent::Approval {
            owner,
            spender,
            amount,
        });
        tracing::debug!(owner = %owner, spender = %spender, amount = %amount, "Allowance set");
        Ok(())
    }

    /// Move `amount` from `from` to `to` on behalf of `spender`, consuming
    /// allowance. An allowance of [`TokenAmount::MAX`] is never consumed.
    ///
    /// # Errors
    /// - `OperationBlocked` while paused
    /// - `InsufficientBalance` if `amount` exceeds `from`'s balance
    /// - `ZeroAddress` if `to` is the zero address
    /// - `InsufficientAllowance` if `spender` may not move `amount`
    pub fn transfer_from(
        &mut self,
        spender: AccountId,
        from: AccountId,
        to: AccountId,
        amount: TokenAmount,
    ) -> Result<()> {
        self.ensure_active("transfer_from")?;
        let (from_balance, to_balance) = self.plan_move(from, to, amount)?;
        let allowed = self.allowance(from, spender);
        let remaining = if allowed == TokenAmount::MAX {
            allowed
        } else {
            allowed
                .checked_sub(amount)
                .ok_or(FlewpayError::InsufficientAllowance {
                    owner: from,
                    spender,
                    needed: amount,
                    available: allowed,
                })?
        };

        if remaining.is_zero() {
            self.allowances.remove(&(from, spender));
        } else {
            self.allowances.insert((from, spender), remaining);
        }
        self.commit_move(from, to, amount, from_balance, to_balance);
        Ok(())
    }

    /// Start a sequence of `transfer_from` calls by `spender` that will be
    /// applied together by [`Self::commit_staged`].
    ///
    /// # Errors
    /// Returns `OperationBlocked` while paused.
    pub fn stage_transfers(&self, spender: AccountId) -> Result<StagedTransfers> {
        self.ensure_active("transfer_from")?;
        Ok(StagedTransfers::new(self.address, spender))
    }

    /// Apply every staged move, or none.
    ///
    /// The moves are replayed against the current state first, so anything
    /// that changed since staging is honoured. Costs scale with the number
    /// of moves, not with the ledger's size.
    ///
    /// # Errors
    /// - `OperationBlocked` while paused
    /// - `ConfigurationError` if `staged` belongs to another ledger
    /// - any error [`StagedTransfers::transfer_from`] returns on replay
    pub fn commit_staged(&mut self, staged: StagedTransfers) -> Result<()> {
        self.ensure_active("transfer_from")?;
        if staged.ledger != self.address {
            return Err(FlewpayError::ConfigurationError {
                component: "TokenLedger",
                reason: format!("transfers staged against {}", staged.ledger),
            });
        }
        let mut replay = StagedTransfers::new(self.address, staged.spender);
        for &(from, to, amount) in &staged.moves {
            replay.transfer_from(self, from, to, amount)?;
        }

        let spender = replay.spender;
        for (account, balance) in replay.balances {
            self.set_balance(account, balance);
        }
        for (owner, remaining) in replay.allowances {
            if remaining.is_zero() {
                self.allowances.remove(&(owner, spender));
            } else {
                self.allowances.insert((owner, spender), remaining);
            }
        }
        for (from, to, amount) in replay.moves {
            self.events.append(LedgerEvent::Transfer { from, to, amount });
            tracing::debug!(from = %from, to = %to, amount = %amount, "Tokens transferred");
        }
        self.debug_check_supply();
        Ok(())
    }

    // ── Operating mode ─────────────────────────────────────────────────

    /// Enter `Paused`. Caller must hold `PAUSER`.
    ///
    /// Emits `TokensPaused` even if already paused.
    ///
    /// # Errors
    /// Returns `Unauthorized` if `caller` lacks `PAUSER`.
    pub fn pause(&mut self, caller: AccountId) -> Result<()> {
        self.set_mode(caller, OperatingMode::Paused)
    }

    /// Return to `Active`. Caller must hold `PAUSER`.
    ///
    /// Emits `TokensUnpaused` even if already active.
    ///
    /// # Errors
    /// Returns `Unauthorized` if `caller` lacks `PAUSER`.
    pub fn unpause(&mut self, caller: AccountId) -> Result<()> {
        self.set_mode(caller, OperatingMode::Active)
    }

    fn set_mode(&mut self, caller: AccountId, mode: OperatingMode) -> Result<()> {
        self.access.ensure_role(Role::Pauser, caller)?;
        let previous = self.mode;
        self.mode = mode;
        let event = match mode {
            OperatingMode::Paused => LedgerEvent::TokensPaused { account: caller },
            OperatingMode::Active => LedgerEvent::TokensUnpaused { account: caller },
        };
        self.events.append(event);
        tracing::info!(account = %caller, from = %previous, to = %mode, "Operating mode set");
        Ok(())
    }

    // ── Internals ──────────────────────────────────────────────────────

    fn ensure_active(&self, operation: &'static str) -> Result<()> {
        if self.mode.is_paused() {
            return Err(FlewpayError::OperationBlocked {
                operation,
                mode: self.mode,
            });
        }
        Ok(())
    }

    /// Resulting `(from, to)` balances of a move, or the reason it cannot happen.
    fn plan_move(
        &self,
        from: AccountId,
        to: AccountId,
        amount: TokenAmount,
    ) -> Result<(TokenAmount, TokenAmount)> {
        let available = self.balance_of(from);
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
        if from == to {
            return Ok((available, available));
        }
        let to_balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(FlewpayError::Overflow)?;
        Ok((from_balance, to_balance))
    }

    fn commit_move(
        &mut self,
        from: AccountId,
        to: AccountId,
        amount: TokenAmount,
        from_balance: TokenAmount,
        to_balance: TokenAmount,
    ) {
        self.set_balance(from, from_balance);
        self.set_balance(to, to_balance);
        self.events.append(LedgerEvent::Transfer { from, to, amount });
        tracing::debug!(from = %from, to = %to, amount = %amount, "Tokens transferred");
        self.debug_check_supply();
    }

    fn set_balance(&mut self, account: AccountId, balance: TokenAmount) {
        if balance.is_zero() {
            self.balances.remove(&account);
        } else {
            self.balances.insert(account, balance);
        }
    }

    /// Lifetime tallies are left to [`Self::verify_supply`].
    fn debug_check_supply(&self) {
        debug_assert!(
            SupplyConservation::verify_balances(
                self.total_supply,
                TokenAmount::checked_sum(self.balances.values().copied()),
            )
            .is_ok(),
            "balances do not sum to total supply after commit"
        );
    }
}
