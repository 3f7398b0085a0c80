//! Settlement engine.
//!
//! Single liquidations go straight through the ledger's allowance path.
//! Batches are staged on a copy of the ledger and swapped in only when
//! every request succeeded, so a batch commits whole or not at all.

use chrono::Utc;
use flewpay_ledger::{AccessControlRegistry, EventLog, TokenLedger};
use flewpay_types::{
    AccountId, FlewpayError, LedgerEvent, LiquidationId, LiquidationRecord, Result, Role,
    SettlementConfig, SettlementRequest, TokenAmount,
};

/// Roles allowed to initiate a liquidation. The first is named in errors.
const SETTLE_ROLES: [Role; 2] = [Role::Liquidator, Role::Admin];

/// Liquidates merchant balances to the company wallet.
#[derive(Debug, Clone)]
pub struct SettlementEngine {
    address: AccountId,
    ledger: AccountId,
    company_wallet: AccountId,
    access: AccessControlRegistry,
    config: SettlementConfig,
    events: EventLog,
}

impl SettlementEngine {
    /// Deploy an engine at `address`.
    ///
    /// `deployer` receives `ADMIN` and `LIQUIDATOR` in the engine's registry.
    /// Unset (zero) ledger or wallet addresses are rejected on first use.
    #[must_use]
    pub fn new(
        address: AccountId,
        deployer: AccountId,
        ledger: AccountId,
        company_wallet: AccountId,
        config: SettlementConfig,
    ) -> Self {
        let (access, grants) =
            AccessControlRegistry::with_initial_roles(deployer, &[Role::Admin, Role::Liquidator]);
        let mut events = EventLog::new(address);
        for event in grants {
            events.append(event);
        }
        tracing::info!(
            engine = %address,
            ledger = %ledger,
            company_wallet = %company_wallet,
            max_batch_size = config.max_batch_size,
            "Settlement engine deployed"
        );
        Self {
            address,
            ledger,
            company_wallet,
            access,
            config,
            events,
        }
    }

    #[must_use]
    pub fn address(&self) -> AccountId {
        self.address
    }

    #[must_use]
    pub fn ledger(&self) -> AccountId {
        self.ledger
    }

    #[must_use]
    pub fn company_wallet(&self) -> AccountId {
        self.company_wallet
    }

    #[must_use]
    pub fn config(&self) -> &SettlementConfig {
        &self.config
    }

    #[must_use]
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    #[must_use]
    pub fn has_role(&self, role: Role, account: AccountId) -> bool {
        self.access.has_role(role, account)
    }

    /// Sum of every liquidation this engine has settled.
    #[must_use]
    pub fn total_liquidated(&self) -> TokenAmount {
        self.events
            .named("LiquidationSettled")
            .filter_map(|event| match event {
                LedgerEvent::LiquidationSettled { amount, .. } => Some(*amount),
                _ => None,
            })
            .fold(TokenAmount::ZERO, TokenAmount::saturating_add)
    }

    // ── Roles ──────────────────────────────────────────────────────────

    /// # Errors
    /// Returns `Unauthorized` if `caller` lacks `ADMIN`.
    pub fn grant_role(&mut self, caller: AccountId, role: Role, account: AccountId) -> Result<()> {
        if let Some(event) = self.access.grant_role(caller, role, account)? {
            self.events.append(event);
        }
        Ok(())
    }

    /// # Errors
    /// Returns `Unauthorized` if `caller` lacks `ADMIN`.
    pub fn revoke_role(&mut self, caller: AccountId, role: Role, account: AccountId) -> Result<()> {
        if let Some(event) = self.access.revoke_role(caller, role, account)? {
            self.events.append(event);
        }
        Ok(())
    }

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

    // ── Liquidation ────────────────────────────────────────────────────

    /// Move `amount` of `merchant`'s ledger balance to the company wallet.
    ///
    /// The merchant must have approved the engine's address on the ledger.
    ///
    /// # Errors
    /// - `ConfigurationError` if the ledger or company wallet is unset or
    ///   the ledger passed in is not the configured one
    /// - `Unauthorized` if `caller` holds neither `LIQUIDATOR` nor `ADMIN`
    /// - `OperationBlocked` while the ledger is paused
    /// - `InsufficientBalance` if `amount` is zero or exceeds the balance
    /// - `InsufficientAllowance` if the merchant has not approved enough
    pub fn settle(
        &mut self,
        ledger: &mut TokenLedger,
        caller: AccountId,
        merchant: AccountId,
        amount: TokenAmount,
    ) -> Result<LiquidationRecord> {
        self.ensure_wired(ledger)?;
        self.access.ensure_any_role(&SETTLE_ROLES, caller)?;
        let record = self.execute(ledger, caller, merchant, amount)?;
        self.commit(&record);
        Ok(record)
    }

    /// Liquidate `merchant`'s entire balance.
    ///
    /// # Errors
    /// As [`Self::settle`]; an empty balance is `InsufficientBalance`.
    pub fn settle_all(
        &mut self,
        ledger: &mut TokenLedger,
        caller: AccountId,
        merchant: AccountId,
    ) -> Result<LiquidationRecord> {
        let amount = ledger.balance_of(merchant);
        self.settle(ledger, caller, merchant, amount)
    }

    /// Liquidate every request, or none of them.
    ///
    /// Requests run in order, so several requests for one merchant draw on
    /// the same balance and allowance.
    ///
    /// # Errors
    /// - `InvalidBatch` if `requests` is empty or exceeds `max_batch_size`
    /// - any error [`Self::settle`] returns, for the first failing request
    pub fn settle_batch(
        &mut self,
        ledger: &mut TokenLedger,
        caller: AccountId,
        requests: &[SettlementRequest],
    ) -> Result<Vec<LiquidationRecord>> {
        self.ensure_wired(ledger)?;
        self.access.ensure_any_role(&SETTLE_ROLES, caller)?;
        if requests.is_empty() {
            return Err(FlewpayError::InvalidBatch {
                reason: "batch has no requests".into(),
            });
        }
        if requests.len() > self.config.max_batch_size {
            return Err(FlewpayError::InvalidBatch {
                reason: format!(
                    "batch of {} exceeds limit {}",
                    requests.len(),
                    self.config.max_batch_size
                ),
            });
        }

        Self::ensure_unpaused(ledger)?;
        let mut staged = ledger.stage_transfers(self.address)?;
        let mut records = Vec::with_capacity(requests.len());
        for req in requests {
            let available = staged.balance_of(ledger, req.merchant);
            Self::ensure_settleable(req.merchant, req.amount, available)?;
            staged.transfer_from(ledger, req.merchant, self.company_wallet, req.amount)?;
            records.push(self.record(caller, req.merchant, req.amount));
        }

        ledger.commit_staged(staged)?;
        for record in &records {
            self.commit(record);
        }
        tracing::info!(
            settled_by = %caller,
            count = records.len(),
            "Settlement batch committed"
        );
        Ok(records)
    }

    fn ensure_wired(&self, ledger: &TokenLedger) -> Result<()> {
        let misconfigured = |reason: String| FlewpayError::ConfigurationError {
            component: "SettlementEngine",
            reason,
        };
        if self.ledger.is_zero() {
            return Err(misconfigured("ledger address not set".into()));
        }
        if self.company_wallet.is_zero() {
            return Err(misconfigured("company wallet address not set".into()));
        }
        if ledger.address() != self.ledger {
            return Err(misconfigured(format!(
                "ledger {} is not the configured ledger {}",
                ledger.address(),
                self.ledger
            )));
        }
        Ok(())
    }

    /// Validate and move one liquidation on `ledger`. Writes nothing to
    /// the engine itself.
    fn execute(
        &self,
        ledger: &mut TokenLedger,
        caller: AccountId,
        merchant: AccountId,
        amount: TokenAmount,
    ) -> Result<LiquidationRecord> {
        Self::ensure_unpaused(ledger)?;
        Self::ensure_settleable(merchant, amount, ledger.balance_of(merchant))?;
        ledger.transfer_from(self.address, merchant, self.company_wallet, amount)?;
        Ok(self.record(caller, merchant, amount))
    }

    fn ensure_unpaused(ledger: &TokenLedger) -> Result<()> {
        if ledger.is_paused() {
            return Err(FlewpayError::OperationBlocked {
                operation: "settle",
                mode: ledger.mode(),
            });
        }
        Ok(())
    }

    fn ensure_settleable(
        merchant: AccountId,
        amount: TokenAmount,
        available: TokenAmount,
    ) -> Result<()> {
        if amount.is_zero() || amount > available {
            return Err(FlewpayError::InsufficientBalance {
                account: merchant,
                needed: amount,
                available,
            });
        }
        Ok(())
    }

    fn record(
        &self,
        caller: AccountId,
        merchant: AccountId,
        amount: TokenAmount,
    ) -> LiquidationRecord {
        LiquidationRecord {
            id: LiquidationId::new(),
            merchant,
            company_wallet: self.company_wallet,
            amount,
            settled_by: caller,
            settled_at: Utc::now(),
        }
    }

    fn commit(&mut self, record: &LiquidationRecord) {
        self.events.append(LedgerEvent::LiquidationSettled {
            liquidation_id: record.id,
            merchant: record.merchant,
            company_wallet: record.company_wallet,
            amount: record.amount,
        });
        tracing::info!(
            liquidation = %record.id,
            merchant = %record.merchant,
            company_wallet = %record.company_wallet,
            amount = %record.amount,
            settled_by = %record.settled_by,
            "Liquidation settled"
        );
    }
}
