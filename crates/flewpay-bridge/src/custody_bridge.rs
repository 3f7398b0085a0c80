//! Custody bridge: lock external asset, then credit the ledger.
//!
//! A deposit runs in a fixed order:
//! 1. Wiring check (both collaborator addresses set and matching)
//! 2. Mint preflight against the ledger (role, amount, mode, recipient)
//! 3. Pull the asset from the depositor into custody
//! 4. Observe the custody balance delta
//! 5. Mint exactly the received amount, capped at the requested amount
//!
//! Step 5 never runs unless step 3 succeeded and step 4 saw funds arrive.
//! If the mint still fails, the received funds are pushed back to the
//! depositor before the error is returned.

use flewpay_ledger::{EventLog, TokenLedger};
use flewpay_types::{AccountId, FlewpayError, LedgerEvent, Result, TokenAmount};

use crate::ExternalAsset;

/// Outcome of one deposit. Not persisted beyond the audit log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeDeposit {
    pub depositor: AccountId,
    /// Amount the depositor asked to lock.
    pub requested: TokenAmount,
    /// Ledger credit minted: the custody delta, capped at `requested`.
    pub credited: TokenAmount,
}

/// Locks an external asset and issues the equal ledger credit.
///
/// Owns no balances: custody lives in the external asset, credit lives in
/// the ledger. The bridge needs `MINTER` on the ledger.
#[derive(Debug, Clone)]
pub struct CustodyBridge {
    address: AccountId,
    external_asset: AccountId,
    ledger: AccountId,
    events: EventLog,
}

impl CustodyBridge {
    /// Deploy a bridge at `address` for the given asset and ledger addresses.
    ///
    /// Unset (zero) addresses are accepted here and rejected on first use.
    #[must_use]
    pub fn new(address: AccountId, external_asset: AccountId, ledger: AccountId) -> Self {
        tracing::info!(
            bridge = %address,
            external_asset = %external_asset,
            ledger = %ledger,
            "Custody bridge deployed"
        );
        Self {
            address,
            external_asset,
            ledger,
            events: EventLog::new(address),
        }
    }

    #[must_use]
    pub fn address(&self) -> AccountId {
        self.address
    }

    #[must_use]
    pub fn external_asset(&self) -> AccountId {
        self.external_asset
    }

    #[must_use]
    pub fn ledger(&self) -> AccountId {
        self.ledger
    }

    #[must_use]
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Asset currently held in custody.
    #[must_use]
    pub fn locked_balance(&self, asset: &dyn ExternalAsset) -> TokenAmount {
        asset.balance_of(self.address)
    }

    /// Sum of every credit this bridge has minted.
    #[must_use]
    pub fn total_credited(&self) -> TokenAmount {
        self.events
            .named("BridgeDeposited")
            .filter_map(|event| match event {
                LedgerEvent::BridgeDeposited { amount, .. } => Some(*amount),
                _ => None,
            })
            .fold(TokenAmount::ZERO, TokenAmount::saturating_add)
    }

    /// Check that custody covers every credit ever minted.
    ///
    /// # Errors
    /// Returns `SupplyInvariantViolation` if locked < credited.
    pub fn verify_backing(&self, asset: &dyn ExternalAsset) -> Result<()> {
        let locked = self.locked_balance(asset);
        let credited = self.total_credited();
        if locked < credited {
            return Err(FlewpayError::SupplyInvariantViolation {
                reason: format!("bridge holds {locked} but credited {credited}"),
            });
        }
        Ok(())
    }

    /// Lock `amount` of the external asset from `depositor` and credit the
    /// ledger with what actually arrived.
    ///
    /// The depositor must have approved the bridge on the asset beforehand.
    ///
    /// # Errors
    /// - `ConfigurationError` if an address was not set or does not match
    /// - `InvalidAmount` for a zero amount
    /// - `Unauthorized` / `OperationBlocked` / `ZeroAddress` from the mint
    ///   preflight, before any funds move
    /// - `TransferFailed` if the asset would deliver nothing, the transfer-in
    ///   failed, or nothing arrived
    pub fn deposit(
        &mut self,
        ledger: &mut TokenLedger,
        asset: &mut dyn ExternalAsset,
        depositor: AccountId,
        amount: TokenAmount,
    ) -> Result<BridgeDeposit> {
        self.ensure_wired(ledger, asset)?;
        if amount.is_zero() {
            return Err(FlewpayError::InvalidAmount {
                reason: "deposit amount must be greater than zero".into(),
            });
        }
        ledger.validate_mint(self.address, depositor, amount)?;
        if asset.quote_transfer(depositor, self.address, amount).is_zero() {
            return Err(FlewpayError::TransferFailed {
                reason: format!(
                    "{} would deliver nothing of {amount} into custody",
                    self.external_asset
                ),
            });
        }

        // Lock.
        let before = asset.balance_of(self.address);
        asset
            .transfer_from(self.address, depositor, self.address, amount)
            .map_err(|err| match err {
                FlewpayError::TransferFailed { .. } => err,
                other => FlewpayError::TransferFailed {
                    reason: other.to_string(),
                },
            })?;
        let after = asset.balance_of(self.address);
        let received = after.checked_sub(before).unwrap_or_default();
        if received.is_zero() {
            // Custody did not grow, so the bridge holds nothing to hand back.
            tracing::error!(
                depositor = %depositor,
                requested = %amount,
                asset = %self.external_asset,
                "Asset reported a transfer but custody did not grow"
            );
            return Err(FlewpayError::TransferFailed {
                reason: format!("no {} arrived in custody", self.external_asset),
            });
        }
        let credited = received.min(amount);

        // Credit.
        if let Err(err) = ledger.mint(self.address, depositor, credited) {
            return Err(self.refund(asset, depositor, received, err));
        }

        self.events.append(LedgerEvent::BridgeDeposited {
            depositor,
            amount: credited,
        });
        tracing::info!(
            depositor = %depositor,
            requested = %amount,
            credited = %credited,
            "Bridge deposit credited"
        );
        Ok(BridgeDeposit {
            depositor,
            requested: amount,
            credited,
        })
    }

    fn ensure_wired(&self, ledger: &TokenLedger, asset: &dyn ExternalAsset) -> Result<()> {
        let misconfigured = |reason: String| FlewpayError::ConfigurationError {
            component: "CustodyBridge",
            reason,
        };
        if self.external_asset.is_zero() {
            return Err(misconfigured("external asset address not set".into()));
        }
        if self.ledger.is_zero() {
            return Err(misconfigured("ledger address not set".into()));
        }
        if asset.address() != self.external_asset {
            return Err(misconfigured(format!(
                "asset {} is not the configured asset {}",
                asset.address(),
                self.external_asset
            )));
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

    /// Return locked funds after a failed mint. Yields the error to report.
    fn refund(
        &self,
        asset: &mut dyn ExternalAsset,
        depositor: AccountId,
        received: TokenAmount,
        mint_err: FlewpayError,
    ) -> FlewpayError {
        match asset.transfer(self.address, depositor, received) {
            Ok(()) => {
                tracing::warn!(
                    depositor = %depositor,
                    amount = %received,
                    error = %mint_err,
                    "Mint failed after lock, custody refunded"
                );
                mint_err
            }
            Err(refund_err) => {
                tracing::error!(
                    depositor = %depositor,
                    amount = %received,
                    error = %mint_err,
                    refund_error = %refund_err,
                    "Mint failed after lock and refund failed"
                );
                FlewpayError::Internal(format!(
                    "mint failed ({mint_err}) and refund of {received} failed ({refund_err})"
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use flewpay_types::{LedgerConfig, Role};

    use super::*;
    use crate::InMemoryAsset;

    struct Fixture {
        ledger: TokenLedger,
        asset: InMemoryAsset,
        bridge: CustodyBridge,
        owner: AccountId,
        depositor: AccountId,
    }

    fn setup() -> Fixture {
        let owner = AccountId::random();
        let depositor = AccountId::random();
        let mut ledger =
            TokenLedger::new(AccountId::random(), owner, LedgerConfig::default()).unwrap();
        let mut asset = InMemoryAsset::new(AccountId::random(), "USDC");
        let bridge = CustodyBridge::new(AccountId::random(), asset.address(), ledger.address());
        ledger
            .grant_role(owner, Role::Minter, bridge.address())
            .unwrap();
        asset.mint_to(depositor, TokenAmount::tokens(1_000)).unwrap();
        asset.approve(depositor, bridge.address(), TokenAmount::tokens(1_000));
        Fixture {
            ledger,
            asset,
            bridge,
            owner,
            depositor,
        }
    }

    #[test]
    fn deposit_locks_then_credits() {
        let mut fx = setup();
        let receipt = fx
            .bridge
            .deposit(&mut fx.ledger, &mut fx.asset, fx.depositor, TokenAmount::tokens(250))
            .unwrap();

        assert_eq!(receipt.credited, TokenAmount::tokens(250));
        assert_eq!(fx.ledger.balance_of(fx.depositor), TokenAmount::tokens(250));
        assert_eq!(fx.bridge.locked_balance(&fx.asset), TokenAmount::tokens(250));
        assert_eq!(fx.asset.balance_of(fx.depositor), TokenAmount::tokens(750));
        assert_eq!(
            fx.bridge.events().last().unwrap().event,
            LedgerEvent::BridgeDeposited {
                depositor: fx.depositor,
                amount: TokenAmount::tokens(250),
            }
        );
        fx.bridge.verify_backing(&fx.asset).unwrap();
    }

    #[test]
    fn failed_transfer_credits_nothing() {
        let mut fx = setup();
        fx.asset.set_fail_transfers(true);
        let err = fx
            .bridge
            .deposit(&mut fx.ledger, &mut fx.asset, fx.depositor, TokenAmount::tokens(10))
            .unwrap_err();
        assert!(matches!(err, FlewpayError::TransferFailed { .. }));
        assert_eq!(fx.ledger.total_supply(), TokenAmount::ZERO);
        assert!(fx.bridge.events().is_empty());
    }

    #[test]
    fn missing_allowance_is_transfer_failure() {
        let mut fx = setup();
        fx.asset.approve(fx.depositor, fx.bridge.address(), TokenAmount::ZERO);
        let err = fx
            .bridge
            .deposit(&mut fx.ledger, &mut fx.asset, fx.depositor, TokenAmount::tokens(10))
            .unwrap_err();
        assert!(matches!(err, FlewpayError::TransferFailed { .. }));
        assert_eq!(fx.ledger.balance_of(fx.depositor), TokenAmount::ZERO);
    }

    #[test]
    fn fee_on_transfer_credits_only_received() {
        let mut fx = setup();
        let mut asset = fx.asset.clone().with_transfer_fee(50); // 0.5%
        let receipt = fx
            .bridge
            .deposit(&mut fx.ledger, &mut asset, fx.depositor, TokenAmount::tokens(200))
            .unwrap();
        assert_eq!(receipt.credited, TokenAmount::tokens(199));
        assert_eq!(fx.ledger.balance_of(fx.depositor), TokenAmount::tokens(199));
        fx.bridge.verify_backing(&asset).unwrap();
    }

    #[test]
    fn asset_delivering_nothing_leaves_depositor_untouched() {
        let mut fx = setup();
        let mut asset = fx.asset.clone().with_transfer_fee(10_000);
        let allowance = asset.allowance(fx.depositor, fx.bridge.address());
        let err = fx
            .bridge
            .deposit(&mut fx.ledger, &mut asset, fx.depositor, TokenAmount::tokens(10))
            .unwrap_err();

        assert!(matches!(err, FlewpayError::TransferFailed { .. }));
        assert_eq!(asset.balance_of(fx.depositor), TokenAmount::tokens(1_000));
        assert_eq!(asset.allowance(fx.depositor, fx.bridge.address()), allowance);
        assert_eq!(fx.bridge.locked_balance(&asset), TokenAmount::ZERO);
        assert_eq!(fx.ledger.total_supply(), TokenAmount::ZERO);
        assert!(fx.bridge.events().is_empty());
    }

    #[test]
    fn bridge_without_minter_role_moves_nothing() {
        let mut fx = setup();
        fx.ledger
            .revoke_role(fx.owner, Role::Minter, fx.bridge.address())
            .unwrap();
        let err = fx
            .bridge
            .deposit(&mut fx.ledger, &mut fx.asset, fx.depositor, TokenAmount::tokens(10))
            .unwrap_err();
        assert!(matches!(err, FlewpayError::Unauthorized { .. }));
        assert_eq!(fx.asset.balance_of(fx.depositor), TokenAmount::tokens(1_000));
    }

    #[test]
    fn unset_addresses_are_configuration_errors() {
        let mut fx = setup();
        let mut unwired = CustodyBridge::new(AccountId::random(), AccountId::ZERO, fx.ledger.address());
        let err = unwired
            .deposit(&mut fx.ledger, &mut fx.asset, fx.depositor, TokenAmount::tokens(1))
            .unwrap_err();
        assert!(matches!(err, FlewpayError::ConfigurationError { .. }));

        let mut unwired = CustodyBridge::new(AccountId::random(), fx.asset.address(), AccountId::ZERO);
        let err = unwired
            .deposit(&mut fx.ledger, &mut fx.asset, fx.depositor, TokenAmount::tokens(1))
            .unwrap_err();
        assert!(matches!(err, FlewpayError::ConfigurationError { .. }));
    }

    #[test]
    fn wrong_asset_rejected() {
        let mut fx = setup();
        let mut other = InMemoryAsset::new(AccountId::random(), "DAI");
        let err = fx
            .bridge
            .deposit(&mut fx.ledger, &mut other, fx.depositor, TokenAmount::tokens(1))
            .unwrap_err();
        assert!(matches!(err, FlewpayError::ConfigurationError { .. }));
    }

    #[test]
    fn zero_deposit_rejected() {
        let mut fx = setup();
        let err = fx
            .bridge
            .deposit(&mut fx.ledger, &mut fx.asset, fx.depositor, TokenAmount::ZERO)
            .unwrap_err();
        assert!(matches!(err, FlewpayError::InvalidAmount { .. }));
    }
}
