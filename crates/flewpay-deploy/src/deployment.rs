//! Deployment replay.
//!
//! Components are deployed in a fixed order, each at the address derived
//! from `(deployer, nonce)`:
//!
//! | nonce | component                                 |
//! |-------|-------------------------------------------|
//! | 0     | `TokenLedger` (deployer is initial owner) |
//! | 1     | mock external asset, only if none is set  |
//! | next  | `CustodyBridge(asset, ledger)`            |
//! | next  | `SettlementEngine(ledger, company wallet)`|
//!
//! The bridge is then granted `MINTER` on the ledger.

use flewpay_bridge::{CustodyBridge, ExternalAsset, InMemoryAsset};
use flewpay_ledger::TokenLedger;
use flewpay_settlement::SettlementEngine;
use flewpay_types::{
    AccountId, DeploymentConfig, EventRecord, LiquidationRecord, Result, Role, TokenAmount,
    constants,
};
use serde::Serialize;

/// Symbol of the external asset held in custody.
const EXTERNAL_ASSET_SYMBOL: &str = "USDC";

/// Every deployed component, wired together.
#[derive(Debug)]
pub struct Deployment {
    pub deployer: AccountId,
    pub company_wallet: AccountId,
    pub asset_is_mock: bool,
    pub asset: InMemoryAsset,
    pub ledger: TokenLedger,
    pub bridge: CustodyBridge,
    pub engine: SettlementEngine,
}

/// Addresses and metadata of a deployment.
#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    pub system: &'static str,
    pub version: &'static str,
    pub deployer: AccountId,
    pub token: TokenManifest,
    pub external_asset: AssetManifest,
    pub bridge: AccountId,
    pub settlement: AccountId,
    pub company_wallet: AccountId,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenManifest {
    pub address: AccountId,
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct AssetManifest {
    pub address: AccountId,
    pub symbol: String,
    pub mock: bool,
}

/// Outcome of [`Deployment::simulate`].
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub manifest: Manifest,
    pub depositor: AccountId,
    pub merchant: AccountId,
    pub deposit_requested: TokenAmount,
    pub deposit_credited: TokenAmount,
    pub liquidation: LiquidationRecord,
    pub balances: Balances,
    pub audit: AuditDigests,
    pub events: Vec<EventRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Balances {
    pub depositor: TokenAmount,
    pub merchant: TokenAmount,
    pub company_wallet: TokenAmount,
    pub total_supply: TokenAmount,
    pub locked_in_bridge: TokenAmount,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditDigests {
    pub ledger: String,
    pub bridge: String,
    pub settlement: String,
}

impl Deployment {
    /// Deploy every component described by `config`.
    ///
    /// # Errors
    /// Returns `Configuration` if `config` does not validate, or any error
    /// raised while wiring the bridge's `MINTER` role.
    pub fn deploy(config: &DeploymentConfig) -> Result<Self> {
        config.validate()?;
        let deployer = config.deployer;
        let mut nonce = 0u64;
        let mut next_address = || {
            let address = AccountId::derive_component(deployer, nonce);
            nonce += 1;
            address
        };

        let mut ledger = TokenLedger::new(next_address(), deployer, config.ledger.clone())?;
        let (asset, asset_is_mock) = match config.external_asset {
            Some(address) => (InMemoryAsset::new(address, EXTERNAL_ASSET_SYMBOL), false),
            None => (InMemoryAsset::new(next_address(), EXTERNAL_ASSET_SYMBOL), true),
        };
        let bridge = CustodyBridge::new(next_address(), asset.address(), ledger.address());
        let engine = SettlementEngine::new(
            next_address(),
            deployer,
            ledger.address(),
            config.company_wallet,
            config.settlement.clone(),
        );
        ledger.grant_role(deployer, Role::Minter, bridge.address())?;

        tracing::info!(
            deployer = %deployer,
            ledger = %ledger.address(),
            external_asset = %asset.address(),
            mock_asset = asset_is_mock,
            bridge = %bridge.address(),
            settlement = %engine.address(),
            "Deployment complete"
        );

        Ok(Self {
            deployer,
            company_wallet: config.company_wallet,
            asset_is_mock,
            asset,
            ledger,
            bridge,
            engine,
        })
    }

    #[must_use]
    pub fn manifest(&self) -> Manifest {
        Manifest {
            system: constants::SYSTEM_NAME,
            version: constants::VERSION,
            deployer: self.deployer,
            token: TokenManifest {
                address: self.ledger.address(),
                name: self.ledger.name().to_string(),
                symbol: self.ledger.symbol().to_string(),
                decimals: self.ledger.decimals(),
            },
            external_asset: AssetManifest {
                address: self.asset.address(),
                symbol: self.asset.symbol().to_string(),
                mock: self.asset_is_mock,
            },
            bridge: self.bridge.address(),
            settlement: self.engine.address(),
            company_wallet: self.company_wallet,
        }
    }

    /// Replay one deposit → payment → liquidation cycle.
    ///
    /// `depositor` is funded from the asset faucet, bridges `deposit`, pays
    /// `settle` to `merchant`, and the deployer liquidates that payment to
    /// the company wallet. Supply and custody backing are verified at the end.
    ///
    /// # Errors
    /// Any error raised by the components along the way.
    pub fn simulate(
        &mut self,
        depositor: AccountId,
        merchant: AccountId,
        deposit: TokenAmount,
        settle: TokenAmount,
    ) -> Result<SimulationReport> {
        self.asset.mint_to(depositor, deposit)?;
        self.asset.approve(depositor, self.bridge.address(), deposit);
        let receipt = self
            .bridge
            .deposit(&mut self.ledger, &mut self.asset, depositor, deposit)?;

        self.ledger.transfer(depositor, merchant, settle)?;
        self.ledger.approve(merchant, self.engine.address(), settle)?;
        let liquidation = self
            .engine
            .settle(&mut self.ledger, self.deployer, merchant, settle)?;

        self.ledger.verify_supply()?;
        self.bridge.verify_backing(&self.asset)?;

        let mut events: Vec<EventRecord> = self.ledger.events().records().to_vec();
        events.extend_from_slice(self.bridge.events().records());
        events.extend_from_slice(self.engine.events().records());
        events.sort_by_key(|r| r.recorded_at);

        Ok(SimulationReport {
            manifest: self.manifest(),
            depositor,
            merchant,
            deposit_requested: receipt.requested,
            deposit_credited: receipt.credited,
            liquidation,
            balances: Balances {
                depositor: self.ledger.balance_of(depositor),
                merchant: self.ledger.balance_of(merchant),
                company_wallet: self.ledger.balance_of(self.company_wallet),
                total_supply: self.ledger.total_supply(),
                locked_in_bridge: self.bridge.locked_balance(&self.asset),
            },
            audit: AuditDigests {
                ledger: self.ledger.events().digest_hex(),
                bridge: self.bridge.events().digest_hex(),
                settlement: self.engine.events().digest_hex(),
            },
            events,
        })
    }
}

#[cfg(test)]
mod tests {
    use flewpay_types::FlewpayError;

    use super::*;

    fn config() -> DeploymentConfig {
        DeploymentConfig::new(AccountId([0xD0; 20]), AccountId([0xC0; 20]))
    }

    #[test]
    fn deploy_wires_components() {
        let d = Deployment::deploy(&config()).unwrap();
        assert!(d.asset_is_mock);
        assert!(d.ledger.has_role(Role::Admin, d.deployer));
        assert!(d.ledger.has_role(Role::Minter, d.bridge.address()));
        assert_eq!(d.bridge.ledger(), d.ledger.address());
        assert_eq!(d.bridge.external_asset(), d.asset.address());
        assert_eq!(d.engine.ledger(), d.ledger.address());
        assert_eq!(d.engine.company_wallet(), AccountId([0xC0; 20]));
    }

    #[test]
    fn addresses_are_replayable() {
        let a = Deployment::deploy(&config()).unwrap().manifest();
        let b = Deployment::deploy(&config()).unwrap().manifest();
        assert_eq!(a.token.address, b.token.address);
        assert_eq!(a.bridge, b.bridge);
        assert_eq!(a.settlement, b.settlement);
        assert_eq!(a.token.address, AccountId::derive_component(a.deployer, 0));
        assert_eq!(a.external_asset.address, AccountId::derive_component(a.deployer, 1));
    }

    #[test]
    fn configured_asset_skips_mock_nonce() {
        let asset = AccountId([0xA5; 20]);
        let mut cfg = config();
        cfg.external_asset = Some(asset);
        let d = Deployment::deploy(&cfg).unwrap();
        assert!(!d.asset_is_mock);
        assert_eq!(d.asset.address(), asset);
        assert_eq!(d.bridge.address(), AccountId::derive_component(d.deployer, 1));
        assert_eq!(d.engine.address(), AccountId::derive_component(d.deployer, 2));
    }

    #[test]
    fn invalid_config_rejected() {
        let cfg = DeploymentConfig::new(AccountId::ZERO, AccountId([0xC0; 20]));
        let err = Deployment::deploy(&cfg).unwrap_err();
        assert!(matches!(err, FlewpayError::Configuration(_)));
    }

    #[test]
    fn simulation_closes_the_loop() {
        let mut d = Deployment::deploy(&config()).unwrap();
        let depositor = AccountId::random();
        let merchant = AccountId::random();
        let report = d
            .simulate(depositor, merchant, TokenAmount::tokens(100), TokenAmount::tokens(40))
            .unwrap();

        assert_eq!(report.deposit_credited, TokenAmount::tokens(100));
        assert_eq!(report.balances.depositor, TokenAmount::tokens(60));
        assert_eq!(report.balances.merchant, TokenAmount::ZERO);
        assert_eq!(report.balances.company_wallet, TokenAmount::tokens(40));
        assert_eq!(report.balances.total_supply, TokenAmount::tokens(100));
        assert_eq!(report.balances.locked_in_bridge, TokenAmount::tokens(100));
        assert_eq!(report.audit.ledger.len(), 64);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["manifest"]["token"]["symbol"], "FLUPAY");
        assert_eq!(json["liquidation"]["amount"], "40");
    }

    #[test]
    fn simulation_over_settle_fails() {
        let mut d = Deployment::deploy(&config()).unwrap();
        let err = d
            .simulate(
                AccountId::random(),
                AccountId::random(),
                TokenAmount::tokens(10),
                TokenAmount::tokens(11),
            )
            .unwrap_err();
        assert!(matches!(err, FlewpayError::InsufficientBalance { .. }));
    }
}
