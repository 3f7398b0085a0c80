//! Configuration types for ledger, settlement and deployment.

use serde::{Deserialize, Serialize};

use crate::{AccountId, FlewpayError, Result, constants};

/// Which balance mutations the paused mode blocks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PausePolicy {
    /// Only peer-to-peer movement (`transfer`, `transfer_from`) is blocked.
    /// Mint and burn stay available to their callers.
    #[default]
    TransfersOnly,
    /// Mint and burn are blocked as well.
    AllBalanceMutations,
}

impl PausePolicy {
    /// Whether mint/burn are blocked while paused.
    #[must_use]
    pub fn blocks_supply_changes(self) -> bool {
        self == Self::AllBalanceMutations
    }
}

/// Token ledger configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub name: String,
    pub symbol: String,
    pub pause_policy: PausePolicy,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            name: constants::TOKEN_NAME.to_string(),
            symbol: constants::TOKEN_SYMBOL.to_string(),
            pause_policy: PausePolicy::default(),
        }
    }
}

/// Settlement engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettlementConfig {
    /// Maximum number of requests accepted by one batch liquidation.
    pub max_batch_size: usize,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            max_batch_size: constants::DEFAULT_MAX_SETTLEMENT_BATCH,
        }
    }
}

/// Inputs of a full deployment: the constructor arguments of every component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentConfig {
    /// Account deploying the components; becomes the ledger's initial owner.
    pub deployer: AccountId,
    /// Address of the external asset the bridge takes custody of.
    /// `None` deploys a mock asset owned by the deployer.
    #[serde(default)]
    pub external_asset: Option<AccountId>,
    /// Fixed payee of every liquidation.
    pub company_wallet: AccountId,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub settlement: SettlementConfig,
}

impl DeploymentConfig {
    #[must_use]
    pub fn new(deployer: AccountId, company_wallet: AccountId) -> Self {
        Self {
            deployer,
            external_asset: None,
            company_wallet,
            ledger: LedgerConfig::default(),
            settlement: SettlementConfig::default(),
        }
    }

    /// Parse a JSON document and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations no deployment could succeed with.
    pub fn validate(&self) -> Result<()> {
        if self.deployer.is_zero() {
            return Err(FlewpayError::Configuration("deployer address not set".into()));
        }
        if self.company_wallet.is_zero() {
            return Err(FlewpayError::Configuration(
                "company wallet address not set".into(),
            ));
        }
        if self.external_asset.is_some_and(|a| a.is_zero()) {
            return Err(FlewpayError::Configuration(
                "external asset address is the zero address".into(),
            ));
        }
        if self.ledger.name.trim().is_empty() || self.ledger.symbol.trim().is_empty() {
            return Err(FlewpayError::Configuration(
                "token name and symbol must be non-empty".into(),
            ));
        }
        if self.settlement.max_batch_size == 0 {
            return Err(FlewpayError::Configuration(
                "settlement.max_batch_size must be > 0".into(),
            ));
        }
        Ok(())
    }
}
