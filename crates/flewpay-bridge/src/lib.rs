//! # flewpay-bridge
//!
//! **Custody bridge**: converts a deposit of a designated external asset
//! into an equal credit on the token ledger.
//!
//! ## Architecture
//!
//! 1. **ExternalAsset**: the transfer-in / balance-read surface of the asset
//!    the bridge takes custody of
//! 2. **InMemoryAsset**: an in-process asset (mock stablecoin) for
//!    deployments without a real one, and for tests
//! 3. **CustodyBridge**: lock-then-credit orchestration
//!
//! ## Deposit Flow
//!
//! ```text
//! depositor.approve(bridge) → CustodyBridge.deposit()
//!     → TokenLedger.validate_mint() → ExternalAsset.transfer_from()
//!     → observe custody delta → TokenLedger.mint(delta)
//! ```
//!
//! The ledger is never credited unless the asset transfer-in succeeded and
//! the bridge's custody balance grew by at least the credited amount.

pub mod custody_bridge;
pub mod external_asset;

pub use custody_bridge::{BridgeDeposit, CustodyBridge};
pub use external_asset::{ExternalAsset, InMemoryAsset};
