//! # flewpay-ledger
//!
//! **Value ledger**: role membership, balances, total supply, operating
//! mode, and the append-only audit log of a deployed FlewPay token.
//!
//! ## Architecture
//!
//! 1. **AccessControlRegistry**: (role, account) membership and the gate
//!    every privileged entry point calls first
//! 2. **TokenLedger**: mint / burn / transfer / allowance bookkeeping under
//!    `sum(balances) == total_supply`
//! 3. **EventLog**: typed records appended only after a mutation commits
//! 4. **SupplyConservation**: cumulative mint/burn tally cross-checked
//!    against the live supply
//! 5. **StagedTransfers**: `transfer_from` sequences validated up front and
//!    applied in one commit
//!
//! ## Call Flow
//!
//! ```text
//! caller → TokenLedger.op() → AccessControlRegistry.ensure_role()
//!        → mode gate → validate (balance, allowance, overflow)
//!        → commit state → EventLog.append()
//! ```
//!
//! Validation runs to completion before the first write, so a failing call
//! leaves the ledger untouched.

pub mod access_control;
pub mod event_log;
pub mod staged_transfers;
pub mod supply_conservation;
pub mod token_ledger;

pub use access_control::AccessControlRegistry;
pub use event_log::EventLog;
pub use staged_transfers::StagedTransfers;
pub use supply_conservation::{SupplyConservation, Tally};
pub use token_ledger::TokenLedger;
