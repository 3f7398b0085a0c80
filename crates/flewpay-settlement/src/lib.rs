//! # flewpay-settlement
//!
//! **Settlement engine**: moves accumulated ledger value from merchants to
//! the single company wallet fixed at deployment.
//!
//! ## Architecture
//!
//! The engine owns no balances. Each liquidation:
//! 1. Checks wiring (ledger and company wallet set, ledger matches)
//! 2. Gates the caller on `LIQUIDATOR` or `ADMIN` in the engine's own registry
//! 3. Refuses while the ledger is paused
//! 4. Bounds the amount by the merchant's balance
//! 5. Moves the balance with `TokenLedger::transfer_from`, spending the
//!    allowance the merchant granted the engine
//! 6. Appends `LiquidationSettled` and returns a [`LiquidationRecord`]
//!
//! Liquidation only moves existing balance; total supply is unchanged.
//!
//! [`LiquidationRecord`]: flewpay_types::LiquidationRecord

pub mod engine;

pub use engine::SettlementEngine;
