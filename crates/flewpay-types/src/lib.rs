//! # flewpay-types
//!
//! Shared types, errors, and configuration for the **FlewPay** custody rail.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`AccountId`], [`LiquidationId`]
//! - **Amounts**: [`TokenAmount`] (18-decimal fixed point)
//! - **Authorization**: [`Role`], [`RoleId`]
//! - **Operating mode**: [`OperatingMode`]
//! - **Audit log**: [`LedgerEvent`], [`EventRecord`]
//! - **Settlement model**: [`LiquidationRecord`], [`SettlementRequest`]
//! - **Configuration**: [`LedgerConfig`], [`PausePolicy`], [`SettlementConfig`], [`DeploymentConfig`]
//! - **Errors**: [`FlewpayError`] with `FP_ERR_` prefix codes
//! - **Constants**: token metadata and system-wide limits

pub mod amount;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod ids;
pub mod liquidation;
pub mod mode;
pub mod role;

// Re-export all primary types at crate root for ergonomic imports:
//   use flewpay_types::{AccountId, TokenAmount, Role, ...};

pub use amount::*;
pub use config::*;
pub use error::*;
pub use event::*;
pub use ids::*;
pub use liquidation::*;
pub use mode::*;
pub use role::*;

// Constants are accessed via `flewpay_types::constants::FOO`
// (not re-exported to avoid name collisions).
