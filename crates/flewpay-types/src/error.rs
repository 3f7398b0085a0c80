//! Error types for the FlewPay custody rail.
//!
//! All errors use the `FP_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Authorization errors
//! - 2xx: Balance / amount errors
//! - 3xx: Operating mode errors
//! - 4xx: Bridge / wiring errors
//! - 5xx: Settlement and audit errors
//! - 9xx: General / internal errors
//!
//! Every error aborts the operation that raised it with no state change.

use thiserror::Error;

use crate::{AccountId, OperatingMode, Role, TokenAmount};

/// Central error enum for all FlewPay operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlewpayError {
    // =================================================================
    // Authorization Errors (1xx)
    // =================================================================
    /// The caller lacks the role required by the operation.
    #[error("FP_ERR_100: Unauthorized: account {account} is missing role {role}")]
    Unauthorized { account: AccountId, role: Role },

    /// A role can only be renounced by the account holding it.
    #[error("FP_ERR_101: Unauthorized: {caller} cannot renounce roles for {account}")]
    RenounceForOther { caller: AccountId, account: AccountId },

    // =================================================================
    // Balance Errors (2xx)
    // =================================================================
    /// Not enough balance to perform the operation.
    #[error("FP_ERR_200: Insufficient balance for {account}: need {needed}, have {available}")]
    InsufficientBalance {
        account: AccountId,
        needed: TokenAmount,
        available: TokenAmount,
    },

    /// The spender's allowance does not cover the amount.
    #[error(
        "FP_ERR_201: Insufficient allowance: {spender} may move {available} from {owner}, needs {needed}"
    )]
    InsufficientAllowance {
        owner: AccountId,
        spender: AccountId,
        needed: TokenAmount,
        available: TokenAmount,
    },

    /// The amount is malformed or not allowed for this operation.
    #[error("FP_ERR_202: Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    /// Checked arithmetic overflowed.
    #[error("FP_ERR_203: Arithmetic overflow in balance calculation")]
    Overflow,

    /// The zero address cannot take part in the operation.
    #[error("FP_ERR_204: Zero address not allowed as {param}")]
    ZeroAddress { param: &'static str },

    // =================================================================
    // Operating Mode Errors (3xx)
    // =================================================================
    /// The operation is not permitted in the ledger's current mode.
    #[error("FP_ERR_300: Operation blocked: {operation} not allowed while ledger is {mode}")]
    OperationBlocked {
        operation: &'static str,
        mode: OperatingMode,
    },

    // =================================================================
    // Bridge / Wiring Errors (4xx)
    // =================================================================
    /// A dependent address was never set or points at the wrong component.
    #[error("FP_ERR_400: Configuration error in {component}: {reason}")]
    ConfigurationError {
        component: &'static str,
        reason: String,
    },

    /// External asset movement did not complete.
    #[error("FP_ERR_401: External transfer failed: {reason}")]
    TransferFailed { reason: String },

    // =================================================================
    // Settlement / Audit Errors (5xx)
    // =================================================================
    /// A settlement batch had no requests or too many.
    #[error("FP_ERR_500: Invalid settlement batch: {reason}")]
    InvalidBatch { reason: String },

    /// Supply conservation invariant violated: critical safety alert.
    #[error("FP_ERR_501: Supply invariant violation: {reason}")]
    SupplyInvariantViolation { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("FP_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("FP_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, missing fields, etc.).
    #[error("FP_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// An address string did not parse.
    #[error("FP_ERR_903: Invalid address {input:?}: {reason}")]
    InvalidAddress { input: String, reason: String },

    /// I/O error (disk).
    #[error("FP_ERR_904: I/O error: {0}")]
    Io(String),
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, FlewpayError>;

impl From<std::io::Error> for FlewpayError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for FlewpayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
