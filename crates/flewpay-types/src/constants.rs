//! System-wide constants for the FlewPay custody rail.

/// Token name reported by the ledger.
pub const TOKEN_NAME: &str = "FlewPayToken";

/// Token symbol reported by the ledger.
pub const TOKEN_SYMBOL: &str = "FLUPAY";

/// Fixed-point precision of every [`crate::TokenAmount`].
pub const TOKEN_DECIMALS: u32 = 18;

/// Base units per whole token (`10^TOKEN_DECIMALS`).
pub const BASE_UNITS_PER_TOKEN: u128 = 1_000_000_000_000_000_000;

/// Length of an account address in bytes.
pub const ADDRESS_LEN: usize = 20;

/// Domain tag for deterministic component address derivation.
pub const COMPONENT_ADDRESS_DOMAIN: &[u8] = b"flewpay:component_address:v1:";

/// Domain tag for the audit log digest chain.
pub const EVENT_LOG_DOMAIN: &[u8] = b"flewpay:event_log:v1:";

/// Maximum number of requests in a single settlement batch (default).
pub const DEFAULT_MAX_SETTLEMENT_BATCH: usize = 256;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// System name.
pub const SYSTEM_NAME: &str = "FlewPay";
