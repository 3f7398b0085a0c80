//! Token amounts in the ledger's 18-decimal fixed-point convention.
//!
//! A [`TokenAmount`] stores integer base units (`1 token = 10^18 units`),
//! so ledger arithmetic is exact. Every mutation goes through the checked
//! operations; the ledger turns a `None` into [`FlewpayError::Overflow`].
//!
//! Human-readable values cross the boundary as decimal strings
//! (`"12.5"`) or as [`rust_decimal::Decimal`].

use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{FlewpayError, constants};

/// An unsigned 18-decimal fixed-point token amount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TokenAmount(u128);

impl TokenAmount {
    pub const ZERO: Self = Self(0);
    pub const MAX: Self = Self(u128::MAX);

    /// Amount from raw base units.
    #[must_use]
    pub const fn from_base_units(units: u128) -> Self {
        Self(units)
    }

    /// Amount from a whole number of tokens.
    #[must_use]
    pub const fn tokens(whole: u64) -> Self {
        // u64::MAX * 10^18 < u128::MAX, so this cannot overflow.
        Self(whole as u128 * constants::BASE_UNITS_PER_TOKEN)
    }

    #[must_use]
    pub const fn base_units(self) -> u128 {
        self.0
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    #[must_use]
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    #[must_use]
    pub fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    /// Checked sum, `None` on overflow.
    #[must_use]
    pub fn checked_sum(amounts: impl IntoIterator<Item = Self>) -> Option<Self> {
        amounts
            .into_iter()
            .try_fold(Self::ZERO, Self::checked_add)
    }

    /// Convert a non-negative decimal with at most 18 significant fractional digits.
    pub fn from_decimal(value: Decimal) -> Result<Self, FlewpayError> {
        let value = value.normalize();
        if value.is_sign_negative() && !value.is_zero() {
            return Err(FlewpayError::InvalidAmount {
                reason: format!("negative amount {value}"),
            });
        }
        let scale = value.scale();
        if scale > constants::TOKEN_DECIMALS {
            return Err(FlewpayError::InvalidAmount {
                reason: format!(
                    "{value} has {scale} decimal places, max {}",
                    constants::TOKEN_DECIMALS
                ),
            });
        }
        let mantissa = value.mantissa().unsigned_abs();
        10u128
            .checked_pow(constants::TOKEN_DECIMALS - scale)
            .and_then(|factor| mantissa.checked_mul(factor))
            .map(Self)
            .ok_or(FlewpayError::Overflow)
    }

    /// Decimal view of this amount, `None` when it exceeds `Decimal`'s 96-bit mantissa.
    #[must_use]
    pub fn to_decimal(self) -> Option<Decimal> {
        let units = i128::try_from(self.0).ok()?;
        Decimal::try_from_i128_with_scale(units, constants::TOKEN_DECIMALS)
            .ok()
            .map(|d| d.normalize())
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / constants::BASE_UNITS_PER_TOKEN;
        let frac = self.0 % constants::BASE_UNITS_PER_TOKEN;
        if frac == 0 {
            return write!(f, "{whole}");
        }
        let digits = format!("{frac:018}");
        write!(f, "{whole}.{}", digits.trim_end_matches('0'))
    }
}

impl FromStr for TokenAmount {
    type Err = FlewpayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| FlewpayError::InvalidAmount {
            reason: format!("{s:?}: {reason}"),
        };
        let trimmed = s.trim();
        let (whole, frac) = trimmed.split_once('.').unwrap_or((trimmed, ""));
        if whole.is_empty() && frac.is_empty() {
            return Err(invalid("empty"));
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid("expected an unsigned decimal number"));
        }
        if frac.len() > constants::TOKEN_DECIMALS as usize {
            return Err(invalid("too many decimal places"));
        }

        let whole_units = if whole.is_empty() {
            0
        } else {
            whole.parse::<u128>().map_err(|_| FlewpayError::Overflow)?
        };
        let frac_units = if frac.is_empty() {
            0
        } else {
            let padded = format!("{frac:0<18}");
            padded.parse::<u128>().map_err(|_| invalid("bad fraction"))?
        };

        whole_units
            .checked_mul(constants::BASE_UNITS_PER_TOKEN)
            .and_then(|w| w.checked_add(frac_units))
            .map(Self)
            .ok_or(FlewpayError::Overflow)
    }
}

impl TryFrom<String> for TokenAmount {
    type Error = FlewpayError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TokenAmount> for String {
    fn from(value: TokenAmount) -> Self {
        value.to_string()
    }
}
