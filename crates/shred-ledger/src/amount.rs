//! decimal amount parsing and display

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::TransferError;

/// 1 hbar = 10^8 tinybars
pub const NATIVE_DECIMALS: u32 = 8;

pub const NATIVE_SYMBOL: &str = "ℏ";

/// parse a user typed decimal into smallest units
pub fn parse_amount(input: &str, decimals: u32) -> Result<u64, TransferError> {
    let trimmed = input.trim();
    let value = Decimal::from_str(trimmed)
        .map_err(|e| TransferError::InvalidAmount(format!("{:?}: {}", trimmed, e)))?
        .normalize();

    if value.is_sign_negative() || value.is_zero() {
        return Err(TransferError::InvalidAmount(
            "amount must be greater than zero".into(),
        ));
    }
    if value.scale() > decimals {
        return Err(TransferError::InvalidAmount(format!(
            "at most {} decimal places",
            decimals
        )));
    }

    let overflow = || TransferError::InvalidAmount("amount too large".into());
    let factor = 10i128
        .checked_pow(decimals - value.scale())
        .ok_or_else(overflow)?;
    let units = value.mantissa().checked_mul(factor).ok_or_else(overflow)?;
    u64::try_from(units).map_err(|_| overflow())
}

/// smallest units -> decimal string, trailing zeros trimmed
pub fn format_units(amount: u64, decimals: u32) -> String {
    let value = Decimal::from_i128_with_scale(amount as i128, decimals.min(28));
    value.normalize().to_string()
}

/// tinybars -> "12.5 ℏ"
pub fn format_native(tinybars: u64) -> String {
    format!("{} {}", format_units(tinybars, NATIVE_DECIMALS), NATIVE_SYMBOL)
}

/// signed tinybar delta -> "+12.5 ℏ" / "-0.1 ℏ"
pub fn format_native_delta(tinybars: i64) -> String {
    let sign = if tinybars < 0 { "-" } else { "+" };
    format!("{}{}", sign, format_native(tinybars.unsigned_abs()))
}
