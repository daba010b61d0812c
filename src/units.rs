//! Native-currency unit conversion.
//!
//! Transaction requests carry transfer amounts as decimal strings in
//! native-currency units; wallets want the smallest on-chain unit.

use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;

use crate::error::LaunchParamError;

/// Fractional digits of the chain's native currency.
const NATIVE_DECIMALS: u32 = 18;

const WEI_PER_NATIVE: Decimal = dec!(1000000000000000000);

/// Convert a decimal native-currency amount (e.g. `"0.001"`) to wei.
///
/// Rejects malformed decimals, negative amounts, amounts with more than 18
/// fractional digits, and amounts that overflow the conversion.
pub fn native_to_wei(value: &str) -> Result<u128, LaunchParamError> {
    let trimmed = value.trim();
    let amount = Decimal::from_str(trimmed).map_err(|e| LaunchParamError::InvalidField {
        field: "value",
        message: format!("'{trimmed}' is not a valid decimal amount: {e}"),
    })?;

    if amount.is_sign_negative() {
        return Err(LaunchParamError::InvalidField {
            field: "value",
            message: "amount must not be negative".to_string(),
        });
    }
    if amount.normalize().scale() > NATIVE_DECIMALS {
        return Err(LaunchParamError::InvalidField {
            field: "value",
            message: format!("amount has more than {NATIVE_DECIMALS} decimal places"),
        });
    }

    amount
        .checked_mul(WEI_PER_NATIVE)
        .and_then(|wei| wei.to_u128())
        .ok_or_else(|| LaunchParamError::InvalidField {
            field: "value",
            message: format!("'{trimmed}' is out of range for a native-currency transfer"),
        })
}
