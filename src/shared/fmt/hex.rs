//! Hex quantity conversion for the Ethereum-compatible sidechain.
//!
//! The eth sidechain reports heights and balances as `0x`-prefixed base-16
//! strings; every other chain reports decimal-ready values.

use crate::error::ShapeError;

/// Convert a hex quantity (`"0x1a"`) into its decimal string (`"26"`).
///
/// Accepts an optional `0x`/`0X` prefix. Parses into `u128` so wei balances
/// fit.
pub fn hex_to_decimal(quantity: &str) -> Result<String, ShapeError> {
    let digits = quantity
        .trim()
        .strip_prefix("0x")
        .or_else(|| quantity.trim().strip_prefix("0X"))
        .unwrap_or_else(|| quantity.trim());

    if digits.is_empty() {
        return Err(ShapeError::InvalidHex(quantity.to_string()));
    }

    u128::from_str_radix(digits, 16)
        .map(|n| n.to_string())
        .map_err(|_| ShapeError::InvalidHex(quantity.to_string()))
}

/// Render a block height as a hex quantity, zero-padded to two digits
/// (`5` → `"0x05"`, `12345` → `"0x3039"`).
pub fn to_hex_quantity(height: u64) -> String {
    format!("0x{:02x}", height)
}
