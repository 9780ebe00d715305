//! Integer amount types for the Fairshare escrow model.
//!
//! All accounting is done in the smallest indivisible unit of each side:
//! base-currency units for pledges and refunds, sale-asset units for
//! allocations. There is no fractional arithmetic anywhere in the engine;
//! pro-rata products widen to `u128` and truncate toward zero on division.

/// Amount of base currency, in smallest units.
pub type CurrencyAmount = u64;

/// Amount of the sale asset, in smallest units.
pub type AssetAmount = u64;

/// Type alias for asset identifiers (e.g. a token symbol or contract handle).
pub type AssetId = String;

/// `a * b / d` with the product widened to `u128`, truncating toward zero.
///
/// Returns `None` only when the quotient does not fit back into `u64`;
/// every caller in the engine divides by a factor at least as large as one
/// of the multiplicands, so in practice the narrow always succeeds.
#[must_use]
pub fn mul_div(a: u64, b: u64, d: u64) -> Option<u64> {
    if d == 0 {
        return None;
    }
    let wide = u128::from(a) * u128::from(b) / u128::from(d);
    u64::try_from(wide).ok()
}
