//! Money precision helpers.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Amounts are `rust_decimal::Decimal` fixed at two decimal places.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places every posted amount is rounded to.
pub const MONEY_SCALE: u32 = 2;

/// Largest difference still treated as "equal" when comparing totals.
///
/// Two amounts agree when `|a - b| < BALANCE_TOLERANCE`.
pub const BALANCE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Rounds an amount to [`MONEY_SCALE`] places, midpoint away from zero.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Returns true if two amounts differ by less than [`BALANCE_TOLERANCE`].
#[must_use]
pub fn amounts_agree(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() < BALANCE_TOLERANCE
}
