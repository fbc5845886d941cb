//! Money arithmetic
//!
//! Amounts are `Decimal` in memory and integer cents in SQLite. Every value
//! entering the store is rounded to 2 places, half away from zero.

use rust_decimal::prelude::*;
use shared::error::{AppError, AppResult, ErrorCode};

const DECIMAL_PLACES: u32 = 2;

/// Maximum allowed unit price (R$ 1,000,000)
pub const MAX_PRICE: Decimal = Decimal::from_parts(100_000_000, 0, 0, false, 2);
/// Maximum allowed quantity per line
pub const MAX_QUANTITY: i64 = 9999;

/// Round to cents, half away from zero
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

#[inline]
pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, DECIMAL_PLACES)
}

/// Convert to integer cents; `None` if the value does not fit in an i64
pub fn to_cents(value: Decimal) -> Option<i64> {
    (round_money(value) * Decimal::ONE_HUNDRED).to_i64()
}

/// price × quantity
#[inline]
pub fn line_total(price: Decimal, quantity: i64) -> Decimal {
    price * Decimal::from(quantity)
}

/// Σ price × quantity
pub fn sum_lines(lines: impl IntoIterator<Item = (Decimal, i64)>) -> Decimal {
    lines
        .into_iter()
        .map(|(price, qty)| line_total(price, qty))
        .sum()
}

/// Validate a unit price and convert it to cents
pub fn price_to_cents(price: Decimal) -> AppResult<i64> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(AppError::validation(format!(
            "price must be non-negative, got {price}"
        )));
    }
    if price > MAX_PRICE {
        return Err(AppError::validation(format!(
            "price exceeds maximum allowed ({MAX_PRICE}), got {price}"
        )));
    }
    to_cents(price).ok_or_else(|| AppError::validation("price out of range"))
}

/// Validate a line quantity
pub fn validate_quantity(quantity: i64) -> AppResult<i64> {
    if !(1..=MAX_QUANTITY).contains(&quantity) {
        return Err(AppError::validation(format!(
            "quantity must be between 1 and {MAX_QUANTITY}, got {quantity}"
        )));
    }
    Ok(quantity)
}

/// Convert a signed ledger amount to cents, rejecting amounts that round to zero
pub fn amount_to_cents(amount: Decimal) -> AppResult<i64> {
    match to_cents(amount) {
        Some(0) => Err(AppError::with_message(
            ErrorCode::TransactionInvalidAmount,
            "amount must not be zero",
        )),
        Some(cents) => Ok(cents),
        None => Err(AppError::with_message(
            ErrorCode::TransactionInvalidAmount,
            "amount out of range",
        )),
    }
}
