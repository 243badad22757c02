//! Pound sterling rendering with UK digit grouping.
//!
//! Output is built by hand rather than through a locale database so the same
//! amount always yields the same bytes on every host.

use crate::error::{CoreError, CoreResult};

const CURRENCY_SYMBOL: char = '£';
const GROUP_SEPARATOR: char = ',';

/// Formats a whole-pound amount, e.g. `2500000.0` as `£2,500,000`.
///
/// Halves round away from zero. Negative and non-finite amounts are rejected
/// with `InvalidAmount`.
pub fn format_gbp(amount: f64) -> CoreResult<String> {
    if !amount.is_finite() {
        return Err(CoreError::invalid_amount(format!(
            "amount must be finite, got {amount}"
        )));
    }
    if amount < 0.0 {
        return Err(CoreError::invalid_amount(format!(
            "amount must not be negative, got {amount}"
        )));
    }

    // Adding 0.0 folds -0.0 into 0.0.
    let whole = amount.round() + 0.0;
    let digits = format!("{whole:.0}");

    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 2);
    out.push(CURRENCY_SYMBOL);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            out.push(GROUP_SEPARATOR);
        }
        out.push(digit);
    }
    Ok(out)
}
