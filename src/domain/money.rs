//! Monetary rounding and whole-share arithmetic.
//!
//! Every cash amount that gets rounded goes through [`round_money`], so the
//! whole crate uses a single policy: two decimal places, ties to even.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use super::error::GemtraderError;

pub const MONEY_DP: u32 = 2;

pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointNearestEven)
}

/// Splits `cash` into the number of whole shares purchasable at `price` and
/// the unrounded remainder.
///
/// Uses the exact decimal remainder rather than a division so the share count
/// never picks up a rounding error from a non-terminating quotient.
pub fn whole_shares(cash: Decimal, price: Decimal) -> Result<(u64, Decimal), GemtraderError> {
    if price <= Decimal::ZERO {
        return Err(GemtraderError::Arithmetic {
            reason: format!("cannot buy at non-positive price {price}"),
        });
    }
    if cash <= Decimal::ZERO {
        return Ok((0, cash));
    }
    let remainder = cash % price;
    let shares = to_share_count((cash - remainder) / price)?;
    Ok((shares, remainder))
}

/// Converts an integral, non-negative decimal into a share count.
pub fn to_share_count(value: Decimal) -> Result<u64, GemtraderError> {
    value
        .trunc()
        .to_u64()
        .ok_or_else(|| GemtraderError::Arithmetic {
            reason: format!("share count {value} out of range"),
        })
}
