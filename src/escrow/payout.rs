use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Traveler receives 80% of the total, the platform keeps 20%.
const TRAVELER_SHARE_PERCENT: i64 = 80;
const PLATFORM_SHARE_PERCENT: i64 = 20;

/// Computed payout split in minor currency units (paise).
///
/// The two shares are rounded independently, matching the reference
/// behavior. For paise-integral totals the shares always conserve the total
/// exactly (80% of an integer number of paise can never land on a .5
/// boundary), so no reconciliation step is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayoutSplit {
    pub traveler_minor: i64,
    pub platform_minor: i64,
}

/// Converts a major-unit amount to minor units, rounding halves away from
/// zero.
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    (amount * Decimal::new(100, 0))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

/// Splits `total` (major units) into traveler and platform payouts.
pub fn split(total: Decimal) -> Option<PayoutSplit> {
    let traveler_minor = to_minor_units(total * Decimal::new(TRAVELER_SHARE_PERCENT, 2))?;
    let platform_minor = to_minor_units(total * Decimal::new(PLATFORM_SHARE_PERCENT, 2))?;

    Some(PayoutSplit {
        traveler_minor,
        platform_minor,
    })
}
