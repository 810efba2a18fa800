//! Scaling a monthly budget to the part of a month that was tracked.

use rust_decimal::Decimal;
use time::Date;

use crate::{Error, calendar::YearMonth, money::round_money};

/// The budget available in `month` given the date the user started tracking.
///
/// - No tracking start, or a start before `month`: the full `monthly_limit`.
/// - A start after `month`: zero.
/// - A start within `month`: the limit scaled by the fraction of days from the
///   start date to the end of the month (inclusive), rounded half-up to cents.
///
/// # Errors
/// Returns [Error::AmountOverflow] if the limit is too large to scale.
pub fn prorate(
    monthly_limit: Decimal,
    tracking_start: Option<Date>,
    month: YearMonth,
) -> Result<Decimal, Error> {
    let Some(tracking_start) = tracking_start else {
        return Ok(monthly_limit);
    };

    let tracking_month = YearMonth::of(tracking_start);

    if tracking_month < month {
        return Ok(monthly_limit);
    }

    if tracking_month > month {
        return Ok(Decimal::ZERO);
    }

    let days_in_month = Decimal::from(month.days_in_month());
    let days_tracked = days_in_month - Decimal::from(tracking_start.day()) + Decimal::ONE;

    monthly_limit
        .checked_mul(days_tracked)
        .and_then(|scaled| scaled.checked_div(days_in_month))
        .map(round_money)
        .ok_or(Error::AmountOverflow)
}
