//! Money amounts: parsing client input, rounding rules and SQLite storage.
//!
//! Amounts are [Decimal]s stored as TEXT so sums never pick up float drift.
//! All rounding is half-up (midpoint away from zero).
//!
//! Single amounts are capped at [MAX_AMOUNT] when they come in. Sums and
//! ratios of stored amounts use checked arithmetic and fail with
//! [Error::AmountOverflow] instead of panicking.

use std::str::FromStr;

use rusqlite::{Row, types::Type};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;

use crate::Error;

/// The largest amount accepted for an expense, saving, budget or savings goal.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// An amount sent by a client, either as a JSON number or a numeric string.
///
/// Browser forms submit field values as strings, so both are accepted.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    /// A JSON number, e.g. `12.5`.
    Number(serde_json::Number),
    /// A string holding a number, e.g. `"12.50"`.
    Text(String),
}

impl AmountInput {
    /// Convert the input into a [Decimal].
    ///
    /// # Errors
    /// Returns [Error::InvalidArgument] if the input is not a number.
    pub fn to_decimal(&self) -> Result<Decimal, Error> {
        match self {
            AmountInput::Number(number) => parse_amount(&number.to_string()),
            AmountInput::Text(text) => parse_amount(text),
        }
    }

    /// Convert the input into a [Decimal] greater than zero and at most [MAX_AMOUNT].
    pub fn to_positive_decimal(&self, field: &str) -> Result<Decimal, Error> {
        let amount = self.to_decimal()?;

        if amount <= Decimal::ZERO {
            return Err(Error::InvalidArgument(format!(
                "{field} must be greater than zero, got {amount}"
            )));
        }

        check_amount_limit(amount, field)
    }
}

impl From<Decimal> for AmountInput {
    fn from(value: Decimal) -> Self {
        AmountInput::Text(value.to_string())
    }
}

/// Parse a decimal amount, accepting plain and scientific notation.
pub fn parse_amount(text: &str) -> Result<Decimal, Error> {
    let text = text.trim();

    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .map_err(|_| Error::InvalidArgument(format!("\"{text}\" is not a valid amount")))
}

/// Check that `amount` is no more than [MAX_AMOUNT].
///
/// # Errors
/// Returns [Error::InvalidArgument] naming `field` if the amount is too large.
pub fn check_amount_limit(amount: Decimal, field: &str) -> Result<Decimal, Error> {
    if amount > MAX_AMOUNT {
        return Err(Error::InvalidArgument(format!(
            "{field} cannot be more than {MAX_AMOUNT}, got {amount}"
        )));
    }

    Ok(amount)
}

/// `left + right`, or [Error::AmountOverflow] if the sum does not fit.
pub fn add_amounts(left: Decimal, right: Decimal) -> Result<Decimal, Error> {
    left.checked_add(right).ok_or(Error::AmountOverflow)
}

/// The sum of `amounts`, or [Error::AmountOverflow] if it does not fit.
pub fn sum_amounts(amounts: impl IntoIterator<Item = Decimal>) -> Result<Decimal, Error> {
    amounts.into_iter().try_fold(Decimal::ZERO, add_amounts)
}

/// Round a money amount to cents.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Round a percentage to one decimal place.
pub fn round_percentage(percentage: Decimal) -> Decimal {
    percentage.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}

/// `part / whole * 100`, or zero when `whole` is not positive.
///
/// # Errors
/// Returns [Error::AmountOverflow] if `part` is so much larger than `whole`
/// that the percentage does not fit.
pub fn percentage_of(part: Decimal, whole: Decimal) -> Result<Decimal, Error> {
    if whole <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }

    part.checked_div(whole)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .ok_or(Error::AmountOverflow)
}

/// Format an amount with exactly two decimal places, e.g. "12.50".
pub fn format_money(amount: Decimal) -> String {
    let mut rounded = round_money(amount);
    rounded.rescale(2);
    rounded.to_string()
}

/// Format a percentage with exactly one decimal place, e.g. "42.0".
pub fn format_percentage(percentage: Decimal) -> String {
    let mut rounded = round_percentage(percentage);
    rounded.rescale(1);
    rounded.to_string()
}

/// Read a TEXT column holding a decimal amount.
pub(crate) fn get_decimal(row: &Row, index: usize) -> Result<Decimal, rusqlite::Error> {
    let text: String = row.get(index)?;

    Decimal::from_str(&text)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(error)))
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use crate::{
        Error,
        money::{
            AmountInput, MAX_AMOUNT, check_amount_limit, format_money, format_percentage,
            parse_amount, percentage_of, round_money, sum_amounts,
        },
    };

    #[test]
    fn accepts_numbers_and_numeric_strings() {
        let number: AmountInput = serde_json::from_str("12.5").unwrap();
        let text: AmountInput = serde_json::from_str("\"12.50\"").unwrap();

        assert_eq!(number.to_decimal(), Ok(dec!(12.5)));
        assert_eq!(text.to_decimal(), Ok(dec!(12.50)));
    }

    #[test]
    fn rejects_non_numeric_text() {
        assert!(matches!(parse_amount("twelve"), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn positive_amount_rejects_zero() {
        let zero = AmountInput::from(dec!(0));

        assert!(matches!(
            zero.to_positive_decimal("amount"),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn positive_amount_rejects_more_than_the_limit() {
        let huge = AmountInput::Text("1e27".to_owned());

        assert!(matches!(
            huge.to_positive_decimal("amount"),
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(
            AmountInput::from(MAX_AMOUNT).to_positive_decimal("amount"),
            Ok(MAX_AMOUNT)
        );
    }

    #[test]
    fn amount_limit_is_one_billion() {
        assert_eq!(MAX_AMOUNT, dec!(1000000000));
        assert!(check_amount_limit(dec!(1000000000.01), "limit").is_err());
    }

    #[test]
    fn sum_overflow_is_an_error() {
        assert_eq!(sum_amounts([dec!(1.5), dec!(2.25)]), Ok(dec!(3.75)));
        assert_eq!(
            sum_amounts([rust_decimal::Decimal::MAX, dec!(1)]),
            Err(Error::AmountOverflow)
        );
    }

    #[test]
    fn percentage_overflow_is_an_error() {
        assert_eq!(
            percentage_of(parse_amount("1e27").unwrap(), dec!(0.01)),
            Err(Error::AmountOverflow)
        );
    }

    #[test]
    fn rounds_midpoint_away_from_zero() {
        assert_eq!(round_money(dec!(0.505)), dec!(0.51));
        assert_eq!(round_money(dec!(0.515)), dec!(0.52));
        assert_eq!(round_money(dec!(155.1724)), dec!(155.17));
    }

    #[test]
    fn percentage_of_zero_whole_is_zero() {
        assert_eq!(percentage_of(dec!(50), dec!(0)), Ok(dec!(0)));
        assert_eq!(percentage_of(dec!(50), dec!(200)), Ok(dec!(25)));
    }

    #[test]
    fn formats_with_fixed_places() {
        assert_eq!(format_money(dec!(5)), "5.00");
        assert_eq!(format_money(dec!(3.333)), "3.33");
        assert_eq!(format_percentage(dec!(42)), "42.0");
    }
}
