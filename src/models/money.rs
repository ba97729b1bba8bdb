use crate::error::{AppError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

/// Number of fractional digits carried by every ledger amount.
pub const CENT_SCALE: u32 = 2;

/// Rounds to cents, half away from zero, and pins the scale to two digits
/// so `10` renders as `10.00`.
pub fn round2(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(CENT_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(CENT_SCALE);
    rounded
}

/// Exclusive upper bound of a ledger amount. `NUMERIC(18, 2)` keeps at most
/// sixteen integer digits.
pub const AMOUNT_LIMIT: Decimal = Decimal::from_parts(1_874_919_424, 2_328_306, 0, false, 0);

/// Validates that an amount is strictly positive and below [`AMOUNT_LIMIT`],
/// then rounds it to cents.
///
/// An amount that rounds down to zero is rejected as well, since ledger rows
/// never carry a zero amount.
pub fn positive_cents(value: Decimal, field: &str) -> Result<Decimal> {
    if value <= Decimal::ZERO {
        return Err(AppError::InvalidArgument(format!("{} must be a positive number", field)));
    }

    let rounded = round2(value);
    if rounded.is_zero() {
        return Err(AppError::InvalidArgument(format!(
            "{} must be at least 0.01 after rounding",
            field
        )));
    }
    if rounded >= AMOUNT_LIMIT {
        return Err(AppError::InvalidArgument(format!(
            "{} must be less than {}",
            field, AMOUNT_LIMIT
        )));
    }

    Ok(rounded)
}

/// Parses a calendar date. Accepts `YYYY-MM-DD` and RFC 3339 timestamps,
/// the latter normalised to the UTC calendar day.
pub fn parse_calendar_date(value: &str, field: &str) -> Result<NaiveDate> {
    let trimmed = value.trim();

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }

    DateTime::parse_from_rfc3339(trimmed)
        .map(|timestamp| timestamp.with_timezone(&Utc).date_naive())
        .map_err(|_| AppError::InvalidArgument(format!("Invalid {}; use YYYY-MM-DD", field)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round2_half_away_from_zero() {
        assert_eq!(round2(dec!(9.999)), dec!(10.00));
        assert_eq!(round2(dec!(0.005)), dec!(0.01));
        assert_eq!(round2(dec!(0.004)), dec!(0.00));
        assert_eq!(round2(dec!(-0.005)), dec!(-0.01));
        assert_eq!(round2(dec!(2.345)), dec!(2.35));
    }

    #[test]
    fn test_round2_pins_scale() {
        assert_eq!(round2(dec!(10)).to_string(), "10.00");
        assert_eq!(round2(dec!(7.5)).to_string(), "7.50");
    }

    #[test]
    fn test_amount_limit_matches_column_range() {
        assert_eq!(AMOUNT_LIMIT, dec!(10000000000000000));
    }

    #[test]
    fn test_positive_cents() {
        assert_eq!(positive_cents(dec!(40), "amount").unwrap(), dec!(40.00));
        assert_eq!(positive_cents(dec!(12.345), "amount").unwrap(), dec!(12.35));
        assert!(positive_cents(Decimal::ZERO, "amount").is_err());
        assert!(positive_cents(dec!(-5), "amount").is_err());
        assert!(positive_cents(dec!(0.004), "amount").is_err());
    }

    #[test]
    fn test_positive_cents_rejects_out_of_range() {
        assert_eq!(
            positive_cents(dec!(9999999999999999.99), "amount").unwrap(),
            dec!(9999999999999999.99)
        );
        let huge = Decimal::from_i128_with_scale(50_000_000_000_000_000_000_000_000_000, 0);
        for value in [AMOUNT_LIMIT, dec!(9999999999999999.995), huge, Decimal::MAX] {
            assert!(matches!(
                positive_cents(value, "amount"),
                Err(AppError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn test_parse_calendar_date() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        assert_eq!(parse_calendar_date("2024-03-15", "date").unwrap(), expected);
        assert_eq!(
            parse_calendar_date("2024-03-15T23:30:00-02:00", "date").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 16).unwrap()
        );
        assert!(parse_calendar_date("2024-02-30", "date").is_err());
        assert!(parse_calendar_date("15/03/2024", "date").is_err());
        assert!(parse_calendar_date("", "date").is_err());
    }
}
