//! Helpers for storing and displaying amounts of money.
//!
//! All arithmetic is done on exact [Decimal] values. Rounding only happens when
//! an amount is about to be shown to a person.

use std::{str::FromStr, sync::OnceLock};

use numfmt::{Formatter, Precision};
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};

/// The number of decimal places shown for currency amounts.
pub const CURRENCY_DECIMAL_PLACES: u32 = 2;

/// The largest amount a single expense or settlement may have.
///
/// Amounts are sent as JSON numbers, which are read as `f64`. Below this limit
/// an amount, and any total of up to a few thousand of them, keeps every cent
/// through a JSON round trip.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Round `amount` to whole cents, with halves rounded away from zero.
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(
        CURRENCY_DECIMAL_PLACES,
        RoundingStrategy::MidpointAwayFromZero,
    )
}

/// Format `amount` as dollars and cents, e.g. "$1,234.57" or "-$3.00".
///
/// The amount is rounded with [round_currency] first.
pub fn format_currency(amount: Decimal) -> String {
    static POSITIVE_FMT: OnceLock<Formatter> = OnceLock::new();

    let positive_fmt = POSITIVE_FMT.get_or_init(|| {
        Formatter::currency("$")
            .expect("\"$\" is a valid currency prefix")
            .precision(Precision::Decimals(0))
    });

    static NEGATIVE_FMT: OnceLock<Formatter> = OnceLock::new();

    let negative_fmt = NEGATIVE_FMT.get_or_init(|| {
        Formatter::currency("-$")
            .expect("\"-$\" is a valid currency prefix")
            .precision(Precision::Decimals(0))
    });

    let rounded = round_currency(amount);
    let magnitude = rounded.abs();
    let dollars = magnitude.trunc();
    let cents = ((magnitude - dollars) * Decimal::ONE_HUNDRED)
        .to_u32()
        .unwrap_or_default();
    let whole_dollars = dollars.to_f64().unwrap_or_default();

    // numfmt renders zero as "0" without the prefix.
    let dollars_text = if dollars.is_zero() {
        if rounded.is_sign_negative() && !rounded.is_zero() {
            "-$0".to_owned()
        } else {
            "$0".to_owned()
        }
    } else if rounded.is_sign_negative() {
        negative_fmt.fmt_string(whole_dollars)
    } else {
        positive_fmt.fmt_string(whole_dollars)
    };

    format!("{dollars_text}.{cents:02}")
}

/// Parse an amount that was stored as text in the database.
///
/// `column` is the index of the column the text came from and is used for
/// error reporting.
pub(crate) fn parse_stored_amount(text: &str, column: usize) -> Result<Decimal, rusqlite::Error> {
    Decimal::from_str(text).map_err(|error| {
        tracing::error!("could not parse stored amount {text:?}: {error}");
        rusqlite::Error::FromSqlConversionFailure(
            column,
            rusqlite::types::Type::Text,
            Box::new(error),
        )
    })
}

#[cfg(test)]
mod round_currency_tests {
    use rust_decimal_macros::dec;

    use super::round_currency;

    #[test]
    fn rounds_half_cent_away_from_zero() {
        assert_eq!(round_currency(dec!(50.005)), dec!(50.01));
        assert_eq!(round_currency(dec!(-50.005)), dec!(-50.01));
    }

    #[test]
    fn keeps_whole_cents() {
        assert_eq!(round_currency(dec!(12.34)), dec!(12.34));
    }

    #[test]
    fn rounds_down_below_midpoint() {
        assert_eq!(round_currency(dec!(0.004)), dec!(0.00));
    }
}

#[cfg(test)]
mod format_currency_tests {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    use super::format_currency;

    #[test]
    fn formats_dollars_and_cents() {
        assert_eq!(format_currency(dec!(12.34)), "$12.34");
    }

    #[test]
    fn pads_cents() {
        assert_eq!(format_currency(dec!(120)), "$120.00");
        assert_eq!(format_currency(dec!(12.3)), "$12.30");
    }

    #[test]
    fn formats_negative_amounts() {
        assert_eq!(format_currency(dec!(-60)), "-$60.00");
    }

    #[test]
    fn formats_zero() {
        assert_eq!(format_currency(Decimal::ZERO), "$0.00");
    }

    #[test]
    fn formats_cents_only() {
        assert_eq!(format_currency(dec!(0.5)), "$0.50");
        assert_eq!(format_currency(dec!(-0.5)), "-$0.50");
    }

    #[test]
    fn rounds_at_display_time() {
        assert_eq!(format_currency(dec!(50.005)), "$50.01");
    }
}

#[cfg(test)]
mod max_amount_tests {
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use serde_json::json;

    use super::MAX_AMOUNT;

    #[test]
    fn is_one_billion() {
        assert_eq!(MAX_AMOUNT, dec!(1_000_000_000));
    }

    #[test]
    fn largest_amounts_survive_json_round_trip() {
        let amounts = [
            MAX_AMOUNT,
            MAX_AMOUNT - dec!(0.01),
            dec!(123_456_789.01),
            // Half of an odd number of cents, as in a fair share.
            dec!(499_999_999.995),
        ];

        for amount in amounts {
            let text = serde_json::to_string(&json!({ "amount": amount })).unwrap();
            let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
            let round_tripped: Decimal = serde_json::from_value(parsed["amount"].clone()).unwrap();

            assert_eq!(round_tripped, amount, "{amount} became {round_tripped} via {text}");
        }
    }
}
