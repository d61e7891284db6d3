//! Optional date bounds for listing records and computing summaries.

use serde::Deserialize;
use time::Date;

use crate::Error;

/// An inclusive date range where either end may be open.
///
/// Used as query parameters, e.g. `?from=2024-01-01&to=2024-06-30`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DateRange {
    /// The earliest date to include.
    pub from: Option<Date>,
    /// The latest date to include.
    pub to: Option<Date>,
}

impl DateRange {
    /// A range covering every date.
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a range, checking that `from` is not after `to`.
    ///
    /// # Errors
    /// Returns [Error::InvalidDateRange] if `from` is after `to`.
    pub fn new(from: Option<Date>, to: Option<Date>) -> Result<Self, Error> {
        Self { from, to }.validate()
    }

    /// Check the range deserialized from a request.
    ///
    /// # Errors
    /// Returns [Error::InvalidDateRange] if `from` is after `to`.
    pub fn validate(self) -> Result<Self, Error> {
        match (self.from, self.to) {
            (Some(from), Some(to)) if from > to => Err(Error::InvalidDateRange(from, to)),
            _ => Ok(self),
        }
    }

    /// Whether `date` falls inside the range.
    pub fn contains(&self, date: Date) -> bool {
        self.from.is_none_or(|from| from <= date) && self.to.is_none_or(|to| date <= to)
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::Error;

    use super::DateRange;

    #[test]
    fn open_range_contains_everything() {
        let range = DateRange::all();

        assert!(range.contains(date!(1970 - 01 - 01)));
        assert!(range.contains(date!(2999 - 12 - 31)));
    }

    #[test]
    fn bounds_are_inclusive() {
        let range = DateRange::new(Some(date!(2024 - 01 - 01)), Some(date!(2024 - 01 - 31))).unwrap();

        assert!(range.contains(date!(2024 - 01 - 01)));
        assert!(range.contains(date!(2024 - 01 - 31)));
        assert!(!range.contains(date!(2023 - 12 - 31)));
        assert!(!range.contains(date!(2024 - 02 - 01)));
    }

    #[test]
    fn half_open_range() {
        let range = DateRange::new(Some(date!(2024 - 01 - 01)), None).unwrap();

        assert!(!range.contains(date!(2023 - 12 - 31)));
        assert!(range.contains(date!(2030 - 01 - 01)));
    }

    #[test]
    fn rejects_reversed_range() {
        let result = DateRange::new(Some(date!(2024 - 02 - 01)), Some(date!(2024 - 01 - 01)));

        assert_eq!(
            result,
            Err(Error::InvalidDateRange(
                date!(2024 - 02 - 01),
                date!(2024 - 01 - 01)
            ))
        );
    }

    #[test]
    fn single_day_range_is_valid() {
        assert!(DateRange::new(Some(date!(2024 - 02 - 01)), Some(date!(2024 - 02 - 01))).is_ok());
    }
}
