use crate::{CronError, Result};
use std::fmt::Display;

/// Minimum valid year.
pub const MIN_YEAR: u16 = 1970;
/// Maximum valid year.
pub const MAX_YEAR: u16 = 2099;

/// Numeric value of a cron field.
pub type FieldValue = u16;

/// One of the seven fields of a cron expression, in rendering order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    /// Seconds, `0-59`.
    Seconds = 0,
    /// Minutes, `0-59`.
    Minutes = 1,
    /// Hours, `0-23`.
    Hours = 2,
    /// Day of month, `1-31`.
    DaysOfMonth = 3,
    /// Month, `1-12`.
    Months = 4,
    /// Day of week, `1-7` where `1` is Monday.
    DaysOfWeek = 5,
    /// Year, `1970-2099`.
    Years = 6,
}

impl Field {
    /// All fields in rendering order.
    pub const ALL: [Field; 7] = [
        Self::Seconds,
        Self::Minutes,
        Self::Hours,
        Self::DaysOfMonth,
        Self::Months,
        Self::DaysOfWeek,
        Self::Years,
    ];

    /// Closed range of valid values.
    pub fn min_max(&self) -> (FieldValue, FieldValue) {
        match self {
            Self::Seconds => (0, 59),
            Self::Minutes => (0, 59),
            Self::Hours => (0, 23),
            Self::DaysOfMonth => (1, 31),
            Self::Months => (1, 12),
            Self::DaysOfWeek => (1, 7),
            Self::Years => (MIN_YEAR, MAX_YEAR),
        }
    }

    /// Range-checks `value` and narrows it to the field value type.
    pub fn validate(&self, value: i64) -> Result<FieldValue> {
        let (min, max) = self.min_max();
        if value < min as i64 || value > max as i64 {
            Err(CronError::OutOfRange { field: *self, value })
        } else {
            Ok(value as FieldValue)
        }
    }

    /// Checks the interval of a step expression: positive and not wider than the field.
    pub(crate) fn validate_step(&self, interval: i64) -> Result<FieldValue> {
        let span = match self {
            Self::Years => MAX_YEAR - MIN_YEAR,
            _ => self.min_max().1,
        };
        if interval < 1 || interval > span as i64 {
            Err(CronError::OutOfRange {
                field: *self,
                value: interval,
            })
        } else {
            Ok(interval as FieldValue)
        }
    }

    #[inline]
    pub(crate) fn index(&self) -> usize {
        *self as usize
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Seconds => "second",
            Self::Minutes => "minute",
            Self::Hours => "hour",
            Self::DaysOfMonth => "day of month",
            Self::Months => "month",
            Self::DaysOfWeek => "day of week",
            Self::Years => "year",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Field::Seconds, 0)]
    #[case(Field::Seconds, 59)]
    #[case(Field::Minutes, 0)]
    #[case(Field::Minutes, 33)]
    #[case(Field::Hours, 0)]
    #[case(Field::Hours, 23)]
    #[case(Field::DaysOfMonth, 1)]
    #[case(Field::DaysOfMonth, 31)]
    #[case(Field::Months, 1)]
    #[case(Field::Months, 12)]
    #[case(Field::DaysOfWeek, 1)]
    #[case(Field::DaysOfWeek, 7)]
    #[case(Field::Years, 1970)]
    #[case(Field::Years, 2099)]
    fn validate_accepts_bounds(#[case] field: Field, #[case] value: i64) {
        assert_eq!(field.validate(value), Ok(value as FieldValue));
    }

    #[rstest]
    #[case(Field::Seconds, -1)]
    #[case(Field::Seconds, 60)]
    #[case(Field::Minutes, 60)]
    #[case(Field::Hours, 24)]
    #[case(Field::DaysOfMonth, 0)]
    #[case(Field::DaysOfMonth, 32)]
    #[case(Field::Months, 0)]
    #[case(Field::Months, 13)]
    #[case(Field::DaysOfWeek, 0)]
    #[case(Field::DaysOfWeek, 8)]
    #[case(Field::Years, 1969)]
    #[case(Field::Years, 2100)]
    #[case(Field::Years, i64::MAX)]
    fn validate_rejects_out_of_range(#[case] field: Field, #[case] value: i64) {
        assert_eq!(field.validate(value), Err(CronError::OutOfRange { field, value }));
    }

    #[rstest]
    #[case(Field::Seconds, 1, true)]
    #[case(Field::Seconds, 59, true)]
    #[case(Field::Seconds, 0, false)]
    #[case(Field::Seconds, 60, false)]
    #[case(Field::DaysOfMonth, 31, true)]
    #[case(Field::Months, 13, false)]
    #[case(Field::Years, 129, true)]
    #[case(Field::Years, 130, false)]
    #[case(Field::Hours, -2, false)]
    fn validate_step_interval(#[case] field: Field, #[case] interval: i64, #[case] valid: bool) {
        assert_eq!(field.validate_step(interval).is_ok(), valid);
    }

    #[test]
    fn all_fields_are_in_rendering_order() {
        for (index, field) in Field::ALL.iter().enumerate() {
            assert_eq!(field.index(), index);
        }
    }
}
