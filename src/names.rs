use crate::{
    field::{Field, FieldValue},
    CronError, Result,
};
use std::fmt::Display;

const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];
const DAYS_OF_WEEK: [&str; 7] = ["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

/// Month or day of week given either as a number or as a (possibly abbreviated) name.
///
/// Usually it isn't constructed explicitly: every method accepting `impl Into<NamedValue>`
/// takes integers and strings as is.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NamedValue {
    /// Number in the caller's convention of the particular field.
    Numeric(i64),
    /// Case-insensitive name or abbreviation, like `jan`, `January` or `Fri`.
    Named(String),
}

macro_rules! numeric_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for NamedValue {
                fn from(value: $t) -> Self {
                    Self::Numeric(value as i64)
                }
            }
        )*
    };
}

numeric_from!(i8, i16, i32, i64, u8, u16, u32);

impl From<&str> for NamedValue {
    fn from(value: &str) -> Self {
        Self::Named(value.to_owned())
    }
}

impl From<String> for NamedValue {
    fn from(value: String) -> Self {
        Self::Named(value)
    }
}

impl From<&String> for NamedValue {
    fn from(value: &String) -> Self {
        Self::Named(value.clone())
    }
}

impl Display for NamedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NamedValue::Numeric(value) => write!(f, "{value}"),
            NamedValue::Named(name) => write!(f, "{name}"),
        }
    }
}

/// Resolves a month into `1-12` numbering.
///
/// Numbers pass through unchanged (range is checked by the caller),
/// names resolve by unique prefix against `JAN`..`DEC`.
pub fn resolve_month(value: &NamedValue) -> Option<i64> {
    match value {
        NamedValue::Numeric(month) => Some(*month),
        NamedValue::Named(name) => unique_prefix_match(name, &MONTHS).map(|i| i as i64 + 1),
    }
}

/// Resolves a day of week into `1-7` numbering, where `1` is Monday and `7` is Sunday.
///
/// Numbers are zero-based starting from Monday: `0` is Monday, `6` is Sunday,
/// and `7` wraps around to Monday. Names resolve by unique prefix against `SUN`..`SAT`.
pub fn resolve_weekday(value: &NamedValue) -> Option<i64> {
    match value {
        NamedValue::Numeric(7) => Some(1),
        NamedValue::Numeric(dow) => dow.checked_add(1),
        NamedValue::Named(name) => unique_prefix_match(name, &DAYS_OF_WEEK).map(|i| match i {
            0 => 7,
            i => i as i64,
        }),
    }
}

/// Resolves and validates a month.
pub(crate) fn month_value(value: &NamedValue) -> Result<FieldValue> {
    resolve_validated(Field::Months, value, resolve_month(value))
}

/// Resolves and validates a day of week.
pub(crate) fn weekday_value(value: &NamedValue) -> Result<FieldValue> {
    resolve_validated(Field::DaysOfWeek, value, resolve_weekday(value))
}

fn resolve_validated(field: Field, input: &NamedValue, resolved: Option<i64>) -> Result<FieldValue> {
    match (input, resolved) {
        (_, Some(value)) => field.validate(value),
        (NamedValue::Numeric(value), None) => Err(CronError::OutOfRange { field, value: *value }),
        (NamedValue::Named(name), None) => Err(CronError::UnresolvedName {
            field,
            name: name.clone(),
        }),
    }
}

/// Returns index of the single variant which is a prefix of the input or vice versa.
///
/// Returns `None` if there are no such variants or more than one.
fn unique_prefix_match(input: &str, variants: &[&str]) -> Option<usize> {
    let input = input.to_uppercase();
    let mut matched = variants
        .iter()
        .enumerate()
        .filter(|(_, variant)| variant.starts_with(input.as_str()) || input.starts_with(*variant))
        .map(|(i, _)| i);

    match (matched.next(), matched.next()) {
        (Some(index), None) => Some(index),
        _ => None,
    }
}
