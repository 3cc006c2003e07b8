use crate::{
    field::{Field, FieldValue},
    token::Token,
    CronError, Result,
};
use chrono::{DateTime, Datelike, TimeZone, Timelike};
use std::{fmt::Display, str::FromStr};

/// Accumulator of cron fields, each one an ordered list of [`Token`]s.
///
/// Rendering (via [`Display`]) produces `second minute hour day month weekday[ year]`:
/// - empty second, minute and hour render as `0`, empty month as `*`;
/// - day of month and day of week are mutually exclusive: if the weekday field has tokens,
///   the day field renders as `?`, otherwise the weekday renders as `?` and an empty day as `*`;
/// - an empty year is omitted, so the expression has six fields.
///
/// ```rust
/// use cron_forge::{CronFields, Field, Token};
///
/// let mut fields = CronFields::new();
/// fields.set_single(Field::Minutes, Token::Single(30));
/// fields.append(Field::DaysOfWeek, Token::Range(1, 5));
/// assert_eq!(fields.to_string(), "0 30 0 ? * 1-5");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String"))]
#[cfg_attr(feature = "serde", serde(into = "String"))]
pub struct CronFields {
    fields: [Vec<Token>; 7],
}

impl CronFields {
    /// Constructs an empty instance, which renders as `0 0 0 * * ?`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokens of the field in the order they were added.
    pub fn tokens(&self, field: Field) -> &[Token] {
        &self.fields[field.index()]
    }

    /// Replaces content of the field with exactly one token.
    pub fn set_single(&mut self, field: Field, token: Token) {
        self.fields[field.index()] = vec![token];
    }

    /// Adds one more token to the field.
    pub fn append(&mut self, field: Field, token: Token) {
        self.fields[field.index()].push(token);
    }

    /// Turns the last added token of the field into a step expression with the `interval`.
    ///
    /// Returns [`CronError::MissingPrerequisite`] if the field has no tokens yet.
    pub fn append_step(&mut self, field: Field, interval: i64) -> Result<()> {
        let interval = field.validate_step(interval)?;
        let last = self.fields[field.index()]
            .pop()
            .ok_or(CronError::MissingPrerequisite(
                "step interval requires a preceding value or range in the same field",
            ))?;
        self.fields[field.index()].push(last.with_step(interval));
        Ok(())
    }

    /// Replaces content of the field with a single `*`.
    pub fn set_wildcard(&mut self, field: Field) {
        self.set_single(field, Token::Wildcard);
    }

    /// Removes all tokens from the field, so it renders with its default.
    pub fn clear(&mut self, field: Field) {
        self.fields[field.index()].clear();
    }

    /// Overwrites all fields with the literal components of `datetime`, leaving day of week empty.
    ///
    /// The result is a single-shot expression which matches `datetime` (with seconds precision) only.
    pub fn set_datetime<Tz: TimeZone>(&mut self, datetime: &DateTime<Tz>) -> Result<()> {
        let year = Field::Years.validate(datetime.year() as i64)?;

        self.set_single(Field::Seconds, Token::Single(datetime.second() as FieldValue));
        self.set_single(Field::Minutes, Token::Single(datetime.minute() as FieldValue));
        self.set_single(Field::Hours, Token::Single(datetime.hour() as FieldValue));
        self.set_single(Field::DaysOfMonth, Token::Single(datetime.day() as FieldValue));
        self.set_single(Field::Months, Token::Single(datetime.month() as FieldValue));
        self.clear(Field::DaysOfWeek);
        self.set_single(Field::Years, Token::Single(year));

        Ok(())
    }

    /// Parses a 6 or 7 fields expression, storing every field verbatim.
    ///
    /// No validation of field content is made besides the number of fields.
    /// A `?` in the day of month or day of week position is read as an empty field.
    pub fn parse(expression: &str) -> Result<Self> {
        let elements: Vec<&str> = expression.split_whitespace().collect();
        if elements.len() != 6 && elements.len() != 7 {
            return Err(CronError::InvalidExpression(expression.to_owned()));
        }

        let mut fields = Self::new();
        for (field, element) in Field::ALL.iter().zip(elements) {
            let any_allowed = matches!(field, Field::DaysOfMonth | Field::DaysOfWeek);
            if !(any_allowed && element == "?") {
                fields.set_single(*field, Token::Raw(element.to_owned()));
            }
        }

        Ok(fields)
    }

    fn render_field(&self, field: Field) -> Option<String> {
        let tokens = self.tokens(field);
        if tokens.is_empty() {
            return None;
        }

        Some(tokens.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(","))
    }
}

impl Display for CronFields {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let time = |field| self.render_field(field).unwrap_or_else(|| "0".to_owned());
        let dow = self.render_field(Field::DaysOfWeek);
        let dom = if dow.is_some() {
            "?".to_owned()
        } else {
            self.render_field(Field::DaysOfMonth).unwrap_or_else(|| "*".to_owned())
        };

        write!(
            f,
            "{} {} {} {} {} {}",
            time(Field::Seconds),
            time(Field::Minutes),
            time(Field::Hours),
            dom,
            self.render_field(Field::Months).unwrap_or_else(|| "*".to_owned()),
            dow.unwrap_or_else(|| "?".to_owned()),
        )?;

        if let Some(year) = self.render_field(Field::Years) {
            write!(f, " {year}")?;
        }

        Ok(())
    }
}

impl From<CronFields> for String {
    fn from(value: CronFields) -> Self {
        value.to_string()
    }
}

impl From<&CronFields> for String {
    fn from(value: &CronFields) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for CronFields {
    type Error = CronError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl TryFrom<&str> for CronFields {
    type Error = CronError;

    fn try_from(value: &str) -> Result<Self> {
        Self::parse(value)
    }
}

impl FromStr for CronFields {
    type Err = CronError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use rstest::rstest;

    #[test]
    fn empty_fields_render_defaults() {
        assert_eq!(CronFields::new().to_string(), "0 0 0 * * ?");
    }

    #[test]
    fn single_second_keeps_other_defaults() {
        for second in 0..=59 {
            let mut fields = CronFields::new();
            fields.set_single(Field::Seconds, Token::Single(second));
            assert_eq!(fields.to_string(), format!("{second} 0 0 * * ?"));
        }
    }

    #[test]
    fn day_of_month_suppresses_day_of_week() {
        for day in 1..=31 {
            let mut fields = CronFields::new();
            fields.append(Field::DaysOfMonth, Token::Single(day));
            assert_eq!(fields.to_string(), format!("0 0 0 {day} * ?"));
        }
    }

    #[rstest]
    #[case(vec![], "0 0 0 ? * 3")]
    #[case(vec![Token::Single(15)], "0 0 0 ? * 3")]
    #[case(vec![Token::LastDay], "0 0 0 ? * 3")]
    fn day_of_week_suppresses_day_of_month(#[case] doms: Vec<Token>, #[case] expected: &str) {
        let mut fields = CronFields::new();
        for dom in doms {
            fields.append(Field::DaysOfMonth, dom);
        }
        fields.append(Field::DaysOfWeek, Token::Single(3));
        assert_eq!(fields.to_string(), expected);
    }

    #[test]
    fn multiple_tokens_are_comma_joined() {
        let mut fields = CronFields::new();
        fields.append(Field::Months, Token::Single(1));
        fields.append(Field::Months, Token::Range(6, 8));
        fields.append(Field::Months, Token::Single(12));
        fields.append(Field::Years, Token::Single(2030));
        assert_eq!(fields.to_string(), "0 0 0 * 1,6-8,12 ? 2030");
    }

    #[rstest]
    #[case(Token::Single(5), 2, "5/2")]
    #[case(Token::Range(5, 10), 3, "5-10/3")]
    #[case(Token::Wildcard, 7, "*/7")]
    fn step_wraps_last_token(#[case] token: Token, #[case] interval: i64, #[case] expected: &str) {
        let mut fields = CronFields::new();
        fields.append(Field::DaysOfMonth, Token::Single(1));
        fields.append(Field::DaysOfMonth, token);
        fields.append_step(Field::DaysOfMonth, interval).unwrap();
        assert_eq!(fields.to_string(), format!("0 0 0 1,{expected} * ?"));
    }

    #[rstest]
    #[case(Field::DaysOfMonth)]
    #[case(Field::Months)]
    #[case(Field::DaysOfWeek)]
    #[case(Field::Years)]
    fn step_requires_preceding_token(#[case] field: Field) {
        let mut fields = CronFields::new();
        assert!(matches!(
            fields.append_step(field, 2),
            Err(CronError::MissingPrerequisite(_))
        ));
        assert_eq!(fields, CronFields::new());
    }

    #[test]
    fn invalid_step_keeps_field_untouched() {
        let mut fields = CronFields::new();
        fields.append(Field::Hours, Token::Single(1));
        assert_eq!(
            fields.append_step(Field::Hours, 0),
            Err(CronError::OutOfRange {
                field: Field::Hours,
                value: 0
            })
        );
        assert_eq!(fields.tokens(Field::Hours), &[Token::Single(1)]);
    }

    #[test]
    fn wildcard_replaces_field() {
        let mut fields = CronFields::new();
        fields.append(Field::Minutes, Token::Single(1));
        fields.append(Field::Minutes, Token::Single(2));
        fields.set_wildcard(Field::Minutes);
        assert_eq!(fields.to_string(), "0 * 0 * * ?");
    }

    #[rstest]
    #[case("2024-02-29T13:45:07Z", "7 45 13 29 2 ? 2024")]
    #[case("1999-12-31T23:59:59.999Z", "59 59 23 31 12 ? 1999")]
    #[case("2099-01-01T00:00:00+02:00", "0 0 0 1 1 ? 2099")]
    fn datetime_is_projected_into_fields(#[case] datetime: &str, #[case] expected: &str) {
        let datetime = DateTime::parse_from_rfc3339(datetime).unwrap();
        let mut fields = CronFields::new();
        fields.append(Field::DaysOfWeek, Token::Single(1));
        fields.set_datetime(&datetime).unwrap();
        assert_eq!(fields.to_string(), expected);
    }

    #[test]
    fn datetime_outside_of_years_range_is_rejected() {
        let datetime = DateTime::parse_from_rfc3339("2100-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let mut fields = CronFields::new();
        assert_eq!(
            fields.set_datetime(&datetime),
            Err(CronError::OutOfRange {
                field: Field::Years,
                value: 2100
            })
        );
        assert_eq!(fields, CronFields::new());
    }

    #[rstest]
    #[case("0 0 0 * * ?")]
    #[case("30 15 10 ? * 6L 2030")]
    #[case("0 0 12 LW * ? 2025")]
    #[case("0 0/5 14 * * ?")]
    #[case("0 15 10 ? * 2#3")]
    #[case("0 0 0 15W 1,6 ? 2024-2030")]
    #[case("1 2 3 4 5 ? 2006")]
    fn import_export_round_trip(#[case] expression: &str) {
        let fields: CronFields = expression.parse().unwrap();
        assert_eq!(fields.to_string(), expression);
    }

    #[test]
    fn import_normalizes_whitespace() {
        let fields = CronFields::parse("  0   5 10 * *  ?  ").unwrap();
        assert_eq!(fields.to_string(), "0 5 10 * * ?");
    }

    #[rstest]
    #[case("")]
    #[case("0 0 0 * *")]
    #[case("0 0 0 * * ? 2020 extra")]
    #[case("@daily")]
    fn import_rejects_wrong_fields_number(#[case] expression: &str) {
        assert_eq!(
            CronFields::parse(expression),
            Err(CronError::InvalidExpression(expression.to_owned()))
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_as_string() {
        let mut fields = CronFields::new();
        fields.append(Field::DaysOfMonth, Token::LastDay);
        let json = serde_json::to_string(&fields).unwrap();
        assert_eq!(json, "\"0 0 0 L * ?\"");
        let restored: CronFields = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.to_string(), fields.to_string());
        assert!(serde_json::from_str::<CronFields>("\"0 0\"").is_err());
    }
}
