use crate::field::FieldValue;
use std::fmt::Display;

/// Single comma-separated element of a cron field.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Token {
    /// `*`
    Wildcard,
    /// `5`
    Single(FieldValue),
    /// `5-10`
    Range(FieldValue, FieldValue),
    /// `5/2`, `5-10/2`, `*/2`: inner token followed by an interval.
    Step(Box<Token>, FieldValue),
    /// `L`: last day of the month.
    LastDay,
    /// `LW`: last weekday (Monday to Friday) of the month.
    LastWeekday,
    /// `15W`: weekday nearest to the day of month.
    NearestWeekday(FieldValue),
    /// `2#1`: weekday#nth occurrence in the month.
    NthWeekday(FieldValue, FieldValue),
    /// `5L`: last occurrence of the weekday in the month.
    LastWeekdayOfMonth(FieldValue),
    /// Imported field content, rendered verbatim.
    Raw(String),
}

impl Token {
    /// Wraps the token into a step expression with the specified interval.
    pub(crate) fn with_step(self, interval: FieldValue) -> Self {
        Self::Step(Box::new(self), interval)
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Wildcard => write!(f, "*"),
            Token::Single(value) => write!(f, "{value}"),
            Token::Range(start, end) => write!(f, "{start}-{end}"),
            Token::Step(inner, interval) => write!(f, "{inner}/{interval}"),
            Token::LastDay => write!(f, "L"),
            Token::LastWeekday => write!(f, "LW"),
            Token::NearestWeekday(dom) => write!(f, "{dom}W"),
            Token::NthWeekday(dow, nth) => write!(f, "{dow}#{nth}"),
            Token::LastWeekdayOfMonth(dow) => write!(f, "{dow}L"),
            Token::Raw(raw) => write!(f, "{raw}"),
        }
    }
}
