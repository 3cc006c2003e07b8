use crate::field::Field;
use thiserror::Error;

/// Crate specific Errors implementation.
///
/// Every variant describes caller input that violated a precondition,
/// the call that returned it has not modified the job.
#[derive(Debug, Error, Clone, PartialEq, Eq, Hash)]
pub enum CronError {
    /// Numeric value outside the closed range of its field.
    #[error("invalid {field} value: {value}")]
    OutOfRange {
        /// Field the value was intended for.
        field: Field,
        /// Rejected value.
        value: i64,
    },
    /// Month or weekday name matches none or more than one of the known names.
    #[error("unresolvable {field} name: {name:?}")]
    UnresolvedName {
        /// Field the name was intended for.
        field: Field,
        /// Rejected name.
        name: String,
    },
    /// Operation requires state the job doesn't have yet.
    #[error("missing prerequisite: {0}")]
    MissingPrerequisite(&'static str),
    /// Imported cron expression has a wrong number of fields.
    #[error("invalid cron expression: {0:?}")]
    InvalidExpression(String),
    /// Offset arithmetic produced a datetime that can't be represented.
    #[error("datetime out of range")]
    DateTimeOverflow,
}

/// Error returned by the execution callback, passed through [`Job::execute`](crate::Job::execute) untouched.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync + 'static>;
