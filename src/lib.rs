//! Fluent builder of cron expressions and of counted or open-ended repeating schedules.
#![deny(unsafe_code, warnings, missing_docs)]

//! This crate is intended to:
//! - build cron expressions from a sequence of fluent calls, with validation of every value;
//! - compute occurrences of repeating schedules, which a plain cron expression can't express:
//!   sub-hour offsets, offsets computed on the fly, a limited number of repetitions,
//!   repetition until some datetime or until a predicate says to stop.
//!
//! Every occurrence of a repeating schedule is re-expressed as a single-shot cron expression,
//! so the result can be fed to any scheduler that understands cron expressions only.
//!
//! _This is not a cron jobs scheduler or runner._ The crate never waits for anything,
//! it produces expressions and datetimes and tells the caller what to do after each execution.
//!
//! ## Cron expression format
//!
//! Expressions have six or seven fields: seconds, minutes, hours, day of month, month,
//! day of week and an optional year. Unset fields render with defaults.
//!
//! | Field        | Allowed values  | Default | Special tokens        |
//! |--------------|-----------------|---------|-----------------------|
//! | Seconds      | 0-59            | `0`     | * , - /               |
//! | Minutes      | 0-59            | `0`     | * , - /               |
//! | Hours        | 0-23            | `0`     | * , - /               |
//! | Day of Month | 1-31            | `*`     | * , - / ? L LW W      |
//! | Month        | 1-12 or JAN-DEC | `*`     | * , - /               |
//! | Day of Week  | 1-7 (Mon-Sun)   | `?`     | * , - / ? # L         |
//! | Year         | 1970-2099       | omitted | * , - /               |
//!
//! Day of month and day of week are mutually exclusive:
//! if day of week has any value, day of month renders as `?`, and vice versa.
//!
//! Months and days of week accept names: any case-insensitive prefix of the three-letter
//! abbreviation, or any string starting with it (`jan`, `January`, `Fri`, `friday`),
//! as long as it matches exactly one name. Days of week given as numbers start from Monday:
//! `0` is Monday and `6` is Sunday (`7` is Monday again), while rendered values are `1` (Monday)
//! to `7` (Sunday).
//!
//! ## How to use
//!
//! The central entity is a [`Job`], built in one of two modes.
//!
//! ### Cron mode
//! ```rust
//! use cron_forge::{Job, Result};
//!
//! fn cron_mode() -> Result<()> {
//!     let mut job: Job = Job::new("report", |_| Ok(()));
//!     job.at_time(9, 30, 0)?
//!         .between_days_of_week("Mon", "Fri")?;
//!     assert_eq!(job.cron_expression(), "0 30 9 ? * 1-5");
//!
//!     let mut job: Job = Job::new("cleanup", |_| Ok(()));
//!     job.from_day(1)?.every_days(10)?.in_month("jan")?.in_month(7)?;
//!     assert_eq!(job.cron_expression(), "0 0 0 1/10 1,7 ?");
//!
//!     Ok(())
//! }
//! # cron_mode().unwrap();
//! ```
//!
//! ### Repeat mode
//! ```rust
//! use chrono::{DateTime, TimeDelta, Utc};
//! use cron_forge::{FireOutcome, Job, Result};
//!
//! fn repeat_mode() -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let start: DateTime<Utc> = "2030-05-01T10:00:00Z".parse()?;
//!     let mut job = Job::new("poll", |ctx| {
//!         println!("{} fired {} times before", ctx.name, ctx.repeat_count);
//!         Ok(())
//!     });
//!     job.start_at(start)?.after_minutes(10)?.repeat(2)?;
//!
//!     assert_eq!(job.next_datetime()?, start + TimeDelta::minutes(10));
//!     assert_eq!(job.arm().as_deref(), Some("0 10 10 1 5 ? 2030"));
//!
//!     // The scheduler fires the job and follows the outcome.
//!     assert_eq!(job.execute()?, FireOutcome::Rearm("0 20 10 1 5 ? 2030".to_string()));
//!     assert_eq!(job.execute()?, FireOutcome::Finished);
//!
//!     Ok(())
//! }
//! # repeat_mode().unwrap();
//! ```
//!
//! # Feature flags
//! * `serde`: adds [`Serialize`](https://docs.rs/serde/latest/serde/trait.Serialize.html) and [`Deserialize`](https://docs.rs/serde/latest/serde/trait.Deserialize.html) trait implementation for [`CronFields`].

/// Crate specific Error implementation.
pub mod error;
/// Cron fields and their valid ranges.
pub mod field;
/// Cron fields accumulator and renderer.
pub mod fields;
/// Offsets of a repeating job.
pub mod interval;
/// Job facade: fluent configuration and execution lifecycle.
pub mod job;
/// Month and day of week names resolution.
pub mod names;
/// Decision whether a repeating job continues.
pub mod policy;
/// Elements of cron fields.
pub mod token;

// Re-export of public entities.
pub use error::{CallbackError, CronError};
pub use field::Field;
pub use fields::CronFields;
pub use interval::Interval;
pub use job::{FireOutcome, Job, JobContext, JobState};
pub use names::NamedValue;
pub use policy::RepeatPolicy;
pub use token::Token;

/// Convenient alias for `Result`.
pub type Result<T, E = CronError> = std::result::Result<T, E>;
