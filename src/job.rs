use crate::{
    error::CallbackError,
    field::Field,
    fields::CronFields,
    interval::Interval,
    names::{self, NamedValue},
    policy::RepeatPolicy,
    token::Token,
    CronError, Result,
};
use chrono::{DateTime, TimeZone, Utc};
use std::{fmt::Debug, sync::Arc};
use tracing::{debug, trace};

/// Execution callback of a [`Job`].
pub type Callback<Tz> = Box<dyn FnMut(&JobContext<'_, Tz>) -> std::result::Result<(), CallbackError> + Send>;

/// Lifecycle state of a [`Job`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum JobState {
    /// Fluent configuration is in progress, the job hasn't been armed yet.
    Configuring,
    /// The cron expression was handed to a scheduler, waiting for a fire.
    Armed,
    /// The execution callback is running.
    Executing,
    /// Repeating is over, the job shouldn't be registered anymore.
    Terminal,
}

/// What the scheduler should do with the job after [`Job::execute`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FireOutcome {
    /// Register the job again with the new single-shot expression.
    Rearm(String),
    /// Keep the current registration, the expression is recurring by itself (cron mode).
    Recurring,
    /// Don't register the job anymore.
    Finished,
}

/// Occurrence following the last one, as decided by the repeat policy.
enum Upcoming<Tz: TimeZone> {
    /// Policy isn't configured yet.
    Unknown,
    /// Allowed occurrence together with its projection into fields.
    Next(DateTime<Tz>, CronFields),
    Denied,
}

/// Information passed to the execution callback.
#[derive(Debug)]
pub struct JobContext<'a, Tz: TimeZone> {
    /// Name of the job.
    pub name: &'a str,
    /// Number of executions completed before the current one.
    pub repeat_count: u64,
    /// Datetime the current execution was scheduled to, known in repeat mode only.
    pub scheduled_at: Option<&'a DateTime<Tz>>,
}

/// Schedule builder, which produces either a cron expression or a series of computed
/// single-shot occurrences.
///
/// A job works in one of two modes:
/// - **cron mode**: fluent calls like [`at_hour`](Job::at_hour) or [`on_day`](Job::on_day) build
///   a recurring cron expression;
/// - **repeat mode**: [`start_at`](Job::start_at) fixes the start datetime, `after_*` methods
///   accumulate offsets, and `repeat*` methods define how many times (or until when) to repeat.
///   Every occurrence is rendered as a cron expression matching that single datetime only.
///
/// The job doesn't wait for anything itself, a scheduler has to [arm](Job::arm) it,
/// register the returned expression, [execute](Job::execute) it when the expression fires,
/// and follow the returned [`FireOutcome`].
///
/// Any failed fluent call returns an error and leaves the job as it was before the call.
pub struct Job<Tz: TimeZone = Utc> {
    name: String,
    callback: Callback<Tz>,
    fields: CronFields,
    interval: Option<Interval<Tz>>,
    policy: RepeatPolicy<Tz>,
    last: Option<DateTime<Tz>>,
    next: Option<DateTime<Tz>>,
    state: JobState,
}

impl<Tz: TimeZone> Job<Tz> {
    /// Constructs a job in cron mode, which renders as `0 0 0 * * ?`.
    pub fn new<F>(name: impl Into<String>, callback: F) -> Self
    where
        F: FnMut(&JobContext<'_, Tz>) -> std::result::Result<(), CallbackError> + Send + 'static,
    {
        Self {
            name: name.into(),
            callback: Box::new(callback),
            fields: CronFields::new(),
            interval: None,
            policy: RepeatPolicy::new(),
            last: None,
            next: None,
            state: JobState::Configuring,
        }
    }

    /// Name of the job.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current lifecycle state.
    pub fn state(&self) -> JobState {
        self.state
    }

    /// Number of completed executions.
    pub fn repeat_count(&self) -> u64 {
        self.policy.count()
    }

    /// `true` after [`start_at`](Job::start_at).
    pub fn is_repeat_mode(&self) -> bool {
        self.interval.is_some()
    }

    /// Accumulated cron fields.
    pub fn fields(&self) -> &CronFields {
        &self.fields
    }

    /// Renders the current cron expression.
    pub fn cron_expression(&self) -> String {
        self.fields.to_string()
    }

    /// Replaces all fields with the content of a 6 or 7 fields cron expression.
    pub fn set_cron_expression(&mut self, expression: &str) -> Result<&mut Self> {
        self.fields = CronFields::parse(expression)?;
        Ok(self)
    }

    // Seconds, minutes, hours

    /// Sets the second, replacing previous second tokens.
    pub fn at_second(&mut self, second: i64) -> Result<&mut Self> {
        self.set_value(Field::Seconds, second)
    }

    /// Sets the minute, replacing previous minute tokens.
    pub fn at_minute(&mut self, minute: i64) -> Result<&mut Self> {
        self.set_value(Field::Minutes, minute)
    }

    /// Sets the hour, replacing previous hour tokens.
    pub fn at_hour(&mut self, hour: i64) -> Result<&mut Self> {
        self.set_value(Field::Hours, hour)
    }

    /// Sets hour, minute and second at once.
    pub fn at_time(&mut self, hour: i64, minute: i64, second: i64) -> Result<&mut Self> {
        let hour = Field::Hours.validate(hour)?;
        let minute = Field::Minutes.validate(minute)?;
        let second = Field::Seconds.validate(second)?;

        self.fields.set_single(Field::Hours, Token::Single(hour));
        self.fields.set_single(Field::Minutes, Token::Single(minute));
        self.fields.set_single(Field::Seconds, Token::Single(second));
        Ok(self)
    }

    /// Fires every second: `*`.
    pub fn every_second(&mut self) -> &mut Self {
        self.set_wildcard(Field::Seconds)
    }

    /// Fires every minute: `*`.
    pub fn every_minute(&mut self) -> &mut Self {
        self.set_wildcard(Field::Minutes)
    }

    /// Fires every hour: `*`.
    pub fn every_hour(&mut self) -> &mut Self {
        self.set_wildcard(Field::Hours)
    }

    /// Adds range of seconds.
    pub fn between_seconds(&mut self, start: i64, end: i64) -> Result<&mut Self> {
        self.append_range(Field::Seconds, start, end)
    }

    /// Adds range of minutes.
    pub fn between_minutes(&mut self, start: i64, end: i64) -> Result<&mut Self> {
        self.append_range(Field::Minutes, start, end)
    }

    /// Adds range of hours.
    pub fn between_hours(&mut self, start: i64, end: i64) -> Result<&mut Self> {
        self.append_range(Field::Hours, start, end)
    }

    /// Turns the last second token into a step expression.
    pub fn every_seconds(&mut self, interval: i64) -> Result<&mut Self> {
        self.append_step(Field::Seconds, interval)
    }

    /// Turns the last minute token into a step expression.
    pub fn every_minutes(&mut self, interval: i64) -> Result<&mut Self> {
        self.append_step(Field::Minutes, interval)
    }

    /// Turns the last hour token into a step expression.
    pub fn every_hours(&mut self, interval: i64) -> Result<&mut Self> {
        self.append_step(Field::Hours, interval)
    }

    // Days of month

    /// Adds day of month.
    pub fn on_day(&mut self, day: i64) -> Result<&mut Self> {
        self.append_value(Field::DaysOfMonth, day)
    }

    /// Adds day of month to start a step expression from, see [`every_days`](Job::every_days).
    pub fn from_day(&mut self, day: i64) -> Result<&mut Self> {
        self.append_value(Field::DaysOfMonth, day)
    }

    /// Adds range of days of month.
    pub fn between_days(&mut self, start: i64, end: i64) -> Result<&mut Self> {
        self.append_range(Field::DaysOfMonth, start, end)
    }

    /// Fires every day of month: `*`.
    pub fn every_day(&mut self) -> &mut Self {
        self.set_wildcard(Field::DaysOfMonth)
    }

    /// Turns the last day of month token into a step expression.
    ///
    /// Fails if no day was added before: `from_day(1)?.every_days(2)?` renders `1/2`.
    pub fn every_days(&mut self, interval: i64) -> Result<&mut Self> {
        self.append_step(Field::DaysOfMonth, interval)
    }

    /// Fires on the last day of month: `L`.
    pub fn on_last_day(&mut self) -> &mut Self {
        self.fields.set_single(Field::DaysOfMonth, Token::LastDay);
        self
    }

    /// Fires on the last weekday (Monday to Friday) of month: `LW`.
    pub fn on_last_weekday(&mut self) -> &mut Self {
        self.fields.set_single(Field::DaysOfMonth, Token::LastWeekday);
        self
    }

    /// Fires on the weekday nearest to the `day` of month: `15W`.
    pub fn on_nearest_weekday(&mut self, day: i64) -> Result<&mut Self> {
        let day = Field::DaysOfMonth.validate(day)?;
        self.fields.set_single(Field::DaysOfMonth, Token::NearestWeekday(day));
        Ok(self)
    }

    // Months

    /// Adds month, as a number `1-12` or a name like `Jan` or `january`.
    pub fn in_month(&mut self, month: impl Into<NamedValue>) -> Result<&mut Self> {
        let month = names::month_value(&month.into())?;
        self.fields.append(Field::Months, Token::Single(month));
        Ok(self)
    }

    /// Adds month to start a step expression from, see [`every_months`](Job::every_months).
    pub fn from_month(&mut self, month: impl Into<NamedValue>) -> Result<&mut Self> {
        self.in_month(month)
    }

    /// Adds range of months.
    pub fn between_months(&mut self, start: impl Into<NamedValue>, end: impl Into<NamedValue>) -> Result<&mut Self> {
        let start = names::month_value(&start.into())?;
        let end = names::month_value(&end.into())?;
        self.fields.append(Field::Months, Token::Range(start, end));
        Ok(self)
    }

    /// Fires every month: `*`.
    pub fn every_month(&mut self) -> &mut Self {
        self.set_wildcard(Field::Months)
    }

    /// Turns the last month token into a step expression.
    pub fn every_months(&mut self, interval: i64) -> Result<&mut Self> {
        self.append_step(Field::Months, interval)
    }

    // Days of week

    /// Adds day of week.
    ///
    /// Numbers start from Monday: `0` (or `7`) is Monday, `6` is Sunday.
    /// Names like `Mon` or `friday` are accepted too.
    /// Rendered value is `1` for Monday through `7` for Sunday.
    pub fn on_day_of_week(&mut self, weekday: impl Into<NamedValue>) -> Result<&mut Self> {
        let weekday = names::weekday_value(&weekday.into())?;
        self.fields.append(Field::DaysOfWeek, Token::Single(weekday));
        Ok(self)
    }

    /// Adds day of week to start a step expression from, see [`every_days_of_week`](Job::every_days_of_week).
    pub fn from_day_of_week(&mut self, weekday: impl Into<NamedValue>) -> Result<&mut Self> {
        self.on_day_of_week(weekday)
    }

    /// Adds range of days of week.
    pub fn between_days_of_week(
        &mut self,
        start: impl Into<NamedValue>,
        end: impl Into<NamedValue>,
    ) -> Result<&mut Self> {
        let start = names::weekday_value(&start.into())?;
        let end = names::weekday_value(&end.into())?;
        self.fields.append(Field::DaysOfWeek, Token::Range(start, end));
        Ok(self)
    }

    /// Fires every day of week: `*`.
    pub fn every_day_of_week(&mut self) -> &mut Self {
        self.set_wildcard(Field::DaysOfWeek)
    }

    /// Turns the last day of week token into a step expression.
    pub fn every_days_of_week(&mut self, interval: i64) -> Result<&mut Self> {
        self.append_step(Field::DaysOfWeek, interval)
    }

    /// Fires on the `nth` (1 to 5) occurrence of the weekday in month: `2#1`.
    pub fn on_nth_day_of_week(&mut self, weekday: impl Into<NamedValue>, nth: i64) -> Result<&mut Self> {
        let weekday = names::weekday_value(&weekday.into())?;
        if !(1..=5).contains(&nth) {
            return Err(CronError::OutOfRange {
                field: Field::DaysOfWeek,
                value: nth,
            });
        }
        self.fields
            .set_single(Field::DaysOfWeek, Token::NthWeekday(weekday, nth as u16));
        Ok(self)
    }

    /// Fires on the last occurrence of the weekday in month: `5L`.
    pub fn on_last_day_of_week(&mut self, weekday: impl Into<NamedValue>) -> Result<&mut Self> {
        let weekday = names::weekday_value(&weekday.into())?;
        self.fields
            .set_single(Field::DaysOfWeek, Token::LastWeekdayOfMonth(weekday));
        Ok(self)
    }

    // Years

    /// Adds year.
    pub fn in_year(&mut self, year: i64) -> Result<&mut Self> {
        self.append_value(Field::Years, year)
    }

    /// Adds year to start a step expression from, see [`every_years`](Job::every_years).
    pub fn from_year(&mut self, year: i64) -> Result<&mut Self> {
        self.append_value(Field::Years, year)
    }

    /// Adds range of years.
    pub fn between_years(&mut self, start: i64, end: i64) -> Result<&mut Self> {
        self.append_range(Field::Years, start, end)
    }

    /// Fires every year: `*`.
    pub fn every_year(&mut self) -> &mut Self {
        self.set_wildcard(Field::Years)
    }

    /// Turns the last year token into a step expression.
    pub fn every_years(&mut self, interval: i64) -> Result<&mut Self> {
        self.append_step(Field::Years, interval)
    }

    fn set_value(&mut self, field: Field, value: i64) -> Result<&mut Self> {
        let value = field.validate(value)?;
        self.fields.set_single(field, Token::Single(value));
        Ok(self)
    }

    fn append_value(&mut self, field: Field, value: i64) -> Result<&mut Self> {
        let value = field.validate(value)?;
        self.fields.append(field, Token::Single(value));
        Ok(self)
    }

    fn append_range(&mut self, field: Field, start: i64, end: i64) -> Result<&mut Self> {
        let start = field.validate(start)?;
        let end = field.validate(end)?;
        self.fields.append(field, Token::Range(start, end));
        Ok(self)
    }

    fn append_step(&mut self, field: Field, interval: i64) -> Result<&mut Self> {
        self.fields.append_step(field, interval)?;
        Ok(self)
    }

    fn set_wildcard(&mut self, field: Field) -> &mut Self {
        self.fields.set_wildcard(field);
        self
    }

    // Repeat mode

    /// Switches the job into repeat mode starting at `start`.
    ///
    /// Offsets accumulated before are dropped, and the fields are overwritten
    /// with the literal components of `start`, so the job fires at `start` once.
    /// The repeat policy (if configured) is applied to the new start immediately.
    ///
    /// The repeat count is reset, so a finished job can be started over.
    pub fn start_at(&mut self, start: DateTime<Tz>) -> Result<&mut Self> {
        let mut fields = self.fields.clone();
        fields.set_datetime(&start)?;

        let interval = Interval::new(start);
        let mut policy = self.policy.clone();
        policy.reset_count();
        let upcoming = self.upcoming(&interval, &policy, None)?;

        debug!(job = %self.name, start = ?interval.start(), "switched to repeat mode");
        self.fields = fields;
        self.last = None;
        self.next = None;
        self.state = JobState::Configuring;
        self.commit(interval, policy, upcoming);
        Ok(self)
    }

    /// Replaces the seconds offset.
    pub fn after_seconds(&mut self, seconds: i32) -> Result<&mut Self> {
        self.update_interval(|interval| {
            interval.set_seconds(seconds);
            Ok(())
        })
    }

    /// Adds to the minutes offset: `after_minutes(5)` twice results in 10 minutes.
    pub fn after_minutes(&mut self, minutes: i32) -> Result<&mut Self> {
        self.update_interval(|interval| interval.add_minutes(minutes))
    }

    /// Adds to the hours offset.
    pub fn after_hours(&mut self, hours: i32) -> Result<&mut Self> {
        self.update_interval(|interval| interval.add_hours(hours))
    }

    /// Adds to the days offset.
    pub fn after_days(&mut self, days: i32) -> Result<&mut Self> {
        self.update_interval(|interval| interval.add_days(days))
    }

    /// Adds to the months offset.
    pub fn after_months(&mut self, months: i32) -> Result<&mut Self> {
        self.update_interval(|interval| interval.add_months(months))
    }

    /// Adds to the years offset.
    pub fn after_years(&mut self, years: i32) -> Result<&mut Self> {
        self.update_interval(|interval| interval.add_years(years))
    }

    /// Replaces the raw milliseconds offset.
    pub fn after_time(&mut self, millis: i64) -> Result<&mut Self> {
        self.update_interval(|interval| {
            interval.set_millis(millis);
            Ok(())
        })
    }

    /// Sets the dynamic offset: `offset` gets the current repeat count and returns milliseconds.
    pub fn after_fn<F>(&mut self, offset: F) -> Result<&mut Self>
    where
        F: Fn(u64) -> i64 + Send + Sync + 'static,
    {
        self.update_interval(|interval| {
            interval.set_dynamic(Arc::new(offset));
            Ok(())
        })
    }

    /// Limits the number of executions, negative `count` means unbounded.
    pub fn repeat(&mut self, count: i64) -> Result<&mut Self> {
        self.update_policy(|policy| policy.set_max_count(count))
    }

    /// Executes the job once after the start.
    pub fn repeat_once(&mut self) -> Result<&mut Self> {
        self.repeat(1)
    }

    /// Repeats without count limit.
    pub fn repeat_forever(&mut self) -> Result<&mut Self> {
        self.repeat(-1)
    }

    /// Repeats while occurrences aren't after `end` (inclusive).
    pub fn repeat_until(&mut self, end: DateTime<Tz>) -> Result<&mut Self> {
        self.update_policy(|policy| policy.set_end(end))
    }

    /// Repeats until `stop` returns `true`, it gets the current repeat count.
    pub fn repeat_until_fn<F>(&mut self, stop: F) -> Result<&mut Self>
    where
        F: Fn(u64) -> bool + Send + Sync + 'static,
    {
        self.update_policy(|policy| policy.set_stop(Arc::new(stop)))
    }

    /// Datetime of the upcoming occurrence in repeat mode.
    ///
    /// Before any `repeat*` call, this is the start datetime.
    pub fn next_datetime(&self) -> Result<DateTime<Tz>> {
        let interval = self.interval.as_ref().ok_or(CronError::MissingPrerequisite(
            "next datetime is known in repeat mode only, call start_at() first",
        ))?;
        Ok(self.next.clone().unwrap_or_else(|| interval.start().clone()))
    }

    fn update_interval(&mut self, update: impl FnOnce(&mut Interval<Tz>) -> Result<()>) -> Result<&mut Self> {
        let mut interval = self
            .interval
            .clone()
            .ok_or(CronError::MissingPrerequisite("offsets require start datetime, call start_at() first"))?;
        update(&mut interval)?;

        let policy = self.policy.clone();
        let upcoming = self.upcoming(&interval, &policy, self.last.as_ref())?;
        self.commit(interval, policy, upcoming);
        Ok(self)
    }

    fn update_policy(&mut self, update: impl FnOnce(&mut RepeatPolicy<Tz>)) -> Result<&mut Self> {
        let interval = self
            .interval
            .clone()
            .ok_or(CronError::MissingPrerequisite("repeating requires start datetime, call start_at() first"))?;
        let mut policy = self.policy.clone();
        update(&mut policy);
        policy.set_configured();

        let upcoming = self.upcoming(&interval, &policy, self.last.as_ref())?;
        debug!(job = %self.name, policy = ?policy, "repeat policy configured");
        self.commit(interval, policy, upcoming);
        Ok(self)
    }

    /// Computes the occurrence following `last` and checks it against the policy.
    ///
    /// The allowed occurrence is projected into fields here, so it can be committed as is.
    fn upcoming(
        &self,
        interval: &Interval<Tz>,
        policy: &RepeatPolicy<Tz>,
        last: Option<&DateTime<Tz>>,
    ) -> Result<Upcoming<Tz>> {
        if !policy.is_configured() {
            return Ok(Upcoming::Unknown);
        }

        let candidate = interval.compute_next(last, policy.count())?;
        let allowed = policy.should_continue(&candidate, policy.count());
        trace!(job = %self.name, candidate = ?candidate, allowed, "continuation checked");

        if allowed {
            let mut fields = CronFields::new();
            fields.set_datetime(&candidate)?;
            Ok(Upcoming::Next(candidate, fields))
        } else {
            Ok(Upcoming::Denied)
        }
    }

    fn commit(&mut self, interval: Interval<Tz>, policy: RepeatPolicy<Tz>, upcoming: Upcoming<Tz>) {
        self.interval = Some(interval);
        self.policy = policy;

        match upcoming {
            Upcoming::Unknown => {}
            Upcoming::Next(next, fields) => self.project(next, fields),
            Upcoming::Denied => self.finish(),
        }
    }

    fn project(&mut self, next: DateTime<Tz>, fields: CronFields) {
        debug!(job = %self.name, next = ?next, repeat_count = self.policy.count(), "next occurrence projected");
        self.fields = fields;
        self.next = Some(next);
        if self.state == JobState::Terminal {
            self.state = JobState::Configuring;
        }
    }

    fn finish(&mut self) {
        debug!(job = %self.name, repeat_count = self.policy.count(), "repeating is over");
        self.state = JobState::Terminal;
    }

    // Lifecycle

    /// Marks the job as handed to a scheduler and returns the expression to register.
    ///
    /// Returns `None` if the job is terminal or is executing right now.
    pub fn arm(&mut self) -> Option<String> {
        match self.state {
            JobState::Terminal | JobState::Executing => None,
            JobState::Configuring | JobState::Armed => {
                self.state = JobState::Armed;
                Some(self.cron_expression())
            }
        }
    }

    /// Runs the execution callback and decides on the job's future.
    ///
    /// In repeat mode with a configured policy, the repeat count is incremented and the next
    /// occurrence is computed from the one which has just fired: if the policy allows it,
    /// the fields are overwritten and [`FireOutcome::Rearm`] carries the new expression.
    ///
    /// An error returned by the callback is passed through as is, the job stays armed and
    /// the repeat count isn't changed. A terminal job isn't executed at all.
    pub fn execute(&mut self) -> std::result::Result<FireOutcome, CallbackError> {
        if self.state == JobState::Terminal {
            return Ok(FireOutcome::Finished);
        }

        self.state = JobState::Executing;
        let scheduled_at = self.next.as_ref().or(self.interval.as_ref().map(|i| i.start()));
        let context = JobContext {
            name: &self.name,
            repeat_count: self.policy.count(),
            scheduled_at,
        };
        trace!(job = %self.name, repeat_count = context.repeat_count, "executing");

        if let Err(error) = (self.callback)(&context) {
            self.state = JobState::Armed;
            return Err(error);
        }
        self.policy.increment();

        let Some(interval) = self.interval.clone() else {
            self.state = JobState::Armed;
            return Ok(FireOutcome::Recurring);
        };
        if !self.policy.is_configured() {
            self.finish();
            return Ok(FireOutcome::Finished);
        }

        self.last = Some(self.next.clone().unwrap_or_else(|| interval.start().clone()));
        match self.upcoming(&interval, &self.policy, self.last.as_ref()) {
            Ok(Upcoming::Next(next, fields)) => {
                self.project(next, fields);
                self.state = JobState::Armed;
                Ok(FireOutcome::Rearm(self.cron_expression()))
            }
            Ok(_) => {
                self.finish();
                Ok(FireOutcome::Finished)
            }
            Err(error) => {
                self.finish();
                Err(error.into())
            }
        }
    }
}

impl Job<Utc> {
    /// Switches the job into repeat mode starting now.
    pub fn start_now(&mut self) -> Result<&mut Self> {
        self.start_at(Utc::now())
    }
}

impl<Tz: TimeZone> Debug for Job<Tz> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("interval", &self.interval)
            .field("policy", &self.policy)
            .field("last", &self.last)
            .field("next", &self.next)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
