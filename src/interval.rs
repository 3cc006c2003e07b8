use crate::{CronError, Result};
use chrono::{DateTime, Days, Months, TimeDelta, TimeZone};
use std::{fmt::Debug, sync::Arc};

/// Dynamic offset: maps the current repeat count to an additional number of milliseconds.
pub type OffsetFn = Arc<dyn Fn(u64) -> i64 + Send + Sync>;

/// Accumulated offsets relative to the start datetime of a repeating job.
///
/// Offsets are applied in a fixed order:
/// 1. seconds, minutes and hours as a linear time addition;
/// 2. days, months and years as a calendar addition, so month/year ends are respected
///    (January 31 plus one month is the last day of February);
/// 3. raw milliseconds, and then the dynamic offset, as a linear time addition.
#[derive(Clone)]
pub struct Interval<Tz: TimeZone> {
    start: DateTime<Tz>,
    seconds: i32,
    minutes: i32,
    hours: i32,
    days: i32,
    months: i32,
    years: i32,
    millis: i64,
    dynamic: Option<OffsetFn>,
}

impl<Tz: TimeZone> Interval<Tz> {
    /// Constructs zero interval from the `start`.
    pub fn new(start: DateTime<Tz>) -> Self {
        Self {
            start,
            seconds: 0,
            minutes: 0,
            hours: 0,
            days: 0,
            months: 0,
            years: 0,
            millis: 0,
            dynamic: None,
        }
    }

    /// Start datetime.
    pub fn start(&self) -> &DateTime<Tz> {
        &self.start
    }

    /// Replaces the seconds offset.
    pub fn set_seconds(&mut self, seconds: i32) {
        self.seconds = seconds;
    }

    /// Adds to the minutes offset.
    pub fn add_minutes(&mut self, minutes: i32) -> Result<()> {
        self.minutes = accumulate(self.minutes, minutes)?;
        Ok(())
    }

    /// Adds to the hours offset.
    pub fn add_hours(&mut self, hours: i32) -> Result<()> {
        self.hours = accumulate(self.hours, hours)?;
        Ok(())
    }

    /// Adds to the days offset.
    pub fn add_days(&mut self, days: i32) -> Result<()> {
        self.days = accumulate(self.days, days)?;
        Ok(())
    }

    /// Adds to the months offset.
    pub fn add_months(&mut self, months: i32) -> Result<()> {
        self.months = accumulate(self.months, months)?;
        Ok(())
    }

    /// Adds to the years offset.
    pub fn add_years(&mut self, years: i32) -> Result<()> {
        self.years = accumulate(self.years, years)?;
        Ok(())
    }

    /// Replaces the raw milliseconds offset.
    pub fn set_millis(&mut self, millis: i64) {
        self.millis = millis;
    }

    /// Sets the dynamic offset function, replacing the previous one.
    pub fn set_dynamic(&mut self, offset: OffsetFn) {
        self.dynamic = Some(offset);
    }

    /// Calculates datetime which follows `previous` (or the start, if `previous` is `None`)
    /// by the accumulated offsets.
    ///
    /// The dynamic offset, if any, is called once with `repeat_count`.
    pub fn compute_next(&self, previous: Option<&DateTime<Tz>>, repeat_count: u64) -> Result<DateTime<Tz>> {
        let next = previous.unwrap_or(&self.start).clone();

        let next = add_delta(next, TimeDelta::seconds(self.seconds.into()))?;
        let next = add_delta(next, TimeDelta::minutes(self.minutes.into()))?;
        let next = add_delta(next, TimeDelta::hours(self.hours.into()))?;

        let next = add_days(next, self.days)?;
        let next = add_months(next, self.months as i64)?;
        let next = add_months(next, self.years as i64 * 12)?;

        let next = add_millis(next, self.millis)?;
        match &self.dynamic {
            Some(offset) => add_millis(next, offset(repeat_count)),
            None => Ok(next),
        }
    }
}

impl<Tz: TimeZone> Debug for Interval<Tz> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interval")
            .field("start", &self.start)
            .field("seconds", &self.seconds)
            .field("minutes", &self.minutes)
            .field("hours", &self.hours)
            .field("days", &self.days)
            .field("months", &self.months)
            .field("years", &self.years)
            .field("millis", &self.millis)
            .field("dynamic", &self.dynamic.is_some())
            .finish()
    }
}

#[inline]
fn accumulate(current: i32, delta: i32) -> Result<i32> {
    current.checked_add(delta).ok_or(CronError::DateTimeOverflow)
}

#[inline]
fn add_delta<Tz: TimeZone>(datetime: DateTime<Tz>, delta: TimeDelta) -> Result<DateTime<Tz>> {
    datetime.checked_add_signed(delta).ok_or(CronError::DateTimeOverflow)
}

#[inline]
fn add_millis<Tz: TimeZone>(datetime: DateTime<Tz>, millis: i64) -> Result<DateTime<Tz>> {
    let delta = TimeDelta::try_milliseconds(millis).ok_or(CronError::DateTimeOverflow)?;
    add_delta(datetime, delta)
}

fn add_days<Tz: TimeZone>(datetime: DateTime<Tz>, days: i32) -> Result<DateTime<Tz>> {
    let delta = Days::new(days.unsigned_abs().into());
    if days >= 0 {
        datetime.checked_add_days(delta)
    } else {
        datetime.checked_sub_days(delta)
    }
    .ok_or(CronError::DateTimeOverflow)
}

fn add_months<Tz: TimeZone>(datetime: DateTime<Tz>, months: i64) -> Result<DateTime<Tz>> {
    let delta = u32::try_from(months.unsigned_abs())
        .map(Months::new)
        .map_err(|_| CronError::DateTimeOverflow)?;
    if months >= 0 {
        datetime.checked_add_months(delta)
    } else {
        datetime.checked_sub_months(delta)
    }
    .ok_or(CronError::DateTimeOverflow)
}
