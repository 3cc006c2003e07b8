use chrono::{DateTime, TimeZone};
use std::{fmt::Debug, sync::Arc};

/// Termination predicate: gets the current repeat count, returns `true` to stop repeating.
pub type StopFn = Arc<dyn Fn(u64) -> bool + Send + Sync>;

/// Decides whether a repeating job should produce one more occurrence.
///
/// Continuation is granted while all the configured limits hold:
/// - the candidate datetime isn't after the end datetime (inclusive bound);
/// - the repeat count is below the maximum count (negative maximum means unbounded);
/// - the termination predicate hasn't returned `true`.
#[derive(Clone)]
pub struct RepeatPolicy<Tz: TimeZone> {
    end: Option<DateTime<Tz>>,
    max_count: i64,
    stop: Option<StopFn>,
    configured: bool,
    count: u64,
}

impl<Tz: TimeZone> Default for RepeatPolicy<Tz> {
    fn default() -> Self {
        Self {
            end: None,
            max_count: -1,
            stop: None,
            configured: false,
            count: 0,
        }
    }
}

impl<Tz: TimeZone> RepeatPolicy<Tz> {
    /// Constructs unconfigured and unbounded policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the inclusive upper bound of occurrences.
    pub fn set_end(&mut self, end: DateTime<Tz>) {
        self.end = Some(end);
    }

    /// Sets the maximum number of executions, negative value removes the limit.
    pub fn set_max_count(&mut self, max_count: i64) {
        self.max_count = max_count;
    }

    /// Sets the termination predicate, replacing the previous one.
    pub fn set_stop(&mut self, stop: StopFn) {
        self.stop = Some(stop);
    }

    /// Marks the policy as configured, since then it gates every computed occurrence.
    pub fn set_configured(&mut self) {
        self.configured = true;
    }

    /// `true` if any of the `repeat*` methods of the job was called.
    pub fn is_configured(&self) -> bool {
        self.configured
    }

    /// Number of completed executions.
    pub fn count(&self) -> u64 {
        self.count
    }

    pub(crate) fn increment(&mut self) {
        self.count = self.count.saturating_add(1);
    }

    pub(crate) fn reset_count(&mut self) {
        self.count = 0;
    }

    /// Returns `true` if the `candidate` occurrence is allowed after `repeat_count` executions.
    pub fn should_continue(&self, candidate: &DateTime<Tz>, repeat_count: u64) -> bool {
        let in_time = self.end.as_ref().map_or(true, |end| candidate <= end);
        let in_count = self.max_count < 0 || repeat_count < self.max_count as u64;

        // The predicate isn't called when the decision is known already.
        in_time && in_count && !self.stop.as_ref().is_some_and(|stop| stop(repeat_count))
    }
}

impl<Tz: TimeZone> Debug for RepeatPolicy<Tz> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepeatPolicy")
            .field("end", &self.end)
            .field("max_count", &self.max_count)
            .field("stop", &self.stop.is_some())
            .field("configured", &self.configured)
            .field("count", &self.count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, Utc};
    use rstest::rstest;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn utc(datetime: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(datetime).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn unbounded_by_default() {
        let policy = RepeatPolicy::new();
        assert!(!policy.is_configured());
        assert_eq!(policy.count(), 0);
        for count in [0, 1, 1_000, u64::MAX] {
            assert!(policy.should_continue(&utc("2099-12-31T23:59:59Z"), count));
        }
    }

    #[rstest]
    #[case(3, 0, true)]
    #[case(3, 2, true)]
    #[case(3, 3, false)]
    #[case(3, 4, false)]
    #[case(1, 0, true)]
    #[case(1, 1, false)]
    #[case(0, 0, false)]
    #[case(-1, 0, true)]
    #[case(-1, 1_000_000, true)]
    fn max_count_limit(#[case] max_count: i64, #[case] repeat_count: u64, #[case] expected: bool) {
        let mut policy = RepeatPolicy::new();
        policy.set_max_count(max_count);
        assert_eq!(
            policy.should_continue(&utc("2024-01-01T00:00:00Z"), repeat_count),
            expected
        );
    }

    #[rstest]
    #[case("2024-01-01T11:59:59Z", true)]
    #[case("2024-01-01T12:00:00Z", true)]
    #[case("2024-01-01T12:00:00.001Z", false)]
    #[case("2024-01-01T14:00:00+02:00", true)]
    #[case("2025-01-01T00:00:00Z", false)]
    fn end_datetime_is_inclusive(#[case] candidate: &str, #[case] expected: bool) {
        let mut policy = RepeatPolicy::new();
        policy.set_end(utc("2024-01-01T12:00:00Z"));
        assert_eq!(policy.should_continue(&utc(candidate), 0), expected);
    }

    #[test]
    fn one_microsecond_past_the_end_is_rejected() {
        let end = utc("2024-01-01T12:00:00Z");
        let mut policy = RepeatPolicy::new();
        policy.set_end(end);
        assert!(!policy.should_continue(&(end + TimeDelta::microseconds(1)), 0));
    }

    #[test]
    fn predicate_gets_repeat_count() {
        let mut policy = RepeatPolicy::new();
        policy.set_stop(Arc::new(|count: u64| count >= 5));
        let now = utc("2024-01-01T00:00:00Z");
        assert!(policy.should_continue(&now, 4));
        assert!(!policy.should_continue(&now, 5));
    }

    #[test]
    fn predicate_is_skipped_when_other_limits_deny() {
        let calls = Arc::new(AtomicU64::new(0));
        let counter = calls.clone();
        let mut policy = RepeatPolicy::new();
        policy.set_max_count(1);
        policy.set_stop(Arc::new(move |_: u64| {
            counter.fetch_add(1, Ordering::Relaxed);
            false
        }));
        let now = utc("2024-01-01T00:00:00Z");
        assert!(policy.should_continue(&now, 0));
        assert!(!policy.should_continue(&now, 1));
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn all_limits_together() {
        let mut policy = RepeatPolicy::new();
        policy.set_end(utc("2024-01-01T12:00:00Z"));
        policy.set_max_count(10);
        policy.set_stop(Arc::new(|count: u64| count == 7));
        policy.set_configured();
        assert!(policy.is_configured());
        assert!(policy.should_continue(&utc("2024-01-01T10:00:00Z"), 6));
        assert!(!policy.should_continue(&utc("2024-01-01T10:00:00Z"), 7));
        assert!(!policy.should_continue(&utc("2024-01-01T10:00:00Z"), 10));
        assert!(!policy.should_continue(&utc("2024-01-01T13:00:00Z"), 0));
    }

    #[test]
    fn increment_counts_executions() {
        let mut policy: RepeatPolicy<Utc> = RepeatPolicy::new();
        policy.increment();
        policy.increment();
        assert_eq!(policy.count(), 2);

        policy.reset_count();
        assert_eq!(policy.count(), 0);
    }
}
