use cron_forge::{CronError, CronFields, FireOutcome, Job, Result};

#[test]
fn weekdays_report() -> Result<()> {
    let mut job: Job = Job::new("report", |_| Ok(()));
    job.at_time(9, 30, 0)?.between_days_of_week("Mon", "Fri")?;
    assert_eq!(job.cron_expression(), "0 30 9 ? * 1-5");

    Ok(())
}

#[test]
fn quarterly_on_last_day() -> Result<()> {
    let mut job: Job = Job::new("quarterly", |_| Ok(()));
    job.at_hour(23)?
        .at_minute(59)?
        .on_last_day()
        .from_month("mar")?
        .every_months(3)?
        .from_year(2025)?
        .every_years(1)?;
    assert_eq!(job.cron_expression(), "0 59 23 L 3/3 ? 2025/1");

    Ok(())
}

#[test]
fn expression_survives_round_trip() -> Result<()> {
    let mut job: Job = Job::new("import", |_| Ok(()));
    job.set_cron_expression("0 0/5 14,18 * JAN-MAR ?")?;
    let expression = job.cron_expression();
    assert_eq!(expression, "0 0/5 14,18 * JAN-MAR ?");
    assert_eq!(expression.parse::<CronFields>()?.to_string(), expression);

    Ok(())
}

#[test]
fn failed_call_keeps_previous_state() -> Result<()> {
    let mut job: Job = Job::new("guarded", |_| Ok(()));
    job.on_day(15)?;

    assert!(matches!(job.every_months(2), Err(CronError::MissingPrerequisite(_))));
    assert!(matches!(job.in_month("ju"), Err(CronError::UnresolvedName { .. })));
    assert!(matches!(job.on_day(32), Err(CronError::OutOfRange { .. })));
    assert_eq!(job.cron_expression(), "0 0 0 15 * ?");

    Ok(())
}

#[test]
fn scheduler_keeps_recurring_registration() -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut job: Job = Job::new("tick", |_| Ok(()));
    job.every_minute().every_minutes(5)?;

    let expression = job.arm().ok_or("job isn't armable")?;
    assert_eq!(expression, "0 */5 0 * * ?");
    for _ in 0..10 {
        assert_eq!(job.execute()?, FireOutcome::Recurring);
    }
    assert_eq!(job.repeat_count(), 10);

    Ok(())
}
