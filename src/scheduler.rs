//! scheduler.rs — weekly cron triggers, one slot per category.
//!
//! Slots are configured in local wall-clock time (`utc_offset_hours` from UTC)
//! and converted to UTC cron expressions for `tokio-cron-scheduler`.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{NaiveTime, Timelike, Weekday};
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::category::ContentCategory;
use crate::config::CuratorConfig;
use crate::pipeline::{Curator, RunOutcome};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub category: ContentCategory,
    pub weekday: Weekday,
    pub time: NaiveTime,
}

/// `sec min hour dom month dow` in UTC for a local weekly slot.
pub fn to_utc_cron(weekday: Weekday, time: NaiveTime, utc_offset_hours: i32) -> String {
    const DAY: i64 = 24 * 60;
    let local = i64::from(time.hour()) * 60 + i64::from(time.minute());
    let utc = local - i64::from(utc_offset_hours) * 60;
    let day_shift = utc.div_euclid(DAY);
    let minute_of_day = utc.rem_euclid(DAY);

    let mut day = weekday;
    for _ in 0..day_shift.unsigned_abs() {
        day = if day_shift > 0 { day.succ() } else { day.pred() };
    }
    format!(
        "0 {} {} * * {}",
        minute_of_day % 60,
        minute_of_day / 60,
        cron_day(day)
    )
}

fn cron_day(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MON",
        Weekday::Tue => "TUE",
        Weekday::Wed => "WED",
        Weekday::Thu => "THU",
        Weekday::Fri => "FRI",
        Weekday::Sat => "SAT",
        Weekday::Sun => "SUN",
    }
}

/// Owns the trigger table and the running job scheduler.
pub struct WeeklyScheduler {
    entries: Vec<ScheduleEntry>,
    utc_offset_hours: i32,
    inner: Option<JobScheduler>,
}

impl WeeklyScheduler {
    pub fn new(entries: Vec<ScheduleEntry>, utc_offset_hours: i32) -> Self {
        Self {
            entries,
            utc_offset_hours,
            inner: None,
        }
    }

    pub fn from_config(cfg: &CuratorConfig) -> Result<Self> {
        let mut entries = Vec::with_capacity(cfg.categories.len());
        for (category, c) in &cfg.categories {
            entries.push(ScheduleEntry {
                category: *category,
                weekday: c.schedule.weekday,
                time: c.schedule.parsed_time()?,
            });
        }
        Ok(Self::new(entries, cfg.utc_offset_hours))
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    pub fn cron_expressions(&self) -> Vec<(ContentCategory, String)> {
        self.entries
            .iter()
            .map(|e| (e.category, to_utc_cron(e.weekday, e.time, self.utc_offset_hours)))
            .collect()
    }

    pub fn is_running(&self) -> bool {
        self.inner.is_some()
    }

    /// Register every slot and start the scheduler. With `run_on_start`, one
    /// immediate run of that category is spawned as well.
    pub async fn start(
        &mut self,
        curator: Arc<Curator>,
        run_on_start: Option<ContentCategory>,
    ) -> Result<()> {
        if self.inner.is_some() {
            return Ok(());
        }
        let scheduler = JobScheduler::new()
            .await
            .context("creating job scheduler")?;

        for (category, cron) in self.cron_expressions() {
            let job_curator = curator.clone();
            let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
                let curator = job_curator.clone();
                Box::pin(async move {
                    run_and_log(&curator, category).await;
                })
            })
            .with_context(|| format!("invalid cron expression {cron:?} for {category}"))?;
            scheduler
                .add(job)
                .await
                .with_context(|| format!("registering {category} job"))?;
            tracing::info!(%category, cron = %cron, "weekly slot registered");
        }

        scheduler.start().await.context("starting job scheduler")?;
        self.inner = Some(scheduler);

        if let Some(category) = run_on_start {
            tokio::spawn(async move {
                tracing::info!(%category, "startup run");
                run_and_log(&curator, category).await;
            });
        }
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(mut scheduler) = self.inner.take() {
            scheduler
                .shutdown()
                .await
                .context("shutting down job scheduler")?;
            tracing::info!("scheduler stopped");
        }
        Ok(())
    }
}

/// Trigger body: errors are logged, never propagated into the scheduler.
pub async fn run_and_log(curator: &Curator, category: ContentCategory) {
    match curator.collect_and_post(category).await {
        Ok(RunOutcome::Published {
            title,
            used_fallback,
        }) => tracing::info!(%category, %title, used_fallback, "run finished: published"),
        Ok(RunOutcome::AlreadyPosted { title }) => {
            tracing::info!(%category, %title, "run finished: already posted")
        }
        Ok(RunOutcome::NoContent) => tracing::warn!(%category, "run finished: no content"),
        Ok(RunOutcome::DeliveryFailed { title }) => {
            tracing::error!(%category, %title, "run finished: delivery failed")
        }
        Err(e) => tracing::error!(%category, error = ?e, "run failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn moscow_morning_stays_on_same_day() {
        assert_eq!(to_utc_cron(Weekday::Mon, t(10, 0), 3), "0 0 7 * * MON");
        assert_eq!(to_utc_cron(Weekday::Fri, t(10, 30), 3), "0 30 7 * * FRI");
    }

    #[test]
    fn weekday_rolls_over_midnight() {
        assert_eq!(to_utc_cron(Weekday::Mon, t(1, 15), 3), "0 15 22 * * SUN");
        assert_eq!(to_utc_cron(Weekday::Sun, t(23, 0), -2), "0 0 1 * * MON");
    }

    #[test]
    fn zero_offset_is_identity() {
        assert_eq!(to_utc_cron(Weekday::Wed, t(0, 0), 0), "0 0 0 * * WED");
    }
}
