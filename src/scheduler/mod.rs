//! Daily trigger for the fanout job.
//!
//! A cron expression (seconds field included) evaluated in local time.
//! Runs happen inline in one task, so two runs never overlap.

use std::panic::AssertUnwindSafe;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, TimeZone};
use futures::FutureExt;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::content::FanoutJob;
use crate::content::fanout::FanoutReport;

/// Parsed fanout schedule.
#[derive(Debug, Clone)]
pub struct FanoutSchedule {
    expression: String,
    schedule: cron::Schedule,
}

impl FanoutSchedule {
    /// # Errors
    /// Returns error if the expression is not a valid cron schedule.
    pub fn parse(expression: &str) -> Result<Self> {
        let schedule = cron::Schedule::from_str(expression)
            .with_context(|| format!("invalid fanout cron expression '{}'", expression))?;
        Ok(Self {
            expression: expression.to_string(),
            schedule,
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// First fire time strictly after `after`.
    pub fn next_after<Tz: TimeZone>(&self, after: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        self.schedule.after(after).next()
    }
}

/// Spawn the scheduler loop. Optionally runs the job once right away.
pub fn spawn(schedule: FanoutSchedule, job: FanoutJob, run_on_start: bool) -> JoinHandle<()> {
    tokio::spawn(async move {
        if run_on_start {
            info!("Running horoscope fanout on startup");
            run_guarded(&job).await;
        }

        loop {
            let now = Local::now();
            let Some(next) = schedule.next_after(&now) else {
                warn!("Schedule '{}' has no upcoming runs, stopping", schedule.expression());
                return;
            };

            info!("Next horoscope fanout at {}", next.format("%Y-%m-%d %H:%M:%S %:z"));
            let wait = (next - now).to_std().unwrap_or_default();
            tokio::time::sleep(wait).await;

            run_guarded(&job).await;
        }
    })
}

/// Run the job once. A panic is logged and the loop keeps its schedule.
async fn run_guarded(job: &FanoutJob) -> Option<FanoutReport> {
    match AssertUnwindSafe(job.run()).catch_unwind().await {
        Ok(report) => Some(report),
        Err(panic) => {
            let reason = panic
                .downcast_ref::<String>()
                .map(String::as_str)
                .or_else(|| panic.downcast_ref::<&str>().copied())
                .unwrap_or("unknown panic");
            error!("Horoscope fanout panicked: {}", reason);
            None
        }
    }
}
