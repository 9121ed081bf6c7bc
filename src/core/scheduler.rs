//! Fixed-interval trigger loop.
//!
//! Starts one run, waits for it to finish, sleeps the interval, repeats. Runs
//! never overlap. A failed run is logged and the loop carries on with the next
//! trigger. Credentials are checked before the loop is built.
//!
//! A run stuck in a long quality-gate loop pushes every later trigger back by
//! the same amount.

use std::time::Duration;

use chrono::Local;
use tracing::{error, info};

use super::orchestrator::Orchestrator;

/// Summary of a finished schedule
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScheduleReport {
    pub runs: u32,
    pub succeeded: u32,
    pub failed: u32,
}

/// Re-arms the orchestrator on a fixed interval
pub struct Scheduler<'a> {
    orchestrator: &'a Orchestrator,
    topic: String,
    interval: Duration,
    max_runs: Option<u32>,
}

impl<'a> Scheduler<'a> {
    pub fn new(orchestrator: &'a Orchestrator, topic: impl Into<String>, interval: Duration) -> Self {
        Self {
            orchestrator,
            topic: topic.into(),
            interval,
            max_runs: None,
        }
    }

    /// Stop after this many triggers (runs forever when unset)
    pub fn with_max_runs(mut self, max_runs: Option<u32>) -> Self {
        self.max_runs = max_runs;
        self
    }

    /// Run the trigger loop
    pub async fn run(&self) -> ScheduleReport {
        let mut report = ScheduleReport::default();

        loop {
            report.runs += 1;
            info!(
                trigger = report.runs,
                at = %Local::now().format("%Y-%m-%d %H:%M:%S"),
                "Scheduled trigger activated"
            );

            match self.orchestrator.run_once(&self.topic).await {
                Ok(run) => {
                    report.succeeded += 1;
                    info!(
                        run_id = %run.id,
                        output = run.output_name.as_deref().unwrap_or_default(),
                        "Run finished"
                    );
                }
                Err(err) => {
                    report.failed += 1;
                    error!(error = %err, "Run failed, waiting for next trigger");
                }
            }

            if self.max_runs.is_some_and(|max| report.runs >= max) {
                info!(?report, "Reached run limit, stopping schedule");
                return report;
            }

            info!(interval_secs = self.interval.as_secs(), "Sleeping until next trigger");
            tokio::time::sleep(self.interval).await;
        }
    }
}
