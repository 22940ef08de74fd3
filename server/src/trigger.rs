//! Built-in periodic trigger for the dispatch and birthday jobs

use tokio::task::JoinHandle;

use sfgs_core::cron::CronSchedule;
use sfgs_queue::{process_queue, queue_birthday_emails};

use crate::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Job {
	Dispatch,
	Birthday,
}

impl Job {
	pub fn as_str(&self) -> &'static str {
		match self {
			Job::Dispatch => "dispatch",
			Job::Birthday => "birthday",
		}
	}
}

/// Runs one invocation of `job`. Outcomes are logged, never propagated.
pub async fn run_job(app: &App, job: Job) {
	match job {
		Job::Dispatch => {
			let report = process_queue(app, Timestamp::now()).await;
			info!(
				status = report.status.as_str(),
				sent = report.sent,
				failed = report.failed,
				skipped = report.skipped,
				"Scheduled dispatch finished"
			);
		}
		Job::Birthday => match queue_birthday_emails(app, Timestamp::now()).await {
			Ok(report) => {
				for err in &report.errors {
					warn!("Birthday job: {}", err);
				}
			}
			Err(err) => error!("Scheduled birthday run failed: {}", err),
		},
	}
}

/// Spawns a loop that runs `job` at every occurrence of `schedule`
///
/// Runs are sequential: an occurrence that passes while a run is still in
/// progress is skipped.
pub fn spawn(app: App, job: Job, schedule: CronSchedule) -> JoinHandle<()> {
	info!(job = job.as_str(), cron = schedule.as_str(), "Periodic trigger enabled");
	tokio::spawn(async move {
		loop {
			let wait = match schedule.until_next(Timestamp::now()) {
				Ok(wait) => wait,
				Err(err) => {
					error!(job = job.as_str(), "Stopping periodic trigger: {}", err);
					return;
				}
			};
			debug!(job = job.as_str(), "Next run in {}s", wait.as_secs());
			tokio::time::sleep(wait).await;
			run_job(&app, job).await;
		}
	})
}

// vim: ts=4
