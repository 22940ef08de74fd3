//! One queue processing invocation
//!
//! Checks the rate policy, selects a batch from the pending entries and
//! dispatches it sequentially. Every outcome, including rate-limited and
//! empty runs, is written to the audit log and summarized in a report.
//! Store errors are reported, never propagated.

use serde::Serialize;
use serde_with::skip_serializing_none;

use sfgs_core::rate_policy::{BlockReason, RateDecision, can_dispatch};
use sfgs_core::selector::select_batch;
use sfgs_core::settings::effective;
use sfgs_types::queue::{AuditStatus, DispatchSettings};
use sfgs_types::utils::random_id;

use crate::dispatcher::{self, DispatchError, audit};
use crate::prelude::*;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryError {
	pub entry_id: Box<str>,
	pub error: String,
}

#[skip_serializing_none]
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessReport {
	pub status: AuditStatus,
	pub sent: u32,
	pub failed: u32,
	pub skipped: u32,
	pub settings: DispatchSettings,
	pub wait_minutes: Option<f64>,
	pub message: String,
	pub errors: Vec<EntryError>,
}

impl ProcessReport {
	fn new(status: AuditStatus, settings: &DispatchSettings, message: String) -> Self {
		Self {
			status,
			sent: 0,
			failed: 0,
			skipped: 0,
			settings: settings.clone(),
			wait_minutes: None,
			message,
			errors: Vec::new(),
		}
	}
}

async fn run(app: &App, settings: &DispatchSettings, now: Timestamp) -> SfResult<ProcessReport> {
	let day = app.day_of(now);
	let last_sent_at = app.queue_adapter.last_sent_at().await?;
	let sent_today = app.queue_adapter.count_sent_between(day.start, day.end).await?;

	let max_count = match can_dispatch(now, settings, last_sent_at, sent_today) {
		RateDecision::Allowed { max_count } => max_count,
		RateDecision::Blocked { reason: BlockReason::DailyLimit, .. } => {
			let message = format!(
				"Daily limit of {} emails reached ({} sent today)",
				settings.daily_email_limit, sent_today
			);
			info!("{}", message);
			audit(app, AuditStatus::DailyLimitReached, &message, None, now).await;
			return Ok(ProcessReport::new(AuditStatus::DailyLimitReached, settings, message));
		}
		RateDecision::Blocked { reason: BlockReason::Interval, wait_minutes } => {
			let wait = wait_minutes.unwrap_or_default();
			let message = format!(
				"Minimum interval of {} minutes not met, next batch in {:.1} minutes",
				settings.email_interval_minutes, wait
			);
			info!("{}", message);
			audit(app, AuditStatus::IntervalNotMet, &message, None, now).await;
			let mut report = ProcessReport::new(AuditStatus::IntervalNotMet, settings, message);
			report.wait_minutes = Some(wait);
			return Ok(report);
		}
	};

	// Claims age on the wall clock, whatever `now` the invocation runs at
	let lease = app.opts.claim_lease_secs;
	let stale_before = Timestamp::now().add_seconds(-lease);
	let pending = app.queue_adapter.list_pending_entries(stale_before).await?;
	let batch = select_batch(pending, max_count, settings.cron_enabled);

	if batch.entries.is_empty() {
		let (status, message) = if batch.held_back > 0 {
			(
				AuditStatus::CronDisabled,
				format!(
					"Cron dispatch is disabled, {} non-birthday emails are waiting",
					batch.held_back
				),
			)
		} else {
			(AuditStatus::NoPending, "No pending emails to send".to_string())
		};
		debug!("{}", message);
		audit(app, status, &message, None, now).await;
		return Ok(ProcessReport::new(status, settings, message));
	}

	let mut report = ProcessReport::new(AuditStatus::Success, settings, String::new());
	for entry in batch.entries {
		let claim_token = random_id()?;
		let claimed_at = Timestamp::now();
		let stale_before = claimed_at.add_seconds(-lease);
		match app.queue_adapter.claim_entry(&entry.id, &claim_token, claimed_at, stale_before).await {
			Ok(true) => {}
			Ok(false) => {
				debug!(entry_id = %entry.id, "Entry claimed elsewhere, skipping");
				report.skipped += 1;
				continue;
			}
			Err(err) => {
				warn!(entry_id = %entry.id, "Failed to claim entry: {}", err);
				report.skipped += 1;
				report.errors.push(EntryError { entry_id: entry.id, error: err.to_string() });
				continue;
			}
		}

		let res = match sfgs_email::resolve(app, &entry).await {
			Ok(content) => dispatcher::dispatch(app, &claim_token, &entry, content, now).await,
			Err(err) => {
				let msg = format!("content resolution failed: {}", err);
				Err(dispatcher::fail(app, &entry, &claim_token, &msg, now).await)
			}
		};
		match res {
			Ok(()) => report.sent += 1,
			Err(err @ DispatchError::Unrecorded(_)) => {
				report.sent += 1;
				report.errors.push(EntryError { entry_id: entry.id, error: err.to_string() });
			}
			Err(err) => {
				report.failed += 1;
				report.errors.push(EntryError { entry_id: entry.id, error: err.to_string() });
			}
		}
	}

	if report.failed > 0 {
		report.status = AuditStatus::PartialSuccess;
	}
	report.message = format!(
		"Sent {} emails, {} failed, {} skipped (daily limit {}, batch size {})",
		report.sent,
		report.failed,
		report.skipped,
		settings.daily_email_limit,
		settings.email_batch_size
	);
	info!("{}", report.message);
	audit(app, report.status, &report.message, None, now).await;

	Ok(report)
}

/// Processes one batch of the queue at `now`
pub async fn process_queue(app: &App, now: Timestamp) -> ProcessReport {
	let res = match app.queue_adapter.read_settings().await {
		Ok(stored) => {
			let settings = effective(stored);
			run(app, &settings, now).await.map_err(|err| (settings, err))
		}
		Err(err) => Err((DispatchSettings::default(), err)),
	};

	match res {
		Ok(report) => report,
		Err((settings, err)) => {
			let message = format!("Queue processing failed: {}", err);
			error!("{}", message);
			audit(app, AuditStatus::Error, &message, None, now).await;
			ProcessReport::new(AuditStatus::Error, &settings, message)
		}
	}
}

// vim: ts=4
