//! Cron schedules for the built-in periodic trigger

use chrono::{DateTime, Utc};
use croner::Cron;
use std::{str::FromStr, time::Duration};

use crate::prelude::*;

/// Cron schedule parsed from a standard 5-field expression
#[derive(Debug, Clone)]
pub struct CronSchedule {
	/// The original cron expression string
	expr: Box<str>,
	cron: Cron,
}

impl CronSchedule {
	/// Parse a cron expression (5 fields: minute hour day month weekday)
	pub fn parse(expr: &str) -> SfResult<Self> {
		let cron = Cron::from_str(expr)
			.map_err(|e| Error::ValidationError(format!("invalid cron expression: {}", e)))?;
		Ok(Self { expr: expr.into(), cron })
	}

	/// Like `parse`, but an empty expression means "disabled"
	pub fn parse_optional(expr: &str) -> SfResult<Option<Self>> {
		let expr = expr.trim();
		if expr.is_empty() { Ok(None) } else { Self::parse(expr).map(Some) }
	}

	/// Next execution time strictly after the given timestamp
	pub fn next_execution(&self, after: Timestamp) -> SfResult<Timestamp> {
		let dt = DateTime::<Utc>::from_timestamp(after.0, 0).unwrap_or_else(Utc::now);

		self.cron
			.find_next_occurrence(&dt, false)
			.map(|next| Timestamp(next.timestamp()))
			.map_err(|e| {
				error!("Failed to find next cron occurrence for '{}': {}", self.expr, e);
				Error::ValidationError(format!("cron next_execution failed: {}", e))
			})
	}

	/// Time to sleep from `now` until the next execution
	pub fn until_next(&self, now: Timestamp) -> SfResult<Duration> {
		let next = self.next_execution(now)?;
		Ok(Duration::from_secs(next.0.saturating_sub(now.0).max(0) as u64))
	}

	pub fn as_str(&self) -> &str {
		&self.expr
	}
}

impl PartialEq for CronSchedule {
	fn eq(&self, other: &Self) -> bool {
		self.expr == other.expr
	}
}

impl Eq for CronSchedule {}


// vim: ts=4
