//! Throughput policy: daily cap and minimum interval between sends
//!
//! Pure decision logic. The caller supplies the latest send time and today's
//! count, both derived from the store on every invocation.

use sfgs_types::queue::DispatchSettings;

use crate::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockReason {
	DailyLimit,
	Interval,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RateDecision {
	Allowed {
		/// Upper bound on the size of this batch
		max_count: usize,
	},
	Blocked {
		reason: BlockReason,
		/// Minutes until the interval elapses, rounded up to a tenth
		wait_minutes: Option<f64>,
	},
}

/// Decides whether a batch may be dispatched at `now`
///
/// `settings` are expected to be normalized (see `settings::effective`).
/// An elapsed time equal to the interval is allowed.
pub fn can_dispatch(
	now: Timestamp,
	settings: &DispatchSettings,
	last_sent_at: Option<Timestamp>,
	sent_today: u32,
) -> RateDecision {
	let daily_limit = settings.daily_email_limit.max(0);
	let sent_today = i64::from(sent_today);
	if sent_today >= daily_limit {
		return RateDecision::Blocked { reason: BlockReason::DailyLimit, wait_minutes: None };
	}

	if let Some(last_sent_at) = last_sent_at {
		let interval_secs = settings.email_interval_minutes.max(0).saturating_mul(60);
		let elapsed_secs = (now.0 - last_sent_at.0).max(0);
		if elapsed_secs < interval_secs {
			// tenths of a minute are 6 second steps
			let remaining = interval_secs - elapsed_secs;
			let tenths = (remaining + 5) / 6;
			return RateDecision::Blocked {
				reason: BlockReason::Interval,
				wait_minutes: Some(tenths as f64 / 10.0),
			};
		}
	}

	let remaining_today = daily_limit - sent_today;
	let max_count = settings.email_batch_size.max(0).min(remaining_today);
	RateDecision::Allowed { max_count: max_count as usize }
}


// vim: ts=4
