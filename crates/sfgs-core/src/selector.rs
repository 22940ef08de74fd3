//! Batch selection over a snapshot of pending entries

use std::collections::HashSet;

use sfgs_types::queue::QueueEntry;

use crate::prelude::*;

/// Entries chosen for one invocation
#[derive(Debug, Default)]
pub struct Batch {
	pub entries: Vec<QueueEntry>,
	/// Non-birthday entries skipped because cron dispatch is disabled
	pub held_back: usize,
}

/// Orders and bounds the pending snapshot
///
/// `pending` must be in enqueue order. Prioritized entries come first by
/// `prioritized_at`, then the rest by `queued_at`; ties keep enqueue order.
/// With cron disabled only birthday entries are eligible. Duplicate ids in the
/// snapshot are dropped.
pub fn select_batch(pending: Vec<QueueEntry>, max_count: usize, cron_enabled: bool) -> Batch {
	let mut seen: HashSet<Box<str>> = HashSet::with_capacity(pending.len());
	let mut held_back = 0;
	let mut entries: Vec<QueueEntry> = pending
		.into_iter()
		.filter(|entry| seen.insert(entry.id.clone()))
		.filter(|entry| {
			let eligible = cron_enabled || entry.is_birthday();
			if !eligible {
				held_back += 1;
			}
			eligible
		})
		.collect();

	entries.sort_by_key(|entry| match entry.prioritized_at {
		Some(at) => (0, at),
		None => (1, entry.queued_at),
	});
	entries.truncate(max_count);

	if held_back > 0 {
		debug!(held_back, "Non-birthday entries held back while cron dispatch is disabled");
	}
	Batch { entries, held_back }
}


// vim: ts=4
