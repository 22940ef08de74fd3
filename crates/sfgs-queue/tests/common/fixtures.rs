//! Test data

use chrono::NaiveDate;

use sfgs_core::App;
use sfgs_types::queue::{DispatchSettings, EmailType, NewQueueEntry, NewStudent};
use sfgs_types::types::Timestamp;

/// 2025-03-14 09:00 UTC, 10:00 in the default +01:00 zone
pub const NOW: Timestamp = Timestamp(1_741_942_800);
pub const DAY: i64 = 86_400;

pub fn pdf_entry(recipient: &str) -> NewQueueEntry {
	NewQueueEntry {
		student_id: Some("student-1".into()),
		matric_number: Some("SFGS/001".into()),
		recipient_email: recipient.into(),
		email_type: EmailType::Pdf,
		subject: "Term report".into(),
		message: "<p>Please find the report attached.</p>".into(),
		attachments: Vec::new(),
		file_id: None,
	}
}

pub fn birthday_entry(student_id: &str, recipient: &str) -> NewQueueEntry {
	NewQueueEntry {
		student_id: Some(student_id.into()),
		matric_number: None,
		recipient_email: recipient.into(),
		email_type: EmailType::Birthday,
		subject: "".into(),
		message: "".into(),
		attachments: Vec::new(),
		file_id: None,
	}
}

pub fn student(name: &str, dob: Option<NaiveDate>, parents: &[&str]) -> NewStudent {
	NewStudent {
		student_name: name.into(),
		matric_number: None,
		date_of_birth: dob,
		parent_email_1: parents.first().map(|p| (*p).into()),
		parent_email_2: parents.get(1).map(|p| (*p).into()),
	}
}

pub fn settings(limit: i64, batch: i64, interval: i64, cron_enabled: bool) -> DispatchSettings {
	DispatchSettings {
		daily_email_limit: limit,
		email_batch_size: batch,
		email_interval_minutes: interval,
		cron_enabled,
		updated_at: None,
	}
}

pub async fn store_settings(app: &App, settings: &DispatchSettings) {
	app.queue_adapter.create_settings(settings, NOW.add_seconds(-DAY)).await.unwrap();
}

/// Enqueues entries one second apart, before `NOW`
pub async fn enqueue(app: &App, entries: &[NewQueueEntry]) -> Vec<Box<str>> {
	let mut ids = Vec::with_capacity(entries.len());
	for (i, entry) in entries.iter().enumerate() {
		let queued_at = NOW.add_seconds(-1000 + i as i64);
		ids.push(app.queue_adapter.create_entry(entry, queued_at).await.unwrap());
	}
	ids
}

// vim: ts=4
