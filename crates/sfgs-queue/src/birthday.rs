//! Daily birthday job generation

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use sfgs_types::queue::{EmailType, NewQueueEntry, Student};
use sfgs_types::utils::is_valid_email;

use crate::prelude::*;

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BirthdayReport {
	pub queued: u32,
	pub skipped: u32,
	pub errors: Vec<String>,
}

/// Whether someone born on `dob` celebrates on `today`
///
/// Feb 29 birthdays are celebrated on Feb 28 in non-leap years.
pub fn is_birthday(dob: NaiveDate, today: NaiveDate) -> bool {
	if dob.month() == today.month() && dob.day() == today.day() {
		return true;
	}
	let leap_year = NaiveDate::from_ymd_opt(today.year(), 2, 29).is_some();
	dob.month() == 2 && dob.day() == 29 && today.month() == 2 && today.day() == 28 && !leap_year
}

async fn queue_student(app: &App, student: &Student, now: Timestamp, report: &mut BirthdayReport) {
	let day = app.day_of(now);
	let recipients = student.parent_emails();
	if recipients.is_empty() {
		debug!(student_id = %student.id, "No parent email, skipping birthday");
		return;
	}

	match app.queue_adapter.birthday_sent_exists(&student.id, day.date).await {
		Ok(false) => {}
		Ok(true) => {
			report.skipped += recipients.len() as u32;
			return;
		}
		Err(err) => {
			report.errors.push(format!("{}: {}", student.id, err));
			return;
		}
	}

	for recipient in recipients {
		if !is_valid_email(recipient) {
			report.skipped += 1;
			report.errors.push(format!("{}: invalid parent email {}", student.id, recipient));
			continue;
		}

		let exists = app
			.queue_adapter
			.has_birthday_entry(&student.id, recipient, day.start, day.end)
			.await;
		match exists {
			Ok(true) => {
				report.skipped += 1;
				continue;
			}
			Ok(false) => {}
			Err(err) => {
				report.errors.push(format!("{}: {}", student.id, err));
				continue;
			}
		}

		let entry = NewQueueEntry {
			student_id: Some(student.id.clone()),
			matric_number: student.matric_number.clone(),
			recipient_email: recipient.into(),
			email_type: EmailType::Birthday,
			subject: "".into(),
			message: "".into(),
			attachments: Vec::new(),
			file_id: None,
		};
		match app.queue_adapter.create_entry(&entry, now).await {
			Ok(entry_id) => {
				info!(entry_id = %entry_id, student_id = %student.id, "Birthday email queued");
				report.queued += 1;
			}
			Err(err) => {
				warn!(student_id = %student.id, "Failed to queue birthday email: {}", err);
				report.errors.push(format!("{}: {}", student.id, err));
			}
		}
	}
}

/// Queues birthday greetings for every student whose birthday is today
///
/// Idempotent within a local day. Only the student listing can fail the
/// whole run; per-recipient problems are collected in the report.
pub async fn queue_birthday_emails(app: &App, now: Timestamp) -> SfResult<BirthdayReport> {
	let today = app.day_of(now).date;
	let students = app.queue_adapter.list_students().await?;

	let mut report = BirthdayReport::default();
	let celebrating =
		students.iter().filter(|s| s.date_of_birth.is_some_and(|dob| is_birthday(dob, today)));
	for student in celebrating {
		queue_student(app, student, now, &mut report).await;
	}

	info!(
		date = %today,
		queued = report.queued,
		skipped = report.skipped,
		errors = report.errors.len(),
		"Birthday run finished"
	);
	Ok(report)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn date(y: i32, m: u32, d: u32) -> NaiveDate {
		NaiveDate::from_ymd_opt(y, m, d).unwrap()
	}

	#[test]
	fn test_is_birthday() {
		assert!(is_birthday(date(2012, 3, 14), date(2025, 3, 14)));
		assert!(!is_birthday(date(2012, 3, 14), date(2025, 3, 15)));
		assert!(!is_birthday(date(2012, 3, 14), date(2025, 4, 14)));
	}

	#[test]
	fn test_leap_day_birthday() {
		let dob = date(2012, 2, 29);
		assert!(is_birthday(dob, date(2024, 2, 29)));
		assert!(!is_birthday(dob, date(2024, 2, 28)));
		assert!(is_birthday(dob, date(2025, 2, 28)));
		assert!(!is_birthday(dob, date(2025, 3, 1)));
	}
}

// vim: ts=4
