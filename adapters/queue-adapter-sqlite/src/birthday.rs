//! Birthday de-duplication lookups

use chrono::NaiveDate;
use sqlx::SqlitePool;

use sfgs_types::prelude::*;

use crate::utils::*;

/// Any birthday entry (whatever its status) for the pair queued within `[start, end)`
pub(crate) async fn has_entry(
	db: &SqlitePool,
	student_id: &str,
	recipient_email: &str,
	start: Timestamp,
	end: Timestamp,
) -> SfResult<bool> {
	let res = sqlx::query(
		"SELECT 1 FROM queue
		WHERE email_type='birthday' AND student_id=? AND recipient_email=? COLLATE NOCASE
		AND queued_at>=? AND queued_at<? LIMIT 1",
	)
	.bind(student_id)
	.bind(recipient_email)
	.bind(start.0)
	.bind(end.0)
	.fetch_optional(db)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?;

	Ok(res.is_some())
}

pub(crate) async fn sent_exists(db: &SqlitePool, student_id: &str, day: NaiveDate) -> SfResult<bool> {
	let res = sqlx::query("SELECT 1 FROM birthday_sent WHERE student_id=? AND sent_date=?")
		.bind(student_id)
		.bind(format_date(day))
		.fetch_optional(db)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;

	Ok(res.is_some())
}

// vim: ts=4
