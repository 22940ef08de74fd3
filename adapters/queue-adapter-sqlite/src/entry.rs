//! Queue entries: listing, enqueueing, claiming and lifecycle transitions

use chrono::NaiveDate;
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};

use sfgs_types::prelude::*;
use sfgs_types::queue::{EmailType, NewQueueEntry, QueueEntry, QueueStatus, QueueStatusKind};
use sfgs_types::queue_adapter::ListEntryOptions;

use crate::utils::*;

const DEFAULT_LIST_LIMIT: u32 = 500;

const SELECT_ENTRY: &str = "SELECT q.entry_id, q.student_id, q.matric_number, s.student_name,
	q.recipient_email, q.email_type, q.subject, q.message, q.attachments, q.file_id, q.status,
	q.queued_at, q.prioritized_at, q.sent_at, q.failed_at, q.cancelled_at, q.error_message
	FROM queue q
	LEFT JOIN students s ON s.student_id=q.student_id";

fn read_status(row: &SqliteRow) -> Result<QueueStatus, sqlx::Error> {
	let status: &str = row.try_get("status")?;
	let kind: QueueStatusKind = status.parse().map_err(|_| bad_value("status", status))?;
	let at = |column: &str| -> Result<Timestamp, sqlx::Error> {
		row.try_get::<Option<i64>, _>(column)?
			.map(Timestamp)
			.ok_or_else(|| bad_value(column, "NULL"))
	};

	Ok(match kind {
		QueueStatusKind::Pending => QueueStatus::Pending,
		QueueStatusKind::Sent => QueueStatus::Sent { sent_at: at("sent_at")? },
		QueueStatusKind::Failed => QueueStatus::Failed {
			failed_at: at("failed_at")?,
			error_message: row
				.try_get::<Option<Box<str>>, _>("error_message")?
				.unwrap_or_else(|| "unknown error".into()),
		},
		QueueStatusKind::Cancelled => QueueStatus::Cancelled { cancelled_at: at("cancelled_at")? },
	})
}

fn read_entry_row(row: &SqliteRow) -> Result<QueueEntry, sqlx::Error> {
	let email_type: &str = row.try_get("email_type")?;
	let attachments: &str = row.try_get("attachments")?;

	Ok(QueueEntry {
		id: row.try_get("entry_id")?,
		student_id: row.try_get("student_id")?,
		matric_number: row.try_get("matric_number")?,
		student_name: row.try_get("student_name")?,
		recipient_email: row.try_get("recipient_email")?,
		email_type: email_type.parse().map_err(|_| bad_value("email_type", email_type))?,
		subject: row.try_get("subject")?,
		message: row.try_get("message")?,
		attachments: serde_json::from_str(attachments)
			.map_err(|_| bad_value("attachments", attachments))?,
		file_id: row.try_get("file_id")?,
		queued_at: row.try_get("queued_at").map(Timestamp)?,
		prioritized_at: row.try_get::<Option<i64>, _>("prioritized_at")?.map(Timestamp),
		status: read_status(row)?,
	})
}

/// Maps a zero-row update to `NotFound` or `Conflict` depending on whether the entry exists
async fn not_updated(db: &SqlitePool, entry_id: &str, conflict: &str) -> Error {
	let exists = sqlx::query("SELECT 1 FROM queue WHERE entry_id=?")
		.bind(entry_id)
		.fetch_optional(db)
		.await
		.inspect_err(inspect);
	match exists {
		Ok(Some(_)) => Error::Conflict(conflict.to_string()),
		Ok(None) => Error::NotFound,
		Err(_) => Error::DbError,
	}
}

/// Operator listing: prioritized first, newest first
pub(crate) async fn list(db: &SqlitePool, opts: &ListEntryOptions) -> SfResult<Vec<QueueEntry>> {
	let mut query = sqlx::QueryBuilder::new(SELECT_ENTRY);
	query.push(" WHERE 1=1");
	if let Some(status) = opts.status {
		query.push(" AND q.status=").push_bind(status.as_str());
	}
	if let Some(email_type) = opts.email_type {
		query.push(" AND q.email_type=").push_bind(email_type.as_str());
	}
	query.push(
		" ORDER BY q.prioritized_at IS NULL, q.prioritized_at DESC, q.queued_at DESC, q.rowid DESC",
	);
	query.push(" LIMIT ").push_bind(i64::from(opts.limit.unwrap_or(DEFAULT_LIST_LIMIT)));

	let res = query
		.build()
		.fetch_all(db)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;

	collect_res(res.iter().map(read_entry_row))
}

/// Pending entries in insertion order
pub(crate) async fn list_pending(
	db: &SqlitePool,
	stale_before: Timestamp,
) -> SfResult<Vec<QueueEntry>> {
	let sql = format!(
		"{} WHERE q.status='pending' AND (q.claimed_at IS NULL OR q.claimed_at<=?) ORDER BY q.rowid",
		SELECT_ENTRY
	);
	let res = sqlx::query(&sql)
		.bind(stale_before.0)
		.fetch_all(db)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;

	collect_res(res.iter().map(read_entry_row))
}

pub(crate) async fn read(db: &SqlitePool, entry_id: &str) -> SfResult<QueueEntry> {
	let sql = format!("{} WHERE q.entry_id=?", SELECT_ENTRY);
	let res = sqlx::query(&sql).bind(entry_id).fetch_one(db).await;

	map_res(res, |row| read_entry_row(&row))
}

pub(crate) async fn create(
	db: &SqlitePool,
	entry: &NewQueueEntry,
	queued_at: Timestamp,
) -> SfResult<Box<str>> {
	let entry_id = new_id();
	let attachments = serde_json::to_string(&entry.attachments)?;

	sqlx::query(
		"INSERT INTO queue (entry_id, student_id, matric_number, recipient_email, email_type,
		subject, message, attachments, file_id, status, queued_at)
		VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, 'pending', ?)",
	)
	.bind(&*entry_id)
	.bind(entry.student_id.as_deref())
	.bind(entry.matric_number.as_deref())
	.bind(&*entry.recipient_email)
	.bind(entry.email_type.as_str())
	.bind(&*entry.subject)
	.bind(&*entry.message)
	.bind(attachments)
	.bind(entry.file_id.as_deref())
	.bind(queued_at.0)
	.execute(db)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?;

	Ok(entry_id)
}

pub(crate) async fn delete(db: &SqlitePool, entry_id: &str) -> SfResult<()> {
	let res = sqlx::query("DELETE FROM queue WHERE entry_id=?")
		.bind(entry_id)
		.execute(db)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;

	if res.rows_affected() == 0 { Err(Error::NotFound) } else { Ok(()) }
}

pub(crate) async fn count(db: &SqlitePool, status: QueueStatusKind) -> SfResult<u32> {
	let res = sqlx::query("SELECT count(*) FROM queue WHERE status=?")
		.bind(status.as_str())
		.fetch_one(db)
		.await;

	map_res(res, |row| row.try_get::<i64, _>(0).map(|n| n as u32))
}

pub(crate) async fn claim(
	db: &SqlitePool,
	entry_id: &str,
	claim_token: &str,
	now: Timestamp,
	stale_before: Timestamp,
) -> SfResult<bool> {
	let res = sqlx::query(
		"UPDATE queue SET claim_token=?, claimed_at=?
		WHERE entry_id=? AND status='pending' AND (claimed_at IS NULL OR claimed_at<=?)",
	)
	.bind(claim_token)
	.bind(now.0)
	.bind(entry_id)
	.bind(stale_before.0)
	.execute(db)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?;

	Ok(res.rows_affected() == 1)
}

/// Status update, daily counter and birthday marker in one transaction
pub(crate) async fn mark_sent(
	db: &SqlitePool,
	entry_id: &str,
	claim_token: &str,
	sent_at: Timestamp,
	day: NaiveDate,
) -> SfResult<()> {
	let mut tx = db.begin().await.inspect_err(inspect).map_err(|_| Error::DbError)?;

	let row = sqlx::query(
		"UPDATE queue SET status='sent', sent_at=?, error_message=NULL, claim_token=NULL, claimed_at=NULL
		WHERE entry_id=? AND status='pending' AND claim_token=?
		RETURNING email_type, student_id",
	)
	.bind(sent_at.0)
	.bind(entry_id)
	.bind(claim_token)
	.fetch_optional(&mut *tx)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?;
	let Some(row) = row else {
		return Err(Error::Conflict(format!("claim on entry {} was lost", entry_id)));
	};
	let email_type: Box<str> = row.try_get("email_type").map_err(|_| Error::DbError)?;
	let student_id: Option<Box<str>> = row.try_get("student_id").map_err(|_| Error::DbError)?;
	let date = format_date(day);

	sqlx::query(
		"INSERT INTO daily_counts (date, count) VALUES (?, 1)
		ON CONFLICT(date) DO UPDATE SET count=count+1",
	)
	.bind(&date)
	.execute(&mut *tx)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?;

	let birthday_student = student_id.filter(|_| &*email_type == EmailType::Birthday.as_str());
	if let Some(student_id) = birthday_student {
		sqlx::query(
			"INSERT OR IGNORE INTO birthday_sent (student_id, sent_date, created_at) VALUES (?, ?, ?)",
		)
		.bind(&*student_id)
		.bind(&date)
		.bind(sent_at.0)
		.execute(&mut *tx)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;
	}

	tx.commit().await.inspect_err(inspect).map_err(|_| Error::DbError)?;

	Ok(())
}

pub(crate) async fn mark_failed(
	db: &SqlitePool,
	entry_id: &str,
	claim_token: &str,
	failed_at: Timestamp,
	error_message: &str,
) -> SfResult<()> {
	let res = sqlx::query(
		"UPDATE queue SET status='failed', failed_at=?, error_message=?, claim_token=NULL, claimed_at=NULL
		WHERE entry_id=? AND status='pending' AND claim_token=?",
	)
	.bind(failed_at.0)
	.bind(error_message)
	.bind(entry_id)
	.bind(claim_token)
	.execute(db)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?;

	if res.rows_affected() == 0 {
		return Err(Error::Conflict(format!("claim on entry {} was lost", entry_id)));
	}
	Ok(())
}

/// A retried cancelled entry goes to the back of the queue, a retried failed entry keeps its place
pub(crate) async fn retry(db: &SqlitePool, entry_id: &str, now: Timestamp) -> SfResult<()> {
	let res = sqlx::query(
		"UPDATE queue SET status='pending',
		queued_at=CASE WHEN status='cancelled' THEN ? ELSE queued_at END,
		failed_at=NULL, cancelled_at=NULL, error_message=NULL, claim_token=NULL, claimed_at=NULL
		WHERE entry_id=? AND status IN ('failed', 'cancelled')",
	)
	.bind(now.0)
	.bind(entry_id)
	.execute(db)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?;

	if res.rows_affected() == 0 {
		return Err(not_updated(db, entry_id, "only failed or cancelled entries can be retried").await);
	}
	Ok(())
}

pub(crate) async fn cancel(db: &SqlitePool, entry_id: &str, now: Timestamp) -> SfResult<()> {
	let res = sqlx::query(
		"UPDATE queue SET status='cancelled', cancelled_at=?, prioritized_at=NULL,
		claim_token=NULL, claimed_at=NULL
		WHERE entry_id=? AND status='pending'",
	)
	.bind(now.0)
	.bind(entry_id)
	.execute(db)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?;

	if res.rows_affected() == 0 {
		return Err(not_updated(db, entry_id, "only pending entries can be cancelled").await);
	}
	Ok(())
}

pub(crate) async fn set_prioritized(
	db: &SqlitePool,
	entry_id: &str,
	prioritized_at: Option<Timestamp>,
) -> SfResult<()> {
	let res =
		sqlx::query("UPDATE queue SET prioritized_at=? WHERE entry_id=? AND status='pending'")
			.bind(prioritized_at.map(|ts| ts.0))
			.bind(entry_id)
			.execute(db)
			.await
			.inspect_err(inspect)
			.map_err(|_| Error::DbError)?;

	if res.rows_affected() == 0 {
		return Err(not_updated(db, entry_id, "only pending entries can be prioritized").await);
	}
	Ok(())
}

// Send history //
//****************//

pub(crate) async fn last_sent_at(db: &SqlitePool) -> SfResult<Option<Timestamp>> {
	let res = sqlx::query("SELECT max(sent_at) FROM queue WHERE status='sent'").fetch_one(db).await;

	map_res(res, |row| row.try_get::<Option<i64>, _>(0).map(|ts| ts.map(Timestamp)))
}

pub(crate) async fn count_sent_between(
	db: &SqlitePool,
	start: Timestamp,
	end: Timestamp,
) -> SfResult<u32> {
	let res =
		sqlx::query("SELECT count(*) FROM queue WHERE status='sent' AND sent_at>=? AND sent_at<?")
			.bind(start.0)
			.bind(end.0)
			.fetch_one(db)
			.await;

	map_res(res, |row| row.try_get::<i64, _>(0).map(|n| n as u32))
}

pub(crate) async fn read_daily_count(db: &SqlitePool, day: NaiveDate) -> SfResult<u32> {
	let res = sqlx::query("SELECT count FROM daily_counts WHERE date=?")
		.bind(format_date(day))
		.fetch_optional(db)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;

	match res {
		Some(row) => row.try_get::<i64, _>("count").map(|n| n as u32).map_err(|_| Error::DbError),
		None => Ok(0),
	}
}

// vim: ts=4
