//! Append-only audit log

use sqlx::{Row, SqlitePool};

use sfgs_types::prelude::*;
use sfgs_types::queue::{AuditLogEntry, AuditStatus};

use crate::utils::*;

pub(crate) async fn create(
	db: &SqlitePool,
	status: AuditStatus,
	message: &str,
	queue_id: Option<&str>,
	created_at: Timestamp,
) -> SfResult<()> {
	sqlx::query("INSERT INTO audit_logs (status, message, queue_id, created_at) VALUES (?, ?, ?, ?)")
		.bind(status.as_str())
		.bind(message)
		.bind(queue_id)
		.bind(created_at.0)
		.execute(db)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;

	Ok(())
}

pub(crate) async fn list(db: &SqlitePool, limit: u32) -> SfResult<Vec<AuditLogEntry>> {
	let res = sqlx::query(
		"SELECT log_id, status, message, queue_id, created_at FROM audit_logs
		ORDER BY created_at DESC, log_id DESC LIMIT ?",
	)
	.bind(i64::from(limit))
	.fetch_all(db)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?;

	collect_res(res.iter().map(|row| {
		let status: &str = row.try_get("status")?;
		Ok(AuditLogEntry {
			id: row.try_get("log_id")?,
			status: status.parse().map_err(|_| bad_value("status", status))?,
			message: row.try_get("message")?,
			queue_id: row.try_get("queue_id")?,
			created_at: row.try_get("created_at").map(Timestamp)?,
		})
	}))
}

// vim: ts=4
