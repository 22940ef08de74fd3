//! Versioned dispatch settings

use sqlx::{Row, SqlitePool, sqlite::SqliteRow};

use sfgs_types::prelude::*;
use sfgs_types::queue::DispatchSettings;

use crate::utils::*;

fn read_settings_row(row: &SqliteRow) -> Result<DispatchSettings, sqlx::Error> {
	Ok(DispatchSettings {
		daily_email_limit: row.try_get("daily_email_limit")?,
		email_batch_size: row.try_get("email_batch_size")?,
		email_interval_minutes: row.try_get("email_interval_minutes")?,
		cron_enabled: row.try_get("cron_enabled")?,
		updated_at: Some(row.try_get("updated_at").map(Timestamp)?),
	})
}

/// Latest version by `updated_at`, insertion order breaking ties
pub(crate) async fn read(db: &SqlitePool) -> SfResult<Option<DispatchSettings>> {
	let res = sqlx::query(
		"SELECT daily_email_limit, email_batch_size, email_interval_minutes, cron_enabled, updated_at
		FROM dispatch_settings ORDER BY updated_at DESC, id DESC LIMIT 1",
	)
	.fetch_optional(db)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?;

	match res {
		Some(row) => Ok(Some(read_settings_row(&row).inspect_err(inspect).map_err(|_| Error::DbError)?)),
		None => Ok(None),
	}
}

pub(crate) async fn create(
	db: &SqlitePool,
	settings: &DispatchSettings,
	updated_at: Timestamp,
) -> SfResult<DispatchSettings> {
	let res = sqlx::query(
		"INSERT INTO dispatch_settings
		(daily_email_limit, email_batch_size, email_interval_minutes, cron_enabled, updated_at)
		VALUES (?, ?, ?, ?, ?)
		RETURNING daily_email_limit, email_batch_size, email_interval_minutes, cron_enabled, updated_at",
	)
	.bind(settings.daily_email_limit)
	.bind(settings.email_batch_size)
	.bind(settings.email_interval_minutes)
	.bind(settings.cron_enabled)
	.bind(updated_at.0)
	.fetch_one(db)
	.await;

	map_res(res, |row| read_settings_row(&row))
}

// vim: ts=4
