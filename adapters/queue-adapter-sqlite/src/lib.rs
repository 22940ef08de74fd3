//! SQLite implementation of the SFGS queue adapter
//!
//! Stores the email queue, versioned dispatch settings, the audit log, the daily
//! send counters, birthday markers, students and uploaded file metadata in a
//! single `queue.db` file.

#![forbid(unsafe_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::sqlite::{self, SqlitePool};
use std::{fmt::Debug, path::Path};

use sfgs_types::prelude::*;
use sfgs_types::queue::{
	AuditLogEntry, AuditStatus, DispatchSettings, NewQueueEntry, NewStudent, NewUploadedFile,
	QueueEntry, QueueStatusKind, Student, UploadedFile,
};
use sfgs_types::queue_adapter::{self, ListEntryOptions};

mod audit;
mod birthday;
mod entry;
mod file;
mod schema;
mod settings;
mod student;
mod utils;

#[derive(Debug)]
pub struct QueueAdapterSqlite {
	db: SqlitePool,
}

impl QueueAdapterSqlite {
	/// Opens (or creates) `queue.db` inside `path`
	pub async fn new(path: impl AsRef<Path>) -> SfResult<Self> {
		tokio::fs::create_dir_all(path.as_ref()).await?;
		let db_path = path.as_ref().join("queue.db");
		let opts = sqlite::SqliteConnectOptions::new()
			.filename(&db_path)
			.create_if_missing(true)
			.journal_mode(sqlite::SqliteJournalMode::Wal);
		let db = sqlite::SqlitePoolOptions::new()
			.max_connections(5)
			.connect_with(opts)
			.await
			.inspect_err(|err| error!("DbError: {:#?}", err))
			.map_err(|_| Error::DbError)?;

		schema::init_db(&db)
			.await
			.inspect_err(|err| error!("DbError: {:#?}", err))
			.map_err(|_| Error::DbError)?;

		info!("Queue database opened: {}", db_path.display());
		Ok(Self { db })
	}
}

#[async_trait]
impl queue_adapter::QueueAdapter for QueueAdapterSqlite {
	// Settings
	//**********
	async fn read_settings(&self) -> SfResult<Option<DispatchSettings>> {
		settings::read(&self.db).await
	}

	async fn create_settings(
		&self,
		settings: &DispatchSettings,
		updated_at: Timestamp,
	) -> SfResult<DispatchSettings> {
		settings::create(&self.db, settings, updated_at).await
	}

	// Send history
	//**************
	async fn last_sent_at(&self) -> SfResult<Option<Timestamp>> {
		entry::last_sent_at(&self.db).await
	}

	async fn count_sent_between(&self, start: Timestamp, end: Timestamp) -> SfResult<u32> {
		entry::count_sent_between(&self.db, start, end).await
	}

	async fn read_daily_count(&self, day: NaiveDate) -> SfResult<u32> {
		entry::read_daily_count(&self.db, day).await
	}

	// Queue entries
	//***************
	async fn list_entries(&self, opts: &ListEntryOptions) -> SfResult<Vec<QueueEntry>> {
		entry::list(&self.db, opts).await
	}

	async fn list_pending_entries(&self, stale_before: Timestamp) -> SfResult<Vec<QueueEntry>> {
		entry::list_pending(&self.db, stale_before).await
	}

	async fn read_entry(&self, entry_id: &str) -> SfResult<QueueEntry> {
		entry::read(&self.db, entry_id).await
	}

	async fn create_entry(&self, entry: &NewQueueEntry, queued_at: Timestamp) -> SfResult<Box<str>> {
		entry::create(&self.db, entry, queued_at).await
	}

	async fn delete_entry(&self, entry_id: &str) -> SfResult<()> {
		entry::delete(&self.db, entry_id).await
	}

	async fn count_entries(&self, status: QueueStatusKind) -> SfResult<u32> {
		entry::count(&self.db, status).await
	}

	async fn claim_entry(
		&self,
		entry_id: &str,
		claim_token: &str,
		now: Timestamp,
		stale_before: Timestamp,
	) -> SfResult<bool> {
		entry::claim(&self.db, entry_id, claim_token, now, stale_before).await
	}

	async fn mark_sent(
		&self,
		entry_id: &str,
		claim_token: &str,
		sent_at: Timestamp,
		day: NaiveDate,
	) -> SfResult<()> {
		entry::mark_sent(&self.db, entry_id, claim_token, sent_at, day).await
	}

	async fn mark_failed(
		&self,
		entry_id: &str,
		claim_token: &str,
		failed_at: Timestamp,
		error_message: &str,
	) -> SfResult<()> {
		entry::mark_failed(&self.db, entry_id, claim_token, failed_at, error_message).await
	}

	async fn retry_entry(&self, entry_id: &str, now: Timestamp) -> SfResult<()> {
		entry::retry(&self.db, entry_id, now).await
	}

	async fn cancel_entry(&self, entry_id: &str, now: Timestamp) -> SfResult<()> {
		entry::cancel(&self.db, entry_id, now).await
	}

	async fn set_prioritized(
		&self,
		entry_id: &str,
		prioritized_at: Option<Timestamp>,
	) -> SfResult<()> {
		entry::set_prioritized(&self.db, entry_id, prioritized_at).await
	}

	// Audit log
	//***********
	async fn create_audit_log(
		&self,
		status: AuditStatus,
		message: &str,
		queue_id: Option<&str>,
		created_at: Timestamp,
	) -> SfResult<()> {
		audit::create(&self.db, status, message, queue_id, created_at).await
	}

	async fn list_audit_logs(&self, limit: u32) -> SfResult<Vec<AuditLogEntry>> {
		audit::list(&self.db, limit).await
	}

	// Birthdays
	//***********
	async fn has_birthday_entry(
		&self,
		student_id: &str,
		recipient_email: &str,
		start: Timestamp,
		end: Timestamp,
	) -> SfResult<bool> {
		birthday::has_entry(&self.db, student_id, recipient_email, start, end).await
	}

	async fn birthday_sent_exists(&self, student_id: &str, day: NaiveDate) -> SfResult<bool> {
		birthday::sent_exists(&self.db, student_id, day).await
	}

	// Students
	//**********
	async fn list_students(&self) -> SfResult<Vec<Student>> {
		student::list(&self.db).await
	}

	async fn count_students(&self) -> SfResult<u32> {
		student::count(&self.db).await
	}

	async fn create_student(&self, student: &NewStudent, created_at: Timestamp) -> SfResult<Box<str>> {
		student::create(&self.db, student, created_at).await
	}

	// Uploaded files
	//****************
	async fn create_file(&self, file: &NewUploadedFile, uploaded_at: Timestamp) -> SfResult<Box<str>> {
		file::create(&self.db, file, uploaded_at).await
	}

	async fn read_file(&self, file_id: &str) -> SfResult<UploadedFile> {
		file::read(&self.db, file_id).await
	}

	async fn read_file_name(&self, storage_path: &str) -> SfResult<Option<Box<str>>> {
		file::read_name(&self.db, storage_path).await
	}

	async fn delete_file(&self, file_id: &str) -> SfResult<u32> {
		file::delete(&self.db, file_id).await
	}
}

// vim: ts=4
