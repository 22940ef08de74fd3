//! Adapter that stores the email queue and everything the dispatcher needs around it

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::fmt::Debug;

use crate::prelude::*;
use crate::queue::{
	AuditLogEntry, AuditStatus, DispatchSettings, EmailType, NewQueueEntry, NewStudent,
	NewUploadedFile, QueueEntry, QueueStatusKind, Student, UploadedFile,
};

/// Filters for the operator queue listing
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ListEntryOptions {
	pub status: Option<QueueStatusKind>,
	#[serde(rename = "type")]
	pub email_type: Option<EmailType>,
	pub limit: Option<u32>,
}

#[async_trait]
pub trait QueueAdapter: Debug + Send + Sync {
	/// # Settings
	///
	/// Reads the most recent settings version, `None` if never configured
	async fn read_settings(&self) -> SfResult<Option<DispatchSettings>>;

	/// Stores a new settings version and returns it
	async fn create_settings(
		&self,
		settings: &DispatchSettings,
		updated_at: Timestamp,
	) -> SfResult<DispatchSettings>;

	/// # Send history
	///
	/// Latest `sent_at` over all sent entries
	async fn last_sent_at(&self) -> SfResult<Option<Timestamp>>;

	/// Number of sent entries with `start <= sent_at < end`
	async fn count_sent_between(&self, start: Timestamp, end: Timestamp) -> SfResult<u32>;

	/// Cached daily counter (the query above is authoritative)
	async fn read_daily_count(&self, day: NaiveDate) -> SfResult<u32>;

	/// # Queue entries
	///
	/// Operator listing: prioritized first, then newest first
	async fn list_entries(&self, opts: &ListEntryOptions) -> SfResult<Vec<QueueEntry>>;

	/// Pending entries in enqueue order, skipping entries with a claim newer than `stale_before`
	async fn list_pending_entries(&self, stale_before: Timestamp) -> SfResult<Vec<QueueEntry>>;

	async fn read_entry(&self, entry_id: &str) -> SfResult<QueueEntry>;

	/// Enqueues a pending entry, returns its id
	async fn create_entry(&self, entry: &NewQueueEntry, queued_at: Timestamp) -> SfResult<Box<str>>;

	async fn delete_entry(&self, entry_id: &str) -> SfResult<()>;

	async fn count_entries(&self, status: QueueStatusKind) -> SfResult<u32>;

	/// Atomically claims a pending entry for dispatch
	///
	/// Succeeds only if the entry is still pending and unclaimed (or its claim is
	/// older than `stale_before`). Returns `false` if someone else holds it.
	async fn claim_entry(
		&self,
		entry_id: &str,
		claim_token: &str,
		now: Timestamp,
		stale_before: Timestamp,
	) -> SfResult<bool>;

	/// Marks a claimed entry sent
	///
	/// In one transaction: sets the status, bumps the daily counter of `day` and
	/// records the birthday marker for birthday entries. Fails with
	/// `Error::Conflict` if the claim was lost.
	async fn mark_sent(
		&self,
		entry_id: &str,
		claim_token: &str,
		sent_at: Timestamp,
		day: NaiveDate,
	) -> SfResult<()>;

	/// Marks a claimed entry failed
	async fn mark_failed(
		&self,
		entry_id: &str,
		claim_token: &str,
		failed_at: Timestamp,
		error_message: &str,
	) -> SfResult<()>;

	/// `failed | cancelled -> pending`
	async fn retry_entry(&self, entry_id: &str, now: Timestamp) -> SfResult<()>;

	/// `pending -> cancelled`
	async fn cancel_entry(&self, entry_id: &str, now: Timestamp) -> SfResult<()>;

	/// Sets or clears the priority mark of a pending entry
	async fn set_prioritized(
		&self,
		entry_id: &str,
		prioritized_at: Option<Timestamp>,
	) -> SfResult<()>;

	/// # Audit log
	async fn create_audit_log(
		&self,
		status: AuditStatus,
		message: &str,
		queue_id: Option<&str>,
		created_at: Timestamp,
	) -> SfResult<()>;

	/// Newest first
	async fn list_audit_logs(&self, limit: u32) -> SfResult<Vec<AuditLogEntry>>;

	/// # Birthdays
	///
	/// Whether a birthday entry for `(student, recipient)` was queued in `[start, end)`
	async fn has_birthday_entry(
		&self,
		student_id: &str,
		recipient_email: &str,
		start: Timestamp,
		end: Timestamp,
	) -> SfResult<bool>;

	async fn birthday_sent_exists(&self, student_id: &str, day: NaiveDate) -> SfResult<bool>;

	/// # Students
	async fn list_students(&self) -> SfResult<Vec<Student>>;
	async fn count_students(&self) -> SfResult<u32>;
	async fn create_student(&self, student: &NewStudent, created_at: Timestamp) -> SfResult<Box<str>>;

	/// # Uploaded files
	async fn create_file(&self, file: &NewUploadedFile, uploaded_at: Timestamp) -> SfResult<Box<str>>;
	async fn read_file(&self, file_id: &str) -> SfResult<UploadedFile>;

	/// Original file name of an upload by its storage path
	async fn read_file_name(&self, storage_path: &str) -> SfResult<Option<Box<str>>>;

	/// Deletes the file record and every queue entry referencing it
	///
	/// Returns the number of queue entries removed.
	async fn delete_file(&self, file_id: &str) -> SfResult<u32>;
}


// vim: ts=4
