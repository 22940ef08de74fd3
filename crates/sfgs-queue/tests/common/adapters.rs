//! Test app builder with SQLite and filesystem stores plus in-memory mail
//! transport and URL fetcher

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

use sfgs_blob_adapter_fs::BlobAdapterFs;
use sfgs_core::app::DEFAULT_CLAIM_LEASE_SECS;
use sfgs_core::{App, AppBuilder};
use sfgs_queue_adapter_sqlite::QueueAdapterSqlite;
use sfgs_types::error::{Error, SfResult};
use sfgs_types::fetch::{FetchedBody, UrlFetcher};
use sfgs_types::mail::{MailTransport, OutgoingEmail};
use sfgs_types::queue::{
	AuditLogEntry, AuditStatus, DispatchSettings, NewQueueEntry, NewStudent, NewUploadedFile,
	QueueEntry, QueueStatusKind, Student, UploadedFile,
};
use sfgs_types::queue_adapter::{ListEntryOptions, QueueAdapter};
use sfgs_types::types::Timestamp;

/// Records every message; recipients in `failing` are rejected
#[derive(Debug, Default)]
pub struct MockTransport {
	pub sent: Mutex<Vec<OutgoingEmail>>,
	pub failing: Mutex<HashSet<String>>,
	pub delay: Option<Duration>,
}

impl MockTransport {
	pub fn sent(&self) -> Vec<OutgoingEmail> {
		self.sent.lock().unwrap().clone()
	}

	pub fn recipients(&self) -> Vec<String> {
		self.sent().iter().map(|email| email.to.to_string()).collect()
	}

	pub fn fail_for(&self, recipient: &str) {
		self.failing.lock().unwrap().insert(recipient.to_string());
	}
}

#[async_trait]
impl MailTransport for MockTransport {
	async fn send_email(&self, email: &OutgoingEmail) -> SfResult<()> {
		if let Some(delay) = self.delay {
			tokio::time::sleep(delay).await;
		}
		if self.failing.lock().unwrap().contains(&*email.to) {
			return Err(Error::ServiceUnavailable("SMTP send failed: 550 mailbox unavailable".into()));
		}
		self.sent.lock().unwrap().push(email.clone());
		Ok(())
	}
}

/// Nothing is reachable by URL
#[derive(Debug)]
pub struct OfflineFetcher;

#[async_trait]
impl UrlFetcher for OfflineFetcher {
	async fn fetch(&self, _url: &str) -> SfResult<FetchedBody> {
		Err(Error::ServiceUnavailable("Network error: offline".into()))
	}
}

/// SQLite store with switchable write failures
#[derive(Debug)]
pub struct FaultyQueue {
	inner: QueueAdapterSqlite,
	pub fail_audit_log: AtomicBool,
	pub fail_mark_sent: AtomicBool,
}

impl FaultyQueue {
	fn check(flag: &AtomicBool, what: &str) -> SfResult<()> {
		if flag.load(Ordering::SeqCst) {
			return Err(Error::Internal(format!("{}: disk I/O error", what)));
		}
		Ok(())
	}
}

#[async_trait]
impl QueueAdapter for FaultyQueue {
	async fn read_settings(&self) -> SfResult<Option<DispatchSettings>> {
		self.inner.read_settings().await
	}
	async fn create_settings(
		&self,
		settings: &DispatchSettings,
		updated_at: Timestamp,
	) -> SfResult<DispatchSettings> {
		self.inner.create_settings(settings, updated_at).await
	}
	async fn last_sent_at(&self) -> SfResult<Option<Timestamp>> {
		self.inner.last_sent_at().await
	}
	async fn count_sent_between(&self, start: Timestamp, end: Timestamp) -> SfResult<u32> {
		self.inner.count_sent_between(start, end).await
	}
	async fn read_daily_count(&self, day: NaiveDate) -> SfResult<u32> {
		self.inner.read_daily_count(day).await
	}
	async fn list_entries(&self, opts: &ListEntryOptions) -> SfResult<Vec<QueueEntry>> {
		self.inner.list_entries(opts).await
	}
	async fn list_pending_entries(&self, stale_before: Timestamp) -> SfResult<Vec<QueueEntry>> {
		self.inner.list_pending_entries(stale_before).await
	}
	async fn read_entry(&self, entry_id: &str) -> SfResult<QueueEntry> {
		self.inner.read_entry(entry_id).await
	}
	async fn create_entry(&self, entry: &NewQueueEntry, queued_at: Timestamp) -> SfResult<Box<str>> {
		self.inner.create_entry(entry, queued_at).await
	}
	async fn delete_entry(&self, entry_id: &str) -> SfResult<()> {
		self.inner.delete_entry(entry_id).await
	}
	async fn count_entries(&self, status: QueueStatusKind) -> SfResult<u32> {
		self.inner.count_entries(status).await
	}
	async fn claim_entry(
		&self,
		entry_id: &str,
		claim_token: &str,
		now: Timestamp,
		stale_before: Timestamp,
	) -> SfResult<bool> {
		self.inner.claim_entry(entry_id, claim_token, now, stale_before).await
	}
	async fn mark_sent(
		&self,
		entry_id: &str,
		claim_token: &str,
		sent_at: Timestamp,
		day: NaiveDate,
	) -> SfResult<()> {
		Self::check(&self.fail_mark_sent, "mark_sent")?;
		self.inner.mark_sent(entry_id, claim_token, sent_at, day).await
	}
	async fn mark_failed(
		&self,
		entry_id: &str,
		claim_token: &str,
		failed_at: Timestamp,
		error_message: &str,
	) -> SfResult<()> {
		self.inner.mark_failed(entry_id, claim_token, failed_at, error_message).await
	}
	async fn retry_entry(&self, entry_id: &str, now: Timestamp) -> SfResult<()> {
		self.inner.retry_entry(entry_id, now).await
	}
	async fn cancel_entry(&self, entry_id: &str, now: Timestamp) -> SfResult<()> {
		self.inner.cancel_entry(entry_id, now).await
	}
	async fn set_prioritized(
		&self,
		entry_id: &str,
		prioritized_at: Option<Timestamp>,
	) -> SfResult<()> {
		self.inner.set_prioritized(entry_id, prioritized_at).await
	}
	async fn create_audit_log(
		&self,
		status: AuditStatus,
		message: &str,
		queue_id: Option<&str>,
		created_at: Timestamp,
	) -> SfResult<()> {
		Self::check(&self.fail_audit_log, "create_audit_log")?;
		self.inner.create_audit_log(status, message, queue_id, created_at).await
	}
	async fn list_audit_logs(&self, limit: u32) -> SfResult<Vec<AuditLogEntry>> {
		self.inner.list_audit_logs(limit).await
	}
	async fn has_birthday_entry(
		&self,
		student_id: &str,
		recipient_email: &str,
		start: Timestamp,
		end: Timestamp,
	) -> SfResult<bool> {
		self.inner.has_birthday_entry(student_id, recipient_email, start, end).await
	}
	async fn birthday_sent_exists(&self, student_id: &str, day: NaiveDate) -> SfResult<bool> {
		self.inner.birthday_sent_exists(student_id, day).await
	}
	async fn list_students(&self) -> SfResult<Vec<Student>> {
		self.inner.list_students().await
	}
	async fn count_students(&self) -> SfResult<u32> {
		self.inner.count_students().await
	}
	async fn create_student(&self, student: &NewStudent, created_at: Timestamp) -> SfResult<Box<str>> {
		self.inner.create_student(student, created_at).await
	}
	async fn create_file(&self, file: &NewUploadedFile, uploaded_at: Timestamp) -> SfResult<Box<str>> {
		self.inner.create_file(file, uploaded_at).await
	}
	async fn read_file(&self, file_id: &str) -> SfResult<UploadedFile> {
		self.inner.read_file(file_id).await
	}
	async fn read_file_name(&self, storage_path: &str) -> SfResult<Option<Box<str>>> {
		self.inner.read_file_name(storage_path).await
	}
	async fn delete_file(&self, file_id: &str) -> SfResult<u32> {
		self.inner.delete_file(file_id).await
	}
}

pub struct TestEnv {
	pub app: App,
	pub transport: Arc<MockTransport>,
	pub queue: Arc<FaultyQueue>,
	_temp_dir: TempDir,
}

impl TestEnv {
	pub async fn new() -> Self {
		Self::with_transport(MockTransport::default(), Duration::from_secs(5)).await
	}

	pub async fn with_transport(transport: MockTransport, send_timeout: Duration) -> Self {
		Self::with_options(transport, send_timeout, DEFAULT_CLAIM_LEASE_SECS).await
	}

	pub async fn with_options(
		transport: MockTransport,
		send_timeout: Duration,
		claim_lease_secs: i64,
	) -> Self {
		let temp_dir = TempDir::new().expect("Failed to create temp directory");
		let queue = QueueAdapterSqlite::new(temp_dir.path().join("db"))
			.await
			.expect("Failed to create queue adapter");
		let queue = Arc::new(FaultyQueue {
			inner: queue,
			fail_audit_log: AtomicBool::new(false),
			fail_mark_sent: AtomicBool::new(false),
		});
		let blob = BlobAdapterFs::new(temp_dir.path().join("storage").into(), None)
			.await
			.expect("Failed to create blob adapter");
		let transport = Arc::new(transport);

		let mut builder = AppBuilder::new();
		builder
			.send_timeout(send_timeout)
			.claim_lease_secs(claim_lease_secs)
			.queue_adapter(queue.clone())
			.blob_adapter(Arc::new(blob))
			.mail_transport(transport.clone())
			.url_fetcher(Arc::new(OfflineFetcher));
		sfgs_email::register(&mut builder, None);
		let app = builder.build().expect("Failed to build app");

		Self { app, transport, queue, _temp_dir: temp_dir }
	}
}

// vim: ts=4
