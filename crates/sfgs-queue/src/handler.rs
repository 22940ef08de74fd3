//! HTTP handlers for the queue, settings, birthday and maintenance endpoints

use axum::{
	Json,
	extract::{Path, Query, State},
	http::StatusCode,
};
use serde::{Deserialize, Serialize};

use sfgs_core::settings::{apply_patch, effective};
use sfgs_types::mail::OutgoingEmail;
use sfgs_types::queue::{
	AuditLogEntry, AuditStatus, DispatchSettings, EmailType, NewQueueEntry, QueueEntry,
	QueueStatusKind, SettingsPatch,
};
use sfgs_types::queue_adapter::ListEntryOptions;
use sfgs_types::utils::is_valid_email;

use crate::birthday::{BirthdayReport, queue_birthday_emails};
use crate::prelude::*;
use crate::scheduler::{ProcessReport, process_queue};

const DEFAULT_LOG_LIMIT: u32 = 50;
const MAX_LOG_LIMIT: u32 = 500;

// Processing //
//************//

/// POST /api/queue/process
pub async fn post_process_queue(State(app): State<App>) -> (StatusCode, Json<ProcessReport>) {
	let report = process_queue(&app, Timestamp::now()).await;
	let status = if report.status == AuditStatus::Error {
		StatusCode::INTERNAL_SERVER_ERROR
	} else {
		StatusCode::OK
	};
	(status, Json(report))
}

/// GET|POST /api/birthday
pub async fn post_birthday(State(app): State<App>) -> SfResult<Json<BirthdayReport>> {
	Ok(Json(queue_birthday_emails(&app, Timestamp::now()).await?))
}

// Settings //
//**********//

/// GET /api/settings
pub async fn get_settings(State(app): State<App>) -> SfResult<Json<DispatchSettings>> {
	Ok(Json(effective(app.queue_adapter.read_settings().await?)))
}

/// PATCH /api/settings
pub async fn patch_settings(
	State(app): State<App>,
	Json(patch): Json<SettingsPatch>,
) -> SfResult<Json<DispatchSettings>> {
	let current = effective(app.queue_adapter.read_settings().await?);
	let next = apply_patch(&current, &patch)?;
	let stored = app.queue_adapter.create_settings(&next, Timestamp::now()).await?;
	info!(
		daily_email_limit = stored.daily_email_limit,
		email_batch_size = stored.email_batch_size,
		email_interval_minutes = stored.email_interval_minutes,
		cron_enabled = stored.cron_enabled,
		"Dispatch settings updated"
	);
	Ok(Json(stored))
}

// Queue entries //
//***************//

/// GET /api/queue
pub async fn list_queue(
	State(app): State<App>,
	Query(opts): Query<ListEntryOptions>,
) -> SfResult<Json<Vec<QueueEntry>>> {
	Ok(Json(app.queue_adapter.list_entries(&opts).await?))
}

/// POST /api/queue
///
/// `recipientEmail` may hold several comma-separated addresses, one entry is
/// queued per distinct address. All addresses are validated before anything
/// is queued.
pub async fn post_queue(
	State(app): State<App>,
	Json(entry): Json<NewQueueEntry>,
) -> SfResult<(StatusCode, Json<Vec<QueueEntry>>)> {
	let mut recipients: Vec<&str> = Vec::new();
	for recipient in entry.recipient_email.split(',').map(str::trim).filter(|r| !r.is_empty()) {
		if !is_valid_email(recipient) {
			return Err(Error::ValidationError(format!("invalid recipient email: {}", recipient)));
		}
		if !recipients.iter().any(|r| r.eq_ignore_ascii_case(recipient)) {
			recipients.push(recipient);
		}
	}
	if recipients.is_empty() {
		return Err(Error::ValidationError("recipientEmail is required".into()));
	}

	let student_id: Option<Box<str>> =
		entry.student_id.as_deref().map(str::trim).filter(|id| !id.is_empty()).map(Into::into);
	if entry.email_type == EmailType::Birthday && student_id.is_none() {
		return Err(Error::ValidationError("studentId is required for birthday emails".into()));
	}

	let now = Timestamp::now();
	let mut queued = Vec::with_capacity(recipients.len());
	for recipient in recipients {
		let next = NewQueueEntry {
			student_id: student_id.clone(),
			recipient_email: recipient.into(),
			..entry.clone()
		};
		let entry_id = app.queue_adapter.create_entry(&next, now).await?;
		info!(entry_id = %entry_id, email_type = next.email_type.as_str(), "Email queued");
		queued.push(app.queue_adapter.read_entry(&entry_id).await?);
	}
	Ok((StatusCode::CREATED, Json(queued)))
}

/// GET /api/queue/{id}
pub async fn get_queue_entry(
	State(app): State<App>,
	Path(entry_id): Path<String>,
) -> SfResult<Json<QueueEntry>> {
	Ok(Json(app.queue_adapter.read_entry(&entry_id).await?))
}

/// POST /api/queue/{id}/retry
pub async fn post_retry(
	State(app): State<App>,
	Path(entry_id): Path<String>,
) -> SfResult<Json<QueueEntry>> {
	app.queue_adapter.retry_entry(&entry_id, Timestamp::now()).await?;
	info!(entry_id = %entry_id, "Entry re-queued");
	Ok(Json(app.queue_adapter.read_entry(&entry_id).await?))
}

/// POST /api/queue/{id}/cancel
pub async fn post_cancel(
	State(app): State<App>,
	Path(entry_id): Path<String>,
) -> SfResult<Json<QueueEntry>> {
	app.queue_adapter.cancel_entry(&entry_id, Timestamp::now()).await?;
	info!(entry_id = %entry_id, "Entry cancelled");
	Ok(Json(app.queue_adapter.read_entry(&entry_id).await?))
}

/// POST /api/queue/{id}/prioritize
///
/// Toggles the priority mark of a pending entry.
pub async fn post_prioritize(
	State(app): State<App>,
	Path(entry_id): Path<String>,
) -> SfResult<Json<QueueEntry>> {
	let entry = app.queue_adapter.read_entry(&entry_id).await?;
	let prioritized_at = match entry.prioritized_at {
		Some(_) => None,
		None => Some(Timestamp::now()),
	};
	app.queue_adapter.set_prioritized(&entry_id, prioritized_at).await?;
	Ok(Json(app.queue_adapter.read_entry(&entry_id).await?))
}

/// DELETE /api/queue/{id}
pub async fn delete_queue_entry(
	State(app): State<App>,
	Path(entry_id): Path<String>,
) -> SfResult<StatusCode> {
	app.queue_adapter.delete_entry(&entry_id).await?;
	info!(entry_id = %entry_id, "Entry deleted");
	Ok(StatusCode::NO_CONTENT)
}

// Files //
//*******//

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDeleteResult {
	pub file_id: String,
	pub deleted_entries: u32,
}

/// DELETE /api/files/{id}
///
/// Removes the file record, every queue entry referencing it and the blob.
pub async fn delete_file(
	State(app): State<App>,
	Path(file_id): Path<String>,
) -> SfResult<Json<FileDeleteResult>> {
	let file = app.queue_adapter.read_file(&file_id).await?;
	let deleted_entries = app.queue_adapter.delete_file(&file_id).await?;

	match app.blob_adapter.delete_blob(&file.storage_path).await {
		Ok(()) | Err(Error::NotFound) => {}
		Err(err) => warn!(storage_path = %file.storage_path, "Failed to delete blob: {}", err),
	}

	info!(file_id = %file_id, deleted_entries, "Uploaded file deleted");
	Ok(Json(FileDeleteResult { file_id, deleted_entries }))
}

// Test email //
//************//

#[derive(Debug, Deserialize)]
pub struct SendEmailRequest {
	pub to: String,
	pub subject: String,
	pub text: Option<String>,
	pub html: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SendEmailResult {
	pub success: bool,
}

fn non_empty(value: Option<String>) -> Option<Box<str>> {
	value.filter(|v| !v.trim().is_empty()).map(Into::into)
}

/// POST /api/send-email
///
/// Sends a message directly through the transport, bypassing the queue.
pub async fn post_send_email(
	State(app): State<App>,
	Json(req): Json<SendEmailRequest>,
) -> SfResult<Json<SendEmailResult>> {
	let to = req.to.trim();
	if !is_valid_email(to) {
		return Err(Error::ValidationError(format!("invalid recipient email: {}", to)));
	}
	if req.subject.trim().is_empty() {
		return Err(Error::ValidationError("subject is required".into()));
	}
	let text_body = non_empty(req.text);
	let html_body = non_empty(req.html);
	if text_body.is_none() && html_body.is_none() {
		return Err(Error::ValidationError("text or html body is required".into()));
	}

	let email = OutgoingEmail {
		to: to.into(),
		subject: req.subject.into(),
		html_body,
		text_body,
		attachments: Vec::new(),
	};
	tokio::time::timeout(app.opts.send_timeout, app.mail_transport.send_email(&email))
		.await
		.map_err(|_| Error::Timeout)??;

	info!(to = %email.to, "Test email sent");
	Ok(Json(SendEmailResult { success: true }))
}

// Dashboard //
//***********//

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
	/// Sent during the current local day, from the queue itself
	pub sent_today: u32,
	/// Counter maintained alongside each send
	pub daily_count: u32,
	pub daily_limit: i64,
	pub pending: u32,
	pub failed: u32,
	pub cancelled: u32,
	pub students: u32,
}

/// GET /api/stats
pub async fn get_stats(State(app): State<App>) -> SfResult<Json<Stats>> {
	let day = app.day_of(Timestamp::now());
	let settings = effective(app.queue_adapter.read_settings().await?);

	Ok(Json(Stats {
		sent_today: app.queue_adapter.count_sent_between(day.start, day.end).await?,
		daily_count: app.queue_adapter.read_daily_count(day.date).await?,
		daily_limit: settings.daily_email_limit,
		pending: app.queue_adapter.count_entries(QueueStatusKind::Pending).await?,
		failed: app.queue_adapter.count_entries(QueueStatusKind::Failed).await?,
		cancelled: app.queue_adapter.count_entries(QueueStatusKind::Cancelled).await?,
		students: app.queue_adapter.count_students().await?,
	}))
}

#[derive(Debug, Default, Deserialize)]
pub struct LogQuery {
	pub limit: Option<u32>,
}

/// GET /api/logs
pub async fn get_logs(
	State(app): State<App>,
	Query(query): Query<LogQuery>,
) -> SfResult<Json<Vec<AuditLogEntry>>> {
	let limit = query.limit.unwrap_or(DEFAULT_LOG_LIMIT).clamp(1, MAX_LOG_LIMIT);
	Ok(Json(app.queue_adapter.list_audit_logs(limit).await?))
}

// vim: ts=4
