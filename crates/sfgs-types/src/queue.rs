//! Queue, settings, audit and student records

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::str::FromStr;

use crate::prelude::*;

// EmailType //
//***********//
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailType {
	Pdf,
	Birthday,
}

impl EmailType {
	pub fn as_str(&self) -> &'static str {
		match self {
			EmailType::Pdf => "pdf",
			EmailType::Birthday => "birthday",
		}
	}
}

impl FromStr for EmailType {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"pdf" => Ok(EmailType::Pdf),
			"birthday" => Ok(EmailType::Birthday),
			_ => Err(Error::Parse),
		}
	}
}

// QueueStatus //
//*************//
/// Lifecycle state of a queue entry, carrying the data each state requires
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum QueueStatus {
	Pending,
	#[serde(rename_all = "camelCase")]
	Sent { sent_at: Timestamp },
	#[serde(rename_all = "camelCase")]
	Failed { failed_at: Timestamp, error_message: Box<str> },
	#[serde(rename_all = "camelCase")]
	Cancelled { cancelled_at: Timestamp },
}

impl QueueStatus {
	pub fn kind(&self) -> QueueStatusKind {
		match self {
			QueueStatus::Pending => QueueStatusKind::Pending,
			QueueStatus::Sent { .. } => QueueStatusKind::Sent,
			QueueStatus::Failed { .. } => QueueStatusKind::Failed,
			QueueStatus::Cancelled { .. } => QueueStatusKind::Cancelled,
		}
	}
}

/// Bare status tag, as stored and as used in filters
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueStatusKind {
	Pending,
	Sent,
	Failed,
	Cancelled,
}

impl QueueStatusKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			QueueStatusKind::Pending => "pending",
			QueueStatusKind::Sent => "sent",
			QueueStatusKind::Failed => "failed",
			QueueStatusKind::Cancelled => "cancelled",
		}
	}
}

impl FromStr for QueueStatusKind {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"pending" => Ok(QueueStatusKind::Pending),
			"sent" => Ok(QueueStatusKind::Sent),
			"failed" => Ok(QueueStatusKind::Failed),
			"cancelled" => Ok(QueueStatusKind::Cancelled),
			_ => Err(Error::Parse),
		}
	}
}

// QueueEntry //
//************//
/// One outbound email job
#[skip_serializing_none]
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
	pub id: Box<str>,
	pub student_id: Option<Box<str>>,
	pub matric_number: Option<Box<str>>,
	pub student_name: Option<Box<str>>,
	pub recipient_email: Box<str>,
	pub email_type: EmailType,
	pub subject: Box<str>,
	pub message: Box<str>,
	pub attachments: Vec<Box<str>>,
	pub file_id: Option<Box<str>>,
	pub queued_at: Timestamp,
	pub prioritized_at: Option<Timestamp>,
	#[serde(flatten)]
	pub status: QueueStatus,
}

impl QueueEntry {
	pub fn is_birthday(&self) -> bool {
		self.email_type == EmailType::Birthday
	}
}

/// Data for enqueueing a new job (always created `pending`)
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQueueEntry {
	#[serde(default)]
	pub student_id: Option<Box<str>>,
	pub matric_number: Option<Box<str>>,
	pub recipient_email: Box<str>,
	pub email_type: EmailType,
	#[serde(default)]
	pub subject: Box<str>,
	#[serde(default)]
	pub message: Box<str>,
	#[serde(default)]
	pub attachments: Vec<Box<str>>,
	pub file_id: Option<Box<str>>,
}

// DispatchSettings //
//******************//
pub const DEFAULT_DAILY_EMAIL_LIMIT: i64 = 100;
pub const DEFAULT_EMAIL_BATCH_SIZE: i64 = 10;
pub const DEFAULT_EMAIL_INTERVAL_MINUTES: i64 = 5;

/// Throughput policy; each update is stored as a new version
#[skip_serializing_none]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchSettings {
	pub daily_email_limit: i64,
	pub email_batch_size: i64,
	pub email_interval_minutes: i64,
	pub cron_enabled: bool,
	pub updated_at: Option<Timestamp>,
}

impl Default for DispatchSettings {
	fn default() -> Self {
		Self {
			daily_email_limit: DEFAULT_DAILY_EMAIL_LIMIT,
			email_batch_size: DEFAULT_EMAIL_BATCH_SIZE,
			email_interval_minutes: DEFAULT_EMAIL_INTERVAL_MINUTES,
			cron_enabled: true,
			updated_at: None,
		}
	}
}

/// Partial settings update
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
	pub daily_email_limit: Patch<i64>,
	pub email_batch_size: Patch<i64>,
	pub email_interval_minutes: Patch<i64>,
	pub cron_enabled: Patch<bool>,
}

// Audit log //
//***********//
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
	Success,
	PartialSuccess,
	IntervalNotMet,
	DailyLimitReached,
	NoPending,
	CronDisabled,
	Error,
}

impl AuditStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			AuditStatus::Success => "success",
			AuditStatus::PartialSuccess => "partial_success",
			AuditStatus::IntervalNotMet => "interval_not_met",
			AuditStatus::DailyLimitReached => "daily_limit_reached",
			AuditStatus::NoPending => "no_pending",
			AuditStatus::CronDisabled => "cron_disabled",
			AuditStatus::Error => "error",
		}
	}
}

impl FromStr for AuditStatus {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"success" => Ok(AuditStatus::Success),
			"partial_success" => Ok(AuditStatus::PartialSuccess),
			"interval_not_met" => Ok(AuditStatus::IntervalNotMet),
			"daily_limit_reached" => Ok(AuditStatus::DailyLimitReached),
			"no_pending" => Ok(AuditStatus::NoPending),
			"cron_disabled" => Ok(AuditStatus::CronDisabled),
			"error" => Ok(AuditStatus::Error),
			_ => Err(Error::Parse),
		}
	}
}

#[skip_serializing_none]
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
	pub id: i64,
	pub status: AuditStatus,
	pub message: Box<str>,
	pub queue_id: Option<Box<str>>,
	pub created_at: Timestamp,
}

/// Sends recorded for one local calendar day
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DailyCount {
	pub date: NaiveDate,
	pub count: u32,
}

// Students //
//**********//
#[skip_serializing_none]
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
	pub id: Box<str>,
	pub student_name: Box<str>,
	pub matric_number: Option<Box<str>>,
	pub date_of_birth: Option<NaiveDate>,
	pub parent_email_1: Option<Box<str>>,
	pub parent_email_2: Option<Box<str>>,
}

impl Student {
	/// Distinct, non-empty parent addresses in declaration order
	pub fn parent_emails(&self) -> Vec<&str> {
		let mut res: Vec<&str> = Vec::with_capacity(2);
		for email in [&self.parent_email_1, &self.parent_email_2].into_iter().flatten() {
			let email = email.trim();
			if !email.is_empty() && !res.iter().any(|e| e.eq_ignore_ascii_case(email)) {
				res.push(email);
			}
		}
		res
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudent {
	pub student_name: Box<str>,
	pub matric_number: Option<Box<str>>,
	pub date_of_birth: Option<NaiveDate>,
	pub parent_email_1: Option<Box<str>>,
	pub parent_email_2: Option<Box<str>>,
}

// Uploaded files //
//****************//
#[skip_serializing_none]
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
	pub id: Box<str>,
	pub storage_path: Box<str>,
	pub original_file_name: Box<str>,
	pub student_id: Option<Box<str>>,
	pub matric_number: Option<Box<str>>,
	pub uploaded_at: Timestamp,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUploadedFile {
	pub storage_path: Box<str>,
	pub original_file_name: Box<str>,
	pub student_id: Option<Box<str>>,
	pub matric_number: Option<Box<str>>,
}


// vim: ts=4
