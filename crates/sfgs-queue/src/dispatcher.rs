//! Sends one claimed entry and records the outcome

use std::fmt;

use sfgs_email::ResolvedContent;
use sfgs_types::queue::{AuditStatus, QueueEntry};

use crate::prelude::*;

#[derive(Debug)]
pub enum DispatchError {
	/// The transport rejected the message or timed out; the entry is marked failed
	Send(String),
	/// Recording the failure failed
	Store(Error),
	/// The message went out but could not be marked sent
	Unrecorded(Error),
}

impl fmt::Display for DispatchError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			DispatchError::Send(msg) => write!(f, "{}", msg),
			DispatchError::Store(err) => write!(f, "store error: {}", err),
			DispatchError::Unrecorded(err) => write!(f, "sent but not recorded: {}", err),
		}
	}
}

impl std::error::Error for DispatchError {}

/// Writes an audit log entry; failures are only logged
pub async fn audit(
	app: &App,
	status: AuditStatus,
	message: &str,
	queue_id: Option<&str>,
	now: Timestamp,
) {
	if let Err(err) = app.queue_adapter.create_audit_log(status, message, queue_id, now).await {
		warn!(status = status.as_str(), "Failed to write audit log: {}", err);
	}
}

/// Records a failed attempt on a claimed entry
pub async fn fail(
	app: &App,
	entry: &QueueEntry,
	claim_token: &str,
	message: &str,
	now: Timestamp,
) -> DispatchError {
	warn!(entry_id = %entry.id, recipient = %entry.recipient_email, "Email failed: {}", message);
	if let Err(err) = app.queue_adapter.mark_failed(&entry.id, claim_token, now, message).await {
		error!(entry_id = %entry.id, "Failed to mark entry failed: {}", err);
		return DispatchError::Store(err);
	}
	audit(
		app,
		AuditStatus::Error,
		&format!("Failed to send to {}: {}", entry.recipient_email, message),
		Some(&entry.id),
		now,
	)
	.await;
	DispatchError::Send(message.to_string())
}

/// Sends `content` to the entry's recipient within the configured timeout
pub async fn dispatch(
	app: &App,
	claim_token: &str,
	entry: &QueueEntry,
	content: ResolvedContent,
	now: Timestamp,
) -> Result<(), DispatchError> {
	let email = content.into_email(&entry.recipient_email);
	let timeout = app.opts.send_timeout;

	let res = tokio::time::timeout(timeout, app.mail_transport.send_email(&email)).await;
	match res {
		Ok(Ok(())) => {}
		Ok(Err(err)) => return Err(fail(app, entry, claim_token, &err.to_string(), now).await),
		Err(_) => {
			let msg = format!("send timed out after {}s", timeout.as_secs());
			return Err(fail(app, entry, claim_token, &msg, now).await);
		}
	}

	let day = app.day_of(now).date;
	if let Err(err) = app.queue_adapter.mark_sent(&entry.id, claim_token, now, day).await {
		error!(entry_id = %entry.id, "Email sent but could not be marked sent: {}", err);
		return Err(DispatchError::Unrecorded(err));
	}

	info!(entry_id = %entry.id, recipient = %entry.recipient_email, "Email sent");
	audit(
		app,
		AuditStatus::Success,
		&format!("Email sent to {}", entry.recipient_email),
		Some(&entry.id),
		now,
	)
	.await;
	Ok(())
}

// vim: ts=4
