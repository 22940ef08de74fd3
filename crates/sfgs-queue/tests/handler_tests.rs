//! HTTP handler behavior, called directly with extracted arguments

mod common;

use axum::{
	Json,
	extract::{Path, Query, State},
	http::StatusCode,
};

use common::*;
use sfgs_queue::{handler, process_queue};
use sfgs_types::error::Error;
use sfgs_types::queue::{
	AuditStatus, NewUploadedFile, QueueStatus, QueueStatusKind, SettingsPatch,
};
use sfgs_types::queue_adapter::ListEntryOptions;
use sfgs_types::types::Patch;

#[tokio::test]
async fn test_settings_patch() {
	let env = TestEnv::new().await;
	let state = || State(env.app.clone());

	let Json(settings) = handler::get_settings(state()).await.unwrap();
	assert_eq!(settings.daily_email_limit, 100);
	assert!(settings.updated_at.is_none());

	let bad = SettingsPatch { email_batch_size: Patch::Value(0), ..Default::default() };
	let res = handler::patch_settings(state(), Json(bad)).await;
	assert!(matches!(res, Err(Error::ValidationError(_))));

	let patch = SettingsPatch {
		daily_email_limit: Patch::Value(40),
		cron_enabled: Patch::Value(false),
		..Default::default()
	};
	let Json(stored) = handler::patch_settings(state(), Json(patch)).await.unwrap();
	assert_eq!(stored.daily_email_limit, 40);
	assert!(stored.updated_at.is_some());

	let Json(settings) = handler::get_settings(state()).await.unwrap();
	assert_eq!(settings.daily_email_limit, 40);
	assert_eq!(settings.email_batch_size, 10);
	assert!(!settings.cron_enabled);
}

#[tokio::test]
async fn test_enqueue_validation() {
	let env = TestEnv::new().await;

	let res = handler::post_queue(State(env.app.clone()), Json(pdf_entry("nobody"))).await;
	assert!(matches!(res, Err(Error::ValidationError(_))));

	let (status, Json(queued)) =
		handler::post_queue(State(env.app.clone()), Json(pdf_entry(" parent@example.com ")))
			.await
			.unwrap();
	assert_eq!(status, StatusCode::CREATED);
	assert_eq!(queued.len(), 1);
	assert_eq!(&*queued[0].recipient_email, "parent@example.com");
	assert!(matches!(queued[0].status, QueueStatus::Pending));

	// One bad address rejects the whole request
	let res = handler::post_queue(State(env.app.clone()), Json(pdf_entry("a@example.com, nobody"))).await;
	assert!(matches!(res, Err(Error::ValidationError(_))));
	let res = handler::post_queue(State(env.app.clone()), Json(pdf_entry(" , "))).await;
	assert!(matches!(res, Err(Error::ValidationError(_))));
	assert_eq!(env.app.queue_adapter.count_entries(QueueStatusKind::Pending).await.unwrap(), 1);

	let mut birthday = birthday_entry("", "mum@example.com");
	birthday.student_id = None;
	let res = handler::post_queue(State(env.app.clone()), Json(birthday)).await;
	assert!(matches!(res, Err(Error::ValidationError(_))));
}

#[tokio::test]
async fn test_enqueue_recipient_list() {
	let env = TestEnv::new().await;
	let mut entry = pdf_entry("mum@example.com, dad@example.com,MUM@example.com");
	entry.student_id = None;

	let (_, Json(queued)) = handler::post_queue(State(env.app.clone()), Json(entry)).await.unwrap();
	let recipients: Vec<&str> = queued.iter().map(|entry| &*entry.recipient_email).collect();
	assert_eq!(recipients, vec!["mum@example.com", "dad@example.com"]);
	assert!(queued.iter().all(|entry| entry.student_id.is_none()));

	let report = process_queue(&env.app, NOW).await;
	assert_eq!(report.sent, 2);
	assert_eq!(env.transport.recipients(), vec!["mum@example.com", "dad@example.com"]);
}

#[tokio::test]
async fn test_operator_actions() {
	let env = TestEnv::new().await;
	let state = || State(env.app.clone());
	let ids = enqueue(&env.app, &[pdf_entry("a@example.com"), pdf_entry("b@example.com")]).await;
	let id = || Path(ids[0].to_string());

	// Toggle priority on and off
	let Json(entry) = handler::post_prioritize(state(), id()).await.unwrap();
	assert!(entry.prioritized_at.is_some());
	let Json(listed) = handler::list_queue(state(), Query(ListEntryOptions::default())).await.unwrap();
	assert_eq!(listed[0].id, ids[0]);
	let Json(entry) = handler::post_prioritize(state(), id()).await.unwrap();
	assert!(entry.prioritized_at.is_none());

	let Json(entry) = handler::post_cancel(state(), id()).await.unwrap();
	assert_eq!(entry.status.kind(), QueueStatusKind::Cancelled);
	assert!(matches!(handler::post_cancel(state(), id()).await, Err(Error::Conflict(_))));
	assert!(matches!(handler::post_prioritize(state(), id()).await, Err(Error::Conflict(_))));

	let Json(entry) = handler::post_retry(state(), id()).await.unwrap();
	assert_eq!(entry.status.kind(), QueueStatusKind::Pending);

	let status = handler::delete_queue_entry(state(), id()).await.unwrap();
	assert_eq!(status, StatusCode::NO_CONTENT);
	assert!(matches!(handler::get_queue_entry(state(), id()).await, Err(Error::NotFound)));

	let Json(remaining) = handler::list_queue(
		state(),
		Query(ListEntryOptions { status: Some(QueueStatusKind::Pending), ..Default::default() }),
	)
	.await
	.unwrap();
	assert_eq!(remaining.len(), 1);
	assert_eq!(remaining[0].id, ids[1]);
}

#[tokio::test]
async fn test_process_and_stats() {
	let env = TestEnv::new().await;
	let state = || State(env.app.clone());
	enqueue(&env.app, &[pdf_entry("a@example.com"), pdf_entry("b@example.com")]).await;
	env.transport.fail_for("b@example.com");

	let (status, Json(report)) = handler::post_process_queue(state()).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(report.status, AuditStatus::PartialSuccess);

	let Json(stats) = handler::get_stats(state()).await.unwrap();
	assert_eq!(stats.sent_today, 1);
	assert_eq!(stats.daily_count, 1);
	assert_eq!(stats.failed, 1);
	assert_eq!(stats.pending, 0);
	assert_eq!(stats.daily_limit, 100);

	let Json(logs) =
		handler::get_logs(state(), Query(handler::LogQuery { limit: Some(1) })).await.unwrap();
	assert_eq!(logs.len(), 1);
	assert_eq!(logs[0].status, AuditStatus::PartialSuccess);
}

#[tokio::test]
async fn test_send_email() {
	let env = TestEnv::new().await;
	let state = || State(env.app.clone());
	let request = |text: Option<&str>, html: Option<&str>| handler::SendEmailRequest {
		to: "parent@example.com".into(),
		subject: "Test Test".into(),
		text: text.map(Into::into),
		html: html.map(Into::into),
	};

	let res = handler::post_send_email(state(), Json(request(None, Some("  ")))).await;
	assert!(matches!(res, Err(Error::ValidationError(_))));
	assert!(env.transport.sent().is_empty());

	let Json(res) = handler::post_send_email(state(), Json(request(Some("hello"), None))).await.unwrap();
	assert!(res.success);
	let sent = env.transport.sent();
	assert_eq!(sent[0].text_body.as_deref(), Some("hello"));
	assert!(sent[0].html_body.is_none());

	env.transport.fail_for("parent@example.com");
	let res = handler::post_send_email(state(), Json(request(Some("hello"), None))).await;
	assert!(matches!(res, Err(Error::ServiceUnavailable(_))));
}

#[tokio::test]
async fn test_delete_file_cascades() {
	let env = TestEnv::new().await;
	let app = &env.app;
	app.blob_adapter.create_blob("reports/ada.pdf", b"%PDF").await.unwrap();
	let file_id = app
		.queue_adapter
		.create_file(
			&NewUploadedFile {
				storage_path: "reports/ada.pdf".into(),
				original_file_name: "Ada Term 2.pdf".into(),
				student_id: None,
				matric_number: None,
			},
			NOW,
		)
		.await
		.unwrap();

	let mut with_attachment = pdf_entry("a@example.com");
	with_attachment.attachments = vec!["reports/ada.pdf".into()];
	let mut with_file = pdf_entry("b@example.com");
	with_file.file_id = Some(file_id.clone());
	let ids = enqueue(app, &[with_attachment, with_file, pdf_entry("c@example.com")]).await;

	let Json(res) =
		handler::delete_file(State(app.clone()), Path(file_id.to_string())).await.unwrap();
	assert_eq!(res.deleted_entries, 2);
	assert!(app.blob_adapter.stat_blob("reports/ada.pdf").await.is_none());
	assert!(app.queue_adapter.read_entry(&ids[2]).await.is_ok());
	assert!(matches!(app.queue_adapter.read_file(&file_id).await, Err(Error::NotFound)));
}

// vim: ts=4
