//! Queue adapter tests for settings, audit log, students and uploaded files

use chrono::NaiveDate;
use sfgs_queue_adapter_sqlite::QueueAdapterSqlite;
use sfgs_types::error::Error;
use sfgs_types::queue::{
	AuditStatus, DispatchSettings, EmailType, NewQueueEntry, NewStudent, NewUploadedFile,
};
use sfgs_types::queue_adapter::QueueAdapter;
use sfgs_types::types::Timestamp;
use tempfile::TempDir;

async fn create_test_adapter() -> (QueueAdapterSqlite, TempDir) {
	let temp_dir = TempDir::new().expect("Failed to create temp directory");
	let adapter = QueueAdapterSqlite::new(temp_dir.path()).await.expect("Failed to create adapter");
	(adapter, temp_dir)
}

#[tokio::test]
async fn test_settings_latest_version_wins() {
	let (adapter, _temp) = create_test_adapter().await;
	assert!(adapter.read_settings().await.unwrap().is_none());

	let first = DispatchSettings { daily_email_limit: 50, ..Default::default() };
	adapter.create_settings(&first, Timestamp(100)).await.unwrap();
	let second = DispatchSettings { email_batch_size: 3, cron_enabled: false, ..first.clone() };
	let stored = adapter.create_settings(&second, Timestamp(200)).await.unwrap();
	assert_eq!(stored.updated_at, Some(Timestamp(200)));

	let latest = adapter.read_settings().await.unwrap().expect("settings stored");
	assert_eq!(latest.daily_email_limit, 50);
	assert_eq!(latest.email_batch_size, 3);
	assert!(!latest.cron_enabled);

	// Same timestamp: the later insert wins
	let third = DispatchSettings { email_interval_minutes: 0, ..second };
	adapter.create_settings(&third, Timestamp(200)).await.unwrap();
	let latest = adapter.read_settings().await.unwrap().expect("settings stored");
	assert_eq!(latest.email_interval_minutes, 0);
}

#[tokio::test]
async fn test_audit_log_newest_first() {
	let (adapter, _temp) = create_test_adapter().await;
	adapter.create_audit_log(AuditStatus::NoPending, "nothing", None, Timestamp(1)).await.unwrap();
	adapter
		.create_audit_log(AuditStatus::Error, "smtp down", Some("q1"), Timestamp(2))
		.await
		.unwrap();
	adapter.create_audit_log(AuditStatus::Success, "done", None, Timestamp(3)).await.unwrap();

	let logs = adapter.list_audit_logs(2).await.unwrap();
	assert_eq!(logs.len(), 2);
	assert_eq!(logs[0].status, AuditStatus::Success);
	assert_eq!(logs[1].status, AuditStatus::Error);
	assert_eq!(logs[1].queue_id.as_deref(), Some("q1"));
}

#[tokio::test]
async fn test_students_round_trip() {
	let (adapter, _temp) = create_test_adapter().await;
	let dob = NaiveDate::from_ymd_opt(2012, 2, 29).unwrap();
	let id = adapter
		.create_student(
			&NewStudent {
				student_name: "Ada Obi".into(),
				matric_number: Some("SFGS/12".into()),
				date_of_birth: Some(dob),
				parent_email_1: Some("mum@example.com".into()),
				parent_email_2: None,
			},
			Timestamp(1),
		)
		.await
		.unwrap();

	let students = adapter.list_students().await.unwrap();
	assert_eq!(students.len(), 1);
	assert_eq!(students[0].id, id);
	assert_eq!(students[0].date_of_birth, Some(dob));
	assert_eq!(adapter.count_students().await.unwrap(), 1);

	// Entries join the student name for display
	let entry_id = adapter
		.create_entry(
			&NewQueueEntry {
				student_id: Some(id.clone()),
				matric_number: None,
				recipient_email: "mum@example.com".into(),
				email_type: EmailType::Birthday,
				subject: "".into(),
				message: "".into(),
				attachments: vec![],
				file_id: None,
			},
			Timestamp(2),
		)
		.await
		.unwrap();
	let entry = adapter.read_entry(&entry_id).await.unwrap();
	assert_eq!(entry.student_name.as_deref(), Some("Ada Obi"));
}

#[tokio::test]
async fn test_delete_file_removes_referencing_entries() {
	let (adapter, _temp) = create_test_adapter().await;
	let file_id = adapter
		.create_file(
			&NewUploadedFile {
				storage_path: "reports/ada.pdf".into(),
				original_file_name: "Ada Term 2.pdf".into(),
				student_id: None,
				matric_number: None,
			},
			Timestamp(1),
		)
		.await
		.unwrap();

	assert_eq!(
		adapter.read_file_name("reports/ada.pdf").await.unwrap().as_deref(),
		Some("Ada Term 2.pdf")
	);
	assert_eq!(adapter.read_file_name("reports/other.pdf").await.unwrap(), None);

	let entry = |attachments: Vec<Box<str>>, file: Option<Box<str>>| NewQueueEntry {
		student_id: Some("s1".into()),
		matric_number: None,
		recipient_email: "mum@example.com".into(),
		email_type: EmailType::Pdf,
		subject: "Report".into(),
		message: "See attached".into(),
		attachments,
		file_id: file,
	};
	adapter.create_entry(&entry(vec!["reports/ada.pdf".into()], None), Timestamp(2)).await.unwrap();
	adapter.create_entry(&entry(vec![], Some(file_id.clone())), Timestamp(3)).await.unwrap();
	let keep = adapter
		.create_entry(&entry(vec!["reports/other.pdf".into()], None), Timestamp(4))
		.await
		.unwrap();

	// Duplicate storage paths are rejected
	let dup = adapter
		.create_file(
			&NewUploadedFile {
				storage_path: "reports/ada.pdf".into(),
				original_file_name: "again.pdf".into(),
				student_id: None,
				matric_number: None,
			},
			Timestamp(5),
		)
		.await;
	assert!(matches!(dup, Err(Error::Conflict(_))));

	assert_eq!(adapter.delete_file(&file_id).await.unwrap(), 2);
	assert!(matches!(adapter.read_file(&file_id).await, Err(Error::NotFound)));
	assert!(adapter.read_entry(&keep).await.is_ok());
	assert!(matches!(adapter.delete_file(&file_id).await, Err(Error::NotFound)));
}

// vim: ts=4
