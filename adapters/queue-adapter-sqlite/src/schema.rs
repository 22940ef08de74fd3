//! Database schema initialization
//!
//! Creates tables and indexes if they do not exist yet.

use sqlx::SqlitePool;

/// Initialize the database schema with all required tables and indexes
pub(crate) async fn init_db(db: &SqlitePool) -> Result<(), sqlx::Error> {
	let mut tx = db.begin().await?;

	// Queue
	//*******
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS queue (
		entry_id text NOT NULL,
		student_id text,
		matric_number text,
		recipient_email text NOT NULL,
		email_type text NOT NULL,
		subject text NOT NULL DEFAULT '',
		message text NOT NULL DEFAULT '',
		attachments json NOT NULL DEFAULT '[]',
		file_id text,
		status text NOT NULL DEFAULT 'pending',
		queued_at integer NOT NULL,
		prioritized_at integer,
		sent_at integer,
		failed_at integer,
		cancelled_at integer,
		error_message text,
		claim_token text,
		claimed_at integer,
		PRIMARY KEY(entry_id)
	)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query("CREATE INDEX IF NOT EXISTS idx_queue_status ON queue(status, queued_at)")
		.execute(&mut *tx)
		.await?;
	sqlx::query("CREATE INDEX IF NOT EXISTS idx_queue_sent_at ON queue(sent_at) WHERE status='sent'")
		.execute(&mut *tx)
		.await?;
	sqlx::query("CREATE INDEX IF NOT EXISTS idx_queue_student ON queue(student_id, email_type)")
		.execute(&mut *tx)
		.await?;
	sqlx::query("CREATE INDEX IF NOT EXISTS idx_queue_file ON queue(file_id)")
		.execute(&mut *tx)
		.await?;

	// Settings
	//**********
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS dispatch_settings (
		id integer PRIMARY KEY AUTOINCREMENT,
		daily_email_limit integer NOT NULL,
		email_batch_size integer NOT NULL,
		email_interval_minutes integer NOT NULL,
		cron_enabled boolean NOT NULL DEFAULT 1,
		updated_at integer NOT NULL
	)",
	)
	.execute(&mut *tx)
	.await?;

	// Audit log
	//***********
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS audit_logs (
		log_id integer PRIMARY KEY AUTOINCREMENT,
		status text NOT NULL,
		message text NOT NULL,
		queue_id text,
		created_at integer NOT NULL
	)",
	)
	.execute(&mut *tx)
	.await?;
	sqlx::query("CREATE INDEX IF NOT EXISTS idx_audit_logs_created ON audit_logs(created_at)")
		.execute(&mut *tx)
		.await?;

	// Counters and markers
	//**********************
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS daily_counts (
		date text NOT NULL,
		count integer NOT NULL DEFAULT 0,
		PRIMARY KEY(date)
	)",
	)
	.execute(&mut *tx)
	.await?;

	sqlx::query(
		"CREATE TABLE IF NOT EXISTS birthday_sent (
		student_id text NOT NULL,
		sent_date text NOT NULL,
		created_at integer NOT NULL,
		PRIMARY KEY(student_id, sent_date)
	)",
	)
	.execute(&mut *tx)
	.await?;

	// Students and uploads
	//**********************
	sqlx::query(
		"CREATE TABLE IF NOT EXISTS students (
		student_id text NOT NULL,
		student_name text NOT NULL,
		matric_number text,
		date_of_birth text,
		parent_email_1 text,
		parent_email_2 text,
		created_at integer NOT NULL,
		PRIMARY KEY(student_id)
	)",
	)
	.execute(&mut *tx)
	.await?;

	sqlx::query(
		"CREATE TABLE IF NOT EXISTS uploaded_files (
		file_id text NOT NULL,
		storage_path text NOT NULL UNIQUE,
		original_file_name text NOT NULL,
		student_id text,
		matric_number text,
		uploaded_at integer NOT NULL,
		PRIMARY KEY(file_id)
	)",
	)
	.execute(&mut *tx)
	.await?;

	tx.commit().await?;

	Ok(())
}

// vim: ts=4
