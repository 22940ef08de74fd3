//! Student records (read model for the birthday generator)

use sqlx::{Row, SqlitePool};

use sfgs_types::prelude::*;
use sfgs_types::queue::{NewStudent, Student};

use crate::utils::*;

pub(crate) async fn list(db: &SqlitePool) -> SfResult<Vec<Student>> {
	let res = sqlx::query(
		"SELECT student_id, student_name, matric_number, date_of_birth, parent_email_1, parent_email_2
		FROM students ORDER BY student_name, student_id",
	)
	.fetch_all(db)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?;

	collect_res(res.iter().map(|row| {
		let student_id: Box<str> = row.try_get("student_id")?;
		let date_of_birth = row.try_get::<Option<&str>, _>("date_of_birth")?.and_then(|s| {
			let date = parse_date(s);
			if date.is_none() && !s.trim().is_empty() {
				warn!(student_id = %student_id, "Unparsable date of birth: {:?}", s);
			}
			date
		});
		Ok(Student {
			student_name: row.try_get("student_name")?,
			matric_number: row.try_get("matric_number")?,
			parent_email_1: row.try_get("parent_email_1")?,
			parent_email_2: row.try_get("parent_email_2")?,
			date_of_birth,
			id: student_id,
		})
	}))
}

pub(crate) async fn count(db: &SqlitePool) -> SfResult<u32> {
	let res = sqlx::query("SELECT count(*) FROM students").fetch_one(db).await;

	map_res(res, |row| row.try_get::<i64, _>(0).map(|n| n as u32))
}

pub(crate) async fn create(
	db: &SqlitePool,
	student: &NewStudent,
	created_at: Timestamp,
) -> SfResult<Box<str>> {
	let student_id = new_id();

	sqlx::query(
		"INSERT INTO students (student_id, student_name, matric_number, date_of_birth,
		parent_email_1, parent_email_2, created_at)
		VALUES (?, ?, ?, ?, ?, ?, ?)",
	)
	.bind(&*student_id)
	.bind(&*student.student_name)
	.bind(student.matric_number.as_deref())
	.bind(student.date_of_birth.map(format_date))
	.bind(student.parent_email_1.as_deref())
	.bind(student.parent_email_2.as_deref())
	.bind(created_at.0)
	.execute(db)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?;

	Ok(student_id)
}

// vim: ts=4
