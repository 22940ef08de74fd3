//! Uploaded file metadata

use sqlx::{Row, SqlitePool};

use sfgs_types::prelude::*;
use sfgs_types::queue::{NewUploadedFile, UploadedFile};

use crate::utils::*;

pub(crate) async fn create(
	db: &SqlitePool,
	file: &NewUploadedFile,
	uploaded_at: Timestamp,
) -> SfResult<Box<str>> {
	let file_id = new_id();

	let res = sqlx::query(
		"INSERT INTO uploaded_files (file_id, storage_path, original_file_name, student_id,
		matric_number, uploaded_at)
		VALUES (?, ?, ?, ?, ?, ?)",
	)
	.bind(&*file_id)
	.bind(&*file.storage_path)
	.bind(&*file.original_file_name)
	.bind(file.student_id.as_deref())
	.bind(file.matric_number.as_deref())
	.bind(uploaded_at.0)
	.execute(db)
	.await;

	match res {
		Ok(_) => Ok(file_id),
		Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
			Err(Error::Conflict(format!("storage path {} is already registered", file.storage_path)))
		}
		Err(err) => {
			inspect(&err);
			Err(Error::DbError)
		}
	}
}

pub(crate) async fn read(db: &SqlitePool, file_id: &str) -> SfResult<UploadedFile> {
	let res = sqlx::query(
		"SELECT file_id, storage_path, original_file_name, student_id, matric_number, uploaded_at
		FROM uploaded_files WHERE file_id=?",
	)
	.bind(file_id)
	.fetch_one(db)
	.await;

	map_res(res, |row| {
		Ok(UploadedFile {
			id: row.try_get("file_id")?,
			storage_path: row.try_get("storage_path")?,
			original_file_name: row.try_get("original_file_name")?,
			student_id: row.try_get("student_id")?,
			matric_number: row.try_get("matric_number")?,
			uploaded_at: row.try_get("uploaded_at").map(Timestamp)?,
		})
	})
}

pub(crate) async fn read_name(db: &SqlitePool, storage_path: &str) -> SfResult<Option<Box<str>>> {
	let res = sqlx::query("SELECT original_file_name FROM uploaded_files WHERE storage_path=?")
		.bind(storage_path)
		.fetch_optional(db)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;

	match res {
		Some(row) => row.try_get("original_file_name").map(Some).map_err(|_| Error::DbError),
		None => Ok(None),
	}
}

/// Removes the record and every queue entry pointing at the file by id or storage path
pub(crate) async fn delete(db: &SqlitePool, file_id: &str) -> SfResult<u32> {
	let mut tx = db.begin().await.inspect_err(inspect).map_err(|_| Error::DbError)?;

	let row = sqlx::query("SELECT storage_path FROM uploaded_files WHERE file_id=?")
		.bind(file_id)
		.fetch_optional(&mut *tx)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;
	let Some(row) = row else {
		return Err(Error::NotFound);
	};
	let storage_path: Box<str> = row.try_get("storage_path").map_err(|_| Error::DbError)?;

	let res = sqlx::query(
		"DELETE FROM queue WHERE file_id=?
		OR EXISTS (SELECT 1 FROM json_each(queue.attachments) WHERE json_each.value=?)",
	)
	.bind(file_id)
	.bind(&*storage_path)
	.execute(&mut *tx)
	.await
	.inspect_err(inspect)
	.map_err(|_| Error::DbError)?;

	sqlx::query("DELETE FROM uploaded_files WHERE file_id=?")
		.bind(file_id)
		.execute(&mut *tx)
		.await
		.inspect_err(inspect)
		.map_err(|_| Error::DbError)?;

	tx.commit().await.inspect_err(inspect).map_err(|_| Error::DbError)?;

	Ok(res.rows_affected() as u32)
}

// vim: ts=4
