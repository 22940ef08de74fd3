//! Shared utilities for the SQLite adapter
//!
//! Error mapping helpers and conversions between stored values and domain types.

use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;

use sfgs_types::prelude::*;

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

/// Log database error for debugging
pub(crate) fn inspect(err: &sqlx::Error) {
	warn!("DB: {:#?}", err);
}

/// Map a single-row query result, translating SQL errors to SfResult
pub(crate) fn map_res<T, F>(row: Result<SqliteRow, sqlx::Error>, f: F) -> SfResult<T>
where
	F: FnOnce(SqliteRow) -> Result<T, sqlx::Error>,
{
	match row {
		Ok(row) => f(row).inspect_err(inspect).map_err(|_| Error::DbError),
		Err(sqlx::Error::RowNotFound) => Err(Error::NotFound),
		Err(err) => {
			inspect(&err);
			Err(Error::DbError)
		}
	}
}

/// Collect an iterator of query results, translating errors
pub(crate) fn collect_res<T>(
	iter: impl Iterator<Item = Result<T, sqlx::Error>> + Unpin,
) -> SfResult<Vec<T>> {
	let mut items = Vec::new();
	for item in iter {
		items.push(item.inspect_err(inspect).map_err(|_| Error::DbError)?);
	}
	Ok(items)
}

/// Error for a stored value that does not decode into its domain type
pub(crate) fn bad_value(column: &str, value: &str) -> sqlx::Error {
	sqlx::Error::Protocol(format!("invalid value in column {}: {:?}", column, value))
}

pub(crate) fn format_date(date: NaiveDate) -> String {
	date.format(DATE_FORMAT).to_string()
}

/// Parses a stored date, tolerating a trailing time part
pub(crate) fn parse_date(s: &str) -> Option<NaiveDate> {
	let s = s.trim();
	let day = s.get(..10).unwrap_or(s);
	NaiveDate::parse_from_str(day, DATE_FORMAT).ok()
}

pub(crate) fn new_id() -> Box<str> {
	uuid::Uuid::new_v4().to_string().into_boxed_str()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_date() {
		let d = NaiveDate::from_ymd_opt(2015, 6, 9).unwrap();
		assert_eq!(parse_date("2015-06-09"), Some(d));
		assert_eq!(parse_date("2015-06-09T00:00:00Z"), Some(d));
		assert_eq!(parse_date("09/06/2015"), None);
		assert_eq!(parse_date(""), None);
		assert_eq!(format_date(d), "2015-06-09");
	}
}

// vim: ts=4
