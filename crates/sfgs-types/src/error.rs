//! Error type shared by every crate of the workspace

use std::fmt;

use axum::{
	Json,
	http::StatusCode,
	response::{IntoResponse, Response},
};

pub type SfResult<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
	/// Requested record does not exist
	NotFound,
	/// Missing or invalid API token
	Unauthorized,
	/// Operation is not allowed in the record's current state
	Conflict(String),
	/// Database operation failed (details are logged by the adapter)
	DbError,
	/// Malformed identifier or stored value
	Parse,
	/// Invalid input
	ValidationError(String),
	/// Invalid or missing configuration
	ConfigError(String),
	/// An external service (SMTP, storage, HTTP) failed
	ServiceUnavailable(String),
	/// An external call did not complete in time
	Timeout,
	Internal(String),

	// externals
	Io(std::io::Error),
}

impl Error {
	/// Stable machine-readable code used in JSON error bodies
	pub fn code(&self) -> &'static str {
		match self {
			Error::NotFound => "E-NOT-FOUND",
			Error::Unauthorized => "E-UNAUTHORIZED",
			Error::Conflict(_) => "E-CONFLICT",
			Error::DbError => "E-DB",
			Error::Parse => "E-PARSE",
			Error::ValidationError(_) => "E-VALIDATION",
			Error::ConfigError(_) => "E-CONFIG",
			Error::ServiceUnavailable(_) => "E-SERVICE",
			Error::Timeout => "E-TIMEOUT",
			Error::Internal(_) | Error::Io(_) => "E-INTERNAL",
		}
	}

	fn status_code(&self) -> StatusCode {
		match self {
			Error::NotFound => StatusCode::NOT_FOUND,
			Error::Unauthorized => StatusCode::UNAUTHORIZED,
			Error::Conflict(_) => StatusCode::CONFLICT,
			Error::ValidationError(_) | Error::Parse => StatusCode::BAD_REQUEST,
			Error::ServiceUnavailable(_) => StatusCode::BAD_GATEWAY,
			Error::Timeout => StatusCode::GATEWAY_TIMEOUT,
			Error::DbError | Error::ConfigError(_) | Error::Internal(_) | Error::Io(_) => {
				StatusCode::INTERNAL_SERVER_ERROR
			}
		}
	}
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Error::NotFound => write!(f, "not found"),
			Error::Unauthorized => write!(f, "unauthorized"),
			Error::Conflict(msg) => write!(f, "conflict: {}", msg),
			Error::DbError => write!(f, "database error"),
			Error::Parse => write!(f, "parse error"),
			Error::ValidationError(msg) => write!(f, "validation error: {}", msg),
			Error::ConfigError(msg) => write!(f, "configuration error: {}", msg),
			Error::ServiceUnavailable(msg) => write!(f, "service unavailable: {}", msg),
			Error::Timeout => write!(f, "timed out"),
			Error::Internal(msg) => write!(f, "internal error: {}", msg),
			Error::Io(err) => write!(f, "I/O error: {}", err),
		}
	}
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		if err.kind() == std::io::ErrorKind::NotFound { Self::NotFound } else { Self::Io(err) }
	}
}

impl From<serde_json::Error> for Error {
	fn from(err: serde_json::Error) -> Self {
		tracing::warn!("JSON error: {}", err);
		Self::Parse
	}
}

impl IntoResponse for Error {
	fn into_response(self) -> Response {
		let status = self.status_code();
		// Internal details stay in the logs
		let message = match &self {
			Error::DbError | Error::Internal(_) | Error::Io(_) => {
				tracing::error!("Request failed: {}", self);
				"internal error".to_string()
			}
			_ => self.to_string(),
		};
		let body = serde_json::json!({
			"error": {
				"code": self.code(),
				"message": message,
			}
		});
		(status, Json(body)).into_response()
	}
}


// vim: ts=4
