//! Utility functions

use rand::RngExt;

use crate::prelude::*;

pub const ID_LENGTH: usize = 24;
pub const SAFE: [char; 62] = [
	'0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i',
	'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', 'A', 'B',
	'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U',
	'V', 'W', 'X', 'Y', 'Z',
];

pub fn random_id() -> SfResult<String> {
	let mut rng = rand::rng();
	let mut result = String::with_capacity(ID_LENGTH);

	for _ in 0..ID_LENGTH {
		result.push(SAFE[rng.random_range(0..SAFE.len())]);
	}
	Ok(result)
}

/// Loose address check: `local@domain.tld`, no whitespace
pub fn is_valid_email(email: &str) -> bool {
	let Some((local, domain)) = email.split_once('@') else {
		return false;
	};
	!local.is_empty()
		&& !domain.contains('@')
		&& !email.chars().any(char::is_whitespace)
		&& domain.split('.').count() >= 2
		&& domain.split('.').all(|part| !part.is_empty())
}

pub fn is_http_url(s: &str) -> bool {
	let lower = s.trim_start().to_ascii_lowercase();
	lower.starts_with("http://") || lower.starts_with("https://")
}

/// Last `/`-separated segment of a path or URL, without query string
pub fn last_path_segment(path: &str) -> &str {
	let path = path.split(['?', '#']).next().unwrap_or(path);
	path.trim_end_matches('/').rsplit('/').next().unwrap_or(path)
}

/// Extension of the last path segment (lowercase, without the dot)
pub fn file_extension(path: &str) -> Option<String> {
	let name = last_path_segment(path);
	match name.rsplit_once('.') {
		Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext.to_ascii_lowercase()),
		_ => None,
	}
}

/// Content type guessed from a file name
pub fn content_type_for(name: &str) -> &'static str {
	match file_extension(name).as_deref() {
		Some("pdf") => "application/pdf",
		Some("png") => "image/png",
		Some("jpg" | "jpeg") => "image/jpeg",
		Some("gif") => "image/gif",
		Some("txt") => "text/plain",
		Some("html" | "htm") => "text/html",
		Some("csv") => "text/csv",
		Some("doc") => "application/msword",
		Some("docx") => {
			"application/vnd.openxmlformats-officedocument.wordprocessingml.document"
		}
		_ => "application/octet-stream",
	}
}


// vim: ts=4
