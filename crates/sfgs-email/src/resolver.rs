//! Content resolution: turns a queue entry into the final subject, bodies
//! and attachments.
//!
//! Birthday entries are rendered from the birthday template. Other entries
//! carry their own subject and message. Attachment references are either
//! absolute URLs (fetched) or storage keys (read from the blob store). A
//! reference that cannot be turned into bytes degrades to a download link or,
//! failing that, a "could not be delivered" placeholder in the body.

use handlebars::html_escape;

use sfgs_types::mail::{MailAttachment, OutgoingEmail};
use sfgs_types::queue::QueueEntry;
use sfgs_types::utils::{content_type_for, file_extension, is_http_url, last_path_segment};

use crate::fetch::MAX_ATTACHMENT_SIZE;
use crate::html::html_to_text;
use crate::prelude::*;
use crate::template::BIRTHDAY_TEMPLATE;
use crate::EmailModule;

pub const BIRTHDAY_SUBJECT: &str = "Happy Birthday from Sure Foundation Group of School";
pub const DEFAULT_STUDENT_NAME: &str = "your child";
pub const FALLBACK_SUBJECT: &str = "[Notification]";
pub const FALLBACK_MESSAGE: &str = "No message content provided.";
const DEFAULT_EXTENSION: &str = "pdf";
const DEFAULT_FILE_NAME: &str = "attachment";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolvedAttachment {
	Bytes { name: Box<str>, content_type: Box<str>, content: Vec<u8> },
	Link { name: Box<str>, url: Box<str> },
	Unavailable { name: Box<str> },
}

impl ResolvedAttachment {
	pub fn name(&self) -> &str {
		match self {
			Self::Bytes { name, .. } | Self::Link { name, .. } | Self::Unavailable { name } => name,
		}
	}

	pub fn is_bytes(&self) -> bool {
		matches!(self, Self::Bytes { .. })
	}
}

#[derive(Clone, Debug)]
pub struct ResolvedContent {
	pub subject: Box<str>,
	pub html_body: String,
	pub text_body: String,
	pub attachments: Vec<ResolvedAttachment>,
}

impl ResolvedContent {
	/// Builds the transport message; only byte attachments are attached
	pub fn into_email(self, to: &str) -> OutgoingEmail {
		let attachments = self
			.attachments
			.into_iter()
			.filter_map(|attachment| match attachment {
				ResolvedAttachment::Bytes { name, content_type, content } => {
					Some(MailAttachment { name, content_type, content })
				}
				ResolvedAttachment::Link { .. } | ResolvedAttachment::Unavailable { .. } => None,
			})
			.collect();

		OutgoingEmail {
			to: to.into(),
			subject: self.subject,
			html_body: Some(self.html_body.into()),
			text_body: Some(self.text_body.into()),
			attachments,
		}
	}
}

/// File name with an extension, taken from the key when the name has none
fn with_extension(name: &str, key: &str) -> Box<str> {
	let name = name.trim();
	let name = if name.is_empty() { DEFAULT_FILE_NAME } else { name };
	if file_extension(name).is_some() {
		return name.into();
	}
	let ext = file_extension(key).unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
	format!("{}.{}", name, ext).into()
}

async fn resolve_url(app: &App, url: &str) -> ResolvedAttachment {
	let name = with_extension(last_path_segment(url), url);
	match app.url_fetcher.fetch(url).await {
		Ok(body) => {
			let content_type = match body.content_type {
				Some(ct) if !ct.is_empty() && &*ct != "application/octet-stream" => ct,
				_ => content_type_for(&name).into(),
			};
			ResolvedAttachment::Bytes { name, content_type, content: body.content }
		}
		Err(err) => {
			warn!(url, "Attachment fetch failed, sending as link: {}", err);
			ResolvedAttachment::Link { name, url: url.into() }
		}
	}
}

async fn resolve_storage_key(app: &App, key: &str) -> ResolvedAttachment {
	let display_name = match app.queue_adapter.read_file_name(key).await {
		Ok(Some(file_name)) => file_name,
		Ok(None) => last_path_segment(key).into(),
		Err(err) => {
			warn!(key, "File name lookup failed: {}", err);
			last_path_segment(key).into()
		}
	};
	let name = with_extension(&display_name, key);

	let res = match app.blob_adapter.stat_blob(key).await {
		Some(size) if size > MAX_ATTACHMENT_SIZE as u64 => {
			Err(Error::ValidationError(format!("{} bytes exceeds the attachment size limit", size)))
		}
		_ => app.blob_adapter.read_blob(key).await,
	};
	match res {
		Ok(content) => {
			let content_type = content_type_for(&name).into();
			ResolvedAttachment::Bytes { name, content_type, content: content.into_vec() }
		}
		Err(err) => {
			debug!(key, "Attachment download failed: {}", err);
			match app.blob_adapter.public_url(key).await {
				Some(url) => ResolvedAttachment::Link { name, url },
				None => {
					warn!(key, "Attachment unavailable");
					ResolvedAttachment::Unavailable { name }
				}
			}
		}
	}
}

/// Resolves one attachment reference. Never fails.
pub async fn resolve_attachment(app: &App, reference: &str) -> ResolvedAttachment {
	let reference = reference.trim();
	if is_http_url(reference) {
		resolve_url(app, reference).await
	} else {
		resolve_storage_key(app, reference).await
	}
}

/// "Download attachments" section listing the references that were not attached
fn download_section(attachments: &[ResolvedAttachment]) -> String {
	let mut section = String::from("<hr /><h3>Download attachments</h3><ul>");
	for attachment in attachments {
		match attachment {
			ResolvedAttachment::Link { name, url } => {
				section.push_str(&format!(
					"<li><a href=\"{}\">{}</a></li>",
					html_escape(url),
					html_escape(name)
				));
			}
			ResolvedAttachment::Unavailable { name } => {
				section.push_str(&format!(
					"<li>{} (could not be delivered)</li>",
					html_escape(name)
				));
			}
			ResolvedAttachment::Bytes { .. } => {}
		}
	}
	section.push_str("</ul>");
	section
}

fn non_blank(value: &str, fallback: &str) -> Box<str> {
	let trimmed = value.trim();
	if trimmed.is_empty() { fallback.into() } else { value.into() }
}

/// Computes the final content of a queue entry
///
/// Fails only when the birthday template cannot be rendered.
pub async fn resolve(app: &App, entry: &QueueEntry) -> SfResult<ResolvedContent> {
	let (subject, mut html_body): (Box<str>, String) = if entry.is_birthday() {
		let student_name = entry
			.student_name
			.as_deref()
			.map(str::trim)
			.filter(|name| !name.is_empty())
			.unwrap_or(DEFAULT_STUDENT_NAME);
		let vars = serde_json::json!({ "student_name": student_name });

		let engine = &app.ext::<EmailModule>()?.template_engine;
		let rendered = engine.render(BIRTHDAY_TEMPLATE, &vars).await?;
		let subject = rendered.subject.map_or_else(|| BIRTHDAY_SUBJECT.into(), Into::into);
		(subject, rendered.html_body)
	} else {
		let message = non_blank(&entry.message, FALLBACK_MESSAGE);
		(non_blank(&entry.subject, FALLBACK_SUBJECT), message.into())
	};

	let mut attachments = Vec::with_capacity(entry.attachments.len());
	for reference in entry.attachments.iter().filter(|r| !r.trim().is_empty()) {
		attachments.push(resolve_attachment(app, reference).await);
	}

	if attachments.iter().any(|a| !a.is_bytes()) {
		html_body.push_str(&download_section(&attachments));
	}
	let text_body = html_to_text(&html_body);

	debug!(
		entry_id = %entry.id,
		attached = attachments.iter().filter(|a| a.is_bytes()).count(),
		referenced = attachments.len(),
		"Resolved email content"
	);

	Ok(ResolvedContent { subject, html_body, text_body, attachments })
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_with_extension() {
		assert_eq!(&*with_extension("Report.PDF", "uploads/abc"), "Report.PDF");
		assert_eq!(&*with_extension("Term 1 Report", "uploads/abc.docx"), "Term 1 Report.docx");
		assert_eq!(&*with_extension("Term 1 Report", "uploads/abc"), "Term 1 Report.pdf");
		assert_eq!(&*with_extension("  ", "uploads/abc"), "attachment.pdf");
	}

	#[test]
	fn test_download_section() {
		let section = download_section(&[
			ResolvedAttachment::Bytes {
				name: "a.pdf".into(),
				content_type: "application/pdf".into(),
				content: vec![1],
			},
			ResolvedAttachment::Link { name: "b&c.pdf".into(), url: "https://x.test/b?c=1&d=2".into() },
			ResolvedAttachment::Unavailable { name: "d.pdf".into() },
		]);
		assert!(section.contains("Download attachments"));
		assert!(!section.contains("a.pdf"));
		assert!(section.contains("<a href=\"https://x.test/b?c"));
		assert!(section.contains("&amp;d"));
		assert!(section.contains(">b&amp;c.pdf</a>"));
		assert_eq!(section.matches("could not be delivered").count(), 1);
	}

	#[test]
	fn test_non_blank() {
		assert_eq!(&*non_blank("  ", FALLBACK_SUBJECT), "[Notification]");
		assert_eq!(&*non_blank(" Hi ", FALLBACK_SUBJECT), " Hi ");
	}
}

// vim: ts=4
