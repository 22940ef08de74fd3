//! Mail transport capability
use async_trait::async_trait;
use std::fmt::Debug;

use crate::prelude::*;

#[derive(Clone, Debug)]
pub struct MailAttachment {
	pub name: Box<str>,
	pub content_type: Box<str>,
	pub content: Vec<u8>,
}

/// A fully rendered message ready for the transport
#[derive(Clone, Debug)]
pub struct OutgoingEmail {
	pub to: Box<str>,
	pub subject: Box<str>,
	pub html_body: Option<Box<str>>,
	pub text_body: Option<Box<str>>,
	pub attachments: Vec<MailAttachment>,
}

#[async_trait]
pub trait MailTransport: Debug + Send + Sync {
	/// Sends one message. Errors carry a human readable reason.
	async fn send_email(&self, email: &OutgoingEmail) -> SfResult<()>;
}

// vim: ts=4
