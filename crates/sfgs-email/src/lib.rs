//! Email content and delivery for the SFGS mailer
//!
//! This crate provides:
//! - Template rendering for birthday greetings (Handlebars)
//! - The content resolver that prepares a queue entry for sending
//! - SMTP delivery with lettre
//! - An HTTP fetcher for URL attachments

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod fetch;
pub mod html;
pub mod resolver;
pub mod sender;
pub mod template;

mod prelude;

pub use fetch::HttpFetcher;
pub use resolver::{ResolvedAttachment, ResolvedContent, resolve};
pub use sender::{SmtpConfig, SmtpMailer, TlsMode};
pub use template::TemplateEngine;

use sfgs_core::AppBuilder;

/// Email state registered as an app extension
#[derive(Debug)]
pub struct EmailModule {
	pub template_engine: TemplateEngine,
}

impl EmailModule {
	/// `template_dir` optionally overrides the built-in templates
	pub fn new(template_dir: Option<Box<str>>) -> Self {
		Self { template_engine: TemplateEngine::new(template_dir) }
	}
}

pub fn register(builder: &mut AppBuilder, template_dir: Option<Box<str>>) {
	builder.extension(EmailModule::new(template_dir));
}

// vim: ts=4
