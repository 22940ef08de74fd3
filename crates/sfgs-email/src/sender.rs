//! SMTP mail transport using lettre

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::str::FromStr;
use std::time::Duration;

use sfgs_types::mail::{MailTransport, OutgoingEmail};

use crate::prelude::*;

pub const DEFAULT_SMTP_PORT: u16 = 465;
pub const DEFAULT_FROM_NAME: &str = "SFGS";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TlsMode {
	/// Implicit TLS (SMTPS)
	#[default]
	Tls,
	StartTls,
	None,
}

impl FromStr for TlsMode {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"tls" => Ok(Self::Tls),
			"starttls" => Ok(Self::StartTls),
			"none" => Ok(Self::None),
			_ => Err(Error::ConfigError(format!(
				"Invalid TLS mode: {}. Must be 'none', 'starttls', or 'tls'",
				s
			))),
		}
	}
}

#[derive(Clone)]
pub struct SmtpConfig {
	pub host: Box<str>,
	pub port: u16,
	pub username: Option<Box<str>>,
	pub password: Option<Box<str>>,
	pub from_name: Box<str>,
	pub from_address: Box<str>,
	pub tls_mode: TlsMode,
	pub timeout: Duration,
}

impl std::fmt::Debug for SmtpConfig {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SmtpConfig")
			.field("host", &self.host)
			.field("port", &self.port)
			.field("username", &self.username)
			.field("from_name", &self.from_name)
			.field("from_address", &self.from_address)
			.field("tls_mode", &self.tls_mode)
			.field("timeout", &self.timeout)
			.finish_non_exhaustive()
	}
}

/// SMTP email sender
pub struct SmtpMailer {
	transport: AsyncSmtpTransport<Tokio1Executor>,
	from: Mailbox,
	host: Box<str>,
	port: u16,
}

impl std::fmt::Debug for SmtpMailer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SmtpMailer")
			.field("host", &self.host)
			.field("port", &self.port)
			.field("from", &self.from.to_string())
			.finish_non_exhaustive()
	}
}

impl SmtpMailer {
	pub fn new(config: &SmtpConfig) -> SfResult<Self> {
		let host = config.host.to_string();
		let tls = match config.tls_mode {
			TlsMode::Tls => {
				debug!("Using TLS mode");
				Tls::Wrapper(
					TlsParameters::builder(host.clone())
						.build()
						.map_err(|e| Error::ConfigError(format!("TLS configuration error: {}", e)))?,
				)
			}
			TlsMode::StartTls => {
				debug!("Using STARTTLS mode");
				Tls::Opportunistic(
					TlsParameters::builder(host.clone())
						.build()
						.map_err(|e| Error::ConfigError(format!("TLS configuration error: {}", e)))?,
				)
			}
			TlsMode::None => {
				debug!("No TLS mode");
				Tls::None
			}
		};

		let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&host)
			.port(config.port)
			.timeout(Some(config.timeout))
			.tls(tls);
		if let Some(username) = &config.username {
			let password = config.password.as_deref().unwrap_or_default();
			builder = builder.credentials(Credentials::new(username.to_string(), password.to_string()));
		}

		let address = Address::from_str(&config.from_address)
			.map_err(|_| Error::ConfigError(format!("Invalid from address: {}", config.from_address)))?;
		let from = Mailbox::new(Some(config.from_name.to_string()), address);

		info!("SMTP transport {}:{} ({:?}) sending as {}", host, config.port, config.tls_mode, from);
		Ok(Self { transport: builder.build(), from, host: config.host.clone(), port: config.port })
	}

	/// Builds the MIME message: text/html alternatives, wrapped in a mixed
	/// part when there are attachments
	fn build_message(&self, email: &OutgoingEmail) -> SfResult<Message> {
		let to: Mailbox = email
			.to
			.parse()
			.map_err(|_| Error::ValidationError("Invalid recipient email format".into()))?;

		let builder = Message::builder().from(self.from.clone()).to(to).subject(&*email.subject);

		let plain = |text: &str| SinglePart::plain(text.to_string());
		let html = |html: &str| SinglePart::html(html.to_string());
		let body = match (email.text_body.as_deref(), email.html_body.as_deref()) {
			(Some(text), Some(html_body)) => {
				MultiPart::alternative().singlepart(plain(text)).singlepart(html(html_body))
			}
			(Some(text), None) => MultiPart::alternative().singlepart(plain(text)),
			(None, Some(html_body)) => MultiPart::alternative().singlepart(html(html_body)),
			(None, None) => return Err(Error::ValidationError("Email has no body".into())),
		};

		let body = if email.attachments.is_empty() {
			body
		} else {
			let mut mixed = MultiPart::mixed().multipart(body);
			for attachment in &email.attachments {
				let content_type = ContentType::parse(&attachment.content_type)
					.or_else(|_| ContentType::parse("application/octet-stream"))
					.map_err(|e| Error::Internal(format!("content type: {}", e)))?;
				mixed = mixed.singlepart(
					Attachment::new(attachment.name.to_string())
						.body(attachment.content.clone(), content_type),
				);
			}
			mixed
		};

		builder
			.multipart(body)
			.map_err(|e| Error::ValidationError(format!("Failed to build email: {}", e)))
	}
}

#[async_trait]
impl MailTransport for SmtpMailer {
	async fn send_email(&self, email: &OutgoingEmail) -> SfResult<()> {
		let message = self.build_message(email)?;

		match self.transport.send(message).await {
			Ok(response) => {
				info!(to = %email.to, "Email sent (response: {:?})", response.code());
				Ok(())
			}
			Err(e) => {
				warn!(to = %email.to, "Failed to send email: {}", e);
				Err(Error::ServiceUnavailable(format!("SMTP send failed: {}", e)))
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use sfgs_types::mail::MailAttachment;

	fn config() -> SmtpConfig {
		SmtpConfig {
			host: "smtp.example.com".into(),
			port: DEFAULT_SMTP_PORT,
			username: Some("mailer@example.com".into()),
			password: Some("secret".into()),
			from_name: "SFGS".into(),
			from_address: "mailer@example.com".into(),
			tls_mode: TlsMode::None,
			timeout: Duration::from_secs(5),
		}
	}

	fn email(attachments: Vec<MailAttachment>) -> OutgoingEmail {
		OutgoingEmail {
			to: "parent@example.com".into(),
			subject: "Report".into(),
			html_body: Some("<p>Hello</p>".into()),
			text_body: Some("Hello".into()),
			attachments,
		}
	}

	#[test]
	fn test_tls_mode() {
		assert_eq!("tls".parse::<TlsMode>().unwrap(), TlsMode::Tls);
		assert_eq!("STARTTLS".parse::<TlsMode>().unwrap(), TlsMode::StartTls);
		assert_eq!("none".parse::<TlsMode>().unwrap(), TlsMode::None);
		assert!("ssl".parse::<TlsMode>().is_err());
	}

	#[tokio::test]
	async fn test_build_message() {
		let mailer = SmtpMailer::new(&config()).unwrap();
		let message = mailer
			.build_message(&email(vec![MailAttachment {
				name: "report.pdf".into(),
				content_type: "application/pdf".into(),
				content: b"%PDF-1.4".to_vec(),
			}]))
			.unwrap();
		let raw = String::from_utf8_lossy(&message.formatted()).to_string();

		assert!(raw.contains("From: SFGS <mailer@example.com>"));
		assert!(raw.contains("To: parent@example.com"));
		assert!(raw.contains("multipart/mixed"));
		assert!(raw.contains("multipart/alternative"));
		assert!(raw.contains("report.pdf"));
	}

	#[tokio::test]
	async fn test_build_message_rejects_bad_recipient() {
		let mailer = SmtpMailer::new(&config()).unwrap();
		let mut bad = email(vec![]);
		bad.to = "not an address".into();
		assert!(matches!(mailer.build_message(&bad), Err(Error::ValidationError(_))));
	}
}

// vim: ts=4
