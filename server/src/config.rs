//! Process configuration from environment variables

use chrono::FixedOffset;
use std::{path::PathBuf, str::FromStr, time::Duration};

use sfgs_core::app::{DEFAULT_CLAIM_LEASE_SECS, DEFAULT_SEND_TIMEOUT_SECS};
use sfgs_core::cron::CronSchedule;
use sfgs_email::sender::{DEFAULT_FROM_NAME, DEFAULT_SMTP_PORT};
use sfgs_email::{SmtpConfig, TlsMode};

use crate::prelude::*;

const DEFAULT_LISTEN: &str = "127.0.0.1:8080";
const DEFAULT_DB_DIR: &str = "./data";
const DEFAULT_STORAGE_DIR: &str = "./data/storage";
const DEFAULT_UTC_OFFSET: &str = "+01:00";
const DEFAULT_DISPATCH_CRON: &str = "*/5 * * * *";
const DEFAULT_BIRTHDAY_CRON: &str = "0 7 * * *";

#[derive(Debug)]
pub struct Config {
	pub listen: Box<str>,
	pub db_dir: PathBuf,
	pub storage_dir: PathBuf,
	pub public_base_url: Option<Box<str>>,
	pub utc_offset: FixedOffset,
	pub send_timeout: Duration,
	pub claim_lease_secs: i64,
	pub template_dir: Option<Box<str>>,
	/// `None` disables the built-in trigger for the job
	pub dispatch_cron: Option<CronSchedule>,
	pub birthday_cron: Option<CronSchedule>,
	pub api_token: Option<Box<str>>,
	pub smtp: SmtpConfig,
}

impl Config {
	pub fn from_env() -> SfResult<Self> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Builds the configuration from any key lookup; blank values count as unset
	pub fn from_lookup<F>(lookup: F) -> SfResult<Self>
	where
		F: Fn(&str) -> Option<String>,
	{
		let var = |key: &str| {
			lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
		};
		// Cron variables distinguish "unset" (default) from "empty" (disabled)
		let cron = |key: &str, default: &str| {
			CronSchedule::parse_optional(&lookup(key).unwrap_or_else(|| default.to_string()))
				.map_err(|err| Error::ConfigError(format!("{}: {}", key, err)))
		};

		let smtp_user = var("SMTP_USER");
		let from_address = var("SMTP_FROM_ADDRESS")
			.or_else(|| smtp_user.clone())
			.ok_or_else(|| Error::ConfigError("SMTP_FROM_ADDRESS or SMTP_USER is required".into()))?;
		let send_timeout = Duration::from_secs(parse_var(
			"SFGS_SEND_TIMEOUT_SECS",
			var("SFGS_SEND_TIMEOUT_SECS"),
			DEFAULT_SEND_TIMEOUT_SECS,
		)?);

		let smtp = SmtpConfig {
			host: var("SMTP_HOST")
				.ok_or_else(|| Error::ConfigError("SMTP_HOST is required".into()))?
				.into(),
			port: parse_var("SMTP_PORT", var("SMTP_PORT"), DEFAULT_SMTP_PORT)?,
			username: smtp_user.map(Into::into),
			password: var("SMTP_PASS").map(Into::into),
			from_name: var("SMTP_FROM_NAME").unwrap_or_else(|| DEFAULT_FROM_NAME.into()).into(),
			from_address: from_address.into(),
			tls_mode: parse_var("SMTP_TLS", var("SMTP_TLS"), TlsMode::default())?,
			timeout: send_timeout,
		};

		let utc_offset = var("SFGS_UTC_OFFSET").unwrap_or_else(|| DEFAULT_UTC_OFFSET.into());
		let claim_lease_secs =
			parse_var("SFGS_CLAIM_LEASE_SECS", var("SFGS_CLAIM_LEASE_SECS"), DEFAULT_CLAIM_LEASE_SECS)?;
		if claim_lease_secs <= 0 {
			return Err(Error::ConfigError("SFGS_CLAIM_LEASE_SECS must be positive".into()));
		}
		// A claim must outlive the send it guards
		if u64::try_from(claim_lease_secs).unwrap_or_default() <= send_timeout.as_secs() {
			return Err(Error::ConfigError(
				"SFGS_CLAIM_LEASE_SECS must be longer than SFGS_SEND_TIMEOUT_SECS".into(),
			));
		}

		Ok(Config {
			listen: var("SFGS_LISTEN").unwrap_or_else(|| DEFAULT_LISTEN.into()).into(),
			db_dir: var("SFGS_DB_DIR").unwrap_or_else(|| DEFAULT_DB_DIR.into()).into(),
			storage_dir: var("SFGS_STORAGE_DIR").unwrap_or_else(|| DEFAULT_STORAGE_DIR.into()).into(),
			public_base_url: var("SFGS_PUBLIC_BASE_URL").map(Into::into),
			utc_offset: utc_offset.parse().map_err(|_| {
				Error::ConfigError(format!("SFGS_UTC_OFFSET: invalid offset {}", utc_offset))
			})?,
			send_timeout,
			claim_lease_secs,
			template_dir: var("SFGS_TEMPLATE_DIR").map(Into::into),
			dispatch_cron: cron("SFGS_DISPATCH_CRON", DEFAULT_DISPATCH_CRON)?,
			birthday_cron: cron("SFGS_BIRTHDAY_CRON", DEFAULT_BIRTHDAY_CRON)?,
			api_token: var("SFGS_API_TOKEN").map(Into::into),
			smtp,
		})
	}
}

fn parse_var<T: FromStr>(key: &str, value: Option<String>, default: T) -> SfResult<T> {
	match value {
		None => Ok(default),
		Some(value) => value
			.parse()
			.map_err(|_| Error::ConfigError(format!("{}: invalid value {}", key, value))),
	}
}


// vim: ts=4
