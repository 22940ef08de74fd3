//! SFGS mailer server
//!
//! Sends birthday greetings and report cards to parents through a
//! rate-limited queue. The queue processor and the birthday generator are
//! exposed as HTTP endpoints for an external trigger and can also be driven
//! by the built-in cron trigger.

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod config;
pub mod routes;
pub mod trigger;

mod prelude;

use std::sync::Arc;

use sfgs_blob_adapter_fs::BlobAdapterFs;
use sfgs_core::AppBuilder;
use sfgs_email::fetch::DEFAULT_FETCH_TIMEOUT;
use sfgs_email::{HttpFetcher, SmtpMailer};
use sfgs_queue_adapter_sqlite::QueueAdapterSqlite;

pub use config::Config;

use crate::prelude::*;
use crate::trigger::Job;

/// Opens the stores and composes the application state
pub async fn build_app(config: &Config) -> SfResult<App> {
	let queue_adapter = QueueAdapterSqlite::new(&config.db_dir).await?;
	let blob_adapter = BlobAdapterFs::new(
		config.storage_dir.clone().into_boxed_path(),
		config.public_base_url.clone(),
	)
	.await?;
	let mailer = SmtpMailer::new(&config.smtp)?;
	let fetcher = HttpFetcher::new(DEFAULT_FETCH_TIMEOUT)?;

	let mut builder = AppBuilder::new();
	builder
		.utc_offset(config.utc_offset)
		.send_timeout(config.send_timeout)
		.claim_lease_secs(config.claim_lease_secs)
		.queue_adapter(Arc::new(queue_adapter))
		.blob_adapter(Arc::new(blob_adapter))
		.mail_transport(Arc::new(mailer))
		.url_fetcher(Arc::new(fetcher));
	sfgs_email::register(&mut builder, config.template_dir.clone());
	builder.build()
}

pub async fn run(config: Config) -> SfResult<()> {
	rustls::crypto::CryptoProvider::install_default(rustls::crypto::aws_lc_rs::default_provider())
		.map_err(|e| {
			error!("FATAL: Failed to install default crypto provider: {:?}", e);
			Error::Internal("Failed to install default crypto provider".to_string())
		})?;

	let app = build_app(&config).await?;

	if let Some(schedule) = config.dispatch_cron.clone() {
		trigger::spawn(app.clone(), Job::Dispatch, schedule);
	}
	if let Some(schedule) = config.birthday_cron.clone() {
		trigger::spawn(app.clone(), Job::Birthday, schedule);
	}

	let router = routes::init(app, config.api_token.clone());
	let listener = tokio::net::TcpListener::bind(&*config.listen).await?;
	info!("Listening on HTTP {}", config.listen);

	axum::serve(listener, router)
		.with_graceful_shutdown(async {
			let _ = tokio::signal::ctrl_c().await;
			info!("Shutting down");
		})
		.await?;

	Ok(())
}

// vim: ts=4
