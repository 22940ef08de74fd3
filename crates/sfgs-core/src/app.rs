//! App state type and builder

use chrono::{FixedOffset, Offset, Utc};
use std::{
	any::{Any, TypeId},
	collections::HashMap,
	sync::Arc,
	time::Duration,
};

use sfgs_types::blob_adapter::BlobAdapter;
use sfgs_types::fetch::UrlFetcher;
use sfgs_types::mail::MailTransport;
use sfgs_types::prelude::*;
use sfgs_types::queue_adapter::QueueAdapter;
use sfgs_types::types::DayBounds;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_SEND_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_CLAIM_LEASE_SECS: i64 = 600;
/// West Africa Time
pub const DEFAULT_UTC_OFFSET_SECS: i32 = 3600;

// Extensions //
//************//
/// Type-erased map for state owned by feature crates (templates, SMTP settings)
#[derive(Default)]
pub struct Extensions {
	map: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Extensions {
	pub fn insert<T: Send + Sync + 'static>(&mut self, val: T) {
		self.map.insert(TypeId::of::<T>(), Box::new(val));
	}

	pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
		self.map.get(&TypeId::of::<T>())?.downcast_ref::<T>()
	}
}

// AppState //
//**********//
#[derive(Clone, Debug)]
pub struct AppOpts {
	/// Offset defining the local calendar day (daily cap, birthdays)
	pub utc_offset: FixedOffset,
	/// Upper bound for a single transport call
	pub send_timeout: Duration,
	/// Age after which an unfinished claim may be taken over
	pub claim_lease_secs: i64,
}

impl Default for AppOpts {
	fn default() -> Self {
		Self {
			utc_offset: FixedOffset::east_opt(DEFAULT_UTC_OFFSET_SECS).unwrap_or_else(|| Utc.fix()),
			send_timeout: Duration::from_secs(DEFAULT_SEND_TIMEOUT_SECS),
			claim_lease_secs: DEFAULT_CLAIM_LEASE_SECS,
		}
	}
}

pub struct AppState {
	pub opts: AppOpts,

	pub queue_adapter: Arc<dyn QueueAdapter>,
	pub blob_adapter: Arc<dyn BlobAdapter>,
	pub mail_transport: Arc<dyn MailTransport>,
	pub url_fetcher: Arc<dyn UrlFetcher>,

	pub extensions: Extensions,
}

impl AppState {
	/// Get a registered extension by type. Returns error if not found.
	pub fn ext<T: Send + Sync + 'static>(&self) -> SfResult<&T> {
		self.extensions.get::<T>().ok_or_else(|| {
			Error::Internal(format!("Extension {} not registered", std::any::type_name::<T>()))
		})
	}

	/// The local calendar day containing `now`
	pub fn day_of(&self, now: Timestamp) -> DayBounds {
		DayBounds::containing(now, self.opts.utc_offset)
	}
}

pub type App = Arc<AppState>;

// AppBuilder //
//************//
#[derive(Default)]
pub struct AppBuilder {
	opts: AppOpts,
	queue_adapter: Option<Arc<dyn QueueAdapter>>,
	blob_adapter: Option<Arc<dyn BlobAdapter>>,
	mail_transport: Option<Arc<dyn MailTransport>>,
	url_fetcher: Option<Arc<dyn UrlFetcher>>,
	extensions: Extensions,
}

impl AppBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn utc_offset(&mut self, utc_offset: FixedOffset) -> &mut Self {
		self.opts.utc_offset = utc_offset;
		self
	}
	pub fn send_timeout(&mut self, send_timeout: Duration) -> &mut Self {
		self.opts.send_timeout = send_timeout;
		self
	}
	pub fn claim_lease_secs(&mut self, claim_lease_secs: i64) -> &mut Self {
		self.opts.claim_lease_secs = claim_lease_secs;
		self
	}

	// Adapters
	pub fn queue_adapter(&mut self, queue_adapter: Arc<dyn QueueAdapter>) -> &mut Self {
		self.queue_adapter = Some(queue_adapter);
		self
	}
	pub fn blob_adapter(&mut self, blob_adapter: Arc<dyn BlobAdapter>) -> &mut Self {
		self.blob_adapter = Some(blob_adapter);
		self
	}
	pub fn mail_transport(&mut self, mail_transport: Arc<dyn MailTransport>) -> &mut Self {
		self.mail_transport = Some(mail_transport);
		self
	}
	pub fn url_fetcher(&mut self, url_fetcher: Arc<dyn UrlFetcher>) -> &mut Self {
		self.url_fetcher = Some(url_fetcher);
		self
	}

	/// Registers feature state, retrievable with `AppState::ext`
	pub fn extension<T: Send + Sync + 'static>(&mut self, val: T) -> &mut Self {
		self.extensions.insert(val);
		self
	}

	pub fn build(&mut self) -> SfResult<App> {
		let missing = |name: &str| Error::ConfigError(format!("{} is not configured", name));

		let app = AppState {
			opts: self.opts.clone(),
			queue_adapter: self.queue_adapter.take().ok_or_else(|| missing("queue adapter"))?,
			blob_adapter: self.blob_adapter.take().ok_or_else(|| missing("blob adapter"))?,
			mail_transport: self.mail_transport.take().ok_or_else(|| missing("mail transport"))?,
			url_fetcher: self.url_fetcher.take().ok_or_else(|| missing("url fetcher"))?,
			extensions: std::mem::take(&mut self.extensions),
		};
		info!(
			"SFGS mailer v{} (utc offset {}, send timeout {:?}, claim lease {}s)",
			VERSION, app.opts.utc_offset, app.opts.send_timeout, app.opts.claim_lease_secs
		);

		Ok(Arc::new(app))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[derive(Debug, PartialEq)]
	struct Marker(u32);

	#[test]
	fn test_extensions() {
		let mut ext = Extensions::default();
		assert!(ext.get::<Marker>().is_none());
		ext.insert(Marker(7));
		assert_eq!(ext.get::<Marker>(), Some(&Marker(7)));
	}

	#[test]
	fn test_default_opts() {
		let opts = AppOpts::default();
		assert_eq!(opts.utc_offset.local_minus_utc(), DEFAULT_UTC_OFFSET_SECS);
		assert_eq!(opts.send_timeout, Duration::from_secs(DEFAULT_SEND_TIMEOUT_SECS));
		assert!(u64::try_from(opts.claim_lease_secs).unwrap() > opts.send_timeout.as_secs());
	}

	#[test]
	fn test_build_requires_adapters() {
		let res = AppBuilder::new().send_timeout(Duration::from_secs(5)).build();
		assert!(matches!(res, Err(Error::ConfigError(_))));
	}
}

// vim: ts=4
