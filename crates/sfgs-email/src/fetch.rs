//! HTTP(S) fetcher for URL attachments

use async_trait::async_trait;
use http_body_util::{BodyExt, Empty, Limited};
use hyper::body::Bytes;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::{Client, connect::HttpConnector};
use hyper_util::rt::TokioExecutor;
use std::time::Duration;

use sfgs_types::fetch::{FetchedBody, UrlFetcher};

use crate::prelude::*;

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);
/// Larger bodies are rejected; mail providers refuse them anyway
pub const MAX_ATTACHMENT_SIZE: usize = 20 * 1024 * 1024;

pub struct HttpFetcher {
	client: Client<HttpsConnector<HttpConnector>, Empty<Bytes>>,
	timeout: Duration,
}

impl std::fmt::Debug for HttpFetcher {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("HttpFetcher").field("timeout", &self.timeout).finish_non_exhaustive()
	}
}

impl HttpFetcher {
	pub fn new(timeout: Duration) -> SfResult<Self> {
		let connector = HttpsConnectorBuilder::new()
			.with_native_roots()
			.map_err(|e| Error::ConfigError(format!("TLS error: {}", e)))?
			.https_or_http()
			.enable_http1()
			.build();
		let client = Client::builder(TokioExecutor::new()).build(connector);

		Ok(Self { client, timeout })
	}

	async fn get(&self, url: &str) -> SfResult<FetchedBody> {
		let request = hyper::Request::builder()
			.method(hyper::Method::GET)
			.uri(url)
			.header("User-Agent", concat!("sfgs-mailer/", env!("CARGO_PKG_VERSION")))
			.body(Empty::<Bytes>::new())
			.map_err(|e| Error::ValidationError(format!("Invalid attachment URL: {}", e)))?;

		let response = self
			.client
			.request(request)
			.await
			.map_err(|e| Error::ServiceUnavailable(format!("Network error: {}", e)))?;

		let status = response.status();
		if !status.is_success() {
			return Err(Error::ServiceUnavailable(format!("HTTP {}", status)));
		}

		let content_type = response
			.headers()
			.get(hyper::header::CONTENT_TYPE)
			.and_then(|v| v.to_str().ok())
			.and_then(|v| v.split(';').next())
			.map(|v| v.trim().into());

		let body = Limited::new(response.into_body(), MAX_ATTACHMENT_SIZE)
			.collect()
			.await
			.map_err(|e| Error::ServiceUnavailable(format!("Failed to read body: {}", e)))?
			.to_bytes();

		Ok(FetchedBody { content: body.to_vec(), content_type })
	}
}

#[async_trait]
impl UrlFetcher for HttpFetcher {
	async fn fetch(&self, url: &str) -> SfResult<FetchedBody> {
		debug!(url, "Fetching attachment");
		tokio::time::timeout(self.timeout, self.get(url)).await.map_err(|_| Error::Timeout)?
	}
}

// vim: ts=4
