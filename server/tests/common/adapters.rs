//! Test app with temporary stores and a recording mail transport

use async_trait::async_trait;
use axum::{Router, body::Body, http::Request, response::Response};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

use sfgs_blob_adapter_fs::BlobAdapterFs;
use sfgs_core::{App, AppBuilder};
use sfgs_queue_adapter_sqlite::QueueAdapterSqlite;
use sfgs_types::error::{Error, SfResult};
use sfgs_types::fetch::{FetchedBody, UrlFetcher};
use sfgs_types::mail::{MailTransport, OutgoingEmail};

#[derive(Debug, Default)]
pub struct RecordingTransport {
	pub sent: Mutex<Vec<OutgoingEmail>>,
}

#[async_trait]
impl MailTransport for RecordingTransport {
	async fn send_email(&self, email: &OutgoingEmail) -> SfResult<()> {
		self.sent.lock().unwrap().push(email.clone());
		Ok(())
	}
}

#[derive(Debug)]
pub struct OfflineFetcher;

#[async_trait]
impl UrlFetcher for OfflineFetcher {
	async fn fetch(&self, _url: &str) -> SfResult<FetchedBody> {
		Err(Error::ServiceUnavailable("Network error: offline".into()))
	}
}

pub struct TestServer {
	pub app: App,
	pub router: Router,
	pub transport: Arc<RecordingTransport>,
	_temp_dir: TempDir,
}

impl TestServer {
	pub async fn new(api_token: Option<&str>) -> Self {
		let temp_dir = TempDir::new().expect("Failed to create temp directory");
		let queue = QueueAdapterSqlite::new(temp_dir.path().join("db"))
			.await
			.expect("Failed to create queue adapter");
		let blob = BlobAdapterFs::new(temp_dir.path().join("storage").into(), None)
			.await
			.expect("Failed to create blob adapter");
		let transport = Arc::new(RecordingTransport::default());

		let mut builder = AppBuilder::new();
		builder
			.send_timeout(Duration::from_secs(5))
			.queue_adapter(Arc::new(queue))
			.blob_adapter(Arc::new(blob))
			.mail_transport(transport.clone())
			.url_fetcher(Arc::new(OfflineFetcher));
		sfgs_email::register(&mut builder, None);
		let app = builder.build().expect("Failed to build app");
		let router = sfgs_mailer::routes::init(app.clone(), api_token.map(Into::into));

		Self { app, router, transport, _temp_dir: temp_dir }
	}

	pub async fn request(&self, req: Request<Body>) -> Response {
		self.router.clone().oneshot(req).await.expect("Request failed")
	}
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
	let mut req = Request::builder().method(method).uri(uri);
	if let Some(token) = token {
		req = req.header("Authorization", format!("Bearer {}", token));
	}
	match body {
		Some(body) => req
			.header("Content-Type", "application/json")
			.body(Body::from(body.to_string()))
			.expect("Invalid request"),
		None => req.body(Body::empty()).expect("Invalid request"),
	}
}

pub async fn body_json(res: Response) -> Value {
	let bytes = res.into_body().collect().await.expect("Failed to read body").to_bytes();
	serde_json::from_slice(&bytes).expect("Body is not JSON")
}

// vim: ts=4
