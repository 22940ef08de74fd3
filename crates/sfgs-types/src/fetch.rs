//! Fetching remote attachments by URL
use async_trait::async_trait;
use std::fmt::Debug;

use crate::prelude::*;

#[derive(Clone, Debug)]
pub struct FetchedBody {
	pub content: Vec<u8>,
	pub content_type: Option<Box<str>>,
}

#[async_trait]
pub trait UrlFetcher: Debug + Send + Sync {
	/// GETs `url`; non-success statuses are errors
	async fn fetch(&self, url: &str) -> SfResult<FetchedBody>;
}

// vim: ts=4
