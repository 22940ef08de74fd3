//! Adapter that stores uploaded files (report PDFs and other attachments)
use async_trait::async_trait;
use std::fmt::Debug;

use crate::prelude::*;

#[async_trait]
pub trait BlobAdapter: Debug + Send + Sync {
	/// Stores a blob under `key`, replacing any previous content
	async fn create_blob(&self, key: &str, data: &[u8]) -> SfResult<()>;

	/// Checks if a blob exists, returns its size
	async fn stat_blob(&self, key: &str) -> Option<u64>;

	/// Reads a blob, `Error::NotFound` if it does not exist
	async fn read_blob(&self, key: &str) -> SfResult<Box<[u8]>>;

	/// Publicly reachable URL of an existing blob, if the backend exposes one
	async fn public_url(&self, key: &str) -> Option<Box<str>>;

	async fn delete_blob(&self, key: &str) -> SfResult<()>;
}

// vim: ts=4
