//! Filesystem storage for uploaded files
//!
//! Blobs are addressed by their storage path (`reports/2024/ada.pdf`) relative to
//! the base directory. When a public base URL is configured, existing blobs are
//! also reachable at `<base url>/<storage path>`.

#![forbid(unsafe_code)]

use std::{
	fmt::Debug,
	path::{Component, Path, PathBuf},
};

use async_trait::async_trait;
use tokio::{
	fs::{File, create_dir_all, metadata, remove_file, rename},
	io::{AsyncReadExt, AsyncWriteExt},
};

use sfgs_types::{blob_adapter, prelude::*, utils::random_id};

/// Resolves a storage key below `base_dir`, rejecting keys that would escape it
fn obj_file_path(base_dir: &Path, key: &str) -> SfResult<PathBuf> {
	let key = key.trim_start_matches('/');
	if key.is_empty() {
		Err(Error::ValidationError("empty storage key".into()))?;
	}

	let mut path = PathBuf::from(base_dir);
	for component in Path::new(key).components() {
		match component {
			Component::Normal(part) => path.push(part),
			Component::CurDir => {}
			_ => Err(Error::ValidationError(format!("invalid storage key: {}", key)))?,
		}
	}
	Ok(path)
}

#[derive(Debug)]
pub struct BlobAdapterFs {
	base_dir: Box<Path>,
	public_base_url: Option<Box<str>>,
}

impl BlobAdapterFs {
	pub async fn new(base_dir: Box<Path>, public_base_url: Option<Box<str>>) -> SfResult<Self> {
		create_dir_all(&base_dir).await?;
		let public_base_url =
			public_base_url.map(|url| url.trim_end_matches('/').to_string().into_boxed_str());
		Ok(Self { base_dir, public_base_url })
	}
}

#[async_trait]
impl blob_adapter::BlobAdapter for BlobAdapterFs {
	/// Writes to a temporary file first so readers never see partial content
	async fn create_blob(&self, key: &str, data: &[u8]) -> SfResult<()> {
		let path = obj_file_path(&self.base_dir, key)?;
		debug!("create_blob: {:?}", &path);
		if let Some(dir) = path.parent() {
			create_dir_all(dir).await?;
		}

		let tmp_path = self.base_dir.join(format!("tmp-{}", random_id()?));
		let res = async {
			let mut file = File::create(&tmp_path).await?;
			file.write_all(data).await?;
			file.sync_all().await?;
			rename(&tmp_path, &path).await?;
			Ok::<(), Error>(())
		}
		.await;
		if res.is_err() {
			warn!("create_blob failed, removing tmpfile: {:?}", &tmp_path);
			let _ignore = remove_file(&tmp_path).await;
		}

		res
	}

	async fn stat_blob(&self, key: &str) -> Option<u64> {
		let path = obj_file_path(&self.base_dir, key).ok()?;
		let file_metadata = metadata(&path).await.ok()?;
		file_metadata.is_file().then(|| file_metadata.len())
	}

	async fn read_blob(&self, key: &str) -> SfResult<Box<[u8]>> {
		let mut file = File::open(obj_file_path(&self.base_dir, key)?).await?;
		let mut buf: Vec<u8> = Vec::new();
		file.read_to_end(&mut buf).await?;

		Ok(buf.into_boxed_slice())
	}

	async fn public_url(&self, key: &str) -> Option<Box<str>> {
		let base_url = self.public_base_url.as_deref()?;
		self.stat_blob(key).await?;
		Some(format!("{}/{}", base_url, key.trim_start_matches('/')).into_boxed_str())
	}

	async fn delete_blob(&self, key: &str) -> SfResult<()> {
		remove_file(obj_file_path(&self.base_dir, key)?).await?;
		Ok(())
	}
}

#[cfg(test)]
mod test {
	use std::path::{Path, PathBuf};

	use crate::obj_file_path;

	#[test]
	fn test_obj_file_path() {
		let path = obj_file_path(Path::new("some_dir"), "reports/2024/ada.pdf").unwrap_or_default();
		assert_eq!(path, PathBuf::from("some_dir/reports/2024/ada.pdf"));

		let path = obj_file_path(Path::new("some_dir"), "/ada.pdf").unwrap_or_default();
		assert_eq!(path, PathBuf::from("some_dir/ada.pdf"));
	}

	#[test]
	fn test_obj_file_path_rejects_escapes() {
		assert!(obj_file_path(Path::new("some_dir"), "../etc/passwd").is_err());
		assert!(obj_file_path(Path::new("some_dir"), "reports/../../x").is_err());
		assert!(obj_file_path(Path::new("some_dir"), "").is_err());
	}
}

// vim: ts=4
