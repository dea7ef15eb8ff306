use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use url::Url;

use crate::CurriculumError;
use crate::CurriculumResult;
use crate::fs;

/// File a resolved cover is cached in, relative to the entity directory.
pub const THUMB_FILE: &str = "thumb.png";

/// Resolves the thumbnail of a project or topic from its cover image.
///
/// Returns the thumbnail location relative to `dir`, or `None` when the
/// entity has no thumbnail.
#[async_trait]
pub trait ThumbnailResolver: fmt::Debug + Send + Sync {
	async fn resolve(&self, dir: &Path, cover: Option<&str>) -> CurriculumResult<Option<String>>;
}

/// Only reports thumbnails already cached on disk. Never touches the
/// network.
#[derive(Debug, Clone, Copy, Default)]
pub struct CachedThumbnails;

#[async_trait]
impl ThumbnailResolver for CachedThumbnails {
	async fn resolve(&self, dir: &Path, _cover: Option<&str>) -> CurriculumResult<Option<String>> {
		let cached = fs::is_file(&dir.join(THUMB_FILE)).await;
		Ok(cached.then(|| THUMB_FILE.to_string()))
	}
}

/// Downloads the cover into `thumb.png` when it is not cached yet.
///
/// The exists check and the write are not atomic: two invocations parsing
/// the same directory at the same time may both download the cover, and the
/// last write wins. A single invocation parses each directory once.
#[derive(Debug, Clone, Default)]
pub struct HttpThumbnails {
	client: reqwest::Client,
}

impl HttpThumbnails {
	pub fn new(client: reqwest::Client) -> Self {
		Self { client }
	}

	async fn fetch(&self, dir: &Path, cover: Option<&str>) -> CurriculumResult<Option<String>> {
		let thumb = dir.join(THUMB_FILE);
		if fs::is_file(&thumb).await {
			return Ok(Some(THUMB_FILE.to_string()));
		}

		let Some(url) = cover.and_then(|cover| Url::parse(cover).ok()) else {
			tracing::debug!(dir = %dir.display(), "no remote cover to fetch");
			return Ok(None);
		};

		let response = self
			.client
			.get(url.clone())
			.send()
			.await
			.map_err(|e| fetch_error(&url, &e))?;

		let status = response.status();
		if !status.is_success() {
			return Err(CurriculumError::Http {
				url: url.to_string(),
				status: status.as_u16(),
			});
		}

		let bytes = response
			.bytes()
			.await
			.map_err(|e| fetch_error(&url, &e))?;
		tokio::fs::write(&thumb, &bytes)
			.await
			.map_err(|e| CurriculumError::from(e).with_path(&thumb))?;
		tracing::warn!(path = %thumb.display(), "wrote thumbnail cache");

		Ok(Some(THUMB_FILE.to_string()))
	}
}

fn fetch_error(url: &Url, error: &reqwest::Error) -> CurriculumError {
	CurriculumError::Fetch {
		url: url.to_string(),
		reason: error.to_string(),
	}
}

#[async_trait]
impl ThumbnailResolver for HttpThumbnails {
	async fn resolve(&self, dir: &Path, cover: Option<&str>) -> CurriculumResult<Option<String>> {
		self.fetch(dir, cover).await
	}
}
