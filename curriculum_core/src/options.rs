use std::path::Path;
use std::sync::Arc;

use chrono::DateTime;
use chrono::Utc;
use serde::Serialize;

use crate::CachedThumbnails;
use crate::Taxonomy;
use crate::ThumbnailResolver;

/// Version of this parser, stamped on every top-level entity.
pub const PARSER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Options shared read-only by every parse of one invocation.
#[derive(Debug, Clone)]
pub struct ParseOptions {
	/// Repository the content lives in, e.g. `Laboratoria/bootcamp`.
	pub repo: Option<String>,
	/// Version of the content being parsed.
	pub version: Option<String>,
	/// Appended to project slugs as `<slug>-<suffix>`.
	pub suffix: Option<String>,
	/// Learning objective taxonomy. Project objectives are only validated
	/// and expanded when present.
	pub taxonomy: Option<Arc<Taxonomy>>,
	pub thumbnails: Arc<dyn ThumbnailResolver>,
}

impl Default for ParseOptions {
	fn default() -> Self {
		Self {
			repo: None,
			version: None,
			suffix: None,
			taxonomy: None,
			thumbnails: Arc::new(CachedThumbnails),
		}
	}
}

/// A top-level entity together with its provenance.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stamped<T> {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub repo: Option<String>,
	pub path: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub version: Option<String>,
	pub parser_version: &'static str,
	pub created_at: DateTime<Utc>,
	#[serde(flatten)]
	pub entity: T,
}

/// Attach provenance to a parsed entity. `path` is recorded relative to the
/// current working directory when possible.
pub fn stamp<T>(entity: T, path: &Path, options: &ParseOptions) -> Stamped<T> {
	let relative = std::env::current_dir()
		.ok()
		.and_then(|cwd| path.strip_prefix(cwd).ok().map(Path::to_path_buf))
		.unwrap_or_else(|| path.to_path_buf());

	Stamped {
		repo: options.repo.clone(),
		path: relative.display().to_string(),
		version: options.version.clone(),
		parser_version: PARSER_VERSION,
		created_at: Utc::now(),
		entity,
	}
}
