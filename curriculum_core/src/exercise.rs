use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::CurriculumResult;
use crate::DirName;
use crate::DocumentKind;
use crate::Intl;
use crate::ParseOptions;
use crate::ParsedDocument;
use crate::ParsedReadmes;
use crate::Tracks;
use crate::WithPath;
use crate::detect_langs;
use crate::fs;
use crate::meta_str;
use crate::parse_dirname;
use crate::parse_optional_tracks;
use crate::parse_readmes;

/// A practice exercise inside a part, with its boilerplate files.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exercise {
	pub slug: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub prefix: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub order: Option<usize>,
	#[serde(flatten)]
	pub tracks: Option<Tracks>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub env: Option<String>,
	pub intl: Intl<ParsedDocument>,
	/// Every non-markdown file, keyed by its path relative to the exercise.
	pub files: BTreeMap<String, String>,
}

pub async fn parse_exercise(dir: &Path, options: &ParseOptions) -> CurriculumResult<Exercise> {
	let DirName { prefix, slug } = parse_dirname(dir).with_path(dir)?;
	let langs = detect_langs(dir).await.with_path(dir)?;

	let ParsedReadmes {
		parsed_locales,
		meta,
	} = parse_readmes(
		dir,
		&langs,
		DocumentKind::Exercise,
		options,
		|_, document, _| Ok(document.localized()),
	)
	.await?;

	let tracks = parse_optional_tracks(&meta).with_path(dir)?;
	let files = fs::read_file_tree(dir).await?;
	tracing::debug!(dir = %dir.display(), files = files.len(), "parsed exercise");

	Ok(Exercise {
		slug,
		prefix,
		order: None,
		tracks,
		env: meta_str(&meta, "env"),
		intl: parsed_locales,
		files,
	})
}
