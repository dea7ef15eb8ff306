use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::CurriculumError;
use crate::CurriculumResult;
use crate::DirName;
use crate::DocumentKind;
use crate::Intl;
use crate::ParseOptions;
use crate::ParsedReadmes;
use crate::Part;
use crate::Stats;
use crate::Tracks;
use crate::WithPath;
use crate::detect_langs;
use crate::fold::ensure_unique_slugs;
use crate::fold::settle;
use crate::fold::spawn_children;
use crate::fs;
use crate::parse_dirname;
use crate::parse_optional_tracks;
use crate::parse_part;
use crate::parse_readmes;
use crate::unit_stats;

/// A group of parts, linked from a topic syllabus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Unit {
	pub slug: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub prefix: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub order: Option<usize>,
	#[serde(flatten)]
	pub tracks: Option<Tracks>,
	pub intl: Intl<UnitLocale>,
	pub parts: Vec<Part>,
	pub stats: Stats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitLocale {
	pub title: String,
}

/// Parse a standalone unit directory. Its readme is required.
pub async fn parse_unit(dir: &Path, options: &Arc<ParseOptions>) -> CurriculumResult<Unit> {
	parse_linked_unit(dir, options, None).await
}

/// Parse a unit linked from a topic syllabus with the link titles per
/// language. The unit readme is optional here; when present its titles win
/// over the syllabus ones.
pub(crate) async fn parse_linked_unit(
	dir: &Path,
	options: &Arc<ParseOptions>,
	linked_titles: Option<Intl<String>>,
) -> CurriculumResult<Unit> {
	let DirName { prefix, slug } = parse_dirname(dir).with_path(dir)?;

	let readmes = match detect_langs(dir).await {
		Ok(langs) => {
			Some(
				parse_readmes(dir, &langs, DocumentKind::Unit, options, |_, document, _| {
					Ok(document.title.clone())
				})
				.await?,
			)
		}
		Err(CurriculumError::NoLangsDetected) if linked_titles.is_some() => {
			tracing::debug!(dir = %dir.display(), "unit without readme, using syllabus titles");
			None
		}
		Err(e) => return Err(e.with_path(dir)),
	};

	let mut titles = linked_titles.unwrap_or_default();
	let mut tracks = None;

	if let Some(ParsedReadmes {
		parsed_locales,
		meta,
	}) = readmes
	{
		for (lang, title) in parsed_locales {
			if let Some(linked) = titles.get(&lang).filter(|linked| **linked != title) {
				tracing::warn!(
					dir = %dir.display(),
					%lang,
					syllabus = %linked,
					readme = %title,
					"unit title differs from its syllabus link"
				);
			}
			titles.insert(lang, title);
		}
		tracks = parse_optional_tracks(&meta).with_path(dir)?;
	}

	let part_dirs = fs::prefixed_dirs(dir)
		.await?
		.into_iter()
		.map(|name| dir.join(name))
		.collect();
	let pending = spawn_children(part_dirs, options, |dir, options| {
		async move { parse_part(&dir, &options).await }
	});

	let mut parts = settle("parts", pending).await.with_path(dir)?;
	ensure_unique_slugs("part", parts.iter().map(|part| part.slug.as_str())).with_path(dir)?;
	for (index, part) in parts.iter_mut().enumerate() {
		part.order = Some(index + 1);
	}

	let stats = unit_stats(&parts);
	tracing::debug!(dir = %dir.display(), parts = parts.len(), "parsed unit");

	Ok(Unit {
		slug,
		prefix,
		order: None,
		tracks,
		intl: titles.map(|_, title| UnitLocale { title }),
		parts,
		stats,
	})
}
