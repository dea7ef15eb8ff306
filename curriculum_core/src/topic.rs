use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use markdown::mdast::Node;
use serde::Serialize;

use crate::CurriculumError;
use crate::CurriculumResult;
use crate::DirName;
use crate::Document;
use crate::DocumentKind;
use crate::Intl;
use crate::ParseOptions;
use crate::ParsedReadmes;
use crate::Stats;
use crate::Tracks;
use crate::Unit;
use crate::WithPath;
use crate::compare_prefixed;
use crate::detect_langs;
use crate::fold::ensure_unique_slugs;
use crate::fold::settle;
use crate::fold::spawn_children;
use crate::html::plain_text;
use crate::meta_str;
use crate::parse_dirname;
use crate::parse_readmes;
use crate::parse_tracks;
use crate::sections::SectionTag;
use crate::sections::section;
use crate::topic_stats;
use crate::unit::parse_linked_unit;

/// A course topic: a readme with a syllabus linking to its units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Topic {
	pub slug: String,
	#[serde(flatten)]
	pub tracks: Tracks,
	pub intl: Intl<TopicLocale>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub cover: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub thumb: Option<String>,
	pub units: Vec<Unit>,
	pub stats: Stats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicLocale {
	pub title: String,
	pub summary: String,
}

/// A unit linked from a syllabus: `### [Title](01-unit)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyllabusEntry {
	/// The unit directory, relative to the topic.
	pub dir: String,
	pub title: String,
}

struct TopicReadme {
	locale: TopicLocale,
	syllabus: Vec<SyllabusEntry>,
}

/// Parse a topic directory and every unit its syllabus links to.
///
/// Only linked units are parsed. They are ordered by directory prefix, no
/// matter the order of the syllabus headings.
pub async fn parse_topic(dir: &Path, options: &Arc<ParseOptions>) -> CurriculumResult<Topic> {
	let DirName { slug, .. } = parse_dirname(dir).with_path(dir)?;
	let langs = detect_langs(dir).await.with_path(dir)?;

	let ParsedReadmes {
		parsed_locales,
		meta,
	} = parse_readmes(
		dir,
		&langs,
		DocumentKind::Topic,
		options,
		|_, document, _| {
			Ok(TopicReadme {
				locale: TopicLocale {
					title: document.title.clone(),
					summary: summary(document),
				},
				syllabus: syllabus(&document.body)?,
			})
		},
	)
	.await?;

	let tracks = parse_tracks(&meta).with_path(dir)?;

	let mut linked: BTreeMap<PathBuf, Intl<String>> = BTreeMap::new();
	let mut unit_dirs: Vec<String> = Vec::new();
	let mut intl = Intl::new();

	for (lang, TopicReadme { locale, syllabus }) in parsed_locales {
		for SyllabusEntry { dir: unit_dir, title } in syllabus {
			if !unit_dirs.contains(&unit_dir) {
				unit_dirs.push(unit_dir.clone());
			}
			linked
				.entry(dir.join(&unit_dir))
				.or_default()
				.insert(lang, title);
		}
		intl.insert(lang, locale);
	}

	unit_dirs.sort_by(|a, b| compare_prefixed(a, b));

	let pending = spawn_children(
		unit_dirs.iter().map(|unit_dir| dir.join(unit_dir)).collect(),
		options,
		|unit_dir, options| {
			let titles = linked.get(&unit_dir).cloned();
			async move { parse_linked_unit(&unit_dir, &options, titles).await }
		},
	);

	let mut units = settle("units", pending).await.with_path(dir)?;
	ensure_unique_slugs("unit", units.iter().map(|unit| unit.slug.as_str())).with_path(dir)?;
	for (index, unit) in units.iter_mut().enumerate() {
		unit.order = Some(index + 1);
	}

	let stats = topic_stats(&units);
	tracing::debug!(dir = %dir.display(), units = units.len(), "parsed topic");

	Ok(Topic {
		slug,
		tracks,
		intl,
		cover: meta_str(&meta, "cover"),
		thumb: meta_str(&meta, "thumb"),
		units,
		stats,
	})
}

/// Everything between the title and the first `##` heading or `Tags:`
/// paragraph.
fn summary(document: &Document) -> String {
	let end = document.body.iter().position(|node| {
		match node {
			Node::Heading(heading) => heading.depth == 2,
			Node::Paragraph(paragraph) => {
				matches!(paragraph.children.first(), Some(Node::Text(text)) if text.value.starts_with("Tags:"))
			}
			_ => false,
		}
	});

	match end {
		Some(end) => document.render(&document.body[..end]).html,
		None => String::new(),
	}
}

/// The units linked under the `## Syllabus` heading.
pub fn syllabus(body: &[Node]) -> CurriculumResult<Vec<SyllabusEntry>> {
	let nodes = section(body, SectionTag::Syllabus).ok_or(CurriculumError::MissingSyllabus)?;
	let mut entries = Vec::new();

	for node in nodes {
		let Node::Heading(heading) = node else {
			continue;
		};
		if heading.depth != 3 {
			continue;
		}

		let links: Vec<_> = heading
			.children
			.iter()
			.filter_map(|child| {
				match child {
					Node::Link(link) => Some(link),
					_ => None,
				}
			})
			.collect();
		let [link] = links.as_slice() else {
			return Err(CurriculumError::SyllabusLink(
				plain_text(&heading.children).trim().to_string(),
			));
		};

		entries.push(SyllabusEntry {
			dir: unit_dir(&link.url),
			title: plain_text(&link.children).trim().to_string(),
		});
	}

	if entries.is_empty() {
		return Err(CurriculumError::EmptySyllabus);
	}

	Ok(entries)
}

/// `./01-intro/README.md` and `01-intro/` both point at `01-intro`.
fn unit_dir(href: &str) -> String {
	let href = href.trim();
	let href = href.strip_prefix("./").unwrap_or(href);
	let href = href.strip_suffix("README.md").unwrap_or(href);
	href.trim_end_matches('/').to_string()
}
