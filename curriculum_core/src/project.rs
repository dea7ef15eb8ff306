use std::path::Path;

use markdown::mdast::Node;
use serde::Deserialize;
use serde::Serialize;

use crate::CurriculumError;
use crate::CurriculumResult;
use crate::DirName;
use crate::Document;
use crate::DocumentKind;
use crate::Intl;
use crate::LearningObjectiveRef;
use crate::ParseOptions;
use crate::ParsedReadmes;
use crate::Taxonomy;
use crate::Tracks;
use crate::WithPath;
use crate::detect_langs;
use crate::fs;
use crate::meta_str;
use crate::parse_dirname;
use crate::parse_readmes;
use crate::parse_tracks;
use crate::resolve_objectives;
use crate::sections::SectionTag;
use crate::sections::section;

/// Structured project file holding learning objectives and variants.
pub const PROJECT_FILE: &str = "project.yml";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
	pub slug: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub prefix: Option<String>,
	#[serde(flatten)]
	pub tracks: Tracks,
	pub intl: Intl<ProjectLocale>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub cover: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub thumb: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub learning_objectives: Option<Vec<LearningObjectiveRef>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub variants: Option<Vec<Variant>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectLocale {
	pub title: String,
	pub summary: String,
}

/// An alternative version of a project with its own objectives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
	pub slug: String,
	#[serde(default)]
	pub learning_objectives: Vec<LearningObjectiveRef>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectFile {
	learning_objectives: Option<Vec<LearningObjectiveRef>>,
	variants: Option<Vec<Variant>>,
}

pub async fn parse_project(dir: &Path, options: &ParseOptions) -> CurriculumResult<Project> {
	let DirName { prefix, slug } = parse_dirname(dir).with_path(dir)?;
	let langs = detect_langs(dir).await.with_path(dir)?;

	let ParsedReadmes {
		parsed_locales,
		meta,
	} = parse_readmes(
		dir,
		&langs,
		DocumentKind::Project,
		options,
		|_, document, _| {
			Ok(ProjectLocale {
				title: document.title.clone(),
				summary: summary(document),
			})
		},
	)
	.await?;

	let tracks = parse_tracks(&meta).with_path(dir)?;

	let project_file = dir.join(PROJECT_FILE);
	let ProjectFile {
		learning_objectives,
		variants,
	} = load_project_file(&project_file).await?;
	let taxonomy = options.taxonomy.as_deref();

	let learning_objectives = learning_objectives
		.map(|refs| resolve_objectives(refs, taxonomy))
		.transpose()
		.with_path(&project_file)?;
	let variants = variants
		.map(|variants| resolve_variants(variants, taxonomy))
		.transpose()
		.with_path(&project_file)?;

	let slug = match &options.suffix {
		Some(suffix) => format!("{slug}-{suffix}"),
		None => slug,
	};
	tracing::debug!(dir = %dir.display(), %slug, "parsed project");

	Ok(Project {
		slug,
		prefix,
		tracks,
		intl: parsed_locales,
		cover: meta_str(&meta, "cover"),
		thumb: meta_str(&meta, "thumb"),
		learning_objectives,
		variants,
	})
}

async fn load_project_file(path: &Path) -> CurriculumResult<ProjectFile> {
	let Some(content) = fs::read_optional(path).await? else {
		return Ok(ProjectFile::default());
	};

	let file: Option<ProjectFile> = serde_yaml_ng::from_str(&content)
		.map_err(|e| CurriculumError::from(e).with_path(path))?;

	Ok(file.unwrap_or_default())
}

fn resolve_variants(
	variants: Vec<Variant>,
	taxonomy: Option<&Taxonomy>,
) -> CurriculumResult<Vec<Variant>> {
	variants
		.into_iter()
		.map(|variant| {
			Ok(Variant {
				learning_objectives: resolve_objectives(variant.learning_objectives, taxonomy)?,
				slug: variant.slug,
			})
		})
		.collect()
}

/// The first paragraph under a summary heading, rendered.
fn summary(document: &Document) -> String {
	section(&document.body, SectionTag::Summary)
		.and_then(|nodes| nodes.iter().find(|node| matches!(node, Node::Paragraph(_))))
		.map(|paragraph| document.render(std::slice::from_ref(paragraph)).html)
		.unwrap_or_default()
}
