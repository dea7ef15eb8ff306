use std::path::Path;
use std::sync::Arc;

use markdown::mdast::Node;
use serde::Serialize;

use crate::Challenge;
use crate::CurriculumError;
use crate::CurriculumResult;
use crate::DirName;
use crate::Document;
use crate::DocumentKind;
use crate::Embed;
use crate::Exercise;
use crate::Intl;
use crate::Meta;
use crate::PART_FORMATS;
use crate::PART_TYPES;
use crate::ParseOptions;
use crate::ParsedReadmes;
use crate::PartFormat;
use crate::PartType;
use crate::Question;
use crate::Tracks;
use crate::WithPath;
use crate::detect_langs;
use crate::fold::ensure_unique_slugs;
use crate::fold::join;
use crate::fold::settle;
use crate::fold::spawn_children;
use crate::fs;
use crate::meta_duration;
use crate::meta_str;
use crate::minutes_to_human;
use crate::parse_challenge;
use crate::parse_dirname;
use crate::parse_exercise;
use crate::parse_optional_tracks;
use crate::parse_questions;
use crate::parse_readmes;

/// Subdirectory of a part holding its challenges.
pub const CHALLENGES_DIR: &str = "challenges";

/// One session of a unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
	pub slug: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub prefix: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub order: Option<usize>,
	#[serde(flatten)]
	pub tracks: Option<Tracks>,
	#[serde(rename = "type")]
	pub r#type: PartType,
	pub format: PartFormat,
	/// Minutes.
	pub duration: u32,
	pub duration_string: String,
	pub intl: Intl<PartLocale>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub exercises: Vec<Exercise>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub challenges: Vec<Challenge>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartLocale {
	pub title: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub body: Option<String>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub embeds: Vec<Embed>,
	/// Questions of a quiz part. The body then only holds the introduction.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub questions: Option<Vec<Question>>,
}

/// Parse a part directory, its exercises (`NN-slug` subdirectories) and its
/// challenges (`challenges/NN-slug`).
pub async fn parse_part(dir: &Path, options: &Arc<ParseOptions>) -> CurriculumResult<Part> {
	let DirName { prefix, slug } = parse_dirname(dir).with_path(dir)?;
	let langs = detect_langs(dir).await.with_path(dir)?;

	let ParsedReadmes {
		parsed_locales,
		meta,
	} = parse_readmes(
		dir,
		&langs,
		DocumentKind::Part,
		options,
		|_, document, meta| part_locale(document, meta),
	)
	.await?;

	let r#type = match meta_str(&meta, "type") {
		Some(raw) => PART_TYPES.normalize(&raw),
		None => Err(CurriculumError::MissingField("type")),
	}
	.with_path(dir)?;
	let format = match meta_str(&meta, "format") {
		Some(raw) => PART_FORMATS.normalize(&raw),
		None => Err(CurriculumError::MissingField("format")),
	}
	.with_path(dir)?;
	let duration = meta_duration(&meta).with_path(dir)?;
	let tracks = parse_optional_tracks(&meta).with_path(dir)?;

	let exercise_dirs = fs::prefixed_dirs(dir)
		.await?
		.into_iter()
		.map(|name| dir.join(name))
		.collect();
	let pending_exercises = spawn_children(exercise_dirs, options, |dir, options| {
		async move { parse_exercise(&dir, &options).await }
	});

	let challenges_dir = dir.join(CHALLENGES_DIR);
	let challenge_dirs = if fs::is_dir(&challenges_dir).await {
		fs::prefixed_dirs(&challenges_dir)
			.await?
			.into_iter()
			.map(|name| challenges_dir.join(name))
			.collect()
	} else {
		Vec::new()
	};
	let pending_challenges = spawn_children(challenge_dirs, options, |dir, options| {
		async move { parse_challenge(&dir, &options).await }
	});

	let exercises = settle("exercises", pending_exercises).await;
	let challenges = settle("challenges", pending_challenges).await;
	let (mut exercises, mut challenges) =
		join("Failed parsing part children", exercises, challenges).with_path(dir)?;

	join(
		"Duplicate slugs found",
		ensure_unique_slugs("exercise", exercises.iter().map(|e| e.slug.as_str())),
		ensure_unique_slugs("challenge", challenges.iter().map(|c| c.slug.as_str())),
	)
	.with_path(dir)?;

	for (index, exercise) in exercises.iter_mut().enumerate() {
		exercise.order = Some(index + 1);
	}
	for (index, challenge) in challenges.iter_mut().enumerate() {
		challenge.order = Some(index + 1);
	}

	tracing::debug!(dir = %dir.display(), %r#type, duration, "parsed part");

	Ok(Part {
		slug,
		prefix,
		order: None,
		tracks,
		r#type,
		format,
		duration,
		duration_string: minutes_to_human(u64::from(duration)),
		intl: parsed_locales,
		exercises,
		challenges,
	})
}

fn part_locale(document: &Document, meta: &Meta) -> CurriculumResult<PartLocale> {
	let is_quiz = meta_str(meta, "type")
		.and_then(|raw| PART_TYPES.lookup(&raw))
		.is_some_and(|r#type| r#type == PartType::Quiz);

	if !is_quiz {
		let rendered = document.render_body();
		return Ok(PartLocale {
			title: document.title.clone(),
			body: (!rendered.html.is_empty()).then_some(rendered.html),
			embeds: rendered.embeds,
			questions: None,
		});
	}

	let intro_end = document
		.body
		.iter()
		.position(|node| matches!(node, Node::Heading(heading) if heading.depth == 3))
		.unwrap_or(document.body.len());
	let rendered = document.render(&document.body[..intro_end]);

	Ok(PartLocale {
		title: document.title.clone(),
		body: (!rendered.html.is_empty()).then_some(rendered.html),
		embeds: rendered.embeds,
		questions: Some(parse_questions(document, &document.body[intro_end..])?),
	})
}
