use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::CHALLENGE_ENVS;
use crate::ChallengeEnv;
use crate::CurriculumError;
use crate::CurriculumResult;
use crate::DirName;
use crate::Document;
use crate::DocumentKind;
use crate::Embed;
use crate::Intl;
use crate::Meta;
use crate::ParseOptions;
use crate::ParsedReadmes;
use crate::Question;
use crate::Tracks;
use crate::WithPath;
use crate::detect_langs;
use crate::fs;
use crate::meta_str;
use crate::parse_dirname;
use crate::parse_optional_tracks;
use crate::parse_questions;
use crate::parse_readmes;
use crate::sections::SectionTag;
use crate::sections::find_section;
use crate::sections::section;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Challenge {
	pub slug: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub prefix: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub order: Option<usize>,
	#[serde(flatten)]
	pub tracks: Option<Tracks>,
	pub env: ChallengeEnv,
	pub intl: Intl<ChallengeLocale>,
	pub files: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChallengeLocale {
	pub title: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub body: Option<String>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub embeds: Vec<Embed>,
	/// Questions of a `form` challenge.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub questions: Option<Vec<Question>>,
}

pub async fn parse_challenge(dir: &Path, options: &ParseOptions) -> CurriculumResult<Challenge> {
	let DirName { prefix, slug } = parse_dirname(dir).with_path(dir)?;
	let langs = detect_langs(dir).await.with_path(dir)?;

	let ParsedReadmes {
		parsed_locales,
		meta,
	} = parse_readmes(
		dir,
		&langs,
		DocumentKind::Challenge,
		options,
		|_, document, meta| challenge_locale(document, meta),
	)
	.await?;

	let env = match meta_str(&meta, "env") {
		Some(raw) => CHALLENGE_ENVS.normalize(&raw),
		None => Err(CurriculumError::MissingField("env")),
	}
	.with_path(dir)?;
	let tracks = parse_optional_tracks(&meta).with_path(dir)?;
	let files = fs::read_file_tree(dir).await?;

	Ok(Challenge {
		slug,
		prefix,
		order: None,
		tracks,
		env,
		intl: parsed_locales,
		files,
	})
}

fn challenge_locale(document: &Document, meta: &Meta) -> CurriculumResult<ChallengeLocale> {
	let is_form = meta_str(meta, "env")
		.and_then(|raw| CHALLENGE_ENVS.lookup(&raw))
		.is_some_and(|env| env == ChallengeEnv::Form);

	if !is_form {
		let rendered = document.render_body();
		return Ok(ChallengeLocale {
			title: document.title.clone(),
			body: (!rendered.html.is_empty()).then_some(rendered.html),
			embeds: rendered.embeds,
			questions: None,
		});
	}

	let intro_end = find_section(&document.body, SectionTag::Questions).unwrap_or(document.body.len());
	let rendered = document.render(&document.body[..intro_end]);
	let questions = match section(&document.body, SectionTag::Questions) {
		Some(nodes) => parse_questions(document, nodes)?,
		None => Vec::new(),
	};

	Ok(ChallengeLocale {
		title: document.title.clone(),
		body: (!rendered.html.is_empty()).then_some(rendered.html),
		embeds: rendered.embeds,
		questions: Some(questions),
	})
}
