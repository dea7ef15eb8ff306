//! Language variants of a document and the aggregator that parses all of
//! them together.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::path::PathBuf;

use derive_more::Deref;
use derive_more::DerefMut;
use markdown::mdast::Node;
use serde::Serialize;
use serde_json::Value;

use crate::CurriculumError;
use crate::CurriculumResult;
use crate::Document;
use crate::Meta;
use crate::MetaAliases;
use crate::ParseOptions;
use crate::fs;

/// A supported content language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
	Es,
	Pt,
}

impl Lang {
	/// The language of a plain `README.md`.
	pub const DEFAULT: Self = Self::Es;
	pub const ALL: [Self; 2] = [Self::Es, Self::Pt];

	pub fn code(self) -> &'static str {
		match self {
			Self::Es => "es",
			Self::Pt => "pt",
		}
	}

	pub fn from_code(code: &str) -> CurriculumResult<Self> {
		Self::ALL
			.into_iter()
			.find(|lang| lang.code() == code)
			.ok_or_else(|| CurriculumError::UnsupportedLang(code.to_string()))
	}

	/// Name of the readme holding this language variant.
	pub fn readme(self) -> String {
		if self == Self::DEFAULT {
			"README.md".to_string()
		} else {
			format!("README.{}.md", self.code())
		}
	}
}

impl fmt::Display for Lang {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.code())
	}
}

/// Values keyed by language, always iterated `es` before `pt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deref, DerefMut)]
pub struct Intl<T>(BTreeMap<Lang, T>);

impl<T> Intl<T> {
	pub fn new() -> Self {
		Self(BTreeMap::new())
	}

	/// Transform every value, keeping the languages.
	pub fn map<U>(self, mut f: impl FnMut(Lang, T) -> U) -> Intl<U> {
		Intl(
			self.0
				.into_iter()
				.map(|(lang, value)| (lang, f(lang, value)))
				.collect(),
		)
	}
}

impl<T> Default for Intl<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T> FromIterator<(Lang, T)> for Intl<T> {
	fn from_iter<I: IntoIterator<Item = (Lang, T)>>(iter: I) -> Self {
		Self(iter.into_iter().collect())
	}
}

impl<T> IntoIterator for Intl<T> {
	type IntoIter = std::collections::btree_map::IntoIter<Lang, T>;
	type Item = (Lang, T);

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}

/// Detect which language variants of a readme exist in `dir`.
///
/// `README.md` is the default language and `README.<lang>.md` any other.
pub async fn detect_langs(dir: &Path) -> CurriculumResult<Vec<Lang>> {
	let mut langs = Vec::new();

	for name in fs::entry_names(dir).await? {
		let lang = if name == "README.md" {
			Lang::DEFAULT
		} else if let Some(code) = name
			.strip_prefix("README.")
			.and_then(|rest| rest.strip_suffix(".md"))
		{
			Lang::from_code(code)?
		} else {
			continue;
		};

		if !langs.contains(&lang) {
			langs.push(lang);
		}
	}

	if langs.is_empty() {
		return Err(CurriculumError::NoLangsDetected);
	}

	langs.sort();
	Ok(langs)
}

/// The entity a readme describes. Decides the sidecar metadata file, the
/// accepted metadata keys and whether a cover image is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
	Project,
	Topic,
	Unit,
	Part,
	Exercise,
	Challenge,
}

const COMMON_ALIASES: [(&str, &str); 6] = [
	("track", "track"),
	("tracks", "tracks"),
	("trilhas", "tracks"),
	("cover", "cover"),
	("portada", "cover"),
	("capa", "cover"),
];

static BASE_ALIASES: &[(&str, &str)] = &COMMON_ALIASES;

static PART_ALIASES: &[(&str, &str)] = &[
	COMMON_ALIASES[0],
	COMMON_ALIASES[1],
	COMMON_ALIASES[2],
	COMMON_ALIASES[3],
	COMMON_ALIASES[4],
	COMMON_ALIASES[5],
	("tipo", "type"),
	("type", "type"),
	("formato", "format"),
	("format", "format"),
	("duración", "duration"),
	("duracion", "duration"),
	("duração", "duration"),
	("duracao", "duration"),
	("duration", "duration"),
];

static RUNNABLE_ALIASES: &[(&str, &str)] = &[
	COMMON_ALIASES[0],
	COMMON_ALIASES[1],
	COMMON_ALIASES[2],
	COMMON_ALIASES[3],
	COMMON_ALIASES[4],
	COMMON_ALIASES[5],
	("entorno", "env"),
	("ambiente", "env"),
	("environment", "env"),
	("env", "env"),
];

impl DocumentKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Project => "project",
			Self::Topic => "topic",
			Self::Unit => "unit",
			Self::Part => "part",
			Self::Exercise => "exercise",
			Self::Challenge => "challenge",
		}
	}

	/// Structured metadata file used when no readme has an inline block.
	pub fn sidecar(self) -> String {
		format!("{}.yml", self.as_str())
	}

	pub fn aliases(self) -> MetaAliases {
		match self {
			Self::Part => PART_ALIASES,
			Self::Exercise | Self::Challenge => RUNNABLE_ALIASES,
			Self::Project | Self::Topic | Self::Unit => BASE_ALIASES,
		}
	}

	pub fn resolves_cover(self) -> bool {
		matches!(self, Self::Project | Self::Topic)
	}
}

/// Every language variant of a directory's readme plus the metadata they
/// agree on.
#[derive(Debug, Clone)]
pub struct ParsedReadmes<T> {
	pub parsed_locales: Intl<T>,
	pub meta: Meta,
}

/// Parse the readme of every language in `langs` and hand each one to
/// `consumer` together with the reconciled metadata.
///
/// Inline metadata blocks must be identical across languages. When no
/// readme has one, the `<kind>.yml` sidecar is loaded instead. Project and
/// topic metadata additionally gets `cover` and `thumb` fields resolved by
/// [`ParseOptions::thumbnails`].
pub async fn parse_readmes<T, F>(
	dir: &Path,
	langs: &[Lang],
	kind: DocumentKind,
	options: &ParseOptions,
	consumer: F,
) -> CurriculumResult<ParsedReadmes<T>>
where
	F: Fn(Lang, &Document, &Meta) -> CurriculumResult<T>,
{
	if langs.is_empty() {
		return Err(CurriculumError::NoLangsDetected.with_path(dir));
	}

	let handles: Vec<_> = langs
		.iter()
		.map(|lang| {
			let path = dir.join(lang.readme());
			let task_path = path.clone();
			let handle = tokio::spawn(async move { fs::read_to_string(&task_path).await });
			(*lang, path, handle)
		})
		.collect();

	let mut documents: Vec<(Lang, PathBuf, Document)> = Vec::with_capacity(handles.len());
	for (lang, path, handle) in handles {
		let text = handle
			.await
			.map_err(|e| CurriculumError::Task(e.to_string()).with_path(&path))??;

		if text.trim().is_empty() {
			return Err(
				CurriculumError::EmptyFile(path.display().to_string()).with_path(&path),
			);
		}

		let document = Document::parse(&text, kind.aliases()).map_err(|e| e.with_path(&path))?;
		documents.push((lang, path, document));
	}

	let mut meta = reconcile_meta(dir, kind, &documents).await?;

	if kind.resolves_cover() {
		let cover = match meta.get("cover") {
			Some(Value::String(cover)) if !cover.trim().is_empty() => Some(cover.trim().to_string()),
			_ => {
				documents
					.first()
					.and_then(|(_, _, document)| first_image(&document.body))
			}
		};
		let thumb = options
			.thumbnails
			.resolve(dir, cover.as_deref())
			.await
			.map_err(|e| e.with_path(dir))?;

		if let Some(cover) = cover {
			meta.insert("cover".to_string(), Value::String(cover));
		}
		if let Some(thumb) = thumb {
			meta.insert("thumb".to_string(), Value::String(thumb));
		}
	}

	let mut parsed_locales = Intl::new();
	for (lang, path, document) in &documents {
		let payload = consumer(*lang, document, &meta).map_err(|e| e.with_path(path))?;
		parsed_locales.insert(*lang, payload);
	}

	Ok(ParsedReadmes {
		parsed_locales,
		meta,
	})
}

async fn reconcile_meta(
	dir: &Path,
	kind: DocumentKind,
	documents: &[(Lang, PathBuf, Document)],
) -> CurriculumResult<Meta> {
	let inline: Vec<(Lang, &Meta)> = documents
		.iter()
		.filter_map(|(lang, _, document)| document.meta.as_ref().map(|meta| (*lang, meta)))
		.collect();

	if let Some((_, first)) = inline.first() {
		if inline.iter().any(|(_, meta)| meta != first) {
			let langs = inline
				.iter()
				.map(|(lang, _)| lang.code())
				.collect::<Vec<_>>()
				.join(" and ");
			return Err(CurriculumError::MetaMismatch { langs }.with_path(dir));
		}

		return Ok((*first).clone());
	}

	let sidecar = dir.join(kind.sidecar());
	load_sidecar(&sidecar).await
}

/// Load a YAML metadata file. A missing or empty file is empty metadata.
pub(crate) async fn load_sidecar(path: &Path) -> CurriculumResult<Meta> {
	let Some(content) = fs::read_optional(path).await? else {
		return Ok(Meta::new());
	};

	let value: Value = serde_yaml_ng::from_str(&content)
		.map_err(|e| CurriculumError::from(e).with_path(path))?;

	match value {
		Value::Object(meta) => Ok(meta),
		Value::Null => Ok(Meta::new()),
		_ => Err(CurriculumError::InvalidSidecar(path.display().to_string()).with_path(path)),
	}
}

fn first_image(nodes: &[Node]) -> Option<String> {
	nodes.iter().find_map(|node| {
		match node {
			Node::Image(image) => Some(image.url.clone()),
			other => other.children().and_then(|children| first_image(children)),
		}
	})
}
