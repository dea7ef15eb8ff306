use std::path::Path;
use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum CurriculumError {
	#[error(transparent)]
	#[diagnostic(code(curriculum::io_error))]
	Io(#[from] std::io::Error),

	#[error("failure to load markdown: {0}")]
	#[diagnostic(code(curriculum::markdown))]
	Markdown(String),

	#[error("failed to parse yaml: {0}")]
	#[diagnostic(code(curriculum::yaml))]
	Yaml(#[from] serde_yaml_ng::Error),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(curriculum::config_parse),
		help("check that curriculum.toml is valid TOML")
	)]
	ConfigParse(String),

	#[error("Expected {0} to contain a mapping")]
	#[diagnostic(code(curriculum::sidecar))]
	InvalidSidecar(String),

	#[error("{0} is empty")]
	#[diagnostic(code(curriculum::empty_file))]
	EmptyFile(String),

	#[error("Expected README.md to start with h1 and instead saw {observed}")]
	#[diagnostic(
		code(curriculum::missing_title),
		help("the first line of every README must be a `# Title` heading")
	)]
	MissingTitle { observed: String },

	#[error("Expected h1 to contain only plain text and instead saw {observed}")]
	#[diagnostic(code(curriculum::invalid_title))]
	InvalidTitle { observed: String },

	#[error("No langs detected")]
	#[diagnostic(
		code(curriculum::no_langs),
		help("add a README.md (es) and/or README.pt.md to the directory")
	)]
	NoLangsDetected,

	#[error("Unsupported lang: {0}")]
	#[diagnostic(code(curriculum::unsupported_lang), help("supported langs: es, pt"))]
	UnsupportedLang(String),

	#[error("Directory name must be all lowercase and received {0}")]
	#[diagnostic(code(curriculum::dirname_case))]
	DirnameNotLowercase(String),

	#[error(
		"Directory name must only contain alphanumeric characters and hyphens (-) and received {0}"
	)]
	#[diagnostic(
		code(curriculum::dirname_charset),
		help("directory names follow the `00-some-slug` convention")
	)]
	DirnameCharset(String),

	#[error("Unknown part type \"{value}\". Expected one of: {expected}")]
	#[diagnostic(code(curriculum::part_type))]
	UnknownPartType { value: String, expected: String },

	#[error("Unknown part format \"{value}\". Expected one of: {expected}")]
	#[diagnostic(code(curriculum::part_format))]
	UnknownPartFormat { value: String, expected: String },

	#[error("Failed parsing duration \"{0}\"")]
	#[diagnostic(
		code(curriculum::duration),
		help("durations look like `30`, `30m`, `30min`, `1h` or `1.5h`")
	)]
	InvalidDuration(String),

	#[error("Missing required field \"{0}\"")]
	#[diagnostic(code(curriculum::missing_field))]
	MissingField(&'static str),

	#[error("Invalid track \"{value}\". Expected one of: {expected}")]
	#[diagnostic(code(curriculum::track))]
	InvalidTrack { value: String, expected: String },

	#[error("Missing track. Expected one of: {expected}")]
	#[diagnostic(code(curriculum::missing_track))]
	MissingTrack { expected: String },

	#[error("No tracks found. Expected at least one.")]
	#[diagnostic(code(curriculum::no_tracks))]
	NoTracks,

	#[error("Unknown challenge env \"{value}\". Expected one of: {expected}")]
	#[diagnostic(code(curriculum::challenge_env))]
	UnknownChallengeEnv { value: String, expected: String },

	#[error("Metadata mismatch between {langs} readmes")]
	#[diagnostic(
		code(curriculum::meta_mismatch),
		help("inline metadata must be identical in every translation")
	)]
	MetaMismatch { langs: String },

	#[error("Duplicate {kind} slug: {slug}")]
	#[diagnostic(code(curriculum::duplicate_slug))]
	DuplicateSlug { kind: &'static str, slug: String },

	#[error("Unknown learning objectives: {}.", .0.join(", "))]
	#[diagnostic(code(curriculum::unknown_learning_objectives))]
	UnknownLearningObjectives(Vec<String>),

	#[error("{0}")]
	#[diagnostic(code(curriculum::objectives_intl))]
	ObjectivesIntl(String),

	#[error("Main topic README must contain Syllabus heading")]
	#[diagnostic(code(curriculum::missing_syllabus))]
	MissingSyllabus,

	#[error("Syllabus must link at least one unit")]
	#[diagnostic(
		code(curriculum::empty_syllabus),
		help("add `### [Unit title](01-unit-dir)` headings under `## Syllabus`")
	)]
	EmptySyllabus,

	#[error("Expected syllabus heading \"{0}\" to contain exactly one link")]
	#[diagnostic(code(curriculum::syllabus_link))]
	SyllabusLink(String),

	#[error("{reason} in question \"{question}\"")]
	#[diagnostic(code(curriculum::quiz))]
	Quiz { question: String, reason: String },

	#[error("HTTP error {status} fetching {url}")]
	#[diagnostic(code(curriculum::http))]
	Http { url: String, status: u16 },

	#[error("Failed fetching {url}: {reason}")]
	#[diagnostic(code(curriculum::fetch))]
	Fetch { url: String, reason: String },

	#[error("child parse task failed: {0}")]
	#[diagnostic(code(curriculum::task))]
	Task(String),

	#[error("{message}")]
	#[diagnostic(code(curriculum::aggregate))]
	Aggregate {
		message: String,
		#[related]
		errors: Vec<CurriculumError>,
	},

	#[error("{inner}")]
	#[diagnostic(code(curriculum::at_path))]
	AtPath {
		path: PathBuf,
		inner: Box<CurriculumError>,
	},
}

impl CurriculumError {
	/// Build an aggregate error wrapping every individual child failure.
	pub fn aggregate(message: impl Into<String>, errors: Vec<CurriculumError>) -> Self {
		Self::Aggregate {
			message: message.into(),
			errors,
		}
	}

	/// Tag the error with the file or directory it belongs to. Errors that
	/// already carry a path keep the innermost (most specific) one.
	#[must_use]
	pub fn with_path(self, path: impl Into<PathBuf>) -> Self {
		match self {
			Self::AtPath { .. } => self,
			other => {
				Self::AtPath {
					path: path.into(),
					inner: Box::new(other),
				}
			}
		}
	}

	/// The path this error is tagged with, if any.
	pub fn path(&self) -> Option<&Path> {
		match self {
			Self::AtPath { path, .. } => Some(path.as_path()),
			_ => None,
		}
	}

	/// The error without its path tag.
	pub fn inner(&self) -> &Self {
		match self {
			Self::AtPath { inner, .. } => inner.inner(),
			other => other,
		}
	}

	/// Child errors of an aggregate, empty for every other kind.
	pub fn errors(&self) -> &[CurriculumError] {
		match self.inner() {
			Self::Aggregate { errors, .. } => errors,
			_ => &[],
		}
	}

	pub fn is_aggregate(&self) -> bool {
		matches!(self.inner(), Self::Aggregate { .. })
	}

	/// Flatten nested aggregates into their leaf errors, in order. Each leaf
	/// is paired with its own path, or the closest enclosing one.
	pub fn leaves(&self) -> Vec<(Option<&Path>, &CurriculumError)> {
		let mut leaves = Vec::new();
		collect_leaves(self, None, &mut leaves);
		leaves
	}
}

fn collect_leaves<'a>(
	error: &'a CurriculumError,
	parent: Option<&'a Path>,
	leaves: &mut Vec<(Option<&'a Path>, &'a CurriculumError)>,
) {
	let path = error.path().or(parent);
	match error.inner() {
		CurriculumError::Aggregate { errors, .. } if !errors.is_empty() => {
			for child in errors {
				collect_leaves(child, path, leaves);
			}
		}
		leaf => leaves.push((path, leaf)),
	}
}

/// Tag the error of a result with a path, see [`CurriculumError::with_path`].
pub trait WithPath<T> {
	fn with_path(self, path: &Path) -> CurriculumResult<T>;
}

impl<T> WithPath<T> for CurriculumResult<T> {
	fn with_path(self, path: &Path) -> CurriculumResult<T> {
		self.map_err(|e| e.with_path(path))
	}
}

pub type CurriculumResult<T> = Result<T, CurriculumError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
