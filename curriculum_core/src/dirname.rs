use std::cmp::Ordering;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::CurriculumError;
use crate::CurriculumResult;

static DIRNAME_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^(?:(\d{2})-)?([a-z0-9-]{1,97})$").expect("valid regex"));

static PREFIXED_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^(\d{2})-").expect("valid regex"));

/// The ordering prefix and slug encoded in an entity directory name, e.g.
/// `01-intro` → `{ prefix: "01", slug: "intro" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirName {
	pub prefix: Option<String>,
	pub slug: String,
}

/// Parse the basename of `path` into its prefix and slug.
///
/// Uppercase characters and characters outside `[a-z0-9-]` are reported with
/// different errors so callers can tell them apart.
pub fn parse_dirname(path: impl AsRef<Path>) -> CurriculumResult<DirName> {
	let basename = basename(path.as_ref());

	if basename != basename.to_lowercase() {
		return Err(CurriculumError::DirnameNotLowercase(basename));
	}

	let Some(captures) = DIRNAME_RE.captures(&basename) else {
		return Err(CurriculumError::DirnameCharset(basename));
	};

	Ok(DirName {
		prefix: captures.get(1).map(|m| m.as_str().to_string()),
		slug: captures[2].to_string(),
	})
}

/// Whether a directory entry name follows the `NN-slug` convention.
pub fn is_prefixed(name: &str) -> bool {
	PREFIXED_RE.is_match(name)
}

/// Numeric value of the two-digit prefix, if present.
pub fn prefix_number(name: &str) -> Option<u32> {
	PREFIXED_RE
		.captures(name)
		.and_then(|captures| captures[1].parse().ok())
}

/// Sort order for sibling directories: prefix ascending, unprefixed names
/// last, ties broken by the full name.
pub fn compare_prefixed(a: &str, b: &str) -> Ordering {
	match (prefix_number(a), prefix_number(b)) {
		(Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
		(Some(_), None) => Ordering::Less,
		(None, Some(_)) => Ordering::Greater,
		(None, None) => a.cmp(b),
	}
}

pub(crate) fn basename(path: &Path) -> String {
	path.file_name().map_or_else(
		|| path.to_string_lossy().into_owned(),
		|name| name.to_string_lossy().into_owned(),
	)
}
