//! Filesystem access used by the assembler. Every read of the content tree
//! goes through these helpers so errors carry the offending path.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

use crate::CurriculumError;
use crate::CurriculumResult;
use crate::dirname::compare_prefixed;
use crate::dirname::is_prefixed;

pub(crate) async fn read_to_string(path: &Path) -> CurriculumResult<String> {
	tokio::fs::read_to_string(path)
		.await
		.map_err(|e| CurriculumError::from(e).with_path(path))
}

/// Read a file that is allowed to be absent.
pub(crate) async fn read_optional(path: &Path) -> CurriculumResult<Option<String>> {
	match tokio::fs::read_to_string(path).await {
		Ok(content) => Ok(Some(content)),
		Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
		Err(e) => Err(CurriculumError::from(e).with_path(path)),
	}
}

pub(crate) async fn is_dir(path: &Path) -> bool {
	tokio::fs::metadata(path)
		.await
		.is_ok_and(|metadata| metadata.is_dir())
}

pub(crate) async fn is_file(path: &Path) -> bool {
	tokio::fs::metadata(path)
		.await
		.is_ok_and(|metadata| metadata.is_file())
}

/// Names of every entry in `dir`, sorted.
pub(crate) async fn entry_names(dir: &Path) -> CurriculumResult<Vec<String>> {
	let mut reader = tokio::fs::read_dir(dir)
		.await
		.map_err(|e| CurriculumError::from(e).with_path(dir))?;
	let mut names = Vec::new();

	while let Some(entry) = reader
		.next_entry()
		.await
		.map_err(|e| CurriculumError::from(e).with_path(dir))?
	{
		names.push(entry.file_name().to_string_lossy().into_owned());
	}

	names.sort();
	Ok(names)
}

/// Child directories following the `NN-slug` convention, in prefix order.
pub(crate) async fn prefixed_dirs(dir: &Path) -> CurriculumResult<Vec<String>> {
	let mut dirs = Vec::new();

	for name in entry_names(dir).await? {
		if is_prefixed(&name) && is_dir(&dir.join(&name)).await {
			dirs.push(name);
		}
	}

	dirs.sort_by(|a, b| compare_prefixed(a, b));
	Ok(dirs)
}

/// Read every non-markdown file below `dir`, keyed by its `/`-separated path
/// relative to `dir`.
pub(crate) async fn read_file_tree(dir: &Path) -> CurriculumResult<BTreeMap<String, String>> {
	let mut files = BTreeMap::new();
	let mut pending: Vec<PathBuf> = vec![PathBuf::new()];

	while let Some(relative) = pending.pop() {
		let current = dir.join(&relative);

		for name in entry_names(&current).await? {
			let child_relative = relative.join(&name);
			let child = dir.join(&child_relative);

			if is_dir(&child).await {
				pending.push(child_relative);
				continue;
			}

			if name.to_lowercase().ends_with(".md") {
				continue;
			}

			let bytes = tokio::fs::read(&child)
				.await
				.map_err(|e| CurriculumError::from(e).with_path(&child))?;
			let content = match String::from_utf8(bytes) {
				Ok(content) => content,
				Err(e) => {
					tracing::warn!(path = %child.display(), "decoding non utf-8 file lossily");
					String::from_utf8_lossy(e.as_bytes()).into_owned()
				}
			};
			let key = child_relative
				.components()
				.map(|component| component.as_os_str().to_string_lossy())
				.collect::<Vec<_>>()
				.join("/");
			files.insert(key, content);
		}
	}

	Ok(files)
}
