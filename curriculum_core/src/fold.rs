//! The fan-out/fan-in combinator shared by every composite entity.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::CurriculumError;
use crate::CurriculumResult;
use crate::ParseOptions;

/// Child parses in flight, in directory-prefix order.
pub(crate) type Pending<T> = Vec<(PathBuf, JoinHandle<CurriculumResult<T>>)>;

/// Start parsing every child directory concurrently.
pub(crate) fn spawn_children<T, F, Fut>(
	dirs: Vec<PathBuf>,
	options: &Arc<ParseOptions>,
	parse: F,
) -> Pending<T>
where
	T: Send + 'static,
	F: Fn(PathBuf, Arc<ParseOptions>) -> Fut,
	Fut: Future<Output = CurriculumResult<T>> + Send + 'static,
{
	dirs.into_iter()
		.map(|dir| {
			tracing::debug!(dir = %dir.display(), "parsing child");
			let handle = tokio::spawn(parse(dir.clone(), Arc::clone(options)));
			(dir, handle)
		})
		.collect()
}

/// Wait for every child and fold the results in the order they were
/// spawned. A failing child never stops its siblings; when any failed, the
/// result is one aggregate error (`Failed parsing <kind>`) holding every
/// child error in order.
pub(crate) async fn settle<T>(kind: &'static str, pending: Pending<T>) -> CurriculumResult<Vec<T>> {
	let mut values = Vec::with_capacity(pending.len());
	let mut errors = Vec::new();

	for (dir, handle) in pending {
		let result = match handle.await {
			Ok(result) => result,
			Err(e) => Err(CurriculumError::Task(e.to_string())),
		};

		match result {
			Ok(value) => values.push(value),
			Err(error) => errors.push(error.with_path(dir)),
		}
	}

	if errors.is_empty() {
		Ok(values)
	} else {
		Err(CurriculumError::aggregate(
			format!("Failed parsing {kind}"),
			errors,
		))
	}
}

/// Fail when two siblings share a slug. Each duplicated slug is reported
/// once.
pub(crate) fn ensure_unique_slugs<'a>(
	kind: &'static str,
	slugs: impl IntoIterator<Item = &'a str>,
) -> CurriculumResult<()> {
	let mut seen: Vec<&str> = Vec::new();
	let mut reported: Vec<&str> = Vec::new();
	let mut errors = Vec::new();

	for slug in slugs {
		if !seen.contains(&slug) {
			seen.push(slug);
			continue;
		}

		if !reported.contains(&slug) {
			reported.push(slug);
			errors.push(CurriculumError::DuplicateSlug {
				kind,
				slug: slug.to_string(),
			});
		}
	}

	if errors.is_empty() {
		Ok(())
	} else {
		Err(CurriculumError::aggregate(
			format!("Duplicate {kind} slugs found"),
			errors,
		))
	}
}

/// Combine two independent sibling results. When both failed, both errors
/// are kept under one aggregate.
pub(crate) fn join<A, B>(
	message: &str,
	first: CurriculumResult<A>,
	second: CurriculumResult<B>,
) -> CurriculumResult<(A, B)> {
	match (first, second) {
		(Ok(first), Ok(second)) => Ok((first, second)),
		(Err(error), Ok(_)) | (Ok(_), Err(error)) => Err(error),
		(Err(first), Err(second)) => Err(CurriculumError::aggregate(message, vec![first, second])),
	}
}
