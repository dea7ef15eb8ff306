use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use crate::ParseOptions;

/// Write `files` (relative path, content) below a fresh temporary directory.
pub(crate) fn tree(files: &[(&str, &str)]) -> TempDir {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	for (relative, content) in files {
		write(tmp.path(), relative, content);
	}
	tmp
}

pub(crate) fn write(root: &Path, relative: &str, content: &str) {
	let path = root.join(relative);
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).unwrap_or_else(|e| panic!("create_dir_all: {e}"));
	}
	std::fs::write(&path, content).unwrap_or_else(|e| panic!("write {}: {e}", path.display()));
}

pub(crate) fn mkdir(root: &Path, relative: &str) -> PathBuf {
	let path = root.join(relative);
	std::fs::create_dir_all(&path).unwrap_or_else(|e| panic!("create_dir_all: {e}"));
	path
}

pub(crate) fn options() -> Arc<ParseOptions> {
	Arc::new(ParseOptions::default())
}

pub(crate) const TOPIC_README: &str = "# JavaScript

* track: web-dev
* tracks: web-dev, data

---

Learn the basics of the language.

## Syllabus

### [Functions](./02-functions/)

### [Variables](01-variables)
";

pub(crate) const TOPIC_README_PT: &str = "# JavaScript

* track: web-dev
* tracks: web-dev, data

---

Aprenda o básico da linguagem.

## Syllabus

### [Variáveis](01-variables)

### [Funções](02-functions)
";

pub(crate) const READ_PART: &str = "# Values

* type: lectura
* format: self-paced
* duration: 30min

---

Read [the docs](https://developer.mozilla.org).
";

pub(crate) const PRACTICE_PART: &str = "# Practice

* tipo: practice
* formato: guided
* duración: 1h

---

Solve the exercises.
";

pub(crate) const QUIZ_PART: &str = "# Quiz

* type: quiz
* format: self-paced
* duration: 15

---

Answer the questions.

### First question

What is 1 + 1?

#### Options

1. one
2. two

#### Solution

* `value`: 2

### Second question

Explain closures.

#### Solution

* `required`: false
* `multiline`: true
";

/// A topic with two units linked out of order in the syllabus. The second
/// unit has no readme of its own.
pub(crate) fn topic_tree() -> TempDir {
	tree(&[
		("javascript/README.md", TOPIC_README),
		("javascript/README.pt.md", TOPIC_README_PT),
		("javascript/01-variables/README.md", "# Variables\n"),
		("javascript/01-variables/01-values/README.md", READ_PART),
		(
			"javascript/01-variables/02-practice/README.md",
			PRACTICE_PART,
		),
		(
			"javascript/01-variables/02-practice/01-sum/README.md",
			"# Sum\n\nAdd two numbers.\n",
		),
		(
			"javascript/01-variables/02-practice/01-sum/index.js",
			"module.exports = (a, b) => a + b;\n",
		),
		(
			"javascript/01-variables/02-practice/01-sum/test/index.spec.js",
			"// tests\n",
		),
		("javascript/02-functions/01-quiz/README.md", QUIZ_PART),
	])
}

pub(crate) const TAXONOMY: &str = "html:
  - semantics
  - forms
css:
  - selectors
  - layout:
      - flexbox
      - grid
";

pub(crate) const PROJECT_README: &str = "# Cipher

* track: web-dev

---

## Resumen

Encrypt messages with the Caesar cipher.

More details.
";
