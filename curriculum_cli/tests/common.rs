use std::path::Path;

use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

pub fn curriculum_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("curriculum-parser"));
	cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
	cmd
}

/// Write `files` (relative path, content) below `root`.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) -> std::io::Result<()> {
	for (relative, content) in files {
		let path = root.join(relative);
		if let Some(parent) = path.parent() {
			std::fs::create_dir_all(parent)?;
		}
		std::fs::write(path, content)?;
	}

	Ok(())
}

pub const READ_PART: &str = "# Values

* type: read
* format: self-paced
* duration: 30min

---

Read [the docs](https://developer.mozilla.org).
";

pub const TOPIC_README: &str = "# JavaScript

* track: web-dev

---

Learn the basics of the language.

## Syllabus

### [Variables](01-variables)
";

pub const PROJECT_README: &str = "# Cipher

* track: web-dev

---

## Resumen

Encrypt messages with the Caesar cipher.
";
