use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::CurriculumError;
use crate::CurriculumResult;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = [
	"curriculum.toml",
	".curriculum.toml",
	".config/curriculum.toml",
];

/// Defaults for a content repository, e.g.
///
/// ```toml
/// repo = "Laboratoria/bootcamp"
/// version = "5.0.0"
/// learning_objectives = "learning-objectives"
/// fetch_covers = true
/// ```
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct CurriculumConfig {
	pub repo: Option<String>,
	pub version: Option<String>,
	/// Appended to project slugs.
	pub suffix: Option<String>,
	/// Directory holding the learning objective taxonomy (`data.yml`),
	/// relative to the directory the config was discovered from.
	pub learning_objectives: Option<PathBuf>,
	/// Download missing cover thumbnails over HTTP.
	pub fetch_covers: bool,
}

impl CurriculumConfig {
	/// Find the config file path by checking supported candidates in order.
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if the file does not exist.
	pub fn load(root: &Path) -> CurriculumResult<Option<Self>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)
			.map_err(|e| CurriculumError::from(e).with_path(&config_path))?;
		let mut config: Self = toml::from_str(&content)
			.map_err(|e| CurriculumError::ConfigParse(e.to_string()).with_path(&config_path))?;

		if let Some(dir) = &config.learning_objectives {
			config.learning_objectives = Some(root.join(dir));
		}

		Ok(Some(config))
	}
}
