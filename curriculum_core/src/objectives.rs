//! Learning objective taxonomy: loading, flattening, validation of
//! references and expansion of branch references into their leaves.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fmt::Write;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use serde::Serializer;
use serde::ser::SerializeMap;
use serde::ser::SerializeStruct;
use serde_json::Value;
use serde_yaml_ng::Value as YamlValue;

use crate::CurriculumError;
use crate::CurriculumResult;
use crate::Intl;
use crate::Lang;
use crate::fs;

/// One node of the taxonomy tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaxonomyNode {
	Leaf(String),
	Branch(String, Vec<TaxonomyNode>),
}

impl TaxonomyNode {
	pub fn id(&self) -> &str {
		match self {
			Self::Leaf(id) | Self::Branch(id, _) => id,
		}
	}

	/// Full paths of this node and every descendant, in document order.
	fn flatten_into(&self, prefix: &str, paths: &mut Vec<String>) {
		let path = format!("{prefix}{}", self.id());
		paths.push(path.clone());

		if let Self::Branch(_, children) = self {
			let prefix = format!("{path}/");
			for child in children {
				child.flatten_into(&prefix, paths);
			}
		}
	}

	/// Full paths of the leaves below this node. A branch without children
	/// counts as a leaf.
	fn leaves_into(&self, path: &str, leaves: &mut Vec<String>) {
		match self {
			Self::Branch(_, children) if !children.is_empty() => {
				for child in children {
					child.leaves_into(&format!("{path}/{}", child.id()), leaves);
				}
			}
			_ => leaves.push(path.to_string()),
		}
	}
}

impl Serialize for TaxonomyNode {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		match self {
			Self::Leaf(id) => serializer.serialize_str(id),
			Self::Branch(id, children) => {
				let mut map = serializer.serialize_map(Some(1))?;
				map.serialize_entry(id, children)?;
				map.end()
			}
		}
	}
}

/// The controlled vocabulary of learning objectives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Taxonomy {
	pub roots: Vec<TaxonomyNode>,
}

impl Serialize for Taxonomy {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		let mut map = serializer.serialize_map(Some(self.roots.len()))?;
		for root in &self.roots {
			match root {
				TaxonomyNode::Leaf(id) => map.serialize_entry(id, &())?,
				TaxonomyNode::Branch(id, children) => map.serialize_entry(id, children)?,
			}
		}
		map.end()
	}
}

impl Taxonomy {
	/// Build the tree from its YAML form: a mapping whose values are lists of
	/// leaf names or nested single-key mappings.
	pub fn from_yaml(value: &YamlValue) -> Self {
		let roots = match value {
			YamlValue::Mapping(mapping) => mapping_nodes(mapping),
			YamlValue::Sequence(items) => items.iter().flat_map(item_nodes).collect(),
			_ => Vec::new(),
		};
		Self { roots }
	}

	pub fn parse(content: &str) -> CurriculumResult<Self> {
		let value: YamlValue = serde_yaml_ng::from_str(content)?;
		Ok(Self::from_yaml(&value))
	}

	/// Load `<dir>/data.yml`. A missing file means there is no taxonomy.
	pub async fn load(dir: &Path) -> CurriculumResult<Option<Self>> {
		let path = dir.join("data.yml");
		let Some(content) = fs::read_optional(&path).await? else {
			return Ok(None);
		};

		Self::parse(&content).map(Some).map_err(|e| e.with_path(path))
	}

	/// Every valid objective path: each node contributes its own path
	/// followed by the paths of its descendants.
	pub fn flatten(&self) -> Vec<String> {
		let mut paths = Vec::new();
		for root in &self.roots {
			root.flatten_into("", &mut paths);
		}
		paths
	}

	/// The node at `path` (`a/b/c`), if any.
	pub fn find(&self, path: &str) -> Option<&TaxonomyNode> {
		let mut segments = path.split('/');
		let first = segments.next()?;
		let mut node = self.roots.iter().find(|node| node.id() == first)?;

		for segment in segments {
			let TaxonomyNode::Branch(_, children) = node else {
				return None;
			};
			node = children.iter().find(|child| child.id() == segment)?;
		}

		Some(node)
	}

	/// Leaf paths below `path`, or `None` when `path` is itself a leaf or
	/// unknown.
	pub fn leaves(&self, path: &str) -> Option<Vec<String>> {
		let node = self.find(path)?;
		match node {
			TaxonomyNode::Branch(_, children) if !children.is_empty() => {
				let mut leaves = Vec::new();
				node.leaves_into(path, &mut leaves);
				Some(leaves)
			}
			_ => None,
		}
	}
}

fn scalar(value: &YamlValue) -> Option<String> {
	match value {
		YamlValue::String(value) => Some(value.clone()),
		YamlValue::Number(value) => Some(value.to_string()),
		YamlValue::Bool(value) => Some(value.to_string()),
		_ => None,
	}
}

fn mapping_nodes(mapping: &serde_yaml_ng::Mapping) -> Vec<TaxonomyNode> {
	mapping
		.iter()
		.filter_map(|(key, value)| {
			let id = scalar(key)?;
			Some(match value {
				YamlValue::Sequence(items) => {
					TaxonomyNode::Branch(id, items.iter().flat_map(item_nodes).collect())
				}
				YamlValue::Mapping(children) => TaxonomyNode::Branch(id, mapping_nodes(children)),
				_ => TaxonomyNode::Leaf(id),
			})
		})
		.collect()
}

fn item_nodes(item: &YamlValue) -> Vec<TaxonomyNode> {
	match item {
		YamlValue::Mapping(mapping) => mapping_nodes(mapping),
		other => scalar(other).map(TaxonomyNode::Leaf).into_iter().collect(),
	}
}

/// A reference to a learning objective from a project or variant.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawObjectiveRef")]
pub struct LearningObjectiveRef {
	pub id: String,
	pub optional: bool,
	pub exclude: bool,
}

impl LearningObjectiveRef {
	pub fn new(id: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			optional: false,
			exclude: false,
		}
	}

	fn with_id(&self, id: String) -> Self {
		Self { id, ..self.clone() }
	}
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawObjectiveRef {
	Id(String),
	Full {
		id: String,
		#[serde(default)]
		optional: bool,
		#[serde(default)]
		exclude: bool,
	},
}

impl From<RawObjectiveRef> for LearningObjectiveRef {
	fn from(raw: RawObjectiveRef) -> Self {
		match raw {
			RawObjectiveRef::Id(id) => Self::new(id),
			RawObjectiveRef::Full {
				id,
				optional,
				exclude,
			} => {
				Self {
					id,
					optional,
					exclude,
				}
			}
		}
	}
}

/// Plain references serialize as their id, flagged ones as a map.
impl Serialize for LearningObjectiveRef {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		if !self.optional && !self.exclude {
			return serializer.serialize_str(&self.id);
		}

		let mut state = serializer.serialize_struct("LearningObjectiveRef", 3)?;
		state.serialize_field("id", &self.id)?;
		if self.optional {
			state.serialize_field("optional", &true)?;
		}
		if self.exclude {
			state.serialize_field("exclude", &true)?;
		}
		state.end()
	}
}

/// Validate `refs` against `taxonomy` and expand branch references.
///
/// Without a taxonomy the references are returned untouched. Every unknown
/// id is reported in a single error. A branch reference is replaced by its
/// leaves, which inherit its flags. Duplicates keep the position of their
/// first occurrence; an explicit leaf reference overrides the flags of one
/// reached through expansion.
pub fn resolve_objectives(
	refs: Vec<LearningObjectiveRef>,
	taxonomy: Option<&Taxonomy>,
) -> CurriculumResult<Vec<LearningObjectiveRef>> {
	let Some(taxonomy) = taxonomy else {
		return Ok(refs);
	};

	let known = taxonomy.flatten();
	let mut unknown: Vec<String> = Vec::new();
	for reference in &refs {
		if !known.contains(&reference.id) && !unknown.contains(&reference.id) {
			unknown.push(reference.id.clone());
		}
	}

	if !unknown.is_empty() {
		return Err(CurriculumError::UnknownLearningObjectives(unknown));
	}

	let mut resolved: Vec<LearningObjectiveRef> = Vec::new();
	let mut positions: HashMap<String, usize> = HashMap::new();

	for reference in &refs {
		let (paths, explicit) = match taxonomy.leaves(&reference.id) {
			Some(leaves) => (leaves, false),
			None => (vec![reference.id.clone()], true),
		};

		for path in paths {
			match positions.get(&path) {
				Some(&index) if explicit => resolved[index] = reference.with_id(path),
				Some(_) => {}
				None => {
					positions.insert(path.clone(), resolved.len());
					resolved.push(reference.with_id(path));
				}
			}
		}
	}

	Ok(resolved)
}

/// A loaded taxonomy with its translations.
#[derive(Debug, Clone, Serialize)]
pub struct LearningObjectives {
	pub tree: Taxonomy,
	pub flat: Vec<String>,
	pub intl: Intl<serde_json::Map<String, Value>>,
	pub table: Vec<ObjectiveRow>,
}

/// One objective with its title in every language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectiveRow {
	pub key: String,
	#[serde(flatten)]
	pub titles: BTreeMap<Lang, Option<String>>,
}

/// Load `data.yml` and the `intl/<lang>.yml` translations from `dir`.
///
/// With `validate`, objectives missing from a translation or without a
/// title fail the load. With `strict`, an objective only counts as missing
/// when no translation has it.
pub async fn load_learning_objectives(
	dir: &Path,
	validate: bool,
	strict: bool,
) -> CurriculumResult<LearningObjectives> {
	let data = dir.join("data.yml");
	let content = fs::read_to_string(&data).await?;
	let tree = Taxonomy::parse(&content).map_err(|e| e.with_path(&data))?;
	let flat = tree.flatten();

	let mut intl = Intl::new();
	for lang in Lang::ALL {
		let path = dir.join("intl").join(format!("{}.yml", lang.code()));
		let content = fs::read_to_string(&path).await?;
		let value: Value =
			serde_yaml_ng::from_str(&content).map_err(|e| CurriculumError::from(e).with_path(&path))?;
		let entries = match value {
			Value::Object(entries) => entries,
			_ => serde_json::Map::new(),
		};
		intl.insert(lang, entries);
	}

	if validate {
		check_translations(&flat, &intl, strict).map_err(|e| e.with_path(dir))?;
	}

	let table = flat
		.iter()
		.map(|key| {
			ObjectiveRow {
				key: key.clone(),
				titles: intl
					.iter()
					.map(|(lang, entries)| (*lang, entries.get(key).and_then(display_title)))
					.collect(),
			}
		})
		.collect();

	Ok(LearningObjectives {
		tree,
		flat,
		intl,
		table,
	})
}

fn title(entry: &Value) -> Option<&str> {
	entry.get("title").and_then(Value::as_str)
}

fn display_title(entry: &Value) -> Option<String> {
	title(entry)
		.or_else(|| entry.as_str())
		.map(str::to_string)
}

fn check_translations(
	flat: &[String],
	intl: &Intl<serde_json::Map<String, Value>>,
	strict: bool,
) -> CurriculumResult<()> {
	let mut missing: Vec<(&str, Vec<Lang>)> = Vec::new();
	let mut untitled: Vec<(&str, Vec<Lang>)> = Vec::new();

	for key in flat {
		let mut missing_langs = Vec::new();
		let mut untitled_langs = Vec::new();

		for (lang, entries) in intl.iter() {
			match entries.get(key) {
				None => missing_langs.push(*lang),
				Some(entry) if title(entry).is_none() => untitled_langs.push(*lang),
				Some(_) => {}
			}
		}

		let counts = if strict {
			missing_langs.len() == intl.len()
		} else {
			!missing_langs.is_empty()
		};
		if counts {
			missing.push((key, missing_langs));
		}
		if !untitled_langs.is_empty() {
			untitled.push((key, untitled_langs));
		}
	}

	if missing.is_empty() && untitled.is_empty() {
		return Ok(());
	}

	let join = |langs: &[Lang]| {
		langs
			.iter()
			.map(|lang| lang.code())
			.collect::<Vec<_>>()
			.join(",")
	};

	let mut message = String::from("Found the following learning objectives with problems:\n");
	let _ = writeln!(
		message,
		"==> {} learning objectives missing from {} intl yml:",
		missing.len(),
		if strict { "all" } else { "at least one" }
	);
	for (key, langs) in &missing {
		let _ = writeln!(message, "* {key} missing in langs: {}", join(langs));
	}
	message.push_str("------------\n");
	let _ = writeln!(
		message,
		"==> {} learning objectives without title:",
		untitled.len()
	);
	for (key, langs) in &untitled {
		let _ = writeln!(message, "* {key} has no title in langs: {}", join(langs));
	}
	message.push_str("------------");

	Err(CurriculumError::ObjectivesIntl(message))
}
