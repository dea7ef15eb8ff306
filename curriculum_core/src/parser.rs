use markdown::ParseOptions;
use markdown::mdast::Node;
use markdown::to_mdast;
use serde::Serialize;
use serde_json::Value;

use crate::CurriculumError;
use crate::CurriculumResult;
use crate::Embed;
use crate::embed::embed_links;
use crate::html::Definitions;
use crate::html::collect_definitions;
use crate::html::plain_text;
use crate::html::to_html;

/// Normalized document metadata: canonical field name to value.
pub type Meta = serde_json::Map<String, Value>;

/// Accepted spellings of metadata keys mapped to their canonical field name.
pub type MetaAliases = &'static [(&'static str, &'static str)];

/// A markdown document split into title, metadata and body nodes.
#[derive(Debug, Clone)]
pub struct Document {
	pub title: String,
	/// The inline metadata block, if the document has one.
	pub meta: Option<Meta>,
	/// Every block after the title and the metadata block.
	pub body: Vec<Node>,
	definitions: Definitions,
}

/// The rendered form of a [`Document`] or a slice of its nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendered {
	pub html: String,
	pub embeds: Vec<Embed>,
}

/// A single parsed document with its body rendered to HTML.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedDocument {
	pub title: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub body: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub meta: Option<Meta>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub embeds: Vec<Embed>,
}

impl Document {
	/// Split `text` into title, metadata block and body.
	pub fn parse(text: &str, aliases: MetaAliases) -> CurriculumResult<Self> {
		let text = text.trim();
		if text.is_empty() {
			return Err(CurriculumError::EmptyFile("README.md".to_string()));
		}

		let root = to_mdast(text, &ParseOptions::gfm())
			.map_err(|e| CurriculumError::Markdown(e.to_string()))?;
		let Node::Root(root) = root else {
			return Err(CurriculumError::Markdown("expected a root node".to_string()));
		};

		let mut nodes = root.children.into_iter();
		let title = match nodes.next() {
			Some(node) => title_of(&node)?,
			None => return Err(CurriculumError::EmptyFile("README.md".to_string())),
		};
		let rest: Vec<Node> = nodes.collect();
		let definitions = collect_definitions(&rest);
		let (meta, body) = split_meta(rest, aliases);

		Ok(Self {
			title,
			meta,
			body,
			definitions,
		})
	}

	/// Render a run of this document's nodes, trimming surrounding section
	/// breaks and rewriting provider links into embeds.
	pub fn render(&self, nodes: &[Node]) -> Rendered {
		self.render_with(nodes, false)
	}

	/// Like [`Document::render`] but without paragraph wrappers, for list
	/// item content such as quiz options.
	pub fn render_tight(&self, nodes: &[Node]) -> Rendered {
		self.render_with(nodes, true)
	}

	fn render_with(&self, nodes: &[Node], tight: bool) -> Rendered {
		let (nodes, embeds) = embed_links(trim_breaks(nodes).to_vec());
		Rendered {
			html: to_html(&nodes, &self.definitions, tight),
			embeds,
		}
	}

	/// Render the whole body.
	pub fn render_body(&self) -> Rendered {
		self.render(&self.body)
	}

	/// Title and rendered body, leaving the metadata out.
	pub fn localized(&self) -> ParsedDocument {
		let Rendered { html, embeds } = self.render_body();
		ParsedDocument {
			title: self.title.clone(),
			body: (!html.is_empty()).then_some(html),
			meta: None,
			embeds,
		}
	}

	pub fn into_parsed(self) -> ParsedDocument {
		let mut parsed = self.localized();
		parsed.meta = self.meta;
		parsed
	}
}

/// Parse a single document into its title, metadata and rendered body.
pub fn parse_document(text: &str, aliases: MetaAliases) -> CurriculumResult<ParsedDocument> {
	Document::parse(text, aliases).map(Document::into_parsed)
}

/// Short description of a node used in error messages, e.g.
/// `heading (depth: 2)` or `paragraph`.
pub fn describe_node(node: &Node) -> String {
	let kind = match node {
		Node::Heading(heading) => return format!("heading (depth: {})", heading.depth),
		Node::Paragraph(_) => "paragraph",
		Node::List(_) => "list",
		Node::ListItem(_) => "listItem",
		Node::Code(_) => "code",
		Node::Html(_) => "html",
		Node::ThematicBreak(_) => "thematicBreak",
		Node::Blockquote(_) => "blockquote",
		Node::Table(_) => "table",
		Node::Definition(_) => "definition",
		Node::Text(_) => "text",
		Node::Link(_) => "link",
		Node::Image(_) => "image",
		Node::Emphasis(_) => "emphasis",
		Node::Strong(_) => "strong",
		Node::InlineCode(_) => "inlineCode",
		Node::Delete(_) => "delete",
		Node::Break(_) => "break",
		Node::Math(_) => "math",
		Node::Yaml(_) => "yaml",
		Node::Toml(_) => "toml",
		_ => "node",
	};
	kind.to_string()
}

fn title_of(node: &Node) -> CurriculumResult<String> {
	let Node::Heading(heading) = node else {
		return Err(CurriculumError::MissingTitle {
			observed: describe_node(node),
		});
	};

	if heading.depth != 1 {
		return Err(CurriculumError::MissingTitle {
			observed: describe_node(node),
		});
	}

	match heading.children.as_slice() {
		[Node::Text(text)] => Ok(text.value.trim().to_string()),
		[] => {
			Err(CurriculumError::InvalidTitle {
				observed: "nothing".to_string(),
			})
		}
		children => {
			let observed = children
				.iter()
				.find(|child| !matches!(child, Node::Text(_)))
				.or(children.first())
				.map(describe_node)
				.unwrap_or_default();
			Err(CurriculumError::InvalidTitle { observed })
		}
	}
}

/// Separate a leading metadata list from the body. The list only counts as
/// metadata when every item is a `key: value` pair and it is followed by a
/// section break or ends the document.
fn split_meta(nodes: Vec<Node>, aliases: MetaAliases) -> (Option<Meta>, Vec<Node>) {
	let is_meta_block = match nodes.as_slice() {
		[Node::List(list), rest @ ..] if !list.ordered => {
			matches!(rest.first(), None | Some(Node::ThematicBreak(_)))
				&& !list.children.is_empty()
				&& list.children.iter().all(|item| meta_pair(item).is_some())
		}
		_ => false,
	};

	if !is_meta_block {
		return (None, nodes);
	}

	let mut nodes = nodes.into_iter();
	let mut meta = Meta::new();
	if let Some(Node::List(list)) = nodes.next() {
		for (key, value) in list.children.iter().filter_map(meta_pair) {
			if let Some((_, canonical)) = aliases.iter().find(|(alias, _)| *alias == key) {
				meta.insert((*canonical).to_string(), Value::String(value));
			}
		}
	}

	(Some(meta), nodes.collect())
}

fn meta_pair(item: &Node) -> Option<(String, String)> {
	let Node::ListItem(item) = item else {
		return None;
	};
	let text = plain_text(&item.children);
	let (key, value) = text.split_once(':')?;
	let key = key.trim().to_lowercase();
	if key.is_empty() {
		return None;
	}

	Some((key, strip_backticks(value.trim()).to_string()))
}

fn strip_backticks(value: &str) -> &str {
	value
		.strip_prefix('`')
		.and_then(|inner| inner.strip_suffix('`'))
		.map_or(value, str::trim)
}

/// Drop every leading and trailing section break.
pub(crate) fn trim_breaks(nodes: &[Node]) -> &[Node] {
	let start = nodes
		.iter()
		.position(|node| !matches!(node, Node::ThematicBreak(_)))
		.unwrap_or(nodes.len());
	let end = nodes
		.iter()
		.rposition(|node| !matches!(node, Node::ThematicBreak(_)))
		.map_or(start, |index| index + 1);
	&nodes[start..end.max(start)]
}
