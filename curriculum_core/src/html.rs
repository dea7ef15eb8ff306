use std::collections::HashMap;
use std::fmt::Write;

use markdown::mdast::AlignKind;
use markdown::mdast::Node;
use url::Url;

/// Link reference definitions keyed by normalized identifier.
pub(crate) type Definitions = HashMap<String, (String, Option<String>)>;

pub(crate) fn collect_definitions(nodes: &[Node]) -> Definitions {
	let mut definitions = Definitions::new();
	for node in nodes {
		if let Node::Definition(definition) = node {
			definitions
				.entry(definition.identifier.clone())
				.or_insert_with(|| (definition.url.clone(), definition.title.clone()));
		}
	}
	definitions
}

/// Serialize block nodes to HTML. When `tight`, paragraphs are rendered
/// without their `<p>` wrapper, as inside a tight list item.
pub(crate) fn to_html(nodes: &[Node], definitions: &Definitions, tight: bool) -> String {
	let mut renderer = Renderer {
		out: String::new(),
		definitions,
	};
	renderer.blocks(nodes, tight);
	renderer.out
}

/// Concatenated text content of `nodes`, without any markup.
pub fn plain_text(nodes: &[Node]) -> String {
	let mut text = String::new();
	for node in nodes {
		push_text(node, &mut text);
	}
	text
}

fn push_text(node: &Node, text: &mut String) {
	match node {
		Node::Text(node) => text.push_str(&node.value),
		Node::InlineCode(node) => text.push_str(&node.value),
		Node::Code(node) => text.push_str(&node.value),
		Node::InlineMath(node) => text.push_str(&node.value),
		Node::Html(node) => text.push_str(&node.value),
		Node::Break(_) => text.push('\n'),
		other => {
			if let Some(children) = other.children() {
				for child in children {
					push_text(child, text);
				}
			}
		}
	}
}

pub(crate) fn escape(value: &str) -> String {
	let mut escaped = String::with_capacity(value.len());
	for ch in value.chars() {
		match ch {
			'&' => escaped.push_str("&amp;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			'"' => escaped.push_str("&quot;"),
			other => escaped.push(other),
		}
	}
	escaped
}

fn is_external(href: &str) -> bool {
	Url::parse(href).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

struct Renderer<'a> {
	out: String,
	definitions: &'a Definitions,
}

impl Renderer<'_> {
	fn blocks(&mut self, nodes: &[Node], tight: bool) {
		let mut first = true;
		for node in nodes.iter().filter(|node| renders(node)) {
			if !first {
				self.out.push('\n');
			}
			first = false;
			self.block(node, tight);
		}
	}

	fn block(&mut self, node: &Node, tight: bool) {
		match node {
			Node::Root(root) => self.blocks(&root.children, tight),
			Node::Paragraph(paragraph) => {
				if tight {
					self.inlines(&paragraph.children);
				} else {
					self.out.push_str("<p>");
					self.inlines(&paragraph.children);
					self.out.push_str("</p>");
				}
			}
			Node::Heading(heading) => {
				let _ = write!(self.out, "<h{}>", heading.depth);
				self.inlines(&heading.children);
				let _ = write!(self.out, "</h{}>", heading.depth);
			}
			Node::ThematicBreak(_) => self.out.push_str("<hr>"),
			Node::Blockquote(blockquote) => {
				self.out.push_str("<blockquote>\n");
				self.blocks(&blockquote.children, false);
				self.out.push_str("\n</blockquote>");
			}
			Node::List(list) => {
				let tight = !list.spread
					&& list
						.children
						.iter()
						.all(|item| !matches!(item, Node::ListItem(item) if item.spread));
				let tag = if list.ordered { "ol" } else { "ul" };

				match list.start {
					Some(start) if list.ordered && start != 1 => {
						let _ = write!(self.out, "<ol start=\"{start}\">");
					}
					_ => {
						let _ = write!(self.out, "<{tag}>");
					}
				}
				self.out.push('\n');

				for item in &list.children {
					self.list_item(item, tight);
					self.out.push('\n');
				}

				let _ = write!(self.out, "</{tag}>");
			}
			Node::Code(code) => {
				self.out.push_str("<pre><code");
				if let Some(lang) = &code.lang {
					let _ = write!(self.out, " class=\"language-{}\"", escape(lang));
				}
				self.out.push('>');
				self.out.push_str(&escape(&code.value));
				if !code.value.is_empty() {
					self.out.push('\n');
				}
				self.out.push_str("</code></pre>");
			}
			Node::Math(math) => {
				let _ = write!(
					self.out,
					"<pre><code class=\"language-math math-display\">{}</code></pre>",
					escape(&math.value)
				);
			}
			Node::Html(html) => self.out.push_str(&html.value),
			Node::Table(table) => self.table(&table.children, &table.align),
			other => self.inline(other),
		}
	}

	fn list_item(&mut self, node: &Node, tight: bool) {
		let Node::ListItem(item) = node else {
			self.block(node, tight);
			return;
		};

		self.out.push_str("<li>");
		match item.checked {
			Some(true) => self.out.push_str("<input type=\"checkbox\" disabled checked> "),
			Some(false) => self.out.push_str("<input type=\"checkbox\" disabled> "),
			None => {}
		}

		if tight {
			let starts_inline = matches!(item.children.first(), Some(Node::Paragraph(_)));
			let ends_inline = matches!(item.children.last(), Some(Node::Paragraph(_)));
			if !starts_inline && !item.children.is_empty() {
				self.out.push('\n');
			}
			self.blocks(&item.children, true);
			if !ends_inline && !item.children.is_empty() {
				self.out.push('\n');
			}
		} else {
			self.out.push('\n');
			self.blocks(&item.children, false);
			self.out.push('\n');
		}

		self.out.push_str("</li>");
	}

	fn table(&mut self, rows: &[Node], align: &[AlignKind]) {
		self.out.push_str("<table>\n");

		for (index, row) in rows.iter().enumerate() {
			let Node::TableRow(row) = row else {
				continue;
			};
			let cell_tag = if index == 0 { "th" } else { "td" };

			if index == 0 {
				self.out.push_str("<thead>\n");
			} else if index == 1 {
				self.out.push_str("<tbody>\n");
			}

			self.out.push_str("<tr>\n");
			for (column, cell) in row.children.iter().enumerate() {
				let alignment = match align.get(column) {
					Some(AlignKind::Left) => " align=\"left\"",
					Some(AlignKind::Right) => " align=\"right\"",
					Some(AlignKind::Center) => " align=\"center\"",
					_ => "",
				};
				let _ = write!(self.out, "<{cell_tag}{alignment}>");
				if let Some(children) = cell.children() {
					self.inlines(children);
				}
				let _ = writeln!(self.out, "</{cell_tag}>");
			}
			self.out.push_str("</tr>\n");

			if index == 0 {
				self.out.push_str("</thead>\n");
			}
		}

		if rows.len() > 1 {
			self.out.push_str("</tbody>\n");
		}
		self.out.push_str("</table>");
	}

	fn inlines(&mut self, nodes: &[Node]) {
		for node in nodes {
			self.inline(node);
		}
	}

	fn inline(&mut self, node: &Node) {
		match node {
			Node::Text(text) => self.out.push_str(&escape(&text.value)),
			Node::Emphasis(emphasis) => self.wrap("em", &emphasis.children),
			Node::Strong(strong) => self.wrap("strong", &strong.children),
			Node::Delete(delete) => self.wrap("del", &delete.children),
			Node::InlineCode(code) => {
				let _ = write!(self.out, "<code>{}</code>", escape(&code.value));
			}
			Node::InlineMath(math) => {
				let _ = write!(
					self.out,
					"<code class=\"language-math math-inline\">{}</code>",
					escape(&math.value)
				);
			}
			Node::Break(_) => self.out.push_str("<br>\n"),
			Node::Html(html) => self.out.push_str(&html.value),
			Node::Link(link) => self.link(&link.url, link.title.as_deref(), &link.children),
			Node::Image(image) => self.image(&image.url, &image.alt, image.title.as_deref()),
			Node::LinkReference(reference) => {
				match self.definitions.get(&reference.identifier) {
					Some((url, title)) => {
						let (url, title) = (url.clone(), title.clone());
						self.link(&url, title.as_deref(), &reference.children);
					}
					None => {
						self.out.push('[');
						self.inlines(&reference.children);
						self.out.push(']');
					}
				}
			}
			Node::ImageReference(reference) => {
				match self.definitions.get(&reference.identifier) {
					Some((url, title)) => {
						let (url, title) = (url.clone(), title.clone());
						self.image(&url, &reference.alt, title.as_deref());
					}
					None => {
						let _ = write!(self.out, "![{}]", escape(&reference.alt));
					}
				}
			}
			Node::FootnoteReference(reference) => {
				let _ = write!(self.out, "<sup>{}</sup>", escape(&reference.identifier));
			}
			other => {
				if let Some(children) = other.children() {
					self.inlines(children);
				}
			}
		}
	}

	fn wrap(&mut self, tag: &str, children: &[Node]) {
		let _ = write!(self.out, "<{tag}>");
		self.inlines(children);
		let _ = write!(self.out, "</{tag}>");
	}

	fn link(&mut self, url: &str, title: Option<&str>, children: &[Node]) {
		let _ = write!(self.out, "<a href=\"{}\"", escape(url));
		if let Some(title) = title {
			let _ = write!(self.out, " title=\"{}\"", escape(title));
		}
		if is_external(url) {
			self.out.push_str(" target=\"_blank\"");
		}
		self.out.push('>');
		self.inlines(children);
		self.out.push_str("</a>");
	}

	fn image(&mut self, url: &str, alt: &str, title: Option<&str>) {
		let _ = write!(
			self.out,
			"<img src=\"{}\" alt=\"{}\"",
			escape(url),
			escape(alt)
		);
		if let Some(title) = title {
			let _ = write!(self.out, " title=\"{}\"", escape(title));
		}
		self.out.push('>');
	}
}

/// Nodes that produce no output at block level.
fn renders(node: &Node) -> bool {
	!matches!(
		node,
		Node::Definition(_) | Node::FootnoteDefinition(_) | Node::Yaml(_) | Node::Toml(_)
	)
}
