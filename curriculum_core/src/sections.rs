//! Heading-driven sections.
//!
//! Every heading is classified once against [`SECTION_RULES`], an ordered
//! table of `(depths, pattern, tag)` rows. The first matching row wins.

use std::sync::LazyLock;

use markdown::mdast::Heading;
use markdown::mdast::Node;
use regex::Regex;

use crate::html::plain_text;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionTag {
	Summary,
	Syllabus,
	Questions,
	Options,
	Solution,
	LearningObjectives,
}

pub struct SectionRule {
	pub depths: &'static [u8],
	pub pattern: Regex,
	pub tag: SectionTag,
}

fn rule(depths: &'static [u8], pattern: &str, tag: SectionTag) -> SectionRule {
	SectionRule {
		depths,
		pattern: Regex::new(pattern).expect("valid regex"),
		tag,
	}
}

pub static SECTION_RULES: LazyLock<Vec<SectionRule>> = LazyLock::new(|| {
	vec![
		rule(&[2], r"^Syllabus$", SectionTag::Syllabus),
		rule(
			&[2],
			r"(?i)(objetivos de aprendizaje|objetivos de aprendizagem|learning objectives)",
			SectionTag::LearningObjectives,
		),
		rule(&[2], r"(?i)(preguntas|perguntas|questions)", SectionTag::Questions),
		rule(&[4], r"(?i)^(opciones|opções|opcoes|options)$", SectionTag::Options),
		rule(
			&[4],
			r"(?i)^(solución|solucion|solução|solucao|solution)$",
			SectionTag::Solution,
		),
		rule(
			&[2, 3, 4, 5, 6],
			r"(?i)\b(resumen|resumo|summary)\b",
			SectionTag::Summary,
		),
	]
});

/// The section a heading opens, if any.
pub fn classify(heading: &Heading) -> Option<SectionTag> {
	let text = plain_text(&heading.children);
	let text = text.trim();

	SECTION_RULES
		.iter()
		.find(|rule| rule.depths.contains(&heading.depth) && rule.pattern.is_match(text))
		.map(|rule| rule.tag)
}

/// Tag of `node` when it is a heading that opens a section.
pub fn section_tag(node: &Node) -> Option<SectionTag> {
	match node {
		Node::Heading(heading) => classify(heading),
		_ => None,
	}
}

/// Index of the first heading opening `tag`.
pub fn find_section(nodes: &[Node], tag: SectionTag) -> Option<usize> {
	nodes.iter().position(|node| section_tag(node) == Some(tag))
}

/// The nodes under the first heading opening `tag`, up to the next heading
/// of the same or a shallower depth.
pub fn section(nodes: &[Node], tag: SectionTag) -> Option<&[Node]> {
	let start = find_section(nodes, tag)?;
	let Node::Heading(heading) = &nodes[start] else {
		return None;
	};

	let rest = &nodes[start + 1..];
	let end = rest
		.iter()
		.position(|node| matches!(node, Node::Heading(next) if next.depth <= heading.depth))
		.unwrap_or(rest.len());

	Some(&rest[..end])
}
