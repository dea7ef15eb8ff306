use std::collections::BTreeMap;

use markdown::mdast::Node;
use serde::Serialize;

use crate::CurriculumError;
use crate::CurriculumResult;
use crate::Document;
use crate::html::plain_text;
use crate::sections::SectionTag;
use crate::sections::section_tag;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Question {
	pub title: String,
	pub body: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub options: Option<Vec<String>>,
	pub solution: Solution,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SolutionValue {
	/// Zero-based index of the single correct option.
	Index(usize),
	/// Zero-based indices of every correct option.
	Indices(Vec<usize>),
	/// Expected free-text answer.
	Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Solution {
	pub required: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub multiline: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub value: Option<SolutionValue>,
	/// Any other `name: value` item, e.g. `validate`.
	#[serde(flatten)]
	pub extra: BTreeMap<String, String>,
}

impl Default for Solution {
	fn default() -> Self {
		Self {
			required: true,
			multiline: None,
			value: None,
			extra: BTreeMap::new(),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
	Body,
	Options,
	Solution,
}

struct Draft<'a> {
	title: String,
	body: Vec<Node>,
	options_heading: bool,
	options: Option<Vec<&'a [Node]>>,
	solution: Option<Vec<(String, String)>>,
	slot: Slot,
}

impl Draft<'_> {
	fn new(title: String) -> Self {
		Self {
			title,
			body: Vec::new(),
			options_heading: false,
			options: None,
			solution: None,
			slot: Slot::Body,
		}
	}
}

/// Parse the questions in `nodes`: one per depth-3 heading, each with an
/// optional `Options` list and a required `Solution` list. Nodes before the
/// first question are ignored.
pub fn parse_questions(document: &Document, nodes: &[Node]) -> CurriculumResult<Vec<Question>> {
	let mut drafts: Vec<Draft<'_>> = Vec::new();

	for node in nodes {
		if let Node::Heading(heading) = node {
			if heading.depth == 3 {
				drafts.push(Draft::new(plain_text(&heading.children).trim().to_string()));
				continue;
			}
		}

		let Some(current) = drafts.last_mut() else {
			continue;
		};

		match (section_tag(node), node) {
			(Some(SectionTag::Options), _) => {
				current.options_heading = true;
				current.slot = Slot::Options;
			}
			(Some(SectionTag::Solution), _) => {
				current.solution = Some(Vec::new());
				current.slot = Slot::Solution;
			}
			(_, Node::List(list))
				if current.slot == Slot::Options && list.ordered && current.options.is_none() =>
			{
				current.options = Some(
					list.children
						.iter()
						.filter_map(|item| item.children().map(Vec::as_slice))
						.collect(),
				);
			}
			(_, Node::List(list)) if current.slot == Slot::Solution && !list.ordered => {
				let items = current.solution.get_or_insert_with(Vec::new);
				items.extend(list.children.iter().filter_map(solution_item));
			}
			_ => current.body.push(node.clone()),
		}
	}

	drafts
		.into_iter()
		.map(|draft| finish(document, draft))
		.collect()
}

fn finish(document: &Document, draft: Draft<'_>) -> CurriculumResult<Question> {
	let fail = |reason: &str| {
		CurriculumError::Quiz {
			question: draft.title.clone(),
			reason: reason.to_string(),
		}
	};

	if draft.options_heading && draft.options.is_none() {
		return Err(fail("Missing options"));
	}

	let Some(items) = &draft.solution else {
		return Err(fail("Missing solution"));
	};

	let mut solution = Solution::default();
	for (name, value) in items {
		match name.as_str() {
			"required" => solution.required = value != "false",
			"multiline" => solution.multiline = Some(value != "false"),
			"value" => {
				solution.value = Some(match &draft.options {
					Some(options) => {
						option_indices(value, options.len()).ok_or_else(|| {
							fail(&format!("Invalid solution value \"{value}\""))
						})?
					}
					None => SolutionValue::Text(value.clone()),
				});
			}
			_ => {
				solution.extra.insert(name.clone(), value.clone());
			}
		}
	}

	if draft.options.is_some() && solution.value.is_none() {
		return Err(fail("Missing solution value"));
	}

	let options = draft.options.map(|options| {
		options
			.into_iter()
			.map(|option| document.render_tight(option).html)
			.collect()
	});

	Ok(Question {
		body: document.render(&draft.body).html,
		title: draft.title,
		options,
		solution,
	})
}

/// A solution item looks like `` `name`: value ``. The `validate` item keeps
/// its value in a code block below the name.
fn solution_item(item: &Node) -> Option<(String, String)> {
	let Node::ListItem(item) = item else {
		return None;
	};
	let Some(Node::Paragraph(first)) = item.children.first() else {
		return None;
	};
	let Some(Node::InlineCode(name)) = first.children.first() else {
		return None;
	};

	let value = if name.value == "validate" {
		item.children.get(1).map(|node| plain_text(std::slice::from_ref(node)))?
	} else {
		let rest = plain_text(&first.children[1..]);
		let rest = rest.trim();
		rest.strip_prefix(':').unwrap_or(rest).trim().to_string()
	};

	Some((name.value.clone(), value))
}

/// Convert a 1-based index or comma separated indices to 0-based. Every
/// index must point at one of the `count` options.
fn option_indices(value: &str, count: usize) -> Option<SolutionValue> {
	let indices = value
		.split(',')
		.map(|index| {
			index
				.trim()
				.parse::<usize>()
				.ok()
				.and_then(|index| index.checked_sub(1))
				.filter(|index| *index < count)
		})
		.collect::<Option<Vec<_>>>()?;

	match indices.as_slice() {
		[] => None,
		[index] => Some(SolutionValue::Index(*index)),
		_ => Some(SolutionValue::Indices(indices)),
	}
}
