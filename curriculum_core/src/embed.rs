//! Rewriting of links to known media providers into inline embeds.
//!
//! Every provider is a pure rule `&Url -> Option<Matched>`; the rules are
//! tried in declaration order and the first match wins. [`embed_links`]
//! rebuilds a node list with matching links swapped for raw HTML nodes and
//! returns the side-channel [`Embed`] records.

use markdown::mdast::Html;
use markdown::mdast::Node;
use serde::Serialize;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedType {
	Video,
	Audio,
	Form,
	Slides,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provider {
	Youtube,
	Vimeo,
	Wistia,
	Loom,
	Typeform,
	Soundcloud,
	GoogleSlides,
}

/// A link that was rewritten into embed markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Embed {
	#[serde(rename = "type")]
	pub r#type: EmbedType,
	pub provider: Provider,
	pub href: String,
	pub id: String,
}

struct Matched {
	id: String,
	src: String,
}

struct Rule {
	provider: Provider,
	r#type: EmbedType,
	matches: fn(&Url) -> Option<Matched>,
	attributes: &'static [(&'static str, &'static str)],
	/// Wrap the iframe in a responsive `iframe-container` div.
	contained: bool,
}

const VIDEO_SIZE: [(&str, &str); 2] = [("width", "640"), ("height", "360")];

static RULES: &[Rule] = &[
	Rule {
		provider: Provider::Youtube,
		r#type: EmbedType::Video,
		matches: youtube,
		attributes: &[
			VIDEO_SIZE[0],
			VIDEO_SIZE[1],
			("frameBorder", "0"),
			("gesture", "media"),
			("allow", "encrypted-media"),
			("allowfullscreen", "true"),
		],
		contained: true,
	},
	Rule {
		provider: Provider::Vimeo,
		r#type: EmbedType::Video,
		matches: vimeo,
		attributes: &[
			VIDEO_SIZE[0],
			VIDEO_SIZE[1],
			("frameBorder", "0"),
			("scrolling", "no"),
			("allowfullscreen", "true"),
			("mozallowfullscreen", "true"),
			("webkitallowfullscreen", "true"),
		],
		contained: true,
	},
	Rule {
		provider: Provider::Wistia,
		r#type: EmbedType::Video,
		matches: wistia,
		attributes: &[
			VIDEO_SIZE[0],
			VIDEO_SIZE[1],
			("frameBorder", "0"),
			("scrolling", "no"),
			("class", "wistia_embed"),
			("allowfullscreen", "true"),
		],
		contained: true,
	},
	Rule {
		provider: Provider::Loom,
		r#type: EmbedType::Video,
		matches: loom,
		attributes: &[
			VIDEO_SIZE[0],
			VIDEO_SIZE[1],
			("frameBorder", "0"),
			("webkitallowfullscreen", "true"),
			("mozallowfullscreen", "true"),
			("allowfullscreen", "true"),
		],
		contained: true,
	},
	Rule {
		provider: Provider::Typeform,
		r#type: EmbedType::Form,
		matches: typeform,
		attributes: &[
			("width", "100%"),
			("height", "100%"),
			("frameBorder", "0"),
			("style", "height: 100vh"),
		],
		contained: false,
	},
	Rule {
		provider: Provider::Soundcloud,
		r#type: EmbedType::Audio,
		matches: soundcloud,
		attributes: &[
			("width", "640"),
			("height", "180"),
			("scrolling", "no"),
			("frameBorder", "0"),
			("allow", "autoplay"),
		],
		contained: true,
	},
	Rule {
		provider: Provider::GoogleSlides,
		r#type: EmbedType::Slides,
		matches: google_slides,
		attributes: &[
			VIDEO_SIZE[0],
			VIDEO_SIZE[1],
			("frameBorder", "0"),
			("allowfullscreen", "true"),
			("mozallowfullscreen", "true"),
			("webkitallowfullscreen", "true"),
		],
		contained: true,
	},
];

/// Match `href` against the provider rules and build the embed record plus
/// its markup. Relative and unsupported links yield `None`.
pub fn embed_for(href: &str) -> Option<(Embed, String)> {
	let url = Url::parse(href).ok()?;
	if !matches!(url.scheme(), "http" | "https") {
		return None;
	}

	RULES.iter().find_map(|rule| {
		let matched = (rule.matches)(&url)?;
		let html = iframe(rule, &matched.src);
		let embed = Embed {
			r#type: rule.r#type,
			provider: rule.provider,
			href: href.to_string(),
			id: matched.id,
		};

		Some((embed, html))
	})
}

/// Rebuild `nodes`, replacing every embeddable link with an HTML node. A
/// paragraph holding nothing but one embeddable link is replaced as a whole
/// so the iframe is not nested inside `<p>`.
pub(crate) fn embed_links(nodes: Vec<Node>) -> (Vec<Node>, Vec<Embed>) {
	let mut embeds = Vec::new();
	let nodes = nodes
		.into_iter()
		.map(|node| rebuild(node, &mut embeds))
		.collect();

	(nodes, embeds)
}

fn rebuild(node: Node, embeds: &mut Vec<Embed>) -> Node {
	match node {
		Node::Link(link) => {
			if let Some((embed, value)) = embed_for(&link.url) {
				embeds.push(embed);
				return Node::Html(Html {
					value,
					position: link.position,
				});
			}

			let mut link = link;
			link.children = rebuild_all(link.children, embeds);
			Node::Link(link)
		}
		Node::Paragraph(mut paragraph) => {
			if let Some(Node::Link(link)) = sole_child(&paragraph.children) {
				if let Some((embed, value)) = embed_for(&link.url) {
					embeds.push(embed);
					return Node::Html(Html {
						value,
						position: paragraph.position,
					});
				}
			}

			paragraph.children = rebuild_all(paragraph.children, embeds);
			Node::Paragraph(paragraph)
		}
		mut other => {
			if let Some(children) = other.children_mut() {
				let taken = std::mem::take(children);
				*children = rebuild_all(taken, embeds);
			}
			other
		}
	}
}

fn rebuild_all(nodes: Vec<Node>, embeds: &mut Vec<Embed>) -> Vec<Node> {
	nodes
		.into_iter()
		.map(|node| rebuild(node, embeds))
		.collect()
}

/// The only child that is not whitespace text.
fn sole_child(children: &[Node]) -> Option<&Node> {
	let mut meaningful = children
		.iter()
		.filter(|child| !matches!(child, Node::Text(text) if text.value.trim().is_empty()));
	let first = meaningful.next()?;
	meaningful.next().is_none().then_some(first)
}

fn iframe(rule: &Rule, src: &str) -> String {
	let mut attributes = Vec::with_capacity(rule.attributes.len() + 1);
	let mut src_written = false;

	for (name, value) in rule.attributes {
		attributes.push(format!("{name}=\"{value}\""));
		// `src` goes right after the size attributes.
		if *name == "height" && !src_written {
			attributes.push(format!("src=\"{src}\""));
			src_written = true;
		}
	}

	if !src_written {
		attributes.push(format!("src=\"{src}\""));
	}

	let iframe = format!("<iframe {}></iframe>", attributes.join(" "));
	if rule.contained {
		format!("<div class=\"iframe-container\">{iframe}</div>")
	} else {
		iframe
	}
}

fn segments(url: &Url) -> Vec<&str> {
	url.path_segments()
		.map(|segments| segments.filter(|segment| !segment.is_empty()).collect())
		.unwrap_or_default()
}

fn query_pairs(url: &Url) -> Vec<(String, String)> {
	url.query_pairs()
		.map(|(key, value)| (key.into_owned(), value.into_owned()))
		.collect()
}

/// Set `key` keeping its original position when it already exists.
fn assign(pairs: &mut Vec<(String, String)>, key: &str, value: &str) {
	match pairs.iter_mut().find(|(existing, _)| existing == key) {
		Some(pair) => value.clone_into(&mut pair.1),
		None => pairs.push((key.to_string(), value.to_string())),
	}
}

fn encode(pairs: &[(String, String)]) -> String {
	url::form_urlencoded::Serializer::new(String::new())
		.extend_pairs(pairs)
		.finish()
}

fn host(url: &Url) -> &str {
	url.host_str().unwrap_or_default()
}

fn youtube(url: &Url) -> Option<Matched> {
	let mut pairs = query_pairs(url);
	let id = match host(url) {
		"youtu.be" => segments(url).first()?.to_string(),
		"www.youtube.com" | "youtube.com" | "m.youtube.com" if url.path() == "/watch" => {
			let index = pairs
				.iter()
				.position(|(key, value)| key == "v" && !value.is_empty())?;
			pairs.remove(index).1
		}
		_ => return None,
	};

	assign(&mut pairs, "autoplay", "0");
	Some(Matched {
		src: format!("https://www.youtube.com/embed/{id}?{}", encode(&pairs)),
		id,
	})
}

fn vimeo(url: &Url) -> Option<Matched> {
	if !matches!(host(url), "vimeo.com" | "www.vimeo.com") {
		return None;
	}

	// Private links look like `/id/hash` and cannot be embedded by id.
	let [id] = segments(url)[..] else {
		return None;
	};

	let mut pairs = vec![
		("title".to_string(), "0".to_string()),
		("byline".to_string(), "0".to_string()),
		("portrait".to_string(), "0".to_string()),
	];
	for (key, value) in query_pairs(url) {
		assign(&mut pairs, &key, &value);
	}

	Some(Matched {
		src: format!("https://player.vimeo.com/video/{id}?{}", encode(&pairs)),
		id: id.to_string(),
	})
}

fn wistia(url: &Url) -> Option<Matched> {
	let host = host(url);
	if host != "wistia.com" && !host.ends_with(".wistia.com") {
		return None;
	}

	let ["medias", id] = segments(url)[..] else {
		return None;
	};

	Some(Matched {
		src: format!("https://fast.wistia.net/embed/iframe/{id}"),
		id: id.to_string(),
	})
}

fn loom(url: &Url) -> Option<Matched> {
	if !matches!(
		host(url),
		"loom.com" | "www.loom.com" | "useloom.com" | "www.useloom.com"
	) {
		return None;
	}

	let ["share", id] = segments(url)[..] else {
		return None;
	};

	Some(Matched {
		src: format!("https://www.useloom.com/embed/{id}"),
		id: id.to_string(),
	})
}

fn typeform(url: &Url) -> Option<Matched> {
	if !host(url).ends_with(".typeform.com") {
		return None;
	}

	let ["to", id, ..] = segments(url)[..] else {
		return None;
	};

	Some(Matched {
		src: url.as_str().to_string(),
		id: id.to_string(),
	})
}

fn soundcloud(url: &Url) -> Option<Matched> {
	if host(url) != "api.soundcloud.com" {
		return None;
	}

	let ["tracks", id] = segments(url)[..] else {
		return None;
	};

	Some(Matched {
		src: format!("https://w.soundcloud.com/player/?url=https%3A//api.soundcloud.com/tracks/{id}"),
		id: id.to_string(),
	})
}

fn google_slides(url: &Url) -> Option<Matched> {
	if host(url) != "docs.google.com" {
		return None;
	}

	let ["presentation", "d", "e", id, ..] = segments(url)[..] else {
		return None;
	};

	Some(Matched {
		src: format!("https://docs.google.com/presentation/d/e/{id}"),
		id: id.to_string(),
	})
}
