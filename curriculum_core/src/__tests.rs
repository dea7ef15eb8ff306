use std::collections::BTreeMap;
use std::sync::Arc;

use rstest::rstest;
use similar_asserts::assert_eq;
use tracing_test::traced_test;

use super::__fixtures::*;
use super::*;
use crate::fold::ensure_unique_slugs;
use crate::sections::SectionTag;
use crate::sections::section;
use crate::unit::parse_linked_unit;

// --- Vocabulary ---

#[rstest]
#[case::bare("30", Some(30))]
#[case::minutes_short("30m", Some(30))]
#[case::minutes("45min", Some(45))]
#[case::spaced("45 min", Some(45))]
#[case::hours("1h", Some(60))]
#[case::decimal_hours("2.5h", Some(150))]
#[case::rounded_hours("1.33h", Some(80))]
#[case::words("abc", None)]
#[case::seconds("10s", None)]
#[case::empty("", None)]
#[case::largest("4294967295", Some(u32::MAX))]
#[case::too_many_hours("50000000h", None)]
#[case::too_many_minutes("4294967296min", None)]
fn parse_durations(#[case] input: &str, #[case] expected: Option<u32>) {
	assert_eq!(parse_duration(input), expected);
}

#[rstest]
#[case::canonical("read", PartType::Read)]
#[case::spanish("Lectura", PartType::Read)]
#[case::portuguese("oficina", PartType::Workshop)]
#[case::padded("  quiz ", PartType::Quiz)]
#[case::accented("práctica", PartType::Practice)]
fn normalize_part_types(#[case] input: &str, #[case] expected: PartType) -> CurriculumResult<()> {
	assert_eq!(PART_TYPES.normalize(input)?, expected);
	Ok(())
}

#[test]
fn unknown_part_type_lists_valid_values() {
	let error = PART_TYPES.normalize("foo").unwrap_err();
	assert_eq!(
		error.to_string(),
		"Unknown part type \"foo\". Expected one of: read, seminar, workshop, quiz, practice"
	);
}

#[test]
fn unknown_part_format_lists_valid_values() {
	let error = PART_FORMATS.normalize("remote").unwrap_err();
	assert_eq!(
		error.to_string(),
		"Unknown part format \"remote\". Expected one of: guided, self-paced"
	);
	assert_eq!(PART_FORMATS.lookup("Self Paced"), Some(PartFormat::SelfPaced));
}

fn meta(pairs: &[(&str, serde_json::Value)]) -> Meta {
	pairs
		.iter()
		.map(|(key, value)| ((*key).to_string(), value.clone()))
		.collect()
}

#[test]
fn tracks_default_to_the_primary_track() -> CurriculumResult<()> {
	let tracks = parse_tracks(&meta(&[("track", "ux".into())]))?;
	assert_eq!(tracks.track, Track::Ux);
	assert_eq!(tracks.tracks, vec![Track::Ux]);

	let tracks = parse_tracks(&meta(&[
		("track", "web-dev".into()),
		("tracks", serde_json::json!(["web-dev", "data"])),
	]))?;
	assert_eq!(tracks.tracks, vec![Track::WebDev, Track::Data]);

	Ok(())
}

#[test]
fn invalid_tracks_are_rejected() {
	let error = parse_tracks(&Meta::new()).unwrap_err();
	assert!(matches!(error, CurriculumError::MissingTrack { .. }));

	let error = parse_tracks(&meta(&[("track", "design".into())])).unwrap_err();
	assert_eq!(
		error.to_string(),
		"Invalid track \"design\". Expected one of: web-dev, ux, data"
	);

	let error = parse_tracks(&meta(&[
		("track", "ux".into()),
		("tracks", serde_json::json!([])),
	]))
	.unwrap_err();
	assert!(matches!(error, CurriculumError::NoTracks));
}

#[test]
fn optional_tracks_are_absent_without_keys() -> CurriculumResult<()> {
	assert_eq!(parse_optional_tracks(&Meta::new())?, None);
	Ok(())
}

#[rstest]
#[case(0, "0min")]
#[case(45, "45min")]
#[case(60, "1h")]
#[case(90, "1.5h")]
#[case(100, "1.7h")]
#[case(120, "2h")]
fn human_durations(#[case] minutes: u64, #[case] expected: &str) {
	assert_eq!(minutes_to_human(minutes), expected);
}

#[test]
fn oversized_duration_is_invalid() {
	let error = meta_duration(&meta(&[("duration", "50000000h".into())])).unwrap_err();
	assert!(matches!(error, CurriculumError::InvalidDuration(ref raw) if raw == "50000000h"));
}

fn part_lasting(duration: u32) -> Part {
	Part {
		slug: "long".to_string(),
		prefix: None,
		order: None,
		tracks: None,
		r#type: PartType::Read,
		format: PartFormat::SelfPaced,
		duration,
		duration_string: minutes_to_human(u64::from(duration)),
		intl: Intl::new(),
		exercises: Vec::new(),
		challenges: Vec::new(),
	}
}

#[test]
fn stats_totals_do_not_overflow() {
	let stats = unit_stats(&[part_lasting(u32::MAX), part_lasting(u32::MAX)]);
	assert_eq!(stats.duration, 2 * u64::from(u32::MAX));
	assert_eq!(stats.part_count, 2);
}

// --- Directory names ---

#[rstest]
#[case::prefixed("01-foo", Some("01"), "foo")]
#[case::unprefixed("foo", None, "foo")]
#[case::hyphenated("12-foo-bar-2", Some("12"), "foo-bar-2")]
#[case::nested("topics/03-intro", Some("03"), "intro")]
fn parse_dirnames(
	#[case] input: &str,
	#[case] prefix: Option<&str>,
	#[case] slug: &str,
) -> CurriculumResult<()> {
	let dirname = parse_dirname(input)?;
	assert_eq!(dirname.prefix.as_deref(), prefix);
	assert_eq!(dirname.slug, slug);

	Ok(())
}

#[test]
fn dirname_errors_are_distinguishable() {
	let error = parse_dirname("Foo").unwrap_err();
	assert!(matches!(error, CurriculumError::DirnameNotLowercase(ref name) if name == "Foo"));

	let error = parse_dirname("foo ()").unwrap_err();
	assert!(matches!(error, CurriculumError::DirnameCharset(ref name) if name == "foo ()"));
}

#[test]
fn prefixed_names_sort_by_prefix() {
	let mut names = vec!["10-b", "foo", "02-a", "01-c"];
	names.sort_by(|a, b| compare_prefixed(a, b));
	assert_eq!(names, vec!["01-c", "02-a", "10-b", "foo"]);
}

// --- Document parser ---

#[test]
fn title_only_document() -> CurriculumResult<()> {
	let parsed = parse_document("# Foo", DocumentKind::Part.aliases())?;
	assert_eq!(
		parsed,
		ParsedDocument {
			title: "Foo".to_string(),
			body: None,
			meta: None,
			embeds: Vec::new(),
		}
	);

	Ok(())
}

#[rstest]
#[case::empty("")]
#[case::whitespace("  \n\n ")]
fn empty_document_is_an_empty_file_error(#[case] input: &str) {
	let error = parse_document(input, DocumentKind::Part.aliases()).unwrap_err();
	assert!(matches!(error, CurriculumError::EmptyFile(_)));
}

#[test]
fn misplaced_title_names_the_observed_node() {
	let error = parse_document("## Foo", DocumentKind::Part.aliases()).unwrap_err();
	assert_eq!(
		error.to_string(),
		"Expected README.md to start with h1 and instead saw heading (depth: 2)"
	);

	let error = parse_document("Hello", DocumentKind::Part.aliases()).unwrap_err();
	assert!(matches!(error, CurriculumError::MissingTitle { ref observed } if observed == "paragraph"));

	let error = parse_document("# Hello *world*", DocumentKind::Part.aliases()).unwrap_err();
	assert!(matches!(error, CurriculumError::InvalidTitle { ref observed } if observed == "emphasis"));
}

#[test]
fn metadata_keys_are_aliased() -> CurriculumResult<()> {
	let input = "# Foo\n\n* Tipo: Taller\n* formato: `guided`\n* duración: 1h\n* color: red\n\n---\n\nBody.\n";
	let parsed = parse_document(input, DocumentKind::Part.aliases())?;

	assert_eq!(
		parsed.meta,
		Some(meta(&[
			("type", "Taller".into()),
			("format", "guided".into()),
			("duration", "1h".into()),
		]))
	);
	assert_eq!(parsed.body.as_deref(), Some("<p>Body.</p>"));

	Ok(())
}

#[test]
fn list_without_section_break_is_body() -> CurriculumResult<()> {
	let input = "# Foo\n\n* a: b\n\nParagraph.\n";
	let parsed = parse_document(input, DocumentKind::Part.aliases())?;

	assert_eq!(parsed.meta, None);
	assert_eq!(
		parsed.body.as_deref(),
		Some("<ul>\n<li>a: b</li>\n</ul>\n<p>Paragraph.</p>")
	);

	Ok(())
}

#[test]
fn section_break_trimming_is_idempotent() -> CurriculumResult<()> {
	let input = "# Foo\n\n---\n\nText with **bold**.\n\n---\n";
	let first = parse_document(input, DocumentKind::Part.aliases())?;
	let body = first.body.clone().unwrap_or_default();
	assert_eq!(body, "<p>Text with <strong>bold</strong>.</p>");

	let second = parse_document(&format!("# Foo\n\n{body}\n"), DocumentKind::Part.aliases())?;
	assert_eq!(second.body, first.body);

	Ok(())
}

#[test]
fn renders_markdown_structures() -> CurriculumResult<()> {
	let input = "# Foo\n\n## Steps\n\n1. one\n2. `two`\n\n```js\nconst a = 1;\n```\n\n| a | b |\n| :- | -: |\n| 1 | 2 |\n";
	let parsed = parse_document(input, DocumentKind::Part.aliases())?;

	insta::assert_snapshot!(parsed.body.unwrap_or_default(), @r#"
	<h2>Steps</h2>
	<ol>
	<li>one</li>
	<li><code>two</code></li>
	</ol>
	<pre><code class="language-js">const a = 1;
	</code></pre>
	<table>
	<thead>
	<tr>
	<th align="left">a</th>
	<th align="right">b</th>
	</tr>
	</thead>
	<tbody>
	<tr>
	<td align="left">1</td>
	<td align="right">2</td>
	</tr>
	</tbody>
	</table>
	"#);

	Ok(())
}

#[test]
fn external_links_open_in_a_new_tab() -> CurriculumResult<()> {
	let input = "# Foo\n\nSee [docs](https://example.com/docs) and [local](../bar).\n";
	let parsed = parse_document(input, DocumentKind::Part.aliases())?;

	assert_eq!(
		parsed.body.as_deref(),
		Some(
			"<p>See <a href=\"https://example.com/docs\" target=\"_blank\">docs</a> and <a \
			 href=\"../bar\">local</a>.</p>"
		)
	);
	assert!(parsed.embeds.is_empty());

	Ok(())
}

// --- Embeds ---

#[rstest]
#[case::youtube_long(
	"https://www.youtube.com/watch?v=KxK3VV7K7EE",
	Provider::Youtube,
	EmbedType::Video,
	"KxK3VV7K7EE",
	"src=\"https://www.youtube.com/embed/KxK3VV7K7EE?autoplay=0\""
)]
#[case::youtube_short(
	"https://youtu.be/KxK3VV7K7EE",
	Provider::Youtube,
	EmbedType::Video,
	"KxK3VV7K7EE",
	"src=\"https://www.youtube.com/embed/KxK3VV7K7EE?autoplay=0\""
)]
#[case::vimeo(
	"https://vimeo.com/264525335?autoplay=1",
	Provider::Vimeo,
	EmbedType::Video,
	"264525335",
	"src=\"https://player.vimeo.com/video/264525335?title=0&byline=0&portrait=0&autoplay=1\""
)]
#[case::wistia(
	"https://laboratoria.wistia.com/medias/e6t0uv3dgd",
	Provider::Wistia,
	EmbedType::Video,
	"e6t0uv3dgd",
	"src=\"https://fast.wistia.net/embed/iframe/e6t0uv3dgd\""
)]
#[case::loom(
	"https://www.loom.com/share/5f1b0b7b0d6c4c5f",
	Provider::Loom,
	EmbedType::Video,
	"5f1b0b7b0d6c4c5f",
	"src=\"https://www.useloom.com/embed/5f1b0b7b0d6c4c5f\""
)]
#[case::typeform(
	"https://laboratoria.typeform.com/to/Xy12Ab",
	Provider::Typeform,
	EmbedType::Form,
	"Xy12Ab",
	"src=\"https://laboratoria.typeform.com/to/Xy12Ab\""
)]
#[case::soundcloud(
	"https://api.soundcloud.com/tracks/293",
	Provider::Soundcloud,
	EmbedType::Audio,
	"293",
	"src=\"https://w.soundcloud.com/player/?url=https%3A//api.soundcloud.com/tracks/293\""
)]
#[case::google_slides(
	"https://docs.google.com/presentation/d/e/2PACX-1vQ/pub?start=false",
	Provider::GoogleSlides,
	EmbedType::Slides,
	"2PACX-1vQ",
	"src=\"https://docs.google.com/presentation/d/e/2PACX-1vQ\""
)]
fn provider_links_become_embeds(
	#[case] href: &str,
	#[case] provider: Provider,
	#[case] r#type: EmbedType,
	#[case] id: &str,
	#[case] src: &str,
) {
	let Some((embed, html)) = embed_for(href) else {
		panic!("expected {href} to be embedded");
	};

	assert_eq!(
		embed,
		Embed {
			r#type,
			provider,
			href: href.to_string(),
			id: id.to_string(),
		}
	);
	assert!(html.contains(src), "{html}");
	assert!(html.contains("<iframe "));
}

#[rstest]
#[case::vimeo_private("https://vimeo.com/503607618/7619450015")]
#[case::unsupported_host("https://www.dailymotion.com/video/x7tgad0")]
#[case::youtube_channel("https://www.youtube.com/c/laboratoria")]
#[case::relative("../01-intro")]
#[case::mailto("mailto:hola@example.com")]
fn other_links_are_not_embedded(#[case] href: &str) {
	assert_eq!(embed_for(href), None);
}

#[test]
fn vimeo_iframe_attributes() {
	let Some((_, html)) = embed_for("https://vimeo.com/264525335") else {
		panic!("expected vimeo embed");
	};

	insta::assert_snapshot!(html, @r#"<div class="iframe-container"><iframe width="640" height="360" src="https://player.vimeo.com/video/264525335?title=0&byline=0&portrait=0" frameBorder="0" scrolling="no" allowfullscreen="true" mozallowfullscreen="true" webkitallowfullscreen="true"></iframe></div>"#);
}

#[test]
fn typeform_is_not_contained() {
	let Some((_, html)) = embed_for("https://laboratoria.typeform.com/to/Xy12Ab") else {
		panic!("expected typeform embed");
	};

	assert!(html.starts_with("<iframe width=\"100%\" height=\"100%\""));
	assert!(!html.contains("iframe-container"));
}

#[test]
fn embeds_replace_whole_paragraphs() -> CurriculumResult<()> {
	let input = "# Video\n\n[Watch](https://youtu.be/KxK3VV7K7EE)\n\nAnd [a private one](https://vimeo.com/503607618/7619450015).\n";
	let parsed = parse_document(input, DocumentKind::Part.aliases())?;
	let body = parsed.body.unwrap_or_default();

	assert!(body.starts_with("<div class=\"iframe-container\"><iframe"), "{body}");
	assert!(!body.starts_with("<p>"));
	assert!(body.contains(
		"<a href=\"https://vimeo.com/503607618/7619450015\" target=\"_blank\">a private one</a>"
	));
	assert_eq!(parsed.embeds.len(), 1);
	assert_eq!(parsed.embeds[0].provider, Provider::Youtube);

	Ok(())
}

// --- Sections and quizzes ---

#[test]
fn sections_end_at_the_next_heading_of_the_same_depth() -> CurriculumResult<()> {
	let document = Document::parse(
		"# Topic\n\n## Syllabus\n\n### [A](01-a)\n\nText\n\n## Other\n\nMore\n",
		DocumentKind::Topic.aliases(),
	)?;
	let Some(nodes) = section(&document.body, SectionTag::Syllabus) else {
		panic!("expected a syllabus section");
	};
	assert_eq!(nodes.len(), 2);

	Ok(())
}

#[test]
fn parses_quiz_questions() -> CurriculumResult<()> {
	let document = Document::parse(QUIZ_PART, DocumentKind::Part.aliases())?;
	let questions = parse_questions(&document, &document.body)?;

	assert_eq!(questions.len(), 2);

	assert_eq!(questions[0].title, "First question");
	assert_eq!(questions[0].body, "<p>What is 1 + 1?</p>");
	assert_eq!(
		questions[0].options,
		Some(vec!["one".to_string(), "two".to_string()])
	);
	assert_eq!(questions[0].solution.value, Some(SolutionValue::Index(1)));
	assert!(questions[0].solution.required);

	assert_eq!(questions[1].options, None);
	assert!(!questions[1].solution.required);
	assert_eq!(questions[1].solution.multiline, Some(true));
	assert_eq!(questions[1].solution.value, None);

	Ok(())
}

#[test]
fn multiple_correct_options_become_indices() -> CurriculumResult<()> {
	let input = "# Quiz\n\n### Pick\n\n#### Opciones\n\n1. a\n2. b\n3. c\n\n#### Solución\n\n* `value`: 1, 3\n";
	let document = Document::parse(input, DocumentKind::Part.aliases())?;
	let questions = parse_questions(&document, &document.body)?;

	assert_eq!(
		questions[0].solution.value,
		Some(SolutionValue::Indices(vec![0, 2]))
	);

	Ok(())
}

#[rstest]
#[case::missing_solution("### Q\n\nBody\n", "Missing solution in question \"Q\"")]
#[case::missing_options(
	"### Q\n\n#### Options\n\nnot a list\n\n#### Solution\n\n* `value`: 1\n",
	"Missing options in question \"Q\""
)]
#[case::missing_value(
	"### Q\n\n#### Options\n\n1. a\n2. b\n\n#### Solution\n\n* `required`: true\n",
	"Missing solution value in question \"Q\""
)]
#[case::index_past_options(
	"### Q\n\n#### Options\n\n1. a\n2. b\n\n#### Solution\n\n* `value`: 3\n",
	"Invalid solution value \"3\" in question \"Q\""
)]
#[case::one_of_many_past_options(
	"### Q\n\n#### Options\n\n1. a\n2. b\n\n#### Solution\n\n* `value`: 1, 5\n",
	"Invalid solution value \"1, 5\" in question \"Q\""
)]
fn invalid_questions(#[case] questions: &str, #[case] expected: &str) -> CurriculumResult<()> {
	let document = Document::parse(&format!("# Quiz\n\n{questions}"), DocumentKind::Part.aliases())?;
	let error = parse_questions(&document, &document.body).unwrap_err();
	assert_eq!(error.to_string(), expected);

	Ok(())
}

// --- Learning objectives ---

fn taxonomy() -> Taxonomy {
	Taxonomy::parse(TAXONOMY).unwrap_or_else(|e| panic!("taxonomy: {e}"))
}

#[test]
fn flattens_taxonomy_in_document_order() {
	assert_eq!(
		taxonomy().flatten(),
		vec![
			"html",
			"html/semantics",
			"html/forms",
			"css",
			"css/selectors",
			"css/layout",
			"css/layout/flexbox",
			"css/layout/grid",
		]
	);
}

#[test]
fn unknown_objectives_are_reported_together() {
	let refs = vec![
		LearningObjectiveRef::new("html/semantics"),
		LearningObjectiveRef::new("css/unknown"),
		LearningObjectiveRef::new("js/missing"),
	];
	let error = resolve_objectives(refs, Some(&taxonomy())).unwrap_err();

	assert_eq!(
		error.to_string(),
		"Unknown learning objectives: css/unknown, js/missing."
	);
}

#[test]
fn branch_objectives_expand_to_leaves() -> CurriculumResult<()> {
	let refs = vec![
		LearningObjectiveRef {
			optional: true,
			..LearningObjectiveRef::new("css/layout")
		},
		LearningObjectiveRef::new("css/layout/grid"),
		LearningObjectiveRef::new("html/semantics"),
		LearningObjectiveRef::new("html/semantics"),
	];
	let resolved = resolve_objectives(refs, Some(&taxonomy()))?;

	assert_eq!(
		resolved,
		vec![
			LearningObjectiveRef {
				optional: true,
				..LearningObjectiveRef::new("css/layout/flexbox")
			},
			LearningObjectiveRef::new("css/layout/grid"),
			LearningObjectiveRef::new("html/semantics"),
		]
	);

	Ok(())
}

#[test]
fn objectives_pass_through_without_taxonomy() -> CurriculumResult<()> {
	let refs = vec![LearningObjectiveRef::new("anything/goes")];
	assert_eq!(resolve_objectives(refs.clone(), None)?, refs);

	Ok(())
}

#[test]
fn objective_refs_accept_strings_and_maps() {
	let refs: Vec<LearningObjectiveRef> =
		serde_yaml_ng::from_str("- html/forms\n- id: css/layout\n  exclude: true\n")
			.unwrap_or_else(|e| panic!("yaml: {e}"));

	assert_eq!(refs[0], LearningObjectiveRef::new("html/forms"));
	assert!(refs[1].exclude);
	assert_eq!(
		serde_json::to_value(&refs).unwrap_or_else(|e| panic!("json: {e}")),
		serde_json::json!(["html/forms", { "id": "css/layout", "exclude": true }])
	);
}

fn objectives_tree(pt: &str) -> tempfile::TempDir {
	let es = "html:\n  title: HTML\nhtml/semantics:\n  title: Semántica\nhtml/forms:\n  title: \
	          Formularios\ncss:\n  title: CSS\ncss/selectors:\n  title: Selectores\ncss/layout:\n  \
	          title: Layout\ncss/layout/flexbox:\n  title: Flexbox\ncss/layout/grid:\n  title: Grid\n";
	tree(&[
		("data.yml", TAXONOMY),
		("intl/es.yml", es),
		("intl/pt.yml", pt),
	])
}

const PT_WITHOUT_GRID: &str = "html:\n  title: HTML\nhtml/semantics:\n  title: Semântica\nhtml/forms:\n  \
                               title: Formulários\ncss:\n  title: CSS\ncss/selectors:\n  title: \
                               Seletores\ncss/layout:\n  title: Layout\ncss/layout/flexbox:\n  \
                               title: Flexbox\n";

#[tokio::test]
async fn loads_learning_objectives_table() -> CurriculumResult<()> {
	let tmp = objectives_tree(PT_WITHOUT_GRID);
	let objectives = load_learning_objectives(tmp.path(), false, false).await?;

	assert_eq!(objectives.flat.len(), 8);
	assert_eq!(objectives.table[0].key, "html");
	assert_eq!(
		objectives.table[0].titles,
		BTreeMap::from([
			(Lang::Es, Some("HTML".to_string())),
			(Lang::Pt, Some("HTML".to_string())),
		])
	);
	assert_eq!(objectives.table[7].titles[&Lang::Pt], None);

	Ok(())
}

#[tokio::test]
async fn validation_reports_missing_translations() {
	let tmp = objectives_tree(PT_WITHOUT_GRID);
	let error = load_learning_objectives(tmp.path(), true, false)
		.await
		.unwrap_err();
	let message = error.to_string();

	assert!(message.contains("==> 1 learning objectives missing from at least one intl yml:"));
	assert!(message.contains("* css/layout/grid missing in langs: pt"));
	assert!(message.contains("==> 0 learning objectives without title:"));
}

#[tokio::test]
async fn strict_validation_only_counts_objectives_missing_everywhere() -> CurriculumResult<()> {
	let tmp = objectives_tree(PT_WITHOUT_GRID);
	load_learning_objectives(tmp.path(), true, true).await?;

	Ok(())
}

// --- Locales ---

#[tokio::test]
async fn detects_langs_in_order() -> CurriculumResult<()> {
	let tmp = tree(&[("README.pt.md", "# Oi\n"), ("README.md", "# Hola\n")]);
	assert_eq!(detect_langs(tmp.path()).await?, vec![Lang::Es, Lang::Pt]);

	Ok(())
}

#[tokio::test]
async fn rejects_unsupported_langs() {
	let tmp = tree(&[("README.md", "# Hola\n"), ("README.en.md", "# Hi\n")]);
	let error = detect_langs(tmp.path()).await.unwrap_err();
	assert_eq!(error.to_string(), "Unsupported lang: en");

	let empty = tree(&[("index.js", "")]);
	let error = detect_langs(empty.path()).await.unwrap_err();
	assert!(matches!(error, CurriculumError::NoLangsDetected));
}

#[tokio::test]
async fn metadata_must_match_across_langs() {
	let tmp = tree(&[
		(
			"01-values/README.md",
			"# Valores\n\n* type: read\n* format: guided\n* duration: 30\n\n---\n",
		),
		(
			"01-values/README.pt.md",
			"# Valores\n\n* type: read\n* format: guided\n* duration: 45\n\n---\n",
		),
	]);
	let dir = tmp.path().join("01-values");
	let error = parse_part(&dir, &options()).await.unwrap_err();

	assert_eq!(error.path(), Some(dir.as_path()));
	assert_eq!(error.inner().to_string(), "Metadata mismatch between es and pt readmes");
}

#[tokio::test]
async fn sidecar_metadata_is_used_without_inline_block() -> CurriculumResult<()> {
	let tmp = tree(&[
		("01-values/README.md", "# Valores\n\nBody.\n"),
		(
			"01-values/part.yml",
			"type: seminario\nformat: guided\nduration: 20\n",
		),
	]);
	let part = parse_part(&tmp.path().join("01-values"), &options()).await?;

	assert_eq!(part.r#type, PartType::Seminar);
	assert_eq!(part.duration, 20);
	assert_eq!(part.duration_string, "20min");

	Ok(())
}

#[tokio::test]
async fn empty_readme_is_reported_with_its_path() {
	let tmp = tree(&[("01-values/README.md", "  \n")]);
	let dir = tmp.path().join("01-values");
	let error = parse_part(&dir, &options()).await.unwrap_err();
	let readme = dir.join("README.md");

	assert_eq!(error.path(), Some(readme.as_path()));
	assert_eq!(
		error.inner().to_string(),
		format!("{} is empty", readme.display())
	);
}

// --- Entities ---

#[tokio::test]
async fn part_with_unknown_type_fails() {
	let tmp = tree(&[(
		"01-values/README.md",
		"# Values\n\n* type: foo\n* format: guided\n* duration: 30\n\n---\n",
	)]);
	let dir = tmp.path().join("01-values");
	let error = parse_part(&dir, &options()).await.unwrap_err();

	assert_eq!(error.path(), Some(dir.as_path()));
	assert!(
		error
			.to_string()
			.starts_with("Unknown part type \"foo\". Expected one of:")
	);
}

#[tokio::test]
async fn part_requires_a_valid_duration() {
	let tmp = tree(&[(
		"01-values/README.md",
		"# Values\n\n* type: read\n* format: guided\n* duration: soon\n\n---\n",
	)]);
	let error = parse_part(&tmp.path().join("01-values"), &options())
		.await
		.unwrap_err();

	assert_eq!(error.inner().to_string(), "Failed parsing duration \"soon\"");
}

#[tokio::test]
async fn parses_part_challenges() -> CurriculumResult<()> {
	let tmp = tree(&[
		("01-practice/README.md", PRACTICE_PART),
		(
			"01-practice/challenges/01-form/README.md",
			"# Form\n\n* env: form\n\n---\n\nIntro text.\n\n## Preguntas\n\n### Name?\n\nWrite \
			 your name.\n\n#### Solution\n\n* `required`: true\n",
		),
		(
			"01-practice/challenges/02-code/README.md",
			"# Code\n\n* entorno: cjs\n\n---\n\nWrite a function.\n",
		),
		("01-practice/challenges/02-code/index.js", "module.exports = {};\n"),
	]);
	let part = parse_part(&tmp.path().join("01-practice"), &options()).await?;

	assert!(part.exercises.is_empty());
	assert_eq!(part.challenges.len(), 2);

	let form = &part.challenges[0];
	assert_eq!(form.slug, "form");
	assert_eq!(form.order, Some(1));
	assert_eq!(form.env, ChallengeEnv::Form);
	assert_eq!(form.intl[&Lang::Es].body.as_deref(), Some("<p>Intro text.</p>"));
	assert_eq!(
		form.intl[&Lang::Es]
			.questions
			.as_ref()
			.map(|questions| questions[0].title.as_str()),
		Some("Name?")
	);

	let code = &part.challenges[1];
	assert_eq!(code.env, ChallengeEnv::Cjs);
	assert_eq!(code.intl[&Lang::Es].questions, None);
	assert_eq!(
		code.files.keys().collect::<Vec<_>>(),
		vec!["index.js"]
	);

	Ok(())
}

#[tokio::test]
async fn unknown_challenge_env_fails() {
	let tmp = tree(&[("01-py/README.md", "# Py\n\n* env: python\n\n---\n")]);
	let error = parse_challenge(&tmp.path().join("01-py"), &ParseOptions::default())
		.await
		.unwrap_err();

	assert_eq!(
		error.inner().to_string(),
		"Unknown challenge env \"python\". Expected one of: cjs, dom, form"
	);
}

#[tokio::test]
async fn exercise_files_are_decoded_lossily() -> CurriculumResult<()> {
	let tmp = tree(&[("01-sum/README.md", "# Sum\n")]);
	std::fs::write(tmp.path().join("01-sum/data.bin"), [0x66, 0x6f, 0xff])
		.unwrap_or_else(|e| panic!("write: {e}"));
	let exercise = parse_exercise(&tmp.path().join("01-sum"), &ParseOptions::default()).await?;

	assert_eq!(exercise.files["data.bin"], "fo\u{fffd}");
	assert!(!exercise.files.contains_key("README.md"));

	Ok(())
}

#[tokio::test]
async fn parses_topic_tree() -> CurriculumResult<()> {
	let tmp = topic_tree();
	let topic = parse_topic(&tmp.path().join("javascript"), &options()).await?;

	assert_eq!(topic.slug, "javascript");
	assert_eq!(topic.tracks.track, Track::WebDev);
	assert_eq!(topic.tracks.tracks, vec![Track::WebDev, Track::Data]);
	assert_eq!(
		topic.intl[&Lang::Es].summary,
		"<p>Learn the basics of the language.</p>"
	);
	assert_eq!(topic.intl[&Lang::Pt].title, "JavaScript");

	let slugs: Vec<_> = topic.units.iter().map(|unit| unit.slug.as_str()).collect();
	assert_eq!(slugs, vec!["variables", "functions"]);
	assert_eq!(topic.units[0].order, Some(1));
	assert_eq!(topic.units[1].order, Some(2));

	let variables = &topic.units[0];
	assert_eq!(variables.intl[&Lang::Es].title, "Variables");
	assert_eq!(variables.intl[&Lang::Pt].title, "Variáveis");
	assert_eq!(variables.parts.len(), 2);
	assert_eq!(variables.parts[0].r#type, PartType::Read);
	assert_eq!(
		variables.parts[0].intl[&Lang::Es].body.as_deref(),
		Some("<p>Read <a href=\"https://developer.mozilla.org\" target=\"_blank\">the docs</a>.</p>")
	);
	assert_eq!(variables.parts[1].format, PartFormat::Guided);
	assert_eq!(variables.parts[1].duration, 60);

	let exercise = &variables.parts[1].exercises[0];
	assert_eq!(exercise.slug, "sum");
	assert_eq!(exercise.order, Some(1));
	assert_eq!(
		exercise.files.keys().collect::<Vec<_>>(),
		vec!["index.js", "test/index.spec.js"]
	);

	let functions = &topic.units[1];
	assert_eq!(functions.intl[&Lang::Es].title, "Functions");
	assert_eq!(functions.intl[&Lang::Pt].title, "Funções");
	let quiz = &functions.parts[0];
	assert_eq!(quiz.r#type, PartType::Quiz);
	assert_eq!(quiz.intl[&Lang::Es].body.as_deref(), Some("<p>Answer the questions.</p>"));
	assert_eq!(quiz.intl[&Lang::Es].questions.as_ref().map(Vec::len), Some(2));

	assert_eq!(topic.stats.duration, 105);
	assert_eq!(topic.stats.part_count, 3);
	assert_eq!(topic.stats.exercise_count, 1);
	assert_eq!(topic.stats.unit_count, Some(2));
	assert_eq!(variables.stats.duration_string, "1.5h");

	Ok(())
}

#[tokio::test]
async fn parsing_twice_is_deterministic() -> CurriculumResult<()> {
	let tmp = topic_tree();
	let dir = tmp.path().join("javascript");

	let first = serde_json::to_string(&parse_topic(&dir, &options()).await?)
		.unwrap_or_else(|e| panic!("json: {e}"));
	let second = serde_json::to_string(&parse_topic(&dir, &options()).await?)
		.unwrap_or_else(|e| panic!("json: {e}"));
	assert_eq!(first, second);

	Ok(())
}

#[tokio::test]
async fn topic_requires_syllabus() {
	let tmp = tree(&[(
		"javascript/README.md",
		"# JavaScript\n\n* track: web-dev\n\n---\n\n## Contenido\n",
	)]);
	let error = parse_topic(&tmp.path().join("javascript"), &options())
		.await
		.unwrap_err();

	assert_eq!(
		error.inner().to_string(),
		"Main topic README must contain Syllabus heading"
	);
}

#[tokio::test]
async fn duplicate_unit_slugs_are_reported_once() {
	let tmp = tree(&[(
		"javascript/README.md",
		"# JavaScript\n\n* track: web-dev\n\n---\n\n## Syllabus\n\n### [Intro](01-intro)\n\n### [Intro \
		 again](02-intro)\n",
	)]);
	mkdir(tmp.path(), "javascript/01-intro");
	mkdir(tmp.path(), "javascript/02-intro");
	let dir = tmp.path().join("javascript");

	let error = parse_topic(&dir, &options()).await.unwrap_err();

	assert_eq!(error.path(), Some(dir.as_path()));
	assert_eq!(error.inner().to_string(), "Duplicate unit slugs found");
	assert_eq!(error.errors().len(), 1);
	assert_eq!(error.errors()[0].to_string(), "Duplicate unit slug: intro");
}

#[test]
fn duplicate_slugs_are_all_listed() {
	let error = ensure_unique_slugs("part", ["a", "b", "a", "b", "c", "a"]).unwrap_err();
	let messages: Vec<String> = error.errors().iter().map(ToString::to_string).collect();
	assert_eq!(
		messages,
		vec!["Duplicate part slug: a", "Duplicate part slug: b"]
	);
}

#[tokio::test]
async fn failing_parts_are_aggregated() {
	let tmp = tree(&[
		("01-unit/README.md", "# Unit\n"),
		(
			"01-unit/01-a/README.md",
			"# A\n\n* type: foo\n* format: guided\n* duration: 30\n\n---\n",
		),
		("01-unit/03-c/README.md", READ_PART),
	]);
	let b = mkdir(tmp.path(), "01-unit/02-b");
	let dir = tmp.path().join("01-unit");

	let error = parse_unit(&dir, &options()).await.unwrap_err();
	assert_eq!(error.inner().to_string(), "Failed parsing parts");

	let leaves = error.leaves();
	assert_eq!(leaves.len(), 2);
	assert_eq!(leaves[0].0, Some(dir.join("01-a").as_path()));
	assert!(matches!(leaves[0].1, CurriculumError::UnknownPartType { .. }));
	assert_eq!(leaves[1].0, Some(b.as_path()));
	assert!(matches!(leaves[1].1, CurriculumError::NoLangsDetected));
}

#[tokio::test]
async fn part_reports_failing_exercises_and_challenges_together() {
	let tmp = tree(&[
		("01-practice/README.md", PRACTICE_PART),
		("01-practice/01-ex/README.md", ""),
		(
			"01-practice/challenges/01-py/README.md",
			"# Py\n\n* env: python\n\n---\n",
		),
	]);
	let dir = tmp.path().join("01-practice");

	let error = parse_part(&dir, &options()).await.unwrap_err();
	assert_eq!(error.inner().to_string(), "Failed parsing part children");

	let leaves = error.leaves();
	assert_eq!(leaves.len(), 2);
	assert!(matches!(leaves[0].1, CurriculumError::EmptyFile(_)));
	assert_eq!(leaves[1].0, Some(dir.join("challenges/01-py").as_path()));
	assert!(matches!(
		leaves[1].1,
		CurriculumError::UnknownChallengeEnv { value, .. } if value == "python"
	));
}

#[tokio::test]
async fn part_reports_duplicate_exercise_and_challenge_slugs_together() {
	let tmp = tree(&[
		("01-practice/README.md", PRACTICE_PART),
		("01-practice/01-sum/README.md", "# Sum\n"),
		("01-practice/02-sum/README.md", "# Sum again\n"),
		(
			"01-practice/challenges/01-form/README.md",
			"# Form\n\n* env: cjs\n\n---\n",
		),
		(
			"01-practice/challenges/02-form/README.md",
			"# Form again\n\n* env: cjs\n\n---\n",
		),
	]);

	let error = parse_part(&tmp.path().join("01-practice"), &options())
		.await
		.unwrap_err();
	let messages: Vec<String> = error
		.leaves()
		.into_iter()
		.map(|(_, leaf)| leaf.to_string())
		.collect();

	assert_eq!(
		messages,
		vec!["Duplicate exercise slug: sum", "Duplicate challenge slug: form"]
	);
}

#[tokio::test]
#[traced_test]
async fn unit_title_mismatch_is_logged() -> CurriculumResult<()> {
	let tmp = tree(&[("01-variables/README.md", "# Variables y constantes\n")]);
	let titles: Intl<String> = [(Lang::Es, "Variables".to_string())].into_iter().collect();

	let unit = parse_linked_unit(&tmp.path().join("01-variables"), &options(), Some(titles)).await?;

	assert_eq!(unit.intl[&Lang::Es].title, "Variables y constantes");
	assert!(logs_contain("unit title differs from its syllabus link"));

	Ok(())
}

#[tokio::test]
async fn standalone_unit_requires_a_readme() {
	let tmp = tree(&[]);
	let dir = mkdir(tmp.path(), "01-unit");
	let error = parse_unit(&dir, &options()).await.unwrap_err();

	assert_eq!(error.path(), Some(dir.as_path()));
	assert!(matches!(error.inner(), CurriculumError::NoLangsDetected));
}

const PROJECT_FILE_YAML: &str = "learningObjectives:
  - html/semantics
  - id: css/layout
    optional: true
variants:
  - slug: lite
    learningObjectives:
      - css/selectors
";

#[tokio::test]
async fn parses_project_with_objectives() -> CurriculumResult<()> {
	let tmp = tree(&[
		("01-cipher/README.md", PROJECT_README),
		("01-cipher/project.yml", PROJECT_FILE_YAML),
	]);
	let options = ParseOptions {
		suffix: Some("v2".to_string()),
		taxonomy: Some(Arc::new(taxonomy())),
		..ParseOptions::default()
	};
	let project = parse_project(&tmp.path().join("01-cipher"), &options).await?;

	assert_eq!(project.slug, "cipher-v2");
	assert_eq!(project.prefix.as_deref(), Some("01"));
	assert_eq!(
		project.intl[&Lang::Es].summary,
		"<p>Encrypt messages with the Caesar cipher.</p>"
	);
	assert_eq!(
		project.learning_objectives,
		Some(vec![
			LearningObjectiveRef::new("html/semantics"),
			LearningObjectiveRef {
				optional: true,
				..LearningObjectiveRef::new("css/layout/flexbox")
			},
			LearningObjectiveRef {
				optional: true,
				..LearningObjectiveRef::new("css/layout/grid")
			},
		])
	);
	assert_eq!(
		project.variants,
		Some(vec![Variant {
			slug: "lite".to_string(),
			learning_objectives: vec![LearningObjectiveRef::new("css/selectors")],
		}])
	);

	Ok(())
}

#[tokio::test]
async fn project_with_unknown_objectives_fails() {
	let tmp = tree(&[
		("01-cipher/README.md", PROJECT_README),
		(
			"01-cipher/project.yml",
			"learningObjectives:\n  - html/semantics\n  - js/closures\n  - js/async\n",
		),
	]);
	let options = ParseOptions {
		taxonomy: Some(Arc::new(taxonomy())),
		..ParseOptions::default()
	};
	let dir = tmp.path().join("01-cipher");
	let error = parse_project(&dir, &options).await.unwrap_err();
	let project_file = dir.join("project.yml");

	assert_eq!(error.path(), Some(project_file.as_path()));
	assert_eq!(
		error.inner().to_string(),
		"Unknown learning objectives: js/closures, js/async."
	);
}

#[tokio::test]
async fn cover_and_cached_thumbnail_are_resolved() -> CurriculumResult<()> {
	let tmp = tree(&[
		(
			"01-cipher/README.md",
			"# Cipher\n\n* track: data\n\n---\n\n![cover](https://example.com/cover.png)\n",
		),
		("01-cipher/thumb.png", "png"),
	]);
	let project = parse_project(&tmp.path().join("01-cipher"), &ParseOptions::default()).await?;

	assert_eq!(project.cover.as_deref(), Some("https://example.com/cover.png"));
	assert_eq!(project.thumb.as_deref(), Some(THUMB_FILE));
	assert_eq!(project.intl[&Lang::Es].summary, "");

	Ok(())
}

#[tokio::test]
async fn http_thumbnails_use_the_cache_first() -> CurriculumResult<()> {
	let tmp = tree(&[("thumb.png", "png")]);
	let thumb = HttpThumbnails::default()
		.resolve(tmp.path(), Some("https://example.invalid/cover.png"))
		.await?;
	assert_eq!(thumb.as_deref(), Some(THUMB_FILE));

	let empty = tree(&[]);
	let thumb = HttpThumbnails::default().resolve(empty.path(), None).await?;
	assert_eq!(thumb, None);

	Ok(())
}

// --- Stamping and config ---

#[test]
fn stamps_provenance() {
	let options = ParseOptions {
		repo: Some("Laboratoria/bootcamp".to_string()),
		version: Some("5.0.0".to_string()),
		..ParseOptions::default()
	};
	let entity = DirName {
		prefix: None,
		slug: "intro".to_string(),
	};
	let value = serde_json::to_value(stamp(entity, std::path::Path::new("topics/intro"), &options))
		.unwrap_or_else(|e| panic!("json: {e}"));

	assert_eq!(value["repo"], "Laboratoria/bootcamp");
	assert_eq!(value["version"], "5.0.0");
	assert_eq!(value["path"], "topics/intro");
	assert_eq!(value["parserVersion"], PARSER_VERSION);
	assert_eq!(value["slug"], "intro");
	assert!(value["createdAt"].is_string());
}

#[test]
fn loads_config_with_precedence() -> CurriculumResult<()> {
	let tmp = tree(&[
		(
			"curriculum.toml",
			"repo = \"Laboratoria/bootcamp\"\nlearning_objectives = \"learning-objectives\"\n",
		),
		(".config/curriculum.toml", "repo = \"ignored\"\n"),
	]);
	let config = CurriculumConfig::load(tmp.path())?.unwrap_or_default();

	assert_eq!(config.repo.as_deref(), Some("Laboratoria/bootcamp"));
	assert_eq!(
		config.learning_objectives,
		Some(tmp.path().join("learning-objectives"))
	);
	assert!(!config.fetch_covers);

	Ok(())
}

#[test]
fn config_rejects_unknown_fields() {
	let tmp = tree(&[(".curriculum.toml", "colour = \"red\"\n")]);
	let error = CurriculumConfig::load(tmp.path()).unwrap_err();
	assert!(matches!(error.inner(), CurriculumError::ConfigParse(_)));

	let empty = tree(&[]);
	assert_eq!(CurriculumConfig::load(empty.path()).ok().flatten(), None);
}
