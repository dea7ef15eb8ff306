//! Normalizers for the controlled metadata vocabularies: durations, part
//! types and formats, tracks and challenge environments.
//!
//! Synonym tables are immutable statics handed to [`Vocabulary::normalize`],
//! so the same lookup is shared by every document kind and can be exercised
//! without touching the filesystem.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::CurriculumError;
use crate::CurriculumResult;
use crate::Meta;

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^(\d+(?:\.\d+)?)\s*(m|min|h)?$").expect("valid regex")
});

/// Parse a duration into whole minutes.
///
/// Accepts `<n>`, `<n>m`, `<n>min` and `<n>h` (decimal hours are rounded to
/// the nearest minute). Anything else, or a duration that does not fit in
/// `u32` minutes, yields `None`; callers decide whether that is fatal.
pub fn parse_duration(value: &str) -> Option<u32> {
	let captures = DURATION_RE.captures(value.trim())?;
	let amount: f64 = captures[1].parse().ok()?;
	let minutes = match captures.get(2).map(|unit| unit.as_str()) {
		Some("h") => amount * 60.0,
		_ => amount,
	};

	let minutes = minutes.round();
	if minutes > f64::from(u32::MAX) {
		return None;
	}

	Some(minutes as u32)
}

/// A canonical vocabulary value.
pub trait Term: Copy + PartialEq + 'static {
	fn as_str(self) -> &'static str;
}

/// A closed vocabulary: the canonical values plus every accepted spelling.
pub struct Vocabulary<T: Term> {
	pub canonical: &'static [T],
	pub synonyms: &'static [(&'static str, T)],
	unknown: fn(String, String) -> CurriculumError,
}

impl<T: Term> Vocabulary<T> {
	/// Look up a raw value, ignoring case and surrounding whitespace.
	pub fn lookup(&self, raw: &str) -> Option<T> {
		let key = raw.trim().to_lowercase();
		self.canonical
			.iter()
			.copied()
			.find(|term| term.as_str() == key)
			.or_else(|| {
				self.synonyms
					.iter()
					.find(|(synonym, _)| *synonym == key)
					.map(|(_, term)| *term)
			})
	}

	/// Like [`Vocabulary::lookup`], but an unknown value is an error naming the
	/// raw value and every canonical value.
	pub fn normalize(&self, raw: &str) -> CurriculumResult<T> {
		self.lookup(raw)
			.ok_or_else(|| (self.unknown)(raw.to_string(), self.expected()))
	}

	/// Comma separated list of canonical values, used in error messages.
	pub fn expected(&self) -> String {
		self.canonical
			.iter()
			.map(|term| term.as_str())
			.collect::<Vec<_>>()
			.join(", ")
	}
}

macro_rules! terms {
	($(#[$meta:meta])* $name:ident { $($variant:ident => $value:literal),+ $(,)? }) => {
		$(#[$meta])*
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
		pub enum $name {
			$(#[serde(rename = $value)] $variant,)+
		}

		impl Term for $name {
			fn as_str(self) -> &'static str {
				match self {
					$(Self::$variant => $value,)+
				}
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str(self.as_str())
			}
		}
	};
}

terms!(
	/// What kind of session a part is.
	PartType {
		Read => "read",
		Seminar => "seminar",
		Workshop => "workshop",
		Quiz => "quiz",
		Practice => "practice",
	}
);

terms!(
	/// How a part is delivered.
	PartFormat {
		Guided => "guided",
		SelfPaced => "self-paced",
	}
);

terms!(
	Track {
		WebDev => "web-dev",
		Ux => "ux",
		Data => "data",
	}
);

terms!(
	/// Runtime a challenge is evaluated in.
	ChallengeEnv {
		Cjs => "cjs",
		Dom => "dom",
		Form => "form",
	}
);

pub static PART_TYPES: Vocabulary<PartType> = Vocabulary {
	canonical: &[
		PartType::Read,
		PartType::Seminar,
		PartType::Workshop,
		PartType::Quiz,
		PartType::Practice,
	],
	synonyms: &[
		("lectura", PartType::Read),
		("leitura", PartType::Read),
		("reading", PartType::Read),
		("seminario", PartType::Seminar),
		("seminário", PartType::Seminar),
		("taller", PartType::Workshop),
		("oficina", PartType::Workshop),
		("cuestionario", PartType::Quiz),
		("questionário", PartType::Quiz),
		("questionario", PartType::Quiz),
		("práctica", PartType::Practice),
		("practica", PartType::Practice),
		("prática", PartType::Practice),
		("pratica", PartType::Practice),
		("ejercicios", PartType::Practice),
		("exercícios", PartType::Practice),
	],
	unknown: |value, expected| CurriculumError::UnknownPartType { value, expected },
};

pub static PART_FORMATS: Vocabulary<PartFormat> = Vocabulary {
	canonical: &[PartFormat::Guided, PartFormat::SelfPaced],
	synonyms: &[
		("guiado", PartFormat::Guided),
		("presencial", PartFormat::Guided),
		("self paced", PartFormat::SelfPaced),
		("selfpaced", PartFormat::SelfPaced),
		("autoaprendizaje", PartFormat::SelfPaced),
		("autoaprendizagem", PartFormat::SelfPaced),
		("individual", PartFormat::SelfPaced),
	],
	unknown: |value, expected| CurriculumError::UnknownPartFormat { value, expected },
};

pub static TRACKS: Vocabulary<Track> = Vocabulary {
	canonical: &[Track::WebDev, Track::Ux, Track::Data],
	synonyms: &[],
	unknown: |value, expected| CurriculumError::InvalidTrack { value, expected },
};

pub static CHALLENGE_ENVS: Vocabulary<ChallengeEnv> = Vocabulary {
	canonical: &[ChallengeEnv::Cjs, ChallengeEnv::Dom, ChallengeEnv::Form],
	synonyms: &[],
	unknown: |value, expected| CurriculumError::UnknownChallengeEnv { value, expected },
};

/// A metadata value as a string: strings are trimmed, numbers and booleans
/// are formatted, anything else is ignored.
pub fn meta_str(meta: &Meta, key: &str) -> Option<String> {
	match meta.get(key)? {
		Value::String(value) => Some(value.trim().to_string()),
		Value::Number(value) => Some(value.to_string()),
		Value::Bool(value) => Some(value.to_string()),
		_ => None,
	}
}

/// Read the required `duration` field as minutes.
pub fn meta_duration(meta: &Meta) -> CurriculumResult<u32> {
	let raw = meta_str(meta, "duration").ok_or(CurriculumError::MissingField("duration"))?;
	parse_duration(&raw).ok_or(CurriculumError::InvalidDuration(raw))
}

/// The primary track of an entity and every track it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tracks {
	pub track: Track,
	pub tracks: Vec<Track>,
}

/// Validate `track` (required) and `tracks` (defaults to `[track]`).
pub fn parse_tracks(meta: &Meta) -> CurriculumResult<Tracks> {
	let track = match meta_str(meta, "track") {
		Some(raw) => TRACKS.normalize(&raw)?,
		None => {
			return Err(CurriculumError::MissingTrack {
				expected: TRACKS.expected(),
			});
		}
	};

	let tracks = match meta.get("tracks") {
		None | Some(Value::Null) => vec![track],
		Some(Value::Array(values)) => {
			values
				.iter()
				.map(|value| {
					TRACKS.normalize(&value.as_str().map_or_else(|| value.to_string(), str::to_string))
				})
				.collect::<CurriculumResult<Vec<_>>>()?
		}
		Some(Value::String(value)) => {
			value
				.split(',')
				.map(str::trim)
				.filter(|value| !value.is_empty())
				.map(|value| TRACKS.normalize(value))
				.collect::<CurriculumResult<Vec<_>>>()?
		}
		Some(other) => {
			return Err(CurriculumError::InvalidTrack {
				value: other.to_string(),
				expected: TRACKS.expected(),
			});
		}
	};

	if tracks.is_empty() {
		return Err(CurriculumError::NoTracks);
	}

	Ok(Tracks { track, tracks })
}

/// Like [`parse_tracks`] for entities that may inherit their track: absent
/// `track` and `tracks` keys yield `None`.
pub fn parse_optional_tracks(meta: &Meta) -> CurriculumResult<Option<Tracks>> {
	if meta.contains_key("track") || meta.contains_key("tracks") {
		parse_tracks(meta).map(Some)
	} else {
		Ok(None)
	}
}
