use serde::Serialize;

use crate::Part;
use crate::Unit;

/// Human readable duration: `45min`, `1.5h`, `2h`.
pub fn minutes_to_human(minutes: u64) -> String {
	if minutes < 60 {
		return format!("{minutes}min");
	}

	if minutes % 60 == 0 {
		return format!("{}h", minutes / 60);
	}

	let hours = format!("{:.1}", minutes as f64 / 60.0);
	let hours = hours.strip_suffix(".0").unwrap_or(&hours);
	format!("{hours}h")
}

/// Totals for a unit or topic. Durations are summed in `u64` so that many
/// long parts cannot overflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
	pub duration: u64,
	pub duration_string: String,
	pub part_count: usize,
	pub exercise_count: usize,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub unit_count: Option<usize>,
}

impl Stats {
	fn new(duration: u64, part_count: usize, exercise_count: usize, unit_count: Option<usize>) -> Self {
		Self {
			duration,
			duration_string: minutes_to_human(duration),
			part_count,
			exercise_count,
			unit_count,
		}
	}
}

pub fn unit_stats(parts: &[Part]) -> Stats {
	Stats::new(
		parts.iter().map(|part| u64::from(part.duration)).sum(),
		parts.len(),
		parts.iter().map(|part| part.exercises.len()).sum(),
		None,
	)
}

pub fn topic_stats(units: &[Unit]) -> Stats {
	Stats::new(
		units.iter().map(|unit| unit.stats.duration).sum(),
		units.iter().map(|unit| unit.stats.part_count).sum(),
		units.iter().map(|unit| unit.stats.exercise_count).sum(),
		Some(units.len()),
	)
}
