use std::path::Path;
use std::path::PathBuf;

use clap::ArgAction;
use clap::Parser;
use clap::Subcommand;

#[derive(Debug, Parser)]
#[command(
	author,
	about = "Parse curriculum readmes into JSON content trees.",
	long_about = "curriculum-parser reads a directory of markdown readmes (one per language) and \
	              prints the validated content tree as JSON.\n\nQuick start:\n  curriculum-parser \
	              topic topics/javascript\n  curriculum-parser project projects/01-cipher\n  \
	              curriculum-parser objectives learning-objectives --validate"
)]
pub struct CurriculumCli {
	#[command(subcommand)]
	pub command: Commands,

	/// Repository the content lives in, e.g. `Laboratoria/bootcamp`.
	#[arg(long, global = true)]
	pub repo: Option<String>,

	/// Version of the content being parsed.
	#[arg(long = "version", global = true, value_name = "VERSION")]
	pub content_version: Option<String>,

	/// Directory holding the learning objective taxonomy (`data.yml`).
	#[arg(long = "lo", global = true, value_name = "DIR")]
	pub learning_objectives: Option<PathBuf>,

	/// Appended to project slugs.
	#[arg(long, global = true)]
	pub suffix: Option<String>,

	/// Download missing cover thumbnails.
	#[arg(long, global = true, default_value_t = false)]
	pub fetch_covers: bool,

	/// Increase log verbosity (`-v` debug, `-vv` trace).
	#[arg(long, short, global = true, action = ArgAction::Count)]
	pub verbose: u8,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
	/// Parse a project directory.
	Project {
		/// The project directory, e.g. `projects/01-cipher`.
		dir: PathBuf,
	},
	/// Parse a topic together with every unit linked from its syllabus.
	Topic {
		/// The topic directory, e.g. `topics/javascript`.
		dir: PathBuf,
	},
	/// Parse a single part with its exercises and challenges.
	Part {
		dir: PathBuf,
	},
	/// Parse a single challenge.
	Challenge {
		dir: PathBuf,
	},
	/// Load the learning objective taxonomy and its translations.
	Objectives {
		dir: PathBuf,

		/// Fail when an objective is missing from a translation or has no
		/// title.
		#[arg(long, default_value_t = false)]
		validate: bool,

		/// Only report objectives missing from every translation. Implies
		/// `--validate`.
		#[arg(long, default_value_t = false)]
		strict: bool,
	},
}

impl Commands {
	/// The directory the command operates on.
	pub fn dir(&self) -> &Path {
		match self {
			Self::Project { dir }
			| Self::Topic { dir }
			| Self::Part { dir }
			| Self::Challenge { dir }
			| Self::Objectives { dir, .. } => dir,
		}
	}
}
