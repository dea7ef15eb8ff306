//! `curriculum_core` turns a directory tree of markdown readmes into a
//! validated content tree: projects, topics, units, parts, exercises and
//! challenges, each with its localized titles and bodies.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Directory
//!   → Directory-name parser (`NN-slug` → prefix + slug)
//!   → Locale detection (README.md, README.pt.md, ...)
//!   → Document parser (title, metadata block, body → HTML + embeds)
//!   → Locale aggregator (one payload per language, metadata reconciled)
//!   → Tree assembler (children parsed concurrently, folded in prefix order)
//! ```
//!
//! ## Modules
//!
//! - [`parser`] splits a readme into its title, metadata and body.
//! - [`embed`] rewrites links to known media providers into iframes.
//! - [`locale`] parses every language variant of a readme together.
//! - [`vocabulary`] normalizes durations, part types, formats and tracks.
//! - [`objectives`] loads the learning objective taxonomy and resolves
//!   project references against it.
//! - [`config`] loads `curriculum.toml`.
//!
//! ## Errors
//!
//! Every failure is a [`CurriculumError`]. Composite entities never stop at
//! the first failing child: all children are parsed and their errors are
//! gathered in one [`CurriculumError::Aggregate`]. Use
//! [`CurriculumError::leaves`] to list the individual problems with their
//! paths.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use curriculum_core::ParseOptions;
//! use curriculum_core::parse_topic;
//!
//! # async fn run() -> curriculum_core::CurriculumResult<()> {
//! let options = Arc::new(ParseOptions::default());
//! let topic = parse_topic(Path::new("topics/javascript"), &options).await?;
//! println!("{} units", topic.units.len());
//! # Ok(())
//! # }
//! ```

pub use challenge::*;
pub use config::*;
pub use dirname::*;
pub use embed::*;
pub use error::*;
pub use exercise::*;
pub use locale::*;
pub use objectives::*;
pub use options::*;
pub use parser::*;
pub use part::*;
pub use project::*;
pub use quiz::*;
pub use stats::*;
pub use thumbnail::*;
pub use topic::*;
pub use unit::*;
pub use vocabulary::*;

mod challenge;
pub mod config;
mod dirname;
pub mod embed;
#[allow(unused_assignments)]
mod error;
mod exercise;
pub(crate) mod fold;
pub(crate) mod fs;
pub(crate) mod html;
pub mod locale;
pub mod objectives;
mod options;
pub mod parser;
mod part;
mod project;
mod quiz;
pub mod sections;
mod stats;
mod thumbnail;
mod topic;
mod unit;
pub mod vocabulary;

#[cfg(test)]
mod __fixtures;
#[cfg(test)]
mod __tests;
