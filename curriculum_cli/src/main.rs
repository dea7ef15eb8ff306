use std::path::Path;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;
use curriculum_cli::Commands;
use curriculum_cli::CurriculumCli;
use curriculum_core::AnyError;
use curriculum_core::AnyResult;
use curriculum_core::CachedThumbnails;
use curriculum_core::CurriculumConfig;
use curriculum_core::CurriculumError;
use curriculum_core::HttpThumbnails;
use curriculum_core::ParseOptions;
use curriculum_core::Taxonomy;
use curriculum_core::ThumbnailResolver;
use curriculum_core::load_learning_objectives;
use curriculum_core::parse_challenge;
use curriculum_core::parse_part;
use curriculum_core::parse_project;
use curriculum_core::parse_topic;
use curriculum_core::stamp;
use miette::Diagnostic;
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

fn main() {
	let args = CurriculumCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	init_tracing(args.verbose, use_color);

	let result: AnyResult<String> = tokio::runtime::Runtime::new()
		.map_err(AnyError::from)
		.and_then(|rt| rt.block_on(run(&args)));

	match result {
		Ok(json) => println!("{json}"),
		Err(error) => {
			report(error.as_ref(), use_color);
			process::exit(1);
		}
	}
}

/// Logs go to stderr so that stdout only ever holds the JSON output.
fn init_tracing(verbose: u8, use_color: bool) {
	let directive = match verbose {
		0 => "curriculum=warn",
		1 => "curriculum=debug",
		_ => "curriculum=trace",
	};
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(false)
		.init();
}

async fn run(args: &CurriculumCli) -> AnyResult<String> {
	let cwd = std::env::current_dir()?;
	let config = CurriculumConfig::load(&cwd)?.unwrap_or_default();
	let dir = absolute(args.command.dir()).await?;

	let options = Arc::new(parse_options(args, config).await?);
	tracing::debug!(dir = %dir.display(), "parsing");

	match &args.command {
		Commands::Project { .. } => {
			to_json(&stamp(parse_project(&dir, &options).await?, &dir, &options))
		}
		Commands::Topic { .. } => to_json(&stamp(parse_topic(&dir, &options).await?, &dir, &options)),
		Commands::Part { .. } => to_json(&stamp(parse_part(&dir, &options).await?, &dir, &options)),
		Commands::Challenge { .. } => {
			to_json(&stamp(parse_challenge(&dir, &options).await?, &dir, &options))
		}
		Commands::Objectives {
			validate, strict, ..
		} => {
			let objectives = load_learning_objectives(&dir, *validate || *strict, *strict).await?;
			to_json(&objectives)
		}
	}
}

/// Command line flags win over the config file.
async fn parse_options(args: &CurriculumCli, config: CurriculumConfig) -> AnyResult<ParseOptions> {
	let taxonomy = match args
		.learning_objectives
		.clone()
		.or(config.learning_objectives)
	{
		Some(lo) => Taxonomy::load(&lo).await?.map(Arc::new),
		None => None,
	};

	let thumbnails: Arc<dyn ThumbnailResolver> = if args.fetch_covers || config.fetch_covers {
		Arc::new(HttpThumbnails::default())
	} else {
		Arc::new(CachedThumbnails)
	};

	Ok(ParseOptions {
		repo: args.repo.clone().or(config.repo),
		version: args.content_version.clone().or(config.version),
		suffix: args.suffix.clone().or(config.suffix),
		taxonomy,
		thumbnails,
	})
}

/// Resolve `.` and relative paths so the directory name is always known.
async fn absolute(dir: &Path) -> Result<PathBuf, CurriculumError> {
	tokio::fs::canonicalize(dir)
		.await
		.map_err(|e| CurriculumError::from(e).with_path(dir))
}

fn to_json(value: &impl Serialize) -> AnyResult<String> {
	Ok(serde_json::to_string_pretty(value)?)
}

/// Print every leaf error on its own line, prefixed by its path.
fn report(error: &(dyn std::error::Error + 'static), use_color: bool) {
	let Some(error) = error.downcast_ref::<CurriculumError>() else {
		eprintln!("{} {error}", label("error:", use_color));
		return;
	};

	for (path, leaf) in error.leaves() {
		let message = match path {
			Some(path) => format!("{}: {leaf}", path.display()),
			None => leaf.to_string(),
		};
		eprintln!("{} {message}", label("error:", use_color));

		if let Some(help) = leaf.help() {
			eprintln!("  {} {help}", label("help:", use_color));
		}
	}
}

fn label(text: &str, use_color: bool) -> String {
	if use_color {
		format!("{}", text.red().bold())
	} else {
		text.to_string()
	}
}
