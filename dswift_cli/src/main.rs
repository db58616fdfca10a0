use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use dswift_cli::Commands;
use dswift_cli::DswiftCli;
use dswift_cli::OutputFormat;
use dswift_cli::logging::init_logging;
use dswift_cli::runner::SwiftRunner;
use dswift_core::AnyEmptyResult;
use dswift_core::AnyResult;
use dswift_core::DswiftError;
use dswift_core::DswiftResult;
use dswift_core::GeneratedOutput;
use dswift_core::ProjectContext;
use dswift_core::Services;
use dswift_core::compile;
use dswift_core::compile_template;
use dswift_core::expand_template;
use dswift_core::generate;
use dswift_core::needs_regeneration;
use dswift_core::write_text;
use owo_colors::OwoColorize;
use serde::Serialize;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = DswiftCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	if let Err(e) = init_logging(&args, use_color) {
		eprintln!("{} {e}", colored!("warning:", yellow));
	}

	let result = match &args.command {
		Some(Commands::Expand { template }) => run_expand(&args, template),
		Some(Commands::Compile {
			template,
			class_name,
		}) => run_compile(&args, template, class_name.as_deref()),
		Some(Commands::Generate {
			template,
			output,
			resources,
		}) => run_generate(&args, template, output.as_deref(), resources.as_deref()),
		Some(Commands::Update { force }) => run_update(&args, *force),
		Some(Commands::Check { format }) => run_check(&args, *format),
		None => {
			eprintln!("No subcommand specified. Run `dswift --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		report_error(e);
		process::exit(2);
	}
}

/// Render through miette when the error is a [`DswiftError`] so that codes
/// and help text are shown.
fn report_error(error: Box<dyn std::error::Error>) {
	match error.downcast::<DswiftError>() {
		Ok(dswift_error) => {
			let report: miette::Report = (*dswift_error).into();
			eprintln!("{report:?}");
		}
		Err(e) => {
			eprintln!("{} {e}", colored!("error:", red));
		}
	}
}

fn resolve_root(args: &DswiftCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

fn load_project(args: &DswiftCli) -> AnyResult<ProjectContext> {
	let project = ProjectContext::load(resolve_root(args))?;
	tracing::debug!(root = %project.root().display(), "loaded project");

	Ok(project)
}

/// Template arguments are relative to the project root.
fn resolve_template(project: &ProjectContext, template: &Path) -> PathBuf {
	if template.is_absolute() {
		template.to_path_buf()
	} else {
		project.root().join(template)
	}
}

fn display_path(project: &ProjectContext, path: &Path) -> String {
	project.relative_path(path).display().to_string()
}

fn run_expand(args: &DswiftCli, template: &Path) -> AnyEmptyResult {
	let project = load_project(args)?;
	let template = resolve_template(&project, template);
	let processed = expand_template(&template, &project, &Services::new())?;

	print!("{}", processed.source);

	Ok(())
}

fn run_compile(args: &DswiftCli, template: &Path, class_name: Option<&str>) -> AnyEmptyResult {
	let project = load_project(args)?;
	let template = resolve_template(&project, template);
	let services = Services::new();

	let program = match class_name {
		Some(class_name) => {
			let processed = expand_template(&template, &project, &services)?;
			compile(&services.grammar, &template, &processed, class_name)?
		}
		None => compile_template(&template, &project, &services)?.program,
	};

	print!("{}", program.source);

	if args.verbose && !program.packages.is_empty() {
		eprintln!("{}", program.package_manifest());
	}

	Ok(())
}

fn run_generate(
	args: &DswiftCli,
	template: &Path,
	output: Option<&Path>,
	resources: Option<&Path>,
) -> AnyEmptyResult {
	let project = load_project(args)?;
	let template = resolve_template(&project, template);
	let output = output.map_or_else(
		|| project.output_path_for(&template),
		|output| resolve_template(&project, output),
	);
	let services = Services::new();

	let generated = generate_one(&project, &services, &template, &output)?;
	if !args.quiet {
		println!(
			"{} {}",
			colored!("Generated", green),
			display_path(&project, &output)
		);
	}

	if let Some(resources) = resources {
		let copied = copy_resources(&generated, resources)?;
		if !args.quiet {
			println!("Copied {copied} resource file(s) to {}", resources.display());
		}
	}

	Ok(())
}

fn generate_one(
	project: &ProjectContext,
	services: &Services,
	template: &Path,
	output: &Path,
) -> DswiftResult<GeneratedOutput> {
	let runner = SwiftRunner::new(&project.config().swift);
	let generated = generate(template, project, services, &runner)?;

	if let Some(parent) = output.parent() {
		std::fs::create_dir_all(parent)?;
	}
	write_text(output, &generated.text, generated.encoding)?;

	Ok(generated)
}

/// Copy every file selected by the folder rules of `generated` below
/// `destination`.
fn copy_resources(generated: &GeneratedOutput, destination: &Path) -> AnyResult<usize> {
	let copies = generated.processed.include_folders.plan_copies(destination)?;

	for copy in &copies {
		if let Some(parent) = copy.destination.parent() {
			std::fs::create_dir_all(parent)?;
		}
		std::fs::copy(&copy.source, &copy.destination)?;
		tracing::debug!(
			source = %copy.source.display(),
			destination = %copy.destination.display(),
			"copied resource"
		);
	}

	Ok(copies.len())
}

fn run_update(args: &DswiftCli, force: bool) -> AnyEmptyResult {
	let project = load_project(args)?;
	let services = Services::new();
	let templates = project.discover_templates()?;

	let mut updated = 0_usize;
	let mut failed = 0_usize;

	for template in &templates {
		let output = project.output_path_for(template);
		let stale = if force {
			Ok(true)
		} else {
			needs_regeneration(template, &output, &project, &services)
		};
		let result = stale.and_then(|stale| {
			if stale {
				generate_one(&project, &services, template, &output).map(|_| true)
			} else {
				Ok(false)
			}
		});

		match result {
			Ok(true) => {
				updated += 1;
				if !args.quiet {
					println!(
						"{} {}",
						colored!("Generated", green),
						display_path(&project, &output)
					);
				}
			}
			Ok(false) => {
				if args.verbose {
					println!("Up to date: {}", display_path(&project, &output));
				}
			}
			Err(error) => {
				failed += 1;
				eprintln!(
					"{} failed to generate {}",
					colored!("error:", red),
					display_path(&project, template)
				);
				report_error(Box::new(error));
			}
		}
	}

	if failed > 0 {
		return Err(format!("{failed} template(s) failed to generate").into());
	}

	if args.quiet {
		return Ok(());
	}

	if updated == 0 {
		println!("All generated files are already up to date.");
	} else {
		println!("Updated {updated} file(s).");
	}

	Ok(())
}

#[derive(Debug, Serialize)]
struct StaleEntry {
	template: String,
	output: String,
}

#[derive(Debug, Serialize)]
struct CheckReport {
	ok: bool,
	stale: Vec<StaleEntry>,
}

fn run_check(args: &DswiftCli, format: OutputFormat) -> AnyEmptyResult {
	let project = load_project(args)?;
	let services = Services::new();
	let mut stale = Vec::new();

	for template in project.discover_templates()? {
		let output = project.output_path_for(&template);
		if needs_regeneration(&template, &output, &project, &services)? {
			stale.push(StaleEntry {
				template: display_path(&project, &template),
				output: display_path(&project, &output),
			});
		}
	}

	let report = CheckReport {
		ok: stale.is_empty(),
		stale,
	};

	match format {
		OutputFormat::Json => println!("{}", serde_json::to_string(&report)?),
		OutputFormat::Text if report.ok => {
			if !args.quiet {
				println!("Check passed: all generated files are up to date.");
			}
		}
		OutputFormat::Text => {
			eprintln!("Stale templates:");
			for entry in &report.stale {
				eprintln!("  {} -> {}", entry.template, entry.output);
			}
			eprintln!();
			eprintln!(
				"{} template(s) need regeneration. Run `dswift update` to fix.",
				report.stale.len()
			);
		}
	}

	if !report.ok {
		process::exit(1);
	}

	Ok(())
}
