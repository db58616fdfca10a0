use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

pub mod logging;
pub mod runner;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Generate Swift source files from dswift templates.",
	long_about = "dswift compiles `.dswift` templates into small Swift programs and runs them to \
	              produce Swift source files.\n\nTemplates mix literal text with `<% code %>`, \
	              `<%= expression %>`, `<%! member %>` and `<%!! declaration %>` blocks. Files \
	              starting with `// dswift-tools-version: 2.0.0` may also use \
	              `<%@include %>` and `<%@reference %>` tags.\n\nQuick start:\n  dswift expand \
	              <template>    Show the template with its tags expanded\n  dswift compile \
	              <template>   Show the generator program\n  dswift generate <template>  \
	              Write the generated Swift file\n  dswift update              Regenerate every \
	              stale template\n  dswift check               List stale templates"
)]
pub struct DswiftCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the project root directory.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Only print errors.
	#[arg(long, short, global = true, default_value_t = false, conflicts_with = "verbose")]
	pub quiet: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Print a template with its include and reference tags expanded.
	///
	/// Templates without a `dswift-tools-version` header are printed
	/// unchanged.
	Expand {
		/// The template to expand.
		template: PathBuf,
	},
	/// Print the Swift generator program a template compiles into.
	///
	/// Useful for debugging compile errors reported by the Swift toolchain,
	/// since their line numbers refer to this program.
	Compile {
		/// The template to compile.
		template: PathBuf,

		/// Name of the generator class. Defaults to `DSwiftGenerator0`.
		#[arg(long)]
		class_name: Option<String>,
	},
	/// Generate the Swift file for a single template.
	///
	/// Builds and runs the generator program with the configured Swift
	/// toolchain, then writes its output next to the template (or to
	/// `--output`).
	Generate {
		/// The template to generate from.
		template: PathBuf,

		/// Where to write the generated file. Defaults to the template path
		/// with the configured output extension.
		#[arg(long, short)]
		output: Option<PathBuf>,

		/// Copy the files selected by `include folder` and `reference folder`
		/// tags into this directory.
		#[arg(long)]
		resources: Option<PathBuf>,
	},
	/// Regenerate every template in the project whose output is stale.
	///
	/// An output is stale when it is missing, was not generated by dswift,
	/// or is older than its template or any file the template includes or
	/// references.
	Update {
		/// Regenerate every template, even when its output is up to date.
		#[arg(long, default_value_t = false)]
		force: bool,
	},
	/// List templates whose generated output is stale.
	///
	/// Exits with status 1 when any template needs regeneration. Ideal for CI
	/// pipelines.
	Check {
		/// Output format for check results. Use `text` for human-readable
		/// output or `json` for programmatic consumption.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output with colors and formatting.
	Text,
	/// JSON output for programmatic consumption.
	Json,
}
