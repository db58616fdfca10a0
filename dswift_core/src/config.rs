use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::DswiftError;
use crate::DswiftResult;
use crate::TextEncoding;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = [
	"dswift.toml",
	".dswift.toml",
	".config/dswift.toml",
];

/// Extension of template files when none is configured.
pub const DEFAULT_TEMPLATE_EXTENSION: &str = "dswift";
/// Extension of generated files when none is configured.
pub const DEFAULT_OUTPUT_EXTENSION: &str = "swift";

/// Configuration loaded from a `dswift.toml` file.
///
/// ```toml
/// template_extension = "dswift"
/// output_extension = "swift"
///
/// [exclude]
/// patterns = ["Vendor/", "*.generated.dswift"]
/// disable_gitignore = false
///
/// [swift]
/// path = "/usr/bin/swift"
/// build_arguments = ["-c", "release"]
///
/// [encodings]
/// "Sources/Legacy/Strings.dswift" = "utf16le"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct DswiftConfig {
	/// Extension (without the dot) identifying template files.
	#[serde(default = "default_template_extension")]
	pub template_extension: String,
	/// Extension (without the dot) given to generated files.
	#[serde(default = "default_output_extension")]
	pub output_extension: String,
	/// Exclusion configuration using gitignore-style patterns.
	#[serde(default)]
	pub exclude: ExcludeConfig,
	/// How the generator program is built and run.
	#[serde(default)]
	pub swift: SwiftConfig,
	/// Project-relative path to declared text encoding. Files listed here are
	/// decoded with the declared encoding instead of byte-order mark
	/// detection.
	#[serde(default)]
	pub encodings: BTreeMap<PathBuf, TextEncoding>,
}

impl Default for DswiftConfig {
	fn default() -> Self {
		Self {
			template_extension: default_template_extension(),
			output_extension: default_output_extension(),
			exclude: ExcludeConfig::default(),
			swift: SwiftConfig::default(),
			encodings: BTreeMap::new(),
		}
	}
}

fn default_template_extension() -> String {
	DEFAULT_TEMPLATE_EXTENSION.to_string()
}

fn default_output_extension() -> String {
	DEFAULT_OUTPUT_EXTENSION.to_string()
}

/// Configuration for excluding files and directories from template
/// discovery.
///
/// Patterns follow gitignore syntax and are applied on top of any `.gitignore`
/// rules (unless `disable_gitignore` is set).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExcludeConfig {
	/// Gitignore-style patterns relative to the project root.
	#[serde(default)]
	pub patterns: Vec<String>,
	/// When true the project's `.gitignore` is not consulted.
	#[serde(default)]
	pub disable_gitignore: bool,
}

/// The Swift toolchain used to run generator programs.
#[derive(Debug, Clone, Deserialize)]
pub struct SwiftConfig {
	/// The `swift` executable.
	#[serde(default = "default_swift_path")]
	pub path: PathBuf,
	/// Extra arguments passed to `swift run`.
	#[serde(default)]
	pub build_arguments: Vec<String>,
}

impl Default for SwiftConfig {
	fn default() -> Self {
		Self {
			path: default_swift_path(),
			build_arguments: Vec::new(),
		}
	}
}

fn default_swift_path() -> PathBuf {
	PathBuf::from("swift")
}

impl DswiftConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if no config file exists.
	pub fn load(root: &Path) -> DswiftResult<Option<DswiftConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		let config: DswiftConfig =
			toml::from_str(&content).map_err(|e| DswiftError::ConfigParse(e.to_string()))?;

		tracing::debug!(path = %config_path.display(), "loaded config");

		Ok(Some(config))
	}
}
