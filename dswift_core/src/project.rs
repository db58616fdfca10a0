use std::collections::HashMap;
use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;

use ignore::gitignore::Gitignore;
use ignore::gitignore::GitignoreBuilder;

use crate::DswiftConfig;
use crate::DswiftError;
use crate::DswiftResult;
use crate::TextEncoding;
use crate::config::CONFIG_FILE_CANDIDATES;
use crate::tags::normalize_path;

/// Placeholder in path attributes replaced with the project root.
pub const PROJECT_ROOT_PLACEHOLDER: &str = "<PROJECT_ROOT>";

/// The project a template belongs to: its root directory, its configuration
/// and the encodings declared for individual files.
#[derive(Debug, Clone)]
pub struct ProjectContext {
	root: PathBuf,
	config: DswiftConfig,
	encodings: HashMap<PathBuf, TextEncoding>,
}

impl ProjectContext {
	/// A project rooted at `root` with the default configuration.
	pub fn new(root: impl AsRef<Path>) -> Self {
		Self::with_config(root, DswiftConfig::default())
	}

	/// A project rooted at `root` using `config`.
	pub fn with_config(root: impl AsRef<Path>, config: DswiftConfig) -> Self {
		let root = absolute_root(root.as_ref());
		let encodings = config
			.encodings
			.iter()
			.map(|(path, encoding)| (normalize_path(&root.join(path)), *encoding))
			.collect();

		Self {
			root,
			config,
			encodings,
		}
	}

	/// A project rooted at `root`, reading `dswift.toml` when one exists.
	pub fn load(root: impl AsRef<Path>) -> DswiftResult<Self> {
		let root = root.as_ref();
		let config = DswiftConfig::load(root)?.unwrap_or_default();

		Ok(Self::with_config(root, config))
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	pub fn config(&self) -> &DswiftConfig {
		&self.config
	}

	/// The encoding declared for `path`, if any.
	pub fn declared_encoding(&self, path: &Path) -> Option<TextEncoding> {
		self.encodings.get(&normalize_path(path)).copied()
	}

	/// Declare the encoding of `path`.
	pub fn set_encoding(&mut self, path: impl AsRef<Path>, encoding: TextEncoding) {
		let path = path.as_ref();
		let absolute = if path.is_absolute() {
			path.to_path_buf()
		} else {
			self.root.join(path)
		};
		self.encodings.insert(normalize_path(&absolute), encoding);
	}

	/// `path` relative to the project root when it lives inside it.
	pub fn relative_path<'a>(&self, path: &'a Path) -> &'a Path {
		path.strip_prefix(&self.root).unwrap_or(path)
	}

	/// Whether `path` has the configured template extension.
	pub fn is_template(&self, path: &Path) -> bool {
		path.extension()
			.is_some_and(|extension| extension == self.config.template_extension.as_str())
	}

	/// Where the output of `template` is written by default.
	pub fn output_path_for(&self, template: &Path) -> PathBuf {
		template.with_extension(&self.config.output_extension)
	}

	/// Every template below the root, sorted.
	///
	/// Files matched by the project's `.gitignore` are skipped unless
	/// `disable_gitignore` is set. `[exclude]` patterns are always applied.
	pub fn discover_templates(&self) -> DswiftResult<Vec<PathBuf>> {
		let mut files = Vec::new();
		let mut visited_dirs = HashSet::new();

		let gitignore = if self.config.exclude.disable_gitignore {
			Gitignore::empty()
		} else {
			build_gitignore(&self.root)
		};
		let custom_exclude = build_exclude_matcher(&self.root, &self.config.exclude.patterns)?;

		self.walk_dir(
			&self.root,
			&mut files,
			true,
			&gitignore,
			&custom_exclude,
			&mut visited_dirs,
		)?;
		files.sort();

		tracing::debug!(count = files.len(), root = %self.root.display(), "discovered templates");

		Ok(files)
	}

	fn walk_dir(
		&self,
		dir: &Path,
		files: &mut Vec<PathBuf>,
		is_root: bool,
		gitignore: &Gitignore,
		custom_exclude: &Gitignore,
		visited_dirs: &mut HashSet<PathBuf>,
	) -> DswiftResult<()> {
		if !dir.is_dir() {
			return Ok(());
		}

		// Detect symlink cycles by tracking canonical paths.
		let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
		if !visited_dirs.insert(canonical) {
			return Err(DswiftError::SymlinkCycle {
				path: dir.display().to_string(),
			});
		}

		for entry in std::fs::read_dir(dir)? {
			let path = entry?.path();

			if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
				if is_ignored_directory_name(name) {
					continue;
				}
			}

			let is_dir = path.is_dir();

			if gitignore.matched(&path, is_dir).is_ignore()
				|| custom_exclude.matched(&path, is_dir).is_ignore()
			{
				continue;
			}

			if is_dir {
				// Nested projects are discovered from their own root.
				if !is_root && has_project_config(&path) {
					continue;
				}
				self.walk_dir(
					&path,
					files,
					false,
					gitignore,
					custom_exclude,
					visited_dirs,
				)?;
			} else if self.is_template(&path) {
				files.push(path);
			}
		}

		Ok(())
	}
}

fn absolute_root(root: &Path) -> PathBuf {
	root.canonicalize()
		.or_else(|_| std::path::absolute(root))
		.unwrap_or_else(|_| root.to_path_buf())
}

/// Build a `Gitignore` matcher from the `[exclude]` patterns.
fn build_exclude_matcher(root: &Path, patterns: &[String]) -> DswiftResult<Gitignore> {
	let mut builder = GitignoreBuilder::new(root);
	for pattern in patterns {
		builder.add_line(None, pattern).map_err(|e| {
			DswiftError::ConfigParse(format!("invalid exclude pattern `{pattern}`: {e}"))
		})?;
	}
	builder
		.build()
		.map_err(|e| DswiftError::ConfigParse(format!("failed to build exclude rules: {e}")))
}

/// Build a `Gitignore` matcher from the project's `.gitignore` file (if any).
fn build_gitignore(root: &Path) -> Gitignore {
	let mut builder = GitignoreBuilder::new(root);
	let gitignore_path = root.join(".gitignore");
	if gitignore_path.exists() {
		let _ = builder.add(gitignore_path);
	}
	builder.build().unwrap_or_else(|_| Gitignore::empty())
}

/// Hidden directories, SwiftPM build products and dependency checkouts.
fn is_ignored_directory_name(name: &str) -> bool {
	name.starts_with('.') || name == "node_modules" || name == "DerivedData"
}

fn has_project_config(dir: &Path) -> bool {
	CONFIG_FILE_CANDIDATES
		.iter()
		.any(|candidate| dir.join(candidate).is_file())
}
