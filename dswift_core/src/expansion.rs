use std::fmt::Write as _;
use std::path::Path;
use std::path::PathBuf;

use crate::DswiftResult;
use crate::EditList;
use crate::FolderForest;
use crate::FolderRule;
use crate::GenerationRun;
use crate::IncludeFile;
use crate::IncludeTag;
use crate::PackageDependency;
use crate::ProjectContext;
use crate::ReferenceFile;
use crate::ReferenceTag;
use crate::Services;
use crate::Tag;
use crate::TagKind;
use crate::TextEncoding;
use crate::Version;
use crate::check_declared_tools_version;
use crate::find_tags;
use crate::strip_tools_version_header;

/// The result of expanding the tags of one file and everything it includes.
#[derive(Debug, Clone)]
pub struct ProcessedTags {
	/// The file's text with every tag replaced.
	pub source: String,
	/// Folder rules collected from `include folder` and `reference folder`
	/// tags along the include chain.
	pub include_folders: FolderForest,
	/// Package dependencies, unique by url, in discovery order.
	pub include_packages: Vec<PackageDependency>,
	/// Files inlined by `include file` tags, in expansion order.
	pub included_files: Vec<PathBuf>,
	/// Files named by `reference file` tags.
	pub referenced_files: Vec<PathBuf>,
	/// The tools version the file declares, when it opts into tags.
	pub tools_version: Option<Version>,
	pub encoding: TextEncoding,
}

impl ProcessedTags {
	fn unexpanded(source: String, encoding: TextEncoding, tools_version: Option<Version>) -> Self {
		Self {
			source,
			include_folders: FolderForest::new(),
			include_packages: Vec::new(),
			included_files: Vec::new(),
			referenced_files: Vec::new(),
			tools_version,
			encoding,
		}
	}

	/// Add `package` unless a dependency with the same url is known.
	pub fn add_package(&mut self, package: PackageDependency) {
		if self
			.include_packages
			.iter()
			.all(|existing| existing.url != package.url)
		{
			self.include_packages.push(package);
		}
	}

	/// Fold the bookkeeping of an included file into this one.
	fn absorb(&mut self, included: ProcessedTags) {
		self.include_folders.merge(included.include_folders);
		for package in included.include_packages {
			self.add_package(package);
		}
		self.included_files.extend(included.included_files);
		self.referenced_files.extend(included.referenced_files);
	}

	/// Every file the expanded output depends on besides the template itself:
	/// included files, referenced files and the files selected by folder
	/// rules.
	pub fn dependencies(&self) -> DswiftResult<Vec<PathBuf>> {
		let mut files = self.included_files.clone();
		files.extend(self.referenced_files.iter().cloned());
		files.extend(self.include_folders.files()?);
		files.sort();
		files.dedup();

		Ok(files)
	}
}

/// Expands the tags of a template, recursing into included files.
///
/// Tags are discovered once per file against the unmodified text and then
/// replaced in source order through an [`EditList`].
pub struct TagExpander<'a> {
	project: &'a ProjectContext,
	services: &'a Services,
	run: &'a GenerationRun,
}

impl<'a> TagExpander<'a> {
	pub fn new(project: &'a ProjectContext, services: &'a Services, run: &'a GenerationRun) -> Self {
		Self {
			project,
			services,
			run,
		}
	}

	/// Expand every tag in `file`.
	///
	/// Files without a `dswift-tools-version` header are returned unchanged.
	pub fn expand(&self, file: &Path) -> DswiftResult<ProcessedTags> {
		let _guard = self.run.enter(file)?;
		let loaded = self.services.sources.load(file, self.project)?;
		let Some(header) = loaded.header else {
			return Ok(ProcessedTags::unexpanded(
				loaded.text.clone(),
				loaded.encoding,
				None,
			));
		};

		check_declared_tools_version(file, header.version)?;

		let source = loaded.text.as_str();
		let tags = self.services.tags.get_or_try_insert_with(file, || {
			find_tags(
				&self.services.grammar,
				file,
				source,
				header.version,
				self.project,
			)
		})?;
		let mut processed =
			ProcessedTags::unexpanded(String::new(), loaded.encoding, Some(header.version));

		if tags.is_empty() {
			processed.source = loaded.text.clone();
			return Ok(processed);
		}

		let mut edits = EditList::new(source);

		for tag in tags.iter() {
			let indentation = indentation_before(source, tag.span.start);
			let replacement = self.replacement(file, tag, &mut processed)?;
			let replacement = reindent(&replacement, indentation);

			tracing::debug!(
				file = %file.display(),
				line = tag.line,
				tag = tag.kind.description(),
				"expanded tag"
			);

			edits.push(tag.span.clone(), replacement)?;
		}

		processed.source = edits.apply().text;

		Ok(processed)
	}

	fn replacement(
		&self,
		file: &Path,
		tag: &Tag,
		processed: &mut ProcessedTags,
	) -> DswiftResult<String> {
		match &tag.kind {
			TagKind::Include(IncludeTag::File(include)) => self.include_file(file, include, processed),
			TagKind::Include(IncludeTag::Folder(folder)) => {
				processed.include_folders.insert(folder.clone());
				Ok(if folder.quiet {
					String::new()
				} else {
					describe_folder("Include folder", folder, true)
				})
			}
			TagKind::Include(IncludeTag::Package(package)) => {
				processed.add_package(package.clone());
				Ok(if package.quiet {
					String::new()
				} else {
					describe_package(package)
				})
			}
			TagKind::Reference(ReferenceTag::File(reference)) => {
				processed
					.referenced_files
					.push(reference.absolute_path.clone());
				Ok(describe_reference_file(reference))
			}
			TagKind::Reference(ReferenceTag::Folder(folder)) => {
				processed.include_folders.insert(folder.clone());
				Ok(describe_folder("Reference folder", folder, false))
			}
		}
	}

	fn include_file(
		&self,
		file: &Path,
		include: &IncludeFile,
		processed: &mut ProcessedTags,
	) -> DswiftResult<String> {
		let target = include.absolute_path.as_path();

		if self.run.is_included(target) {
			if include.include_only_once {
				tracing::debug!(path = %target.display(), "skipping file included elsewhere");
				return Ok(if include.quiet {
					String::new()
				} else {
					format!("// Include file already included elsewhere: {}", include.path)
				});
			}

			if !include.only_once_explicitly_set {
				tracing::warn!(
					file = %file.display(),
					path = %target.display(),
					"file is included more than once; add onlyonce=\"true\" to include it a single time"
				);
			}
		}

		let included = self.expand(target)?;
		let content = strip_tools_version_header(&included.source);
		let content = content
			.strip_suffix("\r\n")
			.or_else(|| content.strip_suffix('\n'))
			.unwrap_or(content)
			.to_string();

		processed.included_files.push(target.to_path_buf());
		processed.absorb(included);

		Ok(if include.quiet {
			content
		} else {
			format!(
				"// Begin include file: {path}\n{content}\n// End include file: {path}",
				path = include.path
			)
		})
	}
}

/// The spaces and tabs directly in front of `offset`.
fn indentation_before(source: &str, offset: usize) -> &str {
	let before = &source[..offset];
	let start = before.trim_end_matches([' ', '\t']).len();
	&before[start..]
}

/// Prefix every line after the first with `indentation`.
fn reindent(text: &str, indentation: &str) -> String {
	if indentation.is_empty() || !text.contains('\n') {
		return text.to_string();
	}

	text.split('\n')
		.collect::<Vec<_>>()
		.join(&format!("\n{indentation}"))
}

fn describe_folder(title: &str, folder: &FolderRule, with_mapping: bool) -> String {
	let mut text = format!("// {title}: {}", folder.path);

	if let Some(filter) = &folder.filter {
		let _ = write!(text, "\n//   filter: {}", filter.as_str());
	}

	if !folder.include_extensions.is_empty() {
		let _ = write!(
			text,
			"\n//   include extensions: {}",
			folder.include_extensions.join(", ")
		);
	}

	if !folder.exclude_extensions.is_empty() {
		let _ = write!(
			text,
			"\n//   exclude extensions: {}",
			folder.exclude_extensions.join(", ")
		);
	}

	if with_mapping && !folder.extension_mapping.is_empty() {
		let mapping = folder
			.extension_mapping
			.iter()
			.map(|(from, to)| format!("{from} -> {to}"))
			.collect::<Vec<_>>()
			.join(", ");
		let _ = write!(text, "\n//   extension mapping: {mapping}");
	}

	if folder.propagate_attributes {
		text.push_str("\n//   propagate attributes: true");
	}

	text
}

fn describe_package(package: &PackageDependency) -> String {
	let mut text = format!(
		"// Include package: {} ({})",
		package.url, package.requirement
	);

	if !package.package_names.is_empty() {
		let _ = write!(text, "\n//   products: {}", package.package_names.join(", "));
	}

	text
}

fn describe_reference_file(reference: &ReferenceFile) -> String {
	format!("// Reference file: {}", reference.path)
}
