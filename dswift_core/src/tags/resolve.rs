use std::collections::BTreeMap;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use regex::Regex;

use super::FolderRule;
use super::IncludeFile;
use super::IncludeTag;
use super::PackageDependency;
use super::ReferenceFile;
use super::ReferenceTag;
use super::Requirement;
use super::TagKind;
use super::TagName;
use super::TagVariant;
use crate::DswiftError;
use crate::DswiftResult;
use crate::ProjectContext;
use crate::Version;
use crate::attributes::TagAttributes;
use crate::project::PROJECT_ROOT_PLACEHOLDER;

pub(crate) struct TagContext<'a> {
	pub file: &'a Path,
	pub line: usize,
	pub tools_version: Version,
	pub project: &'a ProjectContext,
}

/// What a path attribute must point at.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Expect {
	File,
	Folder,
	Anything,
}

/// Consumes attributes one by one so that leftovers can be reported.
struct AttributeReader<'a> {
	tag: String,
	attributes: TagAttributes,
	context: &'a TagContext<'a>,
}

impl<'a> AttributeReader<'a> {
	fn new(tag: impl Into<String>, attributes: TagAttributes, context: &'a TagContext<'a>) -> Self {
		Self {
			tag: tag.into(),
			attributes,
			context,
		}
	}

	fn file(&self) -> String {
		self.context.file.display().to_string()
	}

	fn take(&mut self, name: &str) -> Option<String> {
		self.attributes.remove(name)
	}

	fn take_bool(&mut self, name: &str) -> DswiftResult<Option<bool>> {
		let Some(value) = self.take(name) else {
			return Ok(None);
		};

		match value.as_str() {
			"true" => Ok(Some(true)),
			"false" => Ok(Some(false)),
			_ => {
				Err(DswiftError::InvalidTagAttributeValue {
					file: self.file(),
					line: self.context.line,
					attribute: name.to_string(),
					value,
					expected: "one of `true`, `false`".to_string(),
				})
			}
		}
	}

	/// A `;`-separated list with items trimmed and empty items dropped.
	fn take_list(&mut self, name: &str) -> Vec<String> {
		self.take(name)
			.map(|value| {
				value
					.split(';')
					.map(str::trim)
					.filter(|item| !item.is_empty())
					.map(ToString::to_string)
					.collect()
			})
			.unwrap_or_default()
	}

	fn take_extensions(&mut self, name: &str) -> Vec<String> {
		self.take_list(name)
			.into_iter()
			.map(|extension| normalize_extension(&extension))
			.collect()
	}

	/// `from:to` pairs separated by `;`.
	fn take_extension_mapping(&mut self) -> DswiftResult<BTreeMap<String, String>> {
		let mut mapping = BTreeMap::new();
		let Some(value) = self.take("extensionmapping") else {
			return Ok(mapping);
		};

		for pair in value.split(';').map(str::trim).filter(|pair| !pair.is_empty()) {
			let components: Vec<&str> = pair.split(':').collect();
			let [from, to] = components.as_slice() else {
				return Err(DswiftError::InvalidTagAttributeValue {
					file: self.file(),
					line: self.context.line,
					attribute: "extensionmapping".to_string(),
					value: value.clone(),
					expected: "`from:to` pairs separated by `;`".to_string(),
				});
			};
			mapping.insert(normalize_extension(from), normalize_extension(to));
		}

		Ok(mapping)
	}

	fn take_filter(&mut self) -> DswiftResult<Option<Regex>> {
		let Some(value) = self.take("filter") else {
			return Ok(None);
		};

		Regex::new(&value).map(Some).map_err(|error| {
			DswiftError::InvalidTagAttributeRegExValue {
				file: self.file(),
				line: self.context.line,
				attribute: "filter".to_string(),
				value: value.clone(),
				reason: error.to_string(),
			}
		})
	}

	fn parse_version(&self, attribute: &str, value: &str) -> DswiftResult<Version> {
		value.parse::<Version>().map_err(|_| {
			DswiftError::InvalidVersion {
				file: self.file(),
				line: self.context.line,
				attribute: attribute.to_string(),
				value: value.to_string(),
			}
		})
	}

	/// Resolve a path attribute relative to the referencing file.
	fn take_path(&mut self, name: &str, expect: Expect) -> DswiftResult<Option<(String, PathBuf)>> {
		let Some(value) = self.take(name) else {
			return Ok(None);
		};

		let path = value.trim().to_string();
		let absolute = resolve_path(&path, self.context.file, self.context.project.root());
		let exists = match expect {
			Expect::File => absolute.is_file(),
			Expect::Folder => absolute.is_dir(),
			Expect::Anything => true,
		};

		if !exists {
			return Err(DswiftError::ResourceNotFound {
				file: self.file(),
				line: self.context.line,
				attribute: name.to_string(),
				path,
			});
		}

		Ok(Some((path, absolute)))
	}

	/// Fail if any attribute was not consumed.
	fn finish(self) -> DswiftResult<()> {
		if self.attributes.is_empty() {
			return Ok(());
		}

		Err(DswiftError::InvalidTagAttributes {
			file: self.file(),
			line: self.context.line,
			tag: self.tag,
			attributes: self
				.attributes
				.names()
				.iter()
				.map(|name| format!("`{name}`"))
				.collect::<Vec<_>>()
				.join(", "),
		})
	}

	fn missing(&self, expected: &[&str]) -> DswiftError {
		DswiftError::MissingTagAttributes {
			file: self.file(),
			line: self.context.line,
			tag: self.tag.clone(),
			expected: expected
				.iter()
				.map(|name| format!("`{name}`"))
				.collect::<Vec<_>>()
				.join(" or "),
		}
	}
}

/// Turn the raw attributes of a tag into a typed tag.
pub(crate) fn parse_tag(
	name: TagName,
	attributes: TagAttributes,
	context: &TagContext<'_>,
) -> DswiftResult<TagKind> {
	let mut reader = AttributeReader::new(name.as_str(), attributes, context);
	let Some(variant) = identify(name, &reader.attributes) else {
		return Err(match name {
			TagName::Include => reader.missing(&["file", "folder", "package"]),
			TagName::Reference => reader.missing(&["file", "folder"]),
		});
	};
	variant.check_tools_version(context.file, context.line, context.tools_version)?;

	let kind = match variant {
		TagVariant::IncludeFile => TagKind::Include(IncludeTag::File(parse_include_file(&mut reader)?)),
		TagVariant::IncludeFolder => {
			TagKind::Include(IncludeTag::Folder(parse_include_folder(&mut reader)?))
		}
		TagVariant::IncludePackage => {
			TagKind::Include(IncludeTag::Package(parse_include_package(&mut reader)?))
		}
		TagVariant::ReferenceFile => {
			let Some((path, absolute_path)) = reader.take_path("file", Expect::Anything)? else {
				return Err(reader.missing(&["file"]));
			};
			TagKind::Reference(ReferenceTag::File(ReferenceFile {
				path,
				absolute_path,
			}))
		}
		TagVariant::ReferenceFolder => {
			TagKind::Reference(ReferenceTag::Folder(parse_reference_folder(&mut reader)?))
		}
	};

	reader.finish()?;
	Ok(kind)
}

/// Pick the tag form from its identifying attribute, in precedence order.
fn identify(name: TagName, attributes: &TagAttributes) -> Option<TagVariant> {
	let candidates: &[(&str, TagVariant)] = match name {
		TagName::Include => {
			&[
				("file", TagVariant::IncludeFile),
				("folder", TagVariant::IncludeFolder),
				("package", TagVariant::IncludePackage),
			]
		}
		TagName::Reference => {
			&[
				("file", TagVariant::ReferenceFile),
				("folder", TagVariant::ReferenceFolder),
			]
		}
	};

	candidates
		.iter()
		.find(|(attribute, _)| attributes.contains_key(*attribute))
		.map(|(_, variant)| *variant)
}

fn parse_include_file(reader: &mut AttributeReader<'_>) -> DswiftResult<IncludeFile> {
	let Some((path, absolute_path)) = reader.take_path("file", Expect::File)? else {
		return Err(reader.missing(&["file"]));
	};
	let only_once = reader.take_bool("onlyonce")?;
	let quiet = reader.take_bool("quiet")?.unwrap_or(false);

	Ok(IncludeFile {
		path,
		absolute_path,
		include_only_once: only_once.unwrap_or(false),
		only_once_explicitly_set: only_once.is_some(),
		quiet,
	})
}

fn parse_include_folder(reader: &mut AttributeReader<'_>) -> DswiftResult<FolderRule> {
	let Some((path, absolute_path)) = reader.take_path("folder", Expect::Folder)? else {
		return Err(reader.missing(&["folder"]));
	};

	let mut folder = FolderRule::new(path, absolute_path);
	folder.filter = reader.take_filter()?;
	folder.include_extensions = reader.take_extensions("includeextensions");
	folder.exclude_extensions = reader.take_extensions("excludeextensions");
	folder.extension_mapping = reader.take_extension_mapping()?;
	folder.quiet = reader.take_bool("quiet")?.unwrap_or(false);
	folder.propagate_attributes = reader.take_bool("propagateattributes")?.unwrap_or(false);

	Ok(folder)
}

fn parse_reference_folder(reader: &mut AttributeReader<'_>) -> DswiftResult<FolderRule> {
	let Some((path, absolute_path)) = reader.take_path("folder", Expect::Folder)? else {
		return Err(reader.missing(&["folder"]));
	};

	let mut folder = FolderRule::new(path, absolute_path);
	folder.filter = reader.take_filter()?;
	folder.include_extensions = reader.take_extensions("includeextensions");
	folder.exclude_extensions = reader.take_extensions("excludeextensions");
	folder.propagate_attributes = reader.take_bool("propagateattributes")?.unwrap_or(false);

	Ok(folder)
}

fn parse_include_package(reader: &mut AttributeReader<'_>) -> DswiftResult<PackageDependency> {
	let Some(url) = reader.take("package").map(|url| url.trim().to_string()) else {
		return Err(reader.missing(&["package"]));
	};
	let requirement = parse_requirement(reader)?;

	let mut package_names = reader.take_list("packagenames");
	package_names.extend(reader.take_list("packagename"));
	let quiet = reader.take_bool("quiet")?.unwrap_or(false);

	Ok(PackageDependency {
		url,
		requirement,
		package_names,
		quiet,
	})
}

/// Try `from`, `range`, `exact`, `branch` and `revision`, in that order.
fn parse_requirement(reader: &mut AttributeReader<'_>) -> DswiftResult<Requirement> {
	if let Some(value) = reader.take("from") {
		return Ok(Requirement::From(reader.parse_version("from", &value)?));
	}

	if let Some(value) = reader.take("range") {
		return parse_range(reader, &value);
	}

	if let Some(value) = reader.take("exact") {
		return Ok(Requirement::Exact(reader.parse_version("exact", &value)?));
	}

	if let Some(value) = reader.take("branch") {
		return Ok(Requirement::Branch(value.trim().to_string()));
	}

	if let Some(value) = reader.take("revision") {
		return Ok(Requirement::Revision(value.trim().to_string()));
	}

	Err(reader.missing(&["from", "range", "exact", "branch", "revision"]))
}

fn parse_range(reader: &AttributeReader<'_>, value: &str) -> DswiftResult<Requirement> {
	let invalid = |reason: &str| {
		DswiftError::InvalidVersionRange {
			file: reader.file(),
			line: reader.context.line,
			value: value.to_string(),
			reason: reason.to_string(),
		}
	};

	let (lower, upper, closed) = if let Some((lower, upper)) = value.split_once("..<") {
		(lower, upper, false)
	} else if let Some((lower, upper)) = value.split_once("...") {
		(lower, upper, true)
	} else {
		return Err(invalid("expected `..<` or `...` between the bounds"));
	};

	let lower = reader.parse_version("range", lower)?;
	let upper = reader.parse_version("range", upper)?;

	if lower >= upper {
		return Err(invalid("the lower bound must be less than the upper bound"));
	}

	Ok(if closed {
		Requirement::ClosedRange(lower, upper)
	} else {
		Requirement::OpenRange(lower, upper)
	})
}

fn normalize_extension(extension: &str) -> String {
	extension.trim().trim_start_matches('.').to_lowercase()
}

/// Substitute the project root placeholder, collapse doubled separators and
/// resolve `path` against the directory of `file`.
pub(crate) fn resolve_path(path: &str, file: &Path, project_root: &Path) -> PathBuf {
	let mut substituted = path
		.trim()
		.replace(PROJECT_ROOT_PLACEHOLDER, &project_root.to_string_lossy());
	while substituted.contains("//") {
		substituted = substituted.replace("//", "/");
	}

	let candidate = PathBuf::from(substituted);
	let joined = if candidate.is_absolute() {
		candidate
	} else {
		file.parent().unwrap_or(Path::new("")).join(candidate)
	};

	normalize_path(&joined)
}

/// Lexically remove `.` and `..` components.
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
	let mut normalized = PathBuf::new();

	for component in path.components() {
		match component {
			Component::CurDir => {}
			Component::ParentDir => {
				if !normalized.pop() {
					normalized.push(component);
				}
			}
			other => normalized.push(other),
		}
	}

	normalized
}
