//! Tags are attribute-bearing blocks (`<%@include file="a.dswift"%>`) that are
//! expanded into plain template text before compilation.

use std::fmt;
use std::ops::Range;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;

pub use folder::*;
pub use package::*;
pub(crate) use resolve::normalize_path;

use crate::BlockGrammar;
use crate::DswiftError;
use crate::DswiftResult;
use crate::ProjectContext;
use crate::Version;
use crate::attributes::parse_attributes;
use crate::scanner::BlockScanner;
use crate::scanner::line_number;

mod folder;
mod package;
mod resolve;

/// The tags understood by the expansion engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagName {
	Include,
	Reference,
}

impl TagName {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Include => "include",
			Self::Reference => "reference",
		}
	}
}

impl FromStr for TagName {
	type Err = ();

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		match value {
			"include" => Ok(Self::Include),
			"reference" => Ok(Self::Reference),
			_ => Err(()),
		}
	}
}

impl fmt::Display for TagName {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// `include file="..."`: splice another template's expanded content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeFile {
	pub path: String,
	pub absolute_path: PathBuf,
	pub include_only_once: bool,
	/// Whether `onlyonce` was written in the tag rather than defaulted.
	pub only_once_explicitly_set: bool,
	pub quiet: bool,
}

/// `reference file="..."`: document a dependency on another file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceFile {
	pub path: String,
	pub absolute_path: PathBuf,
}

#[derive(Debug, Clone)]
pub enum IncludeTag {
	File(IncludeFile),
	Folder(FolderRule),
	Package(PackageDependency),
}

#[derive(Debug, Clone)]
pub enum ReferenceTag {
	File(ReferenceFile),
	Folder(FolderRule),
}

#[derive(Debug, Clone)]
pub enum TagKind {
	Include(IncludeTag),
	Reference(ReferenceTag),
}

/// The five tag forms, known as soon as the identifying attribute is seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagVariant {
	IncludeFile,
	IncludeFolder,
	IncludePackage,
	ReferenceFile,
	ReferenceFolder,
}

impl TagVariant {
	/// A short description such as `include folder`, used in messages.
	pub fn description(self) -> &'static str {
		match self {
			Self::IncludeFile => "include file",
			Self::IncludeFolder => "include folder",
			Self::IncludePackage => "include package",
			Self::ReferenceFile => "reference file",
			Self::ReferenceFolder => "reference folder",
		}
	}

	/// The oldest tools version that supports this tag.
	pub fn minimum_tools_version(self) -> Version {
		match self {
			Self::IncludeFile => Version::new(1, 0, 0),
			Self::IncludeFolder
			| Self::IncludePackage
			| Self::ReferenceFile
			| Self::ReferenceFolder => Version::new(2, 0, 0),
		}
	}

	/// Fail when `declared` is older than this tag requires.
	pub fn check_tools_version(
		self,
		file: &Path,
		line: usize,
		declared: Version,
	) -> DswiftResult<()> {
		let required = self.minimum_tools_version();
		if declared < required {
			return Err(DswiftError::MinimumToolsVersionNotMet {
				file: file.display().to_string(),
				line,
				feature: format!("`{}` tag", self.description()),
				required: required.to_string(),
				declared: declared.to_string(),
			});
		}

		Ok(())
	}
}

impl TagKind {
	pub fn variant(&self) -> TagVariant {
		match self {
			Self::Include(IncludeTag::File(_)) => TagVariant::IncludeFile,
			Self::Include(IncludeTag::Folder(_)) => TagVariant::IncludeFolder,
			Self::Include(IncludeTag::Package(_)) => TagVariant::IncludePackage,
			Self::Reference(ReferenceTag::File(_)) => TagVariant::ReferenceFile,
			Self::Reference(ReferenceTag::Folder(_)) => TagVariant::ReferenceFolder,
		}
	}

	pub fn description(&self) -> &'static str {
		self.variant().description()
	}
}

/// A tag found in a template source.
#[derive(Debug, Clone)]
pub struct Tag {
	pub kind: TagKind,
	/// Byte range of the whole tag in the unmodified source.
	pub span: Range<usize>,
	/// 1-indexed line of the tag's opening delimiter.
	pub line: usize,
}

/// Find and resolve every tag in `source`, in source order.
///
/// Discovery runs over the unmodified source so that every span refers to the
/// same text. Each tag is checked against `tools_version` before any of its
/// attributes are resolved.
pub fn find_tags(
	grammar: &BlockGrammar,
	file: &Path,
	source: &str,
	tools_version: Version,
	project: &ProjectContext,
) -> DswiftResult<Vec<Tag>> {
	let mut tags = Vec::new();

	for block in BlockScanner::new(grammar, file, source) {
		let block = block?;
		let Some(name) = block.kind.tag_name() else {
			continue;
		};

		let line = line_number(source, block.range.start);
		let tag_name = name.parse::<TagName>().map_err(|()| {
			DswiftError::UnknownTag {
				file: file.display().to_string(),
				line,
				name: name.to_string(),
			}
		})?;
		let attributes = parse_attributes(file, source, block.inner.clone())?;
		let context = resolve::TagContext {
			file,
			line,
			tools_version,
			project,
		};
		let kind = resolve::parse_tag(tag_name, attributes, &context)?;

		tags.push(Tag {
			kind,
			span: block.range,
			line,
		});
	}

	Ok(tags)
}
