use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use derive_more::Deref;
use regex::Regex;

use crate::DswiftResult;

/// A rule selecting files from a folder, declared by an `include folder` or
/// `reference folder` tag. Rules nest: `children` hold rules for descendant
/// folders and are kept sorted by path without overlaps.
#[derive(Debug, Clone)]
pub struct FolderRule {
	/// The folder as written in the tag.
	pub path: String,
	pub absolute_path: PathBuf,
	/// Extensions to keep. Empty keeps every extension.
	pub include_extensions: Vec<String>,
	/// Extensions to drop.
	pub exclude_extensions: Vec<String>,
	/// Extension renames applied to copied files.
	pub extension_mapping: BTreeMap<String, String>,
	/// Pattern file names must match.
	pub filter: Option<Regex>,
	/// Whether subfolders without their own rule use this rule's attributes.
	pub propagate_attributes: bool,
	pub quiet: bool,
	pub children: Vec<FolderRule>,
}

/// A file selected by a folder rule together with where it should be copied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedCopy {
	pub source: PathBuf,
	pub destination: PathBuf,
}

impl FolderRule {
	pub fn new(path: impl Into<String>, absolute_path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			absolute_path: absolute_path.into(),
			include_extensions: Vec::new(),
			exclude_extensions: Vec::new(),
			extension_mapping: BTreeMap::new(),
			filter: None,
			propagate_attributes: false,
			quiet: false,
			children: Vec::new(),
		}
	}

	/// A rule that keeps every file and applies to every nested folder.
	fn unfiltered() -> Self {
		Self {
			propagate_attributes: true,
			..Self::new(String::new(), PathBuf::new())
		}
	}

	/// Whether this rule's folder is strictly inside `ancestor`.
	pub fn is_descendant_of(&self, ancestor: &Path) -> bool {
		self.absolute_path != ancestor && self.absolute_path.starts_with(ancestor)
	}

	/// Add `folder` below this rule, merging it into the existing children.
	pub fn append_child_folder(&mut self, folder: FolderRule) {
		insert_folder(&mut self.children, folder);
	}

	/// Fold a rule for the same folder into this one. Existing extension
	/// mappings win over the incoming ones.
	fn merge(&mut self, other: FolderRule) {
		for (from, to) in other.extension_mapping {
			self.extension_mapping.entry(from).or_insert(to);
		}

		for child in other.children {
			insert_folder(&mut self.children, child);
		}
	}

	/// Whether a file directly governed by this rule is kept.
	pub fn accepts(&self, file: &Path) -> bool {
		let extension = file_extension(file);

		if !self.include_extensions.is_empty() && !self.include_extensions.contains(&extension) {
			return false;
		}

		if self.exclude_extensions.contains(&extension) {
			return false;
		}

		self.filter.as_ref().is_none_or(|filter| {
			file.file_name()
				.is_some_and(|name| filter.is_match(&name.to_string_lossy()))
		})
	}

	/// The file name `file` is copied under, after extension mapping.
	pub fn mapped_file_name(&self, file: &Path) -> String {
		let name = file
			.file_name()
			.map(|name| name.to_string_lossy().into_owned())
			.unwrap_or_default();
		let extension = file_extension(file);

		match self.extension_mapping.get(&extension) {
			Some(mapped) if !extension.is_empty() => {
				let stem = file
					.file_stem()
					.map(|stem| stem.to_string_lossy().into_owned())
					.unwrap_or_default();
				if mapped.is_empty() {
					stem
				} else {
					format!("{stem}.{mapped}")
				}
			}
			_ => name,
		}
	}

	/// Every file selected by this rule and its children, paired with its
	/// destination below `destination`. Results are sorted by source path.
	pub fn plan_copies(&self, destination: &Path) -> DswiftResult<Vec<PlannedCopy>> {
		let unfiltered = Self::unfiltered();
		let mut copies = Vec::new();
		walk_rule(
			&self.absolute_path,
			destination,
			self,
			&self.children,
			&unfiltered,
			&mut copies,
		)?;
		copies.sort_by(|a, b| a.source.cmp(&b.source));

		Ok(copies)
	}

	/// Every file selected by this rule and its children.
	pub fn files(&self) -> DswiftResult<Vec<PathBuf>> {
		Ok(self
			.plan_copies(Path::new(""))?
			.into_iter()
			.map(|copy| copy.source)
			.collect())
	}
}

fn file_extension(file: &Path) -> String {
	file.extension()
		.map(|extension| extension.to_string_lossy().to_lowercase())
		.unwrap_or_default()
}

fn walk_rule(
	directory: &Path,
	destination: &Path,
	rule: &FolderRule,
	children: &[FolderRule],
	unfiltered: &FolderRule,
	copies: &mut Vec<PlannedCopy>,
) -> DswiftResult<()> {
	if !directory.is_dir() {
		return Ok(());
	}

	let mut entries = std::fs::read_dir(directory)?
		.map(|entry| entry.map(|entry| entry.path()))
		.collect::<Result<Vec<_>, _>>()?;
	entries.sort();

	for path in entries {
		let name = path.file_name().map(ToOwned::to_owned).unwrap_or_default();

		if path.is_dir() {
			let target = destination.join(&name);
			if let Some(child) = children.iter().find(|child| child.absolute_path == path) {
				walk_rule(&path, &target, child, &child.children, unfiltered, copies)?;
			} else {
				let inherited = if rule.propagate_attributes {
					rule
				} else {
					unfiltered
				};
				walk_rule(&path, &target, inherited, children, unfiltered, copies)?;
			}
		} else if rule.accepts(&path) {
			copies.push(PlannedCopy {
				destination: destination.join(rule.mapped_file_name(&path)),
				source: path,
			});
		}
	}

	Ok(())
}

/// Insert `folder` into a sorted, non-overlapping list of sibling rules.
///
/// A rule for an existing path is merged into it, a rule inside an existing
/// sibling descends into that sibling, and existing siblings inside the new
/// rule are moved below it.
fn insert_folder(siblings: &mut Vec<FolderRule>, mut folder: FolderRule) {
	if let Some(existing) = siblings
		.iter_mut()
		.find(|sibling| sibling.absolute_path == folder.absolute_path)
	{
		existing.merge(folder);
		return;
	}

	if let Some(parent) = siblings
		.iter_mut()
		.find(|sibling| folder.is_descendant_of(&sibling.absolute_path))
	{
		parent.append_child_folder(folder);
		return;
	}

	let (absorbed, kept): (Vec<FolderRule>, Vec<FolderRule>) = std::mem::take(siblings)
		.into_iter()
		.partition(|sibling| sibling.is_descendant_of(&folder.absolute_path));
	*siblings = kept;

	for child in absorbed {
		folder.append_child_folder(child);
	}

	let index = siblings.partition_point(|sibling| sibling.absolute_path < folder.absolute_path);
	siblings.insert(index, folder);
}

/// The accumulated folder rules of one generation run: a sorted forest of
/// non-overlapping [`FolderRule`] trees.
#[derive(Debug, Clone, Default, Deref)]
pub struct FolderForest {
	folders: Vec<FolderRule>,
}

impl FolderForest {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, folder: FolderRule) {
		insert_folder(&mut self.folders, folder);
	}

	/// Insert every rule of `other`.
	pub fn merge(&mut self, other: FolderForest) {
		for folder in other.folders {
			self.insert(folder);
		}
	}

	/// Copies planned by every root rule. Each root folder lands in a
	/// directory of the same name below `destination`.
	pub fn plan_copies(&self, destination: &Path) -> DswiftResult<Vec<PlannedCopy>> {
		let mut copies = Vec::new();

		for folder in &self.folders {
			let name = folder
				.absolute_path
				.file_name()
				.map(ToOwned::to_owned)
				.unwrap_or_default();
			copies.extend(folder.plan_copies(&destination.join(name))?);
		}

		Ok(copies)
	}

	/// Every file selected by the forest.
	pub fn files(&self) -> DswiftResult<Vec<PathBuf>> {
		let mut files = Vec::new();

		for folder in &self.folders {
			files.extend(folder.files()?);
		}

		Ok(files)
	}
}
