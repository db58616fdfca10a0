use std::fmt;

use crate::Version;

/// How a package dependency's version is pinned.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Requirement {
	/// Any version from this one up to the next major version.
	From(Version),
	/// `lower...upper`, both bounds included.
	ClosedRange(Version, Version),
	/// `lower..<upper`, upper bound excluded.
	OpenRange(Version, Version),
	/// Exactly this version.
	Exact(Version),
	/// The tip of a branch.
	Branch(String),
	/// A specific commit.
	Revision(String),
}

impl Requirement {
	/// The requirement as written in a Swift package manifest dependency.
	pub fn manifest_clause(&self) -> String {
		match self {
			Self::From(version) => format!("from: \"{version}\""),
			Self::ClosedRange(lower, upper) => format!("\"{lower}\"...\"{upper}\""),
			Self::OpenRange(lower, upper) => format!("\"{lower}\"..<\"{upper}\""),
			Self::Exact(version) => format!("exact: \"{version}\""),
			Self::Branch(branch) => format!("branch: \"{branch}\""),
			Self::Revision(revision) => format!("revision: \"{revision}\""),
		}
	}
}

impl fmt::Display for Requirement {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::From(version) => write!(f, "from {version}"),
			Self::ClosedRange(lower, upper) => write!(f, "{lower}...{upper}"),
			Self::OpenRange(lower, upper) => write!(f, "{lower}..<{upper}"),
			Self::Exact(version) => write!(f, "exactly {version}"),
			Self::Branch(branch) => write!(f, "branch {branch}"),
			Self::Revision(revision) => write!(f, "revision {revision}"),
		}
	}
}

/// A Swift package the generator program depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDependency {
	pub url: String,
	pub requirement: Requirement,
	/// Products imported by the generator program.
	pub package_names: Vec<String>,
	pub quiet: bool,
}

impl PackageDependency {
	/// The package identity Swift derives from the url: its last path
	/// component without a `.git` suffix.
	pub fn identity(&self) -> &str {
		let trimmed = self.url.trim_end_matches('/');
		let last = trimmed.rsplit(['/', ':']).next().unwrap_or(trimmed);
		last.strip_suffix(".git").unwrap_or(last)
	}

	/// The `.package(...)` entry for a package manifest.
	pub fn manifest_entry(&self) -> String {
		format!(
			".package(url: \"{}\", {})",
			self.url,
			self.requirement.manifest_clause()
		)
	}

	/// The `.product(...)` entries for the generator target.
	pub fn product_entries(&self) -> Vec<String> {
		self.package_names
			.iter()
			.map(|name| format!(".product(name: \"{name}\", package: \"{}\")", self.identity()))
			.collect()
	}
}
