use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::DswiftError;
use crate::DswiftResult;

/// The tools version implemented by this engine.
pub const CURRENT_TOOLS_VERSION: Version = Version::new(2, 0, 0);
/// The oldest tools version a template may declare.
pub const MINIMUM_TOOLS_VERSION: Version = Version::new(1, 0, 0);

static TOOLS_VERSION_HEADER: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"\A//[ \t]?dswift-tools-version:[ \t]*([^\s]*)[^\n]*(\n|\z)")
		.unwrap_or_else(|error| panic!("invalid tools version pattern: {error}"))
});

/// A `major.minor.patch` version. Missing trailing components are zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
	pub major: u64,
	pub minor: u64,
	pub patch: u64,
}

impl Version {
	pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
		Self {
			major,
			minor,
			patch,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid version `{0}`")]
pub struct ParseVersionError(pub String);

impl FromStr for Version {
	type Err = ParseVersionError;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		let trimmed = value.trim();
		let error = || ParseVersionError(value.to_string());
		let components: Vec<&str> = trimmed.split('.').collect();

		if trimmed.is_empty() || components.len() > 3 {
			return Err(error());
		}

		let mut numbers = [0_u64; 3];
		for (slot, component) in numbers.iter_mut().zip(&components) {
			if component.is_empty() || !component.bytes().all(|byte| byte.is_ascii_digit()) {
				return Err(error());
			}
			*slot = component.parse().map_err(|_| error())?;
		}

		Ok(Self::new(numbers[0], numbers[1], numbers[2]))
	}
}

impl fmt::Display for Version {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
	}
}

/// The `// dswift-tools-version: x.y.z` header that opts a template into tag
/// processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolsVersionHeader {
	pub version: Version,
	/// Byte length of the header line, including its line break.
	pub length: usize,
}

/// Parse the tools version header anchored at the very start of `source`.
///
/// Returns `Ok(None)` when the file does not declare a tools version. A header
/// whose version cannot be parsed is an error.
pub fn parse_tools_version_header(
	file: &Path,
	source: &str,
) -> DswiftResult<Option<ToolsVersionHeader>> {
	let Some(captures) = TOOLS_VERSION_HEADER.captures(source) else {
		return Ok(None);
	};

	let raw = captures.get(1).map_or("", |value| value.as_str());
	let version = raw.parse::<Version>().map_err(|_| {
		DswiftError::InvalidVersion {
			file: file.display().to_string(),
			line: 1,
			attribute: "dswift-tools-version".to_string(),
			value: raw.to_string(),
		}
	})?;
	let length = captures.get(0).map_or(0, |header| header.end());

	Ok(Some(ToolsVersionHeader { version, length }))
}

/// Check a declared tools version against the range this engine supports.
pub fn check_declared_tools_version(file: &Path, declared: Version) -> DswiftResult<()> {
	if declared < MINIMUM_TOOLS_VERSION {
		return Err(DswiftError::MinimumToolsVersionNotMet {
			file: file.display().to_string(),
			line: 1,
			feature: "dswift".to_string(),
			required: MINIMUM_TOOLS_VERSION.to_string(),
			declared: declared.to_string(),
		});
	}

	if declared > CURRENT_TOOLS_VERSION {
		return Err(DswiftError::ToolsVersionTooNew {
			file: file.display().to_string(),
			declared: declared.to_string(),
			current: CURRENT_TOOLS_VERSION.to_string(),
		});
	}

	Ok(())
}

/// Remove the tools version header line from `source`, if present.
pub fn strip_tools_version_header(source: &str) -> &str {
	TOOLS_VERSION_HEADER
		.find(source)
		.map_or(source, |header| &source[header.end()..])
}
