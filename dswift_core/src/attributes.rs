use std::collections::BTreeMap;
use std::ops::Range;
use std::path::Path;

use derive_more::Deref;
use derive_more::DerefMut;

use crate::DswiftError;
use crate::DswiftResult;
use crate::scanner::line_number;

/// Attributes of a tag keyed by lower-cased name. Values are kept exactly as
/// written between the quotes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, DerefMut)]
pub struct TagAttributes(BTreeMap<String, String>);

impl TagAttributes {
	/// Names of every attribute still present, in sorted order.
	pub fn names(&self) -> Vec<&str> {
		self.0.keys().map(String::as_str).collect()
	}
}

/// Parse the `name="value"` pairs found in `source[range]`, where `range`
/// starts right after the tag name and ends at the tag's closing delimiter.
///
/// Names may not be separated from `=` by whitespace and values must be
/// quoted with `"` or `'`. Values cannot contain their own quote character
/// or a line break; no escape sequences are processed.
pub fn parse_attributes(
	file: &Path,
	source: &str,
	range: Range<usize>,
) -> DswiftResult<TagAttributes> {
	let bytes = source.as_bytes();
	let end = range.end.min(source.len());
	let mut cursor = range.start;
	let mut attributes = TagAttributes::default();

	let invalid = |offset: usize, reason: String| {
		DswiftError::InvalidTag {
			file: file.display().to_string(),
			line: line_number(source, offset),
			reason,
		}
	};

	loop {
		while cursor < end && bytes[cursor].is_ascii_whitespace() {
			cursor += 1;
		}

		if cursor >= end {
			break;
		}

		let name_start = cursor;
		while cursor < end && !bytes[cursor].is_ascii_whitespace() && bytes[cursor] != b'=' {
			cursor += 1;
		}
		let name = &source[name_start..cursor];

		if cursor >= end {
			return Err(invalid(
				name_start,
				format!("missing `=` after attribute `{name}`"),
			));
		}

		if bytes[cursor] != b'=' {
			return Err(invalid(
				cursor,
				format!("unexpected whitespace after attribute name `{name}`"),
			));
		}

		if name.is_empty() {
			return Err(invalid(cursor, "missing attribute name before `=`".to_string()));
		}

		cursor += 1;
		let quote = match bytes.get(cursor) {
			Some(quote @ (b'"' | b'\'')) if cursor < end => *quote,
			_ => {
				return Err(invalid(
					cursor,
					format!("expected `\"` or `'` after `{name}=`"),
				));
			}
		};

		cursor += 1;
		let value_start = cursor;
		loop {
			if cursor >= end {
				return Err(invalid(
					value_start,
					format!("missing attribute value end for `{name}`"),
				));
			}

			match bytes[cursor] {
				b'\n' => {
					return Err(invalid(
						cursor,
						format!("invalid character in attribute value for `{name}`"),
					));
				}
				byte if byte == quote => break,
				_ => cursor += 1,
			}
		}

		let key = name.to_lowercase();
		if attributes.contains_key(&key) {
			return Err(invalid(name_start, format!("duplicate attribute `{key}`")));
		}

		attributes.insert(key, source[value_start..cursor].to_string());
		cursor += 1;
	}

	Ok(attributes)
}
