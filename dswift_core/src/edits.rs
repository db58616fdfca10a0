use std::ops::Range;

use crate::DswiftError;
use crate::DswiftResult;

/// Replace `range` of the original text with `replacement`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
	pub range: Range<usize>,
	pub replacement: String,
}

/// The result of [`EditList::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
	pub text: String,
	/// Where each edit's replacement ended up in `text`, in edit order.
	pub spans: Vec<Range<usize>>,
}

/// An immutable source text plus an ordered list of non-overlapping edits.
///
/// Edits are always expressed against the original text. Final positions are
/// derived from the running totals of removed and inserted bytes, so no offset
/// is ever patched after the fact.
///
/// ```rust
/// use dswift_core::EditList;
///
/// let mut edits = EditList::new("a <%@x%> b <%@y%> c");
/// edits.push(2..8, "XX").unwrap();
/// edits.push(11..17, "").unwrap();
///
/// let rewritten = edits.apply();
/// assert_eq!(rewritten.text, "a XX b  c");
/// assert_eq!(rewritten.spans, vec![2..4, 7..7]);
/// ```
#[derive(Debug, Clone)]
pub struct EditList<'a> {
	original: &'a str,
	edits: Vec<Edit>,
}

impl<'a> EditList<'a> {
	pub fn new(original: &'a str) -> Self {
		Self {
			original,
			edits: Vec::new(),
		}
	}

	pub fn original(&self) -> &'a str {
		self.original
	}

	pub fn edits(&self) -> &[Edit] {
		&self.edits
	}

	pub fn len(&self) -> usize {
		self.edits.len()
	}

	pub fn is_empty(&self) -> bool {
		self.edits.is_empty()
	}

	/// Append an edit. Edits must be pushed in source order, must not overlap
	/// and must start and end on character boundaries.
	pub fn push(&mut self, range: Range<usize>, replacement: impl Into<String>) -> DswiftResult<()> {
		if range.start > range.end || range.end > self.original.len() {
			return Err(DswiftError::InternalError(format!(
				"edit {range:?} is outside of a {} byte source",
				self.original.len()
			)));
		}

		if !self.original.is_char_boundary(range.start) || !self.original.is_char_boundary(range.end)
		{
			return Err(DswiftError::InternalError(format!(
				"edit {range:?} does not fall on character boundaries"
			)));
		}

		if let Some(previous) = self.edits.last() {
			if range.start < previous.range.end {
				return Err(DswiftError::InternalError(format!(
					"edit {range:?} overlaps or precedes edit {:?}",
					previous.range
				)));
			}
		}

		self.edits.push(Edit {
			range,
			replacement: replacement.into(),
		});

		Ok(())
	}

	/// Map an offset in the original text to its offset in the rewritten text.
	/// Offsets inside an edited range map to the start of its replacement.
	pub fn shifted(&self, offset: usize) -> usize {
		let mut removed = 0;
		let mut inserted = 0;

		for edit in &self.edits {
			if edit.range.end <= offset {
				removed += edit.range.len();
				inserted += edit.replacement.len();
			} else if edit.range.start < offset {
				return edit.range.start - removed + inserted;
			} else {
				break;
			}
		}

		offset - removed + inserted
	}

	/// Produce the rewritten text in a single pass.
	pub fn apply(&self) -> Rewritten {
		let capacity = self
			.edits
			.iter()
			.fold(self.original.len(), |total, edit| {
				(total - edit.range.len()) + edit.replacement.len()
			});
		let mut text = String::with_capacity(capacity);
		let mut spans = Vec::with_capacity(self.edits.len());
		let mut cursor = 0;

		for edit in &self.edits {
			text.push_str(&self.original[cursor..edit.range.start]);
			let start = text.len();
			text.push_str(&edit.replacement);
			spans.push(start..text.len());
			cursor = edit.range.end;
		}

		text.push_str(&self.original[cursor..]);

		Rewritten { text, spans }
	}
}
