use std::ops::Range;
use std::path::Path;

use crate::BlockGrammar;
use crate::BlockKind;
use crate::DswiftError;
use crate::DswiftResult;

/// A block found by the [`BlockScanner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedBlock {
	/// Byte range of the whole block, delimiters included.
	pub range: Range<usize>,
	/// Byte range between the kind's opening token and its closing token.
	/// For tags this starts right after the tag name.
	pub inner: Range<usize>,
	/// The kind that matched.
	pub kind: BlockKind,
	/// The block's body. Text blocks keep their content byte for byte; code
	/// blocks have one leading and one trailing line break removed and `\r`
	/// stripped from the end of every line.
	pub body: String,
}

/// Returns the 1-indexed line containing the byte at `offset`.
pub fn line_number(source: &str, offset: usize) -> usize {
	let offset = offset.min(source.len());
	source.as_bytes()[..offset]
		.iter()
		.filter(|byte| **byte == b'\n')
		.count()
		+ 1
}

/// Walks a template source left to right, yielding one block per call.
///
/// ```rust
/// use std::path::Path;
///
/// use dswift_core::BlockGrammar;
/// use dswift_core::BlockScanner;
///
/// let grammar = BlockGrammar::default();
/// let blocks = BlockScanner::new(&grammar, Path::new("a.dswift"), "Hi <%= name %>!")
/// 	.collect::<Result<Vec<_>, _>>()
/// 	.unwrap();
/// assert_eq!(blocks.len(), 3);
/// assert_eq!(blocks[1].body, " name ");
/// ```
pub struct BlockScanner<'a> {
	grammar: &'a BlockGrammar,
	file: &'a Path,
	source: &'a str,
	cursor: usize,
	failed: bool,
}

impl<'a> BlockScanner<'a> {
	pub fn new(grammar: &'a BlockGrammar, file: &'a Path, source: &'a str) -> Self {
		Self {
			grammar,
			file,
			source,
			cursor: 0,
			failed: false,
		}
	}

	/// Find the block starting at `cursor`. Returns `None` only at the end of
	/// the source.
	pub fn scan_at(&self, cursor: usize) -> DswiftResult<Option<ParsedBlock>> {
		let source = self.source;
		if cursor >= source.len() {
			return Ok(None);
		}

		let rest = &source[cursor..];
		let opening = rest.find(self.grammar.opening()).map(|index| cursor + index);
		let closing = rest.find(self.grammar.closing()).map(|index| cursor + index);

		if let Some(closing) = closing {
			if opening.is_none_or(|opening| closing < opening) {
				return Err(DswiftError::MissingOpeningBlock {
					file: self.file.display().to_string(),
					line: line_number(source, closing),
					marker: self.grammar.closing().to_string(),
				});
			}
		}

		match opening {
			None => Ok(Some(text_block(source, cursor..source.len()))),
			Some(opening) if opening > cursor => Ok(Some(text_block(source, cursor..opening))),
			Some(opening) => self.scan_code_block(opening).map(Some),
		}
	}

	fn scan_code_block(&self, opening: usize) -> DswiftResult<ParsedBlock> {
		let source = self.source;
		let marker_end = opening + self.grammar.opening().len();
		let after = &source[marker_end..];
		let tag_indicator = self.grammar.tag_indicator();

		let matched = self.grammar.kinds().iter().find_map(|kind| {
			let token = kind.open_token(tag_indicator);
			if !after.starts_with(&token) {
				return None;
			}

			// A tag name must not run into further identifier characters.
			if kind.tag_name().is_some()
				&& after[token.len()..]
					.chars()
					.next()
					.is_some_and(|next| next.is_alphanumeric() || next == '_')
			{
				return None;
			}

			Some((kind, token))
		});

		let Some((kind, token)) = matched else {
			return Err(DswiftError::UnknownBlockKind {
				file: self.file.display().to_string(),
				line: line_number(source, opening),
			});
		};

		if kind.tag_name().is_none()
			&& !tag_indicator.is_empty()
			&& after.starts_with(tag_indicator)
		{
			let name: String = after[tag_indicator.len()..]
				.chars()
				.take_while(|next| next.is_alphanumeric() || *next == '_')
				.collect();

			return Err(DswiftError::UnknownTag {
				file: self.file.display().to_string(),
				line: line_number(source, opening),
				name,
			});
		}

		let content_start = marker_end + token.len();
		let terminator = format!("{}{}", kind.close_token(), self.grammar.closing());
		let Some(content_end) = source[content_start..]
			.find(&terminator)
			.map(|index| content_start + index)
		else {
			return Err(DswiftError::MissingClosingBlock {
				file: self.file.display().to_string(),
				line: line_number(source, opening),
				opening: format!("{}{token}", self.grammar.opening()),
				closing: terminator,
			});
		};

		tracing::trace!(
			file = %self.file.display(),
			offset = opening,
			kind = ?kind,
			"scanned block"
		);

		Ok(ParsedBlock {
			range: opening..content_end + terminator.len(),
			inner: content_start..content_end,
			kind: kind.clone(),
			body: trim_body(&source[content_start..content_end]),
		})
	}
}

impl Iterator for BlockScanner<'_> {
	type Item = DswiftResult<ParsedBlock>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.failed {
			return None;
		}

		match self.scan_at(self.cursor) {
			Ok(Some(block)) => {
				self.cursor = block.range.end;
				Some(Ok(block))
			}
			Ok(None) => None,
			Err(error) => {
				self.failed = true;
				Some(Err(error))
			}
		}
	}
}

fn text_block(source: &str, range: Range<usize>) -> ParsedBlock {
	ParsedBlock {
		inner: range.clone(),
		body: source[range.clone()].to_string(),
		range,
		kind: BlockKind::Text,
	}
}

/// Remove one leading and one trailing line break so that block delimiters
/// can sit on their own lines, then strip `\r` from every line end.
pub(crate) fn trim_body(raw: &str) -> String {
	let body = raw
		.strip_prefix("\r\n")
		.or_else(|| raw.strip_prefix('\n'))
		.unwrap_or(raw);
	let body = body
		.strip_suffix("\r\n")
		.or_else(|| body.strip_suffix('\n'))
		.unwrap_or(body);

	body.split('\n')
		.map(|line| line.strip_suffix('\r').unwrap_or(line))
		.collect::<Vec<_>>()
		.join("\n")
}
