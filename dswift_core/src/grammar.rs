/// Opening delimiter shared by every block kind.
pub const OPENING_DELIMITER: &str = "<%";
/// Closing delimiter shared by every block kind.
pub const CLOSING_DELIMITER: &str = "%>";
/// Character that marks a block as a tag (`<%@include ...%>`).
pub const TAG_INDICATOR: &str = "@";

/// One registered kind of block. Every kind except [`BlockKind::Text`] is
/// introduced by the grammar's opening delimiter followed by the kind's own
/// opening token, and terminated by the kind's closing token followed by the
/// grammar's closing delimiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
	/// A run of literal text outside of any block.
	Text,
	/// Statements inserted verbatim into the generator method.
	Basic { open: String, close: String },
	/// An expression whose interpolated value is appended to the output.
	Inline { open: String, close: String },
	/// Declarations hoisted to the generator class body.
	ClassScoped { open: String, close: String },
	/// Declarations hoisted to file scope, outside the generator class.
	GlobalScoped { open: String, close: String },
	/// A named, attribute-bearing block that must be expanded before
	/// compilation.
	Tag { name: String },
}

impl BlockKind {
	pub fn basic(open: impl Into<String>, close: impl Into<String>) -> Self {
		Self::Basic {
			open: open.into(),
			close: close.into(),
		}
	}

	pub fn inline(open: impl Into<String>, close: impl Into<String>) -> Self {
		Self::Inline {
			open: open.into(),
			close: close.into(),
		}
	}

	pub fn class_scoped(open: impl Into<String>, close: impl Into<String>) -> Self {
		Self::ClassScoped {
			open: open.into(),
			close: close.into(),
		}
	}

	pub fn global_scoped(open: impl Into<String>, close: impl Into<String>) -> Self {
		Self::GlobalScoped {
			open: open.into(),
			close: close.into(),
		}
	}

	pub fn tag(name: impl Into<String>) -> Self {
		Self::Tag { name: name.into() }
	}

	/// The token that follows the grammar's opening delimiter for this kind.
	/// Tags open with the tag indicator followed by their name.
	pub fn open_token(&self, tag_indicator: &str) -> String {
		match self {
			Self::Text => String::new(),
			Self::Basic { open, .. }
			| Self::Inline { open, .. }
			| Self::ClassScoped { open, .. }
			| Self::GlobalScoped { open, .. } => open.clone(),
			Self::Tag { name } => format!("{tag_indicator}{name}"),
		}
	}

	/// The token that precedes the grammar's closing delimiter for this kind.
	pub fn close_token(&self) -> &str {
		match self {
			Self::Text | Self::Tag { .. } => "",
			Self::Basic { close, .. }
			| Self::Inline { close, .. }
			| Self::ClassScoped { close, .. }
			| Self::GlobalScoped { close, .. } => close,
		}
	}

	/// The tag name when this is a [`BlockKind::Tag`].
	pub fn tag_name(&self) -> Option<&str> {
		match self {
			Self::Tag { name } => Some(name),
			_ => None,
		}
	}

	pub fn is_text(&self) -> bool {
		matches!(self, Self::Text)
	}
}

/// Delimiters and block kinds recognised by the scanner.
///
/// Kinds are kept sorted by descending opening-token length so that longer
/// tokens win over their prefixes (`!!` is tried before `!`, and every token
/// before the empty basic token).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockGrammar {
	opening: String,
	closing: String,
	tag_indicator: String,
	kinds: Vec<BlockKind>,
}

impl BlockGrammar {
	pub fn new(
		opening: impl Into<String>,
		closing: impl Into<String>,
		tag_indicator: impl Into<String>,
		kinds: Vec<BlockKind>,
	) -> Self {
		let tag_indicator = tag_indicator.into();
		let mut kinds: Vec<BlockKind> = kinds.into_iter().filter(|kind| !kind.is_text()).collect();
		kinds.sort_by_key(|kind| std::cmp::Reverse(kind.open_token(&tag_indicator).len()));

		Self {
			opening: opening.into(),
			closing: closing.into(),
			tag_indicator,
			kinds,
		}
	}

	pub fn opening(&self) -> &str {
		&self.opening
	}

	pub fn closing(&self) -> &str {
		&self.closing
	}

	pub fn tag_indicator(&self) -> &str {
		&self.tag_indicator
	}

	/// Registered kinds in match order.
	pub fn kinds(&self) -> &[BlockKind] {
		&self.kinds
	}

	/// Whether a tag named `name` is registered.
	pub fn has_tag(&self, name: &str) -> bool {
		self.kinds.iter().any(|kind| kind.tag_name() == Some(name))
	}
}

impl Default for BlockGrammar {
	/// The dswift template grammar: `<%!!` global, `<%!` class, `<%=` inline,
	/// `<%` basic, plus the `include` and `reference` tags.
	fn default() -> Self {
		Self::new(
			OPENING_DELIMITER,
			CLOSING_DELIMITER,
			TAG_INDICATOR,
			vec![
				BlockKind::basic("", ""),
				BlockKind::inline("=", ""),
				BlockKind::class_scoped("!", ""),
				BlockKind::global_scoped("!!", ""),
				BlockKind::tag("include"),
				BlockKind::tag("reference"),
			],
		)
	}
}
