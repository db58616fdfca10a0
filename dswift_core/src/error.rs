use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum DswiftError {
	#[error(transparent)]
	#[diagnostic(code(dswift::io_error))]
	Io(#[from] std::io::Error),

	#[error("failed to read `{path}`: {reason}")]
	#[diagnostic(code(dswift::read_file))]
	ReadFile { path: String, reason: String },

	#[error("`{path}` is not valid {encoding} text")]
	#[diagnostic(
		code(dswift::invalid_encoding),
		help("declare the file's encoding under [encodings] in dswift.toml")
	)]
	InvalidEncoding { path: String, encoding: String },

	#[error("missing opening block for `{marker}` in {file}, on line {line}")]
	#[diagnostic(
		code(dswift::missing_opening_block),
		help("literal `{marker}` in template text must be produced from a code block")
	)]
	MissingOpeningBlock {
		file: String,
		line: usize,
		marker: String,
	},

	#[error("missing closing block for `{opening}` in {file}, started on line {line}")]
	#[diagnostic(code(dswift::missing_closing_block), help("add `{closing}` to close this block"))]
	MissingClosingBlock {
		file: String,
		line: usize,
		opening: String,
		closing: String,
	},

	#[error("unrecognised block in {file}, on line {line}")]
	#[diagnostic(code(dswift::unknown_block_kind))]
	UnknownBlockKind { file: String, line: usize },

	#[error("unknown tag `{name}` in {file}, on line {line}")]
	#[diagnostic(code(dswift::unknown_tag), help("available tags: include, reference"))]
	UnknownTag {
		file: String,
		line: usize,
		name: String,
	},

	#[error("invalid tag in {file}, on line {line}: {reason}")]
	#[diagnostic(
		code(dswift::invalid_tag),
		help("tag attributes are written as name=\"value\" or name='value'")
	)]
	InvalidTag {
		file: String,
		line: usize,
		reason: String,
	},

	#[error("`{tag}` tag in {file}, on line {line} is missing attribute {expected}")]
	#[diagnostic(code(dswift::missing_tag_attributes))]
	MissingTagAttributes {
		file: String,
		line: usize,
		tag: String,
		expected: String,
	},

	#[error("`{tag}` tag in {file}, on line {line} has unsupported attribute(s): {attributes}")]
	#[diagnostic(code(dswift::invalid_tag_attributes))]
	InvalidTagAttributes {
		file: String,
		line: usize,
		tag: String,
		attributes: String,
	},

	#[error("invalid value `{value}` for attribute `{attribute}` in {file}, on line {line}")]
	#[diagnostic(code(dswift::invalid_tag_attribute_value), help("expected {expected}"))]
	InvalidTagAttributeValue {
		file: String,
		line: usize,
		attribute: String,
		value: String,
		expected: String,
	},

	#[error(
		"invalid regular expression `{value}` for attribute `{attribute}` in {file}, on line \
		 {line}: {reason}"
	)]
	#[diagnostic(code(dswift::invalid_tag_attribute_regex))]
	InvalidTagAttributeRegExValue {
		file: String,
		line: usize,
		attribute: String,
		value: String,
		reason: String,
	},

	#[error("invalid version `{value}` for `{attribute}` in {file}, on line {line}")]
	#[diagnostic(
		code(dswift::invalid_version),
		help("versions are written as major[.minor[.patch]]")
	)]
	InvalidVersion {
		file: String,
		line: usize,
		attribute: String,
		value: String,
	},

	#[error("invalid version range `{value}` in {file}, on line {line}: {reason}")]
	#[diagnostic(
		code(dswift::invalid_version_range),
		help("ranges are written as `lower..<upper` or `lower...upper`")
	)]
	InvalidVersionRange {
		file: String,
		line: usize,
		value: String,
		reason: String,
	},

	#[error("{attribute} `{path}` referenced in {file}, on line {line} does not exist")]
	#[diagnostic(code(dswift::resource_not_found))]
	ResourceNotFound {
		file: String,
		line: usize,
		attribute: String,
		path: String,
	},

	#[error(
		"{feature} on line {line} of {file} requires dswift-tools-version {required}, but the file \
		 declares {declared}"
	)]
	#[diagnostic(
		code(dswift::minimum_tools_version),
		help("raise the `// dswift-tools-version:` header to at least {required}")
	)]
	MinimumToolsVersionNotMet {
		file: String,
		line: usize,
		feature: String,
		required: String,
		declared: String,
	},

	#[error("{file} declares dswift-tools-version {declared}, newer than this dswift ({current})")]
	#[diagnostic(code(dswift::tools_version_too_new))]
	ToolsVersionTooNew {
		file: String,
		declared: String,
		current: String,
	},

	#[error("unprocessed `{name}` tag in {file}, on line {line}")]
	#[diagnostic(
		code(dswift::unprocessed_tag),
		help("tags are only expanded in files starting with `// dswift-tools-version: 2.0.0`")
	)]
	UnprocessedTag {
		file: String,
		line: usize,
		name: String,
	},

	#[error("include cycle detected: {chain}")]
	#[diagnostic(
		code(dswift::include_cycle),
		help("add onlyonce=\"true\" to the include or remove the circular include")
	)]
	IncludeCycle { chain: String },

	#[error("symlink cycle detected at: `{path}`")]
	#[diagnostic(
		code(dswift::symlink_cycle),
		help("remove the circular symlink or exclude this path")
	)]
	SymlinkCycle { path: String },

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(dswift::config_parse),
		help("check that dswift.toml is valid TOML with [exclude], [swift] and/or [encodings] sections")
	)]
	ConfigParse(String),

	#[error("swift executable `{path}` could not be started: {reason}")]
	#[diagnostic(
		code(dswift::swift_not_found),
		help("install the Swift toolchain or set `path` under [swift] in dswift.toml")
	)]
	SwiftNotFound { path: String, reason: String },

	#[error("generator for `{template}` exited with status {status}")]
	#[diagnostic(code(dswift::generator_failed), help("{stderr}"))]
	GeneratorFailed {
		template: String,
		status: i32,
		stderr: String,
	},

	#[error("internal error: {0}")]
	#[diagnostic(code(dswift::internal))]
	InternalError(String),
}

pub type DswiftResult<T> = Result<T, DswiftError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
