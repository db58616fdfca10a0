use std::iter::Peekable;
use std::path::Path;
use std::path::PathBuf;
use std::str::Chars;

use tempfile::TempDir;

use crate::DswiftResult;
use crate::GeneratorProgram;
use crate::ProgramRunner;
use crate::ProjectContext;
use crate::RunOutput;

pub(crate) fn temp_project() -> (TempDir, ProjectContext) {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	let project = ProjectContext::new(tmp.path());
	(tmp, project)
}

/// Write `content` to `relative` inside the project root, creating parent
/// directories. Returns the absolute path.
pub(crate) fn write_file(project: &ProjectContext, relative: &str, content: &str) -> PathBuf {
	let path = project.root().join(relative);
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).unwrap_or_else(|e| panic!("create_dir_all: {e}"));
	}
	std::fs::write(&path, content).unwrap_or_else(|e| panic!("write: {e}"));
	path
}

/// Run the `out.write("...")` statements of a generator's `generate()`
/// method. Only string literals and interpolated string literals are
/// understood, which is all text and inline blocks of literals produce.
pub(crate) fn interpret_generator(source: &str) -> String {
	let mut output = String::new();
	let mut inside = false;

	for line in source.lines() {
		let line = line.trim();
		if line.starts_with("public func generate() -> String {") {
			inside = true;
			continue;
		}

		if !inside {
			continue;
		}

		if line == "return out.text" {
			break;
		}

		if let Some(literal) = line
			.strip_prefix("out.write(\"")
			.and_then(|rest| rest.strip_suffix("\")"))
		{
			output.push_str(&unescape(literal));
		}
	}

	output
}

/// Drop the generated-file banner line.
pub(crate) fn without_banner(text: &str) -> &str {
	text.split_once('\n').map_or(text, |(_, rest)| rest)
}

fn unescape(literal: &str) -> String {
	let mut chars = literal.chars().peekable();
	let mut text = String::new();

	while let Some(character) = chars.next() {
		if character != '\\' {
			text.push(character);
			continue;
		}

		match chars.next() {
			Some('n') => text.push('\n'),
			Some('r') => text.push('\r'),
			Some('t') => text.push('\t'),
			Some('0') => text.push('\0'),
			Some('\\') => text.push('\\'),
			Some('"') => text.push('"'),
			Some('(') => text.push_str(&interpolate(&mut chars)),
			Some('u') => text.push(unicode_scalar(&mut chars, literal)),
			other => panic!("unsupported escape {other:?} in {literal}"),
		}
	}

	text
}

fn unicode_scalar(chars: &mut Peekable<Chars<'_>>, literal: &str) -> char {
	assert_eq!(chars.next(), Some('{'), "malformed unicode escape in {literal}");
	let digits: String = chars.by_ref().take_while(|character| *character != '}').collect();

	u32::from_str_radix(&digits, 16)
		.ok()
		.and_then(char::from_u32)
		.unwrap_or_else(|| panic!("invalid unicode escape `{digits}` in {literal}"))
}

fn interpolate(chars: &mut Peekable<Chars<'_>>) -> String {
	if chars.peek() != Some(&'"') {
		return chars.by_ref().take_while(|character| *character != ')').collect();
	}

	chars.next();
	let mut raw = String::new();
	while let Some(character) = chars.next() {
		match character {
			'\\' => {
				raw.push(character);
				if let Some(escaped) = chars.next() {
					raw.push(escaped);
				}
			}
			'"' => break,
			other => raw.push(other),
		}
	}
	assert_eq!(chars.next(), Some(')'), "unterminated interpolation");

	unescape(&raw)
}

/// Runs generator programs by interpreting them in process.
pub(crate) struct InterpretingRunner;

impl ProgramRunner for InterpretingRunner {
	fn run(&self, program: &GeneratorProgram, output: &Path) -> DswiftResult<RunOutput> {
		let text = interpret_generator(&program.source);
		std::fs::write(output, program.encoding.encode(&text))?;

		Ok(RunOutput::default())
	}
}

/// A runner whose program always fails.
pub(crate) struct FailingRunner;

impl ProgramRunner for FailingRunner {
	fn run(&self, _program: &GeneratorProgram, _output: &Path) -> DswiftResult<RunOutput> {
		Ok(RunOutput {
			status: 1,
			stdout: String::new(),
			stderr: "error: cannot find 'missing' in scope\n".to_string(),
		})
	}
}
