//! Turns tag-free template text into the source of a Swift generator program.

use std::fmt::Write as _;
use std::path::Path;

use crate::BlockGrammar;
use crate::BlockKind;
use crate::BlockScanner;
use crate::CURRENT_TOOLS_VERSION;
use crate::DswiftError;
use crate::DswiftResult;
use crate::PackageDependency;
use crate::ParsedBlock;
use crate::ProcessedTags;
use crate::TextEncoding;
use crate::scanner::line_number;

/// Marker present in every generated file. Outputs without it are never
/// considered up to date.
pub const GENERATED_FILE_SENTINEL: &str = "Please do not modify directly.";

/// Swift tools version written into generated package manifests.
pub const MANIFEST_SWIFT_TOOLS_VERSION: &str = "5.5";

const OUTPUT_BUFFER: &str = r#"final class Out: TextOutputStream, CustomStringConvertible {
	private(set) var text: String = ""

	var description: String { return text }

	func write(_ string: String) {
		text += string
	}

	func println(_ value: Any = "") {
		write("\(value)\n")
	}

	static func += (lhs: Out, rhs: String) {
		lhs.write(rhs)
	}
}
"#;

/// What a single block contributes to the generator program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedContent {
	/// Statements run inside `generate()`.
	Statement(String),
	/// Declarations placed in the generator class body.
	ClassDeclaration(String),
	/// Declarations placed at file scope.
	GlobalDeclaration(String),
}

/// The three sections a template compiles into.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledSections {
	pub generator_body: String,
	pub class_section: String,
	pub global_section: String,
}

impl CompiledSections {
	pub fn push(&mut self, content: GeneratedContent) {
		let (section, code) = match content {
			GeneratedContent::Statement(code) => (&mut self.generator_body, code),
			GeneratedContent::ClassDeclaration(code) => (&mut self.class_section, code),
			GeneratedContent::GlobalDeclaration(code) => (&mut self.global_section, code),
		};

		section.push_str(&code);
		if !code.is_empty() && !code.ends_with('\n') {
			section.push('\n');
		}
	}
}

/// Escape `text` for use inside a Swift string literal.
pub fn escape_swift_string(text: &str) -> String {
	let mut escaped = String::with_capacity(text.len());

	for character in text.chars() {
		match character {
			'\\' => escaped.push_str("\\\\"),
			'"' => escaped.push_str("\\\""),
			'\n' => escaped.push_str("\\n"),
			'\r' => escaped.push_str("\\r"),
			'\t' => escaped.push_str("\\t"),
			'\0' => escaped.push_str("\\0"),
			// Swift rejects raw control characters inside string literals.
			other if other.is_control() => {
				let _ = write!(escaped, "\\u{{{:x}}}", u32::from(other));
			}
			other => escaped.push(other),
		}
	}

	escaped
}

/// The banner written at the top of every generated file.
pub fn generated_banner(template: &str) -> String {
	format!(
		"// This file was dynamically generated from '{template}' by dswift \
		 v{CURRENT_TOOLS_VERSION}. {GENERATED_FILE_SENTINEL}"
	)
}

/// Compile one block.
pub fn compile_block(file: &Path, source: &str, block: &ParsedBlock) -> DswiftResult<GeneratedContent> {
	let content = match &block.kind {
		BlockKind::Text => GeneratedContent::Statement(text_statements(&block.body)),
		BlockKind::Basic { .. } => GeneratedContent::Statement(block.body.clone()),
		BlockKind::Inline { .. } => {
			GeneratedContent::Statement(format!("\t\tout.write(\"\\({})\")", block.body.trim()))
		}
		BlockKind::ClassScoped { .. } => GeneratedContent::ClassDeclaration(block.body.clone()),
		BlockKind::GlobalScoped { .. } => GeneratedContent::GlobalDeclaration(block.body.clone()),
		BlockKind::Tag { name } => {
			return Err(DswiftError::UnprocessedTag {
				file: file.display().to_string(),
				line: line_number(source, block.range.start),
				name: name.clone(),
			});
		}
	};

	Ok(content)
}

/// One `out.write` per line, with line breaks restored between lines but not
/// after the last one.
fn text_statements(text: &str) -> String {
	let lines: Vec<&str> = text.split('\n').collect();
	let last = lines.len() - 1;
	let mut statements = String::new();

	for (index, line) in lines.iter().enumerate() {
		if index < last {
			let _ = writeln!(statements, "\t\tout.write(\"{}\\n\")", escape_swift_string(line));
		} else if !line.is_empty() {
			let _ = writeln!(statements, "\t\tout.write(\"{}\")", escape_swift_string(line));
		}
	}

	statements
}

/// Scan `source` and sort every block into its section.
pub fn compile_sections(
	grammar: &BlockGrammar,
	file: &Path,
	source: &str,
) -> DswiftResult<CompiledSections> {
	let mut sections = CompiledSections::default();

	for block in BlockScanner::new(grammar, file, source) {
		sections.push(compile_block(file, source, &block?)?);
	}

	Ok(sections)
}

/// A complete generator program ready to be built and run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorProgram {
	pub class_name: String,
	/// The `main.swift` source.
	pub source: String,
	pub packages: Vec<PackageDependency>,
	/// The encoding the program writes its output with.
	pub encoding: TextEncoding,
}

impl GeneratorProgram {
	/// A `Package.swift` building the program as an executable target named
	/// after its class.
	pub fn package_manifest(&self) -> String {
		let name = &self.class_name;
		let mut manifest = format!(
			"// swift-tools-version:{MANIFEST_SWIFT_TOOLS_VERSION}\nimport PackageDescription\n\nlet \
			 package = Package(\n\tname: \"{name}\",\n\tdependencies: [\n"
		);

		for package in &self.packages {
			let _ = writeln!(manifest, "\t\t{},", package.manifest_entry());
		}

		let _ = write!(
			manifest,
			"\t],\n\ttargets: [\n\t\t.executableTarget(\n\t\t\tname: \"{name}\",\n\t\t\tdependencies: \
			 [\n"
		);

		for package in &self.packages {
			for product in package.product_entries() {
				let _ = writeln!(manifest, "\t\t\t\t{product},");
			}
		}

		manifest.push_str("\t\t\t]\n\t\t),\n\t]\n)\n");
		manifest
	}
}

/// Compile an expanded template into a generator program named `class_name`.
pub fn compile(
	grammar: &BlockGrammar,
	template: &Path,
	processed: &ProcessedTags,
	class_name: &str,
) -> DswiftResult<GeneratorProgram> {
	let sections = compile_sections(grammar, template, &processed.source)?;
	let template_name = template
		.file_name()
		.map_or_else(|| template.display().to_string(), |name| name.to_string_lossy().into_owned());
	let encoding = processed.encoding;

	let mut source = String::from("import Foundation\n");
	for package in &processed.include_packages {
		for name in &package.package_names {
			let _ = writeln!(source, "import {name}");
		}
	}
	source.push('\n');

	if !sections.global_section.is_empty() {
		source.push_str(&sections.global_section);
		source.push('\n');
	}

	source.push_str(OUTPUT_BUFFER);
	source.push('\n');

	let _ = writeln!(source, "public class {class_name}: CustomStringConvertible {{");
	source.push_str(&sections.class_section);
	source.push_str("\tpublic var description: String { return generate() }\n\n");
	source.push_str("\tpublic init() {}\n\n");
	source.push_str("\tpublic func generate() -> String {\n");
	source.push_str("\t\tvar out = Out()\n");
	let _ = writeln!(
		source,
		"\t\tout.write(\"{}\\n\")",
		escape_swift_string(&generated_banner(&template_name))
	);
	source.push_str(&sections.generator_body);
	source.push_str("\t\treturn out.text\n");
	source.push_str("\t}\n}\n\n");

	let _ = write!(
		source,
		r#"let arguments = CommandLine.arguments
guard arguments.count == 2 else {{
	FileHandle.standardError.write(Data("usage: \(arguments[0]) <output-file>\n".utf8))
	exit(1)
}}

do {{
	try {class_name}().generate().write(toFile: arguments[1], atomically: true, encoding: String.Encoding.{encoding})
}} catch {{
	FileHandle.standardError.write(Data("\(error)\n".utf8))
	exit(1)
}}
"#,
		encoding = encoding.swift_name()
	);

	tracing::debug!(
		template = %template.display(),
		class_name,
		packages = processed.include_packages.len(),
		"compiled generator program"
	);

	Ok(GeneratorProgram {
		class_name: class_name.to_string(),
		source,
		packages: processed.include_packages.clone(),
		encoding,
	})
}
