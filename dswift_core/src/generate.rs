use std::path::Path;
use std::time::SystemTime;

use crate::DswiftError;
use crate::DswiftResult;
use crate::GENERATED_FILE_SENTINEL;
use crate::GenerationRun;
use crate::GeneratorProgram;
use crate::ProcessedTags;
use crate::ProjectContext;
use crate::Services;
use crate::TagExpander;
use crate::TextEncoding;
use crate::compile;
use crate::encoding::read_text;

/// What running a generator program produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutput {
	pub status: i32,
	pub stdout: String,
	pub stderr: String,
}

/// Builds and runs a generator program, asking it to write its result to
/// `output`.
pub trait ProgramRunner {
	fn run(&self, program: &GeneratorProgram, output: &Path) -> DswiftResult<RunOutput>;
}

/// A compiled template together with its expansion bookkeeping.
#[derive(Debug, Clone)]
pub struct CompiledTemplate {
	pub program: GeneratorProgram,
	pub processed: ProcessedTags,
}

/// The text a template generated.
#[derive(Debug, Clone)]
pub struct GeneratedOutput {
	pub text: String,
	pub encoding: TextEncoding,
	pub processed: ProcessedTags,
}

/// Expand the tags of `template` in a fresh generation run.
pub fn expand_template(
	template: &Path,
	project: &ProjectContext,
	services: &Services,
) -> DswiftResult<ProcessedTags> {
	let run = GenerationRun::new();
	TagExpander::new(project, services, &run).expand(template)
}

/// Expand and compile `template` into a generator program.
pub fn compile_template(
	template: &Path,
	project: &ProjectContext,
	services: &Services,
) -> DswiftResult<CompiledTemplate> {
	let processed = expand_template(template, project, services)?;
	let class_name = services.names.next();
	let program = compile(&services.grammar, template, &processed, &class_name)?;

	Ok(CompiledTemplate { program, processed })
}

/// Generate the output text of `template` by compiling it and running the
/// resulting program with `runner`.
pub fn generate(
	template: &Path,
	project: &ProjectContext,
	services: &Services,
	runner: &dyn ProgramRunner,
) -> DswiftResult<GeneratedOutput> {
	let CompiledTemplate { program, processed } = compile_template(template, project, services)?;
	let directory = tempfile::tempdir()?;
	let output_path = directory.path().join("output.txt");

	let result = runner.run(&program, &output_path)?;
	if result.status != 0 {
		return Err(DswiftError::GeneratorFailed {
			template: template.display().to_string(),
			status: result.status,
			stderr: result.stderr.trim().to_string(),
		});
	}

	let text = read_text(&output_path, Some(program.encoding))?.text;
	if text.is_empty() {
		tracing::warn!(template = %template.display(), "generator produced no output");
	}

	tracing::info!(
		template = %template.display(),
		class_name = %program.class_name,
		bytes = text.len(),
		"generated output"
	);

	Ok(GeneratedOutput {
		text,
		encoding: program.encoding,
		processed,
	})
}

/// Whether `output` has to be generated again from `template`.
///
/// This is the case when the output is missing, lacks the generated-file
/// marker, or is older than the template or any file the template depends on.
pub fn needs_regeneration(
	template: &Path,
	output: &Path,
	project: &ProjectContext,
	services: &Services,
) -> DswiftResult<bool> {
	if !output.is_file() {
		tracing::debug!(output = %output.display(), "output is missing");
		return Ok(true);
	}

	let existing = read_text(output, project.declared_encoding(output))?;
	if !existing.text.contains(GENERATED_FILE_SENTINEL) {
		tracing::debug!(output = %output.display(), "output was not generated by dswift");
		return Ok(true);
	}

	let generated_at = modified(output)?;
	if modified(template)? > generated_at {
		return Ok(true);
	}

	let processed = expand_template(template, project, services)?;
	for dependency in processed.dependencies()? {
		if !dependency.exists() {
			continue;
		}

		if modified(&dependency)? > generated_at {
			tracing::debug!(dependency = %dependency.display(), "dependency changed");
			return Ok(true);
		}
	}

	Ok(false)
}

fn modified(path: &Path) -> DswiftResult<SystemTime> {
	Ok(std::fs::metadata(path)?.modified()?)
}
