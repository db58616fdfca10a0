use std::path::Path;
use std::path::PathBuf;
use std::process::Command;

use dswift_core::DswiftError;
use dswift_core::DswiftResult;
use dswift_core::GeneratorProgram;
use dswift_core::ProgramRunner;
use dswift_core::RunOutput;
use dswift_core::SwiftConfig;

/// Builds generator programs as Swift packages and runs them with
/// `swift run`.
#[derive(Debug, Clone)]
pub struct SwiftRunner {
	swift: PathBuf,
	build_arguments: Vec<String>,
}

impl SwiftRunner {
	pub fn new(config: &SwiftConfig) -> Self {
		Self {
			swift: config.path.clone(),
			build_arguments: config.build_arguments.clone(),
		}
	}
}

impl ProgramRunner for SwiftRunner {
	fn run(&self, program: &GeneratorProgram, output: &Path) -> DswiftResult<RunOutput> {
		let package = tempfile::tempdir()?;
		write_package(program, package.path())?;

		tracing::debug!(
			swift = %self.swift.display(),
			package = %package.path().display(),
			class_name = %program.class_name,
			"running generator"
		);

		let result = Command::new(&self.swift)
			.current_dir(package.path())
			.arg("run")
			.args(&self.build_arguments)
			.arg(&program.class_name)
			.arg(output)
			.output()
			.map_err(|error| {
				DswiftError::SwiftNotFound {
					path: self.swift.display().to_string(),
					reason: error.to_string(),
				}
			})?;

		Ok(RunOutput {
			status: result.status.code().unwrap_or(-1),
			stdout: String::from_utf8_lossy(&result.stdout).into_owned(),
			stderr: String::from_utf8_lossy(&result.stderr).into_owned(),
		})
	}
}

/// Lay out `program` as a package in `directory`: a `Package.swift` manifest
/// and `Sources/<class name>/main.swift`.
pub fn write_package(program: &GeneratorProgram, directory: &Path) -> DswiftResult<PathBuf> {
	let sources = directory.join("Sources").join(&program.class_name);
	std::fs::create_dir_all(&sources)?;
	std::fs::write(directory.join("Package.swift"), program.package_manifest())?;

	let main = sources.join("main.swift");
	std::fs::write(&main, &program.source)?;

	Ok(main)
}

#[cfg(test)]
mod tests {
	use dswift_core::AnyEmptyResult;
	use dswift_core::TextEncoding;

	use super::*;

	fn program() -> GeneratorProgram {
		GeneratorProgram {
			class_name: "DSwiftGenerator3".to_string(),
			source: "print(\"hi\")\n".to_string(),
			packages: Vec::new(),
			encoding: TextEncoding::Utf8,
		}
	}

	#[test]
	fn writes_package_layout() -> AnyEmptyResult {
		let tmp = tempfile::tempdir()?;
		let main = write_package(&program(), tmp.path())?;

		assert_eq!(main, tmp.path().join("Sources/DSwiftGenerator3/main.swift"));
		assert_eq!(std::fs::read_to_string(&main)?, "print(\"hi\")\n");
		assert!(
			std::fs::read_to_string(tmp.path().join("Package.swift"))?
				.contains("name: \"DSwiftGenerator3\"")
		);

		Ok(())
	}

	#[test]
	fn missing_swift_is_reported() -> AnyEmptyResult {
		let tmp = tempfile::tempdir()?;
		let runner = SwiftRunner::new(&SwiftConfig {
			path: tmp.path().join("no-such-swift"),
			build_arguments: Vec::new(),
		});

		let result = runner.run(&program(), &tmp.path().join("output.txt"));

		assert!(
			matches!(result, Err(DswiftError::SwiftNotFound { .. })),
			"{result:?}"
		);

		Ok(())
	}
}
