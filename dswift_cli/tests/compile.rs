mod common;

use dswift_core::AnyEmptyResult;
use predicates::prelude::PredicateBooleanExt;

#[test]
fn compile_prints_the_generator_program() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(
		tmp.path(),
		"Greeting.dswift",
		"<%! let name = \"World\" %>Hello <%= name %>!\n",
	);

	common::dswift_cmd()
		.arg("compile")
		.arg("Greeting.dswift")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(
			predicates::str::contains("import Foundation")
				.and(predicates::str::contains(
					"public class DSwiftGenerator0: CustomStringConvertible {",
				))
				.and(predicates::str::contains("let name = \"World\""))
				.and(predicates::str::contains("out.write(\"\\(name)\")"))
				.and(predicates::str::contains("String.Encoding.utf8")),
		);

	Ok(())
}

#[test]
fn compile_uses_the_requested_class_name() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(tmp.path(), "Plain.dswift", "plain\n");

	common::dswift_cmd()
		.arg("compile")
		.arg("Plain.dswift")
		.arg("--class-name")
		.arg("PlainGenerator")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(
			predicates::str::contains("public class PlainGenerator: CustomStringConvertible {")
				.and(predicates::str::contains("DSwiftGenerator").not()),
		);

	Ok(())
}

#[test]
fn compile_rejects_tags_without_header() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(tmp.path(), "Other.dswift", "other\n");
	common::write(
		tmp.path(),
		"Main.dswift",
		"text\n<%@include file=\"Other.dswift\"%>\n",
	);

	common::dswift_cmd()
		.arg("compile")
		.arg("Main.dswift")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("dswift::unprocessed_tag"));

	Ok(())
}

#[test]
fn compile_reports_unclosed_blocks() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(tmp.path(), "Broken.dswift", "line\n<% let x = 1\n");

	common::dswift_cmd()
		.arg("compile")
		.arg("Broken.dswift")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("dswift::missing_closing_block"));

	Ok(())
}
