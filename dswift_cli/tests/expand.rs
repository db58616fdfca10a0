mod common;

use dswift_core::AnyEmptyResult;
use predicates::prelude::PredicateBooleanExt;

#[test]
fn expand_inlines_included_files() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(
		tmp.path(),
		"Sources/Model.dswift",
		"// dswift-tools-version: 2.0.0\nstruct Model {\n\t<%@include file=\"Fields.dswift\" quiet=\"true\"%>\n}\n",
	);
	common::write(tmp.path(), "Sources/Fields.dswift", "let a = 1\nlet b = 2\n");

	common::dswift_cmd()
		.arg("expand")
		.arg("Sources/Model.dswift")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout("// dswift-tools-version: 2.0.0\nstruct Model {\n\tlet a = 1\n\tlet b = 2\n}\n");

	Ok(())
}

#[test]
fn expand_leaves_templates_without_header_alone() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let source = "Hello <%= name %>\n<%@include file=\"Other.dswift\"%>\n";
	common::write(tmp.path(), "Plain.dswift", source);

	common::dswift_cmd()
		.arg("expand")
		.arg("Plain.dswift")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(source);

	Ok(())
}

#[test]
fn expand_reports_include_cycles() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(
		tmp.path(),
		"A.dswift",
		"// dswift-tools-version: 2.0.0\n<%@include file=\"B.dswift\"%>\n",
	);
	common::write(
		tmp.path(),
		"B.dswift",
		"// dswift-tools-version: 2.0.0\n<%@include file=\"A.dswift\"%>\n",
	);

	common::dswift_cmd()
		.arg("expand")
		.arg("A.dswift")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("dswift::include_cycle"));

	Ok(())
}

#[test]
fn expand_reports_unknown_attributes() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(tmp.path(), "Part.dswift", "part\n");
	common::write(
		tmp.path(),
		"Main.dswift",
		"// dswift-tools-version: 2.0.0\n<%@include file=\"Part.dswift\" once=\"true\"%>\n",
	);

	common::dswift_cmd()
		.arg("expand")
		.arg("Main.dswift")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(
			predicates::str::contains("dswift::invalid_tag_attributes")
				.and(predicates::str::contains("`once`")),
		);

	Ok(())
}
