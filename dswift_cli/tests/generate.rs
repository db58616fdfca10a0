mod common;

use dswift_core::AnyEmptyResult;
use predicates::prelude::PredicateBooleanExt;

#[test]
fn generate_reports_a_missing_toolchain() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::without_swift(tmp.path());
	common::write(tmp.path(), "Model.dswift", "struct Model {}\n");

	common::dswift_cmd()
		.arg("generate")
		.arg("Model.dswift")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("dswift::swift_not_found"));

	assert!(!tmp.path().join("Model.swift").exists());

	Ok(())
}

#[test]
fn generate_stops_before_running_a_broken_template() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::without_swift(tmp.path());
	common::write(
		tmp.path(),
		"Model.dswift",
		"// dswift-tools-version: 2.0.0\n<%@include folder=\"Missing\"%>\n",
	);

	common::dswift_cmd()
		.arg("generate")
		.arg("Model.dswift")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(
			predicates::str::contains("dswift::resource_not_found")
				.and(predicates::str::contains("dswift::swift_not_found").not()),
		);

	Ok(())
}

#[test]
fn update_reports_each_failing_template() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::without_swift(tmp.path());
	common::write(tmp.path(), "A.dswift", "a\n");
	common::write(tmp.path(), "Sources/B.dswift", "b\n");

	common::dswift_cmd()
		.arg("update")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(
			predicates::str::contains("failed to generate A.dswift")
				.and(predicates::str::contains("failed to generate Sources/B.dswift"))
				.and(predicates::str::contains("2 template(s) failed to generate")),
		);

	Ok(())
}

#[test]
fn update_is_a_noop_without_templates() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::without_swift(tmp.path());

	common::dswift_cmd()
		.arg("update")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("already up to date"));

	Ok(())
}

#[test]
fn quiet_update_prints_nothing() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::without_swift(tmp.path());

	common::dswift_cmd()
		.arg("update")
		.arg("--quiet")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout("");

	Ok(())
}

#[test]
fn missing_subcommand_prints_usage_hint() {
	common::dswift_cmd()
		.assert()
		.code(1)
		.stderr(predicates::str::contains("dswift --help"));
}
