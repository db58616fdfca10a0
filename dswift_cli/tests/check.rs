mod common;

use std::time::Duration;
use std::time::SystemTime;

use dswift_core::AnyEmptyResult;
use dswift_core::generated_banner;
use predicates::prelude::PredicateBooleanExt;
use serde_json::Value;

#[test]
fn check_passes_without_templates() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(tmp.path(), "readme.md", "# Nothing to generate\n");

	common::dswift_cmd()
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("up to date"));

	Ok(())
}

#[test]
fn quiet_check_prints_nothing_when_passing() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(tmp.path(), "readme.md", "# Nothing to generate
");

	common::dswift_cmd()
		.arg("check")
		.arg("-q")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout("")
		.stderr("");

	Ok(())
}

#[test]
fn check_fails_when_output_is_missing() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(tmp.path(), "Sources/Model.dswift", "struct Model {}\n");

	common::dswift_cmd()
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(1)
		.stderr(
			predicates::str::contains("Sources/Model.dswift -> Sources/Model.swift")
				.and(predicates::str::contains("1 template(s) need regeneration")),
		);

	Ok(())
}

#[test]
fn check_fails_when_output_was_written_by_hand() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(tmp.path(), "Model.dswift", "struct Model {}\n");
	common::write(tmp.path(), "Model.swift", "struct Model {}\n");

	common::dswift_cmd()
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(1);

	Ok(())
}

#[test]
fn check_passes_when_output_is_newer() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(tmp.path(), "Model.dswift", "struct Model {}\n");
	common::write(
		tmp.path(),
		"Model.swift",
		&format!("{}\nstruct Model {{}}\n", generated_banner("Model.dswift")),
	);
	std::fs::File::options()
		.write(true)
		.open(tmp.path().join("Model.swift"))?
		.set_modified(SystemTime::now() + Duration::from_secs(60))?;

	common::dswift_cmd()
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Check passed"));

	Ok(())
}

#[test]
fn check_json_lists_stale_templates() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(tmp.path(), "A.dswift", "a\n");
	common::write(tmp.path(), "Ignored/B.dswift", "b\n");
	common::write(tmp.path(), ".gitignore", "Ignored/\n");

	let output = common::dswift_cmd()
		.arg("check")
		.arg("--format")
		.arg("json")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(1)
		.get_output()
		.stdout
		.clone();
	let report: Value = serde_json::from_slice(&output)?;

	assert_eq!(report["ok"], Value::Bool(false));
	assert_eq!(
		report["stale"],
		serde_json::json!([{ "template": "A.dswift", "output": "A.swift" }])
	);

	Ok(())
}

#[test]
fn check_honours_configured_extensions() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(
		tmp.path(),
		".dswift.toml",
		"template_extension = \"tmpl\"\noutput_extension = \"generated.swift\"\n",
	);
	common::write(tmp.path(), "Model.tmpl", "model\n");
	common::write(tmp.path(), "Other.dswift", "ignored\n");

	common::dswift_cmd()
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(1)
		.stderr(
			predicates::str::contains("Model.tmpl -> Model.generated.swift")
				.and(predicates::str::contains("Other.dswift").not()),
		);

	Ok(())
}

#[test]
fn check_reports_malformed_config() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(tmp.path(), "dswift.toml", "[exclude\n");

	common::dswift_cmd()
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("dswift::config_parse"));

	Ok(())
}
