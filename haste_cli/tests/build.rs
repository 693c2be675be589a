mod common;

use haste_core::AnyEmptyResult;
use predicates::prelude::PredicateBooleanExt;
use serde_json::Value;
use similar_asserts::assert_eq;

#[test]
fn build_writes_every_page() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_file(
		tmp.path(),
		"index.haste.html",
		"@title=Home\n<t:layout><p>{{title}}</p></t:layout>",
	)?;
	common::write_file(
		tmp.path(),
		"blog/post.haste.html",
		"@title=Post\n<t:layout><p>{{title}}</p></t:layout>",
	)?;
	common::write_file(
		tmp.path(),
		"layout.html",
		"<html><head><title>{{title}}</title></head><body>{{content}}</body></html>",
	)?;

	common::haste_cmd()
		.arg("build")
		.arg("--root")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("built"))
		.stdout(predicates::str::contains("Built 2 file(s)."));

	assert_eq!(
		std::fs::read_to_string(tmp.path().join("dist/index.html"))?,
		"<html><head><title>Home</title></head><body><p>Home</p></body></html>"
	);
	assert_eq!(
		std::fs::read_to_string(tmp.path().join("dist/blog/post.html"))?,
		"<html><head><title>Post</title></head><body><p>Post</p></body></html>"
	);

	Ok(())
}

#[test]
fn build_uses_lone_directory_argument_as_root() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_file(tmp.path(), "index.haste.html", "<t:part/>")?;
	common::write_file(tmp.path(), "part.html", "<b>part</b>")?;

	common::haste_cmd()
		.arg("build")
		.arg(tmp.path())
		.assert()
		.success();

	assert_eq!(
		std::fs::read_to_string(tmp.path().join("dist/index.html"))?,
		"<b>part</b>"
	);

	Ok(())
}

#[test]
fn build_reports_failures_and_continues() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_file(tmp.path(), "good.haste.html", "<p>good</p>")?;
	common::write_file(tmp.path(), "bad.haste.html", "<t:missing/>")?;

	common::haste_cmd()
		.arg("build")
		.arg("--root")
		.arg(tmp.path())
		.assert()
		.code(1)
		.stdout(predicates::str::contains("Built 1 file(s), 1 failed."))
		.stderr(
			predicates::str::contains("bad.haste.html")
				.and(predicates::str::contains("could not find template `missing`")),
		);

	assert!(tmp.path().join("dist/good.html").exists());
	assert!(!tmp.path().join("dist/bad.html").exists());

	Ok(())
}

#[test]
fn build_json_report() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_file(tmp.path(), "good.haste.html", "<p>good</p>")?;
	common::write_file(tmp.path(), "bad.haste.html", "<t:card>")?;

	let output = common::haste_cmd()
		.arg("build")
		.arg("--root")
		.arg(tmp.path())
		.arg("--format")
		.arg("json")
		.output()?;

	assert_eq!(output.status.code(), Some(1));
	let json: Value = serde_json::from_slice(&output.stdout)?;
	assert_eq!(json["ok"], Value::Bool(false));
	assert_eq!(json["written"], serde_json::json!(["dist/good.html"]));
	assert_eq!(json["failures"][0]["source"], "bad.haste.html");
	assert!(
		json["failures"][0]["error"]
			.as_str()
			.is_some_and(|error| error.contains("missing closing tag"))
	);

	Ok(())
}

#[test]
fn build_with_nothing_to_do() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::haste_cmd()
		.arg("build")
		.arg("--root")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("No build files found."));

	Ok(())
}

#[test]
fn build_explicit_file_only() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_file(tmp.path(), "one.haste.html", "1")?;
	common::write_file(tmp.path(), "two.haste.html", "2")?;

	common::haste_cmd()
		.arg("build")
		.arg("--root")
		.arg(tmp.path())
		.arg(tmp.path().join("one.haste.html"))
		.assert()
		.success();

	assert!(tmp.path().join("dist/one.html").exists());
	assert!(!tmp.path().join("dist/two.html").exists());

	Ok(())
}

#[test]
fn missing_subcommand_is_fatal() {
	common::haste_cmd()
		.assert()
		.code(2)
		.stderr(predicates::str::contains("No subcommand specified"));
}
