mod common;

use haste_core::AnyEmptyResult;
use rstest::rstest;
use similar_asserts::assert_eq;

#[rstest]
#[case::root("haste.toml")]
#[case::dot_file(".haste.toml")]
#[case::dot_config(".config/haste.toml")]
fn build_resolves_config_candidates(#[case] candidate: &str) -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_file(tmp.path(), candidate, "[build]\nout_dir = \"public\"\n")?;
	common::write_file(tmp.path(), "index.haste.html", "<p>hi</p>")?;

	common::haste_cmd()
		.arg("build")
		.arg("--root")
		.arg(tmp.path())
		.assert()
		.success();

	assert_eq!(
		std::fs::read_to_string(tmp.path().join("public/index.html"))?,
		"<p>hi</p>"
	);

	Ok(())
}

#[test]
fn build_uses_out_dir_from_haste_toml() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_file(tmp.path(), "haste.toml", "[build]\nout_dir = \"public\"\n")?;
	common::write_file(tmp.path(), "index.haste.html", "<p>hi</p>")?;

	common::haste_cmd()
		.arg("build")
		.arg("--root")
		.arg(tmp.path())
		.assert()
		.success();

	assert_eq!(
		std::fs::read_to_string(tmp.path().join("public/index.html"))?,
		"<p>hi</p>"
	);
	assert!(!tmp.path().join("dist").exists());

	Ok(())
}

#[test]
fn build_resolves_dot_config_haste_toml() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_file(
		tmp.path(),
		".config/haste.toml",
		"[syntax]\ntag_prefix = \"inc:\"\n",
	)?;
	common::write_file(tmp.path(), "index.haste.html", "<inc:part/>")?;
	common::write_file(tmp.path(), "part.html", "<b>part</b>")?;

	common::haste_cmd()
		.arg("build")
		.arg("--root")
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
fn build_prefers_haste_toml_over_other_candidates() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_file(tmp.path(), "haste.toml", "[build]\nout_dir = \"first\"\n")?;
	common::write_file(tmp.path(), ".haste.toml", "[build]\nout_dir = \"second\"\n")?;
	common::write_file(tmp.path(), "index.haste.html", "<p>hi</p>")?;

	common::haste_cmd()
		.arg("build")
		.arg("--root")
		.arg(tmp.path())
		.assert()
		.success();

	assert!(tmp.path().join("first/index.html").exists());
	assert!(!tmp.path().join("second").exists());

	Ok(())
}

#[test]
fn out_flag_overrides_config() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_file(tmp.path(), "haste.toml", "[build]\nout_dir = \"public\"\n")?;
	common::write_file(tmp.path(), "index.haste.html", "<p>hi</p>")?;
	let out = tmp.path().join("custom");

	common::haste_cmd()
		.arg("build")
		.arg("--root")
		.arg(tmp.path())
		.arg("--out")
		.arg(&out)
		.assert()
		.success();

	assert!(out.join("index.html").exists());
	assert!(!tmp.path().join("public").exists());

	Ok(())
}

#[test]
fn invalid_config_is_fatal() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_file(tmp.path(), "haste.toml", "[build\n")?;

	common::haste_cmd()
		.arg("build")
		.arg("--root")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("failed to parse config file"));

	Ok(())
}
