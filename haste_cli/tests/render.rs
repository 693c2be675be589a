mod common;

use haste_core::AnyEmptyResult;

#[test]
fn render_prints_to_stdout() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_file(
		tmp.path(),
		"page.haste.html",
		"@name=World\n<t:partials.greeting/>",
	)?;
	common::write_file(tmp.path(), "partials/greeting.html", "<p>Hello {{name}}</p>")?;

	common::haste_cmd()
		.arg("render")
		.arg("--root")
		.arg(tmp.path())
		.arg(tmp.path().join("page.haste.html"))
		.assert()
		.success()
		.stdout("<p>Hello World</p>");

	assert!(!tmp.path().join("dist").exists());

	Ok(())
}

#[test]
fn render_wraps_assets() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_file(tmp.path(), "page.haste.html", "<t:site.css/><t:app.js/>")?;
	common::write_file(tmp.path(), "site.css", "p { margin: 0; }")?;
	common::write_file(tmp.path(), "app.js", "run();")?;

	common::haste_cmd()
		.arg("render")
		.arg("--root")
		.arg(tmp.path())
		.arg(tmp.path().join("page.haste.html"))
		.assert()
		.success()
		.stdout("<style>\np { margin: 0; }\n</style><script>\nrun();\n</script>");

	Ok(())
}

#[test]
fn render_missing_template_is_fatal() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write_file(tmp.path(), "page.haste.html", "<t:nowhere/>")?;

	common::haste_cmd()
		.arg("render")
		.arg("--root")
		.arg(tmp.path())
		.arg(tmp.path().join("page.haste.html"))
		.assert()
		.code(2)
		.stderr(predicates::str::contains("nowhere.html"));

	Ok(())
}
