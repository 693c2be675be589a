use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;

use super::*;

/// Templates shared by most engine tests.
pub fn site_resolver() -> MemoryResolver {
	MemoryResolver::new()
		.with("header.html", "<h1>{{title}}</h1>")
		.with("card.html", "<div>{{content}}</div>")
		.with("layout.html", "<title>{{title}}</title>{{content}}")
		.with("frame.html", "<main><t:card>{{content}}</t:card></main>")
		.with("partials/nav.html", "<nav>{{active}}</nav>")
		.with("../shared.html", "<footer>shared</footer>")
		.with("styles/site.css", "body { color: {{color}}; }")
		.with("scripts/app.js", "console.log(1);")
		.with("child.html", "@color=red\n<p>{{color}}</p>")
		.with("item.html", "<li>{{n}}</li>")
		.with("sets.html", "@x=1\n{{x}}")
		.with("reads.html", "[{{x}}]")
		.with("note.html", "@tone=calm\n<aside>{{content}}</aside>")
}

/// Render `source` against [`site_resolver`] with the default syntax.
pub fn render_site(source: &str) -> HasteResult<String> {
	render(source, &Syntax::default(), &site_resolver())
}

/// Create a temporary project containing `files`, given as relative path and
/// content pairs.
pub fn project_dir(files: &[(&str, &str)]) -> TempDir {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	for (path, content) in files {
		write_file(tmp.path(), path, content);
	}
	tmp
}

pub fn write_file(root: &Path, path: &str, content: &str) {
	let full_path = root.join(path);
	if let Some(parent) = full_path.parent() {
		std::fs::create_dir_all(parent).unwrap_or_else(|e| panic!("create_dir_all: {e}"));
	}
	std::fs::write(&full_path, content).unwrap_or_else(|e| panic!("write: {e}"));
}

pub fn read_file(path: &Path) -> String {
	std::fs::read_to_string(path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()))
}

/// A manager for the project in `tmp` with every build file registered.
pub fn loaded_manager(tmp: &TempDir) -> HasteResult<BuildManager> {
	let options = BuildOptions::load(tmp.path())?;
	let manager = BuildManager::new(options);
	manager.load_path(tmp.path())?;
	Ok(manager)
}

/// A manager whose templates come from memory rather than the project root.
pub fn memory_manager(tmp: &TempDir, resolver: MemoryResolver) -> BuildManager {
	BuildManager::with_resolver(BuildOptions::new(tmp.path()), Arc::new(resolver))
}
