use std::collections::HashMap;
use std::fmt::Debug;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use crate::HasteResult;

/// How a located template's rendered output is wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
	Html,
	Css,
	Js,
}

impl ContentKind {
	/// The file extension (with leading dot) templates of this kind use.
	pub fn extension(self) -> &'static str {
		match self {
			Self::Html => ".html",
			Self::Css => ".css",
			Self::Js => ".js",
		}
	}

	/// Wrap rendered template output in the element this kind requires.
	pub fn wrap(self, content: String) -> String {
		match self {
			Self::Html => content,
			Self::Css => format!("<style>\n{content}\n</style>"),
			Self::Js => format!("<script>\n{content}\n</script>"),
		}
	}
}

/// Convert a template name to a relative path stem: `.` becomes a directory
/// separator and `:` steps up one directory.
///
/// `partials.nav` becomes `partials/nav` and `:shared.footer` becomes
/// `../shared/footer`.
pub fn name_to_path(name: &str) -> String {
	let mut path = String::with_capacity(name.len());
	for ch in name.chars() {
		match ch {
			'.' => path.push('/'),
			':' => path.push_str("../"),
			_ => path.push(ch),
		}
	}
	path
}

/// The relative paths tried, in order, when locating the template `name`.
///
/// HTML is always tried first. Names ending in `.css` or `.js` are also tried
/// as an asset with that exact extension.
pub fn candidate_paths(name: &str) -> Vec<(String, ContentKind)> {
	let mut candidates = Vec::with_capacity(2);
	let html = ContentKind::Html.extension();
	let stem = name.strip_suffix(html).unwrap_or(name);
	candidates.push((format!("{}{html}", name_to_path(stem)), ContentKind::Html));

	for kind in [ContentKind::Css, ContentKind::Js] {
		let extension = kind.extension();
		if let Some(stem) = name.strip_suffix(extension) {
			candidates.push((format!("{}{extension}", name_to_path(stem)), kind));
		}
	}

	candidates
}

/// Lexically normalize `path`, dropping `.` components and folding `..` into
/// the preceding component where there is one. The filesystem is not touched.
pub fn normalize_path(path: &Path) -> PathBuf {
	let mut normalized = PathBuf::new();

	for component in path.components() {
		match component {
			Component::CurDir => {}
			Component::ParentDir => {
				match normalized.components().next_back() {
					Some(Component::Normal(_)) => {
						normalized.pop();
					}
					Some(Component::RootDir | Component::Prefix(_)) => {}
					_ => normalized.push(".."),
				}
			}
			other => normalized.push(other.as_os_str()),
		}
	}

	normalized
}

/// Source of template files.
///
/// Paths given to a resolver are relative to the template root and use `/` as
/// the separator. Implementations must be shareable between build tasks.
pub trait TemplateResolver: Debug + Send + Sync {
	/// A stable identity for the template at `path`, used for dependency
	/// tracking. Two paths naming the same template must yield the same
	/// identity.
	fn identify(&self, path: &str) -> PathBuf;

	/// Read the template at `path`. Returns `Ok(None)` when no template exists
	/// there.
	fn load(&self, path: &str) -> HasteResult<Option<String>>;
}

/// Resolves templates from files below a root directory.
#[derive(Debug, Clone)]
pub struct FileResolver {
	root: PathBuf,
}

impl FileResolver {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	pub fn root(&self) -> &Path {
		&self.root
	}
}

impl TemplateResolver for FileResolver {
	fn identify(&self, path: &str) -> PathBuf {
		normalize_path(&self.root.join(path))
	}

	fn load(&self, path: &str) -> HasteResult<Option<String>> {
		let full_path = self.identify(path);
		if !full_path.is_file() {
			return Ok(None);
		}

		match std::fs::read_to_string(&full_path) {
			Ok(content) => Ok(Some(content)),
			Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
			Err(error) => Err(error.into()),
		}
	}
}

/// Resolves templates from an in-memory map of relative path to content.
#[derive(Debug, Clone, Default)]
pub struct MemoryResolver {
	templates: HashMap<String, String>,
}

impl MemoryResolver {
	pub fn new() -> Self {
		Self::default()
	}

	/// Add a template, keyed by its relative path (e.g. `partials/nav.html`).
	#[must_use]
	pub fn with(mut self, path: &str, content: impl Into<String>) -> Self {
		self.insert(path, content);
		self
	}

	pub fn insert(&mut self, path: &str, content: impl Into<String>) {
		let key = normalize_path(Path::new(path)).to_string_lossy().into_owned();
		self.templates.insert(key, content.into());
	}
}

impl TemplateResolver for MemoryResolver {
	fn identify(&self, path: &str) -> PathBuf {
		normalize_path(Path::new(path))
	}

	fn load(&self, path: &str) -> HasteResult<Option<String>> {
		let key = self.identify(path).to_string_lossy().into_owned();
		Ok(self.templates.get(&key).cloned())
	}
}
