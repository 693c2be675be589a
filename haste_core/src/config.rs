use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::HasteError;
use crate::HasteResult;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = ["haste.toml", ".haste.toml", ".config/haste.toml"];

/// Suffix identifying top-level build files.
pub const DEFAULT_BUILD_FILE_EXTENSION: &str = ".haste.html";

/// Default bound on how far a placeholder may extend before it is abandoned.
pub const DEFAULT_PLACEHOLDER_LIMIT: usize = 100;

/// Default number of directory levels searched for build files.
pub const DEFAULT_SCAN_DEPTH: usize = 5;

/// Default output directory, relative to the project root.
pub const DEFAULT_OUT_DIR: &str = "dist";

/// Tag and placeholder syntax.
///
/// ```toml
/// [syntax]
/// tag_prefix = "t:"
/// variable_prefix = "v:"
/// placeholder_open = "{{"
/// placeholder_close = "}}"
/// placeholder_limit = 100
/// name_attribute = ":name"
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Syntax {
	/// Prefix of template inclusion tags, e.g. `<t:header/>`.
	pub tag_prefix: String,
	/// Prefix of variable tags, e.g. `<v:title>...</v:title>`.
	pub variable_prefix: String,
	/// Opening placeholder marker.
	pub placeholder_open: String,
	/// Closing placeholder marker.
	pub placeholder_close: String,
	/// Maximum distance in bytes between the start of an opening marker and
	/// the start of its closing marker. Longer placeholders are left as text.
	pub placeholder_limit: usize,
	/// Attribute that supplies the template name explicitly, e.g.
	/// `<t: :name="blog.{{kind}}"/>`.
	pub name_attribute: String,
}

impl Default for Syntax {
	fn default() -> Self {
		Self {
			tag_prefix: "t:".to_string(),
			variable_prefix: "v:".to_string(),
			placeholder_open: "{{".to_string(),
			placeholder_close: "}}".to_string(),
			placeholder_limit: DEFAULT_PLACEHOLDER_LIMIT,
			name_attribute: ":name".to_string(),
		}
	}
}

impl Syntax {
	/// Reject settings that would make the tokenizer or substitutor loop or
	/// match everything.
	pub fn validate(&self) -> HasteResult<()> {
		let required = [
			("tag_prefix", &self.tag_prefix),
			("variable_prefix", &self.variable_prefix),
			("placeholder_open", &self.placeholder_open),
			("placeholder_close", &self.placeholder_close),
		];

		for (field, value) in required {
			if value.is_empty() {
				return Err(HasteError::ConfigParse(format!(
					"`syntax.{field}` must not be empty"
				)));
			}
		}

		if self.tag_prefix.to_ascii_lowercase() == self.variable_prefix.to_ascii_lowercase() {
			return Err(HasteError::ConfigParse(
				"`syntax.tag_prefix` and `syntax.variable_prefix` must differ".to_string(),
			));
		}

		Ok(())
	}
}

/// Build discovery and output settings.
///
/// ```toml
/// [build]
/// extension = ".haste.html"
/// out_dir = "dist"
/// scan_depth = 5
/// exclude = ["drafts/**"]
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BuildConfig {
	/// File name suffix of top-level build files.
	pub extension: String,
	/// Output directory, relative to the project root.
	pub out_dir: PathBuf,
	/// How many directory levels below a scanned directory are searched.
	pub scan_depth: usize,
	/// Glob patterns, relative to the project root, that are never built.
	pub exclude: Vec<String>,
}

impl Default for BuildConfig {
	fn default() -> Self {
		Self {
			extension: DEFAULT_BUILD_FILE_EXTENSION.to_string(),
			out_dir: PathBuf::from(DEFAULT_OUT_DIR),
			scan_depth: DEFAULT_SCAN_DEPTH,
			exclude: Vec::new(),
		}
	}
}

/// Configuration loaded from a `haste.toml` file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct HasteConfig {
	#[serde(default)]
	pub syntax: Syntax,
	#[serde(default)]
	pub build: BuildConfig,
}

impl HasteConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if no config file exists.
	pub fn load(root: &Path) -> HasteResult<Option<HasteConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		let config = Self::parse(&content)?;

		Ok(Some(config))
	}

	/// Parse config file contents.
	pub fn parse(content: &str) -> HasteResult<HasteConfig> {
		let config: HasteConfig =
			toml::from_str(content).map_err(|e| HasteError::ConfigParse(e.to_string()))?;
		config.syntax.validate()?;

		if config.build.extension.is_empty() {
			return Err(HasteError::ConfigParse(
				"`build.extension` must not be empty".to_string(),
			));
		}

		Ok(config)
	}
}
