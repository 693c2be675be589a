use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use globset::Glob;
use globset::GlobSet;
use globset::GlobSetBuilder;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::Builder;
use crate::FileResolver;
use crate::HasteConfig;
use crate::HasteError;
use crate::HasteResult;
use crate::Rendered;
use crate::Scope;
use crate::Syntax;
use crate::TemplateResolver;
use crate::config::DEFAULT_BUILD_FILE_EXTENSION;
use crate::config::DEFAULT_OUT_DIR;
use crate::config::DEFAULT_SCAN_DEPTH;
use crate::template::normalize_path;

/// Extension given to every output file.
pub const OUTPUT_EXTENSION: &str = ".html";

/// Options controlling where build files are found and where their output
/// goes.
///
/// Use [`BuildOptions::new`] for defaults or [`BuildOptions::from_config`] to
/// construct from a [`HasteConfig`].
#[derive(Debug, Clone)]
pub struct BuildOptions {
	/// Project root. Templates are resolved relative to it.
	pub root: PathBuf,
	/// Directory output files are written to.
	pub out_dir: PathBuf,
	/// File name suffix of top-level build files.
	pub extension: String,
	/// How many directory levels below a scanned directory are searched.
	pub scan_depth: usize,
	/// Paths, relative to the root, that are never built.
	pub exclude: GlobSet,
	pub syntax: Syntax,
}

impl BuildOptions {
	/// Default options for the project at `root`.
	pub fn new(root: impl Into<PathBuf>) -> Self {
		let root = normalize_path(&root.into());
		let out_dir = root.join(DEFAULT_OUT_DIR);

		Self {
			root,
			out_dir,
			extension: DEFAULT_BUILD_FILE_EXTENSION.to_string(),
			scan_depth: DEFAULT_SCAN_DEPTH,
			exclude: GlobSet::empty(),
			syntax: Syntax::default(),
		}
	}

	/// Options for the project at `root`, taking settings from `config` when
	/// one was loaded.
	pub fn from_config(root: impl Into<PathBuf>, config: Option<&HasteConfig>) -> HasteResult<Self> {
		let options = Self::new(root);
		let Some(config) = config else {
			return Ok(options);
		};

		options
			.with_extension(&config.build.extension)
			.with_out_dir(&config.build.out_dir)
			.with_scan_depth(config.build.scan_depth)
			.with_syntax(config.syntax.clone())
			.with_exclude(&config.build.exclude)
	}

	/// Load `haste.toml` from `root` (if present) and build options from it.
	pub fn load(root: impl Into<PathBuf>) -> HasteResult<Self> {
		let root = root.into();
		let config = HasteConfig::load(&root)?;
		Self::from_config(root, config.as_ref())
	}

	#[must_use]
	pub fn with_out_dir(mut self, out_dir: impl AsRef<Path>) -> Self {
		self.out_dir = normalize_path(&self.root.join(out_dir));
		self
	}

	#[must_use]
	pub fn with_extension(mut self, extension: &str) -> Self {
		self.extension = extension.to_string();
		self
	}

	#[must_use]
	pub fn with_scan_depth(mut self, scan_depth: usize) -> Self {
		self.scan_depth = scan_depth;
		self
	}

	#[must_use]
	pub fn with_syntax(mut self, syntax: Syntax) -> Self {
		self.syntax = syntax;
		self
	}

	/// Replace the exclusion patterns. Invalid globs are reported as config
	/// errors.
	pub fn with_exclude(mut self, patterns: &[String]) -> HasteResult<Self> {
		let mut builder = GlobSetBuilder::new();
		for pattern in patterns {
			let glob = Glob::new(pattern).map_err(|e| {
				HasteError::ConfigParse(format!("invalid exclude pattern `{pattern}`: {e}"))
			})?;
			builder.add(glob);
		}

		self.exclude = builder
			.build()
			.map_err(|e| HasteError::ConfigParse(e.to_string()))?;
		Ok(self)
	}

	/// Whether `path` names a build file.
	pub fn is_build_file(&self, path: &Path) -> bool {
		path.file_name()
			.and_then(|name| name.to_str())
			.is_some_and(|name| name.ends_with(self.extension.as_str()))
	}

	/// Whether `path` matches one of the exclusion patterns.
	pub fn is_excluded(&self, path: &Path) -> bool {
		let relative = path.strip_prefix(&self.root).unwrap_or(path);
		self.exclude.is_match(relative)
	}

	/// Resolve `path` against the root and normalize it.
	pub fn absolutize(&self, path: &Path) -> PathBuf {
		normalize_path(&self.root.join(path))
	}

	/// The output path for the build file `source`: its path relative to the
	/// root, below the output directory, with the build extension replaced by
	/// `.html`.
	pub fn output_path(&self, source: &Path) -> PathBuf {
		let source = self.absolutize(source);
		let relative = source
			.strip_prefix(&self.root)
			.map(Path::to_path_buf)
			.unwrap_or_else(|_| source.file_name().map(PathBuf::from).unwrap_or_default());

		let relative_name = relative.to_string_lossy();
		let output = match relative_name.strip_suffix(self.extension.as_str()) {
			Some(stem) => PathBuf::from(format!("{stem}{OUTPUT_EXTENSION}")),
			None => relative.with_extension(&OUTPUT_EXTENSION[1..]),
		};

		self.out_dir.join(output)
	}
}

/// A top-level document and the templates its last successful build used.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildFile {
	pub path: PathBuf,
	pub dependencies: BTreeSet<PathBuf>,
}

/// A build file that failed to build.
#[derive(Debug)]
pub struct BuildFailure {
	pub source: PathBuf,
	pub error: HasteError,
}

/// Outcome of building a batch of files.
#[derive(Debug, Default)]
pub struct BuildReport {
	/// Output files written, sorted.
	pub written: Vec<PathBuf>,
	/// Build files that failed, sorted by source path.
	pub failures: Vec<BuildFailure>,
}

impl BuildReport {
	/// Returns true when every build succeeded.
	pub fn is_ok(&self) -> bool {
		self.failures.is_empty()
	}

	fn sort(&mut self) {
		self.written.sort();
		self.failures.sort_by(|a, b| a.source.cmp(&b.source));
	}
}

/// Tracks the build files of a project and builds them.
///
/// The manager is cheap to clone; clones share the same set of build files.
/// The set is only locked long enough to read it or to store a finished
/// build's dependencies, so builds of different files run concurrently.
#[derive(Debug, Clone)]
pub struct BuildManager {
	options: Arc<BuildOptions>,
	resolver: Arc<dyn TemplateResolver>,
	files: Arc<Mutex<BTreeMap<PathBuf, BuildFile>>>,
}

impl BuildManager {
	/// A manager resolving templates from files below the project root.
	pub fn new(options: BuildOptions) -> Self {
		let resolver = Arc::new(FileResolver::new(options.root.clone()));
		Self::with_resolver(options, resolver)
	}

	pub fn with_resolver(options: BuildOptions, resolver: Arc<dyn TemplateResolver>) -> Self {
		Self {
			options: Arc::new(options),
			resolver,
			files: Arc::new(Mutex::new(BTreeMap::new())),
		}
	}

	pub fn options(&self) -> &BuildOptions {
		&self.options
	}

	fn lock_files(&self) -> MutexGuard<'_, BTreeMap<PathBuf, BuildFile>> {
		self.files
			.lock()
			.unwrap_or_else(std::sync::PoisonError::into_inner)
	}

	/// Register each path: files are added directly and directories are
	/// searched for build files. Returns the number of newly registered files.
	pub fn load_paths(&self, paths: &[PathBuf]) -> HasteResult<usize> {
		let mut added = 0;
		for path in paths {
			added += self.load_path(path)?;
		}
		Ok(added)
	}

	/// Register a single file or every build file below a directory.
	pub fn load_path(&self, path: &Path) -> HasteResult<usize> {
		let path = self.options.absolutize(path);
		let metadata = std::fs::metadata(&path)?;

		if metadata.is_dir() {
			let found = self.scan_build_files(&path)?;
			let added = found
				.into_iter()
				.filter(|file| self.add_build_file(file))
				.count();
			info!(directory = %path.display(), added, "scanned for build files");
			return Ok(added);
		}

		Ok(usize::from(self.add_build_file(&path)))
	}

	/// Find every build file below `dir`, skipping hidden directories,
	/// `node_modules`, the output directory and excluded paths.
	pub fn scan_build_files(&self, dir: &Path) -> HasteResult<Vec<PathBuf>> {
		let dir = self.options.absolutize(dir);
		let mut files = Vec::new();
		let mut ancestors = Vec::new();
		self.walk_dir(&dir, 0, &mut files, &mut ancestors)?;
		files.sort();
		Ok(files)
	}

	fn walk_dir(
		&self,
		dir: &Path,
		depth: usize,
		files: &mut Vec<PathBuf>,
		ancestors: &mut Vec<PathBuf>,
	) -> HasteResult<()> {
		// Detect symlink cycles by tracking the canonical paths above us.
		let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
		if ancestors.contains(&canonical) {
			return Err(HasteError::SymlinkCycle {
				path: dir.display().to_string(),
			});
		}
		ancestors.push(canonical);

		for entry in std::fs::read_dir(dir)? {
			let entry = entry?;
			let path = entry.path();

			if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
				if is_ignored_directory_name(name) && path.is_dir() {
					continue;
				}
			}

			if path == self.options.out_dir || self.options.is_excluded(&path) {
				continue;
			}

			if path.is_dir() {
				if depth < self.options.scan_depth {
					self.walk_dir(&path, depth + 1, files, ancestors)?;
				}
			} else if self.options.is_build_file(&path) {
				files.push(path);
			}
		}

		ancestors.pop();
		Ok(())
	}

	/// Register a build file. Returns false when it was already known.
	pub fn add_build_file(&self, path: &Path) -> bool {
		let path = self.options.absolutize(path);
		let mut files = self.lock_files();
		if files.contains_key(&path) {
			return false;
		}

		debug!(path = %path.display(), "registered build file");
		files.insert(path.clone(), BuildFile {
			path,
			dependencies: BTreeSet::new(),
		});
		true
	}

	/// Paths of every registered build file, sorted.
	pub fn build_files(&self) -> Vec<PathBuf> {
		self.lock_files().keys().cloned().collect()
	}

	/// Dependencies recorded by the last successful build of `path`.
	pub fn dependencies(&self, path: &Path) -> Option<BTreeSet<PathBuf>> {
		let path = self.options.absolutize(path);
		self.lock_files()
			.get(&path)
			.map(|file| file.dependencies.clone())
	}

	/// Build `source` and return the output. A registered build file has its
	/// dependency set replaced on success and left untouched on failure.
	pub fn build(&self, source: &Path) -> HasteResult<String> {
		let source = self.options.absolutize(source);
		let rendered = self.render_source(&source)?;
		self.record_dependencies(&source, rendered.dependencies);

		Ok(rendered.content)
	}

	/// Build `source` and write the result to its output path, creating
	/// directories as needed. Nothing is written when the build fails, and
	/// the dependency set only changes once the output has been written.
	pub fn build_to_file(&self, source: &Path) -> HasteResult<PathBuf> {
		let source = self.options.absolutize(source);
		let rendered = self.render_source(&source)?;
		let output_path = self.options.output_path(&source);

		if let Some(parent) = output_path.parent() {
			std::fs::create_dir_all(parent)?;
		}
		std::fs::write(&output_path, rendered.content)?;
		self.record_dependencies(&source, rendered.dependencies);

		info!(
			source = %source.display(),
			output = %output_path.display(),
			"built"
		);

		Ok(output_path)
	}

	fn render_source(&self, source: &Path) -> HasteResult<Rendered> {
		let content = std::fs::read_to_string(source)?;
		Builder::new(&self.options.syntax, self.resolver.as_ref()).render(
			source,
			&content,
			Scope::new(),
		)
	}

	fn record_dependencies(&self, source: &Path, dependencies: BTreeSet<PathBuf>) {
		if let Some(file) = self.lock_files().get_mut(source) {
			file.dependencies = dependencies;
		}
	}

	/// Build every registered build file concurrently.
	pub async fn build_all(&self) -> BuildReport {
		let sources = self.build_files();
		self.build_many(sources).await
	}

	/// React to a change of `path`. A build file is registered and rebuilt on
	/// its own; any other file rebuilds every build file that depends on it.
	pub async fn notify_change(&self, path: &Path) -> BuildReport {
		let path = self.options.absolutize(path);

		if self.options.is_build_file(&path) && !self.options.is_excluded(&path) {
			self.add_build_file(&path);
			return self.build_many(vec![path]).await;
		}

		let affected: Vec<PathBuf> = self
			.lock_files()
			.values()
			.filter(|file| file.dependencies.contains(&path))
			.map(|file| file.path.clone())
			.collect();

		debug!(
			path = %path.display(),
			affected = affected.len(),
			"change notification"
		);

		self.build_many(affected).await
	}

	/// Build each of `sources` on the blocking pool and collect the results.
	/// Every build is started before any is awaited.
	pub async fn build_many(&self, sources: Vec<PathBuf>) -> BuildReport {
		let mut report = BuildReport::default();
		let handles: Vec<_> = sources
			.into_iter()
			.map(|source| {
				let manager = self.clone();
				let task_source = source.clone();
				let handle =
					tokio::task::spawn_blocking(move || manager.build_to_file(&task_source));
				(source, handle)
			})
			.collect();

		for (source, handle) in handles {
			let result = match handle.await {
				Ok(result) => result,
				Err(error) => Err(HasteError::TaskFailed(error.to_string())),
			};

			match result {
				Ok(output) => report.written.push(output),
				Err(error) => {
					warn!(source = %source.display(), %error, "build failed");
					report.failures.push(BuildFailure { source, error });
				}
			}
		}

		report.sort();
		report
	}
}

/// Directory names that are never searched for build files.
pub fn is_ignored_directory_name(name: &str) -> bool {
	name.starts_with('.') || name == "node_modules"
}
