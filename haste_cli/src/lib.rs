use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Compose static HTML pages from reusable template tags.",
	long_about = "haste resolves `<t:name>` inclusion tags in `*.haste.html` build files by \
	              splicing in the content of other templates, passing values down through \
	              attributes, `<v:key>` variable tags and `@key=value` preambles.\n\nQuick \
	              start:\n  haste build   Build every page into ./dist\n  haste watch   \
	              Build, then rebuild pages as their templates change\n  haste render  Print \
	              one resolved page to stdout"
)]
pub struct HasteCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Project root. Templates are resolved relative to it and `haste.toml` is
	/// read from it. Defaults to the current directory.
	#[arg(long, short, global = true)]
	pub root: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Build every build file and write the results.
	///
	/// Each path is either a build file or a directory that is searched for
	/// build files (`*.haste.html` unless configured otherwise). Files are
	/// built in parallel; a failing file does not stop the others. Exits with
	/// status 1 when any file failed.
	Build {
		/// Build files or directories to search. Defaults to the project root.
		paths: Vec<PathBuf>,

		/// Output directory. Overrides `build.out_dir` from `haste.toml`.
		#[arg(long, short)]
		out: Option<PathBuf>,

		/// Output format for the build report. Use `text` for human-readable
		/// output or `json` for programmatic consumption.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,
	},
	/// Build once, then rebuild whenever a file under the root changes.
	///
	/// A changed build file is rebuilt on its own. A changed template rebuilds
	/// every build file that included it during its last successful build.
	Watch {
		/// Build files or directories to search. Defaults to the project root.
		paths: Vec<PathBuf>,

		/// Output directory. Overrides `build.out_dir` from `haste.toml`.
		#[arg(long, short)]
		out: Option<PathBuf>,
	},
	/// Resolve a single file and print the result to stdout.
	Render {
		/// The file to resolve.
		file: PathBuf,
	},
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output with colors and formatting.
	Text,
	/// JSON output for programmatic consumption.
	Json,
}
