use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process;
use std::sync::mpsc;
use std::time::Duration;

use clap::Parser;
use haste_cli::Commands;
use haste_cli::HasteCli;
use haste_cli::OutputFormat;
use haste_core::AnyEmptyResult;
use haste_core::AnyResult;
use haste_core::BuildManager;
use haste_core::BuildOptions;
use haste_core::BuildReport;
use haste_core::HasteError;
use owo_colors::OwoColorize;
use owo_colors::Stream;
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directives.
const LOG_ENV: &str = "HASTE_LOG";

fn main() {
	let args = HasteCli::parse();

	// Respect NO_COLOR (via supports-color) and the --no-color flag.
	let use_color =
		!args.no_color && supports_color::on(supports_color::Stream::Stderr).is_some();
	if args.no_color {
		owo_colors::set_override(false);
	}

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	init_tracing(args.verbose, use_color);

	let result = match &args.command {
		Some(Commands::Build { paths, out, format }) => {
			run_build(&args, paths, out.as_deref(), *format)
		}
		Some(Commands::Watch { paths, out }) => run_watch(&args, paths, out.as_deref()),
		Some(Commands::Render { file }) => run_render(&args, file),
		None => {
			eprintln!("No subcommand specified. Run `haste --help` for usage.");
			process::exit(2);
		}
	};

	if let Err(e) = result {
		// Render through miette for error codes and help text.
		match e.downcast::<HasteError>() {
			Ok(haste_err) => {
				let report: miette::Report = (*haste_err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!(
					"{} {e}",
					"error:".if_supports_color(Stream::Stderr, |text| text.red())
				);
			}
		}
		process::exit(2);
	}
}

fn init_tracing(verbose: bool, use_color: bool) {
	let default_directives = if verbose { "debug" } else { "warn" };
	let filter =
		EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directives));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(false)
		.without_time()
		.init();
}

/// The project root: `--root` when given, a lone directory argument
/// otherwise, and finally the current directory.
fn resolve_root(args: &HasteCli, paths: &[PathBuf]) -> AnyResult<PathBuf> {
	let root = match (&args.root, paths) {
		(Some(root), _) => root.clone(),
		(None, [single]) if single.is_dir() => single.clone(),
		(None, _) => std::env::current_dir()?,
	};

	let root = absolute_path(&root)?;
	debug!(root = %root.display(), "resolved project root");
	Ok(root)
}

/// Make `path` absolute, resolving symlinks when it exists.
fn absolute_path(path: &Path) -> AnyResult<PathBuf> {
	let path = std::path::absolute(path)?;
	Ok(path.canonicalize().unwrap_or(path))
}

fn create_manager(root: &Path, out: Option<&Path>) -> AnyResult<BuildManager> {
	let mut options = BuildOptions::load(root)?;
	if let Some(out) = out {
		options = options.with_out_dir(absolute_path(out)?);
	}

	Ok(BuildManager::new(options))
}

/// Register `paths` (or the whole root when empty) with `manager`.
fn load_build_files(manager: &BuildManager, root: &Path, paths: &[PathBuf]) -> AnyEmptyResult {
	if paths.is_empty() {
		manager.load_path(root)?;
		return Ok(());
	}

	let absolute = paths
		.iter()
		.map(|path| absolute_path(path))
		.collect::<AnyResult<Vec<_>>>()?;
	manager.load_paths(&absolute)?;
	Ok(())
}

fn run_build(
	args: &HasteCli,
	paths: &[PathBuf],
	out: Option<&Path>,
	format: OutputFormat,
) -> AnyEmptyResult {
	let root = resolve_root(args, paths)?;
	let manager = create_manager(&root, out)?;
	load_build_files(&manager, &root, paths)?;

	let runtime = tokio::runtime::Runtime::new()?;
	let report = runtime.block_on(manager.build_all());
	let is_ok = report.is_ok();

	match format {
		OutputFormat::Text => print_report(report, &root),
		OutputFormat::Json => print_json_report(&report, &root)?,
	}

	if !is_ok {
		process::exit(1);
	}

	Ok(())
}

fn run_watch(args: &HasteCli, paths: &[PathBuf], out: Option<&Path>) -> AnyEmptyResult {
	let root = resolve_root(args, paths)?;
	let manager = create_manager(&root, out)?;
	load_build_files(&manager, &root, paths)?;

	let runtime = tokio::runtime::Runtime::new()?;
	print_report(runtime.block_on(manager.build_all()), &root);

	println!("\nWatching for file changes... (press Ctrl+C to stop)");

	let (tx, rx) = mpsc::channel::<PathBuf>();

	let mut watcher =
		notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
			if let Ok(event) = res {
				if matches!(
					event.kind,
					notify::EventKind::Modify(_) | notify::EventKind::Create(_)
				) {
					for path in event.paths {
						let _ = tx.send(path);
					}
				}
			}
		})?;

	use notify::Watcher;
	watcher.watch(&root, notify::RecursiveMode::Recursive)?;

	let out_dir = manager.options().out_dir.clone();

	loop {
		let mut changed = BTreeSet::from([rx.recv()?]);
		// Debounce: gather additional events within 200ms.
		while let Ok(path) = rx.recv_timeout(Duration::from_millis(200)) {
			changed.insert(path);
		}

		for path in changed {
			if path.starts_with(&out_dir) || !path.is_file() {
				continue;
			}

			debug!(path = %path.display(), "file changed");

			let report = runtime.block_on(manager.notify_change(&path));
			if report.written.is_empty() && report.failures.is_empty() {
				continue;
			}

			println!("\nChanged {}", display_relative(&path, &root));
			print_report(report, &root);
		}
	}
}

fn run_render(args: &HasteCli, file: &Path) -> AnyEmptyResult {
	let root = resolve_root(args, &[])?;
	let manager = create_manager(&root, None)?;
	let output = manager.build(&absolute_path(file)?)?;

	let mut stdout = std::io::stdout().lock();
	stdout.write_all(output.as_bytes())?;
	stdout.flush()?;

	Ok(())
}

fn display_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root).unwrap_or(path).display().to_string()
}

fn print_report(report: BuildReport, root: &Path) {
	let written = report.written.len();
	let failed = report.failures.len();

	if written == 0 && failed == 0 {
		println!("No build files found.");
		return;
	}

	for output in &report.written {
		println!(
			"  {} {}",
			"built".if_supports_color(Stream::Stdout, |text| text.green()),
			display_relative(output, root)
		);
	}

	for failure in report.failures {
		eprintln!(
			"  {} {}",
			"failed".if_supports_color(Stream::Stderr, |text| text.red()),
			display_relative(&failure.source, root)
		);
		let diagnostic: miette::Report = failure.error.into();
		eprintln!("{diagnostic:?}");
	}

	let summary = if failed == 0 {
		format!("Built {written} file(s).")
	} else {
		format!("Built {written} file(s), {failed} failed.")
	};
	println!(
		"{}",
		summary.if_supports_color(Stream::Stdout, |text| text.bold())
	);
}

#[derive(Serialize)]
struct JsonReport {
	ok: bool,
	written: Vec<String>,
	failures: Vec<JsonFailure>,
}

#[derive(Serialize)]
struct JsonFailure {
	source: String,
	error: String,
}

fn print_json_report(report: &BuildReport, root: &Path) -> AnyEmptyResult {
	let json = JsonReport {
		ok: report.is_ok(),
		written: report
			.written
			.iter()
			.map(|path| display_relative(path, root))
			.collect(),
		failures: report
			.failures
			.iter()
			.map(|failure| JsonFailure {
				source: display_relative(&failure.source, root),
				error: failure.error.to_string(),
			})
			.collect(),
	};

	println!("{}", serde_json::to_string_pretty(&json)?);
	Ok(())
}
