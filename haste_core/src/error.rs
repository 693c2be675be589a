use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum HasteError {
	#[error(transparent)]
	#[diagnostic(code(haste::io_error))]
	Io(#[from] std::io::Error),

	#[error(
		"could not find template `{name}` at any of the following locations:\n{}",
		.attempted.join("\n")
	)]
	#[diagnostic(
		code(haste::template_not_found),
		help("create one of the listed files relative to the template root")
	)]
	TemplateNotFound { name: String, attempted: Vec<String> },

	#[error("invalid tag nesting: {0}")]
	#[diagnostic(
		code(haste::invalid_nesting),
		help("variable tags must be direct children of a template tag")
	)]
	InvalidNesting(String),

	#[error("missing closing tag for `{0}`")]
	#[diagnostic(
		code(haste::unclosed_tag),
		help("add `</{0}>` or write the tag as self-closing `<{0}/>`")
	)]
	UnclosedTag(String),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(haste::config_parse),
		help("check that haste.toml is valid TOML with [syntax] and/or [build] sections")
	)]
	ConfigParse(String),

	#[error("symlink cycle detected at: `{path}`")]
	#[diagnostic(
		code(haste::symlink_cycle),
		help("remove the circular symlink or exclude this path")
	)]
	SymlinkCycle { path: String },

	#[error("build task failed to complete: {0}")]
	#[diagnostic(code(haste::task_failed))]
	TaskFailed(String),
}

pub type HasteResult<T> = Result<T, HasteError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
