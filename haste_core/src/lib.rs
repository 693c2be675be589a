//! `haste_core` is the core library for the haste static HTML template engine.
//! It resolves custom inclusion tags in HTML documents by recursively
//! substituting the content of other template files, with scoped variables
//! passed down through attributes, variable tags and `@key=value` preambles.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Build file (*.haste.html)
//!   -> Preamble (reads @key=value lines into the scope)
//!   -> Tokenizer (splits HTML into text, comment and tag tokens)
//!   -> Builder (tag stack; resolves <t:...> tags recursively, collects <v:...> values)
//!   -> Placeholder substitution ({{key}} against the scope)
//!   -> BuildManager (writes output, tracks dependencies, rebuilds on change)
//! ```
//!
//! ## Template Syntax
//!
//! ```html
//! @title=Home
//! <t:layout>
//!   <v:heading>Welcome to {{title}}</v:heading>
//!   <t:partials.nav active="home"/>
//!   <t:styles.site.css/>
//! </t:layout>
//! ```
//!
//! - `<t:partials.nav/>` includes `partials/nav.html`. `.` separates
//!   directories and `:` steps up one directory.
//! - `<t:styles.site.css/>` includes `styles/site.css` wrapped in `<style>`.
//!   `.js` templates are wrapped in `<script>`.
//! - Attributes and `<v:key>` tags become variables of the included template.
//!   The inner content of the tag is available as `{{content}}`.
//! - `@{{key}}` is left as text.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use haste_core::BuildManager;
//! use haste_core::BuildOptions;
//!
//! # async fn run() -> haste_core::HasteResult<()> {
//! let options = BuildOptions::load(".")?;
//! let manager = BuildManager::new(options);
//! manager.load_path(std::path::Path::new("."))?;
//!
//! let report = manager.build_all().await;
//! for failure in &report.failures {
//!     eprintln!("{}: {}", failure.source.display(), failure.error);
//! }
//! # Ok(())
//! # }
//! ```

pub use config::*;
pub use engine::*;
pub use error::*;
pub use lexer::Tokenizer;
pub use lexer::tokenize;
pub use placeholder::substitute;
pub use preamble::parse_preamble;
pub use project::*;
pub use scope::*;
pub use template::ContentKind;
pub use template::FileResolver;
pub use template::MemoryResolver;
pub use template::TemplateResolver;
pub use tokens::*;

pub mod config;
mod engine;
#[allow(unused_assignments)]
mod error;
pub(crate) mod lexer;
pub mod placeholder;
mod preamble;
pub mod project;
mod scope;
pub mod template;
mod tokens;

#[cfg(test)]
mod __fixtures;
