use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;
use std::rc::Rc;

use tracing::debug;
use tracing::trace;

use crate::HasteError;
use crate::HasteResult;
use crate::Scope;
use crate::Syntax;
use crate::TemplateResolver;
use crate::Token;
use crate::Tokenizer;
use crate::parse_preamble;
use crate::substitute;
use crate::template::ContentKind;
use crate::template::candidate_paths;

/// Characters trimmed from the inner content of an inclusion tag before it is
/// made available as `{{content}}`.
const CONTENT_TRIM: [char; 3] = ['\n', '\r', ' '];

/// The variable an inclusion tag's inner content is exposed as.
pub const CONTENT_VARIABLE: &str = "content";

/// The result of rendering one top-level document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
	/// The fully resolved output.
	pub content: String,
	/// Identities of every template that contributed to the output.
	pub dependencies: BTreeSet<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
	Inclusion,
	Variable,
}

impl FrameKind {
	fn describe(self) -> &'static str {
		match self {
			Self::Inclusion => "template",
			Self::Variable => "variable",
		}
	}
}

/// An open inclusion or variable tag whose closing tag has not been seen yet.
#[derive(Debug)]
struct Frame {
	/// Full tag name, used to match the closing tag.
	tag: String,
	/// Template name for inclusion frames, variable key for variable frames.
	name: String,
	kind: FrameKind,
	/// Raw (already resolved for nested tags) content collected so far.
	content: String,
	/// Attributes of an inclusion tag, substituted in the caller's scope.
	attributes: BTreeMap<String, String>,
	/// Raw values collected from variable tags placed inside an inclusion tag.
	variables: BTreeMap<String, String>,
}

/// A template located through the resolver.
#[derive(Debug, Clone)]
struct Located {
	identity: PathBuf,
	kind: ContentKind,
	content: Rc<str>,
}

/// Renders one top-level document.
///
/// A builder owns the caches for a single build: template contents are read
/// once, and identical inclusions under an identical scope are rendered once.
/// Nothing is shared between builders, so separate builds can run in parallel.
#[derive(Debug)]
pub struct Builder<'a> {
	syntax: &'a Syntax,
	resolver: &'a dyn TemplateResolver,
	tag_prefix: String,
	variable_prefix: String,
	name_attribute: String,
	contents: HashMap<PathBuf, Rc<str>>,
	fragments: HashMap<String, String>,
	dependencies: BTreeSet<PathBuf>,
}

impl<'a> Builder<'a> {
	pub fn new(syntax: &'a Syntax, resolver: &'a dyn TemplateResolver) -> Self {
		Self {
			syntax,
			resolver,
			tag_prefix: syntax.tag_prefix.to_ascii_lowercase(),
			variable_prefix: syntax.variable_prefix.to_ascii_lowercase(),
			name_attribute: syntax.name_attribute.to_ascii_lowercase(),
			contents: HashMap::new(),
			fragments: HashMap::new(),
			dependencies: BTreeSet::new(),
		}
	}

	/// Render `source`, a document identified by `origin`, starting from
	/// `scope`.
	pub fn render(mut self, origin: &Path, source: &str, mut scope: Scope) -> HasteResult<Rendered> {
		let body = parse_preamble(source, &mut scope);
		let content = self.render_body(origin, body, &scope)?;

		debug!(
			origin = %origin.display(),
			dependencies = self.dependencies.len(),
			"rendered document"
		);

		Ok(Rendered {
			content,
			dependencies: self.dependencies,
		})
	}

	/// Resolve every tag in `body` and then substitute placeholders in the
	/// result against `scope`.
	fn render_body(&mut self, origin: &Path, body: &str, scope: &Scope) -> HasteResult<String> {
		let mut output = String::with_capacity(body.len());
		let mut stack: Vec<Frame> = Vec::new();

		for token in Tokenizer::new(body) {
			if let Some(name) = token.strip_prefix(&self.tag_prefix) {
				let name = name.to_string();
				self.handle_inclusion(origin, &token, name, scope, &mut stack, &mut output)?;
			} else if let Some(name) = token.strip_prefix(&self.variable_prefix) {
				let name = name.to_string();
				handle_variable(&token, name, &mut stack)?;
			} else {
				append(&mut stack, &mut output, token.raw);
			}
		}

		if let Some(frame) = stack.last() {
			return Err(HasteError::UnclosedTag(frame.tag.clone()));
		}

		Ok(substitute(&output, scope, self.syntax))
	}

	fn handle_inclusion(
		&mut self,
		origin: &Path,
		token: &Token<'_>,
		name: String,
		scope: &Scope,
		stack: &mut Vec<Frame>,
		output: &mut String,
	) -> HasteResult<()> {
		if token.kind.opens() {
			let attributes: BTreeMap<String, String> = token
				.attributes
				.iter()
				.map(|attr| (attr.key.clone(), substitute(&attr.value, scope, self.syntax)))
				.collect();
			let name = attributes
				.get(&self.name_attribute)
				.cloned()
				.unwrap_or(name);

			stack.push(Frame {
				tag: token.name.clone(),
				name,
				kind: FrameKind::Inclusion,
				content: String::new(),
				attributes,
				variables: BTreeMap::new(),
			});
		}

		if token.kind.closes() {
			let frame = pop_frame(stack, &token.name, FrameKind::Inclusion)?;
			let resolved = self.resolve_inclusion(origin, frame, scope)?;
			append(stack, output, &resolved);
		}

		Ok(())
	}

	/// Render the template named by a closed inclusion frame.
	fn resolve_inclusion(&mut self, origin: &Path, frame: Frame, scope: &Scope) -> HasteResult<String> {
		let cache_key = fragment_key(origin, &frame, scope);
		if let Some(cached) = self.fragments.get(&cache_key) {
			trace!(name = %frame.name, "fragment cache hit");
			return Ok(cached.clone());
		}

		let template = self.locate(&frame.name)?;
		let mut child_scope = scope.branch();
		let body = parse_preamble(&template.content, &mut child_scope);
		child_scope.merge(frame.attributes);

		// Variable tag values see the child's preamble and attributes, not each
		// other.
		let variables: Vec<(String, String)> = frame
			.variables
			.into_iter()
			.map(|(key, value)| {
				let value = substitute(&value, &child_scope, self.syntax);
				(key, value)
			})
			.collect();
		child_scope.merge(variables);

		let inner = substitute(
			frame.content.trim_matches(CONTENT_TRIM),
			&child_scope,
			self.syntax,
		);
		child_scope.set(CONTENT_VARIABLE, inner);

		let rendered = self.render_body(&template.identity, body, &child_scope)?;
		let rendered = template.kind.wrap(rendered);

		debug!(
			name = %frame.name,
			path = %template.identity.display(),
			"resolved template"
		);

		self.dependencies.insert(template.identity);
		self.fragments.insert(cache_key, rendered.clone());

		Ok(rendered)
	}

	/// Find the template called `name`, trying each candidate path in turn.
	fn locate(&mut self, name: &str) -> HasteResult<Located> {
		let mut attempted = Vec::new();

		for (path, kind) in candidate_paths(name) {
			let identity = self.resolver.identify(&path);

			if let Some(content) = self.contents.get(&identity) {
				return Ok(Located {
					identity,
					kind,
					content: Rc::clone(content),
				});
			}

			if let Some(content) = self.resolver.load(&path)? {
				let content: Rc<str> = content.into();
				self.contents.insert(identity.clone(), Rc::clone(&content));

				return Ok(Located {
					identity,
					kind,
					content,
				});
			}

			attempted.push(path);
		}

		Err(HasteError::TemplateNotFound {
			name: name.to_string(),
			attempted,
		})
	}
}

/// Handle a variable tag: open a frame for its content or store the trimmed
/// content on the enclosing inclusion frame.
fn handle_variable(token: &Token<'_>, name: String, stack: &mut Vec<Frame>) -> HasteResult<()> {
	if token.kind.opens() {
		match stack.last() {
			Some(parent) if parent.kind == FrameKind::Inclusion => {}
			Some(parent) => {
				return Err(HasteError::InvalidNesting(format!(
					"variable tag `<{}>` cannot be placed inside variable tag `<{}>`",
					token.name, parent.tag
				)));
			}
			None => {
				return Err(HasteError::InvalidNesting(format!(
					"variable tag `<{}>` must be placed directly inside a template tag",
					token.name
				)));
			}
		}

		stack.push(Frame {
			tag: token.name.clone(),
			name,
			kind: FrameKind::Variable,
			content: String::new(),
			attributes: BTreeMap::new(),
			variables: BTreeMap::new(),
		});
	}

	if token.kind.closes() {
		let frame = pop_frame(stack, &token.name, FrameKind::Variable)?;
		let value = frame.content.trim().to_string();

		if let Some(parent) = stack.last_mut() {
			parent.variables.insert(frame.name, value);
		}
	}

	Ok(())
}

/// Pop the innermost frame, which must have been opened by a tag called `tag`
/// of the given kind.
fn pop_frame(stack: &mut Vec<Frame>, tag: &str, kind: FrameKind) -> HasteResult<Frame> {
	match stack.last() {
		Some(top) if top.tag == tag && top.kind == kind => {}
		Some(top) => {
			return Err(HasteError::InvalidNesting(format!(
				"closing {} tag `</{tag}>` does not match open {} tag `<{}>`",
				kind.describe(),
				top.kind.describe(),
				top.tag
			)));
		}
		None => {
			return Err(HasteError::InvalidNesting(format!(
				"closing {} tag `</{tag}>` has no matching open tag",
				kind.describe()
			)));
		}
	}

	stack.pop().ok_or_else(|| {
		HasteError::InvalidNesting(format!("closing tag `</{tag}>` has no matching open tag"))
	})
}

/// Write `text` into the innermost open frame, or into the output when no tag
/// is open.
fn append(stack: &mut [Frame], output: &mut String, text: &str) {
	match stack.last_mut() {
		Some(frame) => frame.content.push_str(text),
		None => output.push_str(text),
	}
}

/// Key identifying an inclusion whose rendered output can be reused.
fn fragment_key(origin: &Path, frame: &Frame, scope: &Scope) -> String {
	let mut key = String::new();
	key.push_str(&origin.to_string_lossy());
	key.push('\u{1d}');
	key.push_str(&frame.name);
	key.push('\u{1d}');
	key.push_str(&frame.content);
	key.push('\u{1d}');
	for entries in [&frame.attributes, &frame.variables] {
		for (name, value) in entries {
			key.push_str(name);
			key.push('\u{1f}');
			key.push_str(value);
			key.push('\u{1e}');
		}
		key.push('\u{1d}');
	}
	key.push_str(&scope.fingerprint());
	key
}

/// Render `source` with a fresh builder and an empty scope.
///
/// ```
/// use haste_core::MemoryResolver;
/// use haste_core::Syntax;
/// use haste_core::render;
///
/// let resolver = MemoryResolver::new().with("greeting.html", "<p>Hello {{who}}</p>");
/// let output = render(r#"<t:greeting who="world"/>"#, &Syntax::default(), &resolver)?;
/// assert_eq!(output, "<p>Hello world</p>");
/// # Ok::<(), haste_core::HasteError>(())
/// ```
pub fn render(source: &str, syntax: &Syntax, resolver: &dyn TemplateResolver) -> HasteResult<String> {
	let rendered = Builder::new(syntax, resolver).render(Path::new(""), source, Scope::new())?;
	Ok(rendered.content)
}
