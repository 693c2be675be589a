use std::fmt::Display;

/// The kind of a token produced by the [`Tokenizer`](crate::Tokenizer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
	/// Plain text between tags, including the body of raw-text elements such as
	/// `<script>`.
	Text,
	/// `<!-- ... -->`
	Comment,
	/// `<name attr="value">`
	StartTag,
	/// `</name>`
	EndTag,
	/// `<name attr="value"/>`
	SelfClosingTag,
}

impl TokenKind {
	/// Whether the token opens a tag scope (start or self-closing).
	pub fn opens(self) -> bool {
		matches!(self, Self::StartTag | Self::SelfClosingTag)
	}

	/// Whether the token closes a tag scope (end or self-closing).
	pub fn closes(self) -> bool {
		matches!(self, Self::EndTag | Self::SelfClosingTag)
	}
}

/// A single `key="value"` pair captured from a tag. Keys are lower-cased, values
/// keep their original case with the surrounding quotes removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
	pub key: String,
	pub value: String,
}

impl Attribute {
	pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
		Self {
			key: key.into(),
			value: value.into(),
		}
	}
}

/// One token of an HTML-like document.
///
/// Every token keeps the exact slice of source it was produced from, so writing
/// the `raw` value of every token back out reproduces the input unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
	pub kind: TokenKind,
	/// The source slice this token covers.
	pub raw: &'a str,
	/// Lower-cased tag name. Empty for text and comments.
	pub name: String,
	/// Attributes in source order. Empty for anything but start and
	/// self-closing tags.
	pub attributes: Vec<Attribute>,
}

impl<'a> Token<'a> {
	pub fn text(raw: &'a str) -> Self {
		Self {
			kind: TokenKind::Text,
			raw,
			name: String::new(),
			attributes: Vec::new(),
		}
	}

	pub fn comment(raw: &'a str) -> Self {
		Self {
			kind: TokenKind::Comment,
			raw,
			name: String::new(),
			attributes: Vec::new(),
		}
	}

	pub fn tag(kind: TokenKind, raw: &'a str, name: String, attributes: Vec<Attribute>) -> Self {
		Self {
			kind,
			raw,
			name,
			attributes,
		}
	}

	/// Returns the tag name with `prefix` removed when the name starts with it.
	pub fn strip_prefix(&self, prefix: &str) -> Option<&str> {
		if matches!(self.kind, TokenKind::Text | TokenKind::Comment) {
			return None;
		}

		self.name.strip_prefix(prefix)
	}
}

impl Display for Token<'_> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.raw)
	}
}
