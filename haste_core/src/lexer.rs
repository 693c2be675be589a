use logos::Lexer;
use logos::Logos;

use crate::tokens::Attribute;
use crate::tokens::Token;
use crate::tokens::TokenKind;

/// Elements whose body is never scanned for tags, mirroring the HTML raw text
/// and escapable raw text states.
const RAW_TEXT_ELEMENTS: [&str; 8] = [
	"script", "style", "textarea", "title", "xmp", "iframe", "noembed", "noframes",
];

/// Tokens recognised between tags.
#[derive(Logos, Debug, PartialEq)]
enum ContentToken {
	#[token("<!--", skip_comment)]
	Comment,
	#[regex(r"</[a-zA-Z][^\t\n\f\r />]*")]
	EndTagOpen,
	#[regex(r"<[a-zA-Z][^\t\n\f\r />]*")]
	StartTagOpen,
	#[regex(r"[^<]+")]
	Text,
	#[token("<")]
	Lt,
}

/// Tokens recognised inside a tag, after its name.
#[derive(Logos, Debug, PartialEq)]
enum AttrToken {
	#[token(">")]
	TagClose,
	#[token("/>")]
	SelfClose,
	#[token("/")]
	Slash,
	#[token("=")]
	Equals,
	#[regex(r"[\t\n\f\r ]+")]
	Whitespace,
	#[regex(r#""[^"]*""#)]
	DoubleQuoted,
	#[regex(r"'[^']*'")]
	SingleQuoted,
	#[regex(r#"[^\t\n\f\r "'/=>]+"#)]
	Word,
}

/// Consume everything up to and including the next `-->`, or the rest of the
/// input for an unterminated comment.
fn skip_comment(lex: &mut Lexer<ContentToken>) {
	let remainder = lex.remainder();
	let length = remainder.find("-->").map_or(remainder.len(), |index| index + 3);
	lex.bump(length);
}

/// States of the attribute state machine.
enum AttrState {
	/// Waiting for an attribute name or the end of the tag.
	Between,
	/// An attribute name was read; a `=` may follow.
	AfterName(String),
	/// A `=` was read; waiting for the value.
	BeforeValue(String),
	/// Inside an unquoted value.
	Unquoted(String, String),
}

/// The interior of a tag once its closing `>` has been found.
struct TagInterior {
	/// Bytes consumed after the tag name, including the closing `>`.
	length: usize,
	self_closing: bool,
	attributes: Vec<Attribute>,
}

fn push_attribute(attributes: &mut Vec<Attribute>, key: String, value: String) {
	if let Some(existing) = attributes.iter_mut().find(|attr| attr.key == key) {
		existing.value = value;
	} else {
		attributes.push(Attribute { key, value });
	}
}

fn unquote(slice: &str) -> &str {
	&slice[1..slice.len() - 1]
}

/// Walk the attribute tokens of a tag until its closing `>`. Returns `None`
/// when the input ends before the tag does.
fn lex_tag_interior(source: &str) -> Option<TagInterior> {
	let mut lexer = AttrToken::lexer(source);
	let mut attributes = Vec::new();
	let mut state = AttrState::Between;

	while let Some(result) = lexer.next() {
		let slice = lexer.slice();
		let end = lexer.span().end;

		state = match (state, result) {
			(AttrState::Between, Ok(AttrToken::Whitespace | AttrToken::Slash)) => {
				AttrState::Between
			}
			(AttrState::Between, Ok(AttrToken::TagClose | AttrToken::SelfClose)) => {
				return Some(TagInterior {
					length: end,
					self_closing: slice == "/>",
					attributes,
				});
			}
			(AttrState::Between, _) => AttrState::AfterName(slice.to_ascii_lowercase()),
			(AttrState::AfterName(name), Ok(AttrToken::Whitespace)) => AttrState::AfterName(name),
			(AttrState::AfterName(name), Ok(AttrToken::Equals)) => AttrState::BeforeValue(name),
			(AttrState::AfterName(name), Ok(AttrToken::TagClose | AttrToken::SelfClose)) => {
				push_attribute(&mut attributes, name, String::new());
				return Some(TagInterior {
					length: end,
					self_closing: slice == "/>",
					attributes,
				});
			}
			(AttrState::AfterName(name), Ok(AttrToken::Slash)) => {
				push_attribute(&mut attributes, name, String::new());
				AttrState::Between
			}
			(AttrState::AfterName(name), _) => {
				push_attribute(&mut attributes, name, String::new());
				AttrState::AfterName(slice.to_ascii_lowercase())
			}
			(AttrState::BeforeValue(name), Ok(AttrToken::Whitespace)) => AttrState::BeforeValue(name),
			(
				AttrState::BeforeValue(name),
				Ok(AttrToken::DoubleQuoted | AttrToken::SingleQuoted),
			) => {
				push_attribute(&mut attributes, name, unquote(slice).to_string());
				AttrState::Between
			}
			(AttrState::BeforeValue(name), Ok(AttrToken::TagClose)) => {
				push_attribute(&mut attributes, name, String::new());
				return Some(TagInterior {
					length: end,
					self_closing: false,
					attributes,
				});
			}
			(AttrState::BeforeValue(name), Ok(AttrToken::SelfClose)) => {
				push_attribute(&mut attributes, name, String::new());
				return Some(TagInterior {
					length: end,
					self_closing: true,
					attributes,
				});
			}
			(AttrState::BeforeValue(name), _) => AttrState::Unquoted(name, slice.to_string()),
			(AttrState::Unquoted(name, value), Ok(AttrToken::Whitespace)) => {
				push_attribute(&mut attributes, name, value);
				AttrState::Between
			}
			(AttrState::Unquoted(name, value), Ok(AttrToken::TagClose)) => {
				push_attribute(&mut attributes, name, value);
				return Some(TagInterior {
					length: end,
					self_closing: false,
					attributes,
				});
			}
			// A slash directly before `>` belongs to an unquoted value.
			(AttrState::Unquoted(name, mut value), Ok(AttrToken::SelfClose)) => {
				value.push('/');
				push_attribute(&mut attributes, name, value);
				return Some(TagInterior {
					length: end,
					self_closing: false,
					attributes,
				});
			}
			(AttrState::Unquoted(name, mut value), _) => {
				value.push_str(slice);
				AttrState::Unquoted(name, value)
			}
		};
	}

	None
}

/// Find the start of the closing tag for a raw text element, ignoring ASCII
/// case. The name must be followed by whitespace, `/`, `>` or the end of input.
fn find_closing_tag(haystack: &str, name: &str) -> Option<usize> {
	let needle = format!("</{name}");
	let bytes = haystack.as_bytes();

	bytes
		.windows(needle.len())
		.enumerate()
		.filter(|(_, window)| window.eq_ignore_ascii_case(needle.as_bytes()))
		.map(|(index, _)| index)
		.find(|index| {
			bytes.get(index + needle.len()).is_none_or(|byte| {
				matches!(byte, b'\t' | b'\n' | b'\x0C' | b'\r' | b' ' | b'/' | b'>')
			})
		})
}

/// Splits HTML-like source into [`Token`]s.
///
/// This is deliberately forgiving: anything that cannot be read as a tag is
/// emitted as text, so the concatenated `raw` slices of all tokens always equal
/// the input.
pub struct Tokenizer<'a> {
	source: &'a str,
	offset: usize,
	raw_text_element: Option<String>,
}

impl<'a> Tokenizer<'a> {
	pub fn new(source: &'a str) -> Self {
		Self {
			source,
			offset: 0,
			raw_text_element: None,
		}
	}

	fn emit_text(&mut self, length: usize) -> Token<'a> {
		let raw = &self.source[self.offset..self.offset + length];
		self.offset += length;
		Token::text(raw)
	}

	fn emit_tag(&mut self, name_length: usize, is_end: bool) -> Token<'a> {
		let rest = &self.source[self.offset..];
		let name_start = if is_end { 2 } else { 1 };
		let name = rest[name_start..name_length].to_ascii_lowercase();

		let Some(interior) = lex_tag_interior(&rest[name_length..]) else {
			// An unterminated tag swallows the rest of the input as text.
			return self.emit_text(rest.len());
		};

		let length = name_length + interior.length;
		let raw = &rest[..length];
		self.offset += length;

		if is_end {
			return Token::tag(TokenKind::EndTag, raw, name, Vec::new());
		}

		if interior.self_closing {
			return Token::tag(TokenKind::SelfClosingTag, raw, name, interior.attributes);
		}

		if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
			self.raw_text_element = Some(name.clone());
		}

		Token::tag(TokenKind::StartTag, raw, name, interior.attributes)
	}
}

impl<'a> Iterator for Tokenizer<'a> {
	type Item = Token<'a>;

	fn next(&mut self) -> Option<Self::Item> {
		let rest = &self.source[self.offset..];
		if rest.is_empty() {
			return None;
		}

		if let Some(element) = self.raw_text_element.take() {
			let length = find_closing_tag(rest, &element).unwrap_or(rest.len());
			if length > 0 {
				return Some(self.emit_text(length));
			}
		}

		let mut lexer = ContentToken::lexer(rest);
		let result = lexer.next()?;
		let length = lexer.span().end;

		let token = match result {
			Ok(ContentToken::Comment) => {
				let raw = &rest[..length];
				self.offset += length;
				Token::comment(raw)
			}
			Ok(ContentToken::StartTagOpen) => self.emit_tag(length, false),
			Ok(ContentToken::EndTagOpen) => self.emit_tag(length, true),
			Ok(ContentToken::Text | ContentToken::Lt) | Err(()) => self.emit_text(length),
		};

		Some(token)
	}
}

/// Tokenize a whole document.
pub fn tokenize(source: &str) -> Vec<Token<'_>> {
	Tokenizer::new(source).collect()
}
