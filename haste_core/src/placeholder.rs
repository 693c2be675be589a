use crate::Scope;
use crate::Syntax;

/// Byte that, placed directly before a marker, stops it from being read.
pub const ESCAPE: u8 = b'@';

/// Replace every `{{key}}` placeholder in `input` with its value from `scope`.
///
/// Placeholders never span lines. An opening marker preceded by `@` is kept as
/// text, as is any opening marker whose closing marker does not start within
/// [`Syntax::placeholder_limit`] bytes. Missing keys are replaced with nothing.
/// Inserted values are not scanned again.
pub fn substitute(input: &str, scope: &Scope, syntax: &Syntax) -> String {
	let open = syntax.placeholder_open.as_bytes();
	if open.is_empty() || !input.contains(&syntax.placeholder_open) {
		return input.to_string();
	}

	let mut output = String::with_capacity(input.len());
	for line in input.split_inclusive('\n') {
		substitute_line(line, scope, syntax, &mut output);
	}

	output
}

fn substitute_line(line: &str, scope: &Scope, syntax: &Syntax, output: &mut String) {
	let bytes = line.as_bytes();
	let open = syntax.placeholder_open.as_bytes();
	let close = syntax.placeholder_close.as_bytes();
	let mut emitted = 0;
	let mut cursor = 0;

	while cursor < bytes.len() {
		if !marker_at(bytes, cursor, open) {
			cursor += 1;
			continue;
		}

		let Some(end) = find_close(bytes, cursor, syntax) else {
			cursor += 1;
			continue;
		};

		// Marker positions always fall on char boundaries since the markers
		// are valid UTF-8 themselves.
		output.push_str(&line[emitted..cursor]);
		output.push_str(scope.value(&line[cursor + open.len()..end]));
		cursor = end + close.len();
		emitted = cursor;
	}

	output.push_str(&line[emitted..]);
}

/// Whether an unescaped `marker` starts at `index`.
fn marker_at(bytes: &[u8], index: usize, marker: &[u8]) -> bool {
	bytes[index..].starts_with(marker) && (index == 0 || bytes[index - 1] != ESCAPE)
}

/// Find the closing marker for the opening marker at `start`. A newer opening
/// marker before the close takes over, even one overlapping this one, and the
/// search gives up after `placeholder_limit` bytes.
fn find_close(bytes: &[u8], start: usize, syntax: &Syntax) -> Option<usize> {
	let open = syntax.placeholder_open.as_bytes();
	let close = syntax.placeholder_close.as_bytes();
	let limit = start.saturating_add(syntax.placeholder_limit);
	let key_start = start + open.len();
	let mut index = start + 1;

	while index < bytes.len() && index <= limit {
		if index >= key_start && marker_at(bytes, index, close) {
			return Some(index);
		}

		if marker_at(bytes, index, open) {
			return None;
		}

		index += 1;
	}

	None
}
