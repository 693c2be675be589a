use crate::Scope;

const VARIABLE_MARKER: char = '@';
const VARIABLE_SEPARATOR: char = '=';

/// Read the `@key=value` lines at the top of `content` into `scope` and return
/// the rest of the content untouched.
///
/// Reading stops at the first line that does not start with `@`. A line that
/// starts with `@` but has no `=` is skipped. Keys that already have a value in
/// `scope` keep it, so values inherited from an including file win over local
/// declarations.
pub fn parse_preamble<'a>(content: &'a str, scope: &mut Scope) -> &'a str {
	let mut offset = 0;

	while offset < content.len() {
		let rest = &content[offset..];
		let line_length = rest.find('\n').map_or(rest.len(), |index| index + 1);
		let line = &rest[..line_length];
		let line = line.strip_suffix('\n').unwrap_or(line);
		let line = line.strip_suffix('\r').unwrap_or(line);

		let Some(declaration) = line.strip_prefix(VARIABLE_MARKER) else {
			break;
		};

		if let Some((key, value)) = declaration.split_once(VARIABLE_SEPARATOR) {
			scope.set_if_absent(key, value);
		}

		offset += line_length;
	}

	&content[offset..]
}
