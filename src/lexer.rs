//! Line-level preprocessing: comment/statement splitting and equate
//! (textual macro) expansion, done character-by-character on one line at
//! a time.

use crate::error::{AssemblyError, AsmResult};
use crate::symbol::{LabelKind, SymbolTable};

/// Splits a line into the code portion and the trailing comment (from `;`
/// to end of line), honoring quoted strings so a `;` inside a string
/// literal does not start a comment.
#[must_use]
pub fn split_comment(line: &str) -> (&str, Option<&str>) {
	let bytes = line.as_bytes();
	let mut in_string: Option<u8> = None;
	let mut escaped = false;
	for (index, &byte) in bytes.iter().enumerate() {
		if escaped {
			escaped = false;
			continue;
		}
		match in_string {
			Some(quote) if byte == b'\\' => escaped = true,
			Some(quote) if byte == quote => in_string = None,
			Some(_) => {},
			None if byte == b'"' || byte == b'\'' => in_string = Some(byte),
			None if byte == b';' => return (&line[.. index], Some(&line[index + 1 ..])),
			None => {},
		}
	}
	(line, None)
}

/// Splits a line into statements at unquoted `:` characters, which the
/// lexer treats as whitespace-equivalent statement separators.
#[must_use]
pub fn split_statements(line: &str) -> Vec<&str> {
	let bytes = line.as_bytes();
	let mut in_string: Option<u8> = None;
	let mut escaped = false;
	let mut start = 0;
	let mut statements = Vec::new();
	for (index, &byte) in bytes.iter().enumerate() {
		if escaped {
			escaped = false;
			continue;
		}
		match in_string {
			Some(quote) if byte == b'\\' => escaped = true,
			Some(quote) if byte == quote => in_string = None,
			Some(_) => {},
			None if byte == b'"' || byte == b'\'' => in_string = Some(byte),
			None if byte == b':' => {
				statements.push(&line[start .. index]);
				start = index + 1;
			},
			None => {},
		}
	}
	statements.push(&line[start ..]);
	statements
}

fn is_identifier_start(chr: char) -> bool {
	chr == '_' || chr == '.' || chr == '@' || chr.is_alphabetic()
}

fn is_identifier_continue(chr: char) -> bool {
	is_identifier_start(chr) || chr.is_ascii_digit()
}

/// Expands equates on one line (without its comment), recursing into
/// substituted text. `pass` identifies the current pass so that only
/// equates already defined this pass are substituted (a forward equate
/// reference is left as a plain identifier for the evaluator to classify
/// as a dependency).
pub fn expand_equates(line: &str, symtab: &mut SymbolTable, pass: u32, source_line: usize) -> AsmResult<String> {
	let mut out = String::with_capacity(line.len());
	let mut chars = line.char_indices().peekable();
	let mut suppress_next_identifier_lookup = false;

	while let Some((index, chr)) = chars.next() {
		if chr == '"' || chr == '\'' {
			out.push(chr);
			let quote = chr;
			for (_, next_chr) in chars.by_ref() {
				out.push(next_chr);
				if next_chr == '\\' {
					if let Some((_, escaped)) = chars.next() {
						out.push(escaped);
					}
					continue;
				}
				if next_chr == quote {
					break;
				}
			}
			continue;
		}
		if chr == '$' {
			out.push(chr);
			while let Some(&(_, next_chr)) = chars.peek() {
				if next_chr.is_ascii_hexdigit() {
					out.push(next_chr);
					chars.next();
				} else {
					break;
				}
			}
			continue;
		}
		if chr.is_ascii_digit() {
			out.push(chr);
			while let Some(&(_, next_chr)) = chars.peek() {
				if next_chr.is_ascii_alphanumeric() {
					out.push(next_chr);
					chars.next();
				} else {
					break;
				}
			}
			continue;
		}
		if is_identifier_start(chr) {
			let mut ident = String::new();
			ident.push(chr);
			while let Some(&(_, next_chr)) = chars.peek() {
				if is_identifier_continue(next_chr) {
					ident.push(next_chr);
					chars.next();
				} else {
					break;
				}
			}

			if suppress_next_identifier_lookup {
				suppress_next_identifier_lookup = false;
				out.push_str(&ident);
				continue;
			}

			let upper = ident.to_ascii_uppercase();
			if upper == "IFDEF" || upper == "IFNDEF" {
				suppress_next_identifier_lookup = true;
			}

			let lookup_name = ident.strip_prefix('.').unwrap_or(&ident);
			let equate_text = symtab.lookup(lookup_name).and_then(|label| match &label.kind {
				LabelKind::Equate(text) if label.defined_this_pass == pass => Some(text.clone()),
				_ => None,
			});

			match equate_text {
				Some(text) => {
					if let Some(existing) = symtab.lookup_mut(lookup_name) {
						if existing.recursion_guard {
							return Err(AssemblyError::RecursiveEquate { name: lookup_name.to_owned(), line: source_line });
						}
						existing.recursion_guard = true;
					}
					let expanded = expand_equates(&text, symtab, pass, source_line);
					if let Some(existing) = symtab.lookup_mut(lookup_name) {
						existing.recursion_guard = false;
					}
					out.push_str(&expanded?);
				},
				None => out.push_str(&ident),
			}
			continue;
		}

		out.push(chr);
		let _ = index;
	}

	Ok(out)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn comment_is_split_off() {
		let (code, comment) = split_comment("LDA #1 ; load one");
		assert_eq!(code, "LDA #1 ");
		assert_eq!(comment, Some(" load one"));
	}

	#[test]
	fn semicolon_in_string_is_not_a_comment() {
		let (code, comment) = split_comment("DB \"a;b\" ; real comment");
		assert_eq!(code, "DB \"a;b\" ");
		assert_eq!(comment, Some(" real comment"));
	}

	#[test]
	fn colon_splits_statements() {
		let statements = split_statements("LDA #1 : STA $00");
		assert_eq!(statements, vec!["LDA #1 ", " STA $00"]);
	}

	#[test]
	fn equate_expands_to_its_text() {
		let mut symtab = SymbolTable::new();
		symtab.define("FOO", LabelKind::Equate("$8000".to_owned()), false, 1, 1, false).unwrap();
		let expanded = expand_equates("LDA FOO", &mut symtab, 1, 2).unwrap();
		assert_eq!(expanded, "LDA $8000");
	}

	#[test]
	fn recursive_equate_is_rejected() {
		let mut symtab = SymbolTable::new();
		symtab.define("A", LabelKind::Equate("B".to_owned()), false, 1, 1, false).unwrap();
		symtab.define("B", LabelKind::Equate("A".to_owned()), false, 1, 2, false).unwrap();
		let result = expand_equates("A", &mut symtab, 1, 3);
		assert!(result.is_err());
	}
}
