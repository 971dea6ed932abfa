//! `MACRO`/`ENDM` capture-and-replay and `REPT`/`ENDR` immediate repetition.
//! Bodies are captured as raw source text; a macro invocation performs
//! positional `\1`..`\9` substitution and pushes the result back onto the
//! pending-line stack so it runs through the ordinary statement dispatcher,
//! exactly as if it had been typed inline.

use crate::error::AssemblyError;
use crate::symbol::{LabelKind, MacroBody, ReptBody};

use super::{Assembler, PendingLine};

/// What the assembler is doing with lines it reads while capturing a body
/// instead of executing them.
pub(super) enum Capture {
	Macro { name: String, params: Vec<String>, lines: Vec<String>, depth: u32 },
	Rept { count: i64, lines: Vec<String>, depth: u32 },
}

/// Splits a macro invocation's argument list on unquoted commas.
pub(super) fn split_args(text: &str) -> Vec<String> {
	let trimmed = text.trim();
	if trimmed.is_empty() {
		return Vec::new();
	}
	let bytes = trimmed.as_bytes();
	let mut in_string: Option<u8> = None;
	let mut start = 0;
	let mut args = Vec::new();
	for (index, &byte) in bytes.iter().enumerate() {
		match in_string {
			Some(quote) if byte == quote => in_string = None,
			Some(_) => {},
			None if byte == b'"' || byte == b'\'' => in_string = Some(byte),
			None if byte == b',' => {
				args.push(trimmed[start .. index].trim().to_owned());
				start = index + 1;
			},
			None => {},
		}
	}
	args.push(trimmed[start ..].trim().to_owned());
	args
}

/// Substitutes `\1`..`\9` with the corresponding actual argument (empty
/// string if not supplied).
fn substitute_params(line: &str, args: &[String]) -> String {
	let mut out = String::with_capacity(line.len());
	let mut chars = line.chars().peekable();
	while let Some(chr) = chars.next() {
		if chr == '\\'
			&& let Some(&next) = chars.peek()
			&& next.is_ascii_digit()
			&& next != '0'
		{
			chars.next();
			let index = next.to_digit(10).unwrap() as usize - 1;
			out.push_str(args.get(index).map_or("", String::as_str));
			continue;
		}
		out.push(chr);
	}
	out
}

impl Assembler {
	/// `name MACRO p1,p2,...`: starts capturing the body up to the matching
	/// `ENDM`.
	pub(super) fn begin_macro_capture(&mut self, name: &str, param_text: &str, _line: usize) {
		let params = split_args(param_text);
		self.capture = Some(Capture::Macro { name: name.to_owned(), params, lines: Vec::new(), depth: 0 });
	}

	/// `REPT count`: evaluates `count` immediately and starts capturing the
	/// body up to the matching `ENDR`.
	pub(super) fn begin_rept_capture(&mut self, count_text: &str, line: usize) -> crate::error::AsmResult<()> {
		let result = self.eval_expr(count_text, line)?;
		self.capture = Some(Capture::Rept { count: result.value, lines: Vec::new(), depth: 0 });
		Ok(())
	}

	/// Feeds one raw (unexpanded) line into the in-progress capture. Returns
	/// `true` once the matching terminator has closed the capture and it has
	/// been fully handled (definition stored, or `REPT` body replayed).
	pub(super) fn feed_capture_line(&mut self, text: &str, line: usize) -> crate::error::AsmResult<bool> {
		let word = text.trim_start().split_whitespace().next().unwrap_or("").to_ascii_uppercase();
		let Some(capture) = self.capture.as_mut() else { return Ok(false) };

		match capture {
			Capture::Macro { lines, depth, .. } =>
				if word == "MACRO" {
					*depth += 1;
					lines.push(text.to_owned());
				} else if word == "ENDM" {
					if *depth > 0 {
						*depth -= 1;
						lines.push(text.to_owned());
					} else {
						let Some(Capture::Macro { name, params, lines, .. }) = self.capture.take() else { unreachable!() };
						self.symtab.define(&name, LabelKind::Macro(MacroBody { params, lines }), false, self.pass, line, self.last_chance)?;
						return Ok(true);
					}
				} else {
					lines.push(text.to_owned());
				},
			Capture::Rept { lines, depth, .. } =>
				if word == "REPT" {
					*depth += 1;
					lines.push(text.to_owned());
				} else if word == "ENDR" {
					if *depth > 0 {
						*depth -= 1;
						lines.push(text.to_owned());
					} else {
						let Some(Capture::Rept { count, lines, .. }) = self.capture.take() else { unreachable!() };
						self.replay_rept(&ReptBody { lines }, count, line);
						return Ok(true);
					}
				} else {
					lines.push(text.to_owned());
				},
		}
		Ok(false)
	}

	fn replay_rept(&mut self, body: &ReptBody, count: i64, line: usize) {
		let repeats = count.max(0);
		self.expansion_depth += 1;
		self.pending.push(PendingLine::ExpansionEnd);
		for _ in 0 .. repeats {
			for source_line in body.lines.iter().rev() {
				self.pending.push(PendingLine::Source { name: self.current_file.clone(), line_number: line, text: source_line.clone() });
			}
		}
	}

	/// Expands a macro invocation and pushes its body onto the pending-line
	/// stack so it is processed next, exactly like an `INCLUDE`.
	pub(super) fn invoke_macro(&mut self, body: &MacroBody, name: &str, args_text: &str, line: usize) -> crate::error::AsmResult<()> {
		if self.active_macros.contains(name) {
			return Err(AssemblyError::RecursiveMacro { name: name.to_owned(), line });
		}
		if self.active_macros.len() >= 64 {
			return Err(AssemblyError::RecursiveMacro { name: name.to_owned(), line });
		}
		let args = split_args(args_text);
		self.active_macros.insert(name.to_owned());
		self.expansion_depth += 1;
		self.pending.push(PendingLine::MacroExit(name.to_owned()));
		for source_line in body.lines.iter().rev() {
			self.pending.push(PendingLine::Source {
				name: self.current_file.clone(),
				line_number: line,
				text: substitute_params(source_line, &args),
			});
		}
		Ok(())
	}
}
