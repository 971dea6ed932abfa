//! The data-emitting directives: `DB`/`DW`/`DSB`/`DSW`/`DL`/`DH`/`HEX`,
//! plus the file directives `INCBIN`/`INCLUDE`. Split out from
//! [`super`]'s dispatcher because these are the directives that actually
//! produce bytes, as opposed to the ones that only move the program
//! counter or control assembly flow.

use std::path::Path;

use crate::error::{AssemblyError, AsmResult};

use super::{macro_engine::split_args, Assembler, PendingLine};

/// One comma-separated item in a `DB`/`DW`/`DL`/`DH` operand list: either a
/// quoted string (each character becomes one byte) or an expression.
enum Item {
	Text(Vec<u8>),
	Expr(String),
}

fn classify_item(item: &str) -> Item {
	let trimmed = item.trim();
	if (trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2)
		|| (trimmed.starts_with('\'') && trimmed.ends_with('\'') && trimmed.len() >= 2 && trimmed.len() != 3)
	{
		let inner = &trimmed[1 .. trimmed.len() - 1];
		let mut bytes = Vec::with_capacity(inner.len());
		let mut chars = inner.chars();
		while let Some(chr) = chars.next() {
			if chr == '\\' {
				if let Some(escaped) = chars.next() {
					bytes.push(escaped as u8);
				}
			} else {
				bytes.push(chr as u8);
			}
		}
		Item::Text(bytes)
	} else {
		Item::Expr(trimmed.to_owned())
	}
}

impl Assembler {
	pub(super) fn run_define_byte(&mut self, operand: &str, line: usize) -> AsmResult<()> {
		for item in split_args(operand) {
			match classify_item(&item) {
				Item::Text(bytes) => self.output.emit_bytes(&bytes, line)?,
				Item::Expr(expr) => {
					let value = self.eval_expr(&expr, line)?;
					if !value.dependent && !(-128 ..= 255).contains(&value.value) {
						return Err(AssemblyError::OutOfRange { value: value.value, line, help: Some(
							"a byte value must fit in -128..=255".to_owned(),
						) });
					}
					self.output.emit_byte((value.value & 0xFF) as u8, line)?;
				},
			}
		}
		Ok(())
	}

	pub(super) fn run_define_word(&mut self, operand: &str, line: usize) -> AsmResult<()> {
		for item in split_args(operand) {
			match classify_item(&item) {
				Item::Text(bytes) =>
					for byte in bytes {
						self.output.emit_word(i64::from(byte), line)?;
					},
				Item::Expr(expr) => {
					let value = self.eval_expr(&expr, line)?;
					self.output.emit_word(value.value, line)?;
				},
			}
		}
		Ok(())
	}

	pub(super) fn run_define_low(&mut self, operand: &str, line: usize) -> AsmResult<()> {
		for item in split_args(operand) {
			if let Item::Expr(expr) = classify_item(&item) {
				let value = self.eval_expr(&expr, line)?;
				self.output.emit_byte((value.value & 0xFF) as u8, line)?;
			}
		}
		Ok(())
	}

	pub(super) fn run_define_high(&mut self, operand: &str, line: usize) -> AsmResult<()> {
		for item in split_args(operand) {
			if let Item::Expr(expr) = classify_item(&item) {
				let value = self.eval_expr(&expr, line)?;
				self.output.emit_byte(((value.value >> 8) & 0xFF) as u8, line)?;
			}
		}
		Ok(())
	}

	pub(super) fn run_define_space_bytes(&mut self, operand: &str, line: usize) -> AsmResult<()> {
		let parts = split_args(operand);
		let count = self.eval_expr(parts.first().map_or("", String::as_str), line)?.value;
		if let Some(fill_text) = parts.get(1) {
			let fill = self.eval_expr(fill_text, line)?;
			let saved = self.output.fill_value();
			self.output.set_fill_value((fill.value & 0xFF) as u8);
			let result = self.output.reserve(count, line);
			self.output.set_fill_value(saved);
			result
		} else {
			self.output.reserve(count, line)
		}
	}

	pub(super) fn run_define_space_words(&mut self, operand: &str, line: usize) -> AsmResult<()> {
		let parts = split_args(operand);
		let count = self.eval_expr(parts.first().map_or("", String::as_str), line)?.value;
		let fill_word = match parts.get(1) {
			Some(text) => self.eval_expr(text, line)?.value,
			None => 0,
		};
		for _ in 0 .. count.max(0) {
			self.output.emit_word(fill_word, line)?;
		}
		Ok(())
	}

	pub(super) fn run_hex(&mut self, operand: &str, line: usize) -> AsmResult<()> {
		let digits: String = operand.chars().filter(|c| !c.is_whitespace() && *c != ',').collect();
		if digits.len() % 2 != 0 || digits.is_empty() {
			return Err(AssemblyError::NotANumber { text: operand.trim().to_owned(), line });
		}
		let mut bytes = Vec::with_capacity(digits.len() / 2);
		let chars: Vec<char> = digits.chars().collect();
		for pair in chars.chunks(2) {
			let text: String = pair.iter().collect();
			let byte = u8::from_str_radix(&text, 16).map_err(|_| AssemblyError::NotANumber { text: text.clone(), line })?;
			bytes.push(byte);
		}
		self.output.emit_bytes(&bytes, line)
	}

	pub(super) fn run_incbin(&mut self, operand: &str, line: usize) -> AsmResult<()> {
		let parts = split_args(operand);
		let file_name = parts.first().map(|s| s.trim_matches('"').to_owned()).ok_or(AssemblyError::NeedName { line })?;
		let data = self.read_binary_file(&file_name, line)?;
		let offset = match parts.get(1) {
			Some(text) => self.eval_expr(text, line)?.value,
			None => 0,
		};
		let length = match parts.get(2) {
			Some(text) => self.eval_expr(text, line)?.value,
			None => data.len() as i64 - offset,
		};
		if offset < 0 || length < 0 || offset + length > data.len() as i64 {
			return Err(AssemblyError::BadIncbinSize { file_name, line });
		}
		let slice = &data[offset as usize .. (offset + length) as usize];
		self.output.emit_bytes(slice, line)
	}

	fn read_binary_file(&self, file_name: &str, line: usize) -> AsmResult<Vec<u8>> {
		let _ = line;
		let path = self.resolve_path(file_name);
		std::fs::read(&path)
			.map_err(|os_error| AssemblyError::CantOpenFile { file_name: file_name.to_owned(), os_error: os_error.to_string() })
	}

	pub(super) fn run_include(&mut self, operand: &str, _line: usize) -> AsmResult<()> {
		let file_name = operand.trim().trim_matches('"').to_owned();
		let path = self.resolve_path(&file_name);
		let text = std::fs::read_to_string(&path)
			.map_err(|os_error| AssemblyError::CantOpenFile { file_name: file_name.clone(), os_error: os_error.to_string() })?;
		self.push_file_lines(&file_name, &text);
		Ok(())
	}

	fn resolve_path(&self, file_name: &str) -> std::path::PathBuf {
		let candidate = Path::new(file_name);
		if candidate.is_absolute() {
			return candidate.to_owned();
		}
		self.base_dir.as_ref().map_or_else(|| candidate.to_owned(), |base| base.join(candidate))
	}

	pub(super) fn push_file_lines(&mut self, name: &str, text: &str) {
		let shared_name: std::sync::Arc<str> = std::sync::Arc::from(name);
		for (index, line) in text.lines().enumerate().rev() {
			self.pending.push(PendingLine::Source { name: shared_name.clone(), line_number: index + 1, text: line.to_owned() });
		}
	}
}
