//! The pass driver: owns the symbol table and output buffer, walks source
//! lines (recursing into `INCLUDE`s and expanded macro/`REPT` bodies
//! through the same dispatcher), and repeats until every forward reference
//! has settled or the pass budget is spent.

mod directives;
mod macro_engine;
mod opcode_emit;

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use crate::directive::DirectiveTag;
use crate::error::{AssemblyError, AsmResult};
use crate::expr::{evaluate, Cursor, EvalContext, EvalResult};
use crate::lexer;
use crate::listing::{ListingLine, ListingSink, NullListing};
use crate::opcode::Mnemonic;
use crate::symbol::{LabelKind, SymbolTable, NOORIGIN};
use crate::output::OutputSink;

use macro_engine::Capture;

/// A line waiting to be processed: either raw source (from the root file,
/// an `INCLUDE`, a macro invocation, or a `REPT` replay) or a marker that
/// pops an active macro invocation off the recursion-guard set.
enum PendingLine {
	Source { name: Arc<str>, line_number: usize, text: String },
	MacroExit(String),
	ExpansionEnd,
}

/// One level of `IF`/`ELSEIF`/`ELSE`/`ENDIF` nesting.
struct IfFrame {
	/// Whether the enclosing context was itself executing when this `IF`
	/// was reached; captured once so nested `ELSE`/`ELSEIF` never need to
	/// re-examine ancestors.
	parent_active: bool,
	/// Whether some branch of this `IF` has already been taken.
	branch_taken: bool,
	/// Whether lines are currently being executed for this frame.
	taking: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Orientation {
	Forward,
	Backward,
}

struct AnonDef {
	statement_index: usize,
	orientation: Orientation,
	address: i64,
}

fn is_identifier_start(chr: char) -> bool {
	chr == '_' || chr == '.' || chr == '@' || chr.is_alphabetic()
}

fn is_identifier_continue(chr: char) -> bool {
	is_identifier_start(chr) || chr.is_ascii_digit()
}

fn take_leading_identifier(text: &str) -> Option<(&str, &str)> {
	let first = text.chars().next()?;
	if !is_identifier_start(first) {
		return None;
	}
	let len = text.chars().take_while(|c| is_identifier_continue(*c)).count();
	Some((&text[.. len], &text[len ..]))
}

/// A run of `+` or only `-` characters with nothing naming an atom right
/// after it is an anonymous label reference, not the arithmetic operator;
/// a bare "-" or "++" on its own line is always an anonymous definition.
fn is_anon_marker(name: &str) -> bool {
	!name.is_empty() && (name.chars().all(|c| c == '+') || name.chars().all(|c| c == '-'))
}

/// The two-pass engine. Construct with [`Assembler::new`], optionally
/// attach a listing sink, then call [`Assembler::assemble_str`] or
/// [`Assembler::assemble_file`].
pub struct Assembler {
	symtab: SymbolTable,
	output: OutputSink,
	pass: u32,
	last_chance: bool,
	needs_another_pass: bool,
	if_stack: Vec<IfFrame>,
	capture: Option<Capture>,
	pending: Vec<PendingLine>,
	active_macros: HashSet<String>,
	current_file: Arc<str>,
	/// Line number of the still-open `ENUM`, if any; checked for balance the
	/// same way `if_stack`/`capture` are at the end of each pass.
	enum_line: Option<usize>,
	statement_index: usize,
	anon_this_pass: Vec<AnonDef>,
	anon_prev_pass: Vec<AnonDef>,
	listing: Box<dyn ListingSink>,
	base_dir: Option<PathBuf>,
	/// Nesting depth of macro/`REPT` expansion currently being replayed;
	/// zero means the line came straight from a source file.
	expansion_depth: u32,
	/// Whether expanded macro/`REPT` bodies are reported to the listing
	/// sink (`-L`) or only the invoking line (`-l`, the default).
	verbose_listing: bool,
}

impl Assembler {
	#[must_use]
	pub fn new() -> Self {
		Self {
			symtab: SymbolTable::new(),
			output: OutputSink::new(),
			pass: 0,
			last_chance: false,
			needs_another_pass: false,
			if_stack: Vec::new(),
			capture: None,
			pending: Vec::new(),
			active_macros: HashSet::new(),
			current_file: Arc::from(""),
			enum_line: None,
			statement_index: 0,
			anon_this_pass: Vec::new(),
			anon_prev_pass: Vec::new(),
			listing: Box::new(NullListing),
			base_dir: None,
			expansion_depth: 0,
			verbose_listing: false,
		}
	}

	/// Attaches a listing sink that receives one call per assembled line.
	#[must_use]
	pub fn with_listing(mut self, sink: impl ListingSink + 'static) -> Self {
		self.listing = Box::new(sink);
		self
	}

	/// When set, macro/`REPT` bodies are reported to the listing sink
	/// line-by-line as they expand (`-L`); otherwise only the invoking
	/// line is reported (`-l`, the default).
	#[must_use]
	pub const fn with_verbose_listing(mut self, verbose: bool) -> Self {
		self.verbose_listing = verbose;
		self
	}

	/// Assembles source text held entirely in memory. `INCLUDE`/`INCBIN`
	/// targets are still resolved against the process's current directory.
	pub fn assemble_str(&mut self, name: &str, text: &str) -> AsmResult<Vec<u8>> {
		self.assemble(name, text)
	}

	/// Pre-defines a global `VALUE` label before the first pass runs (the
	/// CLI's `-d<name>` flag uses this to bind `name` to `1`).
	pub fn define_value(&mut self, name: &str, value: i64) -> AsmResult<()> {
		self.symtab.define(name, LabelKind::Value(value), false, 0, 0, false)?;
		Ok(())
	}

	/// Assembles a file from disk; `INCLUDE`/`INCBIN` targets are resolved
	/// relative to its parent directory.
	pub fn assemble_file(&mut self, path: &std::path::Path) -> AsmResult<Vec<u8>> {
		let text = std::fs::read_to_string(path)
			.map_err(|os_error| AssemblyError::CantOpenFile { file_name: path.display().to_string(), os_error: os_error.to_string() })?;
		self.base_dir = path.parent().map(std::path::Path::to_path_buf);
		let name = path.display().to_string();
		self.assemble(&name, &text)
	}

	fn assemble(&mut self, root_name: &str, root_text: &str) -> AsmResult<Vec<u8>> {
		const MAX_PASSES: u32 = 7;
		let mut previous_frontier: Option<Vec<(String, u32, Option<i64>)>> = None;
		let mut frontier_stalled = false;
		for pass in 1 ..= MAX_PASSES {
			self.pass = pass;
			self.last_chance = pass == MAX_PASSES || frontier_stalled;
			log::debug!("starting pass {pass} (last chance: {})", self.last_chance);
			let needs_another_pass = self.run_pass(root_name, root_text).map_err(|error| {
				if error.is_dependency_error() {
					log::debug!("pass {pass} failed to converge: {error}");
				}
				error
			})?;
			if !needs_another_pass || self.last_chance {
				return Ok(self.output.bytes().to_vec());
			}
			// If the label frontier didn't move at all since the last pass,
			// another ordinary pass won't help either; force the next one to
			// be the last chance so a genuinely stuck forward reference fails
			// with a real diagnostic instead of silently spending the rest
			// of the pass budget.
			let frontier = self.symtab.label_frontier();
			frontier_stalled = previous_frontier.as_ref() == Some(&frontier);
			previous_frontier = Some(frontier);
		}
		unreachable!("the final pass always either converges or returns an error")
	}

	fn run_pass(&mut self, root_name: &str, root_text: &str) -> AsmResult<bool> {
		self.output = OutputSink::new();
		self.symtab.begin_pass();
		self.if_stack.clear();
		self.enum_line = None;
		self.active_macros.clear();
		self.pending.clear();
		self.needs_another_pass = false;
		self.statement_index = 0;
		self.expansion_depth = 0;
		self.anon_prev_pass = std::mem::take(&mut self.anon_this_pass);
		self.current_file = Arc::from(root_name);
		self.push_file_lines(root_name, root_text);

		while let Some(item) = self.pending.pop() {
			match item {
				PendingLine::MacroExit(name) => {
					self.active_macros.remove(&name);
					self.expansion_depth = self.expansion_depth.saturating_sub(1);
				},
				PendingLine::ExpansionEnd => {
					self.expansion_depth = self.expansion_depth.saturating_sub(1);
				},
				PendingLine::Source { name, line_number, text } => {
					self.current_file = name;
					self.process_physical_line(line_number, &text)?;
				},
			}
		}

		if !self.if_stack.is_empty() {
			return Err(AssemblyError::MissingEndIf { line: 0 });
		}
		match self.capture.take() {
			Some(Capture::Macro { .. }) => return Err(AssemblyError::MissingEndM { line: 0 }),
			Some(Capture::Rept { .. }) => return Err(AssemblyError::MissingEndR { line: 0 }),
			None => {},
		}
		if let Some(line) = self.enum_line {
			return Err(AssemblyError::MissingEndE { line });
		}
		Ok(self.needs_another_pass)
	}

	fn process_physical_line(&mut self, line_number: usize, text: &str) -> AsmResult<()> {
		self.statement_index += 1;
		let pc_before = self.output.pc();
		let bytes_before = self.output.bytes().len();

		let (code, _comment) = lexer::split_comment(text);

		if self.capture.is_some() {
			self.feed_capture_line(code, line_number)?;
		} else {
			for statement in lexer::split_statements(code) {
				self.dispatch_top_level_statement(statement, line_number)?;
			}
		}

		self.report_listing(text, line_number, pc_before, bytes_before);
		Ok(())
	}

	fn report_listing(&mut self, raw_text: &str, line_number: usize, pc_before: i64, bytes_before: usize) {
		if self.expansion_depth > 0 && !self.verbose_listing {
			return;
		}
		let bytes_after = self.output.bytes().len();
		let empty: &[u8] = &[];
		let slice = if bytes_after >= bytes_before { &self.output.bytes()[bytes_before .. bytes_after] } else { empty };
		let pc = if pc_before == NOORIGIN { None } else { Some(pc_before) };
		let listing_line = ListingLine { expanded_text: raw_text, line_number, pc, bytes_emitted: slice };
		self.listing.list_line(&listing_line);
	}

	fn currently_skipping(&self) -> bool {
		self.if_stack.last().is_some_and(|frame| !frame.taking)
	}

	fn dispatch_top_level_statement(&mut self, statement: &str, line: usize) -> AsmResult<()> {
		let trimmed = statement.trim();
		if trimmed.is_empty() {
			return Ok(());
		}
		let first_word = trimmed.split_whitespace().next().unwrap_or("");
		let upper = first_word.to_ascii_uppercase();
		let is_conditional_kw = matches!(upper.as_str(), "IF" | "IFDEF" | "IFNDEF" | "ELSEIF" | "ELSE" | "ENDIF");

		if is_conditional_kw {
			let rest = trimmed[first_word.len() ..].trim();
			return self.handle_conditional(&upper, rest, line);
		}
		if self.currently_skipping() {
			return Ok(());
		}

		let expanded = lexer::expand_equates(trimmed, &mut self.symtab, self.pass, line)?;
		self.dispatch_statement(&expanded, line)
	}

	fn handle_conditional(&mut self, keyword: &str, rest: &str, line: usize) -> AsmResult<()> {
		match keyword {
			"IF" | "IFDEF" | "IFNDEF" => {
				if self.if_stack.len() >= 32 {
					return Err(AssemblyError::IfNestLimit { line });
				}
				let parent_active = !self.currently_skipping();
				let condition = if !parent_active {
					false
				} else {
					match keyword {
						"IF" => self.eval_expr(rest, line)?.value != 0,
						"IFDEF" => self.symtab.lookup(rest.trim()).is_some(),
						"IFNDEF" => self.symtab.lookup(rest.trim()).is_none(),
						_ => unreachable!(),
					}
				};
				self.if_stack.push(IfFrame { parent_active, branch_taken: condition, taking: parent_active && condition });
				Ok(())
			},
			"ELSEIF" => self.handle_elseif(rest, line),
			"ELSE" => self.handle_else(line),
			"ENDIF" => {
				self.if_stack.pop().ok_or(AssemblyError::Syntax { message: "ENDIF without matching IF".to_owned(), line })?;
				Ok(())
			},
			_ => unreachable!(),
		}
	}

	fn handle_elseif(&mut self, rest: &str, line: usize) -> AsmResult<()> {
		let (parent_active, branch_taken) = {
			let frame = self.if_stack.last().ok_or(AssemblyError::Syntax { message: "ELSEIF without matching IF".to_owned(), line })?;
			(frame.parent_active, frame.branch_taken)
		};
		let taking = if !parent_active || branch_taken { false } else { self.eval_expr(rest, line)?.value != 0 };
		let frame = self.if_stack.last_mut().expect("checked above");
		frame.taking = taking;
		if taking {
			frame.branch_taken = true;
		}
		Ok(())
	}

	fn handle_else(&mut self, line: usize) -> AsmResult<()> {
		let frame = self.if_stack.last_mut().ok_or(AssemblyError::Syntax { message: "ELSE without matching IF".to_owned(), line })?;
		if !frame.parent_active || frame.branch_taken {
			frame.taking = false;
		} else {
			frame.taking = true;
			frame.branch_taken = true;
		}
		Ok(())
	}

	fn dispatch_statement(&mut self, text: &str, line: usize) -> AsmResult<()> {
		let trimmed = text.trim_start();
		if trimmed.is_empty() {
			return Ok(());
		}
		let Some((name, rest)) = take_leading_identifier(trimmed) else {
			return Err(AssemblyError::ExtraCharsOnLine { text: trimmed.to_owned(), line });
		};

		if let Some(rest_after_colon) = rest.strip_prefix(':') {
			self.define_label_like(name, line)?;
			return self.dispatch_statement(rest_after_colon, line);
		}

		let lookup_name = name.strip_prefix('.').unwrap_or(name);
		let found_kind = self.symtab.lookup(lookup_name).map(|label| label.kind.clone());
		match found_kind {
			Some(LabelKind::ReservedOpcode(mnemonic)) => return self.emit_instruction(mnemonic, rest, line),
			Some(LabelKind::ReservedDirective(tag)) => return self.run_directive(tag, rest, line),
			Some(LabelKind::Macro(body)) => return self.invoke_macro(&body, lookup_name, rest, line),
			_ => {},
		}

		let after = rest.trim_start();
		if let Some(expr_text) = after.strip_prefix('=') {
			let value = self.eval_expr(expr_text, line)?;
			let outcome = self.symtab.define(name, LabelKind::Value(value.value), name.starts_with('@'), self.pass, line, self.last_chance)?;
			if outcome.needs_another_pass {
				self.needs_another_pass = true;
			}
			return Ok(());
		}
		if let Some((word2, rest2)) = take_leading_identifier(after) {
			let upper2 = word2.to_ascii_uppercase();
			if upper2 == "EQU" {
				let outcome =
					self.symtab.define(name, LabelKind::Equate(rest2.trim().to_owned()), name.starts_with('@'), self.pass, line, self.last_chance)?;
				if outcome.needs_another_pass {
					self.needs_another_pass = true;
				}
				return Ok(());
			}
			if upper2 == "MACRO" {
				self.begin_macro_capture(name, rest2, line);
				return Ok(());
			}
		}

		self.define_label_like(name, line)?;
		self.dispatch_statement(rest, line)
	}

	fn define_label_like(&mut self, name: &str, line: usize) -> AsmResult<()> {
		if is_anon_marker(name) {
			let orientation = if name.starts_with('+') { Orientation::Forward } else { Orientation::Backward };
			self.anon_this_pass.push(AnonDef { statement_index: self.statement_index, orientation, address: self.output.pc() });
			return Ok(());
		}
		let local = name.starts_with('@');
		let outcome = self.symtab.define(name, LabelKind::Label(self.output.pc()), local, self.pass, line, self.last_chance)?;
		if outcome.needs_another_pass {
			self.needs_another_pass = true;
		}
		Ok(())
	}

	fn run_directive(&mut self, tag: DirectiveTag, operand: &str, line: usize) -> AsmResult<()> {
		use DirectiveTag::{
			Align, Base, DefineByte, DefineHigh, DefineLow, DefineSpaceBytes, DefineSpaceWords, DefineWord, Else, ElseIf, EndEnum, EndIf, EndMacro,
			EndRept, Enum, Equ, Error, FillValue, Hex, If, IfDef, IfNDef, Incbin, Include, Macro, Org, Pad, Rept,
		};
		match tag {
			Org => {
				let value = self.eval_expr(operand, line)?;
				self.output.set_origin(value.value);
				Ok(())
			},
			Base => {
				let value = self.eval_expr(operand, line)?;
				self.output.set_base(value.value);
				Ok(())
			},
			Pad => {
				let value = self.eval_expr(operand, line)?;
				self.output.pad_to(value.value, line)
			},
			Align => {
				let value = self.eval_expr(operand, line)?;
				self.output.align_to(value.value, line)
			},
			FillValue => {
				let value = self.eval_expr(operand, line)?;
				self.output.set_fill_value((value.value & 0xFF) as u8);
				Ok(())
			},
			DefineByte => self.run_define_byte(operand, line),
			DefineWord => self.run_define_word(operand, line),
			DefineSpaceBytes => self.run_define_space_bytes(operand, line),
			DefineSpaceWords => self.run_define_space_words(operand, line),
			DefineLow => self.run_define_low(operand, line),
			DefineHigh => self.run_define_high(operand, line),
			Hex => self.run_hex(operand, line),
			Incbin => self.run_incbin(operand, line),
			Include => self.run_include(operand, line),
			Macro => {
				let parts = macro_engine::split_args(operand);
				let name = parts.first().cloned().ok_or(AssemblyError::NeedName { line })?;
				let params = parts[1 ..].to_vec();
				self.capture = Some(Capture::Macro { name, params, lines: Vec::new(), depth: 0 });
				Ok(())
			},
			EndMacro => Err(AssemblyError::ExtraEndM { line }),
			Rept => self.begin_rept_capture(operand, line),
			EndRept => Err(AssemblyError::ExtraEndR { line }),
			Enum => {
				let value = self.eval_expr(operand, line)?;
				self.output.enter_enum(value.value);
				self.enum_line = Some(line);
				Ok(())
			},
			EndEnum => {
				if self.enum_line.take().is_none() {
					return Err(AssemblyError::ExtraEndE { line });
				}
				self.output.leave_enum();
				Ok(())
			},
			Equ => Err(AssemblyError::NeedName { line }),
			Error => Err(AssemblyError::UserError { message: operand.trim().to_owned(), line }),
			If | IfDef | IfNDef | ElseIf | Else | EndIf => Ok(()),
		}
	}

	fn emit_instruction(&mut self, mnemonic: Mnemonic, operand_text: &str, line: usize) -> AsmResult<()> {
		let substituted = self.substitute_anonymous_refs(operand_text);
		let pc = self.output.pc();
		let ctx = EvalContext { symtab: &self.symtab, pc, pass: self.pass, last_chance: self.last_chance, line };
		let encoded = opcode_emit::encode_instruction(mnemonic, &substituted, &ctx, line)?;
		if encoded.dependent {
			self.needs_another_pass = true;
		}
		self.output.emit_bytes(&encoded.bytes, line)
	}

	fn eval_expr(&mut self, text: &str, line: usize) -> AsmResult<EvalResult> {
		let substituted = self.substitute_anonymous_refs(text);
		let pc = self.output.pc();
		let ctx = EvalContext { symtab: &self.symtab, pc, pass: self.pass, last_chance: self.last_chance, line };
		let mut cursor = Cursor::new(&substituted);
		let result = evaluate(&mut cursor, &ctx)?;
		if !cursor.is_end() {
			return Err(AssemblyError::ExtraCharsOnLine { text: cursor.rest().to_owned(), line });
		}
		if result.dependent {
			self.needs_another_pass = true;
		}
		Ok(result)
	}

	/// Replaces bare `+`/`++`/... and `-`/`--`/... anonymous-label
	/// references with either the resolved address or a never-defined
	/// identifier (which the evaluator then reports as a dependency or, on
	/// the last pass, an unknown label).
	fn substitute_anonymous_refs(&self, text: &str) -> String {
		let chars: Vec<char> = text.chars().collect();
		let mut out = String::with_capacity(text.len());
		let mut index = 0;
		let mut expect_atom = true;
		while index < chars.len() {
			let chr = chars[index];
			if expect_atom && (chr == '+' || chr == '-') {
				let mut end = index;
				while end < chars.len() && chars[end] == chr {
					end += 1;
				}
				let followed_by_atom = chars[end ..].iter().find(|c| !c.is_whitespace()).is_some_and(|&c| {
					c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '@' || c == '(' || c == '$' || c == '%' || c == '\'' || c == '"'
				});
				if !followed_by_atom {
					let orientation = if chr == '+' { Orientation::Forward } else { Orientation::Backward };
					let count = end - index;
					match self.resolve_anon(orientation, count) {
						Some(address) => out.push_str(&address.to_string()),
						None => out.push_str("__unresolved_anon__"),
					}
					index = end;
					expect_atom = false;
					continue;
				}
			}
			out.push(chr);
			expect_atom = !(chr.is_ascii_alphanumeric() || chr == '_' || chr == '.' || chr == '@' || chr == ')' || chr == '\'' || chr == '"');
			index += 1;
		}
		out
	}

	fn resolve_anon(&self, orientation: Orientation, count: usize) -> Option<i64> {
		if count == 0 {
			return None;
		}
		match orientation {
			Orientation::Backward => self
				.anon_this_pass
				.iter()
				.rev()
				.filter(|def| def.orientation == Orientation::Backward && def.statement_index <= self.statement_index)
				.nth(count - 1)
				.map(|def| def.address),
			Orientation::Forward => self
				.anon_prev_pass
				.iter()
				.filter(|def| def.orientation == Orientation::Forward && def.statement_index > self.statement_index)
				.nth(count - 1)
				.map(|def| def.address),
		}
	}
}

impl Default for Assembler {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn simple_program_assembles() {
		let mut assembler = Assembler::new();
		let bytes = assembler.assemble_str("t.asm", "ORG $8000\nLDA #$42\nRTS\n").unwrap();
		assert_eq!(bytes, vec![0xA9, 0x42, 0x60]);
	}

	#[test]
	fn forward_reference_resolves_after_an_extra_pass() {
		let mut assembler = Assembler::new();
		let source = "ORG $8000\nJMP TARGET\nNOP\nTARGET: RTS\n";
		let bytes = assembler.assemble_str("t.asm", source).unwrap();
		assert_eq!(bytes, vec![0x4C, 0x04, 0x80, 0xEA, 0x60]);
	}

	#[test]
	fn branch_to_self() {
		let mut assembler = Assembler::new();
		let bytes = assembler.assemble_str("t.asm", "ORG $8000\nLOOP: BNE LOOP\n").unwrap();
		assert_eq!(bytes, vec![0xD0, 0xFE]);
	}

	#[test]
	fn conditional_assembly_selects_one_branch() {
		let mut assembler = Assembler::new();
		let source = "ORG $8000\nIF 0\nLDA #1\nELSE\nLDA #2\nENDIF\n";
		let bytes = assembler.assemble_str("t.asm", source).unwrap();
		assert_eq!(bytes, vec![0xA9, 0x02]);
	}

	#[test]
	fn macro_expands_with_positional_substitution() {
		let mut assembler = Assembler::new();
		let source = "STORE MACRO p1,p2\nLDA #\\1\nSTA \\2\nENDM\nORG $8000\nSTORE $42,$00\n";
		let bytes = assembler.assemble_str("t.asm", source).unwrap();
		assert_eq!(bytes, vec![0xA9, 0x42, 0x85, 0x00]);
	}

	#[test]
	fn rept_replays_its_body() {
		let mut assembler = Assembler::new();
		let source = "ORG $8000\nREPT 3\nNOP\nENDR\n";
		let bytes = assembler.assemble_str("t.asm", source).unwrap();
		assert_eq!(bytes, vec![0xEA, 0xEA, 0xEA]);
	}

	#[test]
	fn data_directives_emit_expected_bytes() {
		let mut assembler = Assembler::new();
		let source = "ORG $8000\nDB 1,2,\"AB\"\nDW $1234\n";
		let bytes = assembler.assemble_str("t.asm", source).unwrap();
		assert_eq!(bytes, vec![1, 2, b'A', b'B', 0x34, 0x12]);
	}

	#[test]
	fn equ_and_equate_substitution() {
		let mut assembler = Assembler::new();
		let source = "SCREEN EQU $0400\nORG $8000\nLDA SCREEN\n";
		let bytes = assembler.assemble_str("t.asm", source).unwrap();
		assert_eq!(bytes, vec![0xAD, 0x00, 0x04]);
	}
}
