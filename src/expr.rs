//! The recursive-descent expression evaluator: 17 binary operators across
//! 9 precedence levels, unary prefixes, the literal forms, and dependency
//! tracking for forward references.

use crate::error::{AssemblyError, AsmResult};
use crate::symbol::{LabelKind, SymbolTable, NOORIGIN};

/// An immutable line of text plus a position into it. Every parse helper
/// returns the new position by taking `&mut self`; nothing hidden mutates
/// the underlying text.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
	text: &'a str,
	pub pos: usize,
}

impl<'a> Cursor<'a> {
	#[must_use]
	pub const fn new(text: &'a str) -> Self {
		Self { text, pos: 0 }
	}

	#[must_use]
	pub fn rest(&self) -> &'a str {
		&self.text[self.pos.min(self.text.len()) ..]
	}

	#[must_use]
	pub fn is_end(&self) -> bool {
		self.skip_ws_peek().is_none()
	}

	fn skip_ws_peek(&self) -> Option<char> {
		self.rest().trim_start().chars().next()
	}

	pub fn skip_ws(&mut self) {
		let trimmed = self.rest().trim_start();
		self.pos = self.text.len() - trimmed.len();
	}

	#[must_use]
	pub fn peek(&mut self) -> Option<char> {
		self.skip_ws();
		self.rest().chars().next()
	}

	pub fn advance(&mut self) -> Option<char> {
		self.skip_ws();
		let chr = self.rest().chars().next()?;
		self.pos += chr.len_utf8();
		Some(chr)
	}

	/// Consumes the given literal prefix (after skipping whitespace),
	/// returning whether it matched. Case-sensitive; callers upper-case
	/// operators themselves since they're all ASCII punctuation.
	pub fn eat(&mut self, literal: &str) -> bool {
		self.skip_ws();
		if self.rest().starts_with(literal) {
			self.pos += literal.len();
			true
		} else {
			false
		}
	}

	#[must_use]
	pub fn starts_with(&self, literal: &str) -> bool {
		self.rest().trim_start().starts_with(literal)
	}
}

/// Context threaded through the evaluator: everything it needs to resolve
/// identifiers and record that the result depended on an unresolved one.
pub struct EvalContext<'a> {
	pub symtab: &'a SymbolTable,
	pub pc: i64,
	pub pass: u32,
	pub last_chance: bool,
	pub line: usize,
}

/// Result of evaluating an expression: the numeric value (best-effort if
/// dependent) and whether it depends on an unresolved symbol.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvalResult {
	pub value: i64,
	pub dependent: bool,
}

/// Evaluates a full expression starting at the cursor's current position,
/// leaving the cursor at the first non-consumed character.
pub fn evaluate(cursor: &mut Cursor, ctx: &EvalContext) -> AsmResult<EvalResult> {
	parse_binary(cursor, ctx, 0)
}

/// Operator precedence table, lowest first. Each entry is tried in order
/// at its level; `<>` and `!=` are kept as synonyms at the same level.
const LEVELS: &[&[&str]] = &[
	&["||"],
	&["&&"],
	&["|"],
	&["^"],
	&["&"],
	&["==", "!=", "<>"],
	&["<=", ">=", "<", ">"],
	&["<<", ">>"],
	&["+", "-"],
	&["*", "/", "%"],
];

fn parse_binary(cursor: &mut Cursor, ctx: &EvalContext, level: usize) -> AsmResult<EvalResult> {
	if level >= LEVELS.len() {
		return parse_unary(cursor, ctx);
	}
	let mut lhs = parse_binary(cursor, ctx, level + 1)?;
	loop {
		let Some(op) = LEVELS[level].iter().find(|op| cursor.starts_with(op)) else { break };
		// Longer operators must be tried before their prefixes at the same
		// level (e.g. `<=` before `<`); the table above is already ordered
		// that way.
		cursor.eat(op);
		let rhs = parse_binary(cursor, ctx, level + 1)?;
		lhs.dependent |= rhs.dependent;
		lhs.value = apply_binary(op, lhs.value, rhs.value, ctx.line)?;
	}
	Ok(lhs)
}

fn apply_binary(op: &str, lhs: i64, rhs: i64, line: usize) -> AsmResult<i64> {
	Ok(match op {
		"||" => i64::from(lhs != 0 || rhs != 0),
		"&&" => i64::from(lhs != 0 && rhs != 0),
		"|" => lhs | rhs,
		"^" => lhs ^ rhs,
		"&" => lhs & rhs,
		"==" => i64::from(lhs == rhs),
		"!=" | "<>" => i64::from(lhs != rhs),
		"<" => i64::from(lhs < rhs),
		"<=" => i64::from(lhs <= rhs),
		">" => i64::from(lhs > rhs),
		">=" => i64::from(lhs >= rhs),
		"<<" => lhs << (rhs & 63),
		">>" => lhs >> (rhs & 63),
		"+" => lhs.wrapping_add(rhs),
		"-" => lhs.wrapping_sub(rhs),
		"*" => lhs.wrapping_mul(rhs),
		"/" => {
			if rhs == 0 {
				return Err(AssemblyError::DivideByZero { line });
			}
			lhs.wrapping_div(rhs)
		},
		"%" => {
			if rhs == 0 {
				return Err(AssemblyError::DivideByZero { line });
			}
			lhs - (lhs / rhs) * rhs
		},
		_ => unreachable!("operator table and apply_binary are out of sync"),
	})
}

fn parse_unary(cursor: &mut Cursor, ctx: &EvalContext) -> AsmResult<EvalResult> {
	cursor.skip_ws();
	if cursor.eat("#") {
		// Immediate marker: transparent to the evaluator.
		return parse_unary(cursor, ctx);
	}
	if cursor.eat("~") {
		let mut inner = parse_unary(cursor, ctx)?;
		inner.value = !inner.value;
		return Ok(inner);
	}
	if cursor.eat("!") {
		let mut inner = parse_unary(cursor, ctx)?;
		inner.value = i64::from(inner.value == 0);
		return Ok(inner);
	}
	if cursor.eat("<") {
		let mut inner = parse_unary(cursor, ctx)?;
		inner.value &= 0xFF;
		inner.dependent = false; // the low byte may resolve independently
		return Ok(inner);
	}
	if cursor.eat(">") {
		let mut inner = parse_unary(cursor, ctx)?;
		inner.value = (inner.value >> 8) & 0xFF;
		inner.dependent = false;
		return Ok(inner);
	}
	if cursor.eat("-") {
		let mut inner = parse_unary(cursor, ctx)?;
		inner.value = inner.value.wrapping_neg();
		return Ok(inner);
	}
	if cursor.eat("+") {
		return parse_unary(cursor, ctx);
	}
	parse_atom(cursor, ctx)
}

fn parse_atom(cursor: &mut Cursor, ctx: &EvalContext) -> AsmResult<EvalResult> {
	cursor.skip_ws();
	if cursor.eat("(") {
		let inner = parse_binary(cursor, ctx, 0)?;
		if !cursor.eat(")") {
			return Err(AssemblyError::IncompleteExpression { line: ctx.line });
		}
		return Ok(inner);
	}
	if cursor.eat("$") {
		return parse_dollar(cursor, ctx);
	}
	if cursor.starts_with("%") && is_binary_literal_start(cursor) {
		cursor.eat("%");
		return parse_radix_digits(cursor, 2, ctx.line);
	}
	if cursor.starts_with("'") {
		return parse_char_literal(cursor, ctx.line);
	}
	if let Some(chr) = cursor.peek()
		&& (chr.is_ascii_digit())
	{
		return parse_decimal_or_suffixed(cursor, ctx.line);
	}
	if let Some(chr) = cursor.peek()
		&& is_identifier_start(chr)
	{
		return parse_identifier_operand(cursor, ctx);
	}
	Err(AssemblyError::IncompleteExpression { line: ctx.line })
}

/// `$` is both "current PC" (when not immediately followed by a hex digit)
/// and the hex-literal prefix; try the PC interpretation only when no hex
/// digits follow, matching how the preprocessor already let `$` through
/// verbatim for literals.
fn parse_dollar(cursor: &mut Cursor, ctx: &EvalContext) -> AsmResult<EvalResult> {
	let rest = cursor.rest();
	let hex_len = rest.chars().take_while(|c| c.is_ascii_hexdigit()).count();
	if hex_len == 0 {
		if ctx.pc == NOORIGIN {
			return Err(AssemblyError::CantDetermineAddress { name: "$".to_owned(), line: ctx.line });
		}
		return Ok(EvalResult { value: ctx.pc, dependent: false });
	}
	parse_radix_digits(cursor, 16, ctx.line)
}

fn is_binary_literal_start(cursor: &Cursor) -> bool {
	let rest = cursor.rest().trim_start();
	rest.strip_prefix('%').is_some_and(|after| after.starts_with(['0', '1']))
}

fn parse_radix_digits(cursor: &mut Cursor, radix: u32, line: usize) -> AsmResult<EvalResult> {
	let rest = cursor.rest();
	let digit_count = rest.chars().take_while(|c| c.is_digit(radix)).count();
	if digit_count == 0 {
		return Err(AssemblyError::NotANumber { text: rest.to_owned(), line });
	}
	let digits = &rest[.. digit_count];
	let value = i64::from_str_radix(digits, radix).map_err(|_| AssemblyError::NotANumber { text: digits.to_owned(), line })?;
	cursor.pos += digit_count;
	Ok(EvalResult { value, dependent: false })
}

fn parse_decimal_or_suffixed(cursor: &mut Cursor, line: usize) -> AsmResult<EvalResult> {
	let rest = cursor.rest();
	let digit_count = rest.chars().take_while(char::is_ascii_alphanumeric).count();
	let token = &rest[.. digit_count];
	cursor.pos += digit_count;

	if let Some(hex) = token.strip_suffix(['h', 'H']) {
		let value = i64::from_str_radix(hex, 16).map_err(|_| AssemblyError::NotANumber { text: token.to_owned(), line })?;
		return Ok(EvalResult { value, dependent: false });
	}
	if let Some(bin) = token.strip_suffix(['b', 'B'])
		&& bin.chars().all(|c| c == '0' || c == '1')
	{
		let value = i64::from_str_radix(bin, 2).map_err(|_| AssemblyError::NotANumber { text: token.to_owned(), line })?;
		return Ok(EvalResult { value, dependent: false });
	}
	let value: i64 = token.parse().map_err(|_| AssemblyError::NotANumber { text: token.to_owned(), line })?;
	Ok(EvalResult { value, dependent: false })
}

fn parse_char_literal(cursor: &mut Cursor, line: usize) -> AsmResult<EvalResult> {
	cursor.eat("'");
	let chr = match cursor.advance() {
		Some('\\') => cursor.advance().ok_or(AssemblyError::IncompleteExpression { line })?,
		Some(other) => other,
		None => return Err(AssemblyError::IncompleteExpression { line }),
	};
	if !cursor.eat("'") {
		return Err(AssemblyError::IncompleteExpression { line });
	}
	Ok(EvalResult { value: i64::from(chr as u32), dependent: false })
}

fn is_identifier_start(chr: char) -> bool {
	chr == '_' || chr == '.' || chr == '@' || chr.is_alphabetic()
}

fn is_identifier_continue(chr: char) -> bool {
	is_identifier_start(chr) || chr.is_ascii_digit()
}

fn parse_identifier_operand(cursor: &mut Cursor, ctx: &EvalContext) -> AsmResult<EvalResult> {
	let rest = cursor.rest();
	let len = rest.chars().take_while(|c| is_identifier_continue(*c)).count();
	let name_raw = &rest[.. len];
	cursor.pos += len;
	let name = name_raw.strip_prefix('.').unwrap_or(name_raw);

	match ctx.symtab.lookup(name) {
		// A label/value that has an entry at all has been defined in some
		// pass (this one, up to this point, or an earlier one); its stored
		// value is usable even before this pass re-touches it. Only a name
		// with no entry anywhere is genuinely unresolved.
		Some(label) => match &label.kind {
			LabelKind::Label(value) | LabelKind::Value(value) => Ok(EvalResult { value: *value, dependent: false }),
			_ if ctx.last_chance => Err(AssemblyError::UnknownLabel { name: name.to_owned(), line: ctx.line }),
			_ => Ok(EvalResult { value: 0, dependent: true }),
		},
		None if ctx.last_chance => Err(AssemblyError::UnknownLabel { name: name.to_owned(), line: ctx.line }),
		None => Ok(EvalResult { value: 0, dependent: true }),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::symbol::SymbolTable;

	fn ctx(symtab: &SymbolTable) -> EvalContext<'_> {
		EvalContext { symtab, pc: 0x8000, pass: 1, last_chance: false, line: 1 }
	}

	fn eval(symtab: &SymbolTable, text: &str) -> i64 {
		let mut cursor = Cursor::new(text);
		evaluate(&mut cursor, &ctx(symtab)).unwrap().value
	}

	#[test]
	fn precedence_multiplication_before_addition() {
		let symtab = SymbolTable::new();
		assert_eq!(eval(&symtab, "1+2*3"), 7);
	}

	#[test]
	fn parentheses_override_precedence() {
		let symtab = SymbolTable::new();
		assert_eq!(eval(&symtab, "(1+2)*3"), 9);
	}

	#[test]
	fn shift_binds_looser_than_addition() {
		let symtab = SymbolTable::new();
		assert_eq!(eval(&symtab, "1<<2+1"), 1 << (2 + 1));
	}

	#[test]
	fn division_and_modulo_match_truncating_semantics() {
		let symtab = SymbolTable::new();
		assert_eq!(eval(&symtab, "7/2"), 7 / 2);
		assert_eq!(eval(&symtab, "7%2"), 7 - (7 / 2) * 2);
		assert_eq!(eval(&symtab, "-7/2"), -7 / 2);
	}

	#[test]
	fn divide_by_zero_is_an_error() {
		let symtab = SymbolTable::new();
		let mut cursor = Cursor::new("1/0");
		assert!(evaluate(&mut cursor, &ctx(&symtab)).is_err());
	}

	#[test]
	fn not_equal_accepts_both_spellings() {
		let symtab = SymbolTable::new();
		assert_eq!(eval(&symtab, "1!=2"), 1);
		assert_eq!(eval(&symtab, "1<>2"), 1);
	}

	#[test]
	fn hex_and_binary_and_char_literals() {
		let symtab = SymbolTable::new();
		assert_eq!(eval(&symtab, "$2A"), 0x2A);
		assert_eq!(eval(&symtab, "%101"), 0b101);
		assert_eq!(eval(&symtab, "2Ah"), 0x2A);
		assert_eq!(eval(&symtab, "'A'"), 65);
	}

	#[test]
	fn low_and_high_byte_operators() {
		let symtab = SymbolTable::new();
		assert_eq!(eval(&symtab, "<$1234"), 0x34);
		assert_eq!(eval(&symtab, ">$1234"), 0x12);
	}

	#[test]
	fn unresolved_label_sets_dependent_flag() {
		let symtab = SymbolTable::new();
		let mut cursor = Cursor::new("undefined_thing");
		let result = evaluate(&mut cursor, &ctx(&symtab)).unwrap();
		assert!(result.dependent);
	}

	#[test]
	fn last_chance_turns_unresolved_into_an_error() {
		let symtab = SymbolTable::new();
		let mut cursor = Cursor::new("undefined_thing");
		let mut context = ctx(&symtab);
		context.last_chance = true;
		assert!(evaluate(&mut cursor, &context).is_err());
	}
}
