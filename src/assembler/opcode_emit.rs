//! Operand classification and addressing-mode selection: turns the text
//! after a mnemonic into a byte sequence, picking the shortest addressing
//! mode the mnemonic's table and the operand's syntax allow.

use crate::error::{AssemblyError, AsmResult};
use crate::expr::{evaluate, Cursor, EvalContext};
use crate::opcode::{AddressingMode, Mnemonic};

/// The syntactic shape of an operand, independent of which mnemonic it is
/// attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OperandForm {
	Implied,
	Immediate,
	Indirect,
	IndirectX,
	IndirectY,
	IndexedX,
	IndexedY,
	Plain,
}

fn find_matching_paren(text: &str) -> Option<usize> {
	let bytes = text.as_bytes();
	let mut depth = 0i32;
	for (index, &byte) in bytes.iter().enumerate() {
		match byte {
			b'(' => depth += 1,
			b')' => {
				depth -= 1;
				if depth == 0 {
					return Some(index);
				}
			},
			_ => {},
		}
	}
	None
}

/// If `text` ends with `,<letter>` (case-insensitive, ignoring whitespace),
/// returns the text before the comma.
fn strip_index_suffix(text: &str, letter: char) -> Option<&str> {
	let trimmed = text.trim_end();
	let comma = trimmed.rfind(',')?;
	let suffix = trimmed[comma + 1 ..].trim();
	if suffix.len() == 1 && suffix.eq_ignore_ascii_case(&letter.to_string()) {
		Some(trimmed[.. comma].trim())
	} else {
		None
	}
}

fn classify_operand(operand: &str) -> (OperandForm, String) {
	let op = operand.trim();
	if op.is_empty() {
		return (OperandForm::Implied, String::new());
	}
	if let Some(rest) = op.strip_prefix('#') {
		return (OperandForm::Immediate, rest.trim().to_owned());
	}
	if op.starts_with('(')
		&& let Some(close) = find_matching_paren(op)
	{
		let inner = &op[1 .. close];
		let after = op[close + 1 ..].trim();
		if after.is_empty() {
			if let Some(expr) = strip_index_suffix(inner, 'X') {
				return (OperandForm::IndirectX, expr.trim().to_owned());
			}
			return (OperandForm::Indirect, inner.trim().to_owned());
		}
		if strip_index_suffix(after, 'Y').is_some_and(str::is_empty) {
			return (OperandForm::IndirectY, inner.trim().to_owned());
		}
	}
	if let Some(expr) = strip_index_suffix(op, 'X') {
		return (OperandForm::IndexedX, expr.trim().to_owned());
	}
	if let Some(expr) = strip_index_suffix(op, 'Y') {
		return (OperandForm::IndexedY, expr.trim().to_owned());
	}
	(OperandForm::Plain, op.to_owned())
}

fn candidate_modes(form: OperandForm) -> &'static [AddressingMode] {
	match form {
		OperandForm::Implied => &[AddressingMode::Implied],
		OperandForm::Immediate => &[AddressingMode::Immediate],
		OperandForm::Indirect => &[AddressingMode::Indirect],
		OperandForm::IndirectX => &[AddressingMode::IndirectX],
		OperandForm::IndirectY => &[AddressingMode::IndirectY],
		OperandForm::IndexedX => &[AddressingMode::ZeroPageX, AddressingMode::AbsoluteX],
		OperandForm::IndexedY => &[AddressingMode::ZeroPageY, AddressingMode::AbsoluteY],
		OperandForm::Plain => &[AddressingMode::Relative, AddressingMode::ZeroPage, AddressingMode::Absolute],
	}
}

fn is_zero_page_family(mode: AddressingMode) -> bool {
	matches!(mode, AddressingMode::ZeroPage | AddressingMode::ZeroPageX | AddressingMode::ZeroPageY)
}

/// Result of encoding one instruction.
pub struct Encoded {
	pub bytes: Vec<u8>,
	pub dependent: bool,
}

/// Encodes one instruction, evaluating its operand expression (if any)
/// against `ctx`. `ctx.pc` must be the address the opcode byte itself will
/// land at.
pub fn encode_instruction(mnemonic: Mnemonic, operand_text: &str, ctx: &EvalContext, line: usize) -> AsmResult<Encoded> {
	let table = mnemonic.opcode_table();
	let trimmed = operand_text.trim();

	// A mnemonic with an Accumulator mode (the shift/rotate family) accepts
	// either no operand or a bare `A`; one without it never does, so a bare
	// `A` there is an ordinary identifier (e.g. a label named `A`).
	let accumulator_entry = table.iter().find(|(mode, _)| *mode == AddressingMode::Accumulator);
	if let Some(&(_, byte)) = accumulator_entry
		&& (trimmed.is_empty() || trimmed.eq_ignore_ascii_case("A"))
	{
		return Ok(Encoded { bytes: vec![byte], dependent: false });
	}

	let (form, expr_text) = classify_operand(operand_text);

	if matches!(form, OperandForm::Implied) && expr_text.is_empty() {
		if let Some(&(_, byte)) = table.iter().find(|(mode, _)| *mode == AddressingMode::Implied) {
			return Ok(Encoded { bytes: vec![byte], dependent: false });
		}
		return Err(AssemblyError::IllegalInstruction { mnemonic: mnemonic.name().to_owned(), operand: operand_text.to_owned(), line });
	}

	let evaluated = if expr_text.is_empty() {
		None
	} else {
		let mut cursor = Cursor::new(&expr_text);
		let result = evaluate(&mut cursor, ctx)?;
		if !cursor.is_end() {
			return Err(AssemblyError::ExtraCharsOnLine { text: cursor.rest().to_owned(), line });
		}
		Some(result)
	};

	let candidates = candidate_modes(form);
	let relative_wanted = candidates.contains(&AddressingMode::Relative) && table.iter().any(|(mode, _)| *mode == AddressingMode::Relative);

	if relative_wanted {
		let Some(&(_, byte)) = table.iter().find(|(mode, _)| *mode == AddressingMode::Relative) else {
			return Err(AssemblyError::IllegalInstruction { mnemonic: mnemonic.name().to_owned(), operand: operand_text.to_owned(), line });
		};
		let result = evaluated.ok_or(AssemblyError::MissingOperand { line })?;
		let next_pc = ctx.pc + 2;
		let offset = result.value - next_pc;
		if result.dependent {
			// Size never changes for a branch; emit a placeholder and let a
			// later pass supply the real offset.
			return Ok(Encoded { bytes: vec![byte, 0], dependent: true });
		}
		if !(-128 ..= 127).contains(&offset) {
			return Err(AssemblyError::OutOfRange { value: offset, line, help: Some("branch target is out of range (-128..=127)".to_owned()) });
		}
		return Ok(Encoded { bytes: vec![byte, offset as i8 as u8], dependent: false });
	}

	let result = evaluated.ok_or(AssemblyError::MissingOperand { line })?;
	let fits_zero_page = !result.dependent && (0 ..= 0xFF).contains(&result.value);

	let mut chosen = None;
	for mode in candidates {
		if is_zero_page_family(*mode) && !fits_zero_page {
			continue;
		}
		if let Some(&(found_mode, byte)) = table.iter().find(|(m, _)| m == mode) {
			chosen = Some((found_mode, byte));
			break;
		}
	}
	// A zero-page-sized value whose mnemonic has no zero-page form at all
	// (e.g. JMP) still needs the absolute entry even though `fits_zero_page`
	// was true; fall back to the first matching candidate regardless of fit.
	if chosen.is_none() {
		chosen = candidates.iter().find_map(|mode| table.iter().find(|(m, _)| m == mode).map(|&(m, b)| (m, b)));
	}

	let Some((mode, byte)) = chosen else {
		return Err(AssemblyError::IllegalInstruction { mnemonic: mnemonic.name().to_owned(), operand: operand_text.to_owned(), line });
	};

	let mut bytes = vec![byte];
	match mode.operand_size() {
		0 => {},
		1 => bytes.push((result.value & 0xFF) as u8),
		2 => {
			bytes.push((result.value & 0xFF) as u8);
			bytes.push(((result.value >> 8) & 0xFF) as u8);
		},
		_ => unreachable!("6502 operands are at most 2 bytes"),
	}
	Ok(Encoded { bytes, dependent: result.dependent })
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::symbol::SymbolTable;

	fn ctx(symtab: &SymbolTable, pc: i64) -> EvalContext<'_> {
		EvalContext { symtab, pc, pass: 1, last_chance: true, line: 1 }
	}

	#[test]
	fn immediate_lda() {
		let symtab = SymbolTable::new();
		let encoded = encode_instruction(Mnemonic::Lda, "#$42", &ctx(&symtab, 0x8000), 1).unwrap();
		assert_eq!(encoded.bytes, vec![0xA9, 0x42]);
	}

	#[test]
	fn zero_page_vs_absolute_by_value_size() {
		let symtab = SymbolTable::new();
		let zp = encode_instruction(Mnemonic::Lda, "$42", &ctx(&symtab, 0x8000), 1).unwrap();
		assert_eq!(zp.bytes, vec![0xA5, 0x42]);
		let abs = encode_instruction(Mnemonic::Lda, "$1234", &ctx(&symtab, 0x8000), 1).unwrap();
		assert_eq!(abs.bytes, vec![0xAD, 0x34, 0x12]);
	}

	#[test]
	fn implied_instruction_has_no_operand_bytes() {
		let symtab = SymbolTable::new();
		let encoded = encode_instruction(Mnemonic::Rts, "", &ctx(&symtab, 0x8000), 1).unwrap();
		assert_eq!(encoded.bytes, vec![0x60]);
	}

	#[test]
	fn accumulator_mode_accepts_bare_a_or_nothing() {
		let symtab = SymbolTable::new();
		let bare = encode_instruction(Mnemonic::Asl, "", &ctx(&symtab, 0x8000), 1).unwrap();
		let with_a = encode_instruction(Mnemonic::Asl, "A", &ctx(&symtab, 0x8000), 1).unwrap();
		assert_eq!(bare.bytes, vec![0x0A]);
		assert_eq!(with_a.bytes, vec![0x0A]);
	}

	#[test]
	fn indexed_and_indirect_forms() {
		let symtab = SymbolTable::new();
		let zpx = encode_instruction(Mnemonic::Lda, "$10,X", &ctx(&symtab, 0x8000), 1).unwrap();
		assert_eq!(zpx.bytes, vec![0xB5, 0x10]);
		let absy = encode_instruction(Mnemonic::Lda, "$1000,Y", &ctx(&symtab, 0x8000), 1).unwrap();
		assert_eq!(absy.bytes, vec![0xB9, 0x00, 0x10]);
		let indx = encode_instruction(Mnemonic::Lda, "($10,X)", &ctx(&symtab, 0x8000), 1).unwrap();
		assert_eq!(indx.bytes, vec![0xA1, 0x10]);
		let indy = encode_instruction(Mnemonic::Lda, "($10),Y", &ctx(&symtab, 0x8000), 1).unwrap();
		assert_eq!(indy.bytes, vec![0xB1, 0x10]);
		let ind = encode_instruction(Mnemonic::Jmp, "($1234)", &ctx(&symtab, 0x8000), 1).unwrap();
		assert_eq!(ind.bytes, vec![0x6C, 0x34, 0x12]);
	}

	#[test]
	fn relative_branch_in_range() {
		let symtab = SymbolTable::new();
		let encoded = encode_instruction(Mnemonic::Bne, "$8000", &ctx(&symtab, 0x8000), 1).unwrap();
		assert_eq!(encoded.bytes, vec![0xD0, 0xFE]);
	}

	#[test]
	fn relative_branch_out_of_range_is_an_error() {
		let symtab = SymbolTable::new();
		let result = encode_instruction(Mnemonic::Bne, "$8100", &ctx(&symtab, 0x8000), 1);
		assert!(result.is_err());
	}
}
