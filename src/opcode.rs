//! Opcode tables and addressing-mode selection for the 56 documented 6502
//! mnemonics. Each mnemonic carries a table of `(opcode byte, addressing
//! mode)` pairs; the first entry that is both syntactically valid for the
//! parsed operand and whose value fits the mode's size wins. Tables list
//! shorter forms before longer ones so that a resolvable small value picks
//! the short form.

use std::fmt;

use num_derive::{FromPrimitive, ToPrimitive};

use crate::symbol::OpcodeEntry;

/// The 13 addressing modes of the 6502.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressingMode {
	/// No operand (implied).
	Implied,
	/// Operand is the accumulator (`ASL A` etc.), written with no operand or
	/// a literal `A`.
	Accumulator,
	/// `#nn`
	Immediate,
	/// `nn` with value 0..=255.
	ZeroPage,
	/// `nn,X`, 0..=255.
	ZeroPageX,
	/// `nn,Y`, 0..=255.
	ZeroPageY,
	/// `nnnn`
	Absolute,
	/// `nnnn,X`
	AbsoluteX,
	/// `nnnn,Y`
	AbsoluteY,
	/// `(nnnn)`, only used by `JMP`.
	Indirect,
	/// `(nn,X)`
	IndirectX,
	/// `(nn),Y`
	IndirectY,
	/// Signed 8-bit branch displacement.
	Relative,
}

impl AddressingMode {
	/// Operand size in bytes, not counting the opcode byte itself.
	#[must_use]
	pub const fn operand_size(self) -> usize {
		match self {
			Self::Implied | Self::Accumulator => 0,
			Self::Immediate
			| Self::ZeroPage
			| Self::ZeroPageX
			| Self::ZeroPageY
			| Self::IndirectX
			| Self::IndirectY
			| Self::Relative => 1,
			Self::Absolute | Self::AbsoluteX | Self::AbsoluteY | Self::Indirect => 2,
		}
	}
}

/// Every documented 6502 mnemonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromPrimitive, ToPrimitive)]
#[allow(missing_docs)]
pub enum Mnemonic {
	Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc, Bvs, Clc, Cld, Cli, Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey,
	Eor, Inc, Inx, Iny, Jmp, Jsr, Lda, Ldx, Ldy, Lsr, Nop, Ora, Pha, Php, Pla, Plp, Rol, Ror, Rti, Rts, Sbc, Sec, Sed,
	Sei, Sta, Stx, Sty, Tax, Tay, Tsx, Txa, Txs, Tya,
}

impl fmt::Display for Mnemonic {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

macro_rules! mnemonic_table {
	($($variant:ident => $name:literal [$(($mode:ident, $byte:literal)),* $(,)?]),* $(,)?) => {
		impl Mnemonic {
			/// Canonical upper-case spelling.
			#[must_use]
			pub const fn name(self) -> &'static str {
				match self {
					$(Self::$variant => $name,)*
				}
			}

			/// All mnemonics, in declaration order; used to seed the symbol
			/// table with reserved words.
			#[must_use]
			pub const fn all() -> &'static [Self] {
				&[$(Self::$variant),*]
			}

			/// This mnemonic's `(opcode byte, addressing mode)` table, shortest
			/// encodings first.
			#[must_use]
			pub const fn opcode_table(self) -> &'static [OpcodeEntry] {
				match self {
					$(Self::$variant => &[$((AddressingMode::$mode, $byte)),*],)*
				}
			}
		}
	};
}

mnemonic_table! {
	Adc => "ADC" [(Immediate, 0x69), (ZeroPage, 0x65), (ZeroPageX, 0x75), (Absolute, 0x6D), (AbsoluteX, 0x7D), (AbsoluteY, 0x79), (IndirectX, 0x61), (IndirectY, 0x71)],
	And => "AND" [(Immediate, 0x29), (ZeroPage, 0x25), (ZeroPageX, 0x35), (Absolute, 0x2D), (AbsoluteX, 0x3D), (AbsoluteY, 0x39), (IndirectX, 0x21), (IndirectY, 0x31)],
	Asl => "ASL" [(Accumulator, 0x0A), (ZeroPage, 0x06), (ZeroPageX, 0x16), (Absolute, 0x0E), (AbsoluteX, 0x1E)],
	Bcc => "BCC" [(Relative, 0x90)],
	Bcs => "BCS" [(Relative, 0xB0)],
	Beq => "BEQ" [(Relative, 0xF0)],
	Bit => "BIT" [(ZeroPage, 0x24), (Absolute, 0x2C)],
	Bmi => "BMI" [(Relative, 0x30)],
	Bne => "BNE" [(Relative, 0xD0)],
	Bpl => "BPL" [(Relative, 0x10)],
	Brk => "BRK" [(Implied, 0x00)],
	Bvc => "BVC" [(Relative, 0x50)],
	Bvs => "BVS" [(Relative, 0x70)],
	Clc => "CLC" [(Implied, 0x18)],
	Cld => "CLD" [(Implied, 0xD8)],
	Cli => "CLI" [(Implied, 0x58)],
	Clv => "CLV" [(Implied, 0xB8)],
	Cmp => "CMP" [(Immediate, 0xC9), (ZeroPage, 0xC5), (ZeroPageX, 0xD5), (Absolute, 0xCD), (AbsoluteX, 0xDD), (AbsoluteY, 0xD9), (IndirectX, 0xC1), (IndirectY, 0xD1)],
	Cpx => "CPX" [(Immediate, 0xE0), (ZeroPage, 0xE4), (Absolute, 0xEC)],
	Cpy => "CPY" [(Immediate, 0xC0), (ZeroPage, 0xC4), (Absolute, 0xCC)],
	Dec => "DEC" [(ZeroPage, 0xC6), (ZeroPageX, 0xD6), (Absolute, 0xCE), (AbsoluteX, 0xDE)],
	Dex => "DEX" [(Implied, 0xCA)],
	Dey => "DEY" [(Implied, 0x88)],
	Eor => "EOR" [(Immediate, 0x49), (ZeroPage, 0x45), (ZeroPageX, 0x55), (Absolute, 0x4D), (AbsoluteX, 0x5D), (AbsoluteY, 0x59), (IndirectX, 0x41), (IndirectY, 0x51)],
	Inc => "INC" [(ZeroPage, 0xE6), (ZeroPageX, 0xF6), (Absolute, 0xEE), (AbsoluteX, 0xFE)],
	Inx => "INX" [(Implied, 0xE8)],
	Iny => "INY" [(Implied, 0xC8)],
	Jmp => "JMP" [(Absolute, 0x4C), (Indirect, 0x6C)],
	Jsr => "JSR" [(Absolute, 0x20)],
	Lda => "LDA" [(Immediate, 0xA9), (ZeroPage, 0xA5), (ZeroPageX, 0xB5), (Absolute, 0xAD), (AbsoluteX, 0xBD), (AbsoluteY, 0xB9), (IndirectX, 0xA1), (IndirectY, 0xB1)],
	Ldx => "LDX" [(Immediate, 0xA2), (ZeroPage, 0xA6), (ZeroPageY, 0xB6), (Absolute, 0xAE), (AbsoluteY, 0xBE)],
	Ldy => "LDY" [(Immediate, 0xA0), (ZeroPage, 0xA4), (ZeroPageX, 0xB4), (Absolute, 0xAC), (AbsoluteX, 0xBC)],
	Lsr => "LSR" [(Accumulator, 0x4A), (ZeroPage, 0x46), (ZeroPageX, 0x56), (Absolute, 0x4E), (AbsoluteX, 0x5E)],
	Nop => "NOP" [(Implied, 0xEA)],
	Ora => "ORA" [(Immediate, 0x09), (ZeroPage, 0x05), (ZeroPageX, 0x15), (Absolute, 0x0D), (AbsoluteX, 0x1D), (AbsoluteY, 0x19), (IndirectX, 0x01), (IndirectY, 0x11)],
	Pha => "PHA" [(Implied, 0x48)],
	Php => "PHP" [(Implied, 0x08)],
	Pla => "PLA" [(Implied, 0x68)],
	Plp => "PLP" [(Implied, 0x28)],
	Rol => "ROL" [(Accumulator, 0x2A), (ZeroPage, 0x26), (ZeroPageX, 0x36), (Absolute, 0x2E), (AbsoluteX, 0x3E)],
	Ror => "ROR" [(Accumulator, 0x6A), (ZeroPage, 0x66), (ZeroPageX, 0x76), (Absolute, 0x6E), (AbsoluteX, 0x7E)],
	Rti => "RTI" [(Implied, 0x40)],
	Rts => "RTS" [(Implied, 0x60)],
	Sbc => "SBC" [(Immediate, 0xE9), (ZeroPage, 0xE5), (ZeroPageX, 0xF5), (Absolute, 0xED), (AbsoluteX, 0xFD), (AbsoluteY, 0xF9), (IndirectX, 0xE1), (IndirectY, 0xF1)],
	Sec => "SEC" [(Implied, 0x38)],
	Sed => "SED" [(Implied, 0xF8)],
	Sei => "SEI" [(Implied, 0x78)],
	Sta => "STA" [(ZeroPage, 0x85), (ZeroPageX, 0x95), (Absolute, 0x8D), (AbsoluteX, 0x9D), (AbsoluteY, 0x99), (IndirectX, 0x81), (IndirectY, 0x91)],
	Stx => "STX" [(ZeroPage, 0x86), (ZeroPageY, 0x96), (Absolute, 0x8E)],
	Sty => "STY" [(ZeroPage, 0x84), (ZeroPageX, 0x94), (Absolute, 0x8C)],
	Tax => "TAX" [(Implied, 0xAA)],
	Tay => "TAY" [(Implied, 0xA8)],
	Tsx => "TSX" [(Implied, 0xBA)],
	Txa => "TXA" [(Implied, 0x8A)],
	Txs => "TXS" [(Implied, 0x9A)],
	Tya => "TYA" [(Implied, 0x98)],
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn table_is_complete() {
		assert_eq!(Mnemonic::all().len(), 56);
	}

	#[test]
	fn lda_has_eight_modes() {
		assert_eq!(Mnemonic::Lda.opcode_table().len(), 8);
	}

	#[test]
	fn implied_and_accumulator_modes_have_no_operand() {
		assert_eq!(AddressingMode::Implied.operand_size(), 0);
		assert_eq!(AddressingMode::Accumulator.operand_size(), 0);
	}
}
