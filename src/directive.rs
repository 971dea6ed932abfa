//! Directive names and the tag enum used to dispatch them. The actual
//! directive *behavior* lives in [`crate::assembler`]; this module only
//! owns the name-to-tag mapping so the symbol table can pre-register
//! every spelling as a reserved word.

/// One directive identity. Several directives accept more than one
/// spelling (`DB`/`BYTE`/`DCB`/`DC.B` are all the same directive); `names`
/// lists every accepted spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum DirectiveTag {
	Org,
	Base,
	Pad,
	Align,
	FillValue,
	DefineByte,
	DefineWord,
	DefineSpaceBytes,
	DefineSpaceWords,
	DefineLow,
	DefineHigh,
	Hex,
	Incbin,
	Include,
	Macro,
	EndMacro,
	Rept,
	EndRept,
	Enum,
	EndEnum,
	Equ,
	Error,
	If,
	IfDef,
	IfNDef,
	ElseIf,
	Else,
	EndIf,
}

macro_rules! directive_table {
	($($variant:ident => [$($name:literal),+ $(,)?]),* $(,)?) => {
		impl DirectiveTag {
			/// Every accepted spelling of this directive, canonicalized to
			/// upper case (lookup is case-insensitive for reserved words).
			#[must_use]
			pub const fn names(self) -> &'static [&'static str] {
				match self {
					$(Self::$variant => &[$($name),+],)*
				}
			}

			/// All directive tags, for symbol-table pre-registration.
			#[must_use]
			pub const fn all() -> &'static [Self] {
				&[$(Self::$variant),*]
			}
		}
	};
}

directive_table! {
	Org => ["ORG"],
	Base => ["BASE"],
	Pad => ["PAD"],
	Align => ["ALIGN"],
	FillValue => ["FILLVALUE"],
	DefineByte => ["DB", "BYTE", "DCB", "DC.B"],
	DefineWord => ["DW", "WORD", "DCW", "DC.W"],
	DefineSpaceBytes => ["DSB"],
	DefineSpaceWords => ["DSW"],
	DefineLow => ["DL"],
	DefineHigh => ["DH"],
	Hex => ["HEX"],
	Incbin => ["INCBIN"],
	Include => ["INCLUDE", "INCSRC"],
	Macro => ["MACRO"],
	EndMacro => ["ENDM"],
	Rept => ["REPT"],
	EndRept => ["ENDR"],
	Enum => ["ENUM"],
	EndEnum => ["ENDE"],
	Equ => ["EQU"],
	Error => ["ERROR"],
	If => ["IF"],
	IfDef => ["IFDEF"],
	IfNDef => ["IFNDEF"],
	ElseIf => ["ELSEIF"],
	Else => ["ELSE"],
	EndIf => ["ENDIF"],
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn data_directives_have_all_aliases() {
		assert_eq!(DirectiveTag::DefineByte.names(), &["DB", "BYTE", "DCB", "DC.B"]);
	}

	#[test]
	fn every_directive_has_at_least_forty_recognized_spellings_total() {
		let total_names: usize = DirectiveTag::all().iter().map(|tag| tag.names().len()).sum();
		assert!(total_names >= 40);
	}
}
