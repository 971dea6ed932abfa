//! Diagnostics: the error taxonomy from the design (see the crate's
//! project notes) and the `miette::SourceCode` wrapper that lets every
//! error render a snippet of the offending source line.

use std::sync::Arc;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// A source file, held once and shared (via `Arc`) by every diagnostic
/// that points into it.
#[derive(Debug, Clone)]
pub struct AssemblyCode {
	/// Name as given on the command line or by an `INCLUDE` directive.
	pub name: String,
	/// Full text of the file, newline-delimited.
	pub text: Arc<str>,
}

impl AssemblyCode {
	/// Reads a whole file into memory. This is the only place the engine
	/// touches the filesystem directly for *source* text; binary includes
	/// are read separately by `INCBIN`.
	pub fn from_file(name: &str) -> Result<Arc<Self>, AssemblyError> {
		let text = std::fs::read_to_string(name)
			.map_err(|os_error| AssemblyError::CantOpenFile { file_name: name.to_owned(), os_error: os_error.to_string() })?;
		Ok(Arc::new(Self { name: name.to_owned(), text: Arc::from(text.as_str()) }))
	}

	/// Wraps literal text as if it were a file, for tests and embedding.
	pub fn from_text(name: &str, text: &str) -> Arc<Self> {
		Arc::new(Self { name: name.to_owned(), text: Arc::from(text) })
	}

	#[must_use]
	pub fn named_source(&self) -> NamedSource<Arc<str>> {
		NamedSource::new(self.name.clone(), self.text.clone())
	}
}

/// Every way assembly can fail, matching the taxonomy of error kinds the
/// engine is specified to raise. Each variant carries enough information
/// for the plain `<filename>(<lineno>): <message>` reporter as well as for
/// a `miette` graphical report.
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum AssemblyError {
	#[error("value {value:#x} is out of range for this context")]
	#[diagnostic(code(asm8::out_of_range))]
	OutOfRange { value: i64, line: usize, help: Option<String> },

	#[error("'{text}' is not a number")]
	#[diagnostic(code(asm8::not_a_number))]
	NotANumber { text: String, line: usize },

	#[error("unknown label '{name}'")]
	#[diagnostic(code(asm8::unknown_label))]
	UnknownLabel { name: String, line: usize },

	#[error("illegal instruction '{mnemonic} {operand}'")]
	#[diagnostic(code(asm8::illegal_instruction))]
	IllegalInstruction { mnemonic: String, operand: String, line: usize },

	#[error("incomplete expression")]
	#[diagnostic(code(asm8::incomplete_expression))]
	IncompleteExpression { line: usize },

	#[error("label '{name}' is already defined")]
	#[diagnostic(code(asm8::label_already_defined))]
	LabelAlreadyDefined { name: String, line: usize },

	#[error("missing operand")]
	#[diagnostic(code(asm8::missing_operand))]
	MissingOperand { line: usize },

	#[error("division by zero")]
	#[diagnostic(code(asm8::divide_by_zero))]
	DivideByZero { line: usize },

	#[error("cannot determine address of '{name}'")]
	#[diagnostic(code(asm8::cant_determine_address))]
	CantDetermineAddress { name: String, line: usize },

	#[error("a name was expected here")]
	#[diagnostic(code(asm8::need_name))]
	NeedName { line: usize },

	#[error("cannot open file '{file_name}': {os_error}")]
	#[diagnostic(code(asm8::cant_open_file))]
	CantOpenFile { file_name: String, os_error: String },

	#[error("ENDM without matching MACRO")]
	#[diagnostic(code(asm8::extra_endm))]
	ExtraEndM { line: usize },

	#[error("ENDR without matching REPT")]
	#[diagnostic(code(asm8::extra_endr))]
	ExtraEndR { line: usize },

	#[error("ENDE without matching ENUM")]
	#[diagnostic(code(asm8::extra_ende))]
	ExtraEndE { line: usize },

	#[error("macro '{name}' recursively invokes itself")]
	#[diagnostic(code(asm8::recursive_macro))]
	RecursiveMacro { name: String, line: usize },

	#[error("equate '{name}' recursively refers to itself")]
	#[diagnostic(code(asm8::recursive_equate))]
	RecursiveEquate { name: String, line: usize },

	#[error("MACRO without matching ENDM")]
	#[diagnostic(code(asm8::missing_endm))]
	MissingEndM { line: usize },

	#[error("REPT without matching ENDR")]
	#[diagnostic(code(asm8::missing_endr))]
	MissingEndR { line: usize },

	#[error("ENUM without matching ENDE")]
	#[diagnostic(code(asm8::missing_ende))]
	MissingEndE { line: usize },

	#[error("IF without matching ENDIF")]
	#[diagnostic(code(asm8::missing_endif))]
	MissingEndIf { line: usize },

	#[error("conditional-assembly stack overflowed (max depth 32)")]
	#[diagnostic(code(asm8::if_nest_limit))]
	IfNestLimit { line: usize },

	#[error("program counter is undefined here; use ORG first")]
	#[diagnostic(code(asm8::undefined_pc))]
	UndefinedPc { line: usize },

	#[error("INCBIN size/offset is out of range of the file")]
	#[diagnostic(code(asm8::bad_incbin_size))]
	BadIncbinSize { file_name: String, line: usize },

	#[error("seek position is out of range")]
	#[diagnostic(code(asm8::seek_out_of_range))]
	SeekOutOfRange { line: usize },

	#[error("extra characters on line: '{text}'")]
	#[diagnostic(code(asm8::extra_chars_on_line))]
	ExtraCharsOnLine { text: String, line: usize },

	#[error("{message}")]
	#[diagnostic(code(asm8::user_error))]
	UserError { message: String, line: usize },

	#[error("{message}")]
	#[diagnostic(code(asm8::syntax_error))]
	Syntax { message: String, line: usize },
}

impl AssemblyError {
	/// The source line number this error was raised on, for the plain
	/// `<filename>(<lineno>): <message>` reporter required by the CLI
	/// contract.
	#[must_use]
	pub fn line(&self) -> usize {
		match self {
			Self::OutOfRange { line, .. }
			| Self::NotANumber { line, .. }
			| Self::UnknownLabel { line, .. }
			| Self::IllegalInstruction { line, .. }
			| Self::IncompleteExpression { line, .. }
			| Self::LabelAlreadyDefined { line, .. }
			| Self::MissingOperand { line, .. }
			| Self::DivideByZero { line, .. }
			| Self::CantDetermineAddress { line, .. }
			| Self::NeedName { line, .. }
			| Self::ExtraEndM { line, .. }
			| Self::ExtraEndR { line, .. }
			| Self::ExtraEndE { line, .. }
			| Self::RecursiveMacro { line, .. }
			| Self::RecursiveEquate { line, .. }
			| Self::MissingEndM { line, .. }
			| Self::MissingEndR { line, .. }
			| Self::MissingEndE { line, .. }
			| Self::MissingEndIf { line, .. }
			| Self::IfNestLimit { line, .. }
			| Self::UndefinedPc { line, .. }
			| Self::BadIncbinSize { line, .. }
			| Self::SeekOutOfRange { line, .. }
			| Self::ExtraCharsOnLine { line, .. }
			| Self::UserError { line, .. }
			| Self::Syntax { line, .. } => *line,
			Self::CantOpenFile { .. } => 0,
		}
	}

	/// Whether this error class reflects an unresolved dependency, which is
	/// swallowed outside of `lastChance` and instead turned into another
	/// pass (see the pass driver).
	#[must_use]
	pub const fn is_dependency_error(&self) -> bool {
		matches!(self, Self::UnknownLabel { .. } | Self::CantDetermineAddress { .. })
	}

	/// Formats this error the way the quiet (`-q`) reporter does:
	/// `<filename>(<lineno>): <message>`.
	#[must_use]
	pub fn plain(&self, file_name: &str) -> String {
		format!("{file_name}({}): {self}", self.line())
	}
}

/// Convenience alias used throughout the engine.
pub type AsmResult<T> = Result<T, AssemblyError>;

/// A small helper span for diagnostics that only need to highlight "the
/// whole line" rather than a sub-span of it.
#[must_use]
pub fn whole_line_span(line_text: &str) -> SourceSpan {
	(0, line_text.len()).into()
}

impl AssemblyError {
	/// Attaches the text of the offending line so `miette` can render a
	/// one-line source snippet and underline. Engine code only ever tracks
	/// line numbers, not byte spans into the whole file, so the snippet is
	/// built from just that one line rather than the full source text.
	#[must_use]
	pub fn with_source(self, file_name: &str, full_text: &str) -> SourceAnnotatedError {
		let line_number = self.line();
		let line_text = if line_number == 0 {
			full_text.lines().next().unwrap_or("")
		} else {
			full_text.lines().nth(line_number - 1).unwrap_or("")
		};
		let code = AssemblyCode::from_text(file_name, line_text);
		let span = whole_line_span(line_text);
		SourceAnnotatedError { error: self, source_code: code.named_source(), span }
	}
}

/// A bare [`AssemblyError`] paired with the source snippet it occurred in,
/// for `miette`'s graphical report. Kept separate from [`AssemblyError`]
/// itself so the engine's error variants stay simple (a line number, not a
/// byte span) while the CLI's reporting path still gets a real snippet.
#[derive(Debug)]
pub struct SourceAnnotatedError {
	error: AssemblyError,
	source_code: NamedSource<Arc<str>>,
	span: SourceSpan,
}

impl std::fmt::Display for SourceAnnotatedError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		std::fmt::Display::fmt(&self.error, f)
	}
}

impl std::error::Error for SourceAnnotatedError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		Some(&self.error)
	}
}

impl Diagnostic for SourceAnnotatedError {
	fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
		self.error.code()
	}

	fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
		self.error.help()
	}

	fn source_code(&self) -> Option<&dyn miette::SourceCode> {
		Some(&self.source_code)
	}

	fn labels(&self) -> Option<Box<dyn Iterator<Item = miette::LabeledSpan> + '_>> {
		Some(Box::new(std::iter::once(miette::LabeledSpan::new_with_span(Some("here".to_owned()), self.span))))
	}
}
