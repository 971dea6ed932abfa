//! The symbol table: a multimap of name to a stack of labels, with
//! scope-aware lookup and forward-reference bookkeeping.

use std::collections::HashMap;

use crate::error::{AssemblyError, AsmResult};
use crate::opcode::Mnemonic;

/// Sentinel PC value meaning "no ORG seen yet".
pub const NOORIGIN: i64 = i64::MIN / 2;

/// A captured macro body: the lines between `MACRO` and `ENDM`, verbatim,
/// plus the formal parameter names in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroBody {
	pub params: Vec<String>,
	pub lines: Vec<String>,
}

/// A captured `REPT` body, replayed `count` times by the macro engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReptBody {
	pub lines: Vec<String>,
}

/// One `(addressing mode, opcode byte)` entry in a mnemonic's table, see
/// [`crate::opcode`].
pub type OpcodeEntry = (crate::opcode::AddressingMode, u8);

/// The tagged value a label holds, one case per reserved category so that
/// dispatch is a plain match instead of runtime type inspection.
#[derive(Debug, Clone, PartialEq)]
pub enum LabelKind {
	/// An address computed by position in the output.
	Label(i64),
	/// A free integer, e.g. from `=` or `ENUM`.
	Value(i64),
	/// Source text substituted in place of the identifier.
	Equate(String),
	/// A captured macro body.
	Macro(MacroBody),
	/// A pre-registered opcode mnemonic.
	ReservedOpcode(Mnemonic),
	/// A pre-registered directive name.
	ReservedDirective(crate::directive::DirectiveTag),
}

impl LabelKind {
	#[must_use]
	pub const fn is_value_like(&self) -> bool {
		matches!(self, Self::Label(_) | Self::Value(_))
	}

	/// The numeric value of this label, if it has one.
	#[must_use]
	pub const fn numeric_value(&self) -> Option<i64> {
		match self {
			Self::Label(value) | Self::Value(value) => Some(*value),
			_ => None,
		}
	}
}

/// A single label definition. Same-named labels form a stack (see
/// [`SymbolTable`]); this struct is one frame of that stack.
#[derive(Debug, Clone)]
pub struct Label {
	pub name: String,
	pub kind: LabelKind,
	/// Pass number in which this label last received a definition.
	pub defined_this_pass: u32,
	/// 0 for global, nonzero for local scope membership.
	pub scope: u32,
	/// Flipped around equate expansion to detect expansion cycles, and
	/// always restored on every exit path including errors.
	pub recursion_guard: bool,
}

impl Label {
	fn reserved(name: &str, kind: LabelKind) -> Self {
		Self { name: name.to_owned(), kind, defined_this_pass: 0, scope: 0, recursion_guard: false }
	}
}

/// Multimap of name to an ordered (most-recent-first) stack of labels,
/// plus the scope bookkeeping described in the design notes.
#[derive(Debug)]
pub struct SymbolTable {
	table: HashMap<String, Vec<Label>>,
	pub current_scope: u32,
	pub next_scope: u32,
}

/// Outcome of [`SymbolTable::define`], telling the caller whether a value
/// changed in a way that forces another pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefineOutcome {
	pub needs_another_pass: bool,
}

impl SymbolTable {
	#[must_use]
	pub fn new() -> Self {
		let mut table = Self { table: HashMap::new(), current_scope: 1, next_scope: 2 };
		table.register_reserved_words();
		table
	}

	fn register_reserved_words(&mut self) {
		for mnemonic in Mnemonic::all() {
			self.table.insert(mnemonic.name().to_owned(), vec![Label::reserved(
				mnemonic.name(),
				LabelKind::ReservedOpcode(mnemonic),
			)]);
		}
		for tag in crate::directive::DirectiveTag::all() {
			for name in tag.names() {
				self.table.insert((*name).to_owned(), vec![Label::reserved(name, LabelKind::ReservedDirective(tag))]);
			}
		}
	}

	/// Resets the per-pass scope counters; called by the pass driver at the
	/// start of each pass. Label values and their `defined_this_pass` marks
	/// carry over untouched: a name already bound in an earlier pass keeps
	/// its last known value visible to forward references until this pass's
	/// own definition line overwrites it.
	pub fn begin_pass(&mut self) {
		self.current_scope = 1;
		self.next_scope = 2;
	}

	/// Looks up a name for read access: the innermost local match first,
	/// then the newest global.
	#[must_use]
	pub fn lookup(&self, name: &str) -> Option<&Label> {
		let stack = self.table.get(name)?;
		stack
			.iter()
			.find(|label| label.scope == self.current_scope)
			.or_else(|| stack.iter().find(|label| label.scope == 0))
	}

	#[must_use]
	pub fn lookup_mut(&mut self, name: &str) -> Option<&mut Label> {
		let current_scope = self.current_scope;
		let stack = self.table.get_mut(name)?;
		if let Some(index) = stack.iter().position(|label| label.scope == current_scope) {
			return stack.get_mut(index);
		}
		let index = stack.iter().position(|label| label.scope == 0)?;
		stack.get_mut(index)
	}

	/// Defines a new label, per the scoping and redefinition rules.
	///
	/// * If `name` starts with `@` or `local` is true, the label attaches to
	///   the current scope.
	/// * Otherwise a fresh global scope is opened so that labels following
	///   this one form a new local namespace.
	pub fn define(
		&mut self,
		name: &str,
		kind: LabelKind,
		local: bool,
		pass: u32,
		line: usize,
		last_chance: bool,
	) -> AsmResult<DefineOutcome> {
		let is_local = local || name.starts_with('@');
		let scope = if is_local {
			self.current_scope
		} else {
			// Opens a fresh local-scope block for whatever comes after this
			// label, but the global itself lives in the shared scope-0
			// bucket so it stays visible from anywhere in the file.
			self.allocate_global_scope();
			0
		};

		let stack = self.table.entry(name.to_owned()).or_default();

		if let Some(existing) = stack.iter_mut().find(|label| label.scope == scope) {
			match (&existing.kind, &kind) {
				// VALUE labels (and equates re-assigned via `=`) may be freely
				// redefined within the same pass.
				(LabelKind::Value(_), LabelKind::Value(_)) => {
					existing.kind = kind;
					existing.defined_this_pass = pass;
					return Ok(DefineOutcome { needs_another_pass: false });
				},
				(LabelKind::Label(_), LabelKind::Label(_)) if existing.defined_this_pass == pass =>
					return Err(AssemblyError::LabelAlreadyDefined { name: name.to_owned(), line }),
				(LabelKind::Label(old_value), LabelKind::Label(new_value)) => {
					let changed = *old_value != *new_value;
					let is_anonymous_backward = name.starts_with('-');
					existing.kind = kind;
					existing.defined_this_pass = pass;
					if changed && !is_anonymous_backward {
						if last_chance {
							return Err(AssemblyError::OutOfRange { value: *new_value, line, help: Some(
								"this label's address changed on the final pass; the assembly did not converge".to_owned(),
							) });
						}
						return Ok(DefineOutcome { needs_another_pass: true });
					}
					return Ok(DefineOutcome { needs_another_pass: false });
				},
				_ if existing.defined_this_pass == pass =>
					return Err(AssemblyError::LabelAlreadyDefined { name: name.to_owned(), line }),
				_ => {
					existing.kind = kind;
					existing.defined_this_pass = pass;
					return Ok(DefineOutcome { needs_another_pass: false });
				},
			}
		}

		stack.push(Label { name: name.to_owned(), kind, defined_this_pass: pass, scope, recursion_guard: false });
		Ok(DefineOutcome { needs_another_pass: false })
	}

	fn allocate_global_scope(&mut self) -> u32 {
		let scope = self.next_scope;
		self.current_scope = scope;
		self.next_scope += 1;
		scope
	}

	/// Every label frontier known so far, used by the pass driver to detect
	/// whether a pass made progress.
	#[must_use]
	pub fn label_frontier(&self) -> Vec<(String, u32, Option<i64>)> {
		let mut frontier: Vec<_> = self
			.table
			.iter()
			.flat_map(|(name, stack)| {
				stack.iter().map(|label| (name.clone(), label.scope, label.kind.numeric_value()))
			})
			.collect();
		frontier.sort();
		frontier
	}
}

impl Default for SymbolTable {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn reserved_words_are_preregistered() {
		let table = SymbolTable::new();
		assert!(matches!(table.lookup("LDA").unwrap().kind, LabelKind::ReservedOpcode(Mnemonic::Lda)));
		assert!(matches!(table.lookup("ORG").unwrap().kind, LabelKind::ReservedDirective(_)));
	}

	#[test]
	fn global_labels_open_new_scopes() {
		let mut table = SymbolTable::new();
		table.define("start", LabelKind::Label(0x8000), false, 1, 1, false).unwrap();
		let scope_of_start = table.current_scope;
		table.define("@loop", LabelKind::Label(0x8001), false, 1, 2, false).unwrap();
		assert_eq!(table.lookup("@loop").unwrap().scope, scope_of_start);
		table.define("next", LabelKind::Label(0x8010), false, 1, 3, false).unwrap();
		assert_ne!(table.current_scope, scope_of_start);
	}

	#[test]
	fn redefining_a_label_with_new_value_requests_another_pass() {
		let mut table = SymbolTable::new();
		table.define("foo", LabelKind::Label(1), false, 1, 1, false).unwrap();
		table.begin_pass();
		let outcome = table.define("foo", LabelKind::Label(2), false, 2, 1, false).unwrap();
		assert!(outcome.needs_another_pass);
	}

	#[test]
	fn redefining_a_label_on_last_chance_is_an_error() {
		let mut table = SymbolTable::new();
		table.define("foo", LabelKind::Label(1), false, 1, 1, false).unwrap();
		table.begin_pass();
		let result = table.define("foo", LabelKind::Label(2), false, 2, 1, true);
		assert!(result.is_err());
	}

	#[test]
	fn duplicate_definition_in_same_pass_fails() {
		let mut table = SymbolTable::new();
		table.define("foo", LabelKind::Equate("1".to_owned()), false, 1, 1, false).unwrap();
		let result = table.define("foo", LabelKind::Equate("2".to_owned()), false, 1, 2, false);
		assert!(result.is_err());
	}

	#[test]
	fn duplicate_label_definition_in_same_pass_fails() {
		let mut table = SymbolTable::new();
		table.define("foo", LabelKind::Label(0x8000), false, 1, 1, false).unwrap();
		let result = table.define("foo", LabelKind::Label(0x8010), false, 1, 2, false);
		assert!(matches!(result, Err(AssemblyError::LabelAlreadyDefined { .. })));
	}

	#[test]
	fn global_label_is_visible_after_scope_moves_on() {
		let mut table = SymbolTable::new();
		table.define("first", LabelKind::Label(0x8000), false, 1, 1, false).unwrap();
		table.define("second", LabelKind::Label(0x8010), false, 1, 2, false).unwrap();
		assert_eq!(table.lookup("first").unwrap().kind, LabelKind::Label(0x8000));
	}
}
