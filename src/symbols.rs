//! Symbol table: the name → register map built up over a translation run.
//!
//! Bindings persist for the life of the run and are kept in first-assignment
//! order for the diagnostic dump. Lookup is linear – the table never grows
//! past a handful of entries.

use crate::registers::Register;

#[derive(Debug, Default)]
pub struct SymbolTable {
  entries: Vec<(String, Register)>,
}

impl SymbolTable {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn lookup(&self, name: &str) -> Option<Register> {
    self
      .entries
      .iter()
      .find(|(entry, _)| entry == name)
      .map(|(_, reg)| *reg)
  }

  /// Bind `name` to `reg`, replacing any previous binding.
  /// Returns the register the name was bound to before, if any.
  pub fn bind(&mut self, name: &str, reg: Register) -> Option<Register> {
    if let Some(entry) = self.entries.iter_mut().find(|(entry, _)| entry == name) {
      let previous = entry.1;
      entry.1 = reg;
      return Some(previous);
    }
    self.entries.push((name.to_string(), reg));
    None
  }

  /// Iterate bindings in the order names were first assigned.
  pub fn iter(&self) -> impl Iterator<Item = (&str, Register)> {
    self.entries.iter().map(|(name, reg)| (name.as_str(), *reg))
  }
}
