//! Shared error utilities used across the translation pipeline.
//!
//! Diagnostics are kept lightweight on purpose – lexical and syntax errors
//! point at the offending byte with a caret, while faults discovered during
//! lowering carry just the data needed to explain themselves. Every variant
//! is fatal: the run aborts on the first error and nothing is retried.

use snafu::Snafu;

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Snafu)]
pub enum CompileError {
  /// An input character matches no token rule.
  #[snafu(display("{line}\n{marker} {message}"))]
  Lexical {
    line: String,
    marker: String,
    message: String,
  },

  /// The token stream matches no grammar production.
  #[snafu(display("{line}\n{marker} {message}"))]
  Syntax {
    line: String,
    marker: String,
    message: String,
  },

  /// An expression references a name never previously assigned.
  #[snafu(display("undefined name '{name}'"))]
  UndefinedName { name: String },

  /// An immediate falls outside the target's encodable range.
  #[snafu(display("immediate {value} is outside the encodable range [-255, 255]"))]
  IntegerRange { value: i64 },

  /// The register pool has no register left to hand out.
  #[snafu(display("no free register available"))]
  ResourceExhausted,

  /// A division or remainder whose divisor is the literal zero.
  #[snafu(display("division by zero"))]
  DivideByZero,

  /// Grammatically valid input outside the translatable subset.
  #[snafu(display("{message}"))]
  Unsupported { message: String },
}

impl CompileError {
  /// Lexical error anchored at a specific byte offset in the source line.
  pub fn lexical_at(line: &str, loc: usize, message: impl Into<String>) -> Self {
    let (line, marker) = mark(line, loc);
    Self::Lexical {
      line,
      marker,
      message: message.into(),
    }
  }

  /// Syntax error anchored at a specific byte offset in the source line.
  pub fn syntax_at(line: &str, loc: usize, message: impl Into<String>) -> Self {
    let (line, marker) = mark(line, loc);
    Self::Syntax {
      line,
      marker,
      message: message.into(),
    }
  }
}

/// Quote the line and build a caret marker pointing at `loc`.
fn mark(line: &str, loc: usize) -> (String, String) {
  let quoted = format!("'{line}'");
  let safe_loc = loc.min(line.len());
  let char_offset = line[..safe_loc].chars().count() + 1; // account for opening quote
  let marker = format!("{}^", " ".repeat(char_offset));
  (quoted, marker)
}
