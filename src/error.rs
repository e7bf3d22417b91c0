//! Shared error utilities used across the compilation pipeline.
//!
//! Diagnostics are kept lightweight on purpose – these routines format
//! messages in a style reminiscent of chibicc, pointing at the offending
//! byte with a caret. Each stage gets its own variant so embedders can
//! tell lexical, syntactic and internal failures apart without parsing
//! the rendered message.

use snafu::Snafu;

pub type CompileResult<T> = Result<T, CompileError>;

/// Which stage rejected the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  Lex,
  Syntax,
  Internal,
}

#[derive(Debug, Snafu)]
pub enum CompileError {
  #[snafu(display("{expr_line}\n{marker} {message}"))]
  Lex {
    expr_line: String,
    marker: String,
    message: String,
    loc: usize,
  },
  #[snafu(display("{expr_line}\n{marker} {message}"))]
  Syntax {
    expr_line: String,
    marker: String,
    message: String,
    loc: usize,
  },
  #[snafu(display("internal error: {message}"))]
  Internal { message: String },
}

impl CompileError {
  /// Construct a lexical error anchored at a specific byte offset in the source.
  pub fn lex_at(expr: &str, loc: usize, message: impl Into<String>) -> Self {
    let (expr_line, marker) = caret_line(expr, loc);
    Self::Lex {
      expr_line,
      marker,
      message: message.into(),
      loc,
    }
  }

  /// Construct a syntax error anchored at a specific byte offset in the source.
  pub fn syntax_at(expr: &str, loc: usize, message: impl Into<String>) -> Self {
    let (expr_line, marker) = caret_line(expr, loc);
    Self::Syntax {
      expr_line,
      marker,
      message: message.into(),
      loc,
    }
  }

  /// Construct an internal error. These carry no source position: they flag
  /// a node shape the code generator cannot handle, which a conforming
  /// parser never produces.
  pub fn internal(message: impl Into<String>) -> Self {
    Self::Internal {
      message: message.into(),
    }
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Lex { .. } => ErrorKind::Lex,
      Self::Syntax { .. } => ErrorKind::Syntax,
      Self::Internal { .. } => ErrorKind::Internal,
    }
  }

  /// Byte offset of the failing position, when the error carries one.
  pub fn loc(&self) -> Option<usize> {
    match self {
      Self::Lex { loc, .. } | Self::Syntax { loc, .. } => Some(*loc),
      Self::Internal { .. } => None,
    }
  }
}

/// Quote the source line and build a caret marker pointing at `loc`.
fn caret_line(expr: &str, loc: usize) -> (String, String) {
  let expr_line = format!("'{expr}'");
  let safe_loc = loc.min(expr.len());
  let char_offset = expr[..safe_loc].chars().count() + 1; // account for opening quote
  let marker = format!("{}^", " ".repeat(char_offset));
  (expr_line, marker)
}
