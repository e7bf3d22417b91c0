//! Crate root: wires together the compilation pipeline.
//!
//! The stages are intentionally small and composable so they can be evolved
//! independently:
//! - `tokenizer` performs lexical analysis and produces a flat token stream.
//! - `parser` owns all syntactic knowledge and returns a function AST with locals.
//! - `codegen` lowers the parsed function into x86-64 AT&T assembly.
//! - `error` centralises reporting utilities shared by the other modules.
//!
//! Each stage runs to completion before the next starts and every failure
//! is returned as a [`CompileError`] value, so embedders decide whether to
//! print-and-exit or handle it.

pub mod error;
pub mod parser;
pub mod tokenizer;

mod codegen;

pub use error::{CompileError, CompileResult, ErrorKind};

/// Compile a source string into AT&T assembly.
pub fn generate_assembly(source: &str) -> CompileResult<String> {
  let tokens = tokenizer::tokenize(source)?;
  let program = parser::parse(tokens, source)?;
  codegen::generate(&program)
}

#[cfg(test)]
mod specs {
  use super::*;

  #[test]
  fn compiles_the_worked_example() {
    let asm = generate_assembly("1+2*3;").unwrap();
    assert!(asm.starts_with(".global main\nmain:\n"));
    assert!(asm.contains("    imul %rdi, %rax\n"));
    assert!(asm.contains("    add %rdi, %rax\n"));
    assert!(asm.ends_with("    ret\n"));
  }

  #[test]
  fn compiles_locals_and_return() {
    let asm = generate_assembly("a=3;b=5;return a+b;").unwrap();
    assert!(asm.contains("    sub $16, %rsp\n"));
    assert!(asm.contains("    lea -8(%rbp), %rax\n"));
    assert!(asm.contains("    lea -16(%rbp), %rax\n"));
  }

  #[test]
  fn dangling_operator_is_a_syntax_error() {
    let err = generate_assembly("1+").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
    assert_eq!(err.loc(), Some(2));
  }

  #[test]
  fn unknown_byte_is_a_lex_error() {
    let err = generate_assembly("1@").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Lex);
    assert_eq!(err.loc(), Some(1));
  }

  #[test]
  fn diagnostics_render_the_caret_line() {
    let err = generate_assembly("1+@").unwrap_err();
    assert_eq!(err.to_string(), "'1+@'\n   ^ invalid token: '@'");
  }
}
