//! Code generation: lower the parsed AST into AT&T x86-64 assembly.
//!
//! The emitter uses a simple stack machine: every expression leaves a
//! single value on the stack and every consumer pops its operands into
//! the two scratch registers `%rax` and `%rdi`. Locals live on the stack
//! frame and are addressed relative to `%rbp`.

use crate::error::{CompileError, CompileResult};
use crate::parser::{AstNode, BinaryOp, Function, Stmt};

/// Emit assembly for a function.
pub fn generate(func: &Function) -> CompileResult<String> {
  let mut asm = String::new();
  asm.push_str(".global main\n");
  asm.push_str("main:\n");
  asm.push_str("    push %rbp\n");
  asm.push_str("    mov %rsp, %rbp\n");
  if func.stack_size > 0 {
    asm.push_str(&format!("    sub ${}, %rsp\n", func.stack_size));
  }

  emit_stmt(&func.body, &mut asm)?;

  asm.push_str("    mov %rbp, %rsp\n");
  asm.push_str("    pop %rbp\n");
  asm.push_str("    ret\n");

  Ok(asm)
}

/// Walk the statement list. Every statement except `return` leaves one
/// value on the stack, which is popped into `%rax` to keep the stack
/// balanced; after the last statement that pop doubles as loading the
/// program result for the epilogue. A `return` emits its own exit, and
/// any statements after it become dead code with a second, dead exit
/// path at the end.
fn emit_stmt(stmt: &Stmt, asm: &mut String) -> CompileResult<()> {
  emit_expr(&stmt.expr, asm)?;

  if !matches!(stmt.expr, AstNode::Return { .. }) {
    asm.push_str("    pop %rax\n");
  }

  if let Some(next) = stmt.next.as_deref() {
    emit_stmt(next, asm)?;
  }

  Ok(())
}

/// Emit stack-based code for a single expression node in rvalue context.
fn emit_expr(node: &AstNode, asm: &mut String) -> CompileResult<()> {
  match node {
    AstNode::Num { value } => {
      asm.push_str(&format!("    mov ${value}, %rax\n"));
      asm.push_str("    push %rax\n");
    }
    AstNode::Var { offset } => {
      asm.push_str(&format!("    mov -{offset}(%rbp), %rax\n"));
      asm.push_str("    push %rax\n");
    }
    AstNode::Binary { op, lhs, rhs } => {
      emit_expr(lhs, asm)?;
      emit_expr(rhs, asm)?;
      asm.push_str("    pop %rdi\n");
      asm.push_str("    pop %rax\n");
      match op {
        BinaryOp::Add => asm.push_str("    add %rdi, %rax\n"),
        BinaryOp::Sub => asm.push_str("    sub %rdi, %rax\n"),
        BinaryOp::Mul => asm.push_str("    imul %rdi, %rax\n"),
        BinaryOp::Div => {
          asm.push_str("    cqo\n");
          asm.push_str("    idiv %rdi\n");
        }
        BinaryOp::Eq => {
          asm.push_str("    cmp %rdi, %rax\n");
          asm.push_str("    sete %al\n");
          asm.push_str("    movzbl %al, %eax\n");
        }
        BinaryOp::Ne => {
          asm.push_str("    cmp %rdi, %rax\n");
          asm.push_str("    setne %al\n");
          asm.push_str("    movzbl %al, %eax\n");
        }
        BinaryOp::Lt => {
          asm.push_str("    cmp %rdi, %rax\n");
          asm.push_str("    setl %al\n");
          asm.push_str("    movzbl %al, %eax\n");
        }
        BinaryOp::Le => {
          asm.push_str("    cmp %rdi, %rax\n");
          asm.push_str("    setle %al\n");
          asm.push_str("    movzbl %al, %eax\n");
        }
      }
      asm.push_str("    push %rax\n");
    }
    AstNode::Assign { lhs, rhs } => {
      emit_addr(lhs, asm)?;
      emit_expr(rhs, asm)?;
      asm.push_str("    pop %rdi\n");
      asm.push_str("    pop %rax\n");
      asm.push_str("    mov %rdi, (%rax)\n");
      // An assignment is an expression: the stored value stays available
      // to the enclosing context.
      asm.push_str("    push %rdi\n");
    }
    AstNode::Return { operand } => {
      emit_expr(operand, asm)?;
      asm.push_str("    pop %rax\n");
      asm.push_str("    mov %rbp, %rsp\n");
      asm.push_str("    pop %rbp\n");
      asm.push_str("    ret\n");
    }
  }

  Ok(())
}

/// Emit the address of an lvalue. Only variables have addresses; the
/// parser never produces another shape on the left of an assignment.
fn emit_addr(node: &AstNode, asm: &mut String) -> CompileResult<()> {
  match node {
    AstNode::Var { offset } => {
      asm.push_str(&format!("    lea -{offset}(%rbp), %rax\n"));
      asm.push_str("    push %rax\n");
      Ok(())
    }
    _ => Err(CompileError::internal(
      "assignment target is not a variable",
    )),
  }
}
