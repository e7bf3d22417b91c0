//! Recursive-descent parser producing a statement list and expression AST.
//!
//! The parser mirrors the classic chibicc structure: we maintain a
//! precedence-climbing set of helpers and expose a thin statement layer so
//! sequencing lives outside the expression tree. Variable references are
//! resolved to frame offsets while parsing, so later stages never see
//! names: the first occurrence of an identifier allocates the next
//! word-sized slot and every later occurrence reuses it.

use crate::error::{CompileError, CompileResult};
use crate::tokenizer::{Token, TokenKind, describe_token, token_text};

/// Width of a local variable slot in bytes.
pub const WORD_SIZE: i64 = 8;

/// Binary operators recognised by the language.
///
/// There is no `Gt`/`Ge`: the relational level swaps operands and reuses
/// `Lt`/`Le` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
  Add,
  Sub,
  Mul,
  Div,
  Eq,
  Ne,
  Lt,
  Le,
}

/// Expression tree produced by the parser.
#[derive(Debug, Clone, PartialEq)]
pub enum AstNode {
  Num {
    value: i64,
  },
  Var {
    offset: i64,
  },
  Binary {
    op: BinaryOp,
    lhs: Box<AstNode>,
    rhs: Box<AstNode>,
  },
  Assign {
    lhs: Box<AstNode>,
    rhs: Box<AstNode>,
  },
  Return {
    operand: Box<AstNode>,
  },
}

impl AstNode {
  pub fn number(value: i64) -> Self {
    Self::Num { value }
  }

  pub fn var(offset: i64) -> Self {
    Self::Var { offset }
  }

  pub fn binary(op: BinaryOp, lhs: AstNode, rhs: AstNode) -> Self {
    Self::Binary {
      op,
      lhs: Box::new(lhs),
      rhs: Box::new(rhs),
    }
  }

  pub fn assign(lhs: AstNode, rhs: AstNode) -> Self {
    Self::Assign {
      lhs: Box::new(lhs),
      rhs: Box::new(rhs),
    }
  }

  pub fn ret(operand: AstNode) -> Self {
    Self::Return {
      operand: Box::new(operand),
    }
  }
}

/// Singly-linked list of statements in source order.
#[derive(Debug, Clone)]
pub struct Stmt {
  pub expr: AstNode,
  pub next: Option<Box<Stmt>>,
}

impl Stmt {
  /// Iterate statements in order. Useful for debugging and future passes.
  pub fn iter(&self) -> StmtIter<'_> {
    StmtIter {
      current: Some(self),
    }
  }
}

pub struct StmtIter<'a> {
  current: Option<&'a Stmt>,
}

impl<'a> Iterator for StmtIter<'a> {
  type Item = &'a AstNode;

  fn next(&mut self) -> Option<Self::Item> {
    let stmt = self.current?;
    self.current = stmt.next.as_deref();
    Some(&stmt.expr)
  }
}

/// A named stack slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Local {
  pub name: String,
  pub offset: i64,
}

/// Append-only association from variable name to frame offset.
///
/// Lookups scan newest-to-oldest and return the first exact match;
/// offsets are issued in discovery order as increasing multiples of
/// [`WORD_SIZE`]. There is no deletion and no scoping: one flat table
/// covers the whole program.
#[derive(Debug, Default)]
pub struct Locals {
  entries: Vec<Local>,
}

impl Locals {
  /// Return the offset for `name`, allocating the next slot on first use.
  pub fn resolve(&mut self, name: &str) -> i64 {
    if let Some(local) = self.entries.iter().rev().find(|local| local.name == name) {
      return local.offset;
    }
    let offset = self.max_offset() + WORD_SIZE;
    self.entries.push(Local {
      name: name.to_owned(),
      offset,
    });
    offset
  }

  /// Largest offset issued so far, or zero for an empty table.
  pub fn max_offset(&self) -> i64 {
    self.entries.last().map(|local| local.offset).unwrap_or(0)
  }

  pub fn entries(&self) -> &[Local] {
    &self.entries
  }
}

/// Parse result: the statement list plus the frame layout codegen needs.
#[derive(Debug)]
pub struct Function {
  pub body: Box<Stmt>,
  pub locals: Locals,
  pub stack_size: i64,
}

/// Round `n` up to the next multiple of `align`.
fn align_to(n: i64, align: i64) -> i64 {
  (n + align - 1) / align * align
}

/// Parse a whole program from the token stream.
pub fn parse(tokens: Vec<Token>, source: &str) -> CompileResult<Function> {
  let mut stream = TokenStream::new(tokens, source);
  let mut locals = Locals::default();

  if stream.is_eof() {
    return Err(CompileError::syntax_at(source, 0, "program is empty"));
  }

  let body = parse_stmt(&mut stream, &mut locals)?;

  // %rsp must stay 16-byte aligned across the prologue.
  let stack_size = align_to(locals.max_offset(), 16);
  Ok(Function {
    body,
    locals,
    stack_size,
  })
}

fn parse_stmt(stream: &mut TokenStream, locals: &mut Locals) -> CompileResult<Box<Stmt>> {
  let expr = if stream.equal("return") {
    AstNode::ret(parse_expr(stream, locals)?)
  } else {
    parse_expr(stream, locals)?
  };
  stream.skip(";")?;

  let next = if stream.is_eof() {
    None
  } else {
    Some(parse_stmt(stream, locals)?)
  };

  Ok(Box::new(Stmt { expr, next }))
}

fn parse_expr(stream: &mut TokenStream, locals: &mut Locals) -> CompileResult<AstNode> {
  parse_assign(stream, locals)
}

fn parse_assign(stream: &mut TokenStream, locals: &mut Locals) -> CompileResult<AstNode> {
  let node = parse_equality(stream, locals)?;

  if stream.equal("=") {
    let rhs = parse_assign(stream, locals)?;
    return Ok(AstNode::assign(node, rhs));
  }

  Ok(node)
}

fn parse_equality(stream: &mut TokenStream, locals: &mut Locals) -> CompileResult<AstNode> {
  let mut node = parse_relational(stream, locals)?;

  loop {
    let op_str = match stream
      .peek()
      .filter(|token| token.kind == TokenKind::Punctuator)
      .map(|token| token_text(token, stream.source))
    {
      Some(symbol @ "==") => symbol,
      Some(symbol @ "!=") => symbol,
      _ => break,
    };

    let op = match op_str {
      "==" => BinaryOp::Eq,
      "!=" => BinaryOp::Ne,
      _ => unreachable!(),
    };

    stream.skip(op_str)?;
    let rhs = parse_relational(stream, locals)?;
    node = AstNode::binary(op, node, rhs);
  }

  Ok(node)
}

fn parse_relational(stream: &mut TokenStream, locals: &mut Locals) -> CompileResult<AstNode> {
  let mut node = parse_add(stream, locals)?;

  loop {
    let op_str = match stream
      .peek()
      .filter(|token| token.kind == TokenKind::Punctuator)
      .map(|token| token_text(token, stream.source))
    {
      Some(symbol @ "<") => symbol,
      Some(symbol @ "<=") => symbol,
      Some(symbol @ ">") => symbol,
      Some(symbol @ ">=") => symbol,
      _ => break,
    };

    stream.skip(op_str)?;
    let rhs = parse_add(stream, locals)?;

    // ">" and ">=" reuse the "<" and "<=" node kinds with the operands
    // swapped, so the AST only ever contains Lt/Le.
    node = match op_str {
      "<" => AstNode::binary(BinaryOp::Lt, node, rhs),
      "<=" => AstNode::binary(BinaryOp::Le, node, rhs),
      ">" => AstNode::binary(BinaryOp::Lt, rhs, node),
      ">=" => AstNode::binary(BinaryOp::Le, rhs, node),
      _ => unreachable!(),
    };
  }

  Ok(node)
}

fn parse_add(stream: &mut TokenStream, locals: &mut Locals) -> CompileResult<AstNode> {
  let mut node = parse_mul(stream, locals)?;

  loop {
    let op_str = match stream
      .peek()
      .filter(|token| token.kind == TokenKind::Punctuator)
      .map(|token| token_text(token, stream.source))
    {
      Some(symbol @ "+") => symbol,
      Some(symbol @ "-") => symbol,
      _ => break,
    };

    let op = match op_str {
      "+" => BinaryOp::Add,
      "-" => BinaryOp::Sub,
      _ => unreachable!(),
    };

    stream.skip(op_str)?;
    let rhs = parse_mul(stream, locals)?;
    node = AstNode::binary(op, node, rhs);
  }

  Ok(node)
}

fn parse_mul(stream: &mut TokenStream, locals: &mut Locals) -> CompileResult<AstNode> {
  let mut node = parse_unary(stream, locals)?;

  loop {
    let op_str = match stream
      .peek()
      .filter(|token| token.kind == TokenKind::Punctuator)
      .map(|token| token_text(token, stream.source))
    {
      Some(symbol @ "*") => symbol,
      Some(symbol @ "/") => symbol,
      _ => break,
    };

    let op = match op_str {
      "*" => BinaryOp::Mul,
      "/" => BinaryOp::Div,
      _ => unreachable!(),
    };

    stream.skip(op_str)?;
    let rhs = parse_unary(stream, locals)?;
    node = AstNode::binary(op, node, rhs);
  }

  Ok(node)
}

fn parse_unary(stream: &mut TokenStream, locals: &mut Locals) -> CompileResult<AstNode> {
  if stream.equal("+") {
    return parse_primary(stream, locals);
  }

  if stream.equal("-") {
    // Desugar "-x" into "0 - x" so codegen only ever sees binary nodes.
    let operand = parse_primary(stream, locals)?;
    return Ok(AstNode::binary(
      BinaryOp::Sub,
      AstNode::number(0),
      operand,
    ));
  }

  parse_primary(stream, locals)
}

fn parse_primary(stream: &mut TokenStream, locals: &mut Locals) -> CompileResult<AstNode> {
  if stream.equal("(") {
    let node = parse_expr(stream, locals)?;
    stream.skip(")")?;
    return Ok(node);
  }

  if matches!(
    stream.peek().map(|token| token.kind),
    Some(TokenKind::Ident)
  ) {
    let (name, _) = stream.get_ident()?;
    let offset = locals.resolve(name);
    return Ok(AstNode::var(offset));
  }

  let (value, _) = stream.get_number()?;
  Ok(AstNode::number(value))
}

/// Lightweight cursor over the token vector.
struct TokenStream<'a> {
  tokens: Vec<Token>,
  source: &'a str,
  pos: usize,
}

impl<'a> TokenStream<'a> {
  /// Take ownership of the token stream; the parser will advance `pos` as it consumes input.
  fn new(tokens: Vec<Token>, source: &'a str) -> Self {
    Self {
      tokens,
      source,
      pos: 0,
    }
  }

  fn peek(&self) -> Option<&Token> {
    self.tokens.get(self.pos)
  }

  /// Consume the current token if it matches the provided punctuator.
  fn equal(&mut self, op: &str) -> bool {
    if let Some(token) = self.peek()
      && token.kind == TokenKind::Punctuator
      && token.len == op.len()
      && token_text(token, self.source) == op
    {
      self.pos += 1;
      return true;
    }
    false
  }

  fn skip(&mut self, s: &str) -> CompileResult<()> {
    if self.equal(s) {
      Ok(())
    } else {
      let (loc, got) = match self.tokens.get(self.pos) {
        Some(token) => (token.loc, describe_token(Some(token), self.source)),
        None => (self.source.len(), "EOF".to_string()),
      };
      Err(CompileError::syntax_at(
        self.source,
        loc,
        format!("expected \"{s}\", but got \"{got}\""),
      ))
    }
  }

  /// Parse the current token as an integer literal returning its value and location.
  fn get_number(&mut self) -> CompileResult<(i64, usize)> {
    if self.pos >= self.tokens.len() {
      return Err(CompileError::syntax_at(
        self.source,
        self.source.len(),
        "expected a number, but reached end of input",
      ));
    }

    if let Some(token) = self.tokens.get(self.pos)
      && token.kind == TokenKind::Num
    {
      let value = token.value.ok_or_else(|| {
        CompileError::internal("numeric token missing value")
      })?;
      let loc = token.loc;
      self.pos += 1;
      return Ok((value, loc));
    }

    let Some(token) = self.tokens.get(self.pos) else {
      return Err(CompileError::syntax_at(
        self.source,
        self.source.len(),
        "unexpected end of input while parsing number",
      ));
    };
    let got = describe_token(Some(token), self.source);
    Err(CompileError::syntax_at(
      self.source,
      token.loc,
      format!("expected a number, but got \"{got}\""),
    ))
  }

  /// Parse the current token as an identifier, returning its text and location.
  fn get_ident(&mut self) -> CompileResult<(&'a str, usize)> {
    if let Some(token) = self.tokens.get(self.pos)
      && token.kind == TokenKind::Ident
    {
      let name = token_text(token, self.source);
      let loc = token.loc;
      self.pos += 1;
      return Ok((name, loc));
    }

    let (loc, got) = match self.tokens.get(self.pos) {
      Some(token) => (token.loc, describe_token(Some(token), self.source)),
      None => (self.source.len(), "EOF".to_string()),
    };
    Err(CompileError::syntax_at(
      self.source,
      loc,
      format!("expected an identifier, but got \"{got}\""),
    ))
  }

  fn is_eof(&self) -> bool {
    matches!(self.peek().map(|token| token.kind), Some(TokenKind::Eof))
  }
}
