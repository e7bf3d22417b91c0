//! Lexical analysis: turns the raw input string into a vector of tokens.
//!
//! The tokenizer is intentionally tiny – it knows nothing about semantics
//! beyond recognising punctuators, identifiers and numeric literals.
//! Multi-character punctuators are matched before single-character ones to
//! avoid ambiguity. The source buffer is never touched: every token is a
//! span (`loc`, `len`) into the original string.

use crate::error::{CompileError, CompileResult};

/// Kinds of tokens recognised by the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
  Punctuator,
  Ident,
  Num,
  Eof,
}

/// Thin wrapper for lexical information needed by later stages.
#[derive(Debug, Clone)]
pub struct Token {
  pub kind: TokenKind,
  pub value: Option<i64>,
  pub loc: usize,
  pub len: usize,
}

impl Token {
  /// Convenience constructor to keep the `tokenize` loop readable.
  pub fn new(kind: TokenKind, loc: usize, len: usize, value: Option<i64>) -> Self {
    Self {
      kind,
      value,
      loc,
      len,
    }
  }
}

/// Reserved words. They lex like identifiers but are emitted as
/// punctuators so the parser can never mistake them for variables.
const KEYWORDS: [&str; 1] = ["return"];

/// Lex the input into a flat vector of tokens terminated by an `Eof` marker.
///
/// Note that `>` and `>=` are deliberately not recognised even though the
/// parser's relational level can represent them; an input containing them
/// fails here.
pub fn tokenize(input: &str) -> CompileResult<Vec<Token>> {
  let mut tokens = Vec::new();
  let bytes = input.as_bytes();
  let mut i = 0;

  while i < bytes.len() {
    let c = bytes[i];
    if c.is_ascii_whitespace() {
      i += 1;
      continue;
    }

    if c.is_ascii_digit() {
      let start = i;
      i += 1;
      while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
      }
      let text = &input[start..i];
      let value = text
        .parse::<i64>()
        .map_err(|err| CompileError::lex_at(input, start, format!("invalid number: {err}")))?;
      tokens.push(Token::new(TokenKind::Num, start, i - start, Some(value)));
      continue;
    }

    if c.is_ascii_lowercase() {
      let start = i;
      i += 1;
      while i < bytes.len() && bytes[i].is_ascii_lowercase() {
        i += 1;
      }
      let kind = if KEYWORDS.contains(&&input[start..i]) {
        TokenKind::Punctuator
      } else {
        TokenKind::Ident
      };
      tokens.push(Token::new(kind, start, i - start, None));
      continue;
    }

    if let Some(op) = ["==", "!=", "<="]
      .into_iter()
      .find(|op| input[i..].starts_with(op))
    {
      tokens.push(Token::new(TokenKind::Punctuator, i, op.len(), None));
      i += op.len();
      continue;
    }

    if matches!(
      c,
      b'+' | b'-' | b'*' | b'/' | b'(' | b')' | b'<' | b'=' | b';'
    ) {
      tokens.push(Token::new(TokenKind::Punctuator, i, 1, None));
      i += 1;
      continue;
    }

    let invalid_char = input[i..].chars().next().unwrap_or('\0');
    return Err(CompileError::lex_at(
      input,
      i,
      format!("invalid token: '{invalid_char}'"),
    ));
  }

  tokens.push(Token::new(TokenKind::Eof, input.len(), 0, None));
  Ok(tokens)
}

/// Return the slice from the source that produced this token.
pub fn token_text<'a>(token: &Token, source: &'a str) -> &'a str {
  let end = token.loc + token.len;
  &source[token.loc..end]
}

/// Human-friendly description used in diagnostics.
pub fn describe_token(token: Option<&Token>, source: &str) -> String {
  match token {
    Some(t) => match t.kind {
      TokenKind::Eof => "EOF".to_string(),
      _ => token_text(t, source).to_string(),
    },
    None => "EOF".to_string(),
  }
}

#[cfg(test)]
mod specs {
  use super::*;
  use crate::error::ErrorKind;

  fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
    tokens.iter().map(|token| token.kind).collect()
  }

  #[test]
  fn worked_example_token_stream() {
    let source = "1+2*3;";
    let tokens = tokenize(source).unwrap();
    assert_eq!(
      kinds(&tokens),
      vec![
        TokenKind::Num,
        TokenKind::Punctuator,
        TokenKind::Num,
        TokenKind::Punctuator,
        TokenKind::Num,
        TokenKind::Punctuator,
        TokenKind::Eof,
      ]
    );
    assert_eq!(tokens[0].value, Some(1));
    assert_eq!(tokens[2].value, Some(2));
    assert_eq!(tokens[4].value, Some(3));
    assert_eq!(token_text(&tokens[1], source), "+");
    assert_eq!(token_text(&tokens[3], source), "*");
    assert_eq!(token_text(&tokens[5], source), ";");
  }

  #[test]
  fn whitespace_is_skipped_but_positions_are_kept() {
    let source = "  12 \t+ 3 ";
    let tokens = tokenize(source).unwrap();
    assert_eq!(tokens[0].loc, 2);
    assert_eq!(tokens[0].len, 2);
    assert_eq!(tokens[1].loc, 6);
    assert_eq!(tokens[2].loc, 8);
    assert_eq!(tokens[3].kind, TokenKind::Eof);
    assert_eq!(tokens[3].loc, source.len());
  }

  #[test]
  fn two_char_punctuators_take_priority() {
    let source = "1<=2==3!=4";
    let tokens = tokenize(source).unwrap();
    assert_eq!(token_text(&tokens[1], source), "<=");
    assert_eq!(token_text(&tokens[3], source), "==");
    assert_eq!(token_text(&tokens[5], source), "!=");
    assert_eq!(tokens[1].len, 2);
  }

  #[test]
  fn lone_less_than_is_a_single_char_token() {
    let source = "1<2";
    let tokens = tokenize(source).unwrap();
    assert_eq!(token_text(&tokens[1], source), "<");
    assert_eq!(tokens[1].len, 1);
  }

  #[test]
  fn identifiers_are_maximal_lowercase_runs() {
    let source = "foo = barbaz;";
    let tokens = tokenize(source).unwrap();
    assert_eq!(tokens[0].kind, TokenKind::Ident);
    assert_eq!(token_text(&tokens[0], source), "foo");
    assert_eq!((tokens[0].loc, tokens[0].len), (0, 3));
    assert_eq!(tokens[2].kind, TokenKind::Ident);
    assert_eq!(token_text(&tokens[2], source), "barbaz");
    assert_eq!((tokens[2].loc, tokens[2].len), (6, 6));
  }

  #[test]
  fn return_lexes_as_a_reserved_punctuator() {
    let source = "return x;";
    let tokens = tokenize(source).unwrap();
    assert_eq!(tokens[0].kind, TokenKind::Punctuator);
    assert_eq!(token_text(&tokens[0], source), "return");
    assert_eq!(tokens[1].kind, TokenKind::Ident);
  }

  #[test]
  fn keyword_prefix_stays_an_identifier() {
    let source = "returnx;";
    let tokens = tokenize(source).unwrap();
    assert_eq!(tokens[0].kind, TokenKind::Ident);
    assert_eq!(token_text(&tokens[0], source), "returnx");
  }

  #[test]
  fn greater_than_is_not_recognised() {
    let err = tokenize("1>2").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Lex);
    assert_eq!(err.loc(), Some(1));
  }

  #[test]
  fn unknown_byte_reports_its_column() {
    let err = tokenize("12 @ 3").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Lex);
    assert_eq!(err.loc(), Some(3));
    assert!(err.to_string().contains("invalid token: '@'"));
  }

  #[test]
  fn uppercase_letters_are_rejected() {
    let err = tokenize("A").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Lex);
    assert_eq!(err.loc(), Some(0));
  }

  #[test]
  fn empty_input_lexes_to_a_lone_eof() {
    let tokens = tokenize("").unwrap();
    assert_eq!(kinds(&tokens), vec![TokenKind::Eof]);
    assert_eq!(tokens[0].loc, 0);
  }
}
