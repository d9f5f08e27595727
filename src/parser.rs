//! Recursive-descent parser producing one statement tree per source line.
//!
//! The parser mirrors the classic chibicc structure: a precedence-climbing
//! set of expression helpers under a thin statement layer. The grammar is
//! deliberately flat – a line is a plain assignment, a ternary or
//! if-then-else conditional whose arms are statements, or the sugared form
//! `x = cond ? v1 : v2` which parses to a conditional with two assignments
//! to the same name. Precedence climbs from relational through additive to
//! multiplicative, all left-associative.

use crate::error::{CompileError, CompileResult};
use crate::tokenizer::{Token, TokenKind, describe_token, token_text};

/// Binary operators recognised by the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
  Add,
  Sub,
  Mul,
  Div,
  Rem,
  Lt,
  Gt,
}

impl BinaryOp {
  /// True for the comparison operators that feed conditional assignment.
  pub fn is_comparison(self) -> bool {
    matches!(self, Self::Lt | Self::Gt)
  }
}

/// Expression tree produced by the parser.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
  Num {
    value: i64,
  },
  Var {
    name: String,
  },
  Binary {
    op: BinaryOp,
    lhs: Box<Expr>,
    rhs: Box<Expr>,
  },
}

impl Expr {
  pub fn number(value: i64) -> Self {
    Self::Num { value }
  }

  pub fn var(name: impl Into<String>) -> Self {
    Self::Var { name: name.into() }
  }

  pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
    Self::Binary {
      op,
      lhs: Box::new(lhs),
      rhs: Box::new(rhs),
    }
  }
}

/// One statement – exactly one source line.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
  Assign {
    name: String,
    value: Expr,
  },
  Conditional {
    condition: Expr,
    then_branch: Box<Stmt>,
    else_branch: Box<Stmt>,
  },
}

impl Stmt {
  pub fn assign(name: impl Into<String>, value: Expr) -> Self {
    Self::Assign {
      name: name.into(),
      value,
    }
  }

  pub fn conditional(condition: Expr, then_branch: Stmt, else_branch: Stmt) -> Self {
    Self::Conditional {
      condition,
      then_branch: Box::new(then_branch),
      else_branch: Box::new(else_branch),
    }
  }
}

/// Parse one line's tokens into a statement.
pub fn parse(tokens: Vec<Token>, source: &str) -> CompileResult<Stmt> {
  let mut stream = TokenStream::new(tokens, source);

  if stream.is_eof() {
    return Err(CompileError::syntax_at(source, 0, "statement is empty"));
  }

  let stmt = parse_stmt(&mut stream)?;

  if !stream.is_eof() {
    let (loc, got) = stream.describe_current();
    return Err(CompileError::syntax_at(
      source,
      loc,
      format!("unexpected token \"{got}\" after statement"),
    ));
  }

  Ok(stmt)
}

fn parse_stmt(stream: &mut TokenStream) -> CompileResult<Stmt> {
  // if expr then stmt else stmt
  if stream.equal_keyword("if") {
    let condition = parse_expr(stream)?;
    stream.skip_keyword("then")?;
    let then_branch = parse_stmt(stream)?;
    stream.skip_keyword("else")?;
    let else_branch = parse_stmt(stream)?;
    return Ok(Stmt::conditional(condition, then_branch, else_branch));
  }

  // NAME = expr, optionally sugared into NAME = expr ? expr : expr
  if stream.peek_is_assignment() {
    let name = stream.get_ident()?;
    stream.skip("=")?;
    let value = parse_expr(stream)?;

    if stream.equal("?") {
      let then_value = parse_expr(stream)?;
      stream.skip(":")?;
      let else_value = parse_expr(stream)?;
      return Ok(Stmt::conditional(
        value,
        Stmt::assign(name.clone(), then_value),
        Stmt::assign(name, else_value),
      ));
    }

    return Ok(Stmt::assign(name, value));
  }

  // expr ? stmt : stmt
  let condition = parse_expr(stream)?;
  stream.skip("?")?;
  let then_branch = parse_stmt(stream)?;
  stream.skip(":")?;
  let else_branch = parse_stmt(stream)?;
  Ok(Stmt::conditional(condition, then_branch, else_branch))
}

fn parse_expr(stream: &mut TokenStream) -> CompileResult<Expr> {
  parse_relational(stream)
}

fn parse_relational(stream: &mut TokenStream) -> CompileResult<Expr> {
  let mut node = parse_add(stream)?;

  loop {
    let op_str = match stream
      .peek()
      .filter(|token| token.kind == TokenKind::Punctuator)
      .map(|token| token_text(token, stream.source))
    {
      Some(symbol @ "<") => symbol,
      Some(symbol @ ">") => symbol,
      _ => break,
    };

    let op = match op_str {
      "<" => BinaryOp::Lt,
      ">" => BinaryOp::Gt,
      _ => unreachable!(),
    };

    stream.skip(op_str)?;
    let rhs = parse_add(stream)?;
    node = Expr::binary(op, node, rhs);
  }

  Ok(node)
}

fn parse_add(stream: &mut TokenStream) -> CompileResult<Expr> {
  let mut node = parse_mul(stream)?;

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
    let rhs = parse_mul(stream)?;
    node = Expr::binary(op, node, rhs);
  }

  Ok(node)
}

fn parse_mul(stream: &mut TokenStream) -> CompileResult<Expr> {
  let mut node = parse_primary(stream)?;

  loop {
    let op_str = match stream
      .peek()
      .filter(|token| token.kind == TokenKind::Punctuator)
      .map(|token| token_text(token, stream.source))
    {
      Some(symbol @ "*") => symbol,
      Some(symbol @ "/") => symbol,
      Some(symbol @ "%") => symbol,
      _ => break,
    };

    let op = match op_str {
      "*" => BinaryOp::Mul,
      "/" => BinaryOp::Div,
      "%" => BinaryOp::Rem,
      _ => unreachable!(),
    };

    stream.skip(op_str)?;
    let rhs = parse_primary(stream)?;
    node = Expr::binary(op, node, rhs);
  }

  Ok(node)
}

fn parse_primary(stream: &mut TokenStream) -> CompileResult<Expr> {
  if stream.equal("(") {
    let node = parse_expr(stream)?;
    stream.skip(")")?;
    return Ok(node);
  }

  if matches!(
    stream.peek().map(|token| token.kind),
    Some(TokenKind::Ident)
  ) {
    let name = stream.get_ident()?;
    return Ok(Expr::var(name));
  }

  let value = stream.get_number()?;
  Ok(Expr::number(value))
}

/// Lightweight cursor over one line's tokens.
struct TokenStream<'a> {
  tokens: Vec<Token>,
  source: &'a str,
  pos: usize,
}

impl<'a> TokenStream<'a> {
  /// Take ownership of the token stream; the parser advances `pos` as it
  /// consumes input.
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

  fn describe_current(&self) -> (usize, String) {
    match self.peek() {
      Some(token) => (token.loc, describe_token(Some(token), self.source)),
      None => (self.source.len(), "EOF".to_string()),
    }
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

  /// Consume the current token if it is the given keyword.
  fn equal_keyword(&mut self, word: &str) -> bool {
    if let Some(token) = self.peek()
      && token.kind == TokenKind::Keyword
      && token_text(token, self.source) == word
    {
      self.pos += 1;
      return true;
    }
    false
  }

  fn skip(&mut self, s: &str) -> CompileResult<()> {
    if self.equal(s) {
      return Ok(());
    }
    let (loc, got) = self.describe_current();
    Err(CompileError::syntax_at(
      self.source,
      loc,
      format!("expected \"{s}\", but got \"{got}\""),
    ))
  }

  fn skip_keyword(&mut self, word: &str) -> CompileResult<()> {
    if self.equal_keyword(word) {
      return Ok(());
    }
    let (loc, got) = self.describe_current();
    Err(CompileError::syntax_at(
      self.source,
      loc,
      format!("expected \"{word}\", but got \"{got}\""),
    ))
  }

  /// Parse the current token as an integer literal.
  fn get_number(&mut self) -> CompileResult<i64> {
    if let Some(token) = self.peek()
      && token.kind == TokenKind::Num
    {
      let loc = token.loc;
      let value = token.value.ok_or_else(|| {
        CompileError::syntax_at(
          self.source,
          loc,
          "internal error: numeric token missing value",
        )
      })?;
      self.pos += 1;
      return Ok(value);
    }
    let (loc, got) = self.describe_current();
    Err(CompileError::syntax_at(
      self.source,
      loc,
      format!("expected an expression, but got \"{got}\""),
    ))
  }

  /// Parse the current token as an identifier, returning its text.
  fn get_ident(&mut self) -> CompileResult<String> {
    if let Some(token) = self.peek()
      && token.kind == TokenKind::Ident
    {
      let name = token_text(token, self.source).to_string();
      self.pos += 1;
      return Ok(name);
    }
    let (loc, got) = self.describe_current();
    Err(CompileError::syntax_at(
      self.source,
      loc,
      format!("expected an identifier, but got \"{got}\""),
    ))
  }

  /// True when the line starts an assignment: a name followed by `=`.
  fn peek_is_assignment(&self) -> bool {
    let Some(token) = self.peek() else {
      return false;
    };
    if token.kind != TokenKind::Ident {
      return false;
    }
    matches!(
      self.tokens.get(self.pos + 1),
      Some(next)
        if next.kind == TokenKind::Punctuator && token_text(next, self.source) == "="
    )
  }

  fn is_eof(&self) -> bool {
    matches!(self.peek().map(|token| token.kind), Some(TokenKind::Eof))
  }
}
