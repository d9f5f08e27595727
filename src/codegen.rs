//! Lowering: walk the parsed statement tree and emit register-machine
//! instructions.
//!
//! The `Translator` owns all run-wide state – the register pool, the symbol
//! table and the instruction buffer – so two runs never share anything.
//! Variables keep their registers for the life of the run; expression
//! temporaries are reserved while a sub-expression is in flight and
//! released as soon as the parent consumes their value. A two-armed
//! conditional lowers to one compare followed by one conditional move per
//! arm, so both arms select branchlessly against the same comparison.

use crate::error::{CompileError, CompileResult};
use crate::parser::{self, BinaryOp, Expr, Stmt};
use crate::registers::{Register, RegisterPool};
use crate::symbols::SymbolTable;
use crate::tokenizer;

/// Largest magnitude the target encodes in a move-immediate.
pub const IMMEDIATE_LIMIT: i64 = 255;

/// A lowered operand: a register holding the value, or an immediate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operand {
  Reg(Register),
  Imm(i64),
}

impl Operand {
  /// Render as an instruction operand; immediates use the `#` prefix.
  fn text(self) -> String {
    match self {
      Self::Reg(reg) => reg.to_string(),
      Self::Imm(value) => format!("#{value}"),
    }
  }
}

/// Which arm of a conditional is being emitted.
#[derive(Clone, Copy)]
enum Arm {
  Then,
  Else,
}

/// Conditional-move mnemonic for one arm of a comparison.
fn arm_mnemonic(op: BinaryOp, arm: Arm) -> &'static str {
  match (op, arm) {
    (BinaryOp::Lt, Arm::Then) => "MOVLT",
    (BinaryOp::Lt, Arm::Else) => "MOVGE",
    (BinaryOp::Gt, Arm::Then) => "MOVGT",
    (BinaryOp::Gt, Arm::Else) => "MOVLE",
    _ => unreachable!("comparison checked before arm emission"),
  }
}

/// Translation context carried across every statement of a run.
#[derive(Debug, Default)]
pub struct Translator {
  pool: RegisterPool,
  symbols: SymbolTable,
  buffer: Vec<String>,
}

impl Translator {
  pub fn new() -> Self {
    Self::default()
  }

  /// Translate one source line – one complete statement.
  pub fn translate_line(&mut self, line: &str) -> CompileResult<()> {
    let tokens = tokenizer::tokenize(line)?;
    let stmt = parser::parse(tokens, line)?;
    self.lower_stmt(&stmt)?;
    debug_assert!(
      !self.pool.has_reservations(),
      "transient register leaked past end of statement"
    );
    Ok(())
  }

  /// Emitted instructions, in program order.
  pub fn instructions(&self) -> &[String] {
    &self.buffer
  }

  /// Serialize the buffer: one instruction per line, tab-indented.
  pub fn listing(&self) -> String {
    let mut out = String::new();
    for instruction in &self.buffer {
      out.push('\t');
      out.push_str(instruction);
      out.push('\n');
    }
    out
  }

  /// Name → register bindings in first-assignment order.
  pub fn bindings(&self) -> impl Iterator<Item = (&str, Register)> {
    self.symbols.iter()
  }

  fn emit(&mut self, instruction: String) {
    self.buffer.push(instruction);
  }

  fn lower_stmt(&mut self, stmt: &Stmt) -> CompileResult<()> {
    match stmt {
      Stmt::Assign { name, value } => self.lower_assign(name, value),
      Stmt::Conditional {
        condition,
        then_branch,
        else_branch,
      } => self.lower_conditional(condition, then_branch, else_branch),
    }
  }

  /// `name = value`: move-immediate into the name's register, or alias the
  /// name onto an already-computed result register.
  fn lower_assign(&mut self, name: &str, value: &Expr) -> CompileResult<()> {
    match self.lower_expr(value)? {
      Operand::Imm(value) => {
        check_immediate(value)?;
        let reg = self.register_for(name)?;
        self.emit(format!("MOV {reg}, #{value}"));
      }
      Operand::Reg(reg) => {
        if self.pool.is_transient(reg) {
          self.pool.release(reg);
        }
        let previous = self.symbols.bind(name, reg);
        self.pool.bind(reg);
        if let Some(old) = previous {
          self.pool.unbind(old);
        }
      }
    }
    Ok(())
  }

  /// Lower a two-armed conditional into a compare followed by one
  /// conditional move per arm. The condition must be a single `<` or `>`
  /// comparison and each arm a plain assignment of an immediate.
  fn lower_conditional(
    &mut self,
    condition: &Expr,
    then_branch: &Stmt,
    else_branch: &Stmt,
  ) -> CompileResult<()> {
    let Expr::Binary { op, lhs, rhs } = condition else {
      return Err(unsupported("condition must be a comparison"));
    };
    if !op.is_comparison() {
      return Err(unsupported("condition must be a comparison"));
    }

    let left = self.lower_expr(lhs)?;
    let left = self.force_register(left)?;
    let right = self.lower_expr(rhs)?;
    if let Operand::Imm(value) = right {
      check_immediate(value)?;
    }
    self.emit(format!("CMP {left}, {}", right.text()));
    self.release(Operand::Reg(left));
    self.release(right);

    self.lower_arm(then_branch, arm_mnemonic(*op, Arm::Then))?;
    self.lower_arm(else_branch, arm_mnemonic(*op, Arm::Else))
  }

  /// One arm of a conditional: a plain assignment of an immediate, emitted
  /// as a conditional move against the comparison just issued.
  fn lower_arm(&mut self, arm: &Stmt, mnemonic: &str) -> CompileResult<()> {
    let Stmt::Assign { name, value } = arm else {
      return Err(unsupported("nested conditionals are not supported"));
    };
    let Expr::Num { value } = value else {
      return Err(unsupported("conditional arm must assign an immediate value"));
    };
    check_immediate(*value)?;
    let reg = self.register_for(name)?;
    self.emit(format!("{mnemonic} {reg}, #{value}"));
    Ok(())
  }

  /// Reduce an expression to an operand, emitting instructions for any
  /// arithmetic along the way.
  fn lower_expr(&mut self, expr: &Expr) -> CompileResult<Operand> {
    match expr {
      Expr::Num { value } => Ok(Operand::Imm(*value)),
      Expr::Var { name } => match self.symbols.lookup(name) {
        Some(reg) => Ok(Operand::Reg(reg)),
        None => Err(CompileError::UndefinedName { name: name.clone() }),
      },
      Expr::Binary { op, lhs, rhs } => {
        if op.is_comparison() {
          return Err(unsupported(
            "a comparison has no value outside a conditional",
          ));
        }
        self.lower_binary(*op, lhs, rhs)
      }
    }
  }

  /// `dest = lhs OP rhs` for the arithmetic operators. The left operand
  /// always lives in a register; the right operand may be encoded as an
  /// immediate except for division, which has no immediate form.
  fn lower_binary(&mut self, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> CompileResult<Operand> {
    let left = self.lower_expr(lhs)?;
    let left = self.force_register(left)?;

    let right = self.lower_expr(rhs)?;
    if matches!(op, BinaryOp::Div | BinaryOp::Rem) && right == Operand::Imm(0) {
      return Err(CompileError::DivideByZero);
    }
    let right = match op {
      BinaryOp::Div | BinaryOp::Rem => Operand::Reg(self.force_register(right)?),
      _ => {
        if let Operand::Imm(value) = right {
          check_immediate(value)?;
        }
        right
      }
    };

    let dest = self.pool.allocate()?;
    self.pool.reserve(dest);

    match op {
      BinaryOp::Add => self.emit(format!("ADD {dest}, {left}, {}", right.text())),
      BinaryOp::Sub => self.emit(format!("SUB {dest}, {left}, {}", right.text())),
      BinaryOp::Mul => self.emit(format!("MUL {dest}, {left}, {}", right.text())),
      BinaryOp::Div => self.emit(format!("SDIV {dest}, {left}, {}", right.text())),
      BinaryOp::Rem => {
        // dest = left - dest * right, the truncating-division remainder
        self.emit(format!("SDIV {dest}, {left}, {}", right.text()));
        self.emit(format!("MLS {dest}, {dest}, {}, {left}", right.text()));
      }
      BinaryOp::Lt | BinaryOp::Gt => unreachable!("comparisons rejected before emission"),
    }

    self.release(Operand::Reg(left));
    self.release(right);

    Ok(Operand::Reg(dest))
  }

  /// The register bound to `name`, allocating and binding one if absent.
  fn register_for(&mut self, name: &str) -> CompileResult<Register> {
    if let Some(reg) = self.symbols.lookup(name) {
      return Ok(reg);
    }
    let reg = self.pool.allocate()?;
    self.symbols.bind(name, reg);
    self.pool.bind(reg);
    Ok(reg)
  }

  /// Materialize an operand into a register, emitting a move-immediate for
  /// literals. A freshly allocated register is transiently reserved.
  fn force_register(&mut self, operand: Operand) -> CompileResult<Register> {
    match operand {
      Operand::Reg(reg) => Ok(reg),
      Operand::Imm(value) => {
        check_immediate(value)?;
        let reg = self.pool.allocate()?;
        self.pool.reserve(reg);
        self.emit(format!("MOV {reg}, #{value}"));
        Ok(reg)
      }
    }
  }

  /// Release an operand's transient reservation once its value is consumed.
  fn release(&mut self, operand: Operand) {
    if let Operand::Reg(reg) = operand
      && self.pool.is_transient(reg)
    {
      self.pool.release(reg);
    }
  }
}

/// Enforce the move-immediate encoding range.
fn check_immediate(value: i64) -> CompileResult<()> {
  if value > IMMEDIATE_LIMIT || value < -IMMEDIATE_LIMIT {
    return Err(CompileError::IntegerRange { value });
  }
  Ok(())
}

fn unsupported(message: &str) -> CompileError {
  CompileError::Unsupported {
    message: message.to_string(),
  }
}
