//! End-to-end translation tests: source lines in, instruction lines out.

use armlet::registers::POOL_SIZE;
use armlet::{CompileError, Translator, generate_assembly};

fn translate_lines(lines: &[&str]) -> Translator {
  let mut translator = Translator::new();
  for line in lines {
    if let Err(err) = translator.translate_line(line) {
      panic!("'{line}' failed to translate: {err}");
    }
  }
  translator
}

fn bindings(translator: &Translator) -> Vec<(String, String)> {
  translator
    .bindings()
    .map(|(name, reg)| (name.to_string(), reg.to_string()))
    .collect()
}

#[test]
fn move_immediate_binds_a_register() {
  let t = translate_lines(&["x = 5"]);
  assert_eq!(t.instructions(), ["MOV r0, #5"]);
  assert_eq!(bindings(&t), [("x".to_string(), "r0".to_string())]);
}

#[test]
fn negative_immediates_encode_within_range() {
  let t = translate_lines(&["x = -255"]);
  assert_eq!(t.instructions(), ["MOV r0, #-255"]);
}

#[test]
fn out_of_range_immediate_is_rejected_without_emission() {
  for line in ["x = 256", "x = -256"] {
    let mut t = Translator::new();
    let err = t.translate_line(line).unwrap_err();
    assert!(
      matches!(err, CompileError::IntegerRange { .. }),
      "{line}: {err}"
    );
    assert!(t.instructions().is_empty());
    assert_eq!(t.bindings().count(), 0);
  }
}

#[test]
fn addition_binds_the_result_register() {
  let t = translate_lines(&["a = 1", "b = 2", "c = a + b"]);
  assert_eq!(
    t.instructions(),
    ["MOV r0, #1", "MOV r1, #2", "ADD r2, r0, r1"]
  );
  assert_eq!(
    bindings(&t),
    [
      ("a".to_string(), "r0".to_string()),
      ("b".to_string(), "r1".to_string()),
      ("c".to_string(), "r2".to_string()),
    ]
  );
}

#[test]
fn ternary_lowers_to_compare_and_conditional_moves() {
  let t = translate_lines(&["a = 1", "b = 2", "x = a < b ? 10 : 20"]);
  assert_eq!(
    t.instructions(),
    [
      "MOV r0, #1",
      "MOV r1, #2",
      "CMP r0, r1",
      "MOVLT r2, #10",
      "MOVGE r2, #20",
    ]
  );
}

#[test]
fn if_then_else_selects_greater_than_mnemonics() {
  let t = translate_lines(&["a = 1", "b = 2", "if a > b then x = 1 else y = 2"]);
  assert_eq!(
    t.instructions(),
    [
      "MOV r0, #1",
      "MOV r1, #2",
      "CMP r0, r1",
      "MOVGT r2, #1",
      "MOVLE r3, #2",
    ]
  );
  assert_eq!(
    bindings(&t)[2..],
    [
      ("x".to_string(), "r2".to_string()),
      ("y".to_string(), "r3".to_string()),
    ]
  );
}

#[test]
fn statement_arms_target_their_own_names() {
  let t = translate_lines(&["a = 1", "b = 2", "a < b ? x = 1 : x = 2"]);
  assert_eq!(
    t.instructions()[2..],
    ["CMP r0, r1", "MOVLT r2, #1", "MOVGE r2, #2"]
  );
}

#[test]
fn condition_operands_may_be_expressions() {
  let t = translate_lines(&[
    "a = 1",
    "b = 2",
    "if a + 1 < b * 2 then x = 1 else x = 2",
  ]);
  assert_eq!(
    t.instructions()[2..],
    [
      "ADD r2, r0, #1",
      "MUL r3, r1, #2",
      "CMP r2, r3",
      "MOVLT r2, #1",
      "MOVGE r2, #2",
    ]
  );
}

#[test]
fn division_and_remainder_share_the_divide_sequence() {
  let t = translate_lines(&["a = 4", "b = 2", "c = a / b", "d = a % b"]);
  assert_eq!(
    t.instructions()[2..],
    ["SDIV r2, r0, r1", "SDIV r3, r0, r1", "MLS r3, r3, r1, r0"]
  );
}

#[test]
fn divisor_immediates_materialize_into_a_register() {
  let t = translate_lines(&["a = 7", "x = a % 3"]);
  assert_eq!(
    t.instructions(),
    [
      "MOV r0, #7",
      "MOV r1, #3",
      "SDIV r2, r0, r1",
      "MLS r2, r2, r1, r0",
    ]
  );
}

#[test]
fn reassigning_an_immediate_reuses_the_register() {
  let t = translate_lines(&["a = 1", "a = 2"]);
  assert_eq!(t.instructions(), ["MOV r0, #1", "MOV r0, #2"]);
  assert_eq!(bindings(&t), [("a".to_string(), "r0".to_string())]);
}

#[test]
fn assigning_a_name_aliases_its_register() {
  let t = translate_lines(&["a = 1", "x = a"]);
  assert_eq!(t.instructions(), ["MOV r0, #1"]);
  assert_eq!(
    bindings(&t),
    [
      ("a".to_string(), "r0".to_string()),
      ("x".to_string(), "r0".to_string()),
    ]
  );
}

#[test]
fn undefined_names_fail_without_allocation_or_emission() {
  let mut t = Translator::new();
  let err = t.translate_line("x = y + 1").unwrap_err();
  assert!(matches!(err, CompileError::UndefinedName { ref name } if name == "y"));
  assert!(t.instructions().is_empty());
  assert_eq!(t.bindings().count(), 0);
}

#[test]
fn literal_zero_divisor_is_a_translation_error() {
  for line in ["x = a / 0", "x = a % 0"] {
    let mut t = Translator::new();
    t.translate_line("a = 1").unwrap();
    let err = t.translate_line(line).unwrap_err();
    assert!(matches!(err, CompileError::DivideByZero), "{line}: {err}");
  }
}

#[test]
fn binding_more_names_than_registers_exhausts_the_pool() {
  let mut t = Translator::new();
  for i in 0..POOL_SIZE {
    t.translate_line(&format!("v{i} = 1")).unwrap();
  }
  let err = t.translate_line("overflow = 1").unwrap_err();
  assert!(matches!(err, CompileError::ResourceExhausted));
}

#[test]
fn comparison_outside_a_conditional_is_rejected() {
  let mut t = Translator::new();
  t.translate_line("a = 1").unwrap();
  t.translate_line("b = 2").unwrap();
  let err = t.translate_line("x = a < b").unwrap_err();
  assert!(matches!(err, CompileError::Unsupported { .. }));
}

#[test]
fn nested_conditionals_are_rejected() {
  let mut t = Translator::new();
  t.translate_line("a = 1").unwrap();
  t.translate_line("b = 2").unwrap();
  let err = t
    .translate_line("a < b ? x = 1 : b > a ? y = 1 : y = 2")
    .unwrap_err();
  assert!(matches!(err, CompileError::Unsupported { .. }));
}

#[test]
fn conditional_arms_must_assign_immediates() {
  let mut t = Translator::new();
  t.translate_line("a = 1").unwrap();
  t.translate_line("b = 2").unwrap();
  let err = t.translate_line("a < b ? x = a : x = 2").unwrap_err();
  assert!(matches!(err, CompileError::Unsupported { .. }));
}

#[test]
fn condition_must_be_a_comparison() {
  let mut t = Translator::new();
  t.translate_line("a = 1").unwrap();
  let err = t.translate_line("a ? x = 1 : x = 2").unwrap_err();
  assert!(matches!(err, CompileError::Unsupported { .. }));
}

#[test]
fn unrecognized_characters_are_lexical_errors() {
  let err = Translator::new().translate_line("x = 5 $").unwrap_err();
  assert!(matches!(err, CompileError::Lexical { .. }));
  let rendered = err.to_string();
  assert!(rendered.contains('^'), "{rendered}");
  assert!(rendered.contains("unrecognized character"), "{rendered}");
}

#[test]
fn trailing_tokens_are_syntax_errors() {
  let err = Translator::new().translate_line("x = 1 y").unwrap_err();
  assert!(matches!(err, CompileError::Syntax { .. }));
}

#[test]
fn a_line_must_start_with_a_statement_form() {
  let err = Translator::new().translate_line("= 5").unwrap_err();
  assert!(matches!(err, CompileError::Syntax { .. }));
}

#[test]
fn immediate_right_operands_encode_inline() {
  let t = translate_lines(&["a = 1", "x = a + 5"]);
  assert_eq!(t.instructions(), ["MOV r0, #1", "ADD r1, r0, #5"]);
  assert_eq!(bindings(&t)[1], ("x".to_string(), "r1".to_string()));
}

#[test]
fn immediate_left_operands_materialize_first() {
  let t = translate_lines(&["a = 1", "x = 5 - a"]);
  assert_eq!(
    t.instructions(),
    ["MOV r0, #1", "MOV r1, #5", "SUB r2, r1, r0"]
  );
}

#[test]
fn parenthesized_temporaries_are_recycled() {
  let t = translate_lines(&["x = (1 + 2) * 3"]);
  assert_eq!(
    t.instructions(),
    ["MOV r0, #1", "ADD r1, r0, #2", "MUL r0, r1, #3"]
  );
  assert_eq!(bindings(&t), [("x".to_string(), "r0".to_string())]);
}

#[test]
fn released_temporaries_are_reused_by_later_statements() {
  let t = translate_lines(&["a = 1", "b = 2", "c = a + b + a", "d = 3"]);
  assert_eq!(
    t.instructions()[2..],
    ["ADD r2, r0, r1", "ADD r3, r2, r0", "MOV r2, #3"]
  );
}

#[test]
fn expression_reassignment_rebinds_and_frees_the_old_register() {
  let t = translate_lines(&["a = 1", "b = 2", "a = a + b", "c = 3"]);
  assert_eq!(t.instructions()[2..], ["ADD r2, r0, r1", "MOV r0, #3"]);
  assert_eq!(
    bindings(&t),
    [
      ("a".to_string(), "r2".to_string()),
      ("b".to_string(), "r1".to_string()),
      ("c".to_string(), "r0".to_string()),
    ]
  );
}

#[test]
fn aliased_registers_survive_rebinding_one_name() {
  let t = translate_lines(&["a = 1", "x = a", "a = a + 1", "c = 2"]);
  assert_eq!(t.instructions()[1..], ["ADD r1, r0, #1", "MOV r2, #2"]);
  assert_eq!(
    bindings(&t),
    [
      ("a".to_string(), "r1".to_string()),
      ("x".to_string(), "r0".to_string()),
      ("c".to_string(), "r2".to_string()),
    ]
  );
}

#[test]
fn a_minus_glued_to_a_digit_lexes_as_a_negative_literal() {
  let mut t = Translator::new();
  t.translate_line("a = 1").unwrap();
  // `a -1` is NAME NUMBER(-1), not a subtraction
  let err = t.translate_line("x = a -1").unwrap_err();
  assert!(matches!(err, CompileError::Syntax { .. }));
  t.translate_line("x = a - 1").unwrap();
  assert_eq!(t.instructions()[1], "SUB r1, r0, #1");
}

#[test]
fn identifiers_sharing_a_keyword_prefix_are_names() {
  let t = translate_lines(&["iffy = 1", "theneed = iffy + 1"]);
  assert_eq!(t.instructions(), ["MOV r0, #1", "ADD r1, r0, #1"]);
}

#[test]
fn generate_assembly_produces_a_tab_indented_listing() {
  let listing = generate_assembly("a = 1\n\nb = a + 1\n").unwrap();
  assert_eq!(listing, "\tMOV r0, #1\n\tADD r1, r0, #1\n");
}

#[test]
fn conditional_program_end_to_end() {
  let listing = generate_assembly("a = 3\nb = 4\nm = a > b ? 1 : 0\n").unwrap();
  assert_eq!(
    listing,
    "\tMOV r0, #3\n\tMOV r1, #4\n\tCMP r0, r1\n\tMOVGT r2, #1\n\tMOVLE r2, #0\n"
  );
}
