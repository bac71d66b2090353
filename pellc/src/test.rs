use super::*;
use crate::ast::{Stmt, SourceLoc};
use crate::symtab::{Declared, IdKind};

use std::rc::Rc;

use pvm::{Instruction, Opcode};

macro_rules! instr {
    ($op:ident) => {
        Instruction::new(Opcode::$op, 0)
    };
    ($op:ident $m:expr) => {
        Instruction::new(Opcode::$op, $m)
    };
}

macro_rules! program {
    [$(($($x:tt)+)),* $(,)?] => {
        vec![$(instr!($($x)+)),*]
    };
}

fn compile_src(source: &str) -> Vec<Instruction> {
    compile("test.pell", source).unwrap()
}

fn compile_err(source: &str) -> Error {
    compile("test.pell", source).unwrap_err()
}

fn unparse_src(source: &str) -> String {
    let program = parse_program("test.pell", source).unwrap();
    let mut out = Vec::new();
    unparse_program(&mut out, &program).unwrap();
    String::from_utf8(out).unwrap()
}

fn test_loc() -> SourceLoc {
    SourceLoc {
        file: Rc::from("test.pell"),
        line: 1,
        column: 1,
    }
}

#[test]
fn constant_assignment() {
    let code = compile_src("var x; x := 3 .");
    let expected = program![(INC 3), (INC 1), (PBP), (LIT 3), (STO 3), (HLT)];
    assert_eq!(code, expected);
}

#[test]
fn constants_are_pushed_and_addressed_in_order() {
    let code = compile_src("const a = 1, b = 2; var x; write b .");
    let expected = program![
        (INC 3),
        (LIT 1),
        (LIT 2),
        (INC 1),
        (PBP),
        (LOD 4),
        (CHO),
        (HLT),
    ];
    assert_eq!(code, expected);
}

#[test]
fn if_statement_jump_arithmetic() {
    let code = compile_src("var x; if x = 0 then x := 1 else skip .");
    let expected = program![
        (INC 3),
        (INC 1),
        (PBP),
        (LOD 3),
        (LIT 0),
        (EQL),
        (JPC 2),
        (JMP 5),
        (PBP),
        (LIT 1),
        (STO 3),
        (JMP 2),
        (NOP),
        (HLT),
    ];
    assert_eq!(code, expected);
}

#[test]
fn while_statement_jump_arithmetic() {
    let code = compile_src("var n; while n > 0 do n := n - 1 .");
    let expected = program![
        (INC 3),
        (INC 1),
        (PBP),
        (LOD 3),
        (LIT 0),
        (GTR),
        (JPC 2),
        (JMP 8),
        (PBP),
        (PBP),
        (LOD 3),
        (LIT 1),
        (SUB),
        (STO 3),
        (JMP - 12),
        (HLT),
    ];
    assert_eq!(code, expected);
}

#[test]
fn odd_condition() {
    let code = compile_src("var x; if odd x then skip else skip .");
    let expected = program![
        (INC 3),
        (INC 1),
        (PBP),
        (LOD 3),
        (LIT 2),
        (MOD),
        (JPC 2),
        (JMP 3),
        (NOP),
        (JMP 2),
        (NOP),
        (HLT),
    ];
    assert_eq!(code, expected);
}

#[test]
fn begin_concatenates_in_source_order() {
    let code = compile_src("var a, b; begin a := 1; b := 2 end .");
    let expected = program![
        (INC 3),
        (INC 1),
        (INC 1),
        (PBP),
        (LIT 1),
        (STO 3),
        (PBP),
        (LIT 2),
        (STO 4),
        (HLT),
    ];
    assert_eq!(code, expected);
}

#[test]
fn read_and_write() {
    let code = compile_src("var c; begin read c; write c end .");
    let expected = program![
        (INC 3),
        (INC 1),
        (PBP),
        (CHI),
        (STO 3),
        (PBP),
        (LOD 3),
        (CHO),
        (HLT),
    ];
    assert_eq!(code, expected);
}

// Accessing the enclosing procedure's variable follows exactly one static
// link: PBP, one PSI, then the LOD.
#[test]
fn nested_procedure_static_link_access() {
    let code = compile_src("procedure p; var a; procedure q; write a; call q; call p .");
    let expected = program![
        (JMP 10),
        (PBP),
        (PSI),
        (LOD 3),
        (CHO),
        (RTN),
        (INC 1),
        (CAL 1),
        (INC - 1),
        (RTN),
        (INC 3),
        (CAL 6),
        (HLT),
    ];
    assert_eq!(code, expected);
}

// A recursive call is emitted before the procedure's address is known and
// back-patched through its label.
#[test]
fn recursive_call_is_back_patched() {
    let code = compile_src("procedure p; call p; call p .");
    let expected = program![(JMP 4), (CAL 1), (RTN), (INC 3), (CAL 1), (HLT)];
    assert_eq!(code, expected);
}

#[test]
fn shadowing_resolves_to_the_inner_declaration() {
    let code = compile_src("var x; procedure p; var x; x := 1; x := 2 .");
    let expected = program![
        (JMP 7),
        (INC 1),
        (PBP),
        (LIT 1),
        (STO 3),
        (INC - 1),
        (RTN),
        (INC 3),
        (INC 1),
        (PBP),
        (LIT 2),
        (STO 3),
        (HLT),
    ];
    assert_eq!(code, expected);
}

#[test]
fn negative_number_literal() {
    let code = compile_src("var x; x := -5 .");
    let expected = program![(INC 3), (INC 1), (PBP), (LIT - 5), (STO 3), (HLT)];
    assert_eq!(code, expected);
}

#[test]
fn scope_check_fills_resolved_uses() {
    let mut program = parse_program("test.pell", "var x; x := 3 .").unwrap();
    check_program(&mut program).unwrap();
    match &program.block.body {
        Stmt::Assign { target, .. } => {
            let id_use = target.id_use();
            assert_eq!(id_use.levels_outward, 0);
            assert_eq!(id_use.attrs.kind, IdKind::Variable { offset: 0 });
        }
        other => panic!("expected an assignment, got {:?}", other),
    }
}

#[test]
fn undeclared_identifier() {
    let err = compile_err("x := 1 .");
    assert_eq!(
        err.to_string(),
        "test.pell: line 1, column 1: identifier \"x\" is not declared"
    );
}

#[test]
fn duplicate_declaration_in_one_scope() {
    let err = compile_err("var x; var x; x := 1 .");
    let diagnostic = err.diagnostic();
    assert!(diagnostic.message.contains("already declared"));
    assert_eq!(diagnostic.loc.line, 1);
    assert_eq!(diagnostic.loc.column, 12);
}

#[test]
fn assigning_to_a_constant_is_rejected() {
    let err = compile_err("const c = 1; c := 2 .");
    assert!(err.diagnostic().message.contains("not a variable name"));
}

#[test]
fn assigning_to_a_procedure_is_rejected() {
    let err = compile_err("procedure p; skip; p := 1 .");
    assert!(err.diagnostic().message.contains("not a variable name"));
}

#[test]
fn reading_into_a_constant_is_rejected() {
    let err = compile_err("const c = 1; read c .");
    assert!(err.diagnostic().message.contains("not a variable name"));
}

#[test]
fn calling_a_variable_is_rejected() {
    let err = compile_err("var x; call x .");
    assert!(err.diagnostic().message.contains("not a procedure name"));
}

#[test]
fn procedure_in_an_expression_is_rejected() {
    let err = compile_err("procedure p; skip; write p .");
    assert!(err.diagnostic().message.contains("procedure name"));
}

// A procedure only becomes visible at its declaration, so an earlier
// sibling cannot call a later one.
#[test]
fn forward_sibling_call_is_rejected() {
    let err = compile_err("procedure p; call q; procedure q; skip; skip .");
    assert!(err.diagnostic().message.contains("not declared"));
}

#[test]
fn symtab_offsets_skip_procedures() {
    let mut symtab = SymTab::new();
    symtab.enter_scope();
    symtab
        .insert("a", test_loc(), Declared::Constant)
        .unwrap();
    symtab
        .insert("p", test_loc(), Declared::Procedure(Label::new()))
        .unwrap();
    symtab
        .insert("b", test_loc(), Declared::Variable)
        .unwrap();

    assert_eq!(symtab.next_offset(), 2);
    let a = symtab.lookup("a").unwrap();
    assert_eq!(a.attrs.kind, IdKind::Constant { offset: 0 });
    let b = symtab.lookup("b").unwrap();
    assert_eq!(b.attrs.kind, IdKind::Variable { offset: 1 });
}

#[test]
fn symtab_lookup_counts_levels_outward() {
    let mut symtab = SymTab::new();
    symtab.enter_scope();
    symtab
        .insert("x", test_loc(), Declared::Variable)
        .unwrap();
    symtab.enter_scope();
    symtab
        .insert("y", test_loc(), Declared::Variable)
        .unwrap();

    assert_eq!(symtab.lookup("y").unwrap().levels_outward, 0);
    assert_eq!(symtab.lookup("x").unwrap().levels_outward, 1);

    symtab.leave_scope();
    assert_eq!(symtab.lookup("x").unwrap().levels_outward, 0);
    assert!(symtab.lookup("y").is_none());
}

#[test]
fn label_set_then_read() {
    let label = Label::new();
    assert!(!label.is_set());
    label.set(17);
    assert!(label.is_set());
    assert_eq!(label.read(), 17);
}

#[test]
#[should_panic(expected = "internal error")]
fn label_cannot_be_set_twice() {
    let label = Label::new();
    label.set(1);
    label.set(2);
}

#[test]
#[should_panic(expected = "internal error")]
fn unset_label_cannot_be_read() {
    Label::new().read();
}

#[test]
fn operators_associate_to_the_left() {
    let text = unparse_src("var x; x := 1 - 2 - 3 .");
    assert_eq!(text, "var x;\nx := ((1 - 2) - 3)\n.\n");
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    let text = unparse_src("var x; x := 1 + 2 * 3 .");
    assert_eq!(text, "var x;\nx := (1 + (2 * 3))\n.\n");
}

#[test]
fn parentheses_override_precedence() {
    let text = unparse_src("var x; x := (1 + 2) * 3 .");
    assert_eq!(text, "var x;\nx := ((1 + 2) * 3)\n.\n");
}

#[test]
fn unparse_nested_procedures() {
    let text = unparse_src("procedure p; var a; procedure q; write a; call q; call p .");
    let expected = "\
procedure p;
  var a;
  procedure q;
    write a;
  call q;
call p
.
";
    assert_eq!(text, expected);
}

#[test]
fn unparse_is_idempotent() {
    let source = "
const max = 10;
var n, total;
procedure tally;
  total := total + n;
begin
  read n;
  while n > 0 do
    begin
      if odd n then call tally else skip;
      n := n - 1
    end
end.";
    let once = unparse_src(source);
    let twice = unparse_src(&once);
    assert_eq!(once, twice);
}

#[test]
fn keywords_do_not_swallow_identifier_prefixes() {
    let code = compile_src("var beginx; beginx := 1 .");
    let expected = program![(INC 3), (INC 1), (PBP), (LIT 1), (STO 3), (HLT)];
    assert_eq!(code, expected);
}

#[test]
fn comments_are_skipped() {
    let code = compile_src("var x; # a comment\nx := 3 .");
    let expected = program![(INC 3), (INC 1), (PBP), (LIT 3), (STO 3), (HLT)];
    assert_eq!(code, expected);
}

#[test]
fn number_too_large_is_a_lexical_error() {
    let err = compile_err("var x; x := 99999 .");
    match &err {
        Error::Lexical(diagnostic) => {
            assert!(diagnostic.message.contains("too large"), "{}", diagnostic);
        }
        other => panic!("expected a lexical error, got {:?}", other),
    }
}

#[test]
fn overlong_identifier_is_a_lexical_error() {
    let name = "a".repeat(256);
    let err = compile_err(&format!("var {}; {} := 1 .", name, name));
    match &err {
        Error::Lexical(diagnostic) => {
            assert!(diagnostic.message.contains("too long"), "{}", diagnostic);
        }
        other => panic!("expected a lexical error, got {:?}", other),
    }
}

#[test]
fn missing_expression_is_a_syntax_error() {
    let err = compile_err("var x; x := .");
    match &err {
        Error::Syntax(diagnostic) => {
            assert!(
                diagnostic.message.starts_with("syntax error"),
                "{}",
                diagnostic
            );
        }
        other => panic!("expected a syntax error, got {:?}", other),
    }
}

#[test]
fn negative_constant_definition_is_a_syntax_error() {
    let err = compile_err("const c = -1; var x; x := c .");
    match err {
        Error::Syntax(_) => {}
        other => panic!("expected a syntax error, got {:?}", other),
    }
}

#[test]
fn token_listing() {
    let tokens = tokens("test.pell", "x := 3 .").unwrap();
    let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Ident,
            TokenKind::Becomes,
            TokenKind::Number,
            TokenKind::Period,
            TokenKind::Eof,
        ]
    );
    assert_eq!(tokens[0].kind.number(), 21);
    assert_eq!(tokens[1].kind.number(), 6);
    assert_eq!(tokens[2].kind.number(), 22);
    assert_eq!(tokens[3].kind.number(), 0);
    assert_eq!(tokens[4].kind.number(), 33);

    let mut out = Vec::new();
    write_listing(&mut out, "test.pell", &tokens).unwrap();
    let expected = concat!(
        "Tokens from file test.pell\n",
        "Number Name       Line Column Text/Value\n",
        "21     Ident      1    1      \"x\"\n",
        "6      Becomes    1    3      \":=\"\n",
        "22     Number     1    6      3\n",
        "0      Period     1    8      \".\"\n",
        "33     Eof        1    9     \n",
    );
    assert_eq!(String::from_utf8(out).unwrap(), expected);
}

#[test]
fn minimal_program() {
    let code = compile_src("skip .");
    let expected = program![(INC 3), (NOP), (HLT)];
    assert_eq!(code, expected);
}

#[test]
fn access_two_levels_out_follows_two_static_links() {
    let code = compile_src("var g; procedure p; procedure q; g := 1; call q; call p .");
    let expected = program![
        (JMP 9),
        (PBP),
        (PSI),
        (PSI),
        (LIT 1),
        (STO 3),
        (RTN),
        (CAL 1),
        (RTN),
        (INC 3),
        (INC 1),
        (CAL 7),
        (HLT),
    ];
    assert_eq!(code, expected);
}

#[test]
fn outer_constant_is_loaded_through_the_static_link() {
    let code = compile_src("const k = 7; procedure p; write k; call p .");
    let expected = program![
        (JMP 6),
        (PBP),
        (PSI),
        (LOD 3),
        (CHO),
        (RTN),
        (INC 3),
        (LIT 7),
        (CAL 1),
        (HLT),
    ];
    assert_eq!(code, expected);
}

#[test]
fn write_evaluates_the_whole_expression() {
    let code = compile_src("var x; write (x + 1) * 2 .");
    let expected = program![
        (INC 3),
        (INC 1),
        (PBP),
        (LOD 3),
        (LIT 1),
        (ADD),
        (LIT 2),
        (MUL),
        (CHO),
        (HLT),
    ];
    assert_eq!(code, expected);
}

#[test]
fn text_after_the_final_period_is_a_syntax_error() {
    let err = compile_err("skip . extra");
    match err {
        Error::Syntax(_) => {}
        other => panic!("expected a syntax error, got {:?}", other),
    }
}

#[test]
fn unterminated_comment_is_a_lexical_error() {
    let err = tokens("test.pell", "x # trailing").unwrap_err();
    assert!(err
        .diagnostic()
        .message
        .contains("file ended while reading a comment"));
}

#[test]
fn illegal_character_is_a_lexical_error() {
    let err = tokens("test.pell", "@").unwrap_err();
    assert_eq!(
        err.to_string(),
        "test.pell: line 1, column 1: illegal character '@'"
    );
}

#[test]
fn lone_colon_is_a_lexical_error() {
    let err = tokens("test.pell", "x : 1").unwrap_err();
    assert!(err
        .diagnostic()
        .message
        .contains("expecting '=' after a colon"));
}
