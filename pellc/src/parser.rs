use std::rc::Rc;

use matches::debug_assert_matches;
use pest::error::{ErrorVariant, LineColLocation};
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use crate::ast::*;
use crate::error::Error;
use crate::label::Label;
use pvm::Word;

#[derive(Parser)]
#[grammar = "pell.pest"]
pub struct PellParser;

/// Longest accepted identifier.
pub const MAX_IDENT_LENGTH: usize = 255;

/// Parses one source file into an AST. `filename` only feeds the source
/// locations recorded in the tree.
pub fn parse_program(filename: &str, source: &str) -> Result<Program, Error> {
    let file: Rc<str> = Rc::from(filename);
    let pair = PellParser::parse(Rule::program, source)
        .map_err(|err| syntax_error(&file, err))?
        .next()
        .unwrap();
    debug_assert_matches!(pair.as_rule(), Rule::program);
    let block_pair = pair.into_inner().next().unwrap();
    let block = build_block(&file, block_pair)?;
    Ok(Program { block })
}

pub(crate) fn loc_of(file: &Rc<str>, pair: &Pair<Rule>) -> SourceLoc {
    let (line, column) = pair.as_span().start_pos().line_col();
    SourceLoc {
        file: Rc::clone(file),
        line: line as u32,
        column: column as u32,
    }
}

pub(crate) fn error_position(err: &pest::error::Error<Rule>) -> (u32, u32) {
    let (line, column) = match err.line_col {
        LineColLocation::Pos((line, column)) => (line, column),
        LineColLocation::Span((line, column), _) => (line, column),
    };
    (line as u32, column as u32)
}

fn syntax_error(file: &Rc<str>, err: pest::error::Error<Rule>) -> Error {
    let (line, column) = error_position(&err);
    let message = match &err.variant {
        ErrorVariant::ParsingError { positives, .. } => expected_message(positives),
        ErrorVariant::CustomError { message } => message.clone(),
    };
    Error::syntax(
        SourceLoc {
            file: Rc::clone(file),
            line,
            column,
        },
        message,
    )
}

fn expected_message(positives: &[Rule]) -> String {
    let mut names: Vec<&'static str> = Vec::new();
    for rule in positives {
        let name = rule_name(*rule);
        if !names.contains(&name) {
            names.push(name);
        }
    }
    match names.len() {
        0 => "syntax error".to_owned(),
        1 => format!("syntax error, expecting {}", names[0]),
        _ => {
            let mut message = String::from("syntax error, expecting one of: ");
            for (i, name) in names.iter().enumerate() {
                if i > 0 {
                    message.push_str(if i == names.len() - 1 { " or " } else { ", " });
                }
                message.push_str(name);
            }
            message
        }
    }
}

fn rule_name(rule: Rule) -> &'static str {
    match rule {
        Rule::ident => "an identifier",
        Rule::number | Rule::signed_number => "a number",
        Rule::program | Rule::block => "a block",
        Rule::const_decls | Rule::const_decl | Rule::const_def | Rule::kw_const => "\"const\"",
        Rule::var_decls | Rule::var_decl | Rule::kw_var => "\"var\"",
        Rule::proc_decls | Rule::proc_decl | Rule::kw_procedure => "\"procedure\"",
        Rule::stmt => "a statement",
        Rule::assign_stmt => "an assignment",
        Rule::call_stmt | Rule::kw_call => "\"call\"",
        Rule::begin_stmt | Rule::kw_begin => "\"begin\"",
        Rule::kw_end => "\"end\"",
        Rule::if_stmt | Rule::kw_if => "\"if\"",
        Rule::kw_then => "\"then\"",
        Rule::kw_else => "\"else\"",
        Rule::while_stmt | Rule::kw_while => "\"while\"",
        Rule::kw_do => "\"do\"",
        Rule::read_stmt | Rule::kw_read => "\"read\"",
        Rule::write_stmt | Rule::kw_write => "\"write\"",
        Rule::skip_stmt | Rule::kw_skip => "\"skip\"",
        Rule::condition | Rule::odd_cond | Rule::bin_cond | Rule::kw_odd => "a condition",
        Rule::rel_op => "a relational operator",
        Rule::expr | Rule::term | Rule::factor | Rule::paren_expr => "an expression",
        Rule::add_sub | Rule::mul_div | Rule::sign => "an operator",
        Rule::period => "\".\"",
        Rule::semi => "\";\"",
        Rule::comma => "\",\"",
        Rule::becomes => "\":=\"",
        Rule::eq => "\"=\"",
        Rule::lparen => "\"(\"",
        Rule::rparen => "\")\"",
        Rule::EOI => "end of file",
        _ => "a token",
    }
}

pub(crate) fn number_value(file: &Rc<str>, pair: &Pair<Rule>) -> Result<Word, Error> {
    debug_assert_matches!(pair.as_rule(), Rule::number);
    let text = pair.as_str();
    match text.parse::<i64>() {
        Ok(value) if value <= i64::from(Word::max_value()) => Ok(value as Word),
        _ => Err(Error::lexical(
            loc_of(file, pair),
            format!("the value of {} is too large for a word", text),
        )),
    }
}

pub(crate) fn ident_name(file: &Rc<str>, pair: &Pair<Rule>) -> Result<String, Error> {
    debug_assert_matches!(pair.as_rule(), Rule::ident);
    let text = pair.as_str();
    if text.len() > MAX_IDENT_LENGTH {
        return Err(Error::lexical(
            loc_of(file, pair),
            format!(
                "identifier starting \"{}\" is too long",
                &text[..MAX_IDENT_LENGTH]
            ),
        ));
    }
    Ok(text.to_owned())
}

fn build_block(file: &Rc<str>, pair: Pair<Rule>) -> Result<Block, Error> {
    debug_assert_matches!(pair.as_rule(), Rule::block);
    let loc = loc_of(file, &pair);
    let mut pairs = pair.into_inner();

    let mut consts = Vec::new();
    for const_decl in pairs.next().unwrap().into_inner() {
        for part in const_decl.into_inner() {
            if part.as_rule() == Rule::const_def {
                consts.push(build_const_def(file, part)?);
            }
        }
    }

    let mut vars = Vec::new();
    for var_decl in pairs.next().unwrap().into_inner() {
        for part in var_decl.into_inner() {
            if part.as_rule() == Rule::ident {
                let loc = loc_of(file, &part);
                vars.push(VarDecl {
                    name: ident_name(file, &part)?,
                    loc,
                });
            }
        }
    }

    let mut procs = Vec::new();
    for proc_decl in pairs.next().unwrap().into_inner() {
        procs.push(build_proc_decl(file, proc_decl)?);
    }

    let body = build_stmt(file, pairs.next().unwrap())?;

    Ok(Block {
        consts,
        vars,
        procs,
        body,
        loc,
    })
}

fn build_const_def(file: &Rc<str>, pair: Pair<Rule>) -> Result<ConstDecl, Error> {
    debug_assert_matches!(pair.as_rule(), Rule::const_def);
    let mut pairs = pair.into_inner();
    let ident = pairs.next().unwrap();
    let loc = loc_of(file, &ident);
    let name = ident_name(file, &ident)?;
    let value = number_value(file, &pairs.next().unwrap())?;
    Ok(ConstDecl { name, value, loc })
}

fn build_proc_decl(file: &Rc<str>, pair: Pair<Rule>) -> Result<ProcDecl, Error> {
    debug_assert_matches!(pair.as_rule(), Rule::proc_decl);
    let loc = loc_of(file, &pair);
    let mut pairs = pair.into_inner();
    pairs.next(); // "procedure"
    let name = ident_name(file, &pairs.next().unwrap())?;
    let block = build_block(file, pairs.next().unwrap())?;
    Ok(ProcDecl {
        name,
        block,
        label: Label::new(),
        loc,
    })
}

fn build_stmt(file: &Rc<str>, pair: Pair<Rule>) -> Result<Stmt, Error> {
    debug_assert_matches!(pair.as_rule(), Rule::stmt);
    let inner = pair.into_inner().next().unwrap();
    let loc = loc_of(file, &inner);
    match inner.as_rule() {
        Rule::assign_stmt => {
            let mut pairs = inner.into_inner();
            let target = build_ident(file, &pairs.next().unwrap())?;
            let expr = build_expr(file, pairs.next().unwrap())?;
            Ok(Stmt::Assign { target, expr, loc })
        }
        Rule::call_stmt => {
            let mut pairs = inner.into_inner();
            pairs.next(); // "call"
            let callee = build_ident(file, &pairs.next().unwrap())?;
            Ok(Stmt::Call { callee, loc })
        }
        Rule::begin_stmt => {
            let mut stmts = Vec::new();
            for part in inner.into_inner() {
                if part.as_rule() == Rule::stmt {
                    stmts.push(build_stmt(file, part)?);
                }
            }
            Ok(Stmt::Begin { stmts, loc })
        }
        Rule::if_stmt => {
            let mut parts = inner
                .into_inner()
                .filter(|p| p.as_rule() == Rule::condition || p.as_rule() == Rule::stmt);
            let cond = build_cond(file, parts.next().unwrap())?;
            let then_stmt = build_stmt(file, parts.next().unwrap())?;
            let else_stmt = build_stmt(file, parts.next().unwrap())?;
            Ok(Stmt::If {
                cond,
                then_stmt: Box::new(then_stmt),
                else_stmt: Box::new(else_stmt),
                loc,
            })
        }
        Rule::while_stmt => {
            let mut parts = inner
                .into_inner()
                .filter(|p| p.as_rule() == Rule::condition || p.as_rule() == Rule::stmt);
            let cond = build_cond(file, parts.next().unwrap())?;
            let body = build_stmt(file, parts.next().unwrap())?;
            Ok(Stmt::While {
                cond,
                body: Box::new(body),
                loc,
            })
        }
        Rule::read_stmt => {
            let mut pairs = inner.into_inner();
            pairs.next(); // "read"
            let target = build_ident(file, &pairs.next().unwrap())?;
            Ok(Stmt::Read { target, loc })
        }
        Rule::write_stmt => {
            let mut pairs = inner.into_inner();
            pairs.next(); // "write"
            let expr = build_expr(file, pairs.next().unwrap())?;
            Ok(Stmt::Write { expr, loc })
        }
        Rule::skip_stmt => Ok(Stmt::Skip { loc }),
        _ => unreachable!(),
    }
}

fn build_cond(file: &Rc<str>, pair: Pair<Rule>) -> Result<Cond, Error> {
    debug_assert_matches!(pair.as_rule(), Rule::condition);
    let inner = pair.into_inner().next().unwrap();
    let loc = loc_of(file, &inner);
    match inner.as_rule() {
        Rule::odd_cond => {
            let mut pairs = inner.into_inner();
            pairs.next(); // "odd"
            let expr = build_expr(file, pairs.next().unwrap())?;
            Ok(Cond::Odd { expr, loc })
        }
        Rule::bin_cond => {
            let mut pairs = inner.into_inner();
            let left = build_expr(file, pairs.next().unwrap())?;
            let op = rel_op(pairs.next().unwrap().as_str());
            let right = build_expr(file, pairs.next().unwrap())?;
            Ok(Cond::Bin {
                left,
                op,
                right,
                loc,
            })
        }
        _ => unreachable!(),
    }
}

fn rel_op(text: &str) -> RelOp {
    match text {
        "=" => RelOp::Eq,
        "<>" => RelOp::Neq,
        "<" => RelOp::Lt,
        "<=" => RelOp::Leq,
        ">" => RelOp::Gt,
        ">=" => RelOp::Geq,
        _ => unreachable!(),
    }
}

// Operators associate to the left, so a chain of terms folds into
// left-leaning Bin nodes.
fn build_expr(file: &Rc<str>, pair: Pair<Rule>) -> Result<Expr, Error> {
    debug_assert_matches!(pair.as_rule(), Rule::expr);
    let loc = loc_of(file, &pair);
    let mut pairs = pair.into_inner();
    let mut expr = build_term(file, pairs.next().unwrap())?;
    while let Some(op_pair) = pairs.next() {
        let op = match op_pair.as_str() {
            "+" => ArithOp::Add,
            "-" => ArithOp::Sub,
            _ => unreachable!(),
        };
        let right = build_term(file, pairs.next().unwrap())?;
        expr = Expr::Bin {
            left: Box::new(expr),
            op,
            right: Box::new(right),
            loc: loc.clone(),
        };
    }
    Ok(expr)
}

fn build_term(file: &Rc<str>, pair: Pair<Rule>) -> Result<Expr, Error> {
    debug_assert_matches!(pair.as_rule(), Rule::term);
    let loc = loc_of(file, &pair);
    let mut pairs = pair.into_inner();
    let mut expr = build_factor(file, pairs.next().unwrap())?;
    while let Some(op_pair) = pairs.next() {
        let op = match op_pair.as_str() {
            "*" => ArithOp::Mul,
            "/" => ArithOp::Div,
            _ => unreachable!(),
        };
        let right = build_factor(file, pairs.next().unwrap())?;
        expr = Expr::Bin {
            left: Box::new(expr),
            op,
            right: Box::new(right),
            loc: loc.clone(),
        };
    }
    Ok(expr)
}

fn build_factor(file: &Rc<str>, pair: Pair<Rule>) -> Result<Expr, Error> {
    debug_assert_matches!(pair.as_rule(), Rule::factor);
    let inner = pair.into_inner().next().unwrap();
    match inner.as_rule() {
        Rule::ident => Ok(Expr::Ident(build_ident(file, &inner)?)),
        Rule::paren_expr => build_expr(file, inner.into_inner().next().unwrap()),
        Rule::signed_number => {
            let loc = loc_of(file, &inner);
            let mut negate = false;
            let mut value: Word = 0;
            for part in inner.into_inner() {
                match part.as_rule() {
                    Rule::sign => negate = part.as_str() == "-",
                    Rule::number => value = number_value(file, &part)?,
                    _ => unreachable!(),
                }
            }
            if negate {
                value = -value;
            }
            Ok(Expr::Number { value, loc })
        }
        _ => unreachable!(),
    }
}

fn build_ident(file: &Rc<str>, pair: &Pair<Rule>) -> Result<Ident, Error> {
    let loc = loc_of(file, pair);
    Ok(Ident::new(ident_name(file, pair)?, loc))
}
