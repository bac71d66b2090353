//! Pretty-printer for parsed programs (the driver's `-u` option). Nesting
//! is shown with two-space indentation and every binary expression is
//! parenthesized, so the output reparses to the same tree.

use std::io;
use std::io::Write;

use crate::ast::*;

const SPACES_PER_LEVEL: usize = 2;

pub fn unparse_program<W: Write>(out: &mut W, program: &Program) -> io::Result<()> {
    unparse_block(out, &program.block, 0, false)?;
    writeln!(out, ".")
}

fn indent<W: Write>(out: &mut W, level: usize) -> io::Result<()> {
    write!(out, "{:width$}", "", width = level * SPACES_PER_LEVEL)
}

fn end_line<W: Write>(out: &mut W, add_semi: bool) -> io::Result<()> {
    writeln!(out, "{}", if add_semi { ";" } else { "" })
}

fn unparse_block<W: Write>(
    out: &mut W,
    block: &Block,
    level: usize,
    add_semi: bool,
) -> io::Result<()> {
    for cd in &block.consts {
        indent(out, level)?;
        writeln!(out, "const {} = {};", cd.name, cd.value)?;
    }
    for vd in &block.vars {
        indent(out, level)?;
        writeln!(out, "var {};", vd.name)?;
    }
    for pd in &block.procs {
        indent(out, level)?;
        writeln!(out, "procedure {};", pd.name)?;
        unparse_block(out, &pd.block, level + 1, true)?;
    }
    unparse_stmt(out, &block.body, level, add_semi)
}

fn unparse_stmt<W: Write>(
    out: &mut W,
    stmt: &Stmt,
    level: usize,
    add_semi: bool,
) -> io::Result<()> {
    match stmt {
        Stmt::Assign { target, expr, .. } => {
            indent(out, level)?;
            write!(out, "{} := ", target.name)?;
            unparse_expr(out, expr)?;
            end_line(out, add_semi)
        }
        Stmt::Call { callee, .. } => {
            indent(out, level)?;
            write!(out, "call {}", callee.name)?;
            end_line(out, add_semi)
        }
        Stmt::Begin { stmts, .. } => {
            indent(out, level)?;
            writeln!(out, "begin")?;
            for (i, stmt) in stmts.iter().enumerate() {
                unparse_stmt(out, stmt, level + 1, i + 1 < stmts.len())?;
            }
            indent(out, level)?;
            write!(out, "end")?;
            end_line(out, add_semi)
        }
        Stmt::If {
            cond,
            then_stmt,
            else_stmt,
            ..
        } => {
            indent(out, level)?;
            write!(out, "if ")?;
            unparse_cond(out, cond)?;
            writeln!(out)?;
            indent(out, level)?;
            writeln!(out, "then")?;
            unparse_stmt(out, then_stmt, level + 1, false)?;
            indent(out, level)?;
            writeln!(out, "else")?;
            unparse_stmt(out, else_stmt, level + 1, add_semi)
        }
        Stmt::While { cond, body, .. } => {
            indent(out, level)?;
            write!(out, "while ")?;
            unparse_cond(out, cond)?;
            writeln!(out)?;
            indent(out, level)?;
            writeln!(out, "do")?;
            unparse_stmt(out, body, level + 1, add_semi)
        }
        Stmt::Read { target, .. } => {
            indent(out, level)?;
            write!(out, "read {}", target.name)?;
            end_line(out, add_semi)
        }
        Stmt::Write { expr, .. } => {
            indent(out, level)?;
            write!(out, "write ")?;
            unparse_expr(out, expr)?;
            end_line(out, add_semi)
        }
        Stmt::Skip { .. } => {
            indent(out, level)?;
            write!(out, "skip")?;
            end_line(out, add_semi)
        }
    }
}

fn unparse_cond<W: Write>(out: &mut W, cond: &Cond) -> io::Result<()> {
    match cond {
        Cond::Odd { expr, .. } => {
            write!(out, "odd ")?;
            unparse_expr(out, expr)
        }
        Cond::Bin {
            left, op, right, ..
        } => {
            unparse_expr(out, left)?;
            write!(out, " {} ", op.symbol())?;
            unparse_expr(out, right)
        }
    }
}

fn unparse_expr<W: Write>(out: &mut W, expr: &Expr) -> io::Result<()> {
    match expr {
        Expr::Bin {
            left, op, right, ..
        } => {
            write!(out, "(")?;
            unparse_expr(out, left)?;
            write!(out, " {} ", op.symbol())?;
            unparse_expr(out, right)?;
            write!(out, ")")
        }
        Expr::Ident(ident) => write!(out, "{}", ident.name),
        Expr::Number { value, .. } => write!(out, "{}", value),
    }
}
