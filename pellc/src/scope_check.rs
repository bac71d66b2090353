//! Scope analysis. Walks the AST with a scope stack, records every
//! declaration, and fills each identifier use with the declaration's
//! attributes and its lexical distance. All errors are fatal; the first one
//! is reported with the offending identifier's source location.

use crate::ast::*;
use crate::error::Error;
use crate::symtab::{Declared, IdKind, InsertError, SymTab};

pub fn check_program(program: &mut Program) -> Result<(), Error> {
    let mut symtab = SymTab::new();
    check_block(&mut symtab, &mut program.block)
}

fn check_block(symtab: &mut SymTab, block: &mut Block) -> Result<(), Error> {
    symtab.enter_scope();
    for cd in &block.consts {
        insert(symtab, &cd.name, &cd.loc, Declared::Constant)?;
    }
    for vd in &block.vars {
        insert(symtab, &vd.name, &vd.loc, Declared::Variable)?;
    }
    for pd in &mut block.procs {
        // The procedure is visible inside its own body (for recursion) but
        // not inside earlier siblings.
        insert(
            symtab,
            &pd.name,
            &pd.loc,
            Declared::Procedure(pd.label.clone()),
        )?;
        check_block(symtab, &mut pd.block)?;
    }
    check_stmt(symtab, &mut block.body)?;
    symtab.leave_scope();
    Ok(())
}

fn insert(
    symtab: &mut SymTab,
    name: &str,
    loc: &SourceLoc,
    declared: Declared,
) -> Result<(), Error> {
    symtab
        .insert(name, loc.clone(), declared)
        .map_err(|err| match err {
            InsertError::Duplicate => Error::semantic(
                loc.clone(),
                format!("identifier \"{}\" is already declared in this scope", name),
            ),
            InsertError::ScopeFull => Error::semantic(
                loc.clone(),
                format!(
                    "too many declarations in one scope (limit {})",
                    crate::symtab::MAX_SCOPE_SIZE
                ),
            ),
        })
}

fn check_stmt(symtab: &mut SymTab, stmt: &mut Stmt) -> Result<(), Error> {
    match stmt {
        Stmt::Assign { target, expr, .. } => {
            resolve_variable(symtab, target)?;
            check_expr(symtab, expr)
        }
        Stmt::Call { callee, .. } => resolve_procedure(symtab, callee),
        Stmt::Begin { stmts, .. } => {
            for stmt in stmts {
                check_stmt(symtab, stmt)?;
            }
            Ok(())
        }
        Stmt::If {
            cond,
            then_stmt,
            else_stmt,
            ..
        } => {
            check_cond(symtab, cond)?;
            check_stmt(symtab, then_stmt)?;
            check_stmt(symtab, else_stmt)
        }
        Stmt::While { cond, body, .. } => {
            check_cond(symtab, cond)?;
            check_stmt(symtab, body)
        }
        Stmt::Read { target, .. } => resolve_variable(symtab, target),
        Stmt::Write { expr, .. } => check_expr(symtab, expr),
        Stmt::Skip { .. } => Ok(()),
    }
}

fn check_cond(symtab: &mut SymTab, cond: &mut Cond) -> Result<(), Error> {
    match cond {
        Cond::Odd { expr, .. } => check_expr(symtab, expr),
        Cond::Bin { left, right, .. } => {
            check_expr(symtab, left)?;
            check_expr(symtab, right)
        }
    }
}

fn check_expr(symtab: &mut SymTab, expr: &mut Expr) -> Result<(), Error> {
    match expr {
        Expr::Bin { left, right, .. } => {
            check_expr(symtab, left)?;
            check_expr(symtab, right)
        }
        Expr::Ident(ident) => resolve_data(symtab, ident),
        Expr::Number { .. } => Ok(()),
    }
}

fn resolve(symtab: &SymTab, ident: &mut Ident) -> Result<(), Error> {
    match symtab.lookup(&ident.name) {
        Some(id_use) => {
            ident.resolved = Some(id_use);
            Ok(())
        }
        None => Err(Error::semantic(
            ident.loc.clone(),
            format!("identifier \"{}\" is not declared", ident.name),
        )),
    }
}

/// Assignment and read targets must name a variable.
fn resolve_variable(symtab: &SymTab, ident: &mut Ident) -> Result<(), Error> {
    resolve(symtab, ident)?;
    match ident.id_use().attrs.kind {
        IdKind::Variable { .. } => Ok(()),
        _ => Err(Error::semantic(
            ident.loc.clone(),
            format!("identifier \"{}\" is not a variable name", ident.name),
        )),
    }
}

/// Identifiers in expressions must name a constant or a variable.
fn resolve_data(symtab: &SymTab, ident: &mut Ident) -> Result<(), Error> {
    resolve(symtab, ident)?;
    match ident.id_use().attrs.kind {
        IdKind::Procedure { .. } => Err(Error::semantic(
            ident.loc.clone(),
            format!(
                "identifier \"{}\" is a procedure name, not a constant or variable",
                ident.name
            ),
        )),
        _ => Ok(()),
    }
}

/// Call targets must name a procedure.
fn resolve_procedure(symtab: &SymTab, ident: &mut Ident) -> Result<(), Error> {
    resolve(symtab, ident)?;
    match ident.id_use().attrs.kind {
        IdKind::Procedure { .. } => Ok(()),
        _ => Err(Error::semantic(
            ident.loc.clone(),
            format!("identifier \"{}\" is not a procedure name", ident.name),
        )),
    }
}
