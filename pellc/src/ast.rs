//! The abstract syntax tree, one variant per syntactic kind. Every node
//! carries the source location of its first token for diagnostics. `Ident`
//! nodes additionally carry the slot that scope analysis fills in with the
//! resolved declaration and its lexical distance.

use std::rc::Rc;

use crate::label::Label;
use crate::symtab::IdUse;
use pvm::Word;

#[derive(Clone, PartialEq, Debug)]
pub struct SourceLoc {
    pub file: Rc<str>,
    pub line: u32,
    pub column: u32,
}

#[derive(Debug)]
pub struct Program {
    pub block: Block,
}

#[derive(Debug)]
pub struct Block {
    pub consts: Vec<ConstDecl>,
    pub vars: Vec<VarDecl>,
    pub procs: Vec<ProcDecl>,
    pub body: Stmt,
    pub loc: SourceLoc,
}

#[derive(Debug)]
pub struct ConstDecl {
    pub name: String,
    pub value: Word,
    pub loc: SourceLoc,
}

#[derive(Debug)]
pub struct VarDecl {
    pub name: String,
    pub loc: SourceLoc,
}

#[derive(Debug)]
pub struct ProcDecl {
    pub name: String,
    pub block: Block,
    pub label: Label,
    pub loc: SourceLoc,
}

#[derive(Debug)]
pub enum Stmt {
    Assign {
        target: Ident,
        expr: Expr,
        loc: SourceLoc,
    },
    Call {
        callee: Ident,
        loc: SourceLoc,
    },
    Begin {
        stmts: Vec<Stmt>,
        loc: SourceLoc,
    },
    If {
        cond: Cond,
        then_stmt: Box<Stmt>,
        else_stmt: Box<Stmt>,
        loc: SourceLoc,
    },
    While {
        cond: Cond,
        body: Box<Stmt>,
        loc: SourceLoc,
    },
    Read {
        target: Ident,
        loc: SourceLoc,
    },
    Write {
        expr: Expr,
        loc: SourceLoc,
    },
    Skip {
        loc: SourceLoc,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RelOp {
    Eq,
    Neq,
    Lt,
    Leq,
    Gt,
    Geq,
}

impl RelOp {
    pub fn symbol(self) -> &'static str {
        match self {
            RelOp::Eq => "=",
            RelOp::Neq => "<>",
            RelOp::Lt => "<",
            RelOp::Leq => "<=",
            RelOp::Gt => ">",
            RelOp::Geq => ">=",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithOp {
    pub fn symbol(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
        }
    }
}

#[derive(Debug)]
pub enum Cond {
    Odd {
        expr: Expr,
        loc: SourceLoc,
    },
    Bin {
        left: Expr,
        op: RelOp,
        right: Expr,
        loc: SourceLoc,
    },
}

#[derive(Debug)]
pub enum Expr {
    Bin {
        left: Box<Expr>,
        op: ArithOp,
        right: Box<Expr>,
        loc: SourceLoc,
    },
    Ident(Ident),
    Number {
        value: Word,
        loc: SourceLoc,
    },
}

/// An identifier use. `resolved` is empty after parsing and filled in by
/// scope analysis; code generation reads it through [`Ident::id_use`].
#[derive(Debug)]
pub struct Ident {
    pub name: String,
    pub loc: SourceLoc,
    pub resolved: Option<IdUse>,
}

impl Ident {
    pub fn new(name: String, loc: SourceLoc) -> Ident {
        Ident {
            name,
            loc,
            resolved: None,
        }
    }

    /// The resolved use of a scope-checked identifier.
    pub fn id_use(&self) -> &IdUse {
        match &self.resolved {
            Some(id_use) => id_use,
            None => panic!(
                "internal error: identifier \"{}\" was not resolved",
                self.name
            ),
        }
    }
}
