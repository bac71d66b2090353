use std::error::Error as StdError;
use std::fmt;

use crate::ast::SourceLoc;

/// A located compiler message, printed as
/// `<file>: line <n>, column <c>: <message>`.
#[derive(Clone, PartialEq, Debug)]
pub struct Diagnostic {
    pub loc: SourceLoc,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}: line {}, column {}: {}",
            self.loc.file, self.loc.line, self.loc.column, self.message
        )
    }
}

/// A fatal compiler error. The compiler stops at the first one.
#[derive(Clone, PartialEq, Debug)]
pub enum Error {
    Lexical(Diagnostic),
    Syntax(Diagnostic),
    Semantic(Diagnostic),
}

impl Error {
    pub fn lexical(loc: SourceLoc, message: String) -> Error {
        Error::Lexical(Diagnostic { loc, message })
    }

    pub fn syntax(loc: SourceLoc, message: String) -> Error {
        Error::Syntax(Diagnostic { loc, message })
    }

    pub fn semantic(loc: SourceLoc, message: String) -> Error {
        Error::Semantic(Diagnostic { loc, message })
    }

    pub fn diagnostic(&self) -> &Diagnostic {
        match self {
            Error::Lexical(d) | Error::Syntax(d) | Error::Semantic(d) => d,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self.diagnostic(), f)
    }
}

impl StdError for Error {}
