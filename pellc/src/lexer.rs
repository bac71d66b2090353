//! The token listing behind the driver's `-l` option: the same lexical
//! grammar the parser uses, surfaced as a table of numbered tokens.

use std::fmt;
use std::io;
use std::io::Write;
use std::rc::Rc;

use num_derive::ToPrimitive;
use num_traits::ToPrimitive;
use pest::Parser;

use crate::ast::SourceLoc;
use crate::error::Error;
use crate::parser::{self, PellParser, Rule};

// The numeric order is the first column of the listing; keep it stable.
#[derive(Clone, Copy, PartialEq, Eq, Debug, ToPrimitive)]
pub enum TokenKind {
    Period,
    Const,
    Semi,
    Comma,
    Var,
    Procedure,
    Becomes,
    Call,
    Begin,
    End,
    If,
    Then,
    Else,
    While,
    Do,
    Read,
    Write,
    Skip,
    Odd,
    LParen,
    RParen,
    Ident,
    Number,
    Eq,
    Neq,
    Less,
    Leq,
    Gtr,
    Geq,
    Plus,
    Minus,
    Times,
    Divide,
    Eof,
}

impl TokenKind {
    pub fn number(self) -> i32 {
        self.to_i32().unwrap()
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.pad(&format!("{:?}", self))
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub line: u32,
    pub column: u32,
    pub text: String,
}

/// Tokenizes a whole source file, ending with an EOF token.
pub fn tokens(filename: &str, source: &str) -> Result<Vec<Token>, Error> {
    let file: Rc<str> = Rc::from(filename);
    let stream = PellParser::parse(Rule::token_stream, source)
        .map_err(|err| lexical_error(&file, source, err))?
        .next()
        .unwrap();

    let mut result = Vec::new();
    for pair in stream.into_inner() {
        match pair.as_rule() {
            Rule::token => {
                let inner = pair.into_inner().next().unwrap();
                let (line, column) = inner.as_span().start_pos().line_col();
                let kind = token_kind(inner.as_rule());
                // the length and range limits are lexical, so the listing
                // enforces them too
                match kind {
                    TokenKind::Ident => {
                        parser::ident_name(&file, &inner)?;
                    }
                    TokenKind::Number => {
                        parser::number_value(&file, &inner)?;
                    }
                    _ => {}
                }
                result.push(Token {
                    kind,
                    line: line as u32,
                    column: column as u32,
                    text: inner.as_str().to_owned(),
                });
            }
            Rule::EOI => {
                let (line, column) = pair.as_span().start_pos().line_col();
                result.push(Token {
                    kind: TokenKind::Eof,
                    line: line as u32,
                    column: column as u32,
                    text: String::new(),
                });
            }
            _ => unreachable!(),
        }
    }
    Ok(result)
}

fn token_kind(rule: Rule) -> TokenKind {
    match rule {
        Rule::period => TokenKind::Period,
        Rule::kw_const => TokenKind::Const,
        Rule::semi => TokenKind::Semi,
        Rule::comma => TokenKind::Comma,
        Rule::kw_var => TokenKind::Var,
        Rule::kw_procedure => TokenKind::Procedure,
        Rule::becomes => TokenKind::Becomes,
        Rule::kw_call => TokenKind::Call,
        Rule::kw_begin => TokenKind::Begin,
        Rule::kw_end => TokenKind::End,
        Rule::kw_if => TokenKind::If,
        Rule::kw_then => TokenKind::Then,
        Rule::kw_else => TokenKind::Else,
        Rule::kw_while => TokenKind::While,
        Rule::kw_do => TokenKind::Do,
        Rule::kw_read => TokenKind::Read,
        Rule::kw_write => TokenKind::Write,
        Rule::kw_skip => TokenKind::Skip,
        Rule::kw_odd => TokenKind::Odd,
        Rule::lparen => TokenKind::LParen,
        Rule::rparen => TokenKind::RParen,
        Rule::ident => TokenKind::Ident,
        Rule::number => TokenKind::Number,
        Rule::eq => TokenKind::Eq,
        Rule::neq => TokenKind::Neq,
        Rule::les => TokenKind::Less,
        Rule::leq => TokenKind::Leq,
        Rule::gtr => TokenKind::Gtr,
        Rule::geq => TokenKind::Geq,
        Rule::plus => TokenKind::Plus,
        Rule::minus => TokenKind::Minus,
        Rule::times => TokenKind::Times,
        Rule::divide => TokenKind::Divide,
        _ => unreachable!(),
    }
}

fn lexical_error(file: &Rc<str>, source: &str, err: pest::error::Error<Rule>) -> Error {
    let (line, column) = parser::error_position(&err);
    let offending = source
        .lines()
        .nth(line as usize - 1)
        .and_then(|text| text.chars().nth(column as usize - 1));
    let message = match offending {
        Some('#') => "file ended while reading a comment".to_owned(),
        Some(':') => "expecting '=' after a colon".to_owned(),
        Some(c) => format!("illegal character '{}'", c),
        // At end of input; an unclosed final comment is the usual cause.
        None if source.lines().last().map_or(false, |l| l.contains('#')) => {
            "file ended while reading a comment".to_owned()
        }
        None => "unexpected end of file".to_owned(),
    };
    Error::lexical(
        SourceLoc {
            file: Rc::clone(file),
            line,
            column,
        },
        message,
    )
}

/// Writes the `-l` table: one numbered row per token.
pub fn write_listing<W: Write>(out: &mut W, filename: &str, tokens: &[Token]) -> io::Result<()> {
    writeln!(out, "Tokens from file {}", filename)?;
    writeln!(out, "Number Name       Line Column Text/Value")?;
    for token in tokens {
        write!(
            out,
            "{:<6} {:<10} {:<4} {:<6}",
            token.kind.number(),
            token.kind,
            token.line,
            token.column
        )?;
        match token.kind {
            TokenKind::Number => writeln!(out, " {}", token.text)?,
            TokenKind::Eof => writeln!(out)?,
            _ => writeln!(out, " \"{}\"", token.text)?,
        }
    }
    Ok(())
}
