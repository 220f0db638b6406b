//! Program listings: the line-oriented text form of a [`Program`].
//!
//! ```text
//! ; sum three numbers through the queue
//!     select 21
//!     push 1
//!     push 2
//!     push 3
//! loop:
//!     jlt 1 done
//!     pop b
//!     add
//!     jmp loop
//! done:
//!     halt
//! ```

pub mod lexer;
pub mod parser;
pub mod parser_error;
pub mod token;

use thiserror::Error;

use crate::bytecode::Program;
use lexer::{Lexer, LexerError};
use parser::Parser;
use parser_error::ParserError;

#[derive(Debug, Error)]
pub enum AsmError {
    #[error("lexer error: {0}")]
    Lex(#[from] LexerError),

    #[error("parse error: {0}")]
    Parse(#[from] ParserError),
}

/// Assemble a listing into a resolved program.
pub fn assemble(source: &str) -> Result<Program, AsmError> {
    let tokens = Lexer::new(source).tokenize()?;
    Ok(Parser::new(tokens).parse()?)
}
