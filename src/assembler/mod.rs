//! The Assembler module is in charge of taking a
//! G-machine source file and producing the flat
//! list of words the machine executes.
//!
//! It does this by implementing a character-level state
//! machine tokenizer and a single-pass assembler which
//! only checks that argument-taking instructions are
//! followed by a literal.

pub mod lexer;
pub mod listing;
pub mod opcode;
pub mod parser;

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use thiserror::Error;

use crate::Word;
pub use lexer::{Token, TokenKind, Tokenizer};
pub use listing::{listing, ListingEntry};
pub use opcode::{invert_map, OpCode};

/// The detail of a lexical error.
#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum SyntaxError {
    #[error("expected '/' got {}", describe_char(.0))]
    ExpectedSlash(Option<char>),
    #[error("unexpected end of input in rune literal")]
    UnterminatedRune,
    #[error("unknown instruction {0}")]
    UnknownInstruction(String),
}

fn describe_char(c: &Option<char>) -> String {
    match c {
        Some(c) => format!("'{}'", c),
        None => "EOF".to_string(),
    }
}

#[derive(Debug, Error)]
pub enum AsmError {
    #[error("{line}: syntax error: {kind}")]
    Syntax { line: usize, kind: SyntaxError },
    #[error("{line}: unexpected instruction {raw}")]
    UnexpectedInstruction { line: usize, raw: String },
    #[error("{name}:{source}")]
    InSource { name: String, source: Box<AsmError> },
    #[error("unable to read source: {0}")]
    Io(#[from] io::Error),
}

impl AsmError {
    /// The source line the error was found on, if it has one.
    pub fn line(&self) -> Option<usize> {
        match self {
            AsmError::Syntax { line, .. } | AsmError::UnexpectedInstruction { line, .. } => {
                Some(*line)
            }
            AsmError::InSource { source, .. } => source.line(),
            AsmError::Io(_) => None,
        }
    }
}

/// Splits source text into tokens.
pub fn tokenize(source: &str) -> Result<Vec<Token>, AsmError> {
    Tokenizer::new(source).run()
}

/// Assembles source text into a program.
pub fn assemble_str(source: &str) -> Result<Vec<Word>, AsmError> {
    parser::Parser::new(tokenize(source)?).run()
}

/// Reads the whole stream, then assembles it.
pub fn assemble<R: Read>(mut reader: R) -> Result<Vec<Word>, AsmError> {
    let mut source = String::new();
    reader.read_to_string(&mut source)?;
    assemble_str(&source)
}

/// Assembles a file. Errors are prefixed with the file's path.
pub fn assemble_file<P: AsRef<Path>>(path: P) -> Result<Vec<Word>, AsmError> {
    let path = path.as_ref();
    let name = path.display().to_string();
    debug!("assembling `{}`", name);

    File::open(path)
        .map_err(AsmError::from)
        .and_then(assemble)
        .map_err(|e| AsmError::InSource { name, source: Box::new(e) })
}
