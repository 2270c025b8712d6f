//! This lexer tokenizes G-machine source text.
//!
//! Tokens are separated by spaces, tabs, semicolons and newlines, none of
//! which are ever part of a token. `//` starts a comment running to the end
//! of the line, and `'c'` is a single-character literal which may itself
//! contain a separator.
use std::fmt;

use super::opcode::OpCode;
use super::{AsmError, SyntaxError};
use crate::Word;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum TokenKind {
    Instruction,
    Comment,
    NumberLiteral,
    RuneLiteral,
}

/// A single lexeme. Instructions carry their opcode as `value`,
/// literals carry their numeric value and comments carry zero.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub value: Word,
    pub raw: String,
    /// 1-based line of the first character.
    pub line: usize,
    /// 0-based character offset of the first character within its line.
    pub column: usize,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}({}) {:?} at {}:{}", self.kind, self.value, self.raw, self.line, self.column)
    }
}

impl Token {
    /// Resolves a raw lexeme into a token.
    fn resolve(raw: String, line: usize, column: usize) -> Result<Token, AsmError> {
        let (kind, value) = if raw.starts_with("//") {
            (TokenKind::Comment, 0)
        } else if let Some(op) = OpCode::from_mnemonic(&raw) {
            (TokenKind::Instruction, op.word())
        } else if let Some(c) = rune_literal(&raw) {
            (TokenKind::RuneLiteral, c as Word)
        } else {
            match raw.parse::<Word>() {
                Ok(value) => (TokenKind::NumberLiteral, value),
                Err(_) => {
                    let kind = SyntaxError::UnknownInstruction(raw);
                    return Err(AsmError::Syntax { line, kind });
                }
            }
        };

        Ok(Token { kind, value, raw, line, column })
    }
}

/// Returns the enclosed character of `'c'`.
fn rune_literal(raw: &str) -> Option<char> {
    let mut chars = raw.chars();
    match (chars.next(), chars.next(), chars.next(), chars.next()) {
        (Some('\''), Some(c), Some('\''), None) => Some(c),
        _ => None,
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum State {
    WantToken,
    InToken,
    InRuneLiteral,
    InComment,
}

pub struct Tokenizer {
    input: Vec<char>,
    /// Start of the lexeme being accumulated.
    start: usize,
    pos: usize,
    line: usize,
    /// Index of the first character of the current line.
    line_start: usize,
    token_line: usize,
    tokens: Vec<Token>,
}

impl Tokenizer {
    pub fn new(source: &str) -> Self {
        Tokenizer {
            input: source.chars().collect(),
            start: 0,
            pos: 0,
            line: 1,
            line_start: 0,
            token_line: 1,
            tokens: Vec::new(),
        }
    }

    /// Run the tokenizer, consuming itself and returning every token in source order.
    /// No tokens are returned if any lexeme is invalid.
    pub fn run(mut self) -> Result<Vec<Token>, AsmError> {
        let mut state = Some(State::WantToken);
        while let Some(current) = state {
            state = match current {
                State::WantToken => self.want_token(),
                State::InToken => self.in_token()?,
                State::InRuneLiteral => self.in_rune_literal()?,
                State::InComment => self.in_comment()?,
            };
        }
        Ok(self.tokens)
    }

    fn want_token(&mut self) -> Option<State> {
        loop {
            self.trace(State::WantToken);
            match self.next() {
                Some('\n') => {
                    self.line += 1;
                    self.line_start = self.pos;
                    self.skip();
                }
                Some(' ') | Some(';') | Some('\t') | Some('\r') => self.skip(),
                None => return None,
                Some(_) => {
                    self.backup();
                    self.token_line = self.line;
                    return Some(State::InToken);
                }
            }
        }
    }

    fn in_token(&mut self) -> Result<Option<State>, AsmError> {
        loop {
            self.trace(State::InToken);
            match self.next() {
                Some('/') => {
                    if self.peek() == Some('/') {
                        return Ok(Some(State::InComment));
                    }
                    return Err(AsmError::Syntax {
                        line: self.line,
                        kind: SyntaxError::ExpectedSlash(self.peek()),
                    });
                }
                Some('\n') | Some(' ') | Some(';') | Some('\t') | Some('\r') => {
                    self.backup();
                    self.emit()?;
                    return Ok(Some(State::WantToken));
                }
                Some('\'') => return Ok(Some(State::InRuneLiteral)),
                None => {
                    self.emit()?;
                    return Ok(None);
                }
                Some(_) => {}
            }
        }
    }

    fn in_rune_literal(&mut self) -> Result<Option<State>, AsmError> {
        loop {
            self.trace(State::InRuneLiteral);
            match self.next() {
                Some('\'') => {
                    self.emit()?;
                    return Ok(Some(State::WantToken));
                }
                Some('\n') => {
                    self.line += 1;
                    self.line_start = self.pos;
                }
                None => {
                    return Err(AsmError::Syntax {
                        line: self.line,
                        kind: SyntaxError::UnterminatedRune,
                    });
                }
                Some(_) => {}
            }
        }
    }

    fn in_comment(&mut self) -> Result<Option<State>, AsmError> {
        loop {
            self.trace(State::InComment);
            match self.next() {
                Some('\n') => {
                    self.backup();
                    self.emit()?;
                    return Ok(Some(State::WantToken));
                }
                None => {
                    self.emit()?;
                    return Ok(None);
                }
                Some(_) => {}
            }
        }
    }

    fn next(&mut self) -> Option<char> {
        let next = self.peek();
        if next.is_some() {
            self.pos += 1;
        }
        next
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn skip(&mut self) {
        self.start = self.pos;
    }

    fn backup(&mut self) {
        self.pos -= 1;
    }

    fn emit(&mut self) -> Result<(), AsmError> {
        let raw: String = self.input[self.start..self.pos].iter().collect();
        let column = self.column_of(self.start);
        let token = Token::resolve(raw, self.token_line, column)?;
        debug!("emit {}", token);
        self.tokens.push(token);
        self.start = self.pos;
        Ok(())
    }

    /// Column of a lexeme start. A rune literal spanning a newline starts
    /// before the current line.
    fn column_of(&self, index: usize) -> usize {
        if index >= self.line_start {
            return index - self.line_start;
        }
        let line_start = self.input[..index]
            .iter()
            .rposition(|&c| c == '\n')
            .map_or(0, |newline| newline + 1);
        index - line_start
    }

    fn trace(&self, state: State) {
        if log_enabled!(log::Level::Trace) {
            let lexeme: String = self.input[self.start..self.pos].iter().collect();
            let next = self.peek().map_or_else(|| "EOF".to_string(), |c| c.to_string());
            trace!("{:?}: [{}] -> {}", state, lexeme, next);
        }
    }
}
