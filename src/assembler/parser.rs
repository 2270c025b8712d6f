//! The Parser module takes a token stream (Vec<Token>) from the Tokenizer
//! and lays it out as a flat program, one word per instruction or literal.
use std::collections::VecDeque;
use std::convert::TryFrom;

use super::lexer::{Token, TokenKind};
use super::opcode::OpCode;
use super::AsmError;
use crate::Word;

pub struct Parser {
    tokens: VecDeque<Token>,
    program: Vec<Word>,
    /// Set after an instruction which must be followed by a literal.
    argument_expected: bool,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        let capacity = tokens.len();
        Parser {
            tokens: VecDeque::from(tokens),
            program: Vec::with_capacity(capacity),
            argument_expected: false,
        }
    }

    /// Run the parser, consuming itself and returning the program.
    pub fn run(mut self) -> Result<Vec<Word>, AsmError> {
        while let Some(token) = self.consume() {
            self.token(token)?;
        }

        if self.argument_expected {
            warn!("program ends with an instruction that expects an argument");
        }
        debug!("assembled {} word(s)", self.program.len());

        Ok(self.program)
    }

    fn token(&mut self, token: Token) -> Result<(), AsmError> {
        match token.kind {
            TokenKind::Comment => Ok(()),
            TokenKind::Instruction => self.instruction(token),
            // A literal without a pending instruction is kept as a raw data word.
            TokenKind::NumberLiteral | TokenKind::RuneLiteral => {
                self.argument_expected = false;
                self.program.push(token.value);
                Ok(())
            }
        }
    }

    fn instruction(&mut self, token: Token) -> Result<(), AsmError> {
        if self.argument_expected {
            return Err(AsmError::UnexpectedInstruction { line: token.line, raw: token.raw });
        }

        self.argument_expected =
            OpCode::try_from(token.value).map_or(false, OpCode::requires_argument);
        self.program.push(token.value);
        Ok(())
    }

    /// Pops a token off the input stream and returns it.
    /// Returns None if no tokens are left.
    #[inline]
    fn consume(&mut self) -> Option<Token> {
        self.tokens.pop_front()
    }
}
