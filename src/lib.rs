//! An assembler and virtual CPU for the G-machine.
//!
//! Source text is tokenized and assembled into a flat list of words, which
//! is loaded into a [`Machine`] and executed:
//!
//! ```no_run
//! let program = gmachine::assemble_str("SETA 'H' OUTA HALT")?;
//! let mut machine = gmachine::Machine::new();
//! machine.load(&program)?;
//! machine.run()?;
//! # Ok::<(), gmachine::Error>(())
//! ```
#[macro_use] extern crate log;

pub mod assembler;
pub mod machine;

use thiserror::Error;

pub use assembler::{
    assemble, assemble_file, assemble_str, tokenize, AsmError, OpCode, SyntaxError, Token,
    TokenKind,
};
pub use machine::{Machine, MachineError, DEFAULT_MEM_SIZE};

/// The machine's only datum type.
pub type Word = u64;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Asm(#[from] AsmError),
    #[error(transparent)]
    Machine(#[from] MachineError),
}
