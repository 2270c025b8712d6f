//! Single-step debugging support.
//!
//! In debug mode the machine prints a snapshot of its registers and the next
//! instruction before every fetch, then waits for a line on its input.
use std::convert::TryFrom;
use std::fmt;
use std::io::{BufRead, Write};

use super::{Machine, MachineError};
use crate::assembler::OpCode;

impl<R, W> Machine<R, W> {
    /// Renders the instruction at P, with its operand, without executing it.
    pub fn decode_next_instruction(&self) -> String {
        let word = match usize::try_from(self.p).ok().and_then(|p| self.memory.get(p)) {
            Some(&word) => word,
            None => return "<out of range>".to_string(),
        };

        match OpCode::try_from(word) {
            Ok(op) if op.has_operand() => {
                let operand = usize::try_from(self.p.wrapping_add(1))
                    .ok()
                    .and_then(|p| self.memory.get(p))
                    .map_or_else(|| "?".to_string(), |w| w.to_string());
                format!("{} {}", op, operand)
            }
            Ok(op) => op.to_string(),
            Err(word) => format!("DATA {}", word),
        }
    }
}

impl<R, W> fmt::Display for Machine<R, W> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "P: {:06} A: {:06} I: {:06} X: {:06} Y: {:06} Z: {} NEXT: {}",
            self.p,
            self.a,
            self.i,
            self.x,
            self.y,
            self.z,
            self.decode_next_instruction()
        )
    }
}

impl<R: BufRead, W: Write> Machine<R, W> {
    /// Prints the current state and blocks until a line of input arrives.
    pub(super) fn debug_step(&mut self) -> Result<(), MachineError> {
        let snapshot = self.to_string();
        writeln!(self.output, "{}", snapshot)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(MachineError::DebuggerDetached);
        }
        Ok(())
    }
}
