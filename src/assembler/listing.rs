//! Produces a human-readable listing of an assembled program.
use std::convert::TryFrom;
use std::fmt;

use super::opcode::OpCode;
use crate::Word;

/// One line of a listing: an instruction with its inline operand, or a data word.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ListingEntry {
    pub address: usize,
    pub words: Vec<Word>,
    pub text: String,
}

impl fmt::Display for ListingEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{:04X}: {}", self.address, self.text)
    }
}

/// Walks the program the way the machine would decode it from address zero,
/// without following jumps.
pub fn listing(program: &[Word]) -> Vec<ListingEntry> {
    let mut entries = Vec::new();
    let mut address = 0;

    while address < program.len() {
        let word = program[address];
        let entry = match OpCode::try_from(word) {
            Ok(op) if op.has_operand() => match program.get(address + 1) {
                Some(&operand) => ListingEntry {
                    address,
                    words: vec![word, operand],
                    text: format!("{} {}", op, operand),
                },
                None => ListingEntry { address, words: vec![word], text: format!("{} ?", op) },
            },
            Ok(op) => ListingEntry { address, words: vec![word], text: op.to_string() },
            Err(_) => ListingEntry { address, words: vec![word], text: format!("DATA {}", word) },
        };
        address += entry.words.len();
        entries.push(entry);
    }

    entries
}
