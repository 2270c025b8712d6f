//! The G-machine instruction set.
//!
//! Every instruction is a single 64-bit word. A handful of instructions are
//! followed by an inline operand word which is consumed when the instruction
//! executes.
//!
//! Supported Instructions:
//!
//! ```nasm
//! HALT          ; stop execution
//! NOOP          ; no-op
//! INCA          ; A <= A + 1
//! DECA          ; A <= A - 1
//! SETA CONST    ; A <= CONST
//! SETI CONST    ; I <= CONST
//! DECI          ; I <= I - 1
//! JINZ ADDR     ; if I != 0, P <= ADDR
//! MVAY          ; Y <= A
//! ADXY          ; Y <= Y + X
//! MVAX          ; X <= A
//! MVYA          ; A <= Y
//! OUTA          ; write the character with code point A
//! JUMP ADDR     ; P <= ADDR
//! INCI          ; I <= I + 1
//! LDAI OFFSET   ; A <= MEM[I + OFFSET]
//! CMPI CONST    ; Z <= (I == CONST)
//! JNEQ ADDR     ; if !Z, P <= ADDR
//! ```
//!
//! Mnemonics are case-insensitive. Opcode values are part of the binary
//! program format and must never be renumbered.

use std::collections::HashMap;
use std::convert::TryFrom;
use std::fmt;
use std::hash::Hash;
use std::sync::OnceLock;

use crate::Word;

#[repr(u64)]
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum OpCode {
    HALT = 0,
    NOOP = 1,
    INCA = 2,
    DECA = 3,
    SETA = 4,
    SETI = 5,
    DECI = 6,
    JINZ = 7,
    MVAY = 8,
    ADXY = 9,
    MVAX = 10,
    MVYA = 11,
    OUTA = 12,
    JUMP = 13,
    INCI = 14,
    LDAI = 15,
    CMPI = 16,
    JNEQ = 17,
}

const MNEMONICS: [(&str, OpCode); 18] = [
    ("HALT", OpCode::HALT),
    ("NOOP", OpCode::NOOP),
    ("INCA", OpCode::INCA),
    ("DECA", OpCode::DECA),
    ("SETA", OpCode::SETA),
    ("SETI", OpCode::SETI),
    ("DECI", OpCode::DECI),
    ("JINZ", OpCode::JINZ),
    ("MVAY", OpCode::MVAY),
    ("ADXY", OpCode::ADXY),
    ("MVAX", OpCode::MVAX),
    ("MVYA", OpCode::MVYA),
    ("OUTA", OpCode::OUTA),
    ("JUMP", OpCode::JUMP),
    ("INCI", OpCode::INCI),
    ("LDAI", OpCode::LDAI),
    ("CMPI", OpCode::CMPI),
    ("JNEQ", OpCode::JNEQ),
];

fn mnemonic_table() -> &'static HashMap<&'static str, OpCode> {
    static TABLE: OnceLock<HashMap<&'static str, OpCode>> = OnceLock::new();
    TABLE.get_or_init(|| MNEMONICS.iter().copied().collect())
}

fn name_table() -> &'static HashMap<OpCode, &'static str> {
    static NAMES: OnceLock<HashMap<OpCode, &'static str>> = OnceLock::new();
    NAMES.get_or_init(|| invert_map(mnemonic_table()))
}

/// Swaps the keys and values of a map.
/// If several keys share a value, which one survives is unspecified.
pub fn invert_map<K, V>(map: &HashMap<K, V>) -> HashMap<V, K>
where
    K: Clone,
    V: Clone + Eq + Hash,
{
    map.iter().map(|(k, v)| (v.clone(), k.clone())).collect()
}

impl OpCode {
    /// Looks up a mnemonic, ignoring case.
    pub fn from_mnemonic(text: &str) -> Option<OpCode> {
        mnemonic_table().get(text.to_uppercase().as_str()).copied()
    }

    /// Returns the canonical upper-case mnemonic.
    pub fn mnemonic(self) -> &'static str {
        name_table().get(&self).copied().unwrap_or("????")
    }

    /// Whether the assembler expects a literal to follow this instruction.
    pub fn requires_argument(self) -> bool {
        use OpCode::*;
        matches!(self, SETA | SETI | JUMP | JNEQ)
    }

    /// Whether executing this opcode consumes the following word. This is a
    /// superset of `requires_argument`: JINZ, LDAI and CMPI read an operand
    /// but the assembler does not insist on one.
    pub fn has_operand(self) -> bool {
        use OpCode::*;
        self.requires_argument() || matches!(self, JINZ | LDAI | CMPI)
    }

    /// The machine word this opcode is stored as.
    pub fn word(self) -> Word {
        self as Word
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.mnemonic())
    }
}

impl TryFrom<Word> for OpCode {
    type Error = Word;

    fn try_from(value: Word) -> Result<Self, Self::Error> {
        use OpCode::*;
        match value {
            0 => Ok(HALT),
            1 => Ok(NOOP),
            2 => Ok(INCA),
            3 => Ok(DECA),
            4 => Ok(SETA),
            5 => Ok(SETI),
            6 => Ok(DECI),
            7 => Ok(JINZ),
            8 => Ok(MVAY),
            9 => Ok(ADXY),
            10 => Ok(MVAX),
            11 => Ok(MVYA),
            12 => Ok(OUTA),
            13 => Ok(JUMP),
            14 => Ok(INCI),
            15 => Ok(LDAI),
            16 => Ok(CMPI),
            17 => Ok(JNEQ),
            _ => Err(value),
        }
    }
}
