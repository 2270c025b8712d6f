//! The G-machine: a word-addressed virtual CPU.
//!
//! Memory is a flat array of 64-bit words holding both the program and its
//! data. Execution starts at address zero and fetches one word at a time;
//! instructions which take an operand fetch it from the following word.
//! All register arithmetic wraps.

pub mod debug;

use std::convert::TryFrom;
use std::io::{self, BufRead, Stdout, StdinLock, Write};
use std::path::Path;

use thiserror::Error;

use crate::assembler::{self, OpCode};
use crate::Word;

/// Number of words of memory allocated to a new machine.
pub const DEFAULT_MEM_SIZE: usize = 1024;

#[derive(Debug, Error)]
pub enum MachineError {
    #[error("unknown opcode {0}")]
    UnknownOpcode(Word),
    #[error("address {0} is outside of memory")]
    AddressOutOfRange(Word),
    #[error("program of {len} words does not fit in {capacity} words of memory")]
    ProgramTooLarge { len: usize, capacity: usize },
    #[error("A holds {0}, which is not a character")]
    InvalidCharacter(Word),
    #[error("debugger input closed")]
    DebuggerDetached,
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

pub struct Machine<R = StdinLock<'static>, W = Stdout> {
    pub memory: Vec<Word>,
    /// Accumulator.
    pub a: Word,
    /// Index register.
    pub i: Word,
    /// Program counter.
    pub p: Word,
    pub x: Word,
    pub y: Word,
    /// Set by CMPI, read by JNEQ.
    pub z: bool,
    /// Read by the debugger, one line per step.
    pub input: R,
    /// Receives OUTA characters and debugger snapshots.
    pub output: W,
    /// Pause before every instruction when set.
    pub debug: bool,
}

impl Machine {
    /// A machine with default memory, bound to the process's stdin and stdout.
    pub fn new() -> Self {
        Machine::with_io(io::stdin().lock(), io::stdout())
    }
}

impl Default for Machine {
    fn default() -> Self {
        Machine::new()
    }
}

impl<R: BufRead, W: Write> Machine<R, W> {
    /// A machine with default memory and the given streams.
    pub fn with_io(input: R, output: W) -> Self {
        Machine {
            memory: vec![0; DEFAULT_MEM_SIZE],
            a: 0,
            i: 0,
            p: 0,
            x: 0,
            y: 0,
            z: false,
            input,
            output,
            debug: false,
        }
    }

    /// Replaces memory with `words` zeroed words.
    pub fn with_memory_size(mut self, words: usize) -> Self {
        self.memory = vec![0; words];
        self
    }

    /// Copies a program to the start of memory and points P at it.
    /// Registers and the rest of memory are left alone.
    pub fn load(&mut self, program: &[Word]) -> Result<(), MachineError> {
        if program.len() > self.memory.len() {
            return Err(MachineError::ProgramTooLarge {
                len: program.len(),
                capacity: self.memory.len(),
            });
        }

        self.memory[..program.len()].copy_from_slice(program);
        self.p = 0;
        debug!("loaded {} word(s)", program.len());
        Ok(())
    }

    /// Executes instructions until HALT or an error.
    pub fn run(&mut self) -> Result<(), MachineError> {
        loop {
            if self.debug {
                self.debug_step()?;
            }
            if !self.step()? {
                debug!("halted with P = {}", self.p);
                return Ok(());
            }
        }
    }

    /// Executes a single instruction. Returns false once HALT has executed.
    pub fn step(&mut self) -> Result<bool, MachineError> {
        let word = self.fetch()?;
        let op = OpCode::try_from(word).map_err(MachineError::UnknownOpcode)?;
        trace!("{:06}: {}", self.p.wrapping_sub(1), op);

        use OpCode::*;
        match op {
            HALT => return Ok(false),
            NOOP => {}
            INCA => self.a = self.a.wrapping_add(1),
            DECA => self.a = self.a.wrapping_sub(1),
            SETA => self.a = self.fetch()?,
            SETI => self.i = self.fetch()?,
            DECI => self.i = self.i.wrapping_sub(1),
            INCI => self.i = self.i.wrapping_add(1),
            JINZ => {
                if self.i != 0 {
                    self.p = self.fetch()?;
                } else {
                    self.p = self.p.wrapping_add(1);
                }
            }
            JUMP => self.p = self.fetch()?,
            MVAY => self.y = self.a,
            MVAX => self.x = self.a,
            MVYA => self.a = self.y,
            ADXY => self.y = self.y.wrapping_add(self.x),
            OUTA => self.output_char()?,
            LDAI => {
                let offset = self.fetch()?;
                self.a = self.read(self.i.wrapping_add(offset))?;
            }
            CMPI => {
                let value = self.fetch()?;
                self.z = self.i == value;
            }
            JNEQ => {
                if !self.z {
                    self.p = self.fetch()?;
                } else {
                    self.p = self.p.wrapping_add(1);
                }
            }
        }

        Ok(true)
    }

    /// Reads the word at P and advances P.
    pub fn fetch(&mut self) -> Result<Word, MachineError> {
        let word = self.read(self.p)?;
        self.p = self.p.wrapping_add(1);
        Ok(word)
    }

    fn read(&self, address: Word) -> Result<Word, MachineError> {
        usize::try_from(address)
            .ok()
            .and_then(|index| self.memory.get(index).copied())
            .ok_or(MachineError::AddressOutOfRange(address))
    }

    fn output_char(&mut self) -> Result<(), MachineError> {
        let c = u32::try_from(self.a)
            .ok()
            .and_then(char::from_u32)
            .ok_or(MachineError::InvalidCharacter(self.a))?;
        let mut buf = [0; 4];
        self.output.write_all(c.encode_utf8(&mut buf).as_bytes())?;
        Ok(())
    }

    /// Assembles source text, loads it and runs it.
    pub fn assemble_and_run_str(&mut self, source: &str) -> Result<(), crate::Error> {
        let program = assembler::assemble_str(source)?;
        self.load(&program)?;
        self.run()?;
        Ok(())
    }

    /// Assembles a source file, loads it and runs it.
    pub fn assemble_and_run_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), crate::Error> {
        let program = assembler::assemble_file(path)?;
        self.load(&program)?;
        self.run()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Empty;

    type TestMachine = Machine<Empty, Vec<u8>>;

    fn machine() -> TestMachine {
        Machine::with_io(io::empty(), Vec::new())
    }

    fn run_str(source: &str) -> TestMachine {
        let mut m = machine();
        m.assemble_and_run_str(source).unwrap();
        m
    }

    fn run_file(name: &str) -> TestMachine {
        let mut m = machine();
        let path = format!("{}/testdata/{}", env!("CARGO_MANIFEST_DIR"), name);
        m.assemble_and_run_file(path).unwrap();
        m
    }

    fn run_words(program: &[Word]) -> (TestMachine, Result<(), MachineError>) {
        let mut m = machine();
        m.load(program).unwrap();
        let result = m.run();
        (m, result)
    }

    #[test]
    fn test_new() {
        let m = machine();
        assert_eq!(m.memory.len(), DEFAULT_MEM_SIZE);
        assert_eq!(m.memory[DEFAULT_MEM_SIZE - 1], 0);
        assert_eq!((m.a, m.i, m.p, m.x, m.y, m.z), (0, 0, 0, 0, 0, false));
        assert!(!m.debug);

        assert_eq!(machine().with_memory_size(16).memory.len(), 16);
    }

    #[test]
    fn test_halt() {
        assert_eq!(run_str("halt").p, 1);
        assert_eq!(run_str("noop halt").p, 2);
    }

    #[test]
    fn test_inca_deca() {
        assert_eq!(run_str("inca halt").a, 1);
        assert_eq!(run_str("SETA 2;DECA;halt").a, 1);
        assert_eq!(run_str("DECA HALT").a, Word::MAX);
        assert_eq!(run_str("SETA 18446744073709551615 INCA HALT").a, 0);
    }

    #[test]
    fn test_seta() {
        let m = run_file("setaTo5.g");
        assert_eq!(m.a, 5);
        assert_eq!(m.p, 3);
        assert_eq!(run_file("subtract2from3.g").a, 1);
    }

    #[test]
    fn test_index_register() {
        assert_eq!(run_str("SETI 3 INCI INCI DECI HALT").i, 4);
        assert_eq!(run_str("DECI HALT").i, Word::MAX);
    }

    #[test]
    fn test_moves() {
        let m = run_str("SETA 7 MVAX SETA 5 MVAY ADXY MVYA HALT");
        assert_eq!((m.a, m.x, m.y), (12, 7, 12));
    }

    #[test]
    fn test_fib() {
        use OpCode::*;
        let program = [
            INCA.word(), SETI.word(), 10, MVAY.word(), ADXY.word(), MVAX.word(),
            MVYA.word(), DECI.word(), JINZ.word(), 3, HALT.word(),
        ];
        let (m, result) = run_words(&program);
        assert!(result.is_ok());
        assert_eq!(m.a, 89);
        assert_eq!(m.i, 0);
        assert_eq!(m.p, 11);

        assert_eq!(run_file("fib.g").a, 89);
    }

    #[test]
    fn test_jump() {
        let m = run_str("JUMP 4 INCA HALT INCA INCA HALT");
        assert_eq!(m.a, 2);
        assert_eq!(m.p, 7);
    }

    #[test]
    fn test_cmpi_jneq() {
        // Counts I up to 3.
        let m = run_str("INCI CMPI 3 JNEQ 0 HALT");
        assert_eq!(m.i, 3);
        assert!(m.z);
        assert_eq!(m.p, 6);
    }

    #[test]
    fn test_ldai() {
        let m = run_str("SETI 2 LDAI 5 HALT 40 41 42");
        assert_eq!(m.a, 42);

        let (_, result) = run_words(&[OpCode::LDAI.word(), DEFAULT_MEM_SIZE as Word]);
        assert!(matches!(
            result,
            Err(MachineError::AddressOutOfRange(a)) if a == DEFAULT_MEM_SIZE as Word
        ));
    }

    #[test]
    fn test_outa() {
        assert_eq!(run_file("print_char.g").output, b"A");
        assert_eq!(run_file("hello_world.g").output, b"Hello World");
        assert_eq!(String::from_utf8(run_str("SETA 'л' OUTA HALT").output).unwrap(), "л");

        let (m, result) = run_words(&[OpCode::SETA.word(), 0xD800, OpCode::OUTA.word()]);
        assert!(matches!(result, Err(MachineError::InvalidCharacter(0xD800))));
        assert!(m.output.is_empty());
    }

    #[test]
    fn test_hello_world_words() {
        let mut program = Vec::new();
        for c in "Hello World".chars() {
            program.extend_from_slice(&[OpCode::SETA.word(), c as Word, OpCode::OUTA.word()]);
        }
        program.push(OpCode::HALT.word());

        let (m, result) = run_words(&program);
        assert!(result.is_ok());
        assert_eq!(m.output, b"Hello World");
    }

    #[test]
    fn test_unknown_opcode() {
        let mut m = machine();
        m.p = Word::MAX;
        m.load(&[Word::MAX]).unwrap();
        assert_eq!(m.p, 0);

        let err = m.run().unwrap_err();
        assert!(matches!(err, MachineError::UnknownOpcode(Word::MAX)));
        assert_eq!(err.to_string(), format!("unknown opcode {}", Word::MAX));
        assert_eq!(m.p, 1);
    }

    #[test]
    fn test_run_off_the_end() {
        let mut m = machine().with_memory_size(2);
        m.load(&[OpCode::NOOP.word(), OpCode::NOOP.word()]).unwrap();
        assert!(matches!(m.run(), Err(MachineError::AddressOutOfRange(2))));

        let (m, result) = run_words(&[OpCode::JUMP.word(), Word::MAX]);
        assert!(matches!(result, Err(MachineError::AddressOutOfRange(Word::MAX))));
        assert_eq!(m.p, Word::MAX);
    }

    #[test]
    fn test_load_too_large() {
        let mut m = machine().with_memory_size(4);
        m.load(&[7, 7, 7]).unwrap();

        let err = m.load(&[1, 2, 3, 4, 5]).unwrap_err();
        assert!(matches!(err, MachineError::ProgramTooLarge { len: 5, capacity: 4 }));
        assert_eq!(m.memory, vec![7, 7, 7, 0]);
    }

    #[test]
    fn test_reload_keeps_tail_and_registers() {
        let mut m = machine();
        m.assemble_and_run_str("SETA 9 NOOP NOOP HALT").unwrap();
        m.load(&[OpCode::HALT.word()]).unwrap();

        assert_eq!(m.p, 0);
        assert_eq!(m.a, 9);
        let noop = OpCode::NOOP.word();
        let halt = OpCode::HALT.word();
        assert_eq!(&m.memory[..5], &[halt, 9, noop, noop, halt]);
    }

    #[test]
    fn test_assemble_errors_surface() {
        let mut m = machine();
        assert!(matches!(m.assemble_and_run_str("SETA HALT"), Err(crate::Error::Asm(_))));
        assert!(matches!(m.assemble_and_run_str("JUMP 5000"), Err(crate::Error::Machine(_))));
        assert!(matches!(m.assemble_and_run_file("no/such/file.g"), Err(crate::Error::Asm(_))));
    }
}
