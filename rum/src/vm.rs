//! The execution engine: registers, program counter, segment store, and
//! the fetch-decode-dispatch loop.

use std::io::{Read, Write};
use std::path::Path;

use crate::error::UmError;
use crate::instructs::{self, RA, RB, RC, RL, VL};
use crate::loader;
use crate::segments::SegmentStore;

/// Owns every piece of machine state: the register file, program
/// counter, halted flag, and segment store. `R`/`W` are the host input
/// and output streams, generic so tests can drive the machine against
/// in-memory buffers instead of real stdio.
pub struct Vm<R, W> {
    pub registers: [u32; 8],
    pub segments: SegmentStore,
    pub pc: u32,
    pub halted: bool,
    pub input: R,
    pub output: W,
}

impl<R: Read, W: Write> Vm<R, W> {
    /// Builds a machine whose segment 0 is `program`, reading from
    /// `input` and writing to `output`.
    pub fn with_io(program: Vec<u32>, input: R, output: W) -> Self {
        Vm {
            registers: [0; 8],
            segments: SegmentStore::new(program),
            pc: 0,
            halted: false,
            input,
            output,
        }
    }

    /// Current program length: the live length of segment 0, which a
    /// load-program duplication can change mid-run.
    pub fn program_len(&self) -> usize {
        self.segments.program_len()
    }

    /// Fetches, decodes, and applies exactly one instruction.
    pub fn step(&mut self) -> Result<(), UmError> {
        let pc = self.pc;
        let word = self.segments.get(0, pc, pc)?;
        self.pc += 1;

        let op = instructs::opcode(word);
        log::debug!("pc={pc} opcode={op} word={word:#010x}");
        match op {
            0 => instructs::cond_move(self, a(word), b(word), c(word)),
            1 => instructs::seg_load(self, a(word), b(word), c(word))?,
            2 => instructs::seg_store(self, a(word), b(word), c(word))?,
            3 => instructs::add(self, a(word), b(word), c(word)),
            4 => instructs::mul(self, a(word), b(word), c(word)),
            5 => instructs::div(self, a(word), b(word), c(word))?,
            6 => instructs::nand(self, a(word), b(word), c(word)),
            7 => instructs::halt(self),
            8 => instructs::map_segment(self, b(word), c(word)),
            9 => instructs::unmap_segment(self, c(word))?,
            10 => instructs::output(self, c(word))?,
            11 => instructs::input(self, c(word)),
            12 => instructs::load_program(self, b(word), c(word))?,
            13 => {
                let reg = instructs::get(&RL, word) as usize;
                let literal = instructs::get(&VL, word);
                instructs::load_value(self, reg, literal);
            }
            _ => return Err(UmError::InvalidOpcode { opcode: op, pc }),
        }
        Ok(())
    }

    /// Runs the dispatch loop until the halted flag is set or the
    /// program counter runs off the end of segment 0 (natural end).
    pub fn run(&mut self) -> Result<(), UmError> {
        log::info!("starting program ({} words)", self.program_len());
        while !self.halted && (self.pc as usize) < self.program_len() {
            self.step()?;
        }
        log::info!(
            "program {} at pc={}",
            if self.halted { "halted" } else { "ended" },
            self.pc
        );
        Ok(())
    }
}

fn a(word: u32) -> usize {
    instructs::get(&RA, word) as usize
}

fn b(word: u32) -> usize {
    instructs::get(&RB, word) as usize
}

fn c(word: u32) -> usize {
    instructs::get(&RC, word) as usize
}

/// Loads `program_path` and runs it to completion against real stdio.
///
/// This is the one operation the engine exposes publicly, per the
/// component design: construct, load, dispatch, teardown. Segment
/// storage is released implicitly when the returned `Vm` (or this
/// function's local one) is dropped.
pub fn run(program_path: &Path) -> Result<(), UmError> {
    let program = loader::load(program_path)?;
    let mut vm = Vm::with_io(program, std::io::stdin(), std::io::stdout());
    vm.run()
}
