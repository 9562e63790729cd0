//! Instruction field layout and per-opcode semantics.
//!
//! Field extraction itself is generic bit-twiddling and lives in
//! `bitpack`; this module only names the five fields a UM instruction
//! word is built from and implements the fifteen opcodes against a
//! [`Vm`](crate::vm::Vm).

use bitpack::bitpack::getu;

use crate::error::UmError;
use crate::vm::Vm;
use std::io::{Read, Write};

/// A bit field within an instruction word: `width` bits starting at the
/// least-significant bit `lsb`.
pub struct Field {
    width: u32,
    lsb: u32,
}

pub static RA: Field = Field { width: 3, lsb: 6 };
pub static RB: Field = Field { width: 3, lsb: 3 };
pub static RC: Field = Field { width: 3, lsb: 0 };
pub static RL: Field = Field { width: 3, lsb: 25 };
pub static VL: Field = Field { width: 25, lsb: 0 };
pub static OP: Field = Field { width: 4, lsb: 28 };

/// Extracts `field` from `instruction`.
pub fn get(field: &Field, instruction: u32) -> u32 {
    getu(instruction as u64, field.width as u64, field.lsb as u64) as u32
}

/// Extracts the opcode (bits 28–31).
pub fn opcode(instruction: u32) -> u32 {
    get(&OP, instruction)
}

/// Opcode 0: conditional move. `r[A] <- r[B]` iff `r[C] != 0`.
pub fn cond_move(vm: &mut Vm<impl Read, impl Write>, a: usize, b: usize, c: usize) {
    if vm.registers[c] != 0 {
        vm.registers[a] = vm.registers[b];
    }
}

/// Opcode 1: segmented load. `r[A] <- segment[r[B]][r[C]]`.
pub fn seg_load(
    vm: &mut Vm<impl Read, impl Write>,
    a: usize,
    b: usize,
    c: usize,
) -> Result<(), UmError> {
    let pc = vm.pc;
    vm.registers[a] = vm.segments.get(vm.registers[b], vm.registers[c], pc)?;
    Ok(())
}

/// Opcode 2: segmented store. `segment[r[A]][r[B]] <- r[C]`.
pub fn seg_store(
    vm: &mut Vm<impl Read, impl Write>,
    a: usize,
    b: usize,
    c: usize,
) -> Result<(), UmError> {
    let pc = vm.pc;
    vm.segments
        .set(vm.registers[a], vm.registers[b], vm.registers[c], pc)
}

/// Opcode 3: `r[A] <- (r[B] + r[C]) mod 2^32`.
pub fn add(vm: &mut Vm<impl Read, impl Write>, a: usize, b: usize, c: usize) {
    vm.registers[a] = vm.registers[b].wrapping_add(vm.registers[c]);
}

/// Opcode 4: `r[A] <- (r[B] * r[C]) mod 2^32`.
pub fn mul(vm: &mut Vm<impl Read, impl Write>, a: usize, b: usize, c: usize) {
    vm.registers[a] = vm.registers[b].wrapping_mul(vm.registers[c]);
}

/// Opcode 5: `r[A] <- floor(r[B] / r[C])`. Fatal if `r[C] == 0`.
pub fn div(
    vm: &mut Vm<impl Read, impl Write>,
    a: usize,
    b: usize,
    c: usize,
) -> Result<(), UmError> {
    if vm.registers[c] == 0 {
        return Err(UmError::DivisionByZero { pc: vm.pc });
    }
    vm.registers[a] = vm.registers[b] / vm.registers[c];
    Ok(())
}

/// Opcode 6: `r[A] <- NOT(r[B] AND r[C])`.
pub fn nand(vm: &mut Vm<impl Read, impl Write>, a: usize, b: usize, c: usize) {
    vm.registers[a] = !(vm.registers[b] & vm.registers[c]);
}

/// Opcode 7: halt. Releasing segments is the engine's job on the way out
/// of the dispatch loop; this only raises the flag.
pub fn halt(vm: &mut Vm<impl Read, impl Write>) {
    vm.halted = true;
}

/// Opcode 8: map a fresh segment of length `r[C]` words, placing its id
/// into `r[B]`.
pub fn map_segment(vm: &mut Vm<impl Read, impl Write>, b: usize, c: usize) {
    vm.registers[b] = vm.segments.map(vm.registers[c]);
}

/// Opcode 9: unmap segment `r[C]`.
pub fn unmap_segment(vm: &mut Vm<impl Read, impl Write>, c: usize) -> Result<(), UmError> {
    let pc = vm.pc;
    vm.segments.unmap(vm.registers[c], pc)
}

/// Opcode 10: write `r[C]` as a byte to the output stream. `r[C]` must be
/// `<= 255`.
pub fn output(vm: &mut Vm<impl Read, impl Write>, c: usize) -> Result<(), UmError> {
    let value = vm.registers[c];
    if value > 255 {
        return Err(UmError::OutputOutOfRange { pc: vm.pc, value });
    }
    vm.output
        .write_all(&[value as u8])
        .expect("write to output stream failed");
    vm.output.flush().expect("flush of output stream failed");
    Ok(())
}

/// Opcode 11: read one byte from the input stream into `r[C]`; on
/// end-of-input, `r[C]` becomes `0xFFFFFFFF`.
pub fn input(vm: &mut Vm<impl Read, impl Write>, c: usize) {
    let mut byte = [0u8; 1];
    vm.registers[c] = match vm.input.read(&mut byte) {
        Ok(1) => byte[0] as u32,
        _ => u32::MAX,
    };
}

/// Opcode 12: load program. If `r[B] != 0`, duplicate segment `r[B]`
/// over segment 0; in all cases set `pc <- r[C]`.
pub fn load_program(
    vm: &mut Vm<impl Read, impl Write>,
    b: usize,
    c: usize,
) -> Result<(), UmError> {
    let source = vm.registers[b];
    // The engine reads program length straight from the segment store
    // (`Vm::program_len`), so the returned length only needs checking here,
    // not stashing.
    vm.segments.duplicate_to_zero(source, vm.pc)?;
    vm.pc = vm.registers[c];
    Ok(())
}

/// Opcode 13: load value. `r[A] <- literal` (25-bit zero-extended).
pub fn load_value(vm: &mut Vm<impl Read, impl Write>, a: usize, literal: u32) {
    vm.registers[a] = literal;
}
