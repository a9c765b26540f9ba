//! The growable instruction buffer the compiler emits into.

use crate::types::op::{Op, MAX_INSTR_LEN};

/// Written in place of a forward jump target that is not yet known; every
/// occurrence is overwritten before compilation completes.
pub const PLACEHOLDER: u16 = u16::MAX;

/// Expected ratio of template text length to emitted code length, used to
/// size the initial buffer.
const CODE_SIZE_FACTOR: usize = 5;

/// A byte buffer with a write cursor. Operands are 2 bytes, big-endian,
/// written high byte first.
#[derive(Debug)]
pub struct Code {
    buf: Vec<u8>,
    ip: usize,
}

impl Code {
    /// A buffer sized for compiling `template_len` bytes of source.
    pub fn for_template(template_len: usize) -> Self {
        let initial = usize::max(5, template_len / CODE_SIZE_FACTOR);
        Self {
            buf: vec![0; initial],
            ip: 0,
        }
    }

    /// The current write position, which is also the address the next
    /// instruction will be emitted at.
    pub fn pos(&self) -> usize {
        self.ip
    }

    /// Emit an opcode-only instruction.
    pub fn emit(&mut self, op: Op) {
        self.ensure_capacity();
        self.buf[self.ip] = op as u8;
        self.ip += 1;
    }

    /// Emit an instruction with a 2-byte operand.
    pub fn emit1(&mut self, op: Op, operand: u16) {
        self.ensure_capacity();
        self.buf[self.ip] = op as u8;
        self.write_short(self.ip + 1, operand);
        self.ip += MAX_INSTR_LEN;
    }

    /// Overwrite the operand previously written at `index`.
    pub fn patch(&mut self, index: usize, value: u16) {
        self.write_short(index, value);
    }

    /// The buffer truncated to exactly the written instructions.
    pub fn finish(mut self) -> Vec<u8> {
        self.buf.truncate(self.ip);
        self.buf
    }

    fn write_short(&mut self, index: usize, value: u16) {
        let [hi, lo] = value.to_be_bytes();
        self.buf[index] = hi;
        self.buf[index + 1] = lo;
    }

    // Doubles the buffer whenever a full-width instruction might not fit,
    // preserving everything already written.
    fn ensure_capacity(&mut self) {
        if self.ip + MAX_INSTR_LEN >= self.buf.len() {
            self.buf.resize(self.buf.len() * 2, 0);
        }
    }
}
