//! Defines a [`CompiledTemplate`], the immutable artifact produced by
//! compilation and executed later by an interpreter.

use std::fmt::Write as _;

use crate::error::Warning;
use crate::types::op::{Op, Operand};
use crate::types::span::Span;

/// A compiled template: bytecode, its string constant table, and any nested
/// subtemplates compiled along with it.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompiledTemplate {
    pub(crate) name: Option<String>,
    pub(crate) source: String,
    pub(crate) span: Span,
    pub(crate) code: Vec<u8>,
    pub(crate) strings: Vec<String>,
    pub(crate) subtemplates: Vec<CompiledTemplate>,
    pub(crate) formal_args: Vec<FormalArg>,
    pub(crate) enclosing_expr: Option<Span>,
    pub(crate) warnings: Vec<Warning>,
}

/// A formal argument a subtemplate binds its input to.
///
/// Subtemplates currently accept at most one formal argument; a clause
/// declaring more records none at all.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FormalArg {
    pub name: String,
}

impl CompiledTemplate {
    /// The generated name, present only on subtemplates.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The verbatim source text this template was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Byte range of this template within the enclosing template source.
    pub fn span(&self) -> Span {
        self.span
    }

    /// The emitted bytecode, truncated to exactly the written instructions.
    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn code_size(&self) -> usize {
        self.code.len()
    }

    /// The string constant table; instruction operands index into it.
    pub fn strings(&self) -> &[String] {
        &self.strings
    }

    /// Nested anonymous subtemplates in order of first occurrence.
    pub fn subtemplates(&self) -> &[CompiledTemplate] {
        &self.subtemplates
    }

    pub fn formal_args(&self) -> &[FormalArg] {
        &self.formal_args
    }

    /// Span of the expression chunk a subtemplate occurred in, if any.
    pub fn enclosing_expr(&self) -> Option<Span> {
        self.enclosing_expr
    }

    /// Non-fatal diagnostics raised while compiling this template. Nested
    /// subtemplates keep their own.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Render the bytecode as one instruction per line, with string
    /// operands resolved against the constant table.
    pub fn disassemble(&self) -> String {
        let mut out = String::new();
        let mut ip = 0;
        while ip < self.code.len() {
            let byte = self.code[ip];
            let _ = write!(out, "{ip:04}: ");
            let op = match Op::from_byte(byte) {
                Some(op) => op,
                None => {
                    let _ = writeln!(out, ".byte {byte}");
                    ip += 1;
                    continue;
                }
            };
            let _ = write!(out, "{}", op.mnemonic());
            if op.operand() != Operand::None {
                let operand = match self.code.get(ip + 1..ip + 3) {
                    Some(bytes) => u16::from_be_bytes([bytes[0], bytes[1]]),
                    None => break,
                };
                match op.operand() {
                    Operand::Str => {
                        let _ = write!(out, " #{operand}");
                        if let Some(s) = self.strings.get(operand as usize) {
                            let _ = write!(out, " {s:?}");
                        }
                    }
                    Operand::Int => {
                        let _ = write!(out, " {operand}");
                    }
                    Operand::Addr => {
                        let _ = write!(out, " @{operand}");
                    }
                    Operand::None => unreachable!(),
                }
            }
            out.push('\n');
            ip += op.width();
        }
        out
    }
}
