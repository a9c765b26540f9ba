//! Compile template text into a bytecode program.
//!
//! This process has three stages:
//! - The chunkifier splits the template into literal and expression chunks.
//! - Each expression chunk is parsed once, producing semantic events.
//! - The code generator translates events into instructions as they arrive,
//!   resolving forward jumps by backpatching and deferring anonymous
//!   subtemplates until the enclosing template is done.

pub mod chunk;
mod code;
mod lex;
mod parse;
mod strings;

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::compile::chunk::{chunkify, ChunkKind};
use crate::compile::code::{Code, PLACEHOLDER};
use crate::compile::strings::StringTable;
use crate::error::{Error, Result, Warning, WarningKind};
use crate::types::delims::Delims;
use crate::types::event::{EventSink, ExprEvent};
use crate::types::op::{Op, RenderOption, PREDEFINED_ATTRS};
use crate::types::program::{CompiledTemplate, FormalArg};
use crate::types::span::Span;

/// State threaded through a top-level compile and every nested one.
///
/// The name counter is the only state shared between the per-template
/// generators; it must be monotonic across them so generated subtemplate
/// names never collide.
pub(crate) struct Context<'c> {
    pub delims: Delims,
    pub names: &'c AtomicUsize,
}

/// Compile one template. `start` is the byte offset of `source` within the
/// top-level template it came from; `enclosing_expr` is the span of the
/// expression chunk a subtemplate occurred in.
pub(crate) fn template(
    cx: &Context<'_>,
    source: &str,
    start: usize,
    enclosing_expr: Option<Span>,
) -> Result<CompiledTemplate> {
    let chunks = chunkify(source, cx.delims)?;
    let mut gen = Generator::new(source, cx.names);

    for chunk in &chunks {
        match chunk.kind {
            ChunkKind::Literal => {
                gen.emit_str(Op::LoadStr, chunk.text);
                gen.code.emit(Op::Write);
            }
            ChunkKind::Expr => {
                gen.chunk = chunk.span;
                gen.control = false;
                gen.options = false;
                parse::expr(source, chunk.span, &mut gen)?;
                if !gen.control {
                    let op = if gen.options { Op::WriteOpt } else { Op::Write };
                    gen.code.emit(op);
                }
            }
        }
    }

    if let Some(frame) = gen.ifs.last() {
        return Err(Error::syntax("unclosed `if`", source, frame.open));
    }

    let pending = std::mem::take(&mut gen.pending);
    let mut template = CompiledTemplate {
        name: None,
        source: source.to_string(),
        span: Span::new(start, start + source.len()),
        code: gen.code.finish(),
        strings: gen.strings.into_vec(),
        subtemplates: Vec::new(),
        formal_args: Vec::new(),
        enclosing_expr,
        warnings: gen.warnings,
    };

    // Subtemplates found along the way compile now, each with a fresh
    // generator; their names were fixed at discovery so the instructions
    // referencing them are already emitted.
    for sub in pending {
        template.subtemplates.push(subtemplate(cx, start, sub)?);
    }
    Ok(template)
}

fn subtemplate(cx: &Context<'_>, start: usize, sub: PendingSub<'_>) -> Result<CompiledTemplate> {
    let (formal_args, body_offset) = parse_formal_args(sub.raw);
    let after = &sub.raw[body_offset..];
    let lead = after.len() - after.trim_start().len();
    let body = after.trim();
    let body_start = start + sub.start + body_offset + lead;

    let enclosing = Span::new(start + sub.enclosing.m, start + sub.enclosing.n);
    let mut compiled = template(cx, body, body_start, Some(enclosing))?;
    compiled.name = Some(sub.name);
    compiled.formal_args = formal_args;
    Ok(compiled)
}

/// Recognize a leading `name |` formal-argument clause.
///
/// Only a single argument is supported; a clause with more than one name,
/// or a name outside the attribute-name pattern, records no argument and
/// the clause text stays part of the body. Returns the recognized
/// arguments and the offset the body starts at within `raw`.
fn parse_formal_args(raw: &str) -> (Vec<FormalArg>, usize) {
    let pipe = match raw.find('|') {
        Some(pipe) => pipe,
        None => return (Vec::new(), 0),
    };
    let elems: Vec<&str> = raw[..pipe]
        .split([' ', ','])
        .filter(|s| !s.is_empty())
        .collect();
    match elems.as_slice() {
        [name] if is_attr_name(name) => {
            let arg = FormalArg {
                name: name.to_string(),
            };
            (vec![arg], pipe + 1)
        }
        _ => (Vec::new(), 0),
    }
}

// The attribute-name pattern: [a-zA-Z/][a-zA-Z0-9_/]*
fn is_attr_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '/' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '/')
}

/// Per-template code generation state, exclusively owned by one
/// [`template`] call. Translates the event stream into instructions.
struct Generator<'c, 's> {
    source: &'s str,
    names: &'c AtomicUsize,
    code: Code,
    strings: StringTable,
    ifs: Vec<IfFrame>,
    pending: Vec<PendingSub<'s>>,
    warnings: Vec<Warning>,
    /// Span of the expression chunk currently compiling.
    chunk: Span,
    /// Whether the current chunk is conditional control flow.
    control: bool,
    /// Whether the current chunk opened a rendering-options block.
    options: bool,
}

/// Bookkeeping for one open conditional region.
///
/// Patch targets are indices into the instruction buffer, so buffer growth
/// cannot invalidate them.
struct IfFrame {
    /// Where the `if` chunk began, for reporting an unclosed conditional.
    open: Span,
    /// Operand offset of the branch emitted for the current clause's
    /// condition, awaiting the start address of the next clause.
    pending_branch: Option<usize>,
    /// Operand offsets of the jumps emitted at each clause end, all
    /// awaiting the end address of the whole conditional.
    end_refs: Vec<usize>,
}

/// An anonymous subtemplate occurrence, compiled after the enclosing
/// template so its name could be referenced at the point of occurrence.
struct PendingSub<'s> {
    name: String,
    /// Un-stripped text between the braces.
    raw: &'s str,
    /// Offset of `raw` within the enclosing template source.
    start: usize,
    /// The expression chunk it occurred in.
    enclosing: Span,
}

impl<'c, 's> Generator<'c, 's> {
    fn new(source: &'s str, names: &'c AtomicUsize) -> Self {
        Self {
            source,
            names,
            code: Code::for_template(source.len()),
            strings: StringTable::new(),
            ifs: Vec::new(),
            pending: Vec::new(),
            warnings: Vec::new(),
            chunk: Span::new(0, 0),
            control: false,
            options: false,
        }
    }

    fn emit_str(&mut self, op: Op, s: &str) {
        let i = self.strings.add(s);
        self.code.emit1(op, i as u16);
    }

    fn warn(&mut self, kind: WarningKind) {
        self.warnings.push(Warning {
            kind,
            span: self.chunk,
        });
    }

    fn mismatch(&self, what: &str) -> Error {
        Error::syntax(format!("`{what}` with no open `if`"), self.source, self.chunk)
    }
}

impl<'c, 's> EventSink<'s> for Generator<'c, 's> {
    fn event(&mut self, event: ExprEvent<'s>) -> Result<()> {
        match event {
            ExprEvent::IfStart => {
                self.control = true;
                self.ifs.push(IfFrame {
                    open: self.chunk,
                    pending_branch: None,
                    end_refs: Vec::new(),
                });
            }
            ExprEvent::IfCond { negated } | ExprEvent::ElseIfCond { negated } => {
                let pos = self.code.pos();
                let frame = match self.ifs.last_mut() {
                    Some(frame) => frame,
                    None => return Err(self.mismatch("elseif")),
                };
                frame.pending_branch = Some(pos + 1);
                let op = if negated { Op::Brt } else { Op::Brf };
                self.code.emit1(op, PLACEHOLDER);
            }
            ExprEvent::ElseIf | ExprEvent::Else => {
                self.control = true;
                let what = if matches!(event, ExprEvent::Else) { "else" } else { "elseif" };
                let pos = self.code.pos();
                let frame = match self.ifs.last_mut() {
                    Some(frame) => frame,
                    None => return Err(self.mismatch(what)),
                };
                frame.end_refs.push(pos + 1);
                let pending = frame.pending_branch.take();
                self.code.emit1(Op::Br, PLACEHOLDER);
                if let Some(at) = pending {
                    // the untaken branch lands here, after the jump out
                    self.code.patch(at, self.code.pos() as u16);
                }
            }
            ExprEvent::EndIf => {
                self.control = true;
                let frame = match self.ifs.pop() {
                    Some(frame) => frame,
                    None => return Err(self.mismatch("endif")),
                };
                let end = self.code.pos() as u16;
                if let Some(at) = frame.pending_branch {
                    self.code.patch(at, end);
                }
                for at in frame.end_refs {
                    self.code.patch(at, end);
                }
            }
            ExprEvent::Attr(name) => {
                if PREDEFINED_ATTRS.contains(&name) {
                    self.emit_str(Op::LoadLocal, name);
                } else {
                    self.emit_str(Op::LoadAttr, name);
                }
            }
            ExprEvent::Prop(Some(name)) => self.emit_str(Op::LoadProp, name),
            ExprEvent::Prop(None) => self.code.emit(Op::LoadPropInd),
            ExprEvent::Str(value) => self.emit_str(Op::LoadStr, &value),
            ExprEvent::Instantiate(Some(name)) => self.emit_str(Op::New, name),
            ExprEvent::Instantiate(None) => self.code.emit(Op::NewInd),
            ExprEvent::Map => self.code.emit(Op::Map),
            ExprEvent::MapAlternating(n) => self.code.emit1(Op::RotMap, n as u16),
            ExprEvent::ListStart => self.code.emit(Op::List),
            ExprEvent::ListAppend => self.code.emit(Op::Add),
            ExprEvent::OptionsStart => {
                self.options = true;
                self.code.emit(Op::Options);
            }
            ExprEvent::SetOption(name) => match RenderOption::from_name(name) {
                Some(opt) => self.code.emit1(Op::StoreOption, opt as u16),
                None => self.warn(WarningKind::UnknownOption(name.to_string())),
            },
            ExprEvent::DefaultOption(name) => {
                let value = RenderOption::from_name(name).and_then(RenderOption::default_value);
                match value {
                    Some(value) => self.emit_str(Op::LoadStr, value),
                    None => self.warn(WarningKind::NoOptionDefault(name.to_string())),
                }
            }
            ExprEvent::SetArg(Some(name)) => self.emit_str(Op::StoreAttr, name),
            ExprEvent::SetArg(None) => self.code.emit(Op::StoreSoleArg),
            ExprEvent::PassThrough => self.code.emit(Op::SetPassThru),
            ExprEvent::Call(name) => match Op::for_function(name) {
                Some(op) => self.code.emit(op),
                None => {
                    // keep the operand stack shape consistent for the
                    // interpreter
                    self.warn(WarningKind::UnknownFunction(name.to_string()));
                    self.code.emit(Op::Noop);
                }
            },
            ExprEvent::ToStr => self.code.emit(Op::ToStr),
            ExprEvent::Subtemplate { raw, start } => {
                // named at discovery so the reference can be emitted now;
                // the body compiles after the enclosing template
                let n = self.names.fetch_add(1, Ordering::Relaxed) + 1;
                let name = format!("_sub{n}");
                self.pending.push(PendingSub {
                    name: name.clone(),
                    raw,
                    start,
                    enclosing: self.chunk,
                });
                self.emit_str(Op::New, &name);
            }
        }
        Ok(())
    }
}
