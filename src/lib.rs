//! A single-pass compiler turning embedded-expression templates into
//! compact bytecode.
//!
//! A template is literal text interleaved with expressions bracketed by a
//! configurable delimiter pair, `<` and `>` by default. Compilation splits
//! the text into chunks, parses each expression chunk exactly once, and
//! emits instructions as the parse progresses; forward jump targets inside
//! conditionals are resolved by backpatching and anonymous subtemplates are
//! compiled recursively after the enclosing template. The result is a
//! [`CompiledTemplate`] holding the bytecode and its string constant table,
//! ready for a downstream interpreter. Executing the program is out of
//! scope for this crate.
//!
//! # Syntax
//!
//! - Attributes and properties: `<name>`, `<user.name>`, `<user.(key)>`
//! - Conditionals: `<if(ok)>...<elseif(!other)>...<else>...<endif>`
//! - Template instantiation: `<box(w=width, ...)>`, indirect `<(name)()>`
//! - Map application: `<items:{it|* <it>}>`, `<rows:odd(),even()>`
//! - Lists: `<[a, b, c]>`
//! - Built-in functions: `<first(items)>`, `<trim(title)>`, ...
//! - Rendering options: `<items; separator=", ", anchor>`
//!
//! # Getting started
//!
//! One-shot compilation uses the default delimiters:
//!
//! ```
//! let template = weft::compile("Hello <name>!")?;
//! assert_eq!(template.strings(), ["Hello ", "name", "!"]);
//! assert_eq!(
//!     template.disassemble(),
//!     "\
//! 0000: load_str #0 \"Hello \"
//! 0003: write
//! 0004: load_attr #1 \"name\"
//! 0007: write
//! 0008: load_str #2 \"!\"
//! 0011: write
//! "
//! );
//! # Ok::<(), weft::Error>(())
//! ```
//!
//! A [`Compiler`] carries the delimiter configuration and keeps subtemplate
//! names unique across everything it compiles:
//!
//! ```
//! use weft::{Compiler, Delims};
//!
//! let compiler = Compiler::with_delims(Delims::new('$', '$'));
//! let template = compiler.compile("Hello $name$!")?;
//! assert_eq!(template.strings(), ["Hello ", "name", "!"]);
//! # Ok::<(), weft::Error>(())
//! ```
//!
//! Anonymous subtemplates become nested compiled templates, named in order
//! of occurrence:
//!
//! ```
//! let template = weft::compile("<items:{it|<it>}>")?;
//! let sub = &template.subtemplates()[0];
//! assert_eq!(sub.name(), Some("_sub1"));
//! assert_eq!(sub.formal_args()[0].name, "it");
//! # Ok::<(), weft::Error>(())
//! ```
//!
//! # Errors and warnings
//!
//! Unbalanced delimiters and expression syntax problems abort compilation
//! with an [`Error`] carrying an [`ErrorKind`] and the offending span.
//! Unknown option names, options without a default, and unknown function
//! names are not fatal: compilation continues and the diagnostics are
//! collected as [`Warning`]s on the artifact.
//!
//! ```
//! let template = weft::compile(r#"<x; foo="1">"#)?;
//! assert_eq!(template.warnings().len(), 1);
//! # Ok::<(), weft::Error>(())
//! ```
//!
//! # Crate features
//!
//! - **`serde`** — implements `Serialize` and `Deserialize` for the
//!   compiled artifact types so programs can be persisted.

mod compile;
mod error;
mod types;

use std::sync::atomic::AtomicUsize;

pub use crate::compile::chunk::{chunkify, Chunk, ChunkKind};
pub use crate::error::{Error, ErrorKind, Result, Warning, WarningKind};
pub use crate::types::delims::Delims;
pub use crate::types::event::{EventSink, ExprEvent};
pub use crate::types::op::{Op, Operand, RenderOption, MAX_INSTR_LEN, PREDEFINED_ATTRS};
pub use crate::types::program::{CompiledTemplate, FormalArg};
pub use crate::types::span::Span;

use crate::compile::Context;

/// Compiles templates, holding the delimiter configuration and the
/// subtemplate-naming counter.
///
/// Generated subtemplate names (`_sub1`, `_sub2`, ...) are unique across
/// every template one `Compiler` compiles, including concurrent compiles
/// from multiple threads. A fresh `Compiler` restarts the numbering.
pub struct Compiler {
    delims: Delims,
    names: AtomicUsize,
}

impl Compiler {
    /// A compiler using the default `<` `>` delimiters.
    #[inline]
    pub fn new() -> Self {
        Self::with_delims(Delims::default())
    }

    #[inline]
    pub fn with_delims(delims: Delims) -> Self {
        Self {
            delims,
            names: AtomicUsize::new(0),
        }
    }

    #[inline]
    pub fn delims(&self) -> Delims {
        self.delims
    }

    /// Compile `source` into a [`CompiledTemplate`].
    pub fn compile(&self, source: &str) -> Result<CompiledTemplate> {
        let cx = Context {
            delims: self.delims,
            names: &self.names,
        };
        compile::template(&cx, source, 0, None)
    }
}

impl Default for Compiler {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

/// Compile a template with the default delimiters.
///
/// Equivalent to `Compiler::new().compile(source)`.
#[inline]
pub fn compile(source: &str) -> Result<CompiledTemplate> {
    Compiler::new().compile(source)
}
