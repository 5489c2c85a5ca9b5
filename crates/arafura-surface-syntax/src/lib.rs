//! Surface-syntax translation from Python-shaped source to C.
//!
//! `arafura-surface-syntax` reads files that parse under a standard Python
//! parser and lowers them to C99/C11 text. The surface grammar is borrowed;
//! the meaning is not - every C construct is recognised by a local syntactic
//! pattern on the AST, with no type environment and no name resolution.
//!
//! # Architecture
//!
//! ```text
//! Source            AST              C text
//! ──────────    ─────────────    ─────────────
//! input.py  ──> Module (ast.rs) ──> CWriter ──> output.c
//!               via tree-sitter     tag pre-pass,
//!               (input/python.rs)   lowering walk
//!                                   (output/c/)
//! ```
//!
//! # Example
//!
//! ```ignore
//! let c = arafura_surface_syntax::transpile("x: int = 5\npx: -int = W.x")?;
//! // => "int x = 5;\nint *px = &x;\n"
//! ```
//!
//! The only state threaded through the lowering walk is the tag set (which
//! composite names exist, and which are typedef'd) and the contextual-type
//! stack that resolves wildcard compound literals. Everything else is local
//! to the node being lowered.

pub mod ast;
pub mod error;
pub mod input;
pub mod output;

// Re-exports: AST types
pub use ast::{BinOp, BoolOp, ClassDef, CmpOp, Expr, ExprKind, FunctionDef, Module, Span, Stmt, StmtKind, UnaryOp};

// Re-exports: Errors
pub use error::{LowerError, ReadError, TranslateError};

// Re-exports: Reader and writer
pub use input::read_python;
pub use output::CWriter;

/// Translate source text to C in one call.
pub fn transpile(source: &str) -> Result<String, TranslateError> {
    let module = read_python(source)?;
    Ok(CWriter::emit(&module)?)
}
