//! Error types for reading and lowering.

use crate::ast::Span;

/// Error that can occur when reading source code into the AST.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("{span}: syntax error")]
    Syntax { span: Span },

    #[error("{span}: unsupported syntax: {kind}")]
    Unsupported { span: Span, kind: String },
}

/// Error raised by the lowering walk. Every variant aborts the translation;
/// no partial output is produced.
#[derive(Debug, thiserror::Error)]
pub enum LowerError {
    #[error("{span}: expected {expected}, got {found}")]
    UnrecognisedPattern {
        span: Span,
        expected: &'static str,
        found: String,
    },

    #[error("{span}: compound literal used outside a declaration context")]
    MissingContext { span: Span },

    #[error("{span}: {message}")]
    AnnotationMismatch { span: Span, message: String },

    #[error("{span}: reserved name `{name}` used as an ordinary identifier")]
    ReservedMisuse { span: Span, name: String },

    #[error("{span}: unknown decorator `{name}`")]
    UnknownDecorator { span: Span, name: String },
}

/// Either phase of a full source-to-C translation.
#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error(transparent)]
    Read(#[from] ReadError),

    #[error(transparent)]
    Lower(#[from] LowerError),
}
