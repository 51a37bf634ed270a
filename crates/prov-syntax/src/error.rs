//! Parser diagnostics and errors.

use prov_common::Span;
use serde::Serialize;

/// A recoverable syntax error. Parsing continues after recording one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message} ({}..{})", .span.start, .span.end)]
pub struct ParseDiagnostic {
    pub span: Span,
    pub message: String,
}

impl ParseDiagnostic {
    pub fn new(span: Span, message: impl Into<String>) -> ParseDiagnostic {
        ParseDiagnostic {
            span,
            message: message.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SyntaxError {
    /// Node spans are `u32` offsets.
    #[error("source is {len} bytes; at most {max} bytes are supported")]
    SourceTooLarge { len: usize, max: usize },

    #[error("{count} syntax error(s); first: {first}")]
    Diagnostics { count: usize, first: ParseDiagnostic },
}
