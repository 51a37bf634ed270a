//! Syntax layer for the provenance analyser.
//!
//! - [`scanner`]: tokenizer
//! - [`node`] / [`node_arena`]: arena-allocated, immutable syntax tree
//! - [`parser`]: error-tolerant recursive-descent parser
//! - [`node_access`]: parent/ancestor navigation and position lookup
//! - [`SyntaxTree`]: a parsed unit (source, arena, diagnostics, line map)

pub mod error;
pub mod node;
pub mod node_access;
pub mod node_arena;
pub mod parser;
pub mod scanner;
mod tree;

pub use error::{ParseDiagnostic, SyntaxError};
pub use node::*;
pub use node_arena::NodeArena;
pub use tree::SyntaxTree;
