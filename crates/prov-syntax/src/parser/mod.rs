//! Recursive-descent parser.
//!
//! `ParserState` methods are split by concern, the same way across files:
//! - `state.rs`: token cursor, diagnostics, speculation, recovery
//! - `state_types.rs`: type syntax (kept as text, never allocated as nodes)
//! - `state_declarations.rs`: namespaces, type declarations, members
//! - `state_statements.rs`: statements and local declarations
//! - `state_expressions.rs`: expressions by precedence

mod state;
mod state_declarations;
mod state_expressions;
mod state_statements;
mod state_types;

pub use state::ParserState;
