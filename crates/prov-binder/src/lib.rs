//! Name binding for the provenance resolver.
//!
//! - [`symbols`]: symbol arena, kinds and effective accessibility
//! - [`oracle`]: the [`BindingOracle`] trait the resolver consumes
//! - [`BinderState`]: the reference oracle over one parsed unit
//!
//! Binding state is split across `state_*.rs` files by pass:
//! declarations, then bodies and statements, then expressions.

pub mod oracle;
mod state;
mod state_binding;
mod state_declarations;
mod state_expressions;
pub mod symbols;

pub use oracle::{BindingOracle, WriteKind, WriteSite};
pub use state::{BinderOptions, BinderState, OverloadSet};
pub use symbols::{Accessibility, Symbol, SymbolArena, SymbolId, SymbolKind};
