//! Value-provenance resolution.
//!
//! Given an expression in a bound compilation unit, [`ProvenanceResolver`]
//! reports every way its value could have been produced: literals, object
//! creation, member reads, computed getters and methods, constructor
//! arguments, `out`/`ref` writes, and values that may arrive from outside
//! the unit. The result is an ordered [`Provenance`] of
//! [`ProvenanceEntry`] steps, outer steps first.
//!
//! - [`kind`]: the [`SourceKind`] taxonomy
//! - [`walker`]: write-site and call-site collection, position-sensitive for
//!   fields and properties
//! - [`recursion`]: cycle, depth and work limits
//! - `classify` / `context`: one step per visited node, driven from an
//!   explicit task stack
//!
//! All semantic questions go through [`prov_binder::BindingOracle`].

mod classify;
mod context;
pub mod error;
pub mod kind;
pub mod provenance;
pub mod recursion;
mod resolver;
pub mod walker;

pub use context::LocationKey;
pub use error::ResolveError;
pub use kind::SourceKind;
pub use provenance::{Provenance, ProvenanceEntry};
pub use recursion::{RecursionGuard, RecursionProfile, RecursionResult};
pub use resolver::{ProvenanceResolver, ResolverOptions, resolve};
