//! Centralized limits and thresholds.
//!
//! Shared constants for recursion depths, operation counts and capacity
//! limits. Resolver recursion limits are exposed through
//! `prov_resolver::recursion::RecursionProfile`, which reads its defaults
//! from here so every limit is tuned in one place.

// =============================================================================
// Resolver
// =============================================================================

/// Maximum number of locations that may be under expansion at once during a
/// single top-level resolution.
///
/// Each nested expansion keeps one guard entry alive. Real provenance chains
/// are a handful of hops long; hitting this limit means pathological,
/// machine-generated input. The branch degrades to an Unknown entry.
pub const MAX_RESOLVE_DEPTH: u32 = 256;

/// Maximum number of guarded expansions attempted during a single top-level
/// resolution.
///
/// Guard entries are released when a branch finishes, so the same location
/// may be expanded again on a sibling branch. This bounds the total work on
/// diamond-shaped data flow.
pub const MAX_RESOLVE_ITERATIONS: u32 = 100_000;

/// Depth used by the shallow profile, for callers that only need the first
/// few hops (e.g. "was this created locally?").
pub const SHALLOW_RESOLVE_DEPTH: u32 = 8;

/// Upper bound on visited-set size for one resolution.
pub const MAX_VISITING_LOCATIONS: u32 = 10_000;

// =============================================================================
// Binder / syntax
// =============================================================================

/// Maximum length of a base-class chain walked during member lookup.
///
/// Protects against `class A : B {}` / `class B : A {}` cycles in
/// erroneous input.
pub const MAX_BASE_CHAIN_DEPTH: usize = 64;

/// Maximum nesting depth of expressions and statements accepted by the
/// parser before it reports an error and stops descending.
pub const MAX_PARSE_NESTING_DEPTH: u32 = 512;

/// Maximum number of constructor `this(...)` hops followed when computing
/// what a constructor has assigned.
pub const MAX_CONSTRUCTOR_CHAIN_DEPTH: usize = 32;
