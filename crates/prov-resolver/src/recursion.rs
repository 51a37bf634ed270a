//! Cycle and budget tracking for provenance expansion.
//!
//! The resolver enters every location, callable and parameter into a
//! [`RecursionGuard`] before expanding it. A key that is still open on the
//! current path is a cycle. Keys are released when their expansion finishes,
//! so two sibling branches may both expand the same location.
//!
//! Two budgets bound the work: the number of keys open at once (depth) and
//! the number of enter attempts (iterations). Both come from a
//! [`RecursionProfile`] backed by [`prov_common::limits`]. Once a budget is
//! hit the guard stays exhausted until [`RecursionGuard::reset`].
//!
//! Debug builds panic if a guard is dropped with keys still open.

use prov_common::limits::{
    MAX_RESOLVE_DEPTH, MAX_RESOLVE_ITERATIONS, MAX_VISITING_LOCATIONS, SHALLOW_RESOLVE_DEPTH,
};
use rustc_hash::FxHashSet;
use std::hash::Hash;

/// Named recursion limit presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecursionProfile {
    /// Full provenance resolution.
    ///
    /// depth = `MAX_RESOLVE_DEPTH`, iterations = `MAX_RESOLVE_ITERATIONS`
    #[default]
    Resolve,

    /// First few hops only. Deeper branches degrade to Unknown.
    ///
    /// depth = `SHALLOW_RESOLVE_DEPTH`, iterations = `MAX_RESOLVE_ITERATIONS`
    Shallow,

    /// Custom limits for hosts with their own budget, and for tests.
    Custom { max_depth: u32, max_iterations: u32 },
}

impl RecursionProfile {
    /// Maximum number of simultaneously open expansions.
    pub const fn max_depth(self) -> u32 {
        match self {
            Self::Resolve => MAX_RESOLVE_DEPTH,
            Self::Shallow => SHALLOW_RESOLVE_DEPTH,
            Self::Custom { max_depth, .. } => max_depth,
        }
    }

    /// Maximum number of expansions attempted in one resolution.
    pub const fn max_iterations(self) -> u32 {
        match self {
            Self::Resolve | Self::Shallow => MAX_RESOLVE_ITERATIONS,
            Self::Custom { max_iterations, .. } => max_iterations,
        }
    }
}

/// Outcome of [`RecursionGuard::enter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionResult {
    Entered,
    /// The key is already open further up the current path.
    Cycle,
    DepthExceeded,
    IterationExceeded,
}

impl RecursionResult {
    #[inline]
    pub fn is_entered(self) -> bool {
        self == Self::Entered
    }

    #[inline]
    pub fn is_cycle(self) -> bool {
        self == Self::Cycle
    }

    /// A budget ran out, as opposed to a cycle.
    #[inline]
    pub fn is_exceeded(self) -> bool {
        matches!(self, Self::DepthExceeded | Self::IterationExceeded)
    }

    #[inline]
    pub fn is_denied(self) -> bool {
        self != Self::Entered
    }
}

#[derive(Debug, Clone, Copy)]
struct Budget {
    depth: u32,
    iterations: u32,
    open: u32,
}

/// Open expansions of one top-level resolution.
///
/// Every `Entered` must be matched by a [`leave`](Self::leave) with the same
/// key; the resolver pushes the `leave` onto its task stack underneath the
/// expansion's sources.
pub struct RecursionGuard<K: Hash + Eq + Copy> {
    open: FxHashSet<K>,
    attempts: u32,
    limits: Budget,
    exhausted: bool,
}

impl<K: Hash + Eq + Copy> RecursionGuard<K> {
    pub fn new(max_depth: u32, max_iterations: u32) -> Self {
        Self {
            open: FxHashSet::default(),
            attempts: 0,
            limits: Budget {
                depth: max_depth,
                iterations: max_iterations,
                open: MAX_VISITING_LOCATIONS,
            },
            exhausted: false,
        }
    }

    pub fn with_profile(profile: RecursionProfile) -> Self {
        Self::new(profile.max_depth(), profile.max_iterations())
    }

    /// Cap the size of the open set independently of the depth limit.
    pub fn with_open_limit(mut self, limit: u32) -> Self {
        self.limits.open = limit;
        self
    }

    /// Every call counts against the iteration budget, including calls that
    /// report a cycle.
    pub fn enter(&mut self, key: K) -> RecursionResult {
        self.attempts = self.attempts.saturating_add(1);
        let result = if self.attempts > self.limits.iterations {
            RecursionResult::IterationExceeded
        } else if self.open.contains(&key) {
            RecursionResult::Cycle
        } else if self.depth() >= self.limits.depth.min(self.limits.open) {
            RecursionResult::DepthExceeded
        } else {
            self.open.insert(key);
            RecursionResult::Entered
        };
        if result.is_exceeded() {
            self.exhausted = true;
        }
        result
    }

    pub fn leave(&mut self, key: K) {
        let removed = self.open.remove(&key);
        debug_assert!(removed, "leave() without a matching enter()");
    }

    #[inline]
    pub fn is_open(&self, key: &K) -> bool {
        self.open.contains(key)
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.open.len() as u32
    }

    /// Calls to [`enter`](Self::enter) so far, whatever their result.
    #[inline]
    pub fn iterations(&self) -> u32 {
        self.attempts
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        !self.open.is_empty()
    }

    #[inline]
    pub fn max_depth(&self) -> u32 {
        self.limits.depth
    }

    #[inline]
    pub fn max_iterations(&self) -> u32 {
        self.limits.iterations
    }

    /// Set once any budget is hit; cleared only by [`reset`](Self::reset).
    #[inline]
    pub fn is_exceeded(&self) -> bool {
        self.exhausted
    }

    /// Drop all open keys and counters. Limits are kept.
    pub fn reset(&mut self) {
        self.open.clear();
        self.attempts = 0;
        self.exhausted = false;
    }
}

#[cfg(debug_assertions)]
impl<K: Hash + Eq + Copy> Drop for RecursionGuard<K> {
    fn drop(&mut self) {
        if !std::thread::panicking() && self.is_active() {
            panic!("guard dropped with {} open entries", self.open.len());
        }
    }
}

#[cfg(test)]
#[path = "../tests/recursion_tests.rs"]
mod tests;
