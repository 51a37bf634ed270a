//! Per-resolution state and the expansion loop.
//!
//! Each top-level resolution owns a fresh [`ResolveContext`]: the oracle
//! handle, a walker, a recursion guard and an explicit task stack. Nothing
//! is shared between resolutions, so concurrent resolutions against the same
//! oracle never observe each other's visited sets.

use prov_binder::{BindingOracle, SymbolId};
use prov_common::CancellationToken;
use prov_syntax::NodeIndex;
use tracing::{debug, trace, warn};

use crate::classify::{Expansion, Step};
use crate::error::{ResolveError, Result};
use crate::kind::SourceKind;
use crate::provenance::{Provenance, ProvenanceEntry};
use crate::recursion::{RecursionGuard, RecursionProfile, RecursionResult};
use crate::walker::AssignmentWalker;

/// A location under expansion: the symbol plus the scope that determines
/// which of its writes are visible. A field read inside a constructor sees a
/// different set of writes than a read after construction, so the two get
/// different keys; `NodeIndex::NONE` is the unit-wide view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LocationKey {
    pub symbol: SymbolId,
    pub scope: NodeIndex,
}

impl LocationKey {
    #[inline]
    pub fn new(symbol: SymbolId, scope: NodeIndex) -> Self {
        Self { symbol, scope }
    }
}

enum Task {
    Visit(NodeIndex),
    Emit(ProvenanceEntry),
    Leave(LocationKey),
}

pub(crate) struct ResolveContext<'r, O: BindingOracle + ?Sized> {
    pub(crate) oracle: &'r O,
    pub(crate) walker: AssignmentWalker<'r, O>,
    token: &'r CancellationToken,
    guard: RecursionGuard<LocationKey>,
    entries: Vec<ProvenanceEntry>,
    tasks: Vec<Task>,
}

impl<'r, O: BindingOracle + ?Sized> ResolveContext<'r, O> {
    pub(crate) fn new(oracle: &'r O, token: &'r CancellationToken, profile: RecursionProfile) -> Self {
        Self {
            oracle,
            walker: AssignmentWalker::new(oracle, token),
            token,
            guard: RecursionGuard::with_profile(profile),
            entries: Vec::new(),
            tasks: Vec::new(),
        }
    }

    /// Expand `start` depth-first until every branch reaches a leaf.
    ///
    /// Sources are pushed in reverse so they pop in the order the walker
    /// reported them; an expansion's trailing markers and its guard release
    /// sit below its sources on the stack.
    pub(crate) fn run(mut self, start: NodeIndex) -> Result<Provenance> {
        self.tasks.push(Task::Visit(start));
        while let Some(task) = self.tasks.pop() {
            if self.token.is_cancelled() {
                return Err(self.abandon());
            }
            match task {
                Task::Visit(node) => match self.classify(node) {
                    Ok(step) => self.apply(node, step),
                    Err(ResolveError::Abandoned) => return Err(self.abandon()),
                },
                Task::Emit(entry) => self.entries.push(entry),
                Task::Leave(key) => self.guard.leave(key),
            }
        }
        debug_assert!(!self.guard.is_active());
        Ok(Provenance::from_entries(std::mem::take(&mut self.entries)))
    }

    fn abandon(&mut self) -> ResolveError {
        debug!(
            open = self.guard.depth(),
            emitted = self.entries.len(),
            "resolution abandoned"
        );
        self.guard.reset();
        self.tasks.clear();
        self.entries.clear();
        ResolveError::Abandoned
    }

    fn apply(&mut self, node: NodeIndex, step: Step) {
        match step {
            Step::Leaf(kind) => self.entries.push(ProvenanceEntry::new(node, kind)),
            Step::Forward(nodes) => self.tasks.extend(nodes.into_iter().rev().map(Task::Visit)),
            Step::Expand(expansion) => self.expand(node, expansion),
        }
    }

    fn expand(&mut self, node: NodeIndex, expansion: Expansion) {
        let Expansion {
            kind,
            location,
            sources,
            trailing,
        } = expansion;

        if let Some(key) = location {
            let already_exceeded = self.guard.is_exceeded();
            match self.guard.enter(key) {
                RecursionResult::Entered => self.tasks.push(Task::Leave(key)),
                RecursionResult::Cycle => {
                    trace!(node = node.0, symbol = key.symbol.0, "cycle");
                    self.entries
                        .push(ProvenanceEntry::new(node, SourceKind::Recursion));
                    return;
                }
                denied => {
                    if already_exceeded {
                        trace!(node = node.0, ?denied, "budget exhausted");
                    } else {
                        warn!(
                            node = node.0,
                            ?denied,
                            depth = self.guard.depth(),
                            iterations = self.guard.iterations(),
                            "provenance budget exhausted; remaining branches degrade to Unknown"
                        );
                    }
                    self.entries
                        .push(ProvenanceEntry::new(node, SourceKind::Unknown));
                    return;
                }
            }
        }

        if let Some(kind) = kind {
            self.entries.push(ProvenanceEntry::new(node, kind));
        }
        self.tasks.extend(trailing.into_iter().rev().map(Task::Emit));
        self.tasks.extend(sources.into_iter().rev().map(Task::Visit));
    }
}
