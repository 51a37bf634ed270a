//! The ordered result of a resolution.

use prov_syntax::NodeIndex;
use serde::Serialize;

use crate::kind::SourceKind;

/// One step: a representative expression and how its value arises.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ProvenanceEntry {
    pub node: NodeIndex,
    pub kind: SourceKind,
}

impl ProvenanceEntry {
    #[inline]
    pub fn new(node: NodeIndex, kind: SourceKind) -> Self {
        Self { node, kind }
    }
}

/// Every way a value could have been produced, flattened depth-first.
///
/// Outer steps come before the steps they unwrap into, and sibling sources
/// keep the order the walker reported them in. Resolving the same node twice
/// against the same unit yields an equal `Provenance`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Provenance {
    entries: Vec<ProvenanceEntry>,
}

impl Provenance {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_entries(entries: Vec<ProvenanceEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[ProvenanceEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<ProvenanceEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProvenanceEntry> {
        self.entries.iter()
    }

    pub fn kinds(&self) -> Vec<SourceKind> {
        self.entries.iter().map(|e| e.kind).collect()
    }

    pub fn first(&self) -> Option<&ProvenanceEntry> {
        self.entries.first()
    }

    pub fn last(&self) -> Option<&ProvenanceEntry> {
        self.entries.last()
    }

    pub fn contains(&self, kind: SourceKind) -> bool {
        self.entries.iter().any(|e| e.kind == kind)
    }

    /// Some step may have been supplied from outside the unit.
    pub fn any_injected(&self) -> bool {
        self.entries.iter().any(|e| e.kind.is_injected())
    }

    /// The value is created here and never arrives from a caller, an
    /// external call or outside code. Disposal rules key off this.
    pub fn is_locally_created(&self) -> bool {
        self.contains(SourceKind::Created)
            && !self.entries.iter().any(|e| {
                e.kind.is_injected()
                    || matches!(
                        e.kind,
                        SourceKind::Argument | SourceKind::External | SourceKind::Unknown
                    )
            })
    }
}

impl<'a> IntoIterator for &'a Provenance {
    type Item = &'a ProvenanceEntry;
    type IntoIter = std::slice::Iter<'a, ProvenanceEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for Provenance {
    type Item = ProvenanceEntry;
    type IntoIter = std::vec::IntoIter<ProvenanceEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
