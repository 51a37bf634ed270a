//! Classification of a single provenance step.

use serde::Serialize;
use std::fmt;

/// Where a value at one step of a provenance chain comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SourceKind {
    /// Literal or compile-time constant.
    Constant,
    /// Object, array or collection creation.
    Created,
    /// Static readonly or const storage.
    Cached,
    /// Instance (or mutable static) field or auto-property read.
    Member,
    /// Derived from other values: arithmetic, getter or method body.
    Calculated,
    /// Call into code outside the analysed unit.
    External,
    /// Formal parameter read inside its own call frame.
    Argument,
    /// Constructor parameter that no caller in the unit supplies.
    Injected,
    /// Location that outside code may have overwritten after construction.
    PotentiallyInjected,
    /// Value written through an `out` argument.
    Out,
    /// Value written through a `ref` argument.
    Ref,
    /// The chain loops back onto a location already being expanded.
    Recursion,
    /// Could not be bound or is not modelled.
    Unknown,
}

impl SourceKind {
    pub const ALL: [SourceKind; 13] = [
        SourceKind::Constant,
        SourceKind::Created,
        SourceKind::Cached,
        SourceKind::Member,
        SourceKind::Calculated,
        SourceKind::External,
        SourceKind::Argument,
        SourceKind::Injected,
        SourceKind::PotentiallyInjected,
        SourceKind::Out,
        SourceKind::Ref,
        SourceKind::Recursion,
        SourceKind::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Constant => "Constant",
            SourceKind::Created => "Created",
            SourceKind::Cached => "Cached",
            SourceKind::Member => "Member",
            SourceKind::Calculated => "Calculated",
            SourceKind::External => "External",
            SourceKind::Argument => "Argument",
            SourceKind::Injected => "Injected",
            SourceKind::PotentiallyInjected => "PotentiallyInjected",
            SourceKind::Out => "Out",
            SourceKind::Ref => "Ref",
            SourceKind::Recursion => "Recursion",
            SourceKind::Unknown => "Unknown",
        }
    }

    /// Value may have been supplied by code outside the unit.
    #[inline]
    pub fn is_injected(self) -> bool {
        matches!(self, SourceKind::Injected | SourceKind::PotentiallyInjected)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
