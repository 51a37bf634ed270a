//! The binding seam consumed by the provenance resolver.
//!
//! The resolver never performs name resolution itself. It asks a
//! [`BindingOracle`] which declaration a node refers to, where a storage
//! location is written, where a callable is invoked, and whether a member is
//! visible to code outside the analysed unit. [`BinderState`](crate::BinderState)
//! is the reference implementation; hosts with their own semantic model can
//! implement the trait directly.

use prov_syntax::{Node, NodeArena, NodeIndex};
use serde::Serialize;

use crate::symbols::{Symbol, SymbolId};

/// How a write site stores its value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum WriteKind {
    /// Declaration initializer or parameter default value.
    Initializer,
    Assignment,
    /// `x += e`, `x ??= e`, `x++`; the value node is the whole operation.
    CompoundAssignment,
    /// `M(out x)`; the value node is the argument.
    OutArgument,
    /// `M(ref x)`; the value node is the argument.
    RefArgument,
    /// `new C { P = e }`
    ObjectInitializer,
}

/// One place that stores a value into a location.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct WriteSite {
    /// The node whose value ends up in the location.
    pub value: NodeIndex,
    /// The storing node (assignment, declarator, argument, field, ...).
    pub write: NodeIndex,
    /// Innermost enclosing member declaration of the write.
    pub member: NodeIndex,
    pub kind: WriteKind,
    /// Start offset of the write node.
    pub position: u32,
    /// Nested under control flow or a short-circuiting operator rather than
    /// executed on every pass through its member body.
    pub conditional: bool,
}

pub trait BindingOracle {
    fn arena(&self) -> &NodeArena;

    fn symbol(&self, id: SymbolId) -> Option<&Symbol>;

    /// The declaration a node refers to.
    ///
    /// Accepts identifiers, member accesses and bindings, invocations (the
    /// callee), element accesses (the indexer), object creations and
    /// constructor initializers (the constructor), and declaration nodes
    /// themselves.
    fn resolve_declaration(&self, node: NodeIndex) -> Option<SymbolId>;

    /// Writes to `location` inside `scope` in source order.
    /// `NodeIndex::NONE` means the whole unit.
    fn write_sites_of(&self, location: SymbolId, scope: NodeIndex) -> Vec<WriteSite>;

    /// Invocations, object creations and constructor initializers bound to
    /// `callable`, in source order.
    fn call_sites_of(&self, callable: SymbolId) -> Vec<NodeIndex>;

    /// Field returned directly by a property's getter.
    fn backing_field_of(&self, property: SymbolId) -> Option<SymbolId>;

    /// Whether code outside the analysed unit can see `symbol`.
    fn is_externally_reachable(&self, symbol: SymbolId) -> bool;

    /// Whether code outside the declaring type can store into `symbol`.
    fn is_externally_writable(&self, symbol: SymbolId) -> bool;

    /// Explicitly declared constructors of a type, in declaration order.
    fn constructors_of(&self, ty: SymbolId) -> Vec<SymbolId>;

    /// Parameter an argument node is passed to.
    fn parameter_of_argument(&self, argument: NodeIndex) -> Option<SymbolId>;

    /// Argument node a call site passes for `parameter`, if any.
    fn argument_for_parameter(&self, call_site: NodeIndex, parameter: SymbolId) -> Option<NodeIndex> {
        let arguments = match self.arena().get(call_site)? {
            Node::Invocation(data) => &data.arguments,
            Node::ObjectCreation(data) => &data.arguments,
            Node::ConstructorInitializer(data) => &data.arguments,
            Node::ElementAccess(data) => &data.arguments,
            _ => return None,
        };
        arguments
            .iter()
            .copied()
            .find(|&arg| self.parameter_of_argument(arg) == Some(parameter))
    }
}
