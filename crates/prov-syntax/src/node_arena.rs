//! Node storage.
//!
//! Nodes live in a flat `Vec` indexed by [`NodeIndex`]. Spans and parent
//! links are kept in parallel vectors. The parser builds bottom-up, so
//! children exist before their parent and [`NodeArena::add`] can link them
//! immediately.

use prov_common::Span;

use crate::node::{Node, NodeIndex};

#[derive(Clone, Debug, Default)]
pub struct NodeArena {
    nodes: Vec<Node>,
    spans: Vec<Span>,
    parents: Vec<NodeIndex>,
}

impl NodeArena {
    pub fn new() -> NodeArena {
        NodeArena::default()
    }

    /// Pre-allocate for roughly `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> NodeArena {
        NodeArena {
            nodes: Vec::with_capacity(capacity),
            spans: Vec::with_capacity(capacity),
            parents: Vec::with_capacity(capacity),
        }
    }

    /// Append a node and set it as the parent of its children.
    pub fn add(&mut self, node: Node, span: Span) -> NodeIndex {
        let index = NodeIndex(self.nodes.len() as u32);
        for child in node.children() {
            self.set_parent(child, index);
        }
        self.nodes.push(node);
        self.spans.push(span);
        self.parents.push(NodeIndex::NONE);
        index
    }

    fn set_parent(&mut self, child: NodeIndex, parent: NodeIndex) {
        if let Some(slot) = self.parents.get_mut(child.0 as usize) {
            // Only set if not already set: a child is owned by exactly one parent.
            if slot.is_none() {
                *slot = parent;
            }
        }
    }

    // =========================================================================
    // Access
    // =========================================================================

    #[inline]
    pub fn get(&self, index: NodeIndex) -> Option<&Node> {
        if index.is_none() {
            None
        } else {
            self.nodes.get(index.0 as usize)
        }
    }

    /// Span of a node; empty span for `NONE` or out-of-range indices.
    #[inline]
    pub fn span(&self, index: NodeIndex) -> Span {
        if index.is_none() {
            return Span::default();
        }
        self.spans.get(index.0 as usize).copied().unwrap_or_default()
    }

    #[inline]
    pub fn parent(&self, index: NodeIndex) -> NodeIndex {
        if index.is_none() {
            return NodeIndex::NONE;
        }
        self.parents
            .get(index.0 as usize)
            .copied()
            .unwrap_or(NodeIndex::NONE)
    }

    /// Number of nodes in the arena.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All node indices in allocation order.
    pub fn indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        (0..self.nodes.len() as u32).map(NodeIndex)
    }

    /// The kind name of a node, `"None"` for missing nodes.
    pub fn kind_name(&self, index: NodeIndex) -> &'static str {
        self.get(index).map_or("None", Node::kind_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{BinaryData, BinaryOp, IdentifierData};

    #[test]
    fn add_links_children_to_parent() {
        let mut arena = NodeArena::new();
        let left = arena.add(
            Node::Identifier(IdentifierData { name: "a".into() }),
            Span::new(0, 1),
        );
        let right = arena.add(
            Node::Identifier(IdentifierData { name: "b".into() }),
            Span::new(4, 5),
        );
        let sum = arena.add(
            Node::Binary(BinaryData {
                op: BinaryOp::Add,
                left,
                right,
            }),
            Span::new(0, 5),
        );

        assert_eq!(arena.parent(left), sum);
        assert_eq!(arena.parent(right), sum);
        assert!(arena.parent(sum).is_none());
        assert_eq!(arena.span(sum), Span::new(0, 5));
        assert_eq!(arena.kind_name(sum), "Binary");
        assert_eq!(arena.kind_name(NodeIndex::NONE), "None");
    }
}
