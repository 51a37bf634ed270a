//! Tree navigation over a [`NodeArena`].

use crate::node::{Node, NodeIndex};
use crate::node_arena::NodeArena;

impl NodeArena {
    /// Iterate over the strict ancestors of `node`, innermost first.
    pub fn ancestors(&self, node: NodeIndex) -> Ancestors<'_> {
        Ancestors {
            arena: self,
            current: self.parent(node),
        }
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: NodeIndex, node: NodeIndex) -> bool {
        node == ancestor || self.ancestors(node).any(|a| a == ancestor)
    }

    /// Innermost field, property, accessor, method or constructor that
    /// contains `node` (or `node` itself when it is one).
    pub fn enclosing_member(&self, node: NodeIndex) -> NodeIndex {
        std::iter::once(node)
            .chain(self.ancestors(node))
            .find(|&n| self.get(n).is_some_and(Node::is_member_declaration))
            .unwrap_or(NodeIndex::NONE)
    }

    /// Like [`enclosing_member`](Self::enclosing_member), but an accessor
    /// resolves to its property.
    pub fn enclosing_declaration(&self, node: NodeIndex) -> NodeIndex {
        let member = self.enclosing_member(node);
        match self.get(member) {
            Some(Node::Accessor(_)) => self.parent(member),
            _ => member,
        }
    }

    pub fn enclosing_type(&self, node: NodeIndex) -> NodeIndex {
        self.ancestors(node)
            .find(|&n| matches!(self.get(n), Some(Node::TypeDeclaration(_))))
            .unwrap_or(NodeIndex::NONE)
    }

    /// `node` and all of its descendants in pre-order (source order).
    pub fn descendants(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            let Some(data) = self.get(current) else {
                continue;
            };
            out.push(current);
            let children = data.children();
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// Strip any number of enclosing parentheses.
    pub fn skip_parentheses(&self, mut node: NodeIndex) -> NodeIndex {
        while let Some(Node::Parenthesized(inner)) = self.get(node) {
            node = *inner;
        }
        node
    }

    /// Deepest expression whose span contains `offset`.
    pub fn expression_at_offset(&self, root: NodeIndex, offset: u32) -> NodeIndex {
        let mut best = NodeIndex::NONE;
        let mut current = root;
        loop {
            let Some(node) = self.get(current) else {
                return best;
            };
            if node.is_expression() {
                best = current;
            }
            // Prefer a non-empty child; zero-width error nodes only win when
            // nothing else covers the offset.
            let children = node.children();
            let next = children
                .iter()
                .copied()
                .find(|&c| {
                    let span = self.span(c);
                    !span.is_empty() && span.contains(offset)
                })
                .or_else(|| {
                    children
                        .iter()
                        .copied()
                        .find(|&c| self.span(c).contains(offset))
                });
            match next {
                Some(child) => current = child,
                None => return best,
            }
        }
    }
}

pub struct Ancestors<'a> {
    arena: &'a NodeArena,
    current: NodeIndex,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeIndex;

    fn next(&mut self) -> Option<NodeIndex> {
        let current = self.current.get()?;
        self.current = self.arena.parent(current);
        Some(current)
    }
}
