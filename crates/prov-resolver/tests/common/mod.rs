//! Shared helpers for resolver integration tests.
#![allow(dead_code)]

use prov_binder::BinderState;
use prov_common::CancellationToken;
use prov_resolver::{Provenance, ProvenanceResolver, ResolverOptions, SourceKind};
use prov_syntax::{ArgumentModifier, Node, NodeIndex, SyntaxTree};

pub fn parse(source: &str) -> SyntaxTree {
    let tree = SyntaxTree::parse(source).expect("parse");
    assert!(tree.diagnostics().is_empty(), "{:?}", tree.diagnostics());
    tree
}

/// The `occurrence`-th expression (pre-order, 0-based) whose source text is
/// exactly `text`. Plain argument wrappers are skipped so `x` finds the
/// identifier rather than the argument around it.
pub fn expr(tree: &SyntaxTree, text: &str, occurrence: usize) -> NodeIndex {
    let matches = tree.find_all(|idx, node| {
        node.is_expression()
            && !matches!(node, Node::Argument(arg) if arg.modifier == ArgumentModifier::None)
            && tree.text(idx) == text
    });
    *matches
        .get(occurrence)
        .unwrap_or_else(|| panic!("no occurrence {occurrence} of `{text}` ({} found)", matches.len()))
}

pub fn resolve_node(tree: &SyntaxTree, node: NodeIndex) -> Provenance {
    resolve_node_with(tree, node, ResolverOptions::default())
}

pub fn resolve_node_with(tree: &SyntaxTree, node: NodeIndex, options: ResolverOptions) -> Provenance {
    let binder = BinderState::bind_tree(tree);
    ProvenanceResolver::with_options(&binder, options)
        .resolve(node, &CancellationToken::new())
        .expect("resolution was not cancelled")
}

/// Kinds for the `occurrence`-th expression spelled `text`.
pub fn kinds(source: &str, text: &str, occurrence: usize) -> Vec<SourceKind> {
    let tree = parse(source);
    let node = expr(&tree, text, occurrence);
    resolve_node(&tree, node).kinds()
}

/// `(kind, source text)` pairs for the `occurrence`-th expression spelled `text`.
pub fn steps(source: &str, text: &str, occurrence: usize) -> Vec<(SourceKind, String)> {
    let tree = parse(source);
    let node = expr(&tree, text, occurrence);
    resolve_node(&tree, node)
        .iter()
        .map(|e| (e.kind, tree.text(e.node).to_string()))
        .collect()
}

pub fn step(kind: SourceKind, text: &str) -> (SourceKind, String) {
    (kind, text.to_string())
}
