//! A parsed compilation unit.

use prov_common::{LineMap, Position, Span};
use tracing::debug;

use crate::error::{ParseDiagnostic, SyntaxError};
use crate::node::{Node, NodeIndex};
use crate::node_arena::NodeArena;
use crate::parser::ParserState;

/// Source text plus its immutable syntax tree.
#[derive(Debug)]
pub struct SyntaxTree {
    source: String,
    arena: NodeArena,
    root: NodeIndex,
    diagnostics: Vec<ParseDiagnostic>,
    line_map: LineMap,
}

impl SyntaxTree {
    /// Parse `source`. Syntax errors are recorded, not returned; the only
    /// failure is a source too large to address with `u32` offsets.
    pub fn parse(source: impl Into<String>) -> Result<SyntaxTree, SyntaxError> {
        let source = source.into();
        if source.len() >= u32::MAX as usize {
            return Err(SyntaxError::SourceTooLarge {
                len: source.len(),
                max: u32::MAX as usize - 1,
            });
        }

        let _span = tracing::debug_span!("parse", bytes = source.len()).entered();
        let mut parser = ParserState::new(&source);
        let root = parser.parse_source_file();
        let (arena, diagnostics) = parser.finish();
        debug!(
            nodes = arena.len(),
            diagnostics = diagnostics.len(),
            "parsed source file"
        );

        let line_map = LineMap::build(&source);
        Ok(SyntaxTree {
            source,
            arena,
            root,
            diagnostics,
            line_map,
        })
    }

    #[inline]
    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    #[inline]
    pub fn root(&self) -> NodeIndex {
        self.root
    }

    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn diagnostics(&self) -> &[ParseDiagnostic] {
        &self.diagnostics
    }

    pub fn line_map(&self) -> &LineMap {
        &self.line_map
    }

    /// Fail with the first diagnostic if the source had syntax errors.
    pub fn ensure_no_errors(&self) -> Result<(), SyntaxError> {
        match self.diagnostics.first() {
            None => Ok(()),
            Some(first) => Err(SyntaxError::Diagnostics {
                count: self.diagnostics.len(),
                first: first.clone(),
            }),
        }
    }

    /// Source text covered by `node`.
    pub fn text(&self, node: NodeIndex) -> &str {
        self.arena.span(node).text(&self.source)
    }

    pub fn node(&self, node: NodeIndex) -> Option<&Node> {
        self.arena.get(node)
    }

    pub fn span(&self, node: NodeIndex) -> Span {
        self.arena.span(node)
    }

    /// Start position of `node` (0-based line and column).
    pub fn position(&self, node: NodeIndex) -> Position {
        self.line_map
            .offset_to_position(self.arena.span(node).start, &self.source)
    }

    pub fn offset_of(&self, position: Position) -> Option<u32> {
        self.line_map.position_to_offset(position, &self.source)
    }

    /// Innermost expression at a 0-based line/column.
    pub fn expression_at(&self, position: Position) -> Option<NodeIndex> {
        let offset = self.offset_of(position)?;
        self.arena.expression_at_offset(self.root, offset).get()
    }

    /// First node in pre-order for which `predicate` holds.
    pub fn find(&self, mut predicate: impl FnMut(NodeIndex, &Node) -> bool) -> Option<NodeIndex> {
        self.arena
            .descendants(self.root)
            .into_iter()
            .find(|&idx| self.arena.get(idx).is_some_and(|node| predicate(idx, node)))
    }

    /// Every node in pre-order for which `predicate` holds.
    pub fn find_all(&self, mut predicate: impl FnMut(NodeIndex, &Node) -> bool) -> Vec<NodeIndex> {
        self.arena
            .descendants(self.root)
            .into_iter()
            .filter(|&idx| self.arena.get(idx).is_some_and(|node| predicate(idx, node)))
            .collect()
    }
}
