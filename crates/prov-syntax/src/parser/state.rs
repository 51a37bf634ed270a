//! Parser state: token cursor and error recovery.

use prov_common::Span;
use prov_common::limits::MAX_PARSE_NESTING_DEPTH;

use crate::error::ParseDiagnostic;
use crate::node::{Node, NodeIndex};
use crate::node_arena::NodeArena;
use crate::scanner::{Scanner, SyntaxKind, Token};

pub struct ParserState<'a> {
    pub(crate) source: &'a str,
    pub(crate) tokens: Vec<Token>,
    pub(crate) pos: usize,
    pub(crate) arena: NodeArena,
    pub(crate) diagnostics: Vec<ParseDiagnostic>,
    /// Current statement/expression nesting.
    pub(crate) depth: u32,
}

/// Saved cursor for speculative parsing.
#[derive(Clone, Copy)]
pub(crate) struct Snapshot {
    pos: usize,
    diagnostics: usize,
}

impl<'a> ParserState<'a> {
    pub fn new(source: &'a str) -> ParserState<'a> {
        let scanned = Scanner::scan_all(source);
        ParserState {
            source,
            arena: NodeArena::with_capacity(scanned.tokens.len()),
            tokens: scanned.tokens,
            pos: 0,
            diagnostics: scanned.diagnostics,
            depth: 0,
        }
    }

    /// Consume the parser, yielding the arena and all diagnostics in
    /// source order.
    pub fn finish(mut self) -> (NodeArena, Vec<ParseDiagnostic>) {
        self.diagnostics.sort_by_key(|d| d.span.start);
        (self.arena, self.diagnostics)
    }

    // =========================================================================
    // Token cursor
    // =========================================================================

    #[inline]
    pub(crate) fn current(&self) -> Token {
        self.nth(0)
    }

    #[inline]
    pub(crate) fn nth(&self, ahead: usize) -> Token {
        let idx = (self.pos + ahead).min(self.tokens.len().saturating_sub(1));
        self.tokens.get(idx).copied().unwrap_or(Token {
            kind: SyntaxKind::EndOfFile,
            span: Span::at(self.source.len() as u32),
        })
    }

    #[inline]
    pub(crate) fn token(&self) -> SyntaxKind {
        self.current().kind
    }

    #[inline]
    pub(crate) fn nth_kind(&self, ahead: usize) -> SyntaxKind {
        self.nth(ahead).kind
    }

    #[inline]
    pub(crate) fn is_token(&self, kind: SyntaxKind) -> bool {
        self.token() == kind
    }

    /// Text of the current token.
    pub(crate) fn token_text(&self) -> &'a str {
        self.nth_text(0)
    }

    pub(crate) fn nth_text(&self, ahead: usize) -> &'a str {
        let span = self.nth(ahead).span;
        self.source
            .get(span.start as usize..span.end as usize)
            .unwrap_or("")
    }

    /// Identifier token whose text is `word` (contextual keyword check).
    pub(crate) fn is_contextual(&self, word: &str) -> bool {
        self.is_token(SyntaxKind::Identifier) && self.token_text() == word
    }

    pub(crate) fn nth_is_contextual(&self, ahead: usize, word: &str) -> bool {
        self.nth_kind(ahead) == SyntaxKind::Identifier && self.nth_text(ahead) == word
    }

    #[inline]
    pub(crate) fn token_pos(&self) -> u32 {
        self.current().span.start
    }

    /// End offset of the last consumed token.
    pub(crate) fn last_end(&self) -> u32 {
        if self.pos == 0 {
            return 0;
        }
        self.tokens
            .get(self.pos - 1)
            .map_or(0, |token| token.span.end)
    }

    /// Whether tokens `ahead` and `ahead + 1` touch (used to rejoin `>>`).
    pub(crate) fn nth_adjacent(&self, ahead: usize) -> bool {
        self.nth(ahead).span.end == self.nth(ahead + 1).span.start
    }

    pub(crate) fn next_token(&mut self) -> Token {
        let token = self.current();
        if token.kind != SyntaxKind::EndOfFile {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn parse_optional(&mut self, kind: SyntaxKind) -> bool {
        if self.is_token(kind) {
            self.next_token();
            true
        } else {
            false
        }
    }

    /// Consume `kind` or record a diagnostic without consuming.
    pub(crate) fn parse_expected(&mut self, kind: SyntaxKind, what: &str) -> bool {
        if self.parse_optional(kind) {
            return true;
        }
        self.error_at_current(&format!("expected {what}"));
        false
    }

    /// Consume an identifier and return its text, or record a diagnostic.
    pub(crate) fn parse_identifier_text(&mut self) -> String {
        if self.is_token(SyntaxKind::Identifier) {
            let text = identifier_value(self.token_text());
            self.next_token();
            text
        } else {
            self.error_at_current("expected identifier");
            String::new()
        }
    }

    pub(crate) fn is_eof(&self) -> bool {
        self.is_token(SyntaxKind::EndOfFile)
    }

    // =========================================================================
    // Diagnostics and recovery
    // =========================================================================

    pub(crate) fn error_at_current(&mut self, message: &str) {
        let span = self.current().span;
        // One diagnostic per position keeps cascades readable.
        if self
            .diagnostics
            .last()
            .is_some_and(|last| last.span.start == span.start)
        {
            return;
        }
        self.diagnostics.push(ParseDiagnostic::new(span, message));
    }

    pub(crate) fn error_at(&mut self, span: Span, message: &str) {
        self.diagnostics.push(ParseDiagnostic::new(span, message));
    }

    /// Allocate an `Error` node covering the current token without consuming it.
    pub(crate) fn error_node(&mut self, message: &str) -> NodeIndex {
        self.error_at_current(message);
        let span = Span::at(self.token_pos());
        self.arena.add(Node::Error(message.to_string()), span)
    }

    /// Skip to just after the next `;`, or to a `}` (not consumed), at the
    /// current nesting level.
    pub(crate) fn skip_to_statement_end(&mut self) {
        let mut depth = 0u32;
        loop {
            match self.token() {
                SyntaxKind::EndOfFile => return,
                SyntaxKind::Semicolon if depth == 0 => {
                    self.next_token();
                    return;
                }
                SyntaxKind::CloseBrace if depth == 0 => return,
                SyntaxKind::OpenBrace | SyntaxKind::OpenParen | SyntaxKind::OpenBracket => {
                    depth += 1;
                }
                SyntaxKind::CloseBrace | SyntaxKind::CloseParen | SyntaxKind::CloseBracket => {
                    depth = depth.saturating_sub(1);
                }
                _ => {}
            }
            self.next_token();
        }
    }

    /// Skip a balanced `open ... close` group starting at the current token.
    pub(crate) fn skip_balanced(&mut self, open: SyntaxKind, close: SyntaxKind) {
        if !self.is_token(open) {
            return;
        }
        let mut depth = 0u32;
        loop {
            let kind = self.token();
            if kind == SyntaxKind::EndOfFile {
                self.error_at_current("unbalanced brackets");
                return;
            }
            self.next_token();
            if kind == open {
                depth += 1;
            } else if kind == close {
                depth -= 1;
                if depth == 0 {
                    return;
                }
            }
        }
    }

    /// Skip `[...]` attribute sections.
    pub(crate) fn skip_attributes(&mut self) {
        while self.is_token(SyntaxKind::OpenBracket) {
            self.skip_balanced(SyntaxKind::OpenBracket, SyntaxKind::CloseBracket);
        }
    }

    /// Enter one nesting level. Returns false (with a diagnostic) when the
    /// input nests deeper than the parser accepts.
    pub(crate) fn enter_nesting(&mut self) -> bool {
        if self.depth >= MAX_PARSE_NESTING_DEPTH {
            self.error_at_current("nesting too deep");
            return false;
        }
        self.depth += 1;
        true
    }

    pub(crate) fn leave_nesting(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    // =========================================================================
    // Speculation
    // =========================================================================

    pub(crate) fn snapshot(&self) -> Snapshot {
        Snapshot {
            pos: self.pos,
            diagnostics: self.diagnostics.len(),
        }
    }

    pub(crate) fn restore(&mut self, snapshot: Snapshot) {
        self.pos = snapshot.pos;
        self.diagnostics.truncate(snapshot.diagnostics);
    }

    /// Run `f` and rewind regardless of outcome. `f` must not allocate nodes.
    pub(crate) fn look_ahead<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let snapshot = self.snapshot();
        let result = f(self);
        self.restore(snapshot);
        result
    }

    pub(crate) fn add_node(&mut self, node: Node, start: u32) -> NodeIndex {
        let end = self.last_end().max(start);
        self.arena.add(node, Span::new(start, end))
    }
}

/// Strip the verbatim `@` prefix from an identifier.
pub(crate) fn identifier_value(text: &str) -> String {
    text.strip_prefix('@').unwrap_or(text).to_string()
}
