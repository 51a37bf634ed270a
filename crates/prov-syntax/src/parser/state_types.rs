//! Type syntax.
//!
//! Types are only ever needed as names (receiver tracking, creation sites),
//! so they are parsed to normalised text instead of nodes. That keeps type
//! parsing free of allocation and therefore safe to run speculatively.

use crate::parser::state::identifier_value;
use crate::parser::ParserState;
use crate::scanner::SyntaxKind;

impl<'a> ParserState<'a> {
    /// Parse a type without consuming anything on failure.
    pub(crate) fn try_parse_type(&mut self) -> Option<String> {
        let snapshot = self.snapshot();
        let parsed = self.parse_type_text(true);
        if parsed.is_none() {
            self.restore(snapshot);
        }
        parsed
    }

    /// Parse a type, recording a diagnostic when none is present.
    pub(crate) fn parse_type(&mut self) -> String {
        match self.try_parse_type() {
            Some(ty) => ty,
            None => {
                self.error_at_current("expected type");
                String::new()
            }
        }
    }

    /// Parse a type name without array rank suffixes (for `new T[n]`).
    pub(crate) fn try_parse_type_without_ranks(&mut self) -> Option<String> {
        let snapshot = self.snapshot();
        let parsed = self.parse_type_text(false);
        if parsed.is_none() {
            self.restore(snapshot);
        }
        parsed
    }

    fn parse_type_text(&mut self, allow_ranks: bool) -> Option<String> {
        let mut text = if self.is_token(SyntaxKind::OpenParen) {
            self.parse_tuple_type_text()?
        } else {
            self.parse_named_type_text()?
        };

        loop {
            match self.token() {
                SyntaxKind::Question if self.nullable_suffix_allowed() => {
                    self.next_token();
                    text.push('?');
                }
                SyntaxKind::OpenBracket if allow_ranks && self.is_rank_specifier() => {
                    self.next_token();
                    text.push('[');
                    while self.parse_optional(SyntaxKind::Comma) {
                        text.push(',');
                    }
                    self.next_token();
                    text.push(']');
                }
                _ => break,
            }
        }
        Some(text)
    }

    /// `?` after a type is a nullable marker unless it starts a conditional.
    fn nullable_suffix_allowed(&self) -> bool {
        matches!(
            self.nth_kind(1),
            SyntaxKind::Identifier
                | SyntaxKind::GreaterThan
                | SyntaxKind::Comma
                | SyntaxKind::CloseParen
                | SyntaxKind::OpenBracket
                | SyntaxKind::CloseBracket
                | SyntaxKind::Semicolon
                | SyntaxKind::Equals
                | SyntaxKind::OpenBrace
                | SyntaxKind::ThisKeyword
                | SyntaxKind::OperatorKeyword
        )
    }

    /// `[]` / `[,]` (as opposed to an element access or size list).
    fn is_rank_specifier(&self) -> bool {
        let mut ahead = 1;
        while self.nth_kind(ahead) == SyntaxKind::Comma {
            ahead += 1;
        }
        self.nth_kind(ahead) == SyntaxKind::CloseBracket
    }

    fn parse_named_type_text(&mut self) -> Option<String> {
        let mut text = String::new();
        if self.is_contextual("global") && self.nth_kind(1) == SyntaxKind::ColonColon {
            self.next_token();
            self.next_token();
        }
        loop {
            if !self.is_token(SyntaxKind::Identifier) {
                return None;
            }
            text.push_str(&identifier_value(self.token_text()));
            self.next_token();
            if self.is_token(SyntaxKind::LessThan) {
                text.push_str(&self.parse_type_argument_text()?);
            }
            if self.is_token(SyntaxKind::Dot) || self.is_token(SyntaxKind::ColonColon) {
                if self.nth_kind(1) != SyntaxKind::Identifier {
                    return Some(text);
                }
                self.next_token();
                text.push('.');
                continue;
            }
            return Some(text);
        }
    }

    /// `<A, B<C>>`, also the open form `<,>` used in `typeof`.
    pub(crate) fn parse_type_argument_text(&mut self) -> Option<String> {
        if !self.parse_optional(SyntaxKind::LessThan) {
            return None;
        }
        let mut text = String::from("<");
        loop {
            if self.is_token(SyntaxKind::Comma) {
                self.next_token();
                text.push(',');
                continue;
            }
            if self.parse_optional(SyntaxKind::GreaterThan) {
                text.push('>');
                return Some(text);
            }
            // `in`/`out` variance only appears on declarations, which skip
            // their parameter lists elsewhere.
            let argument = self.parse_type_text(true)?;
            text.push_str(&argument);
            if self.is_token(SyntaxKind::Comma) {
                self.next_token();
                text.push_str(", ");
            } else if self.parse_optional(SyntaxKind::GreaterThan) {
                text.push('>');
                return Some(text);
            } else {
                return None;
            }
        }
    }

    /// `(int, string name)`
    fn parse_tuple_type_text(&mut self) -> Option<String> {
        self.next_token();
        let mut elements = Vec::new();
        loop {
            let element = self.parse_type_text(true)?;
            if self.is_token(SyntaxKind::Identifier) {
                self.next_token();
            }
            elements.push(element);
            if self.parse_optional(SyntaxKind::Comma) {
                continue;
            }
            if self.parse_optional(SyntaxKind::CloseParen) && elements.len() > 1 {
                return Some(format!("({})", elements.join(", ")));
            }
            return None;
        }
    }

    /// Skip a declaration's generic parameter list `<T, in U>`.
    pub(crate) fn skip_type_parameters(&mut self) {
        if self.is_token(SyntaxKind::LessThan) {
            let mut depth = 0u32;
            loop {
                match self.token() {
                    SyntaxKind::LessThan => depth += 1,
                    SyntaxKind::GreaterThan => {
                        depth -= 1;
                        if depth == 0 {
                            self.next_token();
                            return;
                        }
                    }
                    SyntaxKind::EndOfFile
                    | SyntaxKind::OpenBrace
                    | SyntaxKind::Semicolon
                    | SyntaxKind::OpenParen => {
                        self.error_at_current("unterminated type parameter list");
                        return;
                    }
                    _ => {}
                }
                self.next_token();
            }
        }
    }

    /// Skip `where T : class, new()` clauses up to the body.
    pub(crate) fn skip_constraint_clauses(&mut self) {
        if !self.is_contextual("where") {
            return;
        }
        loop {
            match self.token() {
                SyntaxKind::OpenBrace
                | SyntaxKind::Semicolon
                | SyntaxKind::EqualsGreaterThan
                | SyntaxKind::EndOfFile => return,
                SyntaxKind::OpenParen => {
                    self.skip_balanced(SyntaxKind::OpenParen, SyntaxKind::CloseParen);
                }
                _ => {
                    self.next_token();
                }
            }
        }
    }
}
