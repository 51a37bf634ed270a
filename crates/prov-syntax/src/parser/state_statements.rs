//! Statements and local declarations.

use crate::node::*;
use crate::parser::ParserState;
use crate::scanner::SyntaxKind;

impl<'a> ParserState<'a> {
    /// Parse `{ statements }`.
    pub(crate) fn parse_block(&mut self) -> NodeIndex {
        let start = self.token_pos();
        if !self.parse_expected(SyntaxKind::OpenBrace, "'{'") {
            return self.error_node("expected block");
        }
        let statements = self.parse_statements_until_close_brace();
        self.parse_expected(SyntaxKind::CloseBrace, "'}'");
        self.add_node(Node::Block(BlockData { statements }), start)
    }

    fn parse_statements_until_close_brace(&mut self) -> Vec<NodeIndex> {
        let mut statements = Vec::new();
        while !self.is_token(SyntaxKind::CloseBrace) && !self.is_eof() {
            let before = self.pos;
            let statement = self.parse_statement();
            if statement.is_some() {
                statements.push(statement);
            }
            if self.pos == before {
                // Forced progress on a token no rule accepts.
                self.error_at_current("unexpected token");
                self.next_token();
            }
        }
        statements
    }

    pub fn parse_statement(&mut self) -> NodeIndex {
        if !self.enter_nesting() {
            let error = self.error_node("statement nested too deeply");
            self.skip_to_statement_end();
            return error;
        }
        let statement = self.parse_statement_worker();
        self.leave_nesting();
        statement
    }

    fn parse_statement_worker(&mut self) -> NodeIndex {
        let start = self.token_pos();
        match self.token() {
            SyntaxKind::OpenBrace => self.parse_block(),
            SyntaxKind::Semicolon => {
                self.next_token();
                self.add_node(Node::Empty, start)
            }
            SyntaxKind::IfKeyword => self.parse_if_statement(),
            SyntaxKind::WhileKeyword => {
                self.next_token();
                let condition = self.parse_parenthesized_condition();
                let body = self.parse_embedded_statement();
                self.add_node(Node::While(WhileData { condition, body }), start)
            }
            SyntaxKind::DoKeyword => {
                self.next_token();
                let body = self.parse_embedded_statement();
                if !self.parse_expected(SyntaxKind::WhileKeyword, "'while'") {
                    self.skip_to_statement_end();
                    return self.add_node(
                        Node::Do(DoData {
                            body,
                            condition: NodeIndex::NONE,
                        }),
                        start,
                    );
                }
                let condition = self.parse_parenthesized_condition();
                self.parse_expected(SyntaxKind::Semicolon, "';'");
                self.add_node(Node::Do(DoData { body, condition }), start)
            }
            SyntaxKind::ForKeyword => self.parse_for_statement(),
            SyntaxKind::ForeachKeyword => self.parse_foreach_statement(),
            SyntaxKind::ReturnKeyword => {
                self.next_token();
                let expression = if self.is_token(SyntaxKind::Semicolon) {
                    NodeIndex::NONE
                } else {
                    self.parse_expression()
                };
                self.parse_statement_terminator();
                self.add_node(Node::Return(expression), start)
            }
            SyntaxKind::ThrowKeyword => {
                self.next_token();
                let expression = if self.is_token(SyntaxKind::Semicolon) {
                    NodeIndex::NONE
                } else {
                    self.parse_expression()
                };
                self.parse_statement_terminator();
                self.add_node(Node::Throw(expression), start)
            }
            SyntaxKind::BreakKeyword => {
                self.next_token();
                self.parse_statement_terminator();
                self.add_node(Node::Break, start)
            }
            SyntaxKind::ContinueKeyword => {
                self.next_token();
                self.parse_statement_terminator();
                self.add_node(Node::Continue, start)
            }
            SyntaxKind::GotoKeyword => {
                self.skip_to_statement_end();
                self.add_node(Node::Empty, start)
            }
            SyntaxKind::TryKeyword => self.parse_try_statement(),
            SyntaxKind::SwitchKeyword => self.parse_switch_statement(),
            SyntaxKind::UsingKeyword if self.nth_kind(1) == SyntaxKind::OpenParen => {
                self.next_token();
                self.next_token();
                let resource = if self.is_local_declaration_start() {
                    self.parse_local_declaration(false)
                } else {
                    self.parse_expression()
                };
                self.parse_expected(SyntaxKind::CloseParen, "')'");
                let body = self.parse_embedded_statement();
                self.add_node(Node::Using(UsingData { resource, body }), start)
            }
            SyntaxKind::UsingKeyword => {
                self.next_token();
                let declaration = self.parse_local_declaration(true);
                self.parse_statement_terminator();
                declaration
            }
            SyntaxKind::LockKeyword => {
                // `lock (e) body`: the lock object is evaluated, then the body.
                self.next_token();
                let condition = self.parse_parenthesized_condition();
                let lock_object = self.add_node(Node::ExpressionStatement(condition), start);
                let body = self.parse_embedded_statement();
                self.add_node(
                    Node::Block(BlockData {
                        statements: vec![lock_object, body],
                    }),
                    start,
                )
            }
            SyntaxKind::CheckedKeyword | SyntaxKind::UncheckedKeyword | SyntaxKind::UnsafeKeyword
                if self.nth_kind(1) == SyntaxKind::OpenBrace =>
            {
                self.next_token();
                self.parse_block()
            }
            SyntaxKind::FixedKeyword => {
                self.next_token();
                self.skip_balanced(SyntaxKind::OpenParen, SyntaxKind::CloseParen);
                self.parse_embedded_statement()
            }
            SyntaxKind::ConstKeyword => {
                self.next_token();
                let declaration = self.parse_local_declaration(false);
                self.parse_statement_terminator();
                declaration
            }
            SyntaxKind::Identifier if self.token_text() == "yield" => self.parse_yield_statement(),
            SyntaxKind::Identifier if self.nth_kind(1) == SyntaxKind::Colon => {
                // Label
                self.next_token();
                self.next_token();
                self.parse_statement()
            }
            _ if self.is_local_function_start() => {
                self.skip_local_function();
                self.add_node(Node::Unsupported("local function".into()), start)
            }
            _ if self.is_local_declaration_start() => {
                let declaration = self.parse_local_declaration(false);
                self.parse_statement_terminator();
                declaration
            }
            _ => self.parse_expression_statement(),
        }
    }

    /// Statement bodies of `if`/`while`/... are statements in their own right.
    fn parse_embedded_statement(&mut self) -> NodeIndex {
        if self.is_token(SyntaxKind::CloseBrace) || self.is_eof() {
            return self.error_node("expected statement");
        }
        self.parse_statement()
    }

    fn parse_expression_statement(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let expression = self.parse_expression();
        if matches!(self.arena.get(expression), Some(Node::Error(_))) {
            self.skip_to_statement_end();
        } else {
            self.parse_statement_terminator();
        }
        self.add_node(Node::ExpressionStatement(expression), start)
    }

    /// Expect `;`, skipping the rest of a malformed statement.
    fn parse_statement_terminator(&mut self) {
        if !self.parse_expected(SyntaxKind::Semicolon, "';'") {
            self.skip_to_statement_end();
        }
    }

    fn parse_parenthesized_condition(&mut self) -> NodeIndex {
        if !self.parse_expected(SyntaxKind::OpenParen, "'('") {
            return self.error_node("expected condition");
        }
        let condition = self.parse_expression();
        self.parse_expected(SyntaxKind::CloseParen, "')'");
        condition
    }

    fn parse_if_statement(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        let condition = self.parse_parenthesized_condition();
        let then_statement = self.parse_embedded_statement();
        let else_statement = if self.parse_optional(SyntaxKind::ElseKeyword) {
            self.parse_embedded_statement()
        } else {
            NodeIndex::NONE
        };
        self.add_node(
            Node::If(IfData {
                condition,
                then_statement,
                else_statement,
            }),
            start,
        )
    }

    fn parse_for_statement(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        self.parse_expected(SyntaxKind::OpenParen, "'('");

        let mut initializers = Vec::new();
        if self.is_local_declaration_start() {
            initializers.push(self.parse_local_declaration(false));
        } else {
            while !self.is_token(SyntaxKind::Semicolon) && !self.is_eof() {
                initializers.push(self.parse_expression());
                if !self.parse_optional(SyntaxKind::Comma) {
                    break;
                }
            }
        }
        self.parse_expected(SyntaxKind::Semicolon, "';'");

        let condition = if self.is_token(SyntaxKind::Semicolon) {
            NodeIndex::NONE
        } else {
            self.parse_expression()
        };
        self.parse_expected(SyntaxKind::Semicolon, "';'");

        let mut incrementors = Vec::new();
        while !self.is_token(SyntaxKind::CloseParen) && !self.is_eof() {
            incrementors.push(self.parse_expression());
            if !self.parse_optional(SyntaxKind::Comma) {
                break;
            }
        }
        self.parse_expected(SyntaxKind::CloseParen, "')'");
        let body = self.parse_embedded_statement();
        self.add_node(
            Node::For(ForData {
                initializers,
                condition,
                incrementors,
                body,
            }),
            start,
        )
    }

    fn parse_foreach_statement(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        if self.is_contextual("await") {
            self.next_token();
        }
        self.parse_expected(SyntaxKind::OpenParen, "'('");
        let ty = self.parse_type();
        let name = if self.is_token(SyntaxKind::OpenParen) {
            // Deconstruction `foreach (var (a, b) in ...)`
            self.skip_balanced(SyntaxKind::OpenParen, SyntaxKind::CloseParen);
            String::new()
        } else {
            self.parse_identifier_text()
        };
        self.parse_expected(SyntaxKind::InKeyword, "'in'");
        let expression = self.parse_expression();
        self.parse_expected(SyntaxKind::CloseParen, "')'");
        let body = self.parse_embedded_statement();
        self.add_node(
            Node::Foreach(ForeachData {
                ty,
                name,
                expression,
                body,
            }),
            start,
        )
    }

    fn parse_try_statement(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        let block = self.parse_block();
        let mut catches = Vec::new();
        while self.is_token(SyntaxKind::CatchKeyword) {
            let catch_start = self.token_pos();
            self.next_token();
            let mut ty = String::new();
            let mut name = String::new();
            if self.parse_optional(SyntaxKind::OpenParen) {
                ty = self.parse_type();
                if self.is_token(SyntaxKind::Identifier) {
                    name = self.parse_identifier_text();
                }
                self.parse_expected(SyntaxKind::CloseParen, "')'");
            }
            if self.is_contextual("when") {
                // Exception filters are side-effect free for our purposes.
                self.next_token();
                self.skip_balanced(SyntaxKind::OpenParen, SyntaxKind::CloseParen);
            }
            let catch_block = self.parse_block();
            catches.push(self.add_node(
                Node::Catch(CatchData {
                    ty,
                    name,
                    block: catch_block,
                }),
                catch_start,
            ));
        }
        let finally_block = if self.parse_optional(SyntaxKind::FinallyKeyword) {
            self.parse_block()
        } else {
            NodeIndex::NONE
        };
        if catches.is_empty() && finally_block.is_none() {
            self.error_at_current("expected 'catch' or 'finally'");
        }
        self.add_node(
            Node::Try(TryData {
                block,
                catches,
                finally_block,
            }),
            start,
        )
    }

    fn parse_switch_statement(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        let expression = self.parse_parenthesized_condition();
        let mut sections = Vec::new();
        if !self.parse_expected(SyntaxKind::OpenBrace, "'{'") {
            return self.add_node(
                Node::Switch(SwitchData {
                    expression,
                    sections,
                }),
                start,
            );
        }
        while !self.is_token(SyntaxKind::CloseBrace) && !self.is_eof() {
            let section_start = self.token_pos();
            // Labels: `case <pattern> [when <expr>]:` / `default:`
            let mut saw_label = false;
            while self.is_token(SyntaxKind::CaseKeyword) || self.is_token(SyntaxKind::DefaultKeyword)
            {
                saw_label = true;
                self.skip_switch_label();
            }
            if !saw_label {
                self.error_at_current("expected 'case' or 'default'");
                self.skip_to_statement_end();
                continue;
            }
            let mut statements = Vec::new();
            while !matches!(
                self.token(),
                SyntaxKind::CaseKeyword
                    | SyntaxKind::CloseBrace
                    | SyntaxKind::EndOfFile
            ) && !(self.is_token(SyntaxKind::DefaultKeyword)
                && self.nth_kind(1) == SyntaxKind::Colon)
            {
                let before = self.pos;
                statements.push(self.parse_statement());
                if self.pos == before {
                    self.next_token();
                }
            }
            sections.push(self.add_node(Node::Block(BlockData { statements }), section_start));
        }
        self.parse_expected(SyntaxKind::CloseBrace, "'}'");
        self.add_node(
            Node::Switch(SwitchData {
                expression,
                sections,
            }),
            start,
        )
    }

    fn skip_switch_label(&mut self) {
        self.next_token();
        let mut depth = 0u32;
        loop {
            match self.token() {
                SyntaxKind::Colon if depth == 0 => {
                    self.next_token();
                    return;
                }
                SyntaxKind::OpenParen | SyntaxKind::OpenBrace | SyntaxKind::OpenBracket => {
                    depth += 1
                }
                SyntaxKind::CloseParen | SyntaxKind::CloseBracket => {
                    depth = depth.saturating_sub(1)
                }
                SyntaxKind::CloseBrace if depth == 0 => return,
                SyntaxKind::CloseBrace => depth -= 1,
                SyntaxKind::EndOfFile | SyntaxKind::Semicolon => {
                    self.error_at_current("expected ':'");
                    return;
                }
                _ => {}
            }
            self.next_token();
        }
    }

    /// `yield return e;` behaves as a return for provenance; `yield break;`
    /// ends the sequence.
    fn parse_yield_statement(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        if self.parse_optional(SyntaxKind::BreakKeyword) {
            self.parse_statement_terminator();
            return self.add_node(Node::Break, start);
        }
        self.parse_expected(SyntaxKind::ReturnKeyword, "'return'");
        let expression = self.parse_expression();
        self.parse_statement_terminator();
        self.add_node(Node::Return(expression), start)
    }

    // =========================================================================
    // Local declarations
    // =========================================================================

    /// `T name` followed by `=`, `;`, `,` or `)` (for `using (...)`).
    pub(crate) fn is_local_declaration_start(&mut self) -> bool {
        self.look_ahead(|p| {
            while matches!(p.token(), SyntaxKind::RefKeyword | SyntaxKind::ReadonlyKeyword)
                || p.is_contextual("scoped")
            {
                p.next_token();
            }
            if p.try_parse_type().is_none() {
                return false;
            }
            if !p.is_token(SyntaxKind::Identifier) {
                return false;
            }
            p.next_token();
            matches!(
                p.token(),
                SyntaxKind::Equals
                    | SyntaxKind::Semicolon
                    | SyntaxKind::Comma
                    | SyntaxKind::CloseParen
                    | SyntaxKind::InKeyword
            )
        })
    }

    fn is_local_function_start(&mut self) -> bool {
        self.look_ahead(|p| {
            while p.is_token(SyntaxKind::StaticKeyword)
                || p.is_token(SyntaxKind::UnsafeKeyword)
                || p.is_contextual("async")
            {
                p.next_token();
            }
            if p.try_parse_type().is_none() || !p.is_token(SyntaxKind::Identifier) {
                return false;
            }
            p.next_token();
            if p.is_token(SyntaxKind::LessThan) {
                p.skip_type_parameters();
            }
            if !p.is_token(SyntaxKind::OpenParen) {
                return false;
            }
            p.skip_balanced(SyntaxKind::OpenParen, SyntaxKind::CloseParen);
            p.skip_constraint_clauses();
            matches!(
                p.token(),
                SyntaxKind::OpenBrace | SyntaxKind::EqualsGreaterThan
            )
        })
    }

    /// Local functions are not part of the modelled language: skip one.
    fn skip_local_function(&mut self) {
        while !matches!(
            self.token(),
            SyntaxKind::OpenParen | SyntaxKind::EndOfFile
        ) {
            self.next_token();
        }
        self.skip_balanced(SyntaxKind::OpenParen, SyntaxKind::CloseParen);
        self.skip_constraint_clauses();
        if self.is_token(SyntaxKind::OpenBrace) {
            self.skip_balanced(SyntaxKind::OpenBrace, SyntaxKind::CloseBrace);
        } else {
            self.skip_to_statement_end();
        }
    }

    /// `T a = e, b;` without the terminator.
    pub(crate) fn parse_local_declaration(&mut self, is_using: bool) -> NodeIndex {
        let start = self.token_pos();
        while matches!(self.token(), SyntaxKind::RefKeyword | SyntaxKind::ReadonlyKeyword)
            || self.is_contextual("scoped")
        {
            self.next_token();
        }
        let ty = self.parse_type();
        let mut declarators = Vec::new();
        loop {
            let declarator_start = self.token_pos();
            let name = self.parse_identifier_text();
            let initializer = if self.parse_optional(SyntaxKind::Equals) {
                self.parse_variable_initializer()
            } else {
                NodeIndex::NONE
            };
            declarators.push(self.add_node(
                Node::VariableDeclarator(VariableDeclaratorData {
                    ty: ty.clone(),
                    name,
                    initializer,
                }),
                declarator_start,
            ));
            if !self.parse_optional(SyntaxKind::Comma) {
                break;
            }
        }
        self.add_node(
            Node::LocalDeclaration(LocalDeclarationData {
                is_using,
                declarators,
            }),
            start,
        )
    }

    /// Right-hand side of a declaration: an expression or a bare `{ ... }`
    /// array initializer.
    pub(crate) fn parse_variable_initializer(&mut self) -> NodeIndex {
        if self.is_token(SyntaxKind::OpenBrace) {
            self.parse_initializer(InitializerKind::Array)
        } else {
            self.parse_expression()
        }
    }
}
