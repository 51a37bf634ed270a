//! Expressions, lowest precedence first.
//!
//! ```text
//! assignment  = conditional [assign-op assignment]     (right assoc)
//! conditional = coalesce ['?' expression ':' expression]
//! coalesce    = binary(||) ['??' coalesce]              (right assoc)
//! binary      = || && | ^ & (== !=) (< > <= >= is as) (<< >>) (+ -) (* / %)
//! unary       = prefix-op unary | cast | postfix
//! ```

use crate::node::*;
use crate::parser::ParserState;
use crate::parser::state::identifier_value;
use crate::scanner::SyntaxKind;

/// Identifiers that read as a type keyword and may precede a unary `+`/`-`
/// in a cast (`(int)-x`).
const PREDEFINED_TYPES: &[&str] = &[
    "bool", "byte", "char", "decimal", "double", "float", "int", "long", "nint", "nuint",
    "object", "sbyte", "short", "string", "uint", "ulong", "ushort",
];

impl<'a> ParserState<'a> {
    pub fn parse_expression(&mut self) -> NodeIndex {
        if !self.enter_nesting() {
            return self.error_node("expression nested too deeply");
        }
        let expression = self.parse_assignment_expression();
        self.leave_nesting();
        expression
    }

    fn parse_assignment_expression(&mut self) -> NodeIndex {
        let start = self.token_pos();
        if self.is_lambda_start() {
            return self.parse_lambda();
        }
        if self.is_token(SyntaxKind::ThrowKeyword) {
            self.next_token();
            let _ = self.parse_expression();
            return self.add_node(Node::Unsupported("throw expression".into()), start);
        }

        let target = self.parse_conditional_expression();
        let Some((op, width)) = self.assignment_operator() else {
            return target;
        };
        for _ in 0..width {
            self.next_token();
        }
        let value = if op == AssignOp::Assign && self.is_token(SyntaxKind::OpenBrace) {
            // Nested object/collection initializer inside an initializer.
            self.parse_initializer(InitializerKind::Object)
        } else {
            self.parse_expression()
        };
        self.add_node(Node::Assignment(AssignmentData { op, target, value }), start)
    }

    /// Assignment operator at the cursor and the number of tokens it spans.
    fn assignment_operator(&self) -> Option<(AssignOp, usize)> {
        let op = match self.token() {
            SyntaxKind::Equals => AssignOp::Assign,
            SyntaxKind::PlusEquals => AssignOp::Add,
            SyntaxKind::MinusEquals => AssignOp::Subtract,
            SyntaxKind::AsteriskEquals => AssignOp::Multiply,
            SyntaxKind::SlashEquals => AssignOp::Divide,
            SyntaxKind::PercentEquals => AssignOp::Remainder,
            SyntaxKind::AmpersandEquals => AssignOp::BitwiseAnd,
            SyntaxKind::BarEquals => AssignOp::BitwiseOr,
            SyntaxKind::CaretEquals => AssignOp::ExclusiveOr,
            SyntaxKind::LessThanLessThanEquals => AssignOp::LeftShift,
            SyntaxKind::QuestionQuestionEquals => AssignOp::Coalesce,
            SyntaxKind::GreaterThan
                if self.nth_kind(1) == SyntaxKind::GreaterThanEquals && self.nth_adjacent(0) =>
            {
                return Some((AssignOp::RightShift, 2));
            }
            _ => return None,
        };
        Some((op, 1))
    }

    fn parse_conditional_expression(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let condition = self.parse_coalesce_expression();
        if !self.is_token(SyntaxKind::Question) {
            return condition;
        }
        self.next_token();
        let when_true = self.parse_expression();
        self.parse_expected(SyntaxKind::Colon, "':'");
        let when_false = self.parse_expression();
        self.add_node(
            Node::Conditional(ConditionalData {
                condition,
                when_true,
                when_false,
            }),
            start,
        )
    }

    fn parse_coalesce_expression(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let left = self.parse_binary_expression(1);
        if !self.is_token(SyntaxKind::QuestionQuestion) {
            return left;
        }
        self.next_token();
        let right = self.parse_coalesce_expression();
        self.add_node(
            Node::Binary(BinaryData {
                op: BinaryOp::Coalesce,
                left,
                right,
            }),
            start,
        )
    }

    /// Binary operator at the cursor with its precedence and token width.
    fn binary_operator(&self) -> Option<(BinaryOp, u8, usize)> {
        let (op, precedence) = match self.token() {
            SyntaxKind::BarBar => (BinaryOp::LogicalOr, 1),
            SyntaxKind::AmpersandAmpersand => (BinaryOp::LogicalAnd, 2),
            SyntaxKind::Bar => (BinaryOp::BitwiseOr, 3),
            SyntaxKind::Caret => (BinaryOp::ExclusiveOr, 4),
            SyntaxKind::Ampersand => (BinaryOp::BitwiseAnd, 5),
            SyntaxKind::EqualsEquals => (BinaryOp::Equals, 6),
            SyntaxKind::ExclamationEquals => (BinaryOp::NotEquals, 6),
            SyntaxKind::LessThan => (BinaryOp::LessThan, 7),
            SyntaxKind::LessThanEquals => (BinaryOp::LessThanOrEqual, 7),
            SyntaxKind::GreaterThanEquals => (BinaryOp::GreaterThanOrEqual, 7),
            SyntaxKind::IsKeyword => (BinaryOp::Is, 7),
            SyntaxKind::GreaterThan => {
                if self.nth_adjacent(0) {
                    match self.nth_kind(1) {
                        SyntaxKind::GreaterThan => return Some((BinaryOp::RightShift, 8, 2)),
                        SyntaxKind::GreaterThanEquals => return None,
                        _ => {}
                    }
                }
                (BinaryOp::GreaterThan, 7)
            }
            SyntaxKind::LessThanLessThan => (BinaryOp::LeftShift, 8),
            SyntaxKind::Plus => (BinaryOp::Add, 9),
            SyntaxKind::Minus => (BinaryOp::Subtract, 9),
            SyntaxKind::Asterisk => (BinaryOp::Multiply, 10),
            SyntaxKind::Slash => (BinaryOp::Divide, 10),
            SyntaxKind::Percent => (BinaryOp::Remainder, 10),
            _ => return None,
        };
        Some((op, precedence, 1))
    }

    fn parse_binary_expression(&mut self, min_precedence: u8) -> NodeIndex {
        let start = self.token_pos();
        let mut left = self.parse_unary_expression();
        loop {
            // `as` shares relational precedence but takes a type.
            if self.is_token(SyntaxKind::AsKeyword) && min_precedence <= 7 {
                self.next_token();
                let ty = self.parse_type();
                left = self.add_node(
                    Node::Cast(CastData {
                        ty,
                        expression: left,
                        is_as: true,
                    }),
                    start,
                );
                continue;
            }
            let Some((op, precedence, width)) = self.binary_operator() else {
                break;
            };
            if precedence < min_precedence {
                break;
            }
            for _ in 0..width {
                self.next_token();
            }
            let right = if op == BinaryOp::Is {
                self.parse_pattern()
            } else {
                self.parse_binary_expression(precedence + 1)
            };
            left = self.add_node(Node::Binary(BinaryData { op, left, right }), start);
        }
        left
    }

    /// Right side of `is`. Only a designation (`is T x`) produces a node,
    /// because it declares a variable.
    fn parse_pattern(&mut self) -> NodeIndex {
        let mut designation = NodeIndex::NONE;
        loop {
            while self.is_contextual("not") {
                self.next_token();
            }
            match self.token() {
                SyntaxKind::NullKeyword
                | SyntaxKind::TrueKeyword
                | SyntaxKind::FalseKeyword
                | SyntaxKind::IntegerLiteral
                | SyntaxKind::RealLiteral
                | SyntaxKind::StringLiteral
                | SyntaxKind::CharLiteral => {
                    self.next_token();
                }
                SyntaxKind::LessThan
                | SyntaxKind::LessThanEquals
                | SyntaxKind::GreaterThan
                | SyntaxKind::GreaterThanEquals => {
                    self.next_token();
                    let _ = self.parse_unary_expression();
                }
                SyntaxKind::OpenBrace => {
                    self.skip_balanced(SyntaxKind::OpenBrace, SyntaxKind::CloseBrace);
                }
                SyntaxKind::OpenParen => {
                    self.skip_balanced(SyntaxKind::OpenParen, SyntaxKind::CloseParen);
                }
                _ => {
                    if self.try_parse_type().is_none() {
                        self.error_at_current("expected pattern");
                        return designation;
                    }
                }
            }
            if self.is_token(SyntaxKind::OpenBrace) {
                self.skip_balanced(SyntaxKind::OpenBrace, SyntaxKind::CloseBrace);
            }
            if self.is_token(SyntaxKind::Identifier)
                && !matches!(self.token_text(), "and" | "or" | "when")
            {
                let start = self.token_pos();
                let name = self.parse_identifier_text();
                designation = self.add_node(
                    Node::DeclarationExpression(DeclarationExpressionData {
                        ty: String::new(),
                        name,
                    }),
                    start,
                );
            }
            if self.is_contextual("and") || self.is_contextual("or") {
                self.next_token();
                continue;
            }
            return designation;
        }
    }

    fn parse_unary_expression(&mut self) -> NodeIndex {
        if !self.enter_nesting() {
            return self.error_node("expression nested too deeply");
        }
        let expression = self.parse_unary_expression_worker();
        self.leave_nesting();
        expression
    }

    fn parse_unary_expression_worker(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let op = match self.token() {
            SyntaxKind::Minus => Some(UnaryOp::Negate),
            SyntaxKind::Plus => Some(UnaryOp::Plus),
            SyntaxKind::Exclamation => Some(UnaryOp::Not),
            SyntaxKind::Tilde => Some(UnaryOp::BitwiseNot),
            SyntaxKind::PlusPlus => Some(UnaryOp::PreIncrement),
            SyntaxKind::MinusMinus => Some(UnaryOp::PreDecrement),
            SyntaxKind::Identifier
                if self.token_text() == "await" && self.next_starts_operand() =>
            {
                Some(UnaryOp::Await)
            }
            _ => None,
        };
        if let Some(op) = op {
            self.next_token();
            let operand = self.parse_unary_expression();
            return self.add_node(Node::Unary(UnaryData { op, operand }), start);
        }

        if self.is_token(SyntaxKind::RefKeyword) {
            // `ref x` passes a reference to the same storage.
            self.next_token();
            return self.parse_unary_expression();
        }

        if self.is_token(SyntaxKind::OpenParen) {
            if let Some(ty) = self.try_parse_cast_prefix() {
                let expression = self.parse_unary_expression();
                return self.add_node(
                    Node::Cast(CastData {
                        ty,
                        expression,
                        is_as: false,
                    }),
                    start,
                );
            }
        }

        let primary = self.parse_primary_expression();
        self.parse_postfix_expression(primary, start)
    }

    fn next_starts_operand(&self) -> bool {
        Self::starts_operand(self.nth_kind(1))
    }

    fn starts_operand(kind: SyntaxKind) -> bool {
        kind.is_literal()
            || matches!(
                kind,
                SyntaxKind::Identifier
                    | SyntaxKind::OpenParen
                    | SyntaxKind::ThisKeyword
                    | SyntaxKind::BaseKeyword
                    | SyntaxKind::NewKeyword
                    | SyntaxKind::TypeofKeyword
                    | SyntaxKind::DefaultKeyword
                    | SyntaxKind::TrueKeyword
                    | SyntaxKind::FalseKeyword
                    | SyntaxKind::NullKeyword
                    | SyntaxKind::Exclamation
                    | SyntaxKind::Tilde
                    | SyntaxKind::CheckedKeyword
                    | SyntaxKind::UncheckedKeyword
                    | SyntaxKind::SizeofKeyword
            )
    }

    /// `(T)` followed by something that can only be an operand.
    fn try_parse_cast_prefix(&mut self) -> Option<String> {
        let snapshot = self.snapshot();
        self.next_token();
        let parsed = self.try_parse_type().filter(|_| self.is_token(SyntaxKind::CloseParen));
        if let Some(ty) = parsed {
            self.next_token();
            let next = self.token();
            let is_cast = Self::starts_operand(next)
                || (matches!(next, SyntaxKind::Minus | SyntaxKind::Plus)
                    && PREDEFINED_TYPES.contains(&ty.trim_end_matches('?')));
            if is_cast {
                return Some(ty);
            }
        }
        self.restore(snapshot);
        None
    }

    fn parse_postfix_expression(&mut self, mut expression: NodeIndex, start: u32) -> NodeIndex {
        loop {
            match self.token() {
                SyntaxKind::Dot | SyntaxKind::MinusGreaterThan => {
                    self.next_token();
                    let name = self.parse_member_name();
                    expression =
                        self.add_node(Node::MemberAccess(MemberAccessData { expression, name }), start);
                }
                SyntaxKind::QuestionDot => {
                    return self.parse_conditional_access(expression, start);
                }
                SyntaxKind::Question
                    if self.nth_kind(1) == SyntaxKind::OpenBracket && self.nth_adjacent(0) =>
                {
                    return self.parse_conditional_access(expression, start);
                }
                SyntaxKind::OpenParen => {
                    let arguments = self.parse_argument_list(SyntaxKind::CloseParen);
                    expression = self.add_node(
                        Node::Invocation(InvocationData {
                            expression,
                            arguments,
                        }),
                        start,
                    );
                }
                SyntaxKind::OpenBracket => {
                    let arguments = self.parse_argument_list(SyntaxKind::CloseBracket);
                    expression = self.add_node(
                        Node::ElementAccess(ElementAccessData {
                            expression,
                            arguments,
                        }),
                        start,
                    );
                }
                SyntaxKind::PlusPlus | SyntaxKind::MinusMinus => {
                    let op = if self.is_token(SyntaxKind::PlusPlus) {
                        UnaryOp::PostIncrement
                    } else {
                        UnaryOp::PostDecrement
                    };
                    self.next_token();
                    expression = self.add_node(
                        Node::Unary(UnaryData {
                            op,
                            operand: expression,
                        }),
                        start,
                    );
                }
                // There is no binary `!`, so in postfix position it is the
                // null-forgiving operator.
                SyntaxKind::Exclamation => {
                    self.next_token();
                    expression = self.add_node(
                        Node::Unary(UnaryData {
                            op: UnaryOp::SuppressNullable,
                            operand: expression,
                        }),
                        start,
                    );
                }
                SyntaxKind::SwitchKeyword => {
                    self.next_token();
                    self.skip_balanced(SyntaxKind::OpenBrace, SyntaxKind::CloseBrace);
                    expression =
                        self.add_node(Node::Unsupported("switch expression".into()), start);
                }
                SyntaxKind::Identifier
                    if self.token_text() == "with" && self.nth_kind(1) == SyntaxKind::OpenBrace =>
                {
                    self.next_token();
                    self.skip_balanced(SyntaxKind::OpenBrace, SyntaxKind::CloseBrace);
                    expression = self.add_node(Node::Unsupported("with expression".into()), start);
                }
                _ => return expression,
            }
        }
    }

    /// Member name after `.`, with optional generic arguments.
    fn parse_member_name(&mut self) -> String {
        let name = self.parse_identifier_text();
        if self.is_token(SyntaxKind::LessThan) {
            self.try_skip_generic_arguments();
        }
        name
    }

    /// `a?.b.c(d)`: the receiver is evaluated once, the rest binds against it.
    fn parse_conditional_access(&mut self, expression: NodeIndex, start: u32) -> NodeIndex {
        let binding_start = self.token_pos();
        let binding = if self.parse_optional(SyntaxKind::QuestionDot) {
            let name = self.parse_member_name();
            self.add_node(Node::MemberBinding(MemberBindingData { name }), binding_start)
        } else {
            // `?[`
            self.next_token();
            let arguments = self.parse_argument_list(SyntaxKind::CloseBracket);
            self.add_node(
                Node::ElementAccess(ElementAccessData {
                    expression: NodeIndex::NONE,
                    arguments,
                }),
                binding_start,
            )
        };
        let when_not_null = self.parse_postfix_expression(binding, binding_start);
        self.add_node(
            Node::ConditionalAccess(ConditionalAccessData {
                expression,
                when_not_null,
            }),
            start,
        )
    }

    /// Consume `<...>` after a name when it is a type argument list.
    fn try_skip_generic_arguments(&mut self) -> bool {
        let snapshot = self.snapshot();
        if self.parse_type_argument_text().is_some()
            && matches!(
                self.token(),
                SyntaxKind::OpenParen
                    | SyntaxKind::Dot
                    | SyntaxKind::CloseParen
                    | SyntaxKind::Comma
                    | SyntaxKind::Semicolon
                    | SyntaxKind::QuestionDot
                    | SyntaxKind::CloseBracket
            )
        {
            return true;
        }
        self.restore(snapshot);
        false
    }

    fn parse_primary_expression(&mut self) -> NodeIndex {
        let start = self.token_pos();
        match self.token() {
            SyntaxKind::IntegerLiteral => self.parse_literal(LiteralKind::Integer),
            SyntaxKind::RealLiteral => self.parse_literal(LiteralKind::Real),
            SyntaxKind::StringLiteral => self.parse_literal(LiteralKind::String),
            SyntaxKind::InterpolatedStringLiteral => {
                self.parse_literal(LiteralKind::InterpolatedString)
            }
            SyntaxKind::CharLiteral => self.parse_literal(LiteralKind::Char),
            SyntaxKind::TrueKeyword => self.parse_literal(LiteralKind::True),
            SyntaxKind::FalseKeyword => self.parse_literal(LiteralKind::False),
            SyntaxKind::NullKeyword => self.parse_literal(LiteralKind::Null),
            SyntaxKind::Identifier => {
                let name = identifier_value(self.token_text());
                self.next_token();
                if self.is_token(SyntaxKind::LessThan) {
                    self.try_skip_generic_arguments();
                }
                self.add_node(Node::Identifier(IdentifierData { name }), start)
            }
            SyntaxKind::ThisKeyword => {
                self.next_token();
                self.add_node(Node::This, start)
            }
            SyntaxKind::BaseKeyword => {
                self.next_token();
                self.add_node(Node::Base, start)
            }
            SyntaxKind::DefaultKeyword => {
                self.next_token();
                let ty = if self.parse_optional(SyntaxKind::OpenParen) {
                    let ty = self.parse_type();
                    self.parse_expected(SyntaxKind::CloseParen, "')'");
                    ty
                } else {
                    String::new()
                };
                self.add_node(Node::Default(ty), start)
            }
            SyntaxKind::TypeofKeyword => {
                self.next_token();
                self.parse_expected(SyntaxKind::OpenParen, "'('");
                let ty = self.parse_type();
                self.parse_expected(SyntaxKind::CloseParen, "')'");
                self.add_node(Node::TypeOf(ty), start)
            }
            SyntaxKind::SizeofKeyword => {
                self.next_token();
                self.skip_balanced(SyntaxKind::OpenParen, SyntaxKind::CloseParen);
                let text = self
                    .source
                    .get(start as usize..self.last_end() as usize)
                    .unwrap_or("")
                    .to_string();
                self.add_node(
                    Node::Literal(LiteralData {
                        kind: LiteralKind::Integer,
                        text,
                    }),
                    start,
                )
            }
            SyntaxKind::CheckedKeyword | SyntaxKind::UncheckedKeyword => {
                self.next_token();
                self.parse_expected(SyntaxKind::OpenParen, "'('");
                let inner = self.parse_expression();
                self.parse_expected(SyntaxKind::CloseParen, "')'");
                self.add_node(Node::Parenthesized(inner), start)
            }
            SyntaxKind::OpenParen => self.parse_parenthesized_expression(),
            SyntaxKind::NewKeyword => self.parse_creation_expression(),
            SyntaxKind::OpenBracket => {
                // Collection expression `[a, b, ..c]`
                self.next_token();
                let mut expressions = Vec::new();
                while !self.is_token(SyntaxKind::CloseBracket) && !self.is_eof() {
                    self.parse_optional(SyntaxKind::DotDot);
                    expressions.push(self.parse_expression());
                    if !self.parse_optional(SyntaxKind::Comma) {
                        break;
                    }
                }
                self.parse_expected(SyntaxKind::CloseBracket, "']'");
                self.add_node(
                    Node::Initializer(InitializerData {
                        kind: InitializerKind::Array,
                        expressions,
                    }),
                    start,
                )
            }
            SyntaxKind::DelegateKeyword => {
                self.next_token();
                if self.is_token(SyntaxKind::OpenParen) {
                    self.skip_balanced(SyntaxKind::OpenParen, SyntaxKind::CloseParen);
                }
                self.skip_balanced(SyntaxKind::OpenBrace, SyntaxKind::CloseBrace);
                self.add_node(Node::Unsupported("anonymous method".into()), start)
            }
            SyntaxKind::StackallocKeyword => {
                self.next_token();
                let _ = self.try_parse_type_without_ranks();
                self.skip_balanced(SyntaxKind::OpenBracket, SyntaxKind::CloseBracket);
                self.skip_balanced(SyntaxKind::OpenBrace, SyntaxKind::CloseBrace);
                self.add_node(Node::Unsupported("stackalloc".into()), start)
            }
            _ => self.error_node("expected expression"),
        }
    }

    fn parse_literal(&mut self, kind: LiteralKind) -> NodeIndex {
        let start = self.token_pos();
        let text = self.token_text().to_string();
        self.next_token();
        self.add_node(Node::Literal(LiteralData { kind, text }), start)
    }

    /// `(e)`, or a tuple literal `(a, b)`.
    fn parse_parenthesized_expression(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        let inner = self.parse_expression();
        if self.is_token(SyntaxKind::Comma) {
            while self.parse_optional(SyntaxKind::Comma) {
                let _ = self.parse_expression();
            }
            self.parse_expected(SyntaxKind::CloseParen, "')'");
            return self.add_node(Node::Unsupported("tuple".into()), start);
        }
        self.parse_expected(SyntaxKind::CloseParen, "')'");
        self.add_node(Node::Parenthesized(inner), start)
    }

    // =========================================================================
    // Lambdas
    // =========================================================================

    fn is_lambda_start(&mut self) -> bool {
        self.look_ahead(|p| {
            if p.is_contextual("async") || p.is_token(SyntaxKind::StaticKeyword) {
                p.next_token();
            }
            match p.token() {
                SyntaxKind::Identifier => p.nth_kind(1) == SyntaxKind::EqualsGreaterThan,
                SyntaxKind::OpenParen => {
                    p.skip_balanced(SyntaxKind::OpenParen, SyntaxKind::CloseParen);
                    p.is_token(SyntaxKind::EqualsGreaterThan)
                }
                _ => false,
            }
        })
    }

    /// Lambdas are opaque: the body is parsed for recovery but not attached.
    fn parse_lambda(&mut self) -> NodeIndex {
        let start = self.token_pos();
        while !matches!(
            self.token(),
            SyntaxKind::EqualsGreaterThan | SyntaxKind::EndOfFile
        ) {
            if self.is_token(SyntaxKind::OpenParen) {
                self.skip_balanced(SyntaxKind::OpenParen, SyntaxKind::CloseParen);
            } else {
                self.next_token();
            }
        }
        self.parse_expected(SyntaxKind::EqualsGreaterThan, "'=>'");
        if self.is_token(SyntaxKind::OpenBrace) {
            self.skip_balanced(SyntaxKind::OpenBrace, SyntaxKind::CloseBrace);
        } else {
            let _ = self.parse_expression();
        }
        self.add_node(Node::Unsupported("lambda".into()), start)
    }

    // =========================================================================
    // Arguments
    // =========================================================================

    /// `(args)` or `[args]`, the opening token at the cursor.
    pub(crate) fn parse_argument_list(&mut self, close: SyntaxKind) -> Vec<NodeIndex> {
        self.next_token();
        let mut arguments = Vec::new();
        while !self.is_token(close) && !self.is_eof() {
            arguments.push(self.parse_argument());
            if !self.parse_optional(SyntaxKind::Comma) {
                break;
            }
        }
        let what = if close == SyntaxKind::CloseParen { "')'" } else { "']'" };
        self.parse_expected(close, what);
        arguments
    }

    fn parse_argument(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let mut name = String::new();
        if self.is_token(SyntaxKind::Identifier) && self.nth_kind(1) == SyntaxKind::Colon {
            name = self.parse_identifier_text();
            self.next_token();
        }
        let modifier = match self.token() {
            SyntaxKind::OutKeyword => ArgumentModifier::Out,
            SyntaxKind::RefKeyword => ArgumentModifier::Ref,
            SyntaxKind::InKeyword => ArgumentModifier::In,
            _ => ArgumentModifier::None,
        };
        if modifier != ArgumentModifier::None {
            self.next_token();
        }
        let expression = if modifier == ArgumentModifier::Out && self.is_out_declaration() {
            let decl_start = self.token_pos();
            let ty = self.parse_type();
            let name = self.parse_identifier_text();
            self.add_node(
                Node::DeclarationExpression(DeclarationExpressionData { ty, name }),
                decl_start,
            )
        } else {
            self.parse_expression()
        };
        self.add_node(
            Node::Argument(ArgumentData {
                name,
                modifier,
                expression,
            }),
            start,
        )
    }

    /// `out T x` / `out var x`
    fn is_out_declaration(&mut self) -> bool {
        self.look_ahead(|p| {
            p.try_parse_type().is_some()
                && p.is_token(SyntaxKind::Identifier)
                && matches!(
                    p.nth_kind(1),
                    SyntaxKind::Comma | SyntaxKind::CloseParen | SyntaxKind::CloseBracket
                )
        })
    }

    // =========================================================================
    // Creation
    // =========================================================================

    fn parse_creation_expression(&mut self) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();

        match self.token() {
            // Target-typed `new(...)`
            SyntaxKind::OpenParen => {
                let arguments = self.parse_argument_list(SyntaxKind::CloseParen);
                let initializer = self.parse_optional_object_initializer();
                return self.add_node(
                    Node::ObjectCreation(ObjectCreationData {
                        ty: String::new(),
                        arguments,
                        initializer,
                    }),
                    start,
                );
            }
            // Anonymous object `new { A = 1 }`
            SyntaxKind::OpenBrace => {
                let initializer = self.parse_initializer(InitializerKind::Object);
                return self.add_node(
                    Node::ObjectCreation(ObjectCreationData {
                        ty: String::new(),
                        arguments: Vec::new(),
                        initializer,
                    }),
                    start,
                );
            }
            // Implicitly typed array `new[] { ... }`
            SyntaxKind::OpenBracket => {
                while !matches!(
                    self.token(),
                    SyntaxKind::CloseBracket | SyntaxKind::EndOfFile
                ) {
                    self.next_token();
                }
                self.parse_expected(SyntaxKind::CloseBracket, "']'");
                let initializer = if self.is_token(SyntaxKind::OpenBrace) {
                    self.parse_initializer(InitializerKind::Array)
                } else {
                    self.error_node("expected array initializer")
                };
                return self.add_node(
                    Node::ArrayCreation(ArrayCreationData {
                        element_ty: String::new(),
                        sizes: Vec::new(),
                        initializer,
                    }),
                    start,
                );
            }
            _ => {}
        }

        let Some(ty) = self.try_parse_type_without_ranks() else {
            return self.error_node("expected type after 'new'");
        };

        if self.is_token(SyntaxKind::OpenBracket) {
            let mut sizes = Vec::new();
            let mut element_ty = ty;
            self.next_token();
            while !self.is_token(SyntaxKind::CloseBracket) && !self.is_eof() {
                if self.parse_optional(SyntaxKind::Comma) {
                    continue;
                }
                sizes.push(self.parse_expression());
            }
            self.parse_expected(SyntaxKind::CloseBracket, "']'");
            // Jagged ranks `[][]`
            while self.is_token(SyntaxKind::OpenBracket) {
                self.skip_balanced(SyntaxKind::OpenBracket, SyntaxKind::CloseBracket);
                element_ty.push_str("[]");
            }
            let initializer = if self.is_token(SyntaxKind::OpenBrace) {
                self.parse_initializer(InitializerKind::Array)
            } else {
                NodeIndex::NONE
            };
            return self.add_node(
                Node::ArrayCreation(ArrayCreationData {
                    element_ty,
                    sizes,
                    initializer,
                }),
                start,
            );
        }

        let arguments = if self.is_token(SyntaxKind::OpenParen) {
            self.parse_argument_list(SyntaxKind::CloseParen)
        } else {
            if !self.is_token(SyntaxKind::OpenBrace) {
                self.error_at_current("expected '(' or '{'");
            }
            Vec::new()
        };
        let initializer = self.parse_optional_object_initializer();
        self.add_node(
            Node::ObjectCreation(ObjectCreationData {
                ty,
                arguments,
                initializer,
            }),
            start,
        )
    }

    fn parse_optional_object_initializer(&mut self) -> NodeIndex {
        if self.is_token(SyntaxKind::OpenBrace) {
            self.parse_initializer(InitializerKind::Object)
        } else {
            NodeIndex::NONE
        }
    }

    /// `{ ... }`. `hint` is refined from the elements: member assignments
    /// make an object initializer, anything else a collection initializer.
    pub(crate) fn parse_initializer(&mut self, hint: InitializerKind) -> NodeIndex {
        let start = self.token_pos();
        self.next_token();
        let mut expressions = Vec::new();
        while !self.is_token(SyntaxKind::CloseBrace) && !self.is_eof() {
            let element = if self.is_token(SyntaxKind::OpenBrace) {
                let nested = if hint == InitializerKind::Array {
                    InitializerKind::Array
                } else {
                    InitializerKind::Collection
                };
                self.parse_initializer(nested)
            } else if self.is_token(SyntaxKind::OpenBracket) && hint != InitializerKind::Array {
                self.parse_index_initializer()
            } else {
                self.parse_expression()
            };
            expressions.push(element);
            if !self.parse_optional(SyntaxKind::Comma) {
                break;
            }
        }
        self.parse_expected(SyntaxKind::CloseBrace, "'}'");

        let kind = match hint {
            InitializerKind::Array => InitializerKind::Array,
            _ if expressions.is_empty() => hint,
            _ if expressions.iter().any(|&e| self.is_member_initializer(e)) => {
                InitializerKind::Object
            }
            _ => InitializerKind::Collection,
        };
        self.add_node(Node::Initializer(InitializerData { kind, expressions }), start)
    }

    fn is_member_initializer(&self, element: NodeIndex) -> bool {
        let Some(Node::Assignment(assignment)) = self.arena.get(element) else {
            return false;
        };
        matches!(
            self.arena.get(assignment.target),
            Some(Node::Identifier(_)) | Some(Node::ElementAccess(_))
        )
    }

    /// `[key] = value` inside an object initializer.
    fn parse_index_initializer(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let arguments = self.parse_argument_list(SyntaxKind::CloseBracket);
        let target = self.add_node(
            Node::ElementAccess(ElementAccessData {
                expression: NodeIndex::NONE,
                arguments,
            }),
            start,
        );
        if !self.parse_expected(SyntaxKind::Equals, "'='") {
            return target;
        }
        let value = if self.is_token(SyntaxKind::OpenBrace) {
            self.parse_initializer(InitializerKind::Object)
        } else {
            self.parse_expression()
        };
        self.add_node(
            Node::Assignment(AssignmentData {
                op: AssignOp::Assign,
                target,
                value,
            }),
            start,
        )
    }
}
