//! Namespaces, type declarations and members.

use crate::node::*;
use crate::parser::ParserState;
use crate::scanner::SyntaxKind;

/// Contextual words that act as modifiers when followed by another
/// modifier, a type or a name.
const CONTEXTUAL_MODIFIERS: &[&str] = &["partial", "async", "required", "file", "scoped"];

impl<'a> ParserState<'a> {
    /// Parse a whole compilation unit. Namespaces are flattened: the
    /// resulting `SourceFile` lists every top-level type declaration.
    pub fn parse_source_file(&mut self) -> NodeIndex {
        let start = self.token_pos();
        let mut declarations = Vec::new();
        self.parse_namespace_members(&mut declarations, false);
        while !self.is_eof() {
            self.error_at_current("unexpected token at top level");
            self.next_token();
            self.parse_namespace_members(&mut declarations, false);
        }
        let end = self.source.len() as u32;
        let span = prov_common::Span::new(start.min(end), end);
        self.arena
            .add(Node::SourceFile(SourceFileData { declarations }), span)
    }

    fn parse_namespace_members(&mut self, declarations: &mut Vec<NodeIndex>, in_block: bool) {
        loop {
            let before = self.pos;
            match self.token() {
                SyntaxKind::EndOfFile => return,
                SyntaxKind::CloseBrace if in_block => return,
                SyntaxKind::UsingKeyword | SyntaxKind::ExternKeyword
                    if self.nth_kind(1) != SyntaxKind::OpenParen =>
                {
                    self.skip_to_statement_end();
                }
                SyntaxKind::Identifier
                    if self.token_text() == "global"
                        && self.nth_kind(1) == SyntaxKind::UsingKeyword =>
                {
                    self.skip_to_statement_end();
                }
                SyntaxKind::NamespaceKeyword => {
                    self.next_token();
                    while matches!(self.token(), SyntaxKind::Identifier | SyntaxKind::Dot) {
                        self.next_token();
                    }
                    if self.parse_optional(SyntaxKind::Semicolon) {
                        // File-scoped namespace: the rest of the file belongs to it.
                        continue;
                    }
                    if self.parse_expected(SyntaxKind::OpenBrace, "'{'") {
                        self.parse_namespace_members(declarations, true);
                        self.parse_expected(SyntaxKind::CloseBrace, "'}'");
                    }
                }
                _ => {
                    let start_pos = self.pos;
                    let start = self.token_pos();
                    self.skip_attributes();
                    let modifiers = self.parse_modifiers();
                    if self.is_type_declaration_start() {
                        declarations.push(self.parse_type_declaration(modifiers, start));
                    } else if self.is_token(SyntaxKind::DelegateKeyword) {
                        self.skip_to_statement_end();
                    } else {
                        if self.pos == start_pos {
                            self.error_at_current("expected type declaration");
                        }
                        self.skip_to_statement_end();
                        if self.is_token(SyntaxKind::CloseBrace) && !in_block {
                            self.next_token();
                        }
                    }
                }
            }
            if self.pos == before {
                self.next_token();
            }
        }
    }

    // =========================================================================
    // Modifiers
    // =========================================================================

    pub(crate) fn parse_modifiers(&mut self) -> ModifierFlags {
        let mut flags = ModifierFlags::empty();
        loop {
            let flag = match self.token() {
                SyntaxKind::PublicKeyword => ModifierFlags::PUBLIC,
                SyntaxKind::PrivateKeyword => ModifierFlags::PRIVATE,
                SyntaxKind::ProtectedKeyword => ModifierFlags::PROTECTED,
                SyntaxKind::InternalKeyword => ModifierFlags::INTERNAL,
                SyntaxKind::StaticKeyword => ModifierFlags::STATIC,
                SyntaxKind::ReadonlyKeyword => ModifierFlags::READONLY,
                SyntaxKind::ConstKeyword => ModifierFlags::CONST,
                SyntaxKind::VirtualKeyword => ModifierFlags::VIRTUAL,
                SyntaxKind::AbstractKeyword => ModifierFlags::ABSTRACT,
                SyntaxKind::OverrideKeyword => ModifierFlags::OVERRIDE,
                SyntaxKind::SealedKeyword => ModifierFlags::SEALED,
                SyntaxKind::ExternKeyword => ModifierFlags::EXTERN,
                SyntaxKind::NewKeyword => ModifierFlags::NEW,
                SyntaxKind::UnsafeKeyword | SyntaxKind::VolatileKeyword => ModifierFlags::empty(),
                SyntaxKind::Identifier if self.is_contextual_modifier() => {
                    match self.token_text() {
                        "partial" => ModifierFlags::PARTIAL,
                        "async" => ModifierFlags::ASYNC,
                        _ => ModifierFlags::empty(),
                    }
                }
                _ => return flags,
            };
            flags |= flag;
            self.next_token();
        }
    }

    fn is_contextual_modifier(&self) -> bool {
        CONTEXTUAL_MODIFIERS.contains(&self.token_text())
            && (self.nth_kind(1) == SyntaxKind::Identifier || self.nth_kind(1).is_keyword())
    }

    fn is_type_declaration_start(&self) -> bool {
        match self.token() {
            SyntaxKind::ClassKeyword
            | SyntaxKind::StructKeyword
            | SyntaxKind::InterfaceKeyword
            | SyntaxKind::EnumKeyword => true,
            SyntaxKind::Identifier => {
                self.token_text() == "record"
                    && matches!(
                        self.nth_kind(1),
                        SyntaxKind::Identifier | SyntaxKind::ClassKeyword | SyntaxKind::StructKeyword
                    )
            }
            _ => false,
        }
    }

    // =========================================================================
    // Type declarations
    // =========================================================================

    fn parse_type_declaration(&mut self, modifiers: ModifierFlags, start: u32) -> NodeIndex {
        let kind = match self.token() {
            SyntaxKind::StructKeyword => TypeDeclKind::Struct,
            SyntaxKind::InterfaceKeyword => TypeDeclKind::Interface,
            SyntaxKind::EnumKeyword => TypeDeclKind::Enum,
            SyntaxKind::Identifier => {
                // `record`, `record class`, `record struct`
                if self.nth_kind(1) == SyntaxKind::StructKeyword {
                    self.next_token();
                    TypeDeclKind::Struct
                } else {
                    if self.nth_kind(1) == SyntaxKind::ClassKeyword {
                        self.next_token();
                    }
                    TypeDeclKind::Class
                }
            }
            _ => TypeDeclKind::Class,
        };
        self.next_token();
        let name = self.parse_identifier_text();
        self.skip_type_parameters();
        if self.is_token(SyntaxKind::OpenParen) {
            // Primary constructor parameters are not modelled.
            self.skip_balanced(SyntaxKind::OpenParen, SyntaxKind::CloseParen);
        }

        let mut base_types = Vec::new();
        if self.parse_optional(SyntaxKind::Colon) {
            loop {
                match self.try_parse_type() {
                    Some(ty) => base_types.push(ty),
                    None => {
                        self.error_at_current("expected base type");
                        break;
                    }
                }
                if self.is_token(SyntaxKind::OpenParen) {
                    // `record R(int X) : Base(X)`
                    self.skip_balanced(SyntaxKind::OpenParen, SyntaxKind::CloseParen);
                }
                if !self.parse_optional(SyntaxKind::Comma) {
                    break;
                }
            }
        }
        self.skip_constraint_clauses();

        let mut members = Vec::new();
        if self.parse_optional(SyntaxKind::OpenBrace) {
            if kind == TypeDeclKind::Enum {
                self.parse_enum_members(&name, &mut members);
            } else {
                while !self.is_token(SyntaxKind::CloseBrace) && !self.is_eof() {
                    let before = self.pos;
                    self.parse_member(&name, &mut members);
                    if self.pos == before {
                        self.error_at_current("unexpected token in type body");
                        self.next_token();
                    }
                }
            }
            self.parse_expected(SyntaxKind::CloseBrace, "'}'");
            self.parse_optional(SyntaxKind::Semicolon);
        } else {
            self.parse_expected(SyntaxKind::Semicolon, "'{' or ';'");
        }

        self.add_node(
            Node::TypeDeclaration(TypeDeclData {
                kind,
                modifiers,
                name,
                base_types,
                members,
            }),
            start,
        )
    }

    /// `A, B = 2, C` as public constant fields typed by the enum.
    fn parse_enum_members(&mut self, enum_name: &str, members: &mut Vec<NodeIndex>) {
        while !self.is_token(SyntaxKind::CloseBrace) && !self.is_eof() {
            self.skip_attributes();
            let start = self.token_pos();
            let name = self.parse_identifier_text();
            if name.is_empty() {
                self.skip_to_statement_end();
                return;
            }
            let initializer = if self.parse_optional(SyntaxKind::Equals) {
                self.parse_expression()
            } else {
                NodeIndex::NONE
            };
            members.push(self.add_node(
                Node::Field(FieldData {
                    modifiers: ModifierFlags::PUBLIC | ModifierFlags::STATIC | ModifierFlags::CONST,
                    ty: enum_name.to_string(),
                    name,
                    initializer,
                }),
                start,
            ));
            if !self.parse_optional(SyntaxKind::Comma) {
                break;
            }
        }
    }

    // =========================================================================
    // Members
    // =========================================================================

    fn parse_member(&mut self, type_name: &str, members: &mut Vec<NodeIndex>) {
        let entry_pos = self.pos;
        self.skip_attributes();
        let start = self.token_pos();
        let modifiers = self.parse_modifiers();

        if self.is_type_declaration_start() {
            members.push(self.parse_type_declaration(modifiers, start));
            return;
        }

        match self.token() {
            SyntaxKind::Semicolon => {
                self.next_token();
                return;
            }
            SyntaxKind::DelegateKeyword => {
                self.skip_to_statement_end();
                return;
            }
            SyntaxKind::EventKeyword => {
                self.next_token();
                if self.is_event_with_accessors() {
                    let _ = self.parse_type();
                    self.parse_identifier_text();
                    self.skip_balanced(SyntaxKind::OpenBrace, SyntaxKind::CloseBrace);
                    return;
                }
                // Field-like events are fields.
                let ty = self.parse_type();
                self.parse_field_declarators(modifiers, ty, start, members);
                return;
            }
            SyntaxKind::Tilde => {
                // Finalizer
                self.next_token();
                let name = format!("~{}", self.parse_identifier_text());
                members.push(self.parse_method_rest(modifiers, String::new(), name, start));
                return;
            }
            SyntaxKind::ImplicitKeyword | SyntaxKind::ExplicitKeyword => {
                let name = if self.is_token(SyntaxKind::ImplicitKeyword) {
                    "op_Implicit"
                } else {
                    "op_Explicit"
                };
                self.next_token();
                self.parse_expected(SyntaxKind::OperatorKeyword, "'operator'");
                let ty = self.parse_type();
                members.push(self.parse_method_rest(modifiers, ty, name.to_string(), start));
                return;
            }
            SyntaxKind::Identifier
                if self.token_text() == type_name && self.nth_kind(1) == SyntaxKind::OpenParen =>
            {
                members.push(self.parse_constructor(modifiers, start));
                return;
            }
            _ => {}
        }

        while matches!(self.token(), SyntaxKind::RefKeyword | SyntaxKind::ReadonlyKeyword) {
            self.next_token();
        }
        let Some(ty) = self.try_parse_type() else {
            self.error_at_current("expected member declaration");
            // A stray token is dropped by the caller; a half-written member
            // is skipped as a whole.
            if self.pos != entry_pos {
                self.skip_member();
            }
            return;
        };

        if self.parse_optional(SyntaxKind::OperatorKeyword) {
            let op = self.token_text().to_string();
            while !matches!(
                self.token(),
                SyntaxKind::OpenParen | SyntaxKind::EndOfFile | SyntaxKind::OpenBrace
            ) {
                self.next_token();
            }
            members.push(self.parse_method_rest(modifiers, ty, format!("op_{op}"), start));
            return;
        }

        if self.is_token(SyntaxKind::ThisKeyword) {
            members.push(self.parse_indexer(modifiers, ty, start));
            return;
        }

        // Explicit interface implementations: `int IFoo.Bar` / `int IFoo.this[...]`
        let mut name = self.parse_identifier_text();
        if name.is_empty() {
            self.skip_member();
            return;
        }
        while self.is_token(SyntaxKind::Dot) || self.is_token(SyntaxKind::LessThan) {
            if self.is_token(SyntaxKind::LessThan) {
                if self.try_parse_type_argument_list_before_dot() {
                    continue;
                }
                break;
            }
            self.next_token();
            if self.is_token(SyntaxKind::ThisKeyword) {
                members.push(self.parse_indexer(modifiers, ty, start));
                return;
            }
            name = self.parse_identifier_text();
        }

        match self.token() {
            SyntaxKind::OpenParen | SyntaxKind::LessThan => {
                members.push(self.parse_method_rest(modifiers, ty, name, start));
            }
            SyntaxKind::OpenBrace | SyntaxKind::EqualsGreaterThan => {
                members.push(self.parse_property_rest(modifiers, ty, name, start));
            }
            _ => {
                self.parse_field_declarators_from(modifiers, ty, name, start, members);
            }
        }
    }

    /// `IFoo<T>.Bar`: consume the argument list when a `.` follows.
    fn try_parse_type_argument_list_before_dot(&mut self) -> bool {
        let snapshot = self.snapshot();
        if self.parse_type_argument_text().is_some() && self.is_token(SyntaxKind::Dot) {
            return true;
        }
        self.restore(snapshot);
        false
    }

    fn is_event_with_accessors(&mut self) -> bool {
        self.look_ahead(|p| {
            p.try_parse_type().is_some()
                && p.is_token(SyntaxKind::Identifier)
                && p.nth_kind(1) == SyntaxKind::OpenBrace
        })
    }

    fn skip_member(&mut self) {
        loop {
            match self.token() {
                SyntaxKind::Semicolon => {
                    self.next_token();
                    return;
                }
                SyntaxKind::OpenBrace => {
                    self.skip_balanced(SyntaxKind::OpenBrace, SyntaxKind::CloseBrace);
                    return;
                }
                SyntaxKind::CloseBrace | SyntaxKind::EndOfFile => return,
                _ => {
                    self.next_token();
                }
            }
        }
    }

    fn parse_field_declarators(
        &mut self,
        modifiers: ModifierFlags,
        ty: String,
        start: u32,
        members: &mut Vec<NodeIndex>,
    ) {
        let name = self.parse_identifier_text();
        self.parse_field_declarators_from(modifiers, ty, name, start, members);
    }

    /// Field declarators after the first name: `a = 1, b;`. Each declarator
    /// becomes its own `Field` node.
    fn parse_field_declarators_from(
        &mut self,
        modifiers: ModifierFlags,
        ty: String,
        first_name: String,
        start: u32,
        members: &mut Vec<NodeIndex>,
    ) {
        let mut name = first_name;
        let mut declarator_start = start;
        loop {
            if self.is_token(SyntaxKind::OpenBracket) {
                // Fixed-size buffer `fixed int x[4]`
                self.skip_balanced(SyntaxKind::OpenBracket, SyntaxKind::CloseBracket);
            }
            let initializer = if self.parse_optional(SyntaxKind::Equals) {
                self.parse_variable_initializer()
            } else {
                NodeIndex::NONE
            };
            members.push(self.add_node(
                Node::Field(FieldData {
                    modifiers,
                    ty: ty.clone(),
                    name,
                    initializer,
                }),
                declarator_start,
            ));
            if !self.parse_optional(SyntaxKind::Comma) {
                break;
            }
            declarator_start = self.token_pos();
            name = self.parse_identifier_text();
        }
        if !self.parse_expected(SyntaxKind::Semicolon, "';'") {
            self.skip_member();
        }
    }

    fn parse_constructor(&mut self, modifiers: ModifierFlags, start: u32) -> NodeIndex {
        let name = self.parse_identifier_text();
        let parameters = self.parse_parameter_list(SyntaxKind::OpenParen, SyntaxKind::CloseParen);

        let mut initializer = NodeIndex::NONE;
        if self.parse_optional(SyntaxKind::Colon) {
            let init_start = self.token_pos();
            let kind = match self.token() {
                SyntaxKind::ThisKeyword => Some(ConstructorInitializerKind::This),
                SyntaxKind::BaseKeyword => Some(ConstructorInitializerKind::Base),
                _ => None,
            };
            match kind {
                Some(kind) => {
                    self.next_token();
                    let arguments = if self.is_token(SyntaxKind::OpenParen) {
                        self.parse_argument_list(SyntaxKind::CloseParen)
                    } else {
                        self.error_at_current("expected '('");
                        Vec::new()
                    };
                    initializer = self.add_node(
                        Node::ConstructorInitializer(ConstructorInitializerData { kind, arguments }),
                        init_start,
                    );
                }
                None => self.error_at_current("expected 'this' or 'base'"),
            }
        }

        let (body, expression_body) = self.parse_function_body();
        self.add_node(
            Node::Constructor(ConstructorData {
                modifiers,
                name,
                parameters,
                initializer,
                body,
                expression_body,
            }),
            start,
        )
    }

    /// Method after its name: type parameters, parameters, constraints, body.
    fn parse_method_rest(
        &mut self,
        modifiers: ModifierFlags,
        return_ty: String,
        name: String,
        start: u32,
    ) -> NodeIndex {
        self.skip_type_parameters();
        let parameters = if self.is_token(SyntaxKind::OpenParen) {
            self.parse_parameter_list(SyntaxKind::OpenParen, SyntaxKind::CloseParen)
        } else {
            self.error_at_current("expected '('");
            Vec::new()
        };
        self.skip_constraint_clauses();
        let (body, expression_body) = self.parse_function_body();
        self.add_node(
            Node::Method(MethodData {
                modifiers,
                return_ty,
                name,
                parameters,
                body,
                expression_body,
            }),
            start,
        )
    }

    /// `{ ... }`, `=> e;` or `;`.
    fn parse_function_body(&mut self) -> (NodeIndex, NodeIndex) {
        match self.token() {
            SyntaxKind::OpenBrace => (self.parse_block(), NodeIndex::NONE),
            SyntaxKind::EqualsGreaterThan => {
                self.next_token();
                let expression = self.parse_expression();
                if !self.parse_expected(SyntaxKind::Semicolon, "';'") {
                    self.skip_to_statement_end();
                }
                (NodeIndex::NONE, expression)
            }
            _ => {
                if !self.parse_expected(SyntaxKind::Semicolon, "'{', '=>' or ';'") {
                    self.skip_member();
                }
                (NodeIndex::NONE, NodeIndex::NONE)
            }
        }
    }

    // =========================================================================
    // Properties and indexers
    // =========================================================================

    fn parse_property_rest(
        &mut self,
        modifiers: ModifierFlags,
        ty: String,
        name: String,
        start: u32,
    ) -> NodeIndex {
        let mut accessors = Vec::new();
        let mut expression_body = NodeIndex::NONE;
        let mut initializer = NodeIndex::NONE;

        if self.parse_optional(SyntaxKind::EqualsGreaterThan) {
            expression_body = self.parse_expression();
            if !self.parse_expected(SyntaxKind::Semicolon, "';'") {
                self.skip_to_statement_end();
            }
        } else {
            accessors = self.parse_accessor_list();
            if self.parse_optional(SyntaxKind::Equals) {
                initializer = self.parse_variable_initializer();
                self.parse_expected(SyntaxKind::Semicolon, "';'");
            }
        }

        self.add_node(
            Node::Property(PropertyData {
                modifiers,
                ty,
                name,
                is_indexer: false,
                parameters: Vec::new(),
                accessors,
                expression_body,
                initializer,
            }),
            start,
        )
    }

    fn parse_indexer(&mut self, modifiers: ModifierFlags, ty: String, start: u32) -> NodeIndex {
        self.next_token();
        let parameters = if self.is_token(SyntaxKind::OpenBracket) {
            self.parse_parameter_list(SyntaxKind::OpenBracket, SyntaxKind::CloseBracket)
        } else {
            self.error_at_current("expected '['");
            Vec::new()
        };
        let mut accessors = Vec::new();
        let mut expression_body = NodeIndex::NONE;
        if self.parse_optional(SyntaxKind::EqualsGreaterThan) {
            expression_body = self.parse_expression();
            self.parse_expected(SyntaxKind::Semicolon, "';'");
        } else {
            accessors = self.parse_accessor_list();
        }
        self.add_node(
            Node::Property(PropertyData {
                modifiers,
                ty,
                name: "this".to_string(),
                is_indexer: true,
                parameters,
                accessors,
                expression_body,
                initializer: NodeIndex::NONE,
            }),
            start,
        )
    }

    fn parse_accessor_list(&mut self) -> Vec<NodeIndex> {
        let mut accessors = Vec::new();
        if !self.parse_expected(SyntaxKind::OpenBrace, "'{'") {
            self.skip_member();
            return accessors;
        }
        while !self.is_token(SyntaxKind::CloseBrace) && !self.is_eof() {
            self.skip_attributes();
            let start = self.token_pos();
            let modifiers = self.parse_modifiers();
            let kind = match self.token_text() {
                "get" => AccessorKind::Get,
                "set" => AccessorKind::Set,
                "init" => AccessorKind::Init,
                _ => {
                    self.error_at_current("expected 'get', 'set' or 'init'");
                    self.skip_member();
                    continue;
                }
            };
            self.next_token();
            let (body, expression_body) = self.parse_function_body();
            accessors.push(self.add_node(
                Node::Accessor(AccessorData {
                    kind,
                    modifiers,
                    body,
                    expression_body,
                }),
                start,
            ));
        }
        self.parse_expected(SyntaxKind::CloseBrace, "'}'");
        accessors
    }

    // =========================================================================
    // Parameters
    // =========================================================================

    /// `(T a, out T b, int c = 1)`; the opening token is at the cursor.
    fn parse_parameter_list(&mut self, open: SyntaxKind, close: SyntaxKind) -> Vec<NodeIndex> {
        let mut parameters = Vec::new();
        if !self.parse_optional(open) {
            return parameters;
        }
        while !self.is_token(close) && !self.is_eof() {
            self.skip_attributes();
            let start = self.token_pos();
            let mut modifier = ParameterModifier::None;
            loop {
                match self.token() {
                    SyntaxKind::OutKeyword => modifier = ParameterModifier::Out,
                    SyntaxKind::RefKeyword => modifier = ParameterModifier::Ref,
                    SyntaxKind::InKeyword => modifier = ParameterModifier::In,
                    SyntaxKind::ParamsKeyword => modifier = ParameterModifier::Params,
                    // Extension receiver, `scoped`, `readonly ref`
                    SyntaxKind::ThisKeyword | SyntaxKind::ReadonlyKeyword => {}
                    SyntaxKind::Identifier
                        if self.token_text() == "scoped"
                            && matches!(
                                self.nth_kind(1),
                                SyntaxKind::Identifier | SyntaxKind::RefKeyword
                            ) => {}
                    _ => break,
                }
                self.next_token();
            }
            let ty = self.parse_type();
            let name = self.parse_identifier_text();
            let default = if self.parse_optional(SyntaxKind::Equals) {
                self.parse_expression()
            } else {
                NodeIndex::NONE
            };
            parameters.push(self.add_node(
                Node::Parameter(ParameterData {
                    modifier,
                    ty,
                    name,
                    default,
                }),
                start,
            ));
            if !self.parse_optional(SyntaxKind::Comma) {
                break;
            }
        }
        let what = if close == SyntaxKind::CloseParen { "')'" } else { "']'" };
        if !self.parse_expected(close, what) {
            // Resynchronise on the closing token if it is still ahead.
            while !matches!(
                self.token(),
                SyntaxKind::OpenBrace
                    | SyntaxKind::Semicolon
                    | SyntaxKind::EqualsGreaterThan
                    | SyntaxKind::EndOfFile
            ) {
                let kind = self.token();
                self.next_token();
                if kind == close {
                    break;
                }
            }
        }
        parameters
    }
}
