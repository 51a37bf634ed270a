//! Second binding pass: member bodies, statements and write-site recording.

use prov_syntax::{AccessorKind, Node, NodeIndex, ParameterModifier, PropertyData};
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::oracle::{WriteKind, WriteSite};
use crate::state::{BinderState, BodyContext};
use crate::symbols::{Accessibility, Symbol, SymbolId, SymbolKind, array_element_type};

impl BinderState<'_> {
    pub(crate) fn bind_bodies(&mut self, root: NodeIndex) {
        let arena = self.arena;
        let Some(Node::SourceFile(file)) = arena.get(root) else {
            return;
        };
        for &decl in &file.declarations {
            self.bind_type_body(decl);
        }
    }

    fn bind_type_body(&mut self, idx: NodeIndex) {
        let arena = self.arena;
        let Some(Node::TypeDeclaration(data)) = arena.get(idx) else {
            return;
        };
        let ty = self.type_of_declaration(idx);
        for &member in &data.members {
            match arena.get(member) {
                Some(Node::TypeDeclaration(_)) => self.bind_type_body(member),
                Some(node) => self.bind_member(member, node, ty),
                None => {}
            }
        }
    }

    fn enter_member(&mut self, ty: SymbolId, parameters: Vec<SymbolId>) {
        self.body = BodyContext {
            current_type: ty,
            scopes: vec![FxHashMap::default()],
            parameters,
            ..BodyContext::default()
        };
    }

    fn declared(&self, idx: NodeIndex) -> SymbolId {
        self.declarations.get(&idx).copied().unwrap_or(SymbolId::NONE)
    }

    fn bind_member(&mut self, idx: NodeIndex, node: &Node, ty: SymbolId) {
        let arena = self.arena;
        match node {
            Node::Field(data) => {
                self.enter_member(ty, Vec::new());
                if data.initializer.is_some() {
                    self.bind_expression(data.initializer);
                    let field = self.declared(idx);
                    self.record_write(field, data.initializer, idx, WriteKind::Initializer);
                }
            }
            Node::Property(data) => {
                let property = self.declared(idx);
                let indexer_params = self.parameters_of(property).to_vec();
                self.enter_member(ty, indexer_params.clone());
                self.bind_parameter_defaults(&data.parameters);
                if data.expression_body.is_some() {
                    self.bind_expression(data.expression_body);
                }
                for &accessor in &data.accessors {
                    let Some(Node::Accessor(acc)) = arena.get(accessor) else {
                        continue;
                    };
                    let mut params = indexer_params.clone();
                    if let Some(&value) = self.value_parameters.get(&accessor) {
                        params.push(value);
                    }
                    self.enter_member(ty, params);
                    self.bind_function_body(acc.body, acc.expression_body);
                }
                if data.initializer.is_some() {
                    self.enter_member(ty, Vec::new());
                    self.bind_expression(data.initializer);
                    self.record_write(property, data.initializer, idx, WriteKind::Initializer);
                }
            }
            Node::Method(data) => {
                let method = self.declared(idx);
                self.enter_member(ty, self.parameters_of(method).to_vec());
                self.bind_parameter_defaults(&data.parameters);
                self.bind_function_body(data.body, data.expression_body);
            }
            Node::Constructor(data) => {
                let ctor = self.declared(idx);
                self.enter_member(ty, self.parameters_of(ctor).to_vec());
                self.bind_parameter_defaults(&data.parameters);
                if data.initializer.is_some() {
                    self.bind_constructor_initializer(data.initializer, ty);
                }
                self.bind_function_body(data.body, data.expression_body);
            }
            _ => {}
        }
    }

    fn bind_parameter_defaults(&mut self, parameters: &[NodeIndex]) {
        let arena = self.arena;
        for &param in parameters {
            if let Some(Node::Parameter(data)) = arena.get(param)
                && data.default.is_some()
            {
                self.bind_expression(data.default);
            }
        }
    }

    fn bind_function_body(&mut self, body: NodeIndex, expression_body: NodeIndex) {
        if body.is_some() {
            self.bind_statement(body);
        }
        if expression_body.is_some() {
            self.bind_expression(expression_body);
        }
    }

    // =========================================================================
    // Statements
    // =========================================================================

    pub(crate) fn bind_statement(&mut self, idx: NodeIndex) {
        let arena = self.arena;
        let Some(node) = arena.get(idx) else {
            return;
        };
        match node {
            Node::Block(data) => {
                self.push_scope();
                for &stmt in &data.statements {
                    self.bind_statement(stmt);
                }
                self.pop_scope();
            }
            Node::LocalDeclaration(data) => {
                for &decl in &data.declarators {
                    self.bind_variable_declarator(decl);
                }
            }
            Node::ExpressionStatement(expr) | Node::Return(expr) | Node::Throw(expr) => {
                self.bind_expression(*expr);
            }
            Node::If(data) => {
                self.bind_expression(data.condition);
                self.conditionally(|binder| {
                    binder.bind_statement(data.then_statement);
                    binder.bind_statement(data.else_statement);
                });
            }
            Node::While(data) => {
                self.bind_expression(data.condition);
                self.conditionally(|binder| binder.bind_statement(data.body));
            }
            Node::Do(data) => {
                self.conditionally(|binder| {
                    binder.bind_statement(data.body);
                    binder.bind_expression(data.condition);
                });
            }
            Node::For(data) => {
                self.push_scope();
                for &init in &data.initializers {
                    self.bind_statement(init);
                }
                self.bind_expression(data.condition);
                self.conditionally(|binder| {
                    binder.bind_statement(data.body);
                    for &inc in &data.incrementors {
                        binder.bind_expression(inc);
                    }
                });
                self.pop_scope();
            }
            Node::Foreach(data) => {
                self.bind_expression(data.expression);
                self.push_scope();
                let type_name = if is_implicit_type(&data.ty) {
                    self.expression_type(data.expression)
                        .and_then(|collection| element_type(&collection))
                        .unwrap_or_else(|| data.ty.clone())
                } else {
                    data.ty.clone()
                };
                self.declare_local(&data.name, idx, type_name);
                self.conditionally(|binder| binder.bind_statement(data.body));
                self.pop_scope();
            }
            Node::Using(data) => {
                self.push_scope();
                self.bind_statement(data.resource);
                self.bind_statement(data.body);
                self.pop_scope();
            }
            Node::Switch(data) => {
                self.bind_expression(data.expression);
                self.conditionally(|binder| {
                    for &section in &data.sections {
                        binder.bind_statement(section);
                    }
                });
            }
            Node::Try(data) => {
                self.bind_statement(data.block);
                self.conditionally(|binder| {
                    for &catch in &data.catches {
                        binder.bind_statement(catch);
                    }
                });
                self.bind_statement(data.finally_block);
            }
            Node::Catch(data) => {
                self.push_scope();
                if !data.name.is_empty() {
                    self.declare_local(&data.name, idx, data.ty.clone());
                }
                self.bind_statement(data.block);
                self.pop_scope();
            }
            _ if node.is_expression() => self.bind_expression(idx),
            _ => {}
        }
    }

    fn bind_variable_declarator(&mut self, idx: NodeIndex) {
        let arena = self.arena;
        let Some(Node::VariableDeclarator(data)) = arena.get(idx) else {
            return;
        };
        if data.initializer.is_some() {
            self.bind_expression(data.initializer);
        }
        let type_name = if is_implicit_type(&data.ty) {
            self.expression_type(data.initializer)
                .unwrap_or_else(|| data.ty.clone())
        } else {
            data.ty.clone()
        };
        let local = self.declare_local(&data.name, idx, type_name);
        if data.initializer.is_some() {
            self.record_write(local, data.initializer, idx, WriteKind::Initializer);
        }
    }

    // =========================================================================
    // Scopes
    // =========================================================================

    pub(crate) fn push_scope(&mut self) {
        self.body.scopes.push(FxHashMap::default());
    }

    pub(crate) fn pop_scope(&mut self) {
        self.body.scopes.pop();
    }

    /// Run `f` with writes marked conditional.
    pub(crate) fn conditionally(&mut self, f: impl FnOnce(&mut Self)) {
        self.body.conditional_depth += 1;
        f(self);
        self.body.conditional_depth -= 1;
    }

    /// Declare a local in the innermost scope. `_` is a discard.
    pub(crate) fn declare_local(&mut self, name: &str, declaration: NodeIndex, type_name: String) -> SymbolId {
        if name.is_empty() || name == "_" {
            return SymbolId::NONE;
        }
        let id = self.symbols.alloc(Symbol {
            kind: SymbolKind::Local,
            name: name.to_string(),
            modifiers: Default::default(),
            accessibility: Accessibility::Private,
            declaration,
            container: SymbolId::NONE,
            type_name,
            parameter_index: None,
            parameter_modifier: ParameterModifier::None,
        });
        self.declarations.insert(declaration, id);
        if self.body.scopes.is_empty() {
            self.push_scope();
        }
        if let Some(scope) = self.body.scopes.last_mut() {
            scope.insert(name.to_string(), id);
        }
        id
    }

    /// Local or parameter visible under `name`.
    pub(crate) fn lookup_local(&self, name: &str) -> Option<SymbolId> {
        for scope in self.body.scopes.iter().rev() {
            if let Some(&id) = scope.get(name) {
                return Some(id);
            }
        }
        self.body
            .parameters
            .iter()
            .copied()
            .find(|&p| self.symbols.get(p).is_some_and(|s| s.name == name))
    }

    // =========================================================================
    // Write sites
    // =========================================================================

    /// Storage location an assignable expression refers to.
    pub(crate) fn location_of(&self, target: NodeIndex) -> Option<SymbolId> {
        let target = self.arena.skip_parentheses(target);
        let id = self
            .references
            .get(&target)
            .or_else(|| self.declarations.get(&target))
            .copied()?;
        self.symbols
            .get(id)
            .is_some_and(|s| s.kind.is_storage())
            .then_some(id)
    }

    pub(crate) fn record_write(&mut self, location: SymbolId, value: NodeIndex, write: NodeIndex, kind: WriteKind) {
        self.record_write_with(location, value, write, kind, false);
    }

    pub(crate) fn record_write_with(
        &mut self,
        location: SymbolId,
        value: NodeIndex,
        write: NodeIndex,
        kind: WriteKind,
        always_conditional: bool,
    ) {
        let Some(symbol) = self.symbols.get(location) else {
            return;
        };
        if !symbol.kind.is_storage() {
            return;
        }
        if matches!(
            symbol.kind,
            SymbolKind::Field | SymbolKind::Property | SymbolKind::Indexer
        ) && !self.options.index_external_writes
        {
            let write_type = self.type_of_declaration(self.arena.enclosing_type(write));
            if !self.is_same_or_nested_type(symbol.container, write_type) {
                trace!(location = %symbol.name, write = write.0, "skipping write outside declaring type");
                return;
            }
        }
        let site = WriteSite {
            value,
            write,
            member: self.arena.enclosing_member(write),
            kind,
            position: self.arena.span(write).start,
            conditional: always_conditional || self.body.conditional_depth > 0,
        };
        self.write_sites.entry(location).or_default().push(site);
    }

    // =========================================================================
    // Backing fields
    // =========================================================================

    pub(crate) fn collect_backing_fields(&mut self) {
        let arena = self.arena;
        let mut found = Vec::new();
        for (id, symbol) in self.symbols.iter() {
            if symbol.kind != SymbolKind::Property {
                continue;
            }
            let Some(Node::Property(data)) = arena.get(symbol.declaration) else {
                continue;
            };
            let Some(returned) = getter_return_expression(self, data) else {
                continue;
            };
            let returned = arena.skip_parentheses(returned);
            let direct = match arena.get(returned) {
                Some(Node::Identifier(_)) => true,
                Some(Node::MemberAccess(access)) => {
                    matches!(arena.get(access.expression), Some(Node::This))
                }
                _ => false,
            };
            if !direct {
                continue;
            }
            if let Some(&field) = self.references.get(&returned)
                && self.symbols.get(field).is_some_and(|f| {
                    f.kind == SymbolKind::Field && f.container == symbol.container
                })
            {
                found.push((id, field));
            }
        }
        self.backing_fields.extend(found);
    }
}

/// The single expression a property getter returns, if it has exactly one.
fn getter_return_expression(binder: &BinderState<'_>, data: &PropertyData) -> Option<NodeIndex> {
    let arena = binder.arena;
    if data.expression_body.is_some() {
        return Some(data.expression_body);
    }
    for &accessor in &data.accessors {
        let Some(Node::Accessor(acc)) = arena.get(accessor) else {
            continue;
        };
        if acc.kind != AccessorKind::Get {
            continue;
        }
        if acc.expression_body.is_some() {
            return Some(acc.expression_body);
        }
        if let Some(Node::Block(block)) = arena.get(acc.body)
            && let [only] = block.statements.as_slice()
            && let Some(Node::Return(expr)) = arena.get(*only)
        {
            return expr.get();
        }
    }
    None
}

/// `var` (or nothing) in a declaration's type position.
pub(crate) fn is_implicit_type(type_text: &str) -> bool {
    let text = type_text.trim();
    text.is_empty() || text == "var"
}

/// Element type of an array or single-argument generic collection.
fn element_type(collection: &str) -> Option<String> {
    if let Some(element) = array_element_type(collection) {
        return Some(element.to_string());
    }
    let open = collection.find('<')?;
    let close = collection.rfind('>')?;
    let inner = collection.get(open + 1..close)?.trim();
    (!inner.is_empty() && !inner.contains(',')).then(|| inner.to_string())
}
