//! Expression binding: name lookup, member access, overloads and calls.

use prov_common::limits::MAX_BASE_CHAIN_DEPTH;
use prov_syntax::{
    ArgumentModifier, AssignOp, AssignmentData, BinaryOp, ConstructorInitializerKind,
    ElementAccessData, InitializerKind, InvocationData, LiteralKind, Node, NodeIndex,
    ObjectCreationData, ParameterModifier, UnaryOp,
};
use smallvec::SmallVec;
use tracing::trace;

use crate::oracle::WriteKind;
use crate::state::{BinderState, OverloadSet};
use crate::state_binding::is_implicit_type;
use crate::symbols::{SymbolId, SymbolKind, array_element_type};

impl BinderState<'_> {
    pub(crate) fn bind_expression(&mut self, idx: NodeIndex) {
        let arena = self.arena;
        let Some(node) = arena.get(idx) else {
            return;
        };
        match node {
            Node::Identifier(data) => match self.resolve_simple_name(&data.name) {
                Some(id) => {
                    self.references.insert(idx, id);
                }
                None => trace!(name = %data.name, "unresolved name"),
            },
            Node::MemberAccess(data) => {
                self.bind_expression(data.expression);
                if let Some(&member) = self.receiver_members(data.expression, &data.name).first() {
                    self.references.insert(idx, member);
                }
            }
            Node::MemberBinding(data) => {
                if let Some(&member) = self.conditional_receiver_members(&data.name).first() {
                    self.references.insert(idx, member);
                }
            }
            Node::ConditionalAccess(data) => {
                self.bind_expression(data.expression);
                let receiver = self.expression_type(data.expression);
                self.body.conditional_receivers.push(receiver);
                self.conditionally(|binder| binder.bind_expression(data.when_not_null));
                self.body.conditional_receivers.pop();
            }
            Node::Invocation(data) => self.bind_invocation(idx, data),
            Node::ElementAccess(data) => self.bind_element_access(idx, data),
            Node::Argument(data) => self.bind_expression(data.expression),
            Node::DeclarationExpression(data) => {
                self.declare_local(&data.name, idx, data.ty.clone());
            }
            Node::ObjectCreation(data) => self.bind_object_creation(idx, data),
            Node::ArrayCreation(data) => {
                for &size in &data.sizes {
                    self.bind_expression(size);
                }
                self.bind_expression(data.initializer);
            }
            Node::Initializer(data) => {
                for &element in &data.expressions {
                    self.bind_expression(element);
                }
            }
            Node::Assignment(data) => self.bind_assignment(idx, data),
            Node::Binary(data) => {
                self.bind_expression(data.left);
                match data.op {
                    BinaryOp::LogicalAnd | BinaryOp::LogicalOr | BinaryOp::Coalesce => {
                        self.conditionally(|binder| binder.bind_expression(data.right));
                    }
                    _ => self.bind_expression(data.right),
                }
            }
            Node::Unary(data) => {
                self.bind_expression(data.operand);
                if matches!(
                    data.op,
                    UnaryOp::PreIncrement
                        | UnaryOp::PreDecrement
                        | UnaryOp::PostIncrement
                        | UnaryOp::PostDecrement
                ) && let Some(location) = self.location_of(data.operand)
                {
                    self.record_write(location, idx, idx, WriteKind::CompoundAssignment);
                }
            }
            Node::Conditional(data) => {
                self.bind_expression(data.condition);
                self.conditionally(|binder| {
                    binder.bind_expression(data.when_true);
                    binder.bind_expression(data.when_false);
                });
            }
            Node::Parenthesized(inner) => self.bind_expression(*inner),
            Node::Cast(data) => self.bind_expression(data.expression),
            _ => {}
        }
    }

    fn bind_assignment(&mut self, idx: NodeIndex, data: &AssignmentData) {
        self.bind_expression(data.target);
        if data.op == AssignOp::Coalesce {
            self.conditionally(|binder| binder.bind_expression(data.value));
        } else {
            self.bind_expression(data.value);
        }
        let Some(location) = self.location_of(data.target) else {
            return;
        };
        match data.op {
            AssignOp::Assign => {
                self.record_write(location, data.value, idx, WriteKind::Assignment);
            }
            // `x ??= e` only stores when `x` is null.
            AssignOp::Coalesce => {
                self.record_write_with(location, idx, idx, WriteKind::CompoundAssignment, true);
            }
            _ => self.record_write(location, idx, idx, WriteKind::CompoundAssignment),
        }
    }

    // =========================================================================
    // Names and members
    // =========================================================================

    /// Locals, then parameters, then members of the current type (through
    /// its bases and enclosing types), then type names.
    pub(crate) fn resolve_simple_name(&self, name: &str) -> Option<SymbolId> {
        if let Some(local) = self.lookup_local(name) {
            return Some(local);
        }
        if let Some(&member) = self
            .lookup_members_in_scope(self.body.current_type, name)
            .first()
        {
            return Some(member);
        }
        self.type_names
            .get(name)
            .and_then(|types| types.first().copied())
    }

    /// Members named `name` on the type of `receiver`.
    fn receiver_members(&self, receiver: NodeIndex, name: &str) -> OverloadSet {
        let arena = self.arena;
        let receiver = arena.skip_parentheses(receiver);
        let ty = match arena.get(receiver) {
            Some(Node::This) => self.body.current_type,
            Some(Node::Base) => self.base_type_of(self.body.current_type),
            _ => match self
                .expression_type(receiver)
                .and_then(|text| self.lookup_type(&text))
            {
                Some(ty) => ty,
                None => return OverloadSet::new(),
            },
        };
        self.lookup_members(ty, name)
    }

    /// Members named `name` on the receiver of the innermost `?.`.
    fn conditional_receiver_members(&self, name: &str) -> OverloadSet {
        self.body
            .conditional_receivers
            .last()
            .and_then(|receiver| receiver.as_deref())
            .and_then(|text| self.lookup_type(text))
            .map(|ty| self.lookup_members(ty, name))
            .unwrap_or_default()
    }

    fn indexers_of(&self, ty: SymbolId) -> OverloadSet {
        let mut current = ty;
        for _ in 0..MAX_BASE_CHAIN_DEPTH {
            let Some(info) = self.types.get(&current) else {
                break;
            };
            if !info.indexers.is_empty() {
                return info.indexers.clone();
            }
            current = info.base;
        }
        OverloadSet::new()
    }

    fn instance_constructors(&self, ty: SymbolId) -> OverloadSet {
        self.types
            .get(&ty)
            .map(|info| {
                info.constructors
                    .iter()
                    .copied()
                    .filter(|&c| self.symbols.get(c).is_some_and(|s| !s.is_static()))
                    .collect()
            })
            .unwrap_or_default()
    }

    // =========================================================================
    // Calls
    // =========================================================================

    fn bind_invocation(&mut self, idx: NodeIndex, data: &InvocationData) {
        let arena = self.arena;
        let callee = arena.skip_parentheses(data.expression);
        let target = match arena.get(callee) {
            Some(Node::Identifier(id)) if self.lookup_local(&id.name).is_none() => {
                let candidates = self.lookup_members_in_scope(self.body.current_type, &id.name);
                let method = self.select_overload(&candidates, &data.arguments);
                match method {
                    Some(method) => {
                        self.references.insert(callee, method);
                    }
                    None => self.bind_expression(callee),
                }
                method
            }
            Some(Node::MemberAccess(access)) => {
                self.bind_expression(access.expression);
                let candidates = self.receiver_members(access.expression, &access.name);
                let method = self.select_overload(&candidates, &data.arguments);
                if let Some(method) = method {
                    self.references.insert(callee, method);
                }
                method
            }
            Some(Node::MemberBinding(binding)) => {
                let candidates = self.conditional_receiver_members(&binding.name);
                let method = self.select_overload(&candidates, &data.arguments);
                if let Some(method) = method {
                    self.references.insert(callee, method);
                }
                method
            }
            _ => {
                self.bind_expression(data.expression);
                None
            }
        };

        self.bind_arguments(&data.arguments, target);
        if let Some(method) = target {
            self.references.insert(idx, method);
            self.call_sites.entry(method).or_default().push(idx);
        }
    }

    fn bind_element_access(&mut self, idx: NodeIndex, data: &ElementAccessData) {
        let receiver_type = if data.expression.is_none() {
            self.body.conditional_receivers.last().cloned().flatten()
        } else {
            self.bind_expression(data.expression);
            self.expression_type(data.expression)
        };
        let indexer = receiver_type
            .and_then(|text| self.lookup_type(&text))
            .and_then(|ty| {
                let indexers = self.indexers_of(ty);
                self.select_overload(&indexers, &data.arguments)
            });
        self.bind_arguments(&data.arguments, indexer);
        if let Some(indexer) = indexer {
            self.references.insert(idx, indexer);
        }
    }

    fn bind_object_creation(&mut self, idx: NodeIndex, data: &ObjectCreationData) {
        let ty = if data.ty.is_empty() {
            self.target_type_of(idx)
        } else {
            self.lookup_type(&data.ty)
        };
        let ctor = ty.and_then(|ty| {
            let ctors = self.instance_constructors(ty);
            self.select_overload(&ctors, &data.arguments)
        });
        self.bind_arguments(&data.arguments, ctor);
        if let Some(ctor) = ctor {
            self.references.insert(idx, ctor);
            self.call_sites.entry(ctor).or_default().push(idx);
        }
        if data.initializer.is_some() {
            self.bind_initializer(data.initializer, ty);
        }
    }

    pub(crate) fn bind_constructor_initializer(&mut self, idx: NodeIndex, ty: SymbolId) {
        let arena = self.arena;
        let Some(Node::ConstructorInitializer(data)) = arena.get(idx) else {
            return;
        };
        let target_type = match data.kind {
            ConstructorInitializerKind::This => ty,
            ConstructorInitializerKind::Base => self.base_type_of(ty),
        };
        let ctors = self.instance_constructors(target_type);
        let ctor = self.select_overload(&ctors, &data.arguments);
        self.bind_arguments(&data.arguments, ctor);
        if let Some(ctor) = ctor {
            self.references.insert(idx, ctor);
            self.call_sites.entry(ctor).or_default().push(idx);
        }
    }

    /// Bind an object initializer's member assignments against `ty`.
    fn bind_initializer(&mut self, idx: NodeIndex, ty: Option<SymbolId>) {
        let arena = self.arena;
        let Some(Node::Initializer(data)) = arena.get(idx) else {
            self.bind_expression(idx);
            return;
        };
        if data.kind != InitializerKind::Object {
            self.bind_expression(idx);
            return;
        }
        for &element in &data.expressions {
            let Some(Node::Assignment(assign)) = arena.get(element) else {
                self.bind_expression(element);
                continue;
            };
            let target = arena.skip_parentheses(assign.target);
            let member = match arena.get(target) {
                Some(Node::Identifier(id)) => {
                    ty.and_then(|ty| self.lookup_members(ty, &id.name).first().copied())
                }
                Some(Node::ElementAccess(access)) => {
                    for &arg in &access.arguments {
                        self.bind_expression(arg);
                    }
                    None
                }
                _ => {
                    self.bind_expression(target);
                    None
                }
            };
            if let Some(member) = member {
                self.references.insert(target, member);
            }
            if matches!(arena.get(assign.value), Some(Node::Initializer(_))) {
                let nested = member
                    .and_then(|m| self.symbols.get(m))
                    .and_then(|s| self.lookup_type(&s.type_name));
                self.bind_initializer(assign.value, nested);
            } else {
                self.bind_expression(assign.value);
                if let Some(member) = member
                    && assign.op == AssignOp::Assign
                {
                    self.record_write(member, assign.value, element, WriteKind::ObjectInitializer);
                }
            }
        }
    }

    fn bind_arguments(&mut self, arguments: &[NodeIndex], callable: Option<SymbolId>) {
        let arena = self.arena;
        let params: SmallVec<[SymbolId; 4]> = callable
            .map(|c| self.parameters_of(c).iter().copied().collect())
            .unwrap_or_default();
        for (position, &arg) in arguments.iter().enumerate() {
            let Some(Node::Argument(data)) = arena.get(arg) else {
                self.bind_expression(arg);
                continue;
            };
            self.bind_expression(data.expression);

            let param = self.match_parameter(&params, position, &data.name);
            if let Some(param) = param {
                self.argument_parameters.insert(arg, param);
                self.infer_declaration_type(data.expression, param);
            }

            let kind = match data.modifier {
                ArgumentModifier::Out => WriteKind::OutArgument,
                ArgumentModifier::Ref => WriteKind::RefArgument,
                ArgumentModifier::None | ArgumentModifier::In => continue,
            };
            if let Some(location) = self.location_of(data.expression) {
                self.record_write(location, arg, arg, kind);
            }
        }
    }

    /// `out var x`: take the local's type from the parameter.
    fn infer_declaration_type(&mut self, expression: NodeIndex, param: SymbolId) {
        let Some(Node::DeclarationExpression(decl)) = self.arena.get(expression) else {
            return;
        };
        if !is_implicit_type(&decl.ty) {
            return;
        }
        let Some(param_type) = self.symbols.get(param).map(|p| p.type_name.clone()) else {
            return;
        };
        if let Some(&local) = self.declarations.get(&expression)
            && let Some(symbol) = self.symbols.get_mut(local)
        {
            symbol.type_name = param_type;
        }
    }

    fn match_parameter(&self, params: &[SymbolId], position: usize, name: &str) -> Option<SymbolId> {
        if !name.is_empty() {
            return params
                .iter()
                .copied()
                .find(|&p| self.symbols.get(p).is_some_and(|s| s.name == name));
        }
        if let Some(&param) = params.get(position) {
            return Some(param);
        }
        params
            .last()
            .copied()
            .filter(|&last| self.is_params_array(last))
    }

    fn is_params_array(&self, param: SymbolId) -> bool {
        self.symbols
            .get(param)
            .is_some_and(|p| p.parameter_modifier == ParameterModifier::Params)
    }

    fn has_default(&self, param: SymbolId) -> bool {
        self.symbols.get(param).is_some_and(|p| {
            matches!(self.arena.get(p.declaration), Some(Node::Parameter(data)) if data.default.is_some())
        })
    }

    /// First candidate whose parameter list accepts the arguments.
    ///
    /// Overloads are told apart by argument count only; default values and
    /// a trailing `params` array widen the accepted range.
    pub(crate) fn select_overload(&self, candidates: &[SymbolId], arguments: &[NodeIndex]) -> Option<SymbolId> {
        let arena = self.arena;
        let argc = arguments.len();
        let named: SmallVec<[&str; 2]> = arguments
            .iter()
            .filter_map(|&arg| match arena.get(arg) {
                Some(Node::Argument(a)) if !a.name.is_empty() => Some(a.name.as_str()),
                _ => None,
            })
            .collect();

        candidates.iter().copied().find(|&candidate| {
            let Some(symbol) = self.symbols.get(candidate) else {
                return false;
            };
            if !symbol.kind.is_callable() && symbol.kind != SymbolKind::Indexer {
                return false;
            }
            let params = self.parameters_of(candidate);
            let has_params_array = params.last().is_some_and(|&p| self.is_params_array(p));
            let required = params
                .iter()
                .filter(|&&p| !self.has_default(p) && !self.is_params_array(p))
                .count();
            let count_fits = argc >= required && (argc <= params.len() || has_params_array);
            count_fits
                && named.iter().all(|name| {
                    params
                        .iter()
                        .any(|&p| self.symbols.get(p).is_some_and(|s| s.name == *name))
                })
        })
    }

    /// Type expected by the context of a target-typed `new(...)`.
    fn target_type_of(&self, creation: NodeIndex) -> Option<SymbolId> {
        let arena = self.arena;
        let parent = arena.parent(creation);
        let text = match arena.get(parent)? {
            Node::VariableDeclarator(data) if !is_implicit_type(&data.ty) => data.ty.clone(),
            Node::Field(data) => data.ty.clone(),
            Node::Property(data) => data.ty.clone(),
            Node::Assignment(data) if data.value == creation => self.expression_type(data.target)?,
            Node::Return(_) => {
                let member = arena.enclosing_declaration(parent);
                match arena.get(member)? {
                    Node::Method(data) => data.return_ty.clone(),
                    Node::Property(data) => data.ty.clone(),
                    _ => return None,
                }
            }
            _ => return None,
        };
        self.lookup_type(&text)
    }

    // =========================================================================
    // Expression types
    // =========================================================================

    /// Static type of an expression as type text, when it can be told.
    pub(crate) fn expression_type(&self, idx: NodeIndex) -> Option<String> {
        let arena = self.arena;
        let node = arena.get(idx)?;
        let bound_type = || {
            self.references
                .get(&idx)
                .and_then(|&id| self.symbols.get(id))
                .map(|s| s.type_name.clone())
        };
        let text = match node {
            Node::Identifier(_)
            | Node::MemberAccess(_)
            | Node::MemberBinding(_)
            | Node::Invocation(_) => bound_type()?,
            Node::ElementAccess(data) => match bound_type() {
                Some(text) => text,
                None => {
                    let receiver = self.expression_type(data.expression)?;
                    array_element_type(&receiver)?.to_string()
                }
            },
            Node::DeclarationExpression(_) => self
                .declarations
                .get(&idx)
                .and_then(|&id| self.symbols.get(id))
                .map(|s| s.type_name.clone())?,
            Node::This => self.symbols.get(self.body.current_type)?.name.clone(),
            Node::Base => {
                let base = self.base_type_of(self.body.current_type);
                self.symbols.get(base)?.name.clone()
            }
            Node::ObjectCreation(data) if !data.ty.is_empty() => data.ty.clone(),
            Node::ObjectCreation(_) => bound_type()?,
            Node::ArrayCreation(data) if !data.element_ty.is_empty() => {
                format!("{}[]", data.element_ty)
            }
            Node::Cast(data) => data.ty.clone(),
            Node::Parenthesized(inner) => self.expression_type(*inner)?,
            Node::ConditionalAccess(data) => self.expression_type(data.when_not_null)?,
            Node::Conditional(data) => self
                .expression_type(data.when_true)
                .or_else(|| self.expression_type(data.when_false))?,
            Node::Assignment(data) => self.expression_type(data.target)?,
            Node::Binary(data) if data.op == BinaryOp::Coalesce => self
                .expression_type(data.left)
                .or_else(|| self.expression_type(data.right))?,
            Node::Unary(data) if data.op != UnaryOp::Await && data.op != UnaryOp::Not => {
                self.expression_type(data.operand)?
            }
            Node::Literal(data) => match data.kind {
                LiteralKind::Integer => "int".to_string(),
                LiteralKind::Real => "double".to_string(),
                LiteralKind::String | LiteralKind::InterpolatedString => "string".to_string(),
                LiteralKind::Char => "char".to_string(),
                LiteralKind::True | LiteralKind::False => "bool".to_string(),
                LiteralKind::Null => return None,
            },
            Node::Default(text) => text.clone(),
            _ => return None,
        };
        (!is_implicit_type(&text)).then_some(text)
    }
}
