//! Classification of one expression into a provenance step.

use prov_binder::{BindingOracle, Symbol, SymbolId, SymbolKind};
use prov_syntax::{
    AccessorKind, ArgumentModifier, AssignOp, BinaryData, BinaryOp, InvocationData,
    LiteralKind, ModifierFlags, Node, NodeArena, NodeIndex, ParameterModifier, TypeDeclKind,
    UnaryData, UnaryOp,
};
use tracing::trace;

use crate::context::{LocationKey, ResolveContext};
use crate::error::Result;
use crate::kind::SourceKind;
use crate::provenance::ProvenanceEntry;
use crate::walker::getter_of;

/// What the resolver does with a visited node.
pub(crate) enum Step {
    /// Emit one entry and stop.
    Leaf(SourceKind),
    /// Emit nothing; resolve these nodes in its place.
    Forward(Vec<NodeIndex>),
    Expand(Expansion),
}

/// Emit `kind` for the node (if any), then resolve `sources`, then emit the
/// `trailing` markers. With a `location`, the whole expansion runs under the
/// recursion guard.
pub(crate) struct Expansion {
    pub kind: Option<SourceKind>,
    pub location: Option<LocationKey>,
    pub sources: Vec<NodeIndex>,
    pub trailing: Vec<ProvenanceEntry>,
}

impl Expansion {
    fn guarded(kind: SourceKind, location: LocationKey, sources: Vec<NodeIndex>) -> Self {
        Self {
            kind: Some(kind),
            location: Some(location),
            sources,
            trailing: Vec::new(),
        }
    }

    fn unguarded(kind: SourceKind, sources: Vec<NodeIndex>) -> Self {
        Self {
            kind: Some(kind),
            location: None,
            sources,
            trailing: Vec::new(),
        }
    }

    fn with_trailing(mut self, entry: ProvenanceEntry) -> Self {
        self.trailing.push(entry);
        self
    }
}

/// A storage location that contributes no entry of its own.
fn transparent(location: LocationKey, sources: Vec<NodeIndex>) -> Step {
    if sources.is_empty() {
        return Step::Leaf(SourceKind::Unknown);
    }
    Step::Expand(Expansion {
        kind: None,
        location: Some(location),
        sources,
        trailing: Vec::new(),
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Usage {
    Read,
    Call,
    /// Resolution started on the declaration itself.
    Declaration,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PropertyShape {
    /// Auto-property or a getter that returns a field directly.
    Storage,
    /// Getter with a body.
    Computed,
    /// Abstract, extern or interface member: no body in this unit.
    Opaque,
}

impl<O: BindingOracle + ?Sized> ResolveContext<'_, O> {
    pub(crate) fn classify(&self, node: NodeIndex) -> Result<Step> {
        let arena = self.oracle.arena();
        let Some(data) = arena.get(node) else {
            return Ok(Step::Leaf(SourceKind::Unknown));
        };
        if is_constant_expression(arena, node) {
            return Ok(Step::Leaf(SourceKind::Constant));
        }

        let step = match data {
            Node::Literal(literal) => Step::Leaf(if literal.kind == LiteralKind::InterpolatedString {
                SourceKind::Calculated
            } else {
                SourceKind::Constant
            }),
            Node::Default(_) | Node::TypeOf(_) => Step::Leaf(SourceKind::Constant),
            Node::ObjectCreation(_) | Node::ArrayCreation(_) | Node::Initializer(_) => {
                Step::Leaf(SourceKind::Created)
            }
            Node::Parenthesized(inner) => Step::Forward(vec![*inner]),
            Node::Cast(cast) => Step::Forward(vec![cast.expression]),
            Node::Assignment(assign) if assign.op == AssignOp::Assign => {
                Step::Forward(vec![assign.value])
            }
            Node::Assignment(assign) => Step::Expand(Expansion::unguarded(
                SourceKind::Calculated,
                vec![assign.target, assign.value],
            )),
            Node::Binary(binary) => classify_binary(binary),
            Node::Unary(unary) => classify_unary(unary),
            Node::Conditional(conditional) => Step::Expand(Expansion::unguarded(
                SourceKind::Calculated,
                vec![conditional.when_true, conditional.when_false],
            )),
            Node::ConditionalAccess(access) => {
                if self.oracle.resolve_declaration(access.when_not_null).is_some() {
                    Step::Forward(vec![access.when_not_null])
                } else {
                    Step::Leaf(SourceKind::External)
                }
            }
            Node::Argument(argument) => match argument.modifier {
                ArgumentModifier::Out => self.classify_by_reference(node, SourceKind::Out)?,
                ArgumentModifier::Ref => self.classify_by_reference(node, SourceKind::Ref)?,
                ArgumentModifier::None | ArgumentModifier::In => {
                    Step::Forward(vec![argument.expression])
                }
            },
            Node::Identifier(_)
            | Node::MemberAccess(_)
            | Node::MemberBinding(_)
            | Node::ElementAccess(_)
            | Node::DeclarationExpression(_) => match self.oracle.resolve_declaration(node) {
                Some(symbol) => self.classify_symbol(node, symbol, Usage::Read)?,
                None => Step::Leaf(unbound_kind(arena, node)),
            },
            Node::Invocation(invocation) => self.classify_invocation(node, invocation)?,
            Node::Field(_)
            | Node::Property(_)
            | Node::Method(_)
            | Node::Parameter(_)
            | Node::VariableDeclarator(_) => match self.oracle.resolve_declaration(node) {
                Some(symbol) => self.classify_symbol(node, symbol, Usage::Declaration)?,
                None => Step::Leaf(SourceKind::Unknown),
            },
            Node::Accessor(_) => match self.oracle.resolve_declaration(arena.parent(node)) {
                Some(symbol) => self.classify_symbol(node, symbol, Usage::Declaration)?,
                None => Step::Leaf(SourceKind::Unknown),
            },
            _ => Step::Leaf(SourceKind::Unknown),
        };
        trace!(node = node.0, kind = arena.kind_name(node), "classified");
        Ok(step)
    }

    fn classify_symbol(&self, node: NodeIndex, id: SymbolId, usage: Usage) -> Result<Step> {
        let Some(symbol) = self.oracle.symbol(id) else {
            return Ok(Step::Leaf(SourceKind::Unknown));
        };
        let step = match symbol.kind {
            SymbolKind::Local => {
                let sources = self.walker.write_values(id, NodeIndex::NONE)?;
                transparent(LocationKey::new(id, symbol.declaration), sources)
            }
            SymbolKind::Parameter => self.classify_parameter(id, symbol)?,
            _ if usage == Usage::Call && symbol.kind.is_storage() => {
                // Delegate stored in a member.
                Step::Leaf(SourceKind::External)
            }
            SymbolKind::Field => self.classify_storage(node, id, symbol)?,
            SymbolKind::Property | SymbolKind::Indexer => match self.property_shape(id, symbol) {
                PropertyShape::Storage => self.classify_storage(node, id, symbol)?,
                PropertyShape::Computed => self.classify_body(id, symbol)?,
                PropertyShape::Opaque => Step::Leaf(SourceKind::External),
            },
            SymbolKind::Method if usage != Usage::Read => {
                if has_body(self.oracle.arena(), symbol.declaration) {
                    self.classify_body(id, symbol)?
                } else {
                    Step::Leaf(SourceKind::External)
                }
            }
            SymbolKind::Method | SymbolKind::Constructor | SymbolKind::Type(_) => {
                Step::Leaf(SourceKind::Unknown)
            }
        };
        Ok(step)
    }

    /// Getter, indexer or method body: calculated from what it returns.
    fn classify_body(&self, id: SymbolId, symbol: &Symbol) -> Result<Step> {
        let returns = self.walker.return_expressions(symbol.declaration)?;
        if returns.is_empty() {
            return Ok(Step::Leaf(SourceKind::Calculated));
        }
        Ok(Step::Expand(Expansion::guarded(
            SourceKind::Calculated,
            LocationKey::new(id, symbol.declaration),
            returns,
        )))
    }

    fn classify_storage(&self, node: NodeIndex, id: SymbolId, symbol: &Symbol) -> Result<Step> {
        if symbol.is_static() && self.is_readonly_storage(id, symbol) {
            return Ok(Step::Leaf(SourceKind::Cached));
        }
        let sources = self.walker.storage_sources(id, node)?;
        // Every post-construction read sees the same sources.
        let scope = if sources.after_construction {
            NodeIndex::NONE
        } else {
            self.oracle.arena().enclosing_declaration(node)
        };
        let mut expansion = Expansion::guarded(
            SourceKind::Member,
            LocationKey::new(id, scope),
            sources.values,
        );
        if sources.after_construction && self.oracle.is_externally_writable(id) {
            expansion = expansion
                .with_trailing(ProvenanceEntry::new(node, SourceKind::PotentiallyInjected));
        }
        Ok(Step::Expand(expansion))
    }

    fn classify_parameter(&self, id: SymbolId, symbol: &Symbol) -> Result<Step> {
        let Some(callable) = self.oracle.symbol(symbol.container) else {
            return Ok(Step::Leaf(SourceKind::Argument));
        };
        let key = LocationKey::new(id, callable.declaration);

        // Implicit `value` of a setter: whatever is assigned to the property.
        if symbol.declaration.is_none() {
            let sources = self.walker.setter_values(symbol.container)?;
            return Ok(Step::Expand(Expansion::guarded(
                SourceKind::Argument,
                key,
                sources,
            )));
        }

        let step = match symbol.parameter_modifier {
            ParameterModifier::Out => {
                transparent(key, self.walker.write_values(id, callable.declaration)?)
            }
            ParameterModifier::Ref => {
                // The caller's variable, not its `ref` wrapper: the wrapper
                // leads straight back into this parameter.
                let arena = self.oracle.arena();
                let supplied = self.walker.argument_sources(id)?;
                let values = supplied
                    .values
                    .into_iter()
                    .map(|value| match arena.get(value) {
                        Some(Node::Argument(argument)) => argument.expression,
                        _ => value,
                    })
                    .collect();
                Step::Expand(Expansion::guarded(SourceKind::Argument, key, values))
            }
            _ if callable.kind == SymbolKind::Constructor && !callable.is_static() => {
                let supplied = self.walker.argument_sources(id)?;
                let mut expansion =
                    Expansion::guarded(SourceKind::Argument, key, supplied.values);
                if !supplied.has_call_sites {
                    expansion = expansion.with_trailing(ProvenanceEntry::new(
                        symbol.declaration,
                        SourceKind::Injected,
                    ));
                }
                Step::Expand(expansion)
            }
            _ => Step::Leaf(SourceKind::Argument),
        };
        Ok(step)
    }

    /// `out x` / `ref x`: whatever the callee stores into its parameter.
    fn classify_by_reference(&self, argument: NodeIndex, kind: SourceKind) -> Result<Step> {
        let arena = self.oracle.arena();
        let callee = self
            .oracle
            .parameter_of_argument(argument)
            .and_then(|p| Some((p, self.oracle.symbol(self.oracle.symbol(p)?.container)?)));
        if let Some((parameter, callable)) = callee
            && has_body(arena, callable.declaration)
        {
            let sources = self.walker.write_values(parameter, callable.declaration)?;
            if sources.is_empty() {
                return Ok(Step::Leaf(kind));
            }
            return Ok(Step::Expand(Expansion::guarded(
                kind,
                LocationKey::new(parameter, callable.declaration),
                sources,
            )));
        }
        let call = arena.parent(argument);
        Ok(Step::Expand(
            Expansion::unguarded(kind, Vec::new())
                .with_trailing(ProvenanceEntry::new(call, SourceKind::External)),
        ))
    }

    fn classify_invocation(&self, node: NodeIndex, data: &InvocationData) -> Result<Step> {
        if let Some(method) = self.oracle.resolve_declaration(node) {
            return self.classify_symbol(node, method, Usage::Call);
        }
        let arena = self.oracle.arena();
        let callee = arena.skip_parentheses(data.expression);
        if let Some(Node::Identifier(name)) = arena.get(callee)
            && name.name == "nameof"
        {
            return Ok(Step::Leaf(SourceKind::Constant));
        }
        let delegate = self
            .oracle
            .resolve_declaration(callee)
            .and_then(|s| self.oracle.symbol(s))
            .is_some_and(|s| s.kind.is_storage());
        Ok(Step::Leaf(if delegate {
            SourceKind::External
        } else {
            unbound_kind(arena, callee)
        }))
    }

    fn property_shape(&self, id: SymbolId, symbol: &Symbol) -> PropertyShape {
        let arena = self.oracle.arena();
        let Some(Node::Property(data)) = arena.get(symbol.declaration) else {
            return PropertyShape::Opaque;
        };
        let in_interface = self
            .oracle
            .symbol(symbol.container)
            .is_some_and(|c| c.kind == SymbolKind::Type(TypeDeclKind::Interface));
        if in_interface
            || symbol
                .modifiers
                .intersects(ModifierFlags::ABSTRACT | ModifierFlags::EXTERN)
        {
            return PropertyShape::Opaque;
        }
        if symbol.kind == SymbolKind::Property && self.oracle.backing_field_of(id).is_some() {
            return PropertyShape::Storage;
        }
        if data.expression_body.is_some() {
            return PropertyShape::Computed;
        }
        match getter_of(arena, data) {
            Some(getter) if getter.is_auto() => {
                if symbol.kind == SymbolKind::Property {
                    PropertyShape::Storage
                } else {
                    PropertyShape::Opaque
                }
            }
            Some(_) => PropertyShape::Computed,
            None => PropertyShape::Opaque,
        }
    }

    fn is_readonly_storage(&self, id: SymbolId, symbol: &Symbol) -> bool {
        match symbol.kind {
            SymbolKind::Field => symbol.is_readonly(),
            SymbolKind::Property => match self.oracle.backing_field_of(id) {
                Some(field) => self.oracle.symbol(field).is_some_and(Symbol::is_readonly),
                None => {
                    let arena = self.oracle.arena();
                    match arena.get(symbol.declaration) {
                        Some(Node::Property(data)) => data.accessors.iter().all(|&a| {
                            matches!(
                                arena.get(a),
                                Some(Node::Accessor(acc)) if acc.kind == AccessorKind::Get
                            )
                        }),
                        _ => false,
                    }
                }
            },
            _ => false,
        }
    }
}

fn classify_binary(binary: &BinaryData) -> Step {
    if binary.op.is_arithmetic() || binary.op == BinaryOp::Coalesce {
        Step::Expand(Expansion::unguarded(
            SourceKind::Calculated,
            vec![binary.left, binary.right],
        ))
    } else {
        Step::Leaf(SourceKind::Calculated)
    }
}

fn classify_unary(unary: &UnaryData) -> Step {
    match unary.op {
        UnaryOp::Await | UnaryOp::SuppressNullable => Step::Forward(vec![unary.operand]),
        UnaryOp::Not => Step::Leaf(SourceKind::Calculated),
        UnaryOp::Negate
        | UnaryOp::Plus
        | UnaryOp::BitwiseNot
        | UnaryOp::PreIncrement
        | UnaryOp::PreDecrement
        | UnaryOp::PostIncrement
        | UnaryOp::PostDecrement => Step::Expand(Expansion::unguarded(
            SourceKind::Calculated,
            vec![unary.operand],
        )),
    }
}

/// Unresolved reference. A bare name or `this.x` that does not bind is
/// broken code in this unit; anything reached through another receiver is
/// outside it.
fn unbound_kind(arena: &NodeArena, node: NodeIndex) -> SourceKind {
    match arena.get(node) {
        Some(Node::Identifier(_) | Node::DeclarationExpression(_)) => SourceKind::Unknown,
        Some(Node::MemberAccess(access)) => {
            match arena.get(arena.skip_parentheses(access.expression)) {
                Some(Node::This | Node::Base) => SourceKind::Unknown,
                _ => SourceKind::External,
            }
        }
        _ => SourceKind::External,
    }
}

fn has_body(arena: &NodeArena, declaration: NodeIndex) -> bool {
    match arena.get(declaration) {
        Some(Node::Method(data)) => data.body.is_some() || data.expression_body.is_some(),
        Some(Node::Constructor(data)) => data.body.is_some() || data.expression_body.is_some(),
        Some(Node::Property(data)) => {
            data.expression_body.is_some()
                || data.accessors.iter().any(|&a| {
                    matches!(arena.get(a), Some(Node::Accessor(acc)) if !acc.is_auto())
                })
        }
        _ => false,
    }
}

/// Built only from literals and operators, so foldable at compile time.
fn is_constant_expression(arena: &NodeArena, node: NodeIndex) -> bool {
    match arena.get(node) {
        Some(Node::Literal(literal)) => literal.kind != LiteralKind::InterpolatedString,
        Some(Node::Default(_) | Node::TypeOf(_)) => true,
        Some(Node::Parenthesized(inner)) => is_constant_expression(arena, *inner),
        Some(Node::Cast(cast)) => !cast.is_as && is_constant_expression(arena, cast.expression),
        Some(Node::Unary(unary)) => {
            matches!(
                unary.op,
                UnaryOp::Negate | UnaryOp::Plus | UnaryOp::Not | UnaryOp::BitwiseNot
            ) && is_constant_expression(arena, unary.operand)
        }
        Some(Node::Binary(binary)) => {
            binary.op != BinaryOp::Is
                && is_constant_expression(arena, binary.left)
                && is_constant_expression(arena, binary.right)
        }
        Some(Node::Conditional(conditional)) => {
            is_constant_expression(arena, conditional.condition)
                && is_constant_expression(arena, conditional.when_true)
                && is_constant_expression(arena, conditional.when_false)
        }
        _ => false,
    }
}
