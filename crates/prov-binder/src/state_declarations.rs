//! First binding pass: declare types, members and parameters.

use prov_syntax::{AccessorKind, ModifierFlags, Node, NodeIndex, ParameterModifier, TypeDeclKind};
use smallvec::SmallVec;
use tracing::trace;

use crate::state::{BinderState, TypeInfo};
use crate::symbols::{Accessibility, Symbol, SymbolId, SymbolKind};

impl BinderState<'_> {
    pub(crate) fn declare_source_file(&mut self, root: NodeIndex) {
        let Some(Node::SourceFile(file)) = self.arena.get(root) else {
            return;
        };
        for &decl in &file.declarations {
            self.declare_type(decl, SymbolId::NONE);
        }
        self.resolve_base_types();
    }

    fn declare_type(&mut self, idx: NodeIndex, outer: SymbolId) {
        let arena = self.arena;
        let Some(Node::TypeDeclaration(data)) = arena.get(idx) else {
            return;
        };
        let default_access = if outer.is_some() {
            Accessibility::Private
        } else {
            Accessibility::Internal
        };
        let ty = self.symbols.alloc(Symbol {
            kind: SymbolKind::Type(data.kind),
            name: data.name.clone(),
            modifiers: data.modifiers,
            accessibility: Accessibility::from_modifiers(data.modifiers, default_access),
            declaration: idx,
            container: outer,
            type_name: data.name.clone(),
            parameter_index: None,
            parameter_modifier: ParameterModifier::None,
        });
        self.declarations.insert(idx, ty);
        self.types.insert(ty, TypeInfo::default());
        self.type_names
            .entry(data.name.clone())
            .or_default()
            .push(ty);
        if outer.is_some() {
            self.add_member(outer, &data.name, ty);
        }
        trace!(name = %data.name, symbol = ty.0, "declared type");

        let member_default = if data.kind == TypeDeclKind::Interface {
            Accessibility::Public
        } else {
            Accessibility::Private
        };
        for &member in &data.members {
            self.declare_member(member, ty, member_default);
        }
    }

    fn declare_member(&mut self, idx: NodeIndex, ty: SymbolId, default_access: Accessibility) {
        let arena = self.arena;
        match arena.get(idx) {
            Some(Node::TypeDeclaration(_)) => self.declare_type(idx, ty),
            Some(Node::Field(data)) => {
                let field = self.declare_symbol(
                    SymbolKind::Field,
                    &data.name,
                    data.modifiers,
                    default_access,
                    idx,
                    ty,
                    &data.ty,
                );
                self.add_member(ty, &data.name, field);
            }
            Some(Node::Property(data)) => {
                let kind = if data.is_indexer {
                    SymbolKind::Indexer
                } else {
                    SymbolKind::Property
                };
                let property = self.declare_symbol(
                    kind,
                    &data.name,
                    data.modifiers,
                    default_access,
                    idx,
                    ty,
                    &data.ty,
                );
                if data.is_indexer {
                    if let Some(info) = self.types.get_mut(&ty) {
                        info.indexers.push(property);
                    }
                } else {
                    self.add_member(ty, &data.name, property);
                }
                self.declare_parameters(property, &data.parameters);
                for &accessor in &data.accessors {
                    self.declare_value_parameter(accessor, property, &data.ty);
                }
            }
            Some(Node::Method(data)) => {
                let method = self.declare_symbol(
                    SymbolKind::Method,
                    &data.name,
                    data.modifiers,
                    default_access,
                    idx,
                    ty,
                    &data.return_ty,
                );
                self.add_member(ty, &data.name, method);
                self.declare_parameters(method, &data.parameters);
            }
            Some(Node::Constructor(data)) => {
                let type_name = self
                    .symbols
                    .get(ty)
                    .map(|s| s.name.clone())
                    .unwrap_or_default();
                let ctor = self.declare_symbol(
                    SymbolKind::Constructor,
                    &data.name,
                    data.modifiers,
                    default_access,
                    idx,
                    ty,
                    &type_name,
                );
                if let Some(info) = self.types.get_mut(&ty) {
                    info.constructors.push(ctor);
                }
                self.declare_parameters(ctor, &data.parameters);
            }
            _ => {}
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn declare_symbol(
        &mut self,
        kind: SymbolKind,
        name: &str,
        modifiers: ModifierFlags,
        default_access: Accessibility,
        declaration: NodeIndex,
        container: SymbolId,
        type_name: &str,
    ) -> SymbolId {
        let id = self.symbols.alloc(Symbol {
            kind,
            name: name.to_string(),
            modifiers,
            accessibility: Accessibility::from_modifiers(modifiers, default_access),
            declaration,
            container,
            type_name: type_name.to_string(),
            parameter_index: None,
            parameter_modifier: ParameterModifier::None,
        });
        self.declarations.insert(declaration, id);
        id
    }

    fn add_member(&mut self, ty: SymbolId, name: &str, member: SymbolId) {
        if let Some(info) = self.types.get_mut(&ty) {
            info.members.entry(name.to_string()).or_default().push(member);
        }
    }

    fn declare_parameters(&mut self, owner: SymbolId, parameters: &[NodeIndex]) {
        let arena = self.arena;
        let mut ids = SmallVec::new();
        for (index, &param) in parameters.iter().enumerate() {
            let Some(Node::Parameter(data)) = arena.get(param) else {
                continue;
            };
            let id = self.symbols.alloc(Symbol {
                kind: SymbolKind::Parameter,
                name: data.name.clone(),
                modifiers: ModifierFlags::empty(),
                accessibility: Accessibility::Public,
                declaration: param,
                container: owner,
                type_name: data.ty.clone(),
                parameter_index: Some(index),
                parameter_modifier: data.modifier,
            });
            self.declarations.insert(param, id);
            ids.push(id);
        }
        self.parameters.insert(owner, ids);
    }

    fn declare_value_parameter(&mut self, accessor: NodeIndex, property: SymbolId, ty: &str) {
        let Some(Node::Accessor(data)) = self.arena.get(accessor) else {
            return;
        };
        if data.kind == AccessorKind::Get {
            return;
        }
        let id = self.symbols.alloc(Symbol {
            kind: SymbolKind::Parameter,
            name: "value".to_string(),
            modifiers: ModifierFlags::empty(),
            accessibility: Accessibility::Public,
            declaration: NodeIndex::NONE,
            container: property,
            type_name: ty.to_string(),
            parameter_index: None,
            parameter_modifier: ParameterModifier::None,
        });
        self.value_parameters.insert(accessor, id);
    }

    /// Link each type to the first base type declared in this unit.
    fn resolve_base_types(&mut self) {
        let arena = self.arena;
        let mut links = Vec::new();
        for (&ty, _) in &self.types {
            let Some(symbol) = self.symbols.get(ty) else {
                continue;
            };
            let Some(Node::TypeDeclaration(data)) = arena.get(symbol.declaration) else {
                continue;
            };
            let base = data
                .base_types
                .iter()
                .filter_map(|text| self.lookup_type(text))
                .find(|&candidate| {
                    candidate != ty
                        && self.symbols.get(candidate).is_some_and(|s| {
                            !matches!(s.kind, SymbolKind::Type(TypeDeclKind::Interface))
                        })
                });
            if let Some(base) = base {
                links.push((ty, base));
            }
        }
        for (ty, base) in links {
            if let Some(info) = self.types.get_mut(&ty) {
                info.base = base;
            }
        }
    }
}
