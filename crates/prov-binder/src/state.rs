//! Binder state: symbol tables, reference maps and write/call-site indexes.
//!
//! Binding runs in two passes over one parsed unit:
//! 1. [`declare_source_file`](BinderState::declare_source_file) creates
//!    symbols for every type, member and parameter, so bodies can refer to
//!    declarations that appear later in the file;
//! 2. [`bind_bodies`](BinderState::bind_bodies) walks initializers and
//!    bodies with a lexical scope stack, binds references, and records every
//!    write site and call site in source order.

use indexmap::IndexMap;
use prov_common::limits::MAX_BASE_CHAIN_DEPTH;
use prov_syntax::{AccessorKind, ModifierFlags, Node, NodeArena, NodeIndex, SyntaxTree};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::{Level, debug, span};

use crate::oracle::{BindingOracle, WriteSite};
use crate::symbols::{Symbol, SymbolArena, SymbolId, SymbolKind, simple_type_name};

/// Configuration options for the binder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BinderOptions {
    /// Index writes to fields and properties made from outside their
    /// declaring type. Off by default: such writes are covered by the
    /// resolver's potentially-injected fallback instead.
    pub index_external_writes: bool,
}

impl Default for BinderOptions {
    fn default() -> Self {
        BinderOptions {
            index_external_writes: false,
        }
    }
}

pub type OverloadSet = SmallVec<[SymbolId; 2]>;

/// Member table of one declared type.
#[derive(Clone, Debug, Default)]
pub(crate) struct TypeInfo {
    /// First base type declared in this unit, `NONE` otherwise.
    pub base: SymbolId,
    /// Members and nested types by name, in declaration order.
    pub members: IndexMap<String, OverloadSet>,
    pub constructors: OverloadSet,
    pub indexers: OverloadSet,
}

/// Lexical state while binding one member body.
#[derive(Default)]
pub(crate) struct BodyContext {
    pub current_type: SymbolId,
    pub scopes: Vec<FxHashMap<String, SymbolId>>,
    pub parameters: Vec<SymbolId>,
    /// Nesting depth of control flow and short-circuit operands.
    pub conditional_depth: u32,
    /// Receiver types of enclosing `?.` accesses, innermost last.
    pub conditional_receivers: Vec<Option<String>>,
}

/// Binder state over one parsed unit.
pub struct BinderState<'a> {
    pub options: BinderOptions,
    pub(crate) arena: &'a NodeArena,
    pub symbols: SymbolArena,
    pub(crate) types: FxHashMap<SymbolId, TypeInfo>,
    /// Types by simple name; more than one entry means the name is declared
    /// in several namespaces or nesting levels.
    pub(crate) type_names: FxHashMap<String, OverloadSet>,
    /// Declaration node -> declared symbol.
    pub(crate) declarations: FxHashMap<NodeIndex, SymbolId>,
    /// Reference node -> referenced symbol.
    pub(crate) references: FxHashMap<NodeIndex, SymbolId>,
    /// Callable or indexer -> its parameters in order.
    pub(crate) parameters: FxHashMap<SymbolId, SmallVec<[SymbolId; 4]>>,
    /// Setter/init accessor -> its implicit `value` parameter.
    pub(crate) value_parameters: FxHashMap<NodeIndex, SymbolId>,
    pub(crate) write_sites: FxHashMap<SymbolId, Vec<WriteSite>>,
    pub(crate) call_sites: FxHashMap<SymbolId, Vec<NodeIndex>>,
    pub(crate) argument_parameters: FxHashMap<NodeIndex, SymbolId>,
    pub(crate) backing_fields: FxHashMap<SymbolId, SymbolId>,
    pub(crate) body: BodyContext,
}

impl<'a> BinderState<'a> {
    pub fn new(arena: &'a NodeArena, options: BinderOptions) -> BinderState<'a> {
        BinderState {
            options,
            arena,
            symbols: SymbolArena::new(),
            types: FxHashMap::default(),
            type_names: FxHashMap::default(),
            declarations: FxHashMap::default(),
            references: FxHashMap::default(),
            parameters: FxHashMap::default(),
            value_parameters: FxHashMap::default(),
            write_sites: FxHashMap::default(),
            call_sites: FxHashMap::default(),
            argument_parameters: FxHashMap::default(),
            backing_fields: FxHashMap::default(),
            body: BodyContext::default(),
        }
    }

    /// Bind a parsed tree with default options.
    pub fn bind_tree(tree: &'a SyntaxTree) -> BinderState<'a> {
        Self::bind_tree_with_options(tree, BinderOptions::default())
    }

    pub fn bind_tree_with_options(tree: &'a SyntaxTree, options: BinderOptions) -> BinderState<'a> {
        let mut binder = BinderState::new(tree.arena(), options);
        binder.bind_source_file(tree.root());
        binder
    }

    /// Run both binding passes over a source file node.
    pub fn bind_source_file(&mut self, root: NodeIndex) {
        let _span = span!(Level::DEBUG, "bind_source_file", root = root.0).entered();

        self.declare_source_file(root);
        self.bind_bodies(root);
        self.collect_backing_fields();

        debug!(
            symbols = self.symbols.len(),
            types = self.types.len(),
            references = self.references.len(),
            write_locations = self.write_sites.len(),
            callables_called = self.call_sites.len(),
            "binding complete"
        );
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Declared type named `type_text` (qualification and generics ignored).
    pub fn lookup_type(&self, type_text: &str) -> Option<SymbolId> {
        let name = simple_type_name(type_text);
        self.type_names
            .get(name)
            .and_then(|set| set.first().copied())
    }

    /// Members named `name` on `ty` or the nearest base type declaring it.
    pub fn lookup_members(&self, ty: SymbolId, name: &str) -> OverloadSet {
        let mut current = ty;
        for _ in 0..MAX_BASE_CHAIN_DEPTH {
            let Some(info) = self.types.get(&current) else {
                break;
            };
            if let Some(found) = info.members.get(name)
                && !found.is_empty()
            {
                return found.clone();
            }
            current = info.base;
        }
        OverloadSet::new()
    }

    /// Like [`lookup_members`](Self::lookup_members), then the enclosing
    /// types of `ty` outward.
    pub fn lookup_members_in_scope(&self, ty: SymbolId, name: &str) -> OverloadSet {
        let mut current = ty;
        for _ in 0..MAX_BASE_CHAIN_DEPTH {
            if current.is_none() {
                break;
            }
            let found = self.lookup_members(current, name);
            if !found.is_empty() {
                return found;
            }
            current = self.symbols.get(current).map_or(SymbolId::NONE, |s| s.container);
        }
        OverloadSet::new()
    }

    pub fn base_type_of(&self, ty: SymbolId) -> SymbolId {
        self.types.get(&ty).map_or(SymbolId::NONE, |info| info.base)
    }

    /// Parameters of a callable or indexer in declaration order.
    pub fn parameters_of(&self, callable: SymbolId) -> &[SymbolId] {
        self.parameters
            .get(&callable)
            .map_or(&[][..], |params| params.as_slice())
    }

    /// Symbol of a declaring type node.
    pub fn type_of_declaration(&self, type_decl: NodeIndex) -> SymbolId {
        self.declarations
            .get(&type_decl)
            .copied()
            .unwrap_or(SymbolId::NONE)
    }

    /// Whether `inner` is `outer` or nested inside it.
    pub(crate) fn is_same_or_nested_type(&self, outer: SymbolId, inner: SymbolId) -> bool {
        let mut current = inner;
        for _ in 0..MAX_BASE_CHAIN_DEPTH {
            if current.is_none() {
                return false;
            }
            if current == outer {
                return true;
            }
            current = self.symbols.get(current).map_or(SymbolId::NONE, |s| s.container);
        }
        false
    }

    /// Accessors of a property or indexer symbol.
    fn accessors_of(&self, property: SymbolId) -> Vec<(AccessorKind, ModifierFlags)> {
        let Some(symbol) = self.symbols.get(property) else {
            return Vec::new();
        };
        let Some(Node::Property(data)) = self.arena.get(symbol.declaration) else {
            return Vec::new();
        };
        data.accessors
            .iter()
            .filter_map(|&acc| match self.arena.get(acc) {
                Some(Node::Accessor(a)) => Some((a.kind, a.modifiers)),
                _ => None,
            })
            .collect()
    }
}

// =============================================================================
// BindingOracle
// =============================================================================

impl BindingOracle for BinderState<'_> {
    fn arena(&self) -> &NodeArena {
        self.arena
    }

    fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id)
    }

    fn resolve_declaration(&self, node: NodeIndex) -> Option<SymbolId> {
        let node = self.arena.skip_parentheses(node);
        self.references
            .get(&node)
            .or_else(|| self.declarations.get(&node))
            .copied()
    }

    fn write_sites_of(&self, location: SymbolId, scope: NodeIndex) -> Vec<WriteSite> {
        let Some(sites) = self.write_sites.get(&location) else {
            return Vec::new();
        };
        sites
            .iter()
            .filter(|site| scope.is_none() || self.arena.is_ancestor_or_self(scope, site.write))
            .copied()
            .collect()
    }

    fn call_sites_of(&self, callable: SymbolId) -> Vec<NodeIndex> {
        self.call_sites.get(&callable).cloned().unwrap_or_default()
    }

    fn backing_field_of(&self, property: SymbolId) -> Option<SymbolId> {
        self.backing_fields.get(&property).copied()
    }

    fn is_externally_reachable(&self, symbol: SymbolId) -> bool {
        let mut current = symbol;
        for _ in 0..MAX_BASE_CHAIN_DEPTH {
            let Some(sym) = self.symbols.get(current) else {
                // Walked past the outermost type.
                return current.is_none();
            };
            match sym.kind {
                SymbolKind::Local => return false,
                // A parameter is as visible as its callable.
                SymbolKind::Parameter => {}
                _ if sym.accessibility.is_private() => return false,
                _ => {}
            }
            current = sym.container;
        }
        false
    }

    fn is_externally_writable(&self, symbol: SymbolId) -> bool {
        let Some(sym) = self.symbols.get(symbol) else {
            return false;
        };
        match sym.kind {
            SymbolKind::Field => !sym.is_readonly() && self.is_externally_reachable(symbol),
            SymbolKind::Property | SymbolKind::Indexer => {
                if !self.is_externally_reachable(symbol) {
                    return false;
                }
                let setter_visible = self.accessors_of(symbol).iter().any(|&(kind, modifiers)| {
                    kind != AccessorKind::Get
                        && !modifiers.contains(ModifierFlags::PRIVATE)
                });
                setter_visible
                    || self
                        .backing_field_of(symbol)
                        .is_some_and(|field| self.is_externally_writable(field))
            }
            _ => false,
        }
    }

    fn constructors_of(&self, ty: SymbolId) -> Vec<SymbolId> {
        self.types
            .get(&ty)
            .map(|info| info.constructors.to_vec())
            .unwrap_or_default()
    }

    fn parameter_of_argument(&self, argument: NodeIndex) -> Option<SymbolId> {
        self.argument_parameters.get(&argument).copied()
    }
}
