//! Assignment and call-site walking.
//!
//! The walker turns "where could this location's value come from" into a
//! list of source expressions, using only the [`BindingOracle`]. Field and
//! property reads are position-sensitive: what a read can observe depends on
//! whether it happens in an initializer, inside a constructor, or after
//! construction has finished.

use indexmap::IndexSet;
use prov_binder::{BindingOracle, Symbol, SymbolId, SymbolKind, WriteKind, WriteSite};
use prov_common::CancellationToken;
use prov_common::limits::MAX_CONSTRUCTOR_CHAIN_DEPTH;
use prov_syntax::{
    AccessorData, AccessorKind, ConstructorInitializerKind, Node, NodeArena, NodeIndex,
    PropertyData,
};
use tracing::trace;

use crate::error::{ResolveError, Result};

/// Sources visible to one field or property read.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StorageSources {
    pub values: Vec<NodeIndex>,
    /// Every constructor has finished by the time the read runs, so code
    /// outside the type may have stored into the location as well.
    pub after_construction: bool,
}

/// Values supplied for a parameter by the callers in the unit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParameterSources {
    /// Argument nodes, or the declared default where a caller omits it.
    pub values: Vec<NodeIndex>,
    pub has_call_sites: bool,
}

pub struct AssignmentWalker<'r, O: BindingOracle + ?Sized> {
    oracle: &'r O,
    token: &'r CancellationToken,
}

impl<'r, O: BindingOracle + ?Sized> AssignmentWalker<'r, O> {
    pub fn new(oracle: &'r O, token: &'r CancellationToken) -> Self {
        Self { oracle, token }
    }

    #[inline]
    fn checkpoint(&self) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(ResolveError::Abandoned);
        }
        Ok(())
    }

    fn arena(&self) -> &'r NodeArena {
        self.oracle.arena()
    }

    /// Values stored into `location` inside `scope`, in source order.
    pub fn write_values(&self, location: SymbolId, scope: NodeIndex) -> Result<Vec<NodeIndex>> {
        let sites = self.oracle.write_sites_of(location, scope);
        let mut values = Vec::with_capacity(sites.len());
        for site in sites {
            self.checkpoint()?;
            values.push(site.value);
        }
        Ok(values)
    }

    /// Values a property setter's implicit `value` parameter can receive.
    pub fn setter_values(&self, property: SymbolId) -> Result<Vec<NodeIndex>> {
        let mut values = Vec::new();
        for site in self.oracle.write_sites_of(property, NodeIndex::NONE) {
            self.checkpoint()?;
            if site.kind != WriteKind::Initializer {
                values.push(site.value);
            }
        }
        Ok(values)
    }

    /// Sources a field or storage-like property read at `read` can observe.
    ///
    /// - static locations see every write
    /// - a read inside an initializer sees initializers only
    /// - a read inside a constructor sees what that constructor has stored
    ///   so far, falling back to a chained `this(...)` constructor or the
    ///   initializer
    /// - any other read sees each constructor's final state followed by the
    ///   writes in other members
    pub fn storage_sources(&self, location: SymbolId, read: NodeIndex) -> Result<StorageSources> {
        let Some(symbol) = self.oracle.symbol(location) else {
            return Ok(StorageSources::default());
        };
        let sites = self.storage_writes(location, symbol)?;
        let initializers: Vec<NodeIndex> = sites
            .iter()
            .filter(|s| s.kind == WriteKind::Initializer)
            .map(|s| s.value)
            .collect();

        if symbol.is_static() {
            let rest = sites
                .iter()
                .filter(|s| s.kind != WriteKind::Initializer)
                .map(|s| s.value);
            return Ok(StorageSources {
                values: dedup(initializers.iter().copied().chain(rest)),
                after_construction: true,
            });
        }

        let arena = self.arena();
        let constructors = self.instance_constructors(symbol.container);
        if read != symbol.declaration {
            if self.is_in_initializer(read) {
                trace!(read = read.0, "read inside an initializer");
                return Ok(StorageSources {
                    values: initializers,
                    after_construction: false,
                });
            }
            let declaration = arena.enclosing_declaration(read);
            if constructors.contains(&declaration) {
                let before = arena.span(read).start;
                let values =
                    self.constructor_state(declaration, before, &sites, &initializers, 0)?;
                return Ok(StorageSources {
                    values: dedup(values),
                    after_construction: false,
                });
            }
        }

        let mut values = Vec::new();
        if constructors.is_empty() {
            values.extend_from_slice(&initializers);
        }
        for &ctor in &constructors {
            values.extend(self.constructor_state(ctor, u32::MAX, &sites, &initializers, 0)?);
        }
        for site in &sites {
            if site.kind != WriteKind::Initializer && !constructors.contains(&site.member) {
                values.push(site.value);
            }
        }
        Ok(StorageSources {
            values: dedup(values),
            after_construction: true,
        })
    }

    /// Writes to a field or property. A property with a backing field also
    /// collects the field's writes, except those in its own accessors.
    fn storage_writes(&self, location: SymbolId, symbol: &Symbol) -> Result<Vec<WriteSite>> {
        let mut sites = self.oracle.write_sites_of(location, NodeIndex::NONE);
        if symbol.kind == SymbolKind::Property
            && let Some(field) = self.oracle.backing_field_of(location)
        {
            let arena = self.arena();
            let own = symbol.declaration;
            for site in self.oracle.write_sites_of(field, NodeIndex::NONE) {
                self.checkpoint()?;
                if !arena.is_ancestor_or_self(own, site.write) {
                    sites.push(site);
                }
            }
            sites.sort_by_key(|s| s.position);
        }
        self.checkpoint()?;
        Ok(sites)
    }

    /// Values a constructor has stored before offset `before`.
    ///
    /// Starts at the last unconditional write; if there is none, what the
    /// chained constructor (or the initializer) left behind comes first.
    fn constructor_state(
        &self,
        ctor: NodeIndex,
        before: u32,
        sites: &[WriteSite],
        initializers: &[NodeIndex],
        depth: usize,
    ) -> Result<Vec<NodeIndex>> {
        self.checkpoint()?;
        let arena = self.arena();
        let own: Vec<&WriteSite> = sites
            .iter()
            .filter(|s| {
                s.kind != WriteKind::Initializer
                    && s.member == ctor
                    && arena.span(s.write).end <= before
            })
            .collect();

        if let Some(last) = own.iter().rposition(|s| !s.conditional) {
            return Ok(own[last..].iter().map(|s| s.value).collect());
        }

        let mut values = match self.chained_constructor(ctor) {
            Some(next) if depth < MAX_CONSTRUCTOR_CHAIN_DEPTH => {
                self.constructor_state(next, u32::MAX, sites, initializers, depth + 1)?
            }
            _ => initializers.to_vec(),
        };
        values.extend(own.iter().map(|s| s.value));
        Ok(values)
    }

    /// Target of a constructor's `this(...)` initializer.
    fn chained_constructor(&self, ctor: NodeIndex) -> Option<NodeIndex> {
        let arena = self.arena();
        let Some(Node::Constructor(data)) = arena.get(ctor) else {
            return None;
        };
        match arena.get(data.initializer) {
            Some(Node::ConstructorInitializer(init))
                if init.kind == ConstructorInitializerKind::This => {}
            _ => return None,
        }
        let target = self.oracle.resolve_declaration(data.initializer)?;
        let declaration = self.oracle.symbol(target)?.declaration;
        (declaration != ctor).then_some(declaration)
    }

    fn instance_constructors(&self, ty: SymbolId) -> Vec<NodeIndex> {
        self.oracle
            .constructors_of(ty)
            .into_iter()
            .filter_map(|c| self.oracle.symbol(c))
            .filter(|s| !s.is_static())
            .map(|s| s.declaration)
            .collect()
    }

    fn is_in_initializer(&self, read: NodeIndex) -> bool {
        let arena = self.arena();
        match arena.get(arena.enclosing_member(read)) {
            Some(Node::Field(_)) => true,
            Some(Node::Property(data)) => {
                data.initializer.is_some() && arena.is_ancestor_or_self(data.initializer, read)
            }
            _ => false,
        }
    }

    /// Expressions a method, getter or indexer getter can return.
    pub fn return_expressions(&self, declaration: NodeIndex) -> Result<Vec<NodeIndex>> {
        let arena = self.arena();
        let (body, expression_body) = match arena.get(declaration) {
            Some(Node::Method(data)) => (data.body, data.expression_body),
            Some(Node::Accessor(data)) => (data.body, data.expression_body),
            Some(Node::Property(data)) if data.expression_body.is_some() => {
                (NodeIndex::NONE, data.expression_body)
            }
            Some(Node::Property(data)) => match getter_of(arena, data) {
                Some(getter) => (getter.body, getter.expression_body),
                None => return Ok(Vec::new()),
            },
            _ => return Ok(Vec::new()),
        };
        if expression_body.is_some() {
            return Ok(vec![expression_body]);
        }
        let mut returns = Vec::new();
        if body.is_none() {
            return Ok(returns);
        }
        for node in arena.descendants(body) {
            self.checkpoint()?;
            if let Some(Node::Return(value)) = arena.get(node)
                && value.is_some()
            {
                returns.push(*value);
            }
        }
        Ok(returns)
    }

    /// What the callers of `parameter`'s callable pass for it.
    pub fn argument_sources(&self, parameter: SymbolId) -> Result<ParameterSources> {
        let Some(symbol) = self.oracle.symbol(parameter) else {
            return Ok(ParameterSources::default());
        };
        let default = match self.arena().get(symbol.declaration) {
            Some(Node::Parameter(data)) => data.default,
            _ => NodeIndex::NONE,
        };
        let call_sites = self.oracle.call_sites_of(symbol.container);
        let mut values = Vec::with_capacity(call_sites.len());
        for &site in &call_sites {
            self.checkpoint()?;
            match self.oracle.argument_for_parameter(site, parameter) {
                Some(argument) => values.push(argument),
                None if default.is_some() => values.push(default),
                None => {}
            }
        }
        if call_sites.is_empty() && default.is_some() {
            values.push(default);
        }
        Ok(ParameterSources {
            values,
            has_call_sites: !call_sites.is_empty(),
        })
    }
}

pub(crate) fn getter_of<'a>(arena: &'a NodeArena, property: &PropertyData) -> Option<&'a AccessorData> {
    property.accessors.iter().find_map(|&a| match arena.get(a) {
        Some(Node::Accessor(data)) if data.kind == AccessorKind::Get => Some(data),
        _ => None,
    })
}

fn dedup(values: impl IntoIterator<Item = NodeIndex>) -> Vec<NodeIndex> {
    values.into_iter().collect::<IndexSet<_>>().into_iter().collect()
}
