//! Symbols and their storage.

use prov_syntax::{ModifierFlags, NodeIndex, ParameterModifier, TypeDeclKind};
use serde::Serialize;

/// Index of a symbol in a [`SymbolArena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SymbolId(pub u32);

impl SymbolId {
    pub const NONE: SymbolId = SymbolId(u32::MAX);

    #[inline]
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    #[inline]
    pub fn is_some(self) -> bool {
        self != Self::NONE
    }
}

impl Default for SymbolId {
    fn default() -> Self {
        Self::NONE
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum SymbolKind {
    Type(TypeDeclKind),
    Field,
    Property,
    Indexer,
    Method,
    Constructor,
    Parameter,
    Local,
}

impl SymbolKind {
    /// Kinds that can hold a value.
    pub fn is_storage(self) -> bool {
        matches!(
            self,
            SymbolKind::Field
                | SymbolKind::Property
                | SymbolKind::Indexer
                | SymbolKind::Parameter
                | SymbolKind::Local
        )
    }

    pub fn is_callable(self) -> bool {
        matches!(self, SymbolKind::Method | SymbolKind::Constructor)
    }
}

/// Effective accessibility after defaults are applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Accessibility {
    Public,
    Protected,
    Internal,
    Private,
}

impl Accessibility {
    /// Effective accessibility of a declaration.
    ///
    /// `private protected` narrows to private, `protected internal` widens
    /// to protected.
    pub fn from_modifiers(modifiers: ModifierFlags, default: Accessibility) -> Accessibility {
        if modifiers.contains(ModifierFlags::PRIVATE) {
            Accessibility::Private
        } else if modifiers.contains(ModifierFlags::PUBLIC) {
            Accessibility::Public
        } else if modifiers.contains(ModifierFlags::PROTECTED) {
            Accessibility::Protected
        } else if modifiers.contains(ModifierFlags::INTERNAL) {
            Accessibility::Internal
        } else {
            default
        }
    }

    #[inline]
    pub fn is_private(self) -> bool {
        self == Accessibility::Private
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub name: String,
    /// Modifiers as written.
    pub modifiers: ModifierFlags,
    pub accessibility: Accessibility,
    /// Declaring node: type declaration, field, property, method,
    /// constructor, parameter, variable declarator, declaration expression,
    /// foreach or catch. `NONE` for implicit setter `value` parameters.
    pub declaration: NodeIndex,
    /// Declaring type for members and nested types, declaring callable (or
    /// property/accessor) for parameters, nothing for locals.
    pub container: SymbolId,
    /// Declared type as text; `var` locals carry the inferred type, or `var`
    /// when nothing could be inferred.
    pub type_name: String,
    /// Position in the parameter list.
    pub parameter_index: Option<usize>,
    pub parameter_modifier: ParameterModifier,
}

impl Symbol {
    pub fn is_static(&self) -> bool {
        self.modifiers
            .intersects(ModifierFlags::STATIC | ModifierFlags::CONST)
    }

    pub fn is_readonly(&self) -> bool {
        self.modifiers
            .intersects(ModifierFlags::READONLY | ModifierFlags::CONST)
    }
}

#[derive(Clone, Debug, Default)]
pub struct SymbolArena {
    symbols: Vec<Symbol>,
}

impl SymbolArena {
    pub fn new() -> SymbolArena {
        SymbolArena::default()
    }

    pub fn alloc(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(symbol);
        id
    }

    #[inline]
    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        if id.is_none() {
            return None;
        }
        self.symbols.get(id.0 as usize)
    }

    #[inline]
    pub fn get_mut(&mut self, id: SymbolId) -> Option<&mut Symbol> {
        if id.is_none() {
            return None;
        }
        self.symbols.get_mut(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> + '_ {
        self.symbols
            .iter()
            .enumerate()
            .map(|(i, s)| (SymbolId(i as u32), s))
    }
}

/// Strip namespace qualification, generic arguments, array ranks and the
/// nullable suffix: `System.Collections.Generic.List<int>?` -> `List`.
pub fn simple_type_name(type_text: &str) -> &str {
    let trimmed = type_text.trim();
    let end = trimmed
        .find(['<', '[', '?'])
        .unwrap_or(trimmed.len());
    let head = &trimmed[..end];
    let head = head.rsplit("::").next().unwrap_or(head);
    head.rsplit('.').next().unwrap_or(head).trim()
}

/// Element type of an array type text (`int[]` -> `int`).
pub fn array_element_type(type_text: &str) -> Option<&str> {
    let trimmed = type_text.trim().trim_end_matches('?');
    let open = trimmed.rfind('[')?;
    trimmed.ends_with(']').then(|| trimmed[..open].trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_type_names() {
        assert_eq!(simple_type_name("int"), "int");
        assert_eq!(simple_type_name("System.IO.Stream"), "Stream");
        assert_eq!(simple_type_name("List<Dictionary<string, int>>"), "List");
        assert_eq!(simple_type_name("global::A.B?"), "B");
        assert_eq!(simple_type_name("Widget[]"), "Widget");
    }

    #[test]
    fn array_elements() {
        assert_eq!(array_element_type("int[]"), Some("int"));
        assert_eq!(array_element_type("string[][]"), Some("string[]"));
        assert_eq!(array_element_type("List<int>"), None);
    }

    #[test]
    fn accessibility_defaults() {
        assert_eq!(
            Accessibility::from_modifiers(ModifierFlags::STATIC, Accessibility::Private),
            Accessibility::Private
        );
        assert_eq!(
            Accessibility::from_modifiers(
                ModifierFlags::PROTECTED | ModifierFlags::INTERNAL,
                Accessibility::Private
            ),
            Accessibility::Protected
        );
        assert_eq!(
            Accessibility::from_modifiers(
                ModifierFlags::PRIVATE | ModifierFlags::PROTECTED,
                Accessibility::Public
            ),
            Accessibility::Private
        );
    }
}
