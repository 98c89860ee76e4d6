//! Symbols and the semantic model supplied by the host
//!
//! The host binds its own trees and hands over a [`SymbolTable`] shared by the
//! whole compilation plus one [`Bindings`] map per unit. Analyzers only see
//! this information through the [`SemanticModel`] trait.

mod model;

pub use model::{Bindings, SemanticModel, UnitModel};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Reference identity of a symbol within one table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolId(u32);

impl SymbolId {
    pub(crate) fn from_index(index: usize) -> Self {
        SymbolId(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Namespace,
    NamedType,
    Method,
    Property,
    Field,
    Event,
    EnumMember,
    Parameter,
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Class,
    Struct,
    Interface,
    Enum,
    Delegate,
}

/// Types the host marks as well known
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialType {
    Object,
    String,
    Boolean,
    Int32,
    Void,
}

/// A resolved declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: String,
    pub kind: SymbolKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_kind: Option<TypeKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<SymbolId>,
    #[serde(default)]
    pub parameter_count: usize,
    #[serde(default)]
    pub is_override: bool,
    /// Member this one overrides; lookup only, never owning
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overridden: Option<SymbolId>,
    #[serde(default)]
    pub implicitly_declared: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special: Option<SpecialType>,
}

impl Symbol {
    pub fn new(name: &str, kind: SymbolKind) -> Self {
        Self {
            id: SymbolId(0),
            name: name.to_string(),
            kind,
            type_kind: None,
            container: None,
            parameter_count: 0,
            is_override: false,
            overridden: None,
            implicitly_declared: false,
            special: None,
        }
    }

    pub fn named_type(name: &str, type_kind: TypeKind) -> Self {
        let mut symbol = Self::new(name, SymbolKind::NamedType);
        symbol.type_kind = Some(type_kind);
        symbol
    }

    pub fn method(name: &str, parameter_count: usize) -> Self {
        let mut symbol = Self::new(name, SymbolKind::Method);
        symbol.parameter_count = parameter_count;
        symbol
    }

    pub fn property(name: &str) -> Self {
        Self::new(name, SymbolKind::Property)
    }

    pub fn enum_member(name: &str) -> Self {
        Self::new(name, SymbolKind::EnumMember)
    }

    pub fn in_container(mut self, container: SymbolId) -> Self {
        self.container = Some(container);
        self
    }

    /// Mark as an override of `overridden`
    pub fn overriding(mut self, overridden: SymbolId) -> Self {
        self.is_override = true;
        self.overridden = Some(overridden);
        self
    }

    /// Mark as an override whose target the host could not resolve
    pub fn unresolved_override(mut self) -> Self {
        self.is_override = true;
        self.overridden = None;
        self
    }

    /// Mark as compiler-synthesized
    pub fn implicit(mut self) -> Self {
        self.implicitly_declared = true;
        self
    }

    pub fn with_special(mut self, special: SpecialType) -> Self {
        self.special = Some(special);
        self
    }

    pub fn is_enum(&self) -> bool {
        self.kind == SymbolKind::NamedType && self.type_kind == Some(TypeKind::Enum)
    }

    pub fn is_method(&self) -> bool {
        self.kind == SymbolKind::Method
    }
}

/// Structural identity of a symbol.
///
/// Two distinct [`SymbolId`]s naming the same declaration (for example after a
/// host re-binds a unit) compare equal here.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SymbolKey {
    pub qualified_name: String,
    pub kind: SymbolKind,
    pub parameter_count: usize,
}

impl fmt::Display for SymbolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind == SymbolKind::Method {
            write!(f, "{}/{}", self.qualified_name, self.parameter_count)
        } else {
            write!(f, "{}", self.qualified_name)
        }
    }
}

/// All symbols of one compilation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Symbol>", into = "Vec<Symbol>")]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    members: HashMap<SymbolId, Vec<SymbolId>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a symbol, assigning its id
    pub fn insert(&mut self, mut symbol: Symbol) -> SymbolId {
        let id = SymbolId::from_index(self.symbols.len());
        symbol.id = id;
        if let Some(container) = symbol.container {
            self.members.entry(container).or_default().push(id);
        }
        self.symbols.push(symbol);
        id
    }

    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.index())
    }

    /// Members of a container in declaration order.
    ///
    /// Partial type fragments share one symbol, so this is already the merged
    /// view across fragments.
    pub fn members(&self, container: SymbolId) -> &[SymbolId] {
        self.members
            .get(&container)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn special_type(&self, special: SpecialType) -> Option<&Symbol> {
        self.symbols.iter().find(|s| s.special == Some(special))
    }

    /// Structural key, walking the container chain
    pub fn key(&self, id: SymbolId) -> Option<SymbolKey> {
        let symbol = self.get(id)?;
        let mut path = vec![symbol.name.as_str()];
        let mut container = symbol.container;
        let mut steps = 0;
        while let Some(parent) = container {
            steps += 1;
            if steps > self.symbols.len() {
                log::debug!("container cycle at {}", id);
                return None;
            }
            let parent = self.get(parent)?;
            path.push(parent.name.as_str());
            container = parent.container;
        }
        path.reverse();
        Some(SymbolKey {
            qualified_name: path.join("."),
            kind: symbol.kind,
            parameter_count: symbol.parameter_count,
        })
    }
}

impl TryFrom<Vec<Symbol>> for SymbolTable {
    type Error = String;

    fn try_from(symbols: Vec<Symbol>) -> Result<Self, Self::Error> {
        let mut table = SymbolTable::new();
        let count = symbols.len();
        for (index, symbol) in symbols.into_iter().enumerate() {
            if symbol.id.index() != index {
                return Err(format!("symbol at index {} has id {}", index, symbol.id.0));
            }
            let out_of_range = [symbol.container, symbol.overridden]
                .into_iter()
                .flatten()
                .find(|r| r.index() >= count);
            if let Some(bad) = out_of_range {
                return Err(format!("symbol {} refers to missing symbol {}", index, bad.0));
            }
            table.insert(symbol);
        }
        Ok(table)
    }
}

impl From<SymbolTable> for Vec<Symbol> {
    fn from(table: SymbolTable) -> Self {
        table.symbols
    }
}
