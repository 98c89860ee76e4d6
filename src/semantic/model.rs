//! Node-to-symbol queries

use super::{SpecialType, Symbol, SymbolId, SymbolKey, SymbolTable};
use crate::syntax::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Read-only view of symbol information for analyzers.
///
/// Every lookup may come back empty; analyzers treat that as "cannot prove a
/// violation" and stay silent.
pub trait SemanticModel: Send + Sync {
    fn symbol(&self, id: SymbolId) -> Option<&Symbol>;

    /// Symbol declared by a declaration node
    fn declared_symbol(&self, node: NodeId) -> Option<&Symbol>;

    /// Symbol an expression refers to
    fn symbol_info(&self, node: NodeId) -> Option<&Symbol>;

    /// Type of an expression
    fn type_info(&self, node: NodeId) -> Option<&Symbol>;

    /// Members of a type, merged across partial fragments
    fn members(&self, container: SymbolId) -> Vec<&Symbol>;

    fn special_type(&self, special: SpecialType) -> Option<&Symbol>;

    fn symbol_key(&self, id: SymbolId) -> Option<SymbolKey>;

    /// Follow a method's overridden members to the first non-override.
    ///
    /// Returns `None` when the method overrides nothing resolvable, when the
    /// chain breaks, or when it loops.
    fn override_root(&self, method: SymbolId) -> Option<&Symbol> {
        let declared = self.symbol(method)?;
        let mut current = self.symbol(declared.overridden?)?;
        let mut seen = HashSet::from([declared.id]);
        while current.is_override {
            if !seen.insert(current.id) {
                log::debug!("override cycle through {}", current.name);
                return None;
            }
            current = self.symbol(current.overridden?)?;
        }
        Some(current)
    }
}

/// Host-recorded node bindings for one unit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bindings {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    declared: BTreeMap<NodeId, SymbolId>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    referenced: BTreeMap<NodeId, SymbolId>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    types: BTreeMap<NodeId, SymbolId>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, node: NodeId, symbol: SymbolId) -> &mut Self {
        self.declared.insert(node, symbol);
        self
    }

    pub fn reference(&mut self, node: NodeId, symbol: SymbolId) -> &mut Self {
        self.referenced.insert(node, symbol);
        self
    }

    pub fn set_type(&mut self, node: NodeId, ty: SymbolId) -> &mut Self {
        self.types.insert(node, ty);
        self
    }

    pub fn declared(&self, node: NodeId) -> Option<SymbolId> {
        self.declared.get(&node).copied()
    }

    pub fn referenced(&self, node: NodeId) -> Option<SymbolId> {
        self.referenced.get(&node).copied()
    }

    pub fn type_of(&self, node: NodeId) -> Option<SymbolId> {
        self.types.get(&node).copied()
    }

    /// Declaration nodes in node order
    pub fn declarations(&self) -> impl Iterator<Item = (NodeId, SymbolId)> + '_ {
        self.declared.iter().map(|(n, s)| (*n, *s))
    }
}

/// Semantic model of one unit backed by the shared table
#[derive(Debug, Clone, Copy)]
pub struct UnitModel<'a> {
    symbols: &'a SymbolTable,
    bindings: &'a Bindings,
}

impl<'a> UnitModel<'a> {
    pub fn new(symbols: &'a SymbolTable, bindings: &'a Bindings) -> Self {
        Self { symbols, bindings }
    }
}

impl SemanticModel for UnitModel<'_> {
    fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id)
    }

    fn declared_symbol(&self, node: NodeId) -> Option<&Symbol> {
        self.symbols.get(self.bindings.declared(node)?)
    }

    fn symbol_info(&self, node: NodeId) -> Option<&Symbol> {
        self.symbols.get(self.bindings.referenced(node)?)
    }

    fn type_info(&self, node: NodeId) -> Option<&Symbol> {
        self.symbols.get(self.bindings.type_of(node)?)
    }

    fn members(&self, container: SymbolId) -> Vec<&Symbol> {
        SemanticModel::members(self.symbols, container)
    }

    fn special_type(&self, special: SpecialType) -> Option<&Symbol> {
        self.symbols.special_type(special)
    }

    fn symbol_key(&self, id: SymbolId) -> Option<SymbolKey> {
        self.symbols.key(id)
    }
}

/// Compilation-wide view with no node bindings
impl SemanticModel for SymbolTable {
    fn symbol(&self, id: SymbolId) -> Option<&Symbol> {
        self.get(id)
    }

    fn declared_symbol(&self, _node: NodeId) -> Option<&Symbol> {
        None
    }

    fn symbol_info(&self, _node: NodeId) -> Option<&Symbol> {
        None
    }

    fn type_info(&self, _node: NodeId) -> Option<&Symbol> {
        None
    }

    fn members(&self, container: SymbolId) -> Vec<&Symbol> {
        SymbolTable::members(self, container)
            .iter()
            .filter_map(|id| self.get(*id))
            .collect()
    }

    fn special_type(&self, special: SpecialType) -> Option<&Symbol> {
        SymbolTable::special_type(self, special)
    }

    fn symbol_key(&self, id: SymbolId) -> Option<SymbolKey> {
        self.key(id)
    }
}
