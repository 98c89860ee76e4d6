//! Compilation input and host snapshots

use crate::semantic::{Bindings, SymbolTable, UnitModel};
use crate::syntax::SyntaxTree;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error reading or writing a compilation snapshot
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

/// One source file: its tree and the host's bindings for it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceUnit {
    pub path: PathBuf,
    pub tree: SyntaxTree,
    #[serde(default)]
    pub bindings: Bindings,
    /// Host marked the file as generated
    #[serde(default)]
    pub generated: bool,
}

impl SourceUnit {
    pub fn new(path: impl Into<PathBuf>, tree: SyntaxTree, bindings: Bindings) -> Self {
        Self {
            path: path.into(),
            tree,
            bindings,
            generated: false,
        }
    }

    pub fn with_generated(mut self, generated: bool) -> Self {
        self.generated = generated;
        self
    }

    /// Semantic model for this unit
    pub fn model<'a>(&'a self, symbols: &'a SymbolTable) -> UnitModel<'a> {
        UnitModel::new(symbols, &self.bindings)
    }
}

/// Everything one analysis pass reads
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Compilation {
    #[serde(default)]
    pub symbols: SymbolTable,
    #[serde(default)]
    pub units: Vec<SourceUnit>,
}

impl Compilation {
    pub fn new(symbols: SymbolTable) -> Self {
        Self {
            symbols,
            units: Vec::new(),
        }
    }

    pub fn with_unit(mut self, unit: SourceUnit) -> Self {
        self.units.push(unit);
        self
    }

    pub fn unit(&self, path: &Path) -> Option<&SourceUnit> {
        self.units.iter().find(|u| u.path == path)
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read a snapshot exported by the host
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let content = std::fs::read_to_string(path)?;
        let compilation = Self::from_json(&content)?;
        log::debug!(
            "loaded {} unit(s) and {} symbol(s) from {}",
            compilation.units.len(),
            compilation.symbols.len(),
            path.display()
        );
        Ok(compilation)
    }

    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
