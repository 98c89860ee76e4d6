//! Process-wide rule registry

use crate::analyzer::Analyzer;
use crate::analyzers::builtin_analyzers;
use crate::rule::DiagnosticDescriptor;
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

/// Descriptors keyed by rule id
#[derive(Debug, Default)]
pub struct RuleRegistry {
    rules: BTreeMap<&'static str, &'static DiagnosticDescriptor>,
}

impl RuleRegistry {
    /// Collect descriptors from a set of analyzers. The first descriptor wins
    /// when two analyzers claim the same id.
    pub fn from_analyzers(analyzers: &[Arc<dyn Analyzer>]) -> Self {
        let mut rules = BTreeMap::new();
        for analyzer in analyzers {
            for descriptor in analyzer.supported_diagnostics() {
                if rules.contains_key(descriptor.id) {
                    log::warn!(
                        "rule {} from analyzer '{}' is already registered",
                        descriptor.id,
                        analyzer.name()
                    );
                    continue;
                }
                rules.insert(descriptor.id, *descriptor);
            }
        }
        Self { rules }
    }

    pub fn get(&self, rule_id: &str) -> Option<&'static DiagnosticDescriptor> {
        self.rules.get(rule_id).copied()
    }

    /// Look up by id or by name, ignoring case
    pub fn find(&self, query: &str) -> Option<&'static DiagnosticDescriptor> {
        self.get(query).or_else(|| {
            self.rules
                .values()
                .copied()
                .find(|d| d.id.eq_ignore_ascii_case(query) || d.name.eq_ignore_ascii_case(query))
        })
    }

    /// Descriptors in rule id order
    pub fn iter(&self) -> impl Iterator<Item = &'static DiagnosticDescriptor> + '_ {
        self.rules.values().copied()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Registry of the built-in rules, built on first use
pub fn registry() -> &'static RuleRegistry {
    static REGISTRY: OnceLock<RuleRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| RuleRegistry::from_analyzers(&builtin_analyzers()))
}
