//! Analyzer trait

use crate::context::AnalysisContext;
use crate::rule::DiagnosticDescriptor;

/// One rule checker.
///
/// Analyzers hold no mutable state. Anything they compute per pass is
/// captured by the closures they register at compilation start.
pub trait Analyzer: Send + Sync {
    /// Identifier used in logs and timings (e.g., "switch-enum")
    fn name(&self) -> &str;

    /// Descriptors for every diagnostic this analyzer can report
    fn supported_diagnostics(&self) -> &'static [&'static DiagnosticDescriptor];

    /// Register actions
    fn initialize(&self, context: &mut AnalysisContext);

    /// Whether any of this analyzer's rules matches `rule_id`
    fn supports(&self, rule_id: &str) -> bool {
        self.supported_diagnostics().iter().any(|d| d.id == rule_id)
    }
}
