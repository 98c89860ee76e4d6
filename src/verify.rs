//! Assertions for analyzer and code fix tests
//!
//! ```ignore
//! let expected = [ExpectedDiagnostic::new("SC0002", span).at("Shapes.cs")];
//! verify::expect_diagnostics(Arc::new(SwitchEnumAnalyzer), &compilation, &expected)?;
//! verify::expect_fix(Arc::new(SwitchEnumAnalyzer), Arc::new(AddMissingCasesFix), &before, &after)?;
//! ```

use crate::analyzer::Analyzer;
use crate::codefix::CodeFixProvider;
use crate::compilation::Compilation;
use crate::config::{Config, ConfigError};
use crate::diagnostic::{Diagnostic, DiagnosticProperties};
use crate::engine::Engine;
use crate::fixer::{generate_unified_diff, Fixer};
use crate::syntax::Span;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// A failed expectation
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("expected {expected} diagnostic(s), found {actual}:\n{found}")]
    CountMismatch {
        expected: usize,
        actual: usize,
        found: String,
    },

    #[error("diagnostic #{index}: expected {expected}, found {actual}")]
    Mismatch {
        index: usize,
        expected: String,
        actual: String,
    },

    #[error("analyzer reported nothing that {rule_ids} can fix")]
    NothingToFix { rule_ids: String },

    #[error("fix failed: {0}")]
    FixFailed(String),

    #[error("{} not present in expected compilation", .0.display())]
    MissingUnit(PathBuf),

    #[error("fixed text of {} differs from expected:\n{diff}", path.display())]
    TextMismatch { path: PathBuf, diff: String },

    #[error("fix is not idempotent: {count} fixable diagnostic(s) remain after fixing")]
    NotIdempotent { count: usize },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// What a test expects one diagnostic to look like
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedDiagnostic {
    pub rule_id: String,
    pub span: Span,
    pub path: Option<PathBuf>,
    pub message: Option<String>,
    pub properties: Option<DiagnosticProperties>,
}

impl ExpectedDiagnostic {
    pub fn new(rule_id: &str, span: Span) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            span,
            path: None,
            message: None,
            properties: None,
        }
    }

    /// Require the diagnostic to be in `path`
    pub fn at(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }

    pub fn with_properties(mut self, properties: DiagnosticProperties) -> Self {
        self.properties = Some(properties);
        self
    }

    fn matches(&self, diagnostic: &Diagnostic) -> bool {
        diagnostic.rule_id == self.rule_id
            && diagnostic.span() == self.span
            && self.path.as_ref().map_or(true, |p| *p == diagnostic.location.file)
            && self.message.as_ref().map_or(true, |m| *m == diagnostic.message)
            && self
                .properties
                .as_ref()
                .map_or(true, |p| *p == diagnostic.properties)
    }
}

impl fmt::Display for ExpectedDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.rule_id, self.span)?;
        if let Some(path) = &self.path {
            write!(f, " in {}", path.display())?;
        }
        if let Some(message) = &self.message {
            write!(f, " \"{}\"", message)?;
        }
        if let Some(properties) = &self.properties {
            write!(f, " {:?}", properties.to_bag())?;
        }
        Ok(())
    }
}

fn describe(diagnostic: &Diagnostic) -> String {
    format!(
        "{} at {} in {} \"{}\" {:?}",
        diagnostic.rule_id,
        diagnostic.span(),
        diagnostic.location.file.display(),
        diagnostic.message,
        diagnostic.properties.to_bag()
    )
}

/// Run one analyzer with all of its rules enabled
pub fn run_analyzer(
    analyzer: Arc<dyn Analyzer>,
    compilation: &Compilation,
) -> Result<Vec<Diagnostic>, VerifyError> {
    let mut config = Config::new();
    config.rules.enabled = analyzer
        .supported_diagnostics()
        .iter()
        .map(|d| d.id.to_string())
        .collect();
    let mut engine = Engine::new(config)?;
    engine.register_analyzer(analyzer);
    Ok(engine.analyze(compilation).diagnostics)
}

/// Assert that `analyzer` reports exactly `expected`, in source order
pub fn expect_diagnostics(
    analyzer: Arc<dyn Analyzer>,
    compilation: &Compilation,
    expected: &[ExpectedDiagnostic],
) -> Result<(), VerifyError> {
    let actual = run_analyzer(analyzer, compilation)?;
    if actual.len() != expected.len() {
        return Err(VerifyError::CountMismatch {
            expected: expected.len(),
            actual: actual.len(),
            found: actual
                .iter()
                .map(|d| format!("  {}\n", describe(d)))
                .collect(),
        });
    }

    let mut expected: Vec<&ExpectedDiagnostic> = expected.iter().collect();
    expected.sort_by(|a, b| {
        a.path
            .cmp(&b.path)
            .then(a.span.start.cmp(&b.span.start))
            .then(a.span.end.cmp(&b.span.end))
            .then(a.rule_id.cmp(&b.rule_id))
    });
    for (index, (want, got)) in expected.iter().zip(&actual).enumerate() {
        if !want.matches(got) {
            return Err(VerifyError::Mismatch {
                index,
                expected: want.to_string(),
                actual: describe(got),
            });
        }
    }
    Ok(())
}

/// Assert that fixing every diagnostic `analyzer` reports on `before` turns
/// each unit into the matching unit of `after`, and that `after` leaves the
/// provider nothing to fix.
pub fn expect_fix(
    analyzer: Arc<dyn Analyzer>,
    provider: Arc<dyn CodeFixProvider>,
    before: &Compilation,
    after: &Compilation,
) -> Result<(), VerifyError> {
    let fixable = |diagnostics: Vec<Diagnostic>| -> Vec<Diagnostic> {
        diagnostics
            .into_iter()
            .filter(|d| provider.can_fix(&d.rule_id))
            .collect()
    };

    let diagnostics = fixable(run_analyzer(Arc::clone(&analyzer), before)?);
    if diagnostics.is_empty() {
        return Err(VerifyError::NothingToFix {
            rule_ids: provider.fixable_diagnostic_ids().join(", "),
        });
    }

    let mut fixer = Fixer::new(vec![Arc::clone(&provider)]).with_unsafe_fixes(true);
    fixer.collect_from_diagnostics(&diagnostics);
    let result = fixer.apply_all(before);
    if !result.errors.is_empty() {
        return Err(VerifyError::FixFailed(result.errors.join("\n")));
    }

    for unit in &before.units {
        let expected = after
            .unit(&unit.path)
            .ok_or_else(|| VerifyError::MissingUnit(unit.path.clone()))?
            .tree
            .text();
        let actual = result
            .fixed
            .get(&unit.path)
            .map(|tree| tree.text())
            .unwrap_or_else(|| unit.tree.text());
        if actual != expected {
            return Err(VerifyError::TextMismatch {
                path: unit.path.clone(),
                diff: generate_unified_diff(&unit.path, &expected, &actual),
            });
        }
    }

    let remaining = fixable(run_analyzer(analyzer, after)?);
    if !remaining.is_empty() {
        return Err(VerifyError::NotIdempotent {
            count: remaining.len(),
        });
    }
    Ok(())
}
