//! Code fix provider trait

use crate::diagnostic::{Diagnostic, FixSafety};
use crate::syntax::{Span, SyntaxKind, SyntaxTree, TreeError};
use thiserror::Error;

/// Why a fix could not be produced. Every variant means "not applicable";
/// the input tree is never modified.
#[derive(Debug, Error)]
pub enum FixError {
    #[error("fix not applicable at {span}: {reason}")]
    NotApplicable { span: Span, reason: String },

    #[error("expected {expected} at {span}")]
    WrongNode { expected: SyntaxKind, span: Span },

    #[error("diagnostic {rule_id} carries no properties for its fix")]
    MissingProperties { rule_id: String },

    #[error("rule {rule_id} is not handled by this fix")]
    UnsupportedRule { rule_id: String },

    #[error("rewrite failed: {0}")]
    Tree(#[from] TreeError),
}

impl FixError {
    pub fn not_applicable(span: Span, reason: impl Into<String>) -> Self {
        FixError::NotApplicable {
            span,
            reason: reason.into(),
        }
    }
}

/// Mechanical rewrite for one or more rules.
///
/// A provider receives one diagnostic and the tree it was reported on and
/// returns a single corrected tree.
pub trait CodeFixProvider: Send + Sync {
    /// Rule ids this provider can fix
    fn fixable_diagnostic_ids(&self) -> &'static [&'static str];

    /// Human-readable description of the edit
    fn title(&self, diagnostic: &Diagnostic) -> String;

    fn safety(&self) -> FixSafety {
        FixSafety::Safe
    }

    fn provide_fix(&self, tree: &SyntaxTree, diagnostic: &Diagnostic)
        -> Result<SyntaxTree, FixError>;

    fn can_fix(&self, rule_id: &str) -> bool {
        self.fixable_diagnostic_ids().contains(&rule_id)
    }

    /// Reject diagnostics of other rules
    fn check_rule(&self, diagnostic: &Diagnostic) -> Result<(), FixError> {
        if self.can_fix(&diagnostic.rule_id) {
            Ok(())
        } else {
            Err(FixError::UnsupportedRule {
                rule_id: diagnostic.rule_id.clone(),
            })
        }
    }
}
