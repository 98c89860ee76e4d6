//! SC0003 fix: replace a property-name string literal with `nameof(...)`

use crate::analyzers::helpers::peel_parentheses;
use crate::codefix::{CodeFixProvider, FixError};
use crate::diagnostic::{Diagnostic, DiagnosticProperties};
use crate::syntax::{SyntaxKind, SyntaxTree, TreeBuilder, TreeRewriter};

#[derive(Debug, Default)]
pub struct NameOfFix;

impl NameOfFix {
    fn property_name(diagnostic: &Diagnostic) -> Result<&str, FixError> {
        match &diagnostic.properties {
            DiagnosticProperties::NameOfCandidate { property_name } => Ok(property_name.as_str()),
            _ => Err(FixError::MissingProperties {
                rule_id: diagnostic.rule_id.clone(),
            }),
        }
    }
}

impl CodeFixProvider for NameOfFix {
    fn fixable_diagnostic_ids(&self) -> &'static [&'static str] {
        &["SC0003"]
    }

    fn title(&self, diagnostic: &Diagnostic) -> String {
        match Self::property_name(diagnostic) {
            Ok(name) => format!("Use nameof({})", name),
            Err(_) => "Use nameof".to_string(),
        }
    }

    fn provide_fix(&self, tree: &SyntaxTree, diagnostic: &Diagnostic) -> Result<SyntaxTree, FixError> {
        self.check_rule(diagnostic)?;
        let property_name = Self::property_name(diagnostic)?;
        let span = diagnostic.span();

        let found = tree
            .find_node(span)
            .ok_or_else(|| FixError::not_applicable(span, "no node at diagnostic span"))?;
        let literal = peel_parentheses(found);
        if literal.kind() != SyntaxKind::LiteralExpression
            || literal.child_of_kind(SyntaxKind::StringLiteralToken).is_none()
        {
            return Err(FixError::WrongNode {
                expected: SyntaxKind::LiteralExpression,
                span,
            });
        }

        let mut b = TreeBuilder::new();
        b.nameof_expression(property_name);
        let replacement = b.finish()?;

        log::trace!("{}: {} -> nameof({})", span, literal.text(), property_name);
        Ok(TreeRewriter::new(tree).replace(literal.id(), replacement).finish()?)
    }
}
