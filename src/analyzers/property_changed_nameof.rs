//! SC0003: OnPropertyChanged called with a property name as a string

use super::helpers::{identifier_text, peel_parentheses};
use crate::analyzer::Analyzer;
use crate::context::{AnalysisContext, GeneratedCodeAnalysis, SyntaxNodeContext};
use crate::diagnostic::{DiagnosticProperties, Severity};
use crate::rule::{DiagnosticDescriptor, RuleCategory};
use crate::semantic::SymbolKind;
use crate::syntax::{string_literal_value, SyntaxKind, SyntaxNode};

pub static ON_PROPERTY_CHANGED_WITHOUT_NAMEOF: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "SC0003",
    name: "on-property-changed-without-nameof",
    title: "Use the nameof() operator in conjunction with OnPropertyChanged()",
    message_format: "OnPropertyChanged({0}) can use the nameof() operator.",
    category: RuleCategory::Style,
    default_severity: Severity::Warning,
    enabled_by_default: true,
    description: "Passing the property name as a string literal silently breaks when the \
                  property is renamed. nameof() keeps the two in sync.",
    help_link: None,
    example_bad: Some("OnPropertyChanged(\"IsEnabled\");"),
    example_good: Some("OnPropertyChanged(nameof(IsEnabled));"),
};

static SUPPORTED: &[&DiagnosticDescriptor] = &[&ON_PROPERTY_CHANGED_WITHOUT_NAMEOF];

/// Name of the notification method this rule looks for
const NOTIFY_METHOD: &str = "OnPropertyChanged";

/// Flags `OnPropertyChanged("Name")` where `Name` is a property of the class
#[derive(Debug, Default)]
pub struct PropertyChangedNameOfAnalyzer;

impl Analyzer for PropertyChangedNameOfAnalyzer {
    fn name(&self) -> &str {
        "property-changed-nameof"
    }

    fn supported_diagnostics(&self) -> &'static [&'static DiagnosticDescriptor] {
        SUPPORTED
    }

    fn initialize(&self, context: &mut AnalysisContext) {
        context.enable_concurrent_execution();
        context.configure_generated_code_analysis(GeneratedCodeAnalysis::ANALYZE_AND_REPORT);
        context.register_syntax_node_action(analyze_invocation, &[SyntaxKind::InvocationExpression]);
    }
}

/// First argument's string literal, looking through parentheses
fn literal_argument(invocation: SyntaxNode<'_>) -> Option<SyntaxNode<'_>> {
    let arguments = invocation.child_of_kind(SyntaxKind::ArgumentList)?;
    let first = arguments
        .child_nodes()
        .find(|n| n.kind() == SyntaxKind::Argument)?;
    let expression = peel_parentheses(first.child_nodes().next()?);
    let is_string = expression.kind() == SyntaxKind::LiteralExpression
        && expression
            .child_of_kind(SyntaxKind::StringLiteralToken)
            .is_some();
    is_string.then_some(expression)
}

fn analyze_invocation(ctx: &SyntaxNodeContext<'_>) {
    let invocation = ctx.node();
    let model = ctx.model();

    let callee = invocation.child_nodes().next();
    if callee.and_then(identifier_text) != Some(NOTIFY_METHOD) {
        return;
    }
    let Some(literal) = literal_argument(invocation) else {
        return;
    };
    let Some(value) = literal
        .child_of_kind(SyntaxKind::StringLiteralToken)
        .and_then(|token| string_literal_value(token.token_text()))
    else {
        return;
    };

    let Some(class) = invocation
        .ancestors()
        .find(|n| n.kind() == SyntaxKind::ClassDeclaration)
    else {
        return;
    };
    let Some(class_symbol) = model.declared_symbol(class.id()) else {
        log::debug!("enclosing class of {} is unbound", NOTIFY_METHOD);
        return;
    };

    let wanted = value.to_lowercase();
    let Some(property) = model
        .members(class_symbol.id)
        .into_iter()
        .find(|m| m.kind == SymbolKind::Property && m.name.to_lowercase() == wanted)
    else {
        return;
    };

    ctx.report(
        &ON_PROPERTY_CHANGED_WITHOUT_NAMEOF,
        literal.span(),
        DiagnosticProperties::NameOfCandidate {
            property_name: property.name.clone(),
        },
        &[property.name.as_str()],
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{SyntaxTree, TreeBuilder};

    fn invocation(build_args: impl FnOnce(&mut TreeBuilder)) -> SyntaxTree {
        let mut b = TreeBuilder::new();
        b.node(SyntaxKind::InvocationExpression, |b| {
            b.identifier_name(NOTIFY_METHOD);
            b.node(SyntaxKind::ArgumentList, |b| {
                b.fixed_token(SyntaxKind::OpenParenToken);
                build_args(b);
                b.fixed_token(SyntaxKind::CloseParenToken);
            });
        });
        b.finish().unwrap()
    }

    #[test]
    fn test_literal_argument_through_parentheses() {
        let tree = invocation(|b| {
            b.node(SyntaxKind::Argument, |b| {
                b.parenthesized(|b| {
                    b.parenthesized(|b| {
                        b.string_literal("IsEnabled");
                    });
                });
            });
        });
        let literal = literal_argument(tree.root()).unwrap();
        assert_eq!(literal.text(), "\"IsEnabled\"");
    }

    #[test]
    fn test_nameof_argument_is_not_a_literal() {
        let tree = invocation(|b| {
            b.node(SyntaxKind::Argument, |b| {
                b.nameof_expression("IsEnabled");
            });
        });
        assert!(literal_argument(tree.root()).is_none());
    }

    #[test]
    fn test_only_first_argument_is_considered() {
        let tree = invocation(|b| {
            b.node(SyntaxKind::Argument, |b| {
                b.bool_literal(true);
            });
            b.fixed_token(SyntaxKind::CommaToken);
            b.node(SyntaxKind::Argument, |b| {
                b.string_literal("IsEnabled");
            });
        });
        assert!(literal_argument(tree.root()).is_none());
    }

    #[test]
    fn test_message_uses_property_name() {
        assert_eq!(
            ON_PROPERTY_CHANGED_WITHOUT_NAMEOF.format_message(&["IsEnabled"]),
            "OnPropertyChanged(IsEnabled) can use the nameof() operator."
        );
    }
}
