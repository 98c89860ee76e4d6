//! Syntax helpers shared by analyzers and fixes

use crate::syntax::{SyntaxKind, SyntaxNode};

/// Attribute names that mark a test method
const TEST_ATTRIBUTES: &[&str] = &["Test", "TestMethod", "Fact", "Theory"];

/// Whether a method carries a test attribute in its first attribute list
pub fn has_test_attribute(method: SyntaxNode<'_>) -> bool {
    let Some(list) = method.child_of_kind(SyntaxKind::AttributeList) else {
        return false;
    };
    list.child_nodes()
        .filter(|a| a.kind() == SyntaxKind::Attribute)
        .filter_map(|a| a.child_of_kind(SyntaxKind::IdentifierName))
        .filter_map(identifier_text)
        .any(|name| {
            let name = name.strip_suffix("Attribute").unwrap_or(name);
            TEST_ATTRIBUTES.contains(&name)
        })
}

/// Whether `node` sits inside (or is) a test method
pub fn is_in_test_method(node: SyntaxNode<'_>) -> bool {
    std::iter::once(node)
        .chain(node.ancestors())
        .find(|n| n.kind() == SyntaxKind::MethodDeclaration)
        .is_some_and(has_test_attribute)
}

/// Strip any number of enclosing parentheses
pub fn peel_parentheses(mut node: SyntaxNode<'_>) -> SyntaxNode<'_> {
    while node.kind() == SyntaxKind::ParenthesizedExpression {
        match node.child_nodes().next() {
            Some(inner) => node = inner,
            None => break,
        }
    }
    node
}

/// Text of an `IdentifierName` node
pub fn identifier_text(node: SyntaxNode<'_>) -> Option<&str> {
    if node.kind() != SyntaxKind::IdentifierName {
        return None;
    }
    node.child_of_kind(SyntaxKind::IdentifierToken)
        .map(|t| t.token_text())
}

/// Name token of a type or member declaration
pub fn declaration_identifier(node: SyntaxNode<'_>) -> Option<SyntaxNode<'_>> {
    node.child_of_kind(SyntaxKind::IdentifierToken)
}

/// Governing expression of a switch statement
pub fn switch_expression(switch: SyntaxNode<'_>) -> Option<SyntaxNode<'_>> {
    if switch.kind() != SyntaxKind::SwitchStatement {
        return None;
    }
    switch
        .child_nodes()
        .find(|n| n.kind() != SyntaxKind::SwitchSection)
}
