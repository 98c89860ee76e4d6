//! SC0002 fix: add a throwing section for every uncovered enum member

use crate::analyzers::helpers::switch_expression;
use crate::codefix::{CodeFixProvider, FixError};
use crate::diagnostic::{Diagnostic, DiagnosticProperties, FixSafety};
use crate::syntax::{SyntaxKind, SyntaxNode, SyntaxTree, TreeBuilder, TreeRewriter};

const INDENT: &str = "    ";

#[derive(Debug, Default)]
pub struct AddMissingCasesFix;

/// Where new sections go and how they are indented
struct Insertion {
    index: usize,
    section_indent: String,
    statement_indent: String,
}

impl Insertion {
    fn for_switch(switch: SyntaxNode<'_>) -> Self {
        let sections: Vec<_> = switch
            .child_nodes()
            .filter(|n| n.kind() == SyntaxKind::SwitchSection)
            .collect();
        let close_brace = switch.child_of_kind(SyntaxKind::CloseBraceToken);

        let default_section = sections.iter().find(|s| {
            s.child_nodes()
                .any(|label| label.kind() == SyntaxKind::DefaultSwitchLabel)
        });
        let index = default_section
            .or(close_brace.as_ref())
            .and_then(|n| n.index_in_parent())
            .unwrap_or_else(|| switch.children().count());

        let (section_indent, statement_indent) = match sections.first() {
            Some(first) => {
                let section = first.leading_trivia().to_string();
                let statement = first
                    .child_nodes()
                    .find(|n| !is_label(n.kind()))
                    .map(|s| s.leading_trivia().to_string())
                    .unwrap_or_else(|| format!("{}{}", section, INDENT));
                (section, statement)
            }
            None => {
                let closing = close_brace.map(|t| t.leading_trivia()).unwrap_or("\n");
                let section = format!("{}{}", closing, INDENT);
                let statement = format!("{}{}", section, INDENT);
                (section, statement)
            }
        };

        Self {
            index,
            section_indent,
            statement_indent,
        }
    }
}

fn is_label(kind: SyntaxKind) -> bool {
    matches!(
        kind,
        SyntaxKind::CaseSwitchLabel | SyntaxKind::CasePatternSwitchLabel | SyntaxKind::DefaultSwitchLabel
    )
}

impl CodeFixProvider for AddMissingCasesFix {
    fn fixable_diagnostic_ids(&self) -> &'static [&'static str] {
        &["SC0002"]
    }

    fn title(&self, diagnostic: &Diagnostic) -> String {
        match &diagnostic.properties {
            DiagnosticProperties::MissingEnumCases {
                missing_members, ..
            } if missing_members.len() == 1 => format!("Add case for {}", missing_members[0]),
            DiagnosticProperties::MissingEnumCases {
                missing_members, ..
            } => format!("Add {} missing cases", missing_members.len()),
            _ => "Add missing cases".to_string(),
        }
    }

    fn safety(&self) -> FixSafety {
        FixSafety::Unsafe
    }

    fn provide_fix(&self, tree: &SyntaxTree, diagnostic: &Diagnostic) -> Result<SyntaxTree, FixError> {
        self.check_rule(diagnostic)?;
        let DiagnosticProperties::MissingEnumCases {
            enum_name,
            missing_members,
        } = &diagnostic.properties
        else {
            return Err(FixError::MissingProperties {
                rule_id: diagnostic.rule_id.clone(),
            });
        };
        let span = diagnostic.span();
        if missing_members.is_empty() {
            return Err(FixError::not_applicable(span, "no missing members"));
        }

        let expression = tree
            .find_node(span)
            .ok_or_else(|| FixError::not_applicable(span, "no node at diagnostic span"))?;
        let switch = std::iter::once(expression)
            .chain(expression.ancestors())
            .find(|n| {
                n.kind() == SyntaxKind::SwitchStatement
                    && switch_expression(*n).is_some_and(|e| e.span() == span)
            })
            .ok_or(FixError::WrongNode {
                expected: SyntaxKind::SwitchStatement,
                span,
            })?;

        let insertion = Insertion::for_switch(switch);
        let mut rewriter = TreeRewriter::new(tree);
        for member in missing_members {
            let mut b = TreeBuilder::new();
            b.missing_case_section(
                enum_name,
                member,
                &insertion.section_indent,
                &insertion.statement_indent,
            );
            rewriter.insert(switch.id(), insertion.index, b.finish()?);
        }
        log::trace!(
            "{}: adding {} case(s) for {}",
            span,
            missing_members.len(),
            enum_name
        );
        Ok(rewriter.finish()?)
    }
}
