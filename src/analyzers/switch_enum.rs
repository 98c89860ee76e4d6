//! SC0002: switch statements over an enum that miss members

use super::helpers::switch_expression;
use crate::analyzer::Analyzer;
use crate::context::{AnalysisContext, GeneratedCodeAnalysis, SyntaxNodeContext};
use crate::diagnostic::{DiagnosticProperties, Severity};
use crate::rule::{DiagnosticDescriptor, RuleCategory};
use crate::syntax::SyntaxKind;
use std::collections::HashSet;

pub static SWITCH_MISSING_ENUM_MEMBER: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "SC0002",
    name: "switch-missing-enum-member",
    title: "Add cases for missing enum member.",
    message_format: "Missing enum member in switched cases.",
    category: RuleCategory::Correctness,
    default_severity: Severity::Warning,
    enabled_by_default: true,
    description: "A switch over an enum should name every member explicitly. A default \
                  section does not count, so newly added members are noticed.",
    help_link: None,
    example_bad: Some(
        "switch (color)\n{\n    case Color.Red:\n        break;\n    default:\n        break;\n}",
    ),
    example_good: Some(
        "switch (color)\n{\n    case Color.Red:\n        break;\n    case Color.Green:\n        \
         break;\n}",
    ),
};

static SUPPORTED: &[&DiagnosticDescriptor] = &[&SWITCH_MISSING_ENUM_MEMBER];

/// Flags switch statements over an enum that do not name every member
#[derive(Debug, Default)]
pub struct SwitchEnumAnalyzer;

impl Analyzer for SwitchEnumAnalyzer {
    fn name(&self) -> &str {
        "switch-enum"
    }

    fn supported_diagnostics(&self) -> &'static [&'static DiagnosticDescriptor] {
        SUPPORTED
    }

    fn initialize(&self, context: &mut AnalysisContext) {
        context.enable_concurrent_execution();
        context.configure_generated_code_analysis(GeneratedCodeAnalysis::ANALYZE_AND_REPORT);
        context.register_syntax_node_action(analyze_switch, &[SyntaxKind::SwitchStatement]);
    }
}

fn analyze_switch(ctx: &SyntaxNodeContext<'_>) {
    let switch = ctx.node();
    let model = ctx.model();

    let Some(expression) = switch_expression(switch) else {
        return;
    };
    let Some(enum_type) = model.type_info(expression.id()) else {
        return;
    };
    if !enum_type.is_enum() {
        return;
    }

    // Pattern labels (including `when` guards) and `default` cover nothing
    let mut covered = HashSet::new();
    let labels = switch
        .child_nodes()
        .filter(|n| n.kind() == SyntaxKind::SwitchSection)
        .flat_map(|section| section.child_nodes())
        .filter(|label| label.kind() == SyntaxKind::CaseSwitchLabel);
    for label in labels {
        let Some(value) = label.child_nodes().next() else {
            return;
        };
        let Some(key) = model
            .symbol_info(value.id())
            .and_then(|symbol| model.symbol_key(symbol.id))
        else {
            log::debug!(
                "case label '{}' does not resolve to a symbol; skipping switch",
                value.text()
            );
            return;
        };
        covered.insert(key);
    }

    let missing: Vec<String> = model
        .members(enum_type.id)
        .into_iter()
        .filter(|member| !member.implicitly_declared)
        .filter(|member| {
            model
                .symbol_key(member.id)
                .map_or(true, |key| !covered.contains(&key))
        })
        .map(|member| member.name.clone())
        .collect();
    if missing.is_empty() {
        return;
    }

    ctx.report(
        &SWITCH_MISSING_ENUM_MEMBER,
        expression.span(),
        DiagnosticProperties::MissingEnumCases {
            enum_name: enum_type.name.clone(),
            missing_members: missing,
        },
        &[],
    );
}
