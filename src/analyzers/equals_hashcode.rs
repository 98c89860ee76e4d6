//! SC0001: Equals(object) and GetHashCode() overridden together

use super::helpers::declaration_identifier;
use crate::analyzer::Analyzer;
use crate::context::{AnalysisContext, GeneratedCodeAnalysis, SyntaxNodeContext};
use crate::diagnostic::{DiagnosticProperties, Severity};
use crate::rule::{DiagnosticDescriptor, RuleCategory};
use crate::semantic::{SemanticModel, SpecialType, SymbolKey};
use crate::syntax::SyntaxKind;

pub static EQUALS_AND_GET_HASH_CODE: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "SC0001",
    name: "equals-and-get-hash-code",
    title: "Implement Equals() and GetHashcode() together.",
    message_format: "Equals() and GetHashcode() must be implemented together.",
    category: RuleCategory::Correctness,
    default_severity: Severity::Warning,
    enabled_by_default: true,
    description: "A class that overrides only one of Equals(object) and GetHashCode() breaks \
                  hashing: equal instances can end up in different buckets.",
    help_link: None,
    example_bad: Some(
        "class Point\n{\n    public override bool Equals(object obj) => obj is Point;\n}",
    ),
    example_good: Some(
        "class Point\n{\n    public override bool Equals(object obj) => obj is Point;\n    \
         public override int GetHashCode() => 0;\n}",
    ),
};

static SUPPORTED: &[&DiagnosticDescriptor] = &[&EQUALS_AND_GET_HASH_CODE];

/// Flags classes that override exactly one of the Equals/GetHashCode pair.
///
/// Only the members of the visited declaration fragment are scanned, so a
/// partial class that splits the pair across fragments is reported.
#[derive(Debug, Default)]
pub struct EqualsHashCodeAnalyzer;

/// Canonical `object` members resolved at compilation start
#[derive(Debug, Default)]
struct ObjectMembers {
    equals: Option<SymbolKey>,
    get_hash_code: Option<SymbolKey>,
}

impl ObjectMembers {
    fn resolve(model: &dyn SemanticModel) -> Self {
        let Some(object) = model.special_type(SpecialType::Object) else {
            log::debug!("no special object type; {} will never match", EQUALS_AND_GET_HASH_CODE.id);
            return Self::default();
        };
        let members = model.members(object.id);
        let find = |name: &str, parameters: usize| {
            members
                .iter()
                .find(|m| m.is_method() && m.name == name && m.parameter_count == parameters)
                .and_then(|m| model.symbol_key(m.id))
        };
        Self {
            equals: find("Equals", 1),
            get_hash_code: find("GetHashCode", 0),
        }
    }
}

impl Analyzer for EqualsHashCodeAnalyzer {
    fn name(&self) -> &str {
        "equals-hashcode"
    }

    fn supported_diagnostics(&self) -> &'static [&'static DiagnosticDescriptor] {
        SUPPORTED
    }

    fn initialize(&self, context: &mut AnalysisContext) {
        context.enable_concurrent_execution();
        context.configure_generated_code_analysis(GeneratedCodeAnalysis::ANALYZE_AND_REPORT);
        context.register_compilation_start_action(|start| {
            let canonical = ObjectMembers::resolve(start.model());
            start.register_syntax_node_action(
                move |ctx| analyze_class(ctx, &canonical),
                &[SyntaxKind::ClassDeclaration],
            );
        });
    }
}

fn analyze_class(ctx: &SyntaxNodeContext<'_>, canonical: &ObjectMembers) {
    let class = ctx.node();
    let model = ctx.model();

    let mut equals_implemented = false;
    let mut get_hash_code_implemented = false;

    let overrides = class.child_nodes().filter(|member| {
        member.kind() == SyntaxKind::MethodDeclaration
            && member.has_modifier(SyntaxKind::OverrideKeyword)
    });
    for method in overrides {
        let Some(declared) = model.declared_symbol(method.id()) else {
            log::debug!("unbound override at {}; skipping class", method.span());
            return;
        };
        let Some(root) = model.override_root(declared.id) else {
            log::debug!("override chain of {} does not resolve; skipping class", declared.name);
            return;
        };
        let Some(key) = model.symbol_key(root.id) else {
            return;
        };

        if canonical.equals.as_ref() == Some(&key) {
            equals_implemented = true;
        } else if canonical.get_hash_code.as_ref() == Some(&key) {
            get_hash_code_implemented = true;
        }
    }

    if equals_implemented == get_hash_code_implemented {
        return;
    }
    let Some(identifier) = declaration_identifier(class) else {
        return;
    };
    ctx.report(
        &EQUALS_AND_GET_HASH_CODE,
        identifier.span(),
        DiagnosticProperties::PairedOverride { equals_implemented },
        &[],
    );
}
