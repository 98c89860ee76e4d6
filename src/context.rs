//! Registration and reporting contexts handed to analyzers

use crate::analyzers::helpers::is_in_test_method;
use crate::compilation::{Compilation, SourceUnit};
use crate::diagnostic::{Diagnostic, DiagnosticProperties, Location};
use crate::rule::DiagnosticDescriptor;
use crate::semantic::{SemanticModel, Symbol, SymbolKind, SymbolTable, UnitModel};
use crate::syntax::{LineIndex, NodeId, Span, SyntaxKind, SyntaxNode, SyntaxTree};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

pub type SyntaxNodeAction = Arc<dyn Fn(&SyntaxNodeContext<'_>) + Send + Sync>;
pub type SymbolAction = Arc<dyn Fn(&SymbolContext<'_>) + Send + Sync>;
pub type CompilationStartAction = Arc<dyn Fn(&mut CompilationStartContext<'_>) + Send + Sync>;

/// How an analyzer treats generated code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratedCodeAnalysis {
    /// Run actions on generated units at all
    pub analyze: bool,
    /// Keep diagnostics reported on generated units
    pub report: bool,
}

impl GeneratedCodeAnalysis {
    pub const NONE: Self = Self {
        analyze: false,
        report: false,
    };
    pub const ANALYZE: Self = Self {
        analyze: true,
        report: false,
    };
    pub const ANALYZE_AND_REPORT: Self = Self {
        analyze: true,
        report: true,
    };
}

impl Default for GeneratedCodeAnalysis {
    fn default() -> Self {
        Self::ANALYZE_AND_REPORT
    }
}

/// Actions keyed by the node or symbol kind that triggers them
#[derive(Clone, Default)]
pub struct ActionSet {
    node_actions: HashMap<SyntaxKind, Vec<SyntaxNodeAction>>,
    symbol_actions: HashMap<SymbolKind, Vec<SymbolAction>>,
}

impl ActionSet {
    fn add_node_action(&mut self, action: SyntaxNodeAction, kinds: &[SyntaxKind]) {
        for kind in kinds {
            self.node_actions
                .entry(*kind)
                .or_default()
                .push(Arc::clone(&action));
        }
    }

    fn add_symbol_action(&mut self, action: SymbolAction, kinds: &[SymbolKind]) {
        for kind in kinds {
            self.symbol_actions
                .entry(*kind)
                .or_default()
                .push(Arc::clone(&action));
        }
    }

    fn extend(&mut self, other: ActionSet) {
        for (kind, actions) in other.node_actions {
            self.node_actions.entry(kind).or_default().extend(actions);
        }
        for (kind, actions) in other.symbol_actions {
            self.symbol_actions.entry(kind).or_default().extend(actions);
        }
    }

    pub fn node_actions(&self, kind: SyntaxKind) -> &[SyntaxNodeAction] {
        self.node_actions.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn symbol_actions(&self, kind: SymbolKind) -> &[SymbolAction] {
        self.symbol_actions
            .get(&kind)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has_node_actions(&self) -> bool {
        !self.node_actions.is_empty()
    }

    pub fn has_symbol_actions(&self) -> bool {
        !self.symbol_actions.is_empty()
    }
}

/// What an analyzer declares during `initialize`.
///
/// Only registrations are stored here; nothing runs until the engine starts a
/// pass.
#[derive(Default)]
pub struct AnalysisContext {
    concurrent: bool,
    generated_code: GeneratedCodeAnalysis,
    compilation_start: Vec<CompilationStartAction>,
    actions: ActionSet,
}

impl AnalysisContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow the engine to run this analyzer's actions from several threads
    pub fn enable_concurrent_execution(&mut self) {
        self.concurrent = true;
    }

    pub fn configure_generated_code_analysis(&mut self, mode: GeneratedCodeAnalysis) {
        self.generated_code = mode;
    }

    /// Run once per pass before any node is visited
    pub fn register_compilation_start_action(
        &mut self,
        action: impl Fn(&mut CompilationStartContext<'_>) + Send + Sync + 'static,
    ) {
        self.compilation_start.push(Arc::new(action));
    }

    /// Run for every node of the listed kinds
    pub fn register_syntax_node_action(
        &mut self,
        action: impl Fn(&SyntaxNodeContext<'_>) + Send + Sync + 'static,
        kinds: &[SyntaxKind],
    ) {
        self.actions.add_node_action(Arc::new(action), kinds);
    }

    /// Run once for every declared symbol of the listed kinds
    pub fn register_symbol_action(
        &mut self,
        action: impl Fn(&SymbolContext<'_>) + Send + Sync + 'static,
        kinds: &[SymbolKind],
    ) {
        self.actions.add_symbol_action(Arc::new(action), kinds);
    }

    pub fn is_concurrent(&self) -> bool {
        self.concurrent
    }

    pub fn generated_code(&self) -> GeneratedCodeAnalysis {
        self.generated_code
    }

    /// Run compilation-start actions and return every action for this pass
    pub(crate) fn start(&self, compilation: &Compilation) -> ActionSet {
        let mut actions = self.actions.clone();
        for start in &self.compilation_start {
            let mut context = CompilationStartContext {
                compilation,
                actions: ActionSet::default(),
            };
            start(&mut context);
            actions.extend(context.actions);
        }
        actions
    }
}

/// Handed to compilation-start actions
pub struct CompilationStartContext<'c> {
    compilation: &'c Compilation,
    actions: ActionSet,
}

impl<'c> CompilationStartContext<'c> {
    pub fn compilation(&self) -> &'c Compilation {
        self.compilation
    }

    /// Compilation-wide symbol queries (no node bindings)
    pub fn model(&self) -> &'c dyn SemanticModel {
        &self.compilation.symbols
    }

    pub fn register_syntax_node_action(
        &mut self,
        action: impl Fn(&SyntaxNodeContext<'_>) + Send + Sync + 'static,
        kinds: &[SyntaxKind],
    ) {
        self.actions.add_node_action(Arc::new(action), kinds);
    }

    pub fn register_symbol_action(
        &mut self,
        action: impl Fn(&SymbolContext<'_>) + Send + Sync + 'static,
        kinds: &[SymbolKind],
    ) {
        self.actions.add_symbol_action(Arc::new(action), kinds);
    }
}

/// Shared cancellation flag
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Thread-safe collector for reported diagnostics
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, diagnostic: Diagnostic) {
        self.diagnostics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(diagnostic);
    }

    pub fn len(&self) -> usize {
        self.diagnostics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// One unit prepared for a pass
pub struct AnalysisUnit<'c> {
    unit: &'c SourceUnit,
    model: UnitModel<'c>,
    line_index: LineIndex,
    generated: bool,
}

impl<'c> AnalysisUnit<'c> {
    pub fn new(unit: &'c SourceUnit, symbols: &'c SymbolTable, generated: bool) -> Self {
        Self {
            unit,
            model: unit.model(symbols),
            line_index: unit.tree.line_index(),
            generated,
        }
    }

    pub fn path(&self) -> &'c Path {
        &self.unit.path
    }

    pub fn tree(&self) -> &'c SyntaxTree {
        &self.unit.tree
    }

    pub fn model(&self) -> &UnitModel<'c> {
        &self.model
    }

    pub fn is_generated(&self) -> bool {
        self.generated
    }

    pub fn line_index(&self) -> &LineIndex {
        &self.line_index
    }

    /// Build a located diagnostic from a descriptor
    pub fn diagnostic(
        &self,
        descriptor: &DiagnosticDescriptor,
        span: Span,
        properties: DiagnosticProperties,
        args: &[&str],
    ) -> Diagnostic {
        let location = Location::from_span(self.unit.path.clone(), span, &self.line_index);
        let mut diagnostic = Diagnostic::new(
            descriptor.id,
            descriptor.default_severity,
            &descriptor.format_message(args),
            location,
        )
        .with_properties(properties)
        .with_help(descriptor.description);

        if let Some(line) = self.line_index.line_text(diagnostic.location.line) {
            diagnostic = diagnostic.with_source_line(line);
        }
        if let Some(node) = self.unit.tree.find_node(span).or_else(|| self.token_at(span)) {
            diagnostic = diagnostic.with_test_code(is_in_test_method(node));
        }
        diagnostic
    }

    fn token_at(&self, span: Span) -> Option<SyntaxNode<'c>> {
        self.unit
            .tree
            .root()
            .descendants()
            .find(|n| n.is_token() && n.span() == span)
    }
}

/// Handed to syntax node actions
pub struct SyntaxNodeContext<'a> {
    node: SyntaxNode<'a>,
    unit: &'a AnalysisUnit<'a>,
    sink: &'a DiagnosticSink,
    cancellation: &'a CancellationToken,
    report: bool,
}

impl<'a> SyntaxNodeContext<'a> {
    pub(crate) fn new(
        node: SyntaxNode<'a>,
        unit: &'a AnalysisUnit<'a>,
        sink: &'a DiagnosticSink,
        cancellation: &'a CancellationToken,
        report: bool,
    ) -> Self {
        Self {
            node,
            unit,
            sink,
            cancellation,
            report,
        }
    }

    /// The node that triggered the action
    pub fn node(&self) -> SyntaxNode<'a> {
        self.node
    }

    pub fn model(&self) -> &'a dyn SemanticModel {
        self.unit.model()
    }

    pub fn tree(&self) -> &'a SyntaxTree {
        self.unit.tree()
    }

    pub fn path(&self) -> &'a Path {
        self.unit.path()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub fn report_diagnostic(&self, diagnostic: Diagnostic) {
        if self.report {
            self.sink.push(diagnostic);
        }
    }

    /// Format and report a diagnostic at `span`
    pub fn report(
        &self,
        descriptor: &DiagnosticDescriptor,
        span: Span,
        properties: DiagnosticProperties,
        args: &[&str],
    ) {
        self.report_diagnostic(self.unit.diagnostic(descriptor, span, properties, args));
    }
}

/// Where a symbol is declared
#[derive(Clone, Copy)]
pub struct SymbolDeclaration<'a> {
    pub unit: &'a AnalysisUnit<'a>,
    pub node: NodeId,
}

impl<'a> SymbolDeclaration<'a> {
    pub fn syntax(&self) -> Option<SyntaxNode<'a>> {
        self.unit.tree().node(self.node)
    }
}

/// Handed to symbol actions
pub struct SymbolContext<'a> {
    symbol: &'a Symbol,
    model: &'a dyn SemanticModel,
    declarations: &'a [SymbolDeclaration<'a>],
    sink: &'a DiagnosticSink,
    cancellation: &'a CancellationToken,
    report_generated: bool,
}

impl<'a> SymbolContext<'a> {
    pub(crate) fn new(
        symbol: &'a Symbol,
        model: &'a dyn SemanticModel,
        declarations: &'a [SymbolDeclaration<'a>],
        sink: &'a DiagnosticSink,
        cancellation: &'a CancellationToken,
        report_generated: bool,
    ) -> Self {
        Self {
            symbol,
            model,
            declarations,
            sink,
            cancellation,
            report_generated,
        }
    }

    pub fn symbol(&self) -> &'a Symbol {
        self.symbol
    }

    pub fn model(&self) -> &'a dyn SemanticModel {
        self.model
    }

    /// Every declaration site, one per fragment for partial types
    pub fn declarations(&self) -> &'a [SymbolDeclaration<'a>] {
        self.declarations
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub fn report_diagnostic(&self, diagnostic: Diagnostic) {
        self.sink.push(diagnostic);
    }

    /// Format and report a diagnostic at `span` inside `declaration`
    pub fn report(
        &self,
        declaration: &SymbolDeclaration<'_>,
        descriptor: &DiagnosticDescriptor,
        span: Span,
        properties: DiagnosticProperties,
        args: &[&str],
    ) {
        if declaration.unit.is_generated() && !self.report_generated {
            return;
        }
        self.sink.push(
            declaration
                .unit
                .diagnostic(descriptor, span, properties, args),
        );
    }
}
