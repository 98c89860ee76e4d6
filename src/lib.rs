//! Sharpcheck - analyzer and code-fix engine for C#-shaped syntax trees
//!
//! Rule checkers ("analyzers") inspect an immutable syntax tree plus the
//! host's symbol bindings and report located diagnostics. Code fixes consume
//! one diagnostic and produce a rewritten tree. Sharpcheck never parses or
//! binds source itself: the host builds trees with [`syntax::TreeBuilder`] or
//! exports a JSON snapshot of a [`Compilation`].
//!
//! # Architecture
//!
//! ```text
//! Host -> Compilation -> Engine -> Analyzer actions -> DiagnosticSink
//!                                                        |
//!                        Fixer -> CodeFixProvider -> SyntaxTree
//! ```
//!
//! Analyzers register interest through an [`AnalysisContext`]: node kinds,
//! symbol kinds, or a compilation-start action that resolves shared symbols
//! once and closes over them. The engine walks every unit a single time and
//! dispatches each node to the actions registered for its kind.
//!
//! # Example
//!
//! ```no_run
//! use sharpcheck::{Compilation, Config, Engine};
//!
//! let compilation = Compilation::load("snapshot.json".as_ref()).unwrap();
//! let engine = Engine::with_builtin_analyzers(Config::default()).unwrap();
//! let result = engine.analyze(&compilation);
//! for diagnostic in &result.diagnostics {
//!     println!("{}: {}", diagnostic.rule_id, diagnostic.message);
//! }
//! ```

pub mod analyzer;
pub mod analyzers;
pub mod codefix;
pub mod compilation;
pub mod config;
pub mod context;
pub mod diagnostic;
pub mod engine;
pub mod fixer;
pub mod fixes;
pub mod output;
pub mod registry;
pub mod rule;
pub mod semantic;
pub mod syntax;
pub mod verify;

// Re-export main types
pub use analyzer::Analyzer;
pub use codefix::{CodeFixProvider, FixError};
pub use compilation::{Compilation, SnapshotError, SourceUnit};
pub use config::{Config, ConfigError};
pub use context::{
    AnalysisContext, CancellationToken, CompilationStartContext, GeneratedCodeAnalysis,
    SymbolContext, SyntaxNodeContext,
};
pub use diagnostic::{Diagnostic, DiagnosticProperties, FixSafety, Location, Severity};
pub use engine::{AnalyzerTiming, Engine, LintResult};
pub use fixer::{Fix, FixMode, FixResult, Fixer};
pub use output::{JsonFormatter, OutputFormatter, TextFormatter};
pub use registry::{registry, RuleRegistry};
pub use rule::{DiagnosticDescriptor, RuleCategory};
pub use semantic::{Bindings, SemanticModel, Symbol, SymbolId, SymbolKind, SymbolTable};
pub use syntax::{NodeId, Span, SyntaxKind, SyntaxNode, SyntaxTree, TreeBuilder, TreeRewriter};
