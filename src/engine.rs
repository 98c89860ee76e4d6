//! Analysis engine

use crate::analyzer::Analyzer;
use crate::analyzers::builtin_analyzers;
use crate::compilation::{Compilation, SourceUnit};
use crate::config::{Config, ConfigError};
use crate::context::{
    ActionSet, AnalysisContext, AnalysisUnit, CancellationToken, DiagnosticSink,
    GeneratedCodeAnalysis, SymbolContext, SymbolDeclaration, SyntaxNodeContext,
};
use crate::diagnostic::{Diagnostic, Severity};
use crate::rule::DiagnosticDescriptor;
use crate::semantic::SymbolId;
use globset::GlobSet;
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Marker the host's code generators put in a file's leading comment
const GENERATED_HEADER: &str = "<auto-generated";

/// Per-analyzer timing statistics
#[derive(Debug, Clone, Default)]
pub struct AnalyzerTiming {
    /// Analyzer name
    pub analyzer: String,
    /// Total time spent in this analyzer's actions
    pub total_time: Duration,
    /// Number of action invocations
    pub invocation_count: usize,
}

impl AnalyzerTiming {
    pub fn new(analyzer: &str) -> Self {
        Self {
            analyzer: analyzer.to_string(),
            ..Default::default()
        }
    }

    /// Average time per invocation
    pub fn avg_time(&self) -> Duration {
        if self.invocation_count > 0 {
            self.total_time / self.invocation_count as u32
        } else {
            Duration::ZERO
        }
    }

    fn record(&mut self, elapsed: Duration, invocations: usize) {
        self.total_time += elapsed;
        self.invocation_count += invocations;
    }
}

type Timings = HashMap<String, AnalyzerTiming>;

fn merge_timings(into: &mut Timings, other: Timings) {
    for (name, timing) in other {
        into.entry(name)
            .or_insert_with(|| AnalyzerTiming::new(&timing.analyzer))
            .record(timing.total_time, timing.invocation_count);
    }
}

/// Result of one analysis pass
#[derive(Debug, Default)]
pub struct LintResult {
    /// All diagnostics, sorted by file, position and rule id
    pub diagnostics: Vec<Diagnostic>,

    /// Units processed
    pub units_processed: usize,

    /// Units with errors
    pub units_with_errors: usize,

    /// Units with warnings
    pub units_with_warnings: usize,

    /// Total errors
    pub error_count: usize,

    /// Total warnings
    pub warning_count: usize,

    /// Total info messages
    pub info_count: usize,

    /// Processing duration
    pub duration: Duration,

    /// Per-analyzer timing statistics (analyzer name -> timing)
    pub analyzer_timings: HashMap<String, AnalyzerTiming>,

    /// The pass stopped early; diagnostics are partial
    pub cancelled: bool,
}

impl LintResult {
    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    /// Check if there are any warnings
    pub fn has_warnings(&self) -> bool {
        self.warning_count > 0
    }

    /// Check if result is clean (no errors or warnings)
    pub fn is_clean(&self) -> bool {
        self.error_count == 0 && self.warning_count == 0
    }

    /// Get exit code (0 = success, 1 = warnings, 2 = errors)
    pub fn exit_code(&self) -> i32 {
        if self.error_count > 0 {
            2
        } else if self.warning_count > 0 {
            1
        } else {
            0
        }
    }

    /// Merge another result into this one
    pub fn merge(&mut self, other: LintResult) {
        self.diagnostics.extend(other.diagnostics);
        self.units_processed += other.units_processed;
        self.units_with_errors += other.units_with_errors;
        self.units_with_warnings += other.units_with_warnings;
        self.error_count += other.error_count;
        self.warning_count += other.warning_count;
        self.info_count += other.info_count;
        self.duration += other.duration;
        self.cancelled |= other.cancelled;
        merge_timings(&mut self.analyzer_timings, other.analyzer_timings);
    }

    /// Analyzer timings sorted by total time (descending)
    pub fn sorted_timings(&self) -> Vec<&AnalyzerTiming> {
        let mut timings: Vec<_> = self.analyzer_timings.values().collect();
        timings.sort_by(|a, b| b.total_time.cmp(&a.total_time));
        timings
    }

    /// Format timing statistics as a table
    pub fn format_timings(&self) -> String {
        let timings = self.sorted_timings();
        if timings.is_empty() {
            return "No timing data available".to_string();
        }

        let mut output = String::new();
        output.push_str("Analyzer Timing Statistics:\n");
        output.push_str(&format!(
            "{:<32} {:>12} {:>12} {:>10}\n",
            "Analyzer", "Total", "Avg", "Calls"
        ));
        output.push_str(&"-".repeat(70));
        output.push('\n');

        for timing in timings {
            let total_ms = timing.total_time.as_secs_f64() * 1000.0;
            let avg_us = timing.avg_time().as_secs_f64() * 1_000_000.0;
            output.push_str(&format!(
                "{:<32} {:>10.2}ms {:>10.2}µs {:>10}\n",
                timing.analyzer, total_ms, avg_us, timing.invocation_count
            ));
        }

        output
    }

    fn count(&mut self) {
        let mut errors = HashSet::new();
        let mut warnings = HashSet::new();
        for diag in &self.diagnostics {
            match diag.severity {
                Severity::Error => {
                    self.error_count += 1;
                    errors.insert(diag.location.file.as_path());
                }
                Severity::Warning => {
                    self.warning_count += 1;
                    warnings.insert(diag.location.file.as_path());
                }
                Severity::Info => self.info_count += 1,
            }
        }
        self.units_with_errors = errors.len();
        self.units_with_warnings = warnings.len();
    }
}

/// An analyzer after `initialize` and compilation start
struct PreparedAnalyzer {
    name: String,
    concurrent: bool,
    generated_code: GeneratedCodeAnalysis,
    actions: ActionSet,
}

impl PreparedAnalyzer {
    fn runs_on(&self, unit: &AnalysisUnit<'_>) -> bool {
        !unit.is_generated() || self.generated_code.analyze
    }

    fn reports_on(&self, unit: &AnalysisUnit<'_>) -> bool {
        !unit.is_generated() || self.generated_code.report
    }
}

/// Drives registered analyzers over a compilation
pub struct Engine {
    config: Config,
    analyzers: Vec<Arc<dyn Analyzer>>,
    generated_patterns: GlobSet,
    cancellation: CancellationToken,
}

impl Engine {
    /// Create an engine without analyzers
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        let generated_patterns = config.generated_code.matcher()?;
        Ok(Self {
            config,
            analyzers: Vec::new(),
            generated_patterns,
            cancellation: CancellationToken::new(),
        })
    }

    /// Create an engine running every built-in analyzer
    pub fn with_builtin_analyzers(config: Config) -> Result<Self, ConfigError> {
        let mut engine = Self::new(config)?;
        for analyzer in builtin_analyzers() {
            engine.register_analyzer(analyzer);
        }
        Ok(engine)
    }

    pub fn register_analyzer(&mut self, analyzer: Arc<dyn Analyzer>) {
        log::debug!("registered analyzer '{}'", analyzer.name());
        self.analyzers.push(analyzer);
    }

    pub fn analyzers(&self) -> &[Arc<dyn Analyzer>] {
        &self.analyzers
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Token that stops a running pass at the next node boundary
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Whether a unit counts as generated code
    pub fn is_generated(&self, unit: &SourceUnit) -> bool {
        if unit.generated || self.generated_patterns.is_match(&unit.path) {
            return true;
        }
        self.config.generated_code.detect_header
            && unit
                .tree
                .root()
                .first_token()
                .is_some_and(|t| t.leading_trivia().contains(GENERATED_HEADER))
    }

    /// Run every enabled analyzer over `compilation`
    pub fn analyze(&self, compilation: &Compilation) -> LintResult {
        let start = Instant::now();
        let prepared = self.prepare(compilation);

        let units: Vec<AnalysisUnit<'_>> = compilation
            .units
            .iter()
            .map(|unit| {
                let generated = self.is_generated(unit);
                if generated {
                    log::debug!("{} is generated code", unit.path.display());
                }
                AnalysisUnit::new(unit, &compilation.symbols, generated)
            })
            .collect();

        let sink = DiagnosticSink::new();
        let (concurrent, sequential): (Vec<&PreparedAnalyzer>, Vec<&PreparedAnalyzer>) = prepared
            .iter()
            .partition(|p| p.concurrent && self.config.engine.parallel);

        let mut timings = Timings::new();
        if !concurrent.is_empty() {
            for unit_timings in self.run_parallel(&units, &concurrent, &sink) {
                merge_timings(&mut timings, unit_timings);
            }
        }
        if !sequential.is_empty() {
            for unit in &units {
                merge_timings(&mut timings, self.run_unit(unit, &sequential, &sink));
            }
        }
        merge_timings(
            &mut timings,
            self.run_symbol_actions(compilation, &units, &prepared, &sink),
        );

        let mut result = LintResult {
            diagnostics: self.finish(sink.into_diagnostics()),
            units_processed: units.len(),
            analyzer_timings: timings,
            cancelled: self.cancellation.is_cancelled(),
            ..LintResult::default()
        };
        result.count();
        result.duration = start.elapsed();
        if result.cancelled {
            log::debug!("analysis cancelled; {} partial diagnostic(s)", result.diagnostics.len());
        }
        result
    }

    /// Initialize enabled analyzers and run their compilation-start actions
    fn prepare(&self, compilation: &Compilation) -> Vec<PreparedAnalyzer> {
        self.analyzers
            .iter()
            .filter(|analyzer| {
                let enabled = analyzer
                    .supported_diagnostics()
                    .iter()
                    .any(|d| self.config.is_rule_enabled(d));
                if !enabled {
                    log::debug!("analyzer '{}' has no enabled rules", analyzer.name());
                }
                enabled
            })
            .map(|analyzer| {
                let mut context = AnalysisContext::new();
                analyzer.initialize(&mut context);
                PreparedAnalyzer {
                    name: analyzer.name().to_string(),
                    concurrent: context.is_concurrent(),
                    generated_code: context.generated_code(),
                    actions: context.start(compilation),
                }
            })
            .collect()
    }

    fn run_parallel(
        &self,
        units: &[AnalysisUnit<'_>],
        analyzers: &[&PreparedAnalyzer],
        sink: &DiagnosticSink,
    ) -> Vec<Timings> {
        let run = || {
            units
                .par_iter()
                .map(|unit| self.run_unit(unit, analyzers, sink))
                .collect()
        };
        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.engine.thread_count())
            .build()
        {
            Ok(pool) => pool.install(run),
            Err(e) => {
                log::warn!("falling back to the global thread pool: {}", e);
                run()
            }
        }
    }

    /// Single pre-order traversal dispatching every node to interested actions
    fn run_unit(
        &self,
        unit: &AnalysisUnit<'_>,
        analyzers: &[&PreparedAnalyzer],
        sink: &DiagnosticSink,
    ) -> Timings {
        let mut timings = Timings::new();
        let active: Vec<&PreparedAnalyzer> = analyzers
            .iter()
            .copied()
            .filter(|p| p.runs_on(unit) && p.actions.has_node_actions())
            .collect();
        if active.is_empty() {
            return timings;
        }

        for node in unit.tree().root().descendants() {
            if self.cancellation.is_cancelled() {
                log::debug!("cancelled while visiting {}", unit.path().display());
                break;
            }
            for prepared in &active {
                let actions = prepared.actions.node_actions(node.kind());
                if actions.is_empty() {
                    continue;
                }
                let context = SyntaxNodeContext::new(
                    node,
                    unit,
                    sink,
                    &self.cancellation,
                    prepared.reports_on(unit),
                );
                let started = Instant::now();
                for action in actions {
                    action(&context);
                }
                timings
                    .entry(prepared.name.clone())
                    .or_insert_with(|| AnalyzerTiming::new(&prepared.name))
                    .record(started.elapsed(), actions.len());
            }
        }
        timings
    }

    /// Run symbol actions once per declared symbol, after all node actions
    fn run_symbol_actions(
        &self,
        compilation: &Compilation,
        units: &[AnalysisUnit<'_>],
        prepared: &[PreparedAnalyzer],
        sink: &DiagnosticSink,
    ) -> Timings {
        let mut timings = Timings::new();
        let interested: Vec<&PreparedAnalyzer> = prepared
            .iter()
            .filter(|p| p.actions.has_symbol_actions())
            .collect();
        if interested.is_empty() {
            return timings;
        }

        let mut declarations: BTreeMap<SymbolId, Vec<SymbolDeclaration<'_>>> = BTreeMap::new();
        for (unit, source) in units.iter().zip(&compilation.units) {
            for (node, symbol) in source.bindings.declarations() {
                declarations
                    .entry(symbol)
                    .or_default()
                    .push(SymbolDeclaration { unit, node });
            }
        }

        for prepared in interested {
            for (id, sites) in &declarations {
                if self.cancellation.is_cancelled() {
                    return timings;
                }
                let Some(symbol) = compilation.symbols.get(*id) else {
                    continue;
                };
                let actions = prepared.actions.symbol_actions(symbol.kind);
                if actions.is_empty() {
                    continue;
                }
                let visible: Vec<SymbolDeclaration<'_>> = sites
                    .iter()
                    .copied()
                    .filter(|site| prepared.runs_on(site.unit))
                    .collect();
                if visible.is_empty() {
                    continue;
                }

                let context = SymbolContext::new(
                    symbol,
                    &compilation.symbols,
                    &visible,
                    sink,
                    &self.cancellation,
                    prepared.generated_code.report,
                );
                let started = Instant::now();
                for action in actions {
                    action(&context);
                }
                timings
                    .entry(prepared.name.clone())
                    .or_insert_with(|| AnalyzerTiming::new(&prepared.name))
                    .record(started.elapsed(), actions.len());
            }
        }
        timings
    }

    /// Apply rule selection, per-file ignores and severity overrides, then sort
    fn finish(&self, diagnostics: Vec<Diagnostic>) -> Vec<Diagnostic> {
        let descriptors: HashMap<&str, &DiagnosticDescriptor> = self
            .analyzers
            .iter()
            .flat_map(|a| a.supported_diagnostics().iter().copied())
            .map(|d| (d.id, d))
            .collect();

        let mut kept: Vec<Diagnostic> = diagnostics
            .into_iter()
            .filter_map(|mut diag| {
                if let Some(descriptor) = descriptors.get(diag.rule_id.as_str()) {
                    if !self.config.is_rule_enabled(descriptor)
                        || self
                            .config
                            .should_ignore_rule_for_file(descriptor, &diag.location.file)
                    {
                        return None;
                    }
                    if let Some(severity) = self.config.severity_override(descriptor) {
                        diag.severity = severity;
                    }
                }
                Some(diag)
            })
            .collect();

        kept.sort_by(|a, b| {
            a.location
                .file
                .cmp(&b.location.file)
                .then(a.location.span.start.cmp(&b.location.span.start))
                .then(a.location.span.end.cmp(&b.location.span.end))
                .then_with(|| a.rule_id.cmp(&b.rule_id))
        });
        kept
    }
}
