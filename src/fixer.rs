//! Applying code fixes to a compilation
//!
//! Fixes are classified as safe or unsafe:
//! - Safe fixes preserve code meaning and can be applied automatically
//! - Unsafe fixes may change runtime behavior and require explicit opt-in
//!
//! Rewritten trees are returned in the [`FixResult`]; the caller decides
//! whether to print them, diff them or write them back.

use crate::codefix::CodeFixProvider;
use crate::compilation::Compilation;
use crate::diagnostic::{Diagnostic, FixSafety, Location};
use crate::fixes::builtin_fixes;
use crate::syntax::{Span, SyntaxTree};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Lines of unchanged context around each diff hunk
const DIFF_CONTEXT: usize = 3;

/// A diagnostic paired with the provider that can fix it
#[derive(Clone)]
pub struct Fix {
    /// File path
    pub file: PathBuf,
    /// Location in file
    pub location: Location,
    /// Rule ID that generated this fix
    pub rule_id: String,
    /// Description of the edit
    pub title: String,
    /// Safety classification
    pub safety: FixSafety,
    diagnostic: Diagnostic,
    provider: Arc<dyn CodeFixProvider>,
}

impl std::fmt::Debug for Fix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fix")
            .field("file", &self.file)
            .field("rule_id", &self.rule_id)
            .field("title", &self.title)
            .field("safety", &self.safety)
            .finish()
    }
}

impl Fix {
    pub fn span(&self) -> Span {
        self.location.span
    }
}

/// Result of applying fixes
#[derive(Debug, Default)]
pub struct FixResult {
    /// Number of units modified
    pub units_modified: usize,
    /// Number of fixes applied
    pub fixes_applied: usize,
    /// Number of safe fixes applied
    pub safe_fixes_applied: usize,
    /// Number of unsafe fixes applied
    pub unsafe_fixes_applied: usize,
    /// Number of fixes that were not applicable
    pub fixes_failed: usize,
    /// Number of fixes skipped (unsafe when not allowed, or overlapping)
    pub fixes_skipped: usize,
    /// Errors encountered
    pub errors: Vec<String>,
    /// Unified diffs per unit (diff mode only)
    pub diffs: BTreeMap<PathBuf, String>,
    /// Rewritten trees per modified unit
    pub fixed: BTreeMap<PathBuf, SyntaxTree>,
}

/// Fix mode options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FixMode {
    /// Apply only safe fixes (default)
    #[default]
    SafeOnly,
    /// Apply all fixes including unsafe
    All,
    /// Diff mode - show changes without applying
    Diff,
    /// Show fixes without applying
    ShowOnly,
}

/// Matches diagnostics to code fix providers and applies them
pub struct Fixer {
    providers: Vec<Arc<dyn CodeFixProvider>>,
    /// Fixes grouped by file
    fixes_by_file: BTreeMap<PathBuf, Vec<Fix>>,
    mode: FixMode,
    include_unsafe: bool,
}

impl Default for Fixer {
    fn default() -> Self {
        Self::new(builtin_fixes())
    }
}

impl Fixer {
    /// Create a fixer using `providers`
    pub fn new(providers: Vec<Arc<dyn CodeFixProvider>>) -> Self {
        Self {
            providers,
            fixes_by_file: BTreeMap::new(),
            mode: FixMode::SafeOnly,
            include_unsafe: false,
        }
    }

    /// Set the fix mode
    pub fn with_mode(mut self, mode: FixMode) -> Self {
        self.mode = mode;
        self
    }

    /// Include unsafe fixes
    pub fn with_unsafe_fixes(mut self, include: bool) -> Self {
        self.include_unsafe = include;
        if include && self.mode == FixMode::SafeOnly {
            self.mode = FixMode::All;
        }
        self
    }

    /// Set diff mode
    pub fn with_diff_mode(mut self) -> Self {
        self.mode = FixMode::Diff;
        self
    }

    /// Set show-only mode
    pub fn with_show_only(mut self) -> Self {
        self.mode = FixMode::ShowOnly;
        self
    }

    /// Get the current fix mode
    pub fn mode(&self) -> FixMode {
        self.mode
    }

    /// Collect a fix for every diagnostic some provider handles
    pub fn collect_from_diagnostics(&mut self, diagnostics: &[Diagnostic]) {
        for diag in diagnostics {
            let Some(provider) = self.providers.iter().find(|p| p.can_fix(&diag.rule_id)) else {
                continue;
            };
            let fix = Fix {
                file: diag.location.file.clone(),
                location: diag.location.clone(),
                rule_id: diag.rule_id.clone(),
                title: provider.title(diag),
                safety: provider.safety(),
                diagnostic: diag.clone(),
                provider: Arc::clone(provider),
            };
            self.fixes_by_file
                .entry(fix.file.clone())
                .or_default()
                .push(fix);
        }
    }

    /// Check if a fix should be applied based on mode and safety
    fn should_apply_fix(&self, fix: &Fix) -> bool {
        match self.mode {
            FixMode::All => true,
            FixMode::SafeOnly => fix.safety == FixSafety::Safe,
            FixMode::Diff | FixMode::ShowOnly => {
                self.include_unsafe || fix.safety == FixSafety::Safe
            }
        }
    }

    /// Apply all collected fixes against the trees in `compilation`
    pub fn apply_all(&self, compilation: &Compilation) -> FixResult {
        let mut result = FixResult::default();

        for (file, fixes) in &self.fixes_by_file {
            let applicable: Vec<&Fix> = fixes.iter().filter(|f| self.should_apply_fix(f)).collect();
            result.fixes_skipped += fixes.len() - applicable.len();

            if self.mode == FixMode::ShowOnly {
                for fix in &applicable {
                    result.count_applied(fix.safety);
                }
                continue;
            }

            let Some(unit) = compilation.unit(file) else {
                result.fixes_failed += applicable.len();
                result
                    .errors
                    .push(format!("{}: unit not found in compilation", file.display()));
                continue;
            };

            if let Some(tree) = self.apply_fixes_to_unit(file, &unit.tree, applicable, &mut result) {
                result.units_modified += 1;
                if self.mode == FixMode::Diff {
                    let diff = generate_unified_diff(file, &unit.tree.text(), &tree.text());
                    result.diffs.insert(file.clone(), diff);
                }
                result.fixed.insert(file.clone(), tree);
            }
        }

        result
    }

    /// Apply back to front so earlier spans stay valid; returns the new tree
    /// when anything changed
    fn apply_fixes_to_unit(
        &self,
        file: &Path,
        tree: &SyntaxTree,
        mut fixes: Vec<&Fix>,
        result: &mut FixResult,
    ) -> Option<SyntaxTree> {
        fixes.sort_by(|a, b| {
            b.span()
                .start
                .cmp(&a.span().start)
                .then(b.span().end.cmp(&a.span().end))
        });

        let mut current: Option<SyntaxTree> = None;
        let mut applied_spans: Vec<Span> = Vec::new();
        for fix in fixes {
            if applied_spans.iter().any(|s| s.overlaps(fix.span())) {
                log::debug!("{}: skipping overlapping fix {} at {}", file.display(), fix.rule_id, fix.span());
                result.fixes_skipped += 1;
                continue;
            }

            let base = current.as_ref().unwrap_or(tree);
            match fix.provider.provide_fix(base, &fix.diagnostic) {
                Ok(fixed) => {
                    log::trace!("{}: applied '{}' ({})", file.display(), fix.title, fix.rule_id);
                    applied_spans.push(fix.span());
                    result.count_applied(fix.safety);
                    current = Some(fixed);
                }
                Err(e) => {
                    result.fixes_failed += 1;
                    result.errors.push(format!(
                        "{}:{}:{}: {}: {}",
                        file.display(),
                        fix.location.line,
                        fix.location.column,
                        fix.rule_id,
                        e
                    ));
                }
            }
        }
        current
    }

    /// Get all fixes that would be applied (for --show-fixes)
    pub fn get_pending_fixes(&self) -> Vec<&Fix> {
        let mut all_fixes: Vec<&Fix> = self
            .fixes_by_file
            .values()
            .flatten()
            .filter(|f| self.should_apply_fix(f))
            .collect();
        all_fixes.sort_by(|a, b| {
            a.file
                .cmp(&b.file)
                .then(a.location.line.cmp(&b.location.line))
                .then(a.location.column.cmp(&b.location.column))
        });
        all_fixes
    }

    /// Format fixes for display (--show-fixes)
    pub fn format_fixes(&self) -> String {
        let fixes = self.get_pending_fixes();
        if fixes.is_empty() {
            return "No fixes available.\n".to_string();
        }

        let mut output = format!("Found {} fix(es):\n\n", fixes.len());
        let mut current_file: Option<&PathBuf> = None;
        for fix in fixes {
            if current_file != Some(&fix.file) {
                current_file = Some(&fix.file);
                output.push_str(&format!("{}:\n", fix.file.display()));
            }
            output.push_str(&format!(
                "  Line {}: [{}] {} - {}\n",
                fix.location.line, fix.safety, fix.rule_id, fix.title
            ));
        }
        output
    }

    /// Get count of fixes pending
    pub fn pending_count(&self) -> usize {
        self.fixes_by_file.values().map(Vec::len).sum()
    }

    /// Format diff output for display
    pub fn format_diffs(&self, result: &FixResult) -> String {
        let mut output = String::new();
        for (file, diff) in &result.diffs {
            output.push_str(&format!(
                "diff --sharpcheck a/{} b/{}\n",
                file.display(),
                file.display()
            ));
            output.push_str(diff);
        }
        output
    }
}

impl FixResult {
    fn count_applied(&mut self, safety: FixSafety) {
        self.fixes_applied += 1;
        match safety {
            FixSafety::Safe => self.safe_fixes_applied += 1,
            FixSafety::Unsafe => self.unsafe_fixes_applied += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineEdit<'a> {
    Keep(&'a str),
    Remove(&'a str),
    Add(&'a str),
}

/// Shortest edit script between two line lists (LCS table)
fn diff_lines<'a>(old: &[&'a str], new: &[&'a str]) -> Vec<LineEdit<'a>> {
    let (n, m) = (old.len(), new.len());
    let mut lcs = vec![vec![0usize; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i][j] = if old[i] == new[j] {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let mut edits = Vec::with_capacity(n.max(m));
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if old[i] == new[j] {
            edits.push(LineEdit::Keep(old[i]));
            i += 1;
            j += 1;
        } else if lcs[i + 1][j] >= lcs[i][j + 1] {
            edits.push(LineEdit::Remove(old[i]));
            i += 1;
        } else {
            edits.push(LineEdit::Add(new[j]));
            j += 1;
        }
    }
    edits.extend(old[i..].iter().map(|l| LineEdit::Remove(l)));
    edits.extend(new[j..].iter().map(|l| LineEdit::Add(l)));
    edits
}

/// Generate a unified diff between two strings
pub fn generate_unified_diff(file: &Path, original: &str, modified: &str) -> String {
    let old: Vec<&str> = original.lines().collect();
    let new: Vec<&str> = modified.lines().collect();
    let edits = diff_lines(&old, &new);

    let mut diff = format!("--- a/{}\n+++ b/{}\n", file.display(), file.display());

    // Hunks as half-open ranges of edit indices
    let mut hunks: Vec<(usize, usize)> = Vec::new();
    for (i, edit) in edits.iter().enumerate() {
        if matches!(edit, LineEdit::Keep(_)) {
            continue;
        }
        let start = i.saturating_sub(DIFF_CONTEXT);
        let end = (i + DIFF_CONTEXT + 1).min(edits.len());
        match hunks.last_mut() {
            Some(last) if start <= last.1 => last.1 = end,
            _ => hunks.push((start, end)),
        }
    }

    // Lines of each side consumed before edit `k`
    let mut old_before = Vec::with_capacity(edits.len() + 1);
    let mut new_before = Vec::with_capacity(edits.len() + 1);
    let (mut o, mut n) = (0, 0);
    for edit in &edits {
        old_before.push(o);
        new_before.push(n);
        match edit {
            LineEdit::Keep(_) => {
                o += 1;
                n += 1;
            }
            LineEdit::Remove(_) => o += 1,
            LineEdit::Add(_) => n += 1,
        }
    }

    for (start, end) in hunks {
        let hunk = &edits[start..end];
        let old_count = hunk.iter().filter(|e| !matches!(e, LineEdit::Add(_))).count();
        let new_count = hunk.iter().filter(|e| !matches!(e, LineEdit::Remove(_))).count();
        let old_start = old_before[start] + usize::from(old_count > 0);
        let new_start = new_before[start] + usize::from(new_count > 0);
        diff.push_str(&format!(
            "@@ -{},{} +{},{} @@\n",
            old_start, old_count, new_start, new_count
        ));
        for edit in hunk {
            let (marker, line) = match edit {
                LineEdit::Keep(l) => (' ', l),
                LineEdit::Remove(l) => ('-', l),
                LineEdit::Add(l) => ('+', l),
            };
            diff.push(marker);
            diff.push_str(line);
            diff.push('\n');
        }
    }

    diff
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codefix::FixError;
    use crate::diagnostic::{DiagnosticProperties, Severity};
    use crate::semantic::Bindings;
    use crate::compilation::SourceUnit;
    use crate::syntax::{SyntaxKind, TreeBuilder};
    use pretty_assertions::assert_eq;

    /// `OnPropertyChanged("a"); OnPropertyChanged("b");` as two statements
    fn two_calls() -> (Compilation, Vec<Span>) {
        let mut b = TreeBuilder::new();
        let mut literals = Vec::new();
        b.node(SyntaxKind::Block, |b| {
            b.fixed_token(SyntaxKind::OpenBraceToken);
            for name in ["a", "b"] {
                b.trivia("\n    ");
                b.node(SyntaxKind::ExpressionStatement, |b| {
                    b.node(SyntaxKind::InvocationExpression, |b| {
                        b.identifier_name("OnPropertyChanged");
                        b.node(SyntaxKind::ArgumentList, |b| {
                            b.fixed_token(SyntaxKind::OpenParenToken);
                            b.node(SyntaxKind::Argument, |b| {
                                literals.push(b.string_literal(name));
                            });
                            b.fixed_token(SyntaxKind::CloseParenToken);
                        });
                    });
                    b.fixed_token(SyntaxKind::SemicolonToken);
                });
            }
            b.trivia("\n");
            b.fixed_token(SyntaxKind::CloseBraceToken);
        });
        let tree = b.finish().unwrap();
        let spans = literals
            .iter()
            .map(|id| tree.node(*id).unwrap().span())
            .collect();
        let compilation =
            Compilation::default().with_unit(SourceUnit::new("a.cs", tree, Bindings::new()));
        (compilation, spans)
    }

    fn nameof_diagnostic(span: Span, property: &str) -> Diagnostic {
        Diagnostic::new(
            "SC0003",
            Severity::Warning,
            "m",
            Location::new("a.cs".into(), span, 1, 1),
        )
        .with_properties(DiagnosticProperties::NameOfCandidate {
            property_name: property.to_string(),
        })
    }

    struct Refuses;

    impl CodeFixProvider for Refuses {
        fn fixable_diagnostic_ids(&self) -> &'static [&'static str] {
            &["SC0003"]
        }

        fn title(&self, _: &Diagnostic) -> String {
            "refuse".to_string()
        }

        fn safety(&self) -> FixSafety {
            FixSafety::Unsafe
        }

        fn provide_fix(&self, _: &SyntaxTree, d: &Diagnostic) -> Result<SyntaxTree, FixError> {
            Err(FixError::not_applicable(d.span(), "never"))
        }
    }

    #[test]
    fn test_applies_every_fix_in_a_unit() {
        let (compilation, spans) = two_calls();
        let mut fixer = Fixer::default();
        fixer.collect_from_diagnostics(&[
            nameof_diagnostic(spans[0], "A"),
            nameof_diagnostic(spans[1], "B"),
        ]);
        assert_eq!(fixer.pending_count(), 2);

        let result = fixer.apply_all(&compilation);
        assert_eq!(result.fixes_applied, 2);
        assert_eq!(result.safe_fixes_applied, 2);
        assert_eq!(result.units_modified, 1);
        assert_eq!(
            result.fixed[Path::new("a.cs")].text(),
            "{\n    OnPropertyChanged(nameof(A));\n    OnPropertyChanged(nameof(B));\n}"
        );
    }

    #[test]
    fn test_overlapping_fixes_skipped() {
        let (compilation, spans) = two_calls();
        let mut fixer = Fixer::default();
        fixer.collect_from_diagnostics(&[
            nameof_diagnostic(spans[0], "A"),
            nameof_diagnostic(spans[0], "Other"),
        ]);
        let result = fixer.apply_all(&compilation);
        assert_eq!(result.fixes_applied, 1);
        assert_eq!(result.fixes_skipped, 1);
    }

    #[test]
    fn test_unsafe_fixes_need_opt_in() {
        let (compilation, spans) = two_calls();
        let diagnostics = [nameof_diagnostic(spans[0], "A")];

        let mut fixer = Fixer::new(vec![Arc::new(Refuses)]);
        fixer.collect_from_diagnostics(&diagnostics);
        assert!(fixer.get_pending_fixes().is_empty());
        let result = fixer.apply_all(&compilation);
        assert_eq!(result.fixes_skipped, 1);

        let mut fixer = Fixer::new(vec![Arc::new(Refuses)]).with_unsafe_fixes(true);
        fixer.collect_from_diagnostics(&diagnostics);
        let result = fixer.apply_all(&compilation);
        assert_eq!(result.fixes_failed, 1);
        assert_eq!(result.errors.len(), 1);
        assert!(result.fixed.is_empty());
    }

    #[test]
    fn test_diff_mode() {
        let (compilation, spans) = two_calls();
        let mut fixer = Fixer::default().with_diff_mode();
        fixer.collect_from_diagnostics(&[nameof_diagnostic(spans[1], "B")]);
        let result = fixer.apply_all(&compilation);
        assert_eq!(
            result.diffs[Path::new("a.cs")],
            "--- a/a.cs\n+++ b/a.cs\n@@ -1,4 +1,4 @@\n {\n     OnPropertyChanged(\"a\");\n\
             -    OnPropertyChanged(\"b\");\n+    OnPropertyChanged(nameof(B));\n }\n"
        );
        assert!(fixer.format_diffs(&result).starts_with("diff --sharpcheck a/a.cs b/a.cs\n"));
    }

    #[test]
    fn test_show_only_counts_without_applying() {
        let (compilation, spans) = two_calls();
        let mut fixer = Fixer::default().with_show_only();
        fixer.collect_from_diagnostics(&[nameof_diagnostic(spans[0], "A")]);
        let result = fixer.apply_all(&compilation);
        assert_eq!(result.fixes_applied, 1);
        assert!(result.fixed.is_empty());
        assert_eq!(
            fixer.format_fixes(),
            "Found 1 fix(es):\n\na.cs:\n  Line 1: [safe] SC0003 - Use nameof(A)\n"
        );
    }

    #[test]
    fn test_diagnostics_without_provider_are_ignored() {
        let mut fixer = Fixer::default();
        fixer.collect_from_diagnostics(&[Diagnostic::new(
            "SC0001",
            Severity::Warning,
            "m",
            Location::default(),
        )]);
        assert_eq!(fixer.pending_count(), 0);
        assert_eq!(fixer.format_fixes(), "No fixes available.\n");
    }

    #[test]
    fn test_fix_modes() {
        assert_eq!(Fixer::default().mode(), FixMode::SafeOnly);
        assert_eq!(Fixer::default().with_unsafe_fixes(true).mode(), FixMode::All);
        assert_eq!(Fixer::default().with_diff_mode().mode(), FixMode::Diff);
        assert_eq!(
            Fixer::default().with_diff_mode().with_unsafe_fixes(true).mode(),
            FixMode::Diff
        );
    }

    #[test]
    fn test_generate_diff_with_insertion() {
        let original = "a\nb\nc\n";
        let modified = "a\nb\nx\ny\nc\n";
        let diff = generate_unified_diff(Path::new("t.cs"), original, modified);
        assert_eq!(
            diff,
            "--- a/t.cs\n+++ b/t.cs\n@@ -1,3 +1,5 @@\n a\n b\n+x\n+y\n c\n"
        );
    }

    #[test]
    fn test_identical_inputs_have_no_hunks() {
        let diff = generate_unified_diff(Path::new("t.cs"), "a\n", "a\n");
        assert_eq!(diff, "--- a/t.cs\n+++ b/t.cs\n");
    }
}
