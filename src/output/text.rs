//! Human-readable text output formatter

use super::OutputFormatter;
use crate::diagnostic::{Diagnostic, Severity};
use crate::engine::LintResult;
use colored::*;
use std::collections::BTreeMap;

/// Text formatter with optional color support
pub struct TextFormatter {
    /// Enable colored output
    pub colored: bool,

    /// Show source line and caret underline
    pub show_source: bool,

    /// Show help text and notes
    pub show_help: bool,

    /// Show statistics
    pub show_stats: bool,
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self {
            colored: true,
            show_source: true,
            show_help: false,
            show_stats: true,
        }
    }
}

impl TextFormatter {
    /// Create a new text formatter
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable colors
    pub fn without_color(mut self) -> Self {
        self.colored = false;
        self
    }

    /// Include help and notes under each diagnostic
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.show_help = verbose;
        self
    }

    fn severity_str(&self, severity: Severity) -> ColoredString {
        let s = format!("{}", severity);
        if !self.colored {
            return s.normal();
        }
        match severity {
            Severity::Error => s.red().bold(),
            Severity::Warning => s.yellow().bold(),
            Severity::Info => s.blue(),
        }
    }

    fn gutter(&self, mark: &str) -> String {
        if self.colored {
            mark.blue().to_string()
        } else {
            mark.to_string()
        }
    }

    fn format_location(&self, diag: &Diagnostic) -> String {
        format!(
            "{}:{}:{}",
            diag.location.file.display(),
            diag.location.line,
            diag.location.column
        )
    }

    fn count_str(&self, count: usize, singular: &str, plural: &str, color: Color) -> String {
        let s = format!("{} {}", count, if count == 1 { singular } else { plural });
        if self.colored {
            s.color(color).to_string()
        } else {
            s
        }
    }
}

impl OutputFormatter for TextFormatter {
    fn format(&self, result: &LintResult) -> String {
        let mut output = String::new();

        // Group diagnostics by file
        let mut by_file: BTreeMap<_, Vec<_>> = BTreeMap::new();
        for diag in &result.diagnostics {
            by_file.entry(&diag.location.file).or_default().push(diag);
        }

        for (file, diagnostics) in &by_file {
            if self.colored {
                output.push_str(&format!("{}\n", file.display().to_string().underline()));
            } else {
                output.push_str(&format!("{}\n", file.display()));
            }

            for diag in diagnostics {
                output.push_str(&self.format_diagnostic(diag));
                output.push('\n');
            }
        }

        if result.cancelled {
            let s = "analysis cancelled; results are partial";
            output.push_str(&format!(
                "{}\n",
                if self.colored {
                    s.yellow().to_string()
                } else {
                    s.to_string()
                }
            ));
        }

        // Statistics
        if self.show_stats {
            output.push_str(&format!(
                "{} {} processed",
                result.units_processed,
                if result.units_processed == 1 {
                    "unit"
                } else {
                    "units"
                }
            ));

            let mut counts = Vec::new();
            if result.error_count > 0 {
                counts.push(self.count_str(result.error_count, "error", "errors", Color::Red));
            }
            if result.warning_count > 0 {
                counts.push(self.count_str(
                    result.warning_count,
                    "warning",
                    "warnings",
                    Color::Yellow,
                ));
            }
            if result.info_count > 0 {
                counts.push(self.count_str(result.info_count, "info", "infos", Color::Blue));
            }

            if !counts.is_empty() {
                output.push_str(&format!(": {}", counts.join(", ")));
            }
            output.push('\n');

            output.push_str(&format!(
                "Finished in {:.2}s\n",
                result.duration.as_secs_f64()
            ));
        }

        output
    }

    fn format_diagnostic(&self, diag: &Diagnostic) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{}: {}[{}]: {}{}\n",
            self.format_location(diag),
            self.severity_str(diag.severity),
            if self.colored {
                diag.rule_id.cyan().to_string()
            } else {
                diag.rule_id.clone()
            },
            diag.message,
            if diag.in_test_code { " (test code)" } else { "" }
        ));

        if self.show_source {
            if let Some(source) = &diag.source_line {
                let line_num = format!("{:>4}", diag.location.line);
                output.push_str(&format!(
                    "{} {} {}\n",
                    if self.colored {
                        line_num.blue().to_string()
                    } else {
                        line_num
                    },
                    self.gutter("|"),
                    source
                ));

                if diag.location.column > 0 {
                    // Underline stops at the end of the first line
                    let padding = " ".repeat(diag.location.column - 1);
                    let room = source.chars().count().saturating_sub(diag.location.column - 1);
                    let width = diag.location.length().min(room).max(1);
                    let underline = "^".repeat(width);
                    output.push_str(&format!(
                        "     {} {}{}\n",
                        self.gutter("|"),
                        padding,
                        if self.colored {
                            underline.red().to_string()
                        } else {
                            underline
                        }
                    ));
                }
            }
        }

        if self.show_help {
            if let Some(help) = &diag.help {
                output.push_str(&format!("     {} help: {}\n", self.gutter("="), help));
            }
            for note in &diag.notes {
                output.push_str(&format!("     {} note: {}\n", self.gutter("="), note));
            }
        }

        output
    }
}
