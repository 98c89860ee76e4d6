//! JSON output formatter

use super::OutputFormatter;
use crate::diagnostic::Diagnostic;
use crate::engine::LintResult;
use serde::Serialize;
use std::collections::BTreeMap;

/// JSON formatter for machine-readable output
#[derive(Default)]
pub struct JsonFormatter {
    /// Pretty print with indentation
    pub pretty: bool,
}

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable pretty printing
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    fn render<T: Serialize>(&self, value: &T) -> String {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        rendered.unwrap_or_default()
    }
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    diagnostics: Vec<JsonDiagnostic<'a>>,
    summary: JsonSummary,
}

#[derive(Serialize)]
struct JsonDiagnostic<'a> {
    rule_id: &'a str,
    severity: String,
    message: &'a str,
    file: String,
    line: usize,
    column: usize,
    start: usize,
    length: usize,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    properties: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_line: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    help: Option<&'a str>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    in_test_code: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    notes: Vec<&'a str>,
}

impl<'a> From<&'a Diagnostic> for JsonDiagnostic<'a> {
    fn from(d: &'a Diagnostic) -> Self {
        Self {
            rule_id: &d.rule_id,
            severity: d.severity.to_string(),
            message: &d.message,
            file: d.location.file.display().to_string(),
            line: d.location.line,
            column: d.location.column,
            start: d.location.span.start,
            length: d.location.length(),
            properties: d.properties.to_bag().into_iter().collect(),
            source_line: d.source_line.as_deref(),
            help: d.help.as_deref(),
            in_test_code: d.in_test_code,
            notes: d.notes.iter().map(String::as_str).collect(),
        }
    }
}

#[derive(Serialize)]
struct JsonSummary {
    units_processed: usize,
    units_with_errors: usize,
    units_with_warnings: usize,
    error_count: usize,
    warning_count: usize,
    info_count: usize,
    duration_ms: u128,
    cancelled: bool,
}

impl OutputFormatter for JsonFormatter {
    fn format(&self, result: &LintResult) -> String {
        let output = JsonOutput {
            diagnostics: result.diagnostics.iter().map(JsonDiagnostic::from).collect(),
            summary: JsonSummary {
                units_processed: result.units_processed,
                units_with_errors: result.units_with_errors,
                units_with_warnings: result.units_with_warnings,
                error_count: result.error_count,
                warning_count: result.warning_count,
                info_count: result.info_count,
                duration_ms: result.duration.as_millis(),
                cancelled: result.cancelled,
            },
        };
        self.render(&output)
    }

    fn format_diagnostic(&self, diagnostic: &Diagnostic) -> String {
        self.render(&JsonDiagnostic::from(diagnostic))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::{DiagnosticProperties, Location, Severity};
    use crate::syntax::Span;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    #[test]
    fn test_json_format_diagnostic() {
        let formatter = JsonFormatter::new();
        let diag = Diagnostic::new(
            "SC0002",
            Severity::Error,
            "Missing enum member in switched cases.",
            Location::new(PathBuf::from("a.cs"), Span::new(12, 17), 10, 5),
        )
        .with_properties(DiagnosticProperties::MissingEnumCases {
            enum_name: "Color".to_string(),
            missing_members: vec!["Green".to_string(), "Blue".to_string()],
        });

        let value: serde_json::Value =
            serde_json::from_str(&formatter.format_diagnostic(&diag)).unwrap();
        assert_eq!(value["rule_id"], "SC0002");
        assert_eq!(value["severity"], "error");
        assert_eq!(value["line"], 10);
        assert_eq!(value["length"], 5);
        assert_eq!(value["properties"]["enum_name"], "Color");
        assert_eq!(value["properties"]["missing_members"], "Green,Blue");
        assert!(value.get("in_test_code").is_none());
        assert!(value.get("notes").is_none());
    }

    #[test]
    fn test_json_format_result() {
        let formatter = JsonFormatter::new();
        let result = LintResult {
            diagnostics: vec![],
            units_processed: 5,
            error_count: 2,
            warning_count: 3,
            ..Default::default()
        };

        let output = formatter.format(&result);
        assert!(output.contains("\"units_processed\":5"));
        assert!(output.contains("\"error_count\":2"));
        assert!(output.contains("\"warning_count\":3"));
        assert!(output.contains("\"cancelled\":false"));
    }

    #[test]
    fn test_json_pretty() {
        let formatter = JsonFormatter::new().pretty();
        let diag = Diagnostic::new("SC0001", Severity::Warning, "msg", Location::default())
            .with_test_code(true);

        let output = formatter.format_diagnostic(&diag);
        assert!(output.contains('\n'));
        assert!(output.contains("\"in_test_code\": true"));
    }
}
