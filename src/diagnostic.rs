//! Diagnostic types for analysis results

use crate::syntax::{LineIndex, Span};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Severity level for diagnostics
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message
    Info,
    /// Warning - potential issue
    #[default]
    Warning,
    /// Error - definite problem
    Error,
}

/// Fix safety classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixSafety {
    /// Preserves code meaning, can be applied automatically
    #[default]
    Safe,
    /// May change runtime behavior
    Unsafe,
}

impl std::fmt::Display for FixSafety {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FixSafety::Safe => write!(f, "safe"),
            FixSafety::Unsafe => write!(f, "unsafe"),
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" | "hint" | "note" | "suggestion" => Ok(Severity::Info),
            "warning" | "warn" => Ok(Severity::Warning),
            "error" | "err" => Ok(Severity::Error),
            _ => Err(()),
        }
    }
}

/// Source code location
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// File path
    pub file: PathBuf,
    /// Byte span in the rendered tree text
    pub span: Span,
    /// Line number (1-based)
    pub line: usize,
    /// Column number (1-based)
    pub column: usize,
}

impl Location {
    pub fn new(file: PathBuf, span: Span, line: usize, column: usize) -> Self {
        Self {
            file,
            span,
            line,
            column,
        }
    }

    /// Resolve line and column for `span`
    pub fn from_span(file: PathBuf, span: Span, index: &LineIndex) -> Self {
        let (line, column) = index.line_col(span.start);
        Self::new(file, span, line, column)
    }

    /// Length of the highlighted region
    pub fn length(&self) -> usize {
        self.span.len()
    }
}

/// Typed payload handed from an analyzer to its code fix
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticProperties {
    #[default]
    None,
    /// Which half of the Equals/GetHashCode pair is present
    PairedOverride { equals_implemented: bool },
    /// Enum members a switch does not cover, in declaration order
    MissingEnumCases {
        enum_name: String,
        missing_members: Vec<String>,
    },
    /// Declared name of the property a string literal refers to
    NameOfCandidate { property_name: String },
}

impl DiagnosticProperties {
    /// Ordered string key/value view
    pub fn to_bag(&self) -> Vec<(String, String)> {
        match self {
            DiagnosticProperties::None => Vec::new(),
            DiagnosticProperties::PairedOverride { equals_implemented } => vec![(
                "is_equals_implemented".to_string(),
                equals_implemented.to_string(),
            )],
            DiagnosticProperties::MissingEnumCases {
                enum_name,
                missing_members,
            } => vec![
                ("enum_name".to_string(), enum_name.clone()),
                ("missing_members".to_string(), missing_members.join(",")),
            ],
            DiagnosticProperties::NameOfCandidate { property_name } => {
                vec![("property_name".to_string(), property_name.clone())]
            }
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, DiagnosticProperties::None)
    }
}

/// A reported rule violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Rule ID that triggered this diagnostic
    pub rule_id: String,
    /// Severity level
    pub severity: Severity,
    /// Rendered message
    pub message: String,
    /// Source location
    pub location: Location,
    /// Payload for the code fix
    #[serde(default, skip_serializing_if = "DiagnosticProperties::is_none")]
    pub properties: DiagnosticProperties,
    /// The source line (for display)
    pub source_line: Option<String>,
    /// Help text (usually rule description)
    pub help: Option<String>,
    /// Reported inside a test method
    #[serde(default)]
    pub in_test_code: bool,
    /// Additional notes
    #[serde(default)]
    pub notes: Vec<String>,
}

impl Diagnostic {
    /// Create a new diagnostic
    pub fn new(rule_id: &str, severity: Severity, message: &str, location: Location) -> Self {
        Self {
            rule_id: rule_id.to_string(),
            severity,
            message: message.to_string(),
            location,
            properties: DiagnosticProperties::None,
            source_line: None,
            help: None,
            in_test_code: false,
            notes: Vec::new(),
        }
    }

    pub fn with_properties(mut self, properties: DiagnosticProperties) -> Self {
        self.properties = properties;
        self
    }

    /// Add source line for display
    pub fn with_source_line(mut self, line: &str) -> Self {
        self.source_line = Some(line.to_string());
        self
    }

    /// Add help text
    pub fn with_help(mut self, help: &str) -> Self {
        self.help = Some(help.to_string());
        self
    }

    pub fn with_test_code(mut self, in_test_code: bool) -> Self {
        self.in_test_code = in_test_code;
        self
    }

    /// Add a note
    pub fn with_note(mut self, note: &str) -> Self {
        self.notes.push(note.to_string());
        self
    }

    pub fn span(&self) -> Span {
        self.location.span
    }

    /// Check if this is an error
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Check if this is a warning
    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}
