//! Rule descriptors

use crate::diagnostic::Severity;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Rule category for grouping related rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuleCategory {
    /// Code that is definitely wrong or useless
    Correctness,
    /// Code that is likely wrong or suspicious
    Suspicious,
    /// Idiomatic and consistent style rules
    #[default]
    Style,
    /// Rules that improve runtime performance
    Perf,
    /// Extra strict rules that may have false positives
    Pedantic,
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleCategory::Correctness => write!(f, "correctness"),
            RuleCategory::Suspicious => write!(f, "suspicious"),
            RuleCategory::Style => write!(f, "style"),
            RuleCategory::Perf => write!(f, "perf"),
            RuleCategory::Pedantic => write!(f, "pedantic"),
        }
    }
}

impl std::str::FromStr for RuleCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "correctness" => Ok(RuleCategory::Correctness),
            "suspicious" => Ok(RuleCategory::Suspicious),
            "style" => Ok(RuleCategory::Style),
            "perf" | "performance" => Ok(RuleCategory::Perf),
            "pedantic" => Ok(RuleCategory::Pedantic),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

/// Static description of one rule.
///
/// Descriptors are declared as `static` items next to their analyzer and never
/// change at runtime.
#[derive(Debug, Serialize)]
pub struct DiagnosticDescriptor {
    /// Unique rule identifier (e.g., "SC0002")
    pub id: &'static str,
    /// Short kebab-case name
    pub name: &'static str,
    pub title: &'static str,
    /// Message template with positional slots (`{0}`, `{1}`, ...)
    pub message_format: &'static str,
    pub category: RuleCategory,
    pub default_severity: Severity,
    pub enabled_by_default: bool,
    pub description: &'static str,
    /// Documentation URL
    pub help_link: Option<&'static str>,
    /// Example of code that violates this rule
    pub example_bad: Option<&'static str>,
    /// Example of correct code
    pub example_good: Option<&'static str>,
}

fn slot_pattern() -> &'static Regex {
    static SLOT: OnceLock<Regex> = OnceLock::new();
    SLOT.get_or_init(|| Regex::new(r"\{(\d+)\}").expect("slot pattern is valid"))
}

impl DiagnosticDescriptor {
    /// Fill the message template. Slots without an argument are left as is.
    pub fn format_message(&self, args: &[&str]) -> String {
        slot_pattern()
            .replace_all(self.message_format, |caps: &regex::Captures| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| args.get(i))
                    .map(|a| a.to_string())
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }

    /// Check if this rule matches a pattern (supports `*` wildcard)
    pub fn matches_pattern(&self, pattern: &str) -> bool {
        if pattern == "*" || pattern.eq_ignore_ascii_case("all") {
            return true;
        }
        if let Some(prefix) = pattern.strip_suffix('*') {
            return self.id.starts_with(prefix) || self.name.starts_with(prefix);
        }
        self.id == pattern || self.name == pattern
    }
}

impl fmt::Display for DiagnosticDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static SAMPLE: DiagnosticDescriptor = DiagnosticDescriptor {
        id: "SC9999",
        name: "sample-rule",
        title: "Sample",
        message_format: "{0} should be {1}, not {2}",
        category: RuleCategory::Style,
        default_severity: Severity::Info,
        enabled_by_default: true,
        description: "A rule used in tests",
        help_link: None,
        example_bad: None,
        example_good: None,
    };

    #[test]
    fn test_format_message() {
        assert_eq!(
            SAMPLE.format_message(&["x", "y", "z"]),
            "x should be y, not z"
        );
    }

    #[test]
    fn test_format_message_missing_args() {
        assert_eq!(SAMPLE.format_message(&["x"]), "x should be {1}, not {2}");
    }

    #[test]
    fn test_matches_pattern() {
        assert!(SAMPLE.matches_pattern("SC9999"));
        assert!(SAMPLE.matches_pattern("sample-rule"));
        assert!(SAMPLE.matches_pattern("SC9*"));
        assert!(SAMPLE.matches_pattern("all"));
        assert!(!SAMPLE.matches_pattern("SC0001"));
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!(
            "performance".parse::<RuleCategory>(),
            Ok(RuleCategory::Perf)
        );
        assert!("unknown".parse::<RuleCategory>().is_err());
    }
}
