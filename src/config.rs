//! Configuration for the analysis engine
//!
//! Reads configuration from:
//! - `.sharpcheck.yaml` / `.sharpcheck.yml` / `.sharpcheck.json` (project-level)
//! - the same names in the home directory (user-level)

use crate::diagnostic::Severity;
use crate::rule::DiagnosticDescriptor;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File names probed by [`Config::load_default`], in order
pub const CONFIG_FILE_NAMES: &[&str] = &[".sharpcheck.yaml", ".sharpcheck.yml", ".sharpcheck.json"];

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid glob pattern '{pattern}': {source}")]
    Glob {
        pattern: String,
        source: globset::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Run concurrent analyzers on a thread pool
    pub parallel: bool,

    /// Number of worker threads (0 = one per CPU)
    pub jobs: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            jobs: 0,
        }
    }
}

impl EngineConfig {
    /// Worker thread count with 0 resolved to the CPU count
    pub fn thread_count(&self) -> usize {
        if self.jobs > 0 {
            self.jobs
        } else {
            num_cpus::get()
        }
    }
}

/// Output settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub color: ColorMode,
    /// Print help text and notes under each diagnostic
    pub verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Color mode options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

/// Rule selection and overrides.
///
/// Entries in `disabled`, `enabled`, `severity` and `per_file` match a rule
/// by id or name, and accept a trailing `*` wildcard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    pub disabled: Vec<String>,

    /// Rules to run (empty = every rule enabled by default)
    pub enabled: Vec<String>,

    /// Ignore rules by id prefix (e.g., "SC00" ignores SC0001..SC0099)
    pub ignore: Vec<String>,

    /// Severity overrides (rule id or name -> severity)
    pub severity: HashMap<String, Severity>,

    /// Per-file rule ignores (glob pattern -> rule ids, or "all")
    pub per_file: HashMap<String, Vec<String>>,
}

/// Generated code detection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratedCodeConfig {
    /// Globs matched against unit paths
    pub patterns: Vec<String>,

    /// Treat a unit whose leading comment contains `<auto-generated` as generated
    pub detect_header: bool,
}

impl Default for GeneratedCodeConfig {
    fn default() -> Self {
        Self {
            patterns: vec![
                "**/*.g.cs".to_string(),
                "**/*.designer.cs".to_string(),
                "**/*.generated.cs".to_string(),
            ],
            detect_header: true,
        }
    }
}

impl GeneratedCodeConfig {
    /// Compile `patterns` into one matcher
    pub fn matcher(&self) -> Result<GlobSet, ConfigError> {
        build_globset(&self.patterns)
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Presets or other configuration files this one builds on
    pub extends: Vec<String>,

    pub engine: EngineConfig,

    pub output: OutputConfig,

    pub rules: RulesConfig,

    pub generated_code: GeneratedCodeConfig,

    /// Rule categories to run (empty = all)
    pub categories: Vec<String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a preset configuration by name
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "recommended" => Some(Self::preset_recommended()),
            "strict" => Some(Self::preset_strict()),
            "minimal" => Some(Self::preset_minimal()),
            _ => None,
        }
    }

    /// Recommended preset - balanced defaults
    fn preset_recommended() -> Self {
        Self {
            categories: vec![
                "correctness".to_string(),
                "suspicious".to_string(),
                "style".to_string(),
            ],
            ..Self::default()
        }
    }

    /// Strict preset - every rule, style findings become errors
    fn preset_strict() -> Self {
        let mut config = Self {
            rules: RulesConfig {
                enabled: vec!["*".to_string()],
                ..RulesConfig::default()
            },
            ..Self::default()
        };
        config
            .rules
            .severity
            .insert("SC*".to_string(), Severity::Error);
        config
    }

    /// Minimal preset - correctness rules only
    fn preset_minimal() -> Self {
        Self {
            categories: vec!["correctness".to_string()],
            ..Self::default()
        }
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with_depth(path, 0)
    }

    fn load_with_depth(path: &Path, depth: usize) -> Result<Self, ConfigError> {
        const MAX_DEPTH: usize = 10;
        if depth >= MAX_DEPTH {
            return Err(ConfigError::Invalid(
                "Maximum config inheritance depth exceeded".to_string(),
            ));
        }

        let content = std::fs::read_to_string(path)?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let config: Self = match ext {
            "yaml" | "yml" => serde_yaml::from_str(&content)?,
            "json" => serde_json::from_str(&content)?,
            _ => {
                return Err(ConfigError::Invalid(format!(
                    "Unknown config file format: {}",
                    ext
                )))
            }
        };
        log::debug!("loaded configuration from {}", path.display());

        if config.extends.is_empty() {
            return Ok(config);
        }

        let base_dir = path.parent().unwrap_or(Path::new("."));
        let mut base = Self::default();
        for extend in &config.extends {
            let extended = match Self::preset(extend) {
                Some(preset) => preset,
                None => {
                    let extend_path = if Path::new(extend).is_absolute() {
                        PathBuf::from(extend)
                    } else {
                        base_dir.join(extend)
                    };
                    Self::load_with_depth(&extend_path, depth + 1)?
                }
            };
            base.merge(extended);
        }
        base.merge(config);
        Ok(base)
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Self) {
        if other.engine.jobs != 0 {
            self.engine.jobs = other.engine.jobs;
        }
        self.engine.parallel = other.engine.parallel;

        if other.output.format != OutputFormat::Text {
            self.output.format = other.output.format;
        }
        if other.output.color != ColorMode::Auto {
            self.output.color = other.output.color;
        }
        if other.output.verbose {
            self.output.verbose = true;
        }

        self.rules.disabled.extend(other.rules.disabled);
        if !other.rules.enabled.is_empty() {
            self.rules.enabled = other.rules.enabled;
        }
        self.rules.ignore.extend(other.rules.ignore);
        self.rules.severity.extend(other.rules.severity);
        for (pattern, rules) in other.rules.per_file {
            self.rules.per_file.entry(pattern).or_default().extend(rules);
        }

        for pattern in other.generated_code.patterns {
            if !self.generated_code.patterns.contains(&pattern) {
                self.generated_code.patterns.push(pattern);
            }
        }
        self.generated_code.detect_header = other.generated_code.detect_header;

        if !other.categories.is_empty() {
            self.categories = other.categories;
        }
    }

    /// Load configuration from default locations
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load_from_dirs(Path::new("."), dirs::home_dir().as_deref())
    }

    /// Probe `project` first, then `home`, else defaults
    pub fn load_from_dirs(project: &Path, home: Option<&Path>) -> Result<Self, ConfigError> {
        for dir in std::iter::once(project).chain(home) {
            for name in CONFIG_FILE_NAMES {
                let path = dir.join(name);
                if path.exists() {
                    return Self::load(&path);
                }
            }
        }
        Ok(Self::default())
    }

    /// Merge CLI arguments into configuration
    pub fn merge_cli(
        &mut self,
        format: Option<OutputFormat>,
        verbose: Option<bool>,
        jobs: Option<usize>,
        disabled_rules: Option<Vec<String>>,
        enabled_rules: Option<Vec<String>>,
    ) {
        if let Some(f) = format {
            self.output.format = f;
        }
        if let Some(v) = verbose {
            self.output.verbose = v;
        }
        if let Some(j) = jobs {
            self.engine.jobs = j;
        }
        if let Some(disabled) = disabled_rules {
            self.rules.disabled.extend(disabled);
        }
        if let Some(enabled) = enabled_rules {
            self.rules.enabled = enabled;
        }
    }

    /// Check if a rule should run
    pub fn is_rule_enabled(&self, rule: &DiagnosticDescriptor) -> bool {
        if self.rules.disabled.iter().any(|p| rule.matches_pattern(p)) {
            return false;
        }

        let id_upper = rule.id.to_uppercase();
        if self
            .rules
            .ignore
            .iter()
            .any(|prefix| id_upper.starts_with(&prefix.to_uppercase()))
        {
            return false;
        }

        if !self.rules.enabled.is_empty() {
            return self.rules.enabled.iter().any(|p| rule.matches_pattern(p));
        }

        if !self.categories.is_empty() {
            let category = rule.category.to_string();
            if !self
                .categories
                .iter()
                .any(|c| c.eq_ignore_ascii_case(&category))
            {
                return false;
            }
        }

        rule.enabled_by_default
    }

    /// Severity override for a rule. An exact id or name wins over a wildcard.
    pub fn severity_override(&self, rule: &DiagnosticDescriptor) -> Option<Severity> {
        self.rules
            .severity
            .get(rule.id)
            .or_else(|| self.rules.severity.get(rule.name))
            .or_else(|| {
                self.rules
                    .severity
                    .iter()
                    .filter(|(pattern, _)| rule.matches_pattern(pattern))
                    .min_by(|a, b| a.0.cmp(b.0))
                    .map(|(_, severity)| severity)
            })
            .copied()
    }

    /// Check if a rule should be ignored for a file
    pub fn should_ignore_rule_for_file(&self, rule: &DiagnosticDescriptor, file_path: &Path) -> bool {
        let file_str = file_path.to_string_lossy();

        for (pattern, rules) in &self.rules.per_file {
            let glob = match Glob::new(pattern) {
                Ok(glob) => glob,
                Err(e) => {
                    log::warn!("ignoring per_file pattern '{}': {}", pattern, e);
                    continue;
                }
            };
            if glob.compile_matcher().is_match(file_str.as_ref())
                && rules.iter().any(|r| rule.matches_pattern(r))
            {
                return true;
            }
        }

        false
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet, ConfigError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| ConfigError::Glob {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| ConfigError::Glob {
        pattern: patterns.join(","),
        source,
    })
}
