//! Sharpcheck CLI - run analyzers and code fixes over host snapshots

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use glob::glob;
use sharpcheck::config::{ColorMode, Config, OutputFormat};
use sharpcheck::fixes::builtin_fixes;
use sharpcheck::output::formatter_for;
use sharpcheck::{registry, Compilation, DiagnosticDescriptor, Engine, Fixer, LintResult, Severity};
use std::path::{Component, Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "sharpcheck",
    version,
    about = "Analyzer and code-fix runner for C# syntax snapshots",
    long_about = "Runs sharpcheck analyzers over JSON snapshots of syntax trees and \
                  symbol bindings exported by a host compiler, and applies code fixes."
)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Number of parallel jobs (0 = auto)
    #[arg(short, long, global = true)]
    jobs: Option<usize>,

    /// Disable specific rules (comma-separated)
    #[arg(long, value_delimiter = ',', global = true)]
    disable: Option<Vec<String>>,

    /// Only enable specific rules (comma-separated)
    #[arg(long, value_delimiter = ',', global = true)]
    select: Option<Vec<String>>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze snapshots and report diagnostics
    Check {
        /// Snapshot files or glob patterns
        #[arg(required = true)]
        snapshots: Vec<String>,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<Format>,

        /// Show per-analyzer timing statistics
        #[arg(long)]
        timing: bool,

        /// Exit with 0 even if diagnostics are found
        #[arg(long)]
        exit_zero: bool,
    },
    /// Apply code fixes to snapshots
    Fix {
        /// Snapshot files or glob patterns
        #[arg(required = true)]
        snapshots: Vec<String>,

        /// Include unsafe fixes (may change code behavior)
        #[arg(long)]
        unsafe_fixes: bool,

        /// Show diff of changes instead of the fixed text
        #[arg(long)]
        diff: bool,

        /// Show all fixes that would be applied
        #[arg(long, conflicts_with = "diff")]
        show_fixes: bool,

        /// Write fixed sources under this directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List available rules
    Rules {
        /// Print descriptors as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show detailed information about a rule
    Explain {
        /// Rule ID or name to explain
        rule_id: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn severity_str(severity: Severity) -> colored::ColoredString {
    match severity {
        Severity::Error => "error".red(),
        Severity::Warning => "warning".yellow(),
        Severity::Info => "info".blue(),
    }
}

fn has_fix(rule: &DiagnosticDescriptor) -> bool {
    builtin_fixes().iter().any(|f| f.can_fix(rule.id))
}

/// Helper function to print a rule in a consistent format
fn print_rule(rule: &DiagnosticDescriptor) {
    println!(
        "    {} {} [{}] ({}){}{}",
        rule.id.cyan(),
        rule.name,
        severity_str(rule.default_severity),
        rule.category,
        if rule.enabled_by_default {
            "".normal()
        } else {
            " [disabled]".dimmed()
        },
        if has_fix(rule) {
            " [fix]".green()
        } else {
            "".normal()
        }
    );
    println!("      {}", rule.title);
}

/// Print detailed rule explanation
fn explain_rule(rule: &DiagnosticDescriptor) {
    println!("{}", "Rule Details".bold());
    println!();
    println!("  {}: {}", "ID".bold(), rule.id.cyan());
    println!("  {}: {}", "Name".bold(), rule.name);
    println!("  {}: {}", "Title".bold(), rule.title);
    println!("  {}: {}", "Severity".bold(), severity_str(rule.default_severity));
    println!("  {}: {}", "Category".bold(), rule.category);
    println!(
        "  {}: {}",
        "Enabled by default".bold(),
        if rule.enabled_by_default { "yes" } else { "no" }
    );
    println!("  {}: {}", "Message".bold(), rule.message_format);

    println!();
    println!("  {}", "Description".bold());
    println!("  {}", rule.description);

    if let Some(bad) = rule.example_bad {
        println!();
        println!("  {} {}", "Example".bold(), "(incorrect)".red());
        for line in bad.lines() {
            println!("    {}", line);
        }
    }

    if let Some(good) = rule.example_good {
        println!();
        println!("  {} {}", "Example".bold(), "(correct)".green());
        for line in good.lines() {
            println!("    {}", line);
        }
    }

    let fixes: Vec<_> = builtin_fixes()
        .into_iter()
        .filter(|f| f.can_fix(rule.id))
        .collect();
    if let Some(fix) = fixes.first() {
        println!();
        println!("  {} ({})", "Code Fix Available".bold(), fix.safety());
    }

    if let Some(link) = rule.help_link {
        println!();
        println!("  {}: {}", "Documentation".bold(), link.blue());
    }
}

fn handle_rules(json: bool) -> Result<i32> {
    let rules: Vec<&DiagnosticDescriptor> = registry().iter().collect();
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&rules).context("failed to serialize rules")?
        );
        return Ok(0);
    }

    println!("{}", "Available rules:".bold());
    println!();
    for rule in rules {
        print_rule(rule);
    }
    Ok(0)
}

fn handle_explain(rule_id: &str) -> Result<i32> {
    match registry().find(rule_id) {
        Some(rule) => {
            explain_rule(rule);
            Ok(0)
        }
        None => {
            eprintln!("{}: Rule '{}' not found", "error".red().bold(), rule_id);
            eprintln!();
            eprintln!("Use {} to see all available rules", "sharpcheck rules".cyan());
            Ok(1)
        }
    }
}

/// Expand glob patterns into existing snapshot files
fn expand_snapshots(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let paths = glob(pattern).with_context(|| format!("invalid pattern '{}'", pattern))?;
        for entry in paths.flatten() {
            if entry.is_file() {
                files.push(entry);
            }
        }
    }
    if files.is_empty() {
        bail!("no snapshot files found");
    }
    Ok(files)
}

fn load_snapshot(path: &Path) -> Result<Compilation> {
    Compilation::load(path).with_context(|| format!("failed to load snapshot {}", path.display()))
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::load_default().context("failed to load config")?,
    };
    config.merge_cli(
        None,
        Some(cli.verbose),
        cli.jobs,
        cli.disable.clone(),
        cli.select.clone(),
    );
    Ok(config)
}

fn use_color(cli: &Cli, config: &Config) -> bool {
    match config.output.color {
        _ if cli.no_color => false,
        ColorMode::Never => false,
        ColorMode::Always => {
            colored::control::set_override(true);
            true
        }
        ColorMode::Auto => colored::control::SHOULD_COLORIZE.should_colorize(),
    }
}

fn analyze_snapshots(engine: &Engine, files: &[PathBuf]) -> Result<LintResult> {
    let mut result = LintResult::default();
    for file in files {
        let compilation = load_snapshot(file)?;
        log::debug!(
            "{}: {} unit(s), {} symbol(s)",
            file.display(),
            compilation.units.len(),
            compilation.symbols.len()
        );
        result.merge(engine.analyze(&compilation));
    }
    Ok(result)
}

fn handle_check(
    cli: &Cli,
    snapshots: &[String],
    format: Option<Format>,
    timing: bool,
    exit_zero: bool,
) -> Result<i32> {
    let mut config = load_config(cli)?;
    if let Some(format) = format {
        config.output.format = match format {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
        };
    }
    let colored = use_color(cli, &config);

    let files = expand_snapshots(snapshots)?;
    let engine = Engine::with_builtin_analyzers(config.clone())
        .context("invalid generated_code patterns")?;
    let result = analyze_snapshots(&engine, &files)?;

    let formatter = formatter_for(config.output.format, colored, config.output.verbose);
    print!("{}", formatter.format(&result));

    if timing {
        eprintln!();
        eprintln!("{}", result.format_timings());
    }

    Ok(if exit_zero { 0 } else { result.exit_code() })
}

/// `dir` joined with the relative form of `path`
fn output_path(dir: &Path, path: &Path) -> PathBuf {
    let relative: PathBuf = path
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect();
    dir.join(relative)
}

fn handle_fix(
    cli: &Cli,
    snapshots: &[String],
    unsafe_fixes: bool,
    diff: bool,
    show_fixes: bool,
    output: Option<&Path>,
) -> Result<i32> {
    let config = load_config(cli)?;
    use_color(cli, &config);
    let engine = Engine::with_builtin_analyzers(config).context("invalid generated_code patterns")?;

    let mut fixes_applied = 0;
    for file in expand_snapshots(snapshots)? {
        let compilation = load_snapshot(&file)?;
        let result = engine.analyze(&compilation);

        let mut fixer = Fixer::new(builtin_fixes());
        if diff {
            fixer = fixer.with_diff_mode();
        } else if show_fixes {
            fixer = fixer.with_show_only();
        }
        if unsafe_fixes {
            fixer = fixer.with_unsafe_fixes(true);
        }
        fixer.collect_from_diagnostics(&result.diagnostics);

        if show_fixes {
            println!("{}", fixer.format_fixes());
            continue;
        }
        if fixer.pending_count() == 0 {
            if cli.verbose {
                eprintln!("{}: no code fixes available", file.display());
            }
            continue;
        }

        let fix_result = fixer.apply_all(&compilation);
        fixes_applied += fix_result.fixes_applied;

        if diff {
            print!("{}", fixer.format_diffs(&fix_result));
        } else {
            for (path, tree) in &fix_result.fixed {
                match output {
                    Some(dir) => {
                        let target = output_path(dir, path);
                        if let Some(parent) = target.parent() {
                            std::fs::create_dir_all(parent)
                                .with_context(|| format!("failed to create {}", parent.display()))?;
                        }
                        std::fs::write(&target, tree.text())
                            .with_context(|| format!("failed to write {}", target.display()))?;
                    }
                    None => {
                        println!("{}", format!("// {}", path.display()).dimmed());
                        println!("{}", tree.text());
                    }
                }
            }
        }

        eprintln!(
            "Applied {} fixes to {} units ({} safe, {} unsafe)",
            fix_result.fixes_applied,
            fix_result.units_modified,
            fix_result.safe_fixes_applied,
            fix_result.unsafe_fixes_applied
        );
        for error in &fix_result.errors {
            eprintln!("{}: {}", "warning".yellow(), error);
        }
        if fix_result.fixes_skipped > 0 {
            eprintln!(
                "{}: {} fixes skipped (unsafe or overlapping; use --unsafe-fixes to include unsafe fixes)",
                "note".blue(),
                fix_result.fixes_skipped
            );
        }
    }

    if cli.verbose && !show_fixes {
        eprintln!("{} fixes applied in total", fixes_applied);
    }
    Ok(0)
}

fn run(cli: &Cli) -> Result<i32> {
    match &cli.command {
        Commands::Check {
            snapshots,
            format,
            timing,
            exit_zero,
        } => handle_check(cli, snapshots, *format, *timing, *exit_zero),
        Commands::Fix {
            snapshots,
            unsafe_fixes,
            diff,
            show_fixes,
            output,
        } => handle_fix(
            cli,
            snapshots,
            *unsafe_fixes,
            *diff,
            *show_fixes,
            output.as_deref(),
        ),
        Commands::Rules { json } => handle_rules(*json),
        Commands::Explain { rule_id } => handle_explain(rule_id),
    }
}

fn main() {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    // Handle --no-color
    if cli.no_color {
        colored::control::set_override(false);
    }

    let exit_code = match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "error".red().bold(), e);
            2
        }
    };
    std::process::exit(exit_code);
}
