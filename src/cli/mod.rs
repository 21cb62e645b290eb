//! CLI command implementations for mvtgen.
//!
//! Provides subcommand handlers for:
//! - `mvtgen generate "description"` — one-shot generation through the workflow
//! - `mvtgen explain config.json` — explain an existing configuration file
//! - `mvtgen validate [file]` — check and pretty-print JSON
//! - `mvtgen examples` — built-in example descriptions
//! - `mvtgen health` — config files, service reachability, activity log
//! - `mvtgen history` — activity summary
//! - `mvtgen config show|init|set|reset` — configuration management

use std::io::Read;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use colored::Colorize;

use crate::activity::report::{self, History};
use crate::activity::{ActivityEntry, ActivityLog, Operation};
use crate::clipboard::SystemClipboard;
use crate::config::{self, MvtConfig};
use crate::ingest::PathSeedFile;
use crate::render::TerminalRenderer;
use crate::service::{ConfigService, ExplainRequest, HttpConfigService};
use crate::validator::{self, JsonValidation};
use crate::workflow::Workflow;
use crate::EXAMPLE_PROMPTS;

/// Output format for report commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

/// Options for `mvtgen generate`.
#[derive(Debug, Default)]
pub struct GenerateOptions {
    pub description: String,
    pub seed: Option<String>,
    pub seed_file: Option<String>,
    pub copy: bool,
    pub explain: bool,
}

// ---------------------------------------------------------------------------
// mvtgen generate
// ---------------------------------------------------------------------------

/// Run one generation through the workflow, drawing each transition.
///
/// Workflow failures are already shown as a banner by the renderer, so they
/// turn into a failing exit code rather than an error.
pub fn run_generate(cfg: &MvtConfig, opts: &GenerateOptions) -> Result<ExitCode> {
    let service = Arc::new(HttpConfigService::from_config(&cfg.service));
    let mut workflow = Workflow::new(service, SystemClipboard, TerminalRenderer::stdout())
        .with_activity(ActivityLog::from_config(&cfg.activity));

    if let Some(path) = &opts.seed_file
        && workflow.ingest_file(&PathSeedFile::new(path)).is_err()
    {
        return Ok(ExitCode::FAILURE);
    }
    if let Some(seed) = &opts.seed {
        workflow.set_seed(seed);
    }
    workflow.set_description(&opts.description);

    if workflow.generate_from_form().is_err() {
        return Ok(ExitCode::FAILURE);
    }
    if opts.explain && workflow.explain().is_err() {
        return Ok(ExitCode::FAILURE);
    }
    if opts.copy {
        if workflow.copy().is_err() {
            return Ok(ExitCode::FAILURE);
        }
        println!("{} Copied to clipboard", "✓".green().bold());
    }

    Ok(ExitCode::SUCCESS)
}

// ---------------------------------------------------------------------------
// mvtgen explain
// ---------------------------------------------------------------------------

/// Explain a configuration stored in a file.
pub fn run_explain(cfg: &MvtConfig, path: &Path) -> Result<ExitCode> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    if let Err(detail) = validator::parse(&text) {
        println!("{}", format!("⚠️ Invalid JSON file: {detail}").red().bold());
        return Ok(ExitCode::FAILURE);
    }

    let service = HttpConfigService::from_config(&cfg.service);
    let activity = ActivityLog::from_config(&cfg.activity);
    let started = Instant::now();
    let outcome = service.explain(&ExplainRequest {
        json: text.trim().to_string(),
    });
    let latency = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    match outcome {
        Ok(explanation) => {
            activity.record(&ActivityEntry::new(Operation::Explain, true).with_latency(latency));
            println!("{}", "--- Explanation ---".dimmed());
            println!("{explanation}");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            activity.record(
                &ActivityEntry::new(Operation::Explain, false)
                    .with_latency(latency)
                    .with_detail(e.to_string()),
            );
            println!("{}", format!("⚠️ {e}").red().bold());
            Ok(ExitCode::FAILURE)
        }
    }
}

// ---------------------------------------------------------------------------
// mvtgen validate
// ---------------------------------------------------------------------------

/// Validate JSON from a file, or from stdin when no path is given.
pub fn run_validate(path: Option<&Path>) -> Result<ExitCode> {
    let text = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };

    match validator::validate(&text) {
        JsonValidation::Empty => {
            println!("{}", "Nothing to validate.".yellow());
            Ok(ExitCode::SUCCESS)
        }
        JsonValidation::Valid { pretty } => {
            println!("{}", "✓ Valid JSON".green().bold());
            println!("{pretty}");
            Ok(ExitCode::SUCCESS)
        }
        JsonValidation::Invalid { detail } => {
            println!("{}", format!("✗ Invalid JSON: {detail}").red().bold());
            Ok(ExitCode::FAILURE)
        }
    }
}

// ---------------------------------------------------------------------------
// mvtgen examples
// ---------------------------------------------------------------------------

pub fn run_examples() -> Result<()> {
    println!("{}", "Example Descriptions".bold().cyan());
    println!("{}", "=".repeat(50));
    for (i, prompt) in EXAMPLE_PROMPTS.iter().enumerate() {
        println!();
        println!("  {} {}", format!("{}.", i + 1).bold(), prompt);
    }
    println!();
    println!(
        "  {} mvtgen generate \"<description>\"",
        "Try:".dimmed()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// mvtgen health
// ---------------------------------------------------------------------------

/// Check config files, service reachability and the activity log.
pub fn run_health() -> Result<()> {
    println!("{}", "mvtgen Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let cfg = config::load();
    print_health_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.mvtgen/config.toml found"
        } else {
            "not found (run `mvtgen config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists {
            ".mvtgen.toml found"
        } else {
            "none (optional)"
        },
    );

    let service = HttpConfigService::from_config(&cfg.service);
    let reachable = service.is_reachable();
    let detail = if reachable {
        format!("reachable at {}", service.base_url())
    } else {
        format!("not reachable at {}", service.base_url())
    };
    print_health_item("Generation service", reachable, &detail);
    print_health_item(
        "Request timeout",
        true,
        &service
            .timeout()
            .map(|t| format!("{}ms", t.as_millis()))
            .unwrap_or_else(|| "none".to_string()),
    );

    if cfg.activity.enabled {
        let log_path = crate::activity::logger::activity_log_path();
        let log_exists = log_path.as_ref().map(|p| p.exists()).unwrap_or(false);
        let detail = if log_exists {
            format!("{} entries", ActivityLog::at_home().read_all().len())
        } else {
            "no log file yet".to_string()
        };
        print_health_item("Activity log", log_exists, &detail);
    } else {
        print_health_item("Activity log", false, "disabled");
    }

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<25} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// mvtgen history
// ---------------------------------------------------------------------------

/// Summarize the activity log.
pub fn run_history(format: OutputFormat, days: Option<u32>) -> Result<()> {
    let entries = ActivityLog::at_home().read_since_days(days);
    let history = report::summarize(&entries, 10);

    if history.total == 0 {
        println!(
            "{}",
            "No activity yet. Generate a configuration to see history.".yellow()
        );
        return Ok(());
    }

    match format {
        OutputFormat::Json => print_history_json(&history)?,
        OutputFormat::Csv => print_history_csv(&history),
        OutputFormat::Table => print_history_table(&history),
    }

    Ok(())
}

fn print_history_table(history: &History) {
    println!("{}", "mvtgen Activity".bold().cyan());
    println!("{}", "=".repeat(60));
    println!("  {} {}", "Total operations:".bold(), history.total);
    println!();

    println!(
        "  {:<10} {:>6} {:>9} {:>10} {:>12}",
        "Operation", "Count", "Failures", "Success", "Avg latency"
    );
    println!("  {}", "-".repeat(51));
    for stat in &history.operations {
        let latency = stat
            .avg_latency_ms
            .map(|ms| format!("{ms:.0}ms"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<10} {:>6} {:>9} {:>9.1}% {:>12}",
            stat.operation.to_string(),
            stat.count,
            stat.failures,
            stat.success_pct(),
            latency,
        );
    }

    if !history.recent.is_empty() {
        println!();
        println!("{}", "Recent".bold().cyan());
        for entry in &history.recent {
            let mark = if entry.success {
                "✓".green()
            } else {
                "✗".red()
            };
            let detail = entry.detail.as_deref().unwrap_or("");
            println!(
                "  {} {} {:<9} {}",
                mark,
                short_timestamp(&entry.timestamp).dimmed(),
                entry.operation.to_string(),
                truncate(detail, 50).dimmed(),
            );
        }
    }
}

fn print_history_json(history: &History) -> Result<()> {
    let value = serde_json::json!({
        "total": history.total,
        "operations": history.operations.iter().map(|s| serde_json::json!({
            "operation": s.operation,
            "count": s.count,
            "failures": s.failures,
            "success_pct": s.success_pct(),
            "avg_latency_ms": s.avg_latency_ms,
        })).collect::<Vec<_>>(),
        "recent": history.recent,
    });

    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn print_history_csv(history: &History) {
    println!("operation,count,failures,success_pct,avg_latency_ms");
    for s in &history.operations {
        println!(
            "{},{},{},{:.1},{}",
            s.operation,
            s.count,
            s.failures,
            s.success_pct(),
            s.avg_latency_ms.map(|ms| format!("{ms:.0}")).unwrap_or_default(),
        );
    }
}

// ---------------------------------------------------------------------------
// mvtgen config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective mvtgen Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source("~/.mvtgen/config.toml", global_exists);
    print_source(".mvtgen.toml", project_exists);
    println!(
        "  {} {}",
        "·".dimmed(),
        "MVTGEN_* environment variables".dimmed()
    );

    Ok(())
}

fn print_source(name: &str, exists: bool) {
    if exists {
        println!("  {} {}", "✓".green(), name.dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), format!("{name} (not found)").dimmed());
    }
}

/// Initialize a default config file at `~/.mvtgen/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    println!("  {}", "Edit the file to point at your service.".dimmed());
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Truncate a string to `max_len` characters, appending "…" if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

/// `2026-03-01T12:34:56.789+00:00` → `2026-03-01 12:34`.
fn short_timestamp(ts: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(ts)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| ts.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 5), "hell…");
        assert_eq!(truncate("ab", 2), "ab");
        assert_eq!(truncate("✓✓✓✓", 3), "✓✓…");
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!(OutputFormat::from_str_opt(None), OutputFormat::Table);
        assert_eq!(OutputFormat::from_str_opt(Some("json")), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str_opt(Some("csv")), OutputFormat::Csv);
        assert_eq!(
            OutputFormat::from_str_opt(Some("unknown")),
            OutputFormat::Table
        );
    }

    #[test]
    fn test_short_timestamp() {
        assert_eq!(
            short_timestamp("2026-03-01T12:34:56.789+00:00"),
            "2026-03-01 12:34"
        );
        assert_eq!(short_timestamp("garbage"), "garbage");
    }
}
