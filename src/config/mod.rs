/// Configuration system for mvtgen.
///
/// Layered, later layers win at the key level:
///
/// 1. **Built-in defaults** — [`schema::MvtConfig::default()`]
/// 2. **User global config** — `~/.mvtgen/config.toml`
/// 3. **Project local config** — `.mvtgen.toml` in the current directory
/// 4. **Environment variables** — `MVTGEN_*` overrides
///
/// Malformed files are ignored rather than aborting the client.
pub mod schema;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub use schema::{ActivityConfig, MvtConfig, ServiceConfig, UiConfig};
use schema::ConfigLayer;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
pub fn load() -> MvtConfig {
    let mut config = MvtConfig::default();

    if let Some(global) = load_layer(global_config_path()) {
        global.apply_to(&mut config);
    }

    if let Some(project) = load_layer(project_config_path()) {
        project.apply_to(&mut config);
    }

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    config
}

/// Read a partial config file. `None` if missing or malformed.
fn load_layer(path: Option<PathBuf>) -> Option<ConfigLayer> {
    let path = path?;
    let content = fs::read_to_string(&path).ok()?;
    toml::from_str(&content).ok()
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".mvtgen").join("config.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".mvtgen.toml"))
}

/// Path to the global config file, for display and init.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Path to the project config file, for display.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment overrides (highest precedence layer).
///
/// - `MVTGEN_SERVICE_URL` — service base URL
/// - `MVTGEN_TIMEOUT_MS` — request timeout
/// - `MVTGEN_COLOR` — coloured output (`1`/`true`/`yes`/`on`)
/// - `MVTGEN_ACTIVITY_LOG` — activity log on/off
fn apply_env_overrides(config: &mut MvtConfig, var: impl Fn(&str) -> Option<String>) {
    if let Some(val) = var("MVTGEN_SERVICE_URL")
        && !val.is_empty()
    {
        config.service.base_url = val;
    }
    if let Some(val) = var("MVTGEN_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.service.timeout_ms = ms;
    }
    if let Some(val) = var("MVTGEN_COLOR") {
        config.ui.color = is_truthy(&val);
    }
    if let Some(val) = var("MVTGEN_ACTIVITY_LOG") {
        config.activity.enabled = is_truthy(&val);
    }
}

fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the annotated default config to `~/.mvtgen/config.toml`.
///
/// Fails if the file exists unless `force` is set.
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.mvtgen/ directory")?;
    }

    fs::write(&path, MvtConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a dotted key (e.g. `service.base_url`) in the global config file.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let content = if path.exists() {
        fs::read_to_string(&path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&MvtConfig::default())
            .context("failed to serialize default config")?
    };

    let mut root: toml::Value =
        toml::from_str(&content).context("failed to parse config as TOML value")?;
    set_toml_value(&mut root, key, value)?;

    // Reject edits that would no longer deserialize.
    let output = toml::to_string_pretty(&root).context("failed to serialize config")?;
    toml::from_str::<MvtConfig>(&output)
        .with_context(|| format!("invalid value for '{key}': {value}"))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, output).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML tree by dotted key, keeping the existing type.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let Some((section, leaf)) = key.rsplit_once('.') else {
        anyhow::bail!("config key must be `section.key`, got '{key}'");
    };

    let mut current = root;
    for part in section.split('.') {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let table = current
        .as_table_mut()
        .with_context(|| format!("expected table at '{section}'"))?;

    let new_value = match table.get(leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::String(_)) => toml::Value::String(raw_value.to_string()),
        Some(_) => anyhow::bail!("unsupported value type for '{key}'"),
        None => anyhow::bail!("unknown config key '{key}'"),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Overwrite the global config with defaults.
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// The effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
