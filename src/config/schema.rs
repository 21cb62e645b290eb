/// Configuration schema and defaults for mvtgen.
///
/// Sections: `[service]`, `[ui]`, `[activity]`. Every field has a built-in
/// default; config files only need the keys they want to change.
use serde::{Deserialize, Serialize};

/// Default base URL of the generation service.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Fully resolved mvtgen configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MvtConfig {
    pub service: ServiceConfig,
    pub ui: UiConfig,
    pub activity: ActivityConfig,
}

// ---------------------------------------------------------------------------
// [service]
// ---------------------------------------------------------------------------

/// Where and how to reach the generation service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base path; `/generate` and `/explain` are appended.
    pub base_url: String,
    /// Request timeout in milliseconds. `0` disables the timeout.
    pub timeout_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// [ui]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Coloured terminal output.
    pub color: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { color: true }
    }
}

// ---------------------------------------------------------------------------
// [activity]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityConfig {
    /// Append each operation to `~/.mvtgen/activity.jsonl`.
    pub enabled: bool,
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

// ---------------------------------------------------------------------------
// Partial layers
// ---------------------------------------------------------------------------

/// A config file as written on disk: every key optional.
///
/// Only keys present in the file override the layer below it.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ConfigLayer {
    service: Option<ServiceLayer>,
    ui: Option<UiLayer>,
    activity: Option<ActivityLayer>,
}

#[derive(Debug, Default, Deserialize)]
struct ServiceLayer {
    base_url: Option<String>,
    timeout_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct UiLayer {
    color: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct ActivityLayer {
    enabled: Option<bool>,
}

impl ConfigLayer {
    /// Merge this layer's explicitly-set keys into `config`.
    pub(crate) fn apply_to(&self, config: &mut MvtConfig) {
        if let Some(service) = &self.service {
            if let Some(ref url) = service.base_url {
                config.service.base_url = url.clone();
            }
            if let Some(ms) = service.timeout_ms {
                config.service.timeout_ms = ms;
            }
        }
        if let Some(color) = self.ui.as_ref().and_then(|ui| ui.color) {
            config.ui.color = color;
        }
        if let Some(enabled) = self.activity.as_ref().and_then(|a| a.enabled) {
            config.activity.enabled = enabled;
        }
    }
}

impl MvtConfig {
    /// Annotated default config written by `mvtgen config init`.
    pub fn default_toml() -> &'static str {
        r#"# mvtgen configuration
#
# Layers (highest priority last): built-in defaults, ~/.mvtgen/config.toml,
# .mvtgen.toml in the current directory, MVTGEN_* environment variables.

[service]
# Base path of the generation service. /generate and /explain are appended.
base_url = "http://localhost:5000/api"
# Request timeout in milliseconds (0 = wait indefinitely).
timeout_ms = 0

[ui]
color = true

[activity]
# Record each operation in ~/.mvtgen/activity.jsonl
enabled = true
"#
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
