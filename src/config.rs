//! Tool configuration.
//!
//! Handles loading, validating, and merging `siteops.toml`. The file is
//! optional and sparse: stock defaults are serialized to a TOML table, the
//! user file is merged on top key-by-key, and the result is deserialized and
//! validated.
//!
//! ## Config File Location
//!
//! ```text
//! site/
//! ├── siteops.toml        # Optional, overrides stock defaults
//! ├── index.html
//! └── assets/
//!     ├── css/
//!     └── js/
//! ```
//!
//! A different file can be passed with `--config`.
//!
//! ## Configuration Options
//!
//! ```toml
//! [collect]
//! skip_dirs = ["node_modules"]
//! partials = ["header.html", "footer.html"]
//!
//! [optimize]
//! css_dir = "assets/css"
//! js_dir = "assets/js"
//! js_denylist = ["jquery", "bootstrap", "swiper", "gsap"]
//!
//! [validate]
//! critical_assets = ["assets/css/main.css", "assets/js/main.js", ...]
//! seo_files = ["sitemap.xml", "robots.txt", "manifest.json"]
//! security_files = [".htaccess", "assets/js/security.js"]
//! performance_files = ["sw.js", "assets/js/performance.js"]
//!
//! [smoke]
//! required_files = ["index.html", "about.html", ...]
//! lazy_threshold = 80.0
//! alt_threshold = 90.0
//!
//! [serve]
//! host = "127.0.0.1"
//! port = 3000
//!
//! [processing]
//! max_processes = 4
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Default config file name, looked up in the site root.
pub const CONFIG_FILENAME: &str = "siteops.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Directory pruning for every file scan.
    pub collect: CollectConfig,
    /// Asset locations and vendored-library exclusions for minification.
    pub optimize: OptimizeConfig,
    /// File lists checked by `validate`.
    pub validate: ValidateConfig,
    /// Required files and coverage thresholds for `test`.
    pub smoke: SmokeConfig,
    /// Bind address for `serve`.
    pub serve: ServeConfig,
    /// Parallel minification settings.
    pub processing: ProcessingConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("smoke.lazy_threshold", self.smoke.lazy_threshold),
            ("smoke.alt_threshold", self.smoke.alt_threshold),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(ConfigError::Validation(format!("{name} must be 0-100")));
            }
        }
        let lists = [
            ("collect.skip_dirs", &self.collect.skip_dirs),
            ("collect.partials", &self.collect.partials),
            ("optimize.js_denylist", &self.optimize.js_denylist),
            ("validate.critical_assets", &self.validate.critical_assets),
            ("validate.seo_files", &self.validate.seo_files),
            ("validate.security_files", &self.validate.security_files),
            ("validate.performance_files", &self.validate.performance_files),
            ("smoke.required_files", &self.smoke.required_files),
        ];
        for (name, list) in lists {
            if list.iter().any(|s| s.trim().is_empty()) {
                return Err(ConfigError::Validation(format!(
                    "{name} must not contain empty entries"
                )));
            }
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CollectConfig {
    /// Directory names never descended into (hidden directories are always skipped).
    pub skip_dirs: Vec<String>,
    /// HTML fragments (relative to the root) included into other pages.
    /// Document-level checks (title, doctype, ...) do not apply to them.
    pub partials: Vec<String>,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            skip_dirs: vec!["node_modules".to_string()],
            partials: strings(&["header.html", "footer.html"]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizeConfig {
    /// Stylesheet directory, relative to the site root.
    pub css_dir: String,
    /// Script directory, relative to the site root.
    pub js_dir: String,
    /// Scripts whose path contains any of these fragments are left alone.
    pub js_denylist: Vec<String>,
}

impl Default for OptimizeConfig {
    fn default() -> Self {
        Self {
            css_dir: "assets/css".to_string(),
            js_dir: "assets/js".to_string(),
            js_denylist: strings(&["jquery", "bootstrap", "swiper", "gsap"]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidateConfig {
    /// Missing ⇒ fail. Image files must also decode.
    pub critical_assets: Vec<String>,
    /// Missing ⇒ warn.
    pub seo_files: Vec<String>,
    /// Missing ⇒ warn.
    pub security_files: Vec<String>,
    /// Missing ⇒ warn.
    pub performance_files: Vec<String>,
}

impl Default for ValidateConfig {
    fn default() -> Self {
        Self {
            critical_assets: strings(&[
                "assets/css/main.css",
                "assets/js/main.js",
                "assets/images/logo/logo.png",
                "header.html",
                "footer.html",
            ]),
            seo_files: strings(&["sitemap.xml", "robots.txt", "manifest.json"]),
            security_files: strings(&[".htaccess", "assets/js/security.js"]),
            performance_files: strings(&["sw.js", "assets/js/performance.js"]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SmokeConfig {
    /// Top-level files every deploy must contain.
    pub required_files: Vec<String>,
    /// Lazy-loading coverage must be strictly above this percentage to pass.
    pub lazy_threshold: f64,
    /// Alt-text coverage must be strictly above this percentage to pass.
    pub alt_threshold: f64,
}

impl Default for SmokeConfig {
    fn default() -> Self {
        Self {
            required_files: strings(&[
                "index.html",
                "about.html",
                "service.html",
                "project.html",
                "contact.html",
                "header.html",
                "footer.html",
                "privacy-policy.html",
                "terms-of-service.html",
                "404.html",
                "500.html",
                "sitemap.xml",
                "robots.txt",
                "manifest.json",
                ".htaccess",
            ]),
            lazy_threshold: 80.0,
            alt_threshold: 90.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServeConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel minification workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Stock defaults as a `toml::Value::Table`, the base layer for merging.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(SiteConfig::default())
        .map_err(|e| ConfigError::Validation(format!("stock defaults do not serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely, so a list in
///   the user file replaces the stock list rather than extending it.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the stock defaults, deserialize, validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`. A missing file means stock defaults.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    let overlay = if path.exists() {
        let content = fs::read_to_string(path)?;
        Some(toml::from_str::<toml::Value>(&content)?)
    } else {
        tracing::debug!("no config at {}, using stock defaults", path.display());
        None
    };
    resolve_config(overlay)
}

/// Returns a fully-commented stock `siteops.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# siteops configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Lists replace the defaults entirely.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# File discovery
# ---------------------------------------------------------------------------
[collect]
# Directory names never scanned. Hidden directories (.git, ...) are always skipped.
skip_dirs = ["node_modules"]
# HTML fragments included into other pages. Document-level checks
# (title, doctype, charset, ...) are skipped for them.
partials = ["header.html", "footer.html"]

# ---------------------------------------------------------------------------
# Minification (siteops optimize)
# ---------------------------------------------------------------------------
[optimize]
# HTML is collected from the whole site root.
css_dir = "assets/css"
js_dir = "assets/js"
# Scripts whose path contains any of these are vendored and left untouched.
js_denylist = ["jquery", "bootstrap", "swiper", "gsap"]

# ---------------------------------------------------------------------------
# Validation (siteops validate)
# ---------------------------------------------------------------------------
[validate]
# Missing => failure. Images listed here must also decode.
critical_assets = [
    "assets/css/main.css",
    "assets/js/main.js",
    "assets/images/logo/logo.png",
    "header.html",
    "footer.html",
]
# Missing => warning.
seo_files = ["sitemap.xml", "robots.txt", "manifest.json"]
security_files = [".htaccess", "assets/js/security.js"]
performance_files = ["sw.js", "assets/js/performance.js"]

# ---------------------------------------------------------------------------
# Smoke tests (siteops test)
# ---------------------------------------------------------------------------
[smoke]
# Missing => failure.
required_files = [
    "index.html",
    "about.html",
    "service.html",
    "project.html",
    "contact.html",
    "header.html",
    "footer.html",
    "privacy-policy.html",
    "terms-of-service.html",
    "404.html",
    "500.html",
    "sitemap.xml",
    "robots.txt",
    "manifest.json",
    ".htaccess",
]
# Coverage must be strictly above the threshold (percent) to pass.
lazy_threshold = 80.0
alt_threshold = 90.0

# ---------------------------------------------------------------------------
# Static server (siteops serve)
# ---------------------------------------------------------------------------
[serve]
# --port and the PORT environment variable take precedence.
host = "127.0.0.1"
port = 3000

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel minification workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
