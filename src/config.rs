//! Application configuration: TOML file loading, merging, and defaults.
//!
//! Resolution order (first found wins, values merge/override):
//! 1. `$MDT_CONFIG` environment variable (path to config file)
//! 2. Project-local `.mdt.toml` in the current working directory
//! 3. Global `~/.config/mdt/config.toml`
//! 4. Built-in defaults

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

// ── Section configs ──────────────────────────────────────────────────────────

/// General application settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable mouse support.
    pub mouse: Option<bool>,
    /// Initial fraction of the width given to the tree pane.
    pub split_ratio: Option<f64>,
}

/// Progressive scan settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ScanConfig {
    /// Depth at which the automatic deepening cadence stops.
    pub depth_ceiling: Option<i32>,
    /// Delay before the first deepening step, in milliseconds.
    pub initial_delay_ms: Option<u64>,
    /// Delay between deepening steps, in milliseconds.
    pub step_delay_ms: Option<u64>,
}

/// Markdown rendering settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RenderConfig {
    /// Syntax highlighting theme (syntect theme name).
    pub syntax_theme: Option<String>,
    /// Minimum readable wrap width for the content pane.
    pub min_wrap_width: Option<usize>,
}

/// Theme configuration section.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeConfig {
    /// Color scheme: "dark" or "light".
    pub scheme: Option<String>,
}

// ── Top-level config ─────────────────────────────────────────────────────────

/// Top-level application configuration.
///
/// All fields are optional so that partial configs from different sources
/// can be merged together (file overrides defaults).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub scan: ScanConfig,
    pub render: RenderConfig,
    pub theme: ThemeConfig,
}

// ── Default constants ────────────────────────────────────────────────────────

/// Default tree/content split ratio.
pub const DEFAULT_SPLIT_RATIO: f64 = 0.3;
/// Default automatic deepening ceiling.
pub const DEFAULT_DEPTH_CEILING: i32 = 5;
/// Default delay before the first deepening step.
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 500;
/// Default delay between deepening steps.
pub const DEFAULT_STEP_DELAY_MS: u64 = 50;
/// Default syntect theme.
pub const DEFAULT_SYNTAX_THEME: &str = "base16-ocean.dark";
/// Default minimum wrap width.
pub const DEFAULT_MIN_WRAP_WIDTH: usize = 40;

// ── Config file locator ──────────────────────────────────────────────────────

/// Return the list of candidate config file paths in priority order.
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(env_path) = std::env::var("MDT_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".mdt.toml"));
    }

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("mdt").join("config.toml"));
    }

    paths
}

/// Try to read and parse a TOML config file. Returns `None` if the file
/// doesn't exist or can't be parsed (with a warning printed to stderr).
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<AppConfig>(&content) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            eprintln!(
                "Warning: failed to parse config file {}: {}",
                path.display(),
                e
            );
            None
        }
    }
}

impl AppConfig {
    /// Merge `other` on top of `self` — `other`'s `Some` values win.
    pub fn merge(self, other: &AppConfig) -> AppConfig {
        AppConfig {
            general: GeneralConfig {
                mouse: other.general.mouse.or(self.general.mouse),
                split_ratio: other.general.split_ratio.or(self.general.split_ratio),
            },
            scan: ScanConfig {
                depth_ceiling: other.scan.depth_ceiling.or(self.scan.depth_ceiling),
                initial_delay_ms: other.scan.initial_delay_ms.or(self.scan.initial_delay_ms),
                step_delay_ms: other.scan.step_delay_ms.or(self.scan.step_delay_ms),
            },
            render: RenderConfig {
                syntax_theme: other
                    .render
                    .syntax_theme
                    .clone()
                    .or(self.render.syntax_theme),
                min_wrap_width: other.render.min_wrap_width.or(self.render.min_wrap_width),
            },
            theme: ThemeConfig {
                scheme: other.theme.scheme.clone().or(self.theme.scheme),
            },
        }
    }

    /// Load config from the first candidate file found, lowest priority first.
    pub fn load() -> AppConfig {
        let mut merged = AppConfig::default();
        for path in candidate_paths().iter().rev() {
            if let Some(cfg) = load_file(path) {
                merged = merged.merge(&cfg);
            }
        }
        merged
    }

    /// Resolve all options into concrete runtime settings.
    pub fn resolve(&self) -> Settings {
        Settings {
            mouse: self.general.mouse.unwrap_or(true),
            split_ratio: self
                .general
                .split_ratio
                .unwrap_or(DEFAULT_SPLIT_RATIO)
                .clamp(0.2, 0.5),
            depth_ceiling: self.scan.depth_ceiling.unwrap_or(DEFAULT_DEPTH_CEILING),
            initial_delay: Duration::from_millis(
                self.scan.initial_delay_ms.unwrap_or(DEFAULT_INITIAL_DELAY_MS),
            ),
            step_delay: Duration::from_millis(
                self.scan.step_delay_ms.unwrap_or(DEFAULT_STEP_DELAY_MS),
            ),
            syntax_theme: self
                .render
                .syntax_theme
                .clone()
                .unwrap_or_else(|| DEFAULT_SYNTAX_THEME.to_string()),
            min_wrap_width: self
                .render
                .min_wrap_width
                .unwrap_or(DEFAULT_MIN_WRAP_WIDTH),
            scheme: self
                .theme
                .scheme
                .clone()
                .unwrap_or_else(|| "dark".to_string()),
        }
    }
}

/// Fully resolved runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub mouse: bool,
    pub split_ratio: f64,
    pub depth_ceiling: i32,
    pub initial_delay: Duration,
    pub step_delay: Duration,
    pub syntax_theme: String,
    pub min_wrap_width: usize,
    pub scheme: String,
}

impl Default for Settings {
    fn default() -> Self {
        AppConfig::default().resolve()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_resolve() {
        let s = AppConfig::default().resolve();
        assert_eq!(s.split_ratio, DEFAULT_SPLIT_RATIO);
        assert_eq!(s.depth_ceiling, DEFAULT_DEPTH_CEILING);
        assert_eq!(s.initial_delay, Duration::from_millis(500));
        assert_eq!(s.step_delay, Duration::from_millis(50));
        assert_eq!(s.syntax_theme, DEFAULT_SYNTAX_THEME);
        assert_eq!(s.min_wrap_width, 40);
        assert!(s.mouse);
    }

    #[test]
    fn merge_overrides_take_precedence() {
        let base = AppConfig::default();
        let over: AppConfig = toml::from_str(
            r#"
            [scan]
            depth_ceiling = 9
            [render]
            syntax_theme = "InspiredGitHub"
            "#,
        )
        .unwrap();
        let merged = base.merge(&over);
        let s = merged.resolve();
        assert_eq!(s.depth_ceiling, 9);
        assert_eq!(s.syntax_theme, "InspiredGitHub");
        // Untouched values keep defaults.
        assert_eq!(s.split_ratio, DEFAULT_SPLIT_RATIO);
    }

    #[test]
    fn split_ratio_clamped_on_resolve() {
        let cfg: AppConfig = toml::from_str("[general]\nsplit_ratio = 0.9").unwrap();
        assert_eq!(cfg.resolve().split_ratio, 0.5);
        let cfg: AppConfig = toml::from_str("[general]\nsplit_ratio = 0.01").unwrap();
        assert_eq!(cfg.resolve().split_ratio, 0.2);
    }

    #[test]
    fn partial_toml_parses() {
        let cfg: AppConfig = toml::from_str("[general]\nmouse = false").unwrap();
        assert_eq!(cfg.general.mouse, Some(false));
        assert!(cfg.scan.depth_ceiling.is_none());
    }

    #[test]
    fn garbage_toml_is_rejected() {
        assert!(toml::from_str::<AppConfig>("not toml at all [").is_err());
    }
}
