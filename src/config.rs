//! Application configuration: TOML file loading, CLI overrides, and defaults.
//!
//! Resolution order (first found wins, values merge/override):
//! 1. CLI flags (`--config`, `--folder`, `--no-metadata`, `--theme`, etc.)
//! 2. `$INVTREE_CONFIG` environment variable (path to config file)
//! 3. Project-local `.invtree.toml` in the current working directory
//! 4. Global `~/.config/invtree/config.toml`
//! 5. Built-in defaults

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::inventory::source::DEFAULT_EXTENSION;
use crate::inventory::ColumnNames;
use crate::tree::navigator::DEFAULT_LINK_PREFIX;

// ── Section configs ──────────────────────────────────────────────────────────

/// Where the inventory lives and how its columns are named.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct InventoryConfig {
    /// File path, directory, or http(s) URL of the inventory.
    pub source: Option<String>,
    /// Extension used when `source` is a directory of snapshots.
    pub extension: Option<String>,
    pub key_column: Option<String>,
    pub size_column: Option<String>,
    pub modified_column: Option<String>,
}

/// General application settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Folder to open on start, e.g. `"photos/2024"`.
    pub initial_folder: Option<String>,
    /// Enable mouse support.
    pub mouse: Option<bool>,
    /// Read size and timestamp for the files in each opened folder.
    pub fetch_metadata: Option<bool>,
    /// Prefix of the link shown for a selected file.
    pub link_prefix: Option<String>,
}

/// Log output settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// "trace", "debug", "info", "warn", "error" or "off".
    pub level: Option<String>,
    /// Directory for rolling log files.
    pub directory: Option<PathBuf>,
}

/// Color settings for a single theme palette.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeColorsConfig {
    pub tree_bg: Option<String>,
    pub tree_fg: Option<String>,
    pub tree_selected_bg: Option<String>,
    pub tree_selected_fg: Option<String>,
    pub tree_dir_fg: Option<String>,
    pub tree_file_fg: Option<String>,
    pub meta_fg: Option<String>,
    pub crumb_fg: Option<String>,
    pub status_bg: Option<String>,
    pub status_fg: Option<String>,
    pub border_fg: Option<String>,
    pub dialog_bg: Option<String>,
}

/// Theme configuration section.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ThemeConfig {
    /// Color scheme: "dark", "light", "custom".
    pub scheme: Option<String>,
    /// Custom color overrides.
    pub custom: Option<ThemeColorsConfig>,
}

// ── Top-level config ─────────────────────────────────────────────────────────

/// Top-level application configuration.
///
/// All fields are optional so that partial configs from different sources
/// can be merged together (CLI overrides file, file overrides defaults).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub inventory: InventoryConfig,
    pub general: GeneralConfig,
    pub logging: LoggingConfig,
    pub theme: ThemeConfig,
}

// ── Default constants ────────────────────────────────────────────────────────

/// Default inventory location, relative to the working directory.
pub const DEFAULT_SOURCE: &str = "../inventory.parquet";
/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// ── Config file locator ──────────────────────────────────────────────────────

/// Return the list of candidate config file paths in priority order.
///
/// Does NOT include the CLI `--config` path, which is handled separately.
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Ok(env_path) = std::env::var("INVTREE_CONFIG") {
        paths.push(PathBuf::from(env_path));
    }

    if let Ok(cwd) = std::env::current_dir() {
        paths.push(cwd.join(".invtree.toml"));
    }

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("invtree").join("config.toml"));
    }

    paths
}

/// Try to read and parse a TOML config file. Returns `None` if the file
/// doesn't exist or can't be parsed (with a warning logged).
fn load_file(path: &Path) -> Option<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => return None,
    };
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

// ── Merge logic ──────────────────────────────────────────────────────────────

impl AppConfig {
    /// Merge `other` on top of `self`; `other`'s `Some` values win.
    pub fn merge(self, other: &AppConfig) -> AppConfig {
        AppConfig {
            inventory: InventoryConfig {
                source: other.inventory.source.clone().or(self.inventory.source),
                extension: other.inventory.extension.clone().or(self.inventory.extension),
                key_column: other
                    .inventory
                    .key_column
                    .clone()
                    .or(self.inventory.key_column),
                size_column: other
                    .inventory
                    .size_column
                    .clone()
                    .or(self.inventory.size_column),
                modified_column: other
                    .inventory
                    .modified_column
                    .clone()
                    .or(self.inventory.modified_column),
            },
            general: GeneralConfig {
                initial_folder: other
                    .general
                    .initial_folder
                    .clone()
                    .or(self.general.initial_folder),
                mouse: other.general.mouse.or(self.general.mouse),
                fetch_metadata: other.general.fetch_metadata.or(self.general.fetch_metadata),
                link_prefix: other
                    .general
                    .link_prefix
                    .clone()
                    .or(self.general.link_prefix),
            },
            logging: LoggingConfig {
                level: other.logging.level.clone().or(self.logging.level),
                directory: other.logging.directory.clone().or(self.logging.directory),
            },
            theme: ThemeConfig {
                scheme: other.theme.scheme.clone().or(self.theme.scheme),
                custom: match (&self.theme.custom, &other.theme.custom) {
                    (_, Some(o)) => Some(o.clone()),
                    (Some(s), None) => Some(s.clone()),
                    (None, None) => None,
                },
            },
        }
    }

    /// Load the final merged configuration.
    ///
    /// `cli_config_path` is an explicit config file path from `--config`.
    /// `cli_overrides` are partial overrides derived from CLI flags.
    pub fn load(cli_config_path: Option<&Path>, cli_overrides: Option<&AppConfig>) -> AppConfig {
        let mut config = AppConfig::default();

        // Walk in reverse so that highest-priority (env var) overwrites lower.
        for path in candidate_paths().iter().rev() {
            if let Some(file_cfg) = load_file(path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(cli_path) = cli_config_path {
            if let Some(file_cfg) = load_file(cli_path) {
                config = config.merge(&file_cfg);
            }
        }

        if let Some(overrides) = cli_overrides {
            config = config.merge(overrides);
        }

        config
    }

    // ── Convenience getters with built-in defaults ──────────────────────────

    pub fn source(&self) -> &str {
        self.inventory.source.as_deref().unwrap_or(DEFAULT_SOURCE)
    }

    pub fn extension(&self) -> &str {
        self.inventory
            .extension
            .as_deref()
            .unwrap_or(DEFAULT_EXTENSION)
    }

    /// Column names with defaults filled in.
    pub fn columns(&self) -> ColumnNames {
        let defaults = ColumnNames::default();
        ColumnNames {
            key: self.inventory.key_column.clone().unwrap_or(defaults.key),
            size: self.inventory.size_column.clone().unwrap_or(defaults.size),
            modified: self
                .inventory
                .modified_column
                .clone()
                .unwrap_or(defaults.modified),
        }
    }

    pub fn initial_folder(&self) -> Option<&str> {
        self.general
            .initial_folder
            .as_deref()
            .filter(|f| !f.is_empty())
    }

    pub fn mouse_enabled(&self) -> bool {
        self.general.mouse.unwrap_or(true)
    }

    pub fn fetch_metadata(&self) -> bool {
        self.general.fetch_metadata.unwrap_or(true)
    }

    pub fn link_prefix(&self) -> &str {
        self.general
            .link_prefix
            .as_deref()
            .unwrap_or(DEFAULT_LINK_PREFIX)
    }

    pub fn log_level(&self) -> &str {
        self.logging.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    /// Log directory: configured value, else `<data_dir>/invtree/logs`.
    pub fn log_directory(&self) -> PathBuf {
        self.logging.directory.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("invtree")
                .join("logs")
        })
    }

    /// Theme scheme: "dark", "light", or "custom".
    pub fn theme_scheme(&self) -> &str {
        self.theme.scheme.as_deref().unwrap_or("dark")
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_values() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.source(), "../inventory.parquet");
        assert_eq!(cfg.extension(), ".parquet");
        assert_eq!(cfg.columns(), ColumnNames::default());
        assert_eq!(cfg.initial_folder(), None);
        assert!(cfg.mouse_enabled());
        assert!(cfg.fetch_metadata());
        assert_eq!(cfg.link_prefix(), "/index.html?file=");
        assert_eq!(cfg.log_level(), "info");
        assert_eq!(cfg.theme_scheme(), "dark");
    }

    #[test]
    fn test_toml_parsing_full() {
        let toml = r#"
[inventory]
source = "https://bucket.example/inventory/inventory.parquet"
extension = ".pq"
key_column = "Key"
size_column = "Size"
modified_column = "LastModifiedDate"

[general]
initial_folder = "photos/2024"
mouse = false
fetch_metadata = false
link_prefix = "https://cdn.example/"

[logging]
level = "debug"
directory = "/tmp/invtree-logs"

[theme]
scheme = "light"
"#;
        let cfg: AppConfig = toml::from_str(toml).expect("parse failed");
        assert_eq!(
            cfg.source(),
            "https://bucket.example/inventory/inventory.parquet"
        );
        assert_eq!(cfg.extension(), ".pq");
        assert_eq!(cfg.columns().key, "Key");
        assert_eq!(cfg.columns().size, "Size");
        assert_eq!(cfg.columns().modified, "LastModifiedDate");
        assert_eq!(cfg.initial_folder(), Some("photos/2024"));
        assert!(!cfg.mouse_enabled());
        assert!(!cfg.fetch_metadata());
        assert_eq!(cfg.link_prefix(), "https://cdn.example/");
        assert_eq!(cfg.log_level(), "debug");
        assert_eq!(cfg.log_directory(), PathBuf::from("/tmp/invtree-logs"));
        assert_eq!(cfg.theme_scheme(), "light");
    }

    #[test]
    fn test_toml_parsing_partial() {
        let toml = r#"
[inventory]
key_column = "object_key"
"#;
        let cfg: AppConfig = toml::from_str(toml).expect("parse failed");
        assert_eq!(cfg.columns().key, "object_key");
        // Everything else should be defaults
        assert_eq!(cfg.columns().size, "size");
        assert_eq!(cfg.source(), DEFAULT_SOURCE);
    }

    #[test]
    fn test_empty_initial_folder_is_none() {
        let cfg: AppConfig = toml::from_str("[general]\ninitial_folder = \"\"").expect("parse");
        assert_eq!(cfg.initial_folder(), None);
    }

    #[test]
    fn test_merge_overrides() {
        let base = AppConfig {
            inventory: InventoryConfig {
                source: Some("a.parquet".into()),
                key_column: Some("k".into()),
                ..Default::default()
            },
            general: GeneralConfig {
                mouse: Some(false),
                ..Default::default()
            },
            ..Default::default()
        };
        let over = AppConfig {
            inventory: InventoryConfig {
                source: Some("b.parquet".into()),
                ..Default::default()
            },
            ..Default::default()
        };

        let merged = base.merge(&over);
        assert_eq!(merged.source(), "b.parquet"); // overridden
        assert_eq!(merged.columns().key, "k"); // from base
        assert!(!merged.mouse_enabled()); // from base
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg_path = dir.path().join("test-config.toml");
        let mut f = std::fs::File::create(&cfg_path).expect("create");
        writeln!(
            f,
            r#"
[inventory]
source = "/data/inventory"

[general]
initial_folder = "a/b"
"#
        )
        .expect("write");

        let cfg = load_file(&cfg_path).expect("load");
        assert_eq!(cfg.source(), "/data/inventory");
        assert_eq!(cfg.initial_folder(), Some("a/b"));
        assert!(cfg.fetch_metadata());
    }

    #[test]
    fn test_load_invalid_toml_returns_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg_path = dir.path().join("bad.toml");
        std::fs::write(&cfg_path, "this is { not valid toml").expect("write");
        assert!(load_file(&cfg_path).is_none());
        assert!(load_file(Path::new("/nonexistent/config.toml")).is_none());
    }

    #[test]
    fn test_load_with_cli_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg_path = dir.path().join("config.toml");
        std::fs::write(
            &cfg_path,
            r#"
[inventory]
source = "from-file.parquet"

[general]
initial_folder = "file/folder"
"#,
        )
        .expect("write");

        let cli_overrides = AppConfig {
            general: GeneralConfig {
                initial_folder: Some("cli/folder".into()),
                ..Default::default()
            },
            ..Default::default()
        };

        let cfg = AppConfig::load(Some(&cfg_path), Some(&cli_overrides));
        assert_eq!(cfg.initial_folder(), Some("cli/folder"));
        assert_eq!(cfg.source(), "from-file.parquet");
    }
}
