//! Index configuration.
//!
//! Handles loading, validating, and merging `pagetree.toml`. Stock defaults
//! are serialized to a TOML value, the user's file is merged on top of them
//! key by key, and the merged value is deserialized and validated.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! taxonomies = ["category", "tag"]
//!
//! [pages]
//! root = "pages"               # Content root, relative to the site directory
//! content_ext = ".md"          # File extension that marks a folder's page file
//! hidden_prefix = "_"          # Folder prefix for modular (never routed) pages
//! ignore_files = [".DS_Store", "Thumbs.db"]
//!
//! [pages.order]
//! by = "default"               # title | date | modified | slug | basename | header.<field> | random
//! dir = "asc"                  # asc, anything else reverses
//!
//! [home]
//! alias = "/home"              # Route also served at "/"
//!
//! [cache]
//! enabled = true
//! check = "file"               # none | file | folder
//! dir = ".pagetree-cache"
//!
//! [routing.routes]
//! "/old" = "/new"
//! "/blog/*" = "/archive/*"
//!
//! [routing.redirects]
//! "/feed" = "https://example.com/feed.xml"
//! ```
//!
//! Unknown keys are rejected to catch typos early. Route and redirect tables
//! keep their file order, which matters for wildcard matching.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the configuration file looked up in the site directory.
pub const CONFIG_FILENAME: &str = "pagetree.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Index configuration loaded from `pagetree.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndexConfig {
    /// Taxonomy names collected from page headers into the reverse index.
    pub taxonomies: Vec<String>,
    /// How page folders are read.
    pub pages: PagesConfig,
    /// Home page aliasing.
    pub home: HomeConfig,
    /// Tree cache settings.
    pub cache: CacheConfig,
    /// Alias and redirect tables consulted when dispatch has no direct hit.
    pub routing: RoutingConfig,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            taxonomies: vec!["category".to_string(), "tag".to_string()],
            pages: PagesConfig::default(),
            home: HomeConfig::default(),
            cache: CacheConfig::default(),
            routing: RoutingConfig::default(),
        }
    }
}

impl IndexConfig {
    /// Content root for a site directory.
    pub fn content_root(&self, site: &Path) -> PathBuf {
        site.join(&self.pages.root)
    }

    /// Cache directory for a site directory.
    pub fn cache_dir(&self, site: &Path) -> PathBuf {
        site.join(&self.cache.dir)
    }

    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pages.root.is_empty() {
            return Err(ConfigError::Validation("pages.root must not be empty".into()));
        }
        if !self.pages.content_ext.starts_with('.') || self.pages.content_ext.len() < 2 {
            return Err(ConfigError::Validation(
                "pages.content_ext must look like \".md\"".into(),
            ));
        }
        if self.pages.hidden_prefix.contains('/') {
            return Err(ConfigError::Validation(
                "pages.hidden_prefix must not contain '/'".into(),
            ));
        }
        if self.pages.order.by.is_empty() {
            return Err(ConfigError::Validation(
                "pages.order.by must not be empty".into(),
            ));
        }
        for (from, _) in self
            .routing
            .routes
            .iter()
            .chain(self.routing.redirects.iter())
        {
            if !from.starts_with('/') {
                return Err(ConfigError::Validation(format!(
                    "route alias '{from}' must start with '/'"
                )));
            }
        }
        Ok(())
    }

    /// SHA-256 over the canonical JSON encoding of the config.
    ///
    /// One of the three fingerprint inputs of the tree cache: any config
    /// change produces a new fingerprint and therefore a fresh build.
    pub fn checksum(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_default();
        format!("{:x}", Sha256::digest(json.as_bytes()))
    }
}

/// How page folders are read.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PagesConfig {
    /// Content root, relative to the site directory unless absolute.
    pub root: String,
    /// Extension of the page file inside a folder, including the dot.
    pub content_ext: String,
    /// Folder prefix marking modular pages that are never routable.
    pub hidden_prefix: String,
    /// OS artifacts skipped entirely (not content, no effect on mtimes).
    pub ignore_files: Vec<String>,
    /// Default child ordering, overridable per page.
    pub order: OrderConfig,
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            root: "pages".to_string(),
            content_ext: ".md".to_string(),
            hidden_prefix: "_".to_string(),
            ignore_files: vec![".DS_Store".to_string(), "Thumbs.db".to_string()],
            order: OrderConfig::default(),
        }
    }
}

/// Default child ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrderConfig {
    pub by: String,
    pub dir: String,
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            by: "default".to_string(),
            dir: "asc".to_string(),
        }
    }
}

/// Home page aliasing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HomeConfig {
    /// Route additionally registered as `/`. Empty disables aliasing.
    pub alias: String,
}

impl Default for HomeConfig {
    fn default() -> Self {
        Self {
            alias: "/home".to_string(),
        }
    }
}

/// Tree cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Which modification signal feeds the fingerprint.
    pub check: CheckMethod,
    /// Cache directory, relative to the site directory unless absolute.
    pub dir: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            check: CheckMethod::File,
            dir: ".pagetree-cache".to_string(),
        }
    }
}

/// Modification signal used in the cache fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckMethod {
    /// Constant signal: the cache is only invalidated by config changes.
    #[serde(alias = "off")]
    None,
    /// Newest file mtime anywhere under the content root.
    File,
    /// Newest folder mtime anywhere under the content root.
    Folder,
}

/// Alias and redirect tables, in file order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoutingConfig {
    /// Exact and wildcard (`/prefix/*`) aliases to other routes.
    pub routes: IndexMap<String, String>,
    /// Exact URLs answered with a redirect instead of a page.
    pub redirects: IndexMap<String, String>,
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(IndexConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
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

/// Load `pagetree.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<IndexConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: IndexConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `pagetree.toml` in the given directory.
pub fn load_config(dir: &Path) -> Result<IndexConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(dir)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `pagetree.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# pagetree configuration
# ======================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# Taxonomies collected from page headers ([taxonomy] table) into the
# reverse term index.
taxonomies = ["category", "tag"]

# ---------------------------------------------------------------------------
# Page folders
# ---------------------------------------------------------------------------
[pages]
# Content root, relative to the site directory unless absolute.
root = "pages"

# Extension of the page file inside each folder.
content_ext = ".md"

# Folders starting with this prefix are modular: indexed, never routed.
hidden_prefix = "_"

# OS artifacts that are neither content nor counted for modification times.
ignore_files = [".DS_Store", "Thumbs.db"]

# Default ordering of child pages. A page can override it in its header.
#   by:  default | title | date | modified | slug | basename | random
#        header.<field> or header.<field>|<fallback>
#   dir: asc, anything else reverses
[pages.order]
by = "default"
dir = "asc"

# ---------------------------------------------------------------------------
# Home page
# ---------------------------------------------------------------------------
[home]
# This route is additionally served at "/". Set to "" to disable.
alias = "/home"

# ---------------------------------------------------------------------------
# Tree cache
# ---------------------------------------------------------------------------
[cache]
enabled = true

# What invalidates the cache besides config changes:
#   none   - nothing (manual clears only)
#   file   - newest file anywhere under the content root
#   folder - newest folder anywhere under the content root
check = "file"

# Relative to the site directory unless absolute.
dir = ".pagetree-cache"

# ---------------------------------------------------------------------------
# Routing fallbacks (consulted when a URL has no direct page)
# ---------------------------------------------------------------------------
[routing.routes]
# "/old" = "/new"
# "/blog/*" = "/archive/*"

[routing.redirects]
# "/feed" = "https://example.com/feed.xml"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = IndexConfig::default();
        assert_eq!(config.pages.content_ext, ".md");
        assert_eq!(config.pages.hidden_prefix, "_");
        assert_eq!(config.pages.order.by, "default");
        assert_eq!(config.pages.order.dir, "asc");
        assert_eq!(config.home.alias, "/home");
        assert_eq!(config.cache.check, CheckMethod::File);
        assert!(config.routing.routes.is_empty());
    }

    #[test]
    fn parse_partial_config() {
        let config: IndexConfig = toml::from_str(
            r#"
[pages.order]
by = "date"
"#,
        )
        .unwrap();
        assert_eq!(config.pages.order.by, "date");
        assert_eq!(config.pages.order.dir, "asc");
        assert_eq!(config.pages.content_ext, ".md");
    }

    #[test]
    fn routes_keep_file_order() {
        let config: IndexConfig = toml::from_str(
            r#"
[routing.routes]
"/z/*" = "/last/*"
"/a/*" = "/first/*"
"/m" = "/middle"
"#,
        )
        .unwrap();
        let keys: Vec<&str> = config.routing.routes.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["/z/*", "/a/*", "/m"]);
    }

    #[test]
    fn check_method_accepts_off_alias() {
        let config: IndexConfig = toml::from_str(
            r#"
[cache]
check = "off"
"#,
        )
        .unwrap();
        assert_eq!(config.cache.check, CheckMethod::None);
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.pages.content_ext, ".md");
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILENAME),
            r#"
taxonomies = ["tag"]

[home]
alias = "/start"
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.taxonomies, vec!["tag"]);
        assert_eq!(config.home.alias, "/start");
        assert!(config.cache.enabled);
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILENAME), "this is not [toml").unwrap();
        assert!(matches!(
            load_config(tmp.path()),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn unknown_key_rejected_via_load_config() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILENAME),
            r#"
[pages]
content_extension = ".txt"
"#,
        )
        .unwrap();
        assert!(load_config(tmp.path()).is_err());
    }

    #[test]
    fn unknown_section_rejected() {
        let result: Result<IndexConfig, _> = toml::from_str("[pagez]\nby = 1\n");
        assert!(result.is_err());
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str(r#"by = "default""#).unwrap();
        let overlay: toml::Value = toml::from_str(r#"by = "date""#).unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("by").unwrap().as_str(), Some("date"));
    }

    #[test]
    fn merge_toml_deep_nested() {
        let base = stock_defaults_value();
        let overlay: toml::Value = toml::from_str(
            r#"
[pages.order]
dir = "desc"
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let order = merged.get("pages").unwrap().get("order").unwrap();
        assert_eq!(order.get("dir").unwrap().as_str(), Some("desc"));
        assert_eq!(order.get("by").unwrap().as_str(), Some("default"));
    }

    // =========================================================================
    // Validation
    // =========================================================================

    #[test]
    fn validate_default_config_passes() {
        assert!(IndexConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_content_ext_needs_dot() {
        let mut config = IndexConfig::default();
        config.pages.content_ext = "md".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn validate_route_alias_needs_leading_slash() {
        let mut config = IndexConfig::default();
        config
            .routing
            .routes
            .insert("old".to_string(), "/new".to_string());
        assert!(config.validate().is_err());
    }

    // =========================================================================
    // Checksum
    // =========================================================================

    #[test]
    fn checksum_is_stable() {
        assert_eq!(
            IndexConfig::default().checksum(),
            IndexConfig::default().checksum()
        );
    }

    #[test]
    fn checksum_changes_with_config() {
        let mut changed = IndexConfig::default();
        changed.pages.order.by = "title".into();
        assert_ne!(IndexConfig::default().checksum(), changed.checksum());
    }

    #[test]
    fn stock_config_parses_to_defaults() {
        let parsed: IndexConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(parsed.checksum(), IndexConfig::default().checksum());
    }
}
