//! Per-document labeling configuration.
//!
//! [`LabelConfig`] is immutable once handed to an engine. It can be built in
//! code through [`LabelConfig::builder`], or loaded from a JSON document in
//! which every field is optional:
//!
//! ```json
//! {
//!   "server_side_nav": true,
//!   "verbose": false,
//!   "nav_classes": "topmenu,+sidenav,-ad-links",
//!   "thresholds": { "min_content_bytes": 400 }
//! }
//! ```

use crate::{Result, RolemarkError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Prefix for identifiers synthesized on elements without a usable `id`.
pub const DEFAULT_ID_PREFIX: &str = "rolemark-";

/// Heuristic thresholds used when no stronger signal decides a role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifyConfig {
    /// Minimum number of anchors for a link-list vote (default: 3)
    pub min_nav_links: u64,
    /// Minimum share of anchor text, in percent, for a link-list vote (default: 70.0)
    pub min_nav_link_percent: f64,
    /// Minimum non-blank bytes for a content-block vote (default: 250)
    pub min_content_bytes: u64,
    /// Maximum share of anchor text, in percent, for a content-block vote (default: 30.0)
    pub max_content_link_percent: f64,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self { min_nav_links: 3, min_nav_link_percent: 70.0, min_content_bytes: 250, max_content_link_percent: 30.0 }
    }
}

impl ClassifyConfig {
    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("min_nav_link_percent", self.min_nav_link_percent),
            ("max_content_link_percent", self.max_content_link_percent),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(RolemarkError::ConfigError(format!("{name} must be within 0..=100, got {value}")));
            }
        }
        Ok(())
    }
}

/// Configuration for a labeling run.
///
/// # Example
///
/// ```rust
/// use rolemark_core::LabelConfig;
///
/// let config = LabelConfig::builder()
///     .verbose(true)
///     .nav_classes("topmenu,-ad-links")
///     .build();
/// assert!(config.server_side_nav);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    /// Whether labeling runs at all; disabled means pure pass-through (default: true).
    pub enabled: bool,
    /// Whether class overrides from `nav_classes` are honored (default: true).
    pub server_side_nav: bool,
    /// Whether a debug comment follows each classified element (default: false).
    pub verbose: bool,
    /// Comma-separated class overrides: `class` or `+class` forces navigational,
    /// `-class` excludes the element from labeling.
    pub nav_classes: String,
    /// Prefix for synthesized identifiers (default: `rolemark-`).
    pub id_prefix: String,
    /// Classifier thresholds.
    pub thresholds: ClassifyConfig,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            server_side_nav: true,
            verbose: false,
            nav_classes: String::new(),
            id_prefix: DEFAULT_ID_PREFIX.to_string(),
            thresholds: ClassifyConfig::default(),
        }
    }
}

impl LabelConfig {
    /// Creates a new builder for LabelConfig.
    pub fn builder() -> LabelConfigBuilder {
        LabelConfigBuilder::new()
    }

    /// Parses a JSON configuration; absent fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: LabelConfig = serde_json::from_str(json)?;
        config.thresholds.validate()?;
        Ok(config)
    }

    /// Loads a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(RolemarkError::FileNotFound(path.to_path_buf()));
        }
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Default configuration file location (`<config dir>/rolemark/config.json`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("rolemark").join("config.json"))
    }

    /// Loads the default configuration file if one exists, else the defaults.
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(path),
            _ => Ok(Self::default()),
        }
    }

    /// Serializes the configuration as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Compiles `nav_classes`; empty unless `server_side_nav` is on.
    pub fn class_rules(&self) -> ClassRules {
        if self.server_side_nav { ClassRules::parse(&self.nav_classes) } else { ClassRules::default() }
    }

    /// Prefix for synthesized identifiers, falling back to the default when blank.
    pub fn id_prefix(&self) -> &str {
        if self.id_prefix.trim().is_empty() { DEFAULT_ID_PREFIX } else { &self.id_prefix }
    }
}

/// Builder for LabelConfig.
pub struct LabelConfigBuilder {
    config: LabelConfig,
}

impl LabelConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: LabelConfig::default() }
    }

    /// Enables or disables labeling.
    pub fn enabled(mut self, value: bool) -> Self {
        self.config.enabled = value;
        self
    }

    /// Honors or ignores class overrides.
    pub fn server_side_nav(mut self, value: bool) -> Self {
        self.config.server_side_nav = value;
        self
    }

    /// Emits debug comments.
    pub fn verbose(mut self, value: bool) -> Self {
        self.config.verbose = value;
        self
    }

    /// Sets the class override list.
    pub fn nav_classes(mut self, value: impl Into<String>) -> Self {
        self.config.nav_classes = value.into();
        self
    }

    /// Sets the identifier prefix.
    pub fn id_prefix(mut self, value: impl Into<String>) -> Self {
        self.config.id_prefix = value.into();
        self
    }

    /// Replaces the classifier thresholds.
    pub fn thresholds(mut self, value: ClassifyConfig) -> Self {
        self.config.thresholds = value;
        self
    }

    /// Builds the LabelConfig.
    pub fn build(self) -> LabelConfig {
        self.config
    }
}

impl Default for LabelConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of matching an element's classes against the override list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassOverride {
    /// Force the element to navigational.
    Include,
    /// Keep the element, and propagation into it, unlabeled.
    Exclude,
}

/// Compiled class override list.
///
/// Entries are comma separated. Blank entries are ignored and a later entry
/// for the same class replaces an earlier one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassRules {
    rules: HashMap<String, ClassOverride>,
}

impl ClassRules {
    pub fn parse(list: &str) -> Self {
        let mut rules = HashMap::new();
        for entry in list.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (rule, class) = match entry.as_bytes()[0] {
                b'-' => (ClassOverride::Exclude, &entry[1..]),
                b'+' => (ClassOverride::Include, &entry[1..]),
                _ => (ClassOverride::Include, entry),
            };
            let class = class.trim();
            if !class.is_empty() {
                rules.insert(class.to_string(), rule);
            }
        }
        Self { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Matches a `class` attribute value. Exclusion beats inclusion when an
    /// element carries classes of both kinds.
    pub fn lookup(&self, class_attr: &str) -> Option<ClassOverride> {
        if self.rules.is_empty() {
            return None;
        }
        let mut found = None;
        for class in class_attr.split_ascii_whitespace() {
            match self.rules.get(class) {
                Some(ClassOverride::Exclude) => return Some(ClassOverride::Exclude),
                Some(ClassOverride::Include) => found = Some(ClassOverride::Include),
                None => {}
            }
        }
        found
    }
}
