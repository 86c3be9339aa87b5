//! Sorting configuration.
//!
//! This module loads and validates the TOML configuration that drives file
//! classification and placement:
//! - The image extension allow-list (which files get date-based folders)
//! - Conversion settings (which extensions are converted, and to what)
//! - Placement variants (copy vs. delete-after-copy, month folder format)
//! - Exclusion filters (exact names, glob patterns, regex patterns)
//!
//! # Configuration File Format
//!
//! ```toml
//! [categories]
//! image_extensions = [".jpg", ".jpeg", ".png", ".gif", ".bmp", ".heic", ".webp"]
//!
//! [conversion]
//! extensions = [".heic", ".heif"]
//! target_extension = ".jpg"
//!
//! [placement]
//! keep_originals = true
//! month_folder_format = "full"
//!
//! [filters]
//! exclude_filenames = ["Thumbs.db"]
//! exclude_patterns = ["*.tmp"]
//! exclude_regex = []
//! ```

use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::file_category::{ExtensionMap, MonthFolderFormat};

/// Errors that can occur during configuration loading and compilation.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// Invalid glob pattern provided.
    InvalidGlobPattern(String),
    /// Invalid regex pattern provided with the actual error reason.
    InvalidRegexPattern {
        /// The regex pattern that failed to compile.
        pattern: String,
        /// The reason why the pattern is invalid.
        reason: String,
    },
    /// An extension list entry is malformed (must start with a dot).
    InvalidExtension(String),
    /// IO error while reading configuration.
    IoError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::InvalidGlobPattern(pattern) => {
                write!(
                    f,
                    "Invalid glob pattern '{}': expected *.ext or dir/**",
                    pattern
                )
            }
            ConfigError::InvalidRegexPattern { pattern, reason } => {
                write!(f, "Invalid regex pattern '{}': {}", pattern, reason)
            }
            ConfigError::InvalidExtension(ext) => {
                write!(
                    f,
                    "Invalid extension '{}': entries must start with a dot, e.g. \".jpg\"",
                    ext
                )
            }
            ConfigError::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Top-level sorting configuration, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SortConfig {
    /// Extension allow-list driving the Image category.
    #[serde(default)]
    pub categories: CategoryRules,

    /// Pre-classification image conversion settings.
    #[serde(default)]
    pub conversion: ConversionRules,

    /// Placement behavior variants.
    #[serde(default)]
    pub placement: PlacementRules,

    /// Rules for excluding files from processing.
    #[serde(default)]
    pub filters: FilterRules,
}

/// Which extensions belong to the Image category.
///
/// Anything not in this list falls through to Unsorted. Matching is
/// case-insensitive and first match wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRules {
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,
}

fn default_image_extensions() -> Vec<String> {
    [".jpg", ".jpeg", ".png", ".gif", ".bmp", ".heic", ".webp"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for CategoryRules {
    fn default() -> Self {
        Self {
            image_extensions: default_image_extensions(),
        }
    }
}

/// Which extensions are eligible for conversion and what they become.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionRules {
    #[serde(default = "default_convert_extensions")]
    pub extensions: Vec<String>,

    #[serde(default = "default_target_extension")]
    pub target_extension: String,
}

fn default_convert_extensions() -> Vec<String> {
    vec![".heic".to_string(), ".heif".to_string()]
}

fn default_target_extension() -> String {
    ".jpg".to_string()
}

impl Default for ConversionRules {
    fn default() -> Self {
        Self {
            extensions: default_convert_extensions(),
            target_extension: default_target_extension(),
        }
    }
}

/// Placement behavior variants.
///
/// `keep_originals = false` turns the copy into a verified move: the source
/// is deleted only after the copy has been size-checked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementRules {
    #[serde(default = "default_keep_originals")]
    pub keep_originals: bool,

    #[serde(default)]
    pub month_folder_format: MonthFolderFormat,
}

fn default_keep_originals() -> bool {
    true
}

impl Default for PlacementRules {
    fn default() -> Self {
        Self {
            keep_originals: true,
            month_folder_format: MonthFolderFormat::default(),
        }
    }
}

/// Rules for excluding files from processing.
///
/// Hidden files (leading dot) are always excluded; that is part of the
/// placement contract rather than a configurable filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterRules {
    /// Exact filenames to exclude (e.g., "Thumbs.db").
    #[serde(default)]
    pub exclude_filenames: Vec<String>,

    /// Glob patterns to exclude (e.g., "*.tmp").
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Regex patterns to exclude (for advanced users).
    #[serde(default)]
    pub exclude_regex: Vec<String>,
}

impl SortConfig {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.photosortrc.toml` in the current directory
    /// 3. Look for `~/.config/photosort/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but
    /// cannot be read.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(".photosortrc.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("photosort")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if file does not exist.
    /// Returns `ConfigError::ConfigInvalid` if TOML parsing fails.
    /// Returns `ConfigError::IoError` if file cannot be read.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Compile configuration into the structures the engine matches against.
    ///
    /// # Errors
    ///
    /// Returns an error if any regex or glob patterns are invalid, or any
    /// extension entry is missing its leading dot.
    pub fn compile(self) -> Result<CompiledConfig, ConfigError> {
        CompiledConfig::new(self)
    }
}

fn validate_extension(ext: &str) -> Result<String, ConfigError> {
    if !ext.starts_with('.') || ext.len() < 2 {
        return Err(ConfigError::InvalidExtension(ext.to_string()));
    }
    Ok(ext.to_lowercase())
}

/// Compiled, validated configuration used by the placement engine.
///
/// Patterns are pre-compiled so per-file matching never reparses anything,
/// and the extension allow-list is baked into an ordered lookup table.
pub struct CompiledConfig {
    pub extensions: ExtensionMap,
    pub convert_extensions: Vec<String>,
    pub convert_target: String,
    pub keep_originals: bool,
    pub month_folder_format: MonthFolderFormat,
    pub filters: CompiledFilters,
}

impl CompiledConfig {
    fn new(config: SortConfig) -> Result<Self, ConfigError> {
        let image_extensions = config
            .categories
            .image_extensions
            .iter()
            .map(|ext| validate_extension(ext))
            .collect::<Result<Vec<_>, _>>()?;

        let convert_extensions = config
            .conversion
            .extensions
            .iter()
            .map(|ext| validate_extension(ext))
            .collect::<Result<Vec<_>, _>>()?;

        let convert_target = validate_extension(&config.conversion.target_extension)?;

        Ok(Self {
            extensions: ExtensionMap::new(image_extensions),
            convert_extensions,
            convert_target,
            keep_originals: config.placement.keep_originals,
            month_folder_format: config.placement.month_folder_format,
            filters: CompiledFilters::new(config.filters)?,
        })
    }

    /// Whether a file name carries an extension eligible for conversion.
    pub fn is_convertible(&self, file_name: &str) -> bool {
        let lower = file_name.to_lowercase();
        self.convert_extensions.iter().any(|ext| lower.ends_with(ext))
    }
}

/// Compiled exclusion filters for efficient per-file matching.
pub struct CompiledFilters {
    exclude_filenames: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
}

impl CompiledFilters {
    fn new(rules: FilterRules) -> Result<Self, ConfigError> {
        let exclude_patterns = rules
            .exclude_patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let exclude_regexes = rules
            .exclude_regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            exclude_filenames: rules.exclude_filenames.into_iter().collect(),
            exclude_patterns,
            exclude_regexes,
        })
    }

    /// Check if a file should be processed (not excluded).
    ///
    /// Checks are performed in this order, with early termination:
    /// 1. Hidden file (leading dot) - always excluded
    /// 2. Exact filename match - excluded
    /// 3. Glob pattern match - excluded
    /// 4. Regex pattern match - excluded
    /// 5. Default: included
    pub fn should_include(&self, file_path: &Path) -> bool {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        if self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.matches_path(file_path))
        {
            return false;
        }

        if self
            .exclude_regexes
            .iter()
            .any(|regex| regex.is_match(&file_name))
        {
            return false;
        }

        true
    }
}
