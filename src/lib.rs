//! photosort - a media sorting and relocation utility
//!
//! This library classifies files from a source tree and relocates them into a
//! destination tree organized by capture date and file type: allow-listed
//! image files land under `Images/<YYYYMM_MonthName>/<YYYY-MM-DD>/`, anything
//! else under `Unsorted_Files/<EXT>/`. It supports dry runs, HEIC-to-JPEG
//! conversion, destination collision skipping and a post-run integrity check,
//! all driven by TOML configuration.

pub mod cli;
pub mod config;
pub mod convert;
pub mod date_resolver;
pub mod file_category;
pub mod file_organizer;
pub mod integrity;
pub mod output;

pub use config::{CompiledConfig, ConfigError, SortConfig};
pub use date_resolver::{DateSource, ResolvedDate};
pub use file_category::{Category, ExtensionMap, MonthFolderFormat};
pub use file_organizer::{OrganizeError, PlacementOptions, RunSummary, Sorter};
pub use integrity::VerificationResult;
pub use output::Reporter;

pub use cli::{Cli, run};
