//! File categorization and destination path computation.
//!
//! This module decides which bucket a file belongs to (Image or Unsorted)
//! and where it lands under the destination root. Category membership is a
//! single ordered lookup over the configured extension allow-list; everything
//! that does not match falls through to Unsorted. Path computation is pure:
//! no I/O and no collision handling happens here.
//!
//! # Examples
//!
//! ```
//! use photosort::file_category::{Category, ExtensionMap};
//!
//! let map = ExtensionMap::new(vec![".jpg".to_string(), ".png".to_string()]);
//! assert_eq!(map.category_for(".JPG"), Category::Image);
//! assert_eq!(map.category_for(".txt"), Category::Unsorted);
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the bucket for files outside the image allow-list.
pub const UNSORTED_DIR: &str = "Unsorted_Files";

/// Name of the bucket for allow-listed image files.
pub const IMAGES_DIR: &str = "Images";

/// Represents the classification bucket a file is assigned to.
///
/// The set is closed and checked in priority order: Image first, then
/// everything else falls to Unsorted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Extension is in the configured image allow-list.
    Image,
    /// Anything else.
    Unsorted,
}

/// Year-month folder naming variant.
///
/// `Full` produces `YYYYMM_MonthName` (e.g. `202301_January`), `Short`
/// produces `YYMM_MonthName` (e.g. `2301_January`). Month names come from
/// chrono's `%B`, which is fixed English regardless of locale, so folder
/// names stay stable across environments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonthFolderFormat {
    #[default]
    Full,
    Short,
}

impl MonthFolderFormat {
    fn strftime(&self) -> &'static str {
        match self {
            MonthFolderFormat::Full => "%Y%m_%B",
            MonthFolderFormat::Short => "%y%m_%B",
        }
    }
}

/// Ordered extension-to-category lookup table.
///
/// Built once from configuration; lookups are case-insensitive and the
/// first matching entry wins.
#[derive(Debug, Clone)]
pub struct ExtensionMap {
    image_extensions: Vec<String>,
}

impl ExtensionMap {
    /// Creates a map from a lowercased allow-list of dotted extensions.
    pub fn new(image_extensions: Vec<String>) -> Self {
        Self { image_extensions }
    }

    /// Returns the category for a dotted extension (e.g. `".jpg"`).
    ///
    /// An empty string is a valid extension and maps to Unsorted.
    pub fn category_for(&self, extension: &str) -> Category {
        let lower = extension.to_lowercase();
        if self.image_extensions.iter().any(|ext| *ext == lower) {
            Category::Image
        } else {
            Category::Unsorted
        }
    }

    /// Whether a file name ends with one of the tracked image extensions.
    pub fn matches_file_name(&self, file_name: &str) -> bool {
        let lower = file_name.to_lowercase();
        self.image_extensions.iter().any(|ext| lower.ends_with(ext))
    }

    /// The tracked extensions, lowercased, with leading dots.
    pub fn tracked_extensions(&self) -> &[String] {
        &self.image_extensions
    }
}

/// Extracts the lowercased dotted extension of a file name.
///
/// Returns an empty string when the name has no extension.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// Computes the destination for an allow-listed image file.
///
/// Layout: `<root>/Images/<year-month folder>/<YYYY-MM-DD>/<file name>`.
pub fn image_destination(
    root: &Path,
    date: NaiveDate,
    month_format: MonthFolderFormat,
    file_name: &str,
) -> PathBuf {
    root.join(IMAGES_DIR)
        .join(date.format(month_format.strftime()).to_string())
        .join(date.format("%Y-%m-%d").to_string())
        .join(file_name)
}

/// Computes the destination for a file outside the allow-list.
///
/// Layout: `<root>/Unsorted_Files/<EXT or Unknown>/<file name>`, where the
/// subfolder is the extension without its dot, upper-cased.
pub fn unsorted_destination(root: &Path, extension: &str, file_name: &str) -> PathBuf {
    let subfolder = if extension.is_empty() {
        "Unknown".to_string()
    } else {
        extension.trim_start_matches('.').to_uppercase()
    };
    root.join(UNSORTED_DIR).join(subfolder).join(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map() -> ExtensionMap {
        ExtensionMap::new(
            [".jpg", ".jpeg", ".png", ".heic"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
    }

    #[test]
    fn test_category_lookup_case_insensitive() {
        let map = map();
        assert_eq!(map.category_for(".jpg"), Category::Image);
        assert_eq!(map.category_for(".JPG"), Category::Image);
        assert_eq!(map.category_for(".Heic"), Category::Image);
    }

    #[test]
    fn test_unknown_extension_falls_to_unsorted() {
        let map = map();
        assert_eq!(map.category_for(".txt"), Category::Unsorted);
        assert_eq!(map.category_for(".mov"), Category::Unsorted);
        assert_eq!(map.category_for(""), Category::Unsorted);
    }

    #[test]
    fn test_matches_file_name() {
        let map = map();
        assert!(map.matches_file_name("IMG_0001.JPG"));
        assert!(map.matches_file_name("photo.heic"));
        assert!(!map.matches_file_name("notes.txt"));
        assert!(!map.matches_file_name("no_extension"));
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of(Path::new("a/b/photo.JPG")), ".jpg");
        assert_eq!(extension_of(Path::new("archive.tar.gz")), ".gz");
        assert_eq!(extension_of(Path::new("README")), "");
    }

    #[test]
    fn test_image_destination_full_format() {
        let dest = image_destination(
            Path::new("/dest"),
            date(2023, 1, 15),
            MonthFolderFormat::Full,
            "photo.jpg",
        );
        assert_eq!(
            dest,
            Path::new("/dest/Images/202301_January/2023-01-15/photo.jpg")
        );
    }

    #[test]
    fn test_image_destination_short_format() {
        let dest = image_destination(
            Path::new("/dest"),
            date(2023, 11, 5),
            MonthFolderFormat::Short,
            "photo.jpg",
        );
        assert_eq!(
            dest,
            Path::new("/dest/Images/2311_November/2023-11-05/photo.jpg")
        );
    }

    #[test]
    fn test_month_names_are_english() {
        let dest = image_destination(
            Path::new("/d"),
            date(2024, 8, 1),
            MonthFolderFormat::Full,
            "a.png",
        );
        assert!(dest.to_string_lossy().contains("202408_August"));
    }

    #[test]
    fn test_unsorted_destination_uppercases_extension() {
        let dest = unsorted_destination(Path::new("/dest"), ".txt", "notes.txt");
        assert_eq!(dest, Path::new("/dest/Unsorted_Files/TXT/notes.txt"));
    }

    #[test]
    fn test_unsorted_destination_empty_extension() {
        let dest = unsorted_destination(Path::new("/dest"), "", "README");
        assert_eq!(dest, Path::new("/dest/Unsorted_Files/Unknown/README"));
    }
}
