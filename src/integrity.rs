//! Post-run integrity verification.
//!
//! Compares the number of matching-extension files under the source and
//! destination trees. Equal counts pass; unequal counts are treated as fatal
//! by the caller, because a silent partial copy is worse than a loud failure.
//!
//! This is an aggregate count only: it cannot detect ten files present but
//! being the wrong ten (for example a same-named file copied over from a
//! different source subfolder). That limitation is inherited deliberately;
//! strengthening it to a path-set comparison would change what a pass means.

use serde::Serialize;
use std::path::Path;
use walkdir::WalkDir;

/// Counts of matching files on each side of a verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VerificationResult {
    pub source_count: usize,
    pub destination_count: usize,
}

impl VerificationResult {
    /// Whether the two trees hold the same number of matching files.
    pub fn is_match(&self) -> bool {
        self.source_count == self.destination_count
    }
}

/// Counts files under `root`, recursively, whose lowercased name ends with
/// one of `extensions` (dotted, lowercase).
pub fn count_matching_files(root: &Path, extensions: &[String]) -> usize {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let name = e.file_name().to_string_lossy().to_lowercase();
            extensions.iter().any(|ext| name.ends_with(ext))
        })
        .count()
}

/// Compares matching-extension file counts between two trees.
pub fn verify(source: &Path, destination: &Path, extensions: &[String]) -> VerificationResult {
    VerificationResult {
        source_count: count_matching_files(source, extensions),
        destination_count: count_matching_files(destination, extensions),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn exts() -> Vec<String> {
        vec![".jpg".to_string(), ".png".to_string()]
    }

    #[test]
    fn test_count_is_recursive_and_case_insensitive() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.jpg"), b"x").unwrap();
        fs::write(dir.path().join("b.JPG"), b"x").unwrap();
        fs::create_dir_all(dir.path().join("sub/deeper")).unwrap();
        fs::write(dir.path().join("sub/deeper/c.png"), b"x").unwrap();
        fs::write(dir.path().join("sub/notes.txt"), b"x").unwrap();

        assert_eq!(count_matching_files(dir.path(), &exts()), 3);
    }

    #[test]
    fn test_verify_equal_counts_pass() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        for i in 0..3 {
            fs::write(source.path().join(format!("s{}.jpg", i)), b"x").unwrap();
            fs::write(dest.path().join(format!("d{}.jpg", i)), b"x").unwrap();
        }

        let result = verify(source.path(), dest.path(), &exts());
        assert_eq!(result.source_count, 3);
        assert_eq!(result.destination_count, 3);
        assert!(result.is_match());
    }

    #[test]
    fn test_verify_unequal_counts_mismatch() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        for i in 0..10 {
            fs::write(source.path().join(format!("s{}.jpg", i)), b"x").unwrap();
        }
        for i in 0..9 {
            fs::write(dest.path().join(format!("d{}.jpg", i)), b"x").unwrap();
        }

        let result = verify(source.path(), dest.path(), &exts());
        assert!(!result.is_match());
        assert_eq!(result.source_count, 10);
        assert_eq!(result.destination_count, 9);
    }

    #[test]
    fn test_wrong_files_same_count_still_passes() {
        // Known limitation: the check compares counts, not identities.
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        fs::write(source.path().join("a.jpg"), b"x").unwrap();
        fs::write(dest.path().join("completely_different.jpg"), b"y").unwrap();

        assert!(verify(source.path(), dest.path(), &exts()).is_match());
    }
}
