//! The placement engine.
//!
//! Walks a source tree and, for every visible file: optionally converts it,
//! determines its category, resolves its bucketing date, computes the
//! destination path and copies it there. Collisions are resolved by skipping
//! (first file wins, never an overwrite), and any error while processing one
//! file is logged and isolated; a single bad file never aborts the run.

use chrono::Local;
use filetime::FileTime;
use indicatif::ProgressBar;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::CompiledConfig;
use crate::convert::{self, Converted};
use crate::date_resolver::{self, DateSource};
use crate::file_category::{self, Category, UNSORTED_DIR};
use crate::output::Reporter;

/// Errors that abort a placement run before any file is processed.
///
/// Everything that can go wrong with an individual file is handled inside the
/// per-file step and never surfaces here.
#[derive(Debug)]
pub enum OrganizeError {
    /// The source path does not exist or is not a readable directory.
    InvalidSourcePath {
        path: PathBuf,
        source: io::Error,
    },
    /// The destination directory could not be created.
    DestinationUnavailable {
        path: PathBuf,
        source: io::Error,
    },
}

impl std::fmt::Display for OrganizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidSourcePath { path, source } => {
                write!(f, "Source path {} is not readable: {}", path.display(), source)
            }
            Self::DestinationUnavailable { path, source } => {
                write!(
                    f,
                    "Cannot create destination path {}: {}",
                    path.display(),
                    source
                )
            }
        }
    }
}

impl std::error::Error for OrganizeError {}

/// Result type for placement runs.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Validates the run's root paths, creating the destination if missing.
///
/// # Errors
///
/// Fails before any processing when the source is unreadable or the
/// destination cannot be created.
pub fn validate_paths(source: &Path, destination: &Path) -> OrganizeResult<()> {
    fs::read_dir(source).map_err(|e| OrganizeError::InvalidSourcePath {
        path: source.to_path_buf(),
        source: e,
    })?;
    fs::create_dir_all(destination).map_err(|e| OrganizeError::DestinationUnavailable {
        path: destination.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

/// Per-run switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlacementOptions {
    /// Compute and log every decision without writing anything.
    pub dry_run: bool,
    /// Convert eligible files before classification.
    pub convert: bool,
}

/// Accumulated outcome counts for one placement run.
///
/// In a dry run, `copied` counts the copies that would have happened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Files matching a tracked image extension found in the pre-pass.
    pub tracked_total: usize,
    pub copied: usize,
    pub converted: usize,
    pub skipped_existing: usize,
    pub conversion_failures: usize,
    pub errors: usize,
}

/// What happened to a single file.
enum FileOutcome {
    Copied { converted: bool },
    PlannedCopy,
    SkippedExisting,
    ConversionFailed,
}

/// Organizes files from a source tree into the destination layout.
pub struct Sorter<'a> {
    config: &'a CompiledConfig,
}

impl<'a> Sorter<'a> {
    pub fn new(config: &'a CompiledConfig) -> Self {
        Self { config }
    }

    /// Runs one placement pass.
    ///
    /// Hidden and filter-excluded files are skipped silently. The pre-pass
    /// counts files with tracked image extensions; when it finds none the
    /// run exits early having written nothing beyond the base
    /// `Unsorted_Files` folder.
    ///
    /// # Errors
    ///
    /// Only unreadable-source / uncreatable-destination conditions abort the
    /// run; per-file failures are logged and counted in the summary.
    pub fn run(
        &self,
        source: &Path,
        destination: &Path,
        options: PlacementOptions,
        reporter: &Reporter,
    ) -> OrganizeResult<RunSummary> {
        validate_paths(source, destination)?;

        if !options.dry_run {
            let unsorted = destination.join(UNSORTED_DIR);
            fs::create_dir_all(&unsorted).map_err(|e| OrganizeError::DestinationUnavailable {
                path: unsorted,
                source: e,
            })?;
        }

        let tracked_total = self.count_tracked(source);
        let mut summary = RunSummary {
            tracked_total,
            ..Default::default()
        };

        if tracked_total == 0 {
            reporter.info("No image files found to move.");
            return Ok(summary);
        }

        let progress = reporter.create_progress_bar(tracked_total as u64);
        let today = Local::now().date_naive();

        for entry in WalkDir::new(source).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.into_path();
            if !self.config.filters.should_include(&path) {
                continue;
            }

            let tracked = self
                .config
                .extensions
                .matches_file_name(&path.file_name().unwrap_or_default().to_string_lossy());

            match self.place_file(&path, destination, options, today, reporter, &progress) {
                Ok(FileOutcome::Copied { converted }) => {
                    summary.copied += 1;
                    if converted {
                        summary.converted += 1;
                    }
                }
                Ok(FileOutcome::PlannedCopy) => summary.copied += 1,
                Ok(FileOutcome::SkippedExisting) => summary.skipped_existing += 1,
                Ok(FileOutcome::ConversionFailed) => summary.conversion_failures += 1,
                Err(e) => {
                    summary.errors += 1;
                    progress.suspend(|| {
                        reporter.error(&format!("Error processing {}: {}", path.display(), e));
                    });
                }
            }

            if tracked {
                progress.inc(1);
            }
        }

        progress.finish_and_clear();
        Ok(summary)
    }

    /// Counts files in the source tree whose name ends with a tracked image
    /// extension, applying the same visibility filters as the main pass.
    fn count_tracked(&self, source: &Path) -> usize {
        WalkDir::new(source)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| self.config.filters.should_include(e.path()))
            .filter(|e| {
                self.config
                    .extensions
                    .matches_file_name(&e.file_name().to_string_lossy())
            })
            .count()
    }

    /// Processes one file end to end: conversion, classification, date
    /// resolution, collision check, copy.
    ///
    /// # Errors
    ///
    /// Any I/O failure for this file (including it vanishing mid-walk)
    /// surfaces here and is absorbed by the caller.
    fn place_file(
        &self,
        path: &Path,
        destination: &Path,
        options: PlacementOptions,
        today: chrono::NaiveDate,
        reporter: &Reporter,
        progress: &ProgressBar,
    ) -> io::Result<FileOutcome> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        // stat_path is the file that exists on disk right now; placed_path
        // carries the name and extension the file will be placed under. They
        // differ only when a dry run simulates a conversion.
        let mut stat_path = path.to_path_buf();
        let mut placed_path = path.to_path_buf();
        let mut was_converted = false;

        if options.convert && self.config.is_convertible(&file_name) {
            if options.dry_run {
                placed_path = path.with_extension(self.config.convert_target.trim_start_matches('.'));
                progress.suspend(|| {
                    reporter.dry_run_notice(&format!(
                        "Would convert {} to {}",
                        path.display(),
                        placed_path.display()
                    ));
                });
            } else {
                match convert::convert_image(path, &self.config.convert_target) {
                    Ok(Converted::Fresh(converted)) => {
                        progress.suspend(|| {
                            reporter.success(&format!(
                                "Converted {} to {}",
                                file_name,
                                converted.display()
                            ));
                        });
                        stat_path = converted.clone();
                        placed_path = converted;
                        was_converted = true;
                    }
                    Ok(Converted::AlreadyExists(existing)) => {
                        progress.suspend(|| {
                            reporter.info(&format!(
                                "Converted file already exists for {}, skipping re-encode.",
                                file_name
                            ));
                        });
                        stat_path = existing.clone();
                        placed_path = existing;
                    }
                    Err(e) => {
                        progress.suspend(|| {
                            reporter.warning(&format!(
                                "Conversion failed for {}: {}",
                                path.display(),
                                e
                            ));
                        });
                        return Ok(FileOutcome::ConversionFailed);
                    }
                }
            }
        }

        let placed_name = placed_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = file_category::extension_of(&placed_path);

        let dest = match self.config.extensions.category_for(&extension) {
            Category::Image => {
                let resolved =
                    date_resolver::resolve_date(&stat_path, today, !options.dry_run)?;
                match resolved.source {
                    DateSource::EmbeddedOverride => progress.suspend(|| {
                        reporter.info(&format!(
                            "Assigned modification date {} to file: {}",
                            resolved.date.format("%Y-%m-%d"),
                            stat_path.display()
                        ));
                    }),
                    DateSource::FallbackNow => progress.suspend(|| {
                        reporter.warning(&format!(
                            "Unable to extract a valid date from the file name: {}; using current date.",
                            placed_name
                        ));
                    }),
                    DateSource::Earliest => {}
                }
                file_category::image_destination(
                    destination,
                    resolved.date,
                    self.config.month_folder_format,
                    &placed_name,
                )
            }
            Category::Unsorted => {
                file_category::unsorted_destination(destination, &extension, &placed_name)
            }
        };

        if dest.exists() {
            progress.suspend(|| {
                reporter.warning(&format!("File already exists, skipping: {}", dest.display()));
            });
            return Ok(FileOutcome::SkippedExisting);
        }

        if options.dry_run {
            progress.suspend(|| {
                reporter.dry_run_notice(&format!(
                    "Would copy {} to {}",
                    placed_path.display(),
                    dest.display()
                ));
            });
            return Ok(FileOutcome::PlannedCopy);
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        copy_preserving_mtime(&stat_path, &dest)?;

        if !self.config.keep_originals {
            remove_source_checked(&stat_path, &dest, reporter, progress);
        }

        Ok(FileOutcome::Copied {
            converted: was_converted,
        })
    }
}

/// Copies a file and carries its modification time onto the destination.
fn copy_preserving_mtime(source: &Path, dest: &Path) -> io::Result<()> {
    fs::copy(source, dest)?;
    let mtime = FileTime::from_last_modification_time(&source.metadata()?);
    filetime::set_file_mtime(dest, mtime)?;
    Ok(())
}

/// Deletes a source file only after the copy at `dest` checks out.
///
/// A size mismatch or unreadable destination preserves the source and logs a
/// warning; removal failures are logged but never abort the run.
fn remove_source_checked(source: &Path, dest: &Path, reporter: &Reporter, progress: &ProgressBar) {
    let verified = match (dest.metadata(), source.metadata()) {
        (Ok(dest_meta), Ok(src_meta)) => dest_meta.len() == src_meta.len(),
        _ => false,
    };

    if !verified {
        progress.suspend(|| {
            reporter.warning(&format!(
                "Copy verification failed, source preserved: {}",
                source.display()
            ));
        });
        return;
    }

    if let Err(e) = fs::remove_file(source) {
        progress.suspend(|| {
            reporter.warning(&format!(
                "Failed to remove source {}: {}",
                source.display(),
                e
            ));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SortConfig;
    use tempfile::TempDir;

    fn compiled() -> crate::config::CompiledConfig {
        SortConfig::default().compile().expect("default config")
    }

    #[test]
    fn test_validate_paths_missing_source() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let result = validate_paths(&missing, dir.path());
        assert!(matches!(
            result,
            Err(OrganizeError::InvalidSourcePath { .. })
        ));
    }

    #[test]
    fn test_validate_paths_creates_destination() {
        let source = TempDir::new().unwrap();
        let dest_root = TempDir::new().unwrap();
        let dest = dest_root.path().join("library");

        validate_paths(source.path(), &dest).expect("paths validate");
        assert!(dest.is_dir());
    }

    #[test]
    fn test_run_on_empty_source_reports_nothing_to_do() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let config = compiled();
        let sorter = Sorter::new(&config);

        let summary = sorter
            .run(
                source.path(),
                dest.path(),
                PlacementOptions::default(),
                &Reporter::console(),
            )
            .expect("run succeeds");

        assert_eq!(summary, RunSummary::default());
        // Only the base Unsorted_Files folder was created.
        let entries: Vec<_> = fs::read_dir(dest.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(entries, vec![UNSORTED_DIR.to_string()]);
    }

    #[test]
    fn test_count_tracked_ignores_hidden_and_untracked() {
        let source = TempDir::new().unwrap();
        fs::write(source.path().join("a.jpg"), b"x").unwrap();
        fs::write(source.path().join("b.PNG"), b"x").unwrap();
        fs::write(source.path().join(".hidden.jpg"), b"x").unwrap();
        fs::write(source.path().join("notes.txt"), b"x").unwrap();

        let config = compiled();
        let sorter = Sorter::new(&config);
        assert_eq!(sorter.count_tracked(source.path()), 2);
    }
}
