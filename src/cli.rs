//! Command-line interface.
//!
//! Parses arguments, validates the root paths, wires up the reporter and
//! dispatches to either a placement run or an integrity check. Exit codes:
//! success is zero; invalid paths, configuration errors and integrity
//! mismatches exit non-zero before or instead of further processing.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::config::SortConfig;
use crate::file_organizer::{self, PlacementOptions, RunSummary, Sorter};
use crate::integrity;
use crate::output::Reporter;

#[derive(Parser)]
#[command(name = "photosort")]
#[command(about = "Organize media files into date-based folders by capture date and type")]
pub struct Cli {
    /// Source directory to scan
    pub source: PathBuf,

    /// Destination directory for the organized tree
    pub destination: PathBuf,

    /// Simulate the organization without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Convert HEIC/HEIF files to JPEG before organizing
    #[arg(short, long)]
    pub convert: bool,

    /// Mirror console output to a timestamped log file under the destination
    #[arg(long)]
    pub log_to_file: bool,

    /// Compare matching-extension file counts instead of organizing
    #[arg(short = 'i', long)]
    pub integrity_check: bool,

    /// Path to a TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Additionally print the final summary as JSON
    #[arg(long)]
    pub json: bool,
}

/// Runs the CLI application.
///
/// This is the main entry point: it loads and compiles configuration,
/// validates paths, sets up output mirroring and executes the requested
/// operation.
pub fn run(cli: &Cli) -> ExitCode {
    if execute(cli) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Executes the requested operation; returns whether it succeeded.
fn execute(cli: &Cli) -> bool {
    let config = match SortConfig::load(cli.config.as_deref()).and_then(|c| c.compile()) {
        Ok(compiled) => compiled,
        Err(e) => {
            Reporter::console().error(&format!("Configuration error: {}", e));
            return false;
        }
    };

    if let Err(e) = file_organizer::validate_paths(&cli.source, &cli.destination) {
        Reporter::console().error(&e.to_string());
        return false;
    }

    let reporter = if cli.log_to_file {
        match Reporter::with_log_file(&cli.destination) {
            Ok(reporter) => reporter,
            Err(e) => {
                Reporter::console().error(&format!("Cannot create log file: {}", e));
                return false;
            }
        }
    } else {
        Reporter::console()
    };
    if let Some(path) = reporter.log_path() {
        reporter.info(&format!("Logging to {}", path.display()));
    }

    if cli.integrity_check {
        run_integrity_check(cli, &config, &reporter)
    } else {
        run_placement(cli, &config, &reporter)
    }
}

fn run_placement(
    cli: &Cli,
    config: &crate::config::CompiledConfig,
    reporter: &Reporter,
) -> bool {
    reporter.info(&format!(
        "Organizing contents of {} into {}",
        cli.source.display(),
        cli.destination.display()
    ));

    let options = PlacementOptions {
        dry_run: cli.dry_run,
        convert: cli.convert,
    };

    let sorter = Sorter::new(config);
    match sorter.run(&cli.source, &cli.destination, options, reporter) {
        Ok(summary) => {
            print_summary(reporter, &summary, cli.dry_run);
            if cli.json {
                match serde_json::to_string_pretty(&summary) {
                    Ok(json) => reporter.plain(&json),
                    Err(e) => reporter.warning(&format!("Cannot serialize summary: {}", e)),
                }
            }
            true
        }
        Err(e) => {
            reporter.error(&e.to_string());
            false
        }
    }
}

fn run_integrity_check(
    cli: &Cli,
    config: &crate::config::CompiledConfig,
    reporter: &Reporter,
) -> bool {
    reporter.header("Checking image file count integrity");

    let result = integrity::verify(
        &cli.source,
        &cli.destination,
        config.extensions.tracked_extensions(),
    );

    reporter.plain(&format!("Source file count: {}", result.source_count));
    reporter.plain(&format!(
        "Destination file count: {}",
        result.destination_count
    ));

    if cli.json {
        match serde_json::to_string_pretty(&result) {
            Ok(json) => reporter.plain(&json),
            Err(e) => reporter.warning(&format!("Cannot serialize result: {}", e)),
        }
    }

    if result.is_match() {
        reporter.success("File count matches!");
        true
    } else {
        reporter.error("File count does not match!");
        false
    }
}

fn print_summary(reporter: &Reporter, summary: &RunSummary, dry_run: bool) {
    reporter.header("SUMMARY");
    reporter.plain(&format!("Tracked image files: {}", summary.tracked_total));
    reporter.plain(&format!("Copied: {}", summary.copied));
    if summary.converted > 0 {
        reporter.plain(&format!("Converted: {}", summary.converted));
    }
    reporter.plain(&format!(
        "Skipped (already exist): {}",
        summary.skipped_existing
    ));
    if summary.conversion_failures > 0 {
        reporter.plain(&format!(
            "Conversion failures: {}",
            summary.conversion_failures
        ));
    }
    if summary.errors > 0 {
        reporter.plain(&format!("Errors: {}", summary.errors));
    }
    if dry_run {
        reporter.dry_run_notice("No files were modified.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::parse_from([
            "photosort",
            "/src",
            "/dest",
            "--dry-run",
            "--convert",
            "--log-to-file",
            "--json",
        ]);
        assert_eq!(cli.source, PathBuf::from("/src"));
        assert_eq!(cli.destination, PathBuf::from("/dest"));
        assert!(cli.dry_run);
        assert!(cli.convert);
        assert!(cli.log_to_file);
        assert!(cli.json);
        assert!(!cli.integrity_check);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from(["photosort", "/src", "/dest", "-c", "-i"]);
        assert!(cli.convert);
        assert!(cli.integrity_check);
    }

    #[test]
    fn test_cli_requires_both_paths() {
        assert!(Cli::try_parse_from(["photosort", "/src"]).is_err());
    }

    #[test]
    fn test_execute_fails_on_missing_source() {
        let dest = tempfile::TempDir::new().unwrap();
        let cli = Cli::parse_from([
            "photosort",
            "/definitely/not/a/real/source",
            dest.path().to_str().unwrap(),
        ]);
        assert!(!execute(&cli));
    }

    #[test]
    fn test_execute_integrity_mismatch_is_failure() {
        let source = tempfile::TempDir::new().unwrap();
        let dest = tempfile::TempDir::new().unwrap();
        std::fs::write(source.path().join("a.jpg"), b"x").unwrap();

        let cli = Cli::parse_from([
            "photosort",
            source.path().to_str().unwrap(),
            dest.path().to_str().unwrap(),
            "--integrity-check",
        ]);
        assert!(!execute(&cli));
    }

    #[test]
    fn test_execute_integrity_match_is_success() {
        let source = tempfile::TempDir::new().unwrap();
        let dest = tempfile::TempDir::new().unwrap();
        std::fs::write(source.path().join("a.jpg"), b"x").unwrap();
        std::fs::write(dest.path().join("b.jpg"), b"x").unwrap();

        let cli = Cli::parse_from([
            "photosort",
            source.path().to_str().unwrap(),
            dest.path().to_str().unwrap(),
            "--integrity-check",
        ]);
        assert!(execute(&cli));
    }
}
