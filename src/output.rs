//! Output formatting and console/file mirroring.
//!
//! Provides a centralized interface for all CLI output: colored console
//! messages, progress bars, and an optional tee that mirrors every line to a
//! timestamped log file under the destination root. The reporter is passed
//! explicitly to the components that need to report progress or errors; no
//! process-wide stream is mutated.

use chrono::Local;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Line-oriented reporting sink with consistent styling.
///
/// Messages go to the console (stdout, errors to stderr); when a log file is
/// attached, the unstyled text is also appended there and flushed per line so
/// output stays visible during long runs.
pub struct Reporter {
    log_file: Option<Mutex<File>>,
    log_path: Option<PathBuf>,
}

impl Reporter {
    /// Console-only reporter.
    pub fn console() -> Self {
        Self {
            log_file: None,
            log_path: None,
        }
    }

    /// Reporter that mirrors output to `log_<YYYYMMDD_HHMMSS>.txt` under
    /// `destination`, creating the directory if needed.
    pub fn with_log_file(destination: &Path) -> io::Result<Self> {
        fs::create_dir_all(destination)?;
        let name = format!("log_{}.txt", Local::now().format("%Y%m%d_%H%M%S"));
        let path = destination.join(name);
        let file = File::create(&path)?;
        Ok(Self {
            log_file: Some(Mutex::new(file)),
            log_path: Some(path),
        })
    }

    /// Path of the attached log file, if any.
    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    fn tee(&self, line: &str) {
        if let Some(log_file) = &self.log_file
            && let Ok(mut file) = log_file.lock()
        {
            let _ = writeln!(file, "{}", line);
            let _ = file.flush();
        }
    }

    /// Prints a success message in green with a checkmark.
    pub fn success(&self, message: &str) {
        println!("{} {}", "✓".green(), message);
        self.tee(&format!("✓ {}", message));
    }

    /// Prints an error message in red with an X mark (to stderr).
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
        self.tee(&format!("✗ {}", message));
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(&self, message: &str) {
        println!("{} {}", "⚠".yellow(), message);
        self.tee(&format!("⚠ {}", message));
    }

    /// Prints an info message in cyan.
    pub fn info(&self, message: &str) {
        println!("{}", message.cyan());
        self.tee(message);
    }

    /// Prints a regular message without styling.
    pub fn plain(&self, message: &str) {
        println!("{}", message);
        self.tee(message);
    }

    /// Prints a section header.
    pub fn header(&self, header: &str) {
        println!("\n{}", header.bold());
        self.tee(&format!("\n{}", header));
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(&self, message: &str) {
        let line = format!("[DRY RUN] {}", message);
        println!("{}", line.yellow());
        self.tee(&line);
    }

    /// Creates a progress bar for file operations.
    pub fn create_progress_bar(&self, total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("█▓░"),
        );
        pb
    }
}
