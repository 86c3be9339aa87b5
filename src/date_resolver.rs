//! Capture-date resolution for placed files.
//!
//! The date that buckets a file is the earliest plausible one: the minimum of
//! its modification and creation timestamps (creation falls back to
//! modification where the platform cannot supply it). When that earliest date
//! is today, the timestamp is almost certainly an artifact of a recent copy or
//! extraction, so a date embedded in the filename prefix (`YYYYMMDD_...`) is
//! tried instead. A successful override also rewrites the file's modification
//! time on disk so repeated runs resolve the same date without reparsing.
//!
//! The decision itself (`decide_date`) is pure; `resolve_date` wraps it with
//! the filesystem reads and the optional timestamp write.

use chrono::{DateTime, Local, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Utc};
use filetime::FileTime;
use std::io;
use std::path::Path;
use std::time::SystemTime;

/// How the resolved date was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSource {
    /// The earlier of the filesystem modification and creation timestamps.
    Earliest,
    /// A `YYYYMMDD` prefix parsed from the file name.
    EmbeddedOverride,
    /// No trustworthy date was derivable; the current date substitutes.
    FallbackNow,
}

/// A resolved bucketing date. Never absent: the fallback is an explicit
/// substitution of today, not a missing value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDate {
    pub date: NaiveDate,
    pub source: DateSource,
}

/// Pure date decision over already-read metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateDecision {
    /// Use the earliest filesystem timestamp as-is.
    UseEarliest(NaiveDate),
    /// Use the embedded date and rewrite the file's mtime to its noon.
    UseEmbedded(NaiveDate),
    /// Use today.
    FallbackToToday,
}

/// Parses the leading filename component (up to the first underscore) as a
/// `YYYYMMDD` calendar date.
///
/// Returns `None` when there is no parseable prefix: missing underscore
/// leaves trailing characters that fail the parse, as do non-numeric text
/// and impossible calendar dates.
pub fn parse_embedded_date(file_name: &str) -> Option<NaiveDate> {
    let prefix = file_name.split('_').next()?;
    NaiveDate::parse_from_str(prefix, "%Y%m%d").ok()
}

/// Decides the bucketing date for a file.
///
/// `earliest` is the lesser of the file's modification and creation times;
/// when its calendar date equals `today` the filename override is attempted.
pub fn decide_date(earliest: NaiveDateTime, today: NaiveDate, file_name: &str) -> DateDecision {
    if earliest.date() != today {
        return DateDecision::UseEarliest(earliest.date());
    }
    match parse_embedded_date(file_name) {
        Some(date) => DateDecision::UseEmbedded(date),
        None => DateDecision::FallbackToToday,
    }
}

/// Resolves the bucketing date for a file on disk.
///
/// When the embedded-date override fires and `apply_effects` is set, the
/// file's modification time is rewritten to noon of the embedded date so
/// subsequent runs resolve it from metadata alone. Dry runs pass
/// `apply_effects = false` and get the same date without the write.
///
/// # Errors
///
/// Returns the underlying I/O error when the file cannot be stat'ed (for
/// example because it vanished between enumeration and processing); the
/// caller skips the file.
pub fn resolve_date(path: &Path, today: NaiveDate, apply_effects: bool) -> io::Result<ResolvedDate> {
    let metadata = path.metadata()?;
    let modified = metadata.modified()?;
    let created = metadata.created().unwrap_or(modified);
    let earliest = std::cmp::min(modified, created);
    let earliest_local: DateTime<Local> = earliest.into();

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    match decide_date(earliest_local.naive_local(), today, &file_name) {
        DateDecision::UseEarliest(date) => Ok(ResolvedDate {
            date,
            source: DateSource::Earliest,
        }),
        DateDecision::UseEmbedded(date) => {
            if apply_effects {
                let mtime = FileTime::from_system_time(noon_of(date));
                filetime::set_file_mtime(path, mtime)?;
            }
            Ok(ResolvedDate {
                date,
                source: DateSource::EmbeddedOverride,
            })
        }
        DateDecision::FallbackToToday => Ok(ResolvedDate {
            date: today,
            source: DateSource::FallbackNow,
        }),
    }
}

/// Noon of a calendar date in local time.
///
/// Noon never lands on a DST gap in practice; if the local timezone cannot
/// represent it the UTC interpretation is used instead.
fn noon_of(date: NaiveDate) -> SystemTime {
    let noon = date.and_hms_opt(12, 0, 0).expect("noon is a valid time");
    match noon.and_local_timezone(Local) {
        LocalResult::Single(dt) => dt.into(),
        LocalResult::Ambiguous(dt, _) => dt.into(),
        LocalResult::None => Utc.from_utc_datetime(&noon).into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
    }

    fn datetime(y: i32, m: u32, d: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(10, 30, 0).expect("valid time")
    }

    #[test]
    fn test_parse_embedded_date_valid() {
        assert_eq!(
            parse_embedded_date("20230115_photo.heic"),
            Some(date(2023, 1, 15))
        );
        assert_eq!(
            parse_embedded_date("19991231_a_b_c.jpg"),
            Some(date(1999, 12, 31))
        );
    }

    #[test]
    fn test_parse_embedded_date_no_underscore() {
        // Without an underscore the whole name is the prefix and the
        // extension makes the parse fail.
        assert_eq!(parse_embedded_date("20230115.jpg"), None);
        assert_eq!(parse_embedded_date("photo.jpg"), None);
    }

    #[test]
    fn test_parse_embedded_date_non_numeric() {
        assert_eq!(parse_embedded_date("holiday_photo.jpg"), None);
        assert_eq!(parse_embedded_date("2023x115_photo.jpg"), None);
    }

    #[test]
    fn test_parse_embedded_date_invalid_calendar_date() {
        assert_eq!(parse_embedded_date("20231340_photo.jpg"), None);
        assert_eq!(parse_embedded_date("20230230_photo.jpg"), None);
    }

    #[test]
    fn test_decide_date_earliest_not_today_passes_through() {
        let decision = decide_date(datetime(2022, 6, 1), date(2024, 3, 10), "photo.jpg");
        assert_eq!(decision, DateDecision::UseEarliest(date(2022, 6, 1)));
    }

    #[test]
    fn test_decide_date_today_with_embedded_date() {
        let today = date(2024, 3, 10);
        let decision = decide_date(today.and_hms_opt(9, 0, 0).unwrap(), today, "20230115_photo.heic");
        assert_eq!(decision, DateDecision::UseEmbedded(date(2023, 1, 15)));
    }

    #[test]
    fn test_decide_date_today_without_embedded_date_falls_back() {
        let today = date(2024, 3, 10);
        let decision = decide_date(today.and_hms_opt(9, 0, 0).unwrap(), today, "photo.jpg");
        assert_eq!(decision, DateDecision::FallbackToToday);
    }

    #[test]
    fn test_embedded_date_ignored_when_timestamp_is_old() {
        // A real (non-today) timestamp wins even over a parseable prefix.
        let decision = decide_date(datetime(2022, 6, 1), date(2024, 3, 10), "20230115_photo.jpg");
        assert_eq!(decision, DateDecision::UseEarliest(date(2022, 6, 1)));
    }

    #[test]
    fn test_resolve_date_uses_old_mtime() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.jpg");
        fs::write(&path, b"data").unwrap();
        let past = noon_of(date(2021, 7, 4));
        filetime::set_file_mtime(&path, FileTime::from_system_time(past)).unwrap();

        let resolved = resolve_date(&path, Local::now().date_naive(), true).unwrap();
        assert_eq!(resolved.date, date(2021, 7, 4));
        assert_eq!(resolved.source, DateSource::Earliest);
    }

    #[test]
    fn test_resolve_date_embedded_override_rewrites_mtime() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("20230115_photo.jpg");
        fs::write(&path, b"data").unwrap();

        // Freshly written file has today's mtime; the override should fire.
        let resolved = resolve_date(&path, Local::now().date_naive(), true).unwrap();
        assert_eq!(resolved.date, date(2023, 1, 15));
        assert_eq!(resolved.source, DateSource::EmbeddedOverride);

        let mtime: DateTime<Local> = path.metadata().unwrap().modified().unwrap().into();
        assert_eq!(mtime.date_naive(), date(2023, 1, 15));

        // Second resolution short-circuits to the metadata branch.
        let again = resolve_date(&path, Local::now().date_naive(), true).unwrap();
        assert_eq!(again.date, date(2023, 1, 15));
        assert_eq!(again.source, DateSource::Earliest);
    }

    #[test]
    fn test_resolve_date_dry_run_does_not_touch_mtime() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("20230115_photo.jpg");
        fs::write(&path, b"data").unwrap();
        let before = path.metadata().unwrap().modified().unwrap();

        let resolved = resolve_date(&path, Local::now().date_naive(), false).unwrap();
        assert_eq!(resolved.date, date(2023, 1, 15));
        assert_eq!(path.metadata().unwrap().modified().unwrap(), before);
    }

    #[test]
    fn test_resolve_date_fallback_is_today() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.jpg");
        fs::write(&path, b"data").unwrap();

        let today = Local::now().date_naive();
        let resolved = resolve_date(&path, today, true).unwrap();
        assert_eq!(resolved.date, today);
        assert_eq!(resolved.source, DateSource::FallbackNow);
    }

    #[test]
    fn test_resolve_date_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gone.jpg");
        let err = resolve_date(&path, Local::now().date_naive(), true).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
