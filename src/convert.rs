//! Pre-classification image conversion.
//!
//! Converts HEIF-family files to the standard interchange format (JPEG by
//! default) before they are classified. Conversion is destructive on success:
//! the original is deleted once the re-encoded file exists, which is what
//! keeps a single photo from entering classification under two extensions.
//! The original's modification time is copied onto the new file first, so
//! date resolution is unaffected by the conversion.
//!
//! If the same-stem target already exists the adapter returns it without
//! decoding anything and without deleting the original.

use filetime::FileTime;
use image::{ImageFormat, ImageReader};
use std::fs;
use std::path::{Path, PathBuf};

/// Errors that can occur while converting a single file.
#[derive(Debug)]
pub enum ConvertError {
    /// The input could not be decoded (unrecognized or corrupt data).
    DecodeFailed {
        path: PathBuf,
        reason: image::ImageError,
    },
    /// The configured target extension maps to no known image format.
    UnsupportedTarget { extension: String },
    /// Reading the input, writing the output, or deleting the original failed.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for ConvertError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DecodeFailed { path, reason } => {
                write!(f, "Failed to decode {}: {}", path.display(), reason)
            }
            Self::UnsupportedTarget { extension } => {
                write!(f, "No image format known for target extension '{}'", extension)
            }
            Self::Io { path, source } => {
                write!(f, "I/O error converting {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ConvertError {}

/// Result type for conversion operations.
pub type ConvertResult<T> = Result<T, ConvertError>;

/// Outcome of a successful conversion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Converted {
    /// The input was decoded, re-encoded and the original deleted.
    Fresh(PathBuf),
    /// A same-stem target already existed; nothing was decoded or deleted.
    AlreadyExists(PathBuf),
}

impl Converted {
    /// The path classification should continue with.
    pub fn path(&self) -> &Path {
        match self {
            Converted::Fresh(path) | Converted::AlreadyExists(path) => path,
        }
    }
}

/// Converts `source` to the format implied by `target_extension` (dotted,
/// e.g. `".jpg"`), writing the result next to the source with the same stem.
///
/// On success the original file is deleted and its modification time carried
/// over to the new file. On any failure the original is left untouched and
/// nothing is deleted.
pub fn convert_image(source: &Path, target_extension: &str) -> ConvertResult<Converted> {
    let bare_ext = target_extension.trim_start_matches('.');
    let format =
        ImageFormat::from_extension(bare_ext).ok_or_else(|| ConvertError::UnsupportedTarget {
            extension: target_extension.to_string(),
        })?;

    let dest = source.with_extension(bare_ext);
    if dest.exists() {
        return Ok(Converted::AlreadyExists(dest));
    }

    let io_err = |source_path: &Path| {
        let path = source_path.to_path_buf();
        move |e: std::io::Error| ConvertError::Io { path, source: e }
    };

    // Capture the timestamp before touching anything else.
    let metadata = source.metadata().map_err(io_err(source))?;
    let mtime = FileTime::from_system_time(metadata.modified().map_err(io_err(source))?);

    // The on-disk extension is untrustworthy for convert candidates, so the
    // actual format is sniffed from content.
    let reader = ImageReader::open(source)
        .map_err(io_err(source))?
        .with_guessed_format()
        .map_err(io_err(source))?;
    let decoded = reader.decode().map_err(|e| ConvertError::DecodeFailed {
        path: source.to_path_buf(),
        reason: e,
    })?;

    decoded
        .to_rgb8()
        .save_with_format(&dest, format)
        .map_err(|e| match e {
            image::ImageError::IoError(io) => ConvertError::Io {
                path: dest.clone(),
                source: io,
            },
            other => ConvertError::DecodeFailed {
                path: dest.clone(),
                reason: other,
            },
        })?;

    filetime::set_file_times(&dest, mtime, mtime).map_err(io_err(&dest))?;

    fs::remove_file(source).map_err(io_err(source))?;

    Ok(Converted::Fresh(dest))
}
