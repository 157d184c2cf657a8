//! Structured error types for the font catalog.
//!
//! Errors fall into two classes. [`CatalogError`] is fatal for the whole run
//! (the family list could not be obtained, the manifest could not be
//! written). [`FontError`] belongs to a single font slot and never stops the
//! batch; it wraps either an I/O problem or a [`ParseError`] from the sfnt
//! extractor.

use std::path::PathBuf;

use thiserror::Error;

use crate::sfnt::Tag;

/// Why a buffer could not be turned into [`FontMetrics`](crate::sfnt::FontMetrics).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The header or table directory does not fit in the buffer.
    #[error("truncated file: header or table directory extends past end of data")]
    TruncatedFile,
    /// The sfnt version tag is not TrueType or CFF (collections included).
    #[error("unsupported font format '{tag}'")]
    UnsupportedFormat { tag: Tag },
    /// A table the extractor needs is not in the directory.
    #[error("missing required table '{tag}'")]
    MissingTable { tag: Tag },
    /// The table's offset/length exceed the buffer, or it is shorter than
    /// the fields the extractor reads.
    #[error("table '{tag}' is out of bounds or too short")]
    TableOutOfBounds { tag: Tag },
    /// Strict mode only: the stored table checksum disagrees with the payload.
    #[error("checksum mismatch in table '{tag}': directory says 0x{expected:08X}, computed 0x{actual:08X}")]
    ChecksumMismatch { tag: Tag, expected: u32, actual: u32 },
}

/// A failure confined to one font file.
#[derive(Debug, Error)]
pub enum FontError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}: file is {size} bytes, limit is {limit}", path.display())]
    TooLarge { path: PathBuf, size: u64, limit: u64 },
    /// A FIFO, device, directory or other non-regular file.
    #[error("{}: not a regular file", path.display())]
    NotAFile { path: PathBuf },
    /// The batch was stopped before this font was started.
    #[error("{}: cancelled", path.display())]
    Cancelled { path: PathBuf },
    #[error("{}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
}

impl FontError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            FontError::Io { path, .. }
            | FontError::TooLarge { path, .. }
            | FontError::NotAFile { path }
            | FontError::Cancelled { path }
            | FontError::Parse { path, .. } => path,
        }
    }
}

/// A failure that aborts the whole run.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
    #[error("git clone: {0}")]
    Git(String),
    #[error("parsing {}: {message}", path.display())]
    Metadata { path: PathBuf, message: String },
    #[error("writing manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}

impl CatalogError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        CatalogError::Io {
            context: context.into(),
            source,
        }
    }
}
