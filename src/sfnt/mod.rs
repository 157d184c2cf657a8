//! # SFNT Metrics Extraction
//!
//! Reads the sfnt container shared by TrueType and OpenType fonts and pulls
//! four vertical metrics out of the `head` and `hhea` tables. No outline,
//! hinting or layout data is touched.
//!
//! ## Pipeline
//!
//! 1. Validate the 12-byte header and the version tag
//! 2. Parse the table directory (first entry wins on duplicate tags)
//! 3. Look up `head` and `hhea`
//! 4. Bounds-check both tables against the buffer and their minimum lengths
//! 5. Decode the fields and derive [`FontMetrics`]
//!
//! Each stage either advances or returns a [`ParseError`]. There is no
//! partial result.

pub mod directory;
pub mod reader;
pub mod tables;

use serde::Serialize;

use crate::error::ParseError;
use directory::{verify_checksum, TableDirectory};
pub use reader::Tag;
use tables::{HeadTable, HheaTable};

/// Vertical metrics of one font face, in font design units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FontMetrics {
    /// Size of the design grid (`unitsPerEm`).
    pub em_size: u16,
    pub ascent: i16,
    /// Magnitude below the baseline: the negated `hhea.descender`.
    pub descent: i16,
    /// Baseline-to-baseline distance: `ascender - descender + lineGap`.
    pub height: i16,
}

impl FontMetrics {
    fn derive(head: HeadTable, hhea: HheaTable) -> Self {
        // int16 arithmetic as stored in the table. Out-of-range values wrap
        // rather than panic on hostile input.
        FontMetrics {
            em_size: head.units_per_em,
            ascent: hhea.ascender,
            descent: hhea.descender.wrapping_neg(),
            height: hhea
                .ascender
                .wrapping_sub(hhea.descender)
                .wrapping_add(hhea.line_gap),
        }
    }
}

/// Extraction switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Reject `head`/`hhea` whose directory checksum doesn't match the payload.
    pub verify_checksums: bool,
}

/// Extract metrics from the raw bytes of one font file.
///
/// Pure and reentrant: the buffer is only borrowed for the call.
pub fn extract_metrics(data: &[u8]) -> Result<FontMetrics, ParseError> {
    extract_metrics_with(data, ParseOptions::default())
}

pub fn extract_metrics_with(data: &[u8], options: ParseOptions) -> Result<FontMetrics, ParseError> {
    let directory = TableDirectory::parse(data)?;

    let head_entry = directory.require(Tag::HEAD)?;
    let hhea_entry = directory.require(Tag::HHEA)?;

    let head_data = head_entry.checked_slice(data, HeadTable::MIN_LEN)?;
    let hhea_data = hhea_entry.checked_slice(data, HheaTable::MIN_LEN)?;

    if options.verify_checksums {
        verify_checksum(head_entry, head_data)?;
        verify_checksum(hhea_entry, hhea_data)?;
    }

    let head = HeadTable::parse(head_data)?;
    let hhea = HheaTable::parse(hhea_data)?;
    Ok(FontMetrics::derive(head, hhea))
}
