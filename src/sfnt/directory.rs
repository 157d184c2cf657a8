//! The sfnt header and table directory.
//!
//! An sfnt file opens with a 12-byte header followed by `numTables` 16-byte
//! records, each pointing at one tagged table elsewhere in the file.

use crate::error::ParseError;

use super::reader::{read_tag, read_u16, read_u32, Tag};

pub const HEADER_LEN: usize = 12;
pub const ENTRY_LEN: usize = 16;

/// TrueType outlines.
pub const VERSION_TRUETYPE: Tag = Tag::from_u32(0x0001_0000);
/// CFF outlines.
pub const VERSION_CFF: Tag = Tag::new(b"OTTO");
/// TrueType collection. Recognised only so it can be rejected by name.
pub const VERSION_COLLECTION: Tag = Tag::new(b"ttcf");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SfntHeader {
    pub version: Tag,
    pub num_tables: u16,
    pub search_range: u16,
    pub entry_selector: u16,
    pub range_shift: u16,
}

impl SfntHeader {
    /// Parse and validate the header, including that the whole directory fits.
    pub fn parse(data: &[u8]) -> Result<Self, ParseError> {
        if data.len() < HEADER_LEN {
            return Err(ParseError::TruncatedFile);
        }
        let version = read_tag(data, 0).ok_or(ParseError::TruncatedFile)?;
        if version != VERSION_TRUETYPE && version != VERSION_CFF {
            return Err(ParseError::UnsupportedFormat { tag: version });
        }

        let field = |offset| read_u16(data, offset).ok_or(ParseError::TruncatedFile);
        let header = SfntHeader {
            version,
            num_tables: field(4)?,
            search_range: field(6)?,
            entry_selector: field(8)?,
            range_shift: field(10)?,
        };

        if header.directory_end() > data.len() {
            return Err(ParseError::TruncatedFile);
        }
        Ok(header)
    }

    /// Byte offset one past the last directory record.
    pub fn directory_end(&self) -> usize {
        HEADER_LEN + self.num_tables as usize * ENTRY_LEN
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDirectoryEntry {
    pub tag: Tag,
    pub checksum: u32,
    pub offset: u32,
    pub length: u32,
}

impl TableDirectoryEntry {
    fn parse(data: &[u8], at: usize) -> Option<Self> {
        Some(TableDirectoryEntry {
            tag: read_tag(data, at)?,
            checksum: read_u32(data, at + 4)?,
            offset: read_u32(data, at + 8)?,
            length: read_u32(data, at + 12)?,
        })
    }

    /// The table payload, if `offset + length` lies within `data`.
    pub fn slice<'a>(&self, data: &'a [u8]) -> Option<&'a [u8]> {
        let start = self.offset as usize;
        let end = start.checked_add(self.length as usize)?;
        data.get(start..end)
    }

    /// The table payload, validated against the buffer and a minimum length.
    pub fn checked_slice<'a>(&self, data: &'a [u8], min_len: usize) -> Result<&'a [u8], ParseError> {
        self.slice(data)
            .filter(|table| table.len() >= min_len)
            .ok_or(ParseError::TableOutOfBounds { tag: self.tag })
    }
}

/// A parsed header plus its directory records, in file order.
#[derive(Debug, Clone)]
pub struct TableDirectory {
    pub header: SfntHeader,
    entries: Vec<TableDirectoryEntry>,
}

impl TableDirectory {
    pub fn parse(data: &[u8]) -> Result<Self, ParseError> {
        let header = SfntHeader::parse(data)?;
        let entries = (0..header.num_tables as usize)
            .map(|i| TableDirectoryEntry::parse(data, HEADER_LEN + i * ENTRY_LEN))
            .collect::<Option<Vec<_>>>()
            .ok_or(ParseError::TruncatedFile)?;
        Ok(TableDirectory { header, entries })
    }

    /// First entry carrying `tag`. Later duplicates are ignored.
    pub fn find(&self, tag: Tag) -> Option<&TableDirectoryEntry> {
        // Directories are small (a few dozen entries at most), so a linear
        // scan is fine and keeps first-match semantics on unsorted input.
        self.entries.iter().find(|entry| entry.tag == tag)
    }

    pub fn require(&self, tag: Tag) -> Result<&TableDirectoryEntry, ParseError> {
        self.find(tag).ok_or(ParseError::MissingTable { tag })
    }

    pub fn entries(&self) -> &[TableDirectoryEntry] {
        &self.entries
    }
}

/// OpenType table checksum: wrapping sum of big-endian u32 words, with the
/// final partial word zero-padded.
pub fn calc_table_checksum(table: &[u8]) -> u32 {
    table.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}

/// Offset of `checksumAdjustment` inside `head`; excluded from its checksum.
const HEAD_CHECKSUM_ADJUSTMENT: usize = 8;

/// Compare the stored checksum with the payload's.
pub fn verify_checksum(entry: &TableDirectoryEntry, table: &[u8]) -> Result<(), ParseError> {
    let mut actual = calc_table_checksum(table);
    if entry.tag == Tag::HEAD {
        if let Some(adjustment) = read_u32(table, HEAD_CHECKSUM_ADJUSTMENT) {
            actual = actual.wrapping_sub(adjustment);
        }
    }
    if actual != entry.checksum {
        return Err(ParseError::ChecksumMismatch {
            tag: entry.tag,
            expected: entry.checksum,
            actual,
        });
    }
    Ok(())
}
