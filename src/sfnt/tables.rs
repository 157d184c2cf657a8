//! Fixed-layout decoding of the two tables the extractor reads.

use crate::error::ParseError;

use super::reader::{read_i16, read_u16, Tag};

/// [Font header](https://learn.microsoft.com/en-us/typography/opentype/spec/head) table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadTable {
    pub units_per_em: u16,
}

impl HeadTable {
    const UNITS_PER_EM: usize = 18;
    /// Enough to cover `unitsPerEm`.
    pub const MIN_LEN: usize = 20;

    /// `data` is the table payload, already checked to be `MIN_LEN` long.
    pub fn parse(data: &[u8]) -> Result<Self, ParseError> {
        let out_of_bounds = ParseError::TableOutOfBounds { tag: Tag::HEAD };
        Ok(HeadTable {
            units_per_em: read_u16(data, Self::UNITS_PER_EM).ok_or(out_of_bounds)?,
        })
    }
}

/// [Horizontal header](https://learn.microsoft.com/en-us/typography/opentype/spec/hhea) table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HheaTable {
    pub ascender: i16,
    /// Negative for glyphs extending below the baseline.
    pub descender: i16,
    pub line_gap: i16,
}

impl HheaTable {
    const ASCENDER: usize = 4;
    const DESCENDER: usize = 6;
    const LINE_GAP: usize = 8;
    pub const MIN_LEN: usize = 10;

    pub fn parse(data: &[u8]) -> Result<Self, ParseError> {
        let field = |offset| {
            read_i16(data, offset).ok_or(ParseError::TableOutOfBounds { tag: Tag::HHEA })
        };
        Ok(HheaTable {
            ascender: field(Self::ASCENDER)?,
            descender: field(Self::DESCENDER)?,
            line_gap: field(Self::LINE_GAP)?,
        })
    }
}
