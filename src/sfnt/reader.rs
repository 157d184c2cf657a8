//! Bounds-checked big-endian field reads.
//!
//! Every multi-byte integer in an sfnt file is big-endian. These helpers
//! check the requested range against the slice before touching it and
//! return `None` instead of panicking, so callers can map a short read to
//! whichever `ParseError` fits their stage.

use std::fmt;

/// A four-byte table or version tag, e.g. `head` or `OTTO`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag([u8; 4]);

impl Tag {
    pub const HEAD: Tag = Tag(*b"head");
    pub const HHEA: Tag = Tag(*b"hhea");

    pub const fn new(bytes: &[u8; 4]) -> Self {
        Tag(*bytes)
    }

    pub const fn from_u32(value: u32) -> Self {
        Tag(value.to_be_bytes())
    }

    pub const fn to_u32(self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Version tags like 0x00010000 aren't printable.
        if self.0.iter().all(|b| (0x20..0x7F).contains(b)) {
            for &b in &self.0 {
                write!(f, "{}", b as char)?;
            }
            Ok(())
        } else {
            write!(f, "0x{:08X}", self.to_u32())
        }
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({})", self)
    }
}

impl From<&[u8; 4]> for Tag {
    fn from(bytes: &[u8; 4]) -> Self {
        Tag::new(bytes)
    }
}

fn bytes_at<const N: usize>(data: &[u8], offset: usize) -> Option<[u8; N]> {
    let end = offset.checked_add(N)?;
    data.get(offset..end)?.try_into().ok()
}

pub fn read_u16(data: &[u8], offset: usize) -> Option<u16> {
    bytes_at(data, offset).map(u16::from_be_bytes)
}

pub fn read_i16(data: &[u8], offset: usize) -> Option<i16> {
    bytes_at(data, offset).map(i16::from_be_bytes)
}

pub fn read_u32(data: &[u8], offset: usize) -> Option<u32> {
    bytes_at(data, offset).map(u32::from_be_bytes)
}

pub fn read_tag(data: &[u8], offset: usize) -> Option<Tag> {
    bytes_at(data, offset).map(Tag)
}
