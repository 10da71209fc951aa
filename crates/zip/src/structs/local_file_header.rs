use winnow::binary::{le_u16, le_u32};
use winnow::error::{ErrMode, Needed};
use winnow::prelude::*;
use winnow::token::take;

/// Local file header preceding each member's data.
///
/// Sizes here can be zeroed or tampered; the reader falls back to the
/// central directory in that case.
#[derive(Debug)]
pub(crate) struct LocalFileHeader {
    pub(crate) compression_method: u16,
    pub(crate) compressed_size: u32,
    pub(crate) uncompressed_size: u32,
    file_name_length: u16,
    extra_field_length: u16,
}

impl LocalFileHeader {
    const MAGIC: u32 = 0x04034b50;

    pub fn parse(input: &[u8], offset: usize) -> ModalResult<LocalFileHeader> {
        let mut input = input
            .get(offset..)
            .ok_or(ErrMode::Incomplete(Needed::Unknown))?;

        let _ = le_u32
            .verify(|magic| *magic == Self::MAGIC)
            .parse_next(&mut input)?;

        // version needed, general purpose flags
        let _ = (le_u16, le_u16).parse_next(&mut input)?;

        let compression_method = le_u16.parse_next(&mut input)?;

        // modification time and date, crc32
        let _ = (le_u16, le_u16, le_u32).parse_next(&mut input)?;

        let (compressed_size, uncompressed_size) = (le_u32, le_u32).parse_next(&mut input)?;
        let (file_name_length, extra_field_length) = (le_u16, le_u16).parse_next(&mut input)?;

        let _ = (take(file_name_length), take(extra_field_length)).parse_next(&mut input)?;

        Ok(LocalFileHeader {
            compression_method,
            compressed_size,
            uncompressed_size,
            file_name_length,
            extra_field_length,
        })
    }

    /// Get structure size
    ///
    /// 4 (MAGIC) + 26 (DATA) + file name length + extra field length
    #[inline]
    pub fn size(&self) -> usize {
        30 + self.file_name_length as usize + self.extra_field_length as usize
    }
}
