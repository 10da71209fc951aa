use std::collections::HashMap;

use winnow::binary::{le_u16, le_u32};
use winnow::combinator::repeat;
use winnow::error::{ErrMode, Needed};
use winnow::prelude::*;
use winnow::token::take;

use crate::structs::EndOfCentralDirectory;

/// One central-directory record, reduced to the fields the reader acts on.
/// The remaining fields are consumed positionally.
#[derive(Debug)]
pub(crate) struct CentralDirectoryEntry {
    pub(crate) compressed_size: u32,
    pub(crate) uncompressed_size: u32,
    pub(crate) local_header_offset: u32,
    pub(crate) file_name: String,
}

impl CentralDirectoryEntry {
    const MAGIC: u32 = 0x02014b50;

    fn parse(input: &mut &[u8]) -> ModalResult<CentralDirectoryEntry> {
        let _ = le_u32
            .verify(|magic| *magic == Self::MAGIC)
            .parse_next(input)?;

        // version made by, version needed, general purpose flags,
        // compression method, modification time and date, crc32
        let _ = (le_u16, le_u16, le_u16, le_u16, le_u16, le_u16, le_u32).parse_next(input)?;

        let (compressed_size, uncompressed_size) = (le_u32, le_u32).parse_next(input)?;

        let (file_name_length, extra_field_length, file_comment_length) =
            (le_u16, le_u16, le_u16).parse_next(input)?;

        // disk number start, internal and external attributes
        let _ = (le_u16, le_u16, le_u32).parse_next(input)?;

        let local_header_offset = le_u32.parse_next(input)?;

        let (file_name, _extra, _comment) = (
            take(file_name_length),
            take(extra_field_length),
            take(file_comment_length),
        )
            .parse_next(input)?;

        Ok(CentralDirectoryEntry {
            compressed_size,
            uncompressed_size,
            local_header_offset,
            file_name: String::from_utf8_lossy(file_name).to_string(),
        })
    }
}

#[derive(Debug)]
pub(crate) struct CentralDirectory {
    pub(crate) entries: HashMap<String, CentralDirectoryEntry>,
}

impl CentralDirectory {
    pub fn parse(input: &[u8], eocd: &EndOfCentralDirectory) -> ModalResult<CentralDirectory> {
        let mut input = input
            .get(eocd.central_dir_offset as usize..)
            .ok_or(ErrMode::Incomplete(Needed::Unknown))?;

        let entries: Vec<CentralDirectoryEntry> =
            repeat(0.., CentralDirectoryEntry::parse).parse_next(&mut input)?;

        Ok(CentralDirectory {
            entries: entries
                .into_iter()
                .map(|entry| (entry.file_name.clone(), entry))
                .collect(),
        })
    }
}
