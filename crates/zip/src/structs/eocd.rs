use memchr::memmem;
use winnow::binary::{le_u16, le_u32};
use winnow::prelude::*;
use winnow::token::take;

/// End-of-central-directory record, located by scanning backwards for its
/// magic. Only the fields the reader acts on are retained.
#[derive(Debug)]
pub(crate) struct EndOfCentralDirectory {
    pub(crate) total_entries: u16,
    pub(crate) central_dir_offset: u32,
}

impl EndOfCentralDirectory {
    const MAGIC: [u8; 4] = [0x50, 0x4B, 0x05, 0x06];

    pub fn parse(input: &mut &[u8]) -> ModalResult<EndOfCentralDirectory> {
        let _ = take(4usize)
            .verify(|magic: &[u8]| magic == Self::MAGIC)
            .parse_next(input)?;

        // disk number, start disk, entries on this disk
        let _ = (le_u16, le_u16, le_u16).parse_next(input)?;

        let (total_entries, _central_dir_size, central_dir_offset) =
            (le_u16, le_u32, le_u32).parse_next(input)?;

        Ok(EndOfCentralDirectory {
            total_entries,
            central_dir_offset,
        })
    }

    /// Scan for the record magic from the end of the buffer, in chunks
    pub fn find(input: &[u8], chunk_size: usize) -> Option<usize> {
        let mut end = input.len();

        while end > 0 {
            let start = end.saturating_sub(chunk_size);
            let chunk = &input[start..end];

            if let Some(pos) = memmem::rfind(chunk, &Self::MAGIC) {
                return Some(start + pos);
            }

            end = start;
        }

        None
    }
}
