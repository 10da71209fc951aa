use bitflags::bitflags;
use log::warn;
use winnow::binary::{le_u16, le_u32, u8};
use winnow::combinator::repeat;
use winnow::error::{ErrMode, Needed};
use winnow::prelude::*;
use winnow::token::take;

use crate::structs::ResChunkHeader;

bitflags! {
    #[derive(Debug)]
    pub(crate) struct PoolFlags: u32 {
        const SORTED = 1 << 0;
        const UTF8 = 1 << 8;
    }
}

#[derive(Debug)]
pub(crate) struct StringPoolHeader {
    pub(crate) header: ResChunkHeader,
    pub(crate) string_count: u32,
    pub(crate) style_count: u32,
    pub(crate) flags: u32,
    pub(crate) strings_start: u32,
    pub(crate) styles_start: u32,
}

impl StringPoolHeader {
    /// chunk header (8) + five u32 fields
    const SIZE: u32 = 8 + 5 * 4;

    pub fn parse(input: &mut &[u8]) -> ModalResult<StringPoolHeader> {
        let header = ResChunkHeader::parse(input)?;
        let (string_count, style_count, flags, strings_start, styles_start) =
            (le_u32, le_u32, le_u32, le_u32, le_u32).parse_next(input)?;

        Ok(StringPoolHeader {
            header,
            string_count,
            style_count,
            flags,
            strings_start,
            styles_start,
        })
    }

    #[inline]
    pub fn is_utf8(&self) -> bool {
        PoolFlags::from_bits_truncate(self.flags).contains(PoolFlags::UTF8)
    }
}

/// Decoded string pool of a compiled document.
///
/// The encoding flag applies to the whole pool and lives here, so independent
/// documents can be decoded concurrently. Lookups are lenient: an index past
/// the end of the pool resolves to the empty string, which keeps a single bad
/// reference from sinking an otherwise valid manifest.
#[derive(Debug)]
pub(crate) struct StringPool {
    strings: Vec<String>,
    utf8: bool,
}

impl StringPool {
    pub fn parse(input: &mut &[u8]) -> ModalResult<StringPool> {
        let mut pool_header = StringPoolHeader::parse(input)?;

        // some malware tampers the declared count, the offset table is authoritative
        let table_bytes = pool_header
            .style_count
            .checked_mul(4)
            .and_then(|styles| styles.checked_add(StringPoolHeader::SIZE))
            .and_then(|reserved| pool_header.strings_start.checked_sub(reserved))
            .ok_or_else(|| ErrMode::Incomplete(Needed::Unknown))?;
        let calculated_string_count = table_bytes / 4;

        if calculated_string_count != pool_header.string_count {
            warn!(
                "invalid string count: declared {}, offset table holds {}",
                pool_header.string_count, calculated_string_count
            );
            pool_header.string_count = calculated_string_count;
        }

        let string_offsets: Vec<u32> =
            repeat(pool_header.string_count as usize, le_u32).parse_next(input)?;

        let _style_offsets: Vec<u32> =
            repeat(pool_header.style_count as usize, le_u32).parse_next(input)?;

        if pool_header.style_count != 0 && pool_header.styles_start == 0 {
            return Err(ErrMode::Cut(winnow::error::ContextError::new()));
        }

        let raw_end = if pool_header.styles_start != 0 {
            pool_header.styles_start
        } else {
            pool_header.header.size
        };
        let raw_len = raw_end
            .checked_sub(pool_header.strings_start)
            .ok_or_else(|| ErrMode::Incomplete(Needed::Unknown))?;

        let raw = take(raw_len).parse_next(input)?;

        // style raw data trails the strings and is not interpreted
        if pool_header.styles_start != 0 {
            let style_len = pool_header.header.size.saturating_sub(pool_header.styles_start);
            let _ = take(style_len).parse_next(input)?;
        }

        let utf8 = pool_header.is_utf8();
        let mut strings = Vec::with_capacity(string_offsets.len());

        for &offset in &string_offsets {
            let decoded = raw
                .get(offset as usize..)
                .and_then(|mut slice| Self::parse_string(&mut slice, utf8).ok())
                .unwrap_or_default();

            // indices must stay dense, a broken entry decodes to ""
            strings.push(decoded);
        }

        Ok(StringPool { strings, utf8 })
    }

    fn parse_string(input: &mut &[u8], utf8: bool) -> ModalResult<String> {
        let string = if utf8 {
            // a pair of lengths: character count, then byte count,
            // each one or two bytes wide depending on the high bit
            let char_len = u8.parse_next(input)?;
            if char_len & 0x80 != 0 {
                let _ = u8.parse_next(input)?;
            }

            let byte_len = u8.parse_next(input)?;
            let byte_count = if byte_len & 0x80 != 0 {
                let ext = u8.parse_next(input)?;
                (((byte_len & 0x7F) as u32) << 8) | ext as u32
            } else {
                byte_len as u32
            };

            let content = take(byte_count).parse_next(input)?;

            String::from_utf8_lossy(content).to_string()
        } else {
            // utf-16le, the first word is the character count
            let u16len = le_u16(input)?;

            let real_len = if u16len & 0x8000 != 0 {
                let u16len_fix: u16 = le_u16(input)?;
                ((((u16len & 0x7FFF) as u32) << 16) | u16len_fix as u32) as usize
            } else {
                u16len as usize
            };

            let content = take(real_len * 2).parse_next(input)?;

            Self::read_utf16(content, real_len)
        };

        Ok(string)
    }

    /// Convert UTF-16LE code units into a string, recognizing surrogate pairs.
    /// A lone or truncated surrogate collapses the whole entry to "".
    fn read_utf16(slice: &[u8], size: usize) -> String {
        char::decode_utf16(
            slice
                .chunks_exact(2)
                .take(size)
                .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]])),
        )
        .collect::<Result<String, _>>()
        .unwrap_or_default()
    }

    /// Lookup by pool index, the empty string on out-of-range indices
    pub fn get(&self, idx: u32) -> &str {
        self.strings
            .get(idx as usize)
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    #[inline]
    pub fn is_utf8(&self) -> bool {
        self.utf8
    }

    #[cfg(test)]
    pub(crate) fn empty() -> StringPool {
        StringPool {
            strings: Vec::new(),
            utf8: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_u32(buf: &mut Vec<u8>, value: u32) {
        buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Assemble a string chunk holding the given entries, utf-16le encoded.
    fn build_utf16_chunk(entries: &[&[u16]]) -> Vec<u8> {
        let mut raw = Vec::new();
        let mut offsets = Vec::new();
        for units in entries {
            offsets.push(raw.len() as u32);
            raw.extend_from_slice(&(units.len() as u16).to_le_bytes());
            for unit in *units {
                raw.extend_from_slice(&unit.to_le_bytes());
            }
            raw.extend_from_slice(&0u16.to_le_bytes());
        }
        while raw.len() % 4 != 0 {
            raw.push(0);
        }

        let strings_start = 28 + 4 * entries.len() as u32;
        let total = strings_start + raw.len() as u32;

        let mut buf = Vec::new();
        buf.extend_from_slice(&0x0001u16.to_le_bytes());
        buf.extend_from_slice(&0x001Cu16.to_le_bytes());
        push_u32(&mut buf, total);
        push_u32(&mut buf, entries.len() as u32);
        push_u32(&mut buf, 0); // style count
        push_u32(&mut buf, 0); // flags: utf-16
        push_u32(&mut buf, strings_start);
        push_u32(&mut buf, 0); // styles start
        for offset in offsets {
            push_u32(&mut buf, offset);
        }
        buf.extend_from_slice(&raw);
        buf
    }

    #[test]
    fn decodes_utf16_strings() {
        let chunk = build_utf16_chunk(&[&[0x0068, 0x0069], &[0x043f]]);
        let pool = StringPool::parse(&mut &chunk[..]).unwrap();

        assert_eq!(pool.len(), 2);
        assert!(!pool.is_utf8());
        assert_eq!(pool.get(0), "hi");
        assert_eq!(pool.get(1), "п");
    }

    #[test]
    fn decodes_surrogate_pairs() {
        // U+1F600 encoded as the D83D/DE00 pair
        let chunk = build_utf16_chunk(&[&[0xD83D, 0xDE00]]);
        let pool = StringPool::parse(&mut &chunk[..]).unwrap();

        assert_eq!(pool.get(0), "\u{1F600}");
    }

    #[test]
    fn lone_surrogate_decodes_to_empty() {
        let chunk = build_utf16_chunk(&[&[0xD83D, 0x0041]]);
        let pool = StringPool::parse(&mut &chunk[..]).unwrap();

        assert_eq!(pool.get(0), "");
    }

    #[test]
    fn out_of_range_lookup_is_empty() {
        let chunk = build_utf16_chunk(&[&[0x0061]]);
        let pool = StringPool::parse(&mut &chunk[..]).unwrap();

        assert_eq!(pool.get(0), "a");
        assert_eq!(pool.get(7), "");
    }

    #[test]
    fn decode_is_deterministic() {
        let chunk = build_utf16_chunk(&[&[0x0061, 0x0062], &[0xD83D, 0xDE00]]);
        let first = StringPool::parse(&mut &chunk[..]).unwrap();
        let second = StringPool::parse(&mut &chunk[..]).unwrap();

        for idx in 0..first.len() as u32 {
            assert_eq!(first.get(idx), second.get(idx));
        }
    }

    #[test]
    fn styles_without_offset_is_malformed() {
        let mut chunk = build_utf16_chunk(&[&[0x0061]]);
        // patch the style count while leaving the style offset at zero
        chunk[12..16].copy_from_slice(&1u32.to_le_bytes());

        assert!(StringPool::parse(&mut &chunk[..]).is_err());
    }
}
