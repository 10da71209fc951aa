//! LEB128 readers used by class data, code items and debug info.

use winnow::binary::u8;
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;

#[inline]
pub(crate) fn uleb128(input: &mut &[u8]) -> ModalResult<u64> {
    let mut val = 0u64;
    let mut shift = 0u32;

    loop {
        let byte = u8.parse_next(input)?;
        let b = (byte & 0x7f) as u64;
        val |= b
            .checked_shl(shift)
            .ok_or(ErrMode::Cut(ContextError::new()))?;

        if byte & 0x80 == 0 {
            break;
        }
        shift += 7;
    }

    Ok(val)
}

/// Signed LEB128, sign-extended from the last group
#[inline]
pub(crate) fn sleb128(input: &mut &[u8]) -> ModalResult<i64> {
    let mut val = 0i64;
    let mut shift = 0u32;

    loop {
        let byte = u8.parse_next(input)?;
        if shift >= 64 {
            return Err(ErrMode::Cut(ContextError::new()));
        }
        val |= ((byte & 0x7f) as i64) << shift;
        shift += 7;

        if byte & 0x80 == 0 {
            if shift < 64 && byte & 0x40 != 0 {
                val |= -1i64 << shift;
            }
            break;
        }
    }

    Ok(val)
}

/// The `uleb128p1` encoding: the value plus one, so -1 round-trips as 0
#[inline]
pub(crate) fn uleb128p1(input: &mut &[u8]) -> ModalResult<Option<u32>> {
    let val = uleb128(input)?;
    if val == 0 {
        Ok(None)
    } else {
        Ok(Some((val - 1) as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_single_and_multi_byte_uleb() {
        assert_eq!(uleb128(&mut &[0x00][..]).unwrap(), 0);
        assert_eq!(uleb128(&mut &[0x7f][..]).unwrap(), 127);
        assert_eq!(uleb128(&mut &[0x80, 0x01][..]).unwrap(), 128);
        assert_eq!(uleb128(&mut &[0xb4, 0x07][..]).unwrap(), 948);
    }

    #[test]
    fn reads_signed_sleb() {
        assert_eq!(sleb128(&mut &[0x00][..]).unwrap(), 0);
        assert_eq!(sleb128(&mut &[0x7f][..]).unwrap(), -1);
        assert_eq!(sleb128(&mut &[0x80, 0x7f][..]).unwrap(), -128);
        assert_eq!(sleb128(&mut &[0x3c][..]).unwrap(), 60);
    }

    #[test]
    fn uleb128p1_encodes_absence_as_zero() {
        assert_eq!(uleb128p1(&mut &[0x00][..]).unwrap(), None);
        assert_eq!(uleb128p1(&mut &[0x01][..]).unwrap(), Some(0));
        assert_eq!(uleb128p1(&mut &[0x05][..]).unwrap(), Some(4));
    }
}
