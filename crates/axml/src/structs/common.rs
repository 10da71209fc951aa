use winnow::binary::{le_u16, le_u32, u8};
use winnow::prelude::*;

use crate::structs::StringPool;

/// See: https://cs.android.com/android/platform/superproject/main/+/main:frameworks/base/libs/androidfw/include/androidfw/ResourceTypes.h;l=237
#[derive(Debug, PartialEq, Default, Eq, PartialOrd, Ord, Clone, Copy)]
#[repr(u16)]
pub(crate) enum ResourceType {
    #[default]
    Null = 0x0000,
    StringPool = 0x0001,
    Xml = 0x0003,

    XmlStartNamespace = 0x0100,
    XmlEndNamespace = 0x0101,
    XmlStartElement = 0x0102,
    XmlEndElement = 0x0103,
    XmlCdata = 0x0104,
    XmlLastChunk = 0x017f,
    XmlResourceMap = 0x0180,

    Unknown(u16),
}

impl From<u16> for ResourceType {
    fn from(value: u16) -> Self {
        match value {
            0x0000 => ResourceType::Null,
            0x0001 => ResourceType::StringPool,
            0x0003 => ResourceType::Xml,
            0x0100 => ResourceType::XmlStartNamespace,
            0x0101 => ResourceType::XmlEndNamespace,
            0x0102 => ResourceType::XmlStartElement,
            0x0103 => ResourceType::XmlEndElement,
            0x0104 => ResourceType::XmlCdata,
            0x017f => ResourceType::XmlLastChunk,
            0x0180 => ResourceType::XmlResourceMap,
            other => ResourceType::Unknown(other),
        }
    }
}

/// Header that appears at the front of every data chunk in a compiled resource
///
/// See: https://cs.android.com/android/platform/superproject/+/android-latest-release:frameworks/base/libs/androidfw/include/androidfw/ResourceTypes.h;l=220?q=ResourceTypes.h&ss=android
#[derive(Debug, Default)]
pub(crate) struct ResChunkHeader {
    /// Type identifier for this chunk. The meaning of this value depends on the containing chunk.
    pub(crate) type_: ResourceType,

    /// Size of the chunk header (in bytes)
    pub(crate) header_size: u16,

    /// Total size of this chunk (in bytes), including any data associated with it.
    /// Adding this value to the chunk start skips its contents entirely.
    pub(crate) size: u32,
}

impl ResChunkHeader {
    #[inline]
    pub fn parse(input: &mut &[u8]) -> ModalResult<ResChunkHeader> {
        (le_u16, le_u16, le_u32)
            .map(|(type_, header_size, size)| ResChunkHeader {
                type_: ResourceType::from(type_),
                header_size,
                size,
            })
            .parse_next(input)
    }

    /// Get the size of the data without taking into account the size of the structure itself
    #[inline(always)]
    pub fn content_size(&self) -> u32 {
        // u16 (type_) + u16 (header_size) + u32 (size)
        self.size.saturating_sub(2 + 2 + 4)
    }
}

/// Typed value attached to an attribute or CDATA node
///
/// See: https://cs.android.com/android/platform/superproject/+/android-latest-release:frameworks/base/libs/androidfw/include/androidfw/ResourceTypes.h;l=285
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct ResourceValue {
    /// Number of bytes in this structure
    pub(crate) size: u16,

    /// Always set to 0
    pub(crate) res: u8,

    /// Type of the data value, one of the `TYPE_*` constants
    pub(crate) data_type: u8,

    /// Data itself, interpreted according to `data_type`
    pub(crate) data: u32,
}

impl ResourceValue {
    pub(crate) const TYPE_NULL: u8 = 0x00;
    pub(crate) const TYPE_REFERENCE: u8 = 0x01;
    pub(crate) const TYPE_ATTRIBUTE: u8 = 0x02;
    pub(crate) const TYPE_STRING: u8 = 0x03;
    pub(crate) const TYPE_FLOAT: u8 = 0x04;
    pub(crate) const TYPE_DIMENSION: u8 = 0x05;
    pub(crate) const TYPE_FRACTION: u8 = 0x06;
    pub(crate) const TYPE_FIRST_INT: u8 = 0x10;
    pub(crate) const TYPE_HEX: u8 = 0x11;
    pub(crate) const TYPE_BOOLEAN: u8 = 0x12;
    pub(crate) const TYPE_FIRST_COLOR: u8 = 0x1c;
    pub(crate) const TYPE_LAST_COLOR: u8 = 0x1f;
    pub(crate) const TYPE_LAST_INT: u8 = 0x1f;

    const RADIX_MULTS: [f64; 4] = [0.00390625, 3.051758e-005, 1.192093e-007, 4.656613e-010];
    const DIMENSION_UNITS: [&str; 6] = ["px", "dip", "sp", "pt", "in", "mm"];
    const FRACTION_UNITS: [&str; 2] = ["%", "%p"];
    const COMPLEX_UNIT_MASK: u32 = 0x0F;

    #[inline]
    pub fn parse(input: &mut &[u8]) -> ModalResult<ResourceValue> {
        (le_u16, u8, u8, le_u32)
            .map(|(size, res, data_type, data)| ResourceValue {
                size,
                res,
                data_type,
                data,
            })
            .parse_next(input)
    }

    /// Render the value the way aapt prints it back into text
    pub fn format(&self, string_pool: &StringPool) -> String {
        match self.data_type {
            Self::TYPE_NULL => String::new(),
            Self::TYPE_REFERENCE => format!("@{}{:08X}", self.fmt_package(), self.data),
            Self::TYPE_ATTRIBUTE => {
                if self.data >> 24 == 1 {
                    format!("?android:{:08x}", self.data)
                } else {
                    format!("?{:08X}", self.data)
                }
            }
            Self::TYPE_STRING => string_pool.get(self.data).to_owned(),
            Self::TYPE_FLOAT => f32::from_bits(self.data).to_string(),
            Self::TYPE_DIMENSION => {
                let idx = (self.data & Self::COMPLEX_UNIT_MASK) as usize;
                let unit = Self::DIMENSION_UNITS.get(idx).unwrap_or(&"");
                format!("{}{}", self.complex_to_float(), unit)
            }
            Self::TYPE_FRACTION => {
                let idx = (self.data & Self::COMPLEX_UNIT_MASK) as usize;
                let unit = Self::FRACTION_UNITS.get(idx).unwrap_or(&"");
                format!("{}{}", self.complex_to_float(), unit)
            }
            Self::TYPE_HEX => format!("0x{:08x}", self.data),
            Self::TYPE_BOOLEAN => {
                if self.data == 0 {
                    "false".to_owned()
                } else {
                    "true".to_owned()
                }
            }
            Self::TYPE_FIRST_COLOR..=Self::TYPE_LAST_COLOR => format!("#{:08x}", self.data),
            Self::TYPE_FIRST_INT..=Self::TYPE_LAST_INT => format!("{}", self.data as i32),
            other => format!("<0x{:x}, type 0x{:02x}>", self.data, other),
        }
    }

    #[inline(always)]
    fn complex_to_float(&self) -> f64 {
        ((self.data & 0xFFFFFF00) as f64) * Self::RADIX_MULTS[((self.data >> 4) & 3) as usize]
    }

    #[inline(always)]
    fn fmt_package(&self) -> &str {
        if self.data >> 24 == 1 { "android:" } else { "" }
    }
}
