use log::warn;
use winnow::binary::{le_u16, le_u32};
use winnow::prelude::*;
use winnow::token::take;

use crate::structs::{ResChunkHeader, ResourceType, ResourceValue};

/// A namespace scope delimiter: `(prefix, uri)` as pool indices.
#[derive(Debug)]
pub(crate) struct XmlNamespace {
    pub(crate) prefix: u32,
    pub(crate) uri: u32,
}

impl XmlNamespace {
    pub fn parse(input: &mut &[u8], body_len: u32) -> ModalResult<XmlNamespace> {
        let mut body = take(body_len).parse_next(input)?;

        (le_u32, le_u32)
            .map(|(prefix, uri)| XmlNamespace { prefix, uri })
            .parse_next(&mut body)
    }
}

/// One attribute slot of an opening tag: pool indices plus the typed payload.
#[derive(Debug)]
pub(crate) struct XmlAttribute {
    pub(crate) namespace_uri: u32,
    pub(crate) name: u32,
    pub(crate) raw_value: u32,
    pub(crate) typed_value: ResourceValue,
}

impl XmlAttribute {
    /// Five 32-bit words; the element may declare a larger stride
    const SLOT_SIZE: u16 = 20;

    fn parse(input: &mut &[u8]) -> ModalResult<XmlAttribute> {
        (le_u32, le_u32, le_u32, ResourceValue::parse)
            .map(|(namespace_uri, name, raw_value, typed_value)| XmlAttribute {
                namespace_uri,
                name,
                raw_value,
                typed_value,
            })
            .parse_next(input)
    }
}

/// An opening tag with its decoded attribute list.
#[derive(Debug)]
pub(crate) struct XmlStartElement {
    pub(crate) namespace_uri: u32,
    pub(crate) name: u32,
    pub(crate) attributes: Vec<XmlAttribute>,
}

impl XmlStartElement {
    pub fn parse(input: &mut &[u8], body_len: u32) -> ModalResult<XmlStartElement> {
        // capture the declared body up front and address the attribute slots
        // inside it: the start offset and the per-slot stride both come from
        // the chunk, so padding before, between or after the slots never
        // lands in an attribute
        let body = take(body_len).parse_next(input)?;

        let mut head = body;
        let (namespace_uri, name, attribute_start, attribute_size, attribute_count) =
            (le_u32, le_u32, le_u16, le_u16, le_u16).parse_next(&mut head)?;
        // id/class/style attribute positions, not retained
        let _ = (le_u16, le_u16, le_u16).parse_next(&mut head)?;

        let stride = attribute_size.max(XmlAttribute::SLOT_SIZE) as usize;

        let mut attributes = Vec::with_capacity(attribute_count as usize);
        for slot in 0..attribute_count as usize {
            let offset = attribute_start as usize + slot * stride;
            let parsed = body
                .get(offset..)
                .and_then(|mut slot_bytes| XmlAttribute::parse(&mut slot_bytes).ok());

            match parsed {
                Some(attribute) => attributes.push(attribute),
                None => {
                    warn!("attribute slot {slot} lies outside its element chunk");
                    break;
                }
            }
        }

        Ok(XmlStartElement {
            namespace_uri,
            name,
            attributes,
        })
    }
}

/// A closing tag.
#[derive(Debug)]
pub(crate) struct XmlEndElement {
    pub(crate) namespace_uri: u32,
    pub(crate) name: u32,
}

impl XmlEndElement {
    pub fn parse(input: &mut &[u8], body_len: u32) -> ModalResult<XmlEndElement> {
        let mut body = take(body_len).parse_next(input)?;

        (le_u32, le_u32)
            .map(|(namespace_uri, name)| XmlEndElement {
                namespace_uri,
                name,
            })
            .parse_next(&mut body)
    }
}

/// Character data between tags. Only the raw pool string is kept; the typed
/// value that trails it has no use in a manifest.
#[derive(Debug)]
pub(crate) struct XmlCData {
    pub(crate) data: u32,
}

impl XmlCData {
    pub fn parse(input: &mut &[u8], body_len: u32) -> ModalResult<XmlCData> {
        let mut body = take(body_len).parse_next(input)?;

        le_u32.map(|data| XmlCData { data }).parse_next(&mut body)
    }
}

/// One parsed element chunk of the document body
#[derive(Debug)]
pub(crate) enum XmlNode {
    StartNamespace(XmlNamespace),
    EndNamespace(XmlNamespace),
    StartElement(XmlStartElement),
    EndElement(XmlEndElement),
    CData(XmlCData),
}

/// The resource map chunk is not interpreted, only consumed to keep the
/// cursor aligned with the following element chunks. Absent maps leave the
/// cursor untouched.
pub(crate) fn skip_resource_map(input: &mut &[u8]) -> ModalResult<()> {
    let mut probe = *input;
    let header = ResChunkHeader::parse(&mut probe)?;
    if header.type_ != ResourceType::XmlResourceMap {
        return Ok(());
    }

    *input = probe;
    let _ = take(header.content_size()).parse_next(input)?;
    Ok(())
}
