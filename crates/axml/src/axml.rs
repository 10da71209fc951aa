use std::fmt::Write;

use log::warn;
use winnow::binary::le_u32;
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::take;

use crate::dom::Element;
use crate::errors::AxmlError;
use crate::events::{Events, XmlEvent};
use crate::structs::{
    ResChunkHeader, ResourceType, ResourceValue, StringPool, XmlAttribute, XmlCData,
    XmlEndElement, XmlNamespace, XmlNode, XmlStartElement, skip_resource_map,
};

/// A decoded compiled manifest.
#[derive(Debug)]
pub struct Axml {
    /// Set when the document chunk type was tampered with
    pub is_tampered: bool,

    string_pool: StringPool,
    nodes: Vec<XmlNode>,

    pub root: Element,
}

impl Axml {
    pub fn parse(data: &[u8]) -> Result<Axml, AxmlError> {
        let input = &mut &data[..];

        // basic sanity check
        if input.len() < 8 {
            return Err(AxmlError::TooSmallError);
        }

        let header = ResChunkHeader::parse(input).map_err(|_| AxmlError::HeaderError)?;

        // some malware tampers the document chunk type
        let is_tampered = header.type_ != ResourceType::Xml;

        // header size must be 8 bytes, otherwise this is not a valid document
        if header.header_size != 8 {
            return Err(AxmlError::HeaderSizeError(header.header_size));
        }

        let string_pool = StringPool::parse(input).map_err(|err| match err {
            ErrMode::Cut(_) => AxmlError::StylesOffsetError,
            _ => AxmlError::StringPoolError,
        })?;

        skip_resource_map(input).map_err(|_| AxmlError::ResourceMapError)?;

        let nodes = Self::parse_xml_tree(input).map_err(|_| AxmlError::XmlTreeError)?;

        let root =
            Self::build_element_tree(&nodes, &string_pool).ok_or(AxmlError::MissingRoot)?;

        Ok(Axml {
            is_tampered,
            string_pool,
            nodes,
            root,
        })
    }

    fn parse_xml_tree(input: &mut &[u8]) -> ModalResult<Vec<XmlNode>> {
        let mut nodes: Vec<XmlNode> = Vec::new();

        loop {
            let chunk_header = match ResChunkHeader::parse(input) {
                Ok(v) => v,
                Err(ErrMode::Backtrack(_)) => return Ok(nodes),
                Err(e) => return Err(e),
            };

            // skip non xml chunks
            if chunk_header.type_ < ResourceType::XmlStartNamespace
                || chunk_header.type_ > ResourceType::XmlLastChunk
            {
                warn!("not a xml resource chunk: {chunk_header:?}");
                let _ =
                    take::<u32, &[u8], ContextError>(chunk_header.content_size()).parse_next(input);
                continue;
            }

            // another junk malware technique
            if chunk_header.header_size != 0x10 {
                warn!("xml resource chunk header size is not 0x10: {chunk_header:?}");
                let _ =
                    take::<u32, &[u8], ContextError>(chunk_header.content_size()).parse_next(input);
                continue;
            }

            // line number and comment index, not retained
            let _ = (le_u32, le_u32).parse_next(input)?;
            let body_len = chunk_header.content_size().saturating_sub(4 + 4);

            let node = match chunk_header.type_ {
                ResourceType::XmlStartNamespace => {
                    XmlNode::StartNamespace(XmlNamespace::parse(input, body_len)?)
                }
                ResourceType::XmlEndNamespace => {
                    XmlNode::EndNamespace(XmlNamespace::parse(input, body_len)?)
                }
                ResourceType::XmlStartElement => {
                    XmlNode::StartElement(XmlStartElement::parse(input, body_len)?)
                }
                ResourceType::XmlEndElement => {
                    XmlNode::EndElement(XmlEndElement::parse(input, body_len)?)
                }
                ResourceType::XmlCdata => XmlNode::CData(XmlCData::parse(input, body_len)?),
                other => {
                    warn!("unknown xml chunk type: {other:?}");
                    let _ = take(body_len).parse_next(input)?;
                    continue;
                }
            };

            nodes.push(node);
        }
    }

    /// Qualified `prefix:name` form of a tag or attribute
    fn qualified_name(events: &Events<'_>, pool: &StringPool, uri: u32, name_idx: u32) -> String {
        let name = pool.get(name_idx);
        let prefix = events.prefix_str(uri, pool);

        if prefix.is_empty() {
            name.to_owned()
        } else {
            format!("{prefix}:{name}")
        }
    }

    /// Textual value of an attribute: the raw pool string when present,
    /// the rendered typed value otherwise
    fn attribute_value(attribute: &XmlAttribute, pool: &StringPool) -> String {
        if attribute.typed_value.data_type == ResourceValue::TYPE_STRING {
            pool.get(attribute.raw_value).to_owned()
        } else {
            attribute.typed_value.format(pool)
        }
    }

    fn build_element_tree(nodes: &[XmlNode], pool: &StringPool) -> Option<Element> {
        let mut events = Events::new(nodes);
        let mut stack: Vec<Element> = Vec::new();

        while let Some(event) = events.next() {
            match event {
                XmlEvent::StartTag(node) => {
                    let name = Self::qualified_name(&events, pool, node.namespace_uri, node.name);
                    if name.is_empty() {
                        continue;
                    }

                    let mut element = Element::new(name);

                    for attribute in &node.attributes {
                        let attr_name = Self::qualified_name(
                            &events,
                            pool,
                            attribute.namespace_uri,
                            attribute.name,
                        );

                        // skip garbage names produced by obfuscators
                        if attr_name.is_empty() || attr_name.contains(char::is_whitespace) {
                            warn!("skipped garbage attribute name: {attr_name:?}");
                            continue;
                        }

                        element.push_attr(attr_name, Self::attribute_value(attribute, pool));
                    }

                    stack.push(element);
                }
                XmlEvent::EndTag(_) => {
                    if stack.len() > 1 {
                        let finished = stack.pop()?;
                        stack.last_mut()?.push_child(finished);
                    }
                }
                XmlEvent::Text(cdata) => {
                    let text = pool.get(cdata.data);
                    if let Some(element) = stack.last_mut() {
                        element.push_text(text);
                    }
                }
                _ => {}
            }
        }

        (!stack.is_empty()).then(|| stack.remove(0))
    }

    /// Render the document back into text.
    ///
    /// One declaration line, four spaces of indentation per depth level, the
    /// whole namespace stack spelled out on the first tag that follows new
    /// namespace bindings.
    pub fn to_xml(&self) -> String {
        let pool = &self.string_pool;
        let mut events = Events::new(&self.nodes);

        let mut out = String::new();
        let mut depth = 0usize;
        let mut pending_namespaces = false;

        while let Some(event) = events.next() {
            match event {
                XmlEvent::StartDoc => {
                    out.push_str("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n");
                }
                XmlEvent::NewNamespace { .. } => pending_namespaces = true,
                XmlEvent::StartTag(node) => {
                    let _ = write!(out, "{:indent$}", "", indent = depth * 4);
                    depth += 1;

                    let prefix = events.prefix_str(node.namespace_uri, pool);
                    let name = pool.get(node.name);
                    if prefix.is_empty() {
                        let _ = write!(out, "<{name} ");
                    } else {
                        let _ = write!(out, "<{prefix}:{name} ");
                    }

                    if pending_namespaces {
                        for &(ns_prefix, ns_uri) in events.namespaces() {
                            let _ = write!(
                                out,
                                "xmlns:{}=\"{}\" ",
                                pool.get(ns_prefix),
                                pool.get(ns_uri)
                            );
                        }
                        pending_namespaces = false;
                    }

                    for attribute in &node.attributes {
                        let attr_prefix = events.prefix_str(attribute.namespace_uri, pool);
                        let attr_name = pool.get(attribute.name);
                        let value = Self::attribute_value(attribute, pool);

                        if attr_prefix.is_empty() {
                            let _ = write!(out, "{attr_name}=\"{value}\" ");
                        } else {
                            let _ = write!(out, "{attr_prefix}:{attr_name}=\"{value}\" ");
                        }
                    }

                    out.push_str(">\n");
                }
                XmlEvent::EndTag(node) => {
                    depth = depth.saturating_sub(1);
                    let _ = write!(out, "{:indent$}", "", indent = depth * 4);

                    let prefix = events.prefix_str(node.namespace_uri, pool);
                    let name = pool.get(node.name);
                    if prefix.is_empty() {
                        let _ = writeln!(out, "</{name}>");
                    } else {
                        let _ = writeln!(out, "</{prefix}:{name}>");
                    }
                }
                XmlEvent::Text(cdata) => {
                    let _ = writeln!(out, "{}", pool.get(cdata.data));
                }
                XmlEvent::EndDoc => {}
            }
        }

        out
    }
}

#[cfg(test)]
pub(crate) mod fixture {
    //! Hand-assembled compiled documents for tests.

    const UTF8_FLAG: u32 = 1 << 8;

    pub struct DocumentBuilder {
        strings: Vec<String>,
        body: Vec<u8>,
    }

    fn push_u16(buf: &mut Vec<u8>, value: u16) {
        buf.extend_from_slice(&value.to_le_bytes());
    }

    fn push_u32(buf: &mut Vec<u8>, value: u32) {
        buf.extend_from_slice(&value.to_le_bytes());
    }

    fn element_header(buf: &mut Vec<u8>, chunk_type: u16, size: u32) {
        push_u16(buf, chunk_type);
        push_u16(buf, 0x10);
        push_u32(buf, size);
        push_u32(buf, 1); // line number
        push_u32(buf, u32::MAX); // comment
    }

    impl DocumentBuilder {
        pub fn new() -> DocumentBuilder {
            DocumentBuilder {
                strings: Vec::new(),
                body: Vec::new(),
            }
        }

        /// Intern a string, returning its pool index
        pub fn string(&mut self, value: &str) -> u32 {
            if let Some(idx) = self.strings.iter().position(|s| s == value) {
                return idx as u32;
            }
            self.strings.push(value.to_owned());
            (self.strings.len() - 1) as u32
        }

        pub fn start_namespace(&mut self, prefix: &str, uri: &str) -> &mut Self {
            let prefix = self.string(prefix);
            let uri = self.string(uri);
            element_header(&mut self.body, 0x0100, 24);
            push_u32(&mut self.body, prefix);
            push_u32(&mut self.body, uri);
            self
        }

        pub fn end_namespace(&mut self, prefix: &str, uri: &str) -> &mut Self {
            let prefix = self.string(prefix);
            let uri = self.string(uri);
            element_header(&mut self.body, 0x0101, 24);
            push_u32(&mut self.body, prefix);
            push_u32(&mut self.body, uri);
            self
        }

        /// `attrs`: `(uri index or NONE, name, value type, data, raw string index)`
        pub fn start_element(&mut self, uri: Option<&str>, name: &str, attrs: &[Attr]) -> &mut Self {
            let uri = match uri {
                Some(uri) => self.string(uri),
                None => u32::MAX,
            };
            let name = self.string(name);

            let resolved: Vec<(u32, u32, u32, u8, u32)> = attrs
                .iter()
                .map(|attr| {
                    let attr_uri = match attr.uri {
                        Some(uri) => self.string(uri),
                        None => u32::MAX,
                    };
                    let attr_name = self.string(attr.name);
                    let raw = match attr.raw {
                        Some(raw) => self.string(raw),
                        None => u32::MAX,
                    };
                    (attr_uri, attr_name, raw, attr.data_type, attr.data)
                })
                .collect();

            let size = 36 + 20 * attrs.len() as u32;
            element_header(&mut self.body, 0x0102, size);
            push_u32(&mut self.body, uri);
            push_u32(&mut self.body, name);
            push_u16(&mut self.body, 0x14); // attribute start
            push_u16(&mut self.body, 0x14); // attribute size
            push_u16(&mut self.body, attrs.len() as u16);
            push_u16(&mut self.body, 0); // id index
            push_u16(&mut self.body, 0); // class index
            push_u16(&mut self.body, 0); // style index

            for (attr_uri, attr_name, raw, data_type, data) in resolved {
                push_u32(&mut self.body, attr_uri);
                push_u32(&mut self.body, attr_name);
                push_u32(&mut self.body, raw);
                push_u16(&mut self.body, 8); // value size
                self.body.push(0); // res0
                self.body.push(data_type);
                push_u32(&mut self.body, data);
            }

            self
        }

        pub fn end_element(&mut self, uri: Option<&str>, name: &str) -> &mut Self {
            let uri = match uri {
                Some(uri) => self.string(uri),
                None => u32::MAX,
            };
            let name = self.string(name);
            element_header(&mut self.body, 0x0103, 24);
            push_u32(&mut self.body, uri);
            push_u32(&mut self.body, name);
            self
        }

        pub fn build(&self) -> Vec<u8> {
            // string chunk: header + offsets + utf-8 raw data
            let mut raw = Vec::new();
            let mut offsets = Vec::new();
            for string in &self.strings {
                offsets.push(raw.len() as u32);
                raw.push(string.chars().count() as u8);
                raw.push(string.len() as u8);
                raw.extend_from_slice(string.as_bytes());
                raw.push(0);
            }
            while raw.len() % 4 != 0 {
                raw.push(0);
            }

            let strings_start = 28 + 4 * self.strings.len() as u32;
            let pool_size = strings_start + raw.len() as u32;

            let mut pool = Vec::new();
            push_u16(&mut pool, 0x0001);
            push_u16(&mut pool, 0x001C);
            push_u32(&mut pool, pool_size);
            push_u32(&mut pool, self.strings.len() as u32);
            push_u32(&mut pool, 0); // style count
            push_u32(&mut pool, UTF8_FLAG);
            push_u32(&mut pool, strings_start);
            push_u32(&mut pool, 0); // styles start
            for offset in &offsets {
                push_u32(&mut pool, *offset);
            }
            pool.extend_from_slice(&raw);

            // empty resource map
            let mut resource_map = Vec::new();
            push_u16(&mut resource_map, 0x0180);
            push_u16(&mut resource_map, 0x0008);
            push_u32(&mut resource_map, 8);

            let total = 8 + pool.len() + resource_map.len() + self.body.len();

            let mut out = Vec::new();
            push_u16(&mut out, 0x0003);
            push_u16(&mut out, 0x0008);
            push_u32(&mut out, total as u32);
            out.extend_from_slice(&pool);
            out.extend_from_slice(&resource_map);
            out.extend_from_slice(&self.body);
            out
        }
    }

    pub struct Attr {
        pub uri: Option<&'static str>,
        pub name: &'static str,
        pub raw: Option<&'static str>,
        pub data_type: u8,
        pub data: u32,
    }

    impl Attr {
        pub fn string(uri: Option<&'static str>, name: &'static str, value: &'static str) -> Attr {
            Attr {
                uri,
                name,
                raw: Some(value),
                data_type: 0x03,
                data: 0,
            }
        }

        pub fn boolean(uri: Option<&'static str>, name: &'static str, value: bool) -> Attr {
            Attr {
                uri,
                name,
                raw: None,
                data_type: 0x12,
                data: if value { u32::MAX } else { 0 },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixture::{Attr, DocumentBuilder};
    use super::*;

    const ANDROID_NS: &str = "http://schemas.android.com/apk/res/android";

    #[test]
    fn namespaced_document_round_trips() {
        let mut builder = DocumentBuilder::new();
        builder
            .start_namespace("a", "u")
            .start_element(Some("u"), "root", &[])
            .start_element(None, "b", &[])
            .end_element(None, "b")
            .end_element(Some("u"), "root")
            .end_namespace("a", "u");

        let document = Axml::parse(&builder.build()).unwrap();
        assert!(!document.is_tampered);

        let xml = document.to_xml();
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
             <a:root xmlns:a=\"u\" >\n\
             \x20   <b >\n\
             \x20   </b>\n\
             </a:root>\n"
        );

        assert_eq!(document.root.name(), "a:root");
        let children: Vec<_> = document.root.children().collect();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name(), "b");
    }

    #[test]
    fn manifest_attributes_resolve_through_the_pool() {
        let mut builder = DocumentBuilder::new();
        builder
            .start_namespace("android", ANDROID_NS)
            .start_element(
                None,
                "manifest",
                &[Attr::string(None, "package", "com.example.app")],
            )
            .start_element(
                None,
                "application",
                &[Attr::boolean(Some(ANDROID_NS), "debuggable", true)],
            )
            .end_element(None, "application")
            .end_element(None, "manifest")
            .end_namespace("android", ANDROID_NS);

        let document = Axml::parse(&builder.build()).unwrap();

        assert_eq!(document.root.name(), "manifest");
        assert_eq!(document.root.attr("package"), Some("com.example.app"));

        let application = document.root.find("application").unwrap();
        assert_eq!(application.attr("android:debuggable"), Some("true"));

        let xml = document.to_xml();
        assert!(xml.contains("android:debuggable=\"true\""));
        assert!(xml.contains(&format!("xmlns:android=\"{ANDROID_NS}\"")));
    }

    #[test]
    fn truncated_document_is_rejected() {
        assert!(matches!(
            Axml::parse(&[0x03, 0x00]),
            Err(AxmlError::TooSmallError)
        ));
    }

    #[test]
    fn bad_header_size_is_rejected() {
        let mut builder = DocumentBuilder::new();
        builder
            .start_element(None, "manifest", &[])
            .end_element(None, "manifest");
        let mut data = builder.build();
        data[2] = 0x0c;

        assert!(matches!(
            Axml::parse(&data),
            Err(AxmlError::HeaderSizeError(0x0c))
        ));
    }
}
