mod common;
mod string_pool;
mod xml_elements;

pub(crate) use common::{ResChunkHeader, ResourceType, ResourceValue};
pub(crate) use string_pool::StringPool;
pub(crate) use xml_elements::{
    XmlAttribute, XmlCData, XmlEndElement, XmlNamespace, XmlNode, XmlStartElement,
    skip_resource_map,
};
