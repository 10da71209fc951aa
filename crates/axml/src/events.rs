use crate::structs::{StringPool, XmlCData, XmlEndElement, XmlNode, XmlStartElement};

/// A decoding event of the compiled document.
///
/// Namespace openings surface as explicit [`XmlEvent::NewNamespace`] events;
/// namespace ends are consumed internally and only adjust the stack.
#[derive(Debug)]
pub(crate) enum XmlEvent<'doc> {
    StartDoc,
    NewNamespace { prefix: u32, uri: u32 },
    StartTag(&'doc XmlStartElement),
    EndTag(&'doc XmlEndElement),
    Text(&'doc XmlCData),
    EndDoc,
}

/// Iterator over the parsed element chunks, maintaining the namespace stack.
///
/// Yielded events borrow the document, not the iterator, so the stack
/// accessors stay usable while an event is alive.
pub(crate) struct Events<'doc> {
    nodes: &'doc [XmlNode],
    pos: usize,
    started: bool,
    finished: bool,

    /// `(prefix, uri)` string indices, innermost namespace last
    namespaces: Vec<(u32, u32)>,
}

impl<'doc> Events<'doc> {
    pub(crate) fn new(nodes: &'doc [XmlNode]) -> Events<'doc> {
        Events {
            nodes,
            pos: 0,
            started: false,
            finished: false,
            namespaces: Vec::new(),
        }
    }

    /// Currently open namespaces, outermost first
    pub(crate) fn namespaces(&self) -> &[(u32, u32)] {
        &self.namespaces
    }

    /// Translate a namespace URI string index back to its prefix index
    pub(crate) fn prefix_for_uri(&self, uri: u32) -> Option<u32> {
        self.namespaces
            .iter()
            .find(|(_, ns_uri)| *ns_uri == uri)
            .map(|(prefix, _)| *prefix)
    }

    /// Resolve the prefix of `uri` to a pool string, `""` when unbound
    pub(crate) fn prefix_str(&self, uri: u32, pool: &'doc StringPool) -> &'doc str {
        match self.prefix_for_uri(uri) {
            Some(prefix) => pool.get(prefix),
            None => "",
        }
    }
}

impl<'doc> Iterator for Events<'doc> {
    type Item = XmlEvent<'doc>;

    fn next(&mut self) -> Option<XmlEvent<'doc>> {
        if !self.started {
            self.started = true;
            return Some(XmlEvent::StartDoc);
        }

        loop {
            let Some(node) = self.nodes.get(self.pos) else {
                if self.finished {
                    return None;
                }
                self.finished = true;
                return Some(XmlEvent::EndDoc);
            };
            self.pos += 1;

            match node {
                XmlNode::StartNamespace(ns) => {
                    self.namespaces.push((ns.prefix, ns.uri));
                    return Some(XmlEvent::NewNamespace {
                        prefix: ns.prefix,
                        uri: ns.uri,
                    });
                }
                XmlNode::EndNamespace(_) => {
                    self.namespaces.pop();
                }
                XmlNode::StartElement(el) => return Some(XmlEvent::StartTag(el)),
                XmlNode::EndElement(el) => return Some(XmlEvent::EndTag(el)),
                XmlNode::CData(cdata) => return Some(XmlEvent::Text(cdata)),
            }
        }
    }
}
