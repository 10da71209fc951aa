//! A small owned element tree for querying decoded manifests.

/// One element of the decoded document: qualified name, qualified
/// attributes and child elements in document order.
#[derive(Debug, Default)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    pub(crate) fn new(name: String) -> Element {
        Element {
            name,
            ..Element::default()
        }
    }

    pub(crate) fn push_attr(&mut self, name: String, value: String) {
        self.attributes.push((name, value));
    }

    pub(crate) fn push_child(&mut self, child: Element) {
        self.children.push(child);
    }

    pub(crate) fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    /// Qualified tag name, e.g. `manifest` or `android:name`-style prefixes
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value of the attribute with the given qualified name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(attr_name, _)| attr_name == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn children(&self) -> impl Iterator<Item = &Element> {
        self.children.iter()
    }

    /// Accumulated character data of this element
    pub fn text(&self) -> &str {
        &self.text
    }

    /// This element and everything below it
    pub fn descendants(&self) -> impl Iterator<Item = &Element> {
        let mut stack = vec![self];

        std::iter::from_fn(move || {
            let element = stack.pop()?;
            for child in element.children() {
                stack.push(child);
            }
            Some(element)
        })
    }

    /// First descendant with the given tag name
    pub fn find(&self, tag: &str) -> Option<&Element> {
        self.descendants().find(|el| el.name() == tag)
    }
}
