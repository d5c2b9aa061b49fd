//! Minimal mutable XML tree over `quick-xml` events.
//!
//! Only elements and text are modelled; declarations, comments, processing
//! instructions and CDATA are carried through untouched.

use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use super::DocumentError;

#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
    Other(Event<'static>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    start: BytesStart<'static>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: &str) -> Self {
        Self {
            start: BytesStart::new(name.to_string()),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, key: &str, value: &str) -> Self {
        self.start.push_attribute((key, value));
        self
    }

    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(XmlNode::Element(child));
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.children.push(XmlNode::Text(text.to_string()));
        self
    }

    pub fn name(&self) -> String {
        String::from_utf8_lossy(self.start.name().as_ref()).into_owned()
    }

    pub fn is(&self, name: &str) -> bool {
        self.start.name().as_ref() == name.as_bytes()
    }

    pub fn attr(&self, key: &str) -> Option<String> {
        self.start
            .attributes()
            .flatten()
            .find(|attr| attr.key.as_ref() == key.as_bytes())
            .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
    }

    /// Set an attribute, replacing any existing value.
    pub fn set_attr(&mut self, key: &str, value: &str) {
        let kept: Vec<(Vec<u8>, Vec<u8>)> = self
            .start
            .attributes()
            .flatten()
            .filter(|attr| attr.key.as_ref() != key.as_bytes())
            .map(|attr| (attr.key.as_ref().to_vec(), attr.value.into_owned()))
            .collect();

        self.start.clear_attributes();
        for (k, v) in &kept {
            self.start
                .push_attribute((k.as_slice(), v.as_slice()));
        }
        self.start.push_attribute((key, value));
    }

    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            _ => None,
        })
    }

    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|el| el.is(name))
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut XmlElement> {
        self.elements_mut().find(|el| el.is(name))
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.elements().filter(move |el| el.is(name))
    }

    pub fn children_named_mut<'a>(
        &'a mut self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a mut XmlElement> {
        self.elements_mut().filter(move |el| el.is(name))
    }

    /// First descendant with the given name, depth first.
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        for el in self.elements() {
            if el.is(name) {
                return Some(el);
            }
            if let Some(found) = el.find(name) {
                return Some(found);
            }
        }
        None
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut XmlElement> {
        for el in self.elements_mut() {
            if el.is(name) {
                return Some(el);
            }
            if let Some(found) = el.find_mut(name) {
                return Some(found);
            }
        }
        None
    }

    /// Call `f` on every descendant named `name`. Matches are not descended into.
    pub fn visit_mut<F>(&mut self, name: &str, f: &mut F)
    where
        F: FnMut(&mut XmlElement),
    {
        for el in self.elements_mut() {
            if el.is(name) {
                f(el);
            } else {
                el.visit_mut(name, f);
            }
        }
    }

    /// Remove every direct child element named `name`.
    pub fn remove_children(&mut self, name: &str) {
        self.children
            .retain(|node| !matches!(node, XmlNode::Element(el) if el.is(name)));
    }

    /// Concatenated text of the direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                XmlNode::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn set_text(&mut self, text: &str) {
        self.children.retain(|node| !matches!(node, XmlNode::Text(_)));
        if !text.is_empty() {
            self.children.push(XmlNode::Text(text.to_string()));
        }
    }

    fn write<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<(), DocumentError> {
        if self.children.is_empty() {
            writer.write_event(Event::Empty(self.start.borrow()))?;
            return Ok(());
        }

        writer.write_event(Event::Start(self.start.borrow()))?;
        for child in &self.children {
            child.write(writer)?;
        }
        writer.write_event(Event::End(self.start.to_end()))?;
        Ok(())
    }
}

impl XmlNode {
    fn write<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<(), DocumentError> {
        match self {
            XmlNode::Element(el) => el.write(writer)?,
            XmlNode::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
            XmlNode::Other(event) => writer.write_event(event)?,
        }
        Ok(())
    }
}

/// A parsed XML part: prolog nodes plus a single root element.
#[derive(Debug, Clone)]
pub struct XmlDocument {
    nodes: Vec<XmlNode>,
}

impl XmlDocument {
    pub fn parse(xml: &str) -> Result<Self, DocumentError> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut nodes: Vec<XmlNode> = Vec::new();

        fn attach(stack: &mut [XmlElement], nodes: &mut Vec<XmlNode>, node: XmlNode) {
            match stack.last_mut() {
                Some(parent) => parent.children.push(node),
                None => nodes.push(node),
            }
        }

        loop {
            match reader.read_event()? {
                Event::Start(start) => stack.push(XmlElement {
                    start: start.into_owned(),
                    children: Vec::new(),
                }),
                Event::Empty(start) => {
                    let el = XmlElement {
                        start: start.into_owned(),
                        children: Vec::new(),
                    };
                    attach(&mut stack, &mut nodes, XmlNode::Element(el));
                }
                Event::End(_) => {
                    let el = stack.pop().ok_or_else(|| {
                        DocumentError::MalformedXml("unexpected closing tag".to_string())
                    })?;
                    attach(&mut stack, &mut nodes, XmlNode::Element(el));
                }
                Event::Text(text) => {
                    let text = text.unescape()?.into_owned();
                    attach(&mut stack, &mut nodes, XmlNode::Text(text));
                }
                Event::Eof => break,
                other => attach(&mut stack, &mut nodes, XmlNode::Other(other.into_owned())),
            }
        }

        if let Some(open) = stack.last() {
            return Err(DocumentError::MalformedXml(format!(
                "element <{}> is never closed",
                open.name()
            )));
        }

        Ok(Self { nodes })
    }

    pub fn root(&self) -> Option<&XmlElement> {
        self.nodes.iter().find_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            _ => None,
        })
    }

    pub fn root_mut(&mut self) -> Option<&mut XmlElement> {
        self.nodes.iter_mut().find_map(|node| match node {
            XmlNode::Element(el) => Some(el),
            _ => None,
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, DocumentError> {
        let mut writer = Writer::new(Vec::new());
        for node in &self.nodes {
            node.write(&mut writer)?;
        }
        Ok(writer.into_inner())
    }
}
