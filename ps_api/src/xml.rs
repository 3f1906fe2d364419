// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::{Namespace, ResolveResult};

use crate::error::{EncodeError, ParseError};

/// Content of an XML element.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// Minimal namespace-aware XML element tree, used as the wire fragment of
/// the XML codecs and as the XML response document.
///
/// Element names are local names qualified by `namespace`; when written,
/// namespaces are declared as default namespaces wherever they change.
/// Attribute names are written verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    pub name: String,
    pub namespace: Option<String>,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: &str, namespace: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.map(|ns| ns.to_string()),
            attributes: vec![],
            children: vec![],
        }
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Set an attribute, replacing any previous value.
    pub fn set_attribute(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attributes.push((name.to_string(), value.to_string())),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    pub fn add_child(&mut self, node: XmlNode) {
        self.children.push(node);
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.children.push(XmlNode::Text(text.to_string()));
        self
    }

    /// Child elements, in document order.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|c| match c {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    pub fn children_named<'a>(&'a self, name: &'a str, namespace: Option<&'a str>) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.elements().filter(move |e| e.name == name && e.namespace.as_deref() == namespace)
    }

    pub fn child(&self, name: &str, namespace: Option<&str>) -> Option<&XmlElement> {
        self.elements().find(|e| e.name == name && e.namespace.as_deref() == namespace)
    }

    /// Concatenation of the direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|c| match c {
                XmlNode::Text(t) => Some(t.as_str()),
                XmlNode::Element(_) => None,
            })
            .collect()
    }

    /// Serialize without XML declaration.
    pub fn to_xml_string(&self) -> Result<String, EncodeError> {
        let mut writer = quick_xml::Writer::new(Vec::new());
        write_element(&mut writer, self, None)?;
        String::from_utf8(writer.into_inner()).map_err(|e| EncodeError::Xml(e.to_string()))
    }

    /// Serialize as a standalone UTF-8 document.
    pub fn to_document(&self) -> Result<Vec<u8>, EncodeError> {
        let mut writer = quick_xml::Writer::new(Vec::new());
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(|e| EncodeError::Xml(e.to_string()))?;
        write_element(&mut writer, self, None)?;
        Ok(writer.into_inner())
    }

    /// Parse a document and return its root element.
    ///
    /// Text content is kept as it is, except whitespace-only text between
    /// child elements, which is dropped.
    pub fn parse(xml: &str) -> Result<XmlElement, ParseError> {
        let mut reader = quick_xml::NsReader::from_str(xml);
        let mut stack: Vec<XmlElement> = vec![];

        loop {
            let (ns, event) = reader.read_resolved_event().map_err(|e| ParseError::Malformed(e.to_string()))?;
            match event {
                Event::Start(ref e) => {
                    let element = element_from_start(&ns, e)?;
                    stack.push(element);
                }
                Event::Empty(ref e) => {
                    let element = element_from_start(&ns, e)?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(XmlNode::Element(element)),
                        None => return Ok(element),
                    }
                }
                Event::End(_) => {
                    let mut element = stack.pop().ok_or_else(|| ParseError::Malformed("unbalanced end tag".to_string()))?;
                    drop_indentation(&mut element);
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(XmlNode::Element(element)),
                        None => return Ok(element),
                    }
                }
                Event::Text(ref t) => {
                    let text = t.unescape().map_err(|e| ParseError::Malformed(e.to_string()))?.into_owned();
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(XmlNode::Text(text)),
                        None if text.trim().is_empty() => {}
                        None => return Err(ParseError::Malformed(format!("text '{}' outside of the root element", text))),
                    }
                }
                Event::CData(c) => {
                    let text = String::from_utf8(c.into_inner().into_owned()).map_err(|e| ParseError::Malformed(e.to_string()))?;
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(XmlNode::Text(text));
                    }
                }
                Event::Eof => return Err(ParseError::Malformed("unexpected end of document".to_string())),
                _ => {}
            }
        }
    }
}

fn drop_indentation(element: &mut XmlElement) {
    if element.elements().next().is_some() {
        element.children.retain(|c| !matches!(c, XmlNode::Text(t) if t.trim().is_empty()));
    }
}

fn element_from_start(ns: &ResolveResult, start: &BytesStart) -> Result<XmlElement, ParseError> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let namespace = match ns {
        ResolveResult::Bound(Namespace(n)) => Some(String::from_utf8_lossy(n).into_owned()),
        ResolveResult::Unbound => None,
        ResolveResult::Unknown(prefix) => {
            return Err(ParseError::Malformed(format!("undeclared prefix '{}'", String::from_utf8_lossy(prefix))));
        }
    };

    let mut element = XmlElement::new(&name, namespace.as_deref());
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| ParseError::Malformed(e.to_string()))?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        if key == "xmlns" || key.starts_with("xmlns:") {
            continue;
        }
        let value = attribute.unescape_value().map_err(|e| ParseError::Malformed(e.to_string()))?;
        element.attributes.push((key, value.into_owned()));
    }
    Ok(element)
}

fn write_element(writer: &mut quick_xml::Writer<Vec<u8>>, element: &XmlElement, default_namespace: Option<&str>) -> Result<(), EncodeError> {
    let mut start = BytesStart::new(element.name.as_str());
    if element.namespace.as_deref() != default_namespace {
        start.push_attribute(("xmlns", element.namespace.as_deref().unwrap_or("")));
    }
    for (name, value) in &element.attributes {
        start.push_attribute((name.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        return writer.write_event(Event::Empty(start)).map_err(|e| EncodeError::Xml(e.to_string()));
    }

    writer.write_event(Event::Start(start)).map_err(|e| EncodeError::Xml(e.to_string()))?;
    for child in &element.children {
        match child {
            XmlNode::Element(e) => write_element(writer, e, element.namespace.as_deref())?,
            XmlNode::Text(t) => writer
                .write_event(Event::Text(BytesText::new(t)))
                .map_err(|e| EncodeError::Xml(e.to_string()))?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(|e| EncodeError::Xml(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = "http://example.org/ns";

    #[test]
    fn test_write_namespaces() {
        let mut root = XmlElement::new("Root", Some(NS)).with_attribute("version", "1");
        root.add_child(XmlNode::Element(XmlElement::new("Inner", Some(NS)).with_text("a < b")));
        root.add_child(XmlNode::Element(XmlElement::new("Other", Some("urn:other"))));
        root.add_child(XmlNode::Element(XmlElement::new("Plain", None)));

        assert_eq!(
            r#"<Root xmlns="http://example.org/ns" version="1"><Inner>a &lt; b</Inner><Other xmlns="urn:other"/><Plain xmlns=""/></Root>"#,
            root.to_xml_string().unwrap()
        );

        let document = String::from_utf8(root.to_document().unwrap()).unwrap();
        assert!(document.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
    }

    #[test]
    fn test_parse() {
        let xml = r#"<?xml version="1.0"?>
            <p:Root xmlns:p="http://example.org/ns" xmlns:q="urn:other" q:kind="x" id="7">
                <p:Value>101.05</p:Value>
                <q:Other/>
                <Plain>text &amp; more</Plain>
            </p:Root>"#;
        let root = XmlElement::parse(xml).unwrap();
        assert_eq!("Root", root.name);
        assert_eq!(Some(NS), root.namespace.as_deref());
        assert_eq!(Some("x"), root.attribute("q:kind"));
        assert_eq!(Some("7"), root.attribute("id"));
        assert_eq!(None, root.attribute("xmlns:p"));
        assert_eq!(3, root.elements().count());
        assert_eq!("101.05", root.child("Value", Some(NS)).unwrap().text());
        assert!(root.child("Other", Some("urn:other")).is_some());
        assert!(root.child("Other", Some(NS)).is_none());
        assert_eq!("text & more", root.child("Plain", None).unwrap().text());
    }

    #[test]
    fn test_write_parse_same_tree() {
        let mut root = XmlElement::new("Root", Some(NS));
        let mut inner = XmlElement::new("Inner", Some("urn:other")).with_attribute("href", "http://x/y?a=1&b=2");
        inner.add_child(XmlNode::Element(XmlElement::new("Leaf", Some("urn:other")).with_text("1 2 3")));
        root.add_child(XmlNode::Element(inner));

        let parsed = XmlElement::parse(&root.to_xml_string().unwrap()).unwrap();
        assert_eq!(root, parsed);
    }

    #[test]
    fn test_parse_keeps_text() {
        let root = XmlElement::parse("<a>  padded  </a>").unwrap();
        assert_eq!("  padded  ", root.text());
        assert_eq!(" ", XmlElement::parse("<a> </a>").unwrap().text());
        assert_eq!("line\n", XmlElement::parse("<a>line\n</a>").unwrap().text());

        let root = XmlElement::parse("<?xml version=\"1.0\"?>\n<a>\n  <b> x </b>\n  <c/>\n</a>\n").unwrap();
        assert_eq!(2, root.children.len());
        assert_eq!(" x ", root.child("b", None).unwrap().text());
    }

    #[test]
    fn test_child_with_owned_name() {
        let root = XmlElement::parse("<a><b>1</b></a>").unwrap();
        let found = {
            let name = String::from("b");
            root.child(&name, None)
        };
        assert_eq!("1", found.unwrap().text());
    }

    #[test]
    fn test_parse_errors() {
        assert!(XmlElement::parse("").is_err());
        assert!(XmlElement::parse("<a><b></a>").is_err());
        assert!(XmlElement::parse("<x:a/>").is_err());
    }

    #[test]
    fn test_set_attribute_replaces() {
        let mut e = XmlElement::new("E", None);
        e.set_attribute("a", "1");
        e.set_attribute("a", "2");
        assert_eq!(vec![("a".to_string(), "2".to_string())], e.attributes);
    }
}
