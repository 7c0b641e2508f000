//! In-memory tree for ALTO documents.
//!
//! Parsing keeps everything needed to write the document back: element
//! names with their prefixes, attribute order, comments, CDATA, processing
//! instructions and the doctype. Whitespace-only text is dropped, since the
//! writer re-indents the whole document anyway.

use std::collections::HashMap;

use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::Event;
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;
use thiserror::Error;

use crate::models::NodePath;

/// Namespace URI of ALTO version 2.
pub const ALTO_NS_V2: &str = "http://www.loc.gov/standards/alto/ns-v2#";

/// Why a byte stream could not be turned into an [`AltoDocument`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} (at byte {position})")]
pub struct ParseError {
    pub message: String,
    pub position: u64,
}

impl ParseError {
    fn new(message: impl Into<String>, position: u64) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

/// A node of the document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Character data, kept in its escaped form.
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
    DocType(String),
}

/// An element with its resolved namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Qualified name as written, e.g. `alto:NamedEntityTag`.
    pub name: String,
    /// Namespace URI the name resolved to, if any.
    pub namespace: Option<String>,
    /// Attributes in document order, values unescaped.
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    /// Create an element with no namespace, attributes or children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Name without its prefix.
    pub fn local_name(&self) -> &str {
        self.name
            .split_once(':')
            .map(|(_, local)| local)
            .unwrap_or(&self.name)
    }

    /// Whether this element is `{namespace}local`.
    pub fn is(&self, namespace: &str, local: &str) -> bool {
        self.namespace.as_deref() == Some(namespace) && self.local_name() == local
    }

    /// Value of an attribute by qualified name.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing its value in place or appending it.
    pub fn set_attr(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((key.to_string(), value)),
        }
    }

    /// Child elements, skipping text and other node kinds.
    pub fn child_elements(&self) -> impl Iterator<Item = (usize, &Element)> {
        self.children
            .iter()
            .enumerate()
            .filter_map(|(i, node)| match node {
                Node::Element(el) => Some((i, el)),
                _ => None,
            })
    }
}

/// A parsed ALTO document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AltoDocument {
    /// `standalone` value of the XML declaration, if one was given.
    pub standalone: Option<String>,
    /// Comments, processing instructions and doctype before the root.
    pub prolog: Vec<Node>,
    pub root: Element,
    /// Comments and processing instructions after the root.
    pub epilog: Vec<Node>,
}

impl AltoDocument {
    /// Parse a UTF-8 XML document.
    pub fn parse(bytes: &[u8]) -> Result<Self, ParseError> {
        let mut reader = NsReader::from_reader(bytes);
        reader.config_mut().trim_text(true);
        let mut buf = Vec::new();

        let mut standalone = None;
        let mut prolog = Vec::new();
        let mut epilog = Vec::new();
        let mut root: Option<Element> = None;
        let mut stack: Vec<Element> = Vec::new();
        let mut entities: HashMap<String, String> = HashMap::new();

        loop {
            let offset = reader.buffer_position() as u64;
            let (resolved, event) = match reader.read_resolved_event_into(&mut buf) {
                Ok(pair) => pair,
                Err(e) => return Err(ParseError::new(e.to_string(), offset)),
            };

            let namespace = match resolved {
                ResolveResult::Bound(ns) => Some(utf8(ns.as_ref(), offset)?),
                ResolveResult::Unbound => None,
                ResolveResult::Unknown(prefix) => {
                    return Err(ParseError::new(
                        format!(
                            "undeclared namespace prefix '{}'",
                            String::from_utf8_lossy(&prefix)
                        ),
                        offset,
                    ))
                }
            };

            match event {
                Event::Start(e) => {
                    stack.push(element_from(&e, namespace, &entities, offset)?);
                }
                Event::Empty(e) => {
                    let element = element_from(&e, namespace, &entities, offset)?;
                    attach_element(element, &mut stack, &mut root, offset)?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| ParseError::new("unexpected end tag", offset))?;
                    attach_element(element, &mut stack, &mut root, offset)?;
                }
                Event::Text(e) => {
                    let text = utf8(&e, offset)?;
                    if !text.trim().is_empty() {
                        match stack.last_mut() {
                            Some(parent) => parent.children.push(Node::Text(text)),
                            None => {
                                return Err(ParseError::new(
                                    "text outside the root element",
                                    offset,
                                ))
                            }
                        }
                    }
                }
                Event::CData(e) => {
                    let text = utf8(&e, offset)?;
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(Node::CData(text)),
                        None => {
                            return Err(ParseError::new("CDATA outside the root element", offset))
                        }
                    }
                }
                Event::Comment(e) => {
                    let node = Node::Comment(utf8(&e, offset)?);
                    attach_misc(node, &mut stack, &root, &mut prolog, &mut epilog);
                }
                Event::PI(e) => {
                    let node = Node::ProcessingInstruction(utf8(&e, offset)?);
                    attach_misc(node, &mut stack, &root, &mut prolog, &mut epilog);
                }
                Event::DocType(e) => {
                    if root.is_some() || !stack.is_empty() {
                        return Err(ParseError::new("doctype after the root element", offset));
                    }
                    let doctype = utf8(&e, offset)?.trim().to_string();
                    entities = declared_entities(&doctype);
                    prolog.push(Node::DocType(doctype));
                }
                Event::Decl(e) => {
                    if let Some(value) = e.standalone() {
                        let value = value.map_err(|err| ParseError::new(err.to_string(), offset))?;
                        standalone = Some(utf8(&value, offset)?);
                    }
                }
                Event::Eof => break,
            }
            buf.clear();
        }

        if let Some(open) = stack.last() {
            return Err(ParseError::new(
                format!("unclosed element <{}>", open.name),
                reader.buffer_position() as u64,
            ));
        }

        let root = root.ok_or_else(|| ParseError::new("no root element", 0))?;

        Ok(Self {
            standalone,
            prolog,
            root,
            epilog,
        })
    }

    /// Element at a child-index path; the empty path is the root.
    pub fn element_at(&self, path: &[usize]) -> Option<&Element> {
        let mut current = &self.root;
        for &index in path {
            current = match current.children.get(index)? {
                Node::Element(el) => el,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Mutable element at a child-index path.
    pub fn element_at_mut(&mut self, path: &[usize]) -> Option<&mut Element> {
        let mut current = &mut self.root;
        for &index in path {
            current = match current.children.get_mut(index)? {
                Node::Element(el) => el,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Visit every element in document order with its path.
    pub fn visit<F>(&self, mut f: F)
    where
        F: FnMut(&NodePath, &Element),
    {
        fn walk<F: FnMut(&NodePath, &Element)>(el: &Element, path: &mut NodePath, f: &mut F) {
            f(&*path, el);
            for (index, child) in el.child_elements() {
                path.push(index);
                walk(child, path, f);
                path.pop();
            }
        }

        let mut path = Vec::new();
        walk(&self.root, &mut path, &mut f);
    }
}

fn utf8(bytes: &[u8], offset: u64) -> Result<String, ParseError> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| ParseError::new(format!("invalid UTF-8: {}", e), offset))
}

fn element_from(
    start: &quick_xml::events::BytesStart<'_>,
    namespace: Option<String>,
    entities: &HashMap<String, String>,
    offset: u64,
) -> Result<Element, ParseError> {
    let name = utf8(start.name().as_ref(), offset)?;
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| ParseError::new(e.to_string(), offset))?;
        let key = utf8(attr.key.as_ref(), offset)?;
        let value = attr
            .unescape_value_with(|name| {
                entities
                    .get(name)
                    .map(String::as_str)
                    .or_else(|| resolve_predefined_entity(name))
            })
            .map_err(|e| ParseError::new(format!("attribute {}: {}", key, e), offset))?;
        attributes.push((key, value.into_owned()));
    }
    Ok(Element {
        name,
        namespace,
        attributes,
        children: Vec::new(),
    })
}

/// General entities with a literal value declared in a doctype's internal
/// subset. Parameter and external entities are ignored.
fn declared_entities(doctype: &str) -> HashMap<String, String> {
    let mut entities = HashMap::new();
    let mut rest = doctype;

    while let Some(start) = rest.find("<!ENTITY") {
        rest = rest[start + "<!ENTITY".len()..].trim_start();
        if rest.starts_with('%') {
            continue;
        }

        let name_end = rest
            .find(|c: char| c.is_whitespace())
            .unwrap_or(rest.len());
        let name = &rest[..name_end];
        rest = rest[name_end..].trim_start();

        let Some(quote) = rest.chars().next().filter(|c| *c == '"' || *c == '\'') else {
            continue;
        };
        let Some(value_end) = rest[1..].find(quote) else {
            break;
        };
        // first declaration wins
        entities
            .entry(name.to_string())
            .or_insert_with(|| rest[1..1 + value_end].to_string());
        rest = &rest[1 + value_end + 1..];
    }

    entities
}

fn attach_element(
    element: Element,
    stack: &mut [Element],
    root: &mut Option<Element>,
    offset: u64,
) -> Result<(), ParseError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(Node::Element(element));
        return Ok(());
    }
    if root.is_some() {
        return Err(ParseError::new(
            format!("second root element <{}>", element.name),
            offset,
        ));
    }
    *root = Some(element);
    Ok(())
}

fn attach_misc(
    node: Node,
    stack: &mut [Element],
    root: &Option<Element>,
    prolog: &mut Vec<Node>,
    epilog: &mut Vec<Node>,
) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None if root.is_none() => prolog.push(node),
        None => epilog.push(node),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!-- produced by OCR -->
<alto xmlns="http://www.loc.gov/standards/alto/ns-v2#">
  <Tags>
    <NamedEntityTag ID="Tag1" TYPE="LOCATION" LABEL="Berlin"/>
    <NamedEntityTag ID="Tag2" TYPE="PERSON" LABEL="Goethe"/>
  </Tags>
  <Layout>
    <Page ID="P1"><PrintSpace><TextBlock><TextLine>
      <String CONTENT="Berlin &amp; Umgebung" TAGREFS="Tag1"/>
    </TextLine></TextBlock></PrintSpace></Page>
  </Layout>
</alto>
"#;

    #[test]
    fn test_parse_resolves_default_namespace() {
        let doc = AltoDocument::parse(SAMPLE.as_bytes()).unwrap();
        assert_eq!(doc.root.name, "alto");
        assert_eq!(doc.root.namespace.as_deref(), Some(ALTO_NS_V2));
        assert_eq!(doc.prolog, vec![Node::Comment(" produced by OCR ".to_string())]);

        let tag = doc.element_at(&[0, 0]).unwrap();
        assert!(tag.is(ALTO_NS_V2, "NamedEntityTag"));
        assert_eq!(tag.attr("LABEL"), Some("Berlin"));
    }

    #[test]
    fn test_parse_unescapes_attribute_values() {
        let doc = AltoDocument::parse(SAMPLE.as_bytes()).unwrap();
        let mut contents = Vec::new();
        doc.visit(|_, el| {
            if let Some(content) = el.attr("CONTENT") {
                contents.push(content.to_string());
            }
        });
        assert_eq!(contents, vec!["Berlin & Umgebung".to_string()]);
    }

    #[test]
    fn test_parse_expands_doctype_entities_in_attributes() {
        let xml = r#"<?xml version="1.0"?>
<!DOCTYPE alto [
  <!ENTITY % ignored "x">
  <!ENTITY city "Berlin">
  <!ENTITY land 'Brandenburg'>
]>
<alto xmlns="http://www.loc.gov/standards/alto/ns-v2#">
  <NamedEntityTag TYPE="LOCATION" LABEL="&city; &amp; &land;"/>
</alto>"#;
        let doc = AltoDocument::parse(xml.as_bytes()).unwrap();
        let tag = doc.element_at(&[0]).unwrap();
        assert_eq!(tag.attr("LABEL"), Some("Berlin & Brandenburg"));
        assert!(matches!(doc.prolog.first(), Some(Node::DocType(_))));
    }

    #[test]
    fn test_parse_rejects_undeclared_entity() {
        let xml = r#"<alto LABEL="&nowhere;"/>"#;
        let err = AltoDocument::parse(xml.as_bytes()).unwrap_err();
        assert!(err.message.contains("LABEL"));
    }

    #[test]
    fn test_declared_entities_skips_external_and_parameter() {
        let entities = declared_entities(
            r#"alto SYSTEM "alto.dtd" [ <!ENTITY ext SYSTEM "x.xml"> <!ENTITY % p "q"> <!ENTITY a "1"> <!ENTITY a "2"> ]"#,
        );
        assert_eq!(entities.len(), 1);
        assert_eq!(entities.get("a").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_parse_prefixed_namespace() {
        let xml = r#"<a:alto xmlns:a="http://www.loc.gov/standards/alto/ns-v2#"><a:Tags><a:NamedEntityTag TYPE="LOCATION"/></a:Tags></a:alto>"#;
        let doc = AltoDocument::parse(xml.as_bytes()).unwrap();
        let tag = doc.element_at(&[0, 0]).unwrap();
        assert_eq!(tag.name, "a:NamedEntityTag");
        assert_eq!(tag.local_name(), "NamedEntityTag");
        assert!(tag.is(ALTO_NS_V2, "NamedEntityTag"));
    }

    #[test]
    fn test_parse_rejects_mismatched_end_tag() {
        let err = AltoDocument::parse(b"<alto><Tags></Layout></alto>").unwrap_err();
        assert!(!err.message.is_empty());
    }

    #[test]
    fn test_parse_rejects_unclosed_root() {
        assert!(AltoDocument::parse(b"<alto><Tags/>").is_err());
    }

    #[test]
    fn test_parse_rejects_empty_input() {
        let err = AltoDocument::parse(b"").unwrap_err();
        assert!(err.message.contains("no root"));
    }

    #[test]
    fn test_parse_rejects_second_root() {
        let err = AltoDocument::parse(b"<alto/><alto/>").unwrap_err();
        assert!(err.message.contains("second root"));
    }

    #[test]
    fn test_parse_rejects_undeclared_prefix() {
        let err = AltoDocument::parse(b"<x:alto/>").unwrap_err();
        assert!(err.message.contains("undeclared"));
    }

    #[test]
    fn test_set_attr_replaces_in_place() {
        let mut el = Element::new("NamedEntityTag");
        el.set_attr("TYPE", "LOCATION");
        el.set_attr("URI", "https://www.geonames.org/1");
        el.set_attr("TYPE", "PLACE");
        el.set_attr("URI", "https://www.geonames.org/2");

        assert_eq!(
            el.attributes,
            vec![
                ("TYPE".to_string(), "PLACE".to_string()),
                ("URI".to_string(), "https://www.geonames.org/2".to_string()),
            ]
        );
    }

    #[test]
    fn test_element_at_mut_and_visit_paths() {
        let mut doc = AltoDocument::parse(SAMPLE.as_bytes()).unwrap();
        doc.element_at_mut(&[0, 1]).unwrap().set_attr("URI", "x");
        assert_eq!(doc.element_at(&[0, 1]).unwrap().attr("URI"), Some("x"));
        assert!(doc.element_at(&[9]).is_none());

        let mut paths = Vec::new();
        doc.visit(|path, el| {
            if el.local_name() == "NamedEntityTag" {
                paths.push(path.clone());
            }
        });
        assert_eq!(paths, vec![vec![0, 0], vec![0, 1]]);
    }
}
