//! Deterministic serialization and atomic persistence.

use std::io::{self, Write};
use std::path::Path;

use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event};
use quick_xml::Writer;
use tempfile::NamedTempFile;

use crate::alto::document::{AltoDocument, Element, Node};

/// Indentation width of written documents.
const INDENT: usize = 2;

fn io_err(err: impl std::fmt::Display) -> io::Error {
    io::Error::other(err.to_string())
}

/// Serialize a document as pretty-printed UTF-8 XML.
///
/// The output only depends on the tree, so an unchanged tree always yields
/// the same bytes.
pub fn to_bytes(doc: &AltoDocument) -> io::Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT);

    writer
        .write_event(Event::Decl(BytesDecl::new(
            "1.0",
            Some("UTF-8"),
            doc.standalone.as_deref(),
        )))
        .map_err(io_err)?;

    for node in &doc.prolog {
        write_node(&mut writer, node)?;
    }
    write_element(&mut writer, &doc.root)?;
    for node in &doc.epilog {
        write_node(&mut writer, node)?;
    }

    let mut bytes = writer.into_inner();
    bytes.push(b'\n');
    Ok(bytes)
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &Node) -> io::Result<()> {
    let event = match node {
        Node::Element(el) => return write_element(writer, el),
        Node::Text(text) => Event::Text(BytesText::from_escaped(text.as_str())),
        Node::CData(text) => Event::CData(BytesCData::new(text.as_str())),
        Node::Comment(text) => Event::Comment(BytesText::from_escaped(text.as_str())),
        Node::ProcessingInstruction(text) => Event::PI(BytesPI::new(text.as_str())),
        Node::DocType(text) => Event::DocType(BytesText::from_escaped(text.as_str())),
    };
    writer.write_event(event).map_err(io_err)
}

fn write_element(writer: &mut Writer<Vec<u8>>, el: &Element) -> io::Result<()> {
    let mut start = BytesStart::new(el.name.as_str());
    for (key, value) in &el.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if el.children.is_empty() {
        return writer.write_event(Event::Empty(start)).map_err(io_err);
    }

    writer.write_event(Event::Start(start)).map_err(io_err)?;
    for child in &el.children {
        write_node(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(el.name.as_str())))
        .map_err(io_err)
}

/// Replace `path` with `bytes` via a temporary file in the same directory.
///
/// The original content stays untouched unless the final rename succeeds.
/// Permissions of an existing target carry over to the new file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;

    if let Ok(meta) = std::fs::metadata(path) {
        std::fs::set_permissions(tmp.path(), meta.permissions())?;
    }

    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
