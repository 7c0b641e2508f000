//! ALTO document handling: parsing, entity extraction and rewriting.

pub mod document;
pub mod extractor;
pub mod store;
pub mod writer;

pub use document::{AltoDocument, Element, Node, ParseError, ALTO_NS_V2};
pub use extractor::{extract_entity_tags, ATTR_LABEL, ATTR_TYPE, ATTR_URI, NAMED_ENTITY_TAG};
pub use store::DocumentStore;
