//! Entity extraction from parsed ALTO documents.
//!
//! Collects every `NamedEntityTag` in the ALTO v2 namespace, in document
//! order, and classifies it once by its `TYPE` attribute.

use crate::alto::document::{AltoDocument, ALTO_NS_V2};
use crate::models::{EntityKind, EntityTag};

/// Local name of entity tag elements.
pub const NAMED_ENTITY_TAG: &str = "NamedEntityTag";

/// Attribute holding the entity kind.
pub const ATTR_TYPE: &str = "TYPE";

/// Attribute holding the text to resolve.
pub const ATTR_LABEL: &str = "LABEL";

/// Attribute written with the resolved GeoNames URI.
pub const ATTR_URI: &str = "URI";

/// Extract all entity tags, of any kind, in pre-order.
pub fn extract_entity_tags(doc: &AltoDocument) -> Vec<EntityTag> {
    let mut tags = Vec::new();
    doc.visit(|path, el| {
        if el.is(ALTO_NS_V2, NAMED_ENTITY_TAG) {
            tags.push(EntityTag {
                position: path.clone(),
                kind: EntityKind::from_type_attr(el.attr(ATTR_TYPE)),
                label: el.attr(ATTR_LABEL).map(str::to_string),
                uri: el.attr(ATTR_URI).map(str::to_string),
            });
        }
    });
    tags
}
