//! Named-entity tags found in ALTO documents.

/// Child-index path from the root element to a node.
///
/// The root element itself has an empty path. Tags are identified by their
/// position in the tree, not by a key of their own.
pub type NodePath = Vec<usize>;

/// Entity category of a `NamedEntityTag`, decided once at extraction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// `TYPE="LOCATION"`, the only kind that gets resolved.
    Location,
    /// Any other `TYPE` value (empty when the attribute is missing).
    Other(String),
}

impl EntityKind {
    /// Attribute value that marks a location entity.
    pub const LOCATION: &'static str = "LOCATION";

    /// Classify a raw `TYPE` attribute value. Matching is exact.
    pub fn from_type_attr(value: Option<&str>) -> Self {
        match value {
            Some(Self::LOCATION) => EntityKind::Location,
            Some(other) => EntityKind::Other(other.to_string()),
            None => EntityKind::Other(String::new()),
        }
    }

    pub fn is_location(&self) -> bool {
        matches!(self, EntityKind::Location)
    }

    /// The `TYPE` value this kind was read from.
    pub fn as_str(&self) -> &str {
        match self {
            EntityKind::Location => Self::LOCATION,
            EntityKind::Other(raw) => raw,
        }
    }
}

/// A `NamedEntityTag` element located in a parsed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityTag {
    /// Position of the element in the document tree.
    pub position: NodePath,
    /// Entity kind from the `TYPE` attribute.
    pub kind: EntityKind,
    /// Text to resolve, from the `LABEL` attribute.
    pub label: Option<String>,
    /// Existing `URI` attribute, if the tag was enriched before.
    pub uri: Option<String>,
}

impl EntityTag {
    /// The label to resolve, if this tag is a location with a label.
    pub fn location_label(&self) -> Option<&str> {
        if self.kind.is_location() {
            self.label.as_deref()
        } else {
            None
        }
    }
}
