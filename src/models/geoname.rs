//! GeoNames identifiers and resolution results.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Host prefix of canonical GeoNames feature URIs.
pub const GEONAMES_URI_BASE: &str = "https://www.geonames.org";

/// Numeric key of a GeoNames feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeonameId(pub u64);

impl GeonameId {
    /// Canonical URI for this feature, e.g. `https://www.geonames.org/2950159`.
    pub fn uri(&self) -> String {
        format!("{}/{}", GEONAMES_URI_BASE, self.0)
    }
}

impl fmt::Display for GeonameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of resolving one label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Top-ranked candidate of the lookup (or of its fallback retry).
    Resolved(GeonameId),
    /// Neither the label nor its truncated form produced a candidate.
    Unresolved,
}

impl Resolution {
    pub fn id(&self) -> Option<GeonameId> {
        match self {
            Resolution::Resolved(id) => Some(*id),
            Resolution::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }
}
