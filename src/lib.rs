//! alto-geonames - GeoNames enrichment for ALTO OCR documents
//!
//! Resolves `NamedEntityTag` elements of type `LOCATION` against the GeoNames
//! search service and writes the resulting `URI` back into the document.

pub mod alto;
pub mod cli;
pub mod config;
pub mod error;
pub mod geonames;
pub mod models;
pub mod services;
