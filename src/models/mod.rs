//! Domain models for the enrichment run.

mod entity;
mod geoname;
mod run;

pub use entity::{EntityKind, EntityTag, NodePath};
pub use geoname::{GeonameId, Resolution};
pub use run::{RunReport, RunStage};
