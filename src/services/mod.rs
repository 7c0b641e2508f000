//! Enrichment services.
//!
//! `EnrichmentService` drives one run over a document or a folder of
//! documents; `GeonamesStep` wraps it for a hosting workflow engine.

mod enrichment;
mod step;

pub use enrichment::EnrichmentService;
pub use step::{GeonamesStep, StepOutcome};
