//! GeoNames lookup: HTTP transport, response decoding and label resolution.

pub mod client;
pub mod resolver;
pub mod response;

pub use client::{GeonamesClient, SearchBackend};
pub use resolver::{GeocodeResolver, LookupCache, LookupStats};
pub use response::{parse_candidates, Candidate};
