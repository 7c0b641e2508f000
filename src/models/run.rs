//! Run lifecycle and summary.

use std::fmt;

use serde::Serialize;

/// Stage of an enrichment run.
///
/// Stages only move forward, `Start → Parsed → Enriched → Rewritten → Done`.
/// `Error` is absorbing and reachable from every other stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunStage {
    Start,
    Parsed,
    Enriched,
    Rewritten,
    Done,
    Error,
}

impl RunStage {
    /// The stage that follows this one on the success path.
    pub fn next(self) -> RunStage {
        match self {
            RunStage::Start => RunStage::Parsed,
            RunStage::Parsed => RunStage::Enriched,
            RunStage::Enriched => RunStage::Rewritten,
            RunStage::Rewritten => RunStage::Done,
            RunStage::Done => RunStage::Done,
            RunStage::Error => RunStage::Error,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RunStage::Done | RunStage::Error)
    }
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunStage::Start => "start",
            RunStage::Parsed => "parsed",
            RunStage::Enriched => "enriched",
            RunStage::Rewritten => "rewritten",
            RunStage::Done => "done",
            RunStage::Error => "error",
        };
        f.write_str(name)
    }
}

/// Counters for a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Documents parsed and enriched.
    pub documents: usize,
    /// `NamedEntityTag` elements seen, of any kind.
    pub tags: usize,
    /// Tags of kind `LOCATION`.
    pub locations: usize,
    /// Location tags that received a `URI`.
    pub resolved: usize,
    /// Location tags left without a `URI`.
    pub unresolved: usize,
    /// Location tags skipped for lack of a `LABEL`.
    pub skipped: usize,
    /// Outbound lookup calls.
    pub lookups: usize,
    /// Lookups answered from the cache.
    pub cache_hits: usize,
    /// Whether documents were written back.
    pub written: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_progression_is_linear() {
        let mut stage = RunStage::Start;
        let mut seen = vec![stage];
        while !stage.is_terminal() {
            stage = stage.next();
            seen.push(stage);
        }
        assert_eq!(
            seen,
            vec![
                RunStage::Start,
                RunStage::Parsed,
                RunStage::Enriched,
                RunStage::Rewritten,
                RunStage::Done
            ]
        );
    }

    #[test]
    fn test_error_is_absorbing() {
        assert_eq!(RunStage::Error.next(), RunStage::Error);
        assert!(RunStage::Error.is_terminal());
        assert_eq!(RunStage::Error.to_string(), "error");
    }
}
