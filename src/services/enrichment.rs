//! Enrichment run: parse, resolve locations, rewrite.
//!
//! All target documents are parsed before the first lookup and written only
//! after the last one, so a failed run never touches the disk.

use std::path::{Path, PathBuf};

use crate::alto::{extract_entity_tags, AltoDocument, DocumentStore, ATTR_URI};
use crate::error::AppError;
use crate::geonames::{GeocodeResolver, LookupCache, SearchBackend};
use crate::models::{Resolution, RunReport, RunStage};

/// Service that enriches ALTO documents with GeoNames URIs.
///
/// One resolver, and therefore one lookup cache, serves every document of a
/// run.
pub struct EnrichmentService<B: SearchBackend> {
    resolver: GeocodeResolver<B>,
    stage: RunStage,
    dry_run: bool,
}

impl<B: SearchBackend> EnrichmentService<B> {
    pub fn new(backend: B) -> Self {
        Self::with_cache(backend, LookupCache::new())
    }

    /// Start from an existing cache instead of an empty one.
    pub fn with_cache(backend: B, cache: LookupCache) -> Self {
        Self {
            resolver: GeocodeResolver::with_cache(backend, cache),
            stage: RunStage::Start,
            dry_run: false,
        }
    }

    /// Resolve and report without writing anything back.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Stage reached by the last run.
    pub fn stage(&self) -> RunStage {
        self.stage
    }

    /// Enrich the document at `location`, or every ALTO file in it if it is
    /// a folder.
    pub async fn run(&mut self, location: &Path) -> Result<RunReport, AppError> {
        self.stage = RunStage::Start;
        tracing::info!(location = %location.display(), dry_run = self.dry_run, "Starting enrichment run");

        match self.run_stages(location).await {
            Ok(report) => Ok(report),
            Err(err) => {
                tracing::debug!(failed_after = %self.stage, code = err.code(), "Run aborted");
                self.stage = RunStage::Error;
                Err(err)
            }
        }
    }

    async fn run_stages(&mut self, location: &Path) -> Result<RunReport, AppError> {
        let store = DocumentStore::new(location);

        let mut documents: Vec<(PathBuf, AltoDocument)> = Vec::new();
        for path in store.targets()? {
            let doc = store.load(&path)?;
            documents.push((path, doc));
        }
        self.advance(RunStage::Parsed);

        let before = self.resolver.stats();
        let mut report = RunReport {
            documents: documents.len(),
            ..RunReport::default()
        };
        for (path, doc) in documents.iter_mut() {
            self.enrich_document(path, doc, &mut report).await?;
        }
        self.advance(RunStage::Enriched);

        if self.dry_run {
            tracing::info!("Dry run, leaving documents unchanged");
        } else {
            for (path, doc) in &documents {
                store.save(path, doc)?;
            }
            report.written = true;
        }
        self.advance(RunStage::Rewritten);

        let after = self.resolver.stats();
        report.lookups = after.lookups - before.lookups;
        report.cache_hits = after.cache_hits - before.cache_hits;

        self.advance(RunStage::Done);
        tracing::info!(
            documents = report.documents,
            locations = report.locations,
            resolved = report.resolved,
            unresolved = report.unresolved,
            lookups = report.lookups,
            cache_hits = report.cache_hits,
            "Enrichment run complete"
        );
        Ok(report)
    }

    /// Resolve every location tag of one document and set its `URI`.
    async fn enrich_document(
        &mut self,
        path: &Path,
        doc: &mut AltoDocument,
        report: &mut RunReport,
    ) -> Result<(), AppError> {
        let tags = extract_entity_tags(doc);
        report.tags += tags.len();

        let mut resolved = 0;
        for tag in tags.iter().filter(|t| t.kind.is_location()) {
            report.locations += 1;

            let Some(label) = tag.location_label() else {
                tracing::warn!(
                    path = %path.display(),
                    position = ?tag.position,
                    "LOCATION tag without LABEL, skipping"
                );
                report.skipped += 1;
                continue;
            };

            match self.resolver.resolve(label).await? {
                Resolution::Resolved(id) => match doc.element_at_mut(&tag.position) {
                    Some(el) => {
                        el.set_attr(ATTR_URI, id.uri());
                        resolved += 1;
                    }
                    None => {
                        tracing::warn!(position = ?tag.position, "Tag position no longer valid")
                    }
                },
                Resolution::Unresolved => {
                    tracing::debug!(label = %label, "Leaving tag unresolved");
                    report.unresolved += 1;
                }
            }
        }
        report.resolved += resolved;

        tracing::info!(
            path = %path.display(),
            tags = tags.len(),
            resolved,
            "Enriched document"
        );
        Ok(())
    }

    fn advance(&mut self, next: RunStage) {
        debug_assert_eq!(self.stage.next(), next, "run stages must advance in order");
        self.stage = next;
        tracing::debug!(stage = %next, "Run stage");
    }
}
