//! Label resolution with a per-run cache and a single fallback retry.
//!
//! A label that finds no candidate is retried exactly once with its last
//! character removed ("Pariss" retries as "Paris").

use std::collections::HashMap;

use crate::error::AppError;
use crate::geonames::client::SearchBackend;
use crate::geonames::response::{parse_candidates, Candidate};
use crate::models::Resolution;

/// Raw response bodies keyed by the exact query string.
///
/// Entries are only ever added, so one query hits the network at most once
/// for as long as the cache lives.
#[derive(Debug, Clone, Default)]
pub struct LookupCache {
    entries: HashMap<String, String>,
}

impl LookupCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, query: &str) -> Option<&str> {
        self.entries.get(query).map(String::as_str)
    }

    pub fn insert(&mut self, query: impl Into<String>, body: impl Into<String>) {
        self.entries.insert(query.into(), body.into());
    }

    pub fn contains(&self, query: &str) -> bool {
        self.entries.contains_key(query)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Counters kept by a resolver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LookupStats {
    /// Calls made to the backend.
    pub lookups: usize,
    /// Queries answered from the cache.
    pub cache_hits: usize,
    /// Fallback retries attempted.
    pub retries: usize,
}

/// Resolves labels to GeoNames identifiers.
pub struct GeocodeResolver<B: SearchBackend> {
    backend: B,
    cache: LookupCache,
    stats: LookupStats,
}

impl<B: SearchBackend> GeocodeResolver<B> {
    /// Create a resolver with an empty cache.
    pub fn new(backend: B) -> Self {
        Self::with_cache(backend, LookupCache::new())
    }

    /// Create a resolver that starts from an existing cache.
    pub fn with_cache(backend: B, cache: LookupCache) -> Self {
        Self {
            backend,
            cache,
            stats: LookupStats::default(),
        }
    }

    pub fn stats(&self) -> LookupStats {
        self.stats
    }

    pub fn cache(&self) -> &LookupCache {
        &self.cache
    }

    /// Give the cache back, e.g. to seed the next resolver.
    pub fn into_cache(self) -> LookupCache {
        self.cache
    }

    /// Resolve a label to the top-ranked GeoNames feature.
    pub async fn resolve(&mut self, label: &str) -> Result<Resolution, AppError> {
        if let Some(top) = self.lookup(label).await?.into_iter().next() {
            return Ok(self.resolved(label, top));
        }

        let Some(truncated) = drop_last_char(label) else {
            tracing::debug!(label = %label, "No candidates");
            return Ok(Resolution::Unresolved);
        };

        self.stats.retries += 1;
        tracing::debug!(label = %label, retry = %truncated, "No candidates, retrying truncated label");

        match self.lookup(truncated).await?.into_iter().next() {
            Some(top) => Ok(self.resolved(label, top)),
            None => {
                tracing::debug!(label = %label, "No candidates after retry");
                Ok(Resolution::Unresolved)
            }
        }
    }

    fn resolved(&self, label: &str, top: Candidate) -> Resolution {
        tracing::debug!(
            label = %label,
            geoname_id = %top.geoname_id,
            name = ?top.name,
            country = ?top.country_name,
            feature_code = ?top.fcode,
            "Resolved"
        );
        Resolution::Resolved(top.geoname_id)
    }

    /// Candidates for one exact query, from the cache or the backend.
    ///
    /// The raw body is cached before it is parsed.
    async fn lookup(&mut self, query: &str) -> Result<Vec<Candidate>, AppError> {
        if let Some(body) = self.cache.get(query) {
            self.stats.cache_hits += 1;
            return parse_candidates(query, body);
        }

        let body = self.backend.search(query).await?;
        self.stats.lookups += 1;
        self.cache.insert(query, body.clone());
        parse_candidates(query, &body)
    }
}

/// `label` without its final character, or `None` for an empty label.
fn drop_last_char(label: &str) -> Option<&str> {
    let mut chars = label.chars();
    chars.next_back()?;
    Some(chars.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use crate::models::GeonameId;

    const EMPTY: &str = r#"{"geonames":[]}"#;

    /// Backend answering from a fixed table and recording every query.
    #[derive(Clone, Default)]
    struct FakeBackend {
        bodies: HashMap<String, String>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl FakeBackend {
        fn with(mut self, query: &str, body: &str) -> Self {
            self.bodies.insert(query.to_string(), body.to_string());
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SearchBackend for FakeBackend {
        async fn search(&self, query: &str) -> Result<String, AppError> {
            self.calls.lock().unwrap().push(query.to_string());
            Ok(self
                .bodies
                .get(query)
                .cloned()
                .unwrap_or_else(|| EMPTY.to_string()))
        }
    }

    /// Backend that always fails.
    struct FailingBackend {
        calls: Arc<Mutex<usize>>,
    }

    #[async_trait]
    impl SearchBackend for FailingBackend {
        async fn search(&self, query: &str) -> Result<String, AppError> {
            *self.calls.lock().unwrap() += 1;
            Err(AppError::LookupServiceError {
                label: query.to_string(),
                code: 19,
                message: "hourly limit exceeded".to_string(),
            })
        }
    }

    fn hit(id: u64) -> String {
        format!(r#"{{"geonames":[{{"geonameId":{id}}}]}}"#)
    }

    #[tokio::test]
    async fn test_resolve_top_candidate() {
        let backend = FakeBackend::default().with("Berlin", &hit(2950159));
        let mut resolver = GeocodeResolver::new(backend.clone());

        let resolution = resolver.resolve("Berlin").await.unwrap();
        assert_eq!(resolution, Resolution::Resolved(GeonameId(2950159)));
        assert_eq!(backend.calls(), vec!["Berlin"]);
    }

    #[tokio::test]
    async fn test_repeated_label_hits_network_once() {
        let backend = FakeBackend::default().with("Berlin", &hit(2950159));
        let mut resolver = GeocodeResolver::new(backend.clone());

        for _ in 0..5 {
            resolver.resolve("Berlin").await.unwrap();
        }

        assert_eq!(backend.calls(), vec!["Berlin"]);
        assert_eq!(resolver.stats().lookups, 1);
        assert_eq!(resolver.stats().cache_hits, 4);
    }

    #[tokio::test]
    async fn test_fallback_drops_one_character() {
        let backend = FakeBackend::default()
            .with("Pariss", EMPTY)
            .with("Paris", &hit(2988507));
        let mut resolver = GeocodeResolver::new(backend.clone());

        let resolution = resolver.resolve("Pariss").await.unwrap();
        assert_eq!(resolution, Resolution::Resolved(GeonameId(2988507)));
        assert_eq!(backend.calls(), vec!["Pariss", "Paris"]);
        assert!(resolver.cache().contains("Pariss"));
        assert!(resolver.cache().contains("Paris"));
        assert_eq!(resolver.stats().retries, 1);
    }

    #[tokio::test]
    async fn test_fallback_retries_only_once() {
        let backend = FakeBackend::default().with("Par", &hit(1));
        let mut resolver = GeocodeResolver::new(backend.clone());

        let resolution = resolver.resolve("Paris").await.unwrap();
        assert_eq!(resolution, Resolution::Unresolved);
        assert_eq!(backend.calls(), vec!["Paris", "Pari"]);
    }

    #[tokio::test]
    async fn test_fallback_results_are_cached() {
        let backend = FakeBackend::default().with("Paris", &hit(2988507));
        let mut resolver = GeocodeResolver::new(backend.clone());

        resolver.resolve("Pariss").await.unwrap();
        resolver.resolve("Pariss").await.unwrap();
        let direct = resolver.resolve("Paris").await.unwrap();

        assert_eq!(direct, Resolution::Resolved(GeonameId(2988507)));
        assert_eq!(backend.calls(), vec!["Pariss", "Paris"]);
    }

    #[tokio::test]
    async fn test_truncation_is_per_character() {
        let backend = FakeBackend::default().with("Zürich", &hit(2657896));
        let mut resolver = GeocodeResolver::new(backend.clone());

        let resolution = resolver.resolve("Zürichü").await.unwrap();
        assert_eq!(resolution, Resolution::Resolved(GeonameId(2657896)));
        assert_eq!(backend.calls(), vec!["Zürichü", "Zürich"]);
    }

    #[tokio::test]
    async fn test_empty_label_is_not_retried() {
        let backend = FakeBackend::default();
        let mut resolver = GeocodeResolver::new(backend.clone());

        let resolution = resolver.resolve("").await.unwrap();
        assert_eq!(resolution, Resolution::Unresolved);
        assert_eq!(backend.calls(), vec![""]);
    }

    #[tokio::test]
    async fn test_backend_error_propagates_without_retry() {
        let calls = Arc::new(Mutex::new(0));
        let mut resolver = GeocodeResolver::new(FailingBackend {
            calls: calls.clone(),
        });

        let err = resolver.resolve("Berlin").await.unwrap_err();
        assert!(matches!(err, AppError::LookupServiceError { .. }));
        assert_eq!(*calls.lock().unwrap(), 1);
        assert!(resolver.cache().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_body_is_cached_then_fails() {
        let backend = FakeBackend::default().with("Berlin", "not json");
        let mut resolver = GeocodeResolver::new(backend.clone());

        let err = resolver.resolve("Berlin").await.unwrap_err();
        assert!(matches!(err, AppError::LookupResponseMalformed { .. }));
        assert!(resolver.cache().contains("Berlin"));
    }

    #[tokio::test]
    async fn test_seeded_cache_skips_network() {
        let mut cache = LookupCache::new();
        cache.insert("Berlin", hit(2950159));
        let backend = FakeBackend::default();
        let mut resolver = GeocodeResolver::with_cache(backend.clone(), cache);

        let resolution = resolver.resolve("Berlin").await.unwrap();
        assert_eq!(resolution.id(), Some(GeonameId(2950159)));
        assert!(backend.calls().is_empty());
        assert_eq!(resolver.into_cache().len(), 1);
    }

    #[test]
    fn test_drop_last_char() {
        assert_eq!(drop_last_char("Berlin,"), Some("Berlin"));
        assert_eq!(drop_last_char("a"), Some(""));
        assert_eq!(drop_last_char("Köln"), Some("Köl"));
        assert_eq!(drop_last_char(""), None);
    }
}
