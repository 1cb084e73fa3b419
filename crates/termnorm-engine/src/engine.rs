//! The engine facade: load-or-restore a vocabulary, then serve queries.
//!
//! Initialization is the only phase that touches the filesystem. Once an
//! engine exists, every public operation is a pure read over immutable
//! state, so a single instance can be shared freely across threads.
//! Hot-reloading a new vocabulary version means constructing a new engine
//! and swapping the reference callers hold (e.g. an `Arc` swap); engines
//! are never mutated in place.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use termnorm_vocab::{parser, Concept};
use tracing::{info, warn};

use crate::cache::{self, CACHE_FILE_NAME};
use crate::error::{EngineError, EngineResult};
use crate::hierarchy::{HierarchyNavigator, HierarchyView};
use crate::index::TermIndex;
use crate::matcher::{scoring, Matcher, TermMatch};
use crate::statistics::VocabularyStats;

/// Configuration for engine initialization.
///
/// # Example
///
/// ```
/// use termnorm_engine::EngineConfig;
///
/// let config = EngineConfig::builder()
///     .with_cache_dir("/var/cache/termnorm")
///     .with_force_rebuild(false)
///     .build();
/// ```
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Directory for the binary cache artifact (None = no persistence).
    pub cache_dir: Option<PathBuf>,
    /// Rebuild from source even when a fresh cache exists.
    pub force_rebuild: bool,
}

impl EngineConfig {
    /// Creates a new builder for EngineConfig.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }
}

/// Builder for [`EngineConfig`].
#[derive(Debug, Clone, Default)]
pub struct EngineConfigBuilder {
    cache_dir: Option<PathBuf>,
    force_rebuild: bool,
}

impl EngineConfigBuilder {
    /// Sets the cache directory.
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Forces a rebuild from source, ignoring any existing cache.
    pub fn with_force_rebuild(mut self, force: bool) -> Self {
        self.force_rebuild = force;
        self
    }

    /// Builds the EngineConfig.
    pub fn build(self) -> EngineConfig {
        EngineConfig {
            cache_dir: self.cache_dir,
            force_rebuild: self.force_rebuild,
        }
    }
}

/// One item of a batch normalization result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchNormalization {
    /// The query text as submitted.
    pub original: String,
    /// The best match, if it cleared the normalization threshold.
    pub best_match: Option<TermMatch>,
    /// All matches for the query, best first, up to
    /// [`scoring::BATCH_MATCH_LIMIT`].
    pub all_matches: Vec<TermMatch>,
}

/// A loaded, immutable vocabulary snapshot with its search indices.
///
/// # Example
///
/// ```no_run
/// use termnorm_engine::NormalizationEngine;
///
/// let engine = NormalizationEngine::load("hp.json", Some("cache".as_ref()))?;
///
/// if let Some(m) = engine.normalize("epileptic seizure") {
///     println!("{} -> {} ({:.2}, {})", "epileptic seizure", m.concept_id, m.confidence, m.tier);
/// }
/// # Ok::<(), termnorm_engine::EngineError>(())
/// ```
#[derive(Debug)]
pub struct NormalizationEngine {
    concepts: HashMap<String, Concept>,
    index: TermIndex,
}

impl NormalizationEngine {
    /// Loads an engine from a vocabulary source, using a cache directory
    /// when one is given.
    ///
    /// A fresh cache is restored instead of re-parsing; a missing, stale,
    /// or corrupt cache triggers a rebuild from source followed by a
    /// best-effort persist. An unwritable cache directory degrades to an
    /// in-memory-only engine.
    ///
    /// # Errors
    ///
    /// Fails only when the vocabulary source is missing, unreadable, or
    /// structurally invalid.
    pub fn load(vocabulary_path: impl AsRef<Path>, cache_dir: Option<&Path>) -> EngineResult<Self> {
        let mut builder = EngineConfig::builder();
        if let Some(dir) = cache_dir {
            builder = builder.with_cache_dir(dir);
        }
        Self::with_config(vocabulary_path, builder.build())
    }

    /// Loads an engine with explicit configuration.
    pub fn with_config(
        vocabulary_path: impl AsRef<Path>,
        config: EngineConfig,
    ) -> EngineResult<Self> {
        let source = vocabulary_path.as_ref();
        fs::metadata(source).map_err(|e| EngineError::SourceUnavailable {
            path: source.to_path_buf(),
            source: e,
        })?;

        let Some(dir) = &config.cache_dir else {
            return Self::build_from_source(source);
        };
        let cache_path = dir.join(CACHE_FILE_NAME);

        if !config.force_rebuild && cache::is_fresh(&cache_path, source) {
            match cache::load(&cache_path) {
                Ok((metadata, payload)) => {
                    info!(
                        cache = %cache_path.display(),
                        concepts = metadata.concept_count,
                        compiled_at = %metadata.compiled_at,
                        "restored vocabulary from cache"
                    );
                    return Ok(Self {
                        concepts: payload.concepts,
                        index: payload.index,
                    });
                }
                Err(e) => {
                    warn!(
                        cache = %cache_path.display(),
                        error = %e,
                        "cache unusable, rebuilding from source"
                    );
                }
            }
        }

        let engine = Self::build_from_source(source)?;

        // Persistence is best-effort: an unwritable cache directory must
        // not fail initialization.
        if let Err(e) = fs::create_dir_all(dir)
            .map_err(|e| crate::error::CacheError::io_error(dir, e))
            .and_then(|_| cache::save(&cache_path, source, &engine.concepts, &engine.index))
        {
            warn!(
                cache = %cache_path.display(),
                error = %e,
                "failed to persist vocabulary cache, continuing in memory"
            );
        }

        Ok(engine)
    }

    /// Builds an engine directly from an in-memory concept map.
    ///
    /// Useful for embedders that assemble vocabularies programmatically
    /// and for tests; no filesystem access, no cache.
    pub fn from_concepts(concepts: HashMap<String, Concept>) -> Self {
        let index = TermIndex::build(&concepts);
        Self { concepts, index }
    }

    fn build_from_source(source: &Path) -> EngineResult<Self> {
        let concepts = parser::parse_file(source)?;
        let index = TermIndex::build(&concepts);
        info!(
            concepts = concepts.len(),
            words = index.word_count(),
            ngrams = index.ngram_count(),
            "built vocabulary indices"
        );
        Ok(Self { concepts, index })
    }

    /// Finds the best-matching concepts for a free-text phrase.
    ///
    /// See [`Matcher::search`] for tier semantics. An empty or
    /// whitespace-only query yields an empty list, never an error.
    pub fn search(&self, query: &str, max_results: usize) -> Vec<TermMatch> {
        self.matcher().search(query, max_results)
    }

    /// Maps a phrase to its single best concept, or `None` if no match
    /// clears the confidence threshold.
    pub fn normalize(&self, query: &str) -> Option<TermMatch> {
        self.matcher().normalize(query)
    }

    /// Normalizes a batch of phrases independently.
    ///
    /// Output order matches input order. With the `parallel` feature the
    /// items are processed on the rayon thread pool.
    pub fn batch_normalize<I, S>(&self, queries: I) -> Vec<BatchNormalization>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let queries: Vec<String> = queries.into_iter().map(Into::into).collect();

        #[cfg(feature = "parallel")]
        {
            queries
                .into_par_iter()
                .map(|q| self.normalize_one(q))
                .collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            queries.into_iter().map(|q| self.normalize_one(q)).collect()
        }
    }

    fn normalize_one(&self, original: String) -> BatchNormalization {
        let all_matches = self.search(&original, scoring::BATCH_MATCH_LIMIT);
        let best_match = all_matches
            .first()
            .filter(|m| m.confidence > scoring::NORMALIZE_CONFIDENCE_FLOOR)
            .cloned();
        BatchNormalization {
            original,
            best_match,
            all_matches,
        }
    }

    /// Returns the bounded ancestor/descendant view for a concept, or
    /// `None` for an unknown id.
    pub fn get_hierarchy(&self, concept_id: &str, max_depth: usize) -> Option<HierarchyView> {
        HierarchyNavigator::new(&self.concepts).view(concept_id, max_depth)
    }

    /// Returns every transitive ancestor id of a concept.
    pub fn ancestor_ids(&self, concept_id: &str) -> HashSet<String> {
        HierarchyNavigator::new(&self.concepts).ancestor_ids(concept_id)
    }

    /// Returns every transitive descendant id of a concept.
    pub fn descendant_ids(&self, concept_id: &str) -> HashSet<String> {
        HierarchyNavigator::new(&self.concepts).descendant_ids(concept_id)
    }

    /// Computes statistics for the loaded vocabulary.
    pub fn statistics(&self) -> VocabularyStats {
        VocabularyStats::compute(&self.concepts, &self.index)
    }

    /// Looks up a concept by id.
    pub fn concept(&self, concept_id: &str) -> Option<&Concept> {
        self.concepts.get(concept_id)
    }

    /// Number of loaded concepts, obsolete included.
    pub fn concept_count(&self) -> usize {
        self.concepts.len()
    }

    /// True if no concepts are loaded.
    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    fn matcher(&self) -> Matcher<'_> {
        Matcher::new(&self.concepts, &self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> NormalizationEngine {
        let mut concepts = HashMap::new();
        concepts.insert(
            "HP:0001250".to_string(),
            Concept::new("HP:0001250", "Seizures").with_synonym("Epileptic seizure"),
        );
        concepts.insert(
            "HP:0000118".to_string(),
            Concept::new("HP:0000118", "Phenotypic abnormality"),
        );
        NormalizationEngine::from_concepts(concepts)
    }

    #[test]
    fn test_from_concepts() {
        let engine = engine();
        assert_eq!(engine.concept_count(), 2);
        assert!(!engine.is_empty());
        assert_eq!(engine.concept("HP:0001250").unwrap().name, "Seizures");
        assert!(engine.concept("HP:9999999").is_none());
    }

    #[test]
    fn test_normalize_through_facade() {
        let engine = engine();
        let m = engine.normalize("seizures").unwrap();
        assert_eq!(m.concept_id, "HP:0001250");
        assert_eq!(m.confidence, 1.0);
    }

    #[test]
    fn test_batch_normalize_preserves_order() {
        let engine = engine();
        let results = engine.batch_normalize(["seizures", "xyzabc", "epileptic seizure"]);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].original, "seizures");
        assert!(results[0].best_match.is_some());

        assert_eq!(results[1].original, "xyzabc");
        assert!(results[1].best_match.is_none());
        assert!(results[1].all_matches.is_empty());

        assert_eq!(
            results[2].best_match.as_ref().unwrap().concept_id,
            "HP:0001250"
        );
    }

    #[test]
    fn test_batch_all_matches_capped_at_five() {
        let mut concepts = HashMap::new();
        for i in 0..9 {
            concepts.insert(
                format!("T:{i}"),
                Concept::new(format!("T:{i}"), format!("fever variant {i}")),
            );
        }
        let engine = NormalizationEngine::from_concepts(concepts);

        let results = engine.batch_normalize(["fever variant"]);
        assert_eq!(results[0].all_matches.len(), 5);
    }

    #[test]
    fn test_load_missing_source_fails() {
        let err = NormalizationEngine::load("/nonexistent/vocab.json", None).unwrap_err();
        assert!(matches!(err, EngineError::SourceUnavailable { .. }));
    }

    #[test]
    fn test_engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NormalizationEngine>();
    }
}
