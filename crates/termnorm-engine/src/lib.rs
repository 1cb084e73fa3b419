//! # termnorm-engine
//!
//! Ontology term normalization: map free-text phrases onto a hierarchical
//! controlled vocabulary with graded confidence, and navigate the
//! concept hierarchy.
//!
//! ## Key Features
//!
//! - **Tiered matching** - exact name, exact synonym, word-overlap
//!   partial, and trigram-seeded fuzzy tiers merged by a single
//!   dedup/rank step
//! - **Binary state cache** - parse and index once, restore in
//!   milliseconds on later startups, with staleness and corruption
//!   handled automatically
//! - **Bounded hierarchy views** - depth-limited ancestor/descendant
//!   trees that tolerate cyclic input
//! - **Read-only after load** - one engine instance serves concurrent
//!   queries without locks; hot reload is an instance swap
//!
//! ## Quick Start
//!
//! ```no_run
//! use termnorm_engine::NormalizationEngine;
//!
//! // Parse the vocabulary (or restore the cache) once at startup.
//! let engine = NormalizationEngine::load("hp.json", Some("cache".as_ref()))?;
//!
//! // Map free text onto concepts.
//! for m in engine.search("epileptic seizure", 10) {
//!     println!("{} {} ({:.2}, {})", m.concept_id, m.name, m.confidence, m.tier);
//! }
//!
//! // Or ask for the single best concept.
//! if let Some(best) = engine.normalize("seizures") {
//!     assert_eq!(best.concept_id, "HP:0001250");
//! }
//!
//! // Walk the hierarchy around a concept.
//! let view = engine.get_hierarchy("HP:0001250", 2).expect("known concept");
//! println!("{} direct parents", view.ancestors.len());
//! # Ok::<(), termnorm_engine::EngineError>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `parallel` - process `batch_normalize` items on the rayon thread
//!   pool
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                      termnorm-engine                       │
//! │                                                            │
//! │  NormalizationEngine                                       │
//! │  ├── parse source or restore cache (termnorm-vocab, cache) │
//! │  ├── build four indices (index)                            │
//! │  ├── run matching tiers and merge (matcher)                │
//! │  ├── answer hierarchy queries (hierarchy)                  │
//! │  └── report vocabulary statistics (statistics)             │
//! │                                                            │
//! │  Dependencies:                                             │
//! │  └── termnorm-vocab - Concept model and OBO-graph parser   │
//! └────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod cache;
mod engine;
mod error;
mod hierarchy;
mod index;
mod matcher;
mod statistics;

// Public re-exports
pub use engine::{BatchNormalization, EngineConfig, EngineConfigBuilder, NormalizationEngine};
pub use error::{CacheError, EngineError, EngineResult};
pub use hierarchy::{ConceptSummary, HierarchyNavigator, HierarchyNode, HierarchyView};
pub use index::{ngrams, tokenize, TermIndex, MIN_TOKEN_LEN, NGRAM_LEN};
pub use matcher::{scoring, MatchTier, Matcher, TermMatch};
pub use statistics::VocabularyStats;

// Re-export the vocabulary types for convenience
pub use termnorm_vocab::{Concept, VocabError};
