//! # termnorm-vocab
//!
//! Vocabulary data model and source parsing for ontology term
//! normalization.
//!
//! This crate reads a hierarchical controlled vocabulary from an
//! OBO-graph JSON export (the node/edge format published for HPO, MONDO
//! and similar ontologies) and produces a flat map of [`Concept`] records
//! with parent/child links derived from the graph's `is_a` edges.
//!
//! ## Quick Start
//!
//! ```no_run
//! use termnorm_vocab::parser;
//!
//! let concepts = parser::parse_file("hp.json")?;
//! let seizure = &concepts["HP:0001250"];
//! println!("{} has {} synonyms", seizure.name, seizure.synonyms.len());
//! # Ok::<(), termnorm_vocab::VocabError>(())
//! ```
//!
//! ## Error policy
//!
//! Individual malformed nodes and edges are skipped so that one bad entry
//! cannot abort a vocabulary load. Only an unreadable file, invalid JSON,
//! or a file with no node collection at all produces a [`VocabError`].

#![warn(missing_docs)]

mod concept;
mod error;

pub mod parser;
pub mod relations;

pub use concept::Concept;
pub use error::{VocabError, VocabResult};
pub use relations::Edge;
