//! Vocabulary statistics.
//!
//! Obsolete concepts are never dropped from the indices; these counts are
//! how callers decide whether and how to filter them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use termnorm_vocab::Concept;

use crate::index::TermIndex;

/// Summary statistics for one loaded vocabulary snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyStats {
    /// Total number of concepts, obsolete included.
    pub total_concepts: usize,
    /// Concepts not marked obsolete.
    pub active_concepts: usize,
    /// Concepts marked obsolete.
    pub obsolete_concepts: usize,
    /// Concepts with at least one synonym.
    pub concepts_with_synonyms: usize,
    /// Concepts with no recorded parents.
    pub root_count: usize,
    /// Concepts with no recorded children.
    pub leaf_count: usize,
    /// Distinct content words in the word index.
    pub indexed_word_count: usize,
    /// Distinct trigrams in the n-gram index.
    pub indexed_ngram_count: usize,
}

impl VocabularyStats {
    /// Computes statistics over a concept map and its indices.
    pub fn compute(concepts: &HashMap<String, Concept>, index: &TermIndex) -> Self {
        let mut stats = VocabularyStats {
            total_concepts: concepts.len(),
            active_concepts: 0,
            obsolete_concepts: 0,
            concepts_with_synonyms: 0,
            root_count: 0,
            leaf_count: 0,
            indexed_word_count: index.word_count(),
            indexed_ngram_count: index.ngram_count(),
        };

        for concept in concepts.values() {
            if concept.is_obsolete {
                stats.obsolete_concepts += 1;
            } else {
                stats.active_concepts += 1;
            }
            if !concept.synonyms.is_empty() {
                stats.concepts_with_synonyms += 1;
            }
            if concept.is_root() {
                stats.root_count += 1;
            }
            if concept.is_leaf() {
                stats.leaf_count += 1;
            }
        }

        stats
    }
}

impl std::fmt::Display for VocabularyStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Vocabulary Statistics")?;
        writeln!(f, "  Total Concepts:    {}", self.total_concepts)?;
        writeln!(f, "  Active:            {}", self.active_concepts)?;
        writeln!(f, "  Obsolete:          {}", self.obsolete_concepts)?;
        writeln!(f, "  With Synonyms:     {}", self.concepts_with_synonyms)?;
        writeln!(f, "  Roots:             {}", self.root_count)?;
        writeln!(f, "  Leaves:            {}", self.leaf_count)?;
        writeln!(f, "  Indexed Words:     {}", self.indexed_word_count)?;
        writeln!(f, "  Indexed Trigrams:  {}", self.indexed_ngram_count)?;
        Ok(())
    }
}
