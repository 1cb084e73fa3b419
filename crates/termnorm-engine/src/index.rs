//! Search indices over a loaded vocabulary.
//!
//! Four complementary structures are built from the concept map and always
//! invalidated together:
//!
//! - exact name (case-folded name → concept id)
//! - exact synonym (case-folded synonym → concept ids)
//! - word (content token ≥ 3 chars → concept ids)
//! - character trigram (3-char window → concept ids)
//!
//! Building is a pure function of the concept map. Concepts are indexed in
//! sorted-id order so that repeated builds over the same map produce
//! identical contents regardless of map iteration order.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use termnorm_vocab::Concept;

/// Minimum length for a token to enter the word index.
pub const MIN_TOKEN_LEN: usize = 3;

/// Character n-gram width used for fuzzy candidate lookup.
pub const NGRAM_LEN: usize = 3;

/// The four derived search indices for one vocabulary snapshot.
///
/// Obsolete concepts are indexed like any other; filtering them is a
/// caller-side decision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermIndex {
    /// Case-folded primary name → concept id. Names are expected unique;
    /// on collision the concept with the greatest id wins (sorted build
    /// order makes this deterministic).
    name_to_id: HashMap<String, String>,
    /// Case-folded synonym → concept ids. One synonym may belong to
    /// several concepts.
    synonym_to_ids: HashMap<String, Vec<String>>,
    /// Content word → concepts whose name or a synonym contains it.
    word_to_ids: HashMap<String, HashSet<String>>,
    /// Character trigram → concepts whose name or a synonym contains it.
    ngram_to_ids: HashMap<String, HashSet<String>>,
}

impl TermIndex {
    /// Builds all four indices from a concept map.
    pub fn build(concepts: &HashMap<String, Concept>) -> Self {
        let mut index = TermIndex::default();

        let mut ids: Vec<&String> = concepts.keys().collect();
        ids.sort_unstable();

        for id in ids {
            let concept = &concepts[id];

            index
                .name_to_id
                .insert(concept.name.to_lowercase(), concept.id.clone());
            index.index_terms(&concept.name, &concept.id);

            for synonym in &concept.synonyms {
                let ids = index
                    .synonym_to_ids
                    .entry(synonym.to_lowercase())
                    .or_default();
                if !ids.contains(&concept.id) {
                    ids.push(concept.id.clone());
                }
                index.index_terms(synonym, &concept.id);
            }
        }

        index
    }

    /// Adds one label's words and trigrams for a concept.
    fn index_terms(&mut self, label: &str, concept_id: &str) {
        for word in tokenize(label) {
            self.word_to_ids
                .entry(word)
                .or_default()
                .insert(concept_id.to_string());
        }
        for gram in ngrams(label) {
            self.ngram_to_ids
                .entry(gram)
                .or_default()
                .insert(concept_id.to_string());
        }
    }

    /// Looks up a concept id by exact case-folded name.
    pub fn lookup_name(&self, folded: &str) -> Option<&String> {
        self.name_to_id.get(folded)
    }

    /// Looks up concept ids by exact case-folded synonym.
    pub fn lookup_synonym(&self, folded: &str) -> Option<&[String]> {
        self.synonym_to_ids.get(folded).map(Vec::as_slice)
    }

    /// Returns the concepts containing the given content word.
    pub fn lookup_word(&self, word: &str) -> Option<&HashSet<String>> {
        self.word_to_ids.get(word)
    }

    /// Returns the concepts containing the given trigram.
    pub fn lookup_ngram(&self, gram: &str) -> Option<&HashSet<String>> {
        self.ngram_to_ids.get(gram)
    }

    /// Number of distinct indexed content words.
    pub fn word_count(&self) -> usize {
        self.word_to_ids.len()
    }

    /// Number of distinct indexed trigrams.
    pub fn ngram_count(&self) -> usize {
        self.ngram_to_ids.len()
    }
}

/// Tokenizes a label into content words.
///
/// Lowercases, splits on non-alphanumeric boundaries, and drops tokens
/// shorter than [`MIN_TOKEN_LEN`] characters.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.chars().count() >= MIN_TOKEN_LEN)
        .map(str::to_string)
        .collect()
}

/// Extracts every contiguous [`NGRAM_LEN`]-character window from a label.
///
/// The label is lowercased first; labels shorter than the window emit
/// nothing.
pub fn ngrams(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.to_lowercase().chars().collect();
    if chars.len() < NGRAM_LEN {
        return Vec::new();
    }
    chars
        .windows(NGRAM_LEN)
        .map(|window| window.iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_concepts() -> HashMap<String, Concept> {
        let mut concepts = HashMap::new();
        concepts.insert(
            "HP:0001250".to_string(),
            Concept::new("HP:0001250", "Seizure").with_synonym("Epileptic seizure"),
        );
        concepts.insert(
            "HP:0002360".to_string(),
            Concept::new("HP:0002360", "Sleep disturbance").with_synonym("Sleep issues"),
        );
        concepts
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("Abnormality of the nervous system"),
            vec!["abnormality", "the", "nervous", "system"]
        );
        // Punctuation splits; short tokens are dropped.
        assert_eq!(tokenize("X-linked ID"), vec!["linked"]);
        assert!(tokenize("a b").is_empty());
    }

    #[test]
    fn test_ngrams() {
        assert_eq!(ngrams("abcd"), vec!["abc", "bcd"]);
        assert_eq!(ngrams("ABC"), vec!["abc"]);
        assert!(ngrams("ab").is_empty());
        assert!(ngrams("").is_empty());
    }

    #[test]
    fn test_name_lookup_case_folded() {
        let index = TermIndex::build(&sample_concepts());
        assert_eq!(index.lookup_name("seizure").unwrap(), "HP:0001250");
        assert!(index.lookup_name("Seizure").is_none());
    }

    #[test]
    fn test_synonym_lookup() {
        let index = TermIndex::build(&sample_concepts());
        let ids = index.lookup_synonym("epileptic seizure").unwrap();
        assert_eq!(ids, ["HP:0001250"]);
    }

    #[test]
    fn test_word_index_covers_names_and_synonyms() {
        let index = TermIndex::build(&sample_concepts());
        let seizure_ids = index.lookup_word("seizure").unwrap();
        assert!(seizure_ids.contains("HP:0001250"));
        // "epileptic" only appears in a synonym.
        assert!(index.lookup_word("epileptic").unwrap().contains("HP:0001250"));
        assert!(index.lookup_word("sleep").unwrap().contains("HP:0002360"));
    }

    #[test]
    fn test_ngram_index() {
        let index = TermIndex::build(&sample_concepts());
        assert!(index.lookup_ngram("sei").unwrap().contains("HP:0001250"));
        assert!(index.lookup_ngram("zzz").is_none());
    }

    #[test]
    fn test_build_is_idempotent() {
        let concepts = sample_concepts();
        let first = TermIndex::build(&concepts);
        let second = TermIndex::build(&concepts);
        assert_eq!(first, second);
    }

    #[test]
    fn test_name_collision_is_deterministic() {
        let mut concepts = HashMap::new();
        concepts.insert("A:1".to_string(), Concept::new("A:1", "Shared name"));
        concepts.insert("A:2".to_string(), Concept::new("A:2", "Shared name"));

        let index = TermIndex::build(&concepts);
        // Sorted build order: the lexicographically last id wins.
        assert_eq!(index.lookup_name("shared name").unwrap(), "A:2");

        // Both concepts still reachable through the word index.
        let ids = index.lookup_word("shared").unwrap();
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn test_shared_synonym_maps_to_both() {
        let mut concepts = HashMap::new();
        concepts.insert(
            "A:1".to_string(),
            Concept::new("A:1", "First").with_synonym("Common label"),
        );
        concepts.insert(
            "A:2".to_string(),
            Concept::new("A:2", "Second").with_synonym("Common label"),
        );

        let index = TermIndex::build(&concepts);
        let ids = index.lookup_synonym("common label").unwrap();
        assert_eq!(ids, ["A:1", "A:2"]);
    }

    #[test]
    fn test_obsolete_concepts_still_indexed() {
        let mut concepts = HashMap::new();
        concepts.insert(
            "A:1".to_string(),
            Concept::new("A:1", "Retired term").with_obsolete(true),
        );

        let index = TermIndex::build(&concepts);
        assert_eq!(index.lookup_name("retired term").unwrap(), "A:1");
    }

    #[test]
    fn test_counts() {
        let index = TermIndex::build(&sample_concepts());
        assert!(index.word_count() > 0);
        assert!(index.ngram_count() > 0);
    }
}
