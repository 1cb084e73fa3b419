//! Tiered matching of free text against the vocabulary.
//!
//! Four tiers run in a fixed priority order (exact name, exact synonym,
//! word-overlap partial, trigram-seeded fuzzy) and their results are
//! merged by a single dedup/rank step. Tiers never short-circuit: a query
//! can legitimately produce candidates in several tiers, and dedup keeps
//! only the best-scoring match per concept.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use termnorm_vocab::Concept;

use crate::index::{tokenize, ngrams, TermIndex};

/// Confidence weights and thresholds for the matching tiers.
///
/// These values are load-bearing policy: callers distinguish "no
/// normalization" from "low-confidence match" based on them.
pub mod scoring {
    /// Confidence for an exact case-folded name match.
    pub const EXACT_NAME_CONFIDENCE: f64 = 1.0;

    /// Confidence for an exact case-folded synonym match, regardless of
    /// which synonym matched.
    pub const EXACT_SYNONYM_CONFIDENCE: f64 = 0.95;

    /// Weight applied to word overlap against a concept's name.
    pub const PARTIAL_NAME_WEIGHT: f64 = 0.7;

    /// Weight applied to word overlap against a synonym.
    pub const PARTIAL_SYNONYM_WEIGHT: f64 = 0.65;

    /// Partial candidates must exceed this Jaccard overlap (strict).
    pub const PARTIAL_OVERLAP_FLOOR: f64 = 0.3;

    /// Weight applied to whole-string similarity in the fuzzy tier.
    pub const FUZZY_WEIGHT: f64 = 0.5;

    /// Fuzzy candidates must exceed this normalized edit similarity
    /// (strict).
    pub const FUZZY_SIMILARITY_FLOOR: f64 = 0.6;

    /// `normalize` only returns a match above this confidence (strict).
    pub const NORMALIZE_CONFIDENCE_FLOOR: f64 = 0.7;

    /// Maximum matches reported per item by `batch_normalize`.
    pub const BATCH_MATCH_LIMIT: usize = 5;
}

/// Which matching strategy produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchTier {
    /// Case-folded equality with a concept's primary name.
    Exact,
    /// Case-folded equality with one of a concept's synonyms.
    Synonym,
    /// Word-overlap match against a name or synonym.
    Partial,
    /// Normalized edit-similarity match against a concept name.
    Fuzzy,
}

impl std::fmt::Display for MatchTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            MatchTier::Exact => "exact",
            MatchTier::Synonym => "synonym",
            MatchTier::Partial => "partial",
            MatchTier::Fuzzy => "fuzzy",
        };
        f.write_str(label)
    }
}

/// One scored match between a query and a concept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermMatch {
    /// Id of the matched concept.
    pub concept_id: String,
    /// Primary name of the matched concept.
    pub name: String,
    /// Match strength in `[0.0, 1.0]`.
    pub confidence: f64,
    /// Tier that produced this match.
    pub tier: MatchTier,
    /// The literal name or synonym text the query matched against.
    pub matched_text: String,
}

/// Runs tiered matching over one vocabulary snapshot.
///
/// Borrows the concept map and indices; all methods are pure reads.
pub struct Matcher<'a> {
    concepts: &'a HashMap<String, Concept>,
    index: &'a TermIndex,
}

impl<'a> Matcher<'a> {
    /// Creates a matcher over the given concepts and indices.
    pub fn new(concepts: &'a HashMap<String, Concept>, index: &'a TermIndex) -> Self {
        Self { concepts, index }
    }

    /// Finds the best-matching concepts for a free-text phrase.
    ///
    /// All tiers contribute; results are deduplicated by concept id
    /// (keeping each concept's highest-confidence match), sorted by
    /// confidence descending with concept id as the deterministic
    /// tie-break, and truncated to `max_results`.
    ///
    /// An empty or whitespace-only query yields an empty list.
    pub fn search(&self, query: &str, max_results: usize) -> Vec<TermMatch> {
        let query = query.trim();
        if query.is_empty() || max_results == 0 {
            return Vec::new();
        }
        let folded = query.to_lowercase();

        let mut merged: HashMap<String, TermMatch> = HashMap::new();
        self.exact_tier(&folded, &mut merged);
        self.partial_tier(&folded, &mut merged);

        // The fuzzy tier is a fallback: only pay for it when the earlier
        // tiers left the result set short.
        if merged.len() < max_results {
            self.fuzzy_tier(&folded, &mut merged);
        }

        let mut results: Vec<TermMatch> = merged.into_values().collect();
        results.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.concept_id.cmp(&b.concept_id))
        });
        results.truncate(max_results);
        results
    }

    /// Maps a phrase to its single best concept, or `None`.
    ///
    /// Returns the top search result only when its confidence exceeds
    /// [`scoring::NORMALIZE_CONFIDENCE_FLOOR`]; a lower-confidence best
    /// match is reported as no normalization.
    pub fn normalize(&self, query: &str) -> Option<TermMatch> {
        self.search(query, scoring::BATCH_MATCH_LIMIT)
            .into_iter()
            .next()
            .filter(|m| m.confidence > scoring::NORMALIZE_CONFIDENCE_FLOOR)
    }

    /// Tier 1: exact case-folded lookups against the name and synonym
    /// indices.
    fn exact_tier(&self, folded: &str, merged: &mut HashMap<String, TermMatch>) {
        if let Some(id) = self.index.lookup_name(folded) {
            if let Some(concept) = self.concepts.get(id) {
                record(
                    merged,
                    TermMatch {
                        concept_id: concept.id.clone(),
                        name: concept.name.clone(),
                        confidence: scoring::EXACT_NAME_CONFIDENCE,
                        tier: MatchTier::Exact,
                        matched_text: concept.name.clone(),
                    },
                );
            }
        }

        if let Some(ids) = self.index.lookup_synonym(folded) {
            for id in ids {
                let Some(concept) = self.concepts.get(id) else {
                    continue;
                };
                let matched = concept
                    .synonyms
                    .iter()
                    .find(|s| s.to_lowercase() == folded)
                    .cloned()
                    .unwrap_or_else(|| folded.to_string());
                record(
                    merged,
                    TermMatch {
                        concept_id: concept.id.clone(),
                        name: concept.name.clone(),
                        confidence: scoring::EXACT_SYNONYM_CONFIDENCE,
                        tier: MatchTier::Synonym,
                        matched_text: matched,
                    },
                );
            }
        }
    }

    /// Tier 2: word-overlap scoring against names and synonyms.
    ///
    /// For each candidate concept only the best-scoring field is kept.
    /// The name and synonym weights differ deliberately, mirroring the
    /// flat synonym confidence of the exact tier.
    fn partial_tier(&self, folded: &str, merged: &mut HashMap<String, TermMatch>) {
        let query_words: HashSet<String> = tokenize(folded).into_iter().collect();
        if query_words.is_empty() {
            return;
        }

        let mut candidates: HashSet<&String> = HashSet::new();
        for word in &query_words {
            if let Some(ids) = self.index.lookup_word(word) {
                candidates.extend(ids);
            }
        }

        for id in candidates {
            let Some(concept) = self.concepts.get(id) else {
                continue;
            };

            let mut best: Option<(f64, &str)> = None;

            let name_words: HashSet<String> = tokenize(&concept.name).into_iter().collect();
            let overlap = jaccard(&query_words, &name_words);
            if overlap > scoring::PARTIAL_OVERLAP_FLOOR {
                best = Some((
                    scoring::PARTIAL_NAME_WEIGHT * overlap,
                    concept.name.as_str(),
                ));
            }

            for synonym in &concept.synonyms {
                let synonym_words: HashSet<String> = tokenize(synonym).into_iter().collect();
                let overlap = jaccard(&query_words, &synonym_words);
                if overlap > scoring::PARTIAL_OVERLAP_FLOOR {
                    let confidence = scoring::PARTIAL_SYNONYM_WEIGHT * overlap;
                    if best.map_or(true, |(score, _)| confidence > score) {
                        best = Some((confidence, synonym.as_str()));
                    }
                }
            }

            if let Some((confidence, text)) = best {
                record(
                    merged,
                    TermMatch {
                        concept_id: concept.id.clone(),
                        name: concept.name.clone(),
                        confidence,
                        tier: MatchTier::Partial,
                        matched_text: text.to_string(),
                    },
                );
            }
        }
    }

    /// Tier 3: trigram-seeded whole-string similarity against concept
    /// names.
    fn fuzzy_tier(&self, folded: &str, merged: &mut HashMap<String, TermMatch>) {
        let mut candidates: HashSet<&String> = HashSet::new();
        for gram in ngrams(folded) {
            if let Some(ids) = self.index.lookup_ngram(&gram) {
                candidates.extend(ids);
            }
        }

        for id in candidates {
            let Some(concept) = self.concepts.get(id) else {
                continue;
            };
            let similarity = strsim::normalized_levenshtein(folded, &concept.name.to_lowercase());
            if similarity > scoring::FUZZY_SIMILARITY_FLOOR {
                record(
                    merged,
                    TermMatch {
                        concept_id: concept.id.clone(),
                        name: concept.name.clone(),
                        confidence: scoring::FUZZY_WEIGHT * similarity,
                        tier: MatchTier::Fuzzy,
                        matched_text: concept.name.clone(),
                    },
                );
            }
        }
    }
}

/// Keeps the highest-confidence match per concept id.
fn record(merged: &mut HashMap<String, TermMatch>, candidate: TermMatch) {
    match merged.get(&candidate.concept_id) {
        Some(existing) if existing.confidence >= candidate.confidence => {}
        _ => {
            merged.insert(candidate.concept_id.clone(), candidate);
        }
    }
}

/// Jaccard overlap of two word sets. Empty-union pairs score 0.0.
fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seizure_vocabulary() -> HashMap<String, Concept> {
        let mut concepts = HashMap::new();
        concepts.insert(
            "HP:0001250".to_string(),
            Concept::new("HP:0001250", "Seizures").with_synonym("Epileptic seizure"),
        );
        concepts.insert(
            "HP:0002360".to_string(),
            Concept::new("HP:0002360", "Sleep disturbance"),
        );
        concepts
    }

    fn search(concepts: &HashMap<String, Concept>, query: &str, max: usize) -> Vec<TermMatch> {
        let index = TermIndex::build(concepts);
        let matcher = Matcher::new(concepts, &index);
        let results = matcher.search(query, max);
        for m in &results {
            assert!((0.0..=1.0).contains(&m.confidence));
        }
        results
    }

    #[test]
    fn test_exact_name_match() {
        let concepts = seizure_vocabulary();
        let results = search(&concepts, "seizures", 10);

        assert_eq!(results[0].concept_id, "HP:0001250");
        assert_eq!(results[0].confidence, 1.0);
        assert_eq!(results[0].tier, MatchTier::Exact);
        assert_eq!(results[0].matched_text, "Seizures");
    }

    #[test]
    fn test_exact_synonym_match() {
        let concepts = seizure_vocabulary();
        let results = search(&concepts, "Epileptic Seizure", 10);

        assert_eq!(results[0].concept_id, "HP:0001250");
        assert_eq!(results[0].confidence, 0.95);
        assert_eq!(results[0].tier, MatchTier::Synonym);
        assert_eq!(results[0].matched_text, "Epileptic seizure");
    }

    #[test]
    fn test_fuzzy_match_on_typo() {
        let concepts = seizure_vocabulary();
        let results = search(&concepts, "seizur", 10);

        let m = results
            .iter()
            .find(|m| m.concept_id == "HP:0001250")
            .unwrap();
        assert_eq!(m.tier, MatchTier::Fuzzy);
        assert!(m.confidence > 0.3 && m.confidence < 0.5);
    }

    #[test]
    fn test_no_match_for_garbage() {
        let concepts = seizure_vocabulary();
        assert!(search(&concepts, "xyzabc", 10).is_empty());
    }

    #[test]
    fn test_empty_query_yields_nothing() {
        let concepts = seizure_vocabulary();
        assert!(search(&concepts, "", 10).is_empty());
        assert!(search(&concepts, "   ", 10).is_empty());

        let index = TermIndex::build(&concepts);
        assert!(Matcher::new(&concepts, &index).normalize("  ").is_none());
    }

    #[test]
    fn test_normalize_threshold() {
        let concepts = seizure_vocabulary();
        let index = TermIndex::build(&concepts);
        let matcher = Matcher::new(&concepts, &index);

        // Exact match clears the 0.7 floor.
        let m = matcher.normalize("seizures").unwrap();
        assert_eq!(m.concept_id, "HP:0001250");
        assert_eq!(m.confidence, 1.0);

        // The fuzzy match for a typo stays below the floor.
        assert!(matcher.normalize("seizur").is_none());
        assert!(matcher.normalize("xyzabc").is_none());
    }

    #[test]
    fn test_partial_overlap_strictly_above_floor() {
        let mut concepts = HashMap::new();
        // Name tokens: 8 words. Query shares 3 of them with 5 query
        // words: Jaccard = 3 / 10 = 0.3 exactly, which must be excluded.
        concepts.insert(
            "T:1".to_string(),
            Concept::new(
                "T:1",
                "alpha beta gamma delta epsilon zeta eta theta",
            ),
        );
        let results = search(&concepts, "alpha beta gamma iota kappa", 10);
        assert!(
            !results.iter().any(|m| m.tier == MatchTier::Partial),
            "overlap of exactly 0.3 must not qualify"
        );

        // Dropping one non-shared query word: 3 / 9 ≈ 0.33 qualifies.
        let results = search(&concepts, "alpha beta gamma kappa", 10);
        let m = results.iter().find(|m| m.tier == MatchTier::Partial).unwrap();
        assert_eq!(m.concept_id, "T:1");
        assert!((m.confidence - 0.7 * (3.0 / 9.0)).abs() < 1e-9);
    }

    #[test]
    fn test_partial_keeps_best_field_only() {
        let mut concepts = HashMap::new();
        concepts.insert(
            "T:1".to_string(),
            Concept::new("T:1", "muscle weakness")
                .with_synonym("muscular weakness generalized"),
        );
        let results = search(&concepts, "weakness muscle", 10);

        // Name overlap is 1.0 (0.7) and beats any synonym score; only one
        // entry survives for the concept.
        let matches: Vec<_> = results.iter().filter(|m| m.concept_id == "T:1").collect();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].matched_text, "muscle weakness");
        assert!((matches[0].confidence - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_dedup_keeps_highest_confidence() {
        let mut concepts = HashMap::new();
        // The query equals the name, so the exact, partial, and fuzzy
        // tiers all qualify with different confidences.
        concepts.insert(
            "T:1".to_string(),
            Concept::new("T:1", "cataract early onset").with_synonym("cataracts"),
        );
        let results = search(&concepts, "cataract early onset", 10);

        let matches: Vec<_> = results.iter().filter(|m| m.concept_id == "T:1").collect();
        assert_eq!(matches.len(), 1, "one entry per concept after dedup");
        assert_eq!(matches[0].tier, MatchTier::Exact);
        assert_eq!(matches[0].confidence, 1.0);
    }

    #[test]
    fn test_fuzzy_suppressed_when_enough_results() {
        let mut concepts = HashMap::new();
        concepts.insert("T:1".to_string(), Concept::new("T:1", "anemia"));
        concepts.insert("T:2".to_string(), Concept::new("T:2", "anemias"));

        // max_results = 1: the exact match fills the quota, fuzzy never
        // runs, so T:2 does not appear.
        let results = search(&concepts, "anemia", 1);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].concept_id, "T:1");

        // With room to spare the fuzzy tier surfaces the variant too.
        let results = search(&concepts, "anemia", 10);
        assert!(results.iter().any(|m| m.concept_id == "T:2"));
    }

    #[test]
    fn test_ranking_is_deterministic() {
        let mut concepts = HashMap::new();
        concepts.insert("T:1".to_string(), Concept::new("T:1", "fever chills"));
        concepts.insert("T:2".to_string(), Concept::new("T:2", "fever sweats"));

        let results = search(&concepts, "fever aches", 10);
        // Equal partial scores: tie broken by concept id ascending.
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].concept_id, "T:1");
        assert_eq!(results[1].concept_id, "T:2");
    }

    #[test]
    fn test_max_results_truncates() {
        let mut concepts = HashMap::new();
        for i in 0..8 {
            concepts.insert(
                format!("T:{i}"),
                Concept::new(format!("T:{i}"), format!("fever variant {i}")),
            );
        }
        let results = search(&concepts, "fever variant", 3);
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn test_tier_display() {
        assert_eq!(MatchTier::Exact.to_string(), "exact");
        assert_eq!(MatchTier::Synonym.to_string(), "synonym");
        assert_eq!(MatchTier::Partial.to_string(), "partial");
        assert_eq!(MatchTier::Fuzzy.to_string(), "fuzzy");
    }
}
