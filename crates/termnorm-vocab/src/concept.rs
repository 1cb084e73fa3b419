//! The `Concept` type: one entry in a controlled vocabulary.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// One entry in a hierarchical controlled vocabulary.
///
/// A concept is created once during parsing and is immutable for the
/// lifetime of one loaded vocabulary snapshot. Reloading a vocabulary
/// replaces the whole concept set; individual concepts are never mutated
/// in place.
///
/// # Example
///
/// ```
/// use termnorm_vocab::Concept;
///
/// let concept = Concept::new("HP:0001250", "Seizure")
///     .with_definition("A seizure is an intermittent abnormality of nervous system physiology.")
///     .with_synonym("Epileptic seizure");
///
/// assert_eq!(concept.id, "HP:0001250");
/// assert!(!concept.is_obsolete);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concept {
    /// Stable identifier, unique within the vocabulary (e.g. `HP:0001250`).
    pub id: String,
    /// Primary display label, never empty.
    pub name: String,
    /// Free-text definition, empty if the source provides none.
    pub definition: String,
    /// Alternate labels for this concept.
    pub synonyms: Vec<String>,
    /// Ids of direct parent concepts (is-a targets).
    pub parents: HashSet<String>,
    /// Ids of direct child concepts.
    pub children: HashSet<String>,
    /// Whether the source marks this concept as deprecated. Obsolete
    /// concepts stay indexed; callers decide whether to filter them.
    pub is_obsolete: bool,
}

impl Concept {
    /// Creates a concept with the given id and name and no other metadata.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            definition: String::new(),
            synonyms: Vec::new(),
            parents: HashSet::new(),
            children: HashSet::new(),
            is_obsolete: false,
        }
    }

    /// Sets the definition.
    pub fn with_definition(mut self, definition: impl Into<String>) -> Self {
        self.definition = definition.into();
        self
    }

    /// Appends a synonym.
    pub fn with_synonym(mut self, synonym: impl Into<String>) -> Self {
        self.synonyms.push(synonym.into());
        self
    }

    /// Marks the concept as obsolete.
    pub fn with_obsolete(mut self, obsolete: bool) -> Self {
        self.is_obsolete = obsolete;
        self
    }

    /// Returns true if this concept has no recorded parents.
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// Returns true if this concept has no recorded children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concept_builder() {
        let concept = Concept::new("HP:0001250", "Seizure")
            .with_definition("An intermittent abnormality of nervous system physiology.")
            .with_synonym("Epileptic seizure")
            .with_synonym("Seizures");

        assert_eq!(concept.id, "HP:0001250");
        assert_eq!(concept.name, "Seizure");
        assert_eq!(concept.synonyms.len(), 2);
        assert!(!concept.is_obsolete);
    }

    #[test]
    fn test_root_and_leaf() {
        let mut concept = Concept::new("HP:0000001", "All");
        assert!(concept.is_root());
        assert!(concept.is_leaf());

        concept.children.insert("HP:0000118".to_string());
        assert!(concept.is_root());
        assert!(!concept.is_leaf());

        concept.parents.insert("HP:0000000".to_string());
        assert!(!concept.is_root());
    }

    #[test]
    fn test_obsolete_flag() {
        let concept = Concept::new("HP:0000057", "Obsolete term").with_obsolete(true);
        assert!(concept.is_obsolete);
    }
}
