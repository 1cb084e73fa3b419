//! Relationship building: deriving parent/child adjacency from raw edges.
//!
//! The vocabulary source describes hierarchy as directed edges between
//! node ids. This module filters those edges down to subsumption ("is-a")
//! relations and applies them to an already-parsed concept map.

use std::collections::HashMap;

use tracing::debug;

use crate::concept::Concept;

/// One directed edge from the raw vocabulary graph.
///
/// `subject` is the child side of the relation and `object` the parent
/// side, matching the OBO-graph convention (`sub pred obj`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    /// Child concept id.
    pub subject: String,
    /// Relation label (e.g. `is_a`).
    pub predicate: String,
    /// Parent concept id.
    pub object: String,
}

impl Edge {
    /// Creates an edge from its three components.
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }
}

/// Returns true if the predicate denotes a subsumption relation.
///
/// OBO-graph exports label these edges `is_a`; OWL-derived exports use the
/// `rdfs:subClassOf` IRI. Every other relation type (part-of, regulates,
/// cross-references) is outside the scope of this engine.
pub fn is_subsumption(predicate: &str) -> bool {
    predicate == "is_a" || predicate.ends_with("subClassOf")
}

/// Applies subsumption edges to the concept map.
///
/// For each honored edge `child -> parent`, the child gains the parent in
/// its `parents` set and the parent gains the child in its `children` set.
/// Edges with non-subsumption predicates, or edges naming ids absent from
/// the concept map, are ignored.
pub fn apply_edges(concepts: &mut HashMap<String, Concept>, edges: &[Edge]) {
    let mut applied = 0usize;

    for edge in edges {
        if !is_subsumption(&edge.predicate) {
            continue;
        }
        if !concepts.contains_key(&edge.subject) || !concepts.contains_key(&edge.object) {
            debug!(
                child = %edge.subject,
                parent = %edge.object,
                "skipping edge referencing unknown concept"
            );
            continue;
        }

        if let Some(child) = concepts.get_mut(&edge.subject) {
            child.parents.insert(edge.object.clone());
        }
        if let Some(parent) = concepts.get_mut(&edge.object) {
            parent.children.insert(edge.subject.clone());
        }
        applied += 1;
    }

    debug!(total = edges.len(), applied, "applied hierarchy edges");
}
