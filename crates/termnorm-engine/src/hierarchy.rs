//! Bounded hierarchy traversal over the concept graph.
//!
//! The vocabulary is a DAG: concepts can have several parents and several
//! children. The navigator answers "show me the surroundings of this
//! concept" queries as depth-bounded ancestor and descendant trees, and
//! provides unbounded transitive-closure lookups for callers that need
//! the full id set.
//!
//! Traversal is defensive about cycles. The source vocabulary is
//! nominally acyclic, but a malformed export must not hang or overflow
//! the stack, so a concept already on the current path is never expanded
//! again at a deeper level.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use termnorm_vocab::Concept;

/// Flat description of one concept, used as the root of a hierarchy view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptSummary {
    /// Concept id.
    pub id: String,
    /// Primary name.
    pub name: String,
    /// Definition, empty if the source has none.
    pub definition: String,
    /// Whether the concept is deprecated.
    pub is_obsolete: bool,
}

impl From<&Concept> for ConceptSummary {
    fn from(concept: &Concept) -> Self {
        Self {
            id: concept.id.clone(),
            name: concept.name.clone(),
            definition: concept.definition.clone(),
            is_obsolete: concept.is_obsolete,
        }
    }
}

/// One node in an ancestor or descendant tree.
///
/// `children` holds the next level away from the queried concept: for a
/// descendant tree these are child concepts, for an ancestor tree the
/// next ancestors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyNode {
    /// Concept id.
    pub id: String,
    /// Primary name.
    pub name: String,
    /// Distance from the queried concept (direct relations are depth 1).
    pub depth: usize,
    /// The next bounded level, empty at the depth limit or at terminals.
    pub children: Vec<HierarchyNode>,
}

/// The surroundings of one concept: its summary plus bounded ancestor and
/// descendant trees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyView {
    /// The queried concept.
    pub concept: ConceptSummary,
    /// Direct parents and their ancestors, up to the depth bound.
    pub ancestors: Vec<HierarchyNode>,
    /// Direct children and their descendants, up to the depth bound.
    pub descendants: Vec<HierarchyNode>,
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Up,
    Down,
}

/// Traverses the concept hierarchy of one vocabulary snapshot.
pub struct HierarchyNavigator<'a> {
    concepts: &'a HashMap<String, Concept>,
}

impl<'a> HierarchyNavigator<'a> {
    /// Creates a navigator over the given concept map.
    pub fn new(concepts: &'a HashMap<String, Concept>) -> Self {
        Self { concepts }
    }

    /// Builds the bounded hierarchy view for a concept.
    ///
    /// `max_depth` bounds how many levels are expanded in each direction;
    /// breadth at each level is unrestricted. Roots (no parents) and
    /// leaves (no children) simply produce empty trees on that side.
    /// Returns `None` for an unknown concept id.
    pub fn view(&self, concept_id: &str, max_depth: usize) -> Option<HierarchyView> {
        let concept = self.concepts.get(concept_id)?;

        let mut path: HashSet<String> = HashSet::from([concept_id.to_string()]);
        let ancestors = self.expand(&concept.parents, 1, max_depth, Direction::Up, &mut path);

        let mut path: HashSet<String> = HashSet::from([concept_id.to_string()]);
        let descendants = self.expand(&concept.children, 1, max_depth, Direction::Down, &mut path);

        Some(HierarchyView {
            concept: ConceptSummary::from(concept),
            ancestors,
            descendants,
        })
    }

    /// Expands one level of the tree. Ids already on the current path are
    /// skipped, which terminates traversal over cyclic input.
    fn expand(
        &self,
        ids: &HashSet<String>,
        depth: usize,
        max_depth: usize,
        direction: Direction,
        path: &mut HashSet<String>,
    ) -> Vec<HierarchyNode> {
        if depth > max_depth {
            return Vec::new();
        }

        let mut sorted: Vec<&String> = ids.iter().filter(|id| !path.contains(*id)).collect();
        sorted.sort_unstable();

        let mut nodes = Vec::with_capacity(sorted.len());
        for id in sorted {
            let Some(concept) = self.concepts.get(id) else {
                continue;
            };

            path.insert(id.clone());
            let next_ids = match direction {
                Direction::Up => &concept.parents,
                Direction::Down => &concept.children,
            };
            let children = self.expand(next_ids, depth + 1, max_depth, direction, path);
            path.remove(id);

            nodes.push(HierarchyNode {
                id: id.clone(),
                name: concept.name.clone(),
                depth,
                children,
            });
        }
        nodes
    }

    /// Returns every transitive ancestor id of a concept, via BFS.
    ///
    /// The concept itself is not included. Diamond-shaped inheritance
    /// yields each ancestor once; cycles terminate.
    pub fn ancestor_ids(&self, concept_id: &str) -> HashSet<String> {
        self.closure(concept_id, Direction::Up)
    }

    /// Returns every transitive descendant id of a concept, via BFS.
    ///
    /// The concept itself is not included.
    pub fn descendant_ids(&self, concept_id: &str) -> HashSet<String> {
        self.closure(concept_id, Direction::Down)
    }

    fn closure(&self, concept_id: &str, direction: Direction) -> HashSet<String> {
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        queue.push_back(concept_id);

        while let Some(current) = queue.pop_front() {
            let Some(concept) = self.concepts.get(current) else {
                continue;
            };
            let next_ids = match direction {
                Direction::Up => &concept.parents,
                Direction::Down => &concept.children,
            };
            for id in next_ids {
                if id != concept_id && visited.insert(id.clone()) {
                    queue.push_back(id);
                }
            }
        }
        visited
    }
}
