//! Parser for OBO-graph JSON vocabulary sources.
//!
//! Reads the node/edge graph export used by ontologies like HPO and MONDO
//! (`{"graphs": [{"nodes": [...], "edges": [...]}]}`) and produces a flat
//! map of normalized [`Concept`] records with hierarchy links applied.
//!
//! Malformed individual nodes and edges are skipped with a debug log; only
//! a file that cannot be read, is not valid JSON, or carries no node
//! collection at all aborts the load.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, info};

use crate::concept::Concept;
use crate::error::{VocabError, VocabResult};
use crate::relations::{self, Edge};

/// IRI suffix identifying the IAO "textual definition" annotation property.
const DEFINITION_PREDICATE_SUFFIX: &str = "IAO_0000115";

#[derive(Debug, Deserialize)]
struct GraphDocument {
    #[serde(default)]
    graphs: Vec<RawGraph>,
}

#[derive(Debug, Deserialize)]
struct RawGraph {
    #[serde(default)]
    nodes: Vec<RawNode>,
    #[serde(default)]
    edges: Vec<RawEdge>,
}

#[derive(Debug, Deserialize)]
struct RawNode {
    id: Option<String>,
    lbl: Option<String>,
    #[serde(rename = "type")]
    node_type: Option<String>,
    meta: Option<RawMeta>,
}

#[derive(Debug, Default, Deserialize)]
struct RawMeta {
    definition: Option<RawValue>,
    #[serde(default)]
    synonyms: Vec<RawValue>,
    #[serde(default)]
    deprecated: bool,
    #[serde(default, rename = "basicPropertyValues")]
    basic_property_values: Vec<RawPropertyValue>,
}

#[derive(Debug, Deserialize)]
struct RawValue {
    val: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPropertyValue {
    pred: Option<String>,
    val: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawEdge {
    sub: Option<String>,
    pred: Option<String>,
    obj: Option<String>,
}

/// Compacts an OBO-style IRI to a CURIE.
///
/// `http://purl.obolibrary.org/obo/HP_0001250` becomes `HP:0001250`.
/// Ids that are already CURIEs, or that do not follow the `PREFIX_LOCAL`
/// convention, are returned unchanged.
pub fn compact_id(id: &str) -> String {
    let local = id
        .rsplit_once(['/', '#'])
        .map(|(_, tail)| tail)
        .unwrap_or(id);
    match local.split_once('_') {
        Some((prefix, rest)) if !prefix.is_empty() && !rest.is_empty() => {
            format!("{prefix}:{rest}")
        }
        _ => local.to_string(),
    }
}

/// Parses a vocabulary source file into a concept map.
///
/// # Errors
///
/// Returns [`VocabError::Io`] if the file cannot be read,
/// [`VocabError::Parse`] if it is not valid JSON, and
/// [`VocabError::EmptyVocabulary`] if it carries no node collection.
pub fn parse_file(path: impl AsRef<Path>) -> VocabResult<HashMap<String, Concept>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| VocabError::io_error(path, e))?;
    let concepts = parse_str(&text)?;
    info!(
        path = %path.display(),
        concepts = concepts.len(),
        "parsed vocabulary source"
    );
    Ok(concepts)
}

/// Parses a vocabulary source from an in-memory JSON string.
pub fn parse_str(text: &str) -> VocabResult<HashMap<String, Concept>> {
    let document: GraphDocument = serde_json::from_str(text)?;

    let node_count: usize = document.graphs.iter().map(|g| g.nodes.len()).sum();
    if node_count == 0 {
        return Err(VocabError::EmptyVocabulary);
    }

    let mut concepts = HashMap::with_capacity(node_count);
    let mut edges = Vec::new();

    for graph in &document.graphs {
        for node in &graph.nodes {
            if let Some(concept) = convert_node(node) {
                concepts.insert(concept.id.clone(), concept);
            }
        }
        for edge in &graph.edges {
            if let (Some(sub), Some(pred), Some(obj)) = (&edge.sub, &edge.pred, &edge.obj) {
                edges.push(Edge::new(compact_id(sub), pred.clone(), compact_id(obj)));
            }
        }
    }

    relations::apply_edges(&mut concepts, &edges);
    Ok(concepts)
}

/// Converts one raw node into a concept, or `None` if the node is not a
/// usable vocabulary entry.
fn convert_node(node: &RawNode) -> Option<Concept> {
    if let Some(node_type) = &node.node_type {
        if node_type != "CLASS" {
            return None;
        }
    }

    let id = match node.id.as_deref() {
        Some(id) if !id.is_empty() => compact_id(id),
        _ => {
            debug!("skipping node without id");
            return None;
        }
    };
    let name = match node.lbl.as_deref() {
        Some(lbl) if !lbl.is_empty() => lbl.to_string(),
        _ => {
            debug!(id = %id, "skipping node without label");
            return None;
        }
    };

    let mut concept = Concept::new(id, name);

    if let Some(meta) = &node.meta {
        concept.definition = extract_definition(meta);
        concept.synonyms = meta
            .synonyms
            .iter()
            .filter_map(|s| s.val.clone())
            .filter(|s| s != &concept.name)
            .collect();
        concept.is_obsolete = meta.deprecated;
    }

    Some(concept)
}

/// Resolves the definition for a node.
///
/// Prefers the dedicated `definition` block; falls back to the first basic
/// property value whose predicate is the IAO definition annotation.
fn extract_definition(meta: &RawMeta) -> String {
    if let Some(val) = meta.definition.as_ref().and_then(|d| d.val.clone()) {
        return val;
    }
    meta.basic_property_values
        .iter()
        .find(|pv| {
            pv.pred
                .as_deref()
                .is_some_and(|p| p.ends_with(DEFINITION_PREDICATE_SUFFIX))
        })
        .and_then(|pv| pv.val.clone())
        .unwrap_or_default()
}
