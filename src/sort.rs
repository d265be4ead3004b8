//! Canonical document order for node lists.
//!
//! Attached nodes (those whose ancestor chain reaches the document node)
//! are ordered by their preorder position; attributes follow their owner
//! element. Detached nodes keep their first-seen order after all attached
//! ones. Duplicates are removed by identity.

use crate::error::NodesError;
use arbor_dom::{DocumentRef, Node};
use std::collections::{HashMap, HashSet};

/// Preorder positions of every attached node, from one traversal.
fn preorder_positions(document: &DocumentRef) -> HashMap<Node, usize> {
    let mut positions = HashMap::new();
    let mut stack = vec![document.root()];
    while let Some(node) = stack.pop() {
        let next = positions.len();
        positions.insert(node.clone(), next);
        for attribute in node.attributes() {
            let next = positions.len();
            positions.insert(attribute, next);
        }
        stack.extend(node.children().into_iter().rev());
    }
    positions
}

/// Returns `nodes` deduplicated and in document order. Every node must
/// belong to `document`.
pub fn sort_nodes(document: &DocumentRef, nodes: &[Node]) -> Result<Vec<Node>, NodesError> {
    if let Some(index) = nodes.iter().position(|n| !n.belongs_to(document)) {
        return Err(NodesError::InvalidElements(format!(
            "node at index {} belongs to a different document",
            index
        )));
    }
    if nodes.len() < 2 {
        return Ok(nodes.to_vec());
    }

    let positions = preorder_positions(document);
    let mut seen = HashSet::with_capacity(nodes.len());
    let mut attached = Vec::with_capacity(nodes.len());
    let mut detached = Vec::new();
    for node in nodes {
        if !seen.insert(node) {
            continue;
        }
        match positions.get(node) {
            Some(&position) => attached.push((position, node.clone())),
            None => detached.push(node.clone()),
        }
    }
    attached.sort_by_key(|(position, _)| *position);
    log::trace!(
        "Sorted {} nodes ({} attached, {} detached)",
        nodes.len(),
        attached.len(),
        detached.len()
    );
    Ok(attached
        .into_iter()
        .map(|(_, node)| node)
        .chain(detached)
        .collect())
}
