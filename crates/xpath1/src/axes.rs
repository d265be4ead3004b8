//! Pure functions collecting the nodes along each XPath axis.
//!
//! Every collector returns nodes in axis order: document order for forward
//! axes, nearest-first for reverse axes. Proximity positions in predicates are
//! the 1-based index into that order.

use crate::ast::Axis;
use crate::datasource::{DataSourceNode, NodeType};

pub fn collect<'a, N: DataSourceNode<'a>>(axis: Axis, node: N) -> Vec<N> {
    let mut results = Vec::new();
    match axis {
        Axis::SelfAxis => results.push(node),
        Axis::Child => results.extend(node.children()),
        Axis::Attribute => results.extend(node.attributes()),
        Axis::Parent => results.extend(node.parent()),
        Axis::Descendant => collect_descendants(node, &mut results),
        Axis::DescendantOrSelf => {
            results.push(node);
            collect_descendants(node, &mut results);
        }
        Axis::Ancestor => collect_ancestors(node, &mut results),
        Axis::AncestorOrSelf => {
            results.push(node);
            collect_ancestors(node, &mut results);
        }
        Axis::FollowingSibling => results.extend(following_siblings(node)),
        Axis::PrecedingSibling => {
            let mut preceding = preceding_siblings(node);
            preceding.reverse();
            results = preceding;
        }
        Axis::Following => collect_following(node, &mut results),
        Axis::Preceding => collect_preceding(node, &mut results),
    }
    results
}

/// Pre-order walk, which is document order for a subtree.
fn collect_descendants<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    let mut stack: Vec<N> = node.children().collect();
    stack.reverse();
    while let Some(current) = stack.pop() {
        results.push(current);
        let first = stack.len();
        stack.extend(current.children());
        stack[first..].reverse();
    }
}

fn collect_ancestors<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    let mut current = node.parent();
    while let Some(p) = current {
        results.push(p);
        current = p.parent();
    }
}

fn is_attribute<'a, N: DataSourceNode<'a>>(node: N) -> bool {
    node.node_type() == NodeType::Attribute
}

fn following_siblings<'a, N: DataSourceNode<'a>>(node: N) -> Vec<N> {
    if is_attribute(node) {
        return Vec::new();
    }
    match node.parent() {
        Some(parent) => parent.children().skip_while(|c| *c != node).skip(1).collect(),
        None => Vec::new(),
    }
}

/// Preceding siblings in document order.
fn preceding_siblings<'a, N: DataSourceNode<'a>>(node: N) -> Vec<N> {
    if is_attribute(node) {
        return Vec::new();
    }
    match node.parent() {
        Some(parent) => parent.children().take_while(|c| *c != node).collect(),
        None => Vec::new(),
    }
}

fn collect_following<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    // The following axis of an attribute starts with its owner's content.
    let mut current = if is_attribute(node) {
        match node.parent() {
            Some(owner) => {
                collect_descendants(owner, results);
                Some(owner)
            }
            None => None,
        }
    } else {
        Some(node)
    };
    while let Some(n) = current {
        for sibling in following_siblings(n) {
            results.push(sibling);
            collect_descendants(sibling, results);
        }
        current = n.parent();
    }
}

fn collect_preceding<'a, N: DataSourceNode<'a>>(node: N, results: &mut Vec<N>) {
    let mut current = if is_attribute(node) { node.parent() } else { Some(node) };
    while let Some(n) = current {
        for sibling in preceding_siblings(n).into_iter().rev() {
            let mut subtree = vec![sibling];
            collect_descendants(sibling, &mut subtree);
            results.extend(subtree.into_iter().rev());
        }
        current = n.parent();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::tests::create_test_tree;

    fn ids<'a>(nodes: Vec<crate::datasource::tests::MockNode<'a>>) -> Vec<usize> {
        nodes.into_iter().map(|n| n.id).collect()
    }

    #[test]
    fn descendants_are_in_document_order() {
        let tree = create_test_tree();
        let found = ids(collect(Axis::Descendant, tree.node(3)));
        assert_eq!(found, vec![5, 7, 8, 10, 11, 13]);
    }

    #[test]
    fn reverse_axes_are_nearest_first() {
        let tree = create_test_tree();
        assert_eq!(ids(collect(Axis::Ancestor, tree.node(10))), vec![8, 3, 1, 0]);
        assert_eq!(ids(collect(Axis::PrecedingSibling, tree.node(11))), vec![8, 5]);
    }

    #[test]
    fn preceding_excludes_ancestors() {
        let tree = create_test_tree();
        // From the second item's text: first item's text, then first item.
        assert_eq!(ids(collect(Axis::Preceding, tree.node(10))), vec![7, 5]);
    }

    #[test]
    fn following_walks_up_the_tree() {
        let tree = create_test_tree();
        assert_eq!(
            ids(collect(Axis::Following, tree.node(11))),
            vec![14, 15, 16, 17, 18, 20]
        );
    }

    #[test]
    fn attributes_have_no_siblings() {
        let tree = create_test_tree();
        assert!(collect(Axis::FollowingSibling, tree.node(6)).is_empty());
        assert_eq!(ids(collect(Axis::Parent, tree.node(6))), vec![5]);
    }
}
