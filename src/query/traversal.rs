//! Filtering and tree-walking operations that produce new collections.

use crate::error::NodesError;
use crate::nodes::Nodes;
use crate::selector::Selector;
use crate::sort::sort_nodes;
use arbor_dom::Node;
use std::collections::HashSet;

/// Clamps a possibly negative (end-relative) index into `0..=len`.
fn bound(index: isize, len: usize) -> usize {
    if index < 0 {
        len.saturating_sub(index.unsigned_abs())
    } else {
        index.unsigned_abs().min(len)
    }
}

impl Nodes {
    /// Held nodes for which the selector test equals `keep`. Expressions are
    /// evaluated with each node as context, callbacks are asked per node,
    /// literal nodes are tested by membership.
    fn select_held(&self, selector: &Selector<'_>, keep: bool) -> Result<Vec<Node>, NodesError> {
        let nodes = self.to_vec();
        let mut selected = Vec::new();
        match selector {
            Selector::Expression(expr) => {
                for node in nodes {
                    if self.matches(expr, Some(&node))? == keep {
                        selected.push(node);
                    }
                }
            }
            Selector::Callback(callback) => {
                for node in nodes {
                    let hit = callback(Some(&node)).is_some_and(|found| !found.is_empty());
                    if hit == keep {
                        selected.push(node);
                    }
                }
            }
            literal => {
                let members: HashSet<Node> = self.resolve(literal, None)?.into_iter().collect();
                selected.extend(nodes.into_iter().filter(|n| members.contains(n) == keep));
            }
        }
        Ok(selected)
    }

    fn select_held_by(&self, predicate: impl Fn(&Node, usize) -> bool, keep: bool) -> Vec<Node> {
        self.to_vec()
            .into_iter()
            .enumerate()
            .filter(|(index, node)| predicate(node, *index) == keep)
            .map(|(_, node)| node)
            .collect()
    }

    /// Spawns a collection of `nodes` deduplicated in document order.
    fn spawn_sorted(&self, nodes: Vec<Node>) -> Result<Nodes, NodesError> {
        let sorted = sort_nodes(&self.document(), &nodes)?;
        self.spawn_with(sorted)
    }

    pub fn filter<'a>(&self, selector: impl Into<Selector<'a>>) -> Result<Nodes, NodesError> {
        let kept = self.select_held(&selector.into(), true)?;
        self.spawn_with(kept)
    }

    /// Keeps the nodes for which `predicate(node, index)` holds.
    pub fn filter_by(&self, predicate: impl Fn(&Node, usize) -> bool) -> Result<Nodes, NodesError> {
        self.spawn_with(self.select_held_by(predicate, true))
    }

    pub fn not<'a>(&self, selector: impl Into<Selector<'a>>) -> Result<Nodes, NodesError> {
        let kept = self.select_held(&selector.into(), false)?;
        self.spawn_with(kept)
    }

    pub fn not_by(&self, predicate: impl Fn(&Node, usize) -> bool) -> Result<Nodes, NodesError> {
        self.spawn_with(self.select_held_by(predicate, false))
    }

    /// True if any held node matches the expression.
    pub fn is(&self, selector: &str) -> Result<bool, NodesError> {
        for node in self.iter() {
            if self.matches(selector, Some(&node))? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Nodes from `start` up to, not including, `end`. Negative positions
    /// count from the end; a missing `end` means the rest.
    pub fn slice(&self, start: isize, end: Option<isize>) -> Result<Nodes, NodesError> {
        let nodes = self.to_vec();
        let start = bound(start, nodes.len());
        let end = end.map_or(nodes.len(), |end| bound(end, nodes.len()));
        let sliced = if start < end {
            nodes[start..end].to_vec()
        } else {
            Vec::new()
        };
        self.spawn_with(sliced)
    }

    /// The node at `index` (negative counts from the end), or nothing.
    pub fn eq(&self, index: isize) -> Result<Nodes, NodesError> {
        if index == -1 {
            return self.slice(-1, None);
        }
        self.slice(index, Some(index + 1))
    }

    pub fn first(&self) -> Result<Nodes, NodesError> {
        self.eq(0)
    }

    pub fn last(&self) -> Result<Nodes, NodesError> {
        self.eq(-1)
    }

    /// Element children of every held node, optionally filtered by an
    /// expression tested against each child.
    pub fn children(&self, filter: Option<&str>) -> Result<Nodes, NodesError> {
        let mut found = Vec::new();
        for node in self.iter() {
            for child in node.element_children() {
                if filter.map_or(Ok(true), |expr| self.matches(expr, Some(&child)))? {
                    found.push(child);
                }
            }
        }
        self.spawn_sorted(found)
    }

    /// The distinct parents of the held nodes.
    pub fn parent(&self) -> Result<Nodes, NodesError> {
        let parents = self.iter().filter_map(|node| node.parent()).collect();
        self.spawn_sorted(parents)
    }

    /// The next element sibling of every held node.
    pub fn next(&self) -> Result<Nodes, NodesError> {
        let found = self.iter().filter_map(|node| node.next_element_sibling()).collect();
        self.spawn_sorted(found)
    }

    /// The previous element sibling of every held node.
    pub fn prev(&self) -> Result<Nodes, NodesError> {
        let found = self
            .iter()
            .filter_map(|node| node.previous_element_sibling())
            .collect();
        self.spawn_sorted(found)
    }

    /// All element siblings of the held nodes, excluding the nodes themselves.
    pub fn siblings(&self) -> Result<Nodes, NodesError> {
        let held: HashSet<Node> = self.iter().collect();
        let mut found = Vec::new();
        for node in self.iter() {
            if let Some(parent) = node.parent() {
                found.extend(
                    parent
                        .element_children()
                        .into_iter()
                        .filter(|sibling| !held.contains(sibling)),
                );
            }
        }
        self.spawn_sorted(found)
    }

    /// The held nodes plus the resolved selector, in document order.
    /// Expressions are resolved against the whole document.
    pub fn add<'a>(&self, selector: impl Into<Selector<'a>>) -> Result<Nodes, NodesError> {
        let mut nodes = self.to_vec();
        nodes.extend(self.resolve(&selector.into(), None)?);
        self.spawn_sorted(nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HTML: &str = "<html><body><div id=\"first\"/><div id=\"second\" class=\"middle\"/>\
                        <div id=\"third\" class=\"middle\"/><div id=\"fourth\"/><p/></body></html>";

    fn divs() -> Nodes {
        Nodes::from_source(HTML, "xml").unwrap().find("//div").unwrap()
    }

    fn ids(nodes: &Nodes) -> Vec<String> {
        nodes.iter().filter_map(|n| n.attribute("id")).collect()
    }

    #[test]
    fn filter_and_not_by_expression() {
        let divs = divs();
        assert_eq!(ids(&divs.filter("@class = 'middle'").unwrap()), ["second", "third"]);
        assert_eq!(ids(&divs.not("@class = 'middle' or @id = 'first'").unwrap()), ["fourth"]);
        assert!(divs.is("@id = 'third'").unwrap());
        assert!(!divs.is("self::p").unwrap());
    }

    #[test]
    fn filter_by_predicate_uses_positions() {
        let divs = divs();
        let kept = divs
            .filter_by(|node, index| index == 1 || node.attribute("id").as_deref() == Some("fourth"))
            .unwrap();
        assert_eq!(ids(&kept), ["second", "fourth"]);
        assert_eq!(ids(&divs.not_by(|_, index| index > 0).unwrap()), ["first"]);
    }

    #[test]
    fn filter_by_literal_nodes() {
        let divs = divs();
        let third = divs.get(2).unwrap();
        assert_eq!(ids(&divs.filter(&third).unwrap()), ["third"]);
        assert_eq!(divs.not(&third).unwrap().len(), 3);
    }

    #[test]
    fn slices_with_negative_bounds() {
        let divs = divs();
        assert_eq!(ids(&divs.slice(0, Some(2)).unwrap()), ["first", "second"]);
        assert_eq!(ids(&divs.slice(1, Some(-1)).unwrap()), ["second", "third"]);
        assert_eq!(ids(&divs.slice(-2, None).unwrap()), ["third", "fourth"]);
        assert!(divs.slice(3, Some(1)).unwrap().is_empty());
        assert_eq!(ids(&divs.eq(-2).unwrap()), ["third"]);
        assert!(divs.eq(9).unwrap().is_empty());
        assert_eq!(ids(&divs.first().unwrap()), ["first"]);
        assert_eq!(ids(&divs.last().unwrap()), ["fourth"]);
    }

    #[test]
    fn walks_the_tree() {
        let divs = divs();
        let body = divs.parent().unwrap();
        assert_eq!(body.len(), 1);
        assert_eq!(body.children(None).unwrap().len(), 5);
        assert_eq!(body.children(Some("self::p")).unwrap().len(), 1);
        assert_eq!(ids(&divs.first().unwrap().next().unwrap()), ["second"]);
        assert!(divs.first().unwrap().prev().unwrap().is_empty());
        let siblings = divs.eq(1).unwrap().siblings().unwrap();
        assert_eq!(siblings.len(), 4);
        assert_eq!(siblings.last().unwrap().get(0).unwrap().node_name(), "p");
    }

    #[test]
    fn add_merges_in_document_order() {
        let divs = divs();
        let merged = divs.last().unwrap().add("//p | //div[1]").unwrap();
        let names: Vec<String> = merged
            .iter()
            .map(|n| n.attribute("id").unwrap_or_else(|| n.node_name()))
            .collect();
        assert_eq!(names, ["first", "fourth", "p"]);
    }
}
