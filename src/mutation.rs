//! Normalizes the different kinds of content accepted by insertion
//! operations into detached nodes of the target document.

use crate::error::NodesError;
use crate::nodes::Nodes;
use arbor_dom::Node;
use std::borrow::Cow;
use std::fmt;

/// Content that adds itself to a parent element instead of being expanded
/// into nodes. Only appending operations accept it.
pub trait Appendable {
    /// Appends to `parent` and returns the nodes that were added.
    fn append_to(&self, parent: &Node) -> Result<Vec<Node>, NodesError>;
}

/// Content callbacks receive the target node and its position in the
/// collection being modified.
pub type ContentFn<'a> = &'a dyn Fn(&Node, usize) -> Insertable<'a>;

/// Content for insertion operations.
#[derive(Clone)]
pub enum Insertable<'a> {
    Empty,
    /// Markup parsed with the fragment loader of the collection's content type.
    Markup(Cow<'a, str>),
    /// A literal text node.
    Text(Cow<'a, str>),
    Node(Node),
    Nodes(Vec<Node>),
    Collection(&'a Nodes),
    /// Node-like values only.
    Sequence(Vec<Insertable<'a>>),
    Callback(ContentFn<'a>),
    Appendable(&'a dyn Appendable),
}

impl fmt::Debug for Insertable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Insertable::Empty => f.write_str("Empty"),
            Insertable::Markup(markup) => f.debug_tuple("Markup").field(markup).finish(),
            Insertable::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Insertable::Node(node) => f.debug_tuple("Node").field(node).finish(),
            Insertable::Nodes(nodes) => f.debug_tuple("Nodes").field(nodes).finish(),
            Insertable::Collection(nodes) => f.debug_tuple("Collection").field(nodes).finish(),
            Insertable::Sequence(items) => f.debug_tuple("Sequence").field(items).finish(),
            Insertable::Callback(_) => f.write_str("Callback"),
            Insertable::Appendable(_) => f.write_str("Appendable"),
        }
    }
}

impl Insertable<'_> {
    pub fn is_callback(&self) -> bool {
        matches!(self, Insertable::Callback(_))
    }
}

impl<'a> From<&'a str> for Insertable<'a> {
    fn from(markup: &'a str) -> Self {
        Insertable::Markup(Cow::Borrowed(markup))
    }
}

impl<'a> From<&'a String> for Insertable<'a> {
    fn from(markup: &'a String) -> Self {
        Insertable::Markup(Cow::Borrowed(markup))
    }
}

impl From<String> for Insertable<'_> {
    fn from(markup: String) -> Self {
        Insertable::Markup(Cow::Owned(markup))
    }
}

impl From<Node> for Insertable<'_> {
    fn from(node: Node) -> Self {
        Insertable::Node(node)
    }
}

impl From<&Node> for Insertable<'_> {
    fn from(node: &Node) -> Self {
        Insertable::Node(node.clone())
    }
}

impl From<Vec<Node>> for Insertable<'_> {
    fn from(nodes: Vec<Node>) -> Self {
        Insertable::Nodes(nodes)
    }
}

impl<'a> From<&'a Nodes> for Insertable<'a> {
    fn from(nodes: &'a Nodes) -> Self {
        Insertable::Collection(nodes)
    }
}

impl<'a> From<ContentFn<'a>> for Insertable<'a> {
    fn from(callback: ContentFn<'a>) -> Self {
        Insertable::Callback(callback)
    }
}

impl<'a> From<&'a dyn Appendable> for Insertable<'a> {
    fn from(appendable: &'a dyn Appendable) -> Self {
        Insertable::Appendable(appendable)
    }
}

impl<'a, T: Into<Insertable<'a>>> From<Option<T>> for Insertable<'a> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Insertable::Empty, Into::into)
    }
}

impl Nodes {
    /// Expands `content` into nodes owned by this collection's document.
    /// Nodes of other documents are deep-imported; callbacks are invoked
    /// with `target` and must be given one.
    pub fn expand(
        &self,
        content: &Insertable<'_>,
        target: Option<(&Node, usize)>,
    ) -> Result<Vec<Node>, NodesError> {
        match content {
            Insertable::Empty => Ok(Vec::new()),
            Insertable::Markup(markup) if markup.trim().is_empty() => Ok(Vec::new()),
            Insertable::Markup(markup) => self.parse_fragment(markup),
            Insertable::Text(text) if text.is_empty() => Ok(Vec::new()),
            Insertable::Text(text) => Ok(vec![self.document().create_text(text)]),
            Insertable::Node(node) => Ok(self.adopt(node)?.into_iter().collect()),
            Insertable::Nodes(nodes) => self.adopt_all(nodes),
            Insertable::Collection(nodes) => self.adopt_all(&nodes.to_vec()),
            Insertable::Sequence(items) => {
                let mut result = Vec::new();
                for item in items {
                    match item {
                        Insertable::Empty => {}
                        Insertable::Node(_) | Insertable::Nodes(_) | Insertable::Collection(_) => {
                            result.extend(self.expand(item, target)?);
                        }
                        other => {
                            return Err(NodesError::InvalidElements(format!(
                                "sequences may only contain nodes, got {:?}",
                                other
                            )));
                        }
                    }
                }
                Ok(result)
            }
            Insertable::Callback(callback) => {
                let Some((node, index)) = target else {
                    return Err(NodesError::InvalidElements(
                        "content callback without a target node".to_string(),
                    ));
                };
                match callback(node, index) {
                    Insertable::Callback(_) => Err(NodesError::InvalidElements(
                        "content callback returned another callback".to_string(),
                    )),
                    produced => self.expand(&produced, target),
                }
            }
            Insertable::Appendable(_) => Err(NodesError::InvalidElements(
                "appendable content can only be appended".to_string(),
            )),
        }
    }

    /// A node of this document is used as is; a document node stands for
    /// its document element; other nodes are deep-imported.
    fn adopt(&self, node: &Node) -> Result<Option<Node>, NodesError> {
        let document = self.document();
        if node.is_document() {
            return match node.document().document_element() {
                Some(element) => self.adopt(&element),
                None => Ok(None),
            };
        }
        if node.belongs_to(&document) {
            Ok(Some(node.clone()))
        } else {
            log::trace!("Importing {:?} from another document", node);
            Ok(Some(document.import_node(node, true)?))
        }
    }

    fn adopt_all(&self, nodes: &[Node]) -> Result<Vec<Node>, NodesError> {
        let mut adopted = Vec::with_capacity(nodes.len());
        for node in nodes {
            adopted.extend(self.adopt(node)?);
        }
        Ok(adopted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_dom::DocumentRef;

    fn target() -> Nodes {
        Nodes::from_source("<root/>", "xml").unwrap()
    }

    #[test]
    fn empty_content_expands_to_nothing() {
        let nodes = target();
        assert!(nodes.expand(&Insertable::Empty, None).unwrap().is_empty());
        assert!(nodes.expand(&"".into(), None).unwrap().is_empty());
        assert!(nodes.expand(&Insertable::Text("".into()), None).unwrap().is_empty());
        assert!(nodes.expand(&Insertable::from(None::<Node>), None).unwrap().is_empty());
    }

    #[test]
    fn multi_root_markup_keeps_source_order() {
        let nodes = target();
        let expanded = nodes.expand(&"<a/>text<b/>".into(), None).unwrap();
        let names: Vec<String> = expanded.iter().map(Node::node_name).collect();
        assert_eq!(names, ["a", "#text", "b"]);
        assert!(expanded.iter().all(|n| n.belongs_to(&nodes.document())));
        assert!(expanded.iter().all(|n| n.parent().is_none()));
    }

    #[test]
    fn text_is_not_parsed() {
        let nodes = target();
        let expanded = nodes.expand(&Insertable::Text("<a/>".into()), None).unwrap();
        assert_eq!(expanded.len(), 1);
        assert_eq!(expanded[0].text_content(), "<a/>");
    }

    #[test]
    fn foreign_nodes_are_imported() {
        let nodes = target();
        let other = DocumentRef::new();
        let element = other.create_element("x").unwrap();
        element.append_child(&other.create_text("y")).unwrap();
        let expanded = nodes.expand(&element.clone().into(), None).unwrap();
        assert_eq!(expanded.len(), 1);
        assert!(expanded[0].belongs_to(&nodes.document()));
        assert_eq!(expanded[0].text_content(), "y");
        assert!(element.belongs_to(&other));
    }

    #[test]
    fn sequences_accept_only_nodes() {
        let nodes = target();
        let a = nodes.document().create_element("a").unwrap();
        let b = nodes.document().create_element("b").unwrap();
        let sequence = Insertable::Sequence(vec![
            Insertable::Node(a.clone()),
            Insertable::Empty,
            Insertable::Nodes(vec![b.clone()]),
        ]);
        assert_eq!(nodes.expand(&sequence, None).unwrap(), [a, b]);

        let bad = Insertable::Sequence(vec![Insertable::Markup("<c/>".into())]);
        assert!(matches!(
            nodes.expand(&bad, None),
            Err(NodesError::InvalidElements(_))
        ));
    }

    #[test]
    fn callbacks_see_their_target() {
        let nodes = target();
        let root = nodes.document().document_element().unwrap();
        let label = |node: &Node, index: usize| {
            Insertable::from(format!("<{}-{}/>", node.node_name(), index))
        };
        let expanded = nodes
            .expand(&Insertable::Callback(&label), Some((&root, 4)))
            .unwrap();
        assert_eq!(expanded[0].node_name(), "root-4");
        assert!(matches!(
            nodes.expand(&Insertable::Callback(&label), None),
            Err(NodesError::InvalidElements(_))
        ));
    }

    #[test]
    fn appendables_are_not_expanded() {
        struct Marker;
        impl Appendable for Marker {
            fn append_to(&self, _parent: &Node) -> Result<Vec<Node>, NodesError> {
                Ok(Vec::new())
            }
        }
        let nodes = target();
        assert!(matches!(
            nodes.expand(&Insertable::Appendable(&Marker), None),
            Err(NodesError::InvalidElements(_))
        ));
        let sequence = Insertable::Sequence(vec![Insertable::Appendable(&Marker)]);
        assert!(matches!(
            nodes.expand(&sequence, None),
            Err(NodesError::InvalidElements(_))
        ));
    }

    #[test]
    fn html_collections_parse_html_fragments() {
        let nodes = Nodes::from_source("<html><body></body></html>", "html").unwrap();
        let expanded = nodes.expand(&"<p>a<br>b".into(), None).unwrap();
        assert_eq!(expanded.len(), 1);
        assert_eq!(expanded[0].children().len(), 3);
    }

    #[test]
    fn json_collections_cannot_parse_fragments() {
        let nodes = Nodes::from_source("{\"a\": 1}", "json").unwrap();
        nodes.set_loaders(arbor_loader::Loaders::empty().with(arbor_loader::JsonLoader));
        assert!(matches!(
            nodes.expand(&"<a/>".into(), None),
            Err(NodesError::InvalidFragmentLoader(_))
        ));
    }
}
