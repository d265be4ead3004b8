//! XPath queries over a document: a borrowed [`DomNode`] view implementing
//! `DataSourceNode`, and [`DocumentRef::evaluate`].

use crate::document::{Content, DOCUMENT_NODE, Document, DocumentRef, NodeId};
use crate::error::DomError;
use crate::node::Node;
use arbor_xpath1::engine::number_to_string;
use arbor_xpath1::{
    DataSourceNode, EvaluationContext, NodeType, QName, XPathError, XPathValue, evaluate,
};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A read-only view of one arena slot, valid while the document is borrowed.
#[derive(Debug, Clone, Copy)]
pub struct DomNode<'a> {
    doc: &'a Document,
    id: NodeId,
}

impl PartialEq for DomNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for DomNode<'_> {}

impl Hash for DomNode<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for DomNode<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DomNode<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.doc.position(self.id).cmp(&self.doc.position(other.id))
    }
}

impl<'a> DataSourceNode<'a> for DomNode<'a> {
    fn node_type(&self) -> NodeType {
        match self.doc.data(self.id).content {
            Content::Document => NodeType::Root,
            Content::Element { .. } => NodeType::Element,
            Content::Attribute { .. } => NodeType::Attribute,
            Content::Text(_) | Content::CData(_) => NodeType::Text,
            Content::Comment(_) => NodeType::Comment,
            Content::ProcessingInstruction { .. } => NodeType::ProcessingInstruction,
        }
    }

    fn name(&self) -> Option<QName<'a>> {
        let doc = self.doc;
        match &doc.data(self.id).content {
            Content::Element { name, .. } | Content::Attribute { name, .. } => Some(QName {
                prefix: name.prefix.as_deref(),
                local_part: &name.local,
            }),
            Content::ProcessingInstruction { target, .. } => Some(QName {
                prefix: None,
                local_part: target,
            }),
            _ => None,
        }
    }

    fn namespace_uri(&self) -> Option<&'a str> {
        let doc = self.doc;
        match &doc.data(self.id).content {
            Content::Element { name, .. } | Content::Attribute { name, .. } => {
                name.namespace.as_deref()
            }
            _ => None,
        }
    }

    fn string_value(&self) -> String {
        self.doc.text_of(self.id)
    }

    fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
        let doc = self.doc;
        Box::new(
            doc.data(self.id)
                .attributes
                .iter()
                .map(move |&id| DomNode { doc, id }),
        )
    }

    fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a> {
        let doc = self.doc;
        Box::new(
            doc.data(self.id)
                .children
                .iter()
                .map(move |&id| DomNode { doc, id }),
        )
    }

    fn parent(&self) -> Option<Self> {
        let doc = self.doc;
        doc.data(self.id).parent.map(|id| DomNode { doc, id })
    }
}

/// The result of evaluating an expression against a document.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    NodeSet(Vec<Node>),
    String(String),
    Number(f64),
    Boolean(bool),
}

impl QueryValue {
    pub fn to_bool(&self) -> bool {
        match self {
            QueryValue::NodeSet(nodes) => !nodes.is_empty(),
            QueryValue::String(s) => !s.is_empty(),
            QueryValue::Number(n) => *n != 0.0 && !n.is_nan(),
            QueryValue::Boolean(b) => *b,
        }
    }

    pub fn into_nodes(self) -> Option<Vec<Node>> {
        match self {
            QueryValue::NodeSet(nodes) => Some(nodes),
            _ => None,
        }
    }
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryValue::NodeSet(nodes) => match nodes.first() {
                Some(node) => f.write_str(&node.text_content()),
                None => Ok(()),
            },
            QueryValue::String(s) => f.write_str(s),
            QueryValue::Number(n) => f.write_str(&number_to_string(*n)),
            QueryValue::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl DocumentRef {
    /// Evaluates `expr` with `context` (or the document node) as context node,
    /// using the document's registered namespaces. Node-sets come back in
    /// document order.
    pub fn evaluate(&self, expr: &str, context: Option<&Node>) -> Result<QueryValue, DomError> {
        if let Some(node) = context {
            if !node.belongs_to(self) {
                return Err(DomError::WrongDocument);
            }
        }
        let borrowed = self.borrow();
        let doc: &Document = &borrowed;
        let compiled = doc.compile(expr)?;
        let root = DomNode {
            doc,
            id: DOCUMENT_NODE,
        };
        let context_node = context.map_or(root, |n| DomNode { doc, id: n.id() });
        let e_ctx = EvaluationContext::new(context_node, root, doc.namespaces());
        let value = match evaluate(&compiled, &e_ctx)? {
            XPathValue::NodeSet(nodes) => {
                QueryValue::NodeSet(nodes.iter().map(|n| self.node(n.id)).collect())
            }
            XPathValue::String(s) => QueryValue::String(s),
            XPathValue::Number(n) => QueryValue::Number(n),
            XPathValue::Boolean(b) => QueryValue::Boolean(b),
        };
        log::trace!("Evaluated '{}' => {:?}", expr, value);
        Ok(value)
    }

    /// Like [`evaluate`](Self::evaluate), but the expression must select nodes.
    pub fn select(&self, expr: &str, context: Option<&Node>) -> Result<Vec<Node>, DomError> {
        self.evaluate(expr, context)?.into_nodes().ok_or_else(|| {
            DomError::XPath(XPathError::TypeError(format!(
                "'{}' does not select a node-set",
                expr
            )))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> DocumentRef {
        let doc = DocumentRef::new();
        let items = doc.create_element("items").unwrap();
        doc.root().append_child(&items).unwrap();
        let group = doc.create_element("group").unwrap();
        items.append_child(&group).unwrap();
        for i in 0..3 {
            let item = doc.create_element("item").unwrap();
            item.set_attribute("index", &i.to_string()).unwrap();
            item.append_child(&doc.create_text(&format!("text{}", i + 1)))
                .unwrap();
            group.append_child(&item).unwrap();
        }
        doc
    }

    #[test]
    fn selects_nodes_in_document_order() {
        let doc = items();
        let nodes = doc.select("//item | //group", None).unwrap();
        let names: Vec<String> = nodes.iter().map(Node::node_name).collect();
        assert_eq!(names, ["group", "item", "item", "item"]);
    }

    #[test]
    fn evaluates_relative_to_a_context_node() {
        let doc = items();
        let group = doc.select("//group", None).unwrap().remove(0);
        let value = doc.evaluate("count(item)", Some(&group)).unwrap();
        assert_eq!(value, QueryValue::Number(3.0));
        let text = doc.evaluate("string(item[@index='2'])", Some(&group)).unwrap();
        assert_eq!(text.to_string(), "text3");
    }

    #[test]
    fn order_follows_mutations() {
        let doc = items();
        let first = doc.select("//item[1]", None).unwrap().remove(0);
        let group = first.parent().unwrap();
        group.append_child(&first).unwrap();
        let nodes = doc.select("//item", None).unwrap();
        assert_eq!(nodes.last(), Some(&first));
    }

    #[test]
    fn registered_namespaces_scope_queries() {
        let doc = DocumentRef::new();
        let root = doc.create_element_ns(Some("urn:test"), "t:root").unwrap();
        doc.root().append_child(&root).unwrap();
        assert!(doc.select("//x:root", None).is_err());
        doc.register_namespace("x", "urn:test");
        assert_eq!(doc.select("//x:root", None).unwrap(), vec![root]);
    }

    #[test]
    fn rejects_foreign_context_and_scalar_selections() {
        let doc = items();
        let other = DocumentRef::new();
        assert!(matches!(
            doc.evaluate(".", Some(&other.root())),
            Err(DomError::WrongDocument)
        ));
        assert!(doc.select("count(//item)", None).is_err());
    }
}
