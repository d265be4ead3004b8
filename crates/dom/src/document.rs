//! The node arena and the shared [`DocumentRef`] handle.

use crate::error::DomError;
use crate::name::{NamespaceDecl, QualName, split_qname};
use crate::node::Node;
use arbor_xpath1::{Expression, XPathError, parse_expression};
use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

pub type NodeId = usize;

/// The document node is always the first arena slot.
pub(crate) const DOCUMENT_NODE: NodeId = 0;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Content {
    Document,
    Element {
        name: QualName,
        namespaces: Vec<NamespaceDecl>,
    },
    Attribute {
        name: QualName,
        value: String,
    },
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction {
        target: String,
        data: String,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub(crate) content: Content,
    /// The owner element for attributes.
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) attributes: Vec<NodeId>,
}

impl NodeData {
    fn new(content: Content) -> Self {
        Self {
            content,
            parent: None,
            children: Vec::new(),
            attributes: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub struct Document {
    nodes: Vec<NodeData>,
    doctype: Option<String>,
    /// Prefix bindings used as the query scope.
    namespaces: HashMap<String, String>,
    expressions: RefCell<HashMap<String, Rc<Expression>>>,
    /// Lazily computed tree order of every arena slot, dropped on mutation.
    order: RefCell<Option<Rc<Vec<usize>>>>,
}

impl Default for Document {
    fn default() -> Self {
        Self {
            nodes: vec![NodeData::new(Content::Document)],
            doctype: None,
            namespaces: HashMap::new(),
            expressions: RefCell::new(HashMap::new()),
            order: RefCell::new(None),
        }
    }
}

impl Document {
    pub(crate) fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id]
    }

    pub(crate) fn data_mut(&mut self, id: NodeId) -> &mut NodeData {
        self.order.get_mut().take();
        &mut self.nodes[id]
    }

    pub(crate) fn push(&mut self, content: Content) -> NodeId {
        self.order.get_mut().take();
        self.nodes.push(NodeData::new(content));
        self.nodes.len() - 1
    }

    /// Number of arena slots, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn namespaces(&self) -> &HashMap<String, String> {
        &self.namespaces
    }

    pub fn doctype(&self) -> Option<&str> {
        self.doctype.as_deref()
    }

    /// Unlinks `id` from its parent's child (or attribute) list.
    pub(crate) fn detach(&mut self, id: NodeId) {
        let Some(parent) = self.nodes[id].parent else {
            return;
        };
        let is_attribute = matches!(self.nodes[id].content, Content::Attribute { .. });
        let parent_data = self.data_mut(parent);
        if is_attribute {
            parent_data.attributes.retain(|&a| a != id);
        } else {
            parent_data.children.retain(|&c| c != id);
        }
        self.nodes[id].parent = None;
    }

    pub(crate) fn insert_child(&mut self, parent: NodeId, index: usize, id: NodeId) {
        self.detach(id);
        let children = &mut self.data_mut(parent).children;
        let index = index.min(children.len());
        children.insert(index, id);
        self.nodes[id].parent = Some(parent);
    }

    pub(crate) fn add_attribute(&mut self, owner: NodeId, id: NodeId) {
        self.detach(id);
        self.data_mut(owner).attributes.push(id);
        self.nodes[id].parent = Some(owner);
    }

    pub(crate) fn compile(&self, expr: &str) -> Result<Rc<Expression>, XPathError> {
        if let Some(compiled) = self.expressions.borrow().get(expr) {
            return Ok(Rc::clone(compiled));
        }
        let compiled = Rc::new(parse_expression(expr)?);
        self.expressions
            .borrow_mut()
            .insert(expr.to_string(), Rc::clone(&compiled));
        Ok(compiled)
    }

    /// The tree order position of `id`. Attached nodes come first in document
    /// order, followed by each detached tree in arena order.
    pub(crate) fn position(&self, id: NodeId) -> usize {
        if let Some(order) = self.order.borrow().as_ref() {
            return order[id];
        }
        let order = Rc::new(self.compute_order());
        let position = order[id];
        *self.order.borrow_mut() = Some(order);
        position
    }

    fn compute_order(&self) -> Vec<usize> {
        let mut order = vec![usize::MAX; self.nodes.len()];
        let mut next = 0;
        let roots = std::iter::once(DOCUMENT_NODE).chain(
            (1..self.nodes.len()).filter(|&id| self.nodes[id].parent.is_none()),
        );
        for root in roots {
            let mut stack = vec![root];
            while let Some(id) = stack.pop() {
                order[id] = next;
                next += 1;
                let data = &self.nodes[id];
                for &attr in &data.attributes {
                    order[attr] = next;
                    next += 1;
                }
                stack.extend(data.children.iter().rev());
            }
        }
        order
    }

    /// The concatenated text of all descendant text nodes, or a leaf's own value.
    pub(crate) fn text_of(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let data = &self.nodes[id];
        match &data.content {
            Content::Text(text) | Content::CData(text) | Content::Comment(text) => {
                out.push_str(text)
            }
            Content::Attribute { value, .. } => out.push_str(value),
            Content::ProcessingInstruction { data, .. } => out.push_str(data),
            Content::Element { .. } | Content::Document => {
                for &child in &data.children {
                    if !matches!(
                        self.nodes[child].content,
                        Content::Comment(_) | Content::ProcessingInstruction { .. }
                    ) {
                        self.collect_text(child, out);
                    }
                }
            }
        }
    }

    /// Resolves a prefix through the in-scope declarations of `element`,
    /// then the document's registry.
    pub(crate) fn lookup_namespace(&self, element: NodeId, prefix: Option<&str>) -> Option<String> {
        let mut current = Some(element);
        while let Some(id) = current {
            if let Content::Element { namespaces, .. } = &self.nodes[id].content {
                if let Some(decl) = namespaces.iter().find(|d| d.prefix.as_deref() == prefix) {
                    return Some(decl.uri.clone()).filter(|uri| !uri.is_empty());
                }
            }
            current = self.nodes[id].parent;
        }
        prefix.and_then(|p| self.namespaces.get(p).cloned())
    }
}

/// A shared handle to a [`Document`]. Clones point at the same document;
/// identity is by pointer.
#[derive(Clone, Default)]
pub struct DocumentRef(Rc<RefCell<Document>>);

impl fmt::Debug for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentRef({:p})", Rc::as_ptr(&self.0))
    }
}

impl PartialEq for DocumentRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}
impl Eq for DocumentRef {}

/// A detached copy of a subtree, used to move nodes between documents
/// without holding two borrows.
struct Snapshot {
    content: Content,
    attributes: Vec<Content>,
    children: Vec<Snapshot>,
}

impl DocumentRef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ptr_eq(&self, other: &DocumentRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// A stable address for hashing.
    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }

    pub fn borrow(&self) -> Ref<'_, Document> {
        self.0.borrow()
    }

    pub(crate) fn borrow_mut(&self) -> RefMut<'_, Document> {
        self.0.borrow_mut()
    }

    pub(crate) fn node(&self, id: NodeId) -> Node {
        Node::new(self.clone(), id)
    }

    /// The document node itself.
    pub fn root(&self) -> Node {
        self.node(DOCUMENT_NODE)
    }

    pub fn document_element(&self) -> Option<Node> {
        self.root().first_element_child()
    }

    pub fn doctype(&self) -> Option<String> {
        self.borrow().doctype.clone()
    }

    pub fn set_doctype(&self, doctype: Option<&str>) {
        self.borrow_mut().doctype = doctype.map(str::to_string);
    }

    /// Binds `prefix` for queries against this document.
    pub fn register_namespace(&self, prefix: &str, uri: &str) {
        log::trace!("Registering namespace prefix '{}' => '{}'", prefix, uri);
        self.borrow_mut()
            .namespaces
            .insert(prefix.to_string(), uri.to_string());
    }

    pub fn namespaces(&self) -> HashMap<String, String> {
        self.borrow().namespaces.clone()
    }

    /// Creates a detached element. A prefix is resolved through the
    /// document's namespace registry.
    pub fn create_element(&self, qualified: &str) -> Result<Node, DomError> {
        let namespace = match split_qname(qualified).0 {
            Some(prefix) => self.borrow().namespaces.get(prefix).cloned(),
            None => None,
        };
        self.create_element_ns(namespace.as_deref(), qualified)
    }

    pub fn create_element_ns(&self, namespace: Option<&str>, qualified: &str) -> Result<Node, DomError> {
        let name = QualName::parse(qualified, namespace)?;
        let id = self.borrow_mut().push(Content::Element {
            name,
            namespaces: Vec::new(),
        });
        Ok(self.node(id))
    }

    pub fn create_text(&self, text: &str) -> Node {
        let id = self.borrow_mut().push(Content::Text(text.to_string()));
        self.node(id)
    }

    pub fn create_cdata(&self, text: &str) -> Node {
        let id = self.borrow_mut().push(Content::CData(text.to_string()));
        self.node(id)
    }

    pub fn create_comment(&self, text: &str) -> Node {
        let id = self.borrow_mut().push(Content::Comment(text.to_string()));
        self.node(id)
    }

    pub fn create_processing_instruction(&self, target: &str, data: &str) -> Result<Node, DomError> {
        if !crate::name::is_valid_name(target) {
            return Err(DomError::InvalidName(target.to_string()));
        }
        let id = self.borrow_mut().push(Content::ProcessingInstruction {
            target: target.to_string(),
            data: data.to_string(),
        });
        Ok(self.node(id))
    }

    /// Copies `node` into this document, detached. Attribute nodes are
    /// copied as detached attributes; the document node cannot be imported.
    pub fn import_node(&self, node: &Node, deep: bool) -> Result<Node, DomError> {
        if node.is_document() {
            return Err(DomError::HierarchyRequest(
                "a document node cannot be imported".to_string(),
            ));
        }
        let snapshot = {
            let source = node.document();
            let doc = source.borrow();
            snapshot(&doc, node.id(), deep)
        };
        let mut doc = self.borrow_mut();
        let id = restore(&mut doc, snapshot);
        drop(doc);
        Ok(self.node(id))
    }
}

fn snapshot(doc: &Document, id: NodeId, deep: bool) -> Snapshot {
    let data = doc.data(id);
    Snapshot {
        content: data.content.clone(),
        attributes: data
            .attributes
            .iter()
            .map(|&a| doc.data(a).content.clone())
            .collect(),
        children: if deep {
            data.children
                .iter()
                .map(|&c| snapshot(doc, c, true))
                .collect()
        } else {
            Vec::new()
        },
    }
}

fn restore(doc: &mut Document, snapshot: Snapshot) -> NodeId {
    let id = doc.push(snapshot.content);
    for attribute in snapshot.attributes {
        let attr = doc.push(attribute);
        doc.add_attribute(id, attr);
    }
    for child in snapshot.children {
        let child_id = restore(doc, child);
        let end = doc.data(id).children.len();
        doc.insert_child(id, end, child_id);
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_document_has_only_the_document_node() {
        let doc = DocumentRef::new();
        assert!(doc.borrow().is_empty());
        assert!(doc.root().is_document());
        assert!(doc.document_element().is_none());
    }

    #[test]
    fn handles_compare_by_pointer() {
        let a = DocumentRef::new();
        let b = DocumentRef::new();
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn expressions_are_cached() {
        let doc = DocumentRef::new();
        let first = doc.borrow().compile("//item").unwrap();
        let second = doc.borrow().compile("//item").unwrap();
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn import_copies_between_documents() {
        let source = DocumentRef::new();
        let element = source.create_element("item").unwrap();
        element.set_attribute("index", "1").unwrap();
        element.append_child(&source.create_text("hello")).unwrap();

        let target = DocumentRef::new();
        let shallow = target.import_node(&element, false).unwrap();
        assert_eq!(shallow.attribute("index").as_deref(), Some("1"));
        assert!(shallow.children().is_empty());

        let deep = target.import_node(&element, true).unwrap();
        assert_eq!(deep.text_content(), "hello");
        assert!(deep.document().ptr_eq(&target));
        assert!(!deep.is_attached());
    }

    #[test]
    fn tree_order_puts_detached_nodes_last() {
        let doc = DocumentRef::new();
        let detached = doc.create_element("loose").unwrap();
        let root = doc.create_element("root").unwrap();
        doc.root().append_child(&root).unwrap();
        let child = doc.create_element("child").unwrap();
        root.append_child(&child).unwrap();

        let d = doc.borrow();
        assert!(d.position(root.id()) < d.position(child.id()));
        assert!(d.position(child.id()) < d.position(detached.id()));
    }
}
