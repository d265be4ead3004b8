//! The [`Node`] handle: navigation, content accessors and mutation primitives.

use crate::document::{Content, DOCUMENT_NODE, Document, DocumentRef, NodeData, NodeId};
use crate::error::DomError;
use crate::name::{NamespaceDecl, QualName, split_qname};
use arbor_xpath1::XML_NAMESPACE;
use std::fmt;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Element,
    Attribute,
    Text,
    CData,
    Comment,
    ProcessingInstruction,
}

/// A handle to one node of a document. Equality and hashing use the
/// document's identity plus the arena id, so two handles to the same node
/// always compare equal.
#[derive(Clone)]
pub struct Node {
    doc: DocumentRef,
    id: NodeId,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.doc.ptr_eq(&other.doc)
    }
}
impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.doc.addr().hash(state);
        self.id.hash(state);
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node(#{} {})", self.id, self.node_name())
    }
}

impl Node {
    pub(crate) fn new(doc: DocumentRef, id: NodeId) -> Self {
        Self { doc, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn document(&self) -> DocumentRef {
        self.doc.clone()
    }

    pub fn belongs_to(&self, doc: &DocumentRef) -> bool {
        self.doc.ptr_eq(doc)
    }

    fn with<R>(&self, f: impl FnOnce(&Document, &NodeData) -> R) -> R {
        let doc = self.doc.borrow();
        f(&doc, doc.data(self.id))
    }

    fn handle(&self, id: NodeId) -> Node {
        Node::new(self.doc.clone(), id)
    }

    // --- kind & names ---

    pub fn kind(&self) -> NodeKind {
        self.with(|_, data| match data.content {
            Content::Document => NodeKind::Document,
            Content::Element { .. } => NodeKind::Element,
            Content::Attribute { .. } => NodeKind::Attribute,
            Content::Text(_) => NodeKind::Text,
            Content::CData(_) => NodeKind::CData,
            Content::Comment(_) => NodeKind::Comment,
            Content::ProcessingInstruction { .. } => NodeKind::ProcessingInstruction,
        })
    }

    pub fn is_element(&self) -> bool {
        self.kind() == NodeKind::Element
    }

    pub fn is_document(&self) -> bool {
        self.id == DOCUMENT_NODE
    }

    /// Text and CDATA sections.
    pub fn is_text(&self) -> bool {
        matches!(self.kind(), NodeKind::Text | NodeKind::CData)
    }

    /// A text node containing nothing but whitespace.
    pub fn is_whitespace(&self) -> bool {
        self.is_text() && self.value().unwrap_or_default().trim().is_empty()
    }

    pub fn qual_name(&self) -> Option<QualName> {
        self.with(|_, data| match &data.content {
            Content::Element { name, .. } | Content::Attribute { name, .. } => Some(name.clone()),
            _ => None,
        })
    }

    /// The DOM `nodeName`: the qualified name for elements and attributes,
    /// the target for processing instructions, `#text` and friends otherwise.
    pub fn node_name(&self) -> String {
        self.with(|_, data| match &data.content {
            Content::Document => "#document".to_string(),
            Content::Element { name, .. } | Content::Attribute { name, .. } => name.qualified(),
            Content::Text(_) => "#text".to_string(),
            Content::CData(_) => "#cdata-section".to_string(),
            Content::Comment(_) => "#comment".to_string(),
            Content::ProcessingInstruction { target, .. } => target.clone(),
        })
    }

    pub fn local_name(&self) -> Option<String> {
        self.qual_name().map(|n| n.local)
    }

    pub fn namespace_uri(&self) -> Option<String> {
        self.qual_name().and_then(|n| n.namespace)
    }

    /// The namespace declarations written on this element.
    pub fn namespace_declarations(&self) -> Vec<NamespaceDecl> {
        self.with(|_, data| match &data.content {
            Content::Element { namespaces, .. } => namespaces.clone(),
            _ => Vec::new(),
        })
    }

    pub fn declare_namespace(&self, prefix: Option<&str>, uri: &str) -> Result<(), DomError> {
        let mut doc = self.doc.borrow_mut();
        match &mut doc.data_mut(self.id).content {
            Content::Element { namespaces, .. } => {
                namespaces.retain(|d| d.prefix.as_deref() != prefix);
                namespaces.push(NamespaceDecl {
                    prefix: prefix.map(str::to_string),
                    uri: uri.to_string(),
                });
                Ok(())
            }
            _ => Err(DomError::HierarchyRequest(
                "namespaces can only be declared on elements".to_string(),
            )),
        }
    }

    pub fn lookup_namespace_uri(&self, prefix: Option<&str>) -> Option<String> {
        if prefix == Some("xml") {
            return Some(XML_NAMESPACE.to_string());
        }
        let doc = self.doc.borrow();
        let start = match doc.data(self.id).content {
            Content::Attribute { .. } => doc.data(self.id).parent,
            _ => Some(self.id),
        };
        match start {
            Some(element) => doc.lookup_namespace(element, prefix),
            None => prefix.and_then(|p| doc.namespaces().get(p).cloned()),
        }
    }

    // --- navigation ---

    /// The parent node. For attributes this is the owner element.
    pub fn parent(&self) -> Option<Node> {
        self.with(|_, data| data.parent).map(|id| self.handle(id))
    }

    pub fn children(&self) -> Vec<Node> {
        self.with(|_, data| data.children.clone())
            .into_iter()
            .map(|id| self.handle(id))
            .collect()
    }

    pub fn has_children(&self) -> bool {
        self.with(|_, data| !data.children.is_empty())
    }

    pub fn first_child(&self) -> Option<Node> {
        self.with(|_, data| data.children.first().copied())
            .map(|id| self.handle(id))
    }

    pub fn last_child(&self) -> Option<Node> {
        self.with(|_, data| data.children.last().copied())
            .map(|id| self.handle(id))
    }

    pub fn element_children(&self) -> Vec<Node> {
        self.children().into_iter().filter(Node::is_element).collect()
    }

    pub fn first_element_child(&self) -> Option<Node> {
        self.children().into_iter().find(Node::is_element)
    }

    pub fn last_element_child(&self) -> Option<Node> {
        self.children().into_iter().rev().find(Node::is_element)
    }

    /// Position among the parent's children. `None` for detached nodes and attributes.
    pub fn index_in_parent(&self) -> Option<usize> {
        self.with(|doc, data| {
            let parent = data.parent?;
            doc.data(parent).children.iter().position(|&c| c == self.id)
        })
    }

    fn sibling_at(&self, offset: isize) -> Option<Node> {
        let index = self.index_in_parent()?;
        let parent = self.parent()?;
        let target = index.checked_add_signed(offset)?;
        parent
            .with(|_, data| data.children.get(target).copied())
            .map(|id| self.handle(id))
    }

    pub fn next_sibling(&self) -> Option<Node> {
        self.sibling_at(1)
    }

    pub fn previous_sibling(&self) -> Option<Node> {
        self.sibling_at(-1)
    }

    pub fn next_element_sibling(&self) -> Option<Node> {
        let mut current = self.next_sibling();
        while let Some(node) = current {
            if node.is_element() {
                return Some(node);
            }
            current = node.next_sibling();
        }
        None
    }

    pub fn previous_element_sibling(&self) -> Option<Node> {
        let mut current = self.previous_sibling();
        while let Some(node) = current {
            if node.is_element() {
                return Some(node);
            }
            current = node.previous_sibling();
        }
        None
    }

    /// Ancestors, nearest first.
    pub fn ancestors(&self) -> Vec<Node> {
        let mut result = Vec::new();
        let mut current = self.parent();
        while let Some(node) = current {
            current = node.parent();
            result.push(node);
        }
        result
    }

    /// Descendants in document order, excluding attributes.
    pub fn descendants(&self) -> Vec<Node> {
        let mut result = Vec::new();
        let mut stack: Vec<Node> = self.children().into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            stack.extend(node.children().into_iter().rev());
            result.push(node);
        }
        result
    }

    /// True if `other` is this node or one of its descendants.
    pub fn contains(&self, other: &Node) -> bool {
        if !self.doc.ptr_eq(&other.doc) {
            return false;
        }
        let doc = self.doc.borrow();
        let mut current = Some(other.id);
        while let Some(id) = current {
            if id == self.id {
                return true;
            }
            current = doc.data(id).parent;
        }
        false
    }

    /// True when the ancestor chain reaches the document node.
    pub fn is_attached(&self) -> bool {
        self.doc.root().contains(self)
    }

    // --- content ---

    /// The data of text, CDATA, comment and processing-instruction nodes and
    /// the value of attributes.
    pub fn value(&self) -> Option<String> {
        self.with(|_, data| match &data.content {
            Content::Attribute { value, .. } => Some(value.clone()),
            Content::Text(text) | Content::CData(text) | Content::Comment(text) => {
                Some(text.clone())
            }
            Content::ProcessingInstruction { data, .. } => Some(data.clone()),
            _ => None,
        })
    }

    /// The concatenated text of all descendant text nodes, or the node's own value.
    pub fn text_content(&self) -> String {
        self.doc.borrow().text_of(self.id)
    }

    /// Replaces the children of a container with one text node, or sets the
    /// value of a leaf node.
    pub fn set_text_content(&self, text: &str) -> Result<(), DomError> {
        {
            let mut doc = self.doc.borrow_mut();
            match &mut doc.data_mut(self.id).content {
                Content::Attribute { value: v, .. } => {
                    *v = text.to_string();
                    return Ok(());
                }
                Content::Text(v) | Content::CData(v) | Content::Comment(v) => {
                    *v = text.to_string();
                    return Ok(());
                }
                Content::ProcessingInstruction { data, .. } => {
                    *data = text.to_string();
                    return Ok(());
                }
                Content::Element { .. } | Content::Document => {}
            }
        }
        for child in self.children() {
            child.remove();
        }
        if !text.is_empty() {
            let node = self.doc.create_text(text);
            self.append_child(&node)?;
        }
        Ok(())
    }

    // --- attributes ---

    pub fn attributes(&self) -> Vec<Node> {
        self.with(|_, data| data.attributes.clone())
            .into_iter()
            .map(|id| self.handle(id))
            .collect()
    }

    fn find_attribute(&self, qualified: &str) -> Option<NodeId> {
        self.with(|doc, data| {
            data.attributes.iter().copied().find(|&a| {
                matches!(&doc.data(a).content, Content::Attribute { name, .. } if name.matches(qualified))
            })
        })
    }

    pub fn attribute_node(&self, qualified: &str) -> Option<Node> {
        self.find_attribute(qualified).map(|id| self.handle(id))
    }

    pub fn attribute(&self, qualified: &str) -> Option<String> {
        self.attribute_node(qualified).and_then(|a| a.value())
    }

    pub fn has_attribute(&self, qualified: &str) -> bool {
        self.find_attribute(qualified).is_some()
    }

    /// Sets or creates an attribute. `xmlns` and `xmlns:*` names become
    /// namespace declarations.
    pub fn set_attribute(&self, qualified: &str, value: &str) -> Result<(), DomError> {
        if !self.is_element() {
            return Err(DomError::HierarchyRequest(format!(
                "cannot set attribute '{}' on {}",
                qualified,
                self.node_name()
            )));
        }
        if qualified == "xmlns" {
            return self.declare_namespace(None, value);
        }
        if let Some(prefix) = qualified.strip_prefix("xmlns:") {
            return self.declare_namespace(Some(prefix), value);
        }
        if let Some(existing) = self.find_attribute(qualified) {
            let mut doc = self.doc.borrow_mut();
            if let Content::Attribute { value: v, .. } = &mut doc.data_mut(existing).content {
                *v = value.to_string();
            }
            return Ok(());
        }
        let namespace = match split_qname(qualified).0 {
            Some(prefix) => self.lookup_namespace_uri(Some(prefix)),
            None => None,
        };
        let name = QualName::parse(qualified, namespace.as_deref())?;
        let mut doc = self.doc.borrow_mut();
        let attr = doc.push(Content::Attribute {
            name,
            value: value.to_string(),
        });
        doc.add_attribute(self.id, attr);
        Ok(())
    }

    /// Removes an attribute; returns whether it existed.
    pub fn remove_attribute(&self, qualified: &str) -> bool {
        match self.find_attribute(qualified) {
            Some(id) => {
                self.doc.borrow_mut().detach(id);
                true
            }
            None => false,
        }
    }

    // --- mutation ---

    fn can_have_children(&self) -> bool {
        matches!(self.kind(), NodeKind::Element | NodeKind::Document)
    }

    fn check_insertable(&self, nodes: &[Node]) -> Result<(), DomError> {
        if !self.can_have_children() {
            return Err(DomError::HierarchyRequest(format!(
                "{} cannot have children",
                self.node_name()
            )));
        }
        let mut new_elements = 0;
        for node in nodes {
            if !node.doc.ptr_eq(&self.doc) {
                return Err(DomError::WrongDocument);
            }
            match node.kind() {
                NodeKind::Document | NodeKind::Attribute => {
                    return Err(DomError::HierarchyRequest(format!(
                        "{} cannot be inserted as a child",
                        node.node_name()
                    )));
                }
                NodeKind::Element => new_elements += 1,
                NodeKind::Text | NodeKind::CData if self.is_document() && !node.is_whitespace() => {
                    return Err(DomError::HierarchyRequest(
                        "text cannot be inserted at the document level".to_string(),
                    ));
                }
                _ => {}
            }
            if node.contains(self) {
                return Err(DomError::HierarchyRequest(format!(
                    "{} is an ancestor of the insertion point",
                    node.node_name()
                )));
            }
        }
        if self.is_document() {
            let existing = self
                .element_children()
                .into_iter()
                .filter(|e| !nodes.contains(e))
                .count();
            if existing + new_elements > 1 {
                return Err(DomError::HierarchyRequest(
                    "a document can only have one document element".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Inserts `nodes` in order before `reference` (or at the end). Nodes are
    /// moved from wherever they currently are.
    pub fn insert_before(&self, nodes: &[Node], reference: Option<&Node>) -> Result<(), DomError> {
        self.check_insertable(nodes)?;
        let mut anchor = match reference {
            Some(r) if r.parent().as_ref() != Some(self) => return Err(DomError::NotFound),
            Some(r) => Some(r.clone()),
            None => None,
        };
        // The reference may itself be one of the moved nodes.
        while let Some(a) = anchor.as_ref().filter(|a| nodes.contains(a)) {
            anchor = a.next_sibling();
        }
        let mut doc = self.doc.borrow_mut();
        for node in nodes {
            doc.detach(node.id);
            let index = match &anchor {
                Some(a) => doc
                    .data(self.id)
                    .children
                    .iter()
                    .position(|&c| c == a.id)
                    .unwrap_or(usize::MAX),
                None => usize::MAX,
            };
            doc.insert_child(self.id, index, node.id);
        }
        Ok(())
    }

    pub fn append_children(&self, nodes: &[Node]) -> Result<(), DomError> {
        self.insert_before(nodes, None)
    }

    pub fn append_child(&self, node: &Node) -> Result<(), DomError> {
        self.insert_before(std::slice::from_ref(node), None)
    }

    pub fn prepend_children(&self, nodes: &[Node]) -> Result<(), DomError> {
        let first = self.first_child();
        self.insert_before(nodes, first.as_ref())
    }

    /// Detaches the node (or attribute) from its parent. It stays usable.
    pub fn remove(&self) {
        self.doc.borrow_mut().detach(self.id);
    }

    /// Replaces this node with `nodes`. Detached nodes are left untouched.
    pub fn replace_with(&self, nodes: &[Node]) -> Result<(), DomError> {
        let Some(parent) = self.parent() else {
            return Ok(());
        };
        let rest: Vec<Node> = nodes.iter().filter(|n| *n != self).cloned().collect();
        parent.insert_before(&rest, Some(self))?;
        if !nodes.contains(self) {
            self.remove();
        }
        Ok(())
    }

    /// A detached copy of the node in the same document.
    pub fn clone_node(&self, deep: bool) -> Result<Node, DomError> {
        self.doc.import_node(self, deep)
    }
}
