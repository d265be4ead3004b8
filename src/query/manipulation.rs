//! Insertion, replacement, wrapping and removal.
//!
//! Content is expanded once: the first target receives the expanded nodes
//! and every further target a deep copy. Callback content is expanded per
//! target instead.

use crate::error::NodesError;
use crate::mutation::Insertable;
use crate::nodes::Nodes;
use crate::selector::Selector;
use crate::sort::sort_nodes;
use arbor_dom::{DomError, Node};

/// The deepest first-element descendant, where wrapped content goes.
fn innermost(wrapper: &Node) -> Node {
    let mut current = wrapper.clone();
    while let Some(child) = current.first_element_child() {
        current = child;
    }
    current
}

impl Nodes {
    /// Held elements with their positions in the collection.
    fn element_targets(&self) -> Vec<(usize, Node)> {
        self.iter().enumerate().filter(|(_, n)| n.is_element()).collect()
    }

    /// Held nodes that have a parent, with their positions.
    fn attached_targets(&self) -> Vec<(usize, Node)> {
        self.iter()
            .enumerate()
            .filter(|(_, n)| n.parent().is_some())
            .collect()
    }

    fn distribute(
        &self,
        targets: &[(usize, Node)],
        content: &Insertable<'_>,
        mut insert: impl FnMut(&Node, &[Node]) -> Result<(), DomError>,
    ) -> Result<Vec<Node>, NodesError> {
        let mut inserted = Vec::new();
        let mut originals: Option<Vec<Node>> = None;
        for (index, target) in targets {
            let nodes = if content.is_callback() {
                self.expand(content, Some((target, *index)))?
            } else if let Some(originals) = &originals {
                originals
                    .iter()
                    .map(|n| n.clone_node(true))
                    .collect::<Result<Vec<_>, _>>()?
            } else {
                let expanded = self.expand(content, Some((target, *index)))?;
                originals = Some(expanded.clone());
                expanded
            };
            if nodes.is_empty() {
                continue;
            }
            insert(target, &nodes)?;
            inserted.extend(nodes);
        }
        Ok(inserted)
    }

    /// One wrapper element per call: the first element of the expanded
    /// content, copied so the content itself stays where it is.
    fn wrapper_for(
        &self,
        content: &Insertable<'_>,
        template: &mut Option<Node>,
        target: (&Node, usize),
    ) -> Result<Node, NodesError> {
        if !content.is_callback() {
            if let Some(template) = template.as_ref() {
                return Ok(template.clone_node(true)?);
            }
        }
        let element = self
            .expand(content, Some(target))?
            .into_iter()
            .find(Node::is_element)
            .ok_or_else(|| {
                NodesError::InvalidElements("wrapping content contains no element".to_string())
            })?;
        let wrapper = element.clone_node(true)?;
        if !content.is_callback() {
            *template = Some(element);
        }
        Ok(wrapper)
    }

    /// Appends content to every held element and returns a collection of
    /// the inserted nodes. On an empty collection of a document without a
    /// document element, the first element of the content becomes the
    /// document element.
    ///
    /// [`Appendable`](crate::mutation::Appendable) content appends itself
    /// to every held element, or to the document node when a document
    /// element is being created.
    pub fn append<'a>(&self, content: impl Into<Insertable<'a>>) -> Result<Nodes, NodesError> {
        let content = content.into();
        let document = self.document();
        let creates_root = self.is_empty() && document.document_element().is_none();
        if let Insertable::Appendable(appendable) = &content {
            let targets = if creates_root {
                vec![document.root()]
            } else {
                self.element_targets().into_iter().map(|(_, n)| n).collect()
            };
            let mut inserted = Vec::new();
            for target in targets {
                inserted.extend(appendable.append_to(&target)?);
            }
            return self.spawn_with(inserted);
        }
        if creates_root {
            let root = document.root();
            let created = self
                .expand(&content, Some((&root, 0)))?
                .into_iter()
                .find(Node::is_element);
            return match created {
                Some(element) => {
                    root.append_child(&element)?;
                    self.spawn_with(element)
                }
                None => Ok(self.spawn()),
            };
        }
        let inserted = self.distribute(&self.element_targets(), &content, |target, nodes| {
            target.append_children(nodes)
        })?;
        self.spawn_with(inserted)
    }

    /// Inserts content before the first child of every held element.
    pub fn prepend<'a>(&self, content: impl Into<Insertable<'a>>) -> Result<Nodes, NodesError> {
        let inserted = self.distribute(&self.element_targets(), &content.into(), |target, nodes| {
            target.prepend_children(nodes)
        })?;
        self.spawn_with(inserted)
    }

    /// Inserts content after every held node that has a parent.
    pub fn after<'a>(&self, content: impl Into<Insertable<'a>>) -> Result<Nodes, NodesError> {
        let inserted = self.distribute(&self.attached_targets(), &content.into(), |target, nodes| {
            match target.parent() {
                Some(parent) => parent.insert_before(nodes, target.next_sibling().as_ref()),
                None => Ok(()),
            }
        })?;
        self.spawn_with(inserted)
    }

    /// Inserts content before every held node that has a parent.
    pub fn before<'a>(&self, content: impl Into<Insertable<'a>>) -> Result<Nodes, NodesError> {
        let inserted = self.distribute(&self.attached_targets(), &content.into(), |target, nodes| {
            match target.parent() {
                Some(parent) => parent.insert_before(nodes, Some(target)),
                None => Ok(()),
            }
        })?;
        self.spawn_with(inserted)
    }

    /// Moves the held nodes into every element the selector resolves to
    /// (copies for all but the first) and returns the inserted nodes.
    pub fn append_to<'a>(&self, selector: impl Into<Selector<'a>>) -> Result<Nodes, NodesError> {
        let targets: Vec<(usize, Node)> = self
            .resolve(&selector.into(), None)?
            .into_iter()
            .filter(Node::is_element)
            .enumerate()
            .collect();
        let content = Insertable::Nodes(self.to_vec());
        let inserted = self.distribute(&targets, &content, |target, nodes| {
            target.append_children(nodes)
        })?;
        self.spawn_with(inserted)
    }

    /// Replaces every held node with the content. The returned collection
    /// holds the replaced, now detached, nodes.
    pub fn replace_with<'a>(&self, content: impl Into<Insertable<'a>>) -> Result<Nodes, NodesError> {
        let targets = self.attached_targets();
        self.distribute(&targets, &content.into(), |target, nodes| target.replace_with(nodes))?;
        self.spawn_with(targets.into_iter().map(|(_, n)| n).collect::<Vec<_>>())
    }

    /// Replaces every node the selector resolves to with the held nodes
    /// and returns the inserted nodes.
    pub fn replace_all<'a>(&self, selector: impl Into<Selector<'a>>) -> Result<Nodes, NodesError> {
        let targets: Vec<(usize, Node)> = self
            .resolve(&selector.into(), None)?
            .into_iter()
            .filter(|n| n.parent().is_some())
            .enumerate()
            .collect();
        let content = Insertable::Nodes(self.to_vec());
        let inserted =
            self.distribute(&targets, &content, |target, nodes| target.replace_with(nodes))?;
        self.spawn_with(inserted)
    }

    /// Wraps every held node that has a parent in its own copy of the
    /// first element of the content.
    pub fn wrap<'a>(&self, content: impl Into<Insertable<'a>>) -> Result<Nodes, NodesError> {
        let content = content.into();
        let mut template = None;
        for (index, node) in self.attached_targets() {
            let wrapper = self.wrapper_for(&content, &mut template, (&node, index))?;
            if let Some(parent) = node.parent() {
                parent.insert_before(std::slice::from_ref(&wrapper), Some(&node))?;
                innermost(&wrapper).append_child(&node)?;
            }
        }
        Ok(self.clone())
    }

    /// Wraps all held nodes in one copy of the first element of the content,
    /// placed where the first node (in document order) was.
    pub fn wrap_all<'a>(&self, content: impl Into<Insertable<'a>>) -> Result<Nodes, NodesError> {
        let nodes = sort_nodes(&self.document(), &self.to_vec())?;
        let Some(first) = nodes.iter().find(|n| n.parent().is_some()).cloned() else {
            return Ok(self.clone());
        };
        let content = content.into();
        let wrapper = self.wrapper_for(&content, &mut None, (&first, 0))?;
        if let Some(parent) = first.parent() {
            parent.insert_before(std::slice::from_ref(&wrapper), Some(&first))?;
            innermost(&wrapper).append_children(&nodes)?;
        }
        Ok(self.clone())
    }

    /// Wraps the children of every held element.
    pub fn wrap_inner<'a>(&self, content: impl Into<Insertable<'a>>) -> Result<Nodes, NodesError> {
        let content = content.into();
        let mut template = None;
        for (index, element) in self.element_targets() {
            let wrapper = self.wrapper_for(&content, &mut template, (&element, index))?;
            let children = element.children();
            innermost(&wrapper).append_children(&children)?;
            element.append_child(&wrapper)?;
        }
        Ok(self.clone())
    }

    /// Detaches every held node from the tree. The nodes stay in the
    /// collection and can be inserted again.
    pub fn remove(&self) -> Nodes {
        for node in self.iter() {
            node.remove();
        }
        self.clone()
    }

    /// Removes all children of every held node.
    pub fn empty(&self) -> Nodes {
        for node in self.iter() {
            for child in node.children() {
                child.remove();
            }
        }
        self.clone()
    }

    /// The text content of all held nodes, concatenated.
    pub fn text(&self) -> String {
        self.iter().map(|node| node.text_content()).collect()
    }

    /// Replaces the content of every held node with one text node.
    pub fn set_text(&self, text: &str) -> Result<Nodes, NodesError> {
        for node in self.iter() {
            node.set_text_content(text)?;
        }
        Ok(self.clone())
    }

    /// Markup of the first held node, or an empty string. HTML collections
    /// use HTML rules.
    pub fn outer_xml(&self) -> Result<String, NodesError> {
        let Some(node) = self.get(0) else {
            return Ok(String::new());
        };
        if self.content_type().is_html() {
            Ok(node.to_html())
        } else {
            Ok(node.to_xml()?)
        }
    }

    /// Markup of the children of the first held node.
    pub fn inner_xml(&self) -> Result<String, NodesError> {
        let Some(node) = self.get(0) else {
            return Ok(String::new());
        };
        let html = self.content_type().is_html();
        let mut markup = String::new();
        for child in node.children() {
            if html {
                markup.push_str(&child.to_html());
            } else {
                markup.push_str(&child.to_xml()?);
            }
        }
        Ok(markup)
    }
}
