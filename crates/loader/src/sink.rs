//! Incremental tree construction shared by the markup loaders.

use crate::error::LoadingError;
use arbor_dom::name::split_qname;
use arbor_dom::{DocumentRef, Node};

pub(crate) struct TreeSink {
    doc: DocumentRef,
    container: Node,
    open: Vec<Node>,
    pending: String,
    keep_blank: bool,
    /// Skip attributes with invalid names instead of failing.
    lenient: bool,
    position: u64,
}

impl TreeSink {
    pub(crate) fn new(container: Node, keep_blank: bool) -> Self {
        Self {
            doc: container.document(),
            container,
            open: Vec::new(),
            pending: String::new(),
            keep_blank,
            lenient: false,
            position: 0,
        }
    }

    pub(crate) fn lenient(mut self) -> Self {
        self.lenient = true;
        self
    }

    pub(crate) fn at(&mut self, position: u64) {
        self.position = position;
    }

    pub(crate) fn depth(&self) -> usize {
        self.open.len()
    }

    fn current(&self) -> &Node {
        self.open.last().unwrap_or(&self.container)
    }

    pub(crate) fn text(&mut self, text: &str) {
        self.pending.push_str(text);
    }

    fn flush(&mut self) -> Result<(), LoadingError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let text = std::mem::take(&mut self.pending);
        let blank = text.chars().all(char::is_whitespace);
        let parent = self.current().clone();
        if parent.is_document() {
            if blank {
                return Ok(());
            }
            return Err(LoadingError::malformed(
                self.position,
                "text outside the document element",
            ));
        }
        if blank && !self.keep_blank {
            return Ok(());
        }
        parent.append_child(&self.doc.create_text(&text))?;
        Ok(())
    }

    /// Creates an element under the current node. Namespace declarations in
    /// `attributes` apply to the element's own name and its attributes.
    pub(crate) fn start_element(
        &mut self,
        name: &str,
        attributes: &[(String, String)],
        self_closing: bool,
    ) -> Result<Node, LoadingError> {
        self.flush()?;
        let parent = self.current().clone();
        if parent.is_document() && parent.first_element_child().is_some() {
            return Err(LoadingError::malformed(
                self.position,
                format!("second document element <{}>", name),
            ));
        }
        let prefix = split_qname(name).0;
        let declared = attributes.iter().find(|(key, _)| match prefix {
            Some(p) => key.strip_prefix("xmlns:") == Some(p),
            None => key == "xmlns",
        });
        let namespace = match declared {
            Some((_, uri)) => Some(uri.clone()).filter(|uri| !uri.is_empty()),
            None => parent.lookup_namespace_uri(prefix),
        };
        let element = self.doc.create_element_ns(namespace.as_deref(), name)?;
        let (declarations, plain): (Vec<_>, Vec<_>) = attributes
            .iter()
            .partition(|(key, _)| key == "xmlns" || key.starts_with("xmlns:"));
        for (key, value) in declarations.into_iter().chain(plain) {
            match element.set_attribute(key, value) {
                Ok(()) => {}
                Err(e) if self.lenient => {
                    log::debug!("Skipping attribute '{}' on <{}>: {}", key, name, e);
                }
                Err(e) => return Err(e.into()),
            }
        }
        parent.append_child(&element)?;
        if !self_closing {
            self.open.push(element.clone());
        }
        Ok(element)
    }

    /// Closes the innermost open element.
    pub(crate) fn end_element(&mut self) -> Result<(), LoadingError> {
        self.flush()?;
        if self.open.pop().is_none() {
            return Err(LoadingError::malformed(self.position, "unexpected end tag"));
        }
        Ok(())
    }

    /// Closes elements up to and including the innermost one named `name`.
    /// Returns false, closing nothing, when no such element is open.
    pub(crate) fn end_element_named(&mut self, name: &str) -> Result<bool, LoadingError> {
        self.flush()?;
        match self.open.iter().rposition(|n| n.node_name() == name) {
            Some(index) => {
                self.open.truncate(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub(crate) fn is_open(&self, name: &str) -> bool {
        self.open.iter().any(|n| n.node_name() == name)
    }

    pub(crate) fn current_name(&self) -> Option<String> {
        self.open.last().map(Node::node_name)
    }

    /// Appends a comment, CDATA section or processing instruction.
    pub(crate) fn append(&mut self, node: Node) -> Result<(), LoadingError> {
        self.flush()?;
        let parent = self.current().clone();
        parent.append_child(&node)?;
        Ok(())
    }

    pub(crate) fn document(&self) -> &DocumentRef {
        &self.doc
    }

    pub(crate) fn builds_document(&self) -> bool {
        self.container.is_document()
    }

    /// Flushes pending text and returns the container's children.
    pub(crate) fn finish(mut self) -> Result<Vec<Node>, LoadingError> {
        self.flush()?;
        Ok(self.container.children())
    }
}
