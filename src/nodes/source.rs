use crate::nodes::Nodes;
use arbor_dom::{DocumentRef, Node};
use arbor_loader::LoadSource;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Anything a collection can be loaded from.
#[derive(Debug, Clone, Copy)]
pub enum Source<'a> {
    /// Another collection; its document is shared.
    Nodes(&'a Nodes),
    /// An existing document.
    Document(&'a DocumentRef),
    /// A single node; the collection holds exactly that node.
    Node(&'a Node),
    /// Text, a file or a JSON value handed to the loader set.
    Data(LoadSource<'a>),
}

impl<'a> From<&'a Nodes> for Source<'a> {
    fn from(nodes: &'a Nodes) -> Self {
        Source::Nodes(nodes)
    }
}

impl<'a> From<&'a DocumentRef> for Source<'a> {
    fn from(document: &'a DocumentRef) -> Self {
        Source::Document(document)
    }
}

impl<'a> From<&'a Node> for Source<'a> {
    fn from(node: &'a Node) -> Self {
        Source::Node(node)
    }
}

impl<'a> From<LoadSource<'a>> for Source<'a> {
    fn from(source: LoadSource<'a>) -> Self {
        Source::Data(source)
    }
}

impl<'a> From<&'a str> for Source<'a> {
    fn from(text: &'a str) -> Self {
        Source::Data(LoadSource::Text(text))
    }
}

impl<'a> From<&'a String> for Source<'a> {
    fn from(text: &'a String) -> Self {
        Source::Data(LoadSource::Text(text))
    }
}

impl<'a> From<&'a Path> for Source<'a> {
    fn from(path: &'a Path) -> Self {
        Source::Data(LoadSource::File(path))
    }
}

impl<'a> From<&'a PathBuf> for Source<'a> {
    fn from(path: &'a PathBuf) -> Self {
        Source::Data(LoadSource::File(path))
    }
}

impl<'a> From<&'a Value> for Source<'a> {
    fn from(value: &'a Value) -> Self {
        Source::Data(LoadSource::Json(value))
    }
}
