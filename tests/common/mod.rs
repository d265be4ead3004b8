#![allow(dead_code)]

pub mod fixtures;

use arbor::{Node, Nodes, NodesError};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Installs `env_logger` once so `RUST_LOG=arbor=trace` works in tests.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// The reference `<items>` document as a fresh collection.
pub fn items() -> Result<Nodes, NodesError> {
    init_logging();
    Nodes::from_source(fixtures::ITEMS_XML, "text/xml")
}

/// Node names of a collection, in collection order.
pub fn names(nodes: &Nodes) -> Vec<String> {
    nodes.iter().map(|n| n.node_name()).collect()
}

/// Text content of every held node.
pub fn texts(nodes: &Nodes) -> Vec<String> {
    nodes.iter().map(|n: Node| n.text_content()).collect()
}

/// Markup of the document element, without the XML declaration.
pub fn root_xml(nodes: &Nodes) -> Result<String, Box<dyn std::error::Error>> {
    let root = nodes
        .document()
        .document_element()
        .ok_or("document has no document element")?;
    Ok(root.to_xml()?)
}
