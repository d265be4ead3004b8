// src/nodes/builder.rs
use crate::content_type::ContentType;
use crate::error::NodesError;
use crate::nodes::{Nodes, State};
use arbor_loader::{Loadable, LoaderOptions, Loaders};
use indexmap::IndexMap;
use std::rc::Rc;

/// A builder for configuring a `Nodes` collection before anything is loaded.
pub struct NodesBuilder {
    content_type: ContentType,
    loaders: Loaders,
    options: LoaderOptions,
    namespaces: IndexMap<String, String>,
    prepare_selector: Option<Rc<dyn Fn(&str) -> String>>,
}

impl Default for NodesBuilder {
    fn default() -> Self {
        Self {
            content_type: ContentType::Xml,
            loaders: Loaders::default(),
            options: LoaderOptions::default(),
            namespaces: IndexMap::new(),
            prepare_selector: None,
        }
    }
}

impl NodesBuilder {
    /// Creates a builder with the XML, HTML and JSON loaders registered.
    pub fn new() -> Self { Default::default() }

    /// Sets the content type from any spelling of the normalization table.
    pub fn with_content_type(mut self, content_type: &str) -> Result<Self, NodesError> {
        self.content_type = ContentType::normalize(content_type)?;
        Ok(self)
    }

    /// Replaces the whole loader set.
    pub fn with_loaders(mut self, loaders: Loaders) -> Self { self.loaders = loaders; self }

    /// Registers one more loader after the existing ones.
    pub fn with_loader(mut self, loader: impl Loadable + 'static) -> Self { self.loaders.add(loader); self }

    pub fn with_loader_options(mut self, options: LoaderOptions) -> Self { self.options = options; self }

    /// Binds a namespace prefix for selectors.
    pub fn with_namespace(mut self, prefix: &str, uri: &str) -> Self {
        self.namespaces.insert(prefix.to_string(), uri.to_string());
        self
    }

    /// Installs a hook that rewrites every selector expression before it is
    /// evaluated.
    pub fn with_prepare_selector(mut self, hook: impl Fn(&str) -> String + 'static) -> Self {
        self.prepare_selector = Some(Rc::new(hook));
        self
    }

    /// Consumes the builder and creates an empty collection.
    pub fn build(self) -> Nodes {
        Nodes::from_state(State {
            nodes: Vec::new(),
            parent: None,
            content_type: self.content_type,
            document: None,
            namespaces: self.namespaces,
            prepare_selector: self.prepare_selector,
            use_document_context: true,
            format_output: false,
            loaders: self.loaders,
            options: self.options,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_configured_collection() {
        let nodes = NodesBuilder::new()
            .with_content_type("html")
            .unwrap()
            .with_namespace("a", "urn:a")
            .with_loader_options(LoaderOptions::default().with_max_depth(2))
            .build();
        assert_eq!(nodes.content_type(), ContentType::Html);
        assert_eq!(nodes.namespaces().get("a").map(String::as_str), Some("urn:a"));
        assert_eq!(nodes.document().namespaces().get("a").map(String::as_str), Some("urn:a"));
        assert!(nodes.is_empty());
    }

    #[test]
    fn rejects_unknown_content_types() {
        assert!(matches!(
            NodesBuilder::new().with_content_type("image/png"),
            Err(NodesError::InvalidContentType(_))
        ));
    }

    #[test]
    fn prepare_selector_rewrites_expressions() {
        let nodes = NodesBuilder::new()
            .with_prepare_selector(|selector| format!("//{}", selector))
            .build()
            .load("<root><item/><item/></root>", "xml")
            .unwrap();
        assert_eq!(nodes.find("item").unwrap().len(), 2);
    }
}
