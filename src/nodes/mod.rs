//! The node collection: an ordered list of node handles bound to one
//! document, linked to the collection it was spawned from.

pub mod builder;
pub mod property;
pub mod source;

pub use builder::NodesBuilder;
pub use property::{Property, PropertyValue};
pub use source::Source;

use crate::content_type::ContentType;
use crate::error::NodesError;
use crate::selector::Selector;
use crate::sort::sort_nodes;
use arbor_dom::{DocumentRef, Node, QueryValue, SerializeOptions};
use arbor_loader::{Loadable, LoaderOptions, Loaders};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Counts the preceding siblings that are elements or non-blank text.
const SIBLING_INDEX: &str =
    "count(preceding-sibling::node()[self::* or (self::text() and normalize-space(.) != '')])";

pub(crate) struct State {
    pub(crate) nodes: Vec<Node>,
    pub(crate) parent: Option<Weak<RefCell<State>>>,
    pub(crate) content_type: ContentType,
    pub(crate) document: Option<DocumentRef>,
    pub(crate) namespaces: IndexMap<String, String>,
    pub(crate) prepare_selector: Option<Rc<dyn Fn(&str) -> String>>,
    pub(crate) use_document_context: bool,
    pub(crate) format_output: bool,
    pub(crate) loaders: Loaders,
    pub(crate) options: LoaderOptions,
}

/// Which held nodes [`Nodes::each`] visits.
#[derive(Clone, Copy, Default)]
pub enum NodeFilter<'f> {
    #[default]
    All,
    ElementsOnly,
    Predicate(&'f dyn Fn(&Node, usize) -> bool),
}

impl NodeFilter<'_> {
    fn accepts(&self, node: &Node, index: usize) -> bool {
        match self {
            NodeFilter::All => true,
            NodeFilter::ElementsOnly => node.is_element(),
            NodeFilter::Predicate(predicate) => predicate(node, index),
        }
    }
}

/// A shared handle to a node collection. Cloning the handle does not copy
/// the collection; use [`Nodes::ptr_eq`] to compare identities.
#[derive(Clone)]
pub struct Nodes(Rc<RefCell<State>>);

impl Default for Nodes {
    fn default() -> Self {
        NodesBuilder::new().build()
    }
}

impl fmt::Debug for Nodes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.0.borrow();
        f.debug_struct("Nodes")
            .field("nodes", &state.nodes)
            .field("content_type", &state.content_type)
            .field("use_document_context", &state.use_document_context)
            .finish()
    }
}

impl Nodes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> NodesBuilder {
        NodesBuilder::new()
    }

    pub(crate) fn from_state(state: State) -> Self {
        Nodes(Rc::new(RefCell::new(state)))
    }

    /// Creates a collection with the default configuration and loads `source`.
    pub fn from_source<'a>(
        source: impl Into<Source<'a>>,
        content_type: &str,
    ) -> Result<Nodes, NodesError> {
        Nodes::new().load(source, content_type)
    }

    pub fn ptr_eq(&self, other: &Nodes) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    // --- loading ---

    /// Replaces the document of this collection. Content types the
    /// normalization table does not know (`json`, custom loader types) are
    /// handed to the loaders as-is and leave the collection at `text/xml`.
    pub fn load<'a>(
        &self,
        source: impl Into<Source<'a>>,
        content_type: &str,
    ) -> Result<Nodes, NodesError> {
        let (document, nodes, use_document_context) = match source.into() {
            Source::Nodes(other) => (other.document(), Vec::new(), true),
            Source::Document(document) => (document.clone(), Vec::new(), true),
            Source::Node(node) => (node.document(), vec![node.clone()], false),
            Source::Data(data) => {
                let (loaders, options) = {
                    let state = self.0.borrow();
                    (state.loaders.clone(), state.options.clone())
                };
                match loaders.load(&data, content_type, &options)? {
                    Some(document) => (document, Vec::new(), true),
                    None => {
                        log::debug!("No loader accepted the source as '{}'", content_type);
                        return Err(NodesError::InvalidSource);
                    }
                }
            }
        };
        {
            let mut state = self.0.borrow_mut();
            for (prefix, uri) in &state.namespaces {
                document.register_namespace(prefix, uri);
            }
            state.document = Some(document);
            state.nodes = nodes;
            state.use_document_context = use_document_context;
        }
        self.apply_content_type(ContentType::normalize_or_xml(content_type));
        Ok(self.clone())
    }

    // --- linking ---

    /// An empty collection sharing this collection's document, query
    /// context (including the document-context flag) and namespaces, with
    /// `self` as parent.
    pub fn spawn(&self) -> Nodes {
        let document = self.document();
        let state = self.0.borrow();
        Nodes::from_state(State {
            nodes: Vec::new(),
            parent: Some(Rc::downgrade(&self.0)),
            content_type: state.content_type,
            document: Some(document),
            namespaces: state.namespaces.clone(),
            prepare_selector: state.prepare_selector.clone(),
            use_document_context: state.use_document_context,
            format_output: state.format_output,
            loaders: state.loaders.clone(),
            options: state.options.clone(),
        })
    }

    /// [`spawn`](Self::spawn) followed by [`push`](Self::push).
    pub fn spawn_with<'a>(&self, elements: impl Into<Selector<'a>>) -> Result<Nodes, NodesError> {
        self.spawn().push(elements, false)
    }

    /// The parent collection, or `self` for a root collection or when the
    /// parent has already been dropped.
    pub fn end(&self) -> Nodes {
        self.0
            .borrow()
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(Nodes)
            .unwrap_or_else(|| self.clone())
    }

    /// Appends nodes in input order without deduplication. Every node is
    /// checked before anything is added. A successful push switches the
    /// document context off, even when nothing was added.
    pub fn push<'a>(
        &self,
        elements: impl Into<Selector<'a>>,
        ignore_text: bool,
    ) -> Result<Nodes, NodesError> {
        let candidates = match elements.into() {
            Selector::Node(node) => vec![node],
            Selector::List(nodes) => nodes,
            Selector::Collection(other) => other.to_vec(),
            Selector::Expression(expr) => {
                return Err(NodesError::InvalidElements(format!(
                    "expected nodes, got expression '{}'",
                    expr
                )));
            }
            Selector::Callback(_) => {
                return Err(NodesError::InvalidElements(
                    "expected nodes, got a callback".to_string(),
                ));
            }
        };
        let document = self.document();
        if let Some(index) = candidates.iter().position(|n| !n.belongs_to(&document)) {
            log::trace!("Rejecting push: node {} belongs to another document", index);
            return Err(NodesError::ForeignNode(index));
        }
        let mut state = self.0.borrow_mut();
        state.use_document_context = false;
        state
            .nodes
            .extend(candidates.into_iter().filter(|n| !(ignore_text && n.is_text())));
        drop(state);
        Ok(self.clone())
    }

    // --- querying ---

    /// Resolves `selector` against the held nodes, or against the whole
    /// document when this collection uses the document context.
    pub fn find<'a>(&self, selector: impl Into<Selector<'a>>) -> Result<Nodes, NodesError> {
        self.find_with(&selector.into(), self.uses_document_context())
    }

    /// Resolves `selector` once against the whole document.
    pub fn find_in_document<'a>(
        &self,
        selector: impl Into<Selector<'a>>,
    ) -> Result<Nodes, NodesError> {
        self.find_with(&selector.into(), true)
    }

    fn find_with(&self, selector: &Selector<'_>, document_context: bool) -> Result<Nodes, NodesError> {
        let found = if document_context {
            self.resolve(selector, None)?
        } else {
            let mut found = Vec::new();
            for node in self.to_vec() {
                found.extend(self.resolve(selector, Some(&node))?);
            }
            found
        };
        self.spawn_with(found)
    }

    /// True when the expression selects at least one node or evaluates to
    /// a truthy scalar with `context` (or the document node) as context.
    pub fn matches(&self, selector: &str, context: Option<&Node>) -> Result<bool, NodesError> {
        let expr = self.prepare_selector(selector);
        Ok(self.document().evaluate(&expr, context)?.to_bool())
    }

    /// Calls `f` for every held node accepted by `filter`, with its position
    /// in the collection.
    pub fn each(&self, mut f: impl FnMut(&Node, usize), filter: NodeFilter<'_>) -> Nodes {
        for (index, node) in self.to_vec().iter().enumerate() {
            if filter.accepts(node, index) {
                f(node, index);
            }
        }
        self.clone()
    }

    /// Position of the first held node among its siblings, counting
    /// elements and non-blank text nodes. `None` for an empty collection.
    pub fn index(&self) -> Result<Option<usize>, NodesError> {
        let Some(first) = self.get(0) else {
            return Ok(None);
        };
        match self.document().evaluate(SIBLING_INDEX, Some(&first))? {
            QueryValue::Number(n) => Ok(Some(n as usize)),
            other => Err(NodesError::InvalidSelectorResult(other.to_string())),
        }
    }

    /// Position of the first held node matching an expression, or of the
    /// first node the selector resolves to.
    pub fn index_of<'a>(&self, selector: impl Into<Selector<'a>>) -> Result<Option<usize>, NodesError> {
        let nodes = self.to_vec();
        match selector.into() {
            Selector::Expression(expr) => {
                for (index, node) in nodes.iter().enumerate() {
                    if self.matches(&expr, Some(node))? {
                        return Ok(Some(index));
                    }
                }
                Ok(None)
            }
            other => {
                let target = self.resolve(&other, None)?;
                Ok(target
                    .first()
                    .and_then(|first| nodes.iter().position(|n| n == first)))
            }
        }
    }

    /// A spawned collection with the held nodes deduplicated and in
    /// document order.
    pub fn unique(&self) -> Result<Nodes, NodesError> {
        let sorted = sort_nodes(&self.document(), &self.to_vec())?;
        self.spawn_with(sorted)
    }

    // --- content type ---

    pub fn content_type(&self) -> ContentType {
        self.0.borrow().content_type
    }

    pub fn set_content_type(&self, content_type: &str) -> Result<(), NodesError> {
        self.apply_content_type(ContentType::normalize(content_type)?);
        Ok(())
    }

    /// Sets the content type and walks up the parent chain while the value
    /// keeps changing.
    pub(crate) fn apply_content_type(&self, content_type: ContentType) {
        let mut current = Some(self.0.clone());
        while let Some(state) = current {
            let mut state = state.borrow_mut();
            if state.content_type == content_type {
                break;
            }
            state.content_type = content_type;
            current = state.parent.as_ref().and_then(Weak::upgrade);
        }
    }

    // --- accessors ---

    pub fn len(&self) -> usize {
        self.0.borrow().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().nodes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Node> {
        self.0.borrow().nodes.get(index).cloned()
    }

    /// A snapshot of the held nodes.
    pub fn to_vec(&self) -> Vec<Node> {
        self.0.borrow().nodes.clone()
    }

    /// Iterates over a snapshot, so the collection may change meanwhile.
    pub fn iter(&self) -> std::vec::IntoIter<Node> {
        self.to_vec().into_iter()
    }

    pub fn uses_document_context(&self) -> bool {
        self.0.borrow().use_document_context
    }

    /// The document of this collection, created empty on first use.
    pub fn document(&self) -> DocumentRef {
        let mut state = self.0.borrow_mut();
        if let Some(document) = &state.document {
            return document.clone();
        }
        let document = DocumentRef::new();
        for (prefix, uri) in &state.namespaces {
            document.register_namespace(prefix, uri);
        }
        state.document = Some(document.clone());
        document
    }

    /// The namespace prefixes bound on this collection.
    pub fn namespaces(&self) -> IndexMap<String, String> {
        self.0.borrow().namespaces.clone()
    }

    /// Binds `prefix` for this collection, collections spawned from it
    /// later, and every query on its document.
    pub fn register_namespace(&self, prefix: &str, uri: &str) {
        let document = self.document();
        document.register_namespace(prefix, uri);
        self.0
            .borrow_mut()
            .namespaces
            .insert(prefix.to_string(), uri.to_string());
    }

    pub fn set_prepare_selector(&self, hook: Option<Box<dyn Fn(&str) -> String>>) {
        self.0.borrow_mut().prepare_selector = hook.map(Rc::from);
    }

    pub(crate) fn prepare_selector(&self, selector: &str) -> String {
        let hook = self.0.borrow().prepare_selector.clone();
        match hook {
            Some(hook) => hook(selector),
            None => selector.to_string(),
        }
    }

    pub fn loaders(&self) -> Loaders {
        self.0.borrow().loaders.clone()
    }

    pub fn set_loaders(&self, loaders: Loaders) {
        self.0.borrow_mut().loaders = loaders;
    }

    pub fn loader_options(&self) -> LoaderOptions {
        self.0.borrow().options.clone()
    }

    /// Parses markup into detached nodes of this collection's document,
    /// using the fragment loader of its content type.
    pub(crate) fn parse_fragment(&self, markup: &str) -> Result<Vec<Node>, NodesError> {
        let document = self.document();
        let (loaders, options, content_type) = {
            let state = self.0.borrow();
            (state.loaders.clone(), state.options.clone(), state.content_type)
        };
        Ok(loaders.load_fragment(markup, content_type.as_str(), &document, &options)?)
    }

    // --- output ---

    /// Prepares the document for indented output: optionally changes the
    /// content type, drops whitespace-only text nodes and resets this
    /// collection to an unlinked, empty, document-context collection.
    pub fn format_output(&self, content_type: Option<&str>) -> Result<Nodes, NodesError> {
        if let Some(content_type) = content_type {
            self.set_content_type(content_type)?;
        }
        let document = self.document();
        for node in document.root().descendants() {
            if node.is_whitespace() {
                node.remove();
            }
        }
        let mut state = self.0.borrow_mut();
        state.nodes.clear();
        state.parent = None;
        state.use_document_context = true;
        state.format_output = true;
        drop(state);
        Ok(self.clone())
    }
}

impl fmt::Display for Nodes {
    /// Renders the whole document.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let document = self.document();
        let (content_type, indent) = {
            let state = self.0.borrow();
            (state.content_type, state.format_output)
        };
        if content_type.is_html() {
            f.write_str(&document.to_html())
        } else {
            let xml = document
                .to_xml(SerializeOptions { indent })
                .map_err(|_| fmt::Error)?;
            f.write_str(&xml)
        }
    }
}

impl<'a> IntoIterator for &'a Nodes {
    type Item = Node;
    type IntoIter = std::vec::IntoIter<Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const XML: &str = "<items version=\"1.0\"><group id=\"1st\"><item index=\"0\">text1</item>\
                       <item index=\"1\">text2</item><item index=\"2\">text3</item></group></items>";

    fn load() -> Nodes {
        Nodes::from_source(XML, "text/xml").unwrap()
    }

    #[test]
    fn spawn_links_back_to_parent() {
        let nodes = load();
        let child = nodes.spawn();
        assert!(child.end().ptr_eq(&nodes));
        assert!(nodes.end().ptr_eq(&nodes));
        assert_eq!(child.document(), nodes.document());
    }

    #[test]
    fn end_falls_back_to_self_once_parent_is_gone() {
        let child = load().spawn();
        assert!(child.end().ptr_eq(&child));
    }

    #[test]
    fn find_in_document_context() {
        let nodes = load();
        let items = nodes.find("//item").unwrap();
        assert_eq!(items.len(), 3);
        assert!(!items.uses_document_context());
        assert_eq!(items.get(0).unwrap().text_content(), "text1");
    }

    #[test]
    fn find_per_context_node_keeps_duplicates() {
        let nodes = load();
        let items = nodes.find("//item").unwrap();
        let groups = items.find("..").unwrap();
        assert_eq!(groups.len(), 3);
        assert_eq!(groups.unique().unwrap().len(), 1);
    }

    #[test]
    fn find_on_empty_list_is_empty() {
        let nodes = load();
        let empty = nodes.spawn_with(Vec::<Node>::new()).unwrap();
        assert!(!empty.uses_document_context());
        assert!(empty.find("//item").unwrap().is_empty());
        assert_eq!(empty.find_in_document("//item").unwrap().len(), 3);
    }

    #[test]
    fn push_rejects_foreign_nodes_without_changes() {
        let nodes = load();
        let item = nodes.document().select("//item", None).unwrap();
        let foreign = DocumentRef::new().create_element("x").unwrap();
        let list = vec![item[0].clone(), foreign];
        assert!(matches!(
            nodes.push(list, false),
            Err(NodesError::ForeignNode(1))
        ));
        assert!(nodes.is_empty());
        assert!(nodes.uses_document_context());
    }

    #[test]
    fn push_rejects_expressions_and_skips_text() {
        let nodes = load();
        assert!(matches!(
            nodes.push("//item", false),
            Err(NodesError::InvalidElements(_))
        ));
        assert!(nodes.uses_document_context());
        let text = nodes.document().select("//item/text()", None).unwrap();
        nodes.push(text[0].clone(), true).unwrap();
        assert!(nodes.is_empty());
        assert!(!nodes.uses_document_context());
        nodes.push(text, false).unwrap();
        assert_eq!(nodes.len(), 3);
    }

    #[test]
    fn single_node_collections_resolve_against_the_node() {
        let nodes = Nodes::from_source("<r><g><i/></g><i/></r>", "xml").unwrap();
        let group = nodes.document().select("//g", None).unwrap().remove(0);
        let held = nodes.spawn_with(group).unwrap();
        assert!(!held.uses_document_context());
        assert_eq!(held.find("i").unwrap().len(), 1);
        assert_eq!(held.find(".//i").unwrap().len(), 1);
        assert_eq!(held.find_in_document("//i").unwrap().len(), 2);
    }

    #[test]
    fn spawn_inherits_the_document_context_flag() {
        let nodes = Nodes::from_source("<a><b/></a>", "xml").unwrap();
        assert!(nodes.spawn().uses_document_context());
        let list = nodes.spawn_with(Vec::<Node>::new()).unwrap();
        let spawned = list.spawn();
        assert!(!spawned.uses_document_context());
        assert!(spawned.find("//b").unwrap().is_empty());
    }

    #[test]
    fn index_counts_meaningful_siblings() {
        let nodes = load();
        assert_eq!(nodes.index().unwrap(), None);
        let items = nodes.find("//item").unwrap();
        assert_eq!(items.index().unwrap(), Some(0));
        assert_eq!(nodes.find("//item[3]").unwrap().index().unwrap(), Some(2));
        assert_eq!(items.index_of("@index = '1'").unwrap(), Some(1));
        let last = items.get(2).unwrap();
        assert_eq!(items.index_of(last).unwrap(), Some(2));
        assert_eq!(items.index_of("@index = '7'").unwrap(), None);
    }

    #[test]
    fn load_from_node_holds_just_that_node() {
        let nodes = load();
        let group = nodes.document().select("//group", None).unwrap();
        let other = Nodes::from_source(&group[0], "xml").unwrap();
        assert_eq!(other.len(), 1);
        assert!(!other.uses_document_context());
        assert_eq!(other.find("item").unwrap().len(), 3);
    }

    #[test]
    fn load_reuses_documents_of_other_collections() {
        let nodes = load();
        let other = Nodes::from_source(&nodes, "html").unwrap();
        assert_eq!(other.document(), nodes.document());
        assert_eq!(other.content_type(), ContentType::Html);
    }

    #[test]
    fn unsupported_sources_fail() {
        let nodes = Nodes::new();
        assert!(matches!(
            nodes.load("a,b", "text/csv"),
            Err(NodesError::InvalidSource)
        ));
    }

    #[test]
    fn content_type_changes_propagate_to_parents() {
        let root = load();
        let child = root.spawn();
        let grandchild = child.spawn();
        grandchild.set_content_type("html").unwrap();
        assert_eq!(root.content_type(), ContentType::Html);
        assert_eq!(child.content_type(), ContentType::Html);
        assert!(matches!(
            grandchild.set_content_type("text/plain"),
            Err(NodesError::InvalidContentType(_))
        ));
        assert_eq!(grandchild.content_type(), ContentType::Html);
    }

    #[test]
    fn namespaces_reach_spawned_collections_and_queries() {
        let nodes = Nodes::from_source(r#"<r xmlns="urn:x"><a/></r>"#, "xml").unwrap();
        nodes.register_namespace("x", "urn:x");
        let child = nodes.spawn();
        assert_eq!(child.namespaces().get("x").map(String::as_str), Some("urn:x"));
        assert_eq!(child.find("//x:a").unwrap().len(), 1);

        let reloaded = nodes.load("<x:b xmlns:x=\"urn:x\"/>", "xml").unwrap();
        assert_eq!(reloaded.find("/x:b").unwrap().len(), 1);
    }

    #[test]
    fn each_visits_filtered_nodes_with_positions() {
        let nodes = load();
        let mixed = nodes
            .spawn_with(nodes.document().select("//item/text() | //item", None).unwrap())
            .unwrap();
        let mut seen = Vec::new();
        mixed.each(|node, index| seen.push((index, node.node_name())), NodeFilter::ElementsOnly);
        assert_eq!(seen, [(0, "item".to_string()), (2, "item".to_string()), (4, "item".to_string())]);

        let odd = |_: &Node, index: usize| index % 2 == 1;
        let mut count = 0;
        mixed.each(|_, _| count += 1, NodeFilter::Predicate(&odd));
        assert_eq!(count, 3);
    }

    #[test]
    fn renders_document_by_content_type() {
        let nodes = Nodes::from_source("<p><br/></p>", "xml").unwrap();
        assert_eq!(
            nodes.to_string(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<p><br/></p>\n"
        );
        nodes.set_content_type("html").unwrap();
        assert_eq!(nodes.to_string(), "<p><br></p>\n");
    }

    #[test]
    fn format_output_resets_and_drops_blank_text() {
        let nodes = Nodes::builder()
            .with_loader_options(LoaderOptions::default().with_preserve_whitespace(true))
            .build()
            .load("<a>\n  <b/>\n</a>", "xml")
            .unwrap();
        let found = nodes.find("//b").unwrap();
        let formatted = found.format_output(None).unwrap();
        assert!(formatted.is_empty());
        assert!(formatted.ptr_eq(&found));
        assert!(formatted.end().ptr_eq(&formatted));
        assert!(formatted.uses_document_context());
        assert_eq!(nodes.document().select("//text()", None).unwrap().len(), 0);
    }
}
