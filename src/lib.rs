//! Chainable node collections over XML, HTML and JSON documents.
//!
//! A [`Nodes`] collection is loaded from a source, queried with XPath
//! selectors and modified with jQuery-style operations:
//!
//! ```no_run
//! use arbor::Nodes;
//!
//! # fn main() -> Result<(), arbor::NodesError> {
//! let nodes = Nodes::from_source("<html><body><p>Hello</p></body></html>", "html")?;
//! nodes.find("//p")?.add_class("greeting")?.append("<b>!</b>")?;
//! println!("{}", nodes);
//! # Ok(())
//! # }
//! ```

pub mod content_type;
pub mod error;
pub mod mutation;
pub mod nodes;
pub mod parent_node;
pub mod query;
pub mod selector;
pub mod sort;

pub use content_type::ContentType;
pub use error::NodesError;
pub use mutation::{Appendable, ContentFn, Insertable};
pub use nodes::{NodeFilter, Nodes, NodesBuilder, Property, PropertyValue, Source};
pub use parent_node::ParentNodeExt;
pub use selector::{Selector, SelectorFn};
pub use sort::sort_nodes;

pub use arbor_dom::{DocumentRef, DomError, Node, NodeKind, SerializeOptions};
pub use arbor_loader::{LoadSource, Loadable, LoaderOptions, Loaders, LoadingError};
pub use arbor_style::{Properties, PropertyCompare, StyleError};
