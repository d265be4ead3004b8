//! A mutable document tree stored in an arena.
//!
//! [`DocumentRef`] is a shared handle to one document and [`Node`] is a cheap
//! `(document, id)` handle into it. Nodes removed from the tree stay in the
//! arena, detached, and can be reinserted. Queries run through
//! `arbor-xpath1` over a borrowed view of the arena.

pub mod document;
pub mod error;
pub mod name;
pub mod node;
pub mod query;
pub mod serialize;

pub use document::{Document, DocumentRef, NodeId};
pub use error::DomError;
pub use name::{NamespaceDecl, QualName, is_valid_name, is_valid_qname};
pub use node::{Node, NodeKind};
pub use query::QueryValue;
pub use serialize::SerializeOptions;
