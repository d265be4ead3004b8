//! The chainable query API on [`Nodes`](crate::Nodes).
//!
//! Operations that select nodes return a new collection linked to the one
//! they were called on, so [`Nodes::end`](crate::Nodes::end) walks back up
//! the chain. Operations that modify the tree return the collection they
//! were called on, or a collection of the inserted nodes.

mod attributes;
mod css;
mod data;
mod manipulation;
mod traversal;
