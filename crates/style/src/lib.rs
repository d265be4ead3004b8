//! Inline style declarations with a deterministic property order.

pub mod compare;
pub mod error;
pub mod properties;

pub use compare::{PropertyCompare, compare_property_names, natural_cmp_ignore_case};
pub use error::StyleError;
pub use properties::{Properties, is_valid_property_name};
