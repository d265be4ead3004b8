//! Virtual properties of a collection, read and written through one
//! accessor pair.

use crate::content_type::ContentType;
use crate::error::NodesError;
use crate::nodes::Nodes;
use arbor_dom::DocumentRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    ContentType,
    Length,
    Document,
}

impl Property {
    pub fn name(&self) -> &'static str {
        match self {
            Property::ContentType => "contentType",
            Property::Length => "length",
            Property::Document => "document",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    ContentType(ContentType),
    Length(usize),
    Document(DocumentRef),
}

impl PropertyValue {
    pub fn property(&self) -> Property {
        match self {
            PropertyValue::ContentType(_) => Property::ContentType,
            PropertyValue::Length(_) => Property::Length,
            PropertyValue::Document(_) => Property::Document,
        }
    }
}

impl Nodes {
    pub fn property(&self, property: Property) -> PropertyValue {
        match property {
            Property::ContentType => PropertyValue::ContentType(self.content_type()),
            Property::Length => PropertyValue::Length(self.len()),
            Property::Document => PropertyValue::Document(self.document()),
        }
    }

    /// Only the content type is writable.
    pub fn set_property(&self, value: PropertyValue) -> Result<(), NodesError> {
        match value {
            PropertyValue::ContentType(content_type) => {
                self.apply_content_type(content_type);
                Ok(())
            }
            other => Err(NodesError::ReadOnlyProperty(other.property().name())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_virtual_properties() {
        let nodes = Nodes::new();
        assert_eq!(
            nodes.property(Property::ContentType),
            PropertyValue::ContentType(ContentType::Xml)
        );
        assert_eq!(nodes.property(Property::Length), PropertyValue::Length(0));
        assert_eq!(
            nodes.property(Property::Document),
            PropertyValue::Document(nodes.document())
        );
    }

    #[test]
    fn only_content_type_is_writable() {
        let nodes = Nodes::new();
        nodes
            .set_property(PropertyValue::ContentType(ContentType::Html))
            .unwrap();
        assert_eq!(nodes.content_type(), ContentType::Html);
        assert!(matches!(
            nodes.set_property(PropertyValue::Length(3)),
            Err(NodesError::ReadOnlyProperty("length"))
        ));
        assert!(matches!(
            nodes.set_property(PropertyValue::Document(DocumentRef::new())),
            Err(NodesError::ReadOnlyProperty("document"))
        ));
    }
}
