//! Qualified names and namespace declarations.

use crate::error::DomError;
use arbor_xpath1::XML_NAMESPACE;

/// An element or attribute name with its resolved namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualName {
    pub prefix: Option<String>,
    pub local: String,
    pub namespace: Option<String>,
}

impl QualName {
    pub fn new(local: impl Into<String>) -> Self {
        Self {
            prefix: None,
            local: local.into(),
            namespace: None,
        }
    }

    /// Validates `qualified` and splits it into prefix and local part.
    /// The `xml` prefix is always bound to the XML namespace.
    pub fn parse(qualified: &str, namespace: Option<&str>) -> Result<Self, DomError> {
        if !is_valid_qname(qualified) {
            return Err(DomError::InvalidName(qualified.to_string()));
        }
        let (prefix, local) = split_qname(qualified);
        let namespace = match prefix {
            Some("xml") => Some(XML_NAMESPACE),
            _ => namespace,
        };
        Ok(Self {
            prefix: prefix.map(str::to_string),
            local: local.to_string(),
            namespace: namespace.map(str::to_string),
        })
    }

    pub fn qualified(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.local),
            None => self.local.clone(),
        }
    }

    /// Compares against a `prefix:local` string without allocating.
    pub fn matches(&self, qualified: &str) -> bool {
        let (prefix, local) = split_qname(qualified);
        prefix == self.prefix.as_deref() && local == self.local
    }
}

/// An `xmlns` or `xmlns:prefix` declaration carried by an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceDecl {
    pub prefix: Option<String>,
    pub uri: String,
}

impl NamespaceDecl {
    pub fn attribute_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("xmlns:{}", prefix),
            None => "xmlns".to_string(),
        }
    }
}

pub fn split_qname(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '\u{B7}')
}

/// An XML name without a colon.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if is_name_start(first) => chars.all(is_name_char),
        _ => false,
    }
}

/// A name with at most one colon separating two valid names.
pub fn is_valid_qname(name: &str) -> bool {
    match split_qname(name) {
        (Some(prefix), local) => is_valid_name(prefix) && is_valid_name(local),
        (None, local) => is_valid_name(local),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_names() {
        assert!(is_valid_qname("item"));
        assert!(is_valid_qname("json:json"));
        assert!(is_valid_qname("data-value_1.x"));
        assert!(!is_valid_qname(""));
        assert!(!is_valid_qname("1st"));
        assert!(!is_valid_qname("a:b:c"));
        assert!(!is_valid_qname(":a"));
        assert!(!is_valid_qname("foo bar"));
    }

    #[test]
    fn parses_prefixed_names() {
        let name = QualName::parse("json:type", Some("urn:json")).unwrap();
        assert_eq!(name.prefix.as_deref(), Some("json"));
        assert_eq!(name.local, "type");
        assert_eq!(name.qualified(), "json:type");
        assert!(name.matches("json:type"));
        assert!(!name.matches("type"));

        let lang = QualName::parse("xml:lang", None).unwrap();
        assert_eq!(lang.namespace.as_deref(), Some(XML_NAMESPACE));
    }
}
