//! `data-*` attributes with JSON-aware values.
//!
//! Keys are camel case (`sayHello`) and map to dashed attribute names
//! (`data-say-hello`). Stored values decode to booleans, numbers, arrays and
//! objects where the text is valid JSON; anything else stays a string.

use crate::error::NodesError;
use crate::nodes::Nodes;
use arbor_dom::{Node, is_valid_qname};
use serde_json::{Map, Value};

const PREFIX: &str = "data-";

/// `someABBRName` becomes `data-some-abbr-name`.
fn attribute_name(key: &str) -> Result<String, NodesError> {
    let chars: Vec<char> = key.chars().collect();
    let mut name = String::from(PREFIX);
    for (i, c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let previous = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if previous.is_lowercase()
                || previous.is_ascii_digit()
                || (previous.is_uppercase() && next_is_lower)
            {
                name.push('-');
            }
        }
        name.extend(c.to_lowercase());
    }
    if key.is_empty() || !is_valid_qname(&name) {
        return Err(NodesError::InvalidAttributeName(name));
    }
    Ok(name)
}

/// `data-options-name` becomes `optionsName`.
fn key_name(attribute: &str) -> Option<String> {
    let rest = attribute.strip_prefix(PREFIX)?;
    let mut key = String::with_capacity(rest.len());
    for (i, part) in rest.split('-').enumerate() {
        let mut chars = part.chars();
        match chars.next() {
            Some(first) if i > 0 => {
                key.extend(first.to_uppercase());
                key.push_str(chars.as_str());
            }
            _ => key.push_str(part),
        }
    }
    Some(key)
}

fn decode(value: &str) -> Value {
    let trimmed = value.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).unwrap_or_else(|e| {
            log::debug!("Data value is not valid JSON: {}", e);
            Value::Null
        });
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(scalar @ (Value::Bool(_) | Value::Number(_))) => scalar,
        _ => Value::String(value.to_string()),
    }
}

fn encode(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl Nodes {
    /// The decoded value stored under `key` on the first held element.
    pub fn data(&self, key: &str) -> Result<Option<Value>, NodesError> {
        let name = attribute_name(key)?;
        Ok(self
            .elements()
            .next()
            .and_then(|node| node.attribute(&name))
            .map(|value| decode(&value)))
    }

    /// Every data value of the first held element, keyed by camel-case name.
    pub fn data_all(&self) -> Map<String, Value> {
        let Some(node) = self.elements().next() else {
            return Map::new();
        };
        node.attributes()
            .iter()
            .filter_map(|attribute| {
                let key = key_name(&attribute.node_name())?;
                Some((key, decode(&attribute.value().unwrap_or_default())))
            })
            .collect()
    }

    /// True if the first held element has any data attribute.
    pub fn has_data(&self) -> bool {
        self.elements()
            .next()
            .is_some_and(|node| node.attributes().iter().any(is_data_attribute))
    }

    /// Stores `value` under `key` on every held element.
    pub fn set_data(&self, key: &str, value: &Value) -> Result<Nodes, NodesError> {
        let name = attribute_name(key)?;
        let encoded = encode(value);
        for node in self.elements() {
            node.set_attribute(&name, &encoded)?;
        }
        Ok(self.clone())
    }

    /// Removes the given keys, or every data attribute when `keys` is empty.
    pub fn remove_data(&self, keys: &[&str]) -> Result<Nodes, NodesError> {
        let names = keys
            .iter()
            .map(|key| attribute_name(key))
            .collect::<Result<Vec<_>, _>>()?;
        for node in self.elements() {
            if names.is_empty() {
                for attribute in node.attributes().iter().filter(|a| is_data_attribute(a)) {
                    attribute.remove();
                }
            } else {
                for name in &names {
                    node.remove_attribute(name);
                }
            }
        }
        Ok(self.clone())
    }
}

fn is_data_attribute(attribute: &Node) -> bool {
    attribute.node_name().starts_with(PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample(xml: &str) -> Nodes {
        Nodes::from_source(xml, "xml").unwrap().find("/*").unwrap()
    }

    #[test]
    fn converts_key_names() {
        assert_eq!(attribute_name("hello").unwrap(), "data-hello");
        assert_eq!(attribute_name("sayHello").unwrap(), "data-say-hello");
        assert_eq!(attribute_name("someABBRName").unwrap(), "data-some-abbr-name");
        assert!(attribute_name("").is_err());
        assert!(attribute_name("a b").is_err());
        assert_eq!(key_name("data-options-name").as_deref(), Some("optionsName"));
        assert_eq!(key_name("id"), None);
    }

    #[test]
    fn decodes_values() {
        let node = sample(
            r#"<div data-role="page" data-hidden="true" data-lie="false" data-count="1"
                    data-list='["1","2"]' data-options='{"name":"John"}' data-broken='{{"a":1}'/>"#,
        );
        assert_eq!(node.data("role").unwrap(), Some(json!("page")));
        assert_eq!(node.data("hidden").unwrap(), Some(json!(true)));
        assert_eq!(node.data("lie").unwrap(), Some(json!(false)));
        assert_eq!(node.data("count").unwrap(), Some(json!(1)));
        assert_eq!(node.data("list").unwrap(), Some(json!(["1", "2"])));
        assert_eq!(node.data("options").unwrap(), Some(json!({"name": "John"})));
        assert_eq!(node.data("broken").unwrap(), Some(Value::Null));
        assert_eq!(node.data("unknown").unwrap(), None);
    }

    #[test]
    fn lists_all_values() {
        let node = sample(r#"<div id="x" data-role="page" data-options-name="John"/>"#);
        let all = node.data_all();
        assert_eq!(all.len(), 2);
        assert_eq!(all["role"], json!("page"));
        assert_eq!(all["optionsName"], json!("John"));
        assert!(node.has_data());
        assert!(!sample("<div/>").has_data());
    }

    #[test]
    fn writes_and_removes_values() {
        let node = sample("<node/>");
        node.set_data("truth", &json!(true)).unwrap();
        node.set_data("list", &json!(["1", "2"])).unwrap();
        node.set_data("sayHello", &json!("World")).unwrap();
        assert_eq!(
            node.outer_xml().unwrap(),
            r#"<node data-truth="true" data-list="[&quot;1&quot;,&quot;2&quot;]" data-say-hello="World"/>"#
        );
        node.remove_data(&["truth"]).unwrap();
        assert_eq!(node.data("truth").unwrap(), None);
        node.remove_data(&[]).unwrap();
        assert_eq!(node.outer_xml().unwrap(), "<node/>");
    }
}
