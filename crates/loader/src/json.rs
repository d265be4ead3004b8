//! JSON values as XML elements.
//!
//! The root is `<json:json>`. Object members become elements named after
//! their key; keys that are not valid XML names become `_` with the key in
//! `json:name`. Array items are `_` elements. Scalars are text content, and
//! `json:type` records everything that would otherwise be ambiguous:
//! booleans, numbers, nulls, arrays, and empty objects below the root.

use crate::error::LoadingError;
use crate::options::LoaderOptions;
use crate::source::LoadSource;
use crate::Loadable;
use arbor_dom::{DocumentRef, Node, is_valid_name};
use serde_json::Value;

pub const JSON_NAMESPACE: &str = "urn:carica-json-dom.2013";

const CONTENT_TYPES: &[&str] = &["json", "application/json", "text/json"];

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLoader;

struct JsonWriter<'a> {
    doc: &'a DocumentRef,
    options: &'a LoaderOptions,
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl JsonWriter<'_> {
    fn type_attribute(&self, value: &Value, is_root: bool) -> Option<&'static str> {
        if self.options.verbose {
            return Some(type_name(value));
        }
        match value {
            Value::String(_) => None,
            Value::Object(map) => (!is_root && map.is_empty()).then(|| type_name(value)),
            _ => Some(type_name(value)),
        }
    }

    fn append_text(&self, element: &Node, text: &str) -> Result<(), LoadingError> {
        if !text.is_empty() {
            element.append_child(&self.doc.create_text(text))?;
        }
        Ok(())
    }

    fn write(&self, element: &Node, value: &Value, depth: usize, is_root: bool) -> Result<(), LoadingError> {
        if depth > self.options.max_depth {
            return Ok(());
        }
        if let Some(kind) = self.type_attribute(value, is_root) {
            element.set_attribute("json:type", kind)?;
        }
        match value {
            Value::Null => {}
            Value::Bool(b) => self.append_text(element, if *b { "true" } else { "false" })?,
            Value::Number(n) => self.append_text(element, &n.to_string())?,
            Value::String(s) => self.append_text(element, s)?,
            Value::Array(items) => {
                for item in items {
                    let child = self.doc.create_element("_")?;
                    element.append_child(&child)?;
                    self.write(&child, item, depth + 1, false)?;
                }
            }
            Value::Object(map) => {
                for (key, item) in map {
                    let valid = is_valid_name(key);
                    let child = self.doc.create_element(if valid { key } else { "_" })?;
                    if !valid || self.options.verbose {
                        child.set_attribute("json:name", key)?;
                    }
                    element.append_child(&child)?;
                    self.write(&child, item, depth + 1, false)?;
                }
            }
        }
        Ok(())
    }
}

impl JsonLoader {
    /// Builds a document for `value`. The `json` prefix is registered on
    /// the document for queries.
    pub fn transform(value: &Value, options: &LoaderOptions) -> Result<DocumentRef, LoadingError> {
        let doc = DocumentRef::new();
        doc.register_namespace("json", JSON_NAMESPACE);
        let root = doc.create_element_ns(Some(JSON_NAMESPACE), "json:json")?;
        root.declare_namespace(Some("json"), JSON_NAMESPACE)?;
        doc.root().append_child(&root)?;
        JsonWriter { doc: &doc, options }.write(&root, value, 1, true)?;
        Ok(doc)
    }

    pub fn parse_document(source: &str, options: &LoaderOptions) -> Result<DocumentRef, LoadingError> {
        let value: Value = serde_json::from_str(source)?;
        Self::transform(&value, options)
    }
}

impl Loadable for JsonLoader {
    fn supports(&self, content_type: &str) -> bool {
        CONTENT_TYPES.contains(&content_type)
    }

    fn load(
        &self,
        source: &LoadSource<'_>,
        content_type: &str,
        options: &LoaderOptions,
    ) -> Result<Option<DocumentRef>, LoadingError> {
        if !self.supports(content_type) {
            return Ok(None);
        }
        let doc = match source {
            LoadSource::Json(value) => Self::transform(value, options)?,
            _ => match source.read()? {
                Some(text) => Self::parse_document(&text, options)?,
                None => return Ok(None),
            },
        };
        Ok(Some(doc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ROOT: &str = r#"<json:json xmlns:json="urn:carica-json-dom.2013""#;

    fn markup(value: &Value, options: &LoaderOptions) -> String {
        let doc = JsonLoader::transform(value, options).unwrap();
        doc.document_element().unwrap().to_xml().unwrap()
    }

    #[test]
    fn maps_values_to_elements() {
        let value = json!({
            "foo": "bar",
            "n": 1,
            "b": true,
            "x": null,
            "e": {},
            "a": [1.5],
            "bad key": "v"
        });
        assert_eq!(
            markup(&value, &LoaderOptions::default()),
            format!(
                "{}><foo>bar</foo><n json:type=\"number\">1</n><b json:type=\"boolean\">true</b>\
                 <x json:type=\"null\"/><e json:type=\"object\"/>\
                 <a json:type=\"array\"><_ json:type=\"number\">1.5</_></a>\
                 <_ json:name=\"bad key\">v</_></json:json>",
                ROOT
            )
        );
    }

    #[test]
    fn root_arrays_are_typed() {
        assert_eq!(
            markup(&json!(["x"]), &LoaderOptions::default()),
            format!("{} json:type=\"array\"><_>x</_></json:json>", ROOT)
        );
    }

    #[test]
    fn verbose_writes_all_names_and_types() {
        let options = LoaderOptions::default().with_verbose(true);
        assert_eq!(
            markup(&json!({"a": "x"}), &options),
            format!(
                "{} json:type=\"object\"><a json:name=\"a\" json:type=\"string\">x</a></json:json>",
                ROOT
            )
        );
    }

    #[test]
    fn values_beyond_max_depth_are_empty() {
        let options = LoaderOptions::default().with_max_depth(1);
        assert_eq!(
            markup(&json!({"foo": [1, 2, 3]}), &options),
            format!("{}><foo/></json:json>", ROOT)
        );
    }

    #[test]
    fn queries_use_the_registered_prefix() {
        let doc = JsonLoader::parse_document(r#"{"items": [1, 2]}"#, &LoaderOptions::default())
            .unwrap();
        let typed = doc.select("//*[@json:type = 'number']", None).unwrap();
        assert_eq!(typed.len(), 2);
    }

    #[test]
    fn invalid_json_fails() {
        let loader = JsonLoader;
        let result = loader.load(&LoadSource::Text("{broken"), "json", &LoaderOptions::default());
        assert!(matches!(result, Err(LoadingError::Json(_))));
    }

    #[test]
    fn loads_decoded_values_and_files() {
        let loader = JsonLoader;
        let options = LoaderOptions::default();
        let value = json!({"a": 1});
        let doc = loader
            .load(&LoadSource::Json(&value), "application/json", &options)
            .unwrap()
            .unwrap();
        assert_eq!(doc.evaluate("string(//a)", None).unwrap().to_string(), "1");

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, r#"{"b": "file"}"#).unwrap();
        let doc = loader
            .load(&LoadSource::File(&path), "text/json", &options)
            .unwrap()
            .unwrap();
        assert_eq!(doc.evaluate("string(//b)", None).unwrap().to_string(), "file");
        assert!(loader.load(&LoadSource::Text("{}"), "xml", &options).unwrap().is_none());
    }
}
