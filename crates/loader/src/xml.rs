//! Well-formed XML through quick-xml's pull reader.

use crate::error::LoadingError;
use crate::options::LoaderOptions;
use crate::sink::TreeSink;
use crate::source::LoadSource;
use crate::Loadable;
use arbor_dom::{DocumentRef, Node};
use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::BytesStart;
use quick_xml::events::Event as XmlEvent;

const CONTENT_TYPES: &[&str] = &["xml", "text/xml", "application/xml"];

#[derive(Debug, Clone, Copy, Default)]
pub struct XmlLoader;

impl XmlLoader {
    pub fn parse_document(source: &str, options: &LoaderOptions) -> Result<DocumentRef, LoadingError> {
        let doc = DocumentRef::new();
        let mut sink = TreeSink::new(doc.root(), options.preserve_whitespace);
        read_events(source, &mut sink)?;
        sink.finish()?;
        if doc.document_element().is_none() {
            return Err(LoadingError::malformed(0, "no document element"));
        }
        Ok(doc)
    }

    /// Parses a well-balanced fragment into detached nodes of `target`.
    /// Prefixes not declared in the fragment resolve through the target's
    /// namespace registry.
    pub fn parse_fragment(source: &str, target: &DocumentRef) -> Result<Vec<Node>, LoadingError> {
        let container = target.create_element("fragment")?;
        let mut sink = TreeSink::new(container, true);
        read_events(source, &mut sink)?;
        let nodes = sink.finish()?;
        for node in &nodes {
            node.remove();
        }
        Ok(nodes)
    }
}

impl Loadable for XmlLoader {
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
        match source.read()? {
            Some(text) => Self::parse_document(&text, options).map(Some),
            None => Ok(None),
        }
    }

    fn load_fragment(
        &self,
        source: &str,
        content_type: &str,
        target: &DocumentRef,
        _options: &LoaderOptions,
    ) -> Result<Vec<Node>, LoadingError> {
        if !self.supports(content_type) {
            return Err(LoadingError::FragmentNotSupported(content_type.to_string()));
        }
        Self::parse_fragment(source, target)
    }
}

fn owned_attributes(e: &BytesStart<'_>) -> Result<Vec<(String, String)>, LoadingError> {
    e.attributes()
        .map(|attr| {
            let attr = attr?;
            let key = std::str::from_utf8(attr.key.as_ref())?;
            let raw = std::str::from_utf8(&attr.value)?;
            let value = unescape(raw).map_err(|err| LoadingError::malformed(0, err.to_string()))?;
            Ok((key.to_string(), value.into_owned()))
        })
        .collect()
}

fn start_element(
    sink: &mut TreeSink,
    e: &BytesStart<'_>,
    self_closing: bool,
) -> Result<(), LoadingError> {
    let qname = e.name();
    let name = std::str::from_utf8(qname.as_ref())?;
    let attributes = owned_attributes(e)?;
    sink.start_element(name, &attributes, self_closing)?;
    Ok(())
}

fn read_events(source: &str, sink: &mut TreeSink) -> Result<(), LoadingError> {
    let mut reader = Reader::from_str(source);
    reader.config_mut().trim_text(false);

    loop {
        let position = reader.buffer_position() as u64;
        sink.at(position);
        match reader.read_event()? {
            XmlEvent::Start(e) => start_element(sink, &e, false)?,
            XmlEvent::Empty(e) => start_element(sink, &e, true)?,
            XmlEvent::End(_) => sink.end_element()?,
            XmlEvent::Text(e) => {
                let raw = std::str::from_utf8(&e)?;
                let text = unescape(raw)
                    .map_err(|err| LoadingError::malformed(position, err.to_string()))?;
                sink.text(&text);
            }
            XmlEvent::GeneralRef(e) => {
                let entity = format!("&{};", std::str::from_utf8(&e)?);
                let text = unescape(&entity)
                    .map_err(|err| LoadingError::malformed(position, err.to_string()))?;
                sink.text(&text);
            }
            XmlEvent::CData(e) => {
                let text = std::str::from_utf8(&e)?;
                let node = sink.document().create_cdata(text);
                sink.append(node)?;
            }
            XmlEvent::Comment(e) => {
                let text = std::str::from_utf8(&e)?;
                let node = sink.document().create_comment(text);
                sink.append(node)?;
            }
            XmlEvent::PI(e) => {
                let raw = std::str::from_utf8(&e)?;
                let (target, data) = raw
                    .split_once(char::is_whitespace)
                    .map_or((raw, ""), |(t, d)| (t, d.trim_start()));
                let node = sink
                    .document()
                    .create_processing_instruction(target, data)?;
                sink.append(node)?;
            }
            XmlEvent::DocType(e) => {
                if sink.builds_document() {
                    let doctype = std::str::from_utf8(&e)?.trim();
                    sink.document().set_doctype(Some(doctype));
                }
            }
            XmlEvent::Decl(_) => {}
            XmlEvent::Eof => break,
        }
    }

    if sink.depth() > 0 {
        return Err(LoadingError::malformed(
            reader.buffer_position() as u64,
            "unclosed element at end of input",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_dom::SerializeOptions;

    #[test]
    fn loads_a_document() {
        let doc = XmlLoader::parse_document(
            "<?xml version=\"1.0\"?>\n<items version=\"1.0\"><item index=\"0\">a &amp; b</item><!-- note --></items>",
            &LoaderOptions::default(),
        )
        .unwrap();
        let root = doc.document_element().unwrap();
        assert_eq!(root.node_name(), "items");
        assert_eq!(root.attribute("version").as_deref(), Some("1.0"));
        let item = root.first_element_child().unwrap();
        assert_eq!(item.text_content(), "a & b");
        assert_eq!(item.children().len(), 1);
        assert_eq!(root.children().len(), 2);
    }

    #[test]
    fn resolves_namespaces() {
        let doc = XmlLoader::parse_document(
            r#"<a:root xmlns:a="urn:a" xmlns="urn:default"><child a:flag="1"/></a:root>"#,
            &LoaderOptions::default(),
        )
        .unwrap();
        let root = doc.document_element().unwrap();
        assert_eq!(root.namespace_uri().as_deref(), Some("urn:a"));
        let child = root.first_child().unwrap();
        assert_eq!(child.namespace_uri().as_deref(), Some("urn:default"));
        let flag = child.attribute_node("a:flag").unwrap();
        assert_eq!(flag.namespace_uri().as_deref(), Some("urn:a"));
        let xml = doc.to_xml(SerializeOptions::default()).unwrap();
        assert!(xml.contains(r#"<a:root xmlns:a="urn:a" xmlns="urn:default">"#));
    }

    #[test]
    fn whitespace_handling_follows_options() {
        let source = "<root>\n  <a/>\n  <b> x </b>\n</root>";
        let doc = XmlLoader::parse_document(source, &LoaderOptions::default()).unwrap();
        let root = doc.document_element().unwrap();
        assert_eq!(root.children().len(), 2);
        assert_eq!(root.last_child().unwrap().text_content(), " x ");

        let options = LoaderOptions::default().with_preserve_whitespace(true);
        let doc = XmlLoader::parse_document(source, &options).unwrap();
        assert_eq!(doc.document_element().unwrap().children().len(), 5);
    }

    #[test]
    fn keeps_cdata_and_processing_instructions() {
        let doc = XmlLoader::parse_document(
            "<root><![CDATA[<raw>]]><?render echo 1; ?></root>",
            &LoaderOptions::default(),
        )
        .unwrap();
        let children = doc.document_element().unwrap().children();
        assert_eq!(children[0].text_content(), "<raw>");
        assert_eq!(children[1].node_name(), "render");
        assert_eq!(children[1].value().as_deref(), Some("echo 1; "));
    }

    #[test]
    fn rejects_malformed_input() {
        let options = LoaderOptions::default();
        assert!(XmlLoader::parse_document("<root><a></root>", &options).is_err());
        assert!(XmlLoader::parse_document("<root>", &options).is_err());
        assert!(XmlLoader::parse_document("", &options).is_err());
        assert!(XmlLoader::parse_document("<a/><b/>", &options).is_err());
        assert!(XmlLoader::parse_document("text", &options).is_err());
    }

    #[test]
    fn fragments_keep_source_order() {
        let doc = DocumentRef::new();
        let nodes = XmlLoader::parse_fragment("<a/>text<b>x</b>", &doc).unwrap();
        let names: Vec<String> = nodes.iter().map(Node::node_name).collect();
        assert_eq!(names, ["a", "#text", "b"]);
        assert!(nodes.iter().all(|n| n.parent().is_none()));
        assert!(nodes.iter().all(|n| n.belongs_to(&doc)));
    }

    #[test]
    fn loader_dispatch_by_content_type() {
        let loader = XmlLoader;
        let options = LoaderOptions::default();
        assert!(loader.supports("application/xml"));
        assert!(!loader.supports("text/html"));
        let source = LoadSource::Text("<root/>");
        assert!(loader.load(&source, "text/html", &options).unwrap().is_none());
        assert!(loader.load(&source, "xml", &options).unwrap().is_some());
    }
}
