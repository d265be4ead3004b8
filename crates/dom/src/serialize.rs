//! XML and HTML serialization.

use crate::document::{Content, DOCUMENT_NODE, Document, DocumentRef, NodeId};
use crate::error::DomError;
use crate::node::Node;
use quick_xml::Writer;
use quick_xml::escape::{escape, partial_escape};
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event};
use std::io::Write;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Re-indent elements; whitespace-only text is not added or removed.
    pub indent: bool,
}

fn new_writer(options: SerializeOptions) -> Writer<Vec<u8>> {
    if options.indent {
        Writer::new_with_indent(Vec::new(), b' ', 2)
    } else {
        Writer::new(Vec::new())
    }
}

fn into_string(writer: Writer<Vec<u8>>) -> Result<String, DomError> {
    String::from_utf8(writer.into_inner())
        .map_err(|e| DomError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

fn write_xml<W: Write>(writer: &mut Writer<W>, doc: &Document, id: NodeId) -> std::io::Result<()> {
    let data = doc.data(id);
    match &data.content {
        Content::Document => {
            for &child in &data.children {
                write_xml(writer, doc, child)?;
            }
        }
        Content::Element { name, namespaces } => {
            let qualified = name.qualified();
            let mut start = BytesStart::new(qualified.as_str());
            for decl in namespaces {
                start.push_attribute((decl.attribute_name().as_str(), decl.uri.as_str()));
            }
            for &attr in &data.attributes {
                if let Content::Attribute { name, value } = &doc.data(attr).content {
                    start.push_attribute((name.qualified().as_str(), value.as_str()));
                }
            }
            if data.children.is_empty() {
                writer.write_event(Event::Empty(start))?;
            } else {
                writer.write_event(Event::Start(start))?;
                for &child in &data.children {
                    write_xml(writer, doc, child)?;
                }
                writer.write_event(Event::End(BytesEnd::new(qualified.as_str())))?;
            }
        }
        Content::Attribute { value, .. } => {
            writer.write_event(Event::Text(BytesText::from_escaped(escape(value.as_str()))))?;
        }
        Content::Text(text) => {
            writer.write_event(Event::Text(BytesText::from_escaped(partial_escape(text.as_str()))))?;
        }
        Content::CData(text) => {
            writer.write_event(Event::CData(BytesCData::new(text.as_str())))?;
        }
        Content::Comment(text) => {
            writer.write_event(Event::Comment(BytesText::from_escaped(text.as_str())))?;
        }
        Content::ProcessingInstruction { target, data } => {
            let content = if data.is_empty() {
                target.clone()
            } else {
                format!("{} {}", target, data)
            };
            writer.write_event(Event::PI(BytesPI::new(content)))?;
        }
    }
    Ok(())
}

fn write_html(doc: &Document, id: NodeId, out: &mut String) {
    let data = doc.data(id);
    match &data.content {
        Content::Document => {
            if let Some(doctype) = doc.doctype() {
                out.push_str("<!DOCTYPE ");
                out.push_str(doctype);
                out.push_str(">\n");
            }
            for &child in &data.children {
                write_html(doc, child, out);
                out.push('\n');
            }
        }
        Content::Element { name, namespaces } => {
            let qualified = name.qualified();
            out.push('<');
            out.push_str(&qualified);
            for decl in namespaces {
                push_html_attribute(out, &decl.attribute_name(), &decl.uri);
            }
            for &attr in &data.attributes {
                if let Content::Attribute { name, value } = &doc.data(attr).content {
                    push_html_attribute(out, &name.qualified(), value);
                }
            }
            out.push('>');
            let lower = qualified.to_ascii_lowercase();
            if VOID_ELEMENTS.contains(&lower.as_str()) && data.children.is_empty() {
                return;
            }
            for &child in &data.children {
                write_html(doc, child, out);
            }
            out.push_str("</");
            out.push_str(&qualified);
            out.push('>');
        }
        Content::Text(text) | Content::CData(text) => {
            let raw = data.parent.is_some_and(|p| match &doc.data(p).content {
                Content::Element { name, .. } => {
                    RAW_TEXT_ELEMENTS.contains(&name.local.to_ascii_lowercase().as_str())
                }
                _ => false,
            });
            if raw {
                out.push_str(text);
            } else {
                out.push_str(&partial_escape(text.as_str()));
            }
        }
        Content::Attribute { value, .. } => out.push_str(&escape(value.as_str())),
        Content::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        Content::ProcessingInstruction { target, data } => {
            out.push_str("<?");
            out.push_str(target);
            if !data.is_empty() {
                out.push(' ');
                out.push_str(data);
            }
            out.push('>');
        }
    }
}

fn push_html_attribute(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&escape(value));
    out.push('"');
}

impl DocumentRef {
    /// The whole document with an XML declaration, one trailing newline.
    pub fn to_xml(&self, options: SerializeOptions) -> Result<String, DomError> {
        let doc = self.borrow();
        let mut writer = new_writer(options);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        if !options.indent {
            writer.get_mut().push(b'\n');
        }
        if let Some(doctype) = doc.doctype() {
            writer.write_event(Event::DocType(BytesText::from_escaped(doctype)))?;
            if !options.indent {
                writer.get_mut().push(b'\n');
            }
        }
        write_xml(&mut writer, &doc, DOCUMENT_NODE)?;
        writer.get_mut().push(b'\n');
        into_string(writer)
    }

    /// The whole document with HTML rules: doctype, void elements without
    /// end tags, raw `script`/`style` content.
    pub fn to_html(&self) -> String {
        let doc = self.borrow();
        let mut out = String::new();
        write_html(&doc, DOCUMENT_NODE, &mut out);
        out
    }
}

impl Node {
    /// The node's markup without a declaration.
    pub fn to_xml(&self) -> Result<String, DomError> {
        let document = self.document();
        let doc = document.borrow();
        let mut writer = new_writer(SerializeOptions::default());
        write_xml(&mut writer, &doc, self.id())?;
        into_string(writer)
    }

    pub fn to_html(&self) -> String {
        let document = self.document();
        let doc = document.borrow();
        let mut out = String::new();
        write_html(&doc, self.id(), &mut out);
        out
    }
}
