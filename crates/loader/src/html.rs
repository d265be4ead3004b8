//! Lenient HTML loading.
//!
//! A small forgiving tokenizer (lowercased names, unquoted and valueless
//! attributes, raw `script`/`style` content, a limited entity table) feeds a
//! tree builder that closes unmatched elements implicitly. This is not an
//! HTML5 parser: there is no insertion-mode machinery and no implied
//! `head`/`body`.

use crate::error::LoadingError;
use crate::options::LoaderOptions;
use crate::sink::TreeSink;
use crate::source::LoadSource;
use crate::Loadable;
use arbor_dom::{DocumentRef, Node, is_valid_qname};
use std::borrow::Cow;

const CONTENT_TYPES: &[&str] = &["html", "text/html"];

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "div", "dl", "fieldset", "footer", "form", "h1",
    "h2", "h3", "h4", "h5", "h6", "header", "hr", "main", "nav", "ol", "p", "pre", "section",
    "table", "ul",
];

const ENTITIES: &[(&str, char)] = &[
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("apos", '\''),
    ("nbsp", '\u{A0}'),
    ("copy", '\u{A9}'),
    ("reg", '\u{AE}'),
    ("trade", '\u{2122}'),
    ("hellip", '\u{2026}'),
    ("mdash", '\u{2014}'),
    ("ndash", '\u{2013}'),
    ("lsquo", '\u{2018}'),
    ("rsquo", '\u{2019}'),
    ("ldquo", '\u{201C}'),
    ("rdquo", '\u{201D}'),
    ("laquo", '\u{AB}'),
    ("raquo", '\u{BB}'),
    ("euro", '\u{20AC}'),
];

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Doctype(String),
    StartTag {
        name: String,
        attributes: Vec<(String, String)>,
        self_closing: bool,
    },
    EndTag(String),
    Text(String),
    Comment(String),
}

/// Resolves one `&...;` reference at the start of `tail`. Unknown or
/// unterminated references are not decoded.
fn decode_reference(tail: &str) -> Option<(char, usize)> {
    let end = tail[1..].find(';').filter(|&e| e > 0 && e <= 10)?;
    let name = &tail[1..1 + end];
    let ch = match name.strip_prefix('#') {
        Some(number) => {
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)?
        }
        None => ENTITIES.iter().find(|(n, _)| *n == name).map(|(_, c)| *c)?,
    };
    Some((ch, end + 2))
}

fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        match decode_reference(tail) {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn name_length(bytes: &[u8]) -> usize {
    bytes
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':' | b'.'))
        .count()
}

/// Reads attributes up to and including the closing `>`. Returns the
/// attributes, whether the tag was written self-closing, and the number of
/// bytes consumed.
fn read_attributes(s: &str) -> (Vec<(String, String)>, bool, usize) {
    let bytes = s.as_bytes();
    let len = bytes.len();
    let mut attributes: Vec<(String, String)> = Vec::new();
    let mut self_closing = false;
    let mut k = 0;
    let skip_whitespace = |k: &mut usize| {
        while *k < len && bytes[*k].is_ascii_whitespace() {
            *k += 1;
        }
    };

    loop {
        skip_whitespace(&mut k);
        if k >= len {
            break;
        }
        match bytes[k] {
            b'>' => {
                k += 1;
                break;
            }
            b'/' => {
                if bytes.get(k + 1) == Some(&b'>') {
                    self_closing = true;
                    k += 2;
                    break;
                }
                k += 1;
                continue;
            }
            _ => {}
        }
        let start = k;
        while k < len && !bytes[k].is_ascii_whitespace() && !matches!(bytes[k], b'=' | b'>' | b'/')
        {
            k += 1;
        }
        if start == k {
            k += 1;
            continue;
        }
        let name = s[start..k].to_ascii_lowercase();
        skip_whitespace(&mut k);
        let value = if bytes.get(k) == Some(&b'=') {
            k += 1;
            skip_whitespace(&mut k);
            match bytes.get(k) {
                Some(&quote) if quote == b'"' || quote == b'\'' => {
                    k += 1;
                    let value_start = k;
                    while k < len && bytes[k] != quote {
                        k += 1;
                    }
                    let raw = &s[value_start..k];
                    if k < len {
                        k += 1;
                    }
                    decode_entities(raw).into_owned()
                }
                _ => {
                    let value_start = k;
                    while k < len && !bytes[k].is_ascii_whitespace() && bytes[k] != b'>' {
                        k += 1;
                    }
                    decode_entities(&s[value_start..k]).into_owned()
                }
            }
        } else {
            String::new()
        };
        if !attributes.iter().any(|(n, _)| *n == name) {
            attributes.push((name, value));
        }
    }
    (attributes, self_closing, k)
}

fn tokenize(input: &str) -> Vec<Token> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'<' {
            let start = i;
            while i < bytes.len() && bytes[i] != b'<' {
                i += 1;
            }
            tokens.push(Token::Text(decode_entities(&input[start..i]).into_owned()));
            continue;
        }
        let rest = &input[i..];
        if let Some(body) = rest.strip_prefix("<!--") {
            match body.find("-->") {
                Some(end) => {
                    tokens.push(Token::Comment(body[..end].to_string()));
                    i += 4 + end + 3;
                }
                None => {
                    tokens.push(Token::Comment(body.to_string()));
                    break;
                }
            }
            continue;
        }
        if rest.starts_with("<!") || rest.starts_with("<?") {
            let end = rest.find('>').unwrap_or(rest.len());
            let body = &rest[2..end];
            let doctype = body
                .get(..7)
                .filter(|keyword| keyword.eq_ignore_ascii_case("doctype"))
                .and_then(|_| body.get(7..));
            if let Some(doctype) = doctype {
                tokens.push(Token::Doctype(doctype.trim().to_string()));
            } else {
                tokens.push(Token::Comment(body.to_string()));
            }
            i += (end + 1).min(rest.len());
            continue;
        }
        if let Some(after) = rest.strip_prefix("</") {
            let name_len = name_length(after.as_bytes());
            if name_len == 0 {
                tokens.push(Token::Text("</".to_string()));
                i += 2;
                continue;
            }
            let name = after[..name_len].to_ascii_lowercase();
            let end = after.find('>').map_or(after.len(), |e| e + 1);
            tokens.push(Token::EndTag(name));
            i += 2 + end;
            continue;
        }
        let name_len = name_length(&bytes[i + 1..]);
        if name_len == 0 || !bytes[i + 1].is_ascii_alphabetic() {
            tokens.push(Token::Text("<".to_string()));
            i += 1;
            continue;
        }
        let name = input[i + 1..i + 1 + name_len].to_ascii_lowercase();
        let (attributes, written_self_closing, consumed) =
            read_attributes(&input[i + 1 + name_len..]);
        i += 1 + name_len + consumed;
        let self_closing = written_self_closing || VOID_ELEMENTS.contains(&name.as_str());
        let raw_text = !self_closing && RAW_TEXT_ELEMENTS.contains(&name.as_str());
        tokens.push(Token::StartTag {
            name: name.clone(),
            attributes,
            self_closing,
        });
        if raw_text {
            let body = &input[i..];
            let close = format!("</{}", name);
            let end = body.to_ascii_lowercase().find(&close).unwrap_or(body.len());
            if end > 0 {
                tokens.push(Token::Text(body[..end].to_string()));
            }
            tokens.push(Token::EndTag(name));
            i += end;
            if i < bytes.len() {
                i += input[i..].find('>').map_or(bytes.len() - i, |gt| gt + 1);
            }
        }
    }
    tokens
}

/// Elements whose start tag implicitly ends the current element.
fn closes_current(name: &str, current: &str) -> bool {
    match name {
        "li" => current == "li",
        "dt" | "dd" => matches!(current, "dt" | "dd"),
        "tr" => matches!(current, "tr" | "td" | "th"),
        "td" | "th" => matches!(current, "td" | "th"),
        "option" => current == "option",
        _ => current == "p" && BLOCK_ELEMENTS.contains(&name),
    }
}

fn build(tokens: Vec<Token>, sink: &mut TreeSink) -> Result<Option<String>, LoadingError> {
    let mut doctype = None;
    for token in tokens {
        match token {
            Token::Doctype(d) => doctype = Some(d),
            Token::Comment(c) => {
                let node = sink.document().create_comment(&c);
                sink.append(node)?;
            }
            Token::Text(t) => sink.text(&t),
            Token::StartTag {
                name,
                attributes,
                self_closing,
            } => {
                if !is_valid_qname(&name) {
                    log::debug!("Skipping element with invalid name <{}>", name);
                    continue;
                }
                if sink
                    .current_name()
                    .is_some_and(|current| closes_current(&name, &current))
                {
                    sink.end_element()?;
                }
                sink.start_element(&name, &attributes, self_closing)?;
            }
            Token::EndTag(name) => {
                if !sink.is_open(&name) {
                    log::debug!("Ignoring stray end tag </{}>", name);
                    continue;
                }
                sink.end_element_named(&name)?;
            }
        }
    }
    Ok(doctype)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlLoader;

impl HtmlLoader {
    /// Parses a document. Content that is not a single `html` element is
    /// wrapped in one.
    pub fn parse_document(source: &str, options: &LoaderOptions) -> Result<DocumentRef, LoadingError> {
        let doc = DocumentRef::new();
        let holder = doc.create_element("html")?;
        let mut sink = TreeSink::new(holder.clone(), options.preserve_whitespace).lenient();
        let doctype = build(tokenize(source), &mut sink)?;
        let children = sink.finish()?;
        doc.set_doctype(doctype.as_deref());

        let elements: Vec<&Node> = children.iter().filter(|n| n.is_element()).collect();
        let single_html = elements.len() == 1
            && elements[0].node_name() == "html"
            && children
                .iter()
                .all(|n| n.is_element() || n.kind() == arbor_dom::NodeKind::Comment || n.is_whitespace());
        let root = doc.root();
        if single_html {
            for child in children.iter().filter(|n| !n.is_whitespace()) {
                root.append_child(child)?;
            }
        } else {
            root.append_child(&holder)?;
        }
        log::debug!(
            "Parsed HTML document ({} top-level nodes, wrapped: {})",
            children.len(),
            !single_html
        );
        Ok(doc)
    }

    pub fn parse_fragment(source: &str, target: &DocumentRef) -> Result<Vec<Node>, LoadingError> {
        let container = target.create_element("fragment")?;
        let mut sink = TreeSink::new(container, true).lenient();
        build(tokenize(source), &mut sink)?;
        let nodes = sink.finish()?;
        for node in &nodes {
            node.remove();
        }
        Ok(nodes)
    }
}

impl Loadable for HtmlLoader {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_known_entities_only() {
        assert_eq!(decode_entities("a &amp; b &lt;c&gt;"), "a & b <c>");
        assert_eq!(decode_entities("&#169; &#xA9; &copy;"), "\u{A9} \u{A9} \u{A9}");
        assert_eq!(decode_entities("&bogus; & &amp"), "&bogus; & &amp");
    }

    #[test]
    fn tokenizes_loose_markup() {
        let tokens = tokenize("<P Class=x disabled>a<br>b</p>");
        assert_eq!(
            tokens,
            vec![
                Token::StartTag {
                    name: "p".to_string(),
                    attributes: vec![
                        ("class".to_string(), "x".to_string()),
                        ("disabled".to_string(), String::new())
                    ],
                    self_closing: false,
                },
                Token::Text("a".to_string()),
                Token::StartTag {
                    name: "br".to_string(),
                    attributes: vec![],
                    self_closing: true,
                },
                Token::Text("b".to_string()),
                Token::EndTag("p".to_string()),
            ]
        );
    }

    #[test]
    fn script_content_is_raw() {
        let tokens = tokenize("<script>if (a < b) { x(\"</p>\"); }</SCRIPT>after");
        assert_eq!(
            tokens[1],
            Token::Text("if (a < b) { x(\"</p>\"); }".to_string())
        );
        assert_eq!(tokens[2], Token::EndTag("script".to_string()));
        assert_eq!(tokens[3], Token::Text("after".to_string()));
    }

    #[test]
    fn non_ascii_markup_declarations() {
        let tokens = tokenize("<p>a</p><!€€€><?é?><!doctypeé>");
        assert_eq!(tokens[3], Token::Comment("€€€".to_string()));
        assert_eq!(tokens[4], Token::Comment("é?".to_string()));
        assert_eq!(tokens[5], Token::Doctype("é".to_string()));

        let doc = HtmlLoader::parse_document("<p>a</p><!€€€>", &LoaderOptions::default()).unwrap();
        assert_eq!(doc.select("//p", None).unwrap().len(), 1);
    }

    #[test]
    fn builds_a_document_with_implied_closes() {
        let doc = HtmlLoader::parse_document(
            "<!DOCTYPE html><html><body><ul><li>one<li>two</ul><p>a<div>b</div></body></html>",
            &LoaderOptions::default(),
        )
        .unwrap();
        assert_eq!(doc.doctype().as_deref(), Some("html"));
        let items = doc.select("//li", None).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].text_content(), "two");
        let div = doc.select("//div", None).unwrap().remove(0);
        assert_eq!(div.parent().unwrap().node_name(), "body");
    }

    #[test]
    fn wraps_loose_content() {
        let doc = HtmlLoader::parse_document("<p>one</p><p>two</p>", &LoaderOptions::default())
            .unwrap();
        let root = doc.document_element().unwrap();
        assert_eq!(root.node_name(), "html");
        assert_eq!(root.element_children().len(), 2);
        assert_eq!(
            doc.to_html(),
            "<html><p>one</p><p>two</p></html>\n"
        );
    }

    #[test]
    fn ignores_stray_end_tags() {
        let doc = DocumentRef::new();
        let nodes = HtmlLoader::parse_fragment("<b>x</i></b> tail", &doc).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].to_html(), "<b>x</b>");
        assert_eq!(nodes[1].text_content(), " tail");
    }
}
