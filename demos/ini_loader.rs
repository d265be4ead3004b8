//! Registers a loader for INI files and queries the result.
//!
//! `[section]` headers become `<section name="...">` elements and every
//! `key = value` line becomes a `<value name="key">` child.

use arbor::{DocumentRef, LoadSource, Loadable, LoaderOptions, LoadingError, Nodes, NodesError};

const CONTENT_TYPE: &str = "text/ini";

const CONFIG: &str = "\
; sample configuration
[server]
host = localhost
port = 8080

[logging]
level = debug
";

struct IniLoader;

impl Loadable for IniLoader {
    fn supports(&self, content_type: &str) -> bool {
        content_type == CONTENT_TYPE
    }

    fn load(
        &self,
        source: &LoadSource<'_>,
        _content_type: &str,
        _options: &LoaderOptions,
    ) -> Result<Option<DocumentRef>, LoadingError> {
        let Some(text) = source.read()? else {
            return Ok(None);
        };
        let document = DocumentRef::new();
        let root = document.create_element("ini")?;
        document.root().append_child(&root)?;

        let mut section = root.clone();
        for line in text.lines().map(str::trim) {
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }
            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                section = document.create_element("section")?;
                section.set_attribute("name", name.trim())?;
                root.append_child(&section)?;
            } else if let Some((key, value)) = line.split_once('=') {
                let element = document.create_element("value")?;
                element.set_attribute("name", key.trim())?;
                element.append_child(&document.create_text(value.trim()))?;
                section.append_child(&element)?;
            }
        }
        Ok(Some(document))
    }
}

fn main() -> Result<(), NodesError> {
    env_logger::init();

    let nodes = Nodes::builder().with_loader(IniLoader).build();
    nodes.load(CONFIG, CONTENT_TYPE)?;

    let port = nodes.find("//section[@name = 'server']/value[@name = 'port']")?;
    println!("server port: {}", port.text());

    nodes
        .find("//section[@name = 'logging']")?
        .append("<value name=\"target\">stderr</value>")?;

    println!("{}", nodes.format_output(None)?);
    Ok(())
}
