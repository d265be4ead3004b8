//! Inline styles, read and written through the `style` attribute.

use crate::error::NodesError;
use crate::nodes::Nodes;
use arbor_dom::Node;
use arbor_style::Properties;

fn read_style(node: &Node) -> Result<Properties, NodesError> {
    match node.attribute("style") {
        Some(style) => Ok(Properties::parse(&style)?),
        None => Ok(Properties::new()),
    }
}

fn write_style(node: &Node, properties: &Properties) -> Result<(), NodesError> {
    if properties.is_empty() {
        node.remove_attribute("style");
    } else {
        node.set_attribute("style", &properties.to_string())?;
    }
    Ok(())
}

impl Nodes {
    /// The parsed `style` attribute of the first held element.
    pub fn css_properties(&self) -> Result<Option<Properties>, NodesError> {
        self.elements().next().map(|node| read_style(&node)).transpose()
    }

    /// One property of the first held element's inline style.
    pub fn css(&self, name: &str) -> Result<Option<String>, NodesError> {
        Ok(self
            .css_properties()?
            .and_then(|properties| properties.get(name).map(str::to_string)))
    }

    /// Sets a property on every held element; an empty value removes it.
    pub fn set_css(&self, name: &str, value: &str) -> Result<Nodes, NodesError> {
        self.set_css_all(&[(name, value)])
    }

    /// Sets several properties on every held element at once.
    pub fn set_css_all(&self, declarations: &[(&str, &str)]) -> Result<Nodes, NodesError> {
        for node in self.elements() {
            let mut properties = read_style(&node)?;
            for (name, value) in declarations {
                properties.set(name, value)?;
            }
            write_style(&node, &properties)?;
        }
        Ok(self.clone())
    }

    /// Removes properties from every held element. Every name is validated
    /// before anything is removed.
    pub fn remove_css(&self, names: &[&str]) -> Result<Nodes, NodesError> {
        for node in self.elements() {
            let mut properties = read_style(&node)?;
            properties.remove_many(names.iter().copied())?;
            write_style(&node, &properties)?;
        }
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_style::StyleError;

    fn divs() -> Nodes {
        Nodes::from_source(
            "<r><div style=\"width: auto; height: auto;\"/><div/></r>",
            "xml",
        )
        .unwrap()
        .find("//div")
        .unwrap()
    }

    #[test]
    fn reads_the_first_element() {
        let divs = divs();
        assert_eq!(divs.css("width").unwrap().as_deref(), Some("auto"));
        assert_eq!(divs.css("color").unwrap(), None);
        assert_eq!(divs.css_properties().unwrap().map(|p| p.len()), Some(2));
        assert_eq!(divs.spawn().css("width").unwrap(), None);
    }

    #[test]
    fn writes_sorted_declarations() {
        let divs = divs();
        divs.set_css("margin-top", "1em").unwrap();
        divs.set_css_all(&[("-moz-box-sizing", "border-box"), ("box-sizing", "border-box")])
            .unwrap();
        assert_eq!(
            divs.last().unwrap().attr("style").as_deref(),
            Some("box-sizing: border-box; -moz-box-sizing: border-box; margin-top: 1em;")
        );
        assert_eq!(
            divs.attr("style").as_deref(),
            Some(
                "box-sizing: border-box; -moz-box-sizing: border-box; height: auto; \
                 margin-top: 1em; width: auto;"
            )
        );
    }

    #[test]
    fn removing_the_last_property_drops_the_attribute() {
        let divs = divs();
        divs.set_css("width", "").unwrap();
        assert_eq!(divs.attr("style").as_deref(), Some("height: auto;"));
        divs.remove_css(&["height"]).unwrap();
        assert_eq!(divs.attr("style"), None);
    }

    #[test]
    fn invalid_names_fail_fast() {
        let divs = divs();
        assert!(matches!(
            divs.remove_css(&["width", "---"]),
            Err(NodesError::Style(StyleError::InvalidPropertyName(_)))
        ));
        assert_eq!(divs.css("width").unwrap().as_deref(), Some("auto"));
        assert!(divs.set_css("no good", "1").is_err());
    }
}
