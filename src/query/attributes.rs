use crate::error::NodesError;
use crate::nodes::Nodes;
use arbor_dom::{Node, is_valid_qname};

fn check_name(name: &str) -> Result<(), NodesError> {
    if is_valid_qname(name) {
        Ok(())
    } else {
        Err(NodesError::InvalidAttributeName(name.to_string()))
    }
}

fn class_tokens(node: &Node) -> Vec<String> {
    node.attribute("class")
        .map(|value| value.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

fn write_class(node: &Node, tokens: &[String]) -> Result<(), NodesError> {
    if tokens.is_empty() {
        node.remove_attribute("class");
    } else {
        node.set_attribute("class", &tokens.join(" "))?;
    }
    Ok(())
}

impl Nodes {
    pub(crate) fn elements(&self) -> impl Iterator<Item = Node> {
        self.iter().filter(Node::is_element)
    }

    /// The attribute value of the first held element.
    pub fn attr(&self, name: &str) -> Option<String> {
        self.elements().next().and_then(|node| node.attribute(name))
    }

    /// Sets the attribute on every held element.
    pub fn set_attr(&self, name: &str, value: &str) -> Result<Nodes, NodesError> {
        check_name(name)?;
        for node in self.elements() {
            node.set_attribute(name, value)?;
        }
        Ok(self.clone())
    }

    /// Sets the attribute on every held element to the value computed from
    /// the element, its position and the current value.
    pub fn set_attr_with(
        &self,
        name: &str,
        value: impl Fn(&Node, usize, Option<String>) -> String,
    ) -> Result<Nodes, NodesError> {
        check_name(name)?;
        for (index, node) in self.elements().enumerate() {
            let current = node.attribute(name);
            node.set_attribute(name, &value(&node, index, current))?;
        }
        Ok(self.clone())
    }

    /// Removes the named attributes from every held element. All names are
    /// checked first; `*` removes every attribute.
    pub fn remove_attr(&self, names: &[&str]) -> Result<Nodes, NodesError> {
        for name in names.iter().filter(|n| **n != "*") {
            check_name(name)?;
        }
        for node in self.elements() {
            if names.contains(&"*") {
                for attribute in node.attributes() {
                    attribute.remove();
                }
            } else {
                for name in names {
                    node.remove_attribute(name);
                }
            }
        }
        Ok(self.clone())
    }

    /// True if any held element carries the class.
    pub fn has_class(&self, class: &str) -> bool {
        self.elements()
            .any(|node| class_tokens(&node).iter().any(|token| token == class))
    }

    /// Adds each whitespace-separated class that an element does not have yet.
    pub fn add_class(&self, classes: &str) -> Result<Nodes, NodesError> {
        for node in self.elements() {
            let mut tokens = class_tokens(&node);
            for class in classes.split_whitespace() {
                if !tokens.iter().any(|t| t == class) {
                    tokens.push(class.to_string());
                }
            }
            write_class(&node, &tokens)?;
        }
        Ok(self.clone())
    }

    /// Removes the given classes, or the whole `class` attribute when
    /// `classes` is `None`. An emptied attribute is removed.
    pub fn remove_class(&self, classes: Option<&str>) -> Result<Nodes, NodesError> {
        for node in self.elements() {
            let tokens = match classes {
                Some(classes) => {
                    let removed: Vec<&str> = classes.split_whitespace().collect();
                    class_tokens(&node)
                        .into_iter()
                        .filter(|t| !removed.contains(&t.as_str()))
                        .collect()
                }
                None => Vec::new(),
            };
            write_class(&node, &tokens)?;
        }
        Ok(self.clone())
    }

    /// Adds the classes an element lacks and removes the ones it has.
    pub fn toggle_class(&self, classes: &str) -> Result<Nodes, NodesError> {
        for node in self.elements() {
            let mut tokens = class_tokens(&node);
            for class in classes.split_whitespace() {
                match tokens.iter().position(|t| t == class) {
                    Some(index) => {
                        tokens.remove(index);
                    }
                    None => tokens.push(class.to_string()),
                }
            }
            write_class(&node, &tokens)?;
        }
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const XML: &str = "<body><p class=\"blue\">foo</p><p class=\"blue highlight\">bar</p>text</body>";

    fn paragraphs() -> Nodes {
        Nodes::from_source(XML, "xml").unwrap().find("//p").unwrap()
    }

    fn classes(nodes: &Nodes) -> Vec<Option<String>> {
        nodes.iter().map(|n| n.attribute("class")).collect()
    }

    #[test]
    fn reads_and_writes_attributes() {
        let paragraphs = paragraphs();
        assert_eq!(paragraphs.attr("class").as_deref(), Some("blue"));
        assert_eq!(paragraphs.attr("missing"), None);
        paragraphs.set_attr("border", "1").unwrap();
        assert!(paragraphs.iter().all(|n| n.attribute("border").as_deref() == Some("1")));
        paragraphs
            .set_attr_with("title", |node, index, _| format!("{}{}", node.text_content(), index))
            .unwrap();
        assert_eq!(paragraphs.last().unwrap().attr("title").as_deref(), Some("bar1"));
    }

    #[test]
    fn invalid_names_are_rejected_before_changes() {
        let paragraphs = paragraphs();
        assert!(matches!(
            paragraphs.set_attr("1st", "x"),
            Err(NodesError::InvalidAttributeName(_))
        ));
        assert!(paragraphs.remove_attr(&["class", "a b"]).is_err());
        assert_eq!(paragraphs.attr("class").as_deref(), Some("blue"));
    }

    #[test]
    fn removes_attributes() {
        let paragraphs = paragraphs();
        paragraphs.set_attr("id", "x").unwrap();
        paragraphs.remove_attr(&["class"]).unwrap();
        assert_eq!(classes(&paragraphs), [None, None]);
        assert_eq!(paragraphs.attr("id").as_deref(), Some("x"));
        paragraphs.remove_attr(&["*"]).unwrap();
        assert!(paragraphs.iter().all(|n| n.attributes().is_empty()));
    }

    #[test]
    fn class_helpers() {
        let paragraphs = paragraphs();
        assert!(paragraphs.has_class("highlight"));
        assert!(!paragraphs.has_class("high"));

        paragraphs.toggle_class("highlight").unwrap();
        assert_eq!(
            classes(&paragraphs),
            [Some("blue highlight".to_string()), Some("blue".to_string())]
        );

        paragraphs.add_class("blue green").unwrap();
        assert_eq!(
            classes(&paragraphs),
            [Some("blue highlight green".to_string()), Some("blue green".to_string())]
        );

        paragraphs.remove_class(Some("blue highlight")).unwrap();
        assert_eq!(classes(&paragraphs), [Some("green".to_string()), Some("green".to_string())]);
        paragraphs.remove_class(Some("green")).unwrap();
        assert_eq!(classes(&paragraphs), [None, None]);
    }
}
