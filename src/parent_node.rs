//! `append`/`prepend` for single nodes, following the DOM `ParentNode`
//! mixin: plain strings become text nodes.

use crate::error::NodesError;
use crate::mutation::Insertable;
use crate::nodes::Nodes;
use arbor_dom::Node;

pub trait ParentNodeExt {
    /// Appends the expanded content and returns the inserted nodes.
    /// [`Appendable`](crate::mutation::Appendable) content appends itself.
    fn append_content<'a>(&self, content: impl Into<Insertable<'a>>) -> Result<Vec<Node>, NodesError>;

    /// Inserts the expanded content before the first child, or appends it
    /// when there are no children.
    fn prepend_content<'a>(&self, content: impl Into<Insertable<'a>>) -> Result<Vec<Node>, NodesError>;
}

fn expand_for(node: &Node, content: Insertable<'_>) -> Result<Vec<Node>, NodesError> {
    let content = match content {
        Insertable::Markup(text) => Insertable::Text(text),
        other => other,
    };
    let nodes = Nodes::from_source(&node.document(), "xml")?;
    nodes.expand(&content, Some((node, 0)))
}

impl ParentNodeExt for Node {
    fn append_content<'a>(&self, content: impl Into<Insertable<'a>>) -> Result<Vec<Node>, NodesError> {
        let content = content.into();
        if let Insertable::Appendable(appendable) = &content {
            return appendable.append_to(self);
        }
        let nodes = expand_for(self, content)?;
        if !nodes.is_empty() {
            self.append_children(&nodes)?;
        }
        Ok(nodes)
    }

    fn prepend_content<'a>(&self, content: impl Into<Insertable<'a>>) -> Result<Vec<Node>, NodesError> {
        let Some(first) = self.first_child() else {
            return self.append_content(content);
        };
        let nodes = expand_for(self, content.into())?;
        if !nodes.is_empty() {
            self.insert_before(&nodes, Some(&first))?;
        }
        Ok(nodes)
    }
}
