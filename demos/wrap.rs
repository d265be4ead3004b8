use arbor::{Insertable, Node, Nodes, NodesError};

fn main() -> Result<(), NodesError> {
    env_logger::init();

    let nodes = Nodes::from_source(
        "<html><body><p>Hello</p><p>cruel</p><p>World</p></body></html>",
        "html",
    )?;

    let paragraphs = nodes.find("//p")?;
    paragraphs.wrap("<div class=\"outer\"><div class=\"inner\"></div></div>")?;
    println!("wrap:\n{}", nodes);

    // Every wrapper is created for its own target.
    let numbered = |node: &Node, index: usize| {
        Insertable::from(format!("<section data-index=\"{}\" data-text=\"{}\"/>", index, node.text_content()))
    };
    nodes.find("//p")?.wrap(Insertable::Callback(&numbered))?;
    println!("wrap with callback:\n{}", nodes);

    nodes
        .find("//div[@class = 'inner']")?
        .wrap_inner("<b/>")?
        .end()
        .find("//b")?
        .wrap_all("<div class=\"all\"/>")?;
    println!("wrap_all:\n{}", nodes.format_output(None)?);
    Ok(())
}
