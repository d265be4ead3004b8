use arbor::{Nodes, NodesError};
use clap::Parser;
use std::env;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about = "Prints the nodes an XPath selector finds in a document", long_about = None)]
struct Args {
    /// Document to load
    file: PathBuf,

    /// XPath expression
    selector: String,

    /// xml, html or json
    #[arg(short, long, default_value = "xml")]
    content_type: String,

    /// Namespace bindings as prefix=uri
    #[arg(short, long = "namespace")]
    namespaces: Vec<String>,

    /// Print text content instead of markup
    #[arg(long, default_value_t = false)]
    text: bool,
}

fn main() -> Result<(), NodesError> {
    if env::var("RUST_LOG").is_err() {
        unsafe {
            env::set_var("RUST_LOG", "arbor=info");
        }
    }
    env_logger::init();

    let args = Args::parse();

    let mut builder = Nodes::builder();
    for binding in &args.namespaces {
        match binding.split_once('=') {
            Some((prefix, uri)) => builder = builder.with_namespace(prefix, uri),
            None => eprintln!("Ignoring namespace binding without '=': {}", binding),
        }
    }
    let nodes = builder.build();
    nodes.load(args.file.as_path(), &args.content_type)?;

    let found = nodes.find(args.selector.as_str())?;
    println!("{} node(s)", found.len());
    for node in &found {
        if args.text {
            println!("{}", node.text_content());
        } else if nodes.content_type().is_html() {
            println!("{}", node.to_html());
        } else {
            println!("{}", node.to_xml()?);
        }
    }
    Ok(())
}
