mod common;

use arbor::{
    ContentType, DocumentRef, Insertable, Nodes, NodesError, Property, PropertyValue, Selector,
    sort_nodes,
};
use common::{TestResult, items, names, root_xml, texts};

#[test]
fn items_scenario() -> TestResult {
    let nodes = items()?;
    let found = nodes.find("//item")?;
    assert_eq!(found.len(), 3);
    assert_eq!(texts(&found), ["text1", "text2", "text3"]);
    assert_eq!(found.index()?, Some(0));
    assert_eq!(found.eq(2)?.index()?, Some(2));
    assert_eq!(nodes.find("//div")?.eq(1)?.index()?, Some(1));
    Ok(())
}

#[test]
fn spawn_end_identity() -> TestResult {
    let nodes = items()?;
    assert!(nodes.spawn().end().ptr_eq(&nodes));
    let found = nodes.find("//group")?;
    assert!(found.find("item")?.end().ptr_eq(&found));
    assert!(found.end().ptr_eq(&nodes));
    assert!(nodes.end().ptr_eq(&nodes));
    Ok(())
}

#[test]
fn spawned_collections_share_the_document() -> TestResult {
    let nodes = Nodes::new();
    let child = nodes.spawn();
    assert_eq!(child.document(), nodes.document());
    nodes.load(common::fixtures::ITEMS_XML, "xml")?;
    assert_ne!(child.document(), nodes.document());
    Ok(())
}

#[test]
fn document_context_resolves_once() -> TestResult {
    let nodes = items()?;
    let groups = nodes.find("//group")?;
    // Each group resolves "//item" against the whole document again.
    assert_eq!(groups.find("//item")?.len(), 3);
    assert_eq!(groups.find("item")?.len(), 3);
    assert_eq!(groups.find_in_document("item")?.len(), 0);
    assert_eq!(groups.find_in_document("//item")?.len(), 3);

    let empty = groups.filter("@id = 'none'")?;
    assert!(empty.is_empty());
    assert!(empty.find("//item")?.is_empty());
    Ok(())
}

#[test]
fn content_type_normalization() -> TestResult {
    let nodes = items()?;
    for (input, expected) in [
        ("xml", ContentType::Xml),
        ("application/xml", ContentType::Xml),
        ("text/xml", ContentType::Xml),
        ("html", ContentType::Html),
        ("text/html", ContentType::Html),
    ] {
        nodes.set_content_type(input)?;
        assert_eq!(nodes.content_type(), expected, "{}", input);
    }
    assert!(matches!(
        nodes.set_content_type("text/plain"),
        Err(NodesError::InvalidContentType(_))
    ));
    assert_eq!(
        nodes.property(Property::ContentType),
        PropertyValue::ContentType(ContentType::Html)
    );
    Ok(())
}

#[test]
fn child_content_type_changes_reach_the_root() -> TestResult {
    let nodes = items()?;
    let found = nodes.find("//item")?;
    found.set_property(PropertyValue::ContentType(ContentType::Html))?;
    assert_eq!(nodes.content_type(), ContentType::Html);
    assert!(nodes.to_string().starts_with("<items version=\"1.0\">"));
    Ok(())
}

#[test]
fn pushing_foreign_nodes_fails_without_changes() -> TestResult {
    let nodes = items()?;
    let found = nodes.find("//item")?;
    let other = DocumentRef::new();
    let foreign = other.create_element("item")?;
    let mut list = found.to_vec();
    list.push(foreign);
    assert!(matches!(found.push(list, false), Err(NodesError::ForeignNode(3))));
    assert_eq!(found.len(), 3);
    Ok(())
}

#[test]
fn pushing_appends_in_input_order_without_dedup() -> TestResult {
    let nodes = items()?;
    let found = nodes.find("//item")?;
    let collection = nodes.spawn();
    collection.push(found.get(2).ok_or("missing")?, false)?;
    collection.push(&found, false)?;
    assert_eq!(texts(&collection), ["text3", "text1", "text2", "text3"]);
    assert_eq!(texts(&collection.unique()?), ["text1", "text2", "text3"]);
    Ok(())
}

#[test]
fn sorting_is_idempotent_and_deduplicates() -> TestResult {
    let nodes = items()?;
    let mut all = nodes.find("//div | //item")?.to_vec();
    all.reverse();
    let copy = all.clone();
    all.extend(copy);
    let document = nodes.document();
    let once = sort_nodes(&document, &all)?;
    assert_eq!(once.len(), 6);
    assert_eq!(sort_nodes(&document, &once)?, once);
    assert_eq!(
        names(&nodes.spawn_with(once)?),
        ["item", "item", "item", "div", "div", "div"]
    );
    Ok(())
}

#[test]
fn resolver_output_is_in_document_order() -> TestResult {
    let nodes = items()?;
    let found = nodes.find("//div | //group | //item")?;
    assert_eq!(names(&found), ["group", "item", "item", "item", "div", "div", "div"]);
    Ok(())
}

#[test]
fn selectors_of_every_kind() -> TestResult {
    let nodes = items()?;
    let group = nodes.find("//group")?;
    let item = nodes.find("//item[2]")?.get(0).ok_or("missing")?;
    assert_eq!(texts(&nodes.find(&item)?), ["text2"]);
    assert_eq!(nodes.find(&group)?.len(), 1);
    let last_child = |context: Option<&arbor::Node>| {
        context.and_then(|node| node.last_element_child()).map(|n| vec![n])
    };
    assert_eq!(texts(&group.find(Selector::Callback(&last_child))?), ["text3"]);
    assert!(matches!(
        nodes.find("count(//item)"),
        Err(NodesError::InvalidSelectorResult(_))
    ));
    assert!(matches!(nodes.find(""), Err(NodesError::InvalidSelector(_))));
    Ok(())
}

#[test]
fn expanding_empty_and_multi_root_content() -> TestResult {
    let nodes = items()?;
    assert!(nodes.expand(&Insertable::Empty, None)?.is_empty());
    let expanded = nodes.expand(&"<a/><b/><c/>".into(), None)?;
    let expanded = nodes.spawn_with(expanded)?;
    assert_eq!(names(&expanded), ["a", "b", "c"]);
    Ok(())
}

#[test]
fn read_only_properties() -> TestResult {
    let nodes = items()?;
    assert_eq!(nodes.find("//item")?.property(Property::Length), PropertyValue::Length(3));
    assert!(matches!(
        nodes.set_property(PropertyValue::Length(1)),
        Err(NodesError::ReadOnlyProperty(_))
    ));
    Ok(())
}

#[test]
fn empty_content_leaves_the_document_untouched() -> TestResult {
    let nodes = items()?;
    let before = root_xml(&nodes)?;
    let items = nodes.find("//item")?;
    for content in [Insertable::Empty, "".into(), "  ".into(), Insertable::Nodes(Vec::new())] {
        assert!(items.append(content.clone())?.is_empty());
        assert!(items.prepend(content.clone())?.is_empty());
        assert!(items.after(content.clone())?.is_empty());
        assert!(items.before(content.clone())?.is_empty());
        assert!(matches!(items.wrap(content), Err(NodesError::InvalidElements(_))));
        assert_eq!(root_xml(&nodes)?, before);
    }
    Ok(())
}

#[test]
fn single_node_collections_find_below_the_node() -> TestResult {
    let nodes = items()?;
    let group = nodes.find("//group")?.get(0).ok_or("missing group")?;
    let held = nodes.spawn_with(group)?;
    assert!(!held.uses_document_context());
    assert_eq!(held.find("item")?.len(), 3);
    assert!(held.find("div")?.is_empty());

    let created = Nodes::new().append("<root><child/></root>")?;
    assert_eq!(names(&created), ["root"]);
    assert_eq!(created.find("child")?.len(), 1);

    let list = nodes.spawn_with(Vec::<arbor::Node>::new())?;
    assert!(list.spawn().find("//item")?.is_empty());
    Ok(())
}
