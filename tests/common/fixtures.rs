/// The reference document used across the integration tests.
pub const ITEMS_XML: &str = concat!(
    r#"<items version="1.0">"#,
    r#"<group id="1st">"#,
    r#"<item index="0">text1</item>"#,
    r#"<item index="1">text2</item>"#,
    r#"<item index="2">text3</item>"#,
    r#"</group>"#,
    r#"<html>"#,
    r#"<div class="test1 test2">class testing</div>"#,
    r#"<div class="test2">class testing</div>"#,
    r#"<div>class testing</div>"#,
    r#"</html>"#,
    r#"</items>"#
);

pub const PAGE_HTML: &str = r#"<!DOCTYPE html>
<html>
  <head><title>Examples</title></head>
  <body>
    <p class="blue">foo</p>
    <p class="blue highlight">bar</p>
    <ul><li>one<li>two</ul>
  </body>
</html>"#;

pub const PERSON_JSON: &str = r#"{
  "name": "Alice",
  "age": 42,
  "admin": false,
  "tags": ["a", "b"],
  "address": {"city": "Oslo", "zip code": "0150"},
  "extra": {}
}"#;
