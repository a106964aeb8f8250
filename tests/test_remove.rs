use nmxml::{Cursor, Error, Feature, Nx, TreeError};

fn dump(cursor: &Cursor) -> String {
    cursor
        .dump_xml_with(encoding_rs::UTF_8, &[Feature::OmitXmlDeclaration])
        .unwrap()
}

#[test]
fn test_remove() {
    let cursor = Nx::new().parse("<root><a/><b/><c/></root>").unwrap();
    cursor.to("b").unwrap().remove().unwrap();
    assert_eq!(dump(&cursor), "<root><a/><c/></root>");
}

#[test]
fn test_remove_merges_surrounding_text() {
    let cursor = Nx::new().parse("<p>one <b>two</b> three</p>").unwrap();
    cursor.to("b").unwrap().remove().unwrap();
    assert_eq!(dump(&cursor), "<p>one  three</p>");
}

#[test]
fn test_remove_document_element() {
    let cursor = Nx::new().parse("<root/>").unwrap();
    let err = cursor.remove().unwrap_err();
    assert!(matches!(err, Error::InvalidOperation { .. }));
    assert_eq!(err.to_string(), "root -- Cannot remove document element");
}

#[test]
fn test_removed_cursor_is_stale() {
    let cursor = Nx::new().parse("<root><a><x>1</x></a></root>").unwrap();
    let a = cursor.to("a").unwrap();
    let x = a.to("x").unwrap();
    a.remove().unwrap();

    assert_eq!(x.text(), None);
    assert_eq!(x.count("y"), 0);
    assert!(!a.has_attr("id"));
    assert!(matches!(
        x.set_text("2"),
        Err(Error::Tree {
            source: TreeError::Removed,
            ..
        })
    ));
    assert!(matches!(a.to("x"), Err(Error::Tree { .. })));
    assert!(matches!(a.remove(), Err(Error::Tree { .. })));
    let err = a.append("y").unwrap_err();
    assert_eq!(
        err.to_string(),
        "root >> a -- node has been removed from the document"
    );
}

#[test]
fn test_remove_children() {
    let cursor = Nx::new()
        .parse(r#"<root><a keep="1"/><b/><a/><c keep="1"/></root>"#)
        .unwrap();
    let removed = cursor.remove_children(|child| !child.has_attr("keep")).unwrap();
    assert_eq!(removed, 2);
    assert_eq!(dump(&cursor), r#"<root><a keep="1"/><c keep="1"/></root>"#);
}

#[test]
fn test_remove_children_by_position_path() {
    let cursor = Nx::new().parse("<root><a/><a/><a/></root>").unwrap();
    let removed = cursor
        .remove_children(|child| child.describe_path() == "root >> a[1]")
        .unwrap();
    assert_eq!(removed, 1);
    assert_eq!(cursor.count("a"), 2);
}

#[test]
fn test_remove_on_empty_cursor() {
    let cursor = Nx::new().parse("<root><a/></root>").unwrap();
    let missing = cursor.to_optional("b").unwrap();
    missing.remove().unwrap();
    assert_eq!(missing.remove_children(|_| true).unwrap(), 0);
    assert_eq!(dump(&cursor), "<root><a/></root>");
}
