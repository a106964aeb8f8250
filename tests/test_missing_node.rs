use nmxml::{Error, Needle, Nx};

const MESSAGE: &str = r#"<message>
  <header><id>1</id><from>a</from><to>b</to><id2/></header>
  <body/>
</message>"#;

#[test]
fn test_missing_node_suggests_children() {
    let cursor = Nx::new().parse(MESSAGE).unwrap();
    let err = cursor.to_path(&["header", "idd"]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "message >> header -- Unable to find 'idd' - Did you mean: from, id, id2, to?"
    );
    match err {
        Error::MissingNode {
            path,
            needle,
            candidates,
        } => {
            assert_eq!(path, "message >> header");
            assert_eq!(needle, Needle::Name("idd".to_string()));
            assert_eq!(candidates, ["from", "id", "id2", "to"]);
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_missing_position() {
    let cursor = Nx::new().parse(MESSAGE).unwrap();
    let err = cursor.to_nth(1, "header").unwrap_err();
    assert_eq!(
        err.to_string(),
        "message -- Unable to find 'header' with index 1 - Did you mean: body, header?"
    );
}

#[test]
fn test_candidates_are_deduplicated_local_names() {
    let cursor = Nx::new()
        .parse(r#"<r xmlns:x="urn:x"><x:b/><b/><a/><a/></r>"#)
        .unwrap();
    let err = cursor.to("c").unwrap_err();
    assert_eq!(err.to_string(), "r -- Unable to find 'c' - Did you mean: a, b?");
}

#[test]
fn test_no_candidates() {
    let cursor = Nx::new().parse("<leaf>text</leaf>").unwrap();
    let err = cursor.to("child").unwrap_err();
    assert_eq!(
        err.to_string(),
        "leaf -- Unable to find 'child' - Did you mean: ?"
    );
}

#[test]
fn test_missing_predicate_match() {
    let cursor = Nx::new().parse(MESSAGE).unwrap();
    let err = cursor.require(|_| false).unwrap_err();
    assert_eq!(
        err.to_string(),
        "message -- Unable to find node matching predicate - Did you mean: body, header?"
    );
}

#[test]
fn test_error_path_through_optional_hops() {
    let cursor = Nx::new().parse(MESSAGE).unwrap();
    let body = cursor.to_optional("body").unwrap();
    let err = body.to("content").unwrap_err();
    assert_eq!(
        err.to_string(),
        "message >> body -- Unable to find 'content' - Did you mean: ?"
    );
}
