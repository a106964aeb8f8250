use nmxml::{Cursor, Error, Feature, Nx};

fn dump(cursor: &Cursor) -> String {
    cursor
        .dump_xml_with(encoding_rs::UTF_8, &[Feature::OmitXmlDeclaration])
        .unwrap()
}

struct Person {
    name: &'static str,
    age: u32,
}

fn write_person(cursor: &Cursor, person: &Person) -> Result<(), Error> {
    cursor.to("name")?.set_text(person.name)?;
    cursor.to("age")?.set_text(&person.age.to_string())?;
    Ok(())
}

#[test]
fn test_set_text_replaces_content() {
    let cursor = Nx::new()
        .parse("<root><p>old <b>bold</b> text</p></root>")
        .unwrap();
    cursor.to("p").unwrap().set_text("new").unwrap();
    assert_eq!(dump(&cursor), "<root><p>new</p></root>");
}

#[test]
fn test_set_text_is_escaped() {
    let cursor = Nx::new().parse("<root/>").unwrap();
    cursor.set_text("1 < 2 & 3 > 2").unwrap();
    assert_eq!(dump(&cursor), "<root>1 &lt; 2 &amp; 3 &gt; 2</root>");
    assert_eq!(cursor.text().as_deref(), Some("1 < 2 & 3 > 2"));
}

#[test]
fn test_set_empty_text_clears() {
    let cursor = Nx::new().parse("<root><a>x</a></root>").unwrap();
    cursor.to("a").unwrap().set_text("").unwrap();
    assert_eq!(dump(&cursor), "<root><a/></root>");
}

#[test]
fn test_set_text_chains() {
    let cursor = Nx::new().parse("<root/>").unwrap();
    cursor.set_text("v").unwrap().set_attr("k", "1").unwrap();
    assert_eq!(dump(&cursor), r#"<root k="1">v</root>"#);
}

#[test]
fn test_update() {
    let cursor = Nx::new()
        .parse("<person><name/><age/></person>")
        .unwrap();
    let person = Person {
        name: "Nasse",
        age: 42,
    };
    cursor
        .update(&person, |cursor, person| write_person(cursor, person))
        .unwrap();
    assert_eq!(
        dump(&cursor),
        "<person><name>Nasse</name><age>42</age></person>"
    );
}

#[test]
fn test_update_propagates_errors() {
    let cursor = Nx::new().parse("<person><name/></person>").unwrap();
    let person = Person { name: "x", age: 1 };
    let err = cursor
        .update(&person, |cursor, person| write_person(cursor, person))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "person -- Unable to find 'age' - Did you mean: name?"
    );
}

#[test]
fn test_writes_to_empty_cursor_are_ignored() {
    let cursor = Nx::new().parse("<root><a/></root>").unwrap();
    let missing = cursor.to_optional("b").unwrap();
    missing.set_text("ignored").unwrap();
    let mut called = false;
    missing
        .update((), |_, _| {
            called = true;
            Ok(())
        })
        .unwrap();
    assert!(!called);
    assert_eq!(dump(&cursor), "<root><a/></root>");
}
