use nmxml::{Cursor, Error, Nx};

const ORDER: &str = r#"<order>
  <id>42</id>
  <total>17.5</total>
  <line><sku>A-1</sku><qty>2</qty></line>
  <line><sku>B-2</sku><qty>1</qty></line>
  <line><sku>C-3</sku><qty>5</qty></line>
</order>"#;

#[derive(Debug, PartialEq)]
struct Line {
    sku: String,
    qty: i32,
}

fn line(cursor: &Cursor) -> Result<Line, Error> {
    Ok(Line {
        sku: cursor.to("sku")?.text().unwrap_or_default(),
        qty: cursor.to("qty")?.extract_as()?.unwrap_or_default(),
    })
}

#[test]
fn test_text() {
    let cursor = Nx::new().parse(ORDER).unwrap();
    assert_eq!(cursor.to("id").unwrap().text().as_deref(), Some("42"));
}

#[test]
fn test_text_includes_descendants() {
    let cursor = Nx::new().parse("<p>Hello <b>big</b> world</p>").unwrap();
    assert_eq!(cursor.text().as_deref(), Some("Hello big world"));
}

#[test]
fn test_builtin_numeric_extractors() {
    let cursor = Nx::new().parse(ORDER).unwrap();
    let id: Option<i64> = cursor.to("id").unwrap().extract_as().unwrap();
    assert_eq!(id, Some(42));
    let total: Option<f64> = cursor.to("total").unwrap().extract_as().unwrap();
    assert_eq!(total, Some(17.5));
    let total: Option<f32> = cursor.to("total").unwrap().extract_as().unwrap();
    assert_eq!(total, Some(17.5));
}

#[test]
fn test_numeric_extractor_failure() {
    let cursor = Nx::new().parse(ORDER).unwrap();
    let result: Result<Option<i32>, Error> = cursor.to("total").unwrap().extract_as();
    assert!(matches!(result, Err(Error::ParseInt(_))));
}

#[test]
fn test_extract_with_closure() {
    let cursor = Nx::new().parse(ORDER).unwrap();
    let first = cursor.to_nth(0, "line").unwrap().extract(line).unwrap();
    assert_eq!(
        first,
        Some(Line {
            sku: "A-1".to_string(),
            qty: 2
        })
    );
}

#[test]
fn test_extract_collection() {
    let cursor = Nx::new().parse(ORDER).unwrap();
    let lines = cursor.extract_collection("line", line).unwrap();
    let skus: Vec<&str> = lines.iter().map(|l| l.sku.as_str()).collect();
    assert_eq!(skus, ["A-1", "B-2", "C-3"]);
}

#[test]
fn test_extract_collection_of_missing_name_is_empty() {
    let cursor = Nx::new().parse(ORDER).unwrap();
    let lines = cursor.extract_collection("nothing", line).unwrap();
    assert!(lines.is_empty());
}

#[test]
fn test_registered_extractor() {
    let mut nx = Nx::new();
    nx.register_extractor(line);
    let cursor = nx.parse(ORDER).unwrap();
    let lines: Vec<Line> = cursor.extract_collection_as("line").unwrap();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[2].qty, 5);
}

#[test]
fn test_extractor_registered_after_parse_is_visible() {
    let mut nx = Nx::new();
    let cursor = nx.parse(ORDER).unwrap();
    nx.register_extractor(line);
    let first: Option<Line> = cursor.to_nth(0, "line").unwrap().extract_as().unwrap();
    assert_eq!(first.map(|l| l.sku).as_deref(), Some("A-1"));
}

#[test]
fn test_registered_extractor_replaces_builtin() {
    let mut nx = Nx::new();
    nx.register_extractor(|cursor: &Cursor| Ok(cursor.text().map(|t| t.len() as i32).unwrap_or(0)));
    let cursor = nx.parse(ORDER).unwrap();
    let length: Option<i32> = cursor.to("total").unwrap().extract_as().unwrap();
    assert_eq!(length, Some(4));
}

#[test]
fn test_no_extractor() {
    let cursor = Nx::new().parse(ORDER).unwrap();
    let err = cursor.to("id").unwrap().extract_as::<Line>().unwrap_err();
    assert!(matches!(err, Error::NoExtractor { .. }));
    assert!(err
        .to_string()
        .starts_with("order >> id -- No extractor for: "));
}

#[test]
fn test_application_errors_propagate() {
    let cursor = Nx::new().parse(ORDER).unwrap();
    let err = cursor
        .to("id")
        .unwrap()
        .extract(|_| -> Result<(), Error> { Err(Error::extract("bad order id")) })
        .unwrap_err();
    assert_eq!(err.to_string(), "bad order id");
}

#[test]
fn test_iterate_collection_paths() {
    let cursor = Nx::new().parse(ORDER).unwrap();
    let mut paths = Vec::new();
    cursor
        .iterate_collection("line", |line| {
            paths.push(line.to("qty")?.describe_path());
            Ok(())
        })
        .unwrap();
    assert_eq!(
        paths,
        [
            "order >> line >> qty",
            "order >> line[1] >> qty",
            "order >> line[2] >> qty"
        ]
    );
}

#[test]
fn test_iterate_collection_stops_at_first_error() {
    let cursor = Nx::new().parse(ORDER).unwrap();
    let mut visited = 0;
    let result = cursor.iterate_collection("line", |line| {
        visited += 1;
        line.to("missing").map(|_| ())
    });
    assert!(result.is_err());
    assert_eq!(visited, 1);
}

#[test]
fn test_extraction_from_empty_cursor() {
    let cursor = Nx::new().parse(ORDER).unwrap();
    let missing = cursor.to_optional("customer").unwrap();
    assert_eq!(missing.text(), None);
    assert_eq!(missing.extract(line).unwrap(), None);
    assert_eq!(missing.extract_as::<i32>().unwrap(), None);
    assert_eq!(missing.extract_as::<Line>().unwrap(), None);
    assert!(missing.extract_collection("line", line).unwrap().is_empty());
    let mut visited = false;
    missing
        .iterate_collection("line", |_| {
            visited = true;
            Ok(())
        })
        .unwrap();
    assert!(!visited);
}
