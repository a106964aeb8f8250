use genawaiter::rc::gen;
use genawaiter::yield_;

use crate::tree::{Node, NodeEdge, Tree};
use crate::value::Value;

/// What a node edge contributes to the output.
#[derive(Debug, PartialEq)]
pub(crate) enum Output<'a> {
    /// Start tag open, i.e `<foo` or `<ns:foo`
    StartTagOpen(&'a str),
    /// Start tag close, either `>` or `/>`
    StartTagClose,
    /// End tag, i.e. `</foo>` or `</ns:foo>`
    EndTag(&'a str),
    /// Namespace declaration as prefix and uri; the default namespace has
    /// the empty prefix.
    Prefix(&'a str, &'a str),
    /// Attribute, i.e. `foo="bar"`
    Attribute(&'a str, &'a str),
    Text(&'a str),
    Comment(&'a str),
    ProcessingInstruction(&'a str, Option<&'a str>),
}

pub(crate) fn gen_outputs(tree: &Tree, node: Node) -> impl Iterator<Item = (Node, Output)> + '_ {
    gen!({
        for edge in tree.traverse(node) {
            match edge {
                NodeEdge::Start(current_node) => {
                    let gen = gen_edge_start(tree, node, current_node);
                    for output in gen {
                        yield_!((current_node, output));
                    }
                }
                NodeEdge::End(current_node) => {
                    if let Some(element) = tree.element(current_node) {
                        yield_!((current_node, Output::EndTag(element.name())));
                    }
                }
            }
        }
    })
    .into_iter()
}

fn gen_edge_start(tree: &Tree, top_node: Node, node: Node) -> impl Iterator<Item = Output> + '_ {
    gen!({
        match tree.value(node) {
            Value::Root => {}
            Value::Element(element) => {
                yield_!(Output::StartTagOpen(element.name()));

                // a fragment carries the declarations it inherits
                if node == top_node {
                    let mut seen: Vec<&str> = Vec::new();
                    for ancestor in tree.ancestors(node) {
                        let Some(ancestor_element) = tree.element(ancestor) else {
                            continue;
                        };
                        for (prefix, uri) in ancestor_element.prefixes() {
                            if element.get_namespace(prefix).is_none()
                                && !seen.contains(&prefix.as_str())
                            {
                                seen.push(prefix);
                                yield_!(Output::Prefix(prefix, uri));
                            }
                        }
                    }
                }

                for (prefix, uri) in element.prefixes() {
                    yield_!(Output::Prefix(prefix, uri));
                }

                for (name, value) in element.attributes().iter() {
                    yield_!(Output::Attribute(name, value));
                }

                yield_!(Output::StartTagClose);
            }
            Value::Text(text) => {
                yield_!(Output::Text(text.get()));
            }
            Value::Comment(comment) => {
                yield_!(Output::Comment(comment.get()));
            }
            Value::ProcessingInstruction(pi) => {
                yield_!(Output::ProcessingInstruction(pi.target(), pi.data()));
            }
        }
    })
    .into_iter()
}

/// An [`Output`] rendered as text.
pub(crate) struct OutputToken {
    /// Whether the token is prefixed by a space character.
    pub(crate) space: bool,
    /// A fragment of XML like `<foo` or `a="A"` or `/>`.
    pub(crate) text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ReadContext;
    use crate::parse::{parse, ParseOptions};

    #[test]
    fn test_gen_outputs() {
        let tree = parse(
            r#"<doc a="A">Text</doc>"#,
            &ParseOptions::default(),
            &ReadContext::new(),
        )
        .unwrap();
        let doc = tree.document_element().unwrap();
        let outputs: Vec<Output> = gen_outputs(&tree, doc).map(|(_, output)| output).collect();
        assert_eq!(
            outputs,
            vec![
                Output::StartTagOpen("doc"),
                Output::Attribute("a", "A"),
                Output::StartTagClose,
                Output::Text("Text"),
                Output::EndTag("doc"),
            ]
        );
    }

    #[test]
    fn test_fragment_inherits_prefixes() {
        let tree = parse(
            r#"<doc xmlns="urn:d" xmlns:x="urn:x"><x:a xmlns:x="urn:inner"/></doc>"#,
            &ParseOptions::default(),
            &ReadContext::new(),
        )
        .unwrap();
        let doc = tree.document_element().unwrap();
        let a = tree.first_child(doc).unwrap();
        let outputs: Vec<Output> = gen_outputs(&tree, a).map(|(_, output)| output).collect();
        assert_eq!(
            outputs,
            vec![
                Output::StartTagOpen("x:a"),
                Output::Prefix("", "urn:d"),
                Output::Prefix("x", "urn:inner"),
                Output::StartTagClose,
                Output::EndTag("x:a"),
            ]
        );
    }
}
