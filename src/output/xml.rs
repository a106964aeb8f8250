use std::io;

use crate::encoding;
use crate::entity::{escape_attribute, escape_text};
use crate::error::SerializeError;
use crate::tree::{Node, Tree};

use super::{gen_outputs, Indenter, Layout, Output, OutputToken, SerializeOptions};

// spaces per indentation level
const INDENT: usize = 4;

pub(crate) struct XmlSerializer<'a> {
    tree: &'a Tree,
}

impl<'a> XmlSerializer<'a> {
    pub(crate) fn new(tree: &'a Tree) -> Self {
        Self { tree }
    }

    pub(crate) fn serialize(&self, out: &mut String, outputs: impl Iterator<Item = (Node, Output<'a>)>) {
        for (node, output) in outputs {
            self.serialize_node(out, node, &output);
        }
    }

    pub(crate) fn serialize_indented(
        &self,
        out: &mut String,
        outputs: impl Iterator<Item = (Node, Output<'a>)>,
    ) {
        let mut indenter = Indenter::new(self.tree);
        for (node, output) in outputs {
            let Layout { indent, newline } = indenter.layout(node, &output);
            out.push_str(&" ".repeat(indent * INDENT));
            self.serialize_node(out, node, &output);
            if newline {
                out.push('\n');
            }
        }
    }

    fn serialize_node(&self, out: &mut String, node: Node, output: &Output<'a>) {
        let token = self.render_output(node, output);
        if token.space {
            out.push(' ');
        }
        out.push_str(&token.text);
    }

    pub(crate) fn render_output(&self, node: Node, output: &Output<'a>) -> OutputToken {
        use Output::*;
        match output {
            StartTagOpen(name) => OutputToken {
                space: false,
                text: format!("<{}", name),
            },
            StartTagClose => OutputToken {
                space: false,
                text: if self.tree.first_child(node).is_none() {
                    "/>".to_string()
                } else {
                    ">".to_string()
                },
            },
            EndTag(name) => OutputToken {
                space: false,
                text: if self.tree.first_child(node).is_some() {
                    format!("</{}>", name)
                } else {
                    String::new()
                },
            },
            Prefix(prefix, uri) => OutputToken {
                space: true,
                text: if prefix.is_empty() {
                    format!("xmlns=\"{}\"", escape_attribute(uri))
                } else {
                    format!("xmlns:{}=\"{}\"", prefix, escape_attribute(uri))
                },
            },
            Attribute(name, value) => OutputToken {
                space: true,
                text: format!("{}=\"{}\"", name, escape_attribute(value)),
            },
            Text(text) => OutputToken {
                space: false,
                text: escape_text(text).into_owned(),
            },
            Comment(text) => OutputToken {
                space: false,
                text: format!("<!--{}-->", text),
            },
            ProcessingInstruction(target, data) => OutputToken {
                space: false,
                text: match data {
                    Some(data) => format!("<?{} {}?>", target, data),
                    None => format!("<?{}?>", target),
                },
            },
        }
    }
}

/// Serialize the subtree at `node` and write the encoded bytes to `w`.
pub(crate) fn serialize_to<W: io::Write>(
    tree: &Tree,
    node: Node,
    options: &SerializeOptions,
    w: &mut W,
) -> Result<(), SerializeError> {
    tree.check(node)?;
    if !tree.is_element(node) {
        return Err(SerializeError::NotAnElement);
    }
    let target = options.encoding.output_encoding();

    let mut out = String::new();
    if !options.omit_xml_declaration {
        out.push_str(&format!(
            "<?xml version=\"1.0\" encoding=\"{}\"?>",
            target.name()
        ));
        if options.indent {
            out.push('\n');
        }
    }
    if options.retain_doctype && tree.document_element() == Some(node) {
        if let Some(doctype) = tree.doctype() {
            match (&doctype.public_id, &doctype.system_id) {
                (Some(public_id), Some(system_id)) => out.push_str(&format!(
                    "<!DOCTYPE {} PUBLIC \"{}\" \"{}\">\n",
                    doctype.name, public_id, system_id
                )),
                (None, Some(system_id)) => out.push_str(&format!(
                    "<!DOCTYPE {} SYSTEM \"{}\">\n",
                    doctype.name, system_id
                )),
                _ => {}
            }
        }
    }

    let serializer = XmlSerializer::new(tree);
    let outputs = gen_outputs(tree, node);
    if options.indent {
        serializer.serialize_indented(&mut out, outputs);
    } else {
        serializer.serialize(&mut out, outputs);
    }

    let (bytes, used) = encoding::encode(&out, target);
    tracing::debug!(
        encoding = used.name(),
        indent = options.indent,
        omit_xml_declaration = options.omit_xml_declaration,
        retain_doctype = options.retain_doctype,
        "serialized subtree"
    );
    w.write_all(&bytes)?;
    Ok(())
}

/// Serialize the subtree at `node` into bytes.
pub(crate) fn serialize(tree: &Tree, node: Node, options: &SerializeOptions) -> Result<Vec<u8>, SerializeError> {
    let mut buf = Vec::new();
    serialize_to(tree, node, options, &mut buf)?;
    Ok(buf)
}
