use std::borrow::Cow;

use xmlparser::{ElementEnd, ExternalId, StrSpan, Token, Tokenizer};

use crate::context::ReadContext;
use crate::dtd::{self, Declaration, Dtd, EntityDefinition};
use crate::error::ParseError;
use crate::name;
use crate::tree::{Doctype, Node, Tree};
use crate::value::{Element, Value};

/// Named parser features, toggled independently when the engine is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigFeature {
    /// Drop whitespace-only text in elements that only hold elements.
    IgnoreElementContentWhitespace,
    /// Validate the document against its DTD.
    Validating,
}

/// Options that control parsing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    pub ignore_element_content_whitespace: bool,
    pub validating: bool,
}

impl ParseOptions {
    pub fn from_features(features: &[ConfigFeature]) -> Self {
        let mut options = ParseOptions::default();
        for feature in features {
            options.enable(*feature);
        }
        options
    }

    pub fn enable(&mut self, feature: ConfigFeature) {
        match feature {
            ConfigFeature::IgnoreElementContentWhitespace => {
                self.ignore_element_content_whitespace = true
            }
            ConfigFeature::Validating => self.validating = true,
        }
    }
}

// an element whose start tag is still being read
struct PendingElement {
    name: String,
    position: usize,
    prefixes: Vec<(String, String)>,
    attributes: Vec<(String, String, usize)>,
}

struct DocumentBuilder<'a> {
    xml: &'a str,
    options: &'a ParseOptions,
    context: &'a ReadContext,
    tree: Tree,
    current: Node,
    pending: Option<PendingElement>,
    dtd: Dtd,
    subset_start: Option<usize>,
}

impl<'a> DocumentBuilder<'a> {
    fn new(xml: &'a str, options: &'a ParseOptions, context: &'a ReadContext) -> Self {
        let tree = Tree::new();
        let current = tree.root();
        DocumentBuilder {
            xml,
            options,
            context,
            tree,
            current,
            pending: None,
            dtd: Dtd::new(),
            subset_start: None,
        }
    }

    fn at_root(&self) -> bool {
        self.current == self.tree.root()
    }

    fn declaration(&mut self, version: StrSpan) -> Result<(), ParseError> {
        if version.as_str() != "1.0" {
            return Err(ParseError::UnsupportedVersion(version.as_str().to_string()));
        }
        Ok(())
    }

    fn doctype(&mut self, name: StrSpan, external_id: Option<ExternalId>) {
        let (public_id, system_id) = match external_id {
            Some(ExternalId::System(system)) => (None, Some(system.as_str().to_string())),
            Some(ExternalId::Public(public, system)) => (
                Some(public.as_str().to_string()),
                Some(system.as_str().to_string()),
            ),
            None => (None, None),
        };
        self.tree.set_doctype(Doctype {
            name: name.as_str().to_string(),
            public_id,
            system_id,
        });
    }

    fn declarations(&mut self, declarations: Vec<Declaration>) -> Result<(), ParseError> {
        for declaration in declarations {
            match declaration {
                Declaration::Element { name, model } => self.dtd.declare_element(name, model),
                Declaration::Entity { name, definition } => {
                    if self.dtd.entities.contains(&name) {
                        continue;
                    }
                    match definition {
                        EntityDefinition::Internal(replacement) => {
                            self.dtd.entities.declare(&name, &replacement)
                        }
                        EntityDefinition::External {
                            public_id,
                            system_id,
                        } => match self.context.resolve(public_id.as_deref(), &system_id) {
                            Some(Ok(replacement)) => {
                                tracing::debug!(
                                    entity = name.as_str(),
                                    system_id = system_id.as_str(),
                                    "resolved external entity"
                                );
                                let replacement = normalize_line_endings(&replacement);
                                self.dtd.entities.declare(&name, &replacement)
                            }
                            Some(Err(source)) => {
                                return Err(ParseError::EntityResolution { system_id, source })
                            }
                            None => tracing::debug!(
                                entity = name.as_str(),
                                "external entity left unresolved"
                            ),
                        },
                    }
                }
            }
        }
        Ok(())
    }

    // runs once the whole DOCTYPE is read; the internal subset comes first so
    // its declarations take precedence
    fn finish_doctype(&mut self, internal_subset: Option<&str>) -> Result<(), ParseError> {
        if let Some(subset) = internal_subset {
            self.declarations(dtd::scan(subset)?)?;
        }
        let doctype = match self.tree.doctype() {
            Some(doctype) => doctype.clone(),
            None => return Ok(()),
        };
        let Some(system_id) = doctype.system_id else {
            return Ok(());
        };
        match self.context.resolve(doctype.public_id.as_deref(), &system_id) {
            Some(Ok(subset)) => {
                tracing::debug!(system_id = system_id.as_str(), "resolved external DTD");
                self.declarations(dtd::scan(&normalize_line_endings(&subset))?)
            }
            Some(Err(source)) => Err(ParseError::EntityResolution { system_id, source }),
            None if self.options.validating => Err(ParseError::ExternalDtdUnavailable(system_id)),
            None => {
                tracing::warn!(
                    system_id = system_id.as_str(),
                    "no entity resolver, external DTD skipped"
                );
                Ok(())
            }
        }
    }

    fn element_start(&mut self, prefix: StrSpan, local: StrSpan, span: StrSpan) {
        self.pending = Some(PendingElement {
            name: name::qualified(prefix.as_str(), local.as_str()),
            position: span.start(),
            prefixes: Vec::new(),
            attributes: Vec::new(),
        });
    }

    fn attribute(
        &mut self,
        prefix: StrSpan,
        local: StrSpan,
        value: StrSpan,
        span: StrSpan,
    ) -> Result<(), ParseError> {
        let value = self.dtd.entities.expand_attribute(value.as_str())?.into_owned();
        let Some(pending) = self.pending.as_mut() else {
            return Ok(());
        };
        let (prefix, local) = (prefix.as_str(), local.as_str());
        let declared_prefix = match (prefix, local) {
            ("xmlns", local) => Some(local),
            ("", "xmlns") => Some(""),
            _ => None,
        };
        if let Some(declared) = declared_prefix {
            if pending.prefixes.iter().any(|(p, _)| p == declared) {
                return Err(ParseError::DuplicateAttribute {
                    name: name::qualified(prefix, local),
                    element: pending.name.clone(),
                });
            }
            pending.prefixes.push((declared.to_string(), value));
            return Ok(());
        }
        let qname = name::qualified(prefix, local);
        if pending.attributes.iter().any(|(existing, _, _)| *existing == qname) {
            return Err(ParseError::DuplicateAttribute {
                name: qname,
                element: pending.name.clone(),
            });
        }
        pending.attributes.push((qname, value, span.start()));
        Ok(())
    }

    fn prefix_declared(&self, pending: &PendingElement, prefix: &str) -> bool {
        if prefix == "xml" || pending.prefixes.iter().any(|(p, _)| p == prefix) {
            return true;
        }
        std::iter::once(self.current)
            .chain(self.tree.ancestors(self.current))
            .filter_map(|node| self.tree.element(node))
            .any(|element| element.get_namespace(prefix).is_some())
    }

    fn open_element(&mut self, has_content: bool) -> Result<(), ParseError> {
        let Some(pending) = self.pending.take() else {
            return Ok(());
        };
        if self.at_root() && self.tree.document_element().is_some() {
            return Err(ParseError::MultipleRootElements(pending.name));
        }
        let prefixed = std::iter::once((pending.name.as_str(), pending.position)).chain(
            pending
                .attributes
                .iter()
                .map(|(name, _, position)| (name.as_str(), *position)),
        );
        for (qname, position) in prefixed {
            if let Some(prefix) = name::prefix(qname) {
                if !self.prefix_declared(&pending, prefix) {
                    return Err(ParseError::UnknownPrefix {
                        prefix: prefix.to_string(),
                        position,
                    });
                }
            }
        }

        let mut element = Element::new(pending.name);
        element.prefixes = pending.prefixes;
        for (name, value, _) in pending.attributes {
            element.attributes.push(name, value);
        }
        let node = self.tree.new_node(Value::Element(element));
        self.add(node)?;
        if has_content {
            self.current = node;
        }
        Ok(())
    }

    fn close_element(&mut self, prefix: StrSpan, local: StrSpan, span: StrSpan) -> Result<(), ParseError> {
        let found = name::qualified(prefix.as_str(), local.as_str());
        let expected = self
            .tree
            .element(self.current)
            .map(|element| element.name().to_string())
            .unwrap_or_default();
        if found != expected {
            return Err(ParseError::InvalidCloseTag {
                expected,
                found,
                position: span.start(),
            });
        }
        self.current = self.tree.parent(self.current).unwrap_or(self.tree.root());
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<(), ParseError> {
        if self.at_root() {
            if text.trim().is_empty() {
                return Ok(());
            }
            return Err(ParseError::TextOutsideRoot);
        }
        if text.is_empty() {
            return Ok(());
        }
        let node = self.tree.new_text(text);
        self.add(node)
    }

    fn add(&mut self, node: Node) -> Result<(), ParseError> {
        Ok(self.tree.append(self.current, node)?)
    }

    fn finish(self) -> Result<(Tree, Dtd), ParseError> {
        if let Some(element) = self.tree.element(self.current) {
            return Err(ParseError::UnclosedElement(element.name().to_string()));
        }
        if self.tree.document_element().is_none() {
            return Err(ParseError::NoRootElement);
        }
        Ok((self.tree, self.dtd))
    }
}

/// Parse text into a tree.
///
/// Line ends are normalized before anything else, so text and attribute
/// values only ever see `\n`.
pub(crate) fn parse(
    xml: &str,
    options: &ParseOptions,
    context: &ReadContext,
) -> Result<Tree, ParseError> {
    let normalized = normalize_line_endings(xml);
    let xml: &str = &normalized;
    let mut builder = DocumentBuilder::new(xml, options, context);

    for token in Tokenizer::from(xml) {
        match token? {
            Token::Declaration { version, .. } => builder.declaration(version)?,
            Token::DtdStart {
                name,
                external_id,
                span,
            } => {
                builder.doctype(name, external_id);
                builder.subset_start = Some(span.end());
            }
            Token::EmptyDtd {
                name, external_id, ..
            } => {
                builder.doctype(name, external_id);
                builder.finish_doctype(None)?;
            }
            Token::DtdEnd { span } => {
                let start = builder.subset_start.take().unwrap_or(span.start());
                let xml = builder.xml;
                let subset = xml.get(start..span.start());
                builder.finish_doctype(subset)?;
            }
            // declarations are read from the subset text as a whole
            Token::EntityDeclaration { .. } => {}
            Token::ElementStart {
                prefix,
                local,
                span,
            } => builder.element_start(prefix, local, span),
            Token::Attribute {
                prefix,
                local,
                value,
                span,
            } => builder.attribute(prefix, local, value, span)?,
            Token::ElementEnd { end, span } => match end {
                ElementEnd::Open => builder.open_element(true)?,
                ElementEnd::Empty => builder.open_element(false)?,
                ElementEnd::Close(prefix, local) => builder.close_element(prefix, local, span)?,
            },
            Token::Text { text } => {
                let expanded = builder.dtd.entities.expand(text.as_str())?.into_owned();
                builder.text(&expanded)?;
            }
            Token::Cdata { text, .. } => builder.text(text.as_str())?,
            Token::Comment { text, .. } => {
                let node = builder.tree.new_comment(text.as_str());
                builder.add(node)?;
            }
            Token::ProcessingInstruction {
                target, content, ..
            } => {
                let node = builder
                    .tree
                    .new_processing_instruction(target.as_str(), content.map(|c| c.as_str()));
                builder.add(node)?;
            }
        }
    }

    let (mut tree, dtd) = builder.finish()?;

    if options.validating {
        let doctype_name = tree
            .doctype()
            .map(|doctype| doctype.name.clone())
            .ok_or_else(|| {
                ParseError::Validation("document has no document type declaration".to_string())
            })?;
        dtd.validate(&tree, &doctype_name)?;
    }
    if options.ignore_element_content_whitespace {
        remove_element_content_whitespace(&mut tree, &dtd)?;
    }

    if let Some(root) = tree.document_element() {
        tracing::debug!(
            length = xml.len(),
            root = tree.element(root).map(|e| e.name()).unwrap_or_default(),
            "parsed document"
        );
    }
    Ok(tree)
}

// CR LF pairs and lone CRs both become a single LF
fn normalize_line_endings(xml: &str) -> Cow<str> {
    if xml.contains('\r') {
        Cow::Owned(xml.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(xml)
    }
}

fn remove_element_content_whitespace(tree: &mut Tree, dtd: &Dtd) -> Result<(), ParseError> {
    let Some(root) = tree.document_element() else {
        return Ok(());
    };
    let mut removable = Vec::new();
    for node in tree.descendants(root) {
        let Some(element) = tree.element(node) else {
            continue;
        };
        let element_only = match dtd.content_model(element.name()) {
            Some(model) => model.is_element_only(),
            None => is_inferred_element_only(tree, node),
        };
        if element_only {
            removable.extend(tree.children(node).filter(|child| {
                tree.text_str(*child)
                    .map(|text| text.trim().is_empty())
                    .unwrap_or(false)
            }));
        }
    }
    for node in removable {
        tree.remove(node)?;
    }
    Ok(())
}

// elements plus whitespace and nothing else
fn is_inferred_element_only(tree: &Tree, node: Node) -> bool {
    let mut has_elements = false;
    for child in tree.children(node) {
        match tree.value(child) {
            Value::Element(_) => has_elements = true,
            Value::Text(text) if !text.get().trim().is_empty() => return false,
            _ => {}
        }
    }
    has_elements
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_str(xml: &str) -> Result<Tree, ParseError> {
        parse(xml, &ParseOptions::default(), &ReadContext::new())
    }

    fn root_name(tree: &Tree) -> &str {
        tree.element(tree.document_element().unwrap()).unwrap().name()
    }

    #[test]
    fn test_parse_simple() {
        let tree = parse_str("<?xml version=\"1.0\"?><doc a=\"1\">Hello</doc>").unwrap();
        let doc = tree.document_element().unwrap();
        assert_eq!(root_name(&tree), "doc");
        assert_eq!(tree.text_content(doc), "Hello");
        assert_eq!(tree.element(doc).unwrap().get_attribute("a"), Some("1"));
    }

    #[test]
    fn test_cdata_merges_with_text() {
        let tree = parse_str("<doc>a<![CDATA[<b>]]>c</doc>").unwrap();
        let doc = tree.document_element().unwrap();
        assert_eq!(tree.children(doc).count(), 1);
        assert_eq!(tree.text_content(doc), "a<b>c");
    }

    #[test]
    fn test_comments_and_pis_kept() {
        let tree = parse_str("<!--before--><doc><?target data?></doc>").unwrap();
        assert_eq!(tree.children(tree.root()).count(), 2);
        let doc = tree.document_element().unwrap();
        assert!(matches!(
            tree.value(tree.first_child(doc).unwrap()),
            Value::ProcessingInstruction(pi) if pi.target() == "target" && pi.data() == Some("data")
        ));
    }

    #[test]
    fn test_mismatched_close_tag() {
        let err = parse_str("<a><b></a></b>").unwrap_err();
        assert!(matches!(
            err,
            ParseError::InvalidCloseTag { ref expected, ref found, .. } if expected == "b" && found == "a"
        ));
    }

    #[test]
    fn test_unclosed_element() {
        assert!(matches!(
            parse_str("<a><b></b>"),
            Err(ParseError::UnclosedElement(name)) if name == "a"
        ));
    }

    #[test]
    fn test_duplicate_attribute() {
        let err = parse_str("<person name=\"a\" name=\"b\"/>").unwrap_err();
        assert_eq!(
            err.to_string(),
            "attribute \"name\" was already specified for element \"person\""
        );
    }

    #[test]
    fn test_unknown_prefix() {
        assert!(matches!(
            parse_str("<x:doc/>"),
            Err(ParseError::UnknownPrefix { prefix, .. }) if prefix == "x"
        ));
        assert!(parse_str("<x:doc xmlns:x=\"urn:x\"><x:a xml:lang=\"en\"/></x:doc>").is_ok());
    }

    #[test]
    fn test_line_endings_normalized() {
        let tree = parse_str("<doc a=\"x\r\ny\">one\r\ntwo\rthree</doc>").unwrap();
        let doc = tree.document_element().unwrap();
        assert_eq!(tree.text_content(doc), "one\ntwo\nthree");
        assert_eq!(tree.element(doc).unwrap().get_attribute("a"), Some("x y"));
    }

    #[test]
    fn test_carriage_return_reference_survives() {
        let tree = parse_str("<doc a=\"x&#13;y\">a&#13;b</doc>").unwrap();
        let doc = tree.document_element().unwrap();
        assert_eq!(tree.text_content(doc), "a\rb");
        assert_eq!(tree.element(doc).unwrap().get_attribute("a"), Some("x\ry"));
    }

    #[test]
    fn test_entity_with_markup_rejected() {
        let err = parse_str("<!DOCTYPE r [<!ENTITY e \"<b>x</b>\">]><r>&e;</r>").unwrap_err();
        assert!(matches!(err, ParseError::EntityMarkup(name) if name == "e"));
    }

    #[test]
    fn test_text_outside_root() {
        assert!(parse_str("<doc/>\n  \n").is_ok());
        assert!(parse_str("<doc/>junk").is_err());
    }

    #[test]
    fn test_no_root() {
        assert!(matches!(
            parse_str("<!-- nothing -->"),
            Err(ParseError::NoRootElement)
        ));
    }

    #[test]
    fn test_internal_entity() {
        let tree = parse_str(
            "<!DOCTYPE doc [<!ENTITY who \"world\"><!ELEMENT doc (#PCDATA)>]><doc a=\"&who;\">Hello &who;</doc>",
        )
        .unwrap();
        let doc = tree.document_element().unwrap();
        assert_eq!(tree.text_content(doc), "Hello world");
        assert_eq!(tree.element(doc).unwrap().get_attribute("a"), Some("world"));
        assert_eq!(tree.doctype().unwrap().name, "doc");
    }

    #[test]
    fn test_external_entity_resolved() {
        let context = ReadContext::with_entity_resolver(|_, system_id| {
            assert_eq!(system_id, "chapter.txt");
            Ok("Chapter one".to_string())
        });
        let tree = parse(
            "<!DOCTYPE doc [<!ENTITY chapter SYSTEM \"chapter.txt\">]><doc>&chapter;</doc>",
            &ParseOptions::default(),
            &context,
        )
        .unwrap();
        assert_eq!(tree.text_content(tree.document_element().unwrap()), "Chapter one");
    }

    #[test]
    fn test_external_dtd_without_resolver() {
        let xml = "<!DOCTYPE doc SYSTEM \"doc.dtd\"><doc/>";
        assert!(parse_str(xml).is_ok());
        let validating = ParseOptions::from_features(&[ConfigFeature::Validating]);
        assert!(matches!(
            parse(xml, &validating, &ReadContext::new()),
            Err(ParseError::ExternalDtdUnavailable(system_id)) if system_id == "doc.dtd"
        ));
    }

    #[test]
    fn test_validating_requires_doctype() {
        let validating = ParseOptions::from_features(&[ConfigFeature::Validating]);
        assert!(matches!(
            parse("<doc/>", &validating, &ReadContext::new()),
            Err(ParseError::Validation(_))
        ));
    }

    #[test]
    fn test_ignore_element_content_whitespace() {
        let options = ParseOptions::from_features(&[ConfigFeature::IgnoreElementContentWhitespace]);
        let tree = parse(
            "<doc>\n  <a> keep </a>\n  <p>mixed <b>x</b> <i>y</i></p>\n</doc>",
            &options,
            &ReadContext::new(),
        )
        .unwrap();
        let doc = tree.document_element().unwrap();
        assert_eq!(tree.children(doc).count(), 2);
        let a = tree.first_child(doc).unwrap();
        assert_eq!(tree.text_content(a), " keep ");
        let p = tree.last_child(doc).unwrap();
        assert_eq!(tree.text_content(p), "mixed x y");
    }

    #[test]
    fn test_unsupported_version() {
        assert!(matches!(
            parse_str("<?xml version=\"1.1\"?><doc/>"),
            Err(ParseError::UnsupportedVersion(_))
        ));
    }
}
