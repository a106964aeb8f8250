//! Document type definitions.
//!
//! The tokenizer hands us the internal subset as raw text, and external
//! subsets arrive as text from the entity resolver. Both are scanned here for
//! the declarations we act on: general entities and element content models.
//! Attribute list and notation declarations are skipped.

use ahash::HashMap;

use crate::entity::EntityTable;
use crate::error::ParseError;
use crate::tree::{Node, Tree};
use crate::value::Value;

/// What an element declaration allows as content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ContentModel {
    /// `EMPTY`
    Empty,
    /// `ANY`
    Any,
    /// `(#PCDATA)` or `(#PCDATA|a|b)*`: text plus the listed elements.
    Mixed(Vec<String>),
    /// An element content expression such as `(a, (b | c)*)`. Only the
    /// element names are kept.
    Children(Vec<String>),
}

impl ContentModel {
    fn parse(model: &str) -> Result<Self, ParseError> {
        let model = model.trim();
        match model {
            "EMPTY" => return Ok(ContentModel::Empty),
            "ANY" => return Ok(ContentModel::Any),
            _ => {}
        }
        if !model.starts_with('(') {
            return Err(ParseError::Dtd(format!("invalid content model '{}'", model)));
        }
        let names: Vec<String> = model
            .split(|c: char| c.is_whitespace() || "(),|?*+".contains(c))
            .filter(|token| !token.is_empty())
            .map(|token| token.to_string())
            .collect();
        match names.split_first() {
            Some((first, rest)) if first == "#PCDATA" => Ok(ContentModel::Mixed(rest.to_vec())),
            Some(_) => Ok(ContentModel::Children(names)),
            None => Err(ParseError::Dtd(format!("empty content model '{}'", model))),
        }
    }

    /// Only elements and whitespace may appear.
    pub(crate) fn is_element_only(&self) -> bool {
        matches!(self, ContentModel::Children(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum EntityDefinition {
    Internal(String),
    External {
        public_id: Option<String>,
        system_id: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Declaration {
    Element {
        name: String,
        model: ContentModel,
    },
    Entity {
        name: String,
        definition: EntityDefinition,
    },
}

/// Scan a DTD subset for declarations.
pub(crate) fn scan(subset: &str) -> Result<Vec<Declaration>, ParseError> {
    let mut scanner = Scanner {
        text: subset,
        pos: 0,
    };
    let mut declarations = Vec::new();
    loop {
        scanner.skip_whitespace();
        if scanner.at_end() {
            break;
        }
        if scanner.eat("<!--") {
            scanner.skip_past("-->")?;
        } else if scanner.eat("<?") {
            // processing instructions and the text declaration
            scanner.skip_past("?>")?;
        } else if scanner.eat("<!ENTITY") {
            if let Some(declaration) = scanner.entity_declaration()? {
                declarations.push(declaration);
            }
        } else if scanner.eat("<!ELEMENT") {
            declarations.push(scanner.element_declaration()?);
        } else if scanner.eat("<!ATTLIST") || scanner.eat("<!NOTATION") {
            scanner.skip_declaration()?;
        } else if scanner.eat("%") {
            let name = scanner.name()?;
            scanner.expect(";")?;
            tracing::debug!(entity = name, "parameter entity reference skipped");
        } else {
            return Err(ParseError::Dtd(format!(
                "unexpected content '{}'",
                scanner.snippet()
            )));
        }
    }
    Ok(declarations)
}

struct Scanner<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn snippet(&self) -> &'a str {
        let rest = self.rest();
        let end = rest
            .char_indices()
            .nth(20)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        &rest[..end]
    }

    fn eat(&mut self, token: &str) -> bool {
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &str) -> Result<(), ParseError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(ParseError::Dtd(format!(
                "expected '{}' at '{}'",
                token,
                self.snippet()
            )))
        }
    }

    fn skip_whitespace(&mut self) -> bool {
        let rest = self.rest();
        let trimmed = rest.trim_start();
        self.pos += rest.len() - trimmed.len();
        rest.len() != trimmed.len()
    }

    fn require_whitespace(&mut self) -> Result<(), ParseError> {
        if self.skip_whitespace() {
            Ok(())
        } else {
            Err(ParseError::Dtd(format!(
                "expected whitespace at '{}'",
                self.snippet()
            )))
        }
    }

    fn skip_past(&mut self, terminator: &str) -> Result<(), ParseError> {
        match self.rest().find(terminator) {
            Some(index) => {
                self.pos += index + terminator.len();
                Ok(())
            }
            None => Err(ParseError::Dtd(format!("missing '{}'", terminator))),
        }
    }

    // up to and including the closing '>', honouring quoted literals
    fn skip_declaration(&mut self) -> Result<(), ParseError> {
        let mut quote = None;
        for (index, c) in self.rest().char_indices() {
            match (quote, c) {
                (None, '"' | '\'') => quote = Some(c),
                (Some(q), c) if q == c => quote = None,
                (None, '>') => {
                    self.pos += index + 1;
                    return Ok(());
                }
                _ => {}
            }
        }
        Err(ParseError::Dtd("unterminated declaration".to_string()))
    }

    fn name(&mut self) -> Result<&'a str, ParseError> {
        let rest = self.rest();
        let end = rest
            .find(|c: char| c.is_whitespace() || "%;>\"'()|,".contains(c))
            .unwrap_or(rest.len());
        if end == 0 {
            return Err(ParseError::Dtd(format!(
                "expected a name at '{}'",
                self.snippet()
            )));
        }
        self.pos += end;
        Ok(&rest[..end])
    }

    fn quoted(&mut self) -> Result<&'a str, ParseError> {
        let rest = self.rest();
        let quote = match rest.chars().next() {
            Some(c @ ('"' | '\'')) => c,
            _ => {
                return Err(ParseError::Dtd(format!(
                    "expected a quoted literal at '{}'",
                    self.snippet()
                )))
            }
        };
        let body = &rest[1..];
        let end = body
            .find(quote)
            .ok_or_else(|| ParseError::Dtd("unterminated literal".to_string()))?;
        self.pos += end + 2;
        Ok(&body[..end])
    }

    fn entity_declaration(&mut self) -> Result<Option<Declaration>, ParseError> {
        self.require_whitespace()?;
        let parameter = self.eat("%");
        if parameter {
            self.require_whitespace()?;
        }
        let name = self.name()?.to_string();
        self.require_whitespace()?;
        let definition = if self.eat("SYSTEM") {
            self.require_whitespace()?;
            EntityDefinition::External {
                public_id: None,
                system_id: self.quoted()?.to_string(),
            }
        } else if self.eat("PUBLIC") {
            self.require_whitespace()?;
            let public_id = self.quoted()?.to_string();
            self.require_whitespace()?;
            EntityDefinition::External {
                public_id: Some(public_id),
                system_id: self.quoted()?.to_string(),
            }
        } else {
            EntityDefinition::Internal(self.quoted()?.to_string())
        };
        self.skip_whitespace();
        let unparsed = self.eat("NDATA");
        if unparsed {
            self.require_whitespace()?;
            self.name()?;
            self.skip_whitespace();
        }
        self.expect(">")?;
        if parameter || unparsed {
            tracing::debug!(entity = name.as_str(), "entity declaration skipped");
            return Ok(None);
        }
        Ok(Some(Declaration::Entity { name, definition }))
    }

    fn element_declaration(&mut self) -> Result<Declaration, ParseError> {
        self.require_whitespace()?;
        let name = self.name()?.to_string();
        self.require_whitespace()?;
        let rest = self.rest();
        let end = rest
            .find('>')
            .ok_or_else(|| ParseError::Dtd(format!("unterminated element declaration '{}'", name)))?;
        let model = ContentModel::parse(&rest[..end])?;
        self.pos += end + 1;
        Ok(Declaration::Element { name, model })
    }
}

/// Declarations collected from the internal and external subsets.
#[derive(Debug, Default)]
pub(crate) struct Dtd {
    pub(crate) entities: EntityTable,
    elements: HashMap<String, ContentModel>,
}

impl Dtd {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Declare an element. Later declarations of the same name are ignored.
    pub(crate) fn declare_element(&mut self, name: String, model: ContentModel) {
        self.elements.entry(name).or_insert(model);
    }

    pub(crate) fn content_model(&self, name: &str) -> Option<&ContentModel> {
        self.elements.get(name)
    }

    /// Check the tree against the element declarations.
    pub(crate) fn validate(&self, tree: &Tree, doctype_name: &str) -> Result<(), ParseError> {
        let root = tree.document_element().ok_or(ParseError::NoRootElement)?;
        let root_name = element_name(tree, root);
        if root_name != doctype_name {
            return Err(ParseError::Validation(format!(
                "root element '{}' does not match document type '{}'",
                root_name, doctype_name
            )));
        }
        for node in tree.descendants(root) {
            if tree.is_element(node) {
                self.validate_element(tree, node)?;
            }
        }
        Ok(())
    }

    fn validate_element(&self, tree: &Tree, node: Node) -> Result<(), ParseError> {
        let name = element_name(tree, node);
        let model = self.content_model(name).ok_or_else(|| {
            ParseError::Validation(format!("element '{}' is not declared", name))
        })?;
        for child in tree.children(node) {
            match (model, tree.value(child)) {
                (ContentModel::Any, _) => {}
                (ContentModel::Empty, _) => {
                    return Err(ParseError::Validation(format!(
                        "element '{}' is declared EMPTY but has content",
                        name
                    )));
                }
                (ContentModel::Mixed(allowed) | ContentModel::Children(allowed), Value::Element(element)) => {
                    if !allowed.iter().any(|a| a == element.name()) {
                        return Err(ParseError::Validation(format!(
                            "element '{}' is not allowed in '{}'",
                            element.name(),
                            name
                        )));
                    }
                }
                (ContentModel::Children(_), Value::Text(text)) => {
                    if !text.get().trim().is_empty() {
                        return Err(ParseError::Validation(format!(
                            "text is not allowed in element content of '{}'",
                            name
                        )));
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}

fn element_name(tree: &Tree, node: Node) -> &str {
    tree.element(node).map(|element| element.name()).unwrap_or("")
}
