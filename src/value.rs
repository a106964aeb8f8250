use crate::name;

/// The type of a node value.
///
/// Handy when you are interested in the type of a value without needing
/// to match on it.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum ValueType {
    /// Document root that holds everything.
    Root,
    /// Element; it has a name, namespace declarations and attributes.
    Element,
    /// Text.
    Text,
    /// Processing instruction.
    ProcessingInstruction,
    /// Comment.
    Comment,
}

/// A value stored in the tree.
#[derive(Debug, Clone)]
pub enum Value {
    /// Document root that holds everything. Note that this not the same as
    /// the document element.
    Root,
    /// Element.
    Element(Element),
    /// Text. Character data and CDATA sections both end up here.
    Text(Text),
    /// Processing instruction.
    ProcessingInstruction(ProcessingInstruction),
    /// Comment.
    Comment(Comment),
}

impl Value {
    /// Returns the type of the value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Root => ValueType::Root,
            Value::Element(_) => ValueType::Element,
            Value::Text(_) => ValueType::Text,
            Value::Comment(_) => ValueType::Comment,
            Value::ProcessingInstruction(_) => ValueType::ProcessingInstruction,
        }
    }
}

/// Ordered attributes of an element.
///
/// Attribute order is the order of the source document; new attributes are
/// added at the end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<(String, String)>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an attribute value, ignoring case and prefix.
    pub fn get(&self, needle: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name::matches_local(name, needle))
            .map(|(_, value)| value.as_str())
    }

    /// Look up an attribute value by its exact qualified name.
    pub fn get_exact(&self, qname: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == qname)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.get(needle).is_some()
    }

    /// Set an attribute.
    ///
    /// If an attribute answering to `name` exists its value is replaced and
    /// it keeps its original name and position. Otherwise the attribute is
    /// added at the end.
    pub fn set<S: Into<String>>(&mut self, name: &str, value: S) {
        let value = value.into();
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|(existing, _)| name::matches_local(existing, name))
        {
            entry.1 = value;
        } else {
            self.entries.push((name.to_string(), value));
        }
    }

    /// Append an attribute without looking for an existing one.
    pub(crate) fn push(&mut self, name: String, value: String) {
        self.entries.push((name, value));
    }

    /// Remove the attribute answering to `name`. Returns the removed value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let position = self
            .entries
            .iter()
            .position(|(existing, _)| name::matches_local(existing, name))?;
        Some(self.entries.remove(position).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Namespace declarations made on an element, as `(prefix, uri)` pairs.
///
/// The default namespace has the empty prefix.
pub type Prefixes = Vec<(String, String)>;

/// XML element value.
///
/// Example: `<foo/>` or `<svg:circle r="20"/>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub(crate) name: String,
    pub(crate) prefixes: Prefixes,
    pub(crate) attributes: Attributes,
}

impl Element {
    pub(crate) fn new<S: Into<String>>(name: S) -> Self {
        Element {
            name: name.into(),
            prefixes: Prefixes::new(),
            attributes: Attributes::new(),
        }
    }

    /// The qualified name of the element, as written in the source.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The local name of the element.
    pub fn local_name(&self) -> &str {
        name::local_name(&self.name)
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    /// Get an attribute by name, ignoring case and prefix.
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name)
    }

    pub fn set_attribute<S: Into<String>>(&mut self, name: &str, value: S) {
        self.attributes.set(name, value);
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        self.attributes.remove(name)
    }

    /// Namespace declarations made on this element.
    ///
    /// This does not include declarations inherited from ancestors.
    pub fn prefixes(&self) -> &Prefixes {
        &self.prefixes
    }

    /// The namespace declared for `prefix` on this element, if any.
    pub fn get_namespace(&self, prefix: &str) -> Option<&str> {
        self.prefixes
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|(_, uri)| uri.as_str())
    }
}

/// XML text value.
///
/// Example: `Bar` in `<foo>Bar</foo>`.
#[derive(Debug, Clone)]
pub struct Text {
    pub(crate) text: String,
}

impl Text {
    pub(crate) fn new(text: String) -> Self {
        Text { text }
    }

    pub fn get(&self) -> &str {
        &self.text
    }

    pub fn set<S: Into<String>>(&mut self, text: S) {
        self.text = text.into();
    }
}

/// XML comment.
///
/// Example: `<!-- foo -->`.
#[derive(Debug, Clone)]
pub struct Comment {
    pub(crate) text: String,
}

impl Comment {
    pub(crate) fn new(text: String) -> Self {
        Comment { text }
    }

    pub fn get(&self) -> &str {
        &self.text
    }
}

/// XML processing instruction.
///
/// Example: `<?foo?>` or `<?foo bar?>`.
#[derive(Debug, Clone)]
pub struct ProcessingInstruction {
    pub(crate) target: String,
    pub(crate) data: Option<String>,
}

impl ProcessingInstruction {
    pub(crate) fn new(target: String, data: Option<String>) -> Self {
        ProcessingInstruction { target, data }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }
}
