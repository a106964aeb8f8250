//! Path-aware cursors into a parsed document.
//!
//! A [`Cursor`] is either present, pointing at an element, or empty, the
//! result of an optional navigation that found nothing. Every operation is
//! defined for both; the `match` in each method is the full decision table
//! for what an empty cursor does.

use std::any::type_name;
use std::cell::{Ref, RefCell};
use std::fmt;
use std::io;
use std::rc::Rc;

use encoding_rs::Encoding;

use crate::attribute::Attribute;
use crate::error::{Error, Needle, SerializeError, TreeError};
use crate::extract::{Extractor, ExtractorRegistry};
use crate::name;
use crate::output::{self, Feature, SerializeOptions};
use crate::tree::{Node, Tree};

const SEPARATOR: &str = " >> ";
const UNKNOWN: &str = "???";

/// State shared by all cursors into one document.
pub(crate) struct DocumentState {
    pub(crate) tree: RefCell<Tree>,
    pub(crate) extractors: Rc<RefCell<ExtractorRegistry>>,
    pub(crate) dump_options: SerializeOptions,
}

/// One hop in a cursor's path: an element name plus its rank among
/// same-named siblings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Segment {
    name: String,
    index: usize,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.index > 0 {
            write!(f, "{}[{}]", self.name, self.index)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

fn render_path(ancestors: &[Segment], tail: &dyn fmt::Display) -> String {
    let mut path = String::new();
    for ancestor in ancestors {
        path.push_str(&ancestor.to_string());
        path.push_str(SEPARATOR);
    }
    path.push_str(&tail.to_string());
    path
}

/// A cursor pointing at an element.
#[derive(Clone)]
pub struct NodeCursor {
    document: Rc<DocumentState>,
    node: Node,
    ancestors: Vec<Segment>,
    segment: Segment,
}

/// What is left of a cursor after an optional navigation missed.
#[derive(Debug, Clone, Default)]
pub struct EmptyCursor {
    ancestors: Vec<Segment>,
}

/// A positioned view into a document.
///
/// Cursors are cheap to clone and share the document they point into, so a
/// mutation through one cursor is visible through all others.
#[derive(Clone)]
pub enum Cursor {
    Present(NodeCursor),
    Empty(EmptyCursor),
}

impl NodeCursor {
    pub(crate) fn root(document: Rc<DocumentState>) -> Option<Self> {
        let (node, name) = {
            let tree = document.tree.borrow();
            let node = tree.document_element()?;
            let name = tree.element(node)?.name().to_string();
            (node, name)
        };
        Some(NodeCursor {
            document,
            node,
            ancestors: Vec::new(),
            segment: Segment { name, index: 0 },
        })
    }

    pub(crate) fn path(&self) -> String {
        render_path(&self.ancestors, &self.segment)
    }

    fn descend(&self) -> Vec<Segment> {
        let mut ancestors = self.ancestors.clone();
        ancestors.push(self.segment.clone());
        ancestors
    }

    fn child(&self, node: Node, name: String, index: usize) -> NodeCursor {
        NodeCursor {
            document: self.document.clone(),
            node,
            ancestors: self.descend(),
            segment: Segment { name, index },
        }
    }

    pub(crate) fn tree_error(&self, error: TreeError) -> Error {
        match error {
            TreeError::InvalidOperation(message) => Error::InvalidOperation {
                path: self.path(),
                message: message.to_string(),
            },
            source => Error::Tree {
                path: self.path(),
                source,
            },
        }
    }

    fn tree(&self) -> Result<Ref<'_, Tree>, Error> {
        let tree = self.document.tree.borrow();
        tree.check(self.node).map_err(|e| self.tree_error(e))?;
        Ok(tree)
    }

    /// Run `f` against the tree, failing if this node has been removed.
    pub(crate) fn read<T>(&self, f: impl FnOnce(&Tree, Node) -> T) -> Result<T, Error> {
        let tree = self.tree()?;
        Ok(f(&tree, self.node))
    }

    /// Run `f` against the mutable tree, failing if this node has been
    /// removed.
    pub(crate) fn write<T>(
        &self,
        f: impl FnOnce(&mut Tree, Node) -> Result<T, TreeError>,
    ) -> Result<T, Error> {
        let result = {
            let mut tree = self.document.tree.borrow_mut();
            match tree.check(self.node) {
                Ok(node) => f(&mut tree, node),
                Err(e) => Err(e),
            }
        };
        result.map_err(|e| self.tree_error(e))
    }

    // element children answering to `needle`, in document order
    fn matching(&self, needle: &str) -> Result<Vec<(Node, String)>, Error> {
        self.read(|tree, node| {
            tree.element_children(node)
                .filter_map(|child| {
                    let element = tree.element(child)?;
                    name::name_matches(element.name(), needle)
                        .then(|| (child, element.name().to_string()))
                })
                .collect()
        })
    }

    // cursors for all element children, each ranked among its namesakes
    fn children(&self) -> Result<Vec<NodeCursor>, Error> {
        let children = self.read(|tree, node| {
            let mut seen: Vec<String> = Vec::new();
            tree.element_children(node)
                .filter_map(|child| {
                    let element_name = tree.element(child)?.name().to_string();
                    let index = seen
                        .iter()
                        .filter(|n| name::eq_ignore_case(n, &element_name))
                        .count();
                    seen.push(element_name.clone());
                    Some((child, element_name, index))
                })
                .collect::<Vec<_>>()
        })?;
        Ok(children
            .into_iter()
            .map(|(node, name, index)| self.child(node, name, index))
            .collect())
    }

    fn cursor_for(&self, tree: &Tree, node: Node) -> NodeCursor {
        let element_name = tree
            .element(node)
            .map(|element| element.name().to_string())
            .unwrap_or_default();
        let mut index = 0;
        let mut sibling = tree.previous_sibling(node);
        while let Some(current) = sibling {
            if let Some(element) = tree.element(current) {
                if name::eq_ignore_case(element.name(), &element_name) {
                    index += 1;
                }
            }
            sibling = tree.previous_sibling(current);
        }
        self.child(node, element_name, index)
    }

    fn candidates(&self) -> Vec<String> {
        let mut candidates: Vec<String> = self
            .read(|tree, node| {
                tree.element_children(node)
                    .filter_map(|child| tree.element(child))
                    .map(|element| element.local_name().to_string())
                    .collect()
            })
            .unwrap_or_default();
        candidates.sort();
        candidates.dedup();
        candidates
    }

    fn missing(&self, needle: Needle) -> Error {
        Error::MissingNode {
            path: self.path(),
            needle,
            candidates: self.candidates(),
        }
    }

    fn find_single(&self, needle: &str) -> Result<Option<NodeCursor>, Error> {
        let mut found = self.matching(needle)?;
        if found.len() > 1 {
            return Err(Error::Ambiguous {
                path: self.path(),
                needle: Needle::Name(needle.to_string()),
            });
        }
        Ok(found
            .pop()
            .map(|(node, element_name)| self.child(node, element_name, 0)))
    }

    fn to(&self, needle: &str) -> Result<NodeCursor, Error> {
        self.find_single(needle)?
            .ok_or_else(|| self.missing(Needle::Name(needle.to_string())))
    }

    fn to_nth(&self, position: usize, needle: &str) -> Result<NodeCursor, Error> {
        let found = self.matching(needle)?;
        match found.into_iter().nth(position) {
            Some((node, element_name)) => Ok(self.child(node, element_name, position)),
            None => Err(self.missing(Needle::Position(position, needle.to_string()))),
        }
    }

    fn to_optional(&self, needle: &str) -> Result<Cursor, Error> {
        match self.find_single(needle)? {
            Some(found) => Ok(Cursor::Present(found)),
            None => {
                tracing::trace!(path = %self.path(), needle, "optional node absent");
                Ok(Cursor::empty(self.descend()))
            }
        }
    }

    fn extractor<R: 'static>(&self) -> Result<Extractor<R>, Error> {
        let extractor = self.document.extractors.borrow().resolve::<R>();
        extractor.ok_or_else(|| Error::NoExtractor {
            path: self.path(),
            type_name: type_name::<R>(),
        })
    }

    fn iterate<F>(&self, needle: &str, mut visitor: F) -> Result<(), Error>
    where
        F: FnMut(&Cursor) -> Result<(), Error>,
    {
        let found = self.matching(needle)?;
        for (index, (node, element_name)) in found.into_iter().enumerate() {
            let cursor = Cursor::Present(self.child(node, element_name, index));
            visitor(&cursor)?;
        }
        Ok(())
    }

    fn append(&self, element_name: &str) -> Result<NodeCursor, Error> {
        let node = self.write(|tree, node| {
            let child = tree.new_element(element_name);
            tree.append(node, child)?;
            Ok(child)
        })?;
        self.read(|tree, _| self.cursor_for(tree, node))
    }

    fn append_after<P>(&self, element_name: &str, predicate: P) -> Result<NodeCursor, Error>
    where
        P: Fn(&Cursor) -> bool,
    {
        let reference = self
            .children()?
            .into_iter()
            .map(Cursor::Present)
            .find(|child| predicate(child));
        let node = self.write(|tree, node| {
            let new_node = tree.new_element(element_name);
            match &reference {
                Some(Cursor::Present(reference)) => tree.insert_after(reference.node, new_node)?,
                _ => tree.append(node, new_node)?,
            }
            Ok(new_node)
        })?;
        self.read(|tree, _| self.cursor_for(tree, node))
    }

    fn insert_collection<T, I, F>(&self, prototype: &str, items: I, mut inserter: F) -> Result<(), Error>
    where
        I: IntoIterator<Item = T>,
        F: FnMut(&Cursor, T) -> Result<(), Error>,
    {
        let mut found = self.matching(prototype)?;
        if found.len() > 1 {
            return Err(Error::Ambiguous {
                path: self.path(),
                needle: Needle::Prototype(prototype.to_string()),
            });
        }
        let Some((prototype_node, prototype_name)) = found.pop() else {
            return Err(self.missing(Needle::Prototype(prototype.to_string())));
        };

        let template = self.write(|tree, _| tree.clone_subtree(prototype_node))?;
        let mut count = 0;
        let inserted: Result<(), Error> = items.into_iter().try_for_each(|item| {
            let copy = self.write(|tree, _| tree.clone_subtree(template))?;
            let cursor = Cursor::Present(self.child(copy, prototype_name.clone(), count));
            inserter(&cursor, item)?;
            self.write(|tree, _| tree.insert_before(prototype_node, copy))?;
            count += 1;
            Ok(())
        });
        self.write(|tree, _| tree.remove(template))?;
        inserted?;
        self.write(|tree, _| tree.remove(prototype_node))?;
        tracing::debug!(
            path = %self.path(),
            prototype,
            count,
            "inserted collection"
        );
        Ok(())
    }

    fn serialize(&self, options: &SerializeOptions) -> Result<Vec<u8>, Error> {
        let tree = self.document.tree.borrow();
        output::serialize(&tree, self.node, options).map_err(|source| self.serialize_error(source))
    }

    fn serialize_to<W: io::Write>(&self, w: &mut W, options: &SerializeOptions) -> Result<(), Error> {
        let tree = self.document.tree.borrow();
        output::serialize_to(&tree, self.node, options, w).map_err(|source| self.serialize_error(source))
    }

    fn serialize_error(&self, source: SerializeError) -> Error {
        Error::Serialize {
            path: self.path(),
            source,
        }
    }
}

impl EmptyCursor {
    fn path(&self) -> String {
        render_path(&self.ancestors, &UNKNOWN)
    }

    fn invalid(&self, message: &str) -> Error {
        Error::InvalidOperation {
            path: self.path(),
            message: message.to_string(),
        }
    }
}

impl Cursor {
    pub(crate) fn empty(ancestors: Vec<Segment>) -> Self {
        Cursor::Empty(EmptyCursor { ancestors })
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Cursor::Present(_))
    }

    /// True for the cursor optional navigation gives when it finds nothing.
    pub fn is_empty(&self) -> bool {
        matches!(self, Cursor::Empty(_))
    }

    /// The single child element named `name`.
    ///
    /// Names match case-insensitively, in qualified or local form. On an
    /// empty cursor this is a no-op.
    pub fn to(&self, name: &str) -> Result<Cursor, Error> {
        match self {
            Cursor::Present(cursor) => cursor.to(name).map(Cursor::Present),
            Cursor::Empty(_) => Ok(self.clone()),
        }
    }

    /// Chained [`Cursor::to`], failing at the first hop that fails.
    pub fn to_path(&self, names: &[&str]) -> Result<Cursor, Error> {
        names.iter().try_fold(self.clone(), |cursor, name| cursor.to(name))
    }

    /// The child at zero-based `position` among the children named `name`.
    pub fn to_nth(&self, position: usize, name: &str) -> Result<Cursor, Error> {
        match self {
            Cursor::Present(cursor) => cursor.to_nth(position, name).map(Cursor::Present),
            Cursor::Empty(_) => Ok(self.clone()),
        }
    }

    /// Like [`Cursor::to`], but a missing child gives an empty cursor
    /// instead of an error. More than one match is still an error.
    pub fn to_optional(&self, name: &str) -> Result<Cursor, Error> {
        match self {
            Cursor::Present(cursor) => cursor.to_optional(name),
            Cursor::Empty(_) => Ok(self.clone()),
        }
    }

    /// Follow `names` one hop at a time with [`Cursor::to_optional`].
    ///
    /// Once a hop misses, the remaining names are not looked up and the
    /// result is an empty cursor.
    pub fn to_optional_path(&self, names: &[&str]) -> Result<Cursor, Error> {
        names
            .iter()
            .try_fold(self.clone(), |cursor, name| cursor.to_optional(name))
    }

    /// Number of child elements named `name`. Never fails.
    pub fn count(&self, name: &str) -> usize {
        match self {
            Cursor::Present(cursor) => cursor.matching(name).map(|found| found.len()).unwrap_or(0),
            Cursor::Empty(_) => 0,
        }
    }

    /// Is there at least one child element named `name`?
    pub fn has_child_node(&self, name: &str) -> bool {
        self.count(name) > 0
    }

    /// Does the element carry attribute `attribute`? False on an empty cursor.
    pub fn has_attr(&self, attribute: &str) -> bool {
        match self {
            Cursor::Present(cursor) => cursor
                .read(|tree, node| {
                    tree.element(node)
                        .map(|element| element.attributes().contains(attribute))
                        .unwrap_or(false)
                })
                .unwrap_or(false),
            Cursor::Empty(_) => false,
        }
    }

    /// The single child element accepted by `predicate`.
    pub fn require<P>(&self, predicate: P) -> Result<Cursor, Error>
    where
        P: Fn(&Cursor) -> bool,
    {
        match self {
            Cursor::Present(cursor) => {
                let mut accepted = cursor
                    .children()?
                    .into_iter()
                    .map(Cursor::Present)
                    .filter(|child| predicate(child))
                    .collect::<Vec<_>>();
                match accepted.len() {
                    0 => Err(cursor.missing(Needle::Predicate)),
                    1 => Ok(accepted.remove(0)),
                    _ => Err(Error::Ambiguous {
                        path: cursor.path(),
                        needle: Needle::Predicate,
                    }),
                }
            }
            Cursor::Empty(empty) => Err(empty.invalid("Can't require a node from an empty cursor")),
        }
    }

    /// Qualified name of the element.
    pub fn name(&self) -> Option<String> {
        match self {
            Cursor::Present(cursor) => Some(cursor.segment.name.clone()),
            Cursor::Empty(_) => None,
        }
    }

    /// The path of this cursor, e.g. `headers >> header[1] >> k`.
    pub fn describe_path(&self) -> String {
        match self {
            Cursor::Present(cursor) => cursor.path(),
            Cursor::Empty(empty) => empty.path(),
        }
    }

    /// Text content of the element and its descendants.
    pub fn text(&self) -> Option<String> {
        match self {
            Cursor::Present(cursor) => cursor.read(|tree, node| tree.text_content(node)).ok(),
            Cursor::Empty(_) => None,
        }
    }

    /// Run `extractor` on this cursor.
    ///
    /// An empty cursor gives `None` without calling it. Use
    /// [`Cursor::extract_as`] to go through the registered extractors.
    pub fn extract<R, F>(&self, extractor: F) -> Result<Option<R>, Error>
    where
        F: FnOnce(&Cursor) -> Result<R, Error>,
    {
        match self {
            Cursor::Present(_) => extractor(self).map(Some),
            Cursor::Empty(_) => Ok(None),
        }
    }

    /// Extract through the extractor registered for `R`.
    pub fn extract_as<R: 'static>(&self) -> Result<Option<R>, Error> {
        match self {
            Cursor::Present(cursor) => {
                let extractor = cursor.extractor::<R>()?;
                extractor(self).map(Some)
            }
            Cursor::Empty(_) => Ok(None),
        }
    }

    /// Extract every child named `name`, in document order.
    pub fn extract_collection<R, F>(&self, name: &str, mut extractor: F) -> Result<Vec<R>, Error>
    where
        F: FnMut(&Cursor) -> Result<R, Error>,
    {
        let mut result = Vec::new();
        self.iterate_collection(name, |cursor| {
            result.push(extractor(cursor)?);
            Ok(())
        })?;
        Ok(result)
    }

    /// Extract every child named `name` through the extractor registered
    /// for `R`, in document order.
    pub fn extract_collection_as<R: 'static>(&self, name: &str) -> Result<Vec<R>, Error> {
        match self {
            Cursor::Present(cursor) => {
                let extractor = cursor.extractor::<R>()?;
                self.extract_collection(name, |child| extractor(child))
            }
            Cursor::Empty(_) => Ok(Vec::new()),
        }
    }

    /// Visit every child named `name` with a cursor of its own.
    pub fn iterate_collection<F>(&self, name: &str, visitor: F) -> Result<(), Error>
    where
        F: FnMut(&Cursor) -> Result<(), Error>,
    {
        match self {
            Cursor::Present(cursor) => cursor.iterate(name, visitor),
            Cursor::Empty(_) => Ok(()),
        }
    }

    /// Replace the content of the element with `text`.
    pub fn set_text(&self, text: &str) -> Result<&Self, Error> {
        match self {
            Cursor::Present(cursor) => {
                cursor.write(|tree, node| tree.set_text_content(node, text))?;
                Ok(self)
            }
            Cursor::Empty(_) => Ok(self),
        }
    }

    /// The attribute answering to `name`, which must exist.
    pub fn attr(&self, name: &str) -> Result<Attribute, Error> {
        match self {
            Cursor::Present(cursor) => match self.optional_attr(name)? {
                Attribute::Null => Err(Error::MissingAttribute {
                    path: cursor.path(),
                    name: name.to_string(),
                }),
                attribute => Ok(attribute),
            },
            Cursor::Empty(_) => Ok(Attribute::Null),
        }
    }

    /// The attribute answering to `name`, or the null attribute.
    pub fn optional_attr(&self, name: &str) -> Result<Attribute, Error> {
        match self {
            Cursor::Present(cursor) => {
                let found = cursor.read(|tree, node| {
                    tree.element(node).and_then(|element| {
                        element
                            .attributes()
                            .iter()
                            .find(|(existing, _)| name::matches_local(existing, name))
                            .map(|(existing, _)| existing.to_string())
                    })
                })?;
                Ok(match found {
                    Some(name) => Attribute::Present {
                        cursor: cursor.clone(),
                        name,
                    },
                    None => Attribute::Null,
                })
            }
            Cursor::Empty(_) => Ok(Attribute::Null),
        }
    }

    /// Set an attribute, replacing the value of an existing one with the
    /// same local name.
    pub fn set_attr(&self, name: &str, value: &str) -> Result<&Self, Error> {
        match self {
            Cursor::Present(cursor) => {
                cursor.write(|tree, node| {
                    let element = tree
                        .element_mut(node)
                        .ok_or(TreeError::InvalidOperation("Not an element"))?;
                    element.set_attribute(name, value);
                    Ok(())
                })?;
                Ok(self)
            }
            Cursor::Empty(empty) => Err(empty.invalid("Can't set attribute on an empty cursor")),
        }
    }

    /// Remove attribute `name` if present. A no-op on an empty cursor.
    pub fn remove_attr(&self, name: &str) -> Result<&Self, Error> {
        match self {
            Cursor::Present(cursor) => {
                cursor.write(|tree, node| {
                    if let Some(element) = tree.element_mut(node) {
                        element.remove_attribute(name);
                    }
                    Ok(())
                })?;
                Ok(self)
            }
            Cursor::Empty(_) => Ok(self),
        }
    }

    /// Append a new, empty child element.
    pub fn append(&self, name: &str) -> Result<Cursor, Error> {
        match self {
            Cursor::Present(cursor) => cursor.append(name).map(Cursor::Present),
            Cursor::Empty(empty) => Err(empty.invalid("Can't append to an empty cursor")),
        }
    }

    /// Insert a new child element after the first child accepted by
    /// `predicate`, or at the end if none is.
    pub fn append_after<P>(&self, name: &str, predicate: P) -> Result<Cursor, Error>
    where
        P: Fn(&Cursor) -> bool,
    {
        match self {
            Cursor::Present(cursor) => cursor.append_after(name, predicate).map(Cursor::Present),
            Cursor::Empty(empty) => Err(empty.invalid("Can't append to an empty cursor")),
        }
    }

    /// Remove the element from the document.
    ///
    /// Other cursors pointing into the removed subtree become stale.
    pub fn remove(&self) -> Result<(), Error> {
        match self {
            Cursor::Present(cursor) => cursor.write(|tree, node| tree.remove(node)),
            Cursor::Empty(_) => Ok(()),
        }
    }

    /// Remove every child element accepted by `predicate`. Returns how many
    /// were removed.
    pub fn remove_children<P>(&self, predicate: P) -> Result<usize, Error>
    where
        P: Fn(&Cursor) -> bool,
    {
        match self {
            Cursor::Present(cursor) => {
                let doomed: Vec<Cursor> = cursor
                    .children()?
                    .into_iter()
                    .map(Cursor::Present)
                    .filter(|child| predicate(child))
                    .collect();
                for child in &doomed {
                    child.remove()?;
                }
                Ok(doomed.len())
            }
            Cursor::Empty(_) => Ok(0),
        }
    }

    /// Replace the single child named `prototype` with one copy of it per
    /// item, each populated by `inserter`.
    ///
    /// The copies take the prototype's place in document order. The
    /// prototype itself is removed, also when there are no items. An empty
    /// cursor has no prototype to copy, so this fails on one.
    pub fn insert_collection<T, I, F>(&self, prototype: &str, items: I, inserter: F) -> Result<(), Error>
    where
        I: IntoIterator<Item = T>,
        F: FnMut(&Cursor, T) -> Result<(), Error>,
    {
        match self {
            Cursor::Present(cursor) => cursor.insert_collection(prototype, items, inserter),
            Cursor::Empty(empty) => Err(empty.invalid("Can't insert collection in empty cursor")),
        }
    }

    /// Hand this cursor and `payload` to `inserter`.
    pub fn update<T, F>(&self, payload: T, inserter: F) -> Result<(), Error>
    where
        F: FnOnce(&Cursor, T) -> Result<(), Error>,
    {
        match self {
            Cursor::Present(_) => inserter(self, payload),
            Cursor::Empty(_) => Ok(()),
        }
    }

    /// Serialize the element and its descendants.
    pub fn serialize(&self, options: &SerializeOptions) -> Result<Vec<u8>, Error> {
        match self {
            Cursor::Present(cursor) => cursor.serialize(options),
            Cursor::Empty(empty) => Err(empty.invalid("Can't dump empty cursor")),
        }
    }

    /// Like [`Cursor::serialize`], but writes the bytes to `w`.
    pub fn serialize_to<W: io::Write>(&self, w: &mut W, options: &SerializeOptions) -> Result<(), Error> {
        match self {
            Cursor::Present(cursor) => cursor.serialize_to(w, options),
            Cursor::Empty(empty) => Err(empty.invalid("Can't dump empty cursor")),
        }
    }

    /// Serialize with the dump options the engine was configured with.
    pub fn dump_xml(&self) -> Result<String, Error> {
        match self {
            Cursor::Present(cursor) => {
                let options = cursor.document.dump_options;
                self.dump(&options)
            }
            Cursor::Empty(empty) => Err(empty.invalid("Can't dump empty cursor")),
        }
    }

    /// Serialize with an explicit encoding and set of features.
    pub fn dump_xml_with(&self, encoding: &'static Encoding, features: &[Feature]) -> Result<String, Error> {
        self.dump(&SerializeOptions::from_features(features).with_encoding(encoding))
    }

    fn dump(&self, options: &SerializeOptions) -> Result<String, Error> {
        let bytes = self.serialize(options)?;
        let (text, _) = options
            .encoding
            .output_encoding()
            .decode_without_bom_handling(&bytes);
        Ok(text.into_owned())
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe_path())
    }
}

impl fmt::Debug for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cursor::Present(_) => f.debug_tuple("Present").field(&self.describe_path()).finish(),
            Cursor::Empty(_) => f.debug_tuple("Empty").field(&self.describe_path()).finish(),
        }
    }
}

impl fmt::Debug for NodeCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeCursor")
            .field("path", &self.path())
            .finish()
    }
}
