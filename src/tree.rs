use indextree::{Arena, NodeEdge as IndexTreeNodeEdge, NodeId};

use crate::error::TreeError;
use crate::value::{Comment, Element, ProcessingInstruction, Text, Value, ValueType};

pub(crate) type XmlArena = Arena<Value>;

/// A node in the tree.
///
/// This is a lightweight handle and can be copied. It stays valid until the
/// node is removed; after that every access through it fails with
/// [`TreeError::Removed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Node(NodeId);

impl Node {
    #[inline]
    pub(crate) fn new(node_id: NodeId) -> Self {
        Node(node_id)
    }

    #[inline]
    pub(crate) fn get(&self) -> NodeId {
        self.0
    }
}

/// Node edges, as produced by [`Tree::traverse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeEdge {
    /// The start edge of a node. For an element this is the start tag.
    Start(Node),
    /// The end edge of a node. For an element this is the end tag. For
    /// other values it comes immediately after the start edge.
    End(Node),
}

/// The document type declaration of a parsed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Doctype {
    pub name: String,
    pub public_id: Option<String>,
    pub system_id: Option<String>,
}

/// An XML document held in an arena.
///
/// The tree maintains an XML structure: there is a single root node, which
/// holds exactly one document element plus any comments and processing
/// instructions. Text nodes never appear next to each other.
#[derive(Debug)]
pub struct Tree {
    arena: XmlArena,
    root: Node,
    doctype: Option<Doctype>,
}

impl Tree {
    pub fn new() -> Self {
        let mut arena = XmlArena::new();
        let root = Node::new(arena.new_node(Value::Root));
        Tree {
            arena,
            root,
            doctype: None,
        }
    }

    /// The document root. This is not the document element.
    pub fn root(&self) -> Node {
        self.root
    }

    /// The single element directly under the root, if there is one yet.
    pub fn document_element(&self) -> Option<Node> {
        self.children(self.root)
            .find(|child| self.value_type(*child) == ValueType::Element)
    }

    pub fn doctype(&self) -> Option<&Doctype> {
        self.doctype.as_ref()
    }

    pub(crate) fn set_doctype(&mut self, doctype: Doctype) {
        self.doctype = Some(doctype);
    }

    /// Check whether a node has been removed.
    pub fn is_removed(&self, node: Node) -> bool {
        node.get().is_removed(&self.arena)
    }

    /// Fail with [`TreeError::Removed`] if the node is gone.
    pub fn check(&self, node: Node) -> Result<Node, TreeError> {
        if self.is_removed(node) {
            Err(TreeError::Removed)
        } else {
            Ok(node)
        }
    }

    #[inline]
    pub fn value(&self, node: Node) -> &Value {
        self.arena[node.get()].get()
    }

    #[inline]
    pub fn value_mut(&mut self, node: Node) -> &mut Value {
        self.arena[node.get()].get_mut()
    }

    pub fn value_type(&self, node: Node) -> ValueType {
        self.value(node).value_type()
    }

    pub fn is_element(&self, node: Node) -> bool {
        self.value_type(node) == ValueType::Element
    }

    pub fn is_text(&self, node: Node) -> bool {
        self.value_type(node) == ValueType::Text
    }

    /// If this node's value is an element, return a reference to it.
    pub fn element(&self, node: Node) -> Option<&Element> {
        if let Value::Element(element) = self.value(node) {
            Some(element)
        } else {
            None
        }
    }

    /// If this node's value is an element, return a mutable reference to it.
    pub fn element_mut(&mut self, node: Node) -> Option<&mut Element> {
        if let Value::Element(element) = self.value_mut(node) {
            Some(element)
        } else {
            None
        }
    }

    /// If this node's value is text, return the string.
    pub fn text_str(&self, node: Node) -> Option<&str> {
        if let Value::Text(text) = self.value(node) {
            Some(text.get())
        } else {
            None
        }
    }

    pub fn parent(&self, node: Node) -> Option<Node> {
        self.arena[node.get()].parent().map(Node::new)
    }

    pub fn first_child(&self, node: Node) -> Option<Node> {
        self.arena[node.get()].first_child().map(Node::new)
    }

    pub fn last_child(&self, node: Node) -> Option<Node> {
        self.arena[node.get()].last_child().map(Node::new)
    }

    pub fn next_sibling(&self, node: Node) -> Option<Node> {
        self.arena[node.get()].next_sibling().map(Node::new)
    }

    pub fn previous_sibling(&self, node: Node) -> Option<Node> {
        self.arena[node.get()].previous_sibling().map(Node::new)
    }

    pub fn children(&self, node: Node) -> impl Iterator<Item = Node> + '_ {
        node.get().children(&self.arena).map(Node::new)
    }

    /// Children that are elements, in document order.
    pub fn element_children(&self, node: Node) -> impl Iterator<Item = Node> + '_ {
        self.children(node).filter(move |child| self.is_element(*child))
    }

    /// Ancestors of a node, starting with its parent.
    pub fn ancestors(&self, node: Node) -> impl Iterator<Item = Node> + '_ {
        node.get().ancestors(&self.arena).skip(1).map(Node::new)
    }

    /// Traverse a node and its descendants as start and end edges.
    pub fn traverse(&self, node: Node) -> impl Iterator<Item = NodeEdge> + '_ {
        node.get().traverse(&self.arena).map(|edge| match edge {
            IndexTreeNodeEdge::Start(node_id) => NodeEdge::Start(Node::new(node_id)),
            IndexTreeNodeEdge::End(node_id) => NodeEdge::End(Node::new(node_id)),
        })
    }

    /// A node and all its descendants in document order.
    pub fn descendants(&self, node: Node) -> impl Iterator<Item = Node> + '_ {
        node.get().descendants(&self.arena).map(Node::new)
    }

    /// Concatenated text of all descendant text nodes.
    ///
    /// Comments and processing instructions do not contribute.
    pub fn text_content(&self, node: Node) -> String {
        if let Some(text) = self.text_str(node) {
            return text.to_string();
        }
        self.descendants(node)
            .filter_map(|descendant| self.text_str(descendant))
            .collect()
    }

    /// All namespace declarations in scope for a node, innermost first
    /// winning, as `(prefix, uri)` pairs.
    pub fn namespaces_in_scope(&self, node: Node) -> Vec<(String, String)> {
        let mut in_scope: Vec<(String, String)> = Vec::new();
        let chain = std::iter::once(node).chain(self.ancestors(node));
        for current in chain {
            if let Some(element) = self.element(current) {
                for (prefix, uri) in element.prefixes() {
                    if !in_scope.iter().any(|(p, _)| p == prefix) {
                        in_scope.push((prefix.clone(), uri.clone()));
                    }
                }
            }
        }
        in_scope
    }
}

/// Creation of new, unattached nodes.
impl Tree {
    pub(crate) fn new_node(&mut self, value: Value) -> Node {
        Node::new(self.arena.new_node(value))
    }

    pub fn new_element<S: Into<String>>(&mut self, name: S) -> Node {
        self.new_node(Value::Element(Element::new(name)))
    }

    pub fn new_text(&mut self, text: &str) -> Node {
        self.new_node(Value::Text(Text::new(text.to_string())))
    }

    pub fn new_comment(&mut self, comment: &str) -> Node {
        self.new_node(Value::Comment(Comment::new(comment.to_string())))
    }

    pub fn new_processing_instruction(&mut self, target: &str, data: Option<&str>) -> Node {
        self.new_node(Value::ProcessingInstruction(ProcessingInstruction::new(
            target.to_string(),
            data.map(|s| s.to_string()),
        )))
    }

    /// Deep copy of a node and its descendants.
    ///
    /// The copy is not attached anywhere.
    pub fn clone_subtree(&mut self, node: Node) -> Result<Node, TreeError> {
        self.check(node)?;
        let copy = self.new_node(self.value(node).clone());
        let children: Vec<Node> = self.children(node).collect();
        for child in children {
            let child_copy = self.clone_subtree(child)?;
            copy.get().checked_append(child_copy.get(), &mut self.arena)?;
        }
        Ok(copy)
    }
}

/// Manipulation of the tree structure.
///
/// Adding a text node next to another text node merges the two, and so
/// does removing the node between two text nodes.
impl Tree {
    /// Append a child to the end of the children of the given parent.
    pub fn append(&mut self, parent: Node, child: Node) -> Result<(), TreeError> {
        self.add_structure_check(Some(parent), child)?;
        if self.add_consolidate_text_nodes(child, self.last_child(parent), None) {
            return Ok(());
        }
        parent.get().checked_append(child.get(), &mut self.arena)?;
        Ok(())
    }

    /// Insert a new sibling before a reference node.
    pub fn insert_before(&mut self, reference_node: Node, new_sibling: Node) -> Result<(), TreeError> {
        self.add_structure_check(self.parent(reference_node), new_sibling)?;
        if self.add_consolidate_text_nodes(
            new_sibling,
            self.previous_sibling(reference_node),
            Some(reference_node),
        ) {
            return Ok(());
        }
        reference_node
            .get()
            .checked_insert_before(new_sibling.get(), &mut self.arena)?;
        Ok(())
    }

    /// Insert a new sibling after a reference node.
    pub fn insert_after(&mut self, reference_node: Node, new_sibling: Node) -> Result<(), TreeError> {
        self.add_structure_check(self.parent(reference_node), new_sibling)?;
        if self.add_consolidate_text_nodes(
            new_sibling,
            Some(reference_node),
            self.next_sibling(reference_node),
        ) {
            return Ok(());
        }
        reference_node
            .get()
            .checked_insert_after(new_sibling.get(), &mut self.arena)?;
        Ok(())
    }

    /// Remove a node and its descendants from the tree.
    ///
    /// Handles to removed nodes become stale.
    pub fn remove(&mut self, node: Node) -> Result<(), TreeError> {
        self.check(node)?;
        self.remove_structure_check(node)?;
        let prev_node = self.previous_sibling(node);
        let next_node = self.next_sibling(node);
        node.get().remove_subtree(&mut self.arena);
        self.remove_consolidate_text_nodes(prev_node, next_node);
        Ok(())
    }

    /// Replace all children of a node with a single text node.
    ///
    /// An empty string leaves the node without children.
    pub fn set_text_content(&mut self, node: Node, text: &str) -> Result<(), TreeError> {
        self.check(node)?;
        if let Value::Text(existing) = self.value_mut(node) {
            existing.set(text);
            return Ok(());
        }
        let children: Vec<Node> = self.children(node).collect();
        for child in children {
            child.get().remove_subtree(&mut self.arena);
        }
        if !text.is_empty() {
            let text_node = self.new_text(text);
            node.get().checked_append(text_node.get(), &mut self.arena)?;
        }
        Ok(())
    }

    fn add_structure_check(&self, parent: Option<Node>, child: Node) -> Result<(), TreeError> {
        let parent = parent.ok_or(TreeError::InvalidOperation(
            "Cannot create siblings for document root",
        ))?;
        self.check(parent)?;
        self.check(child)?;
        if !matches!(
            self.value_type(parent),
            ValueType::Element | ValueType::Root
        ) {
            return Err(TreeError::InvalidOperation(
                "Cannot add children to non-element and non-root node",
            ));
        }
        match self.value_type(child) {
            ValueType::Root => {
                return Err(TreeError::InvalidOperation("Cannot move document root"));
            }
            ValueType::Element => {
                if self.value_type(parent) == ValueType::Root && self.document_element().is_some()
                {
                    return Err(TreeError::InvalidOperation(
                        "Cannot add extra element under document root",
                    ));
                }
            }
            ValueType::Text => {
                if self.value_type(parent) == ValueType::Root {
                    return Err(TreeError::InvalidOperation(
                        "Cannot add text under document root",
                    ));
                }
            }
            ValueType::ProcessingInstruction | ValueType::Comment => {}
        }
        Ok(())
    }

    fn remove_structure_check(&self, node: Node) -> Result<(), TreeError> {
        match self.value_type(node) {
            ValueType::Root => Err(TreeError::InvalidOperation("Cannot remove document root")),
            ValueType::Element if self.parent(node) == Some(self.root) => Err(
                TreeError::InvalidOperation("Cannot remove document element"),
            ),
            _ => Ok(()),
        }
    }

    // returns true if the text was merged into a neighbour and `node` is
    // no longer needed
    fn add_consolidate_text_nodes(
        &mut self,
        node: Node,
        prev_node: Option<Node>,
        next_node: Option<Node>,
    ) -> bool {
        let added_text = match self.value(node) {
            Value::Text(text) => text.get().to_string(),
            _ => return false,
        };
        if let Some(prev_node) = prev_node {
            if let Value::Text(prev) = self.value_mut(prev_node) {
                prev.text.push_str(&added_text);
                node.get().remove_subtree(&mut self.arena);
                return true;
            }
        }
        if let Some(next_node) = next_node {
            if let Value::Text(next) = self.value_mut(next_node) {
                next.text.insert_str(0, &added_text);
                node.get().remove_subtree(&mut self.arena);
                return true;
            }
        }
        false
    }

    fn remove_consolidate_text_nodes(&mut self, prev_node: Option<Node>, next_node: Option<Node>) {
        if let (Some(prev_node), Some(next_node)) = (prev_node, next_node) {
            let next_text = match self.value(next_node) {
                Value::Text(next) => next.get().to_string(),
                _ => return,
            };
            if let Value::Text(prev) = self.value_mut(prev_node) {
                prev.text.push_str(&next_text);
                next_node.get().remove_subtree(&mut self.arena);
            }
        }
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}
