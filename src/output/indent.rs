use crate::output::Output;
use crate::tree::{Node, Tree};
use crate::value::Value;

/// How the content of an open element is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    /// Element-only content: one child per line, one level deeper.
    Block,
    /// Content holds text, so whitespace added here would become data.
    Mixed,
    /// `xml:space="preserve"` is in effect.
    Preserved,
}

/// Where whitespace goes around an output token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct Layout {
    /// Indentation levels written before the token.
    pub(crate) indent: usize,
    /// Whether a line break follows the token.
    pub(crate) newline: bool,
}

/// Lays out indented output, one element frame per open element.
///
/// Text is never touched. An element whose children include text, or that
/// sits under `xml:space="preserve"`, is written as it is together with
/// everything below it. `xml:space="default"` switches indentation back on
/// below a preserved element.
pub(crate) struct Indenter<'a> {
    tree: &'a Tree,
    frames: Vec<Frame>,
}

impl<'a> Indenter<'a> {
    pub(crate) fn new(tree: &'a Tree) -> Self {
        Indenter {
            tree,
            frames: Vec::new(),
        }
    }

    // the top-level element lays out like a child of a block
    fn enclosing(&self) -> Frame {
        self.frames.last().copied().unwrap_or(Frame::Block)
    }

    fn depth(&self) -> usize {
        self.frames.iter().filter(|frame| **frame == Frame::Block).count()
    }

    fn line_start(&self) -> usize {
        if self.enclosing() == Frame::Block {
            self.depth()
        } else {
            0
        }
    }

    fn frame_for(&self, node: Node) -> Frame {
        let space = self
            .tree
            .element(node)
            .and_then(|element| element.attributes().get_exact("xml:space"));
        match (self.enclosing(), space) {
            (Frame::Mixed, _) => Frame::Mixed,
            (_, Some("preserve")) => Frame::Preserved,
            (Frame::Preserved, space) if space != Some("default") => Frame::Preserved,
            _ if self.has_text_child(node) => Frame::Mixed,
            _ => Frame::Block,
        }
    }

    fn has_text_child(&self, node: Node) -> bool {
        self.tree
            .children(node)
            .any(|child| matches!(self.tree.value(child), Value::Text(_)))
    }

    fn has_children(&self, node: Node) -> bool {
        self.tree.first_child(node).is_some()
    }

    /// Layout for the next token; `node` is the node the token belongs to.
    pub(crate) fn layout(&mut self, node: Node, output: &Output) -> Layout {
        use Output::*;
        match output {
            StartTagOpen(_) => Layout {
                indent: self.line_start(),
                newline: false,
            },
            Comment(_) | ProcessingInstruction(..) => Layout {
                indent: self.line_start(),
                newline: self.enclosing() == Frame::Block,
            },
            StartTagClose if self.has_children(node) => {
                let frame = self.frame_for(node);
                self.frames.push(frame);
                Layout {
                    indent: 0,
                    newline: frame == Frame::Block,
                }
            }
            // written as `<name/>`; the break comes with the empty end tag
            EndTag(_) if !self.has_children(node) => Layout {
                indent: 0,
                newline: self.enclosing() == Frame::Block,
            },
            EndTag(_) => {
                let closed = self.frames.pop();
                Layout {
                    indent: if closed == Some(Frame::Block) { self.depth() } else { 0 },
                    newline: self.enclosing() == Frame::Block,
                }
            }
            _ => Layout::default(),
        }
    }
}
