use crate::cursor::NodeCursor;
use crate::error::{Error, TreeError};

/// An attribute of the element under a cursor.
///
/// The null attribute stands in for one that does not exist: reading it
/// gives nothing and writing to it is ignored.
#[derive(Debug, Clone)]
pub enum Attribute {
    Present { cursor: NodeCursor, name: String },
    Null,
}

impl Attribute {
    pub fn is_present(&self) -> bool {
        matches!(self, Attribute::Present { .. })
    }

    /// The attribute name as it appears in the document.
    pub fn name(&self) -> Option<&str> {
        match self {
            Attribute::Present { name, .. } => Some(name),
            Attribute::Null => None,
        }
    }

    /// The attribute value, exactly as parsed or last set.
    ///
    /// An attribute that was removed since, or whose element was removed,
    /// reads as absent.
    pub fn text(&self) -> Option<String> {
        match self {
            Attribute::Present { cursor, name } => cursor
                .read(|tree, node| {
                    tree.element(node)
                        .and_then(|element| element.attributes().get_exact(name))
                        .map(|value| value.to_string())
                })
                .ok()
                .flatten(),
            Attribute::Null => None,
        }
    }

    /// The attribute value passed through `f`.
    pub fn map<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&str) -> R,
    {
        self.text().map(|text| f(&text))
    }

    /// Overwrite the value. Writes to a null attribute are dropped.
    pub fn set_text(&self, value: &str) -> Result<(), Error> {
        match self {
            Attribute::Present { cursor, name } => cursor.write(|tree, node| {
                let element = tree
                    .element_mut(node)
                    .ok_or(TreeError::InvalidOperation("Not an element"))?;
                element.set_attribute(name, value);
                Ok(())
            }),
            Attribute::Null => Ok(()),
        }
    }
}
