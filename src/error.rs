use std::fmt;
use std::num::{ParseFloatError, ParseIntError};

/// What a failed lookup was searching for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Needle {
    /// A single child with this name.
    Name(String),
    /// The n-th (zero-based) child with this name.
    Position(usize, String),
    /// A single child with this name, to be used as a prototype.
    Prototype(String),
    /// A single child accepted by a predicate.
    Predicate,
}

impl fmt::Display for Needle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Needle::Name(name) | Needle::Prototype(name) => write!(f, "{}", name),
            Needle::Position(position, name) => write!(f, "{}[{}]", name, position),
            Needle::Predicate => write!(f, "node matching predicate"),
        }
    }
}

/// Errors produced by cursor operations and by the entry point.
///
/// Every error that concerns a specific place in the document starts its
/// message with the path of the cursor it happened on, e.g.
/// `message >> header -- Unable to find 'idd' - Did you mean: id?`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input could not be turned into a tree.
    #[error("failed to initialize xml cursor")]
    Parse(#[source] ParseError),

    /// A required lookup found nothing.
    #[error("{} -- {}", .path, missing_node_message(.needle, .candidates))]
    MissingNode {
        path: String,
        needle: Needle,
        /// Sorted, de-duplicated names of the children that do exist.
        candidates: Vec<String>,
    },

    /// A required single lookup found more than one node.
    #[error("{path} -- Expected to find a single instance of {needle}")]
    Ambiguous { path: String, needle: Needle },

    #[error("{path} -- Unable to find attribute named '{name}'")]
    MissingAttribute { path: String, name: String },

    #[error("{path} -- No extractor for: {type_name}")]
    NoExtractor {
        path: String,
        type_name: &'static str,
    },

    /// The operation has no meaning for this cursor.
    #[error("{path} -- {message}")]
    InvalidOperation { path: String, message: String },

    #[error("{path} -- {source}")]
    Tree {
        path: String,
        #[source]
        source: TreeError,
    },

    #[error("{path} -- Technical difficulties")]
    Serialize {
        path: String,
        #[source]
        source: SerializeError,
    },

    #[error(transparent)]
    ParseInt(#[from] ParseIntError),

    #[error(transparent)]
    ParseFloat(#[from] ParseFloatError),

    /// Failure reported by a caller supplied extractor, inserter or visitor.
    #[error(transparent)]
    Extract(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wrap an application error raised inside an extractor or inserter.
    pub fn extract<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error::Extract(error.into())
    }

    /// The cause of a parse failure, if this is one.
    pub fn parse_error(&self) -> Option<&ParseError> {
        match self {
            Error::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ParseError> for Error {
    #[inline]
    fn from(e: ParseError) -> Self {
        Error::Parse(e)
    }
}

fn missing_node_message(needle: &Needle, candidates: &[String]) -> String {
    let did_you_mean = candidates.join(", ");
    match needle {
        Needle::Name(name) => {
            format!("Unable to find '{}' - Did you mean: {}?", name, did_you_mean)
        }
        Needle::Position(position, name) => format!(
            "Unable to find '{}' with index {} - Did you mean: {}?",
            name, position, did_you_mean
        ),
        Needle::Prototype(name) => {
            format!("Expected a node named '{}' to be used as a prototype", name)
        }
        Needle::Predicate => format!(
            "Unable to find node matching predicate - Did you mean: {}?",
            did_you_mean
        ),
    }
}

/// Why the input could not be parsed.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    XmlParser(#[from] xmlparser::Error),

    #[error("invalid close tag '{found}', expected '{expected}' (at {position})")]
    InvalidCloseTag {
        expected: String,
        found: String,
        position: usize,
    },

    #[error("element '{0}' is never closed")]
    UnclosedElement(String),

    #[error("unknown namespace prefix '{prefix}' (at {position})")]
    UnknownPrefix { prefix: String, position: usize },

    #[error("attribute \"{name}\" was already specified for element \"{element}\"")]
    DuplicateAttribute { name: String, element: String },

    #[error("unclosed entity reference '&{0}'")]
    UnclosedEntity(String),

    #[error("invalid entity reference '&{0};'")]
    InvalidEntity(String),

    #[error("the entity \"{0}\" was referenced, but not declared")]
    UndeclaredEntity(String),

    #[error("recursive or too deeply nested reference to entity \"{0}\"")]
    EntityRecursion(String),

    #[error("expansion of entity \"{0}\" exceeds the entity expansion limit")]
    EntityExpansionLimit(String),

    #[error("replacement text of entity \"{0}\" contains markup")]
    EntityMarkup(String),

    #[error("invalid character reference '&{0};'")]
    InvalidCharacterReference(String),

    #[error("text is not allowed outside the root element")]
    TextOutsideRoot,

    #[error("only one root element is allowed, found '{0}'")]
    MultipleRootElements(String),

    #[error("document has no root element")]
    NoRootElement,

    #[error("unsupported XML version '{0}'")]
    UnsupportedVersion(String),

    #[error("malformed DTD declaration: {0}")]
    Dtd(String),

    #[error("document is invalid: {0}")]
    Validation(String),

    #[error("external DTD '{0}' cannot be loaded without an entity resolver")]
    ExternalDtdUnavailable(String),

    #[error("failed to resolve external entity '{system_id}'")]
    EntityResolution {
        system_id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("input is not valid {0}")]
    Encoding(&'static str),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Structural problems in the tree itself.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    #[error("node has been removed from the document")]
    Removed,

    #[error(transparent)]
    Structure(#[from] indextree::NodeError),

    #[error("{0}")]
    InvalidOperation(&'static str),
}

/// Why a subtree could not be rendered.
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("only elements can be serialized")]
    NotAnElement,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_node_message() {
        let err = Error::MissingNode {
            path: "message >> header".to_string(),
            needle: Needle::Name("idd".to_string()),
            candidates: vec!["id".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "message >> header -- Unable to find 'idd' - Did you mean: id?"
        );
    }

    #[test]
    fn test_missing_position_message() {
        let err = Error::MissingNode {
            path: "headers".to_string(),
            needle: Needle::Position(2, "header".to_string()),
            candidates: vec!["header".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "headers -- Unable to find 'header' with index 2 - Did you mean: header?"
        );
    }

    #[test]
    fn test_ambiguous_message() {
        let err = Error::Ambiguous {
            path: "headers".to_string(),
            needle: Needle::Name("header".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "headers -- Expected to find a single instance of header"
        );
    }

    #[test]
    fn test_parse_error_is_source() {
        use std::error::Error as _;

        let err = Error::from(ParseError::NoRootElement);
        assert_eq!(err.to_string(), "failed to initialize xml cursor");
        assert_eq!(
            err.source().unwrap().to_string(),
            "document has no root element"
        );
    }
}
