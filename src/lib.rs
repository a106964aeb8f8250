#![forbid(unsafe_code)]

//! Cursor based navigation, extraction and mutation of XML documents.
//!
//! Parse a document with [`Nx`] to get a [`Cursor`] on its root element.
//! Navigate by element name, pull typed values out through registered
//! extractors, fill in repeated elements from a prototype, and dump the
//! result back to XML. Errors say where in the document things went wrong:
//!
//! ```rust
//! use nmxml::Nx;
//!
//! let nx = Nx::new();
//! let cursor = nx.parse("<message><header><id>1</id></header></message>")?;
//! let err = cursor.to_path(&["header", "idd"]).unwrap_err();
//! assert_eq!(
//!     err.to_string(),
//!     "message >> header -- Unable to find 'idd' - Did you mean: id?"
//! );
//! # Ok::<(), nmxml::Error>(())
//! ```
//!
//! Optional navigation yields an empty cursor instead of an error. Reading
//! from an empty cursor gives nothing and most writes do nothing:
//!
//! ```rust
//! use nmxml::Nx;
//!
//! let cursor = Nx::new().parse("<person><name>Nasse</name></person>")?;
//! let nickname = cursor.to_optional_path(&["nick", "first"])?;
//! assert!(nickname.is_empty());
//! assert_eq!(nickname.text(), None);
//! assert_eq!(nickname.describe_path(), "person >> ???");
//! # Ok::<(), nmxml::Error>(())
//! ```

mod attribute;
mod context;
mod cursor;
mod dtd;
mod encoding;
mod engine;
mod entity;
mod error;
mod extract;
mod name;
mod output;
mod parse;
mod tree;
mod value;

pub use attribute::Attribute;
pub use context::{EntityResolver, ReadContext};
pub use cursor::{Cursor, EmptyCursor, NodeCursor};
pub use engine::{Config, Nx};
pub use error::{Error, Needle, ParseError, SerializeError, TreeError};
pub use extract::{Extractor, ExtractorRegistry};
pub use name::{local_name, name_matches};
pub use output::{Feature, SerializeOptions};
pub use parse::{ConfigFeature, ParseOptions};
pub use tree::{Doctype, Node, NodeEdge, Tree};
pub use value::{Attributes, Comment, Element, ProcessingInstruction, Text, Value, ValueType};

pub use encoding_rs::Encoding;
