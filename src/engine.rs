use std::cell::RefCell;
use std::io::Read;
use std::rc::Rc;

use encoding_rs::Encoding;

use crate::context::ReadContext;
use crate::cursor::{Cursor, DocumentState, NodeCursor};
use crate::encoding;
use crate::error::{Error, ParseError};
use crate::extract::ExtractorRegistry;
use crate::output::{Feature, SerializeOptions};
use crate::parse::{self, ConfigFeature, ParseOptions};

/// Engine configuration: how to parse, and how to dump by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Config {
    pub parse: ParseOptions,
    pub dump: SerializeOptions,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch on a parser feature.
    pub fn feature(mut self, feature: ConfigFeature) -> Self {
        self.parse.enable(feature);
        self
    }

    /// Switch on a feature for [`Cursor::dump_xml`].
    pub fn dump_feature(mut self, feature: Feature) -> Self {
        self.dump.enable(feature);
        self
    }

    /// Encoding used by [`Cursor::dump_xml`].
    pub fn dump_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.dump.encoding = encoding;
        self
    }
}

/// Entry point: parses documents into root cursors.
///
/// ```rust
/// use nmxml::Nx;
///
/// let nx = Nx::new();
/// let cursor = nx.parse("<person><age>42</age></person>")?;
/// let age: Option<i32> = cursor.to("age")?.extract_as()?;
/// assert_eq!(age, Some(42));
/// # Ok::<(), nmxml::Error>(())
/// ```
pub struct Nx {
    config: Config,
    extractors: Rc<RefCell<ExtractorRegistry>>,
}

impl Nx {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Nx {
            config,
            extractors: Rc::new(RefCell::new(ExtractorRegistry::new())),
        }
    }

    /// An engine with the given parser features and default dump options.
    pub fn with_features(features: &[ConfigFeature]) -> Self {
        Self::with_config(Config {
            parse: ParseOptions::from_features(features),
            ..Config::default()
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Register the extractor for `R`, replacing an earlier one.
    ///
    /// Cursors already handed out by this engine see the new extractor too.
    pub fn register_extractor<R, F>(&mut self, extractor: F) -> &mut Self
    where
        R: 'static,
        F: Fn(&Cursor) -> Result<R, Error> + 'static,
    {
        self.extractors.borrow_mut().register(extractor);
        self
    }

    /// Parse a document and return a cursor on its root element.
    ///
    /// Any well-formedness problem, and with [`ConfigFeature::Validating`]
    /// any validity problem, fails the parse.
    pub fn parse(&self, xml: &str) -> Result<Cursor, Error> {
        self.parse_with(xml, &ReadContext::new())
    }

    /// Like [`Nx::parse`], resolving external entities and DTDs through
    /// `context`.
    pub fn parse_with(&self, xml: &str, context: &ReadContext) -> Result<Cursor, Error> {
        let tree = parse::parse(xml, &self.config.parse, context)?;
        let document = Rc::new(DocumentState {
            tree: RefCell::new(tree),
            extractors: self.extractors.clone(),
            dump_options: self.config.dump,
        });
        let root = NodeCursor::root(document).ok_or(ParseError::NoRootElement)?;
        Ok(Cursor::Present(root))
    }

    /// Parse raw bytes, detecting the encoding from a byte order mark or the
    /// XML declaration.
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<Cursor, Error> {
        self.parse_bytes_with(bytes, &ReadContext::new())
    }

    /// [`Nx::parse_bytes`] with a read context.
    pub fn parse_bytes_with(&self, bytes: &[u8], context: &ReadContext) -> Result<Cursor, Error> {
        let xml = encoding::decode(bytes)?;
        self.parse_with(&xml, context)
    }

    /// Read `reader` to its end and parse what it produced. The reader is
    /// dropped before this returns, also on failure.
    pub fn parse_reader<R: Read>(&self, reader: R) -> Result<Cursor, Error> {
        self.parse_reader_with(reader, &ReadContext::new())
    }

    /// [`Nx::parse_reader`] with a read context.
    pub fn parse_reader_with<R: Read>(&self, mut reader: R, context: &ReadContext) -> Result<Cursor, Error> {
        let mut bytes = Vec::new();
        let read = reader.read_to_end(&mut bytes);
        drop(reader);
        read.map_err(ParseError::from)?;
        self.parse_bytes_with(&bytes, context)
    }
}

impl Default for Nx {
    fn default() -> Self {
        Self::new()
    }
}
