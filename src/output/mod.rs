//! Rendering subtrees back to XML.
//!
//! Serialization is controlled by [`SerializeOptions`], which can be built
//! from a list of named [`Feature`]s.
use encoding_rs::{Encoding, UTF_8};

mod indent;
mod serializer;
mod xml;

pub(crate) use indent::{Indenter, Layout};
pub(crate) use serializer::{gen_outputs, Output, OutputToken};
pub(crate) use xml::{serialize, serialize_to};

/// Named formatting features for dumping XML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    /// Indent nested elements, four spaces per level.
    Indent,
    /// Leave out the `<?xml ...?>` declaration.
    OmitXmlDeclaration,
    /// Write the document type declaration of the source document, if it
    /// had a public or system identifier.
    RetainDoctype,
}

/// Parameters for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerializeOptions {
    /// Output encoding. Encodings that cannot be written (UTF-16) fall back
    /// to UTF-8.
    pub encoding: &'static Encoding,
    pub indent: bool,
    pub omit_xml_declaration: bool,
    pub retain_doctype: bool,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        SerializeOptions {
            encoding: UTF_8,
            indent: false,
            omit_xml_declaration: false,
            retain_doctype: false,
        }
    }
}

impl SerializeOptions {
    /// UTF-8 output with the given features switched on.
    pub fn from_features(features: &[Feature]) -> Self {
        let mut options = SerializeOptions::default();
        for feature in features {
            options.enable(*feature);
        }
        options
    }

    pub fn enable(&mut self, feature: Feature) {
        match feature {
            Feature::Indent => self.indent = true,
            Feature::OmitXmlDeclaration => self.omit_xml_declaration = true,
            Feature::RetainDoctype => self.retain_doctype = true,
        }
    }

    pub fn with_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }
}
