use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8};
use xhtmlchardet::detect;

use crate::error::ParseError;

/// Detect the encoding of a document from its byte order mark or its XML
/// declaration.
pub(crate) fn encoding(data: &[u8], hint: Option<String>) -> Option<&'static Encoding> {
    let mut cursor = std::io::Cursor::new(data);
    let charsets = detect(&mut cursor, hint).ok()?;
    // no encoding detected
    let label = if charsets.is_empty() {
        "UTF-8"
    } else {
        &charsets[0]
    };
    Encoding::for_label(label.as_bytes())
}

/// Decode raw document bytes into text.
///
/// A byte order mark takes precedence over whatever was detected. Bytes
/// that are invalid in the detected encoding are an error.
pub(crate) fn decode(data: &[u8]) -> Result<Cow<str>, ParseError> {
    let detected = encoding(data, None).unwrap_or(UTF_8);
    let (text, used, had_errors) = detected.decode(data);
    if had_errors {
        return Err(ParseError::Encoding(used.name()));
    }
    if used != UTF_8 {
        tracing::debug!(encoding = used.name(), "decoded non UTF-8 input");
    }
    Ok(text)
}

/// Encode text for output.
///
/// Characters the encoding cannot represent are written as numeric
/// character references. Encodings that cannot be produced (UTF-16 among
/// them) fall back to their output encoding, which is returned.
pub(crate) fn encode<'a>(text: &'a str, encoding: &'static Encoding) -> (Cow<'a, [u8]>, &'static Encoding) {
    let (bytes, used, had_unmappable) = encoding.encode(text);
    if had_unmappable {
        tracing::debug!(
            encoding = used.name(),
            "unmappable characters written as character references"
        );
    }
    (bytes, used)
}
